//! Authenticated transport for the Dimension Data CaaS API.
//!
//! Two API generations are exposed under one host: the legacy `/oec/0.9`
//! API (optionally scoped to the caller's organization) and the
//! organization-scoped `/caas/2.0` API. Every successful response body is
//! returned as a parsed [`Element`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use url::Url;

use super::models::{DIRECTORY_NS, GENERAL_NS, TYPES_URN};
use super::regions::Region;
use crate::providers::traits::ComputeError;
use crate::xml::Element;

/// Path prefix of the legacy API.
const API_PATH_V1: &str = "/oec/0.9";

/// Path prefix of the organization-scoped API.
const API_PATH_V2: &str = "/caas/2.0";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which API path an action is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFlavor {
    /// `/oec/0.9/{action}`
    Legacy,
    /// `/oec/0.9/{orgId}/{action}`
    LegacyOrg,
    /// `/caas/2.0/{orgId}/{action}`
    Organization,
}

/// A single API exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub flavor: ApiFlavor,
    pub method: Method,
    pub action: String,
    pub params: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ApiRequest {
    /// A GET request with no query parameters.
    pub fn get(flavor: ApiFlavor, action: impl Into<String>) -> Self {
        Self {
            flavor,
            method: Method::GET,
            action: action.into(),
            params: Vec::new(),
            body: None,
        }
    }

    /// A POST request carrying an XML body.
    pub fn post(flavor: ApiFlavor, action: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            flavor,
            method: Method::POST,
            action: action.into(),
            params: Vec::new(),
            body: Some(body.into()),
        }
    }

    /// Add a query parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Value of a query parameter, if set.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Capability to perform signed exchanges with the provider.
///
/// Errors are returned as produced; callers never retry or suppress them.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Perform the request and return the parsed response document.
    async fn request(&self, request: ApiRequest) -> Result<Element, ComputeError>;
}

/// reqwest-backed [`Connection`] using HTTP basic authentication.
#[derive(Clone)]
pub struct DimensionDataConnection {
    /// HTTP client.
    client: Client,
    /// Scheme and host requests are sent to.
    base_url: Url,
    /// Account user id.
    user_id: String,
    /// Account password.
    password: String,
    /// Organization id, discovered on first org-scoped request.
    org_id: Arc<OnceCell<String>>,
}

impl DimensionDataConnection {
    /// Create a connection to a region's API host.
    ///
    /// # Errors
    /// Returns error if HTTP client cannot be created.
    pub fn new(
        user_id: impl Into<String>,
        password: impl Into<String>,
        region: &Region,
    ) -> Result<Self, ComputeError> {
        Self::with_base_url(user_id, password, &format!("https://{}", region.host))
    }

    /// Create a connection to an explicit base URL.
    ///
    /// # Errors
    /// Returns [`ComputeError::Config`] if the URL does not parse.
    pub fn with_base_url(
        user_id: impl Into<String>,
        password: impl Into<String>,
        base_url: &str,
    ) -> Result<Self, ComputeError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ComputeError::Config(format!("invalid base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ComputeError::Config(format!(
                "base URL '{base_url}' cannot carry a path"
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url,
            user_id: user_id.into(),
            password: password.into(),
            org_id: Arc::new(OnceCell::new()),
        })
    }

    /// Organization id of the authenticated account.
    ///
    /// # Errors
    /// Returns error if the account lookup fails or carries no `orgId`.
    pub async fn org_id(&self) -> Result<&str, ComputeError> {
        let org_id = self
            .org_id
            .get_or_try_init(|| self.fetch_org_id())
            .await?;
        Ok(org_id.as_str())
    }

    async fn fetch_org_id(&self) -> Result<String, ComputeError> {
        let account = self
            .execute(Method::GET, &format!("{API_PATH_V1}/myaccount"), &[], None)
            .await?;

        let org_id = account
            .findtext("orgId", DIRECTORY_NS)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                ComputeError::MalformedResponse("account details carry no orgId".to_string())
            })?;

        debug!(org_id = %org_id, "Discovered organization id");
        Ok(org_id.to_string())
    }

    async fn path_for(&self, flavor: ApiFlavor, action: &str) -> Result<String, ComputeError> {
        Ok(match flavor {
            ApiFlavor::Legacy => format!("{API_PATH_V1}/{action}"),
            ApiFlavor::LegacyOrg => format!("{API_PATH_V1}/{}/{action}", self.org_id().await?),
            ApiFlavor::Organization => {
                format!("{API_PATH_V2}/{}/{action}", self.org_id().await?)
            }
        })
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
        body: Option<String>,
    ) -> Result<Element, ComputeError> {
        let url = self.request_url(path)?;
        debug!(method = %method, url = %url, "API request");

        let mut request = self
            .client
            .request(method, url)
            .basic_auth(&self.user_id, Some(&self.password));

        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "text/xml").body(body);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Append each `/`-separated piece of `path` to the base URL as an
    /// encoded segment, so `?`, `#` and `%` inside an id stay in the path.
    fn request_url(&self, path: &str) -> Result<Url, ComputeError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ComputeError::Config(format!("base URL '{}' cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    /// Handle API response, parsing the document or mapping the error.
    async fn handle_response(response: reqwest::Response) -> Result<Element, ComputeError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return Ok(Element::parse(&text)?);
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ComputeError::Auth(format!(
                "provider rejected credentials ({status})"
            )));
        }

        let (code, message) = match Element::parse(&text) {
            Ok(doc) => error_details(&doc),
            Err(e) => {
                warn!(error = %e, body = %text, "Failed to parse error response");
                (String::new(), text)
            }
        };

        Err(ComputeError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }
}

#[async_trait]
impl Connection for DimensionDataConnection {
    async fn request(&self, request: ApiRequest) -> Result<Element, ComputeError> {
        let path = self.path_for(request.flavor, &request.action).await?;
        self.execute(request.method, &path, &request.params, request.body)
            .await
    }
}

/// Error code and message from either API generation's error document.
fn error_details(doc: &Element) -> (String, String) {
    let code = doc
        .findtext("responseCode", TYPES_URN)
        .or_else(|| doc.findtext("resultCode", GENERAL_NS))
        .unwrap_or_default();
    let message = doc
        .findtext("message", TYPES_URN)
        .or_else(|| doc.findtext("resultDetail", GENERAL_NS))
        .unwrap_or_default();
    (code.to_string(), message.to_string())
}
