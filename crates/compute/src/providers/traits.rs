//! Node driver trait and common types.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::xml::XmlError;

/// Errors that can occur during compute driver operations.
#[derive(Error, Debug)]
pub enum ComputeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Credentials were rejected.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Caller supplied arguments that cannot form a valid request.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Response document lacks a required element or value.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// XML could not be parsed or written.
    #[error("XML error: {0}")]
    Xml(#[from] XmlError),
}

/// Node running state.
///
/// The provider reports only a `started` flag, so no other state is
/// representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Server is started.
    Running,
    /// Server is stopped.
    Terminated,
}

impl NodeState {
    /// Derive the state from the provider's `started` flag.
    #[must_use]
    pub fn from_started(started: bool) -> Self {
        if started {
            Self::Running
        } else {
            Self::Terminated
        }
    }
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}

/// Progress of an in-flight provider operation.
///
/// Every field is optional; a resource with no operation in flight carries
/// `Status::default()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Status {
    pub action: Option<String>,
    pub request_time: Option<String>,
    pub user_name: Option<String>,
    pub number_of_steps: Option<String>,
    pub step_name: Option<String>,
    pub step_number: Option<String>,
    pub step_percent_complete: Option<String>,
    pub failure_reason: Option<String>,
}

impl Status {
    /// Whether the provider reported any operation at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A datacenter servers and networks can be placed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeLocation {
    /// Datacenter identifier (e.g. `NA9`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Country code.
    pub country: String,
}

/// A deployed server.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    /// Provider-assigned server identifier.
    pub id: String,
    /// Server name.
    pub name: String,
    /// Current running state.
    pub state: NodeState,
    /// Public IPv4 addresses.
    pub public_ips: Vec<String>,
    /// Private IPv4 addresses.
    pub private_ips: Vec<String>,
    /// Provider-specific details.
    pub extra: NodeExtra,
}

/// Provider-specific server details.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeExtra {
    pub description: Option<String>,
    pub source_image_id: Option<String>,
    pub network_id: Option<String>,
    pub network_domain_id: Option<String>,
    /// Datacenter the server lives in; resolve with `node_location`.
    pub datacenter_id: Option<String>,
    pub deployed_time: Option<String>,
    pub cpu_count: Option<u32>,
    pub memory_mb: Option<u64>,
    pub os_id: Option<String>,
    pub os_type: Option<String>,
    pub os_display_name: Option<String>,
    pub status: Status,
    /// Administrator password, only set when it was generated at deploy time.
    pub password: Option<String>,
}

/// A base OS image.
#[derive(Debug, Clone, Serialize)]
pub struct NodeImage {
    /// Image identifier.
    pub id: String,
    /// Image name.
    pub name: String,
    /// Provider-specific details.
    pub extra: ImageExtra,
}

/// Provider-specific image details.
#[derive(Debug, Clone, Serialize)]
pub struct ImageExtra {
    pub description: Option<String>,
    pub os_type: Option<String>,
    pub os_display_name: Option<String>,
    pub cpu_count: Option<u32>,
    pub resource_path: Option<String>,
    pub memory: Option<u64>,
    pub os_storage: Option<u64>,
    pub additional_storage: Option<u64>,
    pub created: Option<String>,
    pub location: NodeLocation,
}

/// A node size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSize {
    pub id: String,
    pub name: String,
    pub ram: u64,
    pub disk: u64,
    pub bandwidth: u64,
    pub price: f64,
}

/// Initial administrator password for a new node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAuthPassword {
    /// The password.
    pub password: String,
    /// Whether the password was generated rather than supplied by the caller.
    pub generated: bool,
}

impl NodeAuthPassword {
    /// A caller-supplied password.
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            generated: false,
        }
    }

    /// A random 32 hex character password.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            password: uuid::Uuid::new_v4().simple().to_string(),
            generated: true,
        }
    }
}

/// Trait for compute node drivers.
#[async_trait]
pub trait NodeDriver: Send + Sync {
    /// List all servers.
    async fn list_nodes(&self) -> Result<Vec<Node>, ComputeError>;

    /// Get server by ID.
    async fn get_node(&self, id: &str) -> Result<Node, ComputeError>;

    /// Submit a delete request. `true` means the provider accepted it.
    async fn destroy_node(&self, id: &str) -> Result<bool, ComputeError>;

    /// Submit a reboot request. `true` means the provider accepted it.
    async fn reboot_node(&self, id: &str) -> Result<bool, ComputeError>;

    /// List images, optionally restricted to one location.
    async fn list_images(&self, location_id: Option<&str>)
        -> Result<Vec<NodeImage>, ComputeError>;

    /// List available sizes.
    async fn list_sizes(&self) -> Result<Vec<NodeSize>, ComputeError>;

    /// List locations.
    async fn list_locations(&self) -> Result<Vec<NodeLocation>, ComputeError>;
}
