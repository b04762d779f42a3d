//! Request documents for server actions and interpretation of their
//! acknowledgements.
//!
//! Every mutating call is asynchronous on the provider side: the response
//! only says whether the action was queued. [`is_accepted`] is the whole of
//! that contract.

use super::models::{CreateNodeRequest, NetworkAttachment, TYPES_URN};
use crate::providers::traits::ComputeError;
use crate::xml::{Element, XmlWriter};

/// Response code of an action the provider accepted and queued.
pub const IN_PROGRESS: &str = "IN_PROGRESS";

/// Actions that take nothing but the server id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerAction {
    Delete,
    Start,
    Shutdown,
    PowerOff,
    Reset,
    Reboot,
}

impl ServerAction {
    /// Root element of the request document.
    #[must_use]
    pub fn element(self) -> &'static str {
        match self {
            Self::Delete => "deleteServer",
            Self::Start => "startServer",
            Self::Shutdown => "shutdownServer",
            Self::PowerOff => "powerOffServer",
            Self::Reset => "resetServer",
            Self::Reboot => "rebootServer",
        }
    }

    /// API action path.
    #[must_use]
    pub fn path(self) -> String {
        format!("server/{}", self.element())
    }
}

impl std::fmt::Display for ServerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delete => write!(f, "delete"),
            Self::Start => write!(f, "start"),
            Self::Shutdown => write!(f, "shutdown"),
            Self::PowerOff => write!(f, "power_off"),
            Self::Reset => write!(f, "reset"),
            Self::Reboot => write!(f, "reboot"),
        }
    }
}

/// Build the `deployServer` document.
///
/// # Errors
/// Returns [`ComputeError::InvalidArgument`] if the network attachment is
/// unusable, before anything is written.
pub fn deploy_server_body(req: &CreateNodeRequest, password: &str) -> Result<String, ComputeError> {
    req.attachment.validate()?;

    let mut writer = XmlWriter::new();
    writer.start("deployServer", &[("xmlns", TYPES_URN)])?;
    writer.text_element("name", &req.name)?;
    writer.text_element("description", &req.description)?;
    writer.text_element("imageId", &req.image_id)?;
    writer.text_element("start", if req.start { "true" } else { "false" })?;
    writer.text_element("administratorPassword", password)?;

    match &req.attachment {
        NetworkAttachment::Network { network_id } => {
            writer.start("network", &[])?;
            writer.text_element("networkId", network_id)?;
            writer.end("network")?;
        }
        NetworkAttachment::NetworkDomain {
            network_domain_id,
            vlan_id,
        } => {
            writer.start(
                "networkInfo",
                &[("networkDomainId", network_domain_id.as_str())],
            )?;
            writer.start("primaryNic", &[])?;
            writer.text_element("vlanId", vlan_id)?;
            writer.end("primaryNic")?;
            writer.end("networkInfo")?;
        }
    }

    writer.end("deployServer")?;
    Ok(writer.finish()?)
}

/// Build the single-element document for a [`ServerAction`].
///
/// # Errors
/// Returns [`ComputeError::Xml`] if the document cannot be written.
pub fn server_action_body(action: ServerAction, node_id: &str) -> Result<String, ComputeError> {
    let mut writer = XmlWriter::new();
    writer.empty(action.element(), &[("xmlns", TYPES_URN), ("id", node_id)])?;
    Ok(writer.finish()?)
}

/// The `responseCode` of an action response.
#[must_use]
pub fn response_code(doc: &Element) -> Option<&str> {
    doc.findtext("responseCode", TYPES_URN)
}

/// Whether the provider accepted the action for asynchronous execution.
///
/// Acceptance is not completion.
#[must_use]
pub fn is_accepted(doc: &Element) -> bool {
    response_code(doc) == Some(IN_PROGRESS)
}

/// Id assigned to a newly deployed server, from `info[@name="serverId"]`.
///
/// If the response repeats `serverId`, the last one wins.
#[must_use]
pub fn deployed_server_id(doc: &Element) -> Option<&str> {
    doc.findall("info", TYPES_URN)
        .into_iter()
        .rev()
        .filter(|info| info.attr("name") == Some("serverId"))
        .find_map(|info| info.attr("value"))
}
