//! Dimension Data network models and request types.

use serde::Serialize;

use crate::providers::traits::{ComputeError, NodeAuthPassword, NodeLocation, Status};

// ============================================================================
// Namespaces
// ============================================================================

/// Legacy server and image schema.
pub const SERVER_NS: &str = "http://oec.api.opsource.net/schemas/server";

/// Legacy network schema.
pub const NETWORK_NS: &str = "http://oec.api.opsource.net/schemas/network";

/// Legacy general schema (status and error documents).
pub const GENERAL_NS: &str = "http://oec.api.opsource.net/schemas/general";

/// Legacy directory schema (account details).
pub const DIRECTORY_NS: &str = "http://oec.api.opsource.net/schemas/directory";

/// Organization-scoped API types.
pub const TYPES_URN: &str = "urn:didata.com:api:cloud:types";

// ============================================================================
// Network types
// ============================================================================

/// A flat legacy network.
#[derive(Debug, Clone, Serialize)]
pub struct Network {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub location: NodeLocation,
    /// Private network CIDR base.
    pub private_net: Option<String>,
    pub multicast: bool,
    pub status: Status,
}

/// An isolated network container hosting VLANs.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkDomain {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub location: NodeLocation,
    pub status: Status,
}

/// A layer-2 segment inside a network domain.
#[derive(Debug, Clone, Serialize)]
pub struct Vlan {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub location: NodeLocation,
    /// Owning network domain, when the provider reports it.
    pub network_domain_id: Option<String>,
    pub status: Status,
}

// ============================================================================
// Deploy request types
// ============================================================================

/// How a new server is attached to the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkAttachment {
    /// Attach to a flat network.
    Network { network_id: String },
    /// Attach the primary NIC to a VLAN inside a network domain.
    NetworkDomain {
        network_domain_id: String,
        vlan_id: String,
    },
}

impl NetworkAttachment {
    /// Attach to a listed network.
    #[must_use]
    pub fn from_network(network: &Network) -> Self {
        Self::Network {
            network_id: network.id.clone(),
        }
    }

    /// Attach to a VLAN of a listed network domain.
    ///
    /// # Errors
    /// Returns [`ComputeError::InvalidArgument`] if the VLAN is known to
    /// belong to a different domain.
    pub fn from_vlan(domain: &NetworkDomain, vlan: &Vlan) -> Result<Self, ComputeError> {
        if let Some(owner) = vlan.network_domain_id.as_deref() {
            if owner != domain.id {
                return Err(ComputeError::InvalidArgument(format!(
                    "VLAN {} belongs to network domain {owner}, not {}",
                    vlan.id, domain.id
                )));
            }
        }

        Ok(Self::NetworkDomain {
            network_domain_id: domain.id.clone(),
            vlan_id: vlan.id.clone(),
        })
    }

    /// Reject attachments with blank identifiers.
    ///
    /// # Errors
    /// Returns [`ComputeError::InvalidArgument`] naming the blank field.
    pub fn validate(&self) -> Result<(), ComputeError> {
        let blank = match self {
            Self::Network { network_id } if network_id.trim().is_empty() => Some("network id"),
            Self::NetworkDomain {
                network_domain_id, ..
            } if network_domain_id.trim().is_empty() => Some("network domain id"),
            Self::NetworkDomain { vlan_id, .. } if vlan_id.trim().is_empty() => Some("VLAN id"),
            _ => None,
        };

        match blank {
            Some(field) => Err(ComputeError::InvalidArgument(format!(
                "a network or a network domain with a VLAN is required: {field} is empty"
            ))),
            None => Ok(()),
        }
    }
}

/// Request to deploy a new server.
#[derive(Debug, Clone)]
pub struct CreateNodeRequest {
    /// Server name.
    pub name: String,
    /// Base image to deploy from.
    pub image_id: String,
    /// Administrator password; generated when `None`.
    pub auth: Option<NodeAuthPassword>,
    /// Server description.
    pub description: String,
    /// Network placement.
    pub attachment: NetworkAttachment,
    /// Start the server once deployed.
    pub start: bool,
}
