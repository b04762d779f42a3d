//! Dimension Data compute driver.
//!
//! Every call is a fresh round trip: nothing is cached between calls, and
//! mappers that embed a location fetch the full location listing first.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::connection::{ApiFlavor, ApiRequest, Connection, DimensionDataConnection};
use super::mapper;
use super::models::{CreateNodeRequest, Network, NetworkDomain, Vlan};
use super::regions::Region;
use super::request::{self, ServerAction};
use crate::providers::traits::{
    ComputeError, Node, NodeAuthPassword, NodeDriver, NodeImage, NodeLocation, NodeSize,
};

/// Dimension Data compute driver.
#[derive(Clone)]
pub struct DimensionData {
    /// Transport to the provider.
    connection: Arc<dyn Connection>,
    /// Region the driver talks to.
    region: &'static Region,
}

impl DimensionData {
    /// Create a driver for a named region.
    ///
    /// # Arguments
    /// * `user_id` - Account user id
    /// * `password` - Account password
    /// * `region` - Region key (e.g. `dd-na`)
    ///
    /// # Errors
    /// Returns [`ComputeError::Config`] for an unknown region, before any
    /// network activity, or an error if the HTTP client cannot be created.
    pub fn new(
        user_id: impl Into<String>,
        password: impl Into<String>,
        region: &str,
    ) -> Result<Self, ComputeError> {
        let region = Region::by_key(region)?;
        let connection = DimensionDataConnection::new(user_id, password, region)?;
        Ok(Self {
            connection: Arc::new(connection),
            region,
        })
    }

    /// Create a driver over an existing connection.
    ///
    /// # Errors
    /// Returns [`ComputeError::Config`] for an unknown region.
    pub fn with_connection(
        connection: Arc<dyn Connection>,
        region: &str,
    ) -> Result<Self, ComputeError> {
        Ok(Self {
            connection,
            region: Region::by_key(region)?,
        })
    }

    /// Region this driver is bound to.
    #[must_use]
    pub fn region(&self) -> &'static Region {
        self.region
    }

    /// Deploy a server and return it as fetched after submission.
    ///
    /// A generated password is copied into `extra.password` of the result.
    ///
    /// # Errors
    /// Returns [`ComputeError::InvalidArgument`] if the network attachment
    /// is unusable (no request is sent), or any transport error.
    pub async fn create_node(&self, req: CreateNodeRequest) -> Result<Node, ComputeError> {
        let auth = req.auth.clone().unwrap_or_else(NodeAuthPassword::generate);
        let body = request::deploy_server_body(&req, &auth.password)?;

        info!(
            name = %req.name,
            image_id = %req.image_id,
            start = req.start,
            "Deploying server"
        );

        let response = self
            .connection
            .request(ApiRequest::post(
                ApiFlavor::Organization,
                "server/deployServer",
                body,
            ))
            .await?;

        let node_id = request::deployed_server_id(&response).ok_or_else(|| {
            ComputeError::MalformedResponse(format!(
                "deploy response carries no serverId (responseCode: {})",
                request::response_code(&response).unwrap_or("none")
            ))
        })?;
        info!(node_id = %node_id, "Server deploy accepted");

        let mut node = self.get_node(node_id).await?;
        if auth.generated {
            node.extra.password = Some(auth.password);
        }
        Ok(node)
    }

    /// Submit a graceful power on. `true` means the provider accepted it.
    ///
    /// # Errors
    /// Returns any transport error.
    pub async fn start_node(&self, id: &str) -> Result<bool, ComputeError> {
        self.server_action(ServerAction::Start, id).await
    }

    /// Ask the guest OS to shut down. `true` means the request reached the
    /// provider, not that the OS has stopped.
    ///
    /// # Errors
    /// Returns any transport error.
    pub async fn shutdown_graceful(&self, id: &str) -> Result<bool, ComputeError> {
        self.server_action(ServerAction::Shutdown, id).await
    }

    /// Abruptly power off a server.
    ///
    /// # Errors
    /// Returns any transport error.
    pub async fn power_off(&self, id: &str) -> Result<bool, ComputeError> {
        self.server_action(ServerAction::PowerOff, id).await
    }

    /// Abruptly reset a server.
    ///
    /// # Errors
    /// Returns any transport error.
    pub async fn reset_node(&self, id: &str) -> Result<bool, ComputeError> {
        self.server_action(ServerAction::Reset, id).await
    }

    async fn server_action(&self, action: ServerAction, id: &str) -> Result<bool, ComputeError> {
        let body = request::server_action_body(action, id)?;
        let response = self
            .connection
            .request(ApiRequest::post(ApiFlavor::Organization, action.path(), body))
            .await?;

        let accepted = request::is_accepted(&response);
        info!(
            node_id = %id,
            action = %action,
            accepted,
            response_code = request::response_code(&response).unwrap_or_default(),
            "Server action submitted"
        );
        Ok(accepted)
    }

    /// List legacy networks, optionally in one location.
    ///
    /// # Errors
    /// Returns error if either listing fails or a network is placed in an
    /// unknown location.
    pub async fn list_networks(
        &self,
        location_id: Option<&str>,
    ) -> Result<Vec<Network>, ComputeError> {
        let action = match location_id {
            Some(id) => resource_action("networkWithLocation", id)?,
            None => "networkWithLocation".to_string(),
        };
        let doc = self
            .connection
            .request(ApiRequest::get(ApiFlavor::LegacyOrg, action))
            .await?;

        let locations = self.list_locations().await?;
        mapper::to_networks(&doc, &locations)
    }

    /// List network domains, optionally in one location.
    ///
    /// # Errors
    /// Returns error if either listing fails or a domain is placed in an
    /// unknown location.
    pub async fn list_network_domains(
        &self,
        location_id: Option<&str>,
    ) -> Result<Vec<NetworkDomain>, ComputeError> {
        let mut req = ApiRequest::get(ApiFlavor::Organization, "network/networkDomain");
        if let Some(id) = location_id {
            req = req.with_param("datacenterId", id);
        }
        let doc = self.connection.request(req).await?;

        let locations = self.list_locations().await?;
        mapper::to_network_domains(&doc, &locations)
    }

    /// List VLANs, optionally filtered by location and network domain.
    ///
    /// # Errors
    /// Returns error if either listing fails or a VLAN is placed in an
    /// unknown location.
    pub async fn list_vlans(
        &self,
        location_id: Option<&str>,
        network_domain_id: Option<&str>,
    ) -> Result<Vec<Vlan>, ComputeError> {
        let mut req = ApiRequest::get(ApiFlavor::Organization, "network/vlan");
        if let Some(id) = location_id {
            req = req.with_param("datacenterId", id);
        }
        if let Some(id) = network_domain_id {
            req = req.with_param("networkDomainId", id);
        }
        let doc = self.connection.request(req).await?;

        let locations = self.list_locations().await?;
        mapper::to_vlans(&doc, &locations)
    }

    /// Location with the given id from a fresh listing.
    ///
    /// # Errors
    /// Returns [`ComputeError::NotFound`] if no location has that id.
    pub async fn get_location_by_id(&self, id: &str) -> Result<NodeLocation, ComputeError> {
        let locations = self.list_locations().await?;
        mapper::resolve_location(id, &locations).cloned()
    }

    /// Resolve the datacenter a node lives in.
    ///
    /// # Errors
    /// Returns [`ComputeError::NotFound`] if the node carries no datacenter
    /// id or it is not in the current listing.
    pub async fn node_location(&self, node: &Node) -> Result<NodeLocation, ComputeError> {
        let datacenter_id = node.extra.datacenter_id.as_deref().ok_or_else(|| {
            ComputeError::NotFound(format!("datacenter of node {}", node.id))
        })?;
        self.get_location_by_id(datacenter_id).await
    }
}

/// `{collection}/{id}`, refusing ids that would reshape the path.
fn resource_action(collection: &str, id: &str) -> Result<String, ComputeError> {
    if id.is_empty() || id == "." || id == ".." || id.contains('/') {
        return Err(ComputeError::InvalidArgument(format!(
            "'{id}' is not a usable resource id"
        )));
    }
    Ok(format!("{collection}/{id}"))
}

#[async_trait]
impl NodeDriver for DimensionData {
    async fn list_nodes(&self) -> Result<Vec<Node>, ComputeError> {
        let doc = self
            .connection
            .request(ApiRequest::get(ApiFlavor::Organization, "server/server"))
            .await?;
        mapper::to_nodes(&doc)
    }

    async fn get_node(&self, id: &str) -> Result<Node, ComputeError> {
        debug!(node_id = %id, "Fetching server");
        let doc = self
            .connection
            .request(ApiRequest::get(
                ApiFlavor::Organization,
                resource_action("server/server", id)?,
            ))
            .await?;
        mapper::to_node(&doc)
    }

    async fn destroy_node(&self, id: &str) -> Result<bool, ComputeError> {
        self.server_action(ServerAction::Delete, id).await
    }

    async fn reboot_node(&self, id: &str) -> Result<bool, ComputeError> {
        self.server_action(ServerAction::Reboot, id).await
    }

    /// Only provider base images are listed; customer images are not.
    async fn list_images(
        &self,
        location_id: Option<&str>,
    ) -> Result<Vec<NodeImage>, ComputeError> {
        let mut req = ApiRequest::get(ApiFlavor::Legacy, "base/imageWithDiskSpeed");
        if let Some(id) = location_id {
            req = req.with_param("location", id);
        }
        let doc = self.connection.request(req).await?;

        let locations = self.list_locations().await?;
        mapper::to_base_images(&doc, &locations)
    }

    /// A server's size follows from its image, so only one size exists.
    async fn list_sizes(&self) -> Result<Vec<NodeSize>, ComputeError> {
        Ok(vec![NodeSize {
            id: "1".to_string(),
            name: "default".to_string(),
            ram: 0,
            disk: 0,
            bandwidth: 0,
            price: 0.0,
        }])
    }

    async fn list_locations(&self) -> Result<Vec<NodeLocation>, ComputeError> {
        let doc = self
            .connection
            .request(ApiRequest::get(
                ApiFlavor::Organization,
                "infrastructure/datacenter",
            ))
            .await?;
        mapper::to_locations(&doc)
    }
}
