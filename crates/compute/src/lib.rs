//! Compute driver for the Dimension Data cloud.
//!
//! This crate translates between the provider's XML remote control API and
//! typed compute entities: servers, base images, datacenters, networks,
//! network domains, VLANs and in-flight operation status.
//!
//! # Example
//!
//! ```rust,ignore
//! use cto_compute::providers::dimensiondata::{CreateNodeRequest, DimensionData, NetworkAttachment};
//! use cto_compute::providers::NodeDriver;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let driver = DimensionData::new("user", "password", "dd-na")?;
//!
//!     let node = driver.create_node(CreateNodeRequest {
//!         name: "web1".into(),
//!         image_id: "IMG1".into(),
//!         auth: None,
//!         description: "front end".into(),
//!         attachment: NetworkAttachment::Network { network_id: "NET1".into() },
//!         start: true,
//!     }).await?;
//!
//!     // Accepted, not finished: poll get_node and watch extra.status.
//!     let accepted = driver.reboot_node(&node.id).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod providers;
pub mod xml;

pub use providers::dimensiondata::DimensionData;
pub use providers::{ComputeError, Node, NodeDriver, NodeImage, NodeLocation, NodeState};
