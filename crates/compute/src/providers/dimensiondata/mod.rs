//! Dimension Data cloud (CaaS) provider.
//!
//! Implements the [`NodeDriver`](crate::providers::NodeDriver) trait over the
//! provider's XML API.
//!
//! ## Overview
//!
//! Servers, base images and datacenters are read from two API generations:
//! the legacy `/oec/0.9` API (base images, flat networks) and the
//! organization-scoped `/caas/2.0` API (servers, datacenters, network
//! domains, VLANs, and every server action). Actions are acknowledged with
//! `IN_PROGRESS` and complete later; poll `get_node` and inspect
//! `extra.status` to follow them.

mod client;
mod connection;
mod mapper;
mod models;
pub mod regions;
pub mod request;

pub use client::DimensionData;
pub use connection::{ApiFlavor, ApiRequest, Connection, DimensionDataConnection};
pub use mapper::resolve_location;
pub use models::*;
pub use regions::{Region, API_ENDPOINTS, DEFAULT_REGION};
