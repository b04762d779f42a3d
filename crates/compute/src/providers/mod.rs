//! Provider abstractions for compute drivers.

pub mod dimensiondata;
mod traits;

pub use traits::{
    ComputeError, ImageExtra, Node, NodeAuthPassword, NodeDriver, NodeExtra, NodeImage,
    NodeLocation, NodeSize, NodeState, Status,
};
