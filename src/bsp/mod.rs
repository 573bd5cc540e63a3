//! Static Binary Space Partitioning (BSP) trees as supplied by the asset loader
//!
//! Nodes live in a flat arena and refer to each other by index, so walking
//! up (parent) or down (front/back) never involves shared ownership.

pub mod node;
pub mod tree;

pub use node::BspNode;
pub use tree::BspTree;
