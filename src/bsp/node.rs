//! BSP tree node data structure

use crate::aabb::Aabb;
use std::ops::Range;

/// A BSP tree node: links to its parent and front/back children plus a range
/// of this node's own polygons.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BspNode {
    /// Position of this node in the tree arena.
    pub index: usize,

    /// `None` only for the tree root.
    pub parent: Option<usize>,

    /// Subtree in *front* of the splitting plane.
    pub front: Option<usize>,

    /// Subtree *behind* the splitting plane.
    pub back: Option<usize>,

    /// First entry of this node's range in [`BspTree::polygon_indices`](super::BspTree).
    pub polygon_start: usize,

    /// Number of polygon indices owned by this node. Interior nodes may
    /// carry geometry too.
    pub polygon_count: usize,

    /// Used only to ask how many lights touch this region.
    pub bounds: Aabb,
}

impl BspNode {
    /// Create a node with no links and no geometry
    pub const fn new(index: usize, bounds: Aabb) -> Self {
        Self {
            index,
            parent: None,
            front: None,
            back: None,
            polygon_start: 0,
            polygon_count: 0,
            bounds,
        }
    }

    /// Builder-style setter for the polygon range
    pub const fn with_polygons(mut self, start: usize, count: usize) -> Self {
        self.polygon_start = start;
        self.polygon_count = count;
        self
    }

    /// A node without front and back children
    #[inline]
    pub const fn is_leaf(&self) -> bool {
        self.front.is_none() && self.back.is_none()
    }

    #[inline]
    pub const fn has_geometry(&self) -> bool {
        self.polygon_count > 0
    }

    #[inline]
    pub const fn polygon_range(&self) -> Range<usize> {
        self.polygon_start..self.polygon_start + self.polygon_count
    }

    /// Children in walk order: front first, then back
    pub fn children(&self) -> impl Iterator<Item = usize> {
        self.front.into_iter().chain(self.back)
    }
}
