//! Arena-backed BSP tree and structural queries

use crate::aabb::Aabb;
use crate::bsp::node::BspNode;
use crate::errors::CompileError;

/// Index of the tree root inside the arena.
pub const ROOT: usize = 0;

/// A pre-built BSP tree: the node arena plus the polygon-index array the
/// nodes' ranges point into.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BspTree {
    pub nodes: Vec<BspNode>,
    pub polygon_indices: Vec<usize>,
}

impl BspTree {
    pub const fn new(nodes: Vec<BspNode>, polygon_indices: Vec<usize>) -> Self {
        Self {
            nodes,
            polygon_indices,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, index: usize) -> &BspNode {
        &self.nodes[index]
    }

    #[inline]
    pub fn parent(&self, index: usize) -> Option<usize> {
        self.nodes[index].parent
    }

    /// Parent of the parent, if both exist
    #[inline]
    pub fn grandparent(&self, index: usize) -> Option<usize> {
        self.parent(index).and_then(|p| self.parent(p))
    }

    /// Walk up to `levels` parent links from `index`, stopping early at the root.
    ///
    /// Returns the node reached and the number of links actually climbed.
    pub fn ancestor(&self, index: usize, levels: usize) -> (usize, usize) {
        let mut current = index;
        let mut climbed = 0;
        while climbed < levels {
            match self.parent(current) {
                Some(p) => {
                    current = p;
                    climbed += 1;
                },
                None => break,
            }
        }
        (current, climbed)
    }

    /// Number of parent links between `index` and the root.
    pub fn node_depth(&self, index: usize) -> usize {
        self.ancestor(index, usize::MAX).1
    }

    /// Number of links on the longest root-to-node path.
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut deepest = 0;
        let mut stack = vec![(ROOT, 0usize)];
        while let Some((index, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(self.nodes[index].children().map(|c| (c, depth + 1)));
        }
        deepest
    }

    /// Polygon ids referenced by a node's own range
    pub fn polygon_ids(&self, index: usize) -> &[usize] {
        &self.polygon_indices[self.nodes[index].polygon_range()]
    }

    /// Bounds of a node
    #[inline]
    pub fn bounds(&self, index: usize) -> &Aabb {
        &self.nodes[index].bounds
    }

    /// Check arena consistency against a polygon table of `polygon_count`
    /// entries.
    ///
    /// A tree that passes can be walked and climbed without bounds checks
    /// failing or loops running forever.
    pub fn validate(&self, polygon_count: usize) -> Result<(), CompileError> {
        let len = self.nodes.len();
        match self.nodes.first() {
            Some(root) if root.parent.is_none() => {},
            _ => return Err(CompileError::MissingRoot),
        }

        for (position, node) in self.nodes.iter().enumerate() {
            if node.index != position {
                return Err(CompileError::IndexMismatch {
                    position,
                    stored: node.index,
                });
            }

            if let Some(parent) = node.parent {
                if parent >= len {
                    return Err(CompileError::NodeOutOfRange {
                        node: position,
                        target: parent,
                        len,
                    });
                }
                if !self.nodes[parent].children().any(|child| child == position) {
                    return Err(CompileError::ParentMismatch {
                        node: position,
                        expected: None,
                        found: Some(parent),
                    });
                }
            } else if position != ROOT {
                return Err(CompileError::ParentMismatch {
                    node: position,
                    expected: None,
                    found: None,
                });
            }

            for child in node.children() {
                if child >= len {
                    return Err(CompileError::NodeOutOfRange {
                        node: position,
                        target: child,
                        len,
                    });
                }
                let found = self.nodes[child].parent;
                if found != Some(position) {
                    return Err(CompileError::ParentMismatch {
                        node: child,
                        expected: Some(position),
                        found,
                    });
                }
            }

            let range = node.polygon_range();
            if range.end > self.polygon_indices.len() {
                return Err(CompileError::PolygonRangeOutOfBounds {
                    node: position,
                    start: range.start,
                    end: range.end,
                    len: self.polygon_indices.len(),
                });
            }
        }

        if let Some(&index) = self.polygon_indices.iter().find(|&&i| i >= polygon_count) {
            return Err(CompileError::PolygonOutOfRange {
                index,
                len: polygon_count,
            });
        }

        // Parent links agree with child links, so a second visit can only
        // come from a front/back pair naming the same node.
        let mut visited = vec![false; len];
        let mut stack = vec![ROOT];
        while let Some(index) = stack.pop() {
            if std::mem::replace(&mut visited[index], true) {
                return Err(CompileError::Cycle(index));
            }
            stack.extend(self.nodes[index].children());
        }

        // What is left over links only to itself, a loop detached from the root
        match visited.iter().position(|&seen| !seen) {
            Some(index) => Err(CompileError::Cycle(index)),
            None => Ok(()),
        }
    }
}

/// Incremental construction of a [`BspTree`] with consistent links.
///
/// ```rust
/// # use bspchunk::{aabb::Aabb, bsp::tree::TreeBuilder};
/// # use nalgebra::Point3;
/// let bb = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
/// let mut builder = TreeBuilder::new(bb, &[]);
/// let front = builder.add_front(0, bb, &[0, 1]);
/// builder.add_back(0, bb, &[2]);
/// let tree = builder.build();
/// assert_eq!(tree.parent(front), Some(0));
/// assert_eq!(tree.polygon_ids(front), &[0, 1]);
/// assert_eq!(tree.depth(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    tree: BspTree,
}

impl TreeBuilder {
    /// Start a tree whose root owns `polygons`
    pub fn new(bounds: Aabb, polygons: &[usize]) -> Self {
        let mut builder = Self {
            tree: BspTree::default(),
        };
        builder.push(None, bounds, polygons);
        builder
    }

    fn push(&mut self, parent: Option<usize>, bounds: Aabb, polygons: &[usize]) -> usize {
        let index = self.tree.nodes.len();
        let start = self.tree.polygon_indices.len();
        self.tree.polygon_indices.extend_from_slice(polygons);
        let mut node = BspNode::new(index, bounds).with_polygons(start, polygons.len());
        node.parent = parent;
        self.tree.nodes.push(node);
        index
    }

    /// Attach a front child to `parent`, replacing any existing one
    pub fn add_front(&mut self, parent: usize, bounds: Aabb, polygons: &[usize]) -> usize {
        let index = self.push(Some(parent), bounds, polygons);
        self.tree.nodes[parent].front = Some(index);
        index
    }

    /// Attach a back child to `parent`, replacing any existing one
    pub fn add_back(&mut self, parent: usize, bounds: Aabb, polygons: &[usize]) -> usize {
        let index = self.push(Some(parent), bounds, polygons);
        self.tree.nodes[parent].back = Some(index);
        index
    }

    pub fn build(self) -> BspTree {
        self.tree
    }
}
