//! Lazy section-tree traversals
//!
//! The iterators here work over anything implementing [`Tree`]: the derived
//! tree behind an immutable morphology, the mutable morphology, and the
//! mitochondria tree. They yield section ids; the views wrap those ids in
//! their own handle types.
//!
//! Builders reject cyclic input, so a cycle here means an invariant was
//! broken upstream. Depth-first and breadth-first never revisit an id;
//! upstream gives up after more steps than there are nodes.

use crate::enums::IterType;
use std::collections::{HashSet, VecDeque};

/// Read-only navigation shared by every tree representation
pub trait Tree {
    /// Number of nodes in the tree
    fn node_count(&self) -> usize;

    /// Root ids, in declaration order
    fn roots(&self) -> &[u32];

    fn parent_of(&self, id: u32) -> Option<u32>;

    /// Child ids, in declaration order
    fn children_of(&self, id: u32) -> &[u32];

    fn is_root(&self, id: u32) -> bool {
        self.parent_of(id).is_none()
    }
}

/// Preorder depth-first traversal
pub struct DepthFirst<'t, T: Tree + ?Sized> {
    tree: &'t T,
    stack: Vec<u32>,
    visited: HashSet<u32>,
}

impl<'t, T: Tree + ?Sized> DepthFirst<'t, T> {
    /// Traverse the subtree rooted at `start`
    pub fn new(tree: &'t T, start: u32) -> Self {
        Self {
            tree,
            stack: vec![start],
            visited: HashSet::new(),
        }
    }

    /// Traverse every tree, roots in declaration order
    pub fn from_roots(tree: &'t T) -> Self {
        Self {
            tree,
            stack: tree.roots().iter().rev().copied().collect(),
            visited: HashSet::new(),
        }
    }
}

impl<T: Tree + ?Sized> Iterator for DepthFirst<'_, T> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        while let Some(id) = self.stack.pop() {
            if !self.visited.insert(id) {
                tracing::error!("Depth-first traversal reached section {} twice", id);
                continue;
            }
            self.stack
                .extend(self.tree.children_of(id).iter().rev().copied());
            return Some(id);
        }
        None
    }
}

/// Level-order breadth-first traversal
pub struct BreadthFirst<'t, T: Tree + ?Sized> {
    tree: &'t T,
    queue: VecDeque<u32>,
    visited: HashSet<u32>,
}

impl<'t, T: Tree + ?Sized> BreadthFirst<'t, T> {
    pub fn new(tree: &'t T, start: u32) -> Self {
        Self {
            tree,
            queue: VecDeque::from([start]),
            visited: HashSet::new(),
        }
    }

    pub fn from_roots(tree: &'t T) -> Self {
        Self {
            tree,
            queue: tree.roots().iter().copied().collect(),
            visited: HashSet::new(),
        }
    }
}

impl<T: Tree + ?Sized> Iterator for BreadthFirst<'_, T> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        while let Some(id) = self.queue.pop_front() {
            if !self.visited.insert(id) {
                tracing::error!("Breadth-first traversal reached section {} twice", id);
                continue;
            }
            self.queue.extend(self.tree.children_of(id).iter().copied());
            return Some(id);
        }
        None
    }
}

/// Walk from a section to its root, both included
pub struct Upstream<'t, T: Tree + ?Sized> {
    tree: &'t T,
    current: Option<u32>,
    steps: usize,
}

impl<'t, T: Tree + ?Sized> Upstream<'t, T> {
    pub fn new(tree: &'t T, start: u32) -> Self {
        Self {
            tree,
            current: Some(start),
            steps: 0,
        }
    }
}

impl<T: Tree + ?Sized> Iterator for Upstream<'_, T> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let id = self.current?;
        self.steps += 1;
        if self.steps > self.tree.node_count() {
            tracing::error!("Upstream traversal from section {} does not reach a root", id);
            self.current = None;
            return None;
        }
        self.current = self.tree.parent_of(id);
        Some(id)
    }
}

/// Traversal from `start` in the given order
pub fn iter<'t, T: Tree + ?Sized>(
    tree: &'t T,
    start: u32,
    order: IterType,
) -> Box<dyn Iterator<Item = u32> + 't> {
    match order {
        IterType::DepthFirst => Box::new(DepthFirst::new(tree, start)),
        IterType::BreadthFirst => Box::new(BreadthFirst::new(tree, start)),
        IterType::Upstream => Box::new(Upstream::new(tree, start)),
    }
}

/// Path from the root down to `id`, both included
pub fn path_from_root<T: Tree + ?Sized>(tree: &T, id: u32) -> Vec<u32> {
    let mut path: Vec<u32> = Upstream::new(tree, id).collect();
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Adjacency-list tree for exercising the iterators directly
    struct TestTree {
        parents: Vec<Option<u32>>,
        children: Vec<Vec<u32>>,
        roots: Vec<u32>,
    }

    impl TestTree {
        fn from_parents(parents: &[i32]) -> Self {
            let n = parents.len();
            let mut children = vec![Vec::new(); n];
            let mut roots = Vec::new();
            for (id, p) in parents.iter().enumerate() {
                if *p < 0 {
                    roots.push(id as u32);
                } else {
                    children[*p as usize].push(id as u32);
                }
            }
            Self {
                parents: parents.iter().map(|p| u32::try_from(*p).ok()).collect(),
                children,
                roots,
            }
        }
    }

    impl Tree for TestTree {
        fn node_count(&self) -> usize {
            self.parents.len()
        }
        fn roots(&self) -> &[u32] {
            &self.roots
        }
        fn parent_of(&self, id: u32) -> Option<u32> {
            self.parents.get(id as usize).copied().flatten()
        }
        fn children_of(&self, id: u32) -> &[u32] {
            self.children.get(id as usize).map(Vec::as_slice).unwrap_or(&[])
        }
    }

    //      0           5
    //    /   \         |
    //   1     4        6
    //  / \
    // 2   3
    fn sample() -> TestTree {
        TestTree::from_parents(&[-1, 0, 1, 1, 0, -1, 5])
    }

    #[test]
    fn test_depth_first_preorder() {
        let tree = sample();
        let order: Vec<u32> = DepthFirst::new(&tree, 0).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);

        let all: Vec<u32> = DepthFirst::from_roots(&tree).collect();
        assert_eq!(all, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_breadth_first_level_order() {
        let tree = sample();
        let order: Vec<u32> = BreadthFirst::new(&tree, 0).collect();
        assert_eq!(order, vec![0, 1, 4, 2, 3]);

        let all: Vec<u32> = BreadthFirst::from_roots(&tree).collect();
        assert_eq!(all, vec![0, 5, 1, 4, 6, 2, 3]);
    }

    #[test]
    fn test_upstream_ends_at_root() {
        let tree = sample();
        let up: Vec<u32> = Upstream::new(&tree, 3).collect();
        assert_eq!(up, vec![3, 1, 0]);
        assert_eq!(Upstream::new(&tree, 5).collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn test_upstream_reversed_is_dfs_prefix_path() {
        let tree = sample();
        for id in 0..tree.node_count() as u32 {
            let path = path_from_root(&tree, id);
            let root = path[0];
            assert!(tree.is_root(root));
            // Every ancestor precedes its descendant in preorder.
            let dfs: Vec<u32> = DepthFirst::new(&tree, root).collect();
            let positions: Vec<usize> = path
                .iter()
                .map(|p| dfs.iter().position(|d| d == p).unwrap())
                .collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_each_section_visited_once() {
        let tree = sample();
        for order in [IterType::DepthFirst, IterType::BreadthFirst] {
            let mut seen: Vec<u32> = iter(&tree, 0, order).collect();
            seen.sort();
            assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        }
    }

    #[test]
    fn test_cycle_does_not_loop() {
        // 0 -> 1 -> 2 -> 0 with no root at all
        let tree = TestTree {
            parents: vec![Some(2), Some(0), Some(1)],
            children: vec![vec![1], vec![2], vec![0]],
            roots: vec![],
        };
        assert_eq!(DepthFirst::new(&tree, 0).count(), 3);
        assert_eq!(BreadthFirst::new(&tree, 0).count(), 3);
        assert_eq!(Upstream::new(&tree, 0).count(), 3);
    }
}
