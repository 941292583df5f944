//! The word forest: which (block, basis element) pairs are divisible by a
//! reduced vector, and by which one.
//!
//! There is one tree per ambient block, each a copy of the group's path tree.
//! Nodes live in a flat arena indexed by `block * |basis| + basis_index`;
//! children are found through the path tree, so no links are stored.

use crate::error::{ResolutionError, Result};
use crate::group::GroupAlgebra;

/// Identifier of a reduced vector in its generating set.
pub(crate) type RvId = usize;

/// How a divisible node relates to its divisor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NodeStatus {
    /// No reduced vector divides this node.
    Unmarked,
    /// The node is the leading term of its divisor.
    Scalar,
    /// A proper multiple whose vector is not cached yet.
    NonScalar,
    /// A proper multiple, cached at this position of the current slice.
    Product(usize),
}

#[derive(Clone, Debug)]
pub(crate) struct ForestNode {
    pub divisor: Option<RvId>,
    /// Basis element the divisor is multiplied by to reach this node.
    pub quotient: usize,
    pub status: NodeStatus,
}

/// Result of marking the multiples of a new reduced vector.
#[derive(Debug, Default)]
pub(crate) struct MarkOutcome {
    /// Nodes that had no divisor before.
    pub newly_classified: usize,
    /// Reduced vectors whose tip is now a proper multiple of the new vector.
    pub displaced: Vec<RvId>,
}

pub(crate) struct WordForest {
    nontips: usize,
    nodes: Vec<ForestNode>,
}

impl WordForest {
    pub fn new(group: &GroupAlgebra, blocks: usize) -> Self {
        let nontips = group.nontips();
        let nodes = (0..blocks * nontips)
            .map(|_| ForestNode {
                divisor: None,
                quotient: 0,
                status: NodeStatus::Unmarked,
            })
            .collect();
        WordForest { nontips, nodes }
    }

    #[inline]
    pub fn index(&self, block: usize, pat: usize) -> usize {
        block * self.nontips + pat
    }

    /// Basis element of a node.
    #[inline]
    pub fn pattern(&self, index: usize) -> usize {
        index % self.nontips
    }

    #[inline]
    pub fn block(&self, index: usize) -> usize {
        index / self.nontips
    }

    pub fn node(&self, index: usize) -> &ForestNode {
        &self.nodes[index]
    }

    pub fn node_mut(&mut self, index: usize) -> &mut ForestNode {
        &mut self.nodes[index]
    }

    /// Number of nodes that have a divisor.
    pub fn classified(&self) -> usize {
        self.nodes.iter().filter(|n| n.divisor.is_some()).count()
    }

    /// Record `rv`, whose leading term sits at `start`, as divisor of `start`
    /// and of everything below it.
    ///
    /// Walking down, the quotient follows the same arrows from the root of the
    /// path tree. The first previous divisor met on each branch is reported as
    /// displaced; nodes below it were already classified and do not count as
    /// new.
    pub fn mark_multiples(&mut self, group: &GroupAlgebra, rv: RvId, start: usize) -> Result<MarkOutcome> {
        let block = self.block(start);
        let mut outcome = MarkOutcome::default();
        let mut stack = vec![(self.pattern(start), false, 0usize)];

        while let Some((pat, mut found, quotient)) = stack.pop() {
            let index = self.index(block, pat);
            let node = &mut self.nodes[index];
            if !found {
                if let Some(previous) = node.divisor {
                    outcome.displaced.push(previous);
                    found = true;
                }
            }
            node.divisor = Some(rv);
            node.quotient = quotient;
            node.status = if quotient == 0 {
                NodeStatus::Scalar
            } else {
                NodeStatus::NonScalar
            };
            if !found {
                outcome.newly_classified += 1;
            }
            for arrow in 0..group.arrows() {
                if let Some(child) = group.child(pat, arrow) {
                    let next = group.child(quotient, arrow).ok_or_else(|| {
                        ResolutionError::theoretical(format!(
                            "path tree has no extension of quotient {} along arrow {}",
                            quotient, arrow
                        ))
                    })?;
                    stack.push((child, found, next));
                }
            }
        }
        Ok(outcome)
    }
}
