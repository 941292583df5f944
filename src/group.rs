//! The group algebra context consumed by the resolution machinery.
//!
//! A [`GroupAlgebra`] describes the modular group algebra `F_p G` of a finite
//! p-group through a canonical basis of "nontips": paths in the generators
//! ("arrows") of the algebra, arranged as a prefix tree. Index 0 is the empty
//! path, basis elements are sorted by non-decreasing length, and within one
//! length a smaller index means a larger element in the leading-term order.
//!
//! Right multiplication by each arrow is given as a `|basis| x |basis|` matrix
//! over `F_p`; row `i` of the action matrix of arrow `a` is the product of
//! basis element `i` with `a`.

use crate::error::{ResolutionError, Result};
use crate::field::{FieldProperties, PrimeField};
use crate::matrix::Matrix;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;

/// Letters used for the arrows in path names.
pub const ARROW_NAMES: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// One node of the path tree, i.e. one basis element.
#[derive(Clone, Debug)]
pub struct PathNode {
    /// Position in the basis.
    pub index: usize,
    /// Length of the path.
    pub depth: usize,
    /// The path with its last arrow removed.
    pub parent: Option<usize>,
    /// Arrow leading from `parent` to this node.
    pub last_arrow: Option<usize>,
    /// The path as a word in the arrow letters.
    pub path: String,
    children: Vec<Option<usize>>,
}

impl PathNode {
    /// The basis element obtained by appending `arrow`, if it is a nontip.
    pub fn child(&self, arrow: usize) -> Option<usize> {
        self.children.get(arrow).copied().flatten()
    }
}

/// Serializable description of a group algebra.
///
/// `nontips` lists the paths in basis order (the empty path first) and
/// `action[a][i]` is row `i` of the right action of arrow `a`, as canonical
/// integers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupDescription {
    /// Human readable name, e.g. `"Z/4"`.
    pub name: String,
    /// Characteristic of the coefficient field.
    pub prime: u64,
    /// Basis paths in index order.
    pub nontips: Vec<String>,
    /// Right action matrices, one per arrow.
    pub action: Vec<Vec<Vec<u32>>>,
}

/// Modular group algebra of a p-group, with its path-tree basis.
#[derive(Clone, Debug)]
pub struct GroupAlgebra {
    name: String,
    field: PrimeField,
    arrows: usize,
    nodes: Vec<PathNode>,
    action: Vec<Matrix>,
    depth_steps: Vec<usize>,
    max_length: usize,
}

impl GroupAlgebra {
    /// Build a group algebra from its basis paths and arrow actions.
    ///
    /// The paths must start with the empty path, be sorted by length, be
    /// closed under taking prefixes, and every proper prefix must come before
    /// the path itself. One square action matrix of size `|basis|` is needed
    /// per arrow.
    pub fn new(name: &str, field: PrimeField, nontips: &[String], action: Vec<Matrix>) -> Result<Self> {
        let n = nontips.len();
        if n == 0 || !nontips[0].is_empty() {
            return Err(ResolutionError::InvalidGroup(
                "the basis must start with the empty path".to_string(),
            ));
        }
        let arrows = action.len();
        if arrows > ARROW_NAMES.len() {
            return Err(ResolutionError::InvalidGroup(format!("too many arrows ({})", arrows)));
        }
        for (a, m) in action.iter().enumerate() {
            if m.nor() != n || m.noc() != n || *m.field() != field {
                return Err(ResolutionError::InvalidGroup(format!(
                    "action matrix of arrow {} is not a {} x {} matrix over {}",
                    a, n, n, field
                )));
            }
        }

        let mut nodes: Vec<PathNode> = Vec::with_capacity(n);
        let mut position: HashMap<&str, usize> = HashMap::with_capacity(n);
        for (index, path) in nontips.iter().enumerate() {
            let depth = path.len();
            if let Some(prev) = nodes.last() {
                if prev.depth > depth {
                    return Err(ResolutionError::InvalidGroup(format!(
                        "path {:?} is shorter than its predecessor",
                        path
                    )));
                }
            }
            let (parent, last_arrow) = match path.as_bytes().last() {
                None if index == 0 => (None, None),
                None => {
                    return Err(ResolutionError::InvalidGroup(
                        "the empty path occurs twice".to_string(),
                    ))
                }
                Some(&letter) => {
                    let arrow = ARROW_NAMES[..arrows]
                        .iter()
                        .position(|&c| c == letter)
                        .ok_or_else(|| {
                            ResolutionError::InvalidGroup(format!("path {:?} uses an unknown arrow", path))
                        })?;
                    let prefix = &path[..path.len() - 1];
                    let parent = position
                        .get(prefix)
                        .copied()
                        .ok_or_else(|| {
                            ResolutionError::InvalidGroup(format!("prefix of {:?} is not a nontip", path))
                        })?;
                    (Some(parent), Some(arrow))
                }
            };
            if let (Some(parent), Some(arrow)) = (parent, last_arrow) {
                if nodes[parent].children[arrow].is_some() {
                    return Err(ResolutionError::InvalidGroup(format!("path {:?} occurs twice", path)));
                }
                nodes[parent].children[arrow] = Some(index);
            }
            position.insert(path.as_str(), index);
            nodes.push(PathNode {
                index,
                depth,
                parent,
                last_arrow,
                path: path.clone(),
                children: vec![None; arrows],
            });
        }

        let max_length = nodes[n - 1].depth;
        let mut depth_steps = vec![n; max_length + 3];
        for d in (0..=max_length).rev() {
            if let Some(first) = nodes.iter().position(|node| node.depth >= d) {
                depth_steps[d] = first;
            }
        }
        for d in 0..=max_length {
            if depth_steps[d] == depth_steps[d + 1] {
                return Err(ResolutionError::InvalidGroup(format!("no basis element has length {}", d)));
            }
        }

        Ok(GroupAlgebra {
            name: name.to_string(),
            field,
            arrows,
            nodes,
            action,
            depth_steps,
            max_length,
        })
    }

    /// Build from a deserialized description.
    pub fn from_description(desc: &GroupDescription) -> Result<Self> {
        let field = PrimeField::new(desc.prime)?;
        let n = desc.nontips.len();
        let action = desc
            .action
            .iter()
            .map(|rows| Matrix::from_rows(&field, n, rows))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| ResolutionError::InvalidGroup(e.to_string()))?;
        GroupAlgebra::new(&desc.name, field, &desc.nontips, action)
    }

    /// Read a JSON group description from `path`.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ResolutionError::io(path, e))?;
        let desc: GroupDescription = serde_json::from_str(&text)?;
        GroupAlgebra::from_description(&desc)
    }

    /// The serializable description of this algebra.
    pub fn description(&self) -> GroupDescription {
        GroupDescription {
            name: self.name.clone(),
            prime: self.field.characteristic(),
            nontips: self.nodes.iter().map(|node| node.path.clone()).collect(),
            action: self.action.iter().map(|m| m.to_rows()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self) -> &PrimeField {
        &self.field
    }

    /// Characteristic of the coefficient field.
    pub fn prime(&self) -> u64 {
        self.field.characteristic()
    }

    /// Number of algebra generators.
    pub fn arrows(&self) -> usize {
        self.arrows
    }

    /// Dimension of the algebra, i.e. the group order.
    pub fn nontips(&self) -> usize {
        self.nodes.len()
    }

    /// Length of the longest basis path.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn node(&self, index: usize) -> &PathNode {
        &self.nodes[index]
    }

    pub fn depth(&self, index: usize) -> usize {
        self.nodes[index].depth
    }

    pub fn child(&self, index: usize, arrow: usize) -> Option<usize> {
        self.nodes[index].child(arrow)
    }

    /// Right action of `arrow`.
    pub fn action(&self, arrow: usize) -> &Matrix {
        &self.action[arrow]
    }

    /// Indices of the basis elements of length `depth`.
    ///
    /// Empty for lengths beyond [`max_length`](Self::max_length).
    pub fn depth_range(&self, depth: usize) -> Range<usize> {
        let n = self.nontips();
        if depth > self.max_length {
            return n..n;
        }
        self.depth_steps[depth]..self.depth_steps[depth + 1]
    }

    /// First index of each length, padded with two trailing `|basis|` entries.
    pub fn depth_steps(&self) -> &[usize] {
        &self.depth_steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn z4() -> GroupAlgebra {
        let field = PrimeField::new(2).unwrap();
        let paths: Vec<String> = ["", "a", "aa", "aaa"].iter().map(|s| s.to_string()).collect();
        let action = Matrix::from_rows(
            &field,
            4,
            &[vec![0, 1, 0, 0], vec![0, 0, 1, 0], vec![0, 0, 0, 1], vec![0, 0, 0, 0]],
        )
        .unwrap();
        GroupAlgebra::new("Z/4", field, &paths, vec![action]).unwrap()
    }

    #[test]
    fn test_path_tree_shape() {
        let g = z4();
        assert_eq!(g.nontips(), 4);
        assert_eq!(g.arrows(), 1);
        assert_eq!(g.max_length(), 3);
        assert_eq!(g.child(0, 0), Some(1));
        assert_eq!(g.child(3, 0), None);
        assert_eq!(g.node(2).parent, Some(1));
        assert_eq!(g.node(2).path, "aa");
    }

    #[test]
    fn test_depth_steps() {
        let g = z4();
        assert_eq!(g.depth_steps(), &[0, 1, 2, 3, 4, 4]);
        assert_eq!(g.depth_range(2), 2..3);
        assert_eq!(g.depth_range(4), 4..4);
        assert_eq!(g.depth_range(17), 4..4);
    }

    #[test]
    fn test_rejects_missing_prefix() {
        let field = PrimeField::new(2).unwrap();
        let paths: Vec<String> = ["", "aa"].iter().map(|s| s.to_string()).collect();
        let action = Matrix::zero(&field, 2, 2);
        assert!(matches!(
            GroupAlgebra::new("broken", field, &paths, vec![action]),
            Err(ResolutionError::InvalidGroup(_))
        ));
    }

    #[test]
    fn test_parents_are_prefixes() {
        let g = crate::common_groups::elementary_abelian_group(3, 2).unwrap();
        for i in 1..g.nontips() {
            let node = g.node(i);
            let parent = g.node(node.parent.unwrap());
            assert_eq!(parent.path, node.path[..node.path.len() - 1]);
            assert_eq!(g.child(parent.index, node.last_arrow.unwrap()), Some(i));
        }
    }

    #[test]
    fn test_rejects_wrong_action_size() {
        let field = PrimeField::new(2).unwrap();
        let paths: Vec<String> = ["", "a"].iter().map(|s| s.to_string()).collect();
        let action = Matrix::zero(&field, 3, 3);
        assert!(GroupAlgebra::new("broken", field, &paths, vec![action]).is_err());
    }

    #[test]
    fn test_description_round_trip() {
        let g = z4();
        let json = serde_json::to_string(&g.description()).unwrap();
        let desc: GroupDescription = serde_json::from_str(&json).unwrap();
        let back = GroupAlgebra::from_description(&desc).unwrap();
        assert_eq!(back.name(), "Z/4");
        assert_eq!(back.nontips(), 4);
        assert_eq!(back.action(0), g.action(0));
    }
}
