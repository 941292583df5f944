//! Homomorphisms between free right modules over a group algebra.
//!
//! A homomorphism `f: F_s -> F_r` is stored the way differentials are stored
//! on disk: `s` consecutive blocks of `r` rows, where row `j` of block `k` is
//! the coefficient vector (over the nontips) of the `j`-th component of
//! `f(e_k)`.

use crate::error::{ResolutionError, Result};
use crate::field::FieldElement;
use crate::group::GroupAlgebra;
use crate::matrix::{add_scaled_row, multiply_rows, Matrix};

/// Right-multiplication matrices of every basis element.
///
/// The matrix of a path is the product of the arrow actions along it, so it is
/// built top-down through the path tree.
pub struct RightActions<'a> {
    group: &'a GroupAlgebra,
    matrices: Vec<Matrix>,
}

impl<'a> RightActions<'a> {
    /// Compute the action of every basis element of `group`.
    pub fn new(group: &'a GroupAlgebra) -> Result<Self> {
        let field = group.field();
        let n = group.nontips();
        let mut matrices: Vec<Matrix> = Vec::with_capacity(n);
        matrices.push(Matrix::identity(field, n));
        for i in 1..n {
            let node = group.node(i);
            match (node.parent, node.last_arrow) {
                (Some(parent), Some(arrow)) => {
                    let m = matrices[parent].multiply(group.action(arrow))?;
                    matrices.push(m);
                }
                _ => {
                    return Err(ResolutionError::InvalidGroup(format!(
                        "basis element {} has no parent",
                        i
                    )))
                }
            }
        }
        Ok(RightActions { group, matrices })
    }

    /// Right action of basis element `index`.
    pub fn basis_element(&self, index: usize) -> &Matrix {
        &self.matrices[index]
    }

    /// Right action of the algebra element with coefficient vector `element`.
    pub fn right_action_matrix(&self, element: &[FieldElement]) -> Matrix {
        let field = self.group.field();
        let n = self.group.nontips();
        let mut result = Matrix::zero(field, n, n);
        for (k, coeff) in element.iter().enumerate() {
            if !field.is_zero(coeff) {
                add_scaled_row(field, result.data_mut(), self.matrices[k].data(), *coeff);
            }
        }
        result
    }

    /// Compose `alpha: F_s -> F_r` with `beta: F_r -> F_q`, giving `beta o alpha`.
    ///
    /// `alpha` has `s * r` rows and `beta` has `r * q` rows.
    pub fn compose(&self, alpha: &Matrix, r: usize, beta: &Matrix, q: usize) -> Result<Matrix> {
        let field = self.group.field();
        let n = self.group.nontips();
        if r == 0 || alpha.nor() % r != 0 || beta.nor() != r * q || alpha.noc() != n || beta.noc() != n {
            return Err(ResolutionError::BadArgument(format!(
                "cannot compose a {}-row map into rank {} with a {}-row map into rank {}",
                alpha.nor(),
                r,
                beta.nor(),
                q
            )));
        }
        let s = alpha.nor() / r;
        let mut gamma = Matrix::zero(field, s * q, n);
        let mut product = field.zeros(q * n);
        for k in 0..s {
            for j in 0..r {
                let coeff = alpha.row(k * r + j);
                if coeff.iter().all(|x| field.is_zero(x)) {
                    continue;
                }
                let action = self.right_action_matrix(coeff);
                // gamma_{k,l} += beta_{j,l} * alpha_{k,j}
                multiply_rows(field, beta.rows(j * q, q), n, &action, &mut product);
                add_scaled_row(field, gamma.rows_mut(k * q, q), &product, field.one());
            }
        }
        Ok(gamma)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common_groups::{cyclic_group, elementary_abelian_group};

    #[test]
    fn test_basis_element_actions() {
        let g = cyclic_group(2, 2).unwrap();
        let actions = RightActions::new(&g).unwrap();
        // x^2 acting on 1 gives x^2, on x gives x^3, on x^2 and x^3 gives 0
        assert_eq!(
            actions.basis_element(2).to_rows(),
            vec![vec![0, 0, 1, 0], vec![0, 0, 0, 1], vec![0, 0, 0, 0], vec![0, 0, 0, 0]]
        );
    }

    #[test]
    fn test_right_action_of_sum() {
        let g = cyclic_group(3, 1).unwrap();
        let field = g.field();
        let actions = RightActions::new(&g).unwrap();
        // 1 + 2x
        let element: Vec<_> = [1, 2, 0].iter().map(|&c| field.from_u32(c)).collect();
        let m = actions.right_action_matrix(&element);
        assert_eq!(m.to_rows(), vec![vec![1, 2, 0], vec![0, 1, 2], vec![0, 0, 1]]);
    }

    #[test]
    fn test_compose_multiplication_maps() {
        let g = elementary_abelian_group(2, 2).unwrap();
        let field = g.field();
        let actions = RightActions::new(&g).unwrap();
        let n = g.nontips();
        // Multiplication by a, then by b, is multiplication by ab
        let mut by_a = Matrix::zero(field, 1, n);
        by_a.set_entry(0, 2, 1);
        let mut by_b = Matrix::zero(field, 1, n);
        by_b.set_entry(0, 1, 1);
        let composed = actions.compose(&by_a, 1, &by_b, 1).unwrap();
        assert_eq!(composed.to_rows(), vec![vec![0, 0, 0, 1]]);

        // a * a = 0 in characteristic two
        assert!(actions.compose(&by_a, 1, &by_a, 1).unwrap().is_zero());
    }

    #[test]
    fn test_compose_rejects_bad_shapes() {
        let g = cyclic_group(2, 1).unwrap();
        let actions = RightActions::new(&g).unwrap();
        let m = Matrix::zero(g.field(), 3, 2);
        assert!(actions.compose(&m, 2, &m, 1).is_err());
    }
}
