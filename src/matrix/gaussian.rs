//! Dense Gaussian elimination.
//!
//! Used to check image dimensions of differentials. The Gröbner core never
//! echelonizes a whole matrix.

use super::{add_scaled_row, find_pivot, scale_row, Matrix};
use crate::error::Result;

/// Reduce `matrix` to row echelon form in place.
///
/// Pivot rows are normalized to leading coefficient one and moved to the top,
/// in the order their pivots were found. Returns the rank.
pub fn echelonize(matrix: &mut Matrix) -> Result<usize> {
    let field = matrix.field().clone();
    let mut pivots: Vec<usize> = Vec::new();
    let mut rank = 0;

    for i in 0..matrix.nor() {
        let mut row = matrix.row(i).to_vec();
        // Reduce the current row by all known pivot rows
        for (k, &col) in pivots.iter().enumerate() {
            let coeff = row[col];
            if !field.is_zero(&coeff) {
                let reducer = matrix.row(k).to_vec();
                add_scaled_row(&field, &mut row, &reducer, field.negate(coeff));
            }
        }
        if let Some((col, lead)) = find_pivot(&field, &row) {
            let inv = field.invert(&lead)?;
            scale_row(&field, &mut row, inv);
            matrix.row_mut(rank).copy_from_slice(&row);
            pivots.push(col);
            rank += 1;
        }
    }
    for i in rank..matrix.nor() {
        for x in matrix.row_mut(i).iter_mut() {
            *x = field.zero();
        }
    }
    Ok(rank)
}

/// Rank of `matrix`, leaving it untouched.
pub fn rank(matrix: &Matrix) -> Result<usize> {
    let mut copy = matrix.clone();
    echelonize(&mut copy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::PrimeField;

    #[test]
    fn test_rank_of_dependent_rows() {
        let field = PrimeField::new(3).unwrap();
        // Third row = first + second
        let m = Matrix::from_rows(
            &field,
            3,
            &[vec![1, 0, 2], vec![0, 1, 1], vec![1, 1, 0]],
        )
        .unwrap();
        assert_eq!(rank(&m).unwrap(), 2);
    }

    #[test]
    fn test_echelon_form_is_normalized() {
        let field = PrimeField::new(5).unwrap();
        let mut m = Matrix::from_rows(&field, 2, &[vec![0, 3], vec![2, 4]]).unwrap();
        assert_eq!(echelonize(&mut m).unwrap(), 2);
        // First pivot row: (0, 3) / 3 = (0, 1)
        assert_eq!(m.to_rows()[0], vec![0, 1]);
        // Second: (2, 4) - 4 * (0, 1) = (2, 0), normalized to (1, 0)
        assert_eq!(m.to_rows()[1], vec![1, 0]);
    }

    #[test]
    fn test_zero_matrix() {
        let field = PrimeField::new(2).unwrap();
        assert_eq!(rank(&Matrix::zero(&field, 4, 4)).unwrap(), 0);
        assert_eq!(rank(&Matrix::identity(&field, 4)).unwrap(), 4);
    }
}
