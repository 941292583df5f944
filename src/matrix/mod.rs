//! Dense matrices and row primitives over a prime field.
//!
//! A [`Matrix`] is a plain row-major array of field elements. The Gröbner
//! machinery mostly works on raw row slices, so the row operations are free
//! functions over `&[FieldElement]` that take the field as context.

pub mod gaussian;
pub mod io;

use crate::error::{ResolutionError, Result};
use crate::field::{FieldElement, PrimeField};
use std::fmt;

/// A dense `nor x noc` matrix.
#[derive(Clone)]
pub struct Matrix {
    field: PrimeField,
    nor: usize,
    noc: usize,
    data: Vec<FieldElement>,
}

impl Matrix {
    /// The zero matrix.
    pub fn zero(field: &PrimeField, nor: usize, noc: usize) -> Self {
        Matrix {
            field: field.clone(),
            nor,
            noc,
            data: field.zeros(nor * noc),
        }
    }

    /// The `n x n` identity matrix.
    pub fn identity(field: &PrimeField, n: usize) -> Self {
        let mut m = Matrix::zero(field, n, n);
        for i in 0..n {
            m.data[i * n + i] = field.one();
        }
        m
    }

    /// Build a matrix from canonical integer rows.
    pub fn from_rows(field: &PrimeField, noc: usize, rows: &[Vec<u32>]) -> Result<Self> {
        let mut data = Vec::with_capacity(rows.len() * noc);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != noc {
                return Err(ResolutionError::BadArgument(format!(
                    "row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    noc
                )));
            }
            data.extend(row.iter().map(|&x| field.from_u32(x)));
        }
        Ok(Matrix {
            field: field.clone(),
            nor: rows.len(),
            noc,
            data,
        })
    }

    /// Wrap existing row-major data.
    pub fn from_data(field: &PrimeField, nor: usize, noc: usize, data: Vec<FieldElement>) -> Result<Self> {
        if data.len() != nor * noc {
            return Err(ResolutionError::BadArgument(format!(
                "{} entries do not form a {} x {} matrix",
                data.len(),
                nor,
                noc
            )));
        }
        Ok(Matrix {
            field: field.clone(),
            nor,
            noc,
            data,
        })
    }

    pub fn field(&self) -> &PrimeField {
        &self.field
    }

    /// Number of rows.
    pub fn nor(&self) -> usize {
        self.nor
    }

    /// Number of columns.
    pub fn noc(&self) -> usize {
        self.noc
    }

    pub fn data(&self) -> &[FieldElement] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [FieldElement] {
        &mut self.data
    }

    pub fn row(&self, i: usize) -> &[FieldElement] {
        &self.data[i * self.noc..(i + 1) * self.noc]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [FieldElement] {
        let noc = self.noc;
        &mut self.data[i * noc..(i + 1) * noc]
    }

    /// Rows `first..first + count` as one contiguous slice.
    pub fn rows(&self, first: usize, count: usize) -> &[FieldElement] {
        &self.data[first * self.noc..(first + count) * self.noc]
    }

    pub fn rows_mut(&mut self, first: usize, count: usize) -> &mut [FieldElement] {
        let noc = self.noc;
        &mut self.data[first * noc..(first + count) * noc]
    }

    /// Canonical representative of entry `(i, j)`.
    pub fn entry(&self, i: usize, j: usize) -> u32 {
        self.field.to_u32(&self.data[i * self.noc + j])
    }

    pub fn set_entry(&mut self, i: usize, j: usize, value: u32) {
        self.data[i * self.noc + j] = self.field.from_u32(value);
    }

    /// All entries as canonical integer rows.
    pub fn to_rows(&self) -> Vec<Vec<u32>> {
        (0..self.nor)
            .map(|i| self.row(i).iter().map(|x| self.field.to_u32(x)).collect())
            .collect()
    }

    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|x| self.field.is_zero(x))
    }

    /// Append the rows of `other` below the rows of `self`.
    pub fn append(&mut self, other: &Matrix) -> Result<()> {
        if other.noc != self.noc || other.field != self.field {
            return Err(ResolutionError::BadArgument(
                "cannot append matrices of different shape or field".to_string(),
            ));
        }
        self.data.extend_from_slice(&other.data);
        self.nor += other.nor;
        Ok(())
    }

    /// The product `self * rhs`.
    pub fn multiply(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.noc != rhs.nor || self.field != rhs.field {
            return Err(ResolutionError::BadArgument(format!(
                "cannot multiply {} x {} by {} x {}",
                self.nor, self.noc, rhs.nor, rhs.noc
            )));
        }
        let mut result = Matrix::zero(&self.field, self.nor, rhs.noc);
        multiply_rows(&self.field, &self.data, self.noc, rhs, &mut result.data);
        Ok(result)
    }
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field
            && self.nor == other.nor
            && self.noc == other.noc
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| self.field.eq_el(a, b))
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Matrix {} x {} over {}", self.nor, self.noc, self.field)?;
        for row in self.to_rows() {
            writeln!(f, "  {:?}", row)?;
        }
        Ok(())
    }
}

/// Column and value of the first nonzero entry of `row`.
pub fn find_pivot(field: &PrimeField, row: &[FieldElement]) -> Option<(usize, FieldElement)> {
    row.iter()
        .position(|x| !field.is_zero(x))
        .map(|col| (col, row[col]))
}

/// `dest += factor * src`
pub fn add_scaled_row(field: &PrimeField, dest: &mut [FieldElement], src: &[FieldElement], factor: FieldElement) {
    if field.is_zero(&factor) {
        return;
    }
    for (d, s) in dest.iter_mut().zip(src) {
        if !field.is_zero(s) {
            *d = field.add(*d, field.mul(factor, *s));
        }
    }
}

/// `dest -= src`
pub fn subtract_row(field: &PrimeField, dest: &mut [FieldElement], src: &[FieldElement]) {
    for (d, s) in dest.iter_mut().zip(src) {
        if !field.is_zero(s) {
            *d = field.sub(*d, *s);
        }
    }
}

/// `row *= factor`
pub fn scale_row(field: &PrimeField, row: &mut [FieldElement], factor: FieldElement) {
    if field.is_one(&factor) {
        return;
    }
    for x in row.iter_mut() {
        *x = field.mul(*x, factor);
    }
}

/// Multiply the rows stored in `src` (each `rhs.nor()` wide) by `rhs`,
/// overwriting `dest`.
pub fn multiply_rows(field: &PrimeField, src: &[FieldElement], width: usize, rhs: &Matrix, dest: &mut [FieldElement]) {
    let out_width = rhs.noc;
    if out_width == 0 {
        return;
    }
    if width == 0 {
        // Empty rows map to zero
        for x in dest.iter_mut() {
            *x = field.zero();
        }
        return;
    }
    for (row, out) in src.chunks(width).zip(dest.chunks_mut(out_width)) {
        for x in out.iter_mut() {
            *x = field.zero();
        }
        for (k, coeff) in row.iter().enumerate() {
            if !field.is_zero(coeff) {
                add_scaled_row(field, out, rhs.row(k), *coeff);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f5() -> PrimeField {
        PrimeField::new(5).unwrap()
    }

    #[test]
    fn test_from_rows_and_entries() {
        let field = f5();
        let m = Matrix::from_rows(&field, 3, &[vec![1, 2, 3], vec![4, 0, 7]]).unwrap();
        assert_eq!(m.nor(), 2);
        assert_eq!(m.noc(), 3);
        // 7 reduces to 2 modulo 5
        assert_eq!(m.entry(1, 2), 2);
        assert!(Matrix::from_rows(&field, 2, &[vec![1, 2, 3]]).is_err());
    }

    #[test]
    fn test_pivot_search() {
        let field = f5();
        let row: Vec<_> = [0, 0, 3, 1].iter().map(|&x| field.from_u32(x)).collect();
        let (col, value) = find_pivot(&field, &row).unwrap();
        assert_eq!(col, 2);
        assert_eq!(field.to_u32(&value), 3);
        assert!(find_pivot(&field, &field.zeros(4)).is_none());
    }

    #[test]
    fn test_row_operations() {
        let field = f5();
        let mut dest: Vec<_> = [1, 2, 3].iter().map(|&x| field.from_u32(x)).collect();
        let src: Vec<_> = [1, 1, 1].iter().map(|&x| field.from_u32(x)).collect();

        add_scaled_row(&field, &mut dest, &src, field.from_u32(2));
        let values: Vec<u32> = dest.iter().map(|x| field.to_u32(x)).collect();
        assert_eq!(values, vec![3, 4, 0]);

        subtract_row(&field, &mut dest, &src);
        scale_row(&field, &mut dest, field.from_u32(3));
        let values: Vec<u32> = dest.iter().map(|x| field.to_u32(x)).collect();
        // (2, 3, 4) * 3 = (6, 9, 12) = (1, 4, 2)
        assert_eq!(values, vec![1, 4, 2]);
    }

    #[test]
    fn test_multiply() {
        let field = f5();
        let a = Matrix::from_rows(&field, 2, &[vec![1, 2], vec![0, 1]]).unwrap();
        let b = Matrix::from_rows(&field, 2, &[vec![3, 0], vec![1, 4]]).unwrap();
        let c = a.multiply(&b).unwrap();
        // [1 2; 0 1] * [3 0; 1 4] = [5 8; 1 4] = [0 3; 1 4]
        assert_eq!(c.to_rows(), vec![vec![0, 3], vec![1, 4]]);
        assert_eq!(a.multiply(&Matrix::identity(&field, 2)).unwrap(), a);
    }

    #[test]
    fn test_multiply_with_empty_dimensions() {
        let field = f5();
        let wide = Matrix::zero(&field, 2, 0);
        let c = wide.multiply(&Matrix::zero(&field, 0, 3)).unwrap();
        assert_eq!((c.nor(), c.noc()), (2, 3));
        assert!(c.is_zero());

        let a = Matrix::from_rows(&field, 2, &[vec![1, 2]]).unwrap();
        let d = a.multiply(&Matrix::zero(&field, 2, 0)).unwrap();
        assert_eq!((d.nor(), d.noc()), (1, 0));
    }

    #[test]
    fn test_append() {
        let field = f5();
        let mut a = Matrix::from_rows(&field, 2, &[vec![1, 2]]).unwrap();
        let b = Matrix::from_rows(&field, 2, &[vec![3, 4]]).unwrap();
        a.append(&b).unwrap();
        assert_eq!(a.to_rows(), vec![vec![1, 2], vec![3, 4]]);
        assert!(a.append(&Matrix::zero(&field, 1, 3)).is_err());
    }
}
