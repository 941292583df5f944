//! Conversions between field rows and their packed on-disk representation.
//!
//! Rows are packed independently of each other so that any row of a matrix
//! file can be addressed by a simple offset computation. For `p <= 256` several
//! base-`p` digits share one byte; larger primes use one little-endian `u32`
//! per entry.

use crate::field::{FieldElement, FieldProperties, PrimeField};
use byteorder::{ByteOrder, LittleEndian};

/// How entries of one field are laid out inside a packed row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Packing {
    /// `per_byte` base-`p` digits in each byte, least significant digit first.
    Digits {
        /// Number of entries sharing one byte.
        per_byte: usize,
    },
    /// One little-endian `u32` per entry.
    Wide,
}

impl Packing {
    /// The packing used for a field of the given order.
    ///
    /// # Example
    /// ```ignore
    /// use pgroup_resolution::conversions::Packing;
    ///
    /// assert_eq!(Packing::for_order(2), Packing::Digits { per_byte: 8 });
    /// assert_eq!(Packing::for_order(3), Packing::Digits { per_byte: 5 });
    /// ```
    pub fn for_order(order: u64) -> Self {
        if order > 256 {
            return Packing::Wide;
        }
        let mut per_byte = 0;
        let mut power = 1u64;
        while power * order <= 256 {
            power *= order;
            per_byte += 1;
        }
        Packing::Digits { per_byte }
    }

    /// Number of bytes one packed row of `noc` entries occupies.
    pub fn row_size(&self, noc: usize) -> usize {
        match *self {
            Packing::Digits { per_byte } => (noc + per_byte - 1) / per_byte,
            Packing::Wide => 4 * noc,
        }
    }
}

/// Number of bytes one packed row of `noc` entries occupies over `field`.
pub fn row_size_io(field: &PrimeField, noc: usize) -> usize {
    Packing::for_order(field.characteristic()).row_size(noc)
}

/// Append the packed form of `row` to `out`.
pub fn pack_row(field: &PrimeField, row: &[FieldElement], out: &mut Vec<u8>) {
    let order = field.characteristic() as u32;
    match Packing::for_order(field.characteristic()) {
        Packing::Digits { per_byte } => {
            for chunk in row.chunks(per_byte) {
                let mut byte = 0u32;
                for el in chunk.iter().rev() {
                    byte = byte * order + field.to_u32(el);
                }
                out.push(byte as u8);
            }
        }
        Packing::Wide => {
            let mut word = [0u8; 4];
            for el in row {
                LittleEndian::write_u32(&mut word, field.to_u32(el));
                out.extend_from_slice(&word);
            }
        }
    }
}

/// Unpack one row from `bytes` into `out`.
///
/// Returns `None` if `bytes` holds a digit that is not a canonical
/// representative of the field, which indicates a corrupt file or a file
/// written over a different field.
pub fn unpack_row(field: &PrimeField, bytes: &[u8], out: &mut [FieldElement]) -> Option<()> {
    let order = field.characteristic() as u32;
    match Packing::for_order(field.characteristic()) {
        Packing::Digits { per_byte } => {
            for (chunk, &byte) in out.chunks_mut(per_byte).zip(bytes) {
                let mut rest = byte as u32;
                for el in chunk.iter_mut() {
                    *el = field.from_u32(rest % order);
                    rest /= order;
                }
                if rest != 0 {
                    return None;
                }
            }
        }
        Packing::Wide => {
            for (el, word) in out.iter_mut().zip(bytes.chunks_exact(4)) {
                let value = LittleEndian::read_u32(word);
                if value >= order {
                    return None;
                }
                *el = field.from_u32(value);
            }
        }
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing_choice() {
        assert_eq!(Packing::for_order(2), Packing::Digits { per_byte: 8 });
        assert_eq!(Packing::for_order(3), Packing::Digits { per_byte: 5 });
        assert_eq!(Packing::for_order(5), Packing::Digits { per_byte: 3 });
        assert_eq!(Packing::for_order(17), Packing::Digits { per_byte: 1 });
        assert_eq!(Packing::for_order(257), Packing::Wide);
    }

    #[test]
    fn test_row_sizes() {
        assert_eq!(Packing::for_order(2).row_size(16), 2);
        assert_eq!(Packing::for_order(2).row_size(17), 3);
        assert_eq!(Packing::for_order(3).row_size(9), 2);
        assert_eq!(Packing::Wide.row_size(3), 12);
    }

    #[test]
    fn test_pack_characteristic_two() {
        let field = PrimeField::new(2).unwrap();
        // 1,0,1,1 -> bits 0, 2 and 3 set = 13
        let row: Vec<_> = [1, 0, 1, 1].iter().map(|&x| field.from_u32(x)).collect();
        let mut bytes = Vec::new();
        pack_row(&field, &row, &mut bytes);
        assert_eq!(bytes, vec![13]);

        let mut back = field.zeros(4);
        unpack_row(&field, &bytes, &mut back).unwrap();
        let values: Vec<u32> = back.iter().map(|x| field.to_u32(x)).collect();
        assert_eq!(values, vec![1, 0, 1, 1]);
    }

    #[test]
    fn test_pack_characteristic_three_spans_bytes() {
        let field = PrimeField::new(3).unwrap();
        let input = [2, 1, 0, 2, 2, 1, 1];
        let row: Vec<_> = input.iter().map(|&x| field.from_u32(x)).collect();
        let mut bytes = Vec::new();
        pack_row(&field, &row, &mut bytes);
        assert_eq!(bytes.len(), 2);

        let mut back = field.zeros(input.len());
        unpack_row(&field, &bytes, &mut back).unwrap();
        let values: Vec<u32> = back.iter().map(|x| field.to_u32(x)).collect();
        assert_eq!(values, input.to_vec());
    }

    #[test]
    fn test_unpack_rejects_invalid_digit() {
        let field = PrimeField::new(3).unwrap();
        // 3^5 = 243, anything above is not a valid byte for p = 3
        let mut out = field.zeros(5);
        assert!(unpack_row(&field, &[250], &mut out).is_none());
    }
}
