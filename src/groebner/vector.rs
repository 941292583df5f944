//! Row-block vectors with a cached leading term, and the scratch pool.

use crate::error::Result;
use crate::field::{FieldElement, PrimeField};
use crate::group::GroupAlgebra;
use crate::matrix::{find_pivot, scale_row};
use tracing::debug;

/// Position of the leading term of a vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeadingTerm {
    /// Length of the basis element at `col`.
    pub depth: usize,
    /// Row of the ambient block holding the term.
    pub block: usize,
    /// Basis element (column) of the term.
    pub col: usize,
}

/// Sort key of a vector: ascending keys are descending vectors.
///
/// Shallower terms are larger, then smaller block, then smaller column. On a
/// tie a radical vector is larger than a heady one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct VectorKey {
    depth: usize,
    block: usize,
    col: usize,
    heady: bool,
}

/// A block of `nor` rows of length `|basis|`.
///
/// The first `r` rows are the ambient part and the remaining ones, if any,
/// the preimage part. Only the ambient part determines the leading term.
pub struct Vector {
    data: Vec<FieldElement>,
    noc: usize,
    lead: Option<LeadingTerm>,
    coeff: FieldElement,
    /// False once the vector is known to be a new minimal generator.
    pub radical: bool,
}

impl Vector {
    pub fn zeroed(field: &PrimeField, nor: usize, noc: usize) -> Self {
        Vector {
            data: field.zeros(nor * noc),
            noc,
            lead: None,
            coeff: field.zero(),
            radical: true,
        }
    }

    /// All rows, ambient part first.
    pub fn data(&self) -> &[FieldElement] {
        &self.data
    }

    /// Mutable rows. The cached leading term is stale until
    /// [`find_leading_term`](Self::find_leading_term) is called again.
    pub fn data_mut(&mut self) -> &mut [FieldElement] {
        &mut self.data
    }

    /// The rows past the first `r`.
    pub fn preimage(&self, r: usize) -> &[FieldElement] {
        &self.data[r * self.noc..]
    }

    pub fn lead(&self) -> Option<LeadingTerm> {
        self.lead
    }

    pub fn coeff(&self) -> FieldElement {
        self.coeff
    }

    /// Depth of the leading term, if the ambient part is nonzero.
    pub fn depth(&self) -> Option<usize> {
        self.lead.map(|lt| lt.depth)
    }

    /// True if the ambient part vanishes.
    pub fn is_degenerate(&self) -> bool {
        self.lead.is_none()
    }

    pub(crate) fn key(&self) -> Option<VectorKey> {
        self.lead.map(|lt| VectorKey {
            depth: lt.depth,
            block: lt.block,
            col: lt.col,
            heady: !self.radical,
        })
    }

    /// Recompute the leading term from the first `r` rows.
    ///
    /// Each row contributes its first nonzero column; the one of smallest
    /// depth wins, the earliest row on ties.
    pub fn find_leading_term(&mut self, group: &GroupAlgebra, r: usize) {
        let field = group.field();
        let mut best: Option<(LeadingTerm, FieldElement)> = None;
        for block in 0..r {
            let row = &self.data[block * self.noc..(block + 1) * self.noc];
            if let Some((col, value)) = find_pivot(field, row) {
                let depth = group.depth(col);
                if best.as_ref().map_or(true, |(lt, _)| depth < lt.depth) {
                    best = Some((LeadingTerm { depth, block, col }, value));
                }
            }
        }
        match best {
            Some((lt, value)) => {
                self.lead = Some(lt);
                self.coeff = value;
            }
            None => {
                self.lead = None;
                self.coeff = field.zero();
            }
        }
    }

    /// Scale so that the leading coefficient becomes one.
    pub fn make_monic(&mut self, field: &PrimeField) -> Result<()> {
        if self.lead.is_none() || field.is_one(&self.coeff) {
            return Ok(());
        }
        let inv = field.invert(&self.coeff)?;
        scale_row(field, &mut self.data, inv);
        self.coeff = field.one();
        Ok(())
    }

    /// Reset to the zero vector, ready for reuse.
    fn clear(&mut self, field: &PrimeField) {
        for x in self.data.iter_mut() {
            *x = field.zero();
        }
        self.lead = None;
        self.coeff = field.zero();
        self.radical = true;
    }
}

/// A one-slot cache of scratch vectors.
pub(crate) struct VectorPool {
    field: PrimeField,
    nor: usize,
    noc: usize,
    waiting: Option<Vector>,
}

impl VectorPool {
    pub fn new(field: &PrimeField, nor: usize, noc: usize) -> Self {
        VectorPool {
            field: field.clone(),
            nor,
            noc,
            waiting: None,
        }
    }

    /// A zero vector, reusing the cached one if there is one.
    pub fn acquire(&mut self) -> Vector {
        match self.waiting.take() {
            Some(v) => v,
            None => Vector::zeroed(&self.field, self.nor, self.noc),
        }
    }

    /// Hand a vector back. Only one is kept; any further ones are dropped.
    pub fn release(&mut self, mut v: Vector) {
        if self.waiting.is_some() {
            debug!("vector pool full, dropping vector");
            return;
        }
        v.clear(&self.field);
        self.waiting = Some(v);
    }
}
