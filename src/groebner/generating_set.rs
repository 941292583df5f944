//! The generating set: sorted reduced and unreduced vectors over a word forest.

use super::forest::{MarkOutcome, RvId, WordForest};
use super::slice::SliceStore;
use super::vector::{Vector, VectorKey, VectorPool};
use crate::config::ResolutionConfig;
use crate::error::{ResolutionError, Result};
use crate::field::FieldElement;
use crate::group::GroupAlgebra;
use crate::matrix::Matrix;
use tracing::trace;

/// How far expansion has progressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpansionDegree {
    /// No reduced vector has been recorded yet.
    Nothing,
    /// The set is used for reduction only and is never expanded.
    NotRequired,
    /// All multiples of depth `d` or less have been generated.
    At(usize),
}

/// A confirmed member of the generating set.
pub(crate) struct ReducedVector {
    pub vector: Vector,
    /// Forest node of the leading term.
    pub node: usize,
    /// Depth through which the multiples of this vector have been generated.
    pub exp_dim: usize,
}

/// A pending vector.
pub(crate) struct UnreducedVector {
    pub vector: Vector,
    /// Position in the input batch, for preimage computations.
    pub index: usize,
}

/// Shared state of one Gröbner computation in a free module of rank `r`,
/// with `s` rows of preimage bookkeeping per vector.
pub struct GeneratingSet {
    pub(crate) r: usize,
    pub(crate) s: usize,
    pub(crate) reduced: Vec<Option<ReducedVector>>,
    /// Empty slots of `reduced`, reused before the arena grows.
    free: Vec<RvId>,
    order: Vec<RvId>,
    /// Sorted so that the next vector to process is last.
    unreduced: Vec<UnreducedVector>,
    pub(crate) forest: WordForest,
    pub(crate) pool: VectorPool,
    pub(crate) pnontips: usize,
    pub(crate) exp_dim: ExpansionDegree,
    pub(crate) target_rank: Option<usize>,
    pub(crate) slices: SliceStore,
    pub(crate) prev_pnontips: usize,
    pub(crate) unfruitful: usize,
}

impl GeneratingSet {
    /// Allocate an empty set. Slice files are named `<stem><degree>.stp`.
    pub fn new(group: &GroupAlgebra, r: usize, s: usize, stem: &str, config: &ResolutionConfig) -> Result<Self> {
        config.validate()?;
        let nontips = group.nontips();
        let nor = r + s;
        Ok(GeneratingSet {
            r,
            s,
            reduced: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
            unreduced: Vec::new(),
            forest: WordForest::new(group, r),
            pool: VectorPool::new(group.field(), nor, nontips),
            pnontips: r * nontips,
            exp_dim: ExpansionDegree::Nothing,
            target_rank: None,
            slices: SliceStore::new(group.field(), stem, config.block_size, nor, nontips),
            prev_pnontips: 0,
            unfruitful: 0,
        })
    }

    /// Rank of the ambient free module.
    pub fn ambient_rank(&self) -> usize {
        self.r
    }

    /// Number of (block, basis element) pairs not yet known to be leading
    /// terms of the submodule.
    pub fn pnontips(&self) -> usize {
        self.pnontips
    }

    /// Depth through which expansion is complete.
    pub fn expansion_degree(&self) -> ExpansionDegree {
        self.exp_dim
    }

    /// Expected dimension of the submodule, if known.
    pub fn target_rank(&self) -> Option<usize> {
        self.target_rank
    }

    /// Record the expected dimension of the submodule.
    pub fn set_target_rank(&mut self, rank: Option<usize>) {
        self.target_rank = rank;
    }

    /// Length of the reduced list.
    pub fn number_of_reduced_vectors(&self) -> usize {
        self.order.len()
    }

    /// Number of vectors waiting for the sweep.
    pub fn number_of_unreduced_vectors(&self) -> usize {
        self.unreduced.len()
    }

    /// Vectors confirmed as minimal generators, reduced or pending.
    pub fn number_of_heady_vectors(&self) -> usize {
        self.reduced_vectors().filter(|rv| !rv.vector.radical).count()
            + self.unreduced.iter().filter(|uv| !uv.vector.radical).count()
    }

    /// Depth of the deepest minimal generator, 0 if there is none.
    pub fn dimension_of_deepest_heady(&self) -> usize {
        self.reduced_vectors()
            .map(|rv| &rv.vector)
            .chain(self.unreduced.iter().map(|uv| &uv.vector))
            .filter(|v| !v.radical)
            .filter_map(|v| v.depth())
            .max()
            .unwrap_or(0)
    }

    /// Leading-term positions `(depth, block, col)` of the reduced vectors,
    /// in list order.
    pub fn reduced_leading_terms(&self) -> Vec<(usize, usize, usize)> {
        self.reduced_vectors()
            .filter_map(|rv| rv.vector.lead())
            .map(|lt| (lt.depth, lt.block, lt.col))
            .collect()
    }

    /// Reduced vectors in leading-term order, largest first.
    pub(crate) fn reduced_vectors(&self) -> impl Iterator<Item = &ReducedVector> + '_ {
        self.order.iter().filter_map(move |&id| self.reduced[id].as_ref())
    }

    pub(crate) fn reduced_vector(&self, id: RvId) -> Result<&ReducedVector> {
        self.reduced
            .get(id)
            .and_then(|slot| slot.as_ref())
            .ok_or_else(|| ResolutionError::theoretical(format!("reduced vector {} does not exist", id)))
    }

    /// Depth of the largest reduced vector.
    pub(crate) fn smallest_dimension_of_reduced(&self) -> Option<usize> {
        self.order
            .first()
            .and_then(|&id| self.reduced[id].as_ref())
            .and_then(|rv| rv.vector.depth())
    }

    fn key_of(reduced: &[Option<ReducedVector>], id: RvId) -> Option<VectorKey> {
        reduced[id].as_ref().and_then(|rv| rv.vector.key())
    }

    /// Insert into the reduced list after all vectors that are not smaller.
    pub(crate) fn insert_reduced(&mut self, vector: Vector, node: usize) -> Result<RvId> {
        let key = vector
            .key()
            .ok_or_else(|| ResolutionError::theoretical("zero vector cannot become reduced"))?;
        let depth = vector.depth().unwrap_or(0);
        let entry = ReducedVector {
            vector,
            node,
            exp_dim: depth,
        };
        let id = match self.free.pop() {
            Some(id) => {
                self.reduced[id] = Some(entry);
                id
            }
            None => {
                self.reduced.push(Some(entry));
                self.reduced.len() - 1
            }
        };
        let reduced = &self.reduced;
        let pos = self
            .order
            .partition_point(|&other| Self::key_of(reduced, other).map_or(true, |k| k <= key));
        self.order.insert(pos, id);
        self.lower_exp_dim_if_necessary(depth)?;
        Ok(id)
    }

    /// Remove a vector from the reduced list, returning it.
    pub(crate) fn unlink_reduced(&mut self, id: RvId) -> Result<ReducedVector> {
        let pos = self
            .order
            .iter()
            .position(|&other| other == id)
            .ok_or_else(|| ResolutionError::theoretical(format!("reduced vector {} is not linked", id)))?;
        self.order.remove(pos);
        let rv = self.reduced[id]
            .take()
            .ok_or_else(|| ResolutionError::theoretical(format!("reduced vector {} already freed", id)))?;
        self.free.push(id);
        Ok(rv)
    }

    /// Queue a vector, ahead of any pending vector with the same key.
    pub(crate) fn insert_unreduced(&mut self, vector: Vector, index: usize) -> Result<()> {
        let key = vector
            .key()
            .ok_or_else(|| ResolutionError::theoretical("zero vector cannot be queued"))?;
        let pos = self
            .unreduced
            .partition_point(|uv| uv.vector.key().map_or(true, |k| k >= key));
        self.unreduced.insert(pos, UnreducedVector { vector, index });
        Ok(())
    }

    /// The next pending vector.
    pub(crate) fn peek_unreduced(&self) -> Option<&UnreducedVector> {
        self.unreduced.last()
    }

    pub(crate) fn pop_unreduced(&mut self) -> Option<UnreducedVector> {
        self.unreduced.pop()
    }

    /// Move a reduced vector back to the pending list.
    fn demote(&mut self, id: RvId) -> Result<()> {
        let rv = self.unlink_reduced(id)?;
        trace!(id, "demoting reduced vector");
        self.insert_unreduced(rv.vector, 0)
    }

    /// Record `vector` as reduced and classify everything it divides.
    pub(crate) fn promote(&mut self, group: &GroupAlgebra, vector: Vector) -> Result<RvId> {
        let lt = vector
            .lead()
            .ok_or_else(|| ResolutionError::theoretical("zero vector cannot be promoted"))?;
        let node = self.forest.index(lt.block, lt.col);
        let id = self.insert_reduced(vector, node)?;
        let MarkOutcome {
            newly_classified,
            displaced,
        } = self.forest.mark_multiples(group, id, node)?;
        self.pnontips = self
            .pnontips
            .checked_sub(newly_classified)
            .ok_or_else(|| ResolutionError::theoretical("more nontips classified than exist"))?;
        for previous in displaced {
            self.demote(previous)?;
        }
        trace!(id, depth = lt.depth, block = lt.block, col = lt.col, "promoted");
        Ok(id)
    }

    /// Queue `rows` (the first `r` rows of a vector) as a candidate minimal
    /// generator. Zero rows are ignored.
    pub(crate) fn add_heady_generator(&mut self, group: &GroupAlgebra, rows: &[FieldElement]) -> Result<()> {
        let mut gv = self.pool.acquire();
        let width = self.r * group.nontips();
        gv.data_mut()[..width].copy_from_slice(&rows[..width]);
        gv.find_leading_term(group, self.r);
        if gv.is_degenerate() {
            self.pool.release(gv);
            return Ok(());
        }
        gv.radical = false;
        gv.make_monic(group.field())?;
        self.insert_unreduced(gv, 0)
    }

    /// Record the rows of `mat` (in blocks of `r + s` rows) as reduced
    /// vectors. Used to reload a saved Gröbner basis; nothing may be
    /// displaced in the process.
    pub(crate) fn assert_reduced_vectors(&mut self, group: &GroupAlgebra, mat: &Matrix) -> Result<()> {
        let nor = self.r + self.s;
        if nor == 0 || mat.nor() % nor != 0 {
            return Err(ResolutionError::BadArgument(format!(
                "{} rows are not a whole number of vectors of {} rows",
                mat.nor(),
                nor
            )));
        }
        for i in 0..mat.nor() / nor {
            let mut gv = self.pool.acquire();
            gv.data_mut().copy_from_slice(mat.rows(i * nor, nor));
            gv.find_leading_term(group, self.r);
            self.promote(group, gv)?;
        }
        if !self.unreduced.is_empty() {
            return Err(ResolutionError::theoretical(
                "reloaded Gröbner basis is not reduced",
            ));
        }
        Ok(())
    }

    /// Keep the expansion degree at or below the depth of every reduced vector.
    fn lower_exp_dim_if_necessary(&mut self, depth: usize) -> Result<()> {
        if self.exp_dim == ExpansionDegree::NotRequired {
            return Ok(());
        }
        if self.slices.dim_loaded() != Some(depth) {
            return Err(ResolutionError::theoretical(format!(
                "the current dimension should be {:?}, not {}",
                self.slices.dim_loaded(),
                depth
            )));
        }
        match self.exp_dim {
            ExpansionDegree::Nothing => self.exp_dim = ExpansionDegree::At(depth),
            ExpansionDegree::At(e) if e > depth => {
                self.destroy_expansion_slice_file()?;
                self.exp_dim = ExpansionDegree::At(depth);
            }
            _ => {}
        }
        Ok(())
    }

    /// The first `r` rows of every heady reduced vector, stacked.
    pub fn minimal_generators(&self, group: &GroupAlgebra) -> Result<Matrix> {
        let width = self.r * group.nontips();
        let mut data = Vec::new();
        let mut count = 0;
        for rv in self.reduced_vectors().filter(|rv| !rv.vector.radical) {
            data.extend_from_slice(&rv.vector.data()[..width]);
            count += 1;
        }
        Matrix::from_data(group.field(), count * self.r, group.nontips(), data)
    }

    /// All rows of every reduced vector, stacked.
    pub fn reduced_basis(&self, group: &GroupAlgebra) -> Result<Matrix> {
        let nor = self.r + self.s;
        let mut data = Vec::new();
        for rv in self.reduced_vectors() {
            data.extend_from_slice(rv.vector.data());
        }
        Matrix::from_data(group.field(), self.order.len() * nor, group.nontips(), data)
    }
}
