//! Disk-paged cache of the products needed to reduce one depth ("slice").
//!
//! While the sweep works at depth `d`, every forest node of depth `d` that is
//! a proper multiple of its divisor needs its vector. Those vectors are the
//! products of depth `d - 1` node vectors with the arrows; they are computed
//! when the slice is entered, written to `<stem><d>.stp`, and paged back in
//! blocks of `block_size` products through a single in-memory block.
//!
//! The file of the current expansion degree is kept on disk after the sweep
//! moves on, because expansion restarts from it.

use super::forest::{NodeStatus, WordForest};
use super::generating_set::{ExpansionDegree, GeneratingSet, ReducedVector};
use crate::error::{ResolutionError, Result};
use crate::field::{FieldElement, PrimeField};
use crate::group::GroupAlgebra;
use crate::matrix::io::{MatrixReader, MatrixWriter};
use crate::matrix::multiply_rows;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Counters describing slice file traffic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SliceStats {
    /// Slice files written.
    pub files_created: usize,
    /// Slice files deleted.
    pub files_removed: usize,
    /// Blocks read back from disk.
    pub blocks_loaded: usize,
    /// Times a lower depth than the loaded one was selected.
    pub backtracks: usize,
}

impl SliceStats {
    /// Componentwise sum.
    pub fn merged(self, other: SliceStats) -> SliceStats {
        SliceStats {
            files_created: self.files_created + other.files_created,
            files_removed: self.files_removed + other.files_removed,
            blocks_loaded: self.blocks_loaded + other.blocks_loaded,
            backtracks: self.backtracks + other.backtracks,
        }
    }
}

pub(crate) struct SliceStore {
    field: PrimeField,
    stem: String,
    block_size: usize,
    /// Rows per vector.
    nor: usize,
    noc: usize,
    dim_loaded: Option<usize>,
    block_loaded: Option<usize>,
    /// Number of products in the loaded slice.
    nops: usize,
    this_block: Vec<FieldElement>,
    stats: SliceStats,
}

impl SliceStore {
    pub fn new(field: &PrimeField, stem: &str, block_size: usize, nor: usize, noc: usize) -> Self {
        SliceStore {
            field: field.clone(),
            stem: stem.to_string(),
            block_size,
            nor,
            noc,
            dim_loaded: None,
            block_loaded: None,
            nops: 0,
            this_block: Vec::new(),
            stats: SliceStats::default(),
        }
    }

    pub fn dim_loaded(&self) -> Option<usize> {
        self.dim_loaded
    }

    pub fn stats(&self) -> SliceStats {
        self.stats
    }

    pub fn stored_product_file(&self, dim: usize) -> PathBuf {
        PathBuf::from(format!("{}{}.stp", self.stem, dim))
    }

    fn remove_stored_product_file(&mut self, dim: usize) -> Result<()> {
        let path = self.stored_product_file(dim);
        std::fs::remove_file(&path).map_err(|e| ResolutionError::io(&path, e))?;
        self.stats.files_removed += 1;
        debug!(path = %path.display(), "removed slice file");
        Ok(())
    }

    /// Read block `block` of the loaded slice into memory.
    fn load_block(&mut self, block: usize) -> Result<()> {
        let dim = self
            .dim_loaded
            .ok_or_else(|| ResolutionError::theoretical("no slice loaded"))?;
        let path = self.stored_product_file(dim);
        let last_block = (self.nops - 1) / self.block_size;
        let blen = if block == last_block {
            1 + (self.nops - 1) % self.block_size
        } else {
            self.block_size
        };
        let mut reader = MatrixReader::open(&path, &self.field)?;
        if reader.header().nor != self.nor * self.nops {
            return Err(ResolutionError::format(
                &path,
                format!(
                    "holds {} rows, expected {}",
                    reader.header().nor,
                    self.nor * self.nops
                ),
            ));
        }
        reader.seek_row(block * self.nor * self.block_size)?;
        self.this_block.resize(blen * self.nor * self.noc, self.field.zero());
        reader.read_rows(&mut self.this_block)?;
        self.block_loaded = Some(block);
        self.stats.blocks_loaded += 1;
        Ok(())
    }

    /// Rows of the vector represented by forest node `index`.
    pub fn node_vector<'a>(
        &'a mut self,
        reduced: &'a [Option<ReducedVector>],
        forest: &WordForest,
        index: usize,
    ) -> Result<&'a [FieldElement]> {
        let node = forest.node(index);
        match node.status {
            NodeStatus::Unmarked => Err(ResolutionError::theoretical(
                "node vector requested for a node without divisor",
            )),
            NodeStatus::NonScalar => Err(ResolutionError::theoretical(
                "node vector requested outside the loaded slice",
            )),
            NodeStatus::Scalar => {
                let id = node
                    .divisor
                    .ok_or_else(|| ResolutionError::theoretical("scalar node without divisor"))?;
                reduced
                    .get(id)
                    .and_then(|slot| slot.as_ref())
                    .map(|rv| rv.vector.data())
                    .ok_or_else(|| ResolutionError::theoretical(format!("divisor {} does not exist", id)))
            }
            NodeStatus::Product(i) => {
                let block = i / self.block_size;
                let pos = i % self.block_size;
                if self.block_loaded != Some(block) {
                    self.load_block(block)?;
                }
                let width = self.nor * self.noc;
                Ok(&self.this_block[pos * width..(pos + 1) * width])
            }
        }
    }
}

impl GeneratingSet {
    /// Slice traffic so far.
    pub fn slice_stats(&self) -> SliceStats {
        self.slices.stats()
    }

    /// Number the cached products of depth `dim` and make it the loaded slice.
    ///
    /// Products are counted in the order [`calculate_next_products`] writes
    /// them; the nodes they belong to get `Product(i)`.
    pub(crate) fn commence_new_dimension(&mut self, group: &GroupAlgebra, dim: usize) {
        let mut nops = 0;
        if dim > 0 {
            for blo in 0..self.r {
                for parent in group.depth_range(dim - 1) {
                    if self.forest.node(self.forest.index(blo, parent)).divisor.is_none() {
                        continue;
                    }
                    for arrow in 0..group.arrows() {
                        if let Some(child) = group.child(parent, arrow) {
                            let index = self.forest.index(blo, child);
                            let node = self.forest.node_mut(index);
                            if node.divisor.is_some() && node.quotient != 0 {
                                node.status = NodeStatus::Product(nops);
                            }
                            nops += 1;
                        }
                    }
                }
            }
        }
        self.slices.nops = nops;
        self.slices.dim_loaded = Some(dim);
        self.slices.block_loaded = None;
    }

    /// Write the products of the loaded slice's node vectors with the arrows
    /// to the file of the next depth.
    fn calculate_next_products(&mut self, group: &GroupAlgebra) -> Result<()> {
        let d = self
            .slices
            .dim_loaded
            .ok_or_else(|| ResolutionError::theoretical("no slice loaded"))?;
        let field = group.field().clone();
        let nor = self.r + self.s;
        let noc = group.nontips();
        let width = nor * noc;
        let block_size = self.slices.block_size;
        let path = self.slices.stored_product_file(d + 1);
        let mut writer = MatrixWriter::create(&path, &field, noc)?;
        let mut products = field.zeros(block_size * width);
        let mut offset = 0;
        let mut nops = 0;

        let r = self.r;
        let reduced = &self.reduced;
        let forest = &self.forest;
        let slices = &mut self.slices;
        for blo in 0..r {
            for pat in group.depth_range(d) {
                let index = forest.index(blo, pat);
                if forest.node(index).status == NodeStatus::Unmarked {
                    continue;
                }
                let w = slices.node_vector(reduced, forest, index)?;
                for arrow in 0..group.arrows() {
                    if group.child(pat, arrow).is_none() {
                        continue;
                    }
                    let dest = &mut products[offset * width..(offset + 1) * width];
                    multiply_rows(&field, w, noc, group.action(arrow), dest);
                    offset += 1;
                    nops += 1;
                    if offset == block_size {
                        writer.write_rows(&products)?;
                        offset = 0;
                    }
                }
            }
        }
        if offset != 0 {
            writer.write_rows(&products[..offset * width])?;
        }
        let rows = writer.finish()?;
        if rows != nops * nor {
            return Err(ResolutionError::theoretical(format!(
                "wrote {} product rows, expected {}",
                rows,
                nops * nor
            )));
        }
        self.slices.stats.files_created += 1;
        debug!(degree = d + 1, products = nops, "computed next products");
        Ok(())
    }

    fn create_empty_slice_file(&mut self, group: &GroupAlgebra, dim: usize) -> Result<()> {
        let path = self.slices.stored_product_file(dim);
        MatrixWriter::create(&path, group.field(), group.nontips())?.finish()?;
        self.slices.stats.files_created += 1;
        Ok(())
    }

    /// Leave the loaded slice, deleting its file unless it is the expansion slice.
    pub(crate) fn destroy_current_dimension(&mut self) -> Result<()> {
        let dim = self
            .slices
            .dim_loaded
            .ok_or_else(|| ResolutionError::theoretical("no current dimension"))?;
        if self.exp_dim != ExpansionDegree::At(dim) {
            self.slices.remove_stored_product_file(dim)?;
        }
        self.slices.block_loaded = None;
        self.slices.dim_loaded = None;
        Ok(())
    }

    pub(crate) fn destroy_current_dimension_if_any(&mut self) -> Result<()> {
        if self.slices.dim_loaded.is_none() {
            return Ok(());
        }
        self.destroy_current_dimension()
    }

    /// Delete the file kept for the expansion degree, if there is one.
    pub(crate) fn destroy_expansion_slice_file(&mut self) -> Result<()> {
        if let ExpansionDegree::At(e) = self.exp_dim {
            self.slices.remove_stored_product_file(e)?;
        }
        Ok(())
    }

    fn should_use_expansion_slice(&self, dim: usize) -> bool {
        match self.exp_dim {
            ExpansionDegree::At(e) => {
                e <= dim && self.slices.dim_loaded.map_or(true, |loaded| loaded < e)
            }
            _ => false,
        }
    }

    /// Load the slice of the expansion degree. Nothing may be loaded.
    pub(crate) fn load_expansion_slice(&mut self, group: &GroupAlgebra) -> Result<()> {
        if self.slices.dim_loaded.is_some() {
            return Err(ResolutionError::theoretical("a slice is already loaded"));
        }
        match self.exp_dim {
            ExpansionDegree::At(e) => {
                self.commence_new_dimension(group, e);
                Ok(())
            }
            other => Err(ResolutionError::theoretical(format!(
                "no expansion slice to load ({:?})",
                other
            ))),
        }
    }

    /// Move from the loaded depth to the next one.
    pub(crate) fn increment_slice(&mut self, group: &GroupAlgebra) -> Result<()> {
        let n = self
            .slices
            .dim_loaded
            .ok_or_else(|| ResolutionError::theoretical("nothing loaded"))?;
        self.calculate_next_products(group)?;
        self.destroy_current_dimension()?;
        self.commence_new_dimension(group, n + 1);
        Ok(())
    }

    /// Make `dim` the loaded depth, computing intermediate slices as needed.
    pub(crate) fn select_new_dimension(&mut self, group: &GroupAlgebra, dim: usize) -> Result<()> {
        if self.slices.dim_loaded == Some(dim) {
            return Ok(());
        }
        if let Some(loaded) = self.slices.dim_loaded {
            if loaded > dim {
                warn!(loaded, requested = dim, "slice selection is backtracking");
                self.slices.stats.backtracks += 1;
                self.destroy_current_dimension()?;
            }
        }
        if self.should_use_expansion_slice(dim) {
            self.destroy_current_dimension_if_any()?;
            self.load_expansion_slice(group)?;
        }
        if self.slices.dim_loaded.is_none() {
            let n = match self.smallest_dimension_of_reduced() {
                Some(n) if n <= dim => n,
                _ => dim,
            };
            self.create_empty_slice_file(group, n)?;
            self.commence_new_dimension(group, n);
            if self.slices.nops != 0 {
                return Err(ResolutionError::theoretical(format!(
                    "fresh slice at depth {} expects {} products",
                    n, self.slices.nops
                )));
            }
        }
        while let Some(loaded) = self.slices.dim_loaded {
            if loaded >= dim {
                break;
            }
            self.increment_slice(group)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common_groups::cyclic_group;
    use crate::config::ResolutionConfig;
    use crate::groebner::vector::Vector;
    use tempfile::TempDir;

    fn chain_set(dir: &TempDir, block_size: usize) -> (GroupAlgebra, GeneratingSet) {
        let g = cyclic_group(2, 3).unwrap();
        let stem = dir.path().join("s").to_string_lossy().into_owned();
        let config = ResolutionConfig::new().with_block_size(block_size);
        let gs = GeneratingSet::new(&g, 1, 0, &stem, &config).unwrap();
        (g, gs)
    }

    fn basis_vector(g: &GroupAlgebra, col: usize) -> Vector {
        let mut v = Vector::zeroed(g.field(), 1, g.nontips());
        v.data_mut()[col] = g.field().one();
        v.find_leading_term(g, 1);
        v
    }

    #[test]
    fn test_select_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let (g, mut gs) = chain_set(&dir, 4);
        gs.select_new_dimension(&g, 1).unwrap();
        let stats = gs.slice_stats();
        gs.select_new_dimension(&g, 1).unwrap();
        assert_eq!(gs.slice_stats(), stats);
        assert_eq!(gs.slices.dim_loaded(), Some(1));
    }

    #[test]
    fn test_products_are_paged_through_blocks() {
        let dir = TempDir::new().unwrap();
        let (g, mut gs) = chain_set(&dir, 1);
        // x divides x, x^2, ..., x^7 in Z/8
        gs.select_new_dimension(&g, 1).unwrap();
        gs.promote(&g, basis_vector(&g, 1)).unwrap();
        assert_eq!(gs.pnontips(), 1);

        gs.select_new_dimension(&g, 3).unwrap();
        // The vector of x^3 is x * x^2, with a single 1 in column 3
        let w = gs
            .slices
            .node_vector(&gs.reduced, &gs.forest, 3)
            .unwrap()
            .to_vec();
        let values: Vec<u32> = w.iter().map(|x| g.field().to_u32(x)).collect();
        assert_eq!(values, vec![0, 0, 0, 1, 0, 0, 0, 0]);
        assert!(gs.slice_stats().blocks_loaded >= 1);
    }

    #[test]
    fn test_backtracking_is_counted() {
        let dir = TempDir::new().unwrap();
        let (g, mut gs) = chain_set(&dir, 4);
        gs.select_new_dimension(&g, 3).unwrap();
        gs.select_new_dimension(&g, 1).unwrap();
        assert_eq!(gs.slice_stats().backtracks, 1);
        assert_eq!(gs.slices.dim_loaded(), Some(1));
    }

    #[test]
    fn test_expansion_slice_survives_the_sweep() {
        let dir = TempDir::new().unwrap();
        let (g, mut gs) = chain_set(&dir, 4);
        gs.select_new_dimension(&g, 2).unwrap();
        gs.promote(&g, basis_vector(&g, 2)).unwrap();
        assert_eq!(gs.expansion_degree(), ExpansionDegree::At(2));

        gs.destroy_current_dimension_if_any().unwrap();
        assert!(gs.slices.stored_product_file(2).exists());

        gs.select_new_dimension(&g, 4).unwrap();
        gs.destroy_current_dimension().unwrap();
        assert!(!gs.slices.stored_product_file(4).exists());
        assert!(!gs.slices.stored_product_file(3).exists());

        gs.destroy_expansion_slice_file().unwrap();
        assert!(!gs.slices.stored_product_file(2).exists());
    }
}
