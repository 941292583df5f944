//! The sweep: reduce every pending vector against the reduced list, depth by
//! depth, and the expansion step that feeds it new multiples.

use super::generating_set::{ExpansionDegree, GeneratingSet, UnreducedVector};
use super::vector::Vector;
use crate::error::{ResolutionError, Result};
use crate::group::GroupAlgebra;
use crate::matrix::{add_scaled_row, multiply_rows, subtract_row, Matrix};
use tracing::trace;

/// How pending vectors are reduced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SweepMode {
    /// Monic vectors; irreducible ones become reduced.
    Minimal,
    /// Vectors keep their scale; an irreducible one is not in the image.
    Preimage,
}

/// Where vectors whose ambient part vanished go.
pub(crate) enum DegenerateSink<'a> {
    /// Dropped.
    Discard,
    /// The preimage rows become a candidate generator of the kernel.
    Kernel(&'a mut GeneratingSet),
    /// The preimage rows are stored at row `index * s` of the matrix.
    Preimages { result: &'a mut Matrix, s: usize },
}

impl DegenerateSink<'_> {
    fn accept(&mut self, group: &GroupAlgebra, r: usize, vector: &Vector, index: usize) -> Result<()> {
        match self {
            DegenerateSink::Discard => Ok(()),
            DegenerateSink::Kernel(kernel) => kernel.add_heady_generator(group, vector.preimage(r)),
            DegenerateSink::Preimages { result, s } => {
                let s = *s;
                if (index + 1) * s > result.nor() {
                    return Err(ResolutionError::theoretical(format!(
                        "preimage {} does not fit into {} rows",
                        index,
                        result.nor()
                    )));
                }
                result.rows_mut(index * s, s).copy_from_slice(vector.preimage(r));
                Ok(())
            }
        }
    }
}

impl GeneratingSet {
    /// Reduce all pending vectors, sweeping from the depth of the largest one
    /// down to the maximal depth of the group.
    pub(crate) fn aufnahme(
        &mut self,
        group: &GroupAlgebra,
        mode: SweepMode,
        sink: &mut DegenerateSink<'_>,
    ) -> Result<()> {
        let mut sweep = match self.peek_depth() {
            Some(depth) => depth,
            None => return self.destroy_current_dimension_if_any(),
        };
        self.select_new_dimension(group, sweep)?;
        while sweep <= group.max_length() {
            while self.peek_depth() == Some(sweep) {
                let mut uv = match self.pop_unreduced() {
                    Some(uv) => uv,
                    None => break,
                };
                if mode == SweepMode::Minimal {
                    self.perform_linear_reductions(group, &uv.vector, sink)?;
                }
                if self.should_reduce_tip(&uv.vector) {
                    self.reduce_tip_once(group, &mut uv.vector, mode)?;
                    self.process_modified(group, mode, uv, sink)?;
                } else if mode == SweepMode::Minimal {
                    self.promote(group, uv.vector)?;
                } else {
                    self.destroy_current_dimension_if_any()?;
                    return Err(ResolutionError::NotInImage { index: uv.index });
                }
            }
            if self.peek_unreduced().is_none() {
                break;
            }
            self.increment_slice(group)?;
            sweep += 1;
        }
        self.destroy_current_dimension_if_any()
    }

    fn peek_depth(&self) -> Option<usize> {
        self.peek_unreduced().and_then(|uv| uv.vector.depth())
    }

    fn process_modified(
        &mut self,
        group: &GroupAlgebra,
        mode: SweepMode,
        mut uv: UnreducedVector,
        sink: &mut DegenerateSink<'_>,
    ) -> Result<()> {
        uv.vector.find_leading_term(group, self.r);
        if uv.vector.is_degenerate() {
            sink.accept(group, self.r, &uv.vector, uv.index)?;
            self.pool.release(uv.vector);
            return Ok(());
        }
        if mode == SweepMode::Minimal {
            uv.vector.make_monic(group.field())?;
        }
        self.insert_unreduced(uv.vector, uv.index)
    }

    /// Subtract `gv0` from every pending vector with the same monic leading term.
    fn perform_linear_reductions(
        &mut self,
        group: &GroupAlgebra,
        gv0: &Vector,
        sink: &mut DegenerateSink<'_>,
    ) -> Result<()> {
        let lead = gv0.lead();
        while lead.is_some() && self.peek_unreduced().and_then(|uv| uv.vector.lead()) == lead {
            let mut uv = match self.pop_unreduced() {
                Some(uv) => uv,
                None => break,
            };
            subtract_row(group.field(), uv.vector.data_mut(), gv0.data());
            self.process_modified(group, SweepMode::Minimal, uv, sink)?;
        }
        Ok(())
    }

    /// Whether the leading term of `v` is divisible by a reduced vector.
    ///
    /// A radical vector sharing its leading term with a heady reduced vector
    /// is not reduced; promoting it displaces the heady one instead.
    fn should_reduce_tip(&self, v: &Vector) -> bool {
        let lt = match v.lead() {
            Some(lt) => lt,
            None => return false,
        };
        let node = self.forest.node(self.forest.index(lt.block, lt.col));
        match node.divisor {
            None => false,
            Some(id) => {
                let divisor_heady = self.reduced[id]
                    .as_ref()
                    .map_or(false, |rv| !rv.vector.radical);
                !(node.quotient == 0 && divisor_heady && v.radical)
            }
        }
    }

    fn reduce_tip_once(&mut self, group: &GroupAlgebra, v: &mut Vector, mode: SweepMode) -> Result<()> {
        let lt = v
            .lead()
            .ok_or_else(|| ResolutionError::theoretical("cannot reduce a zero vector"))?;
        let index = self.forest.index(lt.block, lt.col);
        let field = group.field();
        let coeff = v.coeff();
        let w = self.slices.node_vector(&self.reduced, &self.forest, index)?;
        match mode {
            SweepMode::Minimal => subtract_row(field, v.data_mut(), w),
            SweepMode::Preimage => add_scaled_row(field, v.data_mut(), w, field.negate(coeff)),
        }
        Ok(())
    }

    /// Multiply every reduced vector not yet expanded at the expansion degree
    /// by the arrows that lead out of its multiples of that depth, queueing
    /// the nonzero products. Raises the expansion degree by one.
    ///
    /// The expansion slice must be loaded.
    pub(crate) fn expand_this_level(&mut self, group: &GroupAlgebra, sink: &mut DegenerateSink<'_>) -> Result<()> {
        let e = match self.exp_dim {
            ExpansionDegree::At(e) => e,
            other => {
                return Err(ResolutionError::theoretical(format!(
                    "cannot expand at {:?}",
                    other
                )))
            }
        };
        let field = group.field();
        let noc = group.nontips();
        let mut queued = 0usize;
        for blo in 0..self.r {
            for pat in group.depth_range(e) {
                let index = self.forest.index(blo, pat);
                let (divisor, ext) = {
                    let node = self.forest.node(index);
                    match node.divisor {
                        Some(id) => (id, node.quotient),
                        None => continue,
                    }
                };
                if self.reduced_vector(divisor)?.exp_dim > e {
                    continue;
                }
                for arrow in 0..group.arrows() {
                    if group.child(ext, arrow).is_none() || group.child(pat, arrow).is_some() {
                        continue;
                    }
                    let mut gv = self.pool.acquire();
                    let w = self.slices.node_vector(&self.reduced, &self.forest, index)?;
                    multiply_rows(field, w, noc, group.action(arrow), gv.data_mut());
                    gv.find_leading_term(group, self.r);
                    match gv.depth() {
                        Some(0) => {
                            return Err(ResolutionError::theoretical(
                                "product with an arrow has depth zero",
                            ))
                        }
                        Some(_) => {
                            gv.make_monic(field)?;
                            self.insert_unreduced(gv, 0)?;
                            queued += 1;
                        }
                        None => {
                            sink.accept(group, self.r, &gv, 0)?;
                            self.pool.release(gv);
                        }
                    }
                }
            }
        }
        for rv in self.reduced.iter_mut().flatten() {
            if rv.exp_dim == e {
                rv.exp_dim += 1;
            }
        }
        self.exp_dim = ExpansionDegree::At(e + 1);
        trace!(degree = e, queued, "expanded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common_groups::cyclic_group;
    use crate::config::ResolutionConfig;
    use tempfile::TempDir;

    fn vector_from(group: &GroupAlgebra, nor: usize, values: &[u32]) -> Vector {
        let field = group.field();
        let mut v = Vector::zeroed(field, nor, group.nontips());
        for (x, &value) in v.data_mut().iter_mut().zip(values) {
            *x = field.from_u32(value);
        }
        v
    }

    #[test]
    fn test_linear_reduction_removes_duplicates() {
        let dir = TempDir::new().unwrap();
        let g = cyclic_group(2, 1).unwrap();
        let stem = dir.path().join("l").to_string_lossy().into_owned();
        let mut gs = GeneratingSet::new(&g, 1, 0, &stem, &ResolutionConfig::new()).unwrap();
        for index in 0..2 {
            let mut v = vector_from(&g, 1, &[1, 1]);
            v.find_leading_term(&g, 1);
            v.radical = false;
            gs.insert_unreduced(v, index).unwrap();
        }
        gs.aufnahme(&g, SweepMode::Minimal, &mut DegenerateSink::Discard).unwrap();

        assert_eq!(gs.number_of_reduced_vectors(), 1);
        assert_eq!(gs.number_of_unreduced_vectors(), 0);
        assert_eq!(gs.pnontips(), 0);
        assert_eq!(gs.expansion_degree(), ExpansionDegree::At(0));
        // The expansion slice outlives the sweep
        assert!(gs.slices.stored_product_file(0).exists());
        gs.destroy_expansion_slice_file().unwrap();
    }

    #[test]
    fn test_degenerate_vectors_feed_the_kernel() {
        let dir = TempDir::new().unwrap();
        let g = cyclic_group(3, 1).unwrap();
        let stem = dir.path().join("k").to_string_lossy().into_owned();
        let config = ResolutionConfig::for_prime(3);
        let mut gs = GeneratingSet::new(&g, 1, 1, &stem, &config).unwrap();
        let mut kernel = GeneratingSet::new(&g, 1, 0, &format!("{}f", stem), &config).unwrap();
        // Same image, different preimages: the difference lies in the kernel
        for (index, pre) in [[2u32, 0, 0], [0, 2, 0]].iter().enumerate() {
            let mut values = vec![0, 1, 0];
            values.extend_from_slice(pre);
            let mut v = vector_from(&g, 2, &values);
            v.find_leading_term(&g, 1);
            gs.insert_unreduced(v, index).unwrap();
        }
        gs.aufnahme(&g, SweepMode::Minimal, &mut DegenerateSink::Kernel(&mut kernel))
            .unwrap();

        assert_eq!(gs.number_of_reduced_vectors(), 1);
        assert_eq!(kernel.number_of_heady_vectors(), 1);
        let uv = kernel.peek_unreduced().unwrap();
        let values: Vec<u32> = uv.vector.data().iter().map(|x| g.field().to_u32(x)).collect();
        // (0, 2, 0) - (2, 0, 0) made monic
        assert_eq!(values, vec![1, 2, 0]);
        gs.destroy_expansion_slice_file().unwrap();
    }

    fn first_differential_basis(g: &GroupAlgebra, stem: &str) -> GeneratingSet {
        let p = g.prime() as u32;
        let config = ResolutionConfig::for_prime(g.prime());
        let mut gs = GeneratingSet::new(g, 1, 1, stem, &config).unwrap();
        gs.exp_dim = ExpansionDegree::NotRequired;
        let mut values = vec![0; 2 * g.nontips()];
        values[1] = 1;
        values[g.nontips()] = p - 1;
        let basis = Matrix::from_data(
            g.field(),
            2,
            g.nontips(),
            values.iter().map(|&x| g.field().from_u32(x)).collect(),
        )
        .unwrap();
        gs.assert_reduced_vectors(g, &basis).unwrap();
        gs
    }

    #[test]
    fn test_preimage_sweep() {
        let dir = TempDir::new().unwrap();
        let g = cyclic_group(3, 1).unwrap();
        let stem = dir.path().join("u").to_string_lossy().into_owned();
        let mut gs = first_differential_basis(&g, &stem);

        let mut v = vector_from(&g, 2, &[0, 0, 2, 0, 0, 0]);
        v.find_leading_term(&g, 1);
        gs.insert_unreduced(v, 0).unwrap();
        let mut result = Matrix::zero(g.field(), 1, 3);
        gs.aufnahme(
            &g,
            SweepMode::Preimage,
            &mut DegenerateSink::Preimages {
                result: &mut result,
                s: 1,
            },
        )
        .unwrap();
        // 2 x^2 = (2 x) * x
        assert_eq!(result.to_rows(), vec![vec![0, 2, 0]]);
        assert!(gs.slices.dim_loaded().is_none());
    }

    #[test]
    fn test_vector_outside_image_is_rejected() {
        let dir = TempDir::new().unwrap();
        let g = cyclic_group(2, 1).unwrap();
        let stem = dir.path().join("n").to_string_lossy().into_owned();
        let mut gs = first_differential_basis(&g, &stem);

        let mut v = vector_from(&g, 2, &[1, 0, 0, 0]);
        v.find_leading_term(&g, 1);
        gs.insert_unreduced(v, 4).unwrap();
        let mut result = Matrix::zero(g.field(), 5, 2);
        let err = gs
            .aufnahme(
                &g,
                SweepMode::Preimage,
                &mut DegenerateSink::Preimages {
                    result: &mut result,
                    s: 1,
                },
            )
            .unwrap_err();
        assert!(matches!(err, ResolutionError::NotInImage { index: 4 }));
        assert!(!gs.slices.stored_product_file(0).exists());
    }
}
