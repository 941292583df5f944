//! The resolution driver.
//!
//! A [`Resolution`] builds a minimal free resolution
//!
//! ```text
//! ... -> P_2 -d_2-> P_1 -d_1-> P_0 -> M -> 0
//! ```
//!
//! one degree at a time. The differential `d_n` is stored in
//! `<stem>dNN.bin` as `rank(n)` vectors of `rank(n-1)` rows each. Computing
//! `d_{n+1}` also yields a Gröbner basis of the image of `d_n` with preimages
//! attached (the Urbild basis), stored in `<stem>dNN.ugb`; it is what
//! [`Resolution::compute_preimages`] reduces against.
//!
//! Files are written once per degree and never recomputed, so a driver
//! pointed at an existing stem resumes where the last one stopped.

use crate::config::ResolutionConfig;
use crate::error::{ResolutionError, Result};
use crate::groebner::aufnahme::{DegenerateSink, SweepMode};
use crate::groebner::{ExpansionDegree, GeneratingSet, ResentfulGeneratingSet, SliceStats};
use crate::group::GroupAlgebra;
use crate::matrix::io::{load, read_header, save};
use crate::matrix::Matrix;
use std::path::PathBuf;
use tracing::{debug, info};

/// A minimal resolution of the trivial module, or of a module given by its
/// first differential, stored under a file stem.
pub struct Resolution {
    group: GroupAlgebra,
    stem: String,
    config: ResolutionConfig,
    /// Resolving a module other than the trivial one.
    module: bool,
    /// `projrank[n]` for `n <= numproj`.
    projrank: Vec<usize>,
    /// `imdim[n]` for `n <= numproj + 1`.
    imdim: Vec<usize>,
    stats: SliceStats,
}

/// Result of completing the image of one differential.
struct Completion {
    rank: usize,
    minimal_generators: Matrix,
    urbild_basis: Matrix,
}

impl Resolution {
    /// Resolution of the trivial module with the defaults for the group's prime.
    ///
    /// # Example
    /// ```ignore
    /// use pgroup_resolution::*;
    ///
    /// let mut res = Resolution::new(cyclic_group(3, 1)?, "/tmp/z3/")?;
    /// res.ensure_projective_known(4)?;
    /// assert_eq!(res.rank(4)?, 1);
    /// ```
    pub fn new(group: GroupAlgebra, stem: &str) -> Result<Self> {
        let config = ResolutionConfig::for_prime(group.prime());
        Self::with_config(group, stem, config)
    }

    /// Resolution of the trivial module.
    pub fn with_config(group: GroupAlgebra, stem: &str, config: ResolutionConfig) -> Result<Self> {
        config.validate()?;
        let mut res = Resolution {
            group,
            stem: stem.to_string(),
            config,
            module: false,
            projrank: vec![1],
            imdim: vec![1],
            stats: SliceStats::default(),
        };
        let im1 = res.next_image_dimension()?;
        res.imdim.push(im1);
        Ok(res)
    }

    /// Resolution of a module of dimension `module_dimension` whose projective
    /// cover has rank `rank_p0`.
    ///
    /// The first differential is not constructed; it must be stored as
    /// `<stem>d01.bin` (see [`Resolution::set_first_differential`]).
    pub fn for_module(group: GroupAlgebra, stem: &str, rank_p0: usize, module_dimension: usize) -> Result<Self> {
        let config = ResolutionConfig::for_prime(group.prime());
        Self::for_module_with_config(group, stem, rank_p0, module_dimension, config)
    }

    /// Like [`Resolution::for_module`], with explicit tuning parameters.
    pub fn for_module_with_config(
        group: GroupAlgebra,
        stem: &str,
        rank_p0: usize,
        module_dimension: usize,
        config: ResolutionConfig,
    ) -> Result<Self> {
        config.validate()?;
        if module_dimension > rank_p0 * group.nontips() {
            return Err(ResolutionError::BadArgument(format!(
                "a module of dimension {} is no quotient of a free module of rank {}",
                module_dimension, rank_p0
            )));
        }
        let mut res = Resolution {
            group,
            stem: stem.to_string(),
            config,
            module: true,
            projrank: vec![rank_p0],
            imdim: vec![module_dimension],
            stats: SliceStats::default(),
        };
        let im1 = res.next_image_dimension()?;
        res.imdim.push(im1);
        Ok(res)
    }

    /// Replace the tuning parameters.
    pub fn set_config(&mut self, config: ResolutionConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// The group algebra being resolved over.
    pub fn group(&self) -> &GroupAlgebra {
        &self.group
    }

    /// Prefix of every file this resolution writes.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// The tuning parameters.
    pub fn config(&self) -> &ResolutionConfig {
        &self.config
    }

    /// Highest degree whose projective is known.
    pub fn num_projectives(&self) -> usize {
        self.projrank.len() - 1
    }

    /// Rank of the free module `P_n`.
    pub fn rank(&self, n: usize) -> Result<usize> {
        self.projrank.get(n).copied().ok_or(ResolutionError::DegreeUnknown {
            degree: n,
            known: self.num_projectives(),
        })
    }

    /// Dimension of the image of `d_n` (of the module itself for `n = 0`).
    /// Known up to one degree beyond the known projectives.
    pub fn image_dimension(&self, n: usize) -> Result<usize> {
        self.imdim.get(n).copied().ok_or(ResolutionError::DegreeUnknown {
            degree: n,
            known: self.num_projectives(),
        })
    }

    /// Slice file traffic of every computation run so far.
    pub fn slice_stats(&self) -> SliceStats {
        self.stats
    }

    /// File holding `d_n`.
    pub fn differential_file(&self, n: usize) -> PathBuf {
        PathBuf::from(format!("{}d{:02}.bin", self.stem, n))
    }

    /// File holding the Urbild Gröbner basis of `d_n`.
    pub fn urbild_gb_file(&self, n: usize) -> PathBuf {
        PathBuf::from(format!("{}d{:02}.ugb", self.stem, n))
    }

    /// Rank–nullity: the image of `d_{n+1}` is the kernel of `d_n`.
    fn next_image_dimension(&self) -> Result<usize> {
        let n = self.imdim.len();
        (self.projrank[n - 1] * self.group.nontips())
            .checked_sub(self.imdim[n - 1])
            .ok_or_else(|| {
                ResolutionError::theoretical(format!(
                    "image of degree {} is larger than its target",
                    n - 1
                ))
            })
    }

    fn set_rank(&mut self, n: usize, rank: usize) -> Result<()> {
        let expected = self.num_projectives() + 1;
        if n != expected {
            return Err(ResolutionError::UnexpectedDegree { requested: n, expected });
        }
        self.projrank.push(rank);
        let im = self.next_image_dimension()?;
        self.imdim.push(im);
        Ok(())
    }

    /// Store `d_1` for a module resolution and record the rank of `P_1`.
    pub fn set_first_differential(&mut self, d1: &Matrix) -> Result<()> {
        if self.num_projectives() != 0 {
            return Err(ResolutionError::UnexpectedDegree {
                requested: 1,
                expected: self.num_projectives() + 1,
            });
        }
        let r = self.projrank[0];
        if d1.noc() != self.group.nontips() || r == 0 || d1.nor() % r != 0 {
            return Err(ResolutionError::BadArgument(format!(
                "a {}x{} matrix does not map into a free module of rank {}",
                d1.nor(),
                d1.noc(),
                r
            )));
        }
        save(d1, self.differential_file(1))?;
        self.set_rank(1, d1.nor() / r)
    }

    /// Make sure `P_1, ..., P_n` and their differentials are known, reading
    /// stored differentials and constructing the missing ones.
    pub fn ensure_projective_known(&mut self, n: usize) -> Result<()> {
        while self.num_projectives() < n {
            let d = self.num_projectives() + 1;
            self.read_or_construct_projective(d)?;
        }
        Ok(())
    }

    /// Recover the ranks from stored differentials up to degree `n`, stopping
    /// at the first one missing. Returns the highest known degree.
    pub fn read_known_resolution(&mut self, n: usize) -> Result<usize> {
        while self.num_projectives() < n {
            let d = self.num_projectives() + 1;
            if !self.differential_file(d).exists() {
                break;
            }
            self.read_projective(d)?;
        }
        Ok(self.num_projectives())
    }

    fn read_or_construct_projective(&mut self, n: usize) -> Result<()> {
        if self.differential_file(n).exists() {
            self.read_projective(n)
        } else if n == 1 {
            self.make_first_differential()
        } else {
            self.make_differential(n)
        }
    }

    fn read_projective(&mut self, n: usize) -> Result<()> {
        let path = self.differential_file(n);
        let header = read_header(&path)?;
        if header.field_order != self.group.prime() || header.noc != self.group.nontips() {
            return Err(ResolutionError::format(
                &path,
                format!(
                    "holds a matrix over GF({}) with {} columns, expected GF({}) with {}",
                    header.field_order,
                    header.noc,
                    self.group.prime(),
                    self.group.nontips()
                ),
            ));
        }
        let r = self.rank(n - 1)?;
        let rows = header.nor;
        if (r == 0 && rows != 0) || (r != 0 && rows % r != 0) {
            return Err(ResolutionError::format(
                &path,
                format!("{} rows are not a multiple of rank {}", rows, r),
            ));
        }
        // P_{n-1} = 0 forces P_n = 0
        let rank = if r == 0 { 0 } else { rows / r };
        debug!(degree = n, rank, "read projective");
        self.set_rank(n, rank)
    }

    /// `d_1` of the trivial module: one row per arrow, mapping the generator
    /// to the arrow.
    fn make_first_differential(&mut self) -> Result<()> {
        if self.module {
            return Err(ResolutionError::BadArgument(format!(
                "the first differential of a module resolution must be stored in {}",
                self.differential_file(1).display()
            )));
        }
        let field = self.group.field();
        let arrows = self.group.arrows();
        let mut d1 = Matrix::zero(field, arrows, self.group.nontips());
        for i in 0..arrows {
            d1.row_mut(i)[i + 1] = field.one();
        }
        save(&d1, self.differential_file(1))?;
        self.set_rank(1, arrows)?;
        info!(degree = 1, rank = arrows, "constructed projective");
        Ok(())
    }

    /// Complete the image of `d_{n-1}`; its kernel's minimal generators form `d_n`.
    fn complete_differential(&mut self, n: usize) -> Result<Completion> {
        let r = self.rank(n - 2)?;
        let s = self.rank(n - 1)?;
        let field = self.group.field();
        let nontips = self.group.nontips();
        let d = load(self.differential_file(n - 1), field)?;
        if d.nor() != r * s || d.noc() != nontips {
            return Err(ResolutionError::format(
                self.differential_file(n - 1),
                format!("expected {}x{} entries, found {}x{}", r * s, nontips, d.nor(), d.noc()),
            ));
        }

        // The i-th vector is (d(e_i), -e_i)
        let mut pre = Matrix::zero(field, s * s, nontips);
        for i in 0..s {
            pre.row_mut(i * s + i)[0] = field.minus_one();
        }

        let stem = format!("{}d{}", self.stem, n - 1);
        let mut rgs = ResentfulGeneratingSet::new(&self.group, r, s, &stem, &self.config)?;
        rgs.set_target_ranks(
            Some(self.image_dimension(n - 1)?),
            Some(self.image_dimension(n)?),
        );
        rgs.initialize_vectors(&self.group, &d, &pre, s)?;
        rgs.buchberger(&self.group)?;

        self.stats = self
            .stats
            .merged(rgs.image().slice_stats())
            .merged(rgs.kernel().generating_set().slice_stats());
        let rank = rgs.kernel().number_of_minimal_generators();
        let minimal_generators = rgs.kernel().minimal_generators(&self.group)?;
        if minimal_generators.nor() != rank * s {
            return Err(ResolutionError::theoretical(format!(
                "{} minimal generators found, but only {} rows are reduced",
                rank,
                minimal_generators.nor()
            )));
        }
        Ok(Completion {
            rank,
            minimal_generators,
            urbild_basis: rgs.image().reduced_basis(&self.group)?,
        })
    }

    fn make_differential(&mut self, n: usize) -> Result<()> {
        let completion = self.complete_differential(n)?;
        // The rank is only committed once both files are on disk
        save(&completion.minimal_generators, self.differential_file(n))?;
        save(&completion.urbild_basis, self.urbild_gb_file(n - 1))?;
        self.set_rank(n, completion.rank)?;
        info!(degree = n, rank = completion.rank, "constructed projective");
        Ok(())
    }

    /// Make sure the Urbild Gröbner basis of `d_n` is stored.
    ///
    /// This constructs `d_{n+1}` if it is not known yet. Otherwise the basis
    /// is recomputed, and the kernel rank checked against the known `P_{n+1}`.
    pub fn ensure_urbild_gb_known(&mut self, n: usize) -> Result<()> {
        if n < 1 || n > self.num_projectives() {
            return Err(ResolutionError::BadArgument(format!(
                "Urbild Gröbner basis of degree {} requested, but projectives are known up to degree {}",
                n,
                self.num_projectives()
            )));
        }
        if self.urbild_gb_file(n).exists() {
            return Ok(());
        }
        if self.num_projectives() == n && !self.differential_file(n + 1).exists() {
            return self.make_differential(n + 1);
        }
        if self.num_projectives() == n {
            self.read_projective(n + 1)?;
        }
        let completion = self.complete_differential(n + 1)?;
        let expected = self.rank(n + 1)?;
        if completion.rank != expected {
            return Err(ResolutionError::RankMismatch {
                expected,
                found: completion.rank,
            });
        }
        save(&completion.urbild_basis, self.urbild_gb_file(n))?;
        debug!(degree = n, "recomputed Urbild Gröbner basis");
        Ok(())
    }

    /// Preimages under `d_n` of the rows of `images`, read as vectors of
    /// `rank(n-1)` rows each.
    ///
    /// The result has `rank(n)` rows per vector. Fails with
    /// [`ResolutionError::NotInImage`] for the first vector outside the image.
    pub fn compute_preimages(&mut self, n: usize, images: &Matrix) -> Result<Matrix> {
        self.ensure_urbild_gb_known(n)?;
        let r = self.rank(n - 1)?;
        let s = self.rank(n)?;
        let nontips = self.group.nontips();
        if images.noc() != nontips || r == 0 || images.nor() % r != 0 {
            return Err(ResolutionError::BadArgument(format!(
                "a {}x{} matrix is not a list of vectors of rank {}",
                images.nor(),
                images.noc(),
                r
            )));
        }
        let num = images.nor() / r;
        let ugb = load(self.urbild_gb_file(n), self.group.field())?;

        let stem = format!("{}d{}u", self.stem, n);
        let mut gs = GeneratingSet::new(&self.group, r, s, &stem, &self.config)?;
        gs.exp_dim = ExpansionDegree::NotRequired;
        gs.set_target_rank(Some(self.image_dimension(n)?));
        gs.assert_reduced_vectors(&self.group, &ugb)?;

        let width = r * nontips;
        for i in 0..num {
            let mut gv = gs.pool.acquire();
            gv.data_mut()[..width].copy_from_slice(images.rows(i * r, r));
            gv.find_leading_term(&self.group, r);
            if gv.is_degenerate() {
                gs.pool.release(gv);
            } else {
                gs.insert_unreduced(gv, i)?;
            }
        }

        let mut result = Matrix::zero(self.group.field(), num * s, nontips);
        let outcome = gs.aufnahme(
            &self.group,
            SweepMode::Preimage,
            &mut DegenerateSink::Preimages {
                result: &mut result,
                s,
            },
        );
        self.stats = self.stats.merged(gs.slice_stats());
        outcome?;
        debug!(degree = n, vectors = num, "computed preimages");
        Ok(result)
    }

    /// The differential `d_n`, constructing it if necessary.
    pub fn differential(&mut self, n: usize) -> Result<Matrix> {
        if n == 0 {
            return Err(ResolutionError::BadArgument(
                "differentials start in degree 1".to_string(),
            ));
        }
        self.ensure_projective_known(n)?;
        load(self.differential_file(n), self.group.field())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common_groups::cyclic_group;
    use tempfile::TempDir;

    fn stem(dir: &TempDir) -> String {
        format!("{}/", dir.path().display())
    }

    #[test]
    fn test_degree_bookkeeping() {
        let dir = TempDir::new().unwrap();
        let mut res = Resolution::new(cyclic_group(2, 1).unwrap(), &stem(&dir)).unwrap();
        assert_eq!(res.num_projectives(), 0);
        assert_eq!(res.rank(0).unwrap(), 1);
        assert_eq!(res.image_dimension(1).unwrap(), 1);
        assert!(matches!(
            res.rank(1),
            Err(ResolutionError::DegreeUnknown { degree: 1, known: 0 })
        ));
        assert!(matches!(
            res.set_rank(2, 1),
            Err(ResolutionError::UnexpectedDegree { requested: 2, expected: 1 })
        ));
        assert!(res.ensure_urbild_gb_known(1).is_err());
    }

    #[test]
    fn test_first_differential_maps_to_arrows() {
        let dir = TempDir::new().unwrap();
        let mut res = Resolution::new(cyclic_group(3, 1).unwrap(), &stem(&dir)).unwrap();
        let d1 = res.differential(1).unwrap();
        assert_eq!(d1.to_rows(), vec![vec![0, 1, 0]]);
        assert_eq!(res.rank(1).unwrap(), 1);
        assert_eq!(res.image_dimension(2).unwrap(), 1);
        assert!(res.differential_file(1).ends_with("d01.bin"));
    }

    #[test]
    fn test_second_differential_of_z2() {
        let dir = TempDir::new().unwrap();
        let mut res = Resolution::new(cyclic_group(2, 1).unwrap(), &stem(&dir)).unwrap();
        res.ensure_projective_known(2).unwrap();
        assert_eq!(res.rank(2).unwrap(), 1);
        assert_eq!(res.differential(2).unwrap().to_rows(), vec![vec![0, 1]]);
        assert!(res.urbild_gb_file(1).exists());
    }

    #[test]
    fn test_module_needs_first_differential() {
        let dir = TempDir::new().unwrap();
        let g = cyclic_group(2, 2).unwrap();
        let mut res = Resolution::for_module(g, &stem(&dir), 1, 2).unwrap();
        assert!(matches!(
            res.ensure_projective_known(1),
            Err(ResolutionError::BadArgument(_))
        ));
        // Z/4 acting on F_2[x]/(x^2): P_0 = FG, relation x^2
        let d1 = Matrix::from_rows(res.group().field(), 4, &[vec![0, 0, 1, 0]]).unwrap();
        res.set_first_differential(&d1).unwrap();
        assert_eq!(res.image_dimension(1).unwrap(), 2);
        res.ensure_projective_known(3).unwrap();
        assert_eq!(res.rank(2).unwrap(), 1);
        assert_eq!(res.rank(3).unwrap(), 1);
    }

    #[test]
    fn test_module_with_small_blocks() {
        let dir = TempDir::new().unwrap();
        let g = cyclic_group(2, 2).unwrap();
        let config = ResolutionConfig::for_prime(2).with_block_size(1);
        let mut res = Resolution::for_module_with_config(g, &stem(&dir), 1, 2, config.clone()).unwrap();
        assert_eq!(res.config(), &config);
        let d1 = Matrix::from_rows(res.group().field(), 4, &[vec![0, 0, 1, 0]]).unwrap();
        res.set_first_differential(&d1).unwrap();
        res.ensure_projective_known(3).unwrap();
        assert_eq!(res.rank(3).unwrap(), 1);
        assert!(res.slice_stats().files_created > 0);

        let bad = ResolutionConfig::for_prime(2).with_block_size(0);
        assert!(Resolution::for_module_with_config(cyclic_group(2, 2).unwrap(), &stem(&dir), 1, 2, bad).is_err());
    }

    #[test]
    fn test_failed_save_leaves_rank_unknown() {
        let dir = TempDir::new().unwrap();
        let mut res = Resolution::new(cyclic_group(2, 1).unwrap(), &stem(&dir)).unwrap();
        res.ensure_projective_known(1).unwrap();
        // A directory in place of the Urbild basis file makes the save fail
        std::fs::create_dir(res.urbild_gb_file(1)).unwrap();
        assert!(matches!(
            res.ensure_projective_known(2),
            Err(ResolutionError::Io { .. })
        ));
        assert_eq!(res.num_projectives(), 1);
        assert!(res.rank(2).is_err());

        std::fs::remove_dir(res.urbild_gb_file(1)).unwrap();
        res.ensure_projective_known(2).unwrap();
        assert_eq!(res.rank(2).unwrap(), 1);
        res.ensure_urbild_gb_known(1).unwrap();
        assert!(res.urbild_gb_file(1).is_file());
    }
}
