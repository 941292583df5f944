//! Completion loops.
//!
//! A [`FlaggedGeneratingSet`] completes a submodule and tracks which of its
//! vectors are minimal generators. A [`ResentfulGeneratingSet`] completes the
//! image of a map while collecting the kernel in a flagged set of its own;
//! both are driven depth by depth, and the kernel completion is interleaved
//! with the image completion as soon as the image is known to be complete.

use super::aufnahme::{DegenerateSink, SweepMode};
use super::generating_set::{ExpansionDegree, GeneratingSet};
use crate::config::ResolutionConfig;
use crate::error::{ResolutionError, Result};
use crate::group::GroupAlgebra;
use crate::matrix::Matrix;
use tracing::debug;

impl GeneratingSet {
    /// The submodule has its expected dimension.
    pub(crate) fn easy_correct_rank(&self, group: &GroupAlgebra) -> bool {
        match self.target_rank {
            Some(target) => target + self.pnontips == self.r * group.nontips(),
            None => false,
        }
    }

    pub(crate) fn all_expansions_done(&self, group: &GroupAlgebra) -> Result<bool> {
        match self.exp_dim {
            ExpansionDegree::NotRequired => Err(ResolutionError::theoretical(
                "completion requested for a set used only for reduction",
            )),
            ExpansionDegree::Nothing => Ok(true),
            ExpansionDegree::At(e) => Ok(e > group.max_length()),
        }
    }

    fn initialize_status(&mut self) {
        self.prev_pnontips = self.pnontips;
        self.unfruitful = 0;
    }

    fn update_status(&mut self) {
        if self.pnontips < self.prev_pnontips {
            self.prev_pnontips = self.pnontips;
            self.unfruitful = 0;
        } else {
            self.unfruitful += 1;
        }
    }

    /// The deepest minimal generator lies within the expanded depths.
    fn heady_within_expansion(&self) -> bool {
        match self.exp_dim {
            ExpansionDegree::At(e) => self.dimension_of_deepest_heady() <= e,
            _ => false,
        }
    }
}

/// A generating set that knows which of its vectors are minimal generators.
pub struct FlaggedGeneratingSet {
    pub(crate) gs: GeneratingSet,
    finished: bool,
    /// More generators may still arrive from an image computation.
    pub(crate) image_unfinished: bool,
    max_unfruitful: usize,
}

impl FlaggedGeneratingSet {
    /// An empty submodule of the free module of rank `r`.
    pub fn new(group: &GroupAlgebra, r: usize, stem: &str, config: &ResolutionConfig) -> Result<Self> {
        Ok(FlaggedGeneratingSet {
            gs: GeneratingSet::new(group, r, 0, stem, config)?,
            finished: false,
            image_unfinished: false,
            max_unfruitful: config.max_unfruitful,
        })
    }

    /// The underlying generating set.
    pub fn generating_set(&self) -> &GeneratingSet {
        &self.gs
    }

    /// True once the minimal generators are known.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Expected dimension of the submodule, if known.
    pub fn set_target_rank(&mut self, rank: Option<usize>) {
        self.gs.set_target_rank(rank);
    }

    /// Queue the rows of `mat`, read as vectors of `r` rows each, as
    /// candidate generators.
    pub fn add_generators(&mut self, group: &GroupAlgebra, mat: &Matrix) -> Result<()> {
        let r = self.gs.r;
        if r == 0 || mat.nor() % r != 0 || mat.noc() != group.nontips() {
            return Err(ResolutionError::BadArgument(format!(
                "a {}x{} matrix is not a list of vectors of rank {}",
                mat.nor(),
                mat.noc(),
                r
            )));
        }
        for i in 0..mat.nor() / r {
            self.gs.add_heady_generator(group, mat.rows(i * r, r))?;
        }
        self.finished = false;
        Ok(())
    }

    fn buchberger_finished(&self, group: &GroupAlgebra) -> Result<bool> {
        let hard = self.gs.easy_correct_rank(group)
            || (!self.image_unfinished
                && self.gs.number_of_unreduced_vectors() == 0
                && self.gs.all_expansions_done(group)?);
        Ok(hard && self.gs.heady_within_expansion())
    }

    fn should_fetch_more_generators(&self, group: &GroupAlgebra) -> bool {
        self.image_unfinished
            && self.gs.unfruitful >= self.max_unfruitful
            && !self.gs.easy_correct_rank(group)
            && self.gs.heady_within_expansion()
    }

    /// Complete the submodule until the minimal generators are known, or
    /// until waiting for more generators looks more promising.
    pub fn buchberger(&mut self, group: &GroupAlgebra) -> Result<()> {
        self.gs.aufnahme(group, SweepMode::Minimal, &mut DegenerateSink::Discard)?;
        self.gs.initialize_status();
        if self.buchberger_finished(group)? {
            self.finished = true;
        } else {
            while !self.gs.all_expansions_done(group)? {
                self.gs.load_expansion_slice(group)?;
                self.gs.expand_this_level(group, &mut DegenerateSink::Discard)?;
                self.gs.increment_slice(group)?;
                self.gs.aufnahme(group, SweepMode::Minimal, &mut DegenerateSink::Discard)?;
                self.gs.update_status();
                if self.buchberger_finished(group)? {
                    self.finished = true;
                    break;
                }
                if self.should_fetch_more_generators(group) {
                    break;
                }
            }
        }
        if self.finished {
            self.gs.destroy_expansion_slice_file()?;
        }
        debug!(
            finished = self.finished,
            heady = self.gs.number_of_heady_vectors(),
            pnontips = self.gs.pnontips,
            "flagged completion"
        );
        Ok(())
    }

    /// Minimal generators found so far.
    pub fn number_of_minimal_generators(&self) -> usize {
        self.gs.number_of_heady_vectors()
    }

    /// Minimal generators, `r` rows each.
    pub fn minimal_generators(&self, group: &GroupAlgebra) -> Result<Matrix> {
        self.gs.minimal_generators(group)
    }
}

/// Completes the image of a map between free modules, collecting its kernel.
///
/// Vectors carry `r` image rows followed by `s` rows recording the source
/// element they are the image of. A vector whose image part reduces to zero
/// hands its source rows to the kernel.
pub struct ResentfulGeneratingSet {
    pub(crate) gs: GeneratingSet,
    pub(crate) kernel: FlaggedGeneratingSet,
    prev_kernel_pnontips: usize,
    overshoot: usize,
}

impl ResentfulGeneratingSet {
    /// Slice files use `<stem>r` for the image and `<stem>f` for the kernel.
    pub fn new(group: &GroupAlgebra, r: usize, s: usize, stem: &str, config: &ResolutionConfig) -> Result<Self> {
        Ok(ResentfulGeneratingSet {
            gs: GeneratingSet::new(group, r, s, &format!("{}r", stem), config)?,
            kernel: FlaggedGeneratingSet::new(group, s, &format!("{}f", stem), config)?,
            prev_kernel_pnontips: 0,
            overshoot: config.max_overshoot,
        })
    }

    /// The set completing the image.
    pub fn image(&self) -> &GeneratingSet {
        &self.gs
    }

    /// The set collecting the kernel.
    pub fn kernel(&self) -> &FlaggedGeneratingSet {
        &self.kernel
    }

    /// Expected dimensions of the image and of the kernel.
    pub fn set_target_ranks(&mut self, image: Option<usize>, kernel: Option<usize>) {
        self.gs.set_target_rank(image);
        self.kernel.set_target_rank(kernel);
    }

    /// Queue the `n` vectors `(images[i], preimages[i])`, where images are
    /// `r` rows each and preimages `s` rows each.
    pub fn initialize_vectors(&mut self, group: &GroupAlgebra, images: &Matrix, preimages: &Matrix, n: usize) -> Result<()> {
        let (r, s) = (self.gs.r, self.gs.s);
        if images.nor() != n * r || preimages.nor() != n * s {
            return Err(ResolutionError::BadArgument(format!(
                "expected {} image rows and {} preimage rows, got {} and {}",
                n * r,
                n * s,
                images.nor(),
                preimages.nor()
            )));
        }
        let width = r * group.nontips();
        for i in 0..n {
            let mut gv = self.gs.pool.acquire();
            gv.data_mut()[..width].copy_from_slice(images.rows(i * r, r));
            gv.find_leading_term(group, r);
            if gv.is_degenerate() {
                self.gs.pool.release(gv);
                self.kernel.gs.add_heady_generator(group, preimages.rows(i * s, s))?;
            } else {
                gv.data_mut()[width..].copy_from_slice(preimages.rows(i * s, s));
                gv.make_monic(group.field())?;
                self.gs.insert_unreduced(gv, 0)?;
            }
        }
        Ok(())
    }

    fn appropriate_to_perform_heady_buchberger(&self, group: &GroupAlgebra) -> bool {
        if !self.gs.easy_correct_rank(group) {
            return false;
        }
        if !self.kernel.image_unfinished || self.gs.unfruitful == self.overshoot {
            return true;
        }
        if self.gs.unfruitful < self.overshoot {
            return false;
        }
        self.kernel.gs.pnontips < self.prev_kernel_pnontips
    }

    fn check_ranks_correct(&self) -> Result<()> {
        match self.gs.target_rank {
            Some(expected) if self.kernel.gs.pnontips != expected => Err(ResolutionError::RankMismatch {
                expected,
                found: self.kernel.gs.pnontips,
            }),
            _ => Ok(()),
        }
    }

    /// Complete the image and the kernel.
    pub fn buchberger(&mut self, group: &GroupAlgebra) -> Result<()> {
        self.kernel.image_unfinished = true;
        self.gs.aufnahme(
            group,
            SweepMode::Minimal,
            &mut DegenerateSink::Kernel(&mut self.kernel.gs),
        )?;
        self.gs.initialize_status();
        while !self.gs.all_expansions_done(group)? {
            self.prev_kernel_pnontips = self.kernel.gs.pnontips;
            self.gs.load_expansion_slice(group)?;
            self.gs
                .expand_this_level(group, &mut DegenerateSink::Kernel(&mut self.kernel.gs))?;
            self.gs.increment_slice(group)?;
            self.gs.aufnahme(
                group,
                SweepMode::Minimal,
                &mut DegenerateSink::Kernel(&mut self.kernel.gs),
            )?;
            if self.gs.all_expansions_done(group)? {
                self.kernel.image_unfinished = false;
            }
            self.gs.update_status();
            self.kernel
                .gs
                .aufnahme(group, SweepMode::Minimal, &mut DegenerateSink::Discard)?;
            if self.appropriate_to_perform_heady_buchberger(group) {
                self.kernel.buchberger(group)?;
                if self.kernel.finished {
                    break;
                }
            }
        }
        self.kernel.image_unfinished = false;
        if !self.kernel.finished {
            self.kernel.buchberger(group)?;
        }
        self.gs.destroy_expansion_slice_file()?;
        debug!(
            image_pnontips = self.gs.pnontips,
            kernel_generators = self.kernel.number_of_minimal_generators(),
            "resentful completion"
        );
        self.check_ranks_correct()
    }
}
