//! Gröbner bases for submodules of free modules over a group algebra
//!
//! Vectors are elements of a free module of rank `r`, stored as `r` rows of
//! coefficients over the monomial basis of the group algebra. The leading
//! term of a vector is its shallowest nonzero entry. A submodule is completed
//! depth by depth:
//!
//! 1. **Sweep** (*Aufnahme*): pending vectors are reduced against the
//!    reduced list in order, shallowest first. A vector whose leading term is
//!    not divisible becomes reduced and marks every multiple of its leading
//!    term in the word forest.
//! 2. **Expansion**: at the expansion degree `e`, every reduced vector is
//!    multiplied by the arrows that leave its multiples of depth `e`. Nonzero
//!    products become pending vectors.
//! 3. Repeat until all depths are expanded or the dimension count shows the
//!    basis is complete.
//!
//! Multiples of reduced vectors are needed at every depth the sweep visits.
//! They are computed once per depth and paged from disk; see [`SliceStats`].
//!
//! ## Example
//!
//! ```ignore
//! use pgroup_resolution::*;
//!
//! let group = cyclic_group(2, 2)?;
//! let config = ResolutionConfig::new();
//! let mut fgs = FlaggedGeneratingSet::new(&group, 1, "/tmp/sub", &config)?;
//!
//! let gens = Matrix::from_rows(group.field(), 4, &[vec![0, 1, 0, 0], vec![0, 0, 1, 0]])?;
//! fgs.add_generators(&group, &gens)?;
//! fgs.buchberger(&group)?;
//! assert_eq!(fgs.number_of_minimal_generators(), 1);
//! ```

pub(crate) mod aufnahme;
pub mod buchberger;
pub(crate) mod forest;
pub mod generating_set;
pub(crate) mod slice;
pub(crate) mod vector;

pub use buchberger::{FlaggedGeneratingSet, ResentfulGeneratingSet};
pub use generating_set::{ExpansionDegree, GeneratingSet};
pub use slice::SliceStats;
