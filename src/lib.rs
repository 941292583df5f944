//! # pgroup-resolution
//!
//! Minimal free resolutions over modular group algebras of finite p-groups.
//!
//! The group algebra `F_p G` is given by a basis of paths ("nontips") in its
//! generators together with the right action of each generator. Each
//! differential of the resolution is found as the minimal generating set of
//! the kernel of the previous one, computed with a noncommutative Gröbner
//! basis. Multiples of basis vectors needed during reduction are cached on
//! disk one depth at a time, so the working set stays bounded even for large
//! groups.
//!
//! ## Features
//!
//! - **Prime fields**: coefficients live in feanor-math's `Zn` for any prime below 2^31
//! - **Standard groups**: cyclic, elementary abelian and abelian p-groups out of the box
//! - **Custom groups**: load any group algebra from a JSON description
//! - **Resumable**: every differential is written to disk once and reused on the next run
//! - **Preimages**: lift vectors through any known differential
//!
//! ## Quick Start
//!
//! ```ignore
//! use pgroup_resolution::*;
//!
//! // Resolve the trivial module of Z/4 in a scratch directory
//! let group = cyclic_group(2, 2)?;
//! let mut res = Resolution::new(group, "/tmp/z4/")?;
//! res.ensure_projective_known(5)?;
//!
//! for n in 0..=5 {
//!     println!("rank P_{} = {}", n, res.rank(n)?);
//! }
//! ```
//!
//! ## Preimages
//!
//! ```ignore
//! use pgroup_resolution::*;
//!
//! let mut res = Resolution::new(cyclic_group(3, 1)?, "/tmp/z3/")?;
//! res.ensure_projective_known(1)?;
//!
//! // x^2 in P_0 is the image of x * e_1 under d_1
//! let image = Matrix::from_rows(res.group().field(), 3, &[vec![0, 0, 1]])?;
//! let pre = res.compute_preimages(1, &image)?;
//! assert_eq!(pre.to_rows(), vec![vec![0, 1, 0]]);
//! ```
//!
//! ## Configuration
//!
//! ```ignore
//! use pgroup_resolution::*;
//!
//! // Small blocks keep memory low at the cost of more disk reads
//! let config = ResolutionConfig::for_prime(2).with_block_size(64);
//! let mut res = Resolution::with_config(elementary_abelian_group(2, 3)?, "/tmp/e8/", config)?;
//! res.ensure_projective_known(4)?;
//! ```
//!
//! ## Logging
//!
//! Progress is reported through `tracing`. Install any subscriber to see it;
//! `info` reports each degree, `debug` each completion round.
//!
//! ## Limitations
//!
//! - Computation is single threaded
//! - Two resolutions must not share a file stem at the same time
//! - Field orders are limited to primes below 2^31

#![doc(html_root_url = "https://docs.rs/pgroup-resolution/0.1.0")]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod common_groups;
pub mod config;
pub mod conversions;
pub mod error;
pub mod field;
pub mod groebner;
pub mod group;
pub mod homomorphisms;
pub mod matrix;
pub mod resolution;

// Re-export main types
pub use common_groups::{abelian_group, cyclic_group, elementary_abelian_group, trivial_group};
pub use config::{ResolutionConfig, DEFAULT_BLOCK_SIZE};
pub use error::{ResolutionError, Result};
pub use field::{FieldElement, FieldProperties, PrimeField};
pub use groebner::{
    ExpansionDegree, FlaggedGeneratingSet, GeneratingSet, ResentfulGeneratingSet, SliceStats,
};
pub use group::{GroupAlgebra, GroupDescription};
pub use homomorphisms::RightActions;
pub use matrix::Matrix;
pub use resolution::Resolution;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Ensure the library exports work
        let group = cyclic_group(5, 1).unwrap();
        let field = group.field();
        let a = field.from_u32(3);
        let b = field.from_u32(4);
        assert_eq!(field.to_u32(&field.add(a, b)), 2);
        assert_eq!(group.nontips(), 5);
    }

    #[test]
    fn test_version_info() {
        assert_eq!(NAME, "pgroup-resolution");
        assert!(!VERSION.is_empty());
    }
}
