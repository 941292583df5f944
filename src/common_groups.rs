//! Ready-made group algebras for abelian p-groups.
//!
//! The group algebra of `Z/p^k1 x ... x Z/p^kn` over `F_p` is the truncated
//! polynomial algebra `F_p[x_1, ..., x_n] / (x_i^(p^ki))`, with `x_i = g_i - 1`.
//! Its nontips are the non-decreasing words `x_1^e1 ... x_n^en`; within one
//! length they are listed in descending lexicographic order, letter `n` being
//! the largest. These constructors are mostly used by tests and benchmarks.

use crate::error::{ResolutionError, Result};
use crate::field::PrimeField;
use crate::group::{GroupAlgebra, ARROW_NAMES};
use crate::matrix::Matrix;
use std::collections::HashMap;

/// Largest group order the constructors accept.
const MAX_ORDER: u64 = 1 << 16;

/// The trivial group: one basis element and no arrows.
pub fn trivial_group(p: u64) -> Result<GroupAlgebra> {
    abelian_group(p, &[])
}

/// The cyclic group of order `p^k`.
pub fn cyclic_group(p: u64, k: u32) -> Result<GroupAlgebra> {
    abelian_group(p, &[k])
}

/// The elementary abelian group of order `p^rank`.
pub fn elementary_abelian_group(p: u64, rank: usize) -> Result<GroupAlgebra> {
    abelian_group(p, &vec![1; rank])
}

/// The abelian group `Z/p^k1 x ... x Z/p^kn` for `exponents = [k1, ..., kn]`.
///
/// # Example
/// ```ignore
/// use pgroup_resolution::common_groups::abelian_group;
///
/// // Z/4 x Z/2 has 8 basis elements and two arrows
/// let g = abelian_group(2, &[2, 1])?;
/// assert_eq!(g.nontips(), 8);
/// ```
pub fn abelian_group(p: u64, exponents: &[u32]) -> Result<GroupAlgebra> {
    let field = PrimeField::new(p)?;
    if exponents.iter().any(|&k| k == 0) {
        return Err(ResolutionError::BadArgument(
            "cyclic factors must have exponent at least 1".to_string(),
        ));
    }
    if exponents.len() > ARROW_NAMES.len() {
        return Err(ResolutionError::BadArgument(format!(
            "{} cyclic factors exceed the supported number of arrows",
            exponents.len()
        )));
    }

    let mut bounds = Vec::with_capacity(exponents.len());
    let mut order = 1u64;
    for &k in exponents {
        let bound = p
            .checked_pow(k)
            .filter(|b| order.saturating_mul(*b) <= MAX_ORDER)
            .ok_or_else(|| ResolutionError::BadArgument("group order too large".to_string()))?;
        order *= bound;
        bounds.push(bound as usize);
    }

    // Enumerate all exponent vectors, then sort them into basis order
    let mut basis: Vec<Vec<usize>> = vec![Vec::new()];
    for &bound in &bounds {
        basis = basis
            .into_iter()
            .flat_map(|e| {
                (0..bound).map(move |i| {
                    let mut next = e.clone();
                    next.push(i);
                    next
                })
            })
            .collect();
    }
    let word = |e: &[usize]| -> String {
        e.iter()
            .enumerate()
            .flat_map(|(letter, &count)| std::iter::repeat(ARROW_NAMES[letter] as char).take(count))
            .collect()
    };
    let mut words: Vec<String> = basis.iter().map(|e| word(e)).collect();
    words.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| b.cmp(a)));

    let position: HashMap<&str, usize> = words.iter().enumerate().map(|(i, w)| (w.as_str(), i)).collect();
    let n = words.len();
    let mut action = Vec::with_capacity(bounds.len());
    for (letter, &bound) in bounds.iter().enumerate() {
        let mut m = Matrix::zero(&field, n, n);
        for (i, w) in words.iter().enumerate() {
            let count = w.bytes().filter(|&c| c == ARROW_NAMES[letter]).count();
            if count + 1 < bound {
                let mut exps: Vec<usize> = (0..bounds.len())
                    .map(|l| w.bytes().filter(|&c| c == ARROW_NAMES[l]).count())
                    .collect();
                exps[letter] += 1;
                let target = position[word(&exps).as_str()];
                m.set_entry(i, target, 1);
            }
        }
        action.push(m);
    }

    let name = if exponents.is_empty() {
        "1".to_string()
    } else {
        exponents
            .iter()
            .map(|&k| format!("Z/{}", p.pow(k)))
            .collect::<Vec<_>>()
            .join("x")
    };
    GroupAlgebra::new(&name, field, &words, action)
}
