//! Resolve the trivial module of a cyclic p-group and print the ranks.
//!
//! ```text
//! cargo run --example cyclic_resolution -- 3 2 6
//! RUST_LOG=debug cargo run --example cyclic_resolution
//! ```

use pgroup_resolution::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<u64> = std::env::args()
        .skip(1)
        .map(|a| a.parse().map_err(|_| ResolutionError::BadArgument(format!("not a number: {}", a))))
        .collect::<Result<_>>()?;
    let p = args.first().copied().unwrap_or(2);
    let k = args.get(1).copied().unwrap_or(2) as u32;
    let degree = args.get(2).copied().unwrap_or(5) as usize;

    let dir = std::env::temp_dir().join(format!("pgroup-resolution-z{}-{}", p, k));
    std::fs::create_dir_all(&dir).map_err(|e| ResolutionError::Io {
        path: dir.clone(),
        source: e,
    })?;
    let stem = format!("{}/", dir.display());

    let group = cyclic_group(p, k)?;
    println!("Resolving F_{} over {} ({} nontips)", p, group.name(), group.nontips());
    let mut res = Resolution::new(group, &stem)?;
    let known = res.read_known_resolution(degree)?;
    if known > 0 {
        println!("Read {} stored differentials from {}", known, dir.display());
    }
    res.ensure_projective_known(degree)?;

    for n in 0..=degree {
        println!("  P_{}: rank {}, image dimension {}", n, res.rank(n)?, res.image_dimension(n)?);
    }
    let stats = res.slice_stats();
    println!(
        "Slice files: {} created, {} removed, {} blocks loaded",
        stats.files_created, stats.files_removed, stats.blocks_loaded
    );
    Ok(())
}
