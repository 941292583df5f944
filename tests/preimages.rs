//! Lifting vectors through the differentials

use pgroup_resolution::*;
use tempfile::TempDir;

fn stem(dir: &TempDir) -> String {
    format!("{}/", dir.path().display())
}

#[test]
fn test_preimage_under_first_differential() {
    let dir = TempDir::new().unwrap();
    let mut res = Resolution::new(cyclic_group(3, 1).unwrap(), &stem(&dir)).unwrap();
    res.ensure_projective_known(1).unwrap();
    let field = res.group().field().clone();

    // d_1(e) = x, so x^2 = d_1(x e) and 2x = d_1(2 e)
    let images = Matrix::from_rows(&field, 3, &[vec![0, 0, 1], vec![0, 2, 0]]).unwrap();
    let pre = res.compute_preimages(1, &images).unwrap();
    assert_eq!(pre.to_rows(), vec![vec![0, 1, 0], vec![2, 0, 0]]);
    assert!(res.urbild_gb_file(1).exists());
}

#[test]
fn test_deep_preimage_reads_paged_products() {
    let dir = TempDir::new().unwrap();
    let config = ResolutionConfig::for_prime(2).with_block_size(1);
    let mut res = Resolution::with_config(cyclic_group(2, 3).unwrap(), &stem(&dir), config).unwrap();
    res.ensure_projective_known(1).unwrap();
    let field = res.group().field().clone();

    // x^5 = d_1(x^4 e)
    let images = Matrix::from_rows(&field, 8, &[vec![0, 0, 0, 0, 0, 1, 0, 0]]).unwrap();
    let pre = res.compute_preimages(1, &images).unwrap();
    assert_eq!(pre.to_rows(), vec![vec![0, 0, 0, 0, 1, 0, 0, 0]]);
    assert!(res.slice_stats().blocks_loaded > 0);
}

#[test]
fn test_zero_image_has_zero_preimage() {
    let dir = TempDir::new().unwrap();
    let mut res = Resolution::new(cyclic_group(2, 1).unwrap(), &stem(&dir)).unwrap();
    res.ensure_projective_known(1).unwrap();
    let field = res.group().field().clone();

    let images = Matrix::from_rows(&field, 2, &[vec![0, 0], vec![0, 1]]).unwrap();
    let pre = res.compute_preimages(1, &images).unwrap();
    assert_eq!(pre.to_rows(), vec![vec![0, 0], vec![1, 0]]);
}

#[test]
fn test_vector_outside_image_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut res = Resolution::new(cyclic_group(2, 1).unwrap(), &stem(&dir)).unwrap();
    res.ensure_projective_known(1).unwrap();
    let field = res.group().field().clone();

    // The unit is not in the augmentation ideal
    let images = Matrix::from_rows(&field, 2, &[vec![0, 1], vec![1, 0]]).unwrap();
    let err = res.compute_preimages(1, &images).unwrap_err();
    assert!(matches!(err, ResolutionError::NotInImage { index: 1 }));
}

#[test]
fn test_preimages_map_back_onto_images() {
    let dir = TempDir::new().unwrap();
    let group = elementary_abelian_group(2, 2).unwrap();
    let mut res = Resolution::new(group.clone(), &stem(&dir)).unwrap();
    res.ensure_projective_known(2).unwrap();
    let actions = RightActions::new(&group).unwrap();

    for n in 1..=2 {
        let d = res.differential(n).unwrap();
        let r = res.rank(n - 1).unwrap();
        let s = res.rank(n).unwrap();
        let pre = res.compute_preimages(n, &d).unwrap();
        assert_eq!(pre.nor(), s * s);
        let back = actions.compose(&pre, s, &d, r).unwrap();
        assert_eq!(back, d, "preimages under d_{}", n);
    }
}

#[test]
fn test_preimage_arguments_are_checked() {
    let dir = TempDir::new().unwrap();
    let mut res = Resolution::new(elementary_abelian_group(2, 2).unwrap(), &stem(&dir)).unwrap();
    assert!(matches!(
        res.ensure_urbild_gb_known(1),
        Err(ResolutionError::BadArgument(_))
    ));
    res.ensure_projective_known(2).unwrap();
    let field = res.group().field().clone();
    // Vectors in P_1 have two rows, so three rows do not make whole vectors
    let images = Matrix::zero(&field, 3, 4);
    assert!(matches!(
        res.compute_preimages(2, &images),
        Err(ResolutionError::BadArgument(_))
    ));
}
