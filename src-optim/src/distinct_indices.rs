use rand::Rng;
use rand::seq::SliceRandom;

/// `count` distinct indices from `0..pool_size`, none equal to any of `exclude`
pub(crate) fn distinct_indices<R: Rng + ?Sized>(
    exclude: &[usize],
    count: usize,
    pool_size: usize,
    rng: &mut R,
) -> Vec<usize> {
    let mut idxs: Vec<usize> = (0..pool_size).filter(|i| !exclude.contains(i)).collect();
    debug_assert!(count <= idxs.len());
    let (picked, _) = idxs.partial_shuffle(rng, count);
    picked.to_vec()
}
