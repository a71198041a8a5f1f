use crate::{Result, sparse::StateValues};
use candle_core::{DType, Tensor};
use std::hash::Hash;

/// Index of the largest entry along `axis`, as `u32` with that axis removed.
///
/// Ties go to the lowest index.
pub fn argmax_along(t: &Tensor, axis: usize) -> Result<Tensor> {
    let mut shape = t.dims().to_vec();
    let len = shape[axis];
    shape[axis] = 1;
    let device = t.device();
    let t = t.to_dtype(DType::F64)?;
    let mut best = Tensor::full(f64::NEG_INFINITY, shape.as_slice(), device)?;
    let mut best_idx = Tensor::zeros(shape.as_slice(), DType::U32, device)?;
    for i in 0..len {
        let candidate = t.narrow(axis, i, 1)?;
        let better = candidate.gt(&best)?;
        best = better.where_cond(&candidate, &best)?;
        let idx = Tensor::full(i as u32, shape.as_slice(), device)?;
        best_idx = better.where_cond(&idx, &best_idx)?;
    }
    Ok(best_idx.squeeze(axis)?)
}

/// Rounds every entry to `decimals` decimal places.
pub fn round_to(t: &Tensor, decimals: i32) -> Result<Tensor> {
    let scale = 10f64.powi(decimals);
    Ok((t.affine(scale, 0.)?.round()? / scale)?)
}

/// Sup norm of `a - b`, computed in double precision.
pub fn max_abs_diff(a: &Tensor, b: &Tensor) -> Result<f64> {
    let diff = (a.to_dtype(DType::F64)? - b.to_dtype(DType::F64)?)?;
    Ok(diff.abs()?.flatten_all()?.max(0)?.to_scalar::<f64>()?)
}

/// `values[indices]`, shaped like `indices`.
pub fn gather(values: &Tensor, indices: &Tensor) -> Result<Tensor> {
    let flat = indices.flatten_all()?;
    Ok(values.index_select(&flat, 0)?.reshape(indices.shape())?)
}

/// Root mean squared error over the keys of `answers`. A key missing from `values` counts as zero.
pub fn rmse<K: Eq + Hash>(values: &StateValues<K>, answers: &StateValues<K>) -> f64 {
    if answers.is_empty() {
        return 0.;
    }
    let squared: f64 = answers
        .iter()
        .map(|(key, answer)| (values.peek(key) - answer).powi(2))
        .sum();
    (squared / answers.len() as f64).sqrt()
}

/// Key paired with the largest value, the first such key on ties.
pub fn argmax_key<K, I: IntoIterator<Item = (K, f64)>>(pairs: I) -> Option<K> {
    let mut best: Option<(K, f64)> = None;
    for (key, value) in pairs {
        if best.as_ref().is_none_or(|(_, top)| value > *top) {
            best = Some((key, value));
        }
    }
    best.map(|(key, _)| key)
}
