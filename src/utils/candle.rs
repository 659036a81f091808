// src/utils/candle.rs
use anyhow::{Context, Result as AnyhowResult};
use candle_core::{Device, Tensor};

/// Cosine similarity of two equal-length vectors, computed on the CPU device.
///
/// Returns `Ok(None)` when the similarity is undefined (a zero-magnitude input or
/// a non-finite intermediate), so callers can exclude the candidate instead of
/// ranking on NaN. Mismatched or empty inputs are an error.
pub fn cosine_similarity_candle(v1_slice: &[f32], v2_slice: &[f32]) -> AnyhowResult<Option<f64>> {
    if v1_slice.len() != v2_slice.len() {
        return Err(anyhow::anyhow!(
            "Input vector lengths differ: {} vs {}",
            v1_slice.len(),
            v2_slice.len()
        ));
    }
    if v1_slice.is_empty() {
        return Err(anyhow::anyhow!("Input vectors must not be empty"));
    }

    let device = Device::Cpu;
    let v1 = Tensor::from_slice(v1_slice, (v1_slice.len(),), &device).with_context(|| {
        format!(
            "Failed to create tensor v1 from slice with len {}",
            v1_slice.len()
        )
    })?;
    let v2 = Tensor::from_slice(v2_slice, (v2_slice.len(),), &device).with_context(|| {
        format!(
            "Failed to create tensor v2 from slice with len {}",
            v2_slice.len()
        )
    })?;

    let dot_product = sum_of_products(&v1, &v2).context("Dot product failed")?;
    let mag1 = sum_of_products(&v1, &v1)
        .context("v1 magnitude failed")?
        .sqrt();
    let mag2 = sum_of_products(&v2, &v2)
        .context("v2 magnitude failed")?
        .sqrt();

    if mag1 == 0.0 || mag2 == 0.0 {
        return Ok(None);
    }

    let similarity = dot_product / (mag1 * mag2);

    if !similarity.is_finite() {
        log::warn!(
            "Calculated similarity is not finite. dot_product: {}, mag1: {}, mag2: {}. v1_slice (first 5): {:?}, v2_slice (first 5): {:?}",
            dot_product, mag1, mag2,
            v1_slice.iter().take(5).collect::<Vec<_>>(),
            v2_slice.iter().take(5).collect::<Vec<_>>()
        );
        return Ok(None);
    }

    // f32 accumulation can drift a hair past the unit interval.
    Ok(Some(similarity.clamp(-1.0, 1.0)))
}

fn sum_of_products(a: &Tensor, b: &Tensor) -> AnyhowResult<f64> {
    let summed = (a * b)
        .context("Tensor element-wise multiplication failed")?
        .sum_all()
        .context("Summing tensor failed")?;
    let scalar = summed
        .to_scalar::<f32>()
        .context("Converting tensor to scalar failed")?;
    Ok(scalar as f64)
}
