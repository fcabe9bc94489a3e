// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralMap — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use rayon::prelude::*;
use sm_config::{MapPreset, Normalization};
use sm_core::{EpisodeGeometry, RunStack};

use crate::{qr_reduce, DataError, DataResult};

/// `x <- (x + 1e-6)^beta` elementwise.
///
/// Raw features must be non-negative, as produced by a ReLU-terminated
/// backbone; the small shift keeps exact zeros differentiable under the
/// fractional exponent.
pub fn power_transform(features: &mut RunStack, beta: f32) -> DataResult<()> {
    if !beta.is_finite() || beta <= 0.0 {
        return Err(DataError::InvalidExponent { value: beta });
    }
    let dim = features.cols();
    features
        .par_runs_mut()
        .enumerate()
        .try_for_each(|(run, rows)| {
            for (idx, value) in rows.iter_mut().enumerate() {
                if *value < 0.0 {
                    return Err(DataError::NegativeFeature {
                        run,
                        sample: idx / dim,
                        value: *value,
                    });
                }
                *value = (*value + 1e-6).powf(beta);
            }
            Ok(())
        })
}

/// Divide every feature vector by `norm^exponent`.
///
/// An exponent of 1 rescales each vector to the unit sphere; fractional
/// exponents soften the rescale and are treated as opaque tunables.
pub fn rescale_rows(features: &mut RunStack, exponent: f32) -> DataResult<()> {
    if !exponent.is_finite() || exponent <= 0.0 {
        return Err(DataError::InvalidExponent { value: exponent });
    }
    let (rows, dim) = (features.rows(), features.cols());
    features
        .par_runs_mut()
        .enumerate()
        .try_for_each(|(run, data)| {
            for s in 0..rows {
                let row = &mut data[s * dim..(s + 1) * dim];
                let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
                if norm <= 0.0 {
                    return Err(DataError::ZeroNorm { run, sample: s });
                }
                let inv = norm.powf(exponent).recip();
                for value in row.iter_mut() {
                    *value *= inv;
                }
            }
            Ok(())
        })
}

/// Center feature vectors and renormalise them, per the chosen strategy.
///
/// `SplitCenter` treats support and query blocks as separate populations and
/// scales each centered vector to unit norm. `UniformCenter` centers the
/// whole run at once and divides by `norm^gamma`.
pub fn center(
    features: &mut RunStack,
    strategy: Normalization,
    geometry: &EpisodeGeometry,
) -> DataResult<()> {
    if features.runs() != geometry.runs() || features.rows() != geometry.samples() {
        return Err(DataError::GeometryMismatch {
            runs: geometry.runs(),
            samples: geometry.samples(),
            got_runs: features.runs(),
            got_rows: features.rows(),
        });
    }
    if let Normalization::UniformCenter { gamma } = strategy {
        if !gamma.is_finite() || gamma <= 0.0 {
            return Err(DataError::InvalidExponent { value: gamma });
        }
    }

    let dim = features.cols();
    let support = geometry.support();
    let samples = geometry.samples();
    features
        .par_runs_mut()
        .enumerate()
        .try_for_each(|(run, data)| match strategy {
            Normalization::SplitCenter => {
                center_block(data, 0, support, dim, 1.0, run)?;
                center_block(data, support, samples, dim, 1.0, run)
            }
            Normalization::UniformCenter { gamma } => {
                center_block(data, 0, samples, dim, gamma, run)
            }
        })
}

/// Full pipeline in the canonical order: power transform, QR reduction,
/// rescale, center.
pub fn preprocess(
    features: RunStack,
    preset: &MapPreset,
    geometry: &EpisodeGeometry,
) -> DataResult<RunStack> {
    let mut features = features;
    power_transform(&mut features, preset.beta)?;
    let mut reduced = qr_reduce(&features)?;
    rescale_rows(&mut reduced, preset.rescale_exponent)?;
    center(&mut reduced, preset.normalization, geometry)?;
    Ok(reduced)
}

fn center_block(
    data: &mut [f32],
    start: usize,
    end: usize,
    dim: usize,
    norm_exponent: f32,
    run: usize,
) -> DataResult<()> {
    let count = (end - start) as f32;
    let mut mean = vec![0.0f32; dim];
    for s in start..end {
        for (slot, &value) in mean.iter_mut().zip(&data[s * dim..(s + 1) * dim]) {
            *slot += value;
        }
    }
    for slot in mean.iter_mut() {
        *slot /= count;
    }
    for s in start..end {
        let row = &mut data[s * dim..(s + 1) * dim];
        for (value, &shift) in row.iter_mut().zip(&mean) {
            *value -= shift;
        }
        let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm <= 0.0 {
            return Err(DataError::ZeroNorm { run, sample: s });
        }
        let inv = norm.powf(norm_exponent).recip();
        for value in row.iter_mut() {
            *value *= inv;
        }
    }
    Ok(())
}
