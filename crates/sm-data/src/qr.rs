// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralMap — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use nalgebra::DMatrix;
use rayon::prelude::*;
use sm_core::RunStack;

use crate::DataResult;

/// Project each run's features onto their own span via QR factorisation.
///
/// Per run the `dim x samples` transposed feature matrix is factorised as
/// `Q * R`; the upper-triangular factor's column `s` becomes the new feature
/// vector for sample `s`. The map is an orthogonal change of basis, so all
/// pairwise distances survive while the feature dimension drops from `dim`
/// to `min(dim, samples)`.
pub fn qr_reduce(features: &RunStack) -> DataResult<RunStack> {
    let (runs, samples, dim) = (features.runs(), features.rows(), features.cols());
    let reduced_dim = dim.min(samples);

    let mut out = RunStack::zeros(runs, samples, reduced_dim)?;
    out.par_runs_mut()
        .zip(features.par_runs())
        .for_each(|(dst, src)| {
            let transposed = DMatrix::<f32>::from_fn(dim, samples, |d, s| src[s * dim + d]);
            let factor = transposed.qr().r();
            for s in 0..samples {
                for d in 0..reduced_dim {
                    dst[s * reduced_dim + d] = factor[(d, s)];
                }
            }
        });
    Ok(out)
}
