// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralMap — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use rand::Rng;
use rand_distr::StandardNormal;
use sm_config::determinism;
use sm_core::{EpisodeGeometry, LabelStack, RunStack, StackError};

use crate::{DataError, DataResult};

/// Seeded Gaussian-cluster episode source.
///
/// Per run, `ways` class means are drawn at `separation` scale and every
/// sample is its class mean plus `noise`-scale perturbation. Samples follow
/// the canonical class-interleaved layout, support blocks first, so the
/// output plugs straight into the refinement loop.
#[derive(Clone, Debug)]
pub struct SyntheticSampler {
    pub feature_dim: usize,
    pub separation: f32,
    pub noise: f32,
    /// Explicit seed; falls back to the deterministic configuration when
    /// absent.
    pub seed: Option<u64>,
}

impl Default for SyntheticSampler {
    fn default() -> Self {
        Self {
            feature_dim: 64,
            separation: 3.0,
            noise: 0.5,
            seed: None,
        }
    }
}

impl SyntheticSampler {
    pub fn sample(&self, geometry: &EpisodeGeometry) -> DataResult<(RunStack, LabelStack)> {
        if self.feature_dim == 0 {
            return Err(DataError::Stack(StackError::InvalidDimensions {
                runs: geometry.runs(),
                rows: geometry.samples(),
                cols: self.feature_dim,
            }));
        }
        if !self.separation.is_finite()
            || self.separation <= 0.0
            || !self.noise.is_finite()
            || self.noise < 0.0
        {
            return Err(DataError::InvalidSampler {
                separation: self.separation,
                noise: self.noise,
            });
        }

        let mut rng = determinism::rng_from_optional(self.seed, "sm-data/sampler");
        let (runs, ways, samples, dim) = (
            geometry.runs(),
            geometry.ways(),
            geometry.samples(),
            self.feature_dim,
        );

        let mut data = Vec::with_capacity(runs * samples * dim);
        let mut means = vec![0.0f32; ways * dim];
        for _ in 0..runs {
            for slot in means.iter_mut() {
                let draw: f32 = rng.sample(StandardNormal);
                *slot = self.separation * draw;
            }
            for s in 0..samples {
                let class = s % ways;
                for d in 0..dim {
                    let jitter: f32 = rng.sample(StandardNormal);
                    data.push(means[class * dim + d] + self.noise * jitter);
                }
            }
        }

        let features = RunStack::from_vec(runs, samples, dim, data)?;
        let labels = LabelStack::interleaved(geometry);
        Ok((features, labels))
    }
}
