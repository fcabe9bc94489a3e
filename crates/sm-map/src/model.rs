// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralMap — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use rayon::prelude::*;
use sm_core::{EpisodeGeometry, LabelStack, RunStack};
use sm_transport::{Sinkhorn, SinkhornReport};

use crate::{MapError, MapResult};

/// Per-run class centroids with a fixed-rate blend update.
///
/// The centroid stack is `runs x ways x dim` and is exclusively owned here:
/// the solver only ever sees the query sub-block of the cost matrix, and the
/// support rows of every assignment are copied from ground truth, never
/// solved for.
#[derive(Clone, Debug)]
pub struct GaussianModel {
    geometry: EpisodeGeometry,
    mus: RunStack,
}

impl GaussianModel {
    /// Seed centroids from the per-class means of the support block.
    pub fn from_support(
        features: &RunStack,
        labels: &LabelStack,
        geometry: EpisodeGeometry,
    ) -> MapResult<Self> {
        check_batch(features, labels, &geometry)?;
        let ways = geometry.ways();
        let dim = features.cols();
        let support = geometry.support();

        let mut mus = RunStack::zeros(geometry.runs(), ways, dim)?;
        mus.par_runs_mut()
            .enumerate()
            .try_for_each(|(run, mu_run)| {
                let feats = features.run(run)?;
                let run_labels = labels.run(run)?;
                let mut counts = vec![0u32; ways];
                for s in 0..support {
                    let class = usize::from(run_labels[s]);
                    counts[class] += 1;
                    let row = &feats[s * dim..(s + 1) * dim];
                    let slot = &mut mu_run[class * dim..(class + 1) * dim];
                    for (acc, &value) in slot.iter_mut().zip(row) {
                        *acc += value;
                    }
                }
                for (class, &count) in counts.iter().enumerate() {
                    if count == 0 {
                        return Err(MapError::MissingSupport { run, class });
                    }
                    let inv = 1.0 / count as f32;
                    for value in &mut mu_run[class * dim..(class + 1) * dim] {
                        *value *= inv;
                    }
                }
                Ok(())
            })?;

        Ok(Self { geometry, mus })
    }

    #[inline]
    pub fn geometry(&self) -> &EpisodeGeometry {
        &self.geometry
    }

    /// Current centroid stack, `runs x ways x dim`.
    #[inline]
    pub fn centroids(&self) -> &RunStack {
        &self.mus
    }

    /// Soft-assign every sample to the current centroids.
    ///
    /// The query block is solved as a balanced transport problem: each query
    /// sample emits one unit of mass and each class receives exactly
    /// `queries` units per run. Support rows are one-hot ground truth.
    pub fn assign(
        &self,
        features: &RunStack,
        labels: &LabelStack,
        solver: &Sinkhorn,
    ) -> MapResult<(RunStack, SinkhornReport)> {
        check_batch(features, labels, &self.geometry)?;
        let geometry = &self.geometry;
        let (runs, samples, ways) = (geometry.runs(), geometry.samples(), geometry.ways());
        let support = geometry.support();
        let query = geometry.query_total();

        let cost = self.squared_distances(features)?;

        let mut query_cost = RunStack::zeros(runs, query, ways)?;
        query_cost
            .par_runs_mut()
            .zip(cost.par_runs())
            .for_each(|(block, full)| {
                block.copy_from_slice(&full[support * ways..]);
            });

        let row_targets = vec![1.0f32; runs * query];
        let col_targets = vec![geometry.queries() as f32; runs * ways];
        let transport = solver.solve(&query_cost, &row_targets, &col_targets)?;

        let mut assignment = RunStack::zeros(runs, samples, ways)?;
        assignment
            .par_runs_mut()
            .zip(transport.plan.par_runs())
            .enumerate()
            .try_for_each(|(run, (rows, plan))| {
                let run_labels = labels.run(run)?;
                for (s, &label) in run_labels.iter().enumerate().take(support) {
                    rows[s * ways + usize::from(label)] = 1.0;
                }
                rows[support * ways..].copy_from_slice(plan);
                Ok::<(), MapError>(())
            })?;

        Ok((assignment, transport.report))
    }

    /// Closed-form weighted-mean centroid estimate from a soft assignment.
    pub fn estimate(&self, assignment: &RunStack, features: &RunStack) -> MapResult<RunStack> {
        let geometry = &self.geometry;
        let (samples, ways) = (geometry.samples(), geometry.ways());
        let dim = self.mus.cols();
        if assignment.runs() != geometry.runs()
            || assignment.rows() != samples
            || assignment.cols() != ways
        {
            return Err(MapError::AssignmentShape {
                samples,
                ways,
                got_rows: assignment.rows(),
                got_cols: assignment.cols(),
            });
        }
        if features.runs() != geometry.runs()
            || features.rows() != samples
            || features.cols() != dim
        {
            return Err(MapError::FeatureShape {
                runs: geometry.runs(),
                samples,
                got_runs: features.runs(),
                got_rows: features.rows(),
            });
        }

        let mut estimate = RunStack::zeros(geometry.runs(), ways, dim)?;
        estimate
            .par_runs_mut()
            .zip(assignment.par_runs())
            .zip(features.par_runs())
            .for_each(|((centroids, mask), feats)| {
                for class in 0..ways {
                    let mut weight = 0.0f32;
                    for s in 0..samples {
                        weight += mask[s * ways + class];
                    }
                    let slot = &mut centroids[class * dim..(class + 1) * dim];
                    for s in 0..samples {
                        let a = mask[s * ways + class];
                        if a != 0.0 {
                            let row = &feats[s * dim..(s + 1) * dim];
                            for (acc, &value) in slot.iter_mut().zip(row) {
                                *acc += a * value;
                            }
                        }
                    }
                    if weight > 0.0 {
                        let inv = 1.0 / weight;
                        for value in slot.iter_mut() {
                            *value *= inv;
                        }
                    }
                }
            });
        Ok(estimate)
    }

    /// `mus <- mus + alpha * (estimate - mus)`.
    pub fn blend(&mut self, estimate: &RunStack, alpha: f32) -> MapResult<()> {
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(MapError::InvalidBlendRate { alpha });
        }
        if estimate.runs() != self.mus.runs()
            || estimate.rows() != self.mus.rows()
            || estimate.cols() != self.mus.cols()
        {
            return Err(MapError::EstimateShape {
                rows: self.mus.rows(),
                cols: self.mus.cols(),
                got_rows: estimate.rows(),
                got_cols: estimate.cols(),
            });
        }
        self.mus
            .as_mut_slice()
            .par_iter_mut()
            .zip(estimate.as_slice().par_iter())
            .for_each(|(mu, &fresh)| {
                *mu += alpha * (fresh - *mu);
            });
        Ok(())
    }

    /// Squared Euclidean distance from every sample to every centroid,
    /// `runs x samples x ways`.
    fn squared_distances(&self, features: &RunStack) -> MapResult<RunStack> {
        let geometry = &self.geometry;
        let (samples, ways) = (geometry.samples(), geometry.ways());
        let dim = self.mus.cols();

        let mut cost = RunStack::zeros(geometry.runs(), samples, ways)?;
        cost.par_runs_mut()
            .zip(features.par_runs())
            .zip(self.mus.par_runs())
            .for_each(|((out, feats), mu_run)| {
                for s in 0..samples {
                    let row = &feats[s * dim..(s + 1) * dim];
                    for class in 0..ways {
                        let mu = &mu_run[class * dim..(class + 1) * dim];
                        let mut acc = 0.0f32;
                        for (&x, &m) in row.iter().zip(mu) {
                            let diff = x - m;
                            acc += diff * diff;
                        }
                        out[s * ways + class] = acc;
                    }
                }
            });
        Ok(cost)
    }
}

fn check_batch(
    features: &RunStack,
    labels: &LabelStack,
    geometry: &EpisodeGeometry,
) -> MapResult<()> {
    if features.runs() != geometry.runs() || features.rows() != geometry.samples() {
        return Err(MapError::FeatureShape {
            runs: geometry.runs(),
            samples: geometry.samples(),
            got_runs: features.runs(),
            got_rows: features.rows(),
        });
    }
    if labels.runs() != geometry.runs() || labels.samples() != geometry.samples() {
        return Err(MapError::LabelShape {
            runs: geometry.runs(),
            samples: geometry.samples(),
            got_runs: labels.runs(),
            got_samples: labels.samples(),
        });
    }
    labels.validate_ways(geometry.ways())?;
    Ok(())
}
