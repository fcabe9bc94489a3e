// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralMap — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use rayon::prelude::*;
use sm_core::{EpisodeGeometry, LabelStack, RunStack};

use crate::{MapError, MapResult};

/// Batch accuracy over the query block.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "report-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccuracyReport {
    /// Mean per-run query accuracy.
    pub mean: f32,
    /// 95% confidence half-width, `1.96 * stddev / sqrt(runs)`.
    pub half_width_95: f32,
}

/// Score an assignment against ground truth, query samples only.
///
/// Predicted label per sample is the argmax over classes of its assignment
/// row. Support rows never enter the statistic.
pub fn score_queries(
    assignment: &RunStack,
    labels: &LabelStack,
    geometry: &EpisodeGeometry,
) -> MapResult<AccuracyReport> {
    let (runs, samples, ways) = (geometry.runs(), geometry.samples(), geometry.ways());
    if assignment.runs() != runs || assignment.rows() != samples || assignment.cols() != ways {
        return Err(MapError::AssignmentShape {
            samples,
            ways,
            got_rows: assignment.rows(),
            got_cols: assignment.cols(),
        });
    }
    if labels.runs() != runs || labels.samples() != samples {
        return Err(MapError::LabelShape {
            runs,
            samples,
            got_runs: labels.runs(),
            got_samples: labels.samples(),
        });
    }

    let support = geometry.support();
    let query_total = geometry.query_total();
    let per_run: Vec<f32> = assignment
        .par_runs()
        .enumerate()
        .map(|(run, rows)| {
            let run_labels = labels.run(run)?;
            let mut correct = 0usize;
            for s in support..samples {
                let row = &rows[s * ways..(s + 1) * ways];
                let mut best = 0usize;
                for (class, &value) in row.iter().enumerate() {
                    if value > row[best] {
                        best = class;
                    }
                }
                if best == usize::from(run_labels[s]) {
                    correct += 1;
                }
            }
            Ok(correct as f32 / query_total as f32)
        })
        .collect::<MapResult<Vec<f32>>>()?;

    let mean = per_run.iter().sum::<f32>() / runs as f32;
    let half_width_95 = if runs > 1 {
        let variance = per_run
            .iter()
            .map(|&acc| {
                let diff = acc - mean;
                diff * diff
            })
            .sum::<f32>()
            / (runs - 1) as f32;
        1.96 * variance.sqrt() / (runs as f32).sqrt()
    } else {
        0.0
    };

    Ok(AccuracyReport {
        mean,
        half_width_95,
    })
}
