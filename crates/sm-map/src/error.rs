// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralMap — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use sm_core::StackError;
use sm_transport::TransportError;
use thiserror::Error;

/// Errors raised while refining centroids over a run batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Stack(#[from] StackError),
    #[error(
        "feature stack is {got_runs} runs x {got_rows} samples but the geometry \
         expects {runs} x {samples}"
    )]
    FeatureShape {
        runs: usize,
        samples: usize,
        got_runs: usize,
        got_rows: usize,
    },
    #[error(
        "label stack is {got_runs} runs x {got_samples} samples but the geometry \
         expects {runs} x {samples}"
    )]
    LabelShape {
        runs: usize,
        samples: usize,
        got_runs: usize,
        got_samples: usize,
    },
    #[error(
        "assignment stack is {got_rows} x {got_cols} per run but the geometry \
         expects {samples} x {ways}"
    )]
    AssignmentShape {
        samples: usize,
        ways: usize,
        got_rows: usize,
        got_cols: usize,
    },
    #[error(
        "centroid estimate is {got_rows} x {got_cols} per run but the model \
         holds {rows} x {cols}"
    )]
    EstimateShape {
        rows: usize,
        cols: usize,
        got_rows: usize,
        got_cols: usize,
    },
    #[error("run {run} has no support sample for class {class}")]
    MissingSupport { run: usize, class: usize },
    #[error("blend rate must be finite and non-negative, got {alpha}")]
    InvalidBlendRate { alpha: f32 },
}
