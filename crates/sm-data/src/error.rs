// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralMap — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use sm_core::StackError;
use thiserror::Error;

/// Errors raised by preprocessing transforms and the synthetic sampler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error(transparent)]
    Stack(#[from] StackError),
    #[error("power transform requires non-negative features; run {run}, sample {sample} holds {value}")]
    NegativeFeature {
        run: usize,
        sample: usize,
        value: f32,
    },
    #[error("exponent must be positive and finite, got {value}")]
    InvalidExponent { value: f32 },
    #[error(
        "feature stack is {got_runs} runs x {got_rows} samples but the geometry \
         expects {runs} x {samples}"
    )]
    GeometryMismatch {
        runs: usize,
        samples: usize,
        got_runs: usize,
        got_rows: usize,
    },
    #[error("sample {sample} in run {run} has zero norm and cannot be rescaled")]
    ZeroNorm { run: usize, sample: usize },
    #[error("sampler parameters must be finite (separation {separation}, noise {noise})")]
    InvalidSampler { separation: f32, noise: f32 },
}
