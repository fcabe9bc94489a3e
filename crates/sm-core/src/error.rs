// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralMap — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use thiserror::Error;

/// Errors raised by stack and geometry constructors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("invalid stack dimensions {runs} x {rows} x {cols}; every axis must be non-zero")]
    InvalidDimensions {
        runs: usize,
        rows: usize,
        cols: usize,
    },
    #[error("data length mismatch: expected {expected} elements, got {got}")]
    DataLength { expected: usize, got: usize },
    #[error(
        "episode geometry requires non-zero counts \
         (runs {runs}, ways {ways}, shot {shot}, queries {queries})"
    )]
    EmptyGeometry {
        runs: usize,
        ways: usize,
        shot: usize,
        queries: usize,
    },
    #[error("label {label} in run {run} lies outside the {ways}-way episode")]
    LabelOutOfRange { run: usize, label: u16, ways: usize },
    #[error("stack run index {run} out of range for {runs} runs")]
    RunOutOfRange { run: usize, runs: usize },
}
