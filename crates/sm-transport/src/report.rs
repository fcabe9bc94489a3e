// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralMap — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use sm_core::StackError;
use thiserror::Error;

/// Outcome summary attached to every solved transport plan.
///
/// `residual` is the maximum absolute change of per-row sums between the last
/// two sweeps, across every run and row — the quantity the convergence test
/// actually checks.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "report-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SinkhornReport {
    /// Whether the tolerance was met before the sweep cap.
    pub converged: bool,
    /// Number of row+column rescaling sweeps performed.
    pub sweeps: usize,
    /// Final residual of the convergence test.
    pub residual: f32,
    /// Frobenius inner product of plan and cost over the whole batch.
    /// Diagnostic only; never used for control flow.
    pub transport_cost: f32,
}

/// Errors that reject a transport problem before any sweep runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("row marginals hold {got} entries but the cost stack needs {expected} (runs x rows)")]
    RowMarginalLength { expected: usize, got: usize },
    #[error("column marginals hold {got} entries but the cost stack needs {expected} (runs x cols)")]
    ColMarginalLength { expected: usize, got: usize },
    #[error("cost entry at run {run}, row {row}, col {col} is not finite")]
    NonFiniteCost {
        run: usize,
        row: usize,
        col: usize,
    },
    #[error("cost entry at run {run}, row {row}, col {col} is negative ({value})")]
    NegativeCost {
        run: usize,
        row: usize,
        col: usize,
        value: f32,
    },
    #[error("marginals in run {run} must be finite, non-negative, and carry positive total mass")]
    InvalidMarginal { run: usize },
    #[error("run {run} requests {row_total} units of row mass but {col_total} units of column mass")]
    MarginalMismatch {
        run: usize,
        row_total: f32,
        col_total: f32,
    },
    #[error("regularization must be positive and finite, got {lambda}")]
    NonPositiveRegularization { lambda: f32 },
    #[error("tolerance must be positive and finite, got {tolerance}")]
    NonPositiveTolerance { tolerance: f32 },
    #[error(
        "scaling kernel degenerated in run {run}: exp(-{lambda} * cost) underflowed to zero mass"
    )]
    DegenerateKernel { run: usize, lambda: f32 },
    #[error(transparent)]
    Stack(#[from] StackError),
}
