// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralMap — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Entropic optimal transport over batched cost stacks.
//!
//! Given a `runs x rows x cols` cost stack and per-run row/column marginal
//! targets, [`Sinkhorn`] produces a non-negative transport plan whose row and
//! column sums match the targets, by alternating row and column rescaling of
//! an `exp(-lambda * cost)` kernel. All runs iterate together; each run's
//! scaling is independent and executes in parallel.
//!
//! Reaching the sweep cap is not an error: the best-effort plan is returned
//! together with a [`SinkhornReport`] that says whether the tolerance was met,
//! how many sweeps ran, and the final residual.

mod report;
mod sinkhorn;

pub use report::{SinkhornReport, TransportError};
pub use sinkhorn::{Sinkhorn, Transport};

/// Result alias for solver operations.
pub type TransportResult<T> = Result<T, TransportError>;
