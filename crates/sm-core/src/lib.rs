// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralMap — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Shared primitives for batched few-shot episodes.
//!
//! Everything downstream operates on stacks of independent runs: a run is one
//! K-way episode, and a batch holds thousands of them evaluated together. The
//! types here pin down that layout once so the solver and refinement crates
//! never reach for process-wide state.

mod error;
mod geometry;
mod stack;

pub use error::StackError;
pub use geometry::EpisodeGeometry;
pub use stack::{LabelStack, RunStack};

/// Result alias used across the SpiralMap core crates.
pub type CoreResult<T> = Result<T, StackError>;
