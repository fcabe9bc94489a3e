// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralMap — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Transductive centroid refinement over batched few-shot episodes.
//!
//! [`GaussianModel`] owns one centroid per class per run, seeded from the
//! support means. [`MapRefiner`] alternates a transport-balanced soft
//! assignment of the query block with a weighted-mean centroid re-estimate,
//! blending each fresh estimate into the state at a fixed rate, for a fixed
//! number of epochs. The terminal assignment is scored against ground truth
//! on the query block only.

mod accuracy;
mod error;
mod model;
mod refine;

pub use accuracy::{score_queries, AccuracyReport};
pub use error::MapError;
pub use model::GaussianModel;
pub use refine::{MapOutcome, MapRefiner};

/// Result alias for refinement operations.
pub type MapResult<T> = Result<T, MapError>;
