// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralMap — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Feature-side collaborators for the refinement core.
//!
//! Everything here is a stateless tensor transform or a data source: the
//! power transform, QR-based dimensionality reduction, per-vector rescaling
//! and the two centering strategies run once before inference; the synthetic
//! sampler produces seeded Gaussian-cluster episodes for tests, benchmarks
//! and demos.

mod error;
mod preprocess;
mod qr;
mod sampler;

pub use error::DataError;
pub use preprocess::{center, power_transform, preprocess, rescale_rows};
pub use qr::qr_reduce;
pub use sampler::SyntheticSampler;

/// Result alias for preprocessing and sampling operations.
pub type DataResult<T> = Result<T, DataError>;
