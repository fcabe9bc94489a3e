// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralMap — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use sm_core::{LabelStack, RunStack};
use sm_transport::{Sinkhorn, SinkhornReport};
use tracing::debug;

use crate::{score_queries, AccuracyReport, GaussianModel, MapError, MapResult};

/// Fixed-epoch driver for the assign / estimate / blend cycle.
///
/// The loop never stops early: every epoch runs one balanced assignment, one
/// weighted-mean re-estimate and one blend, and a terminal assignment
/// produces the reported accuracy. `verbose` emits per-epoch diagnostics at
/// debug level without touching the algorithm.
#[derive(Clone, Debug)]
pub struct MapRefiner {
    pub alpha: f32,
    pub epochs: usize,
    pub verbose: bool,
}

impl MapRefiner {
    pub fn new(alpha: f32, epochs: usize) -> Self {
        Self {
            alpha,
            epochs,
            verbose: false,
        }
    }
}

/// Final state of one refined run batch.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "report-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapOutcome {
    pub accuracy: AccuracyReport,
    /// Refinement epochs performed.
    pub epochs: usize,
    /// How many solver invocations hit the sweep cap instead of converging.
    pub capped_solves: usize,
    /// Report of the terminal assignment.
    pub final_report: SinkhornReport,
}

impl MapRefiner {
    /// Drive `model` for `epochs` iterations and score the terminal
    /// assignment on the query block.
    pub fn run(
        &self,
        model: &mut GaussianModel,
        features: &RunStack,
        labels: &LabelStack,
        solver: &Sinkhorn,
    ) -> MapResult<MapOutcome> {
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(MapError::InvalidBlendRate { alpha: self.alpha });
        }

        let mut capped_solves = 0usize;
        for epoch in 1..=self.epochs {
            let (assignment, report) = model.assign(features, labels, solver)?;
            if !report.converged {
                capped_solves += 1;
            }
            if self.verbose {
                let diag = score_queries(&assignment, labels, model.geometry())?;
                debug!(
                    epoch,
                    accuracy = diag.mean,
                    half_width = diag.half_width_95,
                    sweeps = report.sweeps,
                    "refinement epoch"
                );
            }
            let estimate = model.estimate(&assignment, features)?;
            model.blend(&estimate, self.alpha)?;
        }

        let (assignment, final_report) = model.assign(features, labels, solver)?;
        if !final_report.converged {
            capped_solves += 1;
        }
        let accuracy = score_queries(&assignment, labels, model.geometry())?;

        Ok(MapOutcome {
            accuracy,
            epochs: self.epochs,
            capped_solves,
            final_report,
        })
    }
}
