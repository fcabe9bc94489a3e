// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralMap — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use rayon::prelude::*;
use sm_core::RunStack;
use tracing::warn;

use crate::report::{SinkhornReport, TransportError};
use crate::TransportResult;

/// Relative slack allowed between per-run row and column mass totals.
const MASS_TOLERANCE: f32 = 1e-3;

/// Entropic optimal-transport solver via iterative proportional fitting.
///
/// `lambda` controls assignment sharpness: larger values approach a hard
/// assignment but shrink the `exp(-lambda * cost)` kernel toward zero, which
/// the solver rejects as a configuration error once a run's kernel mass
/// underflows entirely.
#[derive(Clone, Debug)]
pub struct Sinkhorn {
    pub lambda: f32,
    pub tolerance: f32,
    pub max_sweeps: usize,
}

impl Default for Sinkhorn {
    fn default() -> Self {
        Self {
            lambda: 10.0,
            tolerance: 1e-6,
            max_sweeps: 1000,
        }
    }
}

/// A solved plan plus its convergence report.
#[derive(Clone, Debug)]
pub struct Transport {
    pub plan: RunStack,
    pub report: SinkhornReport,
}

impl Sinkhorn {
    pub fn new(lambda: f32) -> Self {
        Self {
            lambda,
            ..Self::default()
        }
    }

    /// Solve for a `runs x rows x cols` plan matching the marginal targets.
    ///
    /// `row_marginals` is `runs x rows` and `col_marginals` is `runs x cols`,
    /// both flattened run-major. Per run the two must carry the same total
    /// mass. The returned plan's column sums match the targets exactly (last
    /// sweep ends on a column rescale); row sums match within the reported
    /// residual.
    pub fn solve(
        &self,
        cost: &RunStack,
        row_marginals: &[f32],
        col_marginals: &[f32],
    ) -> TransportResult<Transport> {
        let (runs, rows, cols) = (cost.runs(), cost.rows(), cost.cols());
        self.validate(cost, row_marginals, col_marginals)?;

        let mut plan = RunStack::zeros(runs, rows, cols)?;
        self.init_kernel(&mut plan, cost)?;

        let run_len = rows * cols;
        let mut row_sums = vec![0.0f32; runs * rows];
        let mut sweeps = 0usize;
        let mut converged = false;
        let mut residual;

        loop {
            // Measure per-row sums and how far they moved since last sweep.
            residual = plan
                .as_slice()
                .par_chunks(run_len)
                .zip(row_sums.par_chunks_mut(rows))
                .map(|(run_plan, run_sums)| {
                    let mut delta = 0.0f32;
                    for (i, sum_slot) in run_sums.iter_mut().enumerate() {
                        let sum: f32 = run_plan[i * cols..(i + 1) * cols].iter().sum();
                        let change = (sum - *sum_slot).abs();
                        if change > delta {
                            delta = change;
                        }
                        *sum_slot = sum;
                    }
                    delta
                })
                .reduce(|| 0.0f32, f32::max);

            if residual <= self.tolerance {
                converged = true;
                break;
            }
            if sweeps == self.max_sweeps {
                break;
            }

            // One sweep: project rows onto their targets, then columns.
            plan.as_mut_slice()
                .par_chunks_mut(run_len)
                .zip(row_sums.par_chunks(rows))
                .zip(row_marginals.par_chunks(rows))
                .zip(col_marginals.par_chunks(cols))
                .for_each(|(((run_plan, run_sums), targets), col_targets)| {
                    for i in 0..rows {
                        let sum = run_sums[i];
                        if sum > 0.0 {
                            let scale = targets[i] / sum;
                            for value in &mut run_plan[i * cols..(i + 1) * cols] {
                                *value *= scale;
                            }
                        }
                    }
                    for j in 0..cols {
                        let mut sum = 0.0f32;
                        for i in 0..rows {
                            sum += run_plan[i * cols + j];
                        }
                        if sum > 0.0 {
                            let scale = col_targets[j] / sum;
                            for i in 0..rows {
                                run_plan[i * cols + j] *= scale;
                            }
                        }
                    }
                });
            sweeps += 1;
        }

        if !converged {
            warn!(
                sweeps,
                residual,
                tolerance = self.tolerance,
                "sinkhorn sweep cap reached before tolerance; returning best-effort plan"
            );
        }

        let transport_cost = plan
            .as_slice()
            .par_iter()
            .zip(cost.as_slice().par_iter())
            .map(|(p, c)| p * c)
            .sum::<f32>();

        Ok(Transport {
            plan,
            report: SinkhornReport {
                converged,
                sweeps,
                residual,
                transport_cost,
            },
        })
    }

    fn validate(
        &self,
        cost: &RunStack,
        row_marginals: &[f32],
        col_marginals: &[f32],
    ) -> TransportResult<()> {
        if !(self.lambda > 0.0) || !self.lambda.is_finite() {
            return Err(TransportError::NonPositiveRegularization {
                lambda: self.lambda,
            });
        }
        if !(self.tolerance > 0.0) || !self.tolerance.is_finite() {
            return Err(TransportError::NonPositiveTolerance {
                tolerance: self.tolerance,
            });
        }

        let (runs, rows, cols) = (cost.runs(), cost.rows(), cost.cols());
        if row_marginals.len() != runs * rows {
            return Err(TransportError::RowMarginalLength {
                expected: runs * rows,
                got: row_marginals.len(),
            });
        }
        if col_marginals.len() != runs * cols {
            return Err(TransportError::ColMarginalLength {
                expected: runs * cols,
                got: col_marginals.len(),
            });
        }

        cost.par_runs().enumerate().try_for_each(|(run, entries)| {
            for (idx, &value) in entries.iter().enumerate() {
                if !value.is_finite() {
                    return Err(TransportError::NonFiniteCost {
                        run,
                        row: idx / cols,
                        col: idx % cols,
                    });
                }
                if value < 0.0 {
                    return Err(TransportError::NegativeCost {
                        run,
                        row: idx / cols,
                        col: idx % cols,
                        value,
                    });
                }
            }
            Ok(())
        })?;

        for run in 0..runs {
            let row_total = marginal_total(&row_marginals[run * rows..(run + 1) * rows])
                .ok_or(TransportError::InvalidMarginal { run })?;
            let col_total = marginal_total(&col_marginals[run * cols..(run + 1) * cols])
                .ok_or(TransportError::InvalidMarginal { run })?;
            if (row_total - col_total).abs() > MASS_TOLERANCE * row_total.max(1.0) {
                return Err(TransportError::MarginalMismatch {
                    run,
                    row_total,
                    col_total,
                });
            }
        }
        Ok(())
    }

    /// `plan = exp(-lambda * cost)`, normalised to unit mass per run.
    fn init_kernel(&self, plan: &mut RunStack, cost: &RunStack) -> TransportResult<()> {
        let lambda = self.lambda;
        plan.par_runs_mut()
            .zip(cost.par_runs())
            .enumerate()
            .try_for_each(|(run, (run_plan, run_cost))| {
                let mut total = 0.0f32;
                for (slot, &value) in run_plan.iter_mut().zip(run_cost) {
                    let weight = (-lambda * value).exp();
                    *slot = weight;
                    total += weight;
                }
                if !total.is_finite() || total <= 0.0 {
                    return Err(TransportError::DegenerateKernel { run, lambda });
                }
                let inv = 1.0 / total;
                for slot in run_plan.iter_mut() {
                    *slot *= inv;
                }
                Ok(())
            })
    }
}

/// Sum of a marginal slice, `None` if any entry is invalid or the total is
/// not strictly positive.
fn marginal_total(marginals: &[f32]) -> Option<f32> {
    let mut total = 0.0f32;
    for &value in marginals {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        total += value;
    }
    if total > 0.0 {
        Some(total)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn uniform_marginals(runs: usize, bins: usize, value: f32) -> Vec<f32> {
        vec![value; runs * bins]
    }

    fn random_problem(runs: usize, rows: usize, cols: usize, seed: u64) -> RunStack {
        let mut rng = StdRng::seed_from_u64(seed);
        RunStack::from_fn(runs, rows, cols, |_, _, _| rng.gen_range(0.0..4.0)).unwrap()
    }

    #[test]
    fn marginals_converge_for_random_costs() {
        let (runs, rows, cols) = (8, 20, 4);
        let cost = random_problem(runs, rows, cols, 11);
        let row_targets = uniform_marginals(runs, rows, 1.0);
        let col_targets = uniform_marginals(runs, cols, rows as f32 / cols as f32);

        let transport = Sinkhorn::new(5.0)
            .solve(&cost, &row_targets, &col_targets)
            .unwrap();
        assert!(transport.report.converged);

        for run in 0..runs {
            let plan = transport.plan.run(run).unwrap();
            for i in 0..rows {
                let sum: f32 = plan[i * cols..(i + 1) * cols].iter().sum();
                assert!((sum - 1.0).abs() < 1e-3, "run {run} row {i} sum {sum}");
            }
            for j in 0..cols {
                let sum: f32 = (0..rows).map(|i| plan[i * cols + j]).sum();
                let target = rows as f32 / cols as f32;
                assert!((sum - target).abs() < 1e-3, "run {run} col {j} sum {sum}");
            }
        }
    }

    #[test]
    fn randomized_mass_consistent_marginals_are_matched() {
        let (runs, rows, cols) = (4, 12, 3);
        let cost = random_problem(runs, rows, cols, 29);
        let mut rng = StdRng::seed_from_u64(31);

        // Random positive row marginals; column marginals drawn random then
        // rescaled to the same per-run total.
        let mut row_targets = Vec::with_capacity(runs * rows);
        let mut col_targets = Vec::with_capacity(runs * cols);
        for _ in 0..runs {
            let rows_run: Vec<f32> = (0..rows).map(|_| rng.gen_range(0.2..2.0)).collect();
            let row_total: f32 = rows_run.iter().sum();
            let cols_raw: Vec<f32> = (0..cols).map(|_| rng.gen_range(0.2..2.0)).collect();
            let col_total: f32 = cols_raw.iter().sum();
            row_targets.extend_from_slice(&rows_run);
            col_targets.extend(cols_raw.iter().map(|v| v * row_total / col_total));
        }

        let transport = Sinkhorn::new(3.0)
            .solve(&cost, &row_targets, &col_targets)
            .unwrap();
        assert!(transport.report.converged);

        for run in 0..runs {
            let plan = transport.plan.run(run).unwrap();
            for i in 0..rows {
                let sum: f32 = plan[i * cols..(i + 1) * cols].iter().sum();
                let target = row_targets[run * rows + i];
                assert!(
                    (sum - target).abs() < 1e-3,
                    "run {run} row {i}: {sum} vs {target}"
                );
            }
            for j in 0..cols {
                let sum: f32 = (0..rows).map(|i| plan[i * cols + j]).sum();
                let target = col_targets[run * cols + j];
                assert!(
                    (sum - target).abs() < 1e-3,
                    "run {run} col {j}: {sum} vs {target}"
                );
            }
        }
    }

    #[test]
    fn total_mass_is_conserved_and_entries_stay_non_negative() {
        let (runs, rows, cols) = (6, 10, 5);
        let cost = random_problem(runs, rows, cols, 43);
        let row_targets = uniform_marginals(runs, rows, 1.0);
        let col_targets = uniform_marginals(runs, cols, 2.0);

        let transport = Sinkhorn::default()
            .solve(&cost, &row_targets, &col_targets)
            .unwrap();

        for run in 0..runs {
            let plan = transport.plan.run(run).unwrap();
            let total: f32 = plan.iter().sum();
            assert!((total - 10.0).abs() < 1e-2, "run {run} total {total}");
            assert!(plan.iter().all(|&v| v >= 0.0));
        }
    }

    #[test]
    fn zero_cost_still_terminates_with_balanced_plan() {
        // Identical samples and centroids: the plan is driven purely by the
        // marginal constraint and must split uniformly.
        let cost = RunStack::zeros(3, 4, 2).unwrap();
        let row_targets = uniform_marginals(3, 4, 1.0);
        let col_targets = uniform_marginals(3, 2, 2.0);

        let transport = Sinkhorn::default()
            .solve(&cost, &row_targets, &col_targets)
            .unwrap();
        assert!(transport.report.converged);
        assert!(transport.report.sweeps < 10);
        for &value in transport.plan.as_slice() {
            assert!((value - 0.5).abs() < 1e-5);
        }
        assert!(transport.report.transport_cost.abs() < 1e-6);
    }

    #[test]
    fn sweep_cap_is_reported_not_swallowed() {
        let cost = random_problem(2, 15, 3, 7);
        let row_targets = uniform_marginals(2, 15, 1.0);
        let col_targets = uniform_marginals(2, 3, 5.0);

        let solver = Sinkhorn {
            lambda: 10.0,
            tolerance: 1e-12,
            max_sweeps: 2,
        };
        let transport = solver.solve(&cost, &row_targets, &col_targets).unwrap();
        assert!(!transport.report.converged);
        assert_eq!(transport.report.sweeps, 2);
        assert!(transport.report.residual > 1e-12);
    }

    #[test]
    fn mismatched_marginal_mass_is_rejected_before_iterating() {
        let cost = RunStack::zeros(1, 4, 2).unwrap();
        let row_targets = uniform_marginals(1, 4, 1.0);
        let col_targets = uniform_marginals(1, 2, 3.0); // 6 units vs 4

        let err = Sinkhorn::default()
            .solve(&cost, &row_targets, &col_targets)
            .unwrap_err();
        assert!(matches!(err, TransportError::MarginalMismatch { run: 0, .. }));
    }

    #[test]
    fn non_finite_and_negative_costs_are_rejected() {
        let mut bad = RunStack::zeros(1, 2, 2).unwrap();
        bad.as_mut_slice()[3] = f32::NAN;
        let err = Sinkhorn::default()
            .solve(&bad, &[1.0, 1.0], &[1.0, 1.0])
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::NonFiniteCost {
                run: 0,
                row: 1,
                col: 1
            }
        ));

        let negative = RunStack::from_vec(1, 2, 2, vec![0.0, 0.5, -0.5, 0.0]).unwrap();
        let err = Sinkhorn::default()
            .solve(&negative, &[1.0, 1.0], &[1.0, 1.0])
            .unwrap_err();
        assert!(matches!(err, TransportError::NegativeCost { .. }));
    }

    #[test]
    fn kernel_underflow_surfaces_as_configuration_error() {
        let cost = RunStack::filled(1, 3, 2, 1.0).unwrap();
        let solver = Sinkhorn::new(1e10);
        let err = solver
            .solve(&cost, &[1.0, 1.0, 1.0], &[1.5, 1.5])
            .unwrap_err();
        assert!(matches!(err, TransportError::DegenerateKernel { run: 0, .. }));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let cost = RunStack::zeros(1, 2, 2).unwrap();
        let solver = Sinkhorn {
            lambda: 0.0,
            ..Sinkhorn::default()
        };
        assert!(matches!(
            solver.solve(&cost, &[1.0, 1.0], &[1.0, 1.0]),
            Err(TransportError::NonPositiveRegularization { .. })
        ));

        let solver = Sinkhorn {
            tolerance: -1.0,
            ..Sinkhorn::default()
        };
        assert!(matches!(
            solver.solve(&cost, &[1.0, 1.0], &[1.0, 1.0]),
            Err(TransportError::NonPositiveTolerance { .. })
        ));

        assert!(matches!(
            Sinkhorn::default().solve(&cost, &[1.0], &[1.0, 1.0]),
            Err(TransportError::RowMarginalLength { .. })
        ));
    }
}
