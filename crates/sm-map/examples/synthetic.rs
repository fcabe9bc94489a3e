//! Refine a batch of synthetic 5-way episodes end to end and print the
//! batch accuracy. `RUST_LOG=debug` shows per-epoch diagnostics.

use sm_config::{init_tracing, MapPreset};
use sm_core::EpisodeGeometry;
use sm_data::{center, rescale_rows, SyntheticSampler};
use sm_map::{GaussianModel, MapRefiner};
use sm_transport::Sinkhorn;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    let preset = MapPreset::pt_map_1shot_cub();
    let geometry = EpisodeGeometry::new(1000, 5, preset.shot, 15)?;
    let sampler = SyntheticSampler {
        feature_dim: 32,
        seed: Some(42),
        ..SyntheticSampler::default()
    };

    let (mut features, labels) = sampler.sample(&geometry)?;
    rescale_rows(&mut features, preset.rescale_exponent)?;
    center(&mut features, preset.normalization, &geometry)?;

    let solver = Sinkhorn::new(preset.lambda);
    let mut model = GaussianModel::from_support(&features, &labels, geometry)?;
    let refiner = MapRefiner {
        alpha: preset.alpha,
        epochs: preset.steps,
        verbose: true,
    };
    let outcome = refiner.run(&mut model, &features, &labels, &solver)?;

    println!(
        "final accuracy {:.2} +- {:.2}",
        100.0 * outcome.accuracy.mean,
        100.0 * outcome.accuracy.half_width_95
    );
    if outcome.capped_solves > 0 {
        println!(
            "warning: {} solver calls hit the sweep cap (final residual {:.2e})",
            outcome.capped_solves, outcome.final_report.residual
        );
    }
    Ok(())
}
