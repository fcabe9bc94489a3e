use sm_config::Normalization;
use sm_core::{EpisodeGeometry, LabelStack, RunStack};
use sm_data::{center, rescale_rows, SyntheticSampler};
use sm_map::{score_queries, GaussianModel, MapRefiner};
use sm_transport::Sinkhorn;

/// Two classes in a toy 2D space: one support anchor per class sitting
/// exactly on its class center, four well-separated queries. The balanced
/// marginal matches ground truth, so five refinement epochs must classify
/// every query correctly.
#[test]
fn well_separated_two_way_episode_is_solved_exactly() {
    let geometry = EpisodeGeometry::new(1, 2, 1, 2).unwrap();
    let features = RunStack::from_vec(
        1,
        6,
        2,
        vec![
            0.0, 0.0, // support, class 0 (its true center)
            5.0, 5.0, // support, class 1
            0.1, 0.0, // query, class 0
            5.1, 5.0, // query, class 1
            0.0, -0.1, // query, class 0
            4.9, 5.1, // query, class 1
        ],
    )
    .unwrap();
    let labels = LabelStack::interleaved(&geometry);

    let solver = Sinkhorn::new(10.0);
    let mut model = GaussianModel::from_support(&features, &labels, geometry).unwrap();
    let refiner = MapRefiner::new(0.3, 5);
    let outcome = refiner.run(&mut model, &features, &labels, &solver).unwrap();

    assert_eq!(outcome.accuracy.mean, 1.0);
    assert_eq!(outcome.epochs, 5);
    assert_eq!(outcome.capped_solves, 0);
    assert!(outcome.final_report.converged);
}

/// With a zero blend rate the centroids never move, so any number of epochs
/// reproduces the single-epoch result bit for bit.
#[test]
fn zero_blend_rate_makes_epoch_count_irrelevant() {
    let geometry = EpisodeGeometry::new(20, 5, 1, 3).unwrap();
    let sampler = SyntheticSampler {
        feature_dim: 16,
        seed: Some(2024),
        ..SyntheticSampler::default()
    };
    let (features, labels) = sampler.sample(&geometry).unwrap();
    let solver = Sinkhorn::default();

    let mut one_epoch = GaussianModel::from_support(&features, &labels, geometry).unwrap();
    let short = MapRefiner::new(0.0, 1)
        .run(&mut one_epoch, &features, &labels, &solver)
        .unwrap();

    let mut many_epochs = GaussianModel::from_support(&features, &labels, geometry).unwrap();
    let long = MapRefiner::new(0.0, 7)
        .run(&mut many_epochs, &features, &labels, &solver)
        .unwrap();

    assert_eq!(short.accuracy.mean, long.accuracy.mean);
    assert_eq!(short.accuracy.half_width_95, long.accuracy.half_width_95);
    assert_eq!(one_epoch.centroids(), many_epochs.centroids());
}

/// Support rows stay one-hot and query mass stays balanced across repeated
/// refinement epochs, not just after the first assignment.
#[test]
fn constraints_hold_through_repeated_epochs() {
    let geometry = EpisodeGeometry::new(8, 4, 2, 3).unwrap();
    let sampler = SyntheticSampler {
        feature_dim: 12,
        seed: Some(5),
        ..SyntheticSampler::default()
    };
    let (features, labels) = sampler.sample(&geometry).unwrap();
    // Raw uncentered features span a wide distance range; a gentle lambda
    // keeps every kernel row away from underflow.
    let solver = Sinkhorn::new(1.0);
    let mut model = GaussianModel::from_support(&features, &labels, geometry).unwrap();

    for _ in 0..3 {
        let (assignment, report) = model.assign(&features, &labels, &solver).unwrap();
        assert!(report.converged);

        let (ways, support, samples) = (geometry.ways(), geometry.support(), geometry.samples());
        for run in 0..geometry.runs() {
            for s in 0..support {
                let truth = usize::from(labels.at(run, s));
                for class in 0..ways {
                    let expected = if class == truth { 1.0 } else { 0.0 };
                    assert_eq!(assignment.at(run, s, class), expected);
                }
            }
            for s in support..samples {
                let row_sum: f32 = (0..ways).map(|class| assignment.at(run, s, class)).sum();
                assert!((row_sum - 1.0).abs() < 1e-3);
            }
            for class in 0..ways {
                let mass: f32 = (support..samples)
                    .map(|s| assignment.at(run, s, class))
                    .sum();
                assert!((mass - geometry.queries() as f32).abs() < 1e-3);
            }
        }

        let estimate = model.estimate(&assignment, &features).unwrap();
        model.blend(&estimate, 0.25).unwrap();
    }
}

/// Full pipeline on separable synthetic clusters: rescale, center, refine.
/// Clusters sit far apart relative to their noise, so accuracy lands near
/// the ceiling.
#[test]
fn synthetic_clusters_refine_to_high_accuracy() {
    let geometry = EpisodeGeometry::new(50, 5, 1, 5).unwrap();
    let sampler = SyntheticSampler {
        feature_dim: 16,
        separation: 3.0,
        noise: 0.5,
        seed: Some(77),
    };
    let (mut features, labels) = sampler.sample(&geometry).unwrap();
    rescale_rows(&mut features, 1.0).unwrap();
    center(&mut features, Normalization::SplitCenter, &geometry).unwrap();

    let solver = Sinkhorn::new(10.0);
    let mut model = GaussianModel::from_support(&features, &labels, geometry).unwrap();
    let refiner = MapRefiner::new(0.3, 10);
    let outcome = refiner.run(&mut model, &features, &labels, &solver).unwrap();

    assert!(
        outcome.accuracy.mean > 0.9,
        "accuracy {} too low for separable clusters",
        outcome.accuracy.mean
    );
    // A sanity floor as well: the initial support means alone already beat
    // chance by a wide margin on this data.
    let (assignment, _) = model.assign(&features, &labels, &solver).unwrap();
    let rescored = score_queries(&assignment, &labels, &geometry).unwrap();
    assert!(rescored.mean > 0.9);
}
