use serde::{Deserialize, Serialize};

/// How feature vectors are centered and renormalised before inference.
///
/// The two variants are deliberate strategies rather than a mode flag:
/// `SplitCenter` treats the support and query blocks as separate populations,
/// `UniformCenter` treats the run as one population and softens the final
/// renormalisation with an exponent on the vector norm.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Normalization {
    /// Center support and query blocks separately, then scale each block's
    /// vectors to unit norm.
    SplitCenter,
    /// Center all samples of a run together, then divide each vector by
    /// `norm^gamma`. The exponent is an opaque tunable.
    UniformCenter { gamma: f32 },
}

/// One named hyperparameter preset for the MAP refinement pipeline.
///
/// `rescale_exponent` is the exponent applied to per-vector norms in the
/// rescaling step that precedes centering (1.0 leaves plain unit rescaling).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapPreset {
    /// Support samples per class.
    pub shot: usize,
    /// Power-transform exponent applied to raw features.
    pub beta: f32,
    /// Entropic regularization sharpness handed to the transport solver.
    pub lambda: f32,
    /// Centroid blend rate per outer iteration.
    pub alpha: f32,
    /// Outer refinement iterations.
    pub steps: usize,
    /// Exponent on per-vector norms during rescaling.
    pub rescale_exponent: f32,
    /// Centering strategy.
    pub normalization: Normalization,
}

impl MapPreset {
    pub fn pt_map_1shot_cub() -> Self {
        Self {
            shot: 1,
            beta: 0.5,
            lambda: 10.0,
            alpha: 0.3,
            steps: 30,
            rescale_exponent: 1.0,
            normalization: Normalization::SplitCenter,
        }
    }

    pub fn pt_map_5shot_cub() -> Self {
        Self {
            shot: 5,
            beta: 0.5,
            lambda: 10.0,
            alpha: 0.2,
            steps: 20,
            rescale_exponent: 1.0,
            normalization: Normalization::SplitCenter,
        }
    }

    pub fn pt_map_1shot_cifar() -> Self {
        Self {
            shot: 1,
            beta: 0.5,
            lambda: 10.0,
            alpha: 0.3,
            steps: 30,
            rescale_exponent: 1.0,
            normalization: Normalization::SplitCenter,
        }
    }

    pub fn pt_map_5shot_cifar() -> Self {
        Self {
            shot: 5,
            beta: 0.5,
            lambda: 10.0,
            alpha: 0.2,
            steps: 20,
            rescale_exponent: 1.0,
            normalization: Normalization::SplitCenter,
        }
    }

    pub fn lst_map_1shot_cub() -> Self {
        Self {
            shot: 1,
            beta: 0.5,
            lambda: 10.0,
            alpha: 0.4,
            steps: 30,
            rescale_exponent: 0.7,
            normalization: Normalization::UniformCenter { gamma: 0.95 },
        }
    }

    pub fn lst_map_5shot_cub() -> Self {
        Self {
            shot: 5,
            beta: 0.5,
            lambda: 10.0,
            alpha: 0.2,
            steps: 20,
            rescale_exponent: 0.3,
            normalization: Normalization::UniformCenter { gamma: 0.90 },
        }
    }

    pub fn lst_map_1shot_cifar() -> Self {
        Self {
            shot: 1,
            beta: 0.5,
            lambda: 10.0,
            alpha: 0.3,
            steps: 20,
            rescale_exponent: 0.3,
            normalization: Normalization::UniformCenter { gamma: 0.98 },
        }
    }

    pub fn lst_map_5shot_cifar() -> Self {
        Self {
            shot: 5,
            beta: 0.5,
            lambda: 10.0,
            alpha: 0.2,
            steps: 20,
            rescale_exponent: 0.4,
            normalization: Normalization::UniformCenter { gamma: 0.95 },
        }
    }
}
