use anyhow::Result;

use crate::preprocess::InputTensor;

/// Binary decision produced for one ROI.
///
/// `Left` corresponds to raw prediction 1 (gate swings left and holds);
/// `Right` to raw prediction 0 (gate swings right, settles, recenters).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Left,
    Right,
}

impl Classification {
    /// Threshold the raw model score. Scores strictly above 0.5 are `Left`;
    /// exactly 0.5 falls to `Right`.
    pub fn from_score(score: f32) -> Self {
        if score > 0.5 {
            Classification::Left
        } else {
            Classification::Right
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Classification::Left => "left",
            Classification::Right => "right",
        }
    }

    /// Raw prediction value as reported by the deployed model.
    pub fn prediction(self) -> u8 {
        match self {
            Classification::Left => 1,
            Classification::Right => 0,
        }
    }
}

/// Scoring back end invoked once per producer iteration.
pub trait Classifier {
    /// Produce the raw model score for a preprocessed ROI.
    fn score(&self, input: &InputTensor) -> Result<f32>;
}

/// Brightness-gate back end used for bench runs without a deployed model.
///
/// Scores the mean normalized intensity of the input, so a bright ROI reads
/// as `Left` and a dark one as `Right`.
pub struct MeanLumaClassifier;

impl Classifier for MeanLumaClassifier {
    fn score(&self, input: &InputTensor) -> Result<f32> {
        if input.data.is_empty() {
            anyhow::bail!("empty input tensor");
        }
        let sum: f32 = input.data.iter().sum();
        Ok(sum / input.data.len() as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tensor(values: Vec<f32>) -> InputTensor {
        InputTensor {
            data: values,
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn threshold_boundary_is_exclusive() {
        assert_eq!(Classification::from_score(0.5), Classification::Right);
        assert_eq!(Classification::from_score(0.500_000_1), Classification::Left);
        assert_eq!(Classification::from_score(0.0), Classification::Right);
        assert_eq!(Classification::from_score(1.0), Classification::Left);
    }

    #[test]
    fn predictions_match_deployed_model_convention() {
        assert_eq!(Classification::Left.prediction(), 1);
        assert_eq!(Classification::Right.prediction(), 0);
    }

    #[test]
    fn mean_luma_scores_brightness() {
        let bright = MeanLumaClassifier.score(&tensor(vec![0.9, 0.8, 0.7])).unwrap();
        let dark = MeanLumaClassifier.score(&tensor(vec![0.1, 0.2, 0.0])).unwrap();
        assert!(bright > 0.5);
        assert!(dark < 0.5);
        assert_eq!(Classification::from_score(bright), Classification::Left);
        assert_eq!(Classification::from_score(dark), Classification::Right);
    }

    #[test]
    fn mean_luma_rejects_empty_input() {
        assert!(MeanLumaClassifier.score(&tensor(Vec::new())).is_err());
    }
}
