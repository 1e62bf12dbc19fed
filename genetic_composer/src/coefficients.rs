// Fitness coefficient tables.
//
// Each fitness feature has a target mean (mu), a spread (sigma) and an
// integer importance weight. A feature's score contributes
// `weight * exp(-0.5 * ((score - mu) / sigma)^2)` to the total, so the tables
// describe the kind of melody being asked for rather than a quantity to
// maximize.
//
// The tables are a struct of arrays indexed by `FitnessFeature`. Feature
// labels survive only for logs and for the string-keyed overrides accepted
// in configuration files, which are resolved once at construction.
//
// Targets are derived from six mood sliders by fixed linear formulas; sigma
// defaults to 0.1 everywhere. The three auxiliary features
// (directional changes, very long notes, repeated series) are scored but
// carry weight 0 unless overridden.

use crate::error::{ComposerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every feature the evaluator can score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FitnessFeature {
    Diversity,
    DiversityInterval,
    Dissonance,
    RhythmicDiversity,
    RhythmicAverageValue,
    DeviationRhythmicValue,
    ScaleConformance,
    RootConformance,
    MelodicContour,
    PitchRange,
    PauseProportion,
    LargeIntervals,
    AveragePitch,
    PitchVariation,
    OddIndexNotes,
    AverageInterval,
    ScalePlaying,
    ShortConsecutiveNotes,
    DirectionalChanges,
    VeryLongNotes,
    RepeatedSeries,
}

pub const FEATURE_COUNT: usize = 21;

impl FitnessFeature {
    pub const ALL: [FitnessFeature; FEATURE_COUNT] = [
        FitnessFeature::Diversity,
        FitnessFeature::DiversityInterval,
        FitnessFeature::Dissonance,
        FitnessFeature::RhythmicDiversity,
        FitnessFeature::RhythmicAverageValue,
        FitnessFeature::DeviationRhythmicValue,
        FitnessFeature::ScaleConformance,
        FitnessFeature::RootConformance,
        FitnessFeature::MelodicContour,
        FitnessFeature::PitchRange,
        FitnessFeature::PauseProportion,
        FitnessFeature::LargeIntervals,
        FitnessFeature::AveragePitch,
        FitnessFeature::PitchVariation,
        FitnessFeature::OddIndexNotes,
        FitnessFeature::AverageInterval,
        FitnessFeature::ScalePlaying,
        FitnessFeature::ShortConsecutiveNotes,
        FitnessFeature::DirectionalChanges,
        FitnessFeature::VeryLongNotes,
        FitnessFeature::RepeatedSeries,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable snake_case label used in logs and configuration overrides.
    pub fn label(self) -> &'static str {
        match self {
            FitnessFeature::Diversity => "diversity",
            FitnessFeature::DiversityInterval => "diversity_interval",
            FitnessFeature::Dissonance => "dissonance",
            FitnessFeature::RhythmicDiversity => "rhythmic_diversity",
            FitnessFeature::RhythmicAverageValue => "rhythmic_average_value",
            FitnessFeature::DeviationRhythmicValue => "deviation_rhythmic_value",
            FitnessFeature::ScaleConformance => "scale_conformance",
            FitnessFeature::RootConformance => "root_conformance",
            FitnessFeature::MelodicContour => "melodic_contour",
            FitnessFeature::PitchRange => "pitch_range",
            FitnessFeature::PauseProportion => "pause_proportion",
            FitnessFeature::LargeIntervals => "large_intervals",
            FitnessFeature::AveragePitch => "average_pitch",
            FitnessFeature::PitchVariation => "pitch_variation",
            FitnessFeature::OddIndexNotes => "odd_index_notes",
            FitnessFeature::AverageInterval => "average_interval",
            FitnessFeature::ScalePlaying => "scale_playing",
            FitnessFeature::ShortConsecutiveNotes => "short_consecutive_notes",
            FitnessFeature::DirectionalChanges => "directional_changes",
            FitnessFeature::VeryLongNotes => "very_long_notes_score",
            FitnessFeature::RepeatedSeries => "repetition",
        }
    }

    pub fn from_label(label: &str) -> Result<FitnessFeature> {
        FitnessFeature::ALL
            .iter()
            .copied()
            .find(|f| f.label() == label)
            .ok_or_else(|| ComposerError::UnknownFeature(label.to_string()))
    }
}

/// The six mood sliders, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoodParams {
    pub diversity: f64,
    pub dynamics: f64,
    pub arousal: f64,
    pub valence: f64,
    pub jazziness: f64,
    pub weirdness: f64,
}

impl Default for MoodParams {
    fn default() -> Self {
        MoodParams {
            diversity: 0.8,
            dynamics: 0.8,
            arousal: 0.8,
            valence: 0.8,
            jazziness: 0.5,
            weirdness: 0.5,
        }
    }
}

impl MoodParams {
    pub fn values(&self) -> [(&'static str, f64); 6] {
        [
            ("diversity", self.diversity),
            ("dynamics", self.dynamics),
            ("arousal", self.arousal),
            ("valence", self.valence),
            ("jazziness", self.jazziness),
            ("weirdness", self.weirdness),
        ]
    }
}

/// Per-feature overrides keyed by feature label, applied after the mood
/// formulas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoefficientOverrides {
    pub mu: BTreeMap<String, f64>,
    pub sigma: BTreeMap<String, f64>,
    pub weight: BTreeMap<String, u32>,
}

/// Target means, spreads and weights for every feature.
#[derive(Debug, Clone, PartialEq)]
pub struct FitnessCoefficients {
    mu: [f64; FEATURE_COUNT],
    sigma: [f64; FEATURE_COUNT],
    weight: [u32; FEATURE_COUNT],
}

impl FitnessCoefficients {
    pub fn from_mood(mood: &MoodParams) -> Self {
        use FitnessFeature::*;

        let MoodParams {
            diversity,
            dynamics,
            arousal,
            valence,
            jazziness,
            weirdness,
        } = *mood;

        let mut coefficients = FitnessCoefficients {
            mu: [0.0; FEATURE_COUNT],
            sigma: [0.1; FEATURE_COUNT],
            weight: [0; FEATURE_COUNT],
        };

        let table: [(FitnessFeature, f64, u32); FEATURE_COUNT] = [
            (Diversity, diversity, 2),
            (DiversityInterval, diversity, 2),
            (Dissonance, (1.0 - valence) * 0.4 + jazziness * 0.2, 3),
            (
                RhythmicDiversity,
                diversity * 0.2 + dynamics * 0.5 + arousal * 0.2,
                1,
            ),
            (RhythmicAverageValue, 1.0 - arousal, 3),
            (DeviationRhythmicValue, dynamics, 2),
            (ScaleConformance, (1.0 - jazziness) * 0.5 + 0.5, 3),
            (RootConformance, 0.3, 3),
            (MelodicContour, valence, 1),
            (PitchRange, dynamics * 0.5 + arousal * 0.5, 1),
            (PauseProportion, dynamics * 0.2 - arousal * 0.1, 1),
            (LargeIntervals, weirdness, 5),
            (AveragePitch, arousal * 0.2 + valence * 0.3, 1),
            (PitchVariation, dynamics * 0.5, 1),
            (OddIndexNotes, weirdness, 3),
            (
                AverageInterval,
                (1.0 - dynamics) * 0.5 + (1.0 - valence) * 0.5,
                1,
            ),
            (ScalePlaying, jazziness * 0.3 + dynamics * 0.5, 2),
            (ShortConsecutiveNotes, 0.5 * arousal + jazziness * 0.2, 2),
            (DirectionalChanges, 0.5, 0),
            (VeryLongNotes, 0.05, 0),
            (RepeatedSeries, 0.0, 0),
        ];
        for (feature, mu, weight) in table {
            coefficients.mu[feature.index()] = mu;
            coefficients.weight[feature.index()] = weight;
        }
        coefficients
    }

    /// Apply label-keyed overrides. Fails on the first unknown label.
    pub fn with_overrides(mut self, overrides: &CoefficientOverrides) -> Result<Self> {
        for (label, &mu) in &overrides.mu {
            self.mu[FitnessFeature::from_label(label)?.index()] = mu;
        }
        for (label, &sigma) in &overrides.sigma {
            self.sigma[FitnessFeature::from_label(label)?.index()] = sigma;
        }
        for (label, &weight) in &overrides.weight {
            self.weight[FitnessFeature::from_label(label)?.index()] = weight;
        }
        Ok(self)
    }

    pub fn mu(&self, feature: FitnessFeature) -> f64 {
        self.mu[feature.index()]
    }

    pub fn sigma(&self, feature: FitnessFeature) -> f64 {
        self.sigma[feature.index()]
    }

    pub fn weight(&self, feature: FitnessFeature) -> u32 {
        self.weight[feature.index()]
    }

    /// Weighted Gaussian reward for one feature score. Zero weight or a
    /// non-positive sigma contributes nothing.
    pub fn reward(&self, feature: FitnessFeature, score: f64) -> f64 {
        let i = feature.index();
        let sigma = self.sigma[i];
        if self.weight[i] == 0 || sigma <= 0.0 {
            return 0.0;
        }
        let z = (score - self.mu[i]) / sigma;
        self.weight[i] as f64 * (-0.5 * z * z).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_indices_match_table_order() {
        for (i, feature) in FitnessFeature::ALL.iter().enumerate() {
            assert_eq!(feature.index(), i);
        }
    }

    #[test]
    fn labels_are_unique_and_resolvable() {
        for feature in FitnessFeature::ALL {
            assert_eq!(FitnessFeature::from_label(feature.label()).unwrap(), feature);
        }
        assert!(matches!(
            FitnessFeature::from_label("chord_conformance"),
            Err(ComposerError::UnknownFeature(_))
        ));
    }

    #[test]
    fn mood_formulas() {
        let mood = MoodParams {
            diversity: 0.6,
            dynamics: 0.4,
            arousal: 1.0,
            valence: 0.5,
            jazziness: 0.0,
            weirdness: 0.2,
        };
        let c = FitnessCoefficients::from_mood(&mood);
        assert!((c.mu(FitnessFeature::Dissonance) - 0.2).abs() < 1e-12);
        assert!((c.mu(FitnessFeature::RhythmicAverageValue) - 0.0).abs() < 1e-12);
        assert!((c.mu(FitnessFeature::ScaleConformance) - 1.0).abs() < 1e-12);
        assert!((c.mu(FitnessFeature::PauseProportion) - (-0.02)).abs() < 1e-12);
        assert!((c.mu(FitnessFeature::PitchRange) - 0.7).abs() < 1e-12);
        assert!((c.mu(FitnessFeature::AverageInterval) - 0.55).abs() < 1e-12);
        assert_eq!(c.weight(FitnessFeature::LargeIntervals), 5);
        assert_eq!(c.weight(FitnessFeature::VeryLongNotes), 0);
        for feature in FitnessFeature::ALL {
            assert!((c.sigma(feature) - 0.1).abs() < 1e-12);
        }
    }

    #[test]
    fn reward_peaks_at_target() {
        let c = FitnessCoefficients::from_mood(&MoodParams::default());
        let mu = c.mu(FitnessFeature::Dissonance);
        let at_target = c.reward(FitnessFeature::Dissonance, mu);
        assert!((at_target - 3.0).abs() < 1e-12);
        let off = c.reward(FitnessFeature::Dissonance, mu + 0.1);
        assert!((off - 3.0 * (-0.5f64).exp()).abs() < 1e-12);
        assert!(c.reward(FitnessFeature::Dissonance, mu - 0.3) < off);
    }

    #[test]
    fn overrides_replace_mood_targets() {
        let mut overrides = CoefficientOverrides::default();
        overrides.mu.insert("melodic_contour".into(), 0.15);
        overrides.weight.insert("directional_changes".into(), 4);
        overrides.sigma.insert("pitch_range".into(), 0.0);
        let c = FitnessCoefficients::from_mood(&MoodParams::default())
            .with_overrides(&overrides)
            .unwrap();
        assert!((c.mu(FitnessFeature::MelodicContour) - 0.15).abs() < 1e-12);
        assert_eq!(c.weight(FitnessFeature::DirectionalChanges), 4);
        assert_eq!(c.reward(FitnessFeature::PitchRange, 0.5), 0.0);

        overrides.mu.insert("nonsense".into(), 1.0);
        assert!(
            FitnessCoefficients::from_mood(&MoodParams::default())
                .with_overrides(&overrides)
                .is_err()
        );
    }
}
