// Fitness evaluation.
//
// A melody's fitness is the sum over features of a weighted Gaussian reward
// for its sub-score (see coefficients.rs), minus a similarity penalty that
// grows with the number of position-aligned notes it shares with the rest of
// the population. The penalty keeps the population from collapsing onto a
// single genotype.
//
// `MelodyContext` carries the musical frame every sub-score is measured
// against: the scale, the note range, and the slot counts derived from meter
// and note duration. The evaluator is read-only after construction, so a
// whole population is scored in parallel with rayon.

use crate::coefficients::{FEATURE_COUNT, FitnessCoefficients, FitnessFeature};
use crate::features;
use crate::melody::Melody;
use genetic_composer_theory::{ScaleSpec, TheoryError, check_note_range};
use rayon::prelude::*;
use std::collections::BTreeSet;

/// Longest note series checked by the repeated-series feature.
const MAX_SERIES_LENGTH: usize = 4;

/// The musical frame a melody is scored against.
#[derive(Debug, Clone, PartialEq)]
pub struct MelodyContext {
    pub scale_notes: BTreeSet<u8>,
    pub root_pc: u8,
    pub low: i32,
    pub high: i32,
    /// Slots per beat.
    pub beat_length: usize,
    /// Slots a note is expected to last at the configured note duration.
    pub expected_length: usize,
}

impl MelodyContext {
    pub fn new(
        scale: &ScaleSpec,
        low: i32,
        high: i32,
        beat_length: usize,
        expected_length: usize,
    ) -> Result<Self, TheoryError> {
        check_note_range(low, high)?;
        Ok(MelodyContext {
            scale_notes: scale.pitch_classes(),
            root_pc: scale.root_pc(),
            low,
            high,
            beat_length,
            expected_length,
        })
    }

    pub fn range_span(&self) -> i32 {
        self.high - self.low
    }
}

/// Raw sub-scores of one melody, indexed by feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureScores([f64; FEATURE_COUNT]);

impl FeatureScores {
    pub fn get(&self, feature: FitnessFeature) -> f64 {
        self.0[feature.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (FitnessFeature, f64)> + '_ {
        FitnessFeature::ALL.iter().map(|&f| (f, self.0[f.index()]))
    }

    /// Whether a feature takes part in the weighted sum. Only the
    /// average-interval sentinel is excluded.
    pub fn is_defined(&self, feature: FitnessFeature) -> bool {
        !(feature == FitnessFeature::AverageInterval && self.get(feature) < 0.0)
    }
}

/// One line of a fitness breakdown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureContribution {
    pub feature: FitnessFeature,
    pub score: f64,
    pub reward: f64,
}

/// Fraction of position-aligned slots (after the first) that `population[index]`
/// shares with every other member, normalized by `(len - 1) * (pop - 1)`.
pub fn similarity_penalty_at(index: usize, population: &[Melody]) -> f64 {
    let melody = &population[index];
    similarity_against(melody, population, Some(index))
}

/// Similarity penalty of `melody` against a population it belongs to.
///
/// The member is recognized by identity, not by value, so an identical twin
/// elsewhere in the population still counts against it.
pub fn similarity_penalty(melody: &[i32], population: &[Melody]) -> f64 {
    let own = population
        .iter()
        .position(|other| !melody.is_empty() && std::ptr::eq(melody.as_ptr(), other.as_ptr()));
    similarity_against(melody, population, own)
}

fn similarity_against(melody: &[i32], population: &[Melody], skip: Option<usize>) -> f64 {
    if melody.len() < 2 || population.len() < 2 {
        return 0.0;
    }
    let total_notes = (melody.len() - 1) * (population.len() - 1);
    let mut shared = 0usize;
    for (i, other) in population.iter().enumerate() {
        if Some(i) == skip {
            continue;
        }
        let len = melody.len().min(other.len());
        shared += (1..len).filter(|&j| melody[j] == other[j]).count();
    }
    shared as f64 / total_notes as f64
}

/// Scores melodies against a fixed context and coefficient table.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    context: MelodyContext,
    coefficients: FitnessCoefficients,
    similarity_weight: f64,
}

impl FitnessEvaluator {
    pub fn new(
        context: MelodyContext,
        coefficients: FitnessCoefficients,
        similarity_weight: f64,
    ) -> Self {
        FitnessEvaluator {
            context,
            coefficients,
            similarity_weight,
        }
    }

    pub fn coefficients(&self) -> &FitnessCoefficients {
        &self.coefficients
    }

    /// Every sub-score of one melody.
    pub fn feature_scores(&self, melody: &[i32]) -> FeatureScores {
        use FitnessFeature::*;

        let ctx = &self.context;
        let span = ctx.range_span();
        let (dissonance, large) = features::interval_scores(melody);
        let (in_scale, on_root) =
            features::scale_and_root_conformance(melody, &ctx.scale_notes, ctx.root_pc);
        let (rhythm_avg, rhythm_dev) = features::log_rhythmic_value(melody, ctx.expected_length);

        let mut scores = [0.0; FEATURE_COUNT];
        let mut put = |feature: FitnessFeature, score: f64| scores[feature.index()] = score;
        put(Diversity, features::note_diversity(melody, ctx.beat_length));
        put(
            DiversityInterval,
            features::interval_diversity(melody, ctx.beat_length),
        );
        put(Dissonance, dissonance);
        put(
            RhythmicDiversity,
            features::rhythmic_diversity(melody, ctx.beat_length),
        );
        put(RhythmicAverageValue, rhythm_avg);
        put(DeviationRhythmicValue, rhythm_dev);
        put(ScaleConformance, in_scale);
        put(RootConformance, on_root);
        put(MelodicContour, features::melodic_contour(melody));
        put(PitchRange, features::pitch_range(melody, span));
        put(PauseProportion, features::pause_proportion(melody));
        put(LargeIntervals, large);
        put(AveragePitch, features::average_pitch(melody, span));
        put(PitchVariation, features::pitch_variation(melody, span));
        put(
            OddIndexNotes,
            features::odd_index_notes(melody, ctx.beat_length),
        );
        put(AverageInterval, features::average_interval(melody));
        put(ScalePlaying, features::small_intervals(melody));
        put(ShortConsecutiveNotes, features::repeated_short_notes(melody));
        put(DirectionalChanges, features::directional_changes(melody));
        put(VeryLongNotes, features::proportion_of_long_notes(melody));
        put(
            RepeatedSeries,
            features::repeated_series(melody, MAX_SERIES_LENGTH),
        );
        FeatureScores(scores)
    }

    /// Per-feature rewards, undefined scores reported with a zero reward.
    pub fn breakdown(&self, melody: &[i32]) -> Vec<FeatureContribution> {
        let scores = self.feature_scores(melody);
        scores
            .iter()
            .map(|(feature, score)| FeatureContribution {
                feature,
                score,
                reward: if scores.is_defined(feature) {
                    self.coefficients.reward(feature, score)
                } else {
                    0.0
                },
            })
            .collect()
    }

    /// Sum of feature rewards, without the population term.
    pub fn intrinsic_fitness(&self, melody: &[i32]) -> f64 {
        let scores = self.feature_scores(melody);
        scores
            .iter()
            .filter(|&(feature, _)| scores.is_defined(feature))
            .map(|(feature, score)| self.coefficients.reward(feature, score))
            .sum()
    }

    /// Fitness of a melody within its population.
    pub fn fitness(&self, melody: &[i32], population: &[Melody]) -> f64 {
        self.intrinsic_fitness(melody)
            - self.similarity_weight * similarity_penalty(melody, population)
    }

    /// Fitness of `population[index]`.
    pub fn fitness_at(&self, index: usize, population: &[Melody]) -> f64 {
        self.intrinsic_fitness(&population[index])
            - self.similarity_weight * similarity_penalty_at(index, population)
    }

    /// Fitness of every member, in population order.
    pub fn score_population(&self, population: &[Melody]) -> Vec<f64> {
        (0..population.len())
            .into_par_iter()
            .map(|i| self.fitness_at(i, population))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coefficients::MoodParams;
    use crate::features::UNDEFINED_SCORE;
    use crate::melody::{PAUSE, SUSTAIN};

    fn c_major_evaluator() -> FitnessEvaluator {
        let scale = ScaleSpec::parse("C Major").unwrap();
        let context = MelodyContext::new(&scale, 60, 72, 16, 4).unwrap();
        let coefficients = FitnessCoefficients::from_mood(&MoodParams::default());
        FitnessEvaluator::new(context, coefficients, 10.0)
    }

    #[test]
    fn inverted_range_is_rejected() {
        let scale = ScaleSpec::parse("C Major").unwrap();
        assert_eq!(
            MelodyContext::new(&scale, 72, 60, 16, 4),
            Err(TheoryError::InvalidNoteRange { low: 72, high: 60 })
        );
        assert_eq!(
            MelodyContext::new(&scale, -12, 0, 16, 4),
            Err(TheoryError::InvalidNoteRange { low: -12, high: 0 })
        );
    }

    #[test]
    fn held_notes_without_rests() {
        let evaluator = c_major_evaluator();
        let scores = evaluator.feature_scores(&[60, SUSTAIN, SUSTAIN, 62]);
        assert_eq!(scores.get(FitnessFeature::PauseProportion), 0.0);
        let expected = 61.0 / 12.0;
        assert!((scores.get(FitnessFeature::AveragePitch) - expected).abs() < 1e-12);
    }

    #[test]
    fn disjoint_melodies_share_nothing() {
        let population = vec![
            Melody::new(vec![60, 62, 64, 65]),
            Melody::new(vec![67, 69, 71, 72]),
        ];
        assert_eq!(similarity_penalty(&population[0], &population), 0.0);
        assert_eq!(similarity_penalty_at(1, &population), 0.0);
    }

    #[test]
    fn identical_twins_are_penalized() {
        let population = vec![
            Melody::new(vec![60, 62, 64, 65]),
            Melody::new(vec![60, 62, 64, 65]),
            Melody::new(vec![60, 67, 69, 71]),
        ];
        // Twin shares 3 slots, the third melody none after slot 0.
        let expected = 3.0 / (3.0 * 2.0);
        assert!((similarity_penalty(&population[0], &population) - expected).abs() < 1e-12);
        assert!((similarity_penalty_at(1, &population) - expected).abs() < 1e-12);
        assert_eq!(similarity_penalty_at(2, &population), 0.0);
    }

    #[test]
    fn similarity_of_tiny_inputs_is_zero() {
        let population = vec![Melody::new(vec![60])];
        assert_eq!(similarity_penalty_at(0, &population), 0.0);
        let pair = vec![Melody::new(vec![]), Melody::new(vec![])];
        assert_eq!(similarity_penalty(&pair[0], &pair), 0.0);
    }

    #[test]
    fn fitness_subtracts_weighted_similarity() {
        let evaluator = c_major_evaluator();
        let population = vec![
            Melody::new(vec![60, 62, 64, 65, 67, SUSTAIN, 65, 64]),
            Melody::new(vec![60, 62, 64, 65, 67, SUSTAIN, 65, 64]),
        ];
        let intrinsic = evaluator.intrinsic_fitness(&population[0]);
        let fitness = evaluator.fitness(&population[0], &population);
        assert!((intrinsic - fitness - 10.0).abs() < 1e-9);
        let scored = evaluator.score_population(&population);
        assert_eq!(scored.len(), 2);
        assert!((scored[0] - fitness).abs() < 1e-12);
        assert!((scored[1] - fitness).abs() < 1e-12);
    }

    #[test]
    fn undefined_average_interval_is_left_out() {
        let evaluator = c_major_evaluator();
        let melody = [60, SUSTAIN, PAUSE, SUSTAIN];
        let scores = evaluator.feature_scores(&melody);
        assert_eq!(scores.get(FitnessFeature::AverageInterval), UNDEFINED_SCORE);
        assert!(!scores.is_defined(FitnessFeature::AverageInterval));

        let breakdown = evaluator.breakdown(&melody);
        assert_eq!(breakdown.len(), FEATURE_COUNT);
        let total: f64 = breakdown.iter().map(|c| c.reward).sum();
        assert!((total - evaluator.intrinsic_fitness(&melody)).abs() < 1e-12);
        let avg = breakdown
            .iter()
            .find(|c| c.feature == FitnessFeature::AverageInterval)
            .unwrap();
        assert_eq!(avg.reward, 0.0);
    }

    #[test]
    fn fitness_is_bounded_by_total_weight() {
        let evaluator = c_major_evaluator();
        let melody = [60, 64, 67, SUSTAIN, 65, 62, PAUSE, 60, 64, 65, 67, 69, 71, 72, SUSTAIN, 60];
        let max: f64 = FitnessFeature::ALL
            .iter()
            .map(|&f| evaluator.coefficients().weight(f) as f64)
            .sum();
        let fitness = evaluator.intrinsic_fitness(&melody);
        assert!(fitness > 0.0);
        assert!(fitness <= max);
    }

    #[test]
    fn in_scale_melody_beats_chromatic_cluster_on_conformance() {
        let evaluator = c_major_evaluator();
        let diatonic = evaluator.feature_scores(&[60, 62, 64, 65, 67, 69, 71, 72]);
        let chromatic = evaluator.feature_scores(&[61, 63, 66, 68, 70, 61, 63, 66]);
        assert_eq!(diatonic.get(FitnessFeature::ScaleConformance), 1.0);
        assert_eq!(chromatic.get(FitnessFeature::ScaleConformance), 0.0);
    }
}
