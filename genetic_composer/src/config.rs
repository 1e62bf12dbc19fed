// Generator configuration.
//
// `GeneratorConfig` gathers everything a run needs: the musical frame
// (scale, note range, meter, note duration), the mood sliders and coefficient
// overrides that shape fitness, and the GA parameters. It loads from JSON,
// with every field optional and falling back to `Default`.
//
// Slot arithmetic: one measure holds `numerator / note_duration * 4 /
// denominator` slots, so 4/4 at a sixteenth-note grid (0.25) gives 16 slots
// per measure. Fitness treats one measure's worth of slots as a beat, and a
// note is expected to last `round(1 / note_duration)` slots.

use crate::coefficients::{CoefficientOverrides, FitnessCoefficients, MoodParams};
use crate::error::{ComposerError, Result};
use genetic_composer_theory::{ScaleSpec, pitch_range};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meter {
    pub numerator: u32,
    pub denominator: u32,
}

impl Default for Meter {
    fn default() -> Self {
        Meter {
            numerator: 4,
            denominator: 4,
        }
    }
}

impl std::str::FromStr for Meter {
    type Err = ComposerError;

    /// Parse "N/D", e.g. "3/4".
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ComposerError::InvalidConfig(format!("bad meter '{s}', expected N/D"));
        let (n, d) = s.split_once('/').ok_or_else(invalid)?;
        Ok(Meter {
            numerator: n.trim().parse().map_err(|_| invalid())?,
            denominator: d.trim().parse().map_err(|_| invalid())?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Scale spec such as "C Major" or "F# Dorian".
    pub scale: String,
    /// Lowest and highest allowed pitch, inclusive.
    pub note_range: (i32, i32),
    pub mood: MoodParams,
    pub meter: Meter,
    /// Length of one slot as a fraction of a whole note.
    pub note_duration: f64,
    pub population_size: usize,
    pub num_generations: usize,
    /// Per-operator probability of each mutation firing.
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub tournament_size: usize,
    pub similarity_weight: f64,
    /// How many of the final population to return, best first.
    pub top_n: usize,
    /// Fixed seed for a reproducible run; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub coefficients: CoefficientOverrides,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            scale: "C Major".to_string(),
            note_range: (60, 72),
            mood: MoodParams::default(),
            meter: Meter::default(),
            note_duration: 0.25,
            population_size: 128,
            num_generations: 100,
            mutation_rate: 0.3,
            crossover_rate: 0.9,
            tournament_size: 4,
            similarity_weight: 10.0,
            top_n: 12,
            seed: None,
            coefficients: CoefficientOverrides::default(),
        }
    }
}

impl GeneratorConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: GeneratorConfig = serde_json::from_str(&data)?;
        Ok(config)
    }

    fn slots_per_measure(&self) -> f64 {
        self.meter.numerator as f64 / self.note_duration * 4.0 / self.meter.denominator as f64
    }

    /// Slots in a melody of `measures` measures.
    pub fn melody_length(&self, measures: u32) -> usize {
        (self.slots_per_measure() * measures as f64) as usize
    }

    /// Slots per beat as used by the per-beat fitness features.
    pub fn beat_length(&self) -> usize {
        self.slots_per_measure() as usize
    }

    /// Slots a note is expected to last.
    pub fn expected_length(&self) -> usize {
        (1.0 / self.note_duration).round() as usize
    }

    pub fn scale_spec(&self) -> Result<ScaleSpec> {
        Ok(ScaleSpec::parse(&self.scale)?)
    }

    /// Mood-derived coefficients with overrides applied.
    pub fn fitness_coefficients(&self) -> Result<FitnessCoefficients> {
        FitnessCoefficients::from_mood(&self.mood).with_overrides(&self.coefficients)
    }

    /// Check every field. Musical errors surface as `Theory` errors, the
    /// rest as `InvalidConfig` or `UnknownFeature`.
    pub fn validate(&self) -> Result<()> {
        let (low, high) = self.note_range;
        pitch_range(low, high)?;
        self.scale_spec()?;

        let invalid = |msg: String| Err(ComposerError::InvalidConfig(msg));
        if !(self.note_duration.is_finite() && self.note_duration > 0.0) {
            return invalid(format!(
                "note_duration must be positive, got {}",
                self.note_duration
            ));
        }
        if self.meter.numerator == 0 || self.meter.denominator == 0 {
            return invalid(format!(
                "meter parts must be positive, got {}/{}",
                self.meter.numerator, self.meter.denominator
            ));
        }
        if self.beat_length() == 0 {
            return invalid("a measure must hold at least one slot".to_string());
        }
        if self.population_size == 0 {
            return invalid("population_size must be at least 1".to_string());
        }
        if self.tournament_size == 0 {
            return invalid("tournament_size must be at least 1".to_string());
        }
        if self.top_n == 0 {
            return invalid("top_n must be at least 1".to_string());
        }
        for (name, rate) in [
            ("mutation_rate", self.mutation_rate),
            ("crossover_rate", self.crossover_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return invalid(format!("{name} must be in [0, 1], got {rate}"));
            }
        }
        for (name, value) in self.mood.values() {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("mood {name} must be in [0, 1], got {value}"));
            }
        }
        if !(self.similarity_weight.is_finite() && self.similarity_weight >= 0.0) {
            return invalid(format!(
                "similarity_weight must be non-negative, got {}",
                self.similarity_weight
            ));
        }
        self.fitness_coefficients()?;
        Ok(())
    }
}
