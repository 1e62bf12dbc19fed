// Genetic Composer
//
// Evolves short monophonic melodies with a genetic algorithm. Candidates are
// fixed-length rows of integer slots (pitch, rest or sustain). Fitness scores
// them against a battery of music heuristics, each rewarded for landing near a
// target that six mood sliders set, minus a penalty for resembling the rest
// of the population.
//
// Architecture:
// - melody.rs: Slot encoding (pitch / PAUSE / SUSTAIN) and the Melody type
// - config.rs: GeneratorConfig (JSON-loadable), meter and slot arithmetic
// - coefficients.rs: Enumerated fitness features, mood-derived mu/sigma/weight
//   tables, label-keyed overrides
// - features.rs: Pure sub-score functions (intervals, scale conformance,
//   contour, pitch statistics, per-beat diversity, rhythm, repetition)
// - fitness.rs: MelodyContext, FitnessEvaluator, similarity penalty,
//   parallel population scoring
// - population.rs: Random-walk initial population
// - operators.rs: Tournament selection, one-point crossover, seven mutations
// - evolution.rs: Generational driver, per-generation stats, final ranking
// - error.rs: ComposerError
//
// Scales and note names come from genetic_composer_theory; all randomness from
// genetic_composer_prng, so a run is deterministic given a seed.

pub mod coefficients;
pub mod config;
pub mod error;
pub mod evolution;
pub mod features;
pub mod fitness;
pub mod melody;
pub mod operators;
pub mod population;

pub use config::{GeneratorConfig, Meter};
pub use error::{ComposerError, Result};
pub use evolution::{EvolutionReport, GenerationStats, GeneticMelodyGenerator};
pub use melody::{Event, Melody, PAUSE, SUSTAIN};
