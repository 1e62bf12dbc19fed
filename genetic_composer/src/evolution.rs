// Evolution driver.
//
// Runs the generational loop: build a random-walk population, then for a
// fixed number of generations breed a full replacement population through
// tournament selection, crossover and mutation. Nothing survives from one
// generation to the next except through breeding. After the last generation
// the population is ranked by fitness and the best `top_n` are returned.
//
// Fitness depends on the whole population (through the similarity penalty),
// so every member is scored once per generation, in parallel, and selection
// reads those cached scores. All random draws come from the generator's
// single `ComposerRng`; a configured seed makes a run fully reproducible.

use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::fitness::{FitnessEvaluator, MelodyContext};
use crate::melody::Melody;
use crate::operators::{MutationParams, crossover, mutate, tournament_selection};
use crate::population::generate_population;
use genetic_composer_prng::ComposerRng;
use genetic_composer_theory::pitch_range;
use serde::Serialize;
use tracing::{debug, info};

/// Fitness summary of one population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationStats {
    /// 0 is the initial population.
    pub generation: usize,
    pub best: f64,
    pub mean: f64,
    pub worst: f64,
}

impl GenerationStats {
    fn from_scores(generation: usize, scores: &[f64]) -> Self {
        if scores.is_empty() {
            return GenerationStats {
                generation,
                best: 0.0,
                mean: 0.0,
                worst: 0.0,
            };
        }
        GenerationStats {
            generation,
            best: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean: scores.iter().sum::<f64>() / scores.len() as f64,
            worst: scores.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvolutionReport {
    /// Best melodies of the final population, best first.
    pub melodies: Vec<Melody>,
    /// Fitness of each returned melody within the final population.
    pub fitness: Vec<f64>,
    pub best_fitness: f64,
    /// One entry per population, starting with the initial one.
    pub history: Vec<GenerationStats>,
}

pub struct GeneticMelodyGenerator {
    config: GeneratorConfig,
    vocabulary: Vec<i32>,
    evaluator: FitnessEvaluator,
    mutation: MutationParams,
    rng: ComposerRng,
}

impl GeneticMelodyGenerator {
    /// Validate the configuration and resolve the scale and note range.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        let scale = config.scale_spec()?;
        let (low, high) = config.note_range;
        let vocabulary = pitch_range(low, high)?;
        let context = MelodyContext::new(
            &scale,
            low,
            high,
            config.beat_length(),
            config.expected_length(),
        )?;
        let evaluator = FitnessEvaluator::new(
            context,
            config.fitness_coefficients()?,
            config.similarity_weight,
        );
        let mutation = MutationParams {
            vocabulary: vocabulary.clone(),
            low,
            high,
            beat_length: config.beat_length(),
            expected_length: config.expected_length(),
            rate: config.mutation_rate,
        };
        let rng = match config.seed {
            Some(seed) => ComposerRng::new(seed),
            None => ComposerRng::from_entropy(),
        };
        Ok(GeneticMelodyGenerator {
            config,
            vocabulary,
            evaluator,
            mutation,
            rng,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &FitnessEvaluator {
        &self.evaluator
    }

    /// A fresh random-walk population for melodies of `measures` measures.
    pub fn initial_population(&mut self, measures: u32) -> Vec<Melody> {
        generate_population(
            &self.vocabulary,
            self.config.melody_length(measures),
            self.config.population_size,
            &mut self.rng,
        )
    }

    /// Breed a full replacement for `population`, whose members scored
    /// `scores`.
    pub fn next_generation(&mut self, population: &[Melody], scores: &[f64]) -> Vec<Melody> {
        let size = self.config.population_size;
        let k = self.config.tournament_size;
        let mut next = Vec::with_capacity(size + 1);
        while next.len() < size {
            let (Some(first), Some(second)) = (
                tournament_selection(population, scores, k, &mut self.rng),
                tournament_selection(population, scores, k, &mut self.rng),
            ) else {
                break;
            };
            let (mut a, mut b) = if self.rng.random_bool(self.config.crossover_rate) {
                crossover(first, second, &mut self.rng)
            } else {
                (first.clone(), second.clone())
            };
            mutate(&mut a, &self.mutation, &mut self.rng);
            mutate(&mut b, &self.mutation, &mut self.rng);
            next.push(a);
            next.push(b);
        }
        next.truncate(size);
        next
    }

    /// Evolve melodies of `measures` measures and return the best `top_n`.
    pub fn run(&mut self, measures: u32) -> EvolutionReport {
        let length = self.config.melody_length(measures);
        info!(
            scale = %self.config.scale,
            length,
            population = self.config.population_size,
            generations = self.config.num_generations,
            "starting evolution"
        );

        let mut population = self.initial_population(measures);
        let mut scores = self.evaluator.score_population(&population);
        let mut history = Vec::with_capacity(self.config.num_generations + 1);
        history.push(GenerationStats::from_scores(0, &scores));

        for generation in 1..=self.config.num_generations {
            population = self.next_generation(&population, &scores);
            scores = self.evaluator.score_population(&population);
            let stats = GenerationStats::from_scores(generation, &scores);
            debug!(
                generation,
                best = stats.best,
                mean = stats.mean,
                worst = stats.worst,
                "generation scored"
            );
            history.push(stats);
        }

        let mut order: Vec<usize> = (0..population.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        order.truncate(self.config.top_n);

        let fitness: Vec<f64> = order.iter().map(|&i| scores[i]).collect();
        let best_fitness = fitness.first().copied().unwrap_or(f64::NEG_INFINITY);
        let melodies: Vec<Melody> = order.iter().map(|&i| population[i].clone()).collect();

        if let Some(best) = melodies.first() {
            info!(
                best_fitness,
                melody = %best.summary(self.config.beat_length()),
                "evolution finished"
            );
        }

        EvolutionReport {
            melodies,
            fitness,
            best_fitness,
            history,
        }
    }

    /// Evolve and return only the fittest melody.
    pub fn run_best(&mut self, measures: u32) -> Melody {
        self.run(measures)
            .melodies
            .into_iter()
            .next()
            .unwrap_or_else(|| Melody::new(Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComposerError;
    use crate::melody::SUSTAIN;
    use genetic_composer_theory::TheoryError;

    fn small_config(seed: u64) -> GeneratorConfig {
        GeneratorConfig {
            population_size: 16,
            num_generations: 6,
            top_n: 4,
            seed: Some(seed),
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn initial_population_matches_frame() {
        let mut generator = GeneticMelodyGenerator::new(small_config(1)).unwrap();
        let population = generator.initial_population(1);
        assert_eq!(population.len(), 16);
        for melody in &population {
            assert_eq!(melody.len(), 16);
            assert!(melody.iter().all(|&p| (60..=72).contains(&p)));
        }
    }

    #[test]
    fn run_returns_ranked_well_formed_melodies() {
        let mut generator = GeneticMelodyGenerator::new(small_config(2)).unwrap();
        let report = generator.run(2);
        assert_eq!(report.melodies.len(), 4);
        assert_eq!(report.fitness.len(), 4);
        assert_eq!(report.history.len(), 7);
        assert_eq!(report.best_fitness, report.fitness[0]);
        assert!(report.fitness.windows(2).all(|w| w[0] >= w[1]));
        assert!((report.history[6].best - report.best_fitness).abs() < 1e-9);
        for melody in &report.melodies {
            assert_eq!(melody.len(), 32);
            assert_ne!(melody.first(), Some(&SUSTAIN));
            assert!(melody.is_well_formed(60, 72));
        }
        for stats in &report.history {
            assert!(stats.worst <= stats.mean + 1e-9 && stats.mean <= stats.best + 1e-9);
        }
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let a = GeneticMelodyGenerator::new(small_config(42)).unwrap().run(1);
        let b = GeneticMelodyGenerator::new(small_config(42)).unwrap().run(1);
        assert_eq!(a, b);
        let c = GeneticMelodyGenerator::new(small_config(43)).unwrap().run(1);
        assert_ne!(a.melodies, c.melodies);
    }

    #[test]
    fn odd_population_size_is_exact() {
        let config = GeneratorConfig {
            population_size: 5,
            top_n: 12,
            ..small_config(3)
        };
        let mut generator = GeneticMelodyGenerator::new(config).unwrap();
        let population = generator.initial_population(1);
        let scores = generator.evaluator().score_population(&population);
        assert_eq!(generator.next_generation(&population, &scores).len(), 5);
        // top_n larger than the population returns everyone.
        assert_eq!(generator.run(1).melodies.len(), 5);
    }

    #[test]
    fn zero_generations_ranks_initial_population() {
        let config = GeneratorConfig {
            num_generations: 0,
            ..small_config(4)
        };
        let mut generator = GeneticMelodyGenerator::new(config).unwrap();
        let report = generator.run(1);
        assert_eq!(report.history.len(), 1);
        assert_eq!(report.melodies.len(), 4);
    }

    #[test]
    fn other_meters_set_melody_length() {
        let config = GeneratorConfig {
            meter: "3/4".parse().unwrap(),
            note_duration: 0.125,
            ..small_config(5)
        };
        let mut generator = GeneticMelodyGenerator::new(config).unwrap();
        let best = generator.run_best(2);
        assert_eq!(best.len(), 48);
    }

    #[test]
    fn construction_rejects_bad_frame() {
        let inverted = GeneratorConfig {
            note_range: (72, 60),
            ..small_config(6)
        };
        assert!(matches!(
            GeneticMelodyGenerator::new(inverted),
            Err(ComposerError::Theory(TheoryError::InvalidNoteRange { .. }))
        ));
        // Negative codes are rests and sustains, never pitches.
        let negative = GeneratorConfig {
            note_range: (-12, 0),
            population_size: 64,
            ..small_config(1)
        };
        assert!(matches!(
            GeneticMelodyGenerator::new(negative),
            Err(ComposerError::Theory(TheoryError::InvalidNoteRange { .. }))
        ));
        let unknown = GeneratorConfig {
            scale: "C Bebop".to_string(),
            ..small_config(6)
        };
        assert!(matches!(
            GeneticMelodyGenerator::new(unknown),
            Err(ComposerError::Theory(TheoryError::InvalidScale(_)))
        ));
    }
}
