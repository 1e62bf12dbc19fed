// Genetic Composer CLI entry point.
//
// Evolves melodies for the given scale, range and mood and prints the
// resulting report (best melodies, their fitness and per-generation stats)
// as JSON on stdout. A readable rendering of each melody goes to stderr.
//
// Usage:
//   cargo run -p genetic_composer --bin generate -- [--config FILE]
//     [--scale "C Major"] [--low 60|C5] [--high 72|C6] [--measures N]
//     [--meter 4/4] [--duration 0.25] [--population N] [--generations N]
//     [--top N] [--seed N] [--diversity X] [--dynamics X] [--arousal X]
//     [--valence X] [--jazziness X] [--weirdness X] [--breakdown]
//
// Flags override values from --config. Logging follows RUST_LOG
// (default genetic_composer=info).

use genetic_composer::{GeneratorConfig, GeneticMelodyGenerator, Meter};
use genetic_composer_theory::parse_note_name;
use std::path::Path;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("genetic_composer=info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut config = match parse_flag::<String>(&args, "--config") {
        Some(path) => match GeneratorConfig::load(Path::new(&path)) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => GeneratorConfig::default(),
    };

    if let Some(scale) = parse_flag::<String>(&args, "--scale") {
        config.scale = scale;
    }
    if let Some(low) = parse_pitch_flag(&args, "--low") {
        config.note_range.0 = low;
    }
    if let Some(high) = parse_pitch_flag(&args, "--high") {
        config.note_range.1 = high;
    }
    if let Some(meter) = parse_flag::<Meter>(&args, "--meter") {
        config.meter = meter;
    }
    if let Some(duration) = parse_flag(&args, "--duration") {
        config.note_duration = duration;
    }
    if let Some(size) = parse_flag(&args, "--population") {
        config.population_size = size;
    }
    if let Some(generations) = parse_flag(&args, "--generations") {
        config.num_generations = generations;
    }
    if let Some(top) = parse_flag(&args, "--top") {
        config.top_n = top;
    }
    if let Some(seed) = parse_flag(&args, "--seed") {
        config.seed = Some(seed);
    }
    let mood = &mut config.mood;
    for (flag, slot) in [
        ("--diversity", &mut mood.diversity),
        ("--dynamics", &mut mood.dynamics),
        ("--arousal", &mut mood.arousal),
        ("--valence", &mut mood.valence),
        ("--jazziness", &mut mood.jazziness),
        ("--weirdness", &mut mood.weirdness),
    ] {
        if let Some(value) = parse_flag(&args, flag) {
            *slot = value;
        }
    }
    let measures: u32 = parse_flag(&args, "--measures").unwrap_or(4);
    let show_breakdown = args.iter().any(|a| a == "--breakdown");

    let mut generator = match GeneticMelodyGenerator::new(config) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let report = generator.run(measures);

    let slots_per_bar = generator.config().beat_length();
    for (i, (melody, fitness)) in report.melodies.iter().zip(&report.fitness).enumerate() {
        eprintln!("#{:<2} {:>7.3}  {}", i + 1, fitness, melody.summary(slots_per_bar));
    }

    if show_breakdown {
        if let Some(best) = report.melodies.first() {
            eprintln!();
            eprintln!("{:<26} {:>8} {:>8} {:>8}", "feature", "score", "target", "reward");
            let coefficients = generator.evaluator().coefficients();
            for line in generator.evaluator().breakdown(best) {
                eprintln!(
                    "{:<26} {:>8.3} {:>8.3} {:>8.3}",
                    line.feature.label(),
                    line.score,
                    coefficients.mu(line.feature),
                    line.reward
                );
            }
        }
    }

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing report: {}", e);
            std::process::exit(1);
        }
    }
}

/// A pitch given either as a note number ("60") or a note name ("C5", "A-3").
fn parse_pitch_flag(args: &[String], flag: &str) -> Option<i32> {
    let value: String = parse_flag(args, flag)?;
    value
        .parse()
        .ok()
        .or_else(|| parse_note_name(&value).ok())
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}
