// Fitness sub-scores: independent measurements of one melody.
//
// Every function here is pure and takes the raw slot codes (see melody.rs).
// Most read only the "note stream" (pitches with pauses and sustains removed);
// the rhythmic measures read sustain runs directly. Scores are normalized to
// roughly [0, 1] so that the Gaussian targets in coefficients.rs are
// comparable across features.
//
// Degenerate input (empty melodies, fewer than two notes, a zero-length beat
// or range) yields 0.0 rather than NaN. The one exception is
// `average_interval`, which returns `UNDEFINED_SCORE` when there is no
// interval to average; the evaluator leaves that feature out of the sum.
//
// "Beat" here means `beat_length` consecutive slots, where
// `beat_length = numerator / note_duration * 4 / denominator`. Slots past the
// last whole beat are ignored by the per-beat measures.

use crate::melody::{PAUSE, SUSTAIN, is_pitch};
use std::collections::{BTreeSet, HashSet};

/// Returned by `average_interval` when no interval exists.
pub const UNDEFINED_SCORE: f64 = -1.0;

fn note_stream(melody: &[i32]) -> Vec<i32> {
    melody.iter().copied().filter(|&c| is_pitch(c)).collect()
}

fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Split into whole beats of `beat_length` slots.
fn beats(melody: &[i32], beat_length: usize) -> impl Iterator<Item = &[i32]> {
    let whole = if beat_length == 0 {
        0
    } else {
        melody.len() / beat_length * beat_length
    };
    melody[..whole].chunks(beat_length.max(1))
}

// ── Intervals ──

/// Dissonance and large-interval ratios over consecutive notes.
///
/// Intervals are taken between successive pitches, skipping pauses and
/// sustains. Wrapped to an octave, a minor seventh (10) adds 1 to the
/// dissonance counter, unisons, seconds, thirds, fourths, fifths and sixths
/// add nothing, and the tritone and major seventh add 2. Unwrapped intervals
/// wider than an octave count as large. Both counters are divided by the
/// number of intervals.
pub fn interval_scores(melody: &[i32]) -> (f64, f64) {
    let mut previous: Option<i32> = None;
    let mut intervals = 0usize;
    let mut dissonance = 0usize;
    let mut large = 0usize;

    for &code in melody.iter().filter(|&&c| is_pitch(c)) {
        if let Some(prev) = previous {
            let interval = (code - prev).abs();
            if interval > 12 {
                large += 1;
            }
            dissonance += match interval % 12 {
                10 => 1,
                0 | 1 | 2 | 3 | 4 | 5 | 7 | 8 | 9 => 0,
                _ => 2,
            };
            intervals += 1;
        }
        previous = Some(code);
    }

    if intervals == 0 {
        return (0.0, 0.0);
    }
    (
        dissonance as f64 / intervals as f64,
        large as f64 / intervals as f64,
    )
}

/// Mean absolute interval between successive notes, ignoring leaps over an
/// octave, divided by 12. `UNDEFINED_SCORE` if no such interval exists.
pub fn average_interval(melody: &[i32]) -> f64 {
    let notes = note_stream(melody);
    if notes.len() < 2 {
        return UNDEFINED_SCORE;
    }
    let intervals: Vec<i32> = notes
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .filter(|&iv| iv <= 12)
        .collect();
    if intervals.is_empty() {
        return UNDEFINED_SCORE;
    }
    let sum: i32 = intervals.iter().sum();
    sum as f64 / intervals.len() as f64 / 12.0
}

/// "Scale playing": share of adjacent interval pairs that are both small
/// (at most 3 semitones) and both non-zero.
///
/// Pauses stay in the stream here and break a run: an interval that touches
/// a pause is never small.
pub fn small_intervals(melody: &[i32]) -> f64 {
    let stream: Vec<i32> = melody.iter().copied().filter(|&c| c != SUSTAIN).collect();
    if stream.len() < 2 {
        return 0.0;
    }
    let intervals: Vec<Option<i32>> = stream
        .windows(2)
        .map(|w| {
            if is_pitch(w[0]) && is_pitch(w[1]) {
                Some(w[1] - w[0])
            } else {
                None
            }
        })
        .collect();
    let small = |iv: Option<i32>| matches!(iv, Some(v) if v != 0 && v.abs() <= 3);
    let pairs = intervals
        .windows(2)
        .filter(|w| small(w[0]) && small(w[1]))
        .count();
    ratio(pairs, intervals.len())
}

/// Share of notes that directly follow another note and sit at most two
/// semitones above it (any descent counts too).
pub fn repeated_short_notes(melody: &[i32]) -> f64 {
    let mut notes = 0usize;
    let mut close = 0usize;
    for (i, &code) in melody.iter().enumerate() {
        if !is_pitch(code) {
            continue;
        }
        notes += 1;
        if i > 0 && is_pitch(melody[i - 1]) && code - melody[i - 1] <= 2 {
            close += 1;
        }
    }
    ratio(close, notes)
}

// ── Scale ──

/// Scale and root conformance over every non-sustain slot.
///
/// Pauses count toward the total but never conform.
pub fn scale_and_root_conformance(
    melody: &[i32],
    scale_notes: &BTreeSet<u8>,
    root_pc: u8,
) -> (f64, f64) {
    let mut total = 0usize;
    let mut in_scale = 0usize;
    let mut on_root = 0usize;

    for &code in melody.iter().filter(|&&c| c != SUSTAIN) {
        total += 1;
        if is_pitch(code) {
            let pc = (code % 12) as u8;
            if scale_notes.contains(&pc) {
                in_scale += 1;
            }
            if pc == root_pc % 12 {
                on_root += 1;
            }
        }
    }

    (ratio(in_scale, total), ratio(on_root, total))
}

// ── Contour ──

/// Share of non-zero intervals that ascend; 0.5 when every interval is a
/// repeat, 0.0 with fewer than two notes.
pub fn melodic_contour(melody: &[i32]) -> f64 {
    let notes = note_stream(melody);
    if notes.len() < 2 {
        return 0.0;
    }
    let mut rising = 0usize;
    let mut moving = 0usize;
    for w in notes.windows(2) {
        let interval = w[1] - w[0];
        if interval > 0 {
            rising += 1;
        }
        if interval != 0 {
            moving += 1;
        }
    }
    if moving == 0 { 0.5 } else { rising as f64 / moving as f64 }
}

/// Share of transitions between successive non-zero intervals that flip
/// direction.
pub fn directional_changes(melody: &[i32]) -> f64 {
    let notes = note_stream(melody);
    let signs: Vec<bool> = notes
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|&iv| iv != 0)
        .map(|iv| iv > 0)
        .collect();
    if signs.len() < 2 {
        return 0.0;
    }
    let changes = signs.windows(2).filter(|w| w[0] != w[1]).count();
    ratio(changes, signs.len() - 1)
}

// ── Pitch statistics ──

/// (max - min) of the notes over the configured range span.
pub fn pitch_range(melody: &[i32], range_span: i32) -> f64 {
    let notes = note_stream(melody);
    let (Some(min), Some(max)) = (notes.iter().min(), notes.iter().max()) else {
        return 0.0;
    };
    if range_span <= 0 {
        return 0.0;
    }
    (max - min) as f64 / range_span as f64
}

/// Mean absolute pitch over the configured range span.
pub fn average_pitch(melody: &[i32], range_span: i32) -> f64 {
    let notes = note_stream(melody);
    if notes.is_empty() || range_span <= 0 {
        return 0.0;
    }
    let sum: i64 = notes.iter().map(|&n| n as i64).sum();
    sum as f64 / notes.len() as f64 / range_span as f64
}

/// Population standard deviation of the notes over that of a uniform
/// distribution across the range (`span / sqrt(12)`).
pub fn pitch_variation(melody: &[i32], range_span: i32) -> f64 {
    let notes = note_stream(melody);
    if notes.len() < 2 || range_span <= 0 {
        return 0.0;
    }
    let n = notes.len() as f64;
    let avg = notes.iter().map(|&p| p as f64).sum::<f64>() / n;
    let sq_sum: f64 = notes.iter().map(|&p| (p as f64) * (p as f64)).sum();
    let stdev = (sq_sum / n - avg * avg).max(0.0).sqrt();
    stdev / (range_span as f64 / 12f64.sqrt())
}

// ── Per-beat measures ──

/// Distinct pitches per beat over the beat length, averaged across beats.
/// A beat with fewer than two distinct pitches scores 0.
pub fn note_diversity(melody: &[i32], beat_length: usize) -> f64 {
    let scores: Vec<f64> = beats(melody, beat_length)
        .map(|beat| {
            let unique: BTreeSet<i32> = note_stream(beat).into_iter().collect();
            if unique.len() > 1 {
                unique.len() as f64 / beat_length as f64
            } else {
                0.0
            }
        })
        .collect();
    mean(&scores)
}

/// Distinct absolute intervals (up to an octave) between adjacent slots of
/// each beat over the number of such intervals, averaged across beats.
pub fn interval_diversity(melody: &[i32], beat_length: usize) -> f64 {
    let scores: Vec<f64> = beats(melody, beat_length)
        .map(|beat| {
            let intervals: Vec<i32> = beat
                .windows(2)
                .filter(|w| is_pitch(w[0]) && is_pitch(w[1]))
                .map(|w| w[1] - w[0])
                .filter(|iv| iv.abs() <= 12)
                .collect();
            let unique: BTreeSet<i32> = intervals.iter().map(|iv| iv.abs()).collect();
            if unique.len() > 1 {
                unique.len() as f64 / intervals.len() as f64
            } else {
                0.0
            }
        })
        .collect();
    mean(&scores)
}

/// Per beat, collects the distinct lengths of sustain runs.
///
/// The per-beat value is the distinct-length count divided by itself, so a
/// beat scores 1 whenever it holds two or more different run lengths and 0
/// otherwise. The measure therefore only detects whether rhythm varies
/// within a beat, not by how much.
pub fn rhythmic_diversity(melody: &[i32], beat_length: usize) -> f64 {
    let scores: Vec<f64> = beats(melody, beat_length)
        .map(|beat| {
            let mut lengths = BTreeSet::new();
            let mut run = 0usize;
            for &code in beat {
                if code == SUSTAIN {
                    run += 1;
                } else if run > 0 {
                    lengths.insert(run);
                    run = 0;
                }
            }
            if run > 0 {
                lengths.insert(run);
            }
            if lengths.len() > 1 {
                lengths.len() as f64 / lengths.len() as f64
            } else {
                0.0
            }
        })
        .collect();
    mean(&scores)
}

/// Off-beat density: notes starting on odd positions within a beat, plus
/// the slots they sustain inside that beat, over `beat_length - 2`.
pub fn odd_index_notes(melody: &[i32], beat_length: usize) -> f64 {
    let adjusted = beat_length.saturating_sub(2);
    let scores: Vec<f64> = beats(melody, beat_length)
        .map(|beat| {
            let mut count = 0usize;
            for j in (1..beat.len()).step_by(2) {
                if !is_pitch(beat[j]) {
                    continue;
                }
                count += 1;
                count += beat[j + 1..].iter().take_while(|&&c| c == SUSTAIN).count();
            }
            if adjusted > 0 {
                count as f64 / adjusted as f64
            } else {
                0.0
            }
        })
        .collect();
    mean(&scores)
}

// ── Rhythmic values ──

/// Rhythmic values as run lengths: each sustain run contributes its length
/// plus one (the slot it extends), and every non-sustain slot contributes 1.
fn rhythmic_values(melody: &[i32]) -> Vec<usize> {
    let mut values = Vec::new();
    let mut start: Option<usize> = None;
    for (i, &code) in melody.iter().enumerate() {
        if code == SUSTAIN {
            start.get_or_insert(i);
        } else if let Some(s) = start.take() {
            values.push(i - s + 1);
        }
    }
    if let Some(s) = start {
        values.push(melody.len() - s + 1);
    }
    let singles = melody.iter().filter(|&&c| c != SUSTAIN).count();
    values.extend(std::iter::repeat_n(1, singles));
    values
}

/// Normalized log2 of the mean rhythmic value, and the normalized standard
/// deviation of the log2 values, both over `log2(4 * expected_length)`.
pub fn log_rhythmic_value(melody: &[i32], expected_length: usize) -> (f64, f64) {
    let values = rhythmic_values(melody);
    let denominator = ((4 * expected_length) as f64).log2();
    if values.is_empty() || denominator <= 0.0 {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let average = values.iter().sum::<usize>() as f64 / n;
    let log_average = average.log2();
    let sq_sum_log: f64 = values
        .iter()
        .map(|&v| {
            let l = (v as f64).log2();
            l * l
        })
        .sum();
    let stdev_log = (sq_sum_log / n - log_average * log_average).max(0.0).sqrt();
    (log_average / denominator, stdev_log / denominator)
}

/// Share of rhythmic values longer than four slots.
pub fn proportion_of_long_notes(melody: &[i32]) -> f64 {
    let values = rhythmic_values(melody);
    ratio(values.iter().filter(|&&v| v > 4).count(), values.len())
}

/// Share of slots that are a pause or a sustain continuing a pause.
pub fn pause_proportion(melody: &[i32]) -> f64 {
    let mut paused = 0usize;
    let mut in_pause = false;
    for &code in melody {
        if code == PAUSE || (in_pause && code == SUSTAIN) {
            paused += 1;
            in_pause = true;
        } else {
            in_pause = false;
        }
    }
    ratio(paused, melody.len())
}

// ── Repetition ──

/// Repeated note series of one length, normalized by the number of windows
/// beyond the first series. A repeat of a single-pitch series counts half.
fn repeated_series_of_length(notes: &[i32], length: usize) -> f64 {
    if notes.len() < 2 * length + 1 {
        return 0.0;
    }
    let mut seen: HashSet<&[i32]> = HashSet::new();
    let mut repeats = 0.0;
    for series in notes.windows(length) {
        if !seen.insert(series) {
            repeats += if series.iter().all(|&n| n == series[0]) {
                0.5
            } else {
                1.0
            };
        }
    }
    repeats * length as f64 / (notes.len() - length - 1) as f64
}

/// Mean repeated-series score over series lengths 2 through `max_length`.
pub fn repeated_series(melody: &[i32], max_length: usize) -> f64 {
    if max_length < 2 {
        return 0.0;
    }
    let notes = note_stream(melody);
    let total: f64 = (2..=max_length)
        .map(|len| repeated_series_of_length(&notes, len))
        .sum();
    total / (max_length - 1) as f64
}
