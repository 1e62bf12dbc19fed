// Genetic operators: tournament selection, one-point crossover, mutation.
//
// All operators draw from the run's single `ComposerRng`, so a seeded run is
// reproducible end to end. Every operator preserves melody length; mutations
// also keep the first slot from becoming a sustain, and `mutate` clamps all
// pitches back into the note range as its last step.
//
// Mutation is a fixed sequence of seven operators, each firing independently
// with probability `rate`:
//
//   1. Interval     - copy a random note to another slot, shifted by up to
//                     an octave.
//   2. Transpose    - shift every note of a random fragment by up to an
//                     octave.
//   3. Extend       - turn one note (not the first slot) into a sustain.
//   4. Toggle rest  - a rest becomes a random pitch, anything else a rest.
//   5. Hold run     - overwrite a run after a non-sustain slot with sustains.
//   6. Fit length   - move a note's sustain run toward the expected note
//                     length, splitting runs that are too long and extending
//                     ones that are too short.
//   7. Sort         - gather a fragment's notes, sort them up or down, and
//                     hold the last one through the rest of the fragment.

use crate::melody::{Melody, PAUSE, SUSTAIN, is_pitch};
use genetic_composer_prng::ComposerRng;

/// Largest shift applied by the interval and transpose mutations.
const MAX_SHIFT: i32 = 12;

/// Pick `k` members uniformly with replacement and return the fittest.
///
/// Ties keep the earliest draw. `k == 0` behaves like `k == 1`. Returns
/// `None` only for an empty population.
pub fn tournament_selection<'a>(
    population: &'a [Melody],
    scores: &[f64],
    k: usize,
    rng: &mut ComposerRng,
) -> Option<&'a Melody> {
    if population.is_empty() {
        return None;
    }
    let mut best = rng.range_usize(0, population.len());
    for _ in 1..k {
        let candidate = rng.range_usize(0, population.len());
        if scores[candidate] > scores[best] {
            best = candidate;
        }
    }
    Some(&population[best])
}

/// One-point crossover at a cut in `[1, len - 2]`.
///
/// Parents of different lengths, or shorter than three slots, are returned
/// unchanged.
pub fn crossover(a: &Melody, b: &Melody, rng: &mut ComposerRng) -> (Melody, Melody) {
    let len = a.len();
    if len != b.len() || len < 3 {
        return (a.clone(), b.clone());
    }
    let cut = rng.range_usize_inclusive(1, len - 2);
    let first = a[..cut].iter().chain(&b[cut..]).copied().collect();
    let second = b[..cut].iter().chain(&a[cut..]).copied().collect();
    (Melody::new(first), Melody::new(second))
}

/// The seven mutation operators, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Interval,
    Transpose,
    Extend,
    ToggleRest,
    HoldRun,
    FitLength,
    Sort,
}

impl Mutation {
    pub const ALL: [Mutation; 7] = [
        Mutation::Interval,
        Mutation::Transpose,
        Mutation::Extend,
        Mutation::ToggleRest,
        Mutation::HoldRun,
        Mutation::FitLength,
        Mutation::Sort,
    ];
}

/// What the mutation operators need to know about the musical frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationParams {
    /// Allowed pitches, used for rests turned into notes.
    pub vocabulary: Vec<i32>,
    pub low: i32,
    pub high: i32,
    /// Fragments span at most two beats.
    pub beat_length: usize,
    /// Target slots per note for the fit-length mutation.
    pub expected_length: usize,
    /// Independent firing probability of each operator.
    pub rate: f64,
}

impl MutationParams {
    fn max_fragment(&self) -> usize {
        (self.beat_length * 2).max(1)
    }
}

/// Apply each operator with probability `params.rate`, then clamp pitches.
pub fn mutate(melody: &mut Melody, params: &MutationParams, rng: &mut ComposerRng) {
    for mutation in Mutation::ALL {
        if rng.random_bool(params.rate) {
            tracing::trace!(?mutation, "applying mutation");
            apply_mutation(mutation, melody, params, rng);
        }
    }
    melody.clamp_pitches(params.low, params.high);
}

/// Apply a single operator unconditionally.
pub fn apply_mutation(
    mutation: Mutation,
    melody: &mut [i32],
    params: &MutationParams,
    rng: &mut ComposerRng,
) {
    match mutation {
        Mutation::Interval => interval(melody, params, rng),
        Mutation::Transpose => transpose(melody, params, rng),
        Mutation::Extend => extend(melody, rng),
        Mutation::ToggleRest => toggle_rest(melody, params, rng),
        Mutation::HoldRun => hold_run(melody, params, rng),
        Mutation::FitLength => fit_length(melody, params, rng),
        Mutation::Sort => sort_fragment(melody, params, rng),
    }
}

fn positions(melody: &[i32], keep: impl Fn(usize, i32) -> bool) -> Vec<usize> {
    melody
        .iter()
        .enumerate()
        .filter(|&(i, &c)| keep(i, c))
        .map(|(i, _)| i)
        .collect()
}

/// Random fragment `[start, end)` of at most two beats.
fn fragment(len: usize, params: &MutationParams, rng: &mut ComposerRng) -> (usize, usize) {
    let start = rng.range_usize(0, len);
    let max_len = params.max_fragment().min(len - start);
    let length = rng.range_usize_inclusive(1, max_len);
    (start, start + length)
}

fn interval(melody: &mut [i32], params: &MutationParams, rng: &mut ComposerRng) {
    let len = melody.len();
    if len < 2 {
        return;
    }
    let notes = positions(melody, |_, c| is_pitch(c));
    let Some(&source) = rng.choose(&notes) else {
        return;
    };
    let mut target = rng.range_usize(0, len - 1);
    if target >= source {
        target += 1;
    }
    let shift = rng.range_i32_inclusive(-MAX_SHIFT, MAX_SHIFT);
    melody[target] = (melody[source] + shift).clamp(params.low, params.high);
}

fn transpose(melody: &mut [i32], params: &MutationParams, rng: &mut ComposerRng) {
    if melody.is_empty() {
        return;
    }
    let (start, end) = fragment(melody.len(), params, rng);
    let shift = rng.range_i32_inclusive(-MAX_SHIFT, MAX_SHIFT);
    shift_span(&mut melody[start..end], shift, params.low, params.high);
}

/// Move every pitch of `span` by `shift`, clamped. Rests and sustains stay.
fn shift_span(span: &mut [i32], shift: i32, low: i32, high: i32) {
    for code in span.iter_mut().filter(|c| is_pitch(**c)) {
        *code = (*code + shift).clamp(low, high);
    }
}

fn extend(melody: &mut [i32], rng: &mut ComposerRng) {
    let notes = positions(melody, |i, c| i >= 1 && is_pitch(c));
    if let Some(&i) = rng.choose(&notes) {
        melody[i] = SUSTAIN;
    }
}

fn toggle_rest(melody: &mut [i32], params: &MutationParams, rng: &mut ComposerRng) {
    if melody.is_empty() {
        return;
    }
    let i = rng.range_usize(0, melody.len());
    if melody[i] == PAUSE {
        if let Some(&pitch) = rng.choose(&params.vocabulary) {
            melody[i] = pitch;
        }
    } else {
        melody[i] = PAUSE;
    }
}

fn hold_run(melody: &mut [i32], params: &MutationParams, rng: &mut ComposerRng) {
    let starts = positions(melody, |i, c| i >= 1 && c != SUSTAIN);
    let Some(&start) = rng.choose(&starts) else {
        return;
    };
    let max_len = params.max_fragment().min(melody.len() - start);
    let length = rng.range_usize_inclusive(1, max_len);
    melody[start..start + length].fill(SUSTAIN);
}

fn fit_length(melody: &mut [i32], params: &MutationParams, rng: &mut ComposerRng) {
    let len = melody.len();
    let heads = positions(melody, |_, c| c != SUSTAIN);
    let Some(&head) = rng.choose(&heads) else {
        return;
    };
    if head + 1 >= len {
        return;
    }
    let held = melody[head + 1..]
        .iter()
        .take_while(|&&c| c == SUSTAIN)
        .count();
    let expected = params.expected_length;

    if held + 1 > expected {
        if held == 0 {
            return;
        }
        // Too long: restart the note somewhere inside its run.
        let split = rng.range_usize_inclusive(head + 1, head + held);
        melody[split] = melody[head];
    } else if held + 1 < expected && head + 1 + held < len {
        let from = head + 1 + held;
        let max_add = (expected - held - 1).min(len - from);
        let add = rng.range_usize_inclusive(1, max_add);
        melody[from..from + add].fill(SUSTAIN);
    }
}

fn sort_fragment(melody: &mut [i32], params: &MutationParams, rng: &mut ComposerRng) {
    if melody.is_empty() {
        return;
    }
    let (start, end) = fragment(melody.len(), params, rng);
    let notes = melody[start..end].iter().filter(|&&c| is_pitch(c)).count();
    if notes < 2 {
        return;
    }
    let ascending = rng.random_bool(0.5);
    sort_span(&mut melody[start..end], ascending);
}

/// Sort the pitches of `span` into its leading slots and hold the last one
/// through the remaining slots, whatever they held before.
fn sort_span(span: &mut [i32], ascending: bool) {
    let mut notes: Vec<i32> = span.iter().copied().filter(|&c| is_pitch(c)).collect();
    if notes.len() < 2 {
        return;
    }
    if ascending {
        notes.sort_unstable();
    } else {
        notes.sort_unstable_by(|a, b| b.cmp(a));
    }
    span[..notes.len()].copy_from_slice(&notes);
    span[notes.len()..].fill(SUSTAIN);
}
