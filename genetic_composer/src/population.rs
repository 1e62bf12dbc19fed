// Initial population.
//
// Each starting melody is a bounded random walk: the first pitch is drawn
// uniformly from the vocabulary, and each following pitch moves by a uniform
// step in [-12, 12] semitones, clamped into the note range. Starting melodies
// hold no pauses or sustains; rhythm emerges only through mutation.

use crate::melody::Melody;
use genetic_composer_prng::ComposerRng;

/// Largest step of the initial random walk, in semitones.
pub const MAX_STEP: i32 = 12;

/// One random-walk melody of `length` slots over `vocabulary`.
///
/// The walk is clamped to the vocabulary's lowest and highest pitch. An empty
/// vocabulary or zero length yields an empty melody.
pub fn random_walk_melody(vocabulary: &[i32], length: usize, rng: &mut ComposerRng) -> Melody {
    let (Some(&low), Some(&high)) = (vocabulary.iter().min(), vocabulary.iter().max()) else {
        return Melody::new(Vec::new());
    };
    let mut events = Vec::with_capacity(length);
    if length == 0 {
        return Melody::new(events);
    }
    let mut pitch = *rng.choose(vocabulary).unwrap_or(&low);
    events.push(pitch);
    for _ in 1..length {
        pitch = (pitch + rng.range_i32_inclusive(-MAX_STEP, MAX_STEP)).clamp(low, high);
        events.push(pitch);
    }
    Melody::new(events)
}

/// `size` random-walk melodies of `length` slots.
pub fn generate_population(
    vocabulary: &[i32],
    length: usize,
    size: usize,
    rng: &mut ComposerRng,
) -> Vec<Melody> {
    (0..size)
        .map(|_| random_walk_melody(vocabulary, length, rng))
        .collect()
}
