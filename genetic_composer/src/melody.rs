// The melody: the individual being evolved.
//
// A melody is a fixed-length row of integer-coded time slots. Each slot is
// one of:
// - a non-negative pitch (MIDI-style note number), which starts a new note;
// - `PAUSE` (-1), silence starting at this slot;
// - `SUSTAIN` (-2), continuation of whatever the previous slot started.
//
// The flat integer encoding is kept end to end because it is what the host
// sequencer consumes. `Event` is a typed view for code that wants to match on
// slot kinds instead of comparing against sentinels.
//
// Invariants maintained by the operators: a melody never starts with
// `SUSTAIN`, and every pitch lies inside the configured note range.

use genetic_composer_theory::pitch_name;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

/// Silence at this slot.
pub const PAUSE: i32 = -1;
/// The previous event continues through this slot.
pub const SUSTAIN: i32 = -2;

/// Whether a slot code is a sounding pitch.
pub fn is_pitch(code: i32) -> bool {
    code >= 0
}

/// Typed view of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Pitch(i32),
    Pause,
    Sustain,
}

impl Event {
    /// Decode a slot. Codes below -2 are not produced by any operator and are
    /// read as pauses.
    pub fn from_code(code: i32) -> Self {
        match code {
            SUSTAIN => Event::Sustain,
            c if c >= 0 => Event::Pitch(c),
            _ => Event::Pause,
        }
    }
}

/// One candidate melody.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Melody {
    events: Vec<i32>,
}

impl Melody {
    pub fn new(events: Vec<i32>) -> Self {
        Melody { events }
    }

    /// Clamp every pitch into `[low, high]`. Pauses and sustains are untouched.
    pub fn clamp_pitches(&mut self, low: i32, high: i32) {
        for code in self.events.iter_mut().filter(|c| is_pitch(**c)) {
            *code = (*code).clamp(low, high);
        }
    }

    /// Check the representation invariants against a note range.
    pub fn is_well_formed(&self, low: i32, high: i32) -> bool {
        if self.events.first() == Some(&SUSTAIN) {
            return false;
        }
        self.events.iter().all(|&c| match Event::from_code(c) {
            Event::Pitch(p) => (low..=high).contains(&p),
            Event::Pause => c == PAUSE,
            Event::Sustain => true,
        })
    }

    /// Compact text rendering for logs: note names with '-' for each
    /// sustained slot, '.' for pauses and '|' between groups of
    /// `slots_per_bar` slots.
    pub fn summary(&self, slots_per_bar: usize) -> String {
        let mut out = String::new();
        for (i, &code) in self.events.iter().enumerate() {
            if i > 0 && slots_per_bar > 0 && i % slots_per_bar == 0 {
                out.push('|');
            }
            match Event::from_code(code) {
                Event::Pitch(p) => {
                    if i > 0 && !out.ends_with('|') {
                        out.push(' ');
                    }
                    out.push_str(pitch_name(p));
                    out.push_str(&(p / 12).to_string());
                }
                Event::Pause => {
                    if i > 0 && !out.ends_with('|') {
                        out.push(' ');
                    }
                    out.push('.');
                }
                Event::Sustain => out.push('-'),
            }
        }
        out
    }
}

impl Deref for Melody {
    type Target = [i32];

    fn deref(&self) -> &[i32] {
        &self.events
    }
}

impl DerefMut for Melody {
    fn deref_mut(&mut self) -> &mut [i32] {
        &mut self.events
    }
}

impl From<Vec<i32>> for Melody {
    fn from(events: Vec<i32>) -> Self {
        Melody::new(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_codes_decode() {
        assert_eq!(Event::from_code(0), Event::Pitch(0));
        assert_eq!(Event::from_code(64), Event::Pitch(64));
        assert_eq!(Event::from_code(PAUSE), Event::Pause);
        assert_eq!(Event::from_code(SUSTAIN), Event::Sustain);
        assert_eq!(Event::from_code(-7), Event::Pause);
    }

    #[test]
    fn clamping_leaves_sentinels_alone() {
        let mut melody = Melody::new(vec![50, PAUSE, SUSTAIN, 90, 65]);
        melody.clamp_pitches(60, 72);
        assert_eq!(&melody[..], &[60, PAUSE, SUSTAIN, 72, 65][..]);
    }

    #[test]
    fn leading_sustain_is_malformed() {
        assert!(!Melody::new(vec![SUSTAIN, 60]).is_well_formed(60, 72));
        assert!(Melody::new(vec![PAUSE, SUSTAIN, 60]).is_well_formed(60, 72));
        assert!(!Melody::new(vec![60, 73]).is_well_formed(60, 72));
        assert!(!Melody::new(vec![60, -5]).is_well_formed(60, 72));
    }

    #[test]
    fn summary_marks_bars_holds_and_rests() {
        let melody = Melody::new(vec![60, SUSTAIN, PAUSE, 62, 64, SUSTAIN, SUSTAIN, PAUSE]);
        assert_eq!(melody.summary(4), "C5- . D5|E5-- .");
    }

    #[test]
    fn serializes_as_flat_array() {
        let melody = Melody::new(vec![60, SUSTAIN, PAUSE]);
        let json = serde_json::to_string(&melody).unwrap();
        assert_eq!(json, "[60,-2,-1]");
        let back: Melody = serde_json::from_str(&json).unwrap();
        assert_eq!(back, melody);
    }
}
