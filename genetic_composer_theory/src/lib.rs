// Pitch vocabulary for the genetic melody composer.
//
// Resolves a scale specification such as "C Major" or "Bb Harmonic Minor"
// into the pitch classes that count as in-scale, parses note names such as
// "A-3" into MIDI numbers, and enumerates the chromatic pitch range a melody
// may use. The evolutionary core only ever sees the results: a pitch-class
// set, a root pitch class, and a list of absolute pitches.
//
// - scale.rs: closed `ScaleKind` enum, degree tables, scale-spec parsing
// - note.rs: note-name parsing and chromatic range enumeration
// - error.rs: `TheoryError`

pub mod error;
pub mod note;
pub mod scale;

pub use error::{Result, TheoryError};
pub use note::{check_note_range, parse_note_name, pitch_name, pitch_range};
pub use scale::{ScaleKind, ScaleSpec, ascending_degrees};
