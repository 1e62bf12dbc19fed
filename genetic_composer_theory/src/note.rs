// Note names and chromatic pitch ranges.
//
// Note numbers follow the convention C-0 = 0, C-1 = 12, so "A-3" is 45 and
// "C-5" is 60. Both "A-3" and "A3" spellings are accepted, with an optional
// '#' or 'b' accidental after the letter.

use crate::error::{Result, TheoryError};

/// Pitch class of a bare note name such as "C", "F#" or "Bb".
pub fn parse_pitch_class(name: &str) -> Option<u8> {
    let mut chars = name.chars();
    let base: i32 = match chars.next()? {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let shift = match chars.next() {
        None => 0,
        Some('#') => 1,
        Some('b') => -1,
        Some(_) => return None,
    };
    if chars.next().is_some() {
        return None;
    }
    Some((base + shift).rem_euclid(12) as u8)
}

/// Parse a note name with octave ("A-3", "C#4", "Bb-2") into a note number.
pub fn parse_note_name(name: &str) -> Result<i32> {
    let invalid = || TheoryError::InvalidNoteName(name.to_string());
    let trimmed = name.trim();
    let split = trimmed
        .find(|c: char| c == '-' || c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let pc = parse_pitch_class(&trimmed[..split]).ok_or_else(invalid)?;
    let octave_text = trimmed[split..].strip_prefix('-').unwrap_or(&trimmed[split..]);
    if octave_text.is_empty() || !octave_text.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let octave: i32 = octave_text.parse().map_err(|_| invalid())?;
    Ok(octave * 12 + pc as i32)
}

/// Display name of a pitch class, flats for black keys except F#.
pub fn pitch_name(pitch: i32) -> &'static str {
    match pitch.rem_euclid(12) {
        0 => "C",
        1 => "C#",
        2 => "D",
        3 => "Eb",
        4 => "E",
        5 => "F",
        6 => "F#",
        7 => "G",
        8 => "Ab",
        9 => "A",
        10 => "Bb",
        _ => "B",
    }
}

/// A note range must be non-empty and hold only non-negative pitches, since
/// negative slot codes mean pause and sustain.
pub fn check_note_range(low: i32, high: i32) -> Result<()> {
    if low < 0 || low > high {
        return Err(TheoryError::InvalidNoteRange { low, high });
    }
    Ok(())
}

/// Every pitch from `low` to `high` inclusive.
pub fn pitch_range(low: i32, high: i32) -> Result<Vec<i32>> {
    check_note_range(low, high)?;
    Ok((low..=high).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_names_with_and_without_dash() {
        assert_eq!(parse_note_name("C-0").unwrap(), 0);
        assert_eq!(parse_note_name("C-1").unwrap(), 12);
        assert_eq!(parse_note_name("A-3").unwrap(), 45);
        assert_eq!(parse_note_name("C5").unwrap(), 60);
        assert_eq!(parse_note_name("F#4").unwrap(), 54);
        assert_eq!(parse_note_name("Bb-2").unwrap(), 34);
    }

    #[test]
    fn bad_note_names_are_rejected() {
        for bad in ["", "H-3", "A", "A-", "A-x", "Cbb4", "-3"] {
            assert!(
                matches!(parse_note_name(bad), Err(TheoryError::InvalidNoteName(_))),
                "expected '{bad}' to be rejected"
            );
        }
    }

    #[test]
    fn flat_below_c_wraps() {
        assert_eq!(parse_pitch_class("Cb"), Some(11));
        assert_eq!(parse_pitch_class("E#"), Some(5));
    }

    #[test]
    fn chromatic_range_is_inclusive() {
        let notes = pitch_range(60, 72).unwrap();
        assert_eq!(notes.len(), 13);
        assert_eq!(notes.first(), Some(&60));
        assert_eq!(notes.last(), Some(&72));
        assert_eq!(pitch_range(64, 64).unwrap(), vec![64]);
    }

    #[test]
    fn inverted_range_fails() {
        assert_eq!(
            pitch_range(72, 60),
            Err(TheoryError::InvalidNoteRange { low: 72, high: 60 })
        );
    }

    #[test]
    fn negative_range_fails() {
        assert_eq!(
            pitch_range(-12, 0),
            Err(TheoryError::InvalidNoteRange { low: -12, high: 0 })
        );
        assert_eq!(
            check_note_range(-1, -1),
            Err(TheoryError::InvalidNoteRange { low: -1, high: -1 })
        );
        assert_eq!(pitch_range(0, 0), Ok(vec![0]));
    }

    #[test]
    fn names_for_pitches() {
        assert_eq!(pitch_name(60), "C");
        assert_eq!(pitch_name(70), "Bb");
        assert_eq!(pitch_name(66), "F#");
    }
}
