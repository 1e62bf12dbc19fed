// Scale kinds and scale-spec resolution.
//
// Every supported scale is a variant of the closed `ScaleKind` enum with a
// fixed table of semitone offsets from the tonic. `ScaleSpec::parse` turns a
// human-readable spec ("C Major", "F# Dorian", "A Minor") into a tonic pitch
// class plus a kind. Type names are matched exactly first (ignoring case);
// failing that, the first kind, in alphabetical order of its name, whose name
// contains any word of the requested type wins, so "A Minor" resolves to
// Harmonic Minor. Nothing matching is an error rather than a silent
// chromatic fallback.
//
// Used by the composer's fitness evaluator (scale and root conformance) and
// by its configuration validation.

use crate::error::{Result, TheoryError};
use crate::note::parse_pitch_class;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleKind {
    Major,
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
    NaturalMinor,
    HarmonicMinor,
    MelodicMinor,
    HarmonicMajor,
    Chromatic,
    WholeTone,
    Octatonic,
}

/// Lookup table from display name to kind, alphabetical by name. The order
/// decides which kind wins a fuzzy word match.
const NAMED_KINDS: [(&str, ScaleKind); 15] = [
    ("Aeolian", ScaleKind::Aeolian),
    ("Chromatic", ScaleKind::Chromatic),
    ("Dorian", ScaleKind::Dorian),
    ("Harmonic Major", ScaleKind::HarmonicMajor),
    ("Harmonic Minor", ScaleKind::HarmonicMinor),
    ("Ionian", ScaleKind::Ionian),
    ("Locrian", ScaleKind::Locrian),
    ("Lydian", ScaleKind::Lydian),
    ("Major", ScaleKind::Major),
    ("Melodic Minor", ScaleKind::MelodicMinor),
    ("Mixolydian", ScaleKind::Mixolydian),
    ("Natural Minor", ScaleKind::NaturalMinor),
    ("Octatonic", ScaleKind::Octatonic),
    ("Phrygian", ScaleKind::Phrygian),
    ("Whole Tone", ScaleKind::WholeTone),
];

impl ScaleKind {
    /// Semitone offsets from the tonic for one ascending octave.
    pub fn offsets(self) -> &'static [u8] {
        match self {
            ScaleKind::Major | ScaleKind::Ionian => &[0, 2, 4, 5, 7, 9, 11],
            ScaleKind::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            ScaleKind::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            ScaleKind::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            ScaleKind::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            ScaleKind::Aeolian | ScaleKind::NaturalMinor => &[0, 2, 3, 5, 7, 8, 10],
            ScaleKind::Locrian => &[0, 1, 3, 5, 6, 8, 10],
            ScaleKind::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            // Ascending form only.
            ScaleKind::MelodicMinor => &[0, 2, 3, 5, 7, 9, 11],
            ScaleKind::HarmonicMajor => &[0, 2, 4, 5, 7, 8, 11],
            ScaleKind::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            ScaleKind::WholeTone => &[0, 2, 4, 6, 8, 10],
            ScaleKind::Octatonic => &[0, 2, 3, 5, 6, 8, 9, 11],
        }
    }

    /// Resolve a scale-type name, exact match first, then by word.
    pub fn from_name(name: &str) -> Option<ScaleKind> {
        let wanted = name.trim();
        if let Some(&(_, kind)) = NAMED_KINDS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(wanted))
        {
            return Some(kind);
        }
        for word in wanted.split_whitespace() {
            let word = word.to_ascii_lowercase();
            for &(n, kind) in &NAMED_KINDS {
                if n.to_ascii_lowercase().contains(&word) {
                    return Some(kind);
                }
            }
        }
        None
    }
}

/// Pitch classes of one ascending octave of `kind` starting on `tonic_pc`.
pub fn ascending_degrees(kind: ScaleKind, tonic_pc: u8) -> Vec<u8> {
    kind.offsets()
        .iter()
        .map(|&offset| (tonic_pc % 12 + offset) % 12)
        .collect()
}

/// A resolved scale: tonic pitch class plus kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleSpec {
    pub tonic_pc: u8,
    pub kind: ScaleKind,
}

impl ScaleSpec {
    pub fn new(tonic_pc: u8, kind: ScaleKind) -> Self {
        ScaleSpec {
            tonic_pc: tonic_pc % 12,
            kind,
        }
    }

    /// Parse "<tonic> <type>", e.g. "C Major", "Bb Dorian", "F# Whole Tone".
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = || TheoryError::InvalidScale(spec.to_string());
        let trimmed = spec.trim();
        let mut chars = trimmed.char_indices();
        let (_, letter) = chars.next().ok_or_else(invalid)?;
        if !('A'..='G').contains(&letter) {
            return Err(invalid());
        }
        let tonic_end = match chars.next() {
            Some((i, '#')) | Some((i, 'b')) => i + 1,
            Some((i, _)) => i,
            None => trimmed.len(),
        };
        let tonic_pc = parse_pitch_class(&trimmed[..tonic_end]).ok_or_else(invalid)?;
        let kind = ScaleKind::from_name(&trimmed[tonic_end..]).ok_or_else(invalid)?;
        Ok(ScaleSpec::new(tonic_pc, kind))
    }

    pub fn degrees(&self) -> Vec<u8> {
        ascending_degrees(self.kind, self.tonic_pc)
    }

    /// The set of pitch classes (0-11) that count as in-scale.
    pub fn pitch_classes(&self) -> BTreeSet<u8> {
        self.degrees().into_iter().collect()
    }

    pub fn root_pc(&self) -> u8 {
        self.tonic_pc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_major_degrees() {
        assert_eq!(
            ascending_degrees(ScaleKind::Major, 0),
            vec![0, 2, 4, 5, 7, 9, 11]
        );
    }

    #[test]
    fn degrees_wrap_past_b() {
        // A Aeolian: A B C D E F G
        assert_eq!(
            ascending_degrees(ScaleKind::Aeolian, 9),
            vec![9, 11, 0, 2, 4, 5, 7]
        );
    }

    #[test]
    fn parse_exact_names() {
        let spec = ScaleSpec::parse("C Major").unwrap();
        assert_eq!(spec, ScaleSpec::new(0, ScaleKind::Major));

        let spec = ScaleSpec::parse("F# Dorian").unwrap();
        assert_eq!(spec, ScaleSpec::new(6, ScaleKind::Dorian));

        let spec = ScaleSpec::parse("Bb harmonic minor").unwrap();
        assert_eq!(spec, ScaleSpec::new(10, ScaleKind::HarmonicMinor));
    }

    #[test]
    fn parse_by_word_prefers_alphabetical_first() {
        let spec = ScaleSpec::parse("A Minor").unwrap();
        assert_eq!(spec.kind, ScaleKind::HarmonicMinor);
        assert_eq!(spec.root_pc(), 9);
    }

    #[test]
    fn parse_rejects_unknown_type_and_tonic() {
        assert!(matches!(
            ScaleSpec::parse("C Bebop"),
            Err(TheoryError::InvalidScale(_))
        ));
        assert!(matches!(
            ScaleSpec::parse("H Major"),
            Err(TheoryError::InvalidScale(_))
        ));
        assert!(matches!(ScaleSpec::parse(""), Err(TheoryError::InvalidScale(_))));
        assert!(matches!(ScaleSpec::parse("C"), Err(TheoryError::InvalidScale(_))));
    }

    #[test]
    fn pitch_class_membership() {
        let spec = ScaleSpec::parse("C Major").unwrap();
        let pcs = spec.pitch_classes();
        assert_eq!(pcs.len(), 7);
        assert!(pcs.contains(&0));
        assert!(pcs.contains(&11));
        assert!(!pcs.contains(&1));
    }

    #[test]
    fn every_kind_resolves_from_its_name() {
        for &(name, kind) in &NAMED_KINDS {
            assert_eq!(ScaleKind::from_name(name), Some(kind));
        }
        // Aliases share a table but keep their own name.
        assert_eq!(ScaleKind::Ionian.offsets(), ScaleKind::Major.offsets());
    }
}
