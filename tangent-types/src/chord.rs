//! Chord identification from sounding pitches.
//!
//! Every template whose interval set (rooted at any pitch class) is a subset
//! of the sounding pitch classes is reported. Multiple matches are expected:
//! a held diminished-seventh tetrad names the dim triad and dim-7 chord at
//! all four roots.

use std::sync::OnceLock;

pub const NOTE_NAMES_SHARP: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
pub const NOTE_NAMES_FLAT: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];
pub const NOTE_NAMES_SHARP_UNICODE: [&str; 12] = [
    "C", "C♯", "D", "D♯", "E", "F", "F♯", "G", "G♯", "A", "A♯", "B",
];
pub const NOTE_NAMES_FLAT_UNICODE: [&str; 12] = [
    "C", "D♭", "D", "E♭", "E", "F", "G♭", "G", "A♭", "A", "B♭", "B",
];

/// ASCII sharp spelling of a pitch class.
pub fn note_name(note: u8) -> &'static str {
    NOTE_NAMES_SHARP[(note % 12) as usize]
}

/// A chord quality: ordered semitone offsets from the root.
#[derive(Debug, PartialEq, Eq)]
pub struct ChordTemplate {
    pub short_name: &'static str,
    pub full_name: &'static str,
    pub intervals: &'static [u8],
}

pub static CHORD_TEMPLATES: [ChordTemplate; 16] = [
    ChordTemplate { short_name: "", full_name: "maj", intervals: &[0, 4, 7] },
    ChordTemplate { short_name: "m", full_name: "min", intervals: &[0, 3, 7] },
    ChordTemplate { short_name: "+", full_name: "aug", intervals: &[0, 4, 8] },
    ChordTemplate { short_name: "°", full_name: "dim", intervals: &[0, 3, 6] },
    ChordTemplate { short_name: "6", full_name: "maj6", intervals: &[0, 4, 7, 9] },
    ChordTemplate { short_name: "m6", full_name: "min6", intervals: &[0, 3, 7, 9] },
    ChordTemplate { short_name: "°7", full_name: "dim7", intervals: &[0, 3, 6, 9] },
    ChordTemplate { short_name: "ø7", full_name: "min7dim5", intervals: &[0, 3, 6, 10] },
    ChordTemplate { short_name: "mM7", full_name: "minmaj7", intervals: &[0, 3, 7, 11] },
    ChordTemplate { short_name: "+7", full_name: "aug7", intervals: &[0, 4, 8, 10] },
    ChordTemplate { short_name: "7", full_name: "7", intervals: &[0, 4, 7, 10] },
    ChordTemplate { short_name: "M7", full_name: "maj7", intervals: &[0, 4, 7, 11] },
    ChordTemplate { short_name: "+M7", full_name: "augmaj7", intervals: &[0, 4, 8, 11] },
    ChordTemplate { short_name: "7b5", full_name: "7dim5", intervals: &[0, 4, 6, 10] },
    ChordTemplate { short_name: "add9", full_name: "add9", intervals: &[0, 2, 4, 7] },
    ChordTemplate { short_name: "madd9", full_name: "minadd9", intervals: &[0, 2, 3, 7] },
];

/// One named chord: a template anchored at a root pitch class.
#[derive(Debug)]
pub struct Chord {
    pub name: String,
    pub root: u8,
    pub template: &'static ChordTemplate,
}

/// The process-wide chord table, root 0..=11 for every template. Built once,
/// read-only afterwards.
pub fn chord_table() -> &'static [Chord] {
    static TABLE: OnceLock<Vec<Chord>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = Vec::with_capacity(12 * CHORD_TEMPLATES.len());
        for root in 0u8..12 {
            for template in &CHORD_TEMPLATES {
                table.push(Chord {
                    name: format!("{}{}", NOTE_NAMES_SHARP[root as usize], template.short_name),
                    root,
                    template,
                });
            }
        }
        table
    })
}

/// Fold sounding notes into a 12-slot pitch-class presence vector.
pub fn pitch_classes(pitches: &[u8]) -> [bool; 12] {
    let mut present = [false; 12];
    for &p in pitches {
        present[(p % 12) as usize] = true;
    }
    present
}

/// Lowest sounding note. Informational, not used for matching.
pub fn lowest_pitch(pitches: &[u8]) -> Option<u8> {
    pitches.iter().copied().min()
}

/// All chords whose template is a subset of the sounding pitch classes.
pub fn match_chords(pitches: &[u8]) -> Vec<&'static Chord> {
    if pitches.is_empty() {
        return Vec::new();
    }
    let present = pitch_classes(pitches);
    chord_table()
        .iter()
        .filter(|chord| {
            chord
                .template
                .intervals
                .iter()
                .all(|&interval| present[((chord.root + interval) % 12) as usize])
        })
        .collect()
}

/// Matching chord names joined for display. Empty string when nothing
/// matches.
pub fn display_names(matches: &[&'static Chord]) -> String {
    let names: Vec<&str> = matches.iter().map(|c| c.name.as_str()).collect();
    names.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(pitches: &[u8]) -> Vec<String> {
        match_chords(pitches).iter().map(|c| c.name.clone()).collect()
    }

    #[test]
    fn c_major_triad() {
        // C4 E4 G4
        let found = names(&[60, 64, 67]);
        assert_eq!(found, vec!["C"]);
    }

    #[test]
    fn inversion_still_matches() {
        // E G C — first inversion of C major
        assert_eq!(names(&[64, 67, 72]), vec!["C"]);
    }

    #[test]
    fn a_minor_triad() {
        assert_eq!(names(&[69, 72, 76]), vec!["Am"]);
    }

    #[test]
    fn dominant_seventh_includes_triad() {
        // C E G Bb matches both the major triad and the dominant 7th at C.
        let found = names(&[60, 64, 67, 70]);
        assert!(found.contains(&"C".to_string()));
        assert!(found.contains(&"C7".to_string()));
    }

    #[test]
    fn diminished_seventh_matches_all_four_roots() {
        // C D# F# A — fully symmetric pitch-class set {0, 3, 6, 9}
        let found = names(&[60, 63, 66, 69]);
        for name in ["C°7", "D#°7", "F#°7", "A°7"] {
            assert!(found.contains(&name.to_string()), "missing {}", name);
        }
        for name in ["C°", "D#°", "F#°", "A°"] {
            assert!(found.contains(&name.to_string()), "missing {}", name);
        }
    }

    #[test]
    fn empty_and_unrecognized_yield_nothing() {
        assert!(match_chords(&[]).is_empty());
        // A bare semitone cluster matches no template.
        assert!(match_chords(&[60, 61]).is_empty());
    }

    #[test]
    fn duplicate_octaves_fold_to_one_pitch_class() {
        assert_eq!(names(&[60, 64, 67, 72, 76]), vec!["C"]);
    }

    #[test]
    fn table_is_complete_and_stable() {
        let table = chord_table();
        assert_eq!(table.len(), 12 * CHORD_TEMPLATES.len());
        assert!(std::ptr::eq(table, chord_table()));
    }

    #[test]
    fn lowest_pitch_tracked() {
        assert_eq!(lowest_pitch(&[64, 60, 67]), Some(60));
        assert_eq!(lowest_pitch(&[]), None);
    }

    #[test]
    fn display_joins_names() {
        let matches = match_chords(&[60, 64, 67]);
        assert_eq!(display_names(&matches), "C");
        assert_eq!(display_names(&[]), "");
    }

    #[test]
    fn note_names() {
        assert_eq!(note_name(60), "C");
        assert_eq!(note_name(61), "C#");
        assert_eq!(note_name(70), "A#");
        assert_eq!(NOTE_NAMES_FLAT[10], "Bb");
        assert_eq!(NOTE_NAMES_SHARP_UNICODE[1], "C♯");
        assert_eq!(NOTE_NAMES_FLAT_UNICODE[1], "D♭");
    }
}
