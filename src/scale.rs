// syntxt-midi -- compiling plain-text note sketches into MIDI
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Detecting the scale (root and mode) and mood of a set of pitch classes.
//!
//! Every combination of the 12 possible roots and the 7 diatonic modes is
//! tried, and the one containing the most of the sounded pitch classes wins.

use std::fmt;

use snafu::Snafu;

use crate::note::PitchClass;

/// The seven diatonic modes, in the order of preference used to break ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// C D E F G A B
    Major,
    /// A B C D E F G
    NaturalMinor,
    /// Natural minor with a raised 6th.
    Dorian,
    /// Natural minor with a lowered 2nd.
    Phrygian,
    /// Major with a raised 4th.
    Lydian,
    /// Major with a lowered 7th.
    Mixolydian,
    /// Lowered 2nd and 5th, the least stable mode.
    Locrian,
}

impl Mode {
    /// All modes, most preferred first.
    pub const ALL: [Mode; 7] = [
        Mode::Major,
        Mode::NaturalMinor,
        Mode::Dorian,
        Mode::Phrygian,
        Mode::Lydian,
        Mode::Mixolydian,
        Mode::Locrian,
    ];

    /// Semitone intervals from the root to each scale degree.
    pub fn intervals(self) -> [u8; 7] {
        match self {
            Mode::Major => [0, 2, 4, 5, 7, 9, 11],
            Mode::NaturalMinor => [0, 2, 3, 5, 7, 8, 10],
            Mode::Dorian => [0, 2, 3, 5, 7, 9, 10],
            Mode::Phrygian => [0, 1, 3, 5, 7, 8, 10],
            Mode::Lydian => [0, 2, 4, 6, 7, 9, 11],
            Mode::Mixolydian => [0, 2, 4, 5, 7, 9, 10],
            Mode::Locrian => [0, 1, 3, 5, 6, 8, 10],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Major => "major",
            Mode::NaturalMinor => "natural minor",
            Mode::Dorian => "dorian",
            Mode::Phrygian => "phrygian",
            Mode::Lydian => "lydian",
            Mode::Mixolydian => "mixolydian",
            Mode::Locrian => "locrian",
        }
    }

    /// The mood associated with music in this mode, regardless of its root.
    pub fn mood(self) -> &'static str {
        match self {
            Mode::Major => "bright/uplifting",
            Mode::NaturalMinor => "dark/melancholic",
            Mode::Dorian => "moody/cinematic",
            Mode::Phrygian => "tense/exotic",
            Mode::Lydian => "dreamy/ethereal",
            Mode::Mixolydian => "bluesy/groovy",
            Mode::Locrian => "unstable/dissonant",
        }
    }

    /// The pitch classes of this mode when starting at `root`.
    fn pitch_classes(self, root: PitchClass) -> PitchClassSet {
        self.intervals()
            .iter()
            .map(|&interval| root.transpose(interval))
            .collect()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of pitch classes, duplicates collapse and order is irrelevant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PitchClassSet(u16);

impl PitchClassSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pc: PitchClass) {
        self.0 |= 1 << pc.index();
    }

    pub fn contains(self, pc: PitchClass) -> bool {
        self.0 & (1 << pc.index()) != 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn union(self, other: PitchClassSet) -> PitchClassSet {
        PitchClassSet(self.0 | other.0)
    }

    /// Number of pitch classes contained in both sets.
    pub fn overlap(self, other: PitchClassSet) -> usize {
        (self.0 & other.0).count_ones() as usize
    }

    /// The contained pitch classes in ascending order.
    pub fn iter(self) -> impl Iterator<Item = PitchClass> {
        PitchClass::all().filter(move |&pc| self.contains(pc))
    }
}

impl std::iter::FromIterator<PitchClass> for PitchClassSet {
    fn from_iter<I: IntoIterator<Item = PitchClass>>(iter: I) -> Self {
        let mut set = PitchClassSet::new();
        for pc in iter {
            set.insert(pc);
        }
        set
    }
}

/// The best matching scale for a set of pitch classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleMatch {
    pub root: PitchClass,
    pub mode: Mode,
    /// How many of the input pitch classes belong to the scale.
    pub matched: usize,
    /// Number of pitch classes in the scale.
    pub template_size: usize,
}

impl ScaleMatch {
    pub fn mood(&self) -> &'static str {
        self.mode.mood()
    }
}

/// Renders as e.g. `D dorian`.
impl fmt::Display for ScaleMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.root, self.mode)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum DetectError {
    #[snafu(display(
        "need at least {} distinct pitch classes to detect a scale, got {}",
        MIN_PITCH_CLASSES,
        found
    ))]
    InsufficientPitchVariety { found: usize },
}

/// Fewer distinct pitch classes than this do not say anything about a scale.
pub const MIN_PITCH_CLASSES: usize = 2;

/// Find the scale containing most of the given pitch classes.
///
/// Ties are broken in favor of the mode that comes first in [`Mode::ALL`],
/// and then in favor of the lowest root.
pub fn detect(pitch_classes: PitchClassSet) -> Result<ScaleMatch, DetectError> {
    if pitch_classes.len() < MIN_PITCH_CLASSES {
        return Err(DetectError::InsufficientPitchVariety {
            found: pitch_classes.len(),
        });
    }

    let score = |mode: Mode, root: PitchClass| ScaleMatch {
        root,
        mode,
        matched: pitch_classes.overlap(mode.pitch_classes(root)),
        template_size: mode.intervals().len(),
    };

    let mut best = score(Mode::ALL[0], PitchClass::new(0));
    for &mode in Mode::ALL.iter() {
        for root in PitchClass::all() {
            let candidate = score(mode, root);
            // strictly greater, so earlier modes and lower roots win ties
            if candidate.matched > best.matched {
                best = candidate;
            }
        }
    }
    Ok(best)
}

#[cfg(test)]
mod test {
    use super::*;

    fn set(pcs: &[u8]) -> PitchClassSet {
        pcs.iter().map(|&pc| PitchClass::new(pc)).collect()
    }

    #[test]
    fn c_major_beats_its_relative_modes() {
        let result = detect(set(&[0, 2, 4, 5, 7, 9, 11])).unwrap();
        assert_eq!(result.root, PitchClass::new(0));
        assert_eq!(result.mode, Mode::Major);
        assert_eq!(result.matched, 7);
        assert_eq!(result.template_size, 7);
        assert_eq!(result.mood(), "bright/uplifting");
        assert_eq!(result.to_string(), "C major");
    }

    #[test]
    fn harmonic_minor_falls_back_to_closest_major() {
        // A harmonic minor: no diatonic scale contains the raised 7th together with the rest
        let result = detect(set(&[9, 11, 0, 2, 4, 5, 8])).unwrap();
        assert_eq!(result.matched, 6);
        // C major also matches 6 of 7 and comes first in preference order
        assert_eq!((result.root, result.mode), (PitchClass::new(0), Mode::Major));
    }

    #[test]
    fn order_does_not_matter() {
        let a = detect(set(&[2, 6, 9, 1, 4, 7, 11])).unwrap();
        let b = detect(set(&[11, 7, 4, 1, 9, 6, 2, 2, 2])).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "D major");
    }

    #[test]
    fn lowest_root_wins_within_a_mode() {
        // {C, G} fits C major, F major and G major fully; C is lowest
        let result = detect(set(&[0, 7])).unwrap();
        assert_eq!((result.root, result.mode), (PitchClass::new(0), Mode::Major));
        assert_eq!(result.matched, 2);
    }

    #[test]
    fn major_preferred_over_equal_modes() {
        // E F G A Bb C D is both F major and E locrian
        let result = detect(set(&[4, 5, 7, 9, 10, 0, 2])).unwrap();
        assert_eq!(result.to_string(), "F major");
        // C D E F# is both G major and C lydian
        let result = detect(set(&[0, 2, 4, 6])).unwrap();
        assert_eq!(result.matched, 4);
        assert_eq!(result.to_string(), "G major");
    }

    #[test]
    fn one_mood_per_mode() {
        let moods: Vec<&str> = Mode::ALL.iter().map(|mode| mode.mood()).collect();
        assert_eq!(
            moods,
            vec![
                "bright/uplifting",
                "dark/melancholic",
                "moody/cinematic",
                "tense/exotic",
                "dreamy/ethereal",
                "bluesy/groovy",
                "unstable/dissonant",
            ]
        );
        let a = ScaleMatch {
            root: PitchClass::new(2),
            mode: Mode::Dorian,
            matched: 7,
            template_size: 7,
        };
        let b = ScaleMatch {
            root: PitchClass::new(7),
            ..a
        };
        assert_eq!(a.mood(), b.mood());
    }

    #[test]
    fn templates_are_rotations_of_major() {
        let major = Mode::Major.pitch_classes(PitchClass::new(0));
        let finals = [
            (Mode::NaturalMinor, 9),
            (Mode::Dorian, 2),
            (Mode::Phrygian, 4),
            (Mode::Lydian, 5),
            (Mode::Mixolydian, 7),
            (Mode::Locrian, 11),
        ];
        for &(mode, root) in finals.iter() {
            assert_eq!(mode.pitch_classes(PitchClass::new(root)), major, "{}", mode);
        }
    }

    #[test]
    fn too_few_pitch_classes() {
        assert_eq!(
            detect(set(&[])),
            Err(DetectError::InsufficientPitchVariety { found: 0 })
        );
        assert_eq!(
            detect(set(&[4, 4, 4])),
            Err(DetectError::InsufficientPitchVariety { found: 1 })
        );
    }

    #[test]
    fn set_operations() {
        let a = set(&[0, 4, 7]);
        let b = set(&[7, 11, 2]);
        assert_eq!(a.union(b).len(), 5);
        assert_eq!(a.overlap(b), 1);
        let sorted: Vec<u8> = set(&[11, 0, 5]).iter().map(PitchClass::index).collect();
        assert_eq!(sorted, vec![0, 5, 11]);
        assert!(PitchClassSet::new().is_empty());
    }
}
