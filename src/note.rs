// syntxt-midi -- compiling plain-text note sketches into MIDI
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Definitions of what a note is, and how note names map to MIDI pitches.

use std::fmt;

use snafu::Snafu;

/// Spelling used when turning pitch classes back into names.
const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A "note" is just an index on the synthesizers keyboard.
/// This definition follows the MIDI standard where C4 corresponds to index 60.
///
/// Note indices range from 0 to 127.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Note(u8);

/// One of the twelve note identities within an octave, C = 0 up to B = 11.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PitchClass(u8);

/// The name of a note in standard notation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NoteName {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

/// Any offset applied to a note in standard notation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Accidental {
    /// The note is a half-tone lower then indicated by its name.
    Flat,
    /// The note is left unchanged.
    Base,
    /// The note is a half-tone higher then indicated by its name.
    Sharp,
}

/// Reasons why a note token could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum NoteError {
    #[snafu(display("invalid note token {:?}: expected a letter A-G", token))]
    UnknownLetter { token: String },
    #[snafu(display("invalid note token {:?}: accidental must be `#` or `b`", token))]
    UnknownAccidental { token: String },
    #[snafu(display("invalid note token {:?}: octave must be a number from 0 to 9", token))]
    InvalidOctave { token: String },
    #[snafu(display("invalid note token {:?}: MIDI pitch {} is outside 0-127", token, pitch))]
    OutOfRange { token: String, pitch: i32 },
}

impl NoteName {
    fn from_letter(letter: char) -> Option<NoteName> {
        Some(match letter.to_ascii_uppercase() {
            'A' => NoteName::A,
            'B' => NoteName::B,
            'C' => NoteName::C,
            'D' => NoteName::D,
            'E' => NoteName::E,
            'F' => NoteName::F,
            'G' => NoteName::G,
            _ => return None,
        })
    }

    /// Semitones above C within the same octave.
    fn semitone(self) -> i32 {
        match self {
            NoteName::C => 0,
            NoteName::D => 2,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::G => 7,
            NoteName::A => 9,
            NoteName::B => 11,
        }
    }
}

impl Accidental {
    fn offset(self) -> i32 {
        match self {
            Accidental::Flat => -1,
            Accidental::Base => 0,
            Accidental::Sharp => 1,
        }
    }
}

impl Note {
    pub const MAX_OCTAVE: i32 = 9;

    /// Convert a note from standard notation to a MIDI note index.
    /// Note that different names may refer to the same note, e.g. a G♯ is the same as a A♭.
    /// Returns `None` if the note is not representable in the MIDI note system.
    ///
    /// # Examples
    ///
    /// ```
    /// use syntxt_midi::note::*;
    ///
    /// assert_eq!(Note::try_named(NoteName::A, Accidental::Base, 4), Some(Note::from_midi(69)));
    /// assert_eq!(Note::try_named(NoteName::C, Accidental::Sharp, 6), Some(Note::from_midi(85)));
    /// assert_eq!(Note::try_named(NoteName::G, Accidental::Flat, 2), Some(Note::from_midi(42)));
    /// assert_eq!(Note::try_named(NoteName::C, Accidental::Flat, 0), Some(Note::from_midi(11)));
    /// assert_eq!(Note::try_named(NoteName::A, Accidental::Base, 9), None);
    /// ```
    pub fn try_named(name: NoteName, accidental: Accidental, octave: i32) -> Option<Note> {
        Note::try_from_midi(Note::index_of(name, accidental, octave))
    }

    fn index_of(name: NoteName, accidental: Accidental, octave: i32) -> i32 {
        // C4 is MIDI note number 60
        (octave + 1) * 12 + name.semitone() + accidental.offset()
    }

    /// Parse a token of the format `<letter>[accidental]<octave>`.
    ///
    /// The letter is case-insensitive, the accidental is `#`/`♯` or `b`/`♭`
    /// and the octave ranges from 0 to 9.
    ///
    /// # Examples
    ///
    /// ```
    /// # use syntxt_midi::note::*;
    ///
    /// assert_eq!(Note::parse("A4"), Ok(Note::from_midi(69)));
    /// assert_eq!(Note::parse("a4"), Ok(Note::from_midi(69)));
    /// assert_eq!(Note::parse("C#6"), Ok(Note::from_midi(85)));
    /// assert_eq!(Note::parse("C♯6"), Ok(Note::from_midi(85)));
    /// assert_eq!(Note::parse("Gb2"), Ok(Note::from_midi(42)));
    /// assert_eq!(Note::parse("bb3"), Ok(Note::from_midi(58)));
    /// assert!(Note::parse("H4").is_err());
    /// ```
    pub fn parse(token: &str) -> Result<Note, NoteError> {
        let mut chars = token.chars();
        let name = chars
            .next()
            .and_then(NoteName::from_letter)
            .ok_or_else(|| NoteError::UnknownLetter {
                token: token.to_owned(),
            })?;

        let rest = chars.as_str();
        let accidental_str = rest.trim_end_matches(|ch: char| ch.is_ascii_digit());
        let accidental = match accidental_str {
            "#" | "♯" => Accidental::Sharp,
            "b" | "♭" => Accidental::Flat,
            "" => Accidental::Base,
            _ => {
                return Err(NoteError::UnknownAccidental {
                    token: token.to_owned(),
                })
            }
        };

        let octave_str = &rest[accidental_str.len()..];
        let octave = match octave_str.parse::<i32>() {
            Ok(octave) if octave_str.len() == 1 && octave <= Note::MAX_OCTAVE => octave,
            _ => {
                return Err(NoteError::InvalidOctave {
                    token: token.to_owned(),
                })
            }
        };

        Note::try_named(name, accidental, octave).ok_or_else(|| NoteError::OutOfRange {
            token: token.to_owned(),
            pitch: Note::index_of(name, accidental, octave),
        })
    }

    /// # Panics
    ///
    /// If `midi_note` is not a valid MIDI note index.
    pub fn from_midi(midi_note: u8) -> Note {
        assert!(midi_note < 128, "MIDI only has notes 0 - 127");
        Note(midi_note)
    }

    pub fn try_from_midi(midi_note: i32) -> Option<Note> {
        if (0..128).contains(&midi_note) {
            Some(Note(midi_note as u8))
        } else {
            None
        }
    }

    pub fn to_midi(self) -> u8 {
        self.0
    }

    pub fn pitch_class(self) -> PitchClass {
        PitchClass::new(self.0)
    }

    /// Octave in scientific pitch notation, MIDI note 0 being in octave -1.
    pub fn octave(self) -> i32 {
        i32::from(self.0) / 12 - 1
    }
}

/// Spells the note with sharps, e.g. `C#4`.
///
/// ```
/// use syntxt_midi::note::Note;
///
/// assert_eq!(Note::from_midi(61).to_string(), "C#4");
/// assert_eq!(Note::parse("Db4").unwrap().to_string(), "C#4");
/// ```
impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_class(), self.octave())
    }
}

impl PitchClass {
    /// Reduce any semitone count modulo 12.
    pub fn new(semitones: u8) -> PitchClass {
        PitchClass(semitones % 12)
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// Move up by `semitones`, wrapping around the octave.
    pub fn transpose(self, semitones: u8) -> PitchClass {
        PitchClass::new(self.0 + semitones % 12)
    }

    /// All twelve pitch classes in ascending order.
    pub fn all() -> impl Iterator<Item = PitchClass> {
        (0..12).map(PitchClass)
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(PITCH_CLASS_NAMES[self.0 as usize])
    }
}

/// The MIDI velocity of a note, i.e. how hard the key was pressed, from 0 to 127.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Velocity(u8);

impl Velocity {
    /// # Panics
    ///
    /// If `velocity` is larger than 127.
    pub fn from_midi(velocity: u8) -> Velocity {
        assert!(velocity < 128, "MIDI velocities range from 0 to 127");
        Velocity(velocity)
    }

    pub fn try_from_midi(velocity: i64) -> Option<Velocity> {
        if (0..128).contains(&velocity) {
            Some(Velocity(velocity as u8))
        } else {
            None
        }
    }

    pub fn to_midi(self) -> u8 {
        self.0
    }
}
