// syntxt-midi -- compiling plain-text note sketches into MIDI
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Parsing the text of a single track into timed note events.
//!
//! A track consists of optional `key: value` header lines followed by bars,
//! each bar being a line of exactly four notes:
//!
//! ```text
//! name: Lead Synth
//! program: 81
//! rhythm: 1.5, 0.5, 0.5, 1.5
//! C4 E4 G4 B4
//! D4 F#4 A4 C5
//! E4 G#4 B4 D5
//! F4 A4 C5 E5
//! ```

use log::{debug, trace, warn};
use snafu::Snafu;

use crate::channel::Channel;
use crate::note::{Note, NoteError, PitchClass, Velocity};
use crate::rhythm::{Beats, Rhythm, RhythmError, NOTES_PER_BAR};

/// A track needs at least this many bars for scale detection to mean anything.
pub const MIN_BARS: usize = 4;

/// Values used for everything a track's header leaves out.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TrackDefaults {
    /// General MIDI program, 80 being a square lead.
    pub program: u8,
    pub velocity: Velocity,
    pub rhythm: Rhythm,
}

impl Default for TrackDefaults {
    fn default() -> Self {
        TrackDefaults {
            program: 80,
            velocity: Velocity::from_midi(95),
            rhythm: Rhythm::syncopated(),
        }
    }
}

/// A single note as played on a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEvent {
    /// Which key was pressed
    pub note: Note,
    /// How hard the key was pressed
    pub velocity: Velocity,
    /// Beat at which the key was pressed, counted from the start of the track
    pub start: Beats,
    /// How many beats the key is held
    pub duration: Beats,
}

impl NoteEvent {
    /// Beat at which the key is released. Always representable for events
    /// produced by [`parse_track`].
    pub fn end(&self) -> Beats {
        self.start + self.duration
    }
}

/// A parsed track, before channels are allocated and scales detected.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub name: String,
    /// Identifier of the input this track was parsed from.
    pub source: String,
    pub program: u8,
    /// Explicitly requested channel, if any.
    pub channel: Option<Channel>,
    pub velocity: Velocity,
    pub rhythm: Rhythm,
    /// The notes of the track in the order they are played.
    pub events: Vec<NoteEvent>,
}

/// Possible errors when parsing a track.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum TrackError {
    #[snafu(display("{}, line {}: {}", track, line, source))]
    InvalidNoteToken {
        track: String,
        line: usize,
        source: NoteError,
    },
    #[snafu(display("{}, line {}: {}", track, line, source))]
    InvalidRhythmSpec {
        track: String,
        line: usize,
        source: RhythmError,
    },
    #[snafu(display("{}, line {}: invalid {} {:?}", track, line, key, value))]
    InvalidHeader {
        track: String,
        line: usize,
        key: &'static str,
        value: String,
    },
    #[snafu(display(
        "{}, line {}: expected {} notes per bar, got {}",
        track,
        line,
        NOTES_PER_BAR,
        count
    ))]
    BarLength {
        track: String,
        line: usize,
        count: usize,
    },
    #[snafu(display("{}: expected at least {} bars, got {}", track, MIN_BARS, found))]
    InsufficientBars { track: String, found: usize },
    #[snafu(display(
        "{}, line {}: note positions exceed the representable range",
        track,
        line
    ))]
    BeatOverflow { track: String, line: usize },
}

impl Track {
    /// Iterate the notes grouped by bar.
    pub fn bars(&self) -> impl Iterator<Item = &[NoteEvent]> {
        self.events.chunks(NOTES_PER_BAR)
    }

    pub fn bar_count(&self) -> usize {
        self.events.len() / NOTES_PER_BAR
    }

    /// Total length of the track in beats.
    pub fn length(&self) -> Beats {
        self.events.last().map_or(Beats::zero(), NoteEvent::end)
    }

    /// The pitch class of every note on this track, duplicates included.
    pub fn pitch_classes(&self) -> impl Iterator<Item = PitchClass> + '_ {
        self.events.iter().map(|event| event.note.pitch_class())
    }
}

/// Header values collected while scanning a track.
struct Header<'a> {
    name: Option<&'a str>,
    program: Option<u8>,
    channel: Option<Channel>,
    velocity: Option<Velocity>,
    /// The rhythm specification together with the line it was found on.
    rhythm: Option<(usize, &'a str)>,
}

/// Parse the text of one track.
///
/// `source` identifies the input (e.g. a file stem) in error messages and is
/// used as the track name when the header does not provide one.
pub fn parse_track(
    source: &str,
    text: &str,
    defaults: &TrackDefaults,
) -> Result<Track, TrackError> {
    let mut header = Header {
        name: None,
        program: None,
        channel: None,
        velocity: None,
        rhythm: None,
    };
    let mut bar_lines = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match split_header(line) {
            Some((key, value)) => parse_header_line(source, line_no, key, value, &mut header)?,
            None => bar_lines.push((line_no, line)),
        }
    }

    if bar_lines.len() < MIN_BARS {
        return Err(TrackError::InsufficientBars {
            track: source.to_owned(),
            found: bar_lines.len(),
        });
    }

    let rhythm = match header.rhythm {
        None => defaults.rhythm,
        Some((line_no, spec)) => {
            Rhythm::resolve(Some(spec), defaults.rhythm).map_err(|err| {
                TrackError::InvalidRhythmSpec {
                    track: source.to_owned(),
                    line: line_no,
                    source: err,
                }
            })?
        }
    };
    let velocity = header.velocity.unwrap_or(defaults.velocity);

    let mut events = Vec::with_capacity(bar_lines.len() * NOTES_PER_BAR);
    let mut time = Beats::zero();
    for (line_no, line) in bar_lines {
        let tokens: Vec<&str> = line
            .split(|ch: char| ch == ',' || ch.is_whitespace())
            .filter(|token| !token.is_empty())
            .collect();
        if tokens.len() != NOTES_PER_BAR {
            return Err(TrackError::BarLength {
                track: source.to_owned(),
                line: line_no,
                count: tokens.len(),
            });
        }

        for (token, &duration) in tokens.into_iter().zip(rhythm.durations()) {
            let note = Note::parse(token).map_err(|err| TrackError::InvalidNoteToken {
                track: source.to_owned(),
                line: line_no,
                source: err,
            })?;
            let end = time
                .checked_add(duration)
                .ok_or_else(|| TrackError::BeatOverflow {
                    track: source.to_owned(),
                    line: line_no,
                })?;
            trace!("{}: {} at beat {} for {}", source, note, time, duration);
            events.push(NoteEvent {
                note,
                velocity,
                start: time,
                duration,
            });
            time = end;
        }
    }

    let track = Track {
        name: header.name.unwrap_or(source).to_owned(),
        source: source.to_owned(),
        program: header.program.unwrap_or(defaults.program),
        channel: header.channel,
        velocity,
        rhythm,
        events,
    };
    debug!(
        "parsed track {:?}: {} bars, {} notes, {} beats",
        track.name,
        track.bar_count(),
        track.events.len(),
        track.length()
    );
    Ok(track)
}

/// Split a `key: value` line. Note tokens never contain a colon.
fn split_header(line: &str) -> Option<(&str, &str)> {
    let colon = line.find(':')?;
    let key = line[..colon].trim();
    if key.is_empty() || !key.chars().all(|ch| ch.is_alphanumeric() || ch == '_') {
        return None;
    }
    Some((key, line[colon + 1..].trim()))
}

fn parse_header_line<'a>(
    source: &str,
    line_no: usize,
    key: &str,
    value: &'a str,
    header: &mut Header<'a>,
) -> Result<(), TrackError> {
    let invalid = |key: &'static str| TrackError::InvalidHeader {
        track: source.to_owned(),
        line: line_no,
        key,
        value: value.to_owned(),
    };

    match key.to_ascii_lowercase().as_str() {
        "name" if value.is_empty() => {
            warn!("{}, line {}: empty name, keeping `{}`", source, line_no, source);
            header.name = None;
        }
        "name" => header.name = Some(value),
        "program" => {
            let program = value
                .parse::<u8>()
                .ok()
                .filter(|&p| p < 128)
                .ok_or_else(|| invalid("program"))?;
            header.program = Some(program);
        }
        "channel" => {
            let channel = value
                .parse::<u8>()
                .ok()
                .and_then(Channel::try_new)
                .filter(|&ch| ch != Channel::PERCUSSION)
                .ok_or_else(|| invalid("channel"))?;
            header.channel = Some(channel);
        }
        "velocity" => {
            let velocity = value
                .parse::<i64>()
                .ok()
                .and_then(Velocity::try_from_midi)
                .ok_or_else(|| invalid("velocity"))?;
            header.velocity = Some(velocity);
        }
        "rhythm" => header.rhythm = Some((line_no, value)),
        _ => warn!("{}, line {}: ignoring unknown header `{}`", source, line_no, key),
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rational::Rational;

    const ARPEGGIOS: &str = "
        C4 E4 G4 B4
        D4 F#4 A4 C5
        E4 G#4 B4 D5
        F4 A4 C5 E5
    ";

    fn parse(text: &str) -> Result<Track, TrackError> {
        parse_track("lead", text, &TrackDefaults::default())
    }

    #[test]
    fn defaults_without_header() {
        let track = parse(ARPEGGIOS).unwrap();
        assert_eq!(track.name, "lead");
        assert_eq!(track.source, "lead");
        assert_eq!(track.program, 80);
        assert_eq!(track.velocity.to_midi(), 95);
        assert_eq!(track.channel, None);
        assert_eq!(track.rhythm, Rhythm::syncopated());
        assert_eq!(track.events.len(), 16);
        assert_eq!(track.bar_count(), 4);
        assert_eq!(track.length(), Rational::from_int(16));
    }

    #[test]
    fn events_are_contiguous() {
        let track = parse(ARPEGGIOS).unwrap();
        let mut expected_start = Rational::zero();
        for (i, event) in track.events.iter().enumerate() {
            assert_eq!(event.start, expected_start);
            assert_eq!(event.duration, track.rhythm.durations()[i % NOTES_PER_BAR]);
            expected_start = event.end();
        }
        let first_bar: Vec<u8> = track
            .bars()
            .next()
            .unwrap()
            .iter()
            .map(|e| e.note.to_midi())
            .collect();
        assert_eq!(first_bar, vec![60, 64, 67, 71]);
    }

    #[test]
    fn header_values() {
        let text = "
            name: Bass Line
            Program: 38
            channel: 3
            velocity: 110
            rhythm: 1, 1, 1, 0.5
            swing: lots
            C2, C2, G2, C3
            C2 C2 G2 C3
            F2 F2 C3 F3
            G2 G2 D3 G3
        ";
        let track = parse(text).unwrap();
        assert_eq!(track.name, "Bass Line");
        assert_eq!(track.source, "lead");
        assert_eq!(track.program, 38);
        assert_eq!(track.channel, Channel::try_new(3));
        assert_eq!(track.velocity.to_midi(), 110);
        assert!(track.events.iter().all(|e| e.velocity.to_midi() == 110));
        assert_eq!(track.length(), Rational::from_int(14));
        assert_eq!(track.events[4].start, Rational::new(7, 2));
    }

    #[test]
    fn too_few_bars() {
        assert_eq!(
            parse("C4 D4 E4 F4\nC4 D4 E4 F4\nC4 D4 E4 F4"),
            Err(TrackError::InsufficientBars {
                track: "lead".to_owned(),
                found: 3
            })
        );
        assert!(matches!(
            parse("name: empty"),
            Err(TrackError::InsufficientBars { found: 0, .. })
        ));
    }

    #[test]
    fn invalid_note_reports_line() {
        let text = "C4 E4 G4 B4\nD4 F#4 A4 C5\n\nE4 H4 B4 D5\nF4 A4 C5 E5";
        assert_eq!(
            parse(text),
            Err(TrackError::InvalidNoteToken {
                track: "lead".to_owned(),
                line: 4,
                source: NoteError::UnknownLetter {
                    token: "H4".to_owned()
                },
            })
        );
    }

    #[test]
    fn bar_with_wrong_note_count() {
        let text = "C4 E4 G4\nD4 F#4 A4 C5\nE4 G#4 B4 D5\nF4 A4 C5 E5";
        assert_eq!(
            parse(text),
            Err(TrackError::BarLength {
                track: "lead".to_owned(),
                line: 1,
                count: 3
            })
        );
    }

    #[test]
    fn invalid_rhythm() {
        let text = format!("rhythm: 1, 1, 1\n{}", ARPEGGIOS);
        assert_eq!(
            parse(&text),
            Err(TrackError::InvalidRhythmSpec {
                track: "lead".to_owned(),
                line: 1,
                source: RhythmError::WrongCount { count: 3 },
            })
        );
    }

    #[test]
    fn invalid_headers() {
        for (header, key) in &[
            ("program: 128", "program"),
            ("program: organ", "program"),
            ("velocity: -1", "velocity"),
            ("channel: 16", "channel"),
            ("channel: 9", "channel"),
        ] {
            let text = format!("{}\n{}", header, ARPEGGIOS);
            match parse(&text) {
                Err(TrackError::InvalidHeader { key: k, line: 1, .. }) => assert_eq!(k, *key),
                other => panic!("expected invalid {} header, got {:?}", key, other),
            }
        }
    }

    #[test]
    fn empty_name_falls_back_to_source() {
        let text = format!("name:\n{}", ARPEGGIOS);
        assert_eq!(parse(&text).unwrap().name, "lead");
        let text = format!("name: Lead\nname:   \n{}", ARPEGGIOS);
        assert_eq!(parse(&text).unwrap().name, "lead");
    }

    #[test]
    fn long_decimal_rhythm() {
        let text = format!("rhythm: 0.0000000001, 1, 1, 1\n{}", ARPEGGIOS);
        let track = parse(&text).unwrap();
        assert_eq!(track.events.len(), 16);
        assert_eq!(track.events[1].start, Rational::new(1, 10_000_000_000));
        assert_eq!(
            track.length(),
            Rational::new(120_000_000_004, 10_000_000_000)
        );
    }

    #[test]
    fn co_prime_rhythm_over_many_bars() {
        let text = format!("rhythm: 1/7 1/11 1/13 1/17\n{}", "C4 D4 E4 F4\n".repeat(64));
        let track = parse(&text).unwrap();
        assert_eq!(track.bar_count(), 64);
        assert_eq!(track.length(), Rational::new(64 * 6288, 17017));
        assert_eq!(track.events[4].start, Rational::new(6288, 17017));
    }

    #[test]
    fn beat_positions_that_do_not_fit() {
        let text = format!("rhythm: 9223372036854775807 1 1 1\n{}", ARPEGGIOS);
        assert_eq!(
            parse(&text),
            Err(TrackError::BeatOverflow {
                track: "lead".to_owned(),
                line: 3
            })
        );
        let text = format!(
            "rhythm: 1/9223372036854775807 1/9223372036854775806 1 1\n{}",
            ARPEGGIOS
        );
        assert!(matches!(
            parse(&text),
            Err(TrackError::BeatOverflow { line: 3, .. })
        ));
    }

    #[test]
    fn injected_defaults() {
        let defaults = TrackDefaults {
            program: 5,
            velocity: Velocity::from_midi(64),
            rhythm: Rhythm::parse("1 1 1 1").unwrap(),
        };
        let track = parse_track("pad", ARPEGGIOS, &defaults).unwrap();
        assert_eq!(track.program, 5);
        assert_eq!(track.velocity.to_midi(), 64);
        assert_eq!(track.length(), Rational::from_int(16));
        assert_eq!(track.events[1].start, Rational::from_int(1));
    }
}
