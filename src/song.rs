// syntxt-midi -- compiling plain-text note sketches into MIDI
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! High-level description of a song that can be turned into MIDI and a report.

use std::fmt;

use log::{debug, info, warn};
use snafu::Snafu;

use crate::channel::{self, Channel, ChannelError};
use crate::scale::{self, PitchClassSet, ScaleMatch};
use crate::track::{self, Track, TrackDefaults, TrackError};

/// Tempo used when none is given explicitly.
pub const DEFAULT_BPM: u32 = 110;

/// A description of a complete song.
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    /// The speed of the song measured in beats per minute.
    bpm: u32,
    /// The tracks of the song, playing simultaneously.
    tracks: Vec<ArrangedTrack>,
    /// Scale detected over the notes of all tracks together.
    summary: Analysis,
}

/// A track with its final channel and detected scale.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrangedTrack {
    pub track: Track,
    pub channel: Channel,
    pub analysis: Analysis,
}

/// Outcome of scale detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Analysis {
    Detected(ScaleMatch),
    /// There were not enough distinct pitch classes to tell.
    Indeterminate,
}

impl Analysis {
    /// Detect the scale of the given pitch classes, never failing.
    pub fn of(pitch_classes: PitchClassSet) -> Analysis {
        match scale::detect(pitch_classes) {
            Ok(found) => Analysis::Detected(found),
            Err(err) => {
                warn!("{}", err);
                Analysis::Indeterminate
            }
        }
    }

    pub fn scale(&self) -> Option<&ScaleMatch> {
        match self {
            Analysis::Detected(found) => Some(found),
            Analysis::Indeterminate => None,
        }
    }

    pub fn mood(&self) -> &'static str {
        match self {
            Analysis::Detected(found) => found.mood(),
            Analysis::Indeterminate => "indeterminate",
        }
    }
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Analysis::Detected(found) => write!(f, "{}", found),
            Analysis::Indeterminate => f.write_str("indeterminate"),
        }
    }
}

/// Possible errors when putting a song together.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum SongError {
    #[snafu(display("a song needs at least one track"))]
    EmptySong,
    #[snafu(display("tempo must be positive, got {} bpm", bpm))]
    InvalidTempo { bpm: u32 },
    #[snafu(display("{}", source))]
    Parse { source: TrackError },
    #[snafu(display("{}", source))]
    Allocation { source: ChannelError },
}

/// The input of one track: where it came from and its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSource {
    /// Short identifier, e.g. a file stem. Doubles as default track name.
    pub id: String,
    pub text: String,
}

impl TrackSource {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        TrackSource {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Everything that influences compilation apart from the track texts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub bpm: u32,
    pub defaults: TrackDefaults,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            bpm: DEFAULT_BPM,
            defaults: TrackDefaults::default(),
        }
    }
}

impl Song {
    /// Put parsed tracks together into a song.
    ///
    /// Allocates channels across all tracks and detects the scale of each
    /// track as well as of the whole song. Failing scale detection is not an
    /// error, the analysis is just marked as indeterminate.
    pub fn assemble(bpm: u32, tracks: Vec<Track>) -> Result<Song, SongError> {
        if tracks.is_empty() {
            return Err(SongError::EmptySong);
        }
        if bpm == 0 {
            return Err(SongError::InvalidTempo { bpm });
        }

        let requests: Vec<Option<Channel>> = tracks.iter().map(|t| t.channel).collect();
        let channels =
            channel::allocate(&requests).map_err(|source| SongError::Allocation { source })?;

        let mut all_pitch_classes = PitchClassSet::new();
        let tracks: Vec<ArrangedTrack> = tracks
            .into_iter()
            .zip(channels)
            .map(|(track, channel)| {
                let pitch_classes: PitchClassSet = track.pitch_classes().collect();
                all_pitch_classes = all_pitch_classes.union(pitch_classes);
                let analysis = Analysis::of(pitch_classes);
                debug!("track {:?}: {} ({})", track.name, analysis, analysis.mood());
                ArrangedTrack {
                    track,
                    channel,
                    analysis,
                }
            })
            .collect();

        let summary = Analysis::of(all_pitch_classes);
        info!(
            "assembled {} track(s) at {} bpm, {} ({})",
            tracks.len(),
            bpm,
            summary,
            summary.mood()
        );
        Ok(Song {
            bpm,
            tracks,
            summary,
        })
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn tracks(&self) -> &[ArrangedTrack] {
        &self.tracks
    }

    pub fn summary(&self) -> &Analysis {
        &self.summary
    }

    /// Pitch classes sounded anywhere in the song.
    pub fn pitch_classes(&self) -> PitchClassSet {
        self.tracks
            .iter()
            .flat_map(|t| t.track.pitch_classes())
            .collect()
    }
}

/// Compile the texts of all tracks into a song.
///
/// Either every track parses and a complete song is returned, or the first
/// error is.
pub fn compile(sources: &[TrackSource], options: &CompileOptions) -> Result<Song, SongError> {
    let tracks = sources
        .iter()
        .map(|src| {
            info!("compiling track {}", src.id);
            track::parse_track(&src.id, &src.text, &options.defaults)
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| SongError::Parse { source })?;
    Song::assemble(options.bpm, tracks)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::note::PitchClass;
    use crate::rational::Rational;
    use crate::scale::Mode;

    const ARPEGGIOS: &str = "C4 E4 G4 B4
D4 F#4 A4 C5
E4 G#4 B4 D5
F4 A4 C5 E5
";

    fn ch(index: u8) -> Channel {
        Channel::try_new(index).unwrap()
    }

    #[test]
    fn single_track_end_to_end() {
        let song = compile(
            &[TrackSource::new("example_input", ARPEGGIOS)],
            &CompileOptions::default(),
        )
        .unwrap();
        assert_eq!(song.bpm(), 110);
        assert_eq!(song.tracks().len(), 1);

        let arranged = &song.tracks()[0];
        assert_eq!(arranged.track.name, "example_input");
        assert_eq!(arranged.track.program, 80);
        assert_eq!(arranged.track.velocity.to_midi(), 95);
        assert_eq!(arranged.channel, ch(0));
        assert_eq!(arranged.track.events.len(), 16);
        assert_eq!(arranged.track.length(), Rational::from_int(16));

        // C D E F F# G G# A B: all of C major is present, plus F# and G#
        let found = arranged.analysis.scale().unwrap();
        assert_eq!((found.root, found.mode), (PitchClass::new(0), Mode::Major));
        assert_eq!(found.matched, 7);
        assert_eq!(found.template_size, 7);
        assert_eq!(arranged.analysis.mood(), "bright/uplifting");
        assert_eq!(song.summary(), &arranged.analysis);
        assert_eq!(song.pitch_classes().len(), 9);
    }

    #[test]
    fn explicit_and_automatic_channels() {
        let lead = format!("channel: 3\n{}", ARPEGGIOS);
        let song = compile(
            &[
                TrackSource::new("lead", lead),
                TrackSource::new("bass", ARPEGGIOS),
            ],
            &CompileOptions {
                bpm: 128,
                ..CompileOptions::default()
            },
        )
        .unwrap();
        let channels: Vec<Channel> = song.tracks().iter().map(|t| t.channel).collect();
        assert_eq!(channels, vec![ch(3), ch(0)]);
        assert_eq!(song.bpm(), 128);
    }

    #[test]
    fn duplicate_channel_requests() {
        let text = format!("channel: 2\n{}", ARPEGGIOS);
        let result = compile(
            &[TrackSource::new("a", text.clone()), TrackSource::new("b", text)],
            &CompileOptions::default(),
        );
        assert_eq!(
            result,
            Err(SongError::Allocation {
                source: ChannelError::ChannelConflict {
                    channel: ch(2),
                    first: 0,
                    second: 1
                }
            })
        );
    }

    #[test]
    fn monotone_track_is_indeterminate() {
        let drone = "C3 C3 C3 C3\nC2 C2 C2 C2\nC3 C3 C3 C3\nC4 C4 C4 C4";
        let song = compile(
            &[
                TrackSource::new("drone", drone),
                TrackSource::new("lead", ARPEGGIOS),
            ],
            &CompileOptions::default(),
        )
        .unwrap();
        assert_eq!(song.tracks()[0].analysis, Analysis::Indeterminate);
        assert_eq!(song.tracks()[0].analysis.mood(), "indeterminate");
        // the song as a whole still has enough variety
        assert!(song.summary().scale().is_some());

        let song = compile(&[TrackSource::new("drone", drone)], &CompileOptions::default()).unwrap();
        assert_eq!(song.summary(), &Analysis::Indeterminate);
        assert_eq!(song.summary().to_string(), "indeterminate");
    }

    #[test]
    fn empty_song() {
        assert_eq!(
            compile(&[], &CompileOptions::default()),
            Err(SongError::EmptySong)
        );
        assert_eq!(Song::assemble(110, vec![]), Err(SongError::EmptySong));
    }

    #[test]
    fn zero_tempo() {
        let result = compile(
            &[TrackSource::new("lead", ARPEGGIOS)],
            &CompileOptions {
                bpm: 0,
                ..CompileOptions::default()
            },
        );
        assert_eq!(result, Err(SongError::InvalidTempo { bpm: 0 }));
    }

    #[test]
    fn first_parse_error_aborts() {
        let result = compile(
            &[
                TrackSource::new("good", ARPEGGIOS),
                TrackSource::new("short", "C4 D4 E4 F4"),
            ],
            &CompileOptions::default(),
        );
        assert_eq!(
            result,
            Err(SongError::Parse {
                source: TrackError::InsufficientBars {
                    track: "short".to_owned(),
                    found: 1
                }
            })
        );
    }
}
