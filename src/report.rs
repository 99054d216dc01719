// syntxt-midi -- compiling plain-text note sketches into MIDI
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Human readable analysis of a compiled song.

use std::fmt;

use crate::song::{Analysis, Song};

/// The report about a song written next to its MIDI file.
///
/// Render it with `to_string()` or any formatting macro.
pub struct Report<'a> {
    song: &'a Song,
    /// Name of the MIDI file the song is written to.
    output_name: &'a str,
}

impl<'a> Report<'a> {
    pub fn new(song: &'a Song, output_name: &'a str) -> Self {
        Report { song, output_name }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let song = self.song;
        writeln!(f, "=== syntxt-midi analysis ===")?;
        writeln!(f)?;
        writeln!(f, "Output file : {}", self.output_name)?;
        writeln!(f, "Tempo       : {} BPM", song.bpm())?;
        writeln!(f, "Tracks      : {}", song.tracks().len())?;
        writeln!(f, "Scale       : {}", scale_line(song.summary()))?;
        writeln!(f, "Mood        : {}", song.summary().mood())?;
        let used = song.pitch_classes();
        if used.is_empty() {
            writeln!(f, "Pitch classes used: none")?;
        } else {
            let names: Vec<String> = used.iter().map(|pc| pc.to_string()).collect();
            writeln!(f, "Pitch classes used: {}", names.join(", "))?;
        }

        for (index, arranged) in song.tracks().iter().enumerate() {
            let track = &arranged.track;
            writeln!(f)?;
            writeln!(f, "--- Track {}: {} ---", index + 1, track.name)?;
            writeln!(f, "  Source    : {}", track.source)?;
            writeln!(f, "  Program   : {}", track.program)?;
            writeln!(f, "  Channel   : {}", arranged.channel)?;
            writeln!(f, "  Velocity  : {}", track.velocity.to_midi())?;
            writeln!(f, "  Bars      : {}", track.bar_count())?;
            writeln!(f, "  Notes     : {}", track.events.len())?;
            writeln!(f, "  Length    : {} beats", track.length())?;
            writeln!(f, "  Rhythm    : {}", track.rhythm)?;
            writeln!(f, "  Scale     : {}", scale_line(&arranged.analysis))?;
            writeln!(f, "  Mood      : {}", arranged.analysis.mood())?;
            writeln!(f, "  Notes per bar:")?;
            for (bar_index, bar) in track.bars().enumerate() {
                write!(f, "    Bar {}:", bar_index + 1)?;
                for event in bar {
                    write!(f, " {}", event.note)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

fn scale_line(analysis: &Analysis) -> String {
    match analysis.scale() {
        Some(found) => format!(
            "{} ({}/{} pitch classes in scale)",
            found, found.matched, found.template_size
        ),
        None => analysis.to_string(),
    }
}
