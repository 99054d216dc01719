// syntxt-midi -- compiling plain-text note sketches into MIDI
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Encoding a song as a Standard MIDI File.
//!
//! Every track of the song becomes one MIDI track (SMF format 1). The tempo
//! is stored on the first track.

use std::convert::TryFrom;
use std::io;

use log::trace;
use midly::{
    num::{u15, u24, u28, u4, u7},
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind,
};

use crate::rhythm::Beats;
use crate::song::{ArrangedTrack, Song};

/// Ticks per quarter note, i.e. per beat.
pub const TICKS_PER_BEAT: u16 = 480;

/// Largest tempo value (microseconds per beat) a MIDI file can store.
const MAX_TEMPO_MICROS: u32 = 0xFF_FFFF;

/// Largest delta time between two events a MIDI file can store.
const MAX_DELTA_TICKS: u32 = (1 << 28) - 1;

/// Encode a song as the bytes of a MIDI file.
///
/// Fails with [`io::ErrorKind::InvalidData`] when a note lies too far into
/// the song, or too far after the previous one, to be stored in MIDI ticks.
pub fn encode(song: &Song) -> io::Result<Vec<u8>> {
    let smf = song_to_smf(song)?;
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}

fn song_to_smf(song: &Song) -> io::Result<Smf<'_>> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_BEAT)),
    ));

    for (index, arranged) in song.tracks().iter().enumerate() {
        let mut events = Vec::new();
        if index == 0 {
            let micros = (60_000_000 / song.bpm()).min(MAX_TEMPO_MICROS);
            events.push(meta(MetaMessage::Tempo(u24::new(micros))));
        }
        encode_track(arranged, &mut events)?;
        events.push(meta(MetaMessage::EndOfTrack));
        smf.tracks.push(events);
    }

    Ok(smf)
}

fn encode_track<'a>(
    arranged: &'a ArrangedTrack,
    events: &mut Vec<TrackEvent<'a>>,
) -> io::Result<()> {
    let track = &arranged.track;
    let channel = u4::new(arranged.channel.index());

    events.push(meta(MetaMessage::TrackName(track.name.as_bytes())));
    events.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Midi {
            channel,
            message: MidiMessage::ProgramChange {
                program: u7::new(track.program),
            },
        },
    });

    let mut last_tick = 0;
    let mut push_at = |tick: u32, message: MidiMessage| -> io::Result<()> {
        let delta = tick.saturating_sub(last_tick);
        if delta > MAX_DELTA_TICKS {
            return Err(invalid_data(format!(
                "{}: gap of {} ticks between notes does not fit into a MIDI file",
                track.name, delta
            )));
        }
        events.push(TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi { channel, message },
        });
        last_tick = last_tick.max(tick);
        Ok(())
    };

    for note in track.events.iter() {
        let key = u7::new(note.note.to_midi());
        let (on, off) = (to_ticks(note.start)?, to_ticks(note.end())?);
        trace!("{}: {} ticks {}-{}", track.name, note.note, on, off);
        push_at(
            on,
            MidiMessage::NoteOn {
                key,
                vel: u7::new(note.velocity.to_midi()),
            },
        )?;
        push_at(
            off,
            MidiMessage::NoteOff {
                key,
                vel: u7::new(0),
            },
        )?;
    }
    Ok(())
}

fn meta(message: MetaMessage<'_>) -> TrackEvent<'_> {
    TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(message),
    }
}

/// Convert a time in beats to the nearest MIDI tick.
fn to_ticks(beats: Beats) -> io::Result<u32> {
    beats
        .checked_mul_int(i64::from(TICKS_PER_BEAT))
        .and_then(|ticks| u32::try_from(ticks.round()).ok())
        .ok_or_else(|| invalid_data(format!("beat {} is out of the MIDI tick range", beats)))
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}
