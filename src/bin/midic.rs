// syntxt-midi -- compiling plain-text note sketches into MIDI
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! `midic` - pronounced *midi-c*, is the compiler for note sketches to MIDI files.

use std::io;
use std::path::{Path, PathBuf};

use log::{error, info};
use structopt::StructOpt;

use syntxt_midi::midi;
use syntxt_midi::report::Report;
use syntxt_midi::song::{self, CompileOptions, TrackSource};

#[derive(Debug, StructOpt)]
#[structopt(name = "midic", about = "Compiling note sketches into MIDI")]
struct Opt {
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: usize,

    /// Output MIDI file. Derived from the first track file if not given.
    /// The analysis report is written next to it, with a `.log` extension.
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// Tempo in beats per minute [default: 110]
    #[structopt(long)]
    tempo: Option<u32>,

    /// The text files describing the tracks, one file per track.
    #[structopt(parse(from_os_str), required = true)]
    tracks: Vec<PathBuf>,
}

fn main() -> io::Result<()> {
    let opt = Opt::from_args();

    let level = match opt.verbose {
        0 => log::Level::Info,
        1 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    simple_logger::init_with_level(level).map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

    let mut sources = Vec::with_capacity(opt.tracks.len());
    for path in opt.tracks.iter() {
        let text = std::fs::read_to_string(path)?;
        sources.push(TrackSource::new(file_stem(path), text));
    }

    let options = CompileOptions {
        bpm: opt.tempo.unwrap_or(song::DEFAULT_BPM),
        ..CompileOptions::default()
    };
    let song = song::compile(&sources, &options).map_err(|err| {
        error!("{}", err);
        io::Error::new(io::ErrorKind::InvalidData, err)
    })?;

    for (index, arranged) in song.tracks().iter().enumerate() {
        let track = &arranged.track;
        info!(
            "track {}: {:?} | {} notes ({} bars) | ch:{} prog:{} vel:{} | rhythm: {}",
            index + 1,
            track.name,
            track.events.len(),
            track.bar_count(),
            arranged.channel,
            track.program,
            track.velocity.to_midi(),
            track.rhythm
        );
    }

    let midi_path = output_path(opt.output, &opt.tracks);
    let log_path = midi_path.with_extension("log");
    let output_name = midi_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let bytes = midi::encode(&song)?;
    let report = Report::new(&song, &output_name).to_string();

    std::fs::write(&midi_path, bytes)?;
    info!("saved {}", midi_path.display());
    std::fs::write(&log_path, report)?;
    info!("saved {}", log_path.display());
    Ok(())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// The explicit output if given, otherwise `<stem>.mid` for a single track
/// and `<stem>_multitrack.mid` for several, after the first track file.
fn output_path(output: Option<PathBuf>, tracks: &[PathBuf]) -> PathBuf {
    match (output, tracks.first()) {
        (Some(path), _) => path,
        (None, Some(first)) if tracks.len() > 1 => {
            PathBuf::from(format!("{}_multitrack.mid", file_stem(first)))
        }
        (None, Some(first)) => PathBuf::from(format!("{}.mid", file_stem(first))),
        (None, None) => PathBuf::from("out.mid"),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn derived_output_names() {
        assert_eq!(
            output_path(None, &paths(&["sketches/lead.txt"])),
            PathBuf::from("lead.mid")
        );
        assert_eq!(
            output_path(None, &paths(&["lead.txt", "bass.txt"])),
            PathBuf::from("lead_multitrack.mid")
        );
        assert_eq!(
            output_path(Some(PathBuf::from("song.mid")), &paths(&["lead.txt", "bass.txt"])),
            PathBuf::from("song.mid")
        );
        assert_eq!(
            output_path(None, &paths(&["lead.txt"])).with_extension("log"),
            PathBuf::from("lead.log")
        );
    }

    #[test]
    fn track_ids_are_file_stems() {
        assert_eq!(file_stem(Path::new("dir/bass.line.txt")), "bass.line");
        assert_eq!(file_stem(Path::new("drums")), "drums");
    }
}
