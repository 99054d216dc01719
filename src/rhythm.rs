// syntxt-midi -- compiling plain-text note sketches into MIDI
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Rhythm patterns: how long each of the four notes of a bar is held.

use std::fmt;

use snafu::Snafu;

use crate::rational::{ParseRationalError, Rational};

/// Time in beats (quarter notes), can be fractional, e.g. a note taking 3/2 beats.
pub type Beats = Rational;

/// Number of notes in every bar, and hence of durations in a rhythm pattern.
pub const NOTES_PER_BAR: usize = 4;

/// The durations applied to the notes of each bar, one per bar position.
///
/// The durations do not need to add up to four beats; a pattern may
/// deliberately make bars shorter or longer than a 4/4 measure.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rhythm([Beats; NOTES_PER_BAR]);

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum RhythmError {
    #[snafu(display(
        "rhythm pattern must have {} values, got {}",
        NOTES_PER_BAR,
        count
    ))]
    WrongCount { count: usize },
    #[snafu(display("invalid rhythm value {:?}: {}", value, source))]
    InvalidValue {
        value: String,
        source: ParseRationalError,
    },
    #[snafu(display("rhythm value {:?} must be greater than zero", value))]
    NonPositive { value: String },
}

impl Rhythm {
    /// Long-short-short-long, spanning four beats.
    pub fn syncopated() -> Rhythm {
        Rhythm([
            Rational::new(3, 2),
            Rational::new(1, 2),
            Rational::new(1, 2),
            Rational::new(3, 2),
        ])
    }

    /// Resolve an optional pattern specification, falling back to `default` when absent.
    ///
    /// The values may be separated by commas and/or whitespace. A present
    /// specification is returned exactly as written, without normalization.
    pub fn resolve(spec: Option<&str>, default: Rhythm) -> Result<Rhythm, RhythmError> {
        match spec {
            None => Ok(default),
            Some(spec) => Rhythm::parse(spec),
        }
    }

    /// Parse a pattern of exactly four positive numbers, e.g. `1.5, 0.5, 0.5, 1.5`.
    pub fn parse(spec: &str) -> Result<Rhythm, RhythmError> {
        let values: Vec<&str> = spec
            .split(|ch: char| ch == ',' || ch.is_whitespace())
            .filter(|v| !v.is_empty())
            .collect();
        if values.len() != NOTES_PER_BAR {
            return Err(RhythmError::WrongCount {
                count: values.len(),
            });
        }

        let mut durations = [Rational::zero(); NOTES_PER_BAR];
        for (slot, value) in durations.iter_mut().zip(values) {
            let duration: Beats = value.parse().map_err(|source| RhythmError::InvalidValue {
                value: value.to_owned(),
                source,
            })?;
            if !duration.is_positive() {
                return Err(RhythmError::NonPositive {
                    value: value.to_owned(),
                });
            }
            *slot = duration;
        }
        Ok(Rhythm(durations))
    }

    pub fn durations(&self) -> &[Beats; NOTES_PER_BAR] {
        &self.0
    }
}

impl Default for Rhythm {
    fn default() -> Self {
        Rhythm::syncopated()
    }
}

/// Renders the durations as decimals where that is exact, e.g.
/// `1.5, 0.5, 0.5, 1.5`, and as fractions otherwise, e.g. `1/3`.
impl fmt::Display for Rhythm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, duration) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match duration.to_decimal() {
                Some(decimal) => f.write_str(&decimal)?,
                None => write!(f, "{}", duration)?,
            }
        }
        Ok(())
    }
}
