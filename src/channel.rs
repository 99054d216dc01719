// syntxt-midi -- compiling plain-text note sketches into MIDI
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Assigning MIDI channels to tracks.

use std::fmt;

use log::debug;
use snafu::Snafu;

/// One of the 16 MIDI channels, numbered from 0.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Channel(u8);

impl Channel {
    pub const COUNT: u8 = 16;
    /// General MIDI reserves this channel for drums, it is never handed out automatically.
    pub const PERCUSSION: Channel = Channel(9);

    pub fn try_new(index: u8) -> Option<Channel> {
        if index < Channel::COUNT {
            Some(Channel(index))
        } else {
            None
        }
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// All channels that may be assigned automatically, in ascending order.
    fn assignable() -> impl Iterator<Item = Channel> {
        (0..Channel::COUNT)
            .map(Channel)
            .filter(|&ch| ch != Channel::PERCUSSION)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Possible errors when allocating channels.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum ChannelError {
    #[snafu(display(
        "tracks {} and {} both request channel {}",
        first + 1,
        second + 1,
        channel
    ))]
    ChannelConflict {
        channel: Channel,
        /// Position of the track that requested the channel first.
        first: usize,
        second: usize,
    },
    #[snafu(display("no free channel left for track {}", track + 1))]
    ChannelExhaustion { track: usize },
}

/// Assign a channel to every track, given each track's explicit request (if any).
///
/// Explicit requests are honored as-is, and must not collide. Tracks without
/// a request get the lowest free channel in track order, skipping the
/// percussion channel. The result has one channel per request, in the same order.
pub fn allocate(requests: &[Option<Channel>]) -> Result<Vec<Channel>, ChannelError> {
    let mut owner: [Option<usize>; Channel::COUNT as usize] = [None; Channel::COUNT as usize];
    for (track, request) in requests.iter().enumerate() {
        if let Some(channel) = *request {
            let slot = &mut owner[channel.index() as usize];
            if let Some(first) = *slot {
                return Err(ChannelError::ChannelConflict {
                    channel,
                    first,
                    second: track,
                });
            }
            *slot = Some(track);
        }
    }

    let mut free = Channel::assignable().filter(|ch| owner[ch.index() as usize].is_none());
    requests
        .iter()
        .enumerate()
        .map(|(track, request)| -> Result<Channel, ChannelError> {
            let channel = match *request {
                Some(channel) => channel,
                None => free
                    .next()
                    .ok_or(ChannelError::ChannelExhaustion { track })?,
            };
            debug!("track {} plays on channel {}", track + 1, channel);
            Ok(channel)
        })
        .collect()
}
