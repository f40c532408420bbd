//! Delta encodings of the interval variants
//!
//! Records are big-endian `i64` fields. The first record of a sequence is
//! stored verbatim. Every later record stores its start relative to the
//! previous end, its end relative to its own start and its tag relative to
//! the previous tag. Differences wrap, so every representable sequence
//! round-trips exactly.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

use crate::error::{Error, Result};
use crate::interval::{Interval, SimpleInterval, TaggedInterval};

/// Per-variant record layout
pub trait DeltaCodec: Interval {
    /// One-byte variant discriminator written by versioned headers
    const VARIANT: u8;

    /// Write this interval, delta-encoded against `previous`
    fn encode<W: Write>(&self, previous: Option<&Self>, output: &mut W) -> io::Result<()>;

    /// Read one interval, delta-decoded against `previous`
    fn decode<R: Read>(previous: Option<&Self>, input: &mut R) -> Result<Self>;
}

/// Read the start and end fields common to both variants
fn decode_bounds<R: Read>(previous_end: Option<i64>, input: &mut R) -> Result<(i64, i64)> {
    let start_field = input.read_i64::<BigEndian>()?;
    let end_field = input.read_i64::<BigEndian>()?;
    Ok(match previous_end {
        None => (start_field, end_field),
        Some(previous_end) => {
            let start = previous_end.wrapping_add(start_field);
            (start, start.wrapping_add(end_field))
        }
    })
}

fn encode_bounds<W: Write>(
    start: i64,
    end: i64,
    previous_end: Option<i64>,
    output: &mut W,
) -> io::Result<()> {
    match previous_end {
        None => {
            output.write_i64::<BigEndian>(start)?;
            output.write_i64::<BigEndian>(end)
        }
        Some(previous_end) => {
            output.write_i64::<BigEndian>(start.wrapping_sub(previous_end))?;
            output.write_i64::<BigEndian>(end.wrapping_sub(start))
        }
    }
}

fn corrupt(start: i64, end: i64) -> Error {
    Error::CorruptData(format!("decoded interval end {} precedes start {}", end, start))
}

impl DeltaCodec for SimpleInterval {
    const VARIANT: u8 = 1;

    fn encode<W: Write>(&self, previous: Option<&Self>, output: &mut W) -> io::Result<()> {
        encode_bounds(self.start(), self.end(), previous.map(|p| p.end()), output)
    }

    fn decode<R: Read>(previous: Option<&Self>, input: &mut R) -> Result<Self> {
        let (start, end) = decode_bounds(previous.map(|p| p.end()), input)?;
        SimpleInterval::try_new(start, end).map_err(|_| corrupt(start, end))
    }
}

impl DeltaCodec for TaggedInterval {
    const VARIANT: u8 = 2;

    fn encode<W: Write>(&self, previous: Option<&Self>, output: &mut W) -> io::Result<()> {
        encode_bounds(self.start(), self.end(), previous.map(|p| p.end()), output)?;
        let tag = match previous {
            None => self.tag(),
            Some(previous) => self.tag().wrapping_sub(previous.tag()),
        };
        output.write_i64::<BigEndian>(tag)
    }

    fn decode<R: Read>(previous: Option<&Self>, input: &mut R) -> Result<Self> {
        let (start, end) = decode_bounds(previous.map(|p| p.end()), input)?;
        let tag_field = input.read_i64::<BigEndian>()?;
        let tag = match previous {
            None => tag_field,
            Some(previous) => previous.tag().wrapping_add(tag_field),
        };
        TaggedInterval::try_new(start, end, tag).map_err(|_| corrupt(start, end))
    }
}
