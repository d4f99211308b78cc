//! Save-game and network encodings for unit paths.
//!
//! Every record is written with bincode's fixed-width little-endian options so
//! the byte layout is exactly the declared field order without padding.

use std::io::{Read, Write};

use bincode::Options;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::{
    AirPath, BuilderPath, Fixed, GridPoint, GroundPath, Octant, PathKind, PathStep, UnitPath,
};

/// Largest step list accepted from a persisted or received stream.
pub const MAX_ENCODED_STEPS: usize = u16::MAX as usize;

/// Width of the ground path cursor in a save stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SaveFormat {
    /// Cursor stored as `u16`.
    Legacy,
    /// Cursor stored as `u32`.
    #[default]
    Current,
}

/// Failures raised while encoding or decoding path streams.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The underlying reader, writer or bincode encoding failed.
    #[error("path stream encoding failed: {0}")]
    Encoding(#[from] bincode::Error),
    /// A decoded step left the `-1..=1` neighbourhood.
    #[error("path step ({dx}, {dy}) is out of range")]
    StepOutOfRange {
        /// Decoded column displacement.
        dx: i8,
        /// Decoded row displacement.
        dy: i8,
    },
    /// The decoded cursor points past the decoded steps.
    #[error("step index {index} exceeds step count {count}")]
    CursorPastEnd {
        /// Decoded cursor.
        index: usize,
        /// Decoded step count.
        count: usize,
    },
    /// The stream declares more steps than the engine accepts.
    #[error("path declares {0} steps")]
    TooManySteps(usize),
    /// The decoded facing is not one of the eight octants.
    #[error("facing {0} is not an octant")]
    InvalidAngle(i8),
    /// The decoded flight length is negative.
    #[error("flight length {0} is negative")]
    InvalidLength(i16),
    /// The path kind tag is unknown.
    #[error("unknown path kind tag {0}")]
    UnknownPathKind(u8),
}

#[derive(Serialize, Deserialize)]
struct GroundHeaderLegacy {
    end_x: i16,
    end_y: i16,
    step_index: u16,
    step_count: u32,
}

#[derive(Serialize, Deserialize)]
struct GroundHeader {
    end_x: i16,
    end_y: i16,
    step_index: u32,
    step_count: u32,
}

#[derive(Serialize, Deserialize)]
struct StepRecord {
    dx: i8,
    dy: i8,
}

#[derive(Serialize, Deserialize)]
struct AirRecord {
    length: i16,
    angle: i8,
    start_x: i16,
    start_y: i16,
    end_x: i16,
    end_y: i16,
    step_x: i32,
    step_y: i32,
    delta_x: i32,
    delta_y: i32,
}

#[derive(Serialize, Deserialize)]
struct BuilderRecord {
    dx: i16,
    dy: i16,
}

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
}

fn put<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<(), CodecError> {
    options().serialize_into(writer, value)?;
    Ok(())
}

fn take<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<T, CodecError> {
    Ok(options().deserialize_from(reader)?)
}

fn put_steps<W: Write>(writer: &mut W, steps: &[PathStep]) -> Result<(), CodecError> {
    for step in steps {
        put(
            writer,
            &StepRecord {
                dx: step.dx(),
                dy: step.dy(),
            },
        )?;
    }
    Ok(())
}

fn take_steps<R: Read>(reader: &mut R, count: usize) -> Result<Vec<PathStep>, CodecError> {
    if count > MAX_ENCODED_STEPS {
        return Err(CodecError::TooManySteps(count));
    }
    let mut steps = Vec::with_capacity(count);
    for _ in 0..count {
        let record: StepRecord = take(reader)?;
        if !PathStep::is_valid(record.dx, record.dy) {
            return Err(CodecError::StepOutOfRange {
                dx: record.dx,
                dy: record.dy,
            });
        }
        steps.push(PathStep::new(record.dx, record.dy));
    }
    Ok(steps)
}

fn narrow<T: TryFrom<usize>>(value: usize) -> Result<T, CodecError> {
    T::try_from(value).map_err(|_| CodecError::TooManySteps(value))
}

impl GroundPath {
    /// Writes the path in save-game layout.
    pub fn save<W: Write>(&self, writer: &mut W, format: SaveFormat) -> Result<(), CodecError> {
        let end = self.end();
        let step_count = narrow::<u32>(self.steps().len())?;
        match format {
            SaveFormat::Legacy => put(
                writer,
                &GroundHeaderLegacy {
                    end_x: end.x(),
                    end_y: end.y(),
                    step_index: narrow(self.step_index())?,
                    step_count,
                },
            )?,
            SaveFormat::Current => put(
                writer,
                &GroundHeader {
                    end_x: end.x(),
                    end_y: end.y(),
                    step_index: narrow(self.step_index())?,
                    step_count,
                },
            )?,
        }
        put_steps(writer, self.steps())
    }

    /// Reads a path written by [`GroundPath::save`].
    pub fn load<R: Read>(reader: &mut R, format: SaveFormat) -> Result<Self, CodecError> {
        let (end_x, end_y, step_index, step_count) = match format {
            SaveFormat::Legacy => {
                let header: GroundHeaderLegacy = take(reader)?;
                (
                    header.end_x,
                    header.end_y,
                    usize::from(header.step_index),
                    header.step_count,
                )
            }
            SaveFormat::Current => {
                let header: GroundHeader = take(reader)?;
                (
                    header.end_x,
                    header.end_y,
                    usize::try_from(header.step_index).unwrap_or(usize::MAX),
                    header.step_count,
                )
            }
        };
        let count = usize::try_from(step_count).unwrap_or(usize::MAX);
        let steps = take_steps(reader, count)?;
        Self::from_parts(GridPoint::new(end_x, end_y), steps, step_index).ok_or(
            CodecError::CursorPastEnd {
                index: step_index,
                count,
            },
        )
    }

    /// Writes the remaining steps as a network resync packet.
    pub fn write_packet<W: Write>(&self, writer: &mut W) -> Result<(), CodecError> {
        let remaining = self.remaining();
        put(writer, &narrow::<u16>(remaining.len())?)?;
        put_steps(writer, remaining)
    }

    /// Replaces the remaining steps with those carried by a resync packet.
    pub fn read_packet<R: Read>(&mut self, reader: &mut R) -> Result<(), CodecError> {
        let count: u16 = take(reader)?;
        let steps = take_steps(reader, usize::from(count))?;
        self.replace_remaining(steps);
        Ok(())
    }
}

impl AirPath {
    /// Writes the flight in save-game layout.
    pub fn save<W: Write>(&self, writer: &mut W) -> Result<(), CodecError> {
        let (start_x, start_y) = self.start();
        let (step_x, step_y) = self.progress();
        let (delta_x, delta_y) = self.delta();
        put(
            writer,
            &AirRecord {
                length: self.length(),
                angle: self.angle().get() as i8,
                start_x,
                start_y,
                end_x: self.end().x(),
                end_y: self.end().y(),
                step_x: step_x.raw(),
                step_y: step_y.raw(),
                delta_x: delta_x.raw(),
                delta_y: delta_y.raw(),
            },
        )
    }

    /// Reads a flight written by [`AirPath::save`].
    pub fn load<R: Read>(reader: &mut R) -> Result<Self, CodecError> {
        let record: AirRecord = take(reader)?;
        let angle = u8::try_from(record.angle)
            .ok()
            .and_then(Octant::try_new)
            .ok_or(CodecError::InvalidAngle(record.angle))?;
        if record.length < 0 {
            return Err(CodecError::InvalidLength(record.length));
        }
        Ok(Self::from_persisted(
            record.length,
            angle,
            (record.start_x, record.start_y),
            GridPoint::new(record.end_x, record.end_y),
            (Fixed::from_raw(record.step_x), Fixed::from_raw(record.step_y)),
            (
                Fixed::from_raw(record.delta_x),
                Fixed::from_raw(record.delta_y),
            ),
        ))
    }
}

impl BuilderPath {
    /// Writes the facing offset.
    pub fn save<W: Write>(&self, writer: &mut W) -> Result<(), CodecError> {
        let (dx, dy) = self.direction();
        put(writer, &BuilderRecord { dx, dy })
    }

    /// Reads a facing offset written by [`BuilderPath::save`].
    pub fn load<R: Read>(reader: &mut R) -> Result<Self, CodecError> {
        let record: BuilderRecord = take(reader)?;
        Ok(Self::new(record.dx, record.dy))
    }
}

impl UnitPath {
    /// Writes the kind tag followed by the variant's save-game layout.
    pub fn save<W: Write>(&self, writer: &mut W, format: SaveFormat) -> Result<(), CodecError> {
        put(writer, &self.kind().tag())?;
        match self {
            Self::Ground(path) => path.save(writer, format),
            Self::Air(path) => path.save(writer),
            Self::Builder(path) => path.save(writer),
        }
    }

    /// Reads a tagged path written by [`UnitPath::save`].
    pub fn load<R: Read>(reader: &mut R, format: SaveFormat) -> Result<Self, CodecError> {
        let tag: u8 = take(reader)?;
        match PathKind::from_tag(tag) {
            Some(PathKind::Ground) => Ok(Self::Ground(GroundPath::load(reader, format)?)),
            Some(PathKind::Air) => Ok(Self::Air(AirPath::load(reader)?)),
            Some(PathKind::Builder) => Ok(Self::Builder(BuilderPath::load(reader)?)),
            None => Err(CodecError::UnknownPathKind(tag)),
        }
    }

    /// Writes a network resync packet. Only ground paths are transmitted
    /// mid-route; other variants write nothing and report `false`.
    pub fn write_packet<W: Write>(&self, writer: &mut W) -> Result<bool, CodecError> {
        match self {
            Self::Ground(path) => {
                path.write_packet(writer)?;
                Ok(true)
            }
            Self::Air(_) | Self::Builder(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AirPathParams, PixelPoint};

    fn sample_ground() -> GroundPath {
        let mut path = GroundPath::starting_at(GridPoint::new(2, 3));
        path.add_step(PathStep::new(1, 0));
        path.add_step(PathStep::new(1, 1));
        path.add_step(PathStep::new(0, -1));
        path.advance();
        path
    }

    #[test]
    fn ground_save_layout_matches_field_order() {
        let path = sample_ground();
        let mut bytes = Vec::new();
        path.save(&mut bytes, SaveFormat::Current).expect("save");

        assert_eq!(bytes.len(), 2 + 2 + 4 + 4 + 3 * 2);
        assert_eq!(&bytes[0..2], &4i16.to_le_bytes());
        assert_eq!(&bytes[2..4], &3i16.to_le_bytes());
        assert_eq!(&bytes[4..8], &1u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &3u32.to_le_bytes());
        assert_eq!(&bytes[12..14], &[1, 0]);
        assert_eq!(bytes[17] as i8, -1);

        let restored = GroundPath::load(&mut bytes.as_slice(), SaveFormat::Current).expect("load");
        assert_eq!(restored, path);
    }

    #[test]
    fn legacy_format_narrows_cursor() {
        let path = sample_ground();
        let mut bytes = Vec::new();
        path.save(&mut bytes, SaveFormat::Legacy).expect("save");
        assert_eq!(bytes.len(), 2 + 2 + 2 + 4 + 3 * 2);
        let restored = GroundPath::load(&mut bytes.as_slice(), SaveFormat::Legacy).expect("load");
        assert_eq!(restored.step_index(), 1);
    }

    #[test]
    fn cursor_past_end_is_rejected() {
        let mut bytes = Vec::new();
        put(
            &mut bytes,
            &GroundHeader {
                end_x: 0,
                end_y: 0,
                step_index: 2,
                step_count: 1,
            },
        )
        .expect("header");
        put(&mut bytes, &StepRecord { dx: 1, dy: 0 }).expect("step");

        let error = GroundPath::load(&mut bytes.as_slice(), SaveFormat::Current)
            .expect_err("cursor past end");
        assert!(matches!(
            error,
            CodecError::CursorPastEnd { index: 2, count: 1 }
        ));
    }

    #[test]
    fn out_of_range_step_is_rejected() {
        let mut bytes = Vec::new();
        put(&mut bytes, &1u16).expect("count");
        put(&mut bytes, &StepRecord { dx: 2, dy: 0 }).expect("step");

        let mut path = GroundPath::starting_at(GridPoint::new(0, 0));
        let error = path
            .read_packet(&mut bytes.as_slice())
            .expect_err("invalid step");
        assert!(matches!(error, CodecError::StepOutOfRange { dx: 2, dy: 0 }));
    }

    #[test]
    fn packet_carries_only_remaining_steps() {
        let path = sample_ground();
        let mut bytes = Vec::new();
        path.write_packet(&mut bytes).expect("packet");
        assert_eq!(bytes.len(), 2 + 2 * 2);
        assert_eq!(&bytes[0..2], &2u16.to_le_bytes());

        let mut replica = GroundPath::starting_at(path.end());
        replica.read_packet(&mut bytes.as_slice()).expect("read");
        assert_eq!(replica.remaining(), path.remaining());
        assert_eq!(replica.step_index(), 0);
    }

    #[test]
    fn air_save_layout_is_thirty_one_bytes() {
        let mut path = AirPath::new(AirPathParams {
            start: PixelPoint::new(32, 96),
            end: GridPoint::new(3, 1),
            distance_x: 192,
            distance_y: 0,
            euclidean_distance: 192,
            length: 24,
            angle: Octant::EAST,
        })
        .expect("flight");
        let _ = path.advance();

        let mut bytes = Vec::new();
        path.save(&mut bytes).expect("save");
        assert_eq!(bytes.len(), 2 + 1 + 2 * 4 + 4 * 4);
        assert_eq!(&bytes[0..2], &23i16.to_le_bytes());
        assert_eq!(bytes[2], 2);

        let restored = AirPath::load(&mut bytes.as_slice()).expect("load");
        assert_eq!(restored, path);
    }

    #[test]
    fn invalid_air_angle_is_rejected() {
        let mut bytes = Vec::new();
        put(
            &mut bytes,
            &AirRecord {
                length: 4,
                angle: 9,
                start_x: 0,
                start_y: 0,
                end_x: 0,
                end_y: 0,
                step_x: 0,
                step_y: 0,
                delta_x: 0,
                delta_y: 0,
            },
        )
        .expect("record");
        assert!(matches!(
            AirPath::load(&mut bytes.as_slice()),
            Err(CodecError::InvalidAngle(9))
        ));
    }

    #[test]
    fn tagged_paths_round_trip() {
        let paths = [
            UnitPath::Ground(sample_ground()),
            UnitPath::Builder(BuilderPath::new(-1, 1)),
        ];
        let mut bytes = Vec::new();
        for path in &paths {
            path.save(&mut bytes, SaveFormat::Current).expect("save");
        }
        let mut reader = bytes.as_slice();
        for path in &paths {
            let restored = UnitPath::load(&mut reader, SaveFormat::Current).expect("load");
            assert_eq!(&restored, path);
        }
        assert!(reader.is_empty());
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let bytes = [7u8];
        assert!(matches!(
            UnitPath::load(&mut bytes.as_slice(), SaveFormat::Current),
            Err(CodecError::UnknownPathKind(7))
        ));
    }

    #[test]
    fn only_ground_paths_write_packets() {
        let mut bytes = Vec::new();
        let builder = UnitPath::Builder(BuilderPath::new(1, 0));
        assert!(!builder.write_packet(&mut bytes).expect("packet"));
        assert!(bytes.is_empty());
    }
}
