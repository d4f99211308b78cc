use std::io::Read;

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use thiserror::Error;
use unit_paths_core::{CodecError, Command, Event, SaveFormat, UnitId, UnitPath};
use unit_paths_world::{self as world, query, World};

const SNAPSHOT_DOMAIN: &str = "paths";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the entry count and payload.
pub(crate) const SNAPSHOT_HEADER: &str = "paths:v1";
/// Delimiter used to separate the prefix, entry count and payload.
const FIELD_DELIMITER: char = ':';

/// Paths owned by units, captured for transfer between sessions.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct PathSnapshot {
    /// Owning unit and its path, in unit order.
    pub(crate) entries: Vec<(UnitId, UnitPath)>,
}

impl PathSnapshot {
    /// Captures every path currently owned by a unit.
    #[must_use]
    pub(crate) fn capture(world: &World) -> Self {
        let entries = query::units(world)
            .filter_map(|unit| Some((unit.id, unit.path.clone()?)))
            .collect();
        Self { entries }
    }

    /// Hands every captured path back to its unit. Entries for units that no
    /// longer exist are skipped and reported.
    pub(crate) fn restore(&self, world: &mut World, events: &mut Vec<Event>) -> Vec<UnitId> {
        let mut missing = Vec::new();
        for (unit, path) in &self.entries {
            if query::unit(world, *unit).is_none() {
                missing.push(*unit);
                continue;
            }
            world::apply(
                world,
                Command::AssignPath {
                    unit: *unit,
                    path: path.clone(),
                },
                events,
            );
        }
        missing
    }

    /// Encodes the snapshot into a single-line string.
    pub(crate) fn encode(&self) -> Result<String, PathTransferError> {
        let mut bytes = Vec::new();
        for (unit, path) in &self.entries {
            bytes.extend_from_slice(&unit.get().to_le_bytes());
            path.save(&mut bytes, SaveFormat::Current)?;
        }
        let encoded = STANDARD_NO_PAD.encode(bytes);
        Ok(format!("{SNAPSHOT_HEADER}:{}:{encoded}", self.entries.len()))
    }

    /// Decodes a snapshot from its string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, PathTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(PathTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(PathTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(PathTransferError::MissingVersion)?;
        let count = parts.next().ok_or(PathTransferError::MissingCount)?;
        let payload = parts.next().ok_or(PathTransferError::MissingPayload)?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(PathTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(PathTransferError::UnsupportedVersion(version.to_owned()));
        }
        let count = count
            .trim()
            .parse::<usize>()
            .map_err(|_| PathTransferError::InvalidCount(count.to_owned()))?;

        let bytes = STANDARD_NO_PAD.decode(payload.as_bytes())?;
        let mut reader = bytes.as_slice();
        let mut entries = Vec::with_capacity(count.min(bytes.len()));
        for _ in 0..count {
            let mut id = [0_u8; 4];
            reader
                .read_exact(&mut id)
                .map_err(|_| PathTransferError::Truncated)?;
            let path = UnitPath::load(&mut reader, SaveFormat::Current)?;
            entries.push((UnitId::new(u32::from_le_bytes(id)), path));
        }
        if !reader.is_empty() {
            return Err(PathTransferError::TrailingBytes(reader.len()));
        }
        Ok(Self { entries })
    }
}

/// Errors that can occur while encoding or decoding path transfer strings.
#[derive(Debug, Error)]
pub(crate) enum PathTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("path snapshot was empty")]
    EmptyPayload,
    /// The prefix segment was missing.
    #[error("path snapshot is missing the prefix")]
    MissingPrefix,
    /// The version segment was missing.
    #[error("path snapshot is missing the version")]
    MissingVersion,
    /// The entry count segment was missing.
    #[error("path snapshot is missing the entry count")]
    MissingCount,
    /// The payload segment was missing.
    #[error("path snapshot is missing the payload")]
    MissingPayload,
    /// The snapshot used an unexpected prefix segment.
    #[error("snapshot prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The snapshot used an unsupported version identifier.
    #[error("snapshot version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The entry count could not be parsed.
    #[error("could not parse entry count '{0}'")]
    InvalidCount(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode snapshot payload: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    /// A path record could not be read or written.
    #[error("could not transfer path record: {0}")]
    InvalidRecord(#[from] CodecError),
    /// The payload ended before the announced entries.
    #[error("path snapshot ended early")]
    Truncated,
    /// Bytes were left over after the announced entries.
    #[error("{0} unexpected bytes after the last path")]
    TrailingBytes(usize),
}
