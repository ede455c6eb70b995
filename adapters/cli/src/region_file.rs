//! Single-line region snapshots that let a cave be replayed later.
//!
//! The format is `necrowarp:v1:<width>x<height>:<payload>` where the payload is
//! unpadded base64 over a JSON document holding the border and every cell.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use necrowarp_core::{Bounds, CellState, Extent};
use necrowarp_world::{GenerationError, Map, Region};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SNAPSHOT_DOMAIN: &str = "necrowarp";
const SNAPSHOT_VERSION: &str = "v1";
const FIELD_DELIMITER: char = ':';

/// Terrain of a compiled map captured for transfer.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RegionSnapshot {
    bounds: Bounds,
    cells: Vec<CellState>,
}

#[derive(Serialize, Deserialize)]
struct SerializableSnapshot {
    border: (i32, i32),
    cells: Vec<CellState>,
}

impl RegionSnapshot {
    pub(crate) fn capture(map: &Map) -> Self {
        Self {
            bounds: map.bounds(),
            cells: map.cells().to_vec(),
        }
    }

    /// Encodes the snapshot into a single line.
    pub(crate) fn encode(&self) -> Result<String, RegionFileError> {
        let border = self.bounds.border();
        let payload = SerializableSnapshot {
            border: (border.width(), border.height()),
            cells: self.cells.clone(),
        };
        let json = serde_json::to_vec(&payload).map_err(RegionFileError::InvalidPayload)?;
        let extent = self.bounds.extent();
        Ok(format!(
            "{SNAPSHOT_DOMAIN}:{SNAPSHOT_VERSION}:{}x{}:{}",
            extent.width(),
            extent.height(),
            STANDARD_NO_PAD.encode(json)
        ))
    }

    /// Decodes a snapshot from its single-line representation.
    pub(crate) fn decode(value: &str) -> Result<Self, RegionFileError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(RegionFileError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(RegionFileError::MissingPrefix)?;
        let version = parts.next().ok_or(RegionFileError::MissingVersion)?;
        let dimensions = parts.next().ok_or(RegionFileError::MissingDimensions)?;
        let payload = parts.next().ok_or(RegionFileError::MissingPayload)?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(RegionFileError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(RegionFileError::UnsupportedVersion(version.to_owned()));
        }

        let extent = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(RegionFileError::InvalidEncoding)?;
        let decoded: SerializableSnapshot =
            serde_json::from_slice(&bytes).map_err(RegionFileError::InvalidPayload)?;
        let (border_width, border_height) = decoded.border;

        Ok(Self {
            bounds: Bounds::new(extent, Extent::new(border_width, border_height)),
            cells: decoded.cells,
        })
    }

    /// Rebuilds a generator region from the captured cells.
    pub(crate) fn into_region(self) -> Result<Region, RegionFileError> {
        Ok(Region::from_cells(self.bounds, self.cells)?)
    }
}

/// Errors that can occur while decoding region files.
#[derive(Debug, Error)]
pub(crate) enum RegionFileError {
    #[error("region file was empty")]
    EmptyPayload,
    #[error("region string is missing the prefix")]
    MissingPrefix,
    #[error("region string is missing the version")]
    MissingVersion,
    #[error("region string is missing the map dimensions")]
    MissingDimensions,
    #[error("region string is missing the payload")]
    MissingPayload,
    #[error("region prefix '{0}' is not supported")]
    InvalidPrefix(String),
    #[error("region version '{0}' is not supported")]
    UnsupportedVersion(String),
    #[error("could not parse map dimensions '{0}'")]
    InvalidDimensions(String),
    #[error("could not decode region payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    #[error("could not parse region payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
    #[error("region cells do not match the map: {0}")]
    Mismatch(#[from] GenerationError),
}

fn parse_dimensions(dimensions: &str) -> Result<Extent, RegionFileError> {
    let invalid = || RegionFileError::InvalidDimensions(dimensions.to_owned());
    let (width, height) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let width = width.trim().parse::<i32>().map_err(|_| invalid())?;
    let height = height.trim().parse::<i32>().map_err(|_| invalid())?;

    if width <= 0 || height <= 0 {
        return Err(invalid());
    }

    Ok(Extent::new(width, height))
}
