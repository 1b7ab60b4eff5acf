//! Format versions and the per-record layout tables they select.
//!
//! The save format grows fields over game updates. Every version-dependent
//! record has a table of `(first version, layout)` rows, and its codec
//! branches on the fields of the layout that applies.

use serde::{Deserialize, Serialize};

/// Game version stored in the map header, which selects the record layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormatVersion(pub u32);

impl FormatVersion {
    /// Oldest layout this crate knows about
    pub const BASELINE: FormatVersion = FormatVersion(104);
    /// First version with per-tile flood fields
    pub const FLOODING: FormatVersion = FormatVersion(105);

    pub fn tile_layout(self) -> TileLayout {
        lookup(TILE_LAYOUTS, self)
    }

    pub fn map_header_layout(self) -> MapHeaderLayout {
        lookup(MAP_HEADER_LAYOUTS, self)
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Fields of a tile record that depend on the format version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLayout {
    /// Trailing flood flag and conditional flood level
    pub flood_fields: bool,
}

/// Fields of a map header that depend on the format version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapHeaderLayout {
    /// A zero width/height pair may precede the real dimensions
    pub placeholder_dimensions: bool,
}

pub const TILE_LAYOUTS: &[(FormatVersion, TileLayout)] = &[
    (FormatVersion(0), TileLayout { flood_fields: false }),
    (FormatVersion::FLOODING, TileLayout { flood_fields: true }),
];

pub const MAP_HEADER_LAYOUTS: &[(FormatVersion, MapHeaderLayout)] = &[
    (FormatVersion(0), MapHeaderLayout { placeholder_dimensions: true }),
];

/// Pick the last row whose first version is not newer than `version`.
/// Tables are sorted and start at version 0, so a row always matches.
fn lookup<L: Copy>(table: &[(FormatVersion, L)], version: FormatVersion) -> L {
    let mut layout = table[0].1;
    for &(first, candidate) in table {
        if version >= first {
            layout = candidate;
        }
    }
    layout
}
