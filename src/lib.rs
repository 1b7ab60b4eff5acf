//! Polytopia Save Codec
//!
//! Decodes and encodes Battle of Polytopia save files, and edits the
//! decompressed payload in place.

pub mod codec;
pub mod edit;
pub mod error;
pub mod offsets;
pub mod save;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
pub use codec::{
    FormatVersion, MapHeader, Tile, TileUnit, Unit, Improvement, Player,
    BinaryReader, BinaryWriter,
};
pub use offsets::{OffsetTracker, Region, RegionKey, Snapshot};
pub use save::{SaveModel, TileGrid, WorldState};
