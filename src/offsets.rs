//! Byte offsets of the regions visited while decoding a save payload.
//!
//! Keys are scoped by snapshot: a payload holds the turn-0 world followed by
//! the latest world, and both visit the same regions.

use std::fmt;
use std::ops::Range;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{Error, Result};

/// Which of the two world copies a region belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Snapshot {
    Initial,
    Current,
}

/// A named position in the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Region {
    MapHeaderStart,
    MapHeaderEnd,
    SquareSize,
    MapWidth,
    MapHeight,
    MapStart,
    MapEnd,
    TileStart { x: usize, y: usize },
    TileEnd { x: usize, y: usize },
    AllPlayersStart,
    AllPlayersEnd,
    /// Keyed by position in the player list
    PlayerStart(usize),
    PlayerEnd(usize),
    /// Keyed by player id
    PlayerAggressions(u8),
    PlayerCurrency(u8),
}

impl Region {
    pub fn at(self, snapshot: Snapshot) -> RegionKey {
        RegionKey { snapshot, region: self }
    }

    pub fn current(self) -> RegionKey {
        self.at(Snapshot::Current)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::TileStart { x, y } => write!(f, "TileStart({},{})", x, y),
            Region::TileEnd { x, y } => write!(f, "TileEnd({},{})", x, y),
            Region::PlayerStart(i) => write!(f, "PlayerStart({})", i),
            Region::PlayerEnd(i) => write!(f, "PlayerEnd({})", i),
            Region::PlayerAggressions(id) => write!(f, "PlayerAggressions({})", id),
            Region::PlayerCurrency(id) => write!(f, "PlayerCurrency({})", id),
            other => fmt::Debug::fmt(other, f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RegionKey {
    pub snapshot: Snapshot,
    pub region: Region,
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = match self.snapshot {
            Snapshot::Initial => "initial",
            Snapshot::Current => "current",
        };
        write!(f, "{}/{}", scope, self.region)
    }
}

/// Region key to payload offset, in visit order
#[derive(Debug, Clone, Default)]
pub struct OffsetTracker {
    offsets: IndexMap<RegionKey, u64>,
}

impl OffsetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: RegionKey, position: usize) {
        self.offsets.insert(key, position as u64);
    }

    pub fn get(&self, key: RegionKey) -> Option<u64> {
        self.offsets.get(&key).copied()
    }

    pub fn require(&self, key: RegionKey) -> Result<u64> {
        self.get(key).ok_or(Error::MissingOffset(key))
    }

    /// Byte range between two recorded keys
    pub fn span(&self, start: RegionKey, end: RegionKey) -> Result<Range<u64>> {
        let start_offset = self.require(start)?;
        let end_offset = self.require(end)?;
        if end_offset < start_offset {
            return Err(Error::InvalidRecord(format!(
                "region {} ends at {} before it starts at {}",
                start, end_offset, start_offset
            )));
        }
        Ok(start_offset..end_offset)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RegionKey, &u64)> {
        self.offsets.iter()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// A checkpoint sink that files positions under `snapshot`
    pub fn recorder(&mut self, snapshot: Snapshot) -> SnapshotRecorder<'_> {
        SnapshotRecorder { tracker: self, snapshot }
    }
}

/// Receives the payload positions of regions as a codec passes them
pub trait Checkpoint {
    fn mark(&mut self, region: Region, position: usize);
}

/// Codecs used outside a full decode report to nobody
impl Checkpoint for () {
    fn mark(&mut self, _region: Region, _position: usize) {}
}

pub struct SnapshotRecorder<'a> {
    tracker: &'a mut OffsetTracker,
    snapshot: Snapshot,
}

impl Checkpoint for SnapshotRecorder<'_> {
    fn mark(&mut self, region: Region, position: usize) {
        self.tracker.record(region.at(self.snapshot), position);
    }
}
