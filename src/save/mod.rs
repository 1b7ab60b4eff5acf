//! Whole-payload decode and encode.
//!
//! A decompressed save holds two world snapshots separated by a three byte
//! pad: the world as it was at turn zero and the world as it is now.
//!
//! ```text
//! MapHeader | tiles | players | pad | MapHeader | tiles | players | trailer
//! ```

pub mod json;
pub mod views;

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::codec::{
    BinaryReader, BinaryWriter, FormatVersion, MapHeader, Player, Tile, TileContext,
};
use crate::error::{Error, Result};
use crate::offsets::{Checkpoint, OffsetTracker, Region, Snapshot};
use crate::storage;

/// A decoded save payload
#[derive(Debug, Clone)]
pub struct SaveModel {
    pub initial: WorldState,
    pub current: WorldState,
    pub section_padding: [u8; 3],
    /// Bytes after the current player list, kept verbatim
    pub trailer: Vec<u8>,
    offsets: OffsetTracker,
    format_version: FormatVersion,
}

impl SaveModel {
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        let mut offsets = OffsetTracker::new();

        let initial = WorldState::read(&mut reader, &mut offsets.recorder(Snapshot::Initial))?;
        let section_padding = reader.read_array()?;
        let current = WorldState::read(&mut reader, &mut offsets.recorder(Snapshot::Current))?;
        let trailer = reader.read_remaining().to_vec();

        let format_version = current.header.format_version();
        debug!(
            version = %format_version,
            width = current.tiles.width(),
            height = current.tiles.height(),
            players = current.players.len(),
            trailer = trailer.len(),
            "decoded save payload"
        );

        Ok(Self { initial, current, section_padding, trailer, offsets, format_version })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut writer = BinaryWriter::with_capacity(self.current.tiles.len() * 64 * 2);
        self.initial.write(&mut writer)?;
        writer.write_bytes(&self.section_padding);
        self.current.write(&mut writer)?;
        writer.write_bytes(&self.trailer);
        Ok(writer.into_vec())
    }

    /// Decode a decompressed payload file
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read(path.as_ref())?;
        Self::decode(&data)
    }

    /// Encode and replace `path` atomically
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        storage::atomic_write(path.as_ref(), &self.encode()?)
    }

    /// Offsets recorded by the decode that produced this model
    pub fn offsets(&self) -> &OffsetTracker {
        &self.offsets
    }

    pub fn format_version(&self) -> FormatVersion {
        self.format_version
    }

    pub fn world(&self, snapshot: Snapshot) -> &WorldState {
        match snapshot {
            Snapshot::Initial => &self.initial,
            Snapshot::Current => &self.current,
        }
    }

    pub fn map_width(&self) -> usize {
        self.current.tiles.width()
    }

    pub fn map_height(&self) -> usize {
        self.current.tiles.height()
    }

    pub fn map_header_initial(&self) -> &MapHeader {
        &self.initial.header
    }

    pub fn map_header_current(&self) -> &MapHeader {
        &self.current.header
    }

    pub fn tiles_initial(&self) -> &TileGrid {
        &self.initial.tiles
    }

    pub fn tiles_current(&self) -> &TileGrid {
        &self.current.tiles
    }

    pub fn players_initial(&self) -> &[Player] {
        &self.initial.players
    }

    pub fn players_current(&self) -> &[Player] {
        &self.current.players
    }
}

// ============================================================================
// WorldState
// ============================================================================

/// One snapshot of the world
#[derive(Debug, Clone, PartialEq)]
pub struct WorldState {
    pub header: MapHeader,
    pub tiles: TileGrid,
    pub players: Vec<Player>,
}

impl WorldState {
    pub fn read(reader: &mut BinaryReader, marks: &mut impl Checkpoint) -> Result<Self> {
        marks.mark(Region::MapHeaderStart, reader.position());
        let header = MapHeader::read_with(reader, marks)?;
        marks.mark(Region::MapHeaderEnd, reader.position());

        let tiles = TileGrid::read(
            reader,
            header.width as usize,
            header.height as usize,
            header.format_version(),
            marks,
        )?;
        let players = read_player_list(reader, marks)?;

        Ok(Self { header, tiles, players })
    }

    pub fn write(&self, writer: &mut BinaryWriter) -> Result<()> {
        self.header.write(writer)?;
        self.tiles.write(writer, self.header.format_version())?;
        writer.write_count_u16("players", self.players.len())?;
        for player in &self.players {
            player.write(writer)?;
        }
        Ok(())
    }

    pub fn version(&self) -> FormatVersion {
        self.header.format_version()
    }

    pub fn player(&self, id: u8) -> Result<&Player> {
        self.players.iter().find(|p| p.id == id).ok_or(Error::PlayerNotFound(id))
    }

    pub fn player_mut(&mut self, id: u8) -> Result<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id).ok_or(Error::PlayerNotFound(id))
    }
}

fn read_player_list(reader: &mut BinaryReader, marks: &mut impl Checkpoint) -> Result<Vec<Player>> {
    marks.mark(Region::AllPlayersStart, reader.position());
    let count = reader.read_u16_le()? as usize;
    debug!(count, "reading player list");

    let mut seen = [false; 256];
    let mut players = Vec::with_capacity(count);
    for index in 0..count {
        marks.mark(Region::PlayerStart(index), reader.position());
        let player = Player::read_with(reader, marks)?;
        marks.mark(Region::PlayerEnd(index), reader.position());

        if std::mem::replace(&mut seen[player.id as usize], true) {
            return Err(Error::DuplicatePlayerId(player.id));
        }
        players.push(player);
    }
    marks.mark(Region::AllPlayersEnd, reader.position());
    Ok(players)
}

// ============================================================================
// TileGrid
// ============================================================================

/// Row-major tile storage addressed by `(x, y)` = (column, row)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Build a grid from rows, checking every tile sits where it claims to
    pub fn from_rows(rows: Vec<Vec<Tile>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut tiles = Vec::with_capacity(width * height);
        for (row, cells) in rows.into_iter().enumerate() {
            if cells.len() != width {
                return Err(Error::InvalidRecord(format!(
                    "row {} has {} tiles, expected {}",
                    row,
                    cells.len(),
                    width
                )));
            }
            for (col, tile) in cells.into_iter().enumerate() {
                if tile.x as usize != col || tile.y as usize != row {
                    return Err(Error::TileCoordinateMismatch { row, col, x: tile.x, y: tile.y });
                }
                tiles.push(tile);
            }
        }
        Ok(Self { width, height, tiles })
    }

    pub fn read(
        reader: &mut BinaryReader,
        width: usize,
        height: usize,
        version: FormatVersion,
        marks: &mut impl Checkpoint,
    ) -> Result<Self> {
        debug!(width, height, %version, "reading tile grid");
        marks.mark(Region::MapStart, reader.position());
        let mut tiles = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                marks.mark(Region::TileStart { x: col, y: row }, reader.position());
                tiles.push(Tile::read(reader, &TileContext { version, row, col })?);
                marks.mark(Region::TileEnd { x: col, y: row }, reader.position());
            }
        }
        marks.mark(Region::MapEnd, reader.position());
        Ok(Self { width, height, tiles })
    }

    pub fn write(&self, writer: &mut BinaryWriter, version: FormatVersion) -> Result<()> {
        for tile in &self.tiles {
            tile.write(writer, version)?;
        }
        Ok(())
    }

    pub fn to_bytes(&self, version: FormatVersion) -> Result<Vec<u8>> {
        let mut writer = BinaryWriter::with_capacity(self.tiles.len() * 64);
        self.write(&mut writer, version)?;
        Ok(writer.into_vec())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Index of `(x, y)` in row-major order
    pub fn check_bounds(&self, x: usize, y: usize) -> Result<usize> {
        if x >= self.width || y >= self.height {
            return Err(Error::TileOutOfBounds { x, y, width: self.width, height: self.height });
        }
        Ok(y * self.width + x)
    }

    pub fn get(&self, x: usize, y: usize) -> Result<&Tile> {
        let index = self.check_bounds(x, y)?;
        Ok(&self.tiles[index])
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Result<&mut Tile> {
        let index = self.check_bounds(x, y)?;
        Ok(&mut self.tiles[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.tiles.iter_mut()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> {
        self.tiles.chunks(self.width.max(1))
    }

    /// The up to eight in-bounds tiles around `(x, y)`
    pub fn neighbours(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        let mut around = Vec::with_capacity(8);
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let (nx, ny) = (x as i64 + dx, y as i64 + dy);
                if nx >= 0 && ny >= 0 && (nx as usize) < self.width && (ny as usize) < self.height {
                    around.push((nx as usize, ny as usize));
                }
            }
        }
        around
    }

    /// Grow to `width` x `height` with empty tiles: new columns on existing
    /// rows first, then whole new rows.
    pub fn expand(&mut self, width: usize, height: usize, version: FormatVersion) {
        let width = width.max(self.width);
        let height = height.max(self.height);
        let mut tiles = Vec::with_capacity(width * height);
        let mut old = std::mem::take(&mut self.tiles).into_iter();
        for y in 0..height {
            for x in 0..width {
                if x < self.width && y < self.height {
                    if let Some(tile) = old.next() {
                        tiles.push(tile);
                        continue;
                    }
                }
                tiles.push(Tile::empty(x as u32, y as u32, version));
            }
        }
        self.width = width;
        self.height = height;
        self.tiles = tiles;
    }
}
