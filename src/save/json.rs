//! JSON export of the current snapshot.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::codec::{MapHeader, Player, Tile};
use crate::error::{Error, Result};
use crate::save::{views, SaveModel, TileGrid, WorldState};
use crate::storage;

pub const GAME_NAME: &str = "Battle of Polytopia";
pub const FILE_FORMAT: &str = "Polytopia Save State";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveJson {
    pub game_name: String,
    pub file_format: String,
    /// Row-major, `tiles[y][x]`
    pub tiles: Vec<Vec<Tile>>,
    pub players: Vec<Player>,
    pub header: MapHeader,
}

impl SaveJson {
    pub fn from_model(model: &SaveModel) -> Self {
        Self {
            game_name: GAME_NAME.to_string(),
            file_format: FILE_FORMAT.to_string(),
            tiles: model.tiles_current().rows().map(<[Tile]>::to_vec).collect(),
            players: model.players_current().to_vec(),
            header: model.map_header_current().clone(),
        }
    }

    /// Rebuild the tile grid, checking it against the header dimensions
    pub fn tile_grid(&self) -> Result<TileGrid> {
        let grid = TileGrid::from_rows(self.tiles.clone())?;
        if grid.width() != self.header.width as usize || grid.height() != self.header.height as usize {
            return Err(Error::InvalidRecord(format!(
                "tiles are {}x{} but the header says {}x{}",
                grid.width(),
                grid.height(),
                self.header.width,
                self.header.height
            )));
        }
        Ok(grid)
    }

    /// Replace the tiles and players of `world` with the document's.
    /// The document must match the world's version and map size.
    pub fn apply_to(&self, world: &mut WorldState) -> Result<()> {
        if self.header.format_version() != world.version() {
            return Err(Error::InvalidRecord(format!(
                "document is {} but the save is {}",
                self.header.format_version(),
                world.version()
            )));
        }
        let grid = self.tile_grid()?;
        if (grid.width(), grid.height()) != (world.tiles.width(), world.tiles.height()) {
            return Err(Error::InvalidRecord(format!(
                "document map is {}x{} but the save map is {}x{}",
                grid.width(),
                grid.height(),
                world.tiles.width(),
                world.tiles.height()
            )));
        }
        views::owner_tribe_map(&self.players)?;

        world.tiles = grid;
        world.players = self.players.clone();
        Ok(())
    }
}

pub fn export_json(model: &SaveModel, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let document = serde_json::to_vec_pretty(&SaveJson::from_model(model))?;
    storage::atomic_write(path, &document)?;
    info!(path = %path.display(), bytes = document.len(), "exported save as json");
    Ok(())
}

pub fn import_json(path: impl AsRef<Path>) -> Result<SaveJson> {
    let contents = fs::read(path.as_ref())?;
    let document: SaveJson = serde_json::from_slice(&contents)?;
    if document.game_name != GAME_NAME || document.file_format != FILE_FORMAT {
        return Err(Error::InvalidRecord(format!(
            "not a save export: game {:?}, format {:?}",
            document.game_name, document.file_format
        )));
    }
    Ok(document)
}
