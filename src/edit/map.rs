//! Tile and map edits.

use std::path::Path;

use tracing::{info, warn};

use crate::codec::tile::altitude_for_terrain;
use crate::codec::{Improvement, Tile, TileImprovement, CITY_IMPROVEMENT, NATURE_PLAYER_ID};
use crate::edit::shift_write::{patch_scalar, Scalar};
use crate::edit::{write_map, write_players, write_tile};
use crate::error::{Error, Result};
use crate::offsets::Region;
use crate::save::{SaveModel, TileGrid, WorldState};

/// Map sides are stored in a byte-sized range
pub const MAX_DIMENSION: u32 = 256;

// ============================================================================
// Map size
// ============================================================================

/// Both sides below 256, neither smaller than now, and at least one larger
pub fn check_new_dimensions(width: u32, height: u32, existing_width: u32, existing_height: u32) -> Result<()> {
    for value in [width, height] {
        if value >= MAX_DIMENSION {
            return Err(Error::DimensionOutOfRange { value });
        }
    }
    if width < existing_width || (width == existing_width && height == existing_height) {
        return Err(Error::DimensionNotLarger { requested: width, existing: existing_width });
    }
    if height < existing_height {
        return Err(Error::DimensionNotLarger { requested: height, existing: existing_height });
    }
    Ok(())
}

/// Grow the tile grid and keep the header in step with it
pub fn grow_world(world: &mut WorldState, width: usize, height: usize) {
    let version = world.version();
    world.tiles.expand(width, height, version);
    world.header.width = world.tiles.width() as u16;
    world.header.height = world.tiles.height() as u16;
    world.header.square_size = world.tiles.width().min(world.tiles.height()) as u32;
}

/// Grow the current map to `width` x `height`, filling with empty tiles
pub fn resize_map(path: &Path, width: u32, height: u32) -> Result<()> {
    let model = SaveModel::read_file(path)?;
    resize_loaded(path, model, width, height)
}

/// Add rows at the bottom of the map
pub fn expand_rows(path: &Path, height: u32) -> Result<()> {
    let model = SaveModel::read_file(path)?;
    let existing = model.map_height() as u32;
    if height < MAX_DIMENSION && height <= existing {
        return Err(Error::DimensionNotLarger { requested: height, existing });
    }
    let width = model.map_width() as u32;
    resize_loaded(path, model, width, height)
}

/// Add columns on the right of the map
pub fn expand_columns(path: &Path, width: u32) -> Result<()> {
    let model = SaveModel::read_file(path)?;
    let existing = model.map_width() as u32;
    if width < MAX_DIMENSION && width <= existing {
        return Err(Error::DimensionNotLarger { requested: width, existing });
    }
    let height = model.map_height() as u32;
    resize_loaded(path, model, width, height)
}

/// Grow both sides to `size`
pub fn expand_square(path: &Path, size: u32) -> Result<()> {
    let model = SaveModel::read_file(path)?;
    if size < MAX_DIMENSION {
        for existing in [model.map_width() as u32, model.map_height() as u32] {
            if size <= existing {
                return Err(Error::DimensionNotLarger { requested: size, existing });
            }
        }
    }
    resize_loaded(path, model, size, size)
}

fn resize_loaded(path: &Path, mut model: SaveModel, width: u32, height: u32) -> Result<()> {
    let (old_width, old_height) = (model.map_width(), model.map_height());
    check_new_dimensions(width, height, old_width as u32, old_height as u32)?;

    // the header sits before the map, so these survive the map rewrite
    let offsets = model.offsets();
    let square_at = offsets.require(Region::SquareSize.current())?;
    let width_at = offsets.require(Region::MapWidth.current())?;
    let height_at = offsets.require(Region::MapHeight.current())?;

    grow_world(&mut model.current, width as usize, height as usize);
    write_map(path, &model.current)?;
    patch_scalar(path, square_at, Scalar::U32(width.min(height)))?;
    patch_scalar(path, width_at, Scalar::U16(width as u16))?;
    patch_scalar(path, height_at, Scalar::U16(height as u16))?;

    info!(old_width, old_height, width, height, "resized map");
    Ok(())
}

// ============================================================================
// Visibility
// ============================================================================

/// Make one tile visible to `tribe`. Returns whether anything changed.
pub fn reveal_tile(path: &Path, x: usize, y: usize, tribe: u8) -> Result<bool> {
    let mut model = SaveModel::read_file(path)?;
    if !model.current.tiles.get_mut(x, y)?.reveal_to(tribe) {
        warn!(x, y, tribe, "tile already visible");
        return Ok(false);
    }
    write_tile(path, &model.current, x, y)?;
    info!(x, y, tribe, "revealed tile");
    Ok(true)
}

/// Make every tile visible to `tribe`. Returns the number of tiles revealed.
pub fn reveal_all_tiles(path: &Path, tribe: u8) -> Result<usize> {
    let mut model = SaveModel::read_file(path)?;
    let revealed = model.current.tiles.iter_mut().map(|tile| tile.reveal_to(tribe)).filter(|&changed| changed).count();
    if revealed == 0 {
        warn!(tribe, "every tile already visible");
        return Ok(0);
    }
    write_map(path, &model.current)?;
    info!(tribe, revealed, "revealed map");
    Ok(revealed)
}

// ============================================================================
// Units
// ============================================================================

/// Hand every unit and passenger owned by `old` to `new`
pub fn reassign_units(tiles: &mut TileGrid, old: u8, new: u8) -> usize {
    let mut converted = 0;
    for tile in tiles.iter_mut() {
        for unit in tile.units_mut() {
            if unit.owner == old {
                unit.owner = new;
                converted += 1;
            }
        }
    }
    converted
}

pub fn convert_tribe(path: &Path, old: u8, new: u8) -> Result<usize> {
    let mut model = SaveModel::read_file(path)?;
    let converted = reassign_units(&mut model.current.tiles, old, new);
    if converted == 0 {
        return Err(Error::NoUnitsForOwner(old));
    }
    write_map(path, &model.current)?;
    info!(old, new, converted, "converted units");
    Ok(converted)
}

/// Change the owner of the unit and passenger on a tile.
/// Returns false when the tile has no unit.
pub fn modify_unit_owner(path: &Path, x: usize, y: usize, owner: u8) -> Result<bool> {
    let mut model = SaveModel::read_file(path)?;
    let tile = model.current.tiles.get_mut(x, y)?;
    if tile.unit.is_none() {
        warn!(x, y, "no unit on tile");
        return Ok(false);
    }
    for unit in tile.units_mut() {
        info!(x, y, from = unit.owner, to = owner, unit = unit.id, "changing unit owner");
        unit.owner = owner;
    }
    write_tile(path, &model.current, x, y)?;
    Ok(true)
}

/// Change the kind of the unit on a tile. Returns false when there is none.
pub fn modify_unit_type(path: &Path, x: usize, y: usize, kind: u16) -> Result<bool> {
    let mut model = SaveModel::read_file(path)?;
    let Some(tile_unit) = model.current.tiles.get_mut(x, y)?.unit.as_mut() else {
        warn!(x, y, "no unit on tile");
        return Ok(false);
    };
    info!(x, y, from = tile_unit.unit.kind, to = kind, "changing unit type");
    tile_unit.unit.kind = kind;
    write_tile(path, &model.current, x, y)?;
    Ok(true)
}

// ============================================================================
// Terrain and cities
// ============================================================================

/// Set the terrain and the altitude that goes with it
pub fn modify_tile_terrain(path: &Path, x: usize, y: usize, terrain: u16) -> Result<()> {
    let mut model = SaveModel::read_file(path)?;
    let tile = model.current.tiles.get_mut(x, y)?;
    tile.terrain = terrain;
    tile.altitude = altitude_for_terrain(terrain);
    write_tile(path, &model.current, x, y)?;
    info!(x, y, terrain, "changed terrain");
    Ok(())
}

/// Put a new level-1 city owned by `tribe` on the tile
pub fn found_city(tile: &mut Tile, name: &str, tribe: u8) {
    tile.owner = tribe;
    tile.capital = 0;
    tile.capital_coords = [tile.x as i32, tile.y as i32];
    tile.improvement = Some(TileImprovement { kind: CITY_IMPROVEMENT, details: Improvement::new_city(name) });
}

pub fn add_city(path: &Path, x: usize, y: usize, name: &str, tribe: u8) -> Result<()> {
    let mut model = SaveModel::read_file(path)?;
    found_city(model.current.tiles.get_mut(x, y)?, name, tribe);
    write_tile(path, &model.current, x, y)?;
    info!(x, y, tribe, name, "added city");
    Ok(())
}

/// Replace a tile with an unowned empty field
pub fn reset_tile(path: &Path, x: usize, y: usize) -> Result<()> {
    let mut model = SaveModel::read_file(path)?;
    let version = model.current.version();
    *model.current.tiles.get_mut(x, y)? = Tile::empty(x as u32, y as u32, version);
    write_tile(path, &model.current, x, y)?;
    info!(x, y, "reset tile");
    Ok(())
}

/// Make `(x, y)` the capital of `tribe` and claim the tiles around it
pub fn place_capital(world: &mut WorldState, x: usize, y: usize, name: &str, tribe: u8) -> Result<()> {
    if tribe >= NATURE_PLAYER_ID {
        return Err(Error::PlayerIdOutOfRange(tribe as usize));
    }
    let tile = world.tiles.get_mut(x, y)?;
    found_city(tile, name, tribe);
    tile.capital = tribe;

    for (nx, ny) in world.tiles.neighbours(x, y) {
        let neighbour = world.tiles.get_mut(nx, ny)?;
        neighbour.owner = tribe;
        neighbour.capital_coords = [x as i32, y as i32];
    }

    if let Ok(player) = world.player_mut(tribe) {
        player.start_coords = [x as i32, y as i32];
    }
    Ok(())
}

pub fn set_capital(path: &Path, x: usize, y: usize, name: &str, tribe: u8) -> Result<()> {
    let mut model = SaveModel::read_file(path)?;
    place_capital(&mut model.current, x, y, name, tribe)?;
    write_map(path, &model.current)?;
    if model.current.player(tribe).is_ok() {
        write_players(path, &model.current)?;
    } else {
        warn!(tribe, "no player with this id, start tile left unchanged");
    }
    info!(x, y, tribe, name, "set capital");
    Ok(())
}
