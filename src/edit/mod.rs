//! Edits applied to a decompressed save file.
//!
//! Every operation decodes the file, changes the current snapshot in
//! memory, re-encodes the touched region and shift-writes it back.

pub mod map;
pub mod players;
pub mod shift_write;

use std::path::Path;

pub use map::{
    add_city, convert_tribe, expand_columns, expand_rows, expand_square, modify_tile_terrain,
    modify_unit_owner, modify_unit_type, resize_map, reset_tile, reveal_all_tiles, reveal_tile,
    set_capital,
};
pub use players::{
    add_player, import_json_state, set_player_currency, swap_players, unlock_all_tech,
    write_model_state,
};
pub use shift_write::{patch_region, patch_scalar, replace_region, write_scalar_at, PatchOutcome, Scalar};

use crate::error::Result;
use crate::offsets::Region;
use crate::save::WorldState;

pub(crate) fn write_tile(path: &Path, world: &WorldState, x: usize, y: usize) -> Result<PatchOutcome> {
    let bytes = world.tiles.get(x, y)?.to_bytes(world.version())?;
    replace_region(path, Region::TileStart { x, y }.current(), Region::TileEnd { x, y }.current(), &bytes)
}

pub(crate) fn write_map(path: &Path, world: &WorldState) -> Result<PatchOutcome> {
    let bytes = world.tiles.to_bytes(world.version())?;
    replace_region(path, Region::MapStart.current(), Region::MapEnd.current(), &bytes)
}

pub(crate) fn write_players(path: &Path, world: &WorldState) -> Result<PatchOutcome> {
    let bytes = crate::codec::player::player_list_to_bytes(&world.players)?;
    replace_region(path, Region::AllPlayersStart.current(), Region::AllPlayersEnd.current(), &bytes)
}
