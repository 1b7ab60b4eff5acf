//! Player list edits.

use std::path::Path;

use tracing::info;

use crate::codec::{Player, SCRATCH_PLAYER_ID};
use crate::edit::shift_write::{patch_scalar, Scalar};
use crate::edit::{write_map, write_players};
use crate::error::{Error, Result};
use crate::offsets::Region;
use crate::save::json::import_json;
use crate::save::{SaveModel, TileGrid, WorldState};

/// Every tech id except the two the game hands out on its own
pub fn all_tech() -> Vec<u16> {
    (0..=28).chain(30..=33).chain(35..=43).collect()
}

// ============================================================================
// Swap
// ============================================================================

/// Rewrite every reference to player `from` on the map as `to`
pub fn relabel_owner(tiles: &mut TileGrid, from: u8, to: u8) {
    for tile in tiles.iter_mut() {
        if tile.owner == from {
            tile.owner = to;
        }
        if tile.capital == from {
            tile.capital = to;
        }
        if let Some(improvement) = tile.improvement.as_mut() {
            if improvement.details.connected_player_capital == from {
                improvement.details.connected_player_capital = to;
            }
        }
        for unit in tile.units_mut() {
            if unit.owner == from {
                unit.owner = to;
            }
        }
    }
}

/// Exchange map ownership, tribe, color and start tile of two players
pub fn exchange_players(world: &mut WorldState, id1: u8, id2: u8) -> Result<()> {
    for id in [id1, id2] {
        if id == SCRATCH_PLAYER_ID {
            return Err(Error::PlayerIdOutOfRange(id as usize));
        }
    }
    let first = world.player(id1)?;
    let (tribe1, color1, start1) = (first.tribe, first.override_color, first.start_coords);
    let second = world.player(id2)?;
    let (tribe2, color2, start2) = (second.tribe, second.override_color, second.start_coords);

    relabel_owner(&mut world.tiles, id1, SCRATCH_PLAYER_ID);
    relabel_owner(&mut world.tiles, id2, id1);
    relabel_owner(&mut world.tiles, SCRATCH_PLAYER_ID, id2);

    let first = world.player_mut(id1)?;
    first.tribe = tribe2;
    first.override_color = color2;
    first.start_coords = start2;
    let second = world.player_mut(id2)?;
    second.tribe = tribe1;
    second.override_color = color1;
    second.start_coords = start1;
    Ok(())
}

pub fn swap_players(path: &Path, id1: u8, id2: u8) -> Result<()> {
    let mut model = SaveModel::read_file(path)?;
    exchange_players(&mut model.current, id1, id2)?;
    write_map(path, &model.current)?;
    write_players(path, &model.current)?;
    info!(id1, id2, "swapped players");
    Ok(())
}

// ============================================================================
// Add
// ============================================================================

/// Insert a new player ahead of the trailing nature player and make every
/// aggression list aware of it. Returns the new player's id.
pub fn insert_player(world: &mut WorldState, name: Option<&str>, color: [u8; 3]) -> Result<u8> {
    if world.players.is_empty() {
        return Err(Error::InvalidRecord("player list has no trailing nature player".to_string()));
    }
    let index = world.players.len();
    let name = name.map_or_else(|| format!("Player{}", index), str::to_string);
    let player = Player::empty(index, &name, color)?;
    let id = player.id;

    world.players.insert(index - 1, player);
    for existing in &mut world.players {
        existing.include_player(id);
    }
    Ok(id)
}

pub fn add_player(path: &Path, name: Option<&str>, color: [u8; 3]) -> Result<u8> {
    let mut model = SaveModel::read_file(path)?;
    let id = insert_player(&mut model.current, name, color)?;
    write_players(path, &model.current)?;
    info!(id, players = model.current.players.len(), "added player");
    Ok(id)
}

// ============================================================================
// Single fields
// ============================================================================

pub fn unlock_all_tech(path: &Path, player_id: u8) -> Result<()> {
    let mut model = SaveModel::read_file(path)?;
    model.current.player_mut(player_id)?.tech = all_tech();
    write_players(path, &model.current)?;
    info!(player_id, "unlocked all tech");
    Ok(())
}

/// Overwrite a player's stars in place
pub fn set_player_currency(path: &Path, player_id: u8, amount: u32) -> Result<()> {
    let model = SaveModel::read_file(path)?;
    let previous = model.current.player(player_id)?.currency;
    let offset = model.offsets().require(Region::PlayerCurrency(player_id).current())?;
    patch_scalar(path, offset, Scalar::U32(amount))?;
    info!(player_id, previous, amount, "set currency");
    Ok(())
}

/// Write the model's current map and players back to `path`
pub fn write_model_state(path: &Path, model: &SaveModel) -> Result<()> {
    write_map(path, &model.current)?;
    write_players(path, &model.current)?;
    info!(path = %path.display(), "wrote map state");
    Ok(())
}

/// Load tiles and players from a JSON export into the current snapshot
pub fn import_json_state(path: &Path, json_path: &Path) -> Result<()> {
    let document = import_json(json_path)?;
    let mut model = SaveModel::read_file(path)?;
    document.apply_to(&mut model.current)?;
    write_model_state(path, &model)?;
    info!(source = %json_path.display(), "imported json state");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::NATURE_PLAYER_ID;
    use crate::save::json::SaveJson;
    use crate::test_support::{sample_file, sample_model};

    #[test]
    fn test_all_tech_list() {
        let tech = all_tech();
        assert_eq!(tech.len(), 42);
        assert!(!tech.contains(&29));
        assert!(!tech.contains(&34));
        assert_eq!(tech.last(), Some(&43));
    }

    #[test]
    fn test_swap_players() {
        let (_dir, path) = sample_file();
        let before = sample_model();

        swap_players(&path, 1, 2).unwrap();
        let model = SaveModel::read_file(&path).unwrap();
        let grid = model.tiles_current();

        let alpha = grid.get(1, 1).unwrap();
        assert_eq!((alpha.owner, alpha.capital), (2, 2));
        assert_eq!(alpha.improvement.as_ref().unwrap().details.connected_player_capital, 2);
        assert_eq!(alpha.unit.as_ref().unwrap().unit.owner, 2);

        let beta = grid.get(3, 2).unwrap();
        assert_eq!(beta.owner, 1);
        assert_eq!(beta.improvement.as_ref().unwrap().details.connected_player_capital, 1);

        let boat = grid.get(2, 1).unwrap().unit.as_ref().unwrap();
        assert_eq!(boat.unit.owner, 1);
        assert_eq!(boat.passenger.as_ref().unwrap().unit.owner, 1);

        for tile in grid.iter() {
            assert_ne!(tile.owner, SCRATCH_PLAYER_ID);
            assert_ne!(tile.capital, SCRATCH_PLAYER_ID);
            assert!(tile.unit.as_ref().map_or(true, |u| u.unit.owner != SCRATCH_PLAYER_ID));
        }

        let (old1, old2) = (before.current.player(1).unwrap(), before.current.player(2).unwrap());
        let (new1, new2) = (model.current.player(1).unwrap(), model.current.player(2).unwrap());
        assert_eq!((new1.tribe, new1.override_color, new1.start_coords), (old2.tribe, old2.override_color, old2.start_coords));
        assert_eq!((new2.tribe, new2.override_color, new2.start_coords), (old1.tribe, old1.override_color, old1.start_coords));
        assert_eq!(new1.name, old1.name);
        assert_eq!(new2.currency, old2.currency);
    }

    #[test]
    fn test_swap_unknown_player() {
        let (_dir, path) = sample_file();
        assert!(matches!(swap_players(&path, 1, 9), Err(Error::PlayerNotFound(9))));
        assert!(matches!(swap_players(&path, 254, 1), Err(Error::PlayerIdOutOfRange(254))));
    }

    #[test]
    fn test_add_player() {
        let (_dir, path) = sample_file();

        assert_eq!(add_player(&path, None, [10, 20, 30]).unwrap(), 3);
        let model = SaveModel::read_file(&path).unwrap();
        let players = model.players_current();

        let ids: Vec<u8> = players.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3, NATURE_PLAYER_ID]);
        assert_eq!(players[2].name, "Player3");
        assert_eq!(players[2].override_color, [30, 20, 10, 0]);

        let aggression_ids = |p: &Player| p.aggressions.iter().map(|a| a.player_id).collect::<Vec<u8>>();
        assert_eq!(aggression_ids(&players[0]), vec![1, 3, 255]);
        assert_eq!(aggression_ids(&players[1]), vec![1, 2, 3, 255]);
        assert_eq!(aggression_ids(&players[2]), vec![1, 2, 3, 255]);
        assert_eq!(aggression_ids(&players[3]), vec![3, 255]);

        assert_eq!(model.players_initial().len(), 3);
    }

    #[test]
    fn test_add_named_player() {
        let mut world = sample_model().current;
        let id = insert_player(&mut world, Some("Kiera"), [1, 2, 3]).unwrap();
        assert_eq!(world.player(id).unwrap().name, "Kiera");

        world.players.clear();
        assert!(matches!(insert_player(&mut world, None, [0, 0, 0]), Err(Error::InvalidRecord(_))));
    }

    #[test]
    fn test_unlock_all_tech() {
        let (_dir, path) = sample_file();

        unlock_all_tech(&path, 2).unwrap();
        let model = SaveModel::read_file(&path).unwrap();
        assert_eq!(model.current.player(2).unwrap().tech, all_tech());
        assert_eq!(model.current.player(1).unwrap().tech, vec![0, 1]);

        assert!(matches!(unlock_all_tech(&path, 8), Err(Error::PlayerNotFound(8))));
    }

    #[test]
    fn test_set_player_currency() {
        let (_dir, path) = sample_file();
        let len = std::fs::metadata(&path).unwrap().len();

        set_player_currency(&path, 1, 500).unwrap();
        let model = SaveModel::read_file(&path).unwrap();
        assert_eq!(model.current.player(1).unwrap().currency, 500);
        assert_eq!(model.current.player(2).unwrap().currency, 12);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), len);
    }

    #[test]
    fn test_import_json_state() {
        let (dir, path) = sample_file();
        let json_path = dir.path().join("edited.json");

        let model = SaveModel::read_file(&path).unwrap();
        let mut document = SaveJson::from_model(&model);
        document.tiles[0][2].terrain = 4;
        document.tiles[0][2].altitude = 2;
        document.tiles[2][0].visibility = vec![1, 2];
        document.players[0].name = "Imported".to_string();
        std::fs::write(&json_path, serde_json::to_vec(&document).unwrap()).unwrap();

        import_json_state(&path, &json_path).unwrap();
        let reread = SaveModel::read_file(&path).unwrap();
        assert_eq!(reread.tiles_current().get(2, 0).unwrap().terrain, 4);
        assert_eq!(reread.tiles_current().get(0, 2).unwrap().visibility, vec![1, 2]);
        assert_eq!(reread.current.player(1).unwrap().name, "Imported");
        assert_eq!(reread.initial, model.initial);
        assert_eq!(SaveJson::from_model(&reread), document);
    }

    #[test]
    fn test_import_json_state_rejects_other_size() {
        let (dir, path) = sample_file();
        let json_path = dir.path().join("small.json");
        let before = std::fs::read(&path).unwrap();

        let mut document = SaveJson::from_model(&sample_model());
        document.tiles.truncate(2);
        document.header.height = 2;
        std::fs::write(&json_path, serde_json::to_vec(&document).unwrap()).unwrap();

        assert!(matches!(import_json_state(&path, &json_path), Err(Error::InvalidRecord(_))));
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_write_model_state() {
        let (_dir, path) = sample_file();
        let mut model = SaveModel::read_file(&path).unwrap();

        model.current.tiles.get_mut(0, 1).unwrap().has_road = true;
        model.current.tiles.get_mut(3, 0).unwrap().visibility = vec![1, 2, 255];
        model.current.player_mut(1).unwrap().name = "Renamed".to_string();
        write_model_state(&path, &model).unwrap();

        let reread = SaveModel::read_file(&path).unwrap();
        assert_eq!(reread.current, model.current);
        assert_eq!(reread.initial, model.initial);
    }
}
