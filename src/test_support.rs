//! Synthetic saves shared by the unit tests.
//!
//! The sample world is a 4x3 map, by default at the flooding format version:
//!
//! - (1, 1): capital city "Alpha" of player 1 with a player 1 warrior
//! - (2, 1): a player 2 unit carrying a player 2 passenger
//! - (3, 2): city "Beta" of player 2, connected to player 2's capital
//! - (0, 0): visible to player 1
//!
//! Players are 1, 2 and the nature player 255.

use std::path::PathBuf;

use tempfile::TempDir;

use crate::codec::{
    BinaryWriter, FormatVersion, Improvement, MapHeader, Passenger, Player, Tile, TileImprovement,
    TileUnit, TribeSkin, Unit, CITY_IMPROVEMENT, NATURE_PLAYER_ID,
};
use crate::save::{SaveModel, TileGrid, WorldState};

pub const SAMPLE_WIDTH: usize = 4;
pub const SAMPLE_HEIGHT: usize = 3;

pub fn sample_header(width: u16, height: u16, version: FormatVersion) -> MapHeader {
    MapHeader {
        engine_version: 0,
        game_version: version.0,
        total_actions: 120,
        current_turn: 7,
        current_player_index: 1,
        max_unit_id: 3,
        current_game_state: 2,
        seed: 424242,
        turn_limit: 30,
        score_limit: 0,
        win_by_capital: 0,
        unknown_settings: [0, 1, 0, 1, 0, 0],
        game_mode_base: 5,
        game_mode_rules: 6,
        map_name: "Sample".to_string(),
        square_size: width.min(height) as u32,
        disabled_tribes: vec![3, 5],
        unlocked_tribes: (0..8).collect(),
        difficulty: 1,
        opponent_count: 1,
        game_type: 0,
        map_preset: 3,
        turn_time_limit_minutes: 0,
        unknown_float1: 0.0,
        unknown_float2: 1.5,
        base_time_seconds: 0.0,
        time_settings: [0; 4],
        tribe_skins: vec![TribeSkin { tribe: 11, skin: 14 }],
        placeholder_dimensions: false,
        width,
        height,
    }
}

pub fn sample_unit(id: u32, owner: u8, kind: u16, x: i32, y: i32) -> Unit {
    Unit {
        id,
        owner,
        kind,
        position: [x, y],
        home: [x, y],
        health: 100,
        created_turn: 1,
        ..Default::default()
    }
}

fn city(name: &str, owner_capital: u8) -> TileImprovement {
    let mut details = Improvement::new_city(name);
    details.connected_player_capital = owner_capital;
    details.rewards = vec![4];
    TileImprovement { kind: CITY_IMPROVEMENT, details }
}

pub fn sample_tiles(version: FormatVersion) -> TileGrid {
    let mut rows = Vec::with_capacity(SAMPLE_HEIGHT);
    for y in 0..SAMPLE_HEIGHT {
        let mut row = Vec::with_capacity(SAMPLE_WIDTH);
        for x in 0..SAMPLE_WIDTH {
            row.push(Tile::empty(x as u32, y as u32, version));
        }
        rows.push(row);
    }

    rows[0][0].visibility = vec![1];

    let alpha = &mut rows[1][1];
    alpha.owner = 1;
    alpha.capital = 1;
    alpha.capital_coords = [1, 1];
    alpha.improvement = Some(city("Alpha", 1));
    alpha.unit = Some(TileUnit::new(sample_unit(1, 1, 2, 1, 1)));
    alpha.visibility = vec![1, 2];

    let boat = &mut rows[1][2];
    boat.terrain = 2;
    boat.altitude = -2;
    boat.unit = Some(TileUnit {
        passenger: Some(Passenger {
            unit: sample_unit(3, 2, 5, 2, 1),
            effects: vec![],
            direction: [0; 5],
        }),
        ..TileUnit::new(sample_unit(2, 2, 9, 2, 1))
    });

    let beta = &mut rows[2][3];
    beta.owner = 2;
    beta.capital_coords = [3, 2];
    beta.resource = Some(1);
    beta.improvement = Some(city("Beta", 2));

    match TileGrid::from_rows(rows) {
        Ok(grid) => grid,
        Err(e) => panic!("sample grid is inconsistent: {}", e),
    }
}

pub fn sample_players() -> Vec<Player> {
    let mut first = Player::empty(1, "Player1", [200, 30, 30]).unwrap();
    first.tribe = 3;
    first.start_coords = [1, 1];
    first.tech = vec![0, 1];

    let mut second = Player::empty(2, "Player2", [30, 30, 200]).unwrap();
    second.tribe = 5;
    second.start_coords = [3, 2];
    second.currency = 12;

    let mut nature = Player::empty(0, "Nature", [0, 0, 0]).unwrap();
    nature.id = NATURE_PLAYER_ID;
    nature.autoplay = false;

    vec![first, second, nature]
}

pub fn sample_world_at(version: FormatVersion) -> WorldState {
    WorldState {
        header: sample_header(SAMPLE_WIDTH as u16, SAMPLE_HEIGHT as u16, version),
        tiles: sample_tiles(version),
        players: sample_players(),
    }
}

pub fn sample_world() -> WorldState {
    sample_world_at(FormatVersion::FLOODING)
}

pub fn encode_worlds(initial: &WorldState, current: &WorldState) -> Vec<u8> {
    let mut writer = BinaryWriter::new();
    initial.write(&mut writer).unwrap();
    writer.write_bytes(&[0, 0, 0]);
    current.write(&mut writer).unwrap();
    writer.into_vec()
}

/// Both snapshots built from `current`, the initial one at turn zero
pub fn payload_from(current: &WorldState) -> Vec<u8> {
    let mut initial = current.clone();
    initial.header.current_turn = 0;
    encode_worlds(&initial, current)
}

pub fn sample_payload_at(version: FormatVersion) -> Vec<u8> {
    payload_from(&sample_world_at(version))
}

pub fn sample_payload() -> Vec<u8> {
    sample_payload_at(FormatVersion::FLOODING)
}

pub fn sample_model() -> SaveModel {
    SaveModel::decode(&sample_payload()).unwrap()
}

/// Write the sample payload into a fresh temp dir
pub fn sample_file() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.state.decomp");
    std::fs::write(&path, sample_payload()).unwrap();
    (dir, path)
}
