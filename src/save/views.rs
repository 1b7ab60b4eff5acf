//! Lookups derived from a decoded snapshot, used by map renderers.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::codec::Player;
use crate::error::{Error, Result};
use crate::save::TileGrid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityLocation {
    pub x: usize,
    pub y: usize,
    pub name: String,
    pub capital: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnitLocation {
    pub x: usize,
    pub y: usize,
    pub kind: u16,
    /// Health as shown in game
    pub health: u16,
    /// Segment links of multi-tile creatures
    pub leader: Option<u32>,
    pub follower: Option<u32>,
}

/// Player id to tribe
pub fn owner_tribe_map(players: &[Player]) -> Result<BTreeMap<u8, u16>> {
    let mut map = BTreeMap::new();
    for player in players {
        if map.insert(player.id, player.tribe).is_some() {
            return Err(Error::DuplicatePlayerId(player.id));
        }
    }
    Ok(map)
}

/// City tiles grouped by tile owner, in row-major order
pub fn cities_by_owner(tiles: &TileGrid) -> BTreeMap<u8, Vec<CityLocation>> {
    let mut map: BTreeMap<u8, Vec<CityLocation>> = BTreeMap::new();
    for tile in tiles.iter() {
        let Some(improvement) = tile.improvement.as_ref().filter(|i| i.is_city()) else {
            continue;
        };
        map.entry(tile.owner).or_default().push(CityLocation {
            x: tile.x as usize,
            y: tile.y as usize,
            name: improvement.details.city_name.clone().unwrap_or_default(),
            capital: tile.capital,
        });
    }
    map
}

/// Units grouped by unit owner. Passengers are not listed.
pub fn units_by_owner(tiles: &TileGrid) -> BTreeMap<u8, Vec<UnitLocation>> {
    let mut map: BTreeMap<u8, Vec<UnitLocation>> = BTreeMap::new();
    for tile in tiles.iter() {
        if let Some(tile_unit) = &tile.unit {
            map.entry(tile_unit.unit.owner).or_default().push(UnitLocation {
                x: tile.x as usize,
                y: tile.y as usize,
                kind: tile_unit.unit.kind,
                health: tile_unit.unit.health_points(),
                leader: tile_unit.unit.leader(),
                follower: tile_unit.unit.follower(),
            });
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_model;

    #[test]
    fn test_owner_tribe_map() {
        let model = sample_model();
        let map = owner_tribe_map(model.players_current()).unwrap();
        assert_eq!(map.get(&1), Some(&3));
        assert_eq!(map.get(&2), Some(&5));
        assert_eq!(map.len(), 3);

        let mut players = model.players_current().to_vec();
        players[0].id = 2;
        assert!(matches!(owner_tribe_map(&players), Err(Error::DuplicatePlayerId(2))));
    }

    #[test]
    fn test_cities_by_owner() {
        let model = sample_model();
        let cities = cities_by_owner(model.tiles_current());

        assert_eq!(
            cities[&1],
            vec![CityLocation { x: 1, y: 1, name: "Alpha".to_string(), capital: 1 }]
        );
        assert_eq!(cities[&2][0].name, "Beta");
        assert_eq!(cities[&2][0].capital, 0);
    }

    #[test]
    fn test_units_by_owner() {
        let mut model = sample_model();
        let units = units_by_owner(model.tiles_current());

        let warrior = UnitLocation { x: 1, y: 1, kind: 2, health: 10, leader: None, follower: None };
        assert_eq!(units[&1], vec![warrior]);
        assert_eq!(units[&2], vec![UnitLocation { x: 2, y: 1, kind: 9, ..warrior }]);

        let unit = &mut model.current.tiles.get_mut(1, 1).unwrap().unit.as_mut().unwrap().unit;
        unit.leader_id = 6;
        unit.health = 75;
        let units = units_by_owner(model.tiles_current());
        assert_eq!((units[&1][0].leader, units[&1][0].follower, units[&1][0].health), (Some(6), None, 7));
    }
}
