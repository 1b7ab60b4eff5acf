use serde::{Deserialize, Serialize};

use crate::codec::improvement::{Improvement, CITY_IMPROVEMENT};
use crate::codec::unit::Unit;
use crate::codec::version::FormatVersion;
use crate::codec::{BinaryReader, BinaryWriter};
use crate::error::{Error, Result};

/// Decoding context for one tile
#[derive(Debug, Clone, Copy)]
pub struct TileContext {
    pub version: FormatVersion,
    /// Grid position the tile must declare
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub terrain: u16,
    pub climate: u16,
    pub altitude: i16,
    pub owner: u8,
    pub capital: u8,
    pub capital_coords: [i32; 2],
    pub resource: Option<u16>,
    pub improvement: Option<TileImprovement>,
    pub unit: Option<TileUnit>,
    pub visibility: Vec<u8>,
    pub has_road: bool,
    pub has_water_route: bool,
    pub skin: u16,
    pub unknown: [u8; 2],
    /// Present from the flooding update on
    pub flood: Option<FloodState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileImprovement {
    pub kind: u16,
    pub details: Improvement,
}

impl TileImprovement {
    pub fn is_city(&self) -> bool {
        self.kind == CITY_IMPROVEMENT
    }
}

/// The unit standing on a tile, with its per-unit effect and direction data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileUnit {
    pub unit: Unit,
    /// 0 ice, 1 poison, 2 boost, 3 invisible
    pub effects: Vec<u16>,
    pub direction: [u8; 5],
    /// Second record the game creates while a unit embarks or disembarks
    pub passenger: Option<Passenger>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    pub unit: Unit,
    pub effects: Vec<u16>,
    pub direction: [u8; 5],
}

/// Flood marker of a tile. The game writes other flag values than 0 and 1;
/// only flag 1 is followed by a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FloodState {
    pub flag: u8,
    pub level: Option<u32>,
}

impl FloodState {
    pub const FLOODED: u8 = 1;

    pub fn flooded(level: u32) -> Self {
        Self { flag: Self::FLOODED, level: Some(level) }
    }

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        let flag = reader.read_u8()?;
        let level = if flag == Self::FLOODED { Some(reader.read_u32_le()?) } else { None };
        Ok(Self { flag, level })
    }

    fn write(&self, writer: &mut BinaryWriter) {
        writer.write_u8(self.flag);
        if self.flag == Self::FLOODED {
            writer.write_u32_le(self.level.unwrap_or_default());
        }
    }
}

/// Altitude the game pairs with a terrain id
pub fn altitude_for_terrain(terrain: u16) -> i16 {
    match terrain {
        1 => -1,
        2 => -2,
        3 | 5 => 1,
        4 => 2,
        _ => 0,
    }
}

impl Tile {
    /// Unowned field tile, used when growing the map or clearing a tile
    pub fn empty(x: u32, y: u32, version: FormatVersion) -> Self {
        Self {
            x,
            y,
            terrain: 3,
            climate: 1,
            altitude: 1,
            owner: 0,
            capital: 0,
            capital_coords: [-1, -1],
            resource: None,
            improvement: None,
            unit: None,
            visibility: Vec::new(),
            has_road: false,
            has_water_route: false,
            skin: 0,
            unknown: [0, 0],
            flood: version.tile_layout().flood_fields.then(FloodState::default),
        }
    }

    pub fn read(reader: &mut BinaryReader, ctx: &TileContext) -> Result<Self> {
        let x = reader.read_u32_le()?;
        let y = reader.read_u32_le()?;
        if x as usize != ctx.col || y as usize != ctx.row {
            return Err(Error::TileCoordinateMismatch { row: ctx.row, col: ctx.col, x, y });
        }
        let terrain = reader.read_u16_le()?;
        let climate = reader.read_u16_le()?;
        let altitude = reader.read_i16_le()?;
        let owner = reader.read_u8()?;
        let capital = reader.read_u8()?;
        let capital_coords = [reader.read_i32_le()?, reader.read_i32_le()?];

        let resource = if reader.read_flag("resource")? {
            Some(reader.read_u16_le()?)
        } else {
            None
        };

        let improvement = if reader.read_flag("improvement")? {
            let kind = reader.read_u16_le()?;
            Some(TileImprovement { kind, details: Improvement::read(reader)? })
        } else {
            None
        };

        let unit = if reader.read_flag("unit")? {
            Some(TileUnit::read(reader)?)
        } else {
            None
        };

        let visibility = reader.read_byte_list()?;
        let has_road = reader.read_bool()?;
        let has_water_route = reader.read_bool()?;
        let skin = reader.read_u16_le()?;
        let unknown = reader.read_array()?;

        let flood = if ctx.version.tile_layout().flood_fields {
            Some(FloodState::read(reader)?)
        } else {
            None
        };

        Ok(Self {
            x,
            y,
            terrain,
            climate,
            altitude,
            owner,
            capital,
            capital_coords,
            resource,
            improvement,
            unit,
            visibility,
            has_road,
            has_water_route,
            skin,
            unknown,
            flood,
        })
    }

    pub fn write(&self, writer: &mut BinaryWriter, version: FormatVersion) -> Result<()> {
        writer.write_u32_le(self.x);
        writer.write_u32_le(self.y);
        writer.write_u16_le(self.terrain);
        writer.write_u16_le(self.climate);
        writer.write_i16_le(self.altitude);
        writer.write_u8(self.owner);
        writer.write_u8(self.capital);
        writer.write_i32_le(self.capital_coords[0]);
        writer.write_i32_le(self.capital_coords[1]);

        match self.resource {
            Some(kind) => {
                writer.write_u8(1);
                writer.write_u16_le(kind);
            }
            None => writer.write_u8(0),
        }

        match &self.improvement {
            Some(improvement) => {
                writer.write_u8(1);
                writer.write_u16_le(improvement.kind);
                improvement.details.write(writer)?;
            }
            None => writer.write_u8(0),
        }

        match &self.unit {
            Some(unit) => {
                writer.write_u8(1);
                unit.write(writer)?;
            }
            None => writer.write_u8(0),
        }

        writer.write_byte_list("visibility", &self.visibility)?;
        writer.write_bool(self.has_road);
        writer.write_bool(self.has_water_route);
        writer.write_u16_le(self.skin);
        writer.write_bytes(&self.unknown);

        if version.tile_layout().flood_fields {
            self.flood.unwrap_or_default().write(writer);
        }
        Ok(())
    }

    pub fn to_bytes(&self, version: FormatVersion) -> Result<Vec<u8>> {
        let mut writer = BinaryWriter::with_capacity(64);
        self.write(&mut writer, version)?;
        Ok(writer.into_vec())
    }

    pub fn is_visible_to(&self, tribe: u8) -> bool {
        self.visibility.contains(&tribe)
    }

    /// Add `tribe` to the visibility list. Returns false if it was already there.
    pub fn reveal_to(&mut self, tribe: u8) -> bool {
        if self.is_visible_to(tribe) {
            return false;
        }
        self.visibility.push(tribe);
        true
    }

    /// Units on this tile, passenger included
    pub fn units_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.unit.iter_mut().flat_map(|tile_unit| {
            std::iter::once(&mut tile_unit.unit)
                .chain(tile_unit.passenger.iter_mut().map(|passenger| &mut passenger.unit))
        })
    }
}

fn read_effects(reader: &mut BinaryReader) -> Result<(Vec<u16>, [u8; 5])> {
    let effects = reader.read_u16_list()?;
    let direction = reader.read_array()?;
    Ok((effects, direction))
}

fn write_effects(writer: &mut BinaryWriter, effects: &[u16], direction: &[u8; 5]) -> Result<()> {
    writer.write_u16_list("unit effects", effects)?;
    writer.write_bytes(direction);
    Ok(())
}

impl TileUnit {
    pub fn new(unit: Unit) -> Self {
        Self { unit, effects: Vec::new(), direction: [0; 5], passenger: None }
    }

    fn read(reader: &mut BinaryReader) -> Result<Self> {
        let unit = Unit::read(reader)?;

        if reader.read_flag("passenger unit")? {
            let passenger_unit = Unit::read(reader)?;
            // a passenger never carries its own passenger
            let nested = reader.read_u8()?;
            if nested != 0 {
                return Err(Error::InvalidFlag { field: "nested passenger", value: nested as u16 });
            }
            let (passenger_effects, passenger_direction) = read_effects(reader)?;
            let (effects, direction) = read_effects(reader)?;
            Ok(Self {
                unit,
                effects,
                direction,
                passenger: Some(Passenger {
                    unit: passenger_unit,
                    effects: passenger_effects,
                    direction: passenger_direction,
                }),
            })
        } else {
            let (effects, direction) = read_effects(reader)?;
            Ok(Self { unit, effects, direction, passenger: None })
        }
    }

    fn write(&self, writer: &mut BinaryWriter) -> Result<()> {
        self.unit.write(writer);
        match &self.passenger {
            Some(passenger) => {
                writer.write_u8(1);
                passenger.unit.write(writer);
                writer.write_u8(0);
                write_effects(writer, &passenger.effects, &passenger.direction)?;
            }
            None => writer.write_u8(0),
        }
        write_effects(writer, &self.effects, &self.direction)
    }
}
