use serde::{Deserialize, Serialize};

use crate::codec::{BinaryReader, BinaryWriter};
use crate::error::{Error, Result};

/// Improvement kind the game uses for cities
pub const CITY_IMPROVEMENT: u16 = 1;

/// Improvement record attached to a tile (cities, farms, monuments, ...)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Improvement {
    pub level: u16,
    pub founded_turn: u16,
    pub current_population: i16,
    pub total_population: u16,
    pub production: i16,
    pub base_score: i16,
    /// 1 is the default border, 2 is expanded
    pub border_size: i16,
    pub upgrade_count: i16,
    pub connected_player_capital: u8,
    pub city_name: Option<String>,
    pub founded_tribe: u8,
    pub rewards: Vec<u16>,
    pub rebellion: Option<Rebellion>,
}

/// Rebellion marker. Only written when `flag` is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rebellion {
    pub flag: u16,
    pub buffer: [u8; 2],
}

impl Improvement {
    /// A freshly founded level-1 city
    pub fn new_city(name: &str) -> Self {
        Self {
            level: 1,
            production: 1,
            border_size: 1,
            city_name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        let level = reader.read_u16_le()?;
        let founded_turn = reader.read_u16_le()?;
        let current_population = reader.read_i16_le()?;
        let total_population = reader.read_u16_le()?;
        let production = reader.read_i16_le()?;
        let base_score = reader.read_i16_le()?;
        let border_size = reader.read_i16_le()?;
        let upgrade_count = reader.read_i16_le()?;
        let connected_player_capital = reader.read_u8()?;

        let city_name = if reader.read_flag("city name")? {
            Some(reader.read_var_string()?)
        } else {
            None
        };

        let founded_tribe = reader.read_u8()?;
        let rewards = reader.read_u16_list()?;

        let rebellion_flag = reader.read_u16_le()?;
        let rebellion = if rebellion_flag != 0 {
            Some(Rebellion { flag: rebellion_flag, buffer: reader.read_array()? })
        } else {
            None
        };

        Ok(Self {
            level,
            founded_turn,
            current_population,
            total_population,
            production,
            base_score,
            border_size,
            upgrade_count,
            connected_player_capital,
            city_name,
            founded_tribe,
            rewards,
            rebellion,
        })
    }

    pub fn write(&self, writer: &mut BinaryWriter) -> Result<()> {
        writer.write_u16_le(self.level);
        writer.write_u16_le(self.founded_turn);
        writer.write_i16_le(self.current_population);
        writer.write_u16_le(self.total_population);
        writer.write_i16_le(self.production);
        writer.write_i16_le(self.base_score);
        writer.write_i16_le(self.border_size);
        writer.write_i16_le(self.upgrade_count);
        writer.write_u8(self.connected_player_capital);

        match &self.city_name {
            Some(name) => {
                writer.write_u8(1);
                writer.write_var_string(name)?;
            }
            None => writer.write_u8(0),
        }

        writer.write_u8(self.founded_tribe);
        writer.write_u16_list("city rewards", &self.rewards)?;

        match self.rebellion {
            Some(Rebellion { flag: 0, .. }) => {
                return Err(Error::InvalidFlag { field: "rebellion", value: 0 });
            }
            Some(rebellion) => {
                writer.write_u16_le(rebellion.flag);
                writer.write_bytes(&rebellion.buffer);
            }
            None => writer.write_u16_le(0),
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = BinaryWriter::with_capacity(32);
        self.write(&mut writer)?;
        Ok(writer.into_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CITY_BYTES: [u8; 32] = [
        3, 0, 0, 0, 1, 0, 6, 0, 1, 0, 0, 0, 1, 0, 254, 255, 1, 1, 4, b'T', b'e', b's', b't', 0, 2, 0,
        4, 0, 7, 0, 0, 0,
    ];

    const MINIMAL_BYTES: [u8; 23] = [1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];

    #[test]
    fn test_decode_city_fixture() {
        let mut reader = BinaryReader::new(&CITY_BYTES);
        let improvement = Improvement::read(&mut reader).unwrap();

        assert_eq!(improvement.level, 3);
        assert_eq!(improvement.current_population, 1);
        assert_eq!(improvement.total_population, 6);
        assert_eq!(improvement.production, 1);
        assert_eq!(improvement.border_size, 1);
        assert_eq!(improvement.upgrade_count, -2);
        assert_eq!(improvement.connected_player_capital, 1);
        assert_eq!(improvement.city_name.as_deref(), Some("Test"));
        assert_eq!(improvement.rewards, vec![4, 7]);
        assert_eq!(improvement.rebellion, None);
        assert!(reader.is_empty());

        assert_eq!(improvement.to_bytes().unwrap(), CITY_BYTES.to_vec());
    }

    #[test]
    fn test_decode_minimal() {
        let mut reader = BinaryReader::new(&MINIMAL_BYTES);
        let improvement = Improvement::read(&mut reader).unwrap();

        assert_eq!(improvement.level, 1);
        assert_eq!(improvement.production, 1);
        assert_eq!(improvement.city_name, None);
        assert!(improvement.rewards.is_empty());
        assert_eq!(improvement.to_bytes().unwrap(), MINIMAL_BYTES.to_vec());
    }

    #[test]
    fn test_rebellion_buffer_follows_flag() {
        let mut bytes = MINIMAL_BYTES.to_vec();
        let flag_at = bytes.len() - 2;
        bytes[flag_at] = 1;
        bytes.extend_from_slice(&[9, 8]);

        let improvement = Improvement::read(&mut BinaryReader::new(&bytes)).unwrap();
        assert_eq!(improvement.rebellion, Some(Rebellion { flag: 1, buffer: [9, 8] }));
        assert_eq!(improvement.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_new_city() {
        let city = Improvement::new_city("Lanara");
        let bytes = city.to_bytes().unwrap();

        let decoded = Improvement::read(&mut BinaryReader::new(&bytes)).unwrap();
        assert_eq!(decoded, city);
        assert_eq!(decoded.level, 1);
        assert_eq!(decoded.production, 1);
        assert_eq!(decoded.border_size, 1);
    }

    #[test]
    fn test_bad_city_name_flag() {
        let mut bytes = MINIMAL_BYTES.to_vec();
        bytes[17] = 2;
        assert!(matches!(
            Improvement::read(&mut BinaryReader::new(&bytes)),
            Err(Error::InvalidFlag { field: "city name", value: 2 })
        ));
    }
}
