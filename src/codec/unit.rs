use serde::{Deserialize, Serialize};

use crate::codec::{BinaryReader, BinaryWriter};
use crate::error::Result;

/// Encoded size of a unit record
pub const UNIT_RECORD_LEN: usize = 42;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Unit {
    pub id: u32,
    pub owner: u8,
    pub kind: u16,
    /// Non-zero only for multi-segment creatures
    pub follower_id: u32,
    pub leader_id: u32,
    pub position: [i32; 2],
    pub home: [i32; 2],
    /// Health times ten
    pub health: u16,
    pub promotion_level: u16,
    pub experience: u16,
    pub moved: bool,
    pub attacked: bool,
    pub flipped: bool,
    pub created_turn: u16,
}

impl Unit {
    pub fn follower(&self) -> Option<u32> {
        (self.follower_id != 0).then_some(self.follower_id)
    }

    pub fn leader(&self) -> Option<u32> {
        (self.leader_id != 0).then_some(self.leader_id)
    }

    /// Health as shown in game
    pub fn health_points(&self) -> u16 {
        self.health / 10
    }

    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            id: reader.read_u32_le()?,
            owner: reader.read_u8()?,
            kind: reader.read_u16_le()?,
            follower_id: reader.read_u32_le()?,
            leader_id: reader.read_u32_le()?,
            position: [reader.read_i32_le()?, reader.read_i32_le()?],
            home: [reader.read_i32_le()?, reader.read_i32_le()?],
            health: reader.read_u16_le()?,
            promotion_level: reader.read_u16_le()?,
            experience: reader.read_u16_le()?,
            moved: reader.read_bool()?,
            attacked: reader.read_bool()?,
            flipped: reader.read_bool()?,
            created_turn: reader.read_u16_le()?,
        })
    }

    pub fn write(&self, writer: &mut BinaryWriter) {
        writer.write_u32_le(self.id);
        writer.write_u8(self.owner);
        writer.write_u16_le(self.kind);
        writer.write_u32_le(self.follower_id);
        writer.write_u32_le(self.leader_id);
        writer.write_i32_le(self.position[0]);
        writer.write_i32_le(self.position[1]);
        writer.write_i32_le(self.home[0]);
        writer.write_i32_le(self.home[1]);
        writer.write_u16_le(self.health);
        writer.write_u16_le(self.promotion_level);
        writer.write_u16_le(self.experience);
        writer.write_bool(self.moved);
        writer.write_bool(self.attacked);
        writer.write_bool(self.flipped);
        writer.write_u16_le(self.created_turn);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::with_capacity(UNIT_RECORD_LEN);
        self.write(&mut writer);
        writer.into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT_BYTES: [u8; UNIT_RECORD_LEN] = [
        4, 0, 0, 0, 4, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 8, 0, 0, 0, 2, 0, 0, 0, 8, 0, 0, 0, 2, 0, 0, 0,
        100, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    ];

    #[test]
    fn test_decode_unit() {
        let mut reader = BinaryReader::new(&UNIT_BYTES);
        let unit = Unit::read(&mut reader).unwrap();

        assert_eq!(unit.id, 4);
        assert_eq!(unit.owner, 4);
        assert_eq!(unit.kind, 2);
        assert_eq!(unit.position, [8, 2]);
        assert_eq!(unit.home, [8, 2]);
        assert_eq!(unit.health, 100);
        assert_eq!(unit.health_points(), 10);
        assert_eq!(unit.follower(), None);
        assert_eq!(unit.leader(), None);
        assert!(!unit.moved && !unit.attacked && !unit.flipped);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_encode_unit() {
        let unit = Unit {
            id: 4,
            owner: 4,
            kind: 2,
            position: [8, 2],
            home: [8, 2],
            health: 100,
            ..Default::default()
        };
        assert_eq!(unit.to_bytes(), UNIT_BYTES.to_vec());
    }

    #[test]
    fn test_segment_links() {
        let unit = Unit { follower_id: 12, leader_id: 9, ..Default::default() };
        assert_eq!(unit.follower(), Some(12));
        assert_eq!(unit.leader(), Some(9));

        let decoded = Unit::read(&mut BinaryReader::new(&unit.to_bytes())).unwrap();
        assert_eq!(decoded, unit);
    }
}
