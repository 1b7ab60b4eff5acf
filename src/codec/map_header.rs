use serde::{Deserialize, Serialize};

use crate::codec::version::FormatVersion;
use crate::codec::{BinaryReader, BinaryWriter};
use crate::error::Result;
use crate::offsets::{Checkpoint, Region};

/// Game settings and map dimensions that open each world snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapHeader {
    pub engine_version: u32,
    pub game_version: u32,
    pub total_actions: u16,
    pub current_turn: u32,
    pub current_player_index: u8,
    pub max_unit_id: u32,
    pub current_game_state: u8,
    pub seed: i32,
    pub turn_limit: u32,
    pub score_limit: u32,
    pub win_by_capital: u8,
    pub unknown_settings: [u8; 6],
    pub game_mode_base: u8,
    pub game_mode_rules: u8,
    pub map_name: String,
    /// Side of the square the map generator was asked for
    pub square_size: u32,
    pub disabled_tribes: Vec<u16>,
    pub unlocked_tribes: Vec<u16>,
    pub difficulty: u16,
    pub opponent_count: u32,
    pub game_type: u16,
    pub map_preset: u8,
    pub turn_time_limit_minutes: i32,
    pub unknown_float1: f32,
    pub unknown_float2: f32,
    pub base_time_seconds: f32,
    pub time_settings: [u8; 4],
    pub tribe_skins: Vec<TribeSkin>,
    /// A zero width/height pair preceded the real one
    #[serde(default)]
    pub placeholder_dimensions: bool,
    pub width: u16,
    pub height: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TribeSkin {
    pub tribe: u16,
    pub skin: u16,
}

impl MapHeader {
    pub fn format_version(&self) -> FormatVersion {
        FormatVersion(self.game_version)
    }

    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        Self::read_with(reader, &mut ())
    }

    pub fn read_with(reader: &mut BinaryReader, marks: &mut impl Checkpoint) -> Result<Self> {
        let engine_version = reader.read_u32_le()?;
        let game_version = reader.read_u32_le()?;
        let total_actions = reader.read_u16_le()?;
        let current_turn = reader.read_u32_le()?;
        let current_player_index = reader.read_u8()?;
        let max_unit_id = reader.read_u32_le()?;
        let current_game_state = reader.read_u8()?;
        let seed = reader.read_i32_le()?;
        let turn_limit = reader.read_u32_le()?;
        let score_limit = reader.read_u32_le()?;
        let win_by_capital = reader.read_u8()?;
        let unknown_settings = reader.read_array()?;
        let game_mode_base = reader.read_u8()?;
        let game_mode_rules = reader.read_u8()?;
        let layout = FormatVersion(game_version).map_header_layout();

        let map_name = reader.read_var_string()?;

        marks.mark(Region::SquareSize, reader.position());
        let square_size = reader.read_u32_le()?;

        let disabled_tribes = reader.read_u16_list()?;
        let unlocked_tribes = reader.read_u16_list()?;

        let difficulty = reader.read_u16_le()?;
        let opponent_count = reader.read_u32_le()?;
        let game_type = reader.read_u16_le()?;
        let map_preset = reader.read_u8()?;
        let turn_time_limit_minutes = reader.read_i32_le()?;
        let unknown_float1 = reader.read_f32_le()?;
        let unknown_float2 = reader.read_f32_le()?;
        let base_time_seconds = reader.read_f32_le()?;
        let time_settings = reader.read_array()?;

        let skin_count = reader.read_u32_le()?;
        let mut tribe_skins = Vec::with_capacity((skin_count as usize).min(reader.remaining() / 4));
        for _ in 0..skin_count {
            tribe_skins.push(TribeSkin { tribe: reader.read_u16_le()?, skin: reader.read_u16_le()? });
        }

        let (mut width, mut height) = read_dimensions(reader, marks)?;
        let mut placeholder_dimensions = false;
        if layout.placeholder_dimensions && width == 0 && height == 0 {
            (width, height) = read_dimensions(reader, marks)?;
            placeholder_dimensions = true;
        }

        Ok(Self {
            engine_version,
            game_version,
            total_actions,
            current_turn,
            current_player_index,
            max_unit_id,
            current_game_state,
            seed,
            turn_limit,
            score_limit,
            win_by_capital,
            unknown_settings,
            game_mode_base,
            game_mode_rules,
            map_name,
            square_size,
            disabled_tribes,
            unlocked_tribes,
            difficulty,
            opponent_count,
            game_type,
            map_preset,
            turn_time_limit_minutes,
            unknown_float1,
            unknown_float2,
            base_time_seconds,
            time_settings,
            tribe_skins,
            placeholder_dimensions,
            width,
            height,
        })
    }

    pub fn write(&self, writer: &mut BinaryWriter) -> Result<()> {
        writer.write_u32_le(self.engine_version);
        writer.write_u32_le(self.game_version);
        writer.write_u16_le(self.total_actions);
        writer.write_u32_le(self.current_turn);
        writer.write_u8(self.current_player_index);
        writer.write_u32_le(self.max_unit_id);
        writer.write_u8(self.current_game_state);
        writer.write_i32_le(self.seed);
        writer.write_u32_le(self.turn_limit);
        writer.write_u32_le(self.score_limit);
        writer.write_u8(self.win_by_capital);
        writer.write_bytes(&self.unknown_settings);
        writer.write_u8(self.game_mode_base);
        writer.write_u8(self.game_mode_rules);

        writer.write_var_string(&self.map_name)?;
        writer.write_u32_le(self.square_size);
        writer.write_u16_list("disabled tribes", &self.disabled_tribes)?;
        writer.write_u16_list("unlocked tribes", &self.unlocked_tribes)?;

        writer.write_u16_le(self.difficulty);
        writer.write_u32_le(self.opponent_count);
        writer.write_u16_le(self.game_type);
        writer.write_u8(self.map_preset);
        writer.write_i32_le(self.turn_time_limit_minutes);
        writer.write_f32_le(self.unknown_float1);
        writer.write_f32_le(self.unknown_float2);
        writer.write_f32_le(self.base_time_seconds);
        writer.write_bytes(&self.time_settings);

        writer.write_u32_le(self.tribe_skins.len() as u32);
        for skin in &self.tribe_skins {
            writer.write_u16_le(skin.tribe);
            writer.write_u16_le(skin.skin);
        }

        if self.placeholder_dimensions {
            writer.write_u16_le(0);
            writer.write_u16_le(0);
        }
        writer.write_u16_le(self.width);
        writer.write_u16_le(self.height);
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = BinaryWriter::with_capacity(128);
        self.write(&mut writer)?;
        Ok(writer.into_vec())
    }
}

fn read_dimensions(reader: &mut BinaryReader, marks: &mut impl Checkpoint) -> Result<(u16, u16)> {
    marks.mark(Region::MapWidth, reader.position());
    let width = reader.read_u16_le()?;
    marks.mark(Region::MapHeight, reader.position());
    let height = reader.read_u16_le()?;
    Ok((width, height))
}
