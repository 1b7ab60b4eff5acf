use serde::{Deserialize, Serialize};

use crate::codec::{BinaryReader, BinaryWriter};
use crate::error::{Error, Result};
use crate::offsets::{Checkpoint, Region};

/// Id the game gives the nature player, always last in the list
pub const NATURE_PLAYER_ID: u8 = 255;
/// Id kept free for relabelling passes
pub const SCRATCH_PLAYER_ID: u8 = 254;

pub const EMPTY_ACCOUNT_ID: &str = "00000000-0000-0000-0000-000000000000";

// ============================================================================
// Player
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: u8,
    pub name: String,
    pub account_id: String,
    pub autoplay: bool,
    pub start_coords: [i32; 2],
    pub tribe: u16,
    pub unknown_byte1: u8,
    pub difficulty_handicap: u32,
    pub aggressions: Vec<Aggression>,
    pub currency: u32,
    pub score: u32,
    pub unknown_int2: u32,
    pub city_count: u16,
    pub tech: Vec<u16>,
    pub encountered: Vec<u8>,
    pub tasks: Vec<Task>,
    pub kills: i32,
    pub losses: i32,
    pub tribes_destroyed: i32,
    /// Stored blue, green, red, 0
    pub override_color: [u8; 4],
    pub override_tribe: u8,
    pub unique_improvements: Vec<u16>,
    pub diplomacy: Vec<Diplomacy>,
    pub messages: Vec<DiplomacyMessage>,
    pub destroyed_by: u8,
    pub destroyed_turn: u32,
    pub unknown_buffer2: [u8; 4],
    pub end_score: i32,
    pub skin: u16,
    pub unknown_buffer3: [u8; 4],
}

/// Per-opponent aggression entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggression {
    pub player_id: u8,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub kind: i16,
    pub buffer: Vec<u8>,
}

impl Task {
    /// Size of the buffer that follows a task of this kind
    pub fn buffer_len(kind: i16) -> Result<usize> {
        match kind {
            // pacifist and killer carry a counter
            1 | 5 => Ok(6),
            2..=8 => Ok(2),
            _ => Err(Error::InvalidTaskType(kind)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiplomacyMessage {
    pub kind: u8,
    pub sender: u8,
}

impl Player {
    /// A computer-controlled player with default stats.
    /// `color` is given as red, green, blue.
    pub fn empty(index: usize, name: &str, color: [u8; 3]) -> Result<Self> {
        if index >= SCRATCH_PLAYER_ID as usize {
            return Err(Error::PlayerIdOutOfRange(index));
        }
        let id = index as u8;

        let mut aggressions: Vec<Aggression> =
            (1..=id).map(|player_id| Aggression { player_id, value: 0 }).collect();
        aggressions.push(Aggression { player_id: NATURE_PLAYER_ID, value: 0 });

        let [red, green, blue] = color;
        Ok(Self {
            id,
            name: name.to_string(),
            account_id: EMPTY_ACCOUNT_ID.to_string(),
            autoplay: true,
            start_coords: [0, 0],
            tribe: 2,
            unknown_byte1: 1,
            difficulty_handicap: 2,
            aggressions,
            currency: 5,
            score: 0,
            unknown_int2: 0,
            city_count: 1,
            tech: Vec::new(),
            encountered: Vec::new(),
            tasks: Vec::new(),
            kills: 0,
            losses: 0,
            tribes_destroyed: 0,
            override_color: [blue, green, red, 0],
            override_tribe: 0,
            unique_improvements: Vec::new(),
            diplomacy: Vec::new(),
            messages: Vec::new(),
            destroyed_by: 0,
            destroyed_turn: 0,
            unknown_buffer2: [255; 4],
            end_score: -1,
            skin: 0,
            unknown_buffer3: [255; 4],
        })
    }

    /// Insert an aggression entry for `new_id` ahead of the trailing nature entry.
    /// Lists that already cover `new_id` are left alone.
    pub fn include_player(&mut self, new_id: u8) {
        let known = self.aggressions.len().saturating_sub(1);
        if known >= new_id as usize {
            return;
        }
        let at = self.aggressions.len().saturating_sub(1);
        self.aggressions.insert(at, Aggression { player_id: new_id, value: 0 });
    }

    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        Self::read_with(reader, &mut ())
    }

    pub fn read_with(reader: &mut BinaryReader, marks: &mut impl Checkpoint) -> Result<Self> {
        let id = reader.read_u8()?;
        let name = reader.read_var_string()?;
        let account_id = reader.read_var_string()?;
        let autoplay = reader.read_bool()?;
        let start_coords = [reader.read_i32_le()?, reader.read_i32_le()?];
        let tribe = reader.read_u16_le()?;
        let unknown_byte1 = reader.read_u8()?;
        let difficulty_handicap = reader.read_u32_le()?;

        marks.mark(Region::PlayerAggressions(id), reader.position());
        let aggression_count = reader.read_u16_le()?;
        let mut aggressions = Vec::with_capacity(aggression_count as usize);
        for _ in 0..aggression_count {
            aggressions.push(Aggression {
                player_id: reader.read_u8()?,
                value: reader.read_u32_le()?,
            });
        }

        marks.mark(Region::PlayerCurrency(id), reader.position());
        let currency = reader.read_u32_le()?;
        let score = reader.read_u32_le()?;
        let unknown_int2 = reader.read_u32_le()?;
        let city_count = reader.read_u16_le()?;

        let tech = reader.read_u16_list()?;

        let encountered_count = reader.read_u16_le()? as usize;
        let encountered = reader.read_bytes(encountered_count)?.to_vec();

        let task_count = reader.read_i16_le()?;
        if task_count < 0 {
            return Err(Error::NegativeCount { field: "task", count: task_count as i64 });
        }
        let mut tasks = Vec::with_capacity(task_count as usize);
        for _ in 0..task_count {
            let kind = reader.read_i16_le()?;
            let buffer = reader.read_bytes(Task::buffer_len(kind)?)?.to_vec();
            tasks.push(Task { kind, buffer });
        }

        let kills = reader.read_i32_le()?;
        let losses = reader.read_i32_le()?;
        let tribes_destroyed = reader.read_i32_le()?;
        let override_color = reader.read_array()?;
        let override_tribe = reader.read_u8()?;

        let unique_improvements = reader.read_u16_list()?;

        let diplomacy_count = reader.read_u16_le()?;
        let mut diplomacy =
            Vec::with_capacity((diplomacy_count as usize).min(reader.remaining() / Diplomacy::RECORD_LEN));
        for _ in 0..diplomacy_count {
            diplomacy.push(Diplomacy::read(reader)?);
        }

        let message_count = reader.read_u16_le()?;
        let mut messages = Vec::with_capacity(message_count as usize);
        for _ in 0..message_count {
            messages.push(DiplomacyMessage { kind: reader.read_u8()?, sender: reader.read_u8()? });
        }

        Ok(Self {
            id,
            name,
            account_id,
            autoplay,
            start_coords,
            tribe,
            unknown_byte1,
            difficulty_handicap,
            aggressions,
            currency,
            score,
            unknown_int2,
            city_count,
            tech,
            encountered,
            tasks,
            kills,
            losses,
            tribes_destroyed,
            override_color,
            override_tribe,
            unique_improvements,
            diplomacy,
            messages,
            destroyed_by: reader.read_u8()?,
            destroyed_turn: reader.read_u32_le()?,
            unknown_buffer2: reader.read_array()?,
            end_score: reader.read_i32_le()?,
            skin: reader.read_u16_le()?,
            unknown_buffer3: reader.read_array()?,
        })
    }

    pub fn write(&self, writer: &mut BinaryWriter) -> Result<()> {
        writer.write_u8(self.id);
        writer.write_var_string(&self.name)?;
        writer.write_var_string(&self.account_id)?;
        writer.write_bool(self.autoplay);
        writer.write_i32_le(self.start_coords[0]);
        writer.write_i32_le(self.start_coords[1]);
        writer.write_u16_le(self.tribe);
        writer.write_u8(self.unknown_byte1);
        writer.write_u32_le(self.difficulty_handicap);

        writer.write_count_u16("aggressions", self.aggressions.len())?;
        for aggression in &self.aggressions {
            writer.write_u8(aggression.player_id);
            writer.write_u32_le(aggression.value);
        }

        writer.write_u32_le(self.currency);
        writer.write_u32_le(self.score);
        writer.write_u32_le(self.unknown_int2);
        writer.write_u16_le(self.city_count);

        writer.write_u16_list("tech", &self.tech)?;

        writer.write_count_u16("encountered players", self.encountered.len())?;
        writer.write_bytes(&self.encountered);

        let task_count = i16::try_from(self.tasks.len()).map_err(|_| Error::ListTooLong {
            field: "tasks",
            len: self.tasks.len(),
            max: i16::MAX as usize,
        })?;
        writer.write_i16_le(task_count);
        for task in &self.tasks {
            let expected = Task::buffer_len(task.kind)?;
            if task.buffer.len() != expected {
                return Err(Error::InvalidRecord(format!(
                    "task {} buffer is {} bytes, expected {}",
                    task.kind,
                    task.buffer.len(),
                    expected
                )));
            }
            writer.write_i16_le(task.kind);
            writer.write_bytes(&task.buffer);
        }

        writer.write_i32_le(self.kills);
        writer.write_i32_le(self.losses);
        writer.write_i32_le(self.tribes_destroyed);
        writer.write_bytes(&self.override_color);
        writer.write_u8(self.override_tribe);

        writer.write_u16_list("unique improvements", &self.unique_improvements)?;

        writer.write_count_u16("diplomacy", self.diplomacy.len())?;
        for entry in &self.diplomacy {
            entry.write(writer);
        }

        writer.write_count_u16("diplomacy messages", self.messages.len())?;
        for message in &self.messages {
            writer.write_u8(message.kind);
            writer.write_u8(message.sender);
        }

        writer.write_u8(self.destroyed_by);
        writer.write_u32_le(self.destroyed_turn);
        writer.write_bytes(&self.unknown_buffer2);
        writer.write_i32_le(self.end_score);
        writer.write_u16_le(self.skin);
        writer.write_bytes(&self.unknown_buffer3);
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = BinaryWriter::with_capacity(128);
        self.write(&mut writer)?;
        Ok(writer.into_vec())
    }
}

/// Encode a whole player list with its `u16` count
pub fn player_list_to_bytes(players: &[Player]) -> Result<Vec<u8>> {
    let mut writer = BinaryWriter::with_capacity(players.len() * 128 + 2);
    writer.write_count_u16("players", players.len())?;
    for player in players {
        player.write(&mut writer)?;
    }
    Ok(writer.into_vec())
}

// ============================================================================
// Diplomacy
// ============================================================================

/// Relation towards one other player. Turn fields hold [`Diplomacy::NEVER`]
/// when the event has not happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diplomacy {
    pub player_id: u8,
    pub relation_state: u8,
    pub last_attack_turn: i32,
    pub embassy_level: u8,
    pub last_peace_broken_turn: i32,
    pub first_meet_turn: i32,
    pub embassy_build_turn: i32,
    pub previous_attack_turn: i32,
}

impl Diplomacy {
    pub const NEVER: i32 = -100;
    /// Encoded size of one entry
    pub const RECORD_LEN: usize = 23;

    /// `None` for the [`Diplomacy::NEVER`] sentinel
    pub fn turn(value: i32) -> Option<i32> {
        (value != Self::NEVER).then_some(value)
    }

    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            player_id: reader.read_u8()?,
            relation_state: reader.read_u8()?,
            last_attack_turn: reader.read_i32_le()?,
            embassy_level: reader.read_u8()?,
            last_peace_broken_turn: reader.read_i32_le()?,
            first_meet_turn: reader.read_i32_le()?,
            embassy_build_turn: reader.read_i32_le()?,
            previous_attack_turn: reader.read_i32_le()?,
        })
    }

    pub fn write(&self, writer: &mut BinaryWriter) {
        writer.write_u8(self.player_id);
        writer.write_u8(self.relation_state);
        writer.write_i32_le(self.last_attack_turn);
        writer.write_u8(self.embassy_level);
        writer.write_i32_le(self.last_peace_broken_turn);
        writer.write_i32_le(self.first_meet_turn);
        writer.write_i32_le(self.embassy_build_turn);
        writer.write_i32_le(self.previous_attack_turn);
    }
}
