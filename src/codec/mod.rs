pub mod reader;
pub mod writer;
pub mod compression;
pub mod version;
pub mod improvement;
pub mod unit;
pub mod tile;
pub mod player;
pub mod map_header;

pub use reader::BinaryReader;
pub use writer::BinaryWriter;
pub use version::{FormatVersion, MapHeaderLayout, TileLayout};
pub use improvement::{Improvement, Rebellion, CITY_IMPROVEMENT};
pub use unit::Unit;
pub use tile::{FloodState, Passenger, Tile, TileContext, TileImprovement, TileUnit};
pub use player::{
    Aggression, Diplomacy, DiplomacyMessage, Player, Task,
    NATURE_PLAYER_ID, SCRATCH_PLAYER_ID,
};
pub use map_header::{MapHeader, TribeSkin};
