use crate::offsets::RegionKey;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unexpected end of data")]
    UnexpectedEof,

    #[error("tile at iteration (row {row}, col {col}) has world coordinates ({x}, {y})")]
    TileCoordinateMismatch { row: usize, col: usize, x: u32, y: u32 },

    #[error("invalid task type: {0}")]
    InvalidTaskType(i16),

    #[error("invalid {field} flag: {value}")]
    InvalidFlag { field: &'static str, value: u16 },

    #[error("negative {field} count: {count}")]
    NegativeCount { field: &'static str, count: i64 },

    #[error("unrecognized compression tag {0:#04x}")]
    InvalidCompressionTag(u8),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("duplicate player id {0}")]
    DuplicatePlayerId(u8),

    #[error("compression error: {0}")]
    Compression(String),

    #[error("string too long: {len} bytes (max {max})")]
    StringTooLong { len: usize, max: usize },

    #[error("{field} too long: {len} entries (max {max})")]
    ListTooLong { field: &'static str, len: usize, max: usize },

    #[error("player id {0} is out of range")]
    PlayerIdOutOfRange(usize),

    #[error("map dimension {value} must be below 256")]
    DimensionOutOfRange { value: u32 },

    #[error("requested dimension {requested} is not larger than existing {existing}")]
    DimensionNotLarger { requested: u32, existing: u32 },

    #[error("tile ({x}, {y}) is outside the {width}x{height} map")]
    TileOutOfBounds { x: usize, y: usize, width: usize, height: usize },

    #[error("no recorded offset for {0}")]
    MissingOffset(RegionKey),

    #[error("player {0} not found")]
    PlayerNotFound(u8),

    #[error("no units owned by player {0}")]
    NoUnitsForOwner(u8),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
