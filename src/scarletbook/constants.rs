/// Length of one logical block (sector) of an SACD.
pub const SACD_LSN_SIZE: usize = 2048;

pub const SACD_SAMPLING_FREQUENCY: u32 = 2_822_400;
pub const SACD_FRAME_RATE: u32 = 75;

pub const START_OF_MASTER_TOC: u32 = 510;
pub const MAX_AREA_TOC_SIZE_LSN: u16 = 96;

pub const MAX_MASTER_LANGUAGE_COUNT: usize = 8;
pub const MAX_AREA_LANGUAGE_COUNT: usize = 10;
pub const MAX_CHANNEL_COUNT: usize = 6;
pub const MAX_TRACK_COUNT: usize = 255;

/// Upper bound for one multiplexed audio frame.
pub const MAX_FRAME_SIZE: usize = 1024 * 64;
pub const MAX_PACKET_SIZE: usize = 2045;
pub const MAX_PACKET_INFO_COUNT: usize = 7;
pub const MAX_FRAME_INFO_COUNT: usize = 7;

pub const SUPPORTED_VERSION_MAJOR: u8 = 1;
pub const SUPPORTED_VERSION_MINOR: u8 = 20;

pub const MASTER_TEXT_MAGIC: &[u8; 8] = b"SACDText";
pub const TWO_CHANNEL_TOC_MAGIC: &[u8; 8] = b"TWOCHTOC";
pub const MULTI_CHANNEL_TOC_MAGIC: &[u8; 8] = b"MULCHTOC";
pub const TRACKLIST_OFFSET_MAGIC: &[u8; 8] = b"SACDTRL1";
pub const TRACKLIST_TIME_MAGIC: &[u8; 8] = b"SACDTRL2";
pub const TRACK_TEXT_MAGIC: &[u8; 8] = b"SACDTTxt";
pub const ISRC_GENRE_MAGIC: &[u8; 8] = b"SACD_IGL";
pub const ACCESS_LIST_MAGIC: &[u8; 8] = b"SACD_ACC";

/// Sectors occupied by each optional area TOC block.
pub const ISRC_GENRE_LEN_LSN: usize = 2;
pub const ACCESS_LIST_LEN_LSN: usize = 32;
