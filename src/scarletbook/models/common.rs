use crate::scarletbook::constants::SACD_FRAME_RATE;
use binrw::{BinRead, BinWrite};
use std::fmt::{Display, Formatter};

/// Genre entry shared by the master TOC and the per-track genre list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(big)]
pub struct GenreEntry {
    pub category: u8,
    pub reserved: u16,
    pub genre: u8,
}

impl GenreEntry {
    pub fn category(&self) -> Category {
        Category::from(self.category)
    }

    pub fn is_used(&self) -> bool {
        self.category != 0
    }

    pub fn genre_name(&self) -> &'static str {
        GENRE_NAMES
            .get((self.genre & 0x1f) as usize)
            .copied()
            .unwrap_or(GENRE_NAMES[1])
    }
}

pub const GENRE_NAMES: [&str; 30] = [
    "Not used",
    "Not defined",
    "Adult Contemporary",
    "Alternative Rock",
    "Children's Music",
    "Classical",
    "Contemporary Christian",
    "Country",
    "Dance",
    "Easy Listening",
    "Erotic",
    "Folk",
    "Gospel",
    "Hip Hop",
    "Jazz",
    "Latin",
    "Musical",
    "New Age",
    "Opera",
    "Operetta",
    "Pop Music",
    "Rap",
    "Reggae",
    "Rock Music",
    "Rhythm & Blues",
    "Sound Effects",
    "Sound Track",
    "Spoken Word",
    "World Music",
    "Blues",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    NotUsed,
    General,
    Japanese,
    Unknown(u8),
}

impl From<u8> for Category {
    fn from(value: u8) -> Self {
        match value {
            0 => Category::NotUsed,
            1 => Category::General,
            2 => Category::Japanese,
            other => Category::Unknown(other),
        }
    }
}

/// Character set of a text channel, as stored in the locale tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterSet {
    Unknown,
    Iso646,
    Iso8859_1,
    Ris506,
    Ksc5601,
    Gb2312,
    Big5,
    Iso8859_1Esc,
}

impl From<u8> for CharacterSet {
    fn from(value: u8) -> Self {
        match value & 0x07 {
            1 => CharacterSet::Iso646,
            2 => CharacterSet::Iso8859_1,
            3 => CharacterSet::Ris506,
            4 => CharacterSet::Ksc5601,
            5 => CharacterSet::Gb2312,
            6 => CharacterSet::Big5,
            7 => CharacterSet::Iso8859_1Esc,
            _ => CharacterSet::Unknown,
        }
    }
}

impl CharacterSet {
    /// Single byte sets map bytes straight onto code points.
    pub fn decode(&self, raw: &[u8]) -> String {
        match self {
            CharacterSet::Iso646 | CharacterSet::Iso8859_1 | CharacterSet::Iso8859_1Esc => {
                raw.iter().map(|&b| b as char).collect()
            }
            _ => String::from_utf8_lossy(raw).into_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(big)]
pub struct Locale {
    pub language_code: [u8; 2],
    pub character_set: u8,
    pub reserved: u8,
}

impl Locale {
    pub fn character_set(&self) -> CharacterSet {
        CharacterSet::from(self.character_set)
    }

    pub fn language(&self) -> String {
        self.language_code
            .iter()
            .filter(|b| b.is_ascii_alphabetic())
            .map(|&b| b as char)
            .collect()
    }
}

/// Minutes, seconds and frames at 75 frames per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, BinRead, BinWrite)]
#[brw(big)]
pub struct TimeCode {
    pub minutes: u8,
    pub seconds: u8,
    pub frames: u8,
}

impl TimeCode {
    pub fn new(minutes: u8, seconds: u8, frames: u8) -> Self {
        Self {
            minutes,
            seconds,
            frames,
        }
    }

    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }

    pub fn frame_count(&self) -> u32 {
        (self.minutes as u32 * 60 + self.seconds as u32) * SACD_FRAME_RATE + self.frames as u32
    }

    pub fn from_frame_count(count: u32) -> Self {
        let frames = count % SACD_FRAME_RATE;
        let total_seconds = count / SACD_FRAME_RATE;
        Self {
            minutes: (total_seconds / 60).min(u8::MAX as u32) as u8,
            seconds: (total_seconds % 60) as u8,
            frames: frames as u8,
        }
    }
}

impl Display for TimeCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.minutes, self.seconds, self.frames
        )
    }
}
