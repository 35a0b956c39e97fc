use crate::scarletbook::constants::{
    MAX_AREA_LANGUAGE_COUNT, MAX_CHANNEL_COUNT, MULTI_CHANNEL_TOC_MAGIC, TWO_CHANNEL_TOC_MAGIC,
};
use crate::scarletbook::error::{TocError, TocResult};
use crate::scarletbook::models::common::{CharacterSet, Locale, TimeCode};
use crate::scarletbook::models::master_toc::TocVersion;
use crate::scarletbook::models::text::read_text;
use binrw::{BinRead, BinWrite};
use clap::ValueEnum;
use std::fmt::{Display, Formatter};
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum AreaKind {
    Stereo,
    Multichannel,
}

impl AreaKind {
    pub fn from_magic(id: &[u8; 8]) -> Option<Self> {
        if id == TWO_CHANNEL_TOC_MAGIC {
            Some(AreaKind::Stereo)
        } else if id == MULTI_CHANNEL_TOC_MAGIC {
            Some(AreaKind::Multichannel)
        } else {
            None
        }
    }

    pub fn magic(&self) -> &'static [u8; 8] {
        match self {
            AreaKind::Stereo => TWO_CHANNEL_TOC_MAGIC,
            AreaKind::Multichannel => MULTI_CHANNEL_TOC_MAGIC,
        }
    }
}

impl Display for AreaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AreaKind::Stereo => write!(f, "stereo"),
            AreaKind::Multichannel => write!(f, "multichannel"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    Dst,
    Dsd3In14,
    Dsd3In16,
    Unknown(u8),
}

impl From<u8> for FrameFormat {
    fn from(value: u8) -> Self {
        match value {
            0 => FrameFormat::Dst,
            2 => FrameFormat::Dsd3In14,
            3 => FrameFormat::Dsd3In16,
            other => FrameFormat::Unknown(other),
        }
    }
}

impl FrameFormat {
    pub fn is_dst(&self) -> bool {
        matches!(self, FrameFormat::Dst)
    }
}

/// First sector of an area TOC (`TWOCHTOC` or `MULCHTOC`).
///
/// The magic is kept as a field since both area kinds share this layout.
/// Packed sub-byte fields are stored raw and decoded by the accessors.
#[derive(Debug, Clone, BinRead, BinWrite)]
#[brw(big)]
pub struct AreaToc {
    pub id: [u8; 8],
    pub version: TocVersion,
    /// Length of the whole area TOC in sectors.
    pub size: u16,
    pub reserved01: [u8; 4],
    pub max_byte_rate: u32,
    /// 0x04 means 64 * 44.1 kHz, nothing else exists in practice.
    pub sample_frequency: u8,
    pub frame_format_raw: u8,
    pub reserved03: [u8; 10],
    pub channel_count: u8,
    pub speaker_config_raw: u8,
    pub max_available_channels: u8,
    pub area_mute_flags: u8,
    pub reserved04: [u8; 12],
    pub track_attribute_raw: u8,
    pub reserved06: [u8; 15],
    pub total_playtime: TimeCode,
    pub reserved07: u8,
    /// Offset of the first track number, for multi-disc sets.
    pub track_offset: u8,
    pub track_count: u8,
    pub reserved08: [u8; 2],
    pub track_start: u32,
    pub track_end: u32,
    pub text_area_count: u8,
    pub reserved09: [u8; 7],
    pub languages: [Locale; MAX_AREA_LANGUAGE_COUNT],
    pub track_text_offset: u16,
    pub index_list_offset: u16,
    pub access_list_offset: u16,
    pub reserved10: [u8; 10],
    pub area_description_offset: u16,
    pub copyright_offset: u16,
    pub area_description_phonetic_offset: u16,
    pub copyright_phonetic_offset: u16,
}

impl AreaToc {
    pub const HEADER_SIZE: usize = 152;

    /// Parses the first sector of an area TOC and validates magic, version
    /// and the channel and text counts.
    pub fn parse(sector: &[u8]) -> TocResult<Self> {
        let toc = Self::read(&mut Cursor::new(sector))?;

        if AreaKind::from_magic(&toc.id).is_none() {
            return Err(TocError::Format(format!(
                "bad area TOC magic {:?}",
                String::from_utf8_lossy(&toc.id)
            )));
        }
        toc.version.validate()?;

        if toc.channel_count == 0 || toc.channel_count as usize > MAX_CHANNEL_COUNT {
            return Err(TocError::Format(format!(
                "area declares {} channels",
                toc.channel_count
            )));
        }
        if toc.text_area_count as usize > MAX_AREA_LANGUAGE_COUNT {
            return Err(TocError::Format(format!(
                "area declares {} text channels",
                toc.text_area_count
            )));
        }
        if toc.track_end < toc.track_start {
            return Err(TocError::Format(format!(
                "area ends at sector {} before it starts at {}",
                toc.track_end, toc.track_start
            )));
        }

        Ok(toc)
    }

    pub fn kind(&self) -> AreaKind {
        AreaKind::from_magic(&self.id).unwrap_or(AreaKind::Stereo)
    }

    /// Bits 0-3 of byte 21.
    pub fn frame_format(&self) -> FrameFormat {
        FrameFormat::from(self.frame_format_raw & 0x0f)
    }

    /// Bits 0-2 of byte 33.
    pub fn extra_settings(&self) -> u8 {
        self.speaker_config_raw & 0x07
    }

    /// Bits 3-7 of byte 33.
    pub fn loudspeaker_config(&self) -> u8 {
        self.speaker_config_raw >> 3
    }

    pub fn set_speaker_config(&mut self, loudspeaker_config: u8, extra_settings: u8) {
        self.speaker_config_raw = (loudspeaker_config << 3) | (extra_settings & 0x07);
    }

    /// Bits 0-3 of byte 48.
    pub fn track_attribute(&self) -> u8 {
        self.track_attribute_raw & 0x0f
    }

    pub fn character_set(&self) -> CharacterSet {
        self.languages[0].character_set()
    }

    /// Area description and copyright strings, stored in the same sector at
    /// offsets relative to the TOC start.
    pub fn area_text(&self, sector: &[u8]) -> AreaText {
        let charset = self.character_set();
        let text = |offset: u16| read_text(sector, offset as usize, charset);
        AreaText {
            description: text(self.area_description_offset),
            copyright: text(self.copyright_offset),
            description_phonetic: text(self.area_description_phonetic_offset),
            copyright_phonetic: text(self.copyright_phonetic_offset),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AreaText {
    pub description: Option<String>,
    pub copyright: Option<String>,
    pub description_phonetic: Option<String>,
    pub copyright_phonetic: Option<String>,
}
