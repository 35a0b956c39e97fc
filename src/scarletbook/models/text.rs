use crate::scarletbook::error::{TocError, TocResult};
use crate::scarletbook::models::common::CharacterSet;
use binrw::{BinRead, BinWrite};
use std::io::Cursor;

/// Reads a NUL terminated string starting at `offset` inside `heap`.
///
/// Offset zero means the field is absent. Offsets that point past the heap
/// are treated as absent too, the text tables are not worth failing a rip.
pub fn read_text(heap: &[u8], offset: usize, charset: CharacterSet) -> Option<String> {
    if offset == 0 || offset >= heap.len() {
        return None;
    }
    let raw = &heap[offset..];
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let text = charset.decode(&raw[..end]);
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Header of the `SACDText` block; the positions are byte offsets from the
/// start of the block.
#[derive(Debug, Clone, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(big, magic = b"SACDText")]
pub struct MasterTextBlock {
    pub reserved: [u8; 8],
    pub album_title_position: u16,
    pub album_artist_position: u16,
    pub album_publisher_position: u16,
    pub album_copyright_position: u16,
    pub album_title_phonetic_position: u16,
    pub album_artist_phonetic_position: u16,
    pub album_publisher_phonetic_position: u16,
    pub album_copyright_phonetic_position: u16,
    pub disc_title_position: u16,
    pub disc_artist_position: u16,
    pub disc_publisher_position: u16,
    pub disc_copyright_position: u16,
    pub disc_title_phonetic_position: u16,
    pub disc_artist_phonetic_position: u16,
    pub disc_publisher_phonetic_position: u16,
    pub disc_copyright_phonetic_position: u16,
}

impl MasterTextBlock {
    /// Size of the magic plus the fixed header.
    pub const HEADER_SIZE: usize = 48;
}

/// Album or disc level strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextSet {
    pub title: Option<String>,
    pub title_phonetic: Option<String>,
    pub artist: Option<String>,
    pub artist_phonetic: Option<String>,
    pub publisher: Option<String>,
    pub publisher_phonetic: Option<String>,
    pub copyright: Option<String>,
    pub copyright_phonetic: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MasterText {
    pub album: TextSet,
    pub disc: TextSet,
}

impl MasterText {
    pub fn parse(block: &[u8], charset: CharacterSet) -> TocResult<Self> {
        let header = MasterTextBlock::read(&mut Cursor::new(block))?;
        let text = |offset: u16| read_text(block, offset as usize, charset);

        Ok(Self {
            album: TextSet {
                title: text(header.album_title_position),
                title_phonetic: text(header.album_title_phonetic_position),
                artist: text(header.album_artist_position),
                artist_phonetic: text(header.album_artist_phonetic_position),
                publisher: text(header.album_publisher_position),
                publisher_phonetic: text(header.album_publisher_phonetic_position),
                copyright: text(header.album_copyright_position),
                copyright_phonetic: text(header.album_copyright_phonetic_position),
            },
            disc: TextSet {
                title: text(header.disc_title_position),
                title_phonetic: text(header.disc_title_phonetic_position),
                artist: text(header.disc_artist_position),
                artist_phonetic: text(header.disc_artist_phonetic_position),
                publisher: text(header.disc_publisher_position),
                publisher_phonetic: text(header.disc_publisher_phonetic_position),
                copyright: text(header.disc_copyright_position),
                copyright_phonetic: text(header.disc_copyright_phonetic_position),
            },
        })
    }

    /// Album title, falling back through the disc title.
    pub fn album_title(&self) -> Option<&str> {
        first_of(&[
            &self.album.title,
            &self.album.title_phonetic,
            &self.disc.title,
            &self.disc.title_phonetic,
        ])
    }

    /// Album artist, falling back through the disc artist.
    pub fn artist(&self) -> Option<&str> {
        first_of(&[
            &self.album.artist,
            &self.album.artist_phonetic,
            &self.disc.artist,
            &self.disc.artist_phonetic,
        ])
    }
}

pub(crate) fn first_of<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
    candidates.iter().find_map(|c| c.as_deref())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackTextType {
    Title,
    Performer,
    Songwriter,
    Composer,
    Arranger,
    Message,
    ExtraMessage,
}

impl TrackTextType {
    /// Maps the on-disc type byte; bit 7 marks the phonetic variant.
    pub fn from_byte(value: u8) -> Option<(Self, bool)> {
        let phonetic = value & 0x80 != 0;
        let kind = match value & 0x7f {
            0x01 => TrackTextType::Title,
            0x02 => TrackTextType::Performer,
            0x03 => TrackTextType::Songwriter,
            0x04 => TrackTextType::Composer,
            0x05 => TrackTextType::Arranger,
            0x06 => TrackTextType::Message,
            0x07 => TrackTextType::ExtraMessage,
            _ => return None,
        };
        Some((kind, phonetic))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackText {
    pub title: Option<String>,
    pub performer: Option<String>,
    pub songwriter: Option<String>,
    pub composer: Option<String>,
    pub arranger: Option<String>,
    pub message: Option<String>,
    pub extra_message: Option<String>,
    pub title_phonetic: Option<String>,
    pub performer_phonetic: Option<String>,
    pub songwriter_phonetic: Option<String>,
    pub composer_phonetic: Option<String>,
    pub arranger_phonetic: Option<String>,
    pub message_phonetic: Option<String>,
    pub extra_message_phonetic: Option<String>,
}

impl TrackText {
    fn slot(&mut self, kind: TrackTextType, phonetic: bool) -> &mut Option<String> {
        match (kind, phonetic) {
            (TrackTextType::Title, false) => &mut self.title,
            (TrackTextType::Performer, false) => &mut self.performer,
            (TrackTextType::Songwriter, false) => &mut self.songwriter,
            (TrackTextType::Composer, false) => &mut self.composer,
            (TrackTextType::Arranger, false) => &mut self.arranger,
            (TrackTextType::Message, false) => &mut self.message,
            (TrackTextType::ExtraMessage, false) => &mut self.extra_message,
            (TrackTextType::Title, true) => &mut self.title_phonetic,
            (TrackTextType::Performer, true) => &mut self.performer_phonetic,
            (TrackTextType::Songwriter, true) => &mut self.songwriter_phonetic,
            (TrackTextType::Composer, true) => &mut self.composer_phonetic,
            (TrackTextType::Arranger, true) => &mut self.arranger_phonetic,
            (TrackTextType::Message, true) => &mut self.message_phonetic,
            (TrackTextType::ExtraMessage, true) => &mut self.extra_message_phonetic,
        }
    }
}

/// Decodes the `SACDTTxt` block.
///
/// Layout: magic, then one u16 offset per track (relative to the block
/// start). Each track entry starts with an item count and three padding
/// bytes, followed by items of `type, padding, NUL terminated string`.
/// Strings may be followed by extra NUL padding.
pub fn parse_track_text(
    block: &[u8],
    track_count: usize,
    charset: CharacterSet,
) -> TocResult<Vec<TrackText>> {
    if block.len() < 8 || &block[0..8] != b"SACDTTxt" {
        return Err(TocError::Format("missing SACDTTxt magic".to_string()));
    }
    let table_end = 8 + track_count * 2;
    if block.len() < table_end {
        return Err(TocError::Format("truncated track text table".to_string()));
    }

    let mut tracks = Vec::with_capacity(track_count);
    for i in 0..track_count {
        let offset = u16::from_be_bytes([block[8 + i * 2], block[9 + i * 2]]) as usize;
        let mut text = TrackText::default();
        if offset == 0 || offset >= block.len() {
            tracks.push(text);
            continue;
        }

        let item_count = block[offset] as usize;
        let mut pos = offset + 4;
        for _ in 0..item_count {
            if pos + 2 > block.len() {
                break;
            }
            let type_byte = block[pos];
            pos += 2;

            let string_start = pos;
            while pos < block.len() && block[pos] != 0 {
                pos += 1;
            }
            if let Some((kind, phonetic)) = TrackTextType::from_byte(type_byte) {
                let value = charset.decode(&block[string_start..pos]);
                let value = value.trim();
                if !value.is_empty() {
                    *text.slot(kind, phonetic) = Some(value.to_string());
                }
            }
            while pos < block.len() && block[pos] == 0 {
                pos += 1;
            }
        }
        tracks.push(text);
    }

    Ok(tracks)
}
