use crate::output::TrackContext;
use crate::output::error::OutputResult;
use crate::scarletbook::models::text::first_of;
use clap::ValueEnum;
use lofty::TextEncoding;
use lofty::config::WriteOptions;
use lofty::id3::v2::{ExtendedTextFrame, Frame, FrameId, Id3v2Tag, TextInformationFrame};
use lofty::tag::TagExt;
use log::debug;
use std::borrow::Cow;

/// Which tag, if any, is appended to each output file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum TagMode {
    #[default]
    None,
    #[value(name = "v23")]
    V23,
    /// Track fields only, no album or disc fallbacks.
    #[value(name = "v23-minimal")]
    V23Minimal,
    #[value(name = "v24")]
    V24,
    #[value(name = "v24-minimal")]
    V24Minimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Id3Version {
    V23,
    V24,
}

impl TagMode {
    pub fn is_minimal(&self) -> bool {
        matches!(self, TagMode::V23Minimal | TagMode::V24Minimal)
    }

    pub fn version(&self) -> Option<Id3Version> {
        match self {
            TagMode::None => None,
            TagMode::V23 | TagMode::V23Minimal => Some(Id3Version::V23),
            TagMode::V24 | TagMode::V24Minimal => Some(Id3Version::V24),
        }
    }
}

/// Produces the metadata footer of a track.
pub trait TagRenderer {
    /// Empty when `mode` disables tagging.
    fn render(&self, ctx: &TrackContext<'_>, mode: TagMode) -> OutputResult<Vec<u8>>;
}

/// SACD genre code to ID3v1 genre number.
const SACD_TO_ID3_GENRE: [u8; 31] = [
    12, 12, 60, 40, 12, 32, 140, 2, 3, 98, 109, 80, 38, 7, 8, 86, 77, 10, 103, 104, 13, 15, 16,
    17, 14, 37, 24, 101, 48, 0, 12,
];

pub fn id3_genre(sacd_genre: u8) -> u8 {
    SACD_TO_ID3_GENRE[(sacd_genre & 0x1f) as usize % SACD_TO_ID3_GENRE.len()]
}

/// v2.4 always writes UTF-8, v2.3 writes Latin-1 when every character fits
/// and UTF-16 with a BOM otherwise.
fn text_encoding(version: Id3Version, text: &str) -> TextEncoding {
    match version {
        Id3Version::V24 => TextEncoding::UTF8,
        Id3Version::V23 if text.chars().all(|c| (c as u32) < 0x100) => TextEncoding::Latin1,
        Id3Version::V23 => TextEncoding::UTF16,
    }
}

/// Frames of one tag, in insertion order.
struct Id3Frames {
    version: Id3Version,
    tag: Id3v2Tag,
}

impl Id3Frames {
    fn new(version: Id3Version) -> Self {
        Self {
            version,
            tag: Id3v2Tag::default(),
        }
    }

    fn text(&mut self, id: &'static str, value: &str) {
        let encoding = text_encoding(self.version, value);
        let frame = TextInformationFrame::new(
            FrameId::Valid(Cow::Borrowed(id)),
            encoding,
            value.to_string(),
        );
        self.tag.insert(Frame::Text(frame));
    }

    /// `TXXX` frame, one encoding for description and value.
    fn user_text(&mut self, description: &str, value: &str) {
        let encoding = text_encoding(self.version, &format!("{description}{value}"));
        let frame = ExtendedTextFrame::new(encoding, description.to_string(), value.to_string());
        self.tag.insert(Frame::UserText(frame));
    }

    fn dump(&self) -> OutputResult<Vec<u8>> {
        let options = WriteOptions::default()
            .preferred_padding(0)
            .use_id3v23(self.version == Id3Version::V23);
        let mut bytes = Vec::new();
        self.tag.dump_to(&mut bytes, options)?;
        Ok(bytes)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Id3Renderer;

impl TagRenderer for Id3Renderer {
    fn render(&self, ctx: &TrackContext<'_>, mode: TagMode) -> OutputResult<Vec<u8>> {
        let (Some(version), Some(track)) = (mode.version(), ctx.track()) else {
            return Ok(Vec::new());
        };
        let minimal = mode.is_minimal();
        let book = ctx.book;
        let master = &book.master_text;
        let mut tag = Id3Frames::new(version);

        if let Some(title) = track.title(minimal) {
            tag.text("TIT2", title);
        }
        if let Some(album) = master.album_title() {
            tag.text("TALB", album);
        }
        if let Some(performer) = track.performer(minimal) {
            tag.text("TPE1", performer);
        }
        tag.text(
            "TRCK",
            &format!("{}/{}", track.number(), ctx.area.track_count()),
        );

        if !minimal {
            if let Some(artist) = master.artist() {
                tag.text("TPE2", artist);
            }
            if let Some(performer) = &track.text().performer {
                tag.user_text("Performer", performer);
            }
            if let Some(composer) = track.composer() {
                tag.text("TCOM", composer);
            }
            if let Some(isrc) = track.isrc() {
                tag.text("TSRC", &isrc);
            }
            if let Some(publisher) = first_of(&[&master.album.publisher, &master.disc.publisher])
            {
                tag.text("TPUB", publisher);
            }
            if let Some(copyright) = first_of(&[&master.album.copyright, &master.disc.copyright])
            {
                tag.text("TCOP", copyright);
            }

            let toc = &book.master_toc;
            if toc.album_set_size > 0 {
                tag.text(
                    "TPOS",
                    &format!("{}/{}", toc.album_sequence_number, toc.album_set_size),
                );
            }

            let genre = Some(track.genre())
                .filter(|g| g.is_used())
                .or_else(|| book.album_genre().copied());
            if let Some(genre) = genre {
                let number = id3_genre(genre.genre);
                match version {
                    Id3Version::V23 => tag.text("TCON", &format!("({number})")),
                    Id3Version::V24 => tag.text("TCON", &number.to_string()),
                }
            }

            if toc.disc_date_year != 0 {
                match version {
                    Id3Version::V23 => {
                        tag.text("TYER", &format!("{:04}", toc.disc_date_year));
                        if toc.disc_date_month != 0 && toc.disc_date_day != 0 {
                            tag.text(
                                "TDAT",
                                &format!("{:02}{:02}", toc.disc_date_day, toc.disc_date_month),
                            );
                        }
                    }
                    Id3Version::V24 => {
                        let date = match toc.disc_date() {
                            Some(date) => date.format("%Y-%m-%d").to_string(),
                            None => format!("{:04}", toc.disc_date_year),
                        };
                        tag.text("TDRC", &date);
                    }
                }
            }
        }

        let bytes = tag.dump()?;
        debug!(
            "Rendered {} byte tag for track {}",
            bytes.len(),
            track.number()
        );
        Ok(bytes)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::scarletbook::ScarletBook;
    use crate::scarletbook::testing::{DiscImageBuilder, TestTrack};

    const HEADER_SIZE: usize = 10;

    fn from_syncsafe(bytes: [u8; 4]) -> u32 {
        bytes
            .iter()
            .fold(0u32, |acc, &b| (acc << 7) | (b & 0x7f) as u32)
    }

    /// Frame id and raw body of every frame in `tag`, padding skipped.
    pub fn frames(tag: &[u8]) -> Vec<(String, Vec<u8>)> {
        let v24 = tag[3] == 4;
        let end = HEADER_SIZE + from_syncsafe([tag[6], tag[7], tag[8], tag[9]]) as usize;
        let mut pos = HEADER_SIZE;
        let mut out = Vec::new();
        while pos + 10 <= end && tag[pos] != 0 {
            let id = String::from_utf8_lossy(&tag[pos..pos + 4]).to_string();
            let raw = [tag[pos + 4], tag[pos + 5], tag[pos + 6], tag[pos + 7]];
            let size = if v24 {
                from_syncsafe(raw)
            } else {
                u32::from_be_bytes(raw)
            } as usize;
            out.push((id, tag[pos + 10..pos + 10 + size].to_vec()));
            pos += 10 + size;
        }
        out
    }

    fn body(tag: &[u8], id: &str) -> Option<Vec<u8>> {
        frames(tag)
            .into_iter()
            .find(|(frame_id, _)| frame_id == id)
            .map(|(_, body)| body)
    }

    /// Single byte encoded text of frame `id`.
    pub fn text_frame(tag: &[u8], id: &str) -> Option<String> {
        body(tag, id).map(|body| {
            body[1..]
                .iter()
                .take_while(|&&b| b != 0)
                .map(|&b| b as char)
                .collect()
        })
    }

    async fn book() -> ScarletBook {
        let mut source = DiscImageBuilder::new(2)
            .album("Kind of Blue", "Miles Davis")
            .track(
                TestTrack::new(1, 64)
                    .titled("So What")
                    .performer("Miles Davis Sextet")
                    .composer("Davis"),
            )
            .track(TestTrack::new(1, 64))
            .build();
        ScarletBook::open(&mut source).await.unwrap()
    }

    fn render(book: &ScarletBook, track_index: usize, mode: TagMode) -> Vec<u8> {
        let area = book.stereo_area().unwrap();
        let ctx = TrackContext {
            book,
            area,
            track_index,
            is_last: false,
        };
        Id3Renderer.render(&ctx, mode).unwrap()
    }

    #[tokio::test]
    async fn full_v23_tag_carries_album_fields() {
        let book = book().await;
        let tag = render(&book, 0, TagMode::V23);

        assert_eq!(&tag[0..4], b"ID3\x03");
        assert_eq!(text_frame(&tag, "TIT2").as_deref(), Some("So What"));
        assert_eq!(text_frame(&tag, "TALB").as_deref(), Some("Kind of Blue"));
        assert_eq!(text_frame(&tag, "TPE1").as_deref(), Some("Miles Davis Sextet"));
        assert_eq!(text_frame(&tag, "TPE2").as_deref(), Some("Miles Davis"));
        assert_eq!(text_frame(&tag, "TRCK").as_deref(), Some("1/2"));
        assert_eq!(text_frame(&tag, "TCOM").as_deref(), Some("Davis"));
        assert_eq!(text_frame(&tag, "TSRC").as_deref(), Some("USSM10000001"));
        assert_eq!(text_frame(&tag, "TPOS").as_deref(), Some("1/2"));
        assert_eq!(text_frame(&tag, "TCON").as_deref(), Some("(8)"));
        assert_eq!(text_frame(&tag, "TYER").as_deref(), Some("2004"));
        assert_eq!(text_frame(&tag, "TDAT").as_deref(), Some("2106"));
        assert_eq!(body(&tag, "TIT2").unwrap()[0], 0x00);
    }

    #[tokio::test]
    async fn performer_goes_into_a_user_text_frame() {
        let book = book().await;
        let tag = render(&book, 0, TagMode::V23);

        let txxx = body(&tag, "TXXX").unwrap();
        assert_eq!(txxx[0], 0x00);
        assert_eq!(&txxx[1..10], b"Performer");
        assert_eq!(txxx[10], 0);
        assert!(txxx[11..].starts_with(b"Miles Davis Sextet"));
    }

    #[tokio::test]
    async fn minimal_tag_skips_fallbacks() {
        let book = book().await;
        let tag = render(&book, 1, TagMode::V23Minimal);

        assert_eq!(text_frame(&tag, "TIT2"), None);
        assert_eq!(text_frame(&tag, "TPE1"), None);
        assert_eq!(text_frame(&tag, "TRCK").as_deref(), Some("2/2"));
        assert_eq!(text_frame(&tag, "TCON"), None);

        let full = render(&book, 1, TagMode::V23);
        assert_eq!(text_frame(&full, "TIT2").as_deref(), Some("Kind of Blue"));
        assert_eq!(text_frame(&full, "TPE1").as_deref(), Some("Miles Davis"));
    }

    #[tokio::test]
    async fn v24_writes_utf8_and_recording_date() {
        let book = book().await;
        let tag = render(&book, 0, TagMode::V24);

        assert_eq!(tag[3], 4);
        assert_eq!(text_frame(&tag, "TDRC").as_deref(), Some("2004-06-21"));
        assert_eq!(text_frame(&tag, "TCON").as_deref(), Some("8"));
        assert_eq!(text_frame(&tag, "TYER"), None);
        assert_eq!(body(&tag, "TIT2").unwrap()[0], 0x03);
    }

    #[tokio::test]
    async fn no_tag_when_disabled() {
        let book = book().await;
        assert!(render(&book, 0, TagMode::None).is_empty());
    }

    #[test]
    fn v23_falls_back_to_utf16_outside_latin1() {
        assert_eq!(text_encoding(Id3Version::V23, "Café"), TextEncoding::Latin1);
        assert_eq!(text_encoding(Id3Version::V23, "坂本"), TextEncoding::UTF16);
        assert_eq!(text_encoding(Id3Version::V24, "Café"), TextEncoding::UTF8);
    }

    #[test]
    fn v23_utf16_frame_has_a_bom() {
        let mut frames = Id3Frames::new(Id3Version::V23);
        frames.text("TPE1", "坂本");
        let tag = frames.dump().unwrap();

        let tpe1 = body(&tag, "TPE1").unwrap();
        assert_eq!(tpe1[0], 0x01);
        assert!(tpe1[1..3] == [0xff, 0xfe] || tpe1[1..3] == [0xfe, 0xff]);
    }

    #[test]
    fn genre_table_maps_known_codes() {
        assert_eq!(id3_genre(14), 8);
        assert_eq!(id3_genre(5), 32);
        assert_eq!(id3_genre(23), 17);
    }
}
