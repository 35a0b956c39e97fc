pub mod constants;
pub mod demux;
pub mod error;
pub mod models;
pub mod reader;
pub mod sector;
#[cfg(test)]
pub mod testing;

use crate::scarletbook::constants::{
    ACCESS_LIST_LEN_LSN, ACCESS_LIST_MAGIC, ISRC_GENRE_LEN_LSN, ISRC_GENRE_MAGIC,
    MASTER_TEXT_MAGIC, MAX_AREA_TOC_SIZE_LSN, SACD_LSN_SIZE, START_OF_MASTER_TOC,
    TRACK_TEXT_MAGIC, TRACKLIST_OFFSET_MAGIC, TRACKLIST_TIME_MAGIC,
};
use crate::scarletbook::demux::TrimWindow;
use crate::scarletbook::error::{TocError, TocResult};
use crate::scarletbook::models::area_toc::{AreaKind, AreaText, AreaToc};
use crate::scarletbook::models::common::{GenreEntry, TimeCode};
use crate::scarletbook::models::isrc_genre::{TrackIsrcGenre, parse_isrc_genre};
use crate::scarletbook::models::master_toc::MasterToc;
use crate::scarletbook::models::text::{MasterText, TrackText, first_of, parse_track_text};
use crate::scarletbook::models::track_list::{
    TrackOffset, TrackTime, parse_track_offsets, parse_track_times,
};
use crate::scarletbook::reader::SectorSource;
use log::{debug, warn};

/// Decoded disc: master TOC, album text and every readable audio area.
#[derive(Debug, Clone)]
pub struct ScarletBook {
    pub master_toc: MasterToc,
    pub master_text: MasterText,
    pub areas: Vec<Area>,
}

impl ScarletBook {
    pub async fn open<S: SectorSource>(source: &mut S) -> TocResult<Self> {
        let sector = source.read_sector(START_OF_MASTER_TOC).await?;
        let master_toc = MasterToc::parse(&sector)?;
        debug!(
            "Master TOC version {}.{:02}, {} text channel(s), hybrid: {}",
            master_toc.version.major,
            master_toc.version.minor,
            master_toc.text_area_count,
            master_toc.is_hybrid()
        );

        let charset = master_toc.locales[0].character_set();
        let text_sector = source.read_sector(START_OF_MASTER_TOC + 1).await?;
        let master_text = if &text_sector[0..8] == MASTER_TEXT_MAGIC {
            match MasterText::parse(&text_sector, charset) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Ignoring unreadable master text: {}", e);
                    MasterText::default()
                }
            }
        } else {
            warn!("Master text block missing, album text will be empty");
            MasterText::default()
        };

        let mut areas = Vec::new();
        for (primary, backup, size) in master_toc.area_locations() {
            if primary == 0 {
                continue;
            }
            let area = match Area::read(source, primary, size, &master_text).await {
                Ok(area) => area,
                Err(TocError::Format(reason)) if backup != 0 => {
                    warn!(
                        "Area TOC at sector {} is damaged ({}), trying backup at {}",
                        primary, reason, backup
                    );
                    Area::read(source, backup, size, &master_text)
                        .await
                        .map_err(|_| TocError::Format(reason))?
                }
                Err(e) => return Err(e),
            };
            debug!(
                "Found {} area: {} channel(s), {} track(s)",
                area.kind(),
                area.channel_count(),
                area.track_count()
            );
            areas.push(area);
        }

        if areas.is_empty() {
            return Err(TocError::NoAudioArea);
        }

        Ok(Self {
            master_toc,
            master_text,
            areas,
        })
    }

    pub fn area(&self, kind: AreaKind) -> Option<&Area> {
        self.areas.iter().find(|a| a.kind() == kind)
    }

    pub fn stereo_area(&self) -> Option<&Area> {
        self.area(AreaKind::Stereo)
    }

    pub fn multichannel_area(&self) -> Option<&Area> {
        self.area(AreaKind::Multichannel)
    }

    pub fn album_title(&self) -> Option<&str> {
        self.master_text.album_title()
    }

    pub fn album_genre(&self) -> Option<&GenreEntry> {
        self.master_toc.album_genre.iter().find(|g| g.is_used())
    }
}

/// One audio program with its track tables.
#[derive(Debug, Clone)]
pub struct Area {
    pub toc: AreaToc,
    pub text: AreaText,
    pub master_text: MasterText,
    pub track_offsets: Vec<TrackOffset>,
    pub track_times: Vec<TrackTime>,
    pub track_text: Vec<TrackText>,
    pub isrc_genre: Vec<TrackIsrcGenre>,
}

impl Area {
    async fn read<S: SectorSource>(
        source: &mut S,
        start: u32,
        size: u16,
        master_text: &MasterText,
    ) -> TocResult<Self> {
        if size == 0 || size > MAX_AREA_TOC_SIZE_LSN {
            return Err(TocError::Format(format!(
                "area TOC at sector {start} claims {size} sectors"
            )));
        }
        let data = source.read_sectors(start, size as u32).await?;
        let toc = AreaToc::parse(&data[..SACD_LSN_SIZE])?;
        if toc.track_end >= source.sector_count() {
            return Err(TocError::Format(format!(
                "area ends at sector {} past the image end ({} sectors)",
                toc.track_end,
                source.sector_count()
            )));
        }
        let text = toc.area_text(&data[..SACD_LSN_SIZE]);
        let track_count = toc.track_count as usize;
        let charset = toc.character_set();

        let mut track_offsets = None;
        let mut track_times = None;
        let mut track_text = None;
        let mut isrc_genre = None;

        let mut pos = SACD_LSN_SIZE;
        while pos + 8 <= data.len() {
            let block = &data[pos..];
            let magic = &block[0..8];

            if magic == TRACKLIST_OFFSET_MAGIC {
                track_offsets = Some(parse_track_offsets(block, track_count)?);
                pos += SACD_LSN_SIZE;
            } else if magic == TRACKLIST_TIME_MAGIC {
                track_times = Some(parse_track_times(block, track_count)?);
                pos += SACD_LSN_SIZE;
            } else if magic == TRACK_TEXT_MAGIC {
                // one block per text channel, only the first is used
                if track_text.is_none() {
                    track_text = Some(parse_track_text(block, track_count, charset)?);
                }
                pos += SACD_LSN_SIZE;
            } else if magic == ISRC_GENRE_MAGIC {
                isrc_genre = Some(parse_isrc_genre(block, track_count)?);
                pos += SACD_LSN_SIZE * ISRC_GENRE_LEN_LSN;
            } else if magic == ACCESS_LIST_MAGIC {
                pos += SACD_LSN_SIZE * ACCESS_LIST_LEN_LSN;
            } else {
                break;
            }
        }

        let track_offsets = track_offsets.ok_or_else(|| {
            TocError::Format(format!("area at sector {start} has no SACDTRL1 block"))
        })?;
        let track_times = track_times.ok_or_else(|| {
            TocError::Format(format!("area at sector {start} has no SACDTRL2 block"))
        })?;

        for (i, offset) in track_offsets.iter().enumerate() {
            if offset.start_lsn < toc.track_start
                || offset.end_lsn() > toc.track_end.saturating_add(1)
            {
                return Err(TocError::Format(format!(
                    "track {} spans sectors {}..{} outside the area {}..={}",
                    i + 1,
                    offset.start_lsn,
                    offset.end_lsn(),
                    toc.track_start,
                    toc.track_end
                )));
            }
        }

        Ok(Self {
            track_text: track_text.unwrap_or_else(|| vec![TrackText::default(); track_count]),
            isrc_genre: isrc_genre
                .unwrap_or_else(|| vec![TrackIsrcGenre::default(); track_count]),
            toc,
            text,
            master_text: master_text.clone(),
            track_offsets,
            track_times,
        })
    }

    pub fn kind(&self) -> AreaKind {
        self.toc.kind()
    }

    pub fn channel_count(&self) -> u8 {
        self.toc.channel_count
    }

    pub fn track_count(&self) -> usize {
        self.track_offsets.len()
    }

    pub fn total_playtime(&self) -> TimeCode {
        self.toc.total_playtime
    }

    /// Track view by zero based index.
    pub fn track(&self, index: usize) -> Option<Track<'_>> {
        (index < self.track_count()).then_some(Track { area: self, index })
    }

    pub fn tracks(&self) -> impl Iterator<Item = Track<'_>> {
        (0..self.track_count()).map(move |index| Track { area: self, index })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Track<'a> {
    area: &'a Area,
    index: usize,
}

impl<'a> Track<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    /// One based track number as printed on the sleeve.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn area(&self) -> &'a Area {
        self.area
    }

    pub fn offset(&self) -> TrackOffset {
        self.area.track_offsets[self.index]
    }

    pub fn time(&self) -> TrackTime {
        self.area.track_times[self.index]
    }

    /// Timecode frames that belong to the track, pauses excluded.
    pub fn window(&self) -> TrimWindow {
        let (start, end) = self.time().window();
        TrimWindow { start, end }
    }

    /// Whether sector `lsn` lies inside the track's sector range.
    pub fn contains_sector(&self, lsn: u32) -> bool {
        let offset = self.offset();
        lsn >= offset.start_lsn && lsn < offset.end_lsn()
    }

    pub fn text(&self) -> &'a TrackText {
        &self.area.track_text[self.index]
    }

    /// Track title, falling back to the album then disc title unless
    /// `minimal` is set.
    pub fn title(&self, minimal: bool) -> Option<&'a str> {
        let text = self.text();
        if minimal {
            return text.title.as_deref();
        }
        let master = &self.area.master_text;
        first_of(&[
            &text.title,
            &master.album.title,
            &master.album.title_phonetic,
            &master.disc.title,
            &master.disc.title_phonetic,
        ])
    }

    /// Track performer, falling back to the album then disc artist unless
    /// `minimal` is set.
    pub fn performer(&self, minimal: bool) -> Option<&'a str> {
        let text = self.text();
        if minimal {
            return text.performer.as_deref();
        }
        let master = &self.area.master_text;
        first_of(&[
            &text.performer,
            &master.album.artist,
            &master.album.artist_phonetic,
            &master.disc.artist,
            &master.disc.artist_phonetic,
        ])
    }

    pub fn composer(&self) -> Option<&'a str> {
        self.text().composer.as_deref()
    }

    pub fn songwriter(&self) -> Option<&'a str> {
        self.text().songwriter.as_deref()
    }

    pub fn arranger(&self) -> Option<&'a str> {
        self.text().arranger.as_deref()
    }

    pub fn message(&self) -> Option<&'a str> {
        self.text().message.as_deref()
    }

    pub fn isrc(&self) -> Option<String> {
        self.area.isrc_genre[self.index].isrc.as_string()
    }

    pub fn genre(&self) -> GenreEntry {
        self.area.isrc_genre[self.index].genre
    }
}
