use crate::scarletbook::constants::{ISRC_GENRE_MAGIC, MAX_TRACK_COUNT};
use crate::scarletbook::error::{TocError, TocResult};
use crate::scarletbook::models::common::GenreEntry;
use binrw::BinRead;
use std::io::{Cursor, Seek, SeekFrom};

const ISRC_LEN: usize = 12;

/// ISRC as stored on disc: country (2), owner (3), year (2), designation (5).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Isrc(pub [u8; ISRC_LEN]);

impl Isrc {
    pub fn country(&self) -> &[u8] {
        &self.0[0..2]
    }

    pub fn owner(&self) -> &[u8] {
        &self.0[2..5]
    }

    pub fn year(&self) -> &[u8] {
        &self.0[5..7]
    }

    pub fn designation(&self) -> &[u8] {
        &self.0[7..12]
    }

    /// Blank (all NUL or space) entries count as absent.
    pub fn as_string(&self) -> Option<String> {
        if self.0.iter().all(|&b| b == 0 || b == b' ') {
            return None;
        }
        Some(
            self.0
                .iter()
                .map(|&b| if b == 0 { ' ' } else { b as char })
                .collect::<String>()
                .trim_end()
                .to_string(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackIsrcGenre {
    pub isrc: Isrc,
    pub genre: GenreEntry,
}

/// Decodes `SACD_IGL`, spanning two sectors.
pub fn parse_isrc_genre(block: &[u8], track_count: usize) -> TocResult<Vec<TrackIsrcGenre>> {
    if track_count > MAX_TRACK_COUNT {
        return Err(TocError::Format(format!(
            "{track_count} tracks exceed the limit of {MAX_TRACK_COUNT}"
        )));
    }
    if block.len() < 8 || &block[0..8] != ISRC_GENRE_MAGIC {
        return Err(TocError::Format("expected SACD_IGL block".to_string()));
    }

    let isrc_end = 8 + MAX_TRACK_COUNT * ISRC_LEN;
    let genre_start = isrc_end + 4;
    if block.len() < genre_start + track_count * 4 {
        return Err(TocError::Format("truncated SACD_IGL block".to_string()));
    }
    let mut cursor = Cursor::new(block);
    cursor.seek(SeekFrom::Start(genre_start as u64))?;

    let mut entries = Vec::with_capacity(track_count);
    for i in 0..track_count {
        let start = 8 + i * ISRC_LEN;
        let mut isrc = [0u8; ISRC_LEN];
        isrc.copy_from_slice(&block[start..start + ISRC_LEN]);
        let genre = GenreEntry::read(&mut cursor)?;
        entries.push(TrackIsrcGenre {
            isrc: Isrc(isrc),
            genre,
        });
    }

    Ok(entries)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::scarletbook::constants::{ISRC_GENRE_LEN_LSN, SACD_LSN_SIZE};

    pub fn isrc_genre_block(entries: &[(&[u8; 12], u8)]) -> Vec<u8> {
        let mut buf = ISRC_GENRE_MAGIC.to_vec();
        buf.resize(SACD_LSN_SIZE * ISRC_GENRE_LEN_LSN, 0);
        for (i, (isrc, genre)) in entries.iter().enumerate() {
            let start = 8 + i * ISRC_LEN;
            buf[start..start + ISRC_LEN].copy_from_slice(*isrc);
            let g = 8 + MAX_TRACK_COUNT * ISRC_LEN + 4 + i * 4;
            buf[g] = 1;
            buf[g + 3] = *genre;
        }
        buf
    }

    #[test]
    fn isrc_and_genre_are_paired_per_track() {
        let block = isrc_genre_block(&[(b"USRC17607839", 14), (&[0; 12], 0)]);
        let entries = parse_isrc_genre(&block, 2).unwrap();

        assert_eq!(entries[0].isrc.as_string().as_deref(), Some("USRC17607839"));
        assert_eq!(entries[0].isrc.country(), b"US");
        assert_eq!(entries[0].isrc.owner(), b"RC1");
        assert_eq!(entries[0].isrc.year(), b"76");
        assert_eq!(entries[0].isrc.designation(), b"07839");
        assert_eq!(entries[0].genre.genre_name(), "Jazz");
        assert_eq!(entries[1].isrc.as_string(), None);
    }

    #[test]
    fn block_fits_in_two_sectors() {
        assert!(8 + MAX_TRACK_COUNT * ISRC_LEN + 4 + MAX_TRACK_COUNT * 4 <= 2 * SACD_LSN_SIZE);
    }
}
