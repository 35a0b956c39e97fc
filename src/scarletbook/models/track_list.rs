use crate::scarletbook::constants::{
    MAX_TRACK_COUNT, TRACKLIST_OFFSET_MAGIC, TRACKLIST_TIME_MAGIC,
};
use crate::scarletbook::error::{TocError, TocResult};
use crate::scarletbook::models::common::TimeCode;
use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Seek, SeekFrom};

/// Sector range of one track inside the area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackOffset {
    pub start_lsn: u32,
    pub length_lsn: u32,
}

impl TrackOffset {
    pub fn end_lsn(&self) -> u32 {
        self.start_lsn.saturating_add(self.length_lsn)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackFlags(pub u8);

impl TrackFlags {
    pub fn tmf(&self, n: u8) -> bool {
        debug_assert!((1..=4).contains(&n));
        self.0 & (1 << (n + 2)) != 0
    }

    pub fn ilp(&self) -> bool {
        self.0 & 0x80 != 0
    }
}

/// Start and duration of one track, in timecode frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackTime {
    pub start: TimeCode,
    pub duration: TimeCode,
    pub flags: TrackFlags,
}

impl TrackTime {
    /// Half open frame window `[start, start + duration)`.
    pub fn window(&self) -> (u32, u32) {
        let start = self.start.frame_count();
        (start, start + self.duration.frame_count())
    }
}

fn check_count(track_count: usize) -> TocResult<()> {
    if track_count > MAX_TRACK_COUNT {
        return Err(TocError::Format(format!(
            "{track_count} tracks exceed the limit of {MAX_TRACK_COUNT}"
        )));
    }
    Ok(())
}

fn check_magic(block: &[u8], magic: &[u8; 8]) -> TocResult<()> {
    if block.len() < 8 || &block[0..8] != magic {
        return Err(TocError::Format(format!(
            "expected {} block",
            String::from_utf8_lossy(magic)
        )));
    }
    Ok(())
}

/// Decodes `SACDTRL1`: 255 start sectors followed by 255 lengths, of which
/// only the first `track_count` are meaningful.
pub fn parse_track_offsets(block: &[u8], track_count: usize) -> TocResult<Vec<TrackOffset>> {
    check_count(track_count)?;
    check_magic(block, TRACKLIST_OFFSET_MAGIC)?;

    let mut cursor = Cursor::new(block);
    let mut offsets = vec![TrackOffset::default(); track_count];

    cursor.seek(SeekFrom::Start(8))?;
    for offset in offsets.iter_mut() {
        offset.start_lsn = cursor.read_u32::<BigEndian>()?;
    }

    cursor.seek(SeekFrom::Start(8 + MAX_TRACK_COUNT as u64 * 4))?;
    for offset in offsets.iter_mut() {
        offset.length_lsn = cursor.read_u32::<BigEndian>()?;
    }

    Ok(offsets)
}

/// Decodes `SACDTRL2`: 255 start timecodes followed by 255 durations.
pub fn parse_track_times(block: &[u8], track_count: usize) -> TocResult<Vec<TrackTime>> {
    check_count(track_count)?;
    check_magic(block, TRACKLIST_TIME_MAGIC)?;

    let mut cursor = Cursor::new(block);
    let mut times = vec![TrackTime::default(); track_count];

    cursor.seek(SeekFrom::Start(8))?;
    for time in times.iter_mut() {
        let mut raw = [0u8; 3];
        std::io::Read::read_exact(&mut cursor, &mut raw)?;
        time.start = TimeCode::from_bytes(raw);
        time.flags = TrackFlags(cursor.read_u8()?);
    }

    cursor.seek(SeekFrom::Start(8 + MAX_TRACK_COUNT as u64 * 4))?;
    for time in times.iter_mut() {
        let mut raw = [0u8; 3];
        std::io::Read::read_exact(&mut cursor, &mut raw)?;
        time.duration = TimeCode::from_bytes(raw);
        cursor.read_u8()?;
    }

    Ok(times)
}
