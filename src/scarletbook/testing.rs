//! In-memory disc images for tests.

use crate::scarletbook::constants::{
    ISRC_GENRE_LEN_LSN, MAX_FRAME_INFO_COUNT, MAX_PACKET_INFO_COUNT, MAX_PACKET_SIZE,
    SACD_LSN_SIZE, START_OF_MASTER_TOC,
};
use crate::scarletbook::models::area_toc::tests::{sample_area_toc, sector_bytes};
use crate::scarletbook::models::area_toc::AreaKind;
use crate::scarletbook::models::common::TimeCode;
use crate::scarletbook::models::isrc_genre::tests::isrc_genre_block;
use crate::scarletbook::models::master_toc::tests::{
    sample_master_toc, sector_bytes as master_bytes,
};
use crate::scarletbook::models::text::tests::{master_text_sector, track_text_block};
use crate::scarletbook::models::track_list::tests::{track_offsets_block, track_times_block};
use crate::scarletbook::models::track_list::{TrackFlags, TrackOffset, TrackTime};
use crate::scarletbook::reader::SectorSource;
use crate::scarletbook::reader::error::{ReaderError, ReaderResult};
use crate::scarletbook::sector::{DataType, PacketInfo};

pub const AREA_TOC_START: u32 = 544;
pub const AREA_TOC_BACKUP: u32 = 560;
pub const AREA_TOC_SIZE: u16 = 6;
pub const AUDIO_START: u32 = 600;
pub const PAUSE_FILL: u8 = 0xee;

#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Vec<u8>,
    position: u32,
}

impl MemorySource {
    pub fn new(mut data: Vec<u8>) -> Self {
        data.resize(data.len().div_ceil(SACD_LSN_SIZE) * SACD_LSN_SIZE, 0);
        Self { data, position: 0 }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    pub fn patch(&mut self, lsn: u32, offset: usize, bytes: &[u8]) {
        let start = lsn as usize * SACD_LSN_SIZE + offset;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
    }
}

impl SectorSource for MemorySource {
    fn sector_count(&self) -> u32 {
        (self.data.len() / SACD_LSN_SIZE) as u32
    }

    async fn seek(&mut self, lsn: u32) -> ReaderResult<()> {
        if lsn > self.sector_count() {
            return Err(ReaderError::OutOfRange {
                lsn,
                sector_count: self.sector_count(),
            });
        }
        self.position = lsn;
        Ok(())
    }

    async fn read_next(&mut self) -> ReaderResult<Vec<u8>> {
        if self.position >= self.sector_count() {
            return Err(ReaderError::OutOfRange {
                lsn: self.position,
                sector_count: self.sector_count(),
            });
        }
        let start = self.position as usize * SACD_LSN_SIZE;
        self.position += 1;
        Ok(self.data[start..start + SACD_LSN_SIZE].to_vec())
    }
}

/// One frame to be multiplexed into sectors.
#[derive(Debug, Clone)]
pub struct FrameSpec {
    pub frame_count: u32,
    pub data: Vec<u8>,
    /// Supplementary and padding packet sizes written after the audio.
    pub supplementary: usize,
    pub padding: usize,
}

impl FrameSpec {
    pub fn new(frame_count: u32, data: Vec<u8>) -> Self {
        Self {
            frame_count,
            data,
            supplementary: 0,
            padding: 0,
        }
    }
}

#[derive(Default)]
struct SectorPacker {
    packets: Vec<(PacketInfo, Vec<u8>)>,
    frame_infos: Vec<TimeCode>,
    payload: usize,
    sectors: Vec<Vec<u8>>,
    /// Sector index each frame starts in.
    starts: Vec<usize>,
}

impl SectorPacker {
    fn room(&self, starting: bool) -> usize {
        if self.packets.len() == MAX_PACKET_INFO_COUNT
            || (starting && self.frame_infos.len() == MAX_FRAME_INFO_COUNT)
        {
            return 0;
        }
        let header =
            1 + (self.packets.len() + 1) * 2 + (self.frame_infos.len() + starting as usize) * 3;
        SACD_LSN_SIZE.saturating_sub(header + self.payload)
    }

    fn push(&mut self, data_type: DataType, mut frame_start: Option<TimeCode>, bytes: &[u8]) {
        let mut rest = bytes;
        while !rest.is_empty() {
            let room = self.room(frame_start.is_some()).min(MAX_PACKET_SIZE);
            if room == 0 {
                self.flush();
                continue;
            }
            let n = room.min(rest.len());
            self.packets.push((
                PacketInfo {
                    frame_start: frame_start.is_some(),
                    data_type,
                    length: n as u16,
                },
                rest[..n].to_vec(),
            ));
            if let Some(tc) = frame_start.take() {
                self.frame_infos.push(tc);
                self.starts.push(self.sectors.len());
            }
            self.payload += n;
            rest = &rest[n..];
        }
    }

    fn flush(&mut self) {
        if self.packets.is_empty() {
            return;
        }
        let counts = ((self.packets.len() as u8) << 5) | ((self.frame_infos.len() as u8) << 2);
        let mut sector = vec![counts];
        for (info, _) in &self.packets {
            sector.extend_from_slice(&info.encode());
        }
        for tc in &self.frame_infos {
            sector.extend_from_slice(&[tc.minutes, tc.seconds, tc.frames]);
        }
        for (_, payload) in &self.packets {
            sector.extend_from_slice(payload);
        }
        sector.resize(SACD_LSN_SIZE, 0);
        self.sectors.push(sector);

        self.packets.clear();
        self.frame_infos.clear();
        self.payload = 0;
    }
}

/// Multiplexes plain DSD frames into audio sectors.
pub fn pack_frames(frames: &[FrameSpec]) -> Vec<Vec<u8>> {
    pack_frames_indexed(frames).0
}

/// Like `pack_frames`, also returning the sector index each frame starts in.
pub fn pack_frames_indexed(frames: &[FrameSpec]) -> (Vec<Vec<u8>>, Vec<usize>) {
    let mut packer = SectorPacker::default();
    for frame in frames {
        let tc = TimeCode::from_frame_count(frame.frame_count);
        packer.push(DataType::Audio, Some(tc), &frame.data);
        if frame.supplementary > 0 {
            packer.push(DataType::Supplementary, None, &vec![0x55; frame.supplementary]);
        }
        if frame.padding > 0 {
            packer.push(DataType::Padding, None, &vec![0; frame.padding]);
        }
    }
    packer.flush();
    (packer.sectors, packer.starts)
}

#[derive(Debug, Clone)]
pub struct TestTrack {
    pub frames: usize,
    pub frame_len: usize,
    pub pause_frames: usize,
    pub title: Option<String>,
    pub performer: Option<String>,
    pub composer: Option<String>,
}

impl TestTrack {
    pub fn new(frames: usize, frame_len: usize) -> Self {
        Self {
            frames,
            frame_len,
            pause_frames: 0,
            title: None,
            performer: None,
            composer: None,
        }
    }

    pub fn pause(mut self, frames: usize) -> Self {
        self.pause_frames = frames;
        self
    }

    pub fn titled(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn performer(mut self, performer: &str) -> Self {
        self.performer = Some(performer.to_string());
        self
    }

    pub fn composer(mut self, composer: &str) -> Self {
        self.composer = Some(composer.to_string());
        self
    }
}

/// Builds a complete single area disc image.
///
/// Frame `n` of the area (counting pause frames) carries the timecode `n`.
/// Audio bytes are `(n * 31 + i) as u8`; pause frames are filled with
/// `PAUSE_FILL`.
#[derive(Debug, Clone)]
pub struct DiscImageBuilder {
    pub channel_count: u8,
    pub dst: bool,
    pub album_title: Option<String>,
    pub album_artist: Option<String>,
    pub tracks: Vec<TestTrack>,
    pub corrupt_primary_area_toc: bool,
    pub omit_track_list: bool,
    /// Pack every frame of the area back to back, so tracks begin and end
    /// mid-sector like on a pressed disc.
    pub continuous: bool,
}

impl DiscImageBuilder {
    pub fn new(channel_count: u8) -> Self {
        Self {
            channel_count,
            dst: false,
            album_title: None,
            album_artist: None,
            tracks: Vec::new(),
            corrupt_primary_area_toc: false,
            omit_track_list: false,
            continuous: false,
        }
    }

    pub fn album(mut self, title: &str, artist: &str) -> Self {
        self.album_title = Some(title.to_string());
        self.album_artist = Some(artist.to_string());
        self
    }

    pub fn track(mut self, track: TestTrack) -> Self {
        self.tracks.push(track);
        self
    }

    pub fn continuous(mut self) -> Self {
        self.continuous = true;
        self
    }

    pub fn kind(&self) -> AreaKind {
        if self.channel_count > 2 {
            AreaKind::Multichannel
        } else {
            AreaKind::Stereo
        }
    }

    fn frame_data(n: usize, len: usize) -> Vec<u8> {
        (0..len).map(|i| (n * 31 + i) as u8).collect()
    }

    /// Audio bytes of one track without its pause frames.
    pub fn track_audio(&self, index: usize) -> Vec<u8> {
        let mut n: usize = self.tracks[..index]
            .iter()
            .map(|t| t.pause_frames + t.frames)
            .sum();
        let track = &self.tracks[index];
        n += track.pause_frames;
        (n..n + track.frames)
            .flat_map(|f| Self::frame_data(f, track.frame_len))
            .collect()
    }

    /// Frames of every track, pauses first, and the index of each track's
    /// first frame.
    fn frame_specs(&self) -> (Vec<FrameSpec>, Vec<usize>) {
        let mut specs = Vec::new();
        let mut firsts = Vec::new();
        for track in &self.tracks {
            firsts.push(specs.len());
            for _ in 0..track.pause_frames {
                let n = specs.len();
                specs.push(FrameSpec::new(n as u32, vec![PAUSE_FILL; track.frame_len]));
            }
            for _ in 0..track.frames {
                let n = specs.len();
                specs.push(FrameSpec::new(n as u32, Self::frame_data(n, track.frame_len)));
            }
        }
        (specs, firsts)
    }

    /// Audio sectors and the sector range of each track, relative to the
    /// first audio sector.
    fn audio_sectors(&self) -> (Vec<Vec<u8>>, Vec<(u32, u32)>) {
        let (specs, firsts) = self.frame_specs();

        if self.continuous {
            // a track spans the sectors its frames start in, so it may share
            // its first and last sector with its neighbours
            let (sectors, starts) = pack_frames_indexed(&specs);
            let ranges = (0..self.tracks.len())
                .map(|i| {
                    let first = firsts[i];
                    let end = firsts.get(i + 1).copied().unwrap_or(specs.len());
                    if first == end {
                        return (starts.get(first).copied().unwrap_or(sectors.len()) as u32, 0);
                    }
                    let (start, last) = (starts[first], starts[end - 1]);
                    (start as u32, (last - start + 1) as u32)
                })
                .collect();
            return (sectors, ranges);
        }

        let mut bounds = firsts;
        bounds.push(specs.len());
        let mut sectors = Vec::new();
        let mut ranges = Vec::new();
        for window in bounds.windows(2) {
            let packed = pack_frames(&specs[window[0]..window[1]]);
            ranges.push((sectors.len() as u32, packed.len() as u32));
            sectors.extend(packed);
        }
        (sectors, ranges)
    }

    pub fn build(&self) -> MemorySource {
        let (audio, ranges) = self.audio_sectors();
        let mut offsets = Vec::new();
        let mut times = Vec::new();
        let mut n = 0usize;
        for (track, (start, length)) in self.tracks.iter().zip(ranges) {
            offsets.push(TrackOffset {
                start_lsn: AUDIO_START + start,
                length_lsn: length,
            });
            n += track.pause_frames;
            times.push(TrackTime {
                start: TimeCode::from_frame_count(n as u32),
                duration: TimeCode::from_frame_count(track.frames as u32),
                flags: TrackFlags::default(),
            });
            n += track.frames;
        }
        let lsn = AUDIO_START + audio.len() as u32;

        let mut master = sample_master_toc();
        master.area_1_toc_1_start = AREA_TOC_START;
        master.area_1_toc_2_start = AREA_TOC_BACKUP;
        master.area_1_toc_size = AREA_TOC_SIZE;

        let mut area = sample_area_toc(self.kind(), self.channel_count);
        area.size = AREA_TOC_SIZE;
        area.frame_format_raw = if self.dst { 0 } else { 2 };
        area.track_count = self.tracks.len() as u8;
        area.track_start = AUDIO_START;
        area.track_end = lsn.saturating_sub(1).max(AUDIO_START);
        area.total_playtime = TimeCode::from_frame_count(n as u32);
        area.set_speaker_config(0, if self.channel_count == 6 { 4 } else { 0 });

        let mut area_sectors = vec![sector_bytes(&area)];
        if !self.omit_track_list {
            area_sectors.push(track_offsets_block(&offsets));
            area_sectors.push(track_times_block(&times));
        }
        let text: Vec<Vec<(u8, &str)>> = self
            .tracks
            .iter()
            .map(|t| {
                let mut items = Vec::new();
                if let Some(title) = &t.title {
                    items.push((0x01, title.as_str()));
                }
                if let Some(performer) = &t.performer {
                    items.push((0x02, performer.as_str()));
                }
                if let Some(composer) = &t.composer {
                    items.push((0x04, composer.as_str()));
                }
                items
            })
            .collect();
        area_sectors.push(track_text_block(&text));

        let isrcs: Vec<[u8; 12]> = (0..self.tracks.len())
            .map(|i| {
                let mut raw = [0u8; 12];
                raw.copy_from_slice(format!("USSM1{:07}", i + 1).as_bytes());
                raw
            })
            .collect();
        let entries: Vec<(&[u8; 12], u8)> = isrcs.iter().map(|raw| (raw, 14)).collect();
        let igl = isrc_genre_block(&entries);
        for chunk in igl.chunks(SACD_LSN_SIZE).take(ISRC_GENRE_LEN_LSN) {
            area_sectors.push(chunk.to_vec());
        }
        let area_toc: Vec<u8> = area_sectors.concat();

        let total_sectors = lsn.max(AUDIO_START + 1) as usize;
        let mut image = vec![0u8; total_sectors * SACD_LSN_SIZE];
        let mut place = |lsn: u32, bytes: &[u8]| {
            let start = lsn as usize * SACD_LSN_SIZE;
            image[start..start + bytes.len()].copy_from_slice(bytes);
        };

        place(START_OF_MASTER_TOC, &master_bytes(&master));
        place(
            START_OF_MASTER_TOC + 1,
            &master_text_sector(self.album_title.as_deref(), self.album_artist.as_deref(), None),
        );
        place(AREA_TOC_BACKUP, &area_toc);
        if self.corrupt_primary_area_toc {
            let mut broken = area_toc.clone();
            broken[0..8].copy_from_slice(b"GARBAGE!");
            place(AREA_TOC_START, &broken);
        } else {
            place(AREA_TOC_START, &area_toc);
        }
        for (i, sector) in audio.iter().enumerate() {
            place(AUDIO_START + i as u32, sector);
        }

        MemorySource::new(image)
    }
}
