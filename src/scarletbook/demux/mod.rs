pub mod error;

use crate::scarletbook::constants::{MAX_FRAME_SIZE, MAX_PACKET_SIZE};
use crate::scarletbook::demux::error::{DemuxError, DemuxResult};
use crate::scarletbook::models::common::TimeCode;
use crate::scarletbook::sector::{AudioSector, DataType};
use log::{debug, trace};

/// One multiplexed audio frame, reassembled from the audio packets of one or
/// more sectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    pub data: Vec<u8>,
    pub channel_count: u8,
    pub dst_encoded: bool,
    pub time_code: TimeCode,
    /// Sector in which the frame started.
    pub start_lsn: u32,
}

impl AudioFrame {
    pub fn frame_count(&self) -> u32 {
        self.time_code.frame_count()
    }
}

/// Half open range of timecode frames `[start, end)` that belongs to a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimWindow {
    pub start: u32,
    pub end: u32,
}

impl TrimWindow {
    pub fn new(start: u32, duration: u32) -> Self {
        Self {
            start,
            end: start.saturating_add(duration),
        }
    }

    pub fn contains(&self, frame_count: u32) -> bool {
        frame_count >= self.start && frame_count < self.end
    }
}

/// Sector by sector frame reassembly.
///
/// A frame is open from its `frame_start` packet until the next one. Audio
/// bytes seen while no frame is open (the tail of a frame that started
/// before the first pushed sector) are discarded.
#[derive(Debug)]
pub struct FrameDemuxer {
    area_channels: u8,
    current: Option<AudioFrame>,
    orphaned_bytes: u64,
}

impl FrameDemuxer {
    /// `area_channels` is used for plain DSD sectors, which carry no channel
    /// bits of their own.
    pub fn new(area_channels: u8) -> Self {
        Self {
            area_channels,
            current: None,
            orphaned_bytes: 0,
        }
    }

    pub fn is_frame_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn orphaned_bytes(&self) -> u64 {
        self.orphaned_bytes
    }

    /// Feeds one sector and returns every frame it completed.
    pub fn push_sector(&mut self, lsn: u32, sector: &[u8]) -> DemuxResult<Vec<AudioFrame>> {
        let header = AudioSector::parse(sector)?;
        let mut frame_infos = header.frames.iter();
        let mut completed = Vec::new();

        for (packet, payload) in header.packet_payloads(sector) {
            if packet.length as usize > MAX_PACKET_SIZE {
                return Err(DemuxError::MalformedSector(format!(
                    "packet of {} bytes in sector {}",
                    packet.length, lsn
                )));
            }
            if packet.data_type != DataType::Audio {
                trace!("Skipping {:?} packet in sector {}", packet.data_type, lsn);
                continue;
            }

            if packet.frame_start {
                let info = frame_infos.next().ok_or_else(|| {
                    DemuxError::MalformedSector(format!(
                        "frame start in sector {lsn} without frame info"
                    ))
                })?;
                if let Some(done) = self.current.take() {
                    completed.push(done);
                }
                self.current = Some(AudioFrame {
                    data: Vec::with_capacity(MAX_FRAME_SIZE / 4),
                    channel_count: info.channel_count.unwrap_or(self.area_channels),
                    dst_encoded: header.dst_encoded,
                    time_code: info.time_code,
                    start_lsn: lsn,
                });
            }

            match self.current.as_mut() {
                Some(frame) => {
                    if frame.data.len() + payload.len() > MAX_FRAME_SIZE {
                        return Err(DemuxError::FrameOverflow {
                            lsn: frame.start_lsn,
                        });
                    }
                    frame.data.extend_from_slice(payload);
                }
                None => self.orphaned_bytes += payload.len() as u64,
            }
        }

        Ok(completed)
    }

    /// Emits the frame still open at the end of input.
    pub fn finish(&mut self) -> Option<AudioFrame> {
        self.current.take()
    }

    /// Drops any open frame, used when the next sector is not contiguous.
    pub fn reset(&mut self) {
        if let Some(frame) = self.current.take() {
            debug!(
                "Discarding open frame {} ({} bytes)",
                frame.time_code,
                frame.data.len()
            );
        }
    }
}
