use crate::scarletbook::constants::SACD_LSN_SIZE;
use crate::scarletbook::demux::error::{DemuxError, DemuxResult};
use crate::scarletbook::models::common::TimeCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Audio,
    Supplementary,
    Padding,
    Other(u8),
}

impl From<u8> for DataType {
    fn from(value: u8) -> Self {
        match value {
            2 => DataType::Audio,
            3 => DataType::Supplementary,
            7 => DataType::Padding,
            other => DataType::Other(other),
        }
    }
}

impl DataType {
    fn to_bits(self) -> u8 {
        match self {
            DataType::Audio => 2,
            DataType::Supplementary => 3,
            DataType::Padding => 7,
            DataType::Other(v) => v & 0x07,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketInfo {
    pub frame_start: bool,
    pub data_type: DataType,
    pub length: u16,
}

impl PacketInfo {
    pub const SIZE: usize = 2;

    /// Bit 15 frame start, bits 11-13 data type, bits 0-10 length.
    pub fn decode(raw: [u8; 2]) -> Self {
        Self {
            frame_start: raw[0] & 0x80 != 0,
            data_type: DataType::from((raw[0] >> 3) & 0x07),
            length: (((raw[0] & 0x07) as u16) << 8) | raw[1] as u16,
        }
    }

    pub fn encode(&self) -> [u8; 2] {
        let mut b0 = (self.data_type.to_bits() << 3) | ((self.length >> 8) as u8 & 0x07);
        if self.frame_start {
            b0 |= 0x80;
        }
        [b0, self.length as u8]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub time_code: TimeCode,
    /// Only DST sectors carry a channel byte.
    pub channel_count: Option<u8>,
    pub sector_count: Option<u8>,
}

impl FrameInfo {
    /// Channel bits of a DST frame info byte: bit 1 set alone means six
    /// channels, bit 0 set alone means five, anything else is stereo.
    pub fn channels_from_byte(byte: u8) -> u8 {
        match (byte & 0x02 != 0, byte & 0x01 != 0) {
            (true, false) => 6,
            (false, true) => 5,
            _ => 2,
        }
    }
}

/// Header view of one audio sector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSector {
    pub dst_encoded: bool,
    pub packets: Vec<PacketInfo>,
    pub frames: Vec<FrameInfo>,
    /// Offset of the first packet payload within the sector.
    pub payload_offset: usize,
}

impl AudioSector {
    /// Byte 0: bits 5-7 packet info count, bits 2-4 frame info count, bit 0 DST.
    pub fn parse(sector: &[u8]) -> DemuxResult<Self> {
        if sector.len() != SACD_LSN_SIZE {
            return Err(DemuxError::MalformedSector(format!(
                "sector is {} bytes",
                sector.len()
            )));
        }

        let header = sector[0];
        let packet_count = (header >> 5) as usize;
        let frame_count = ((header >> 2) & 0x07) as usize;
        let dst_encoded = header & 0x01 != 0;

        let mut pos = 1;
        let mut packets = Vec::with_capacity(packet_count);
        for _ in 0..packet_count {
            packets.push(PacketInfo::decode([sector[pos], sector[pos + 1]]));
            pos += PacketInfo::SIZE;
        }

        let mut frames = Vec::with_capacity(frame_count);
        for _ in 0..frame_count {
            let time_code = TimeCode::new(sector[pos], sector[pos + 1], sector[pos + 2]);
            pos += 3;
            let (channel_count, sector_count) = if dst_encoded {
                let byte = sector[pos];
                pos += 1;
                (
                    Some(FrameInfo::channels_from_byte(byte)),
                    Some((byte >> 2) & 0x1f),
                )
            } else {
                (None, None)
            };
            frames.push(FrameInfo {
                time_code,
                channel_count,
                sector_count,
            });
        }

        let payload: usize = packets.iter().map(|p| p.length as usize).sum();
        if pos + payload > SACD_LSN_SIZE {
            return Err(DemuxError::MalformedSector(format!(
                "packets need {} bytes but only {} remain",
                payload,
                SACD_LSN_SIZE - pos
            )));
        }

        Ok(Self {
            dst_encoded,
            packets,
            frames,
            payload_offset: pos,
        })
    }

    /// Payload slices of every packet, in order.
    pub fn packet_payloads<'a>(
        &'a self,
        sector: &'a [u8],
    ) -> impl Iterator<Item = (&'a PacketInfo, &'a [u8])> + 'a {
        let mut offset = self.payload_offset;
        self.packets.iter().map(move |packet| {
            let start = offset;
            offset += packet.length as usize;
            (packet, &sector[start..offset])
        })
    }
}
