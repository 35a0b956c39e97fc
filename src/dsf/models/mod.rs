use crate::output::error::{OutputError, OutputResult};
use crate::scarletbook::constants::SACD_SAMPLING_FREQUENCY;
use binrw::{BinRead, BinWrite};

pub const DSF_BLOCK_SIZE_PER_CHANNEL: usize = 4096;
pub const DSF_VERSION: u32 = 1;
pub const DSF_FORMAT_ID_DSD_RAW: u32 = 0;
pub const DSF_BITS_PER_SAMPLE: u32 = 1;

pub const DSD_CHUNK_SIZE: u64 = 28;
pub const FMT_CHUNK_SIZE: u64 = 52;
pub const DATA_CHUNK_HEADER_SIZE: u64 = 12;
pub const DSF_HEADER_SIZE: u64 = DSD_CHUNK_SIZE + FMT_CHUNK_SIZE + DATA_CHUNK_HEADER_SIZE;

/// Speaker layout code of the `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(repr = u32)]
pub enum ChannelType {
    Mono = 1,
    Stereo = 2,
    ThreeChannels = 3,
    Quad = 4,
    FourChannels = 5,
    FiveChannels = 6,
    FivePointOne = 7,
}

impl ChannelType {
    /// Picks the layout from the area channel count and its extra settings
    /// bits. Known stereo, 5.0 and 5.1 configurations win, otherwise the
    /// channel count decides.
    pub fn for_area(channel_count: u8, extra_settings: u8) -> OutputResult<Self> {
        Ok(match (channel_count, extra_settings) {
            (2, 0) => ChannelType::Stereo,
            (5, 3) => ChannelType::FiveChannels,
            (6, 4) => ChannelType::FivePointOne,
            (1, _) => ChannelType::Mono,
            (2, _) => ChannelType::Stereo,
            (3, _) => ChannelType::ThreeChannels,
            (4, _) => ChannelType::Quad,
            (5, _) => ChannelType::FiveChannels,
            (6, _) => ChannelType::FivePointOne,
            (other, _) => return Err(OutputError::UnsupportedChannelCount(other)),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little, magic = b"DSD ")]
pub struct DsdChunk {
    pub chunk_size: u64,
    /// Header, audio and metadata together.
    pub total_file_size: u64,
    /// Offset of the ID3 tag, 0 when there is none.
    pub metadata_offset: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little, magic = b"fmt ")]
pub struct FmtChunk {
    pub chunk_size: u64,
    pub format_version: u32,
    pub format_id: u32,
    pub channel_type: ChannelType,
    pub channel_count: u32,
    pub sampling_frequency: u32,
    pub bits_per_sample: u32,
    /// Samples per channel.
    pub sample_count: u64,
    pub block_size_per_channel: u32,
    pub reserved: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little, magic = b"data")]
pub struct DataChunk {
    /// Includes the 12 byte chunk header.
    pub chunk_size: u64,
}

/// The three chunks in front of the sample data.
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct DsfHeader {
    pub dsd: DsdChunk,
    pub fmt: FmtChunk,
    pub data: DataChunk,
}

impl DsfHeader {
    pub fn new(channel_type: ChannelType, channel_count: u8) -> Self {
        Self {
            dsd: DsdChunk {
                chunk_size: DSD_CHUNK_SIZE,
                total_file_size: DSF_HEADER_SIZE,
                metadata_offset: 0,
            },
            fmt: FmtChunk {
                chunk_size: FMT_CHUNK_SIZE,
                format_version: DSF_VERSION,
                format_id: DSF_FORMAT_ID_DSD_RAW,
                channel_type,
                channel_count: channel_count as u32,
                sampling_frequency: SACD_SAMPLING_FREQUENCY,
                bits_per_sample: DSF_BITS_PER_SAMPLE,
                sample_count: 0,
                block_size_per_channel: DSF_BLOCK_SIZE_PER_CHANNEL as u32,
                reserved: 0,
            },
            data: DataChunk {
                chunk_size: DATA_CHUNK_HEADER_SIZE,
            },
        }
    }

    /// Fills in the totals known once the track is complete.
    ///
    /// `valid_bytes` counts audio bytes across all channels without the zero
    /// padding of the last blocks.
    pub fn finalize(&mut self, audio_data_size: u64, valid_bytes: u64, footer_size: u64) {
        let channels = self.fmt.channel_count.max(1) as u64;
        self.fmt.sample_count = valid_bytes / channels * 8;
        self.data.chunk_size = DATA_CHUNK_HEADER_SIZE + audio_data_size;
        self.dsd.total_file_size = DSF_HEADER_SIZE + audio_data_size + footer_size;
        self.dsd.metadata_offset = if footer_size > 0 {
            DSF_HEADER_SIZE + audio_data_size
        } else {
            0
        };
    }
}
