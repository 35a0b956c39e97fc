pub mod error;

use crate::dsf::carryover::CarryoverCache;
use crate::id3::TagMode;
use crate::output::error::{OutputError, OutputResult};
use crate::scarletbook::{Area, ScarletBook, Track};
use std::fmt::{Display, Formatter};
use std::ops::BitOr;
use tokio::io::{AsyncSeek, AsyncWrite, AsyncWriteExt};

/// Capabilities advertised by an output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputFlags(u8);

impl OutputFlags {
    /// Consumes raw DSD frames.
    pub const DSD: OutputFlags = OutputFlags(0x01);
    /// Can write a whole area into a single file.
    pub const CONCATENATE: OutputFlags = OutputFlags(0x02);

    pub fn contains(&self, other: OutputFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for OutputFlags {
    type Output = OutputFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        OutputFlags(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputOptions {
    /// Carry partial blocks into the next track instead of zero padding.
    pub nopad: bool,
    pub concatenate: bool,
    pub tag_mode: TagMode,
}

/// Everything a format needs to know about the track being written.
#[derive(Debug, Clone, Copy)]
pub struct TrackContext<'a> {
    pub book: &'a ScarletBook,
    pub area: &'a Area,
    pub track_index: usize,
    /// No directly following track is written after this one, so a gapless
    /// run must pad here.
    pub is_last: bool,
}

impl<'a> TrackContext<'a> {
    pub fn track(&self) -> Option<Track<'a>> {
        self.area.track(self.track_index)
    }
}

/// Sizes of a finished output file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackSummary {
    pub track_index: usize,
    pub header_size: u64,
    pub audio_data_size: u64,
    pub footer_size: u64,
    /// Samples per channel.
    pub sample_count: u64,
    /// Bytes per channel handed to the carryover cache instead of written.
    pub carried_over: usize,
}

impl TrackSummary {
    pub fn file_size(&self) -> u64 {
        self.header_size + self.audio_data_size + self.footer_size
    }
}

impl Display for TrackSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "track {}: {} bytes audio, {} samples/channel, {} bytes tag",
            self.track_index + 1,
            self.audio_data_size,
            self.sample_count,
            self.footer_size
        )
    }
}

/// Container lifecycle shared by every output format: `create` reserves the
/// header, `write` streams frames, `close` finalizes and hands back the
/// writer.
#[allow(async_fn_in_trait)]
pub trait OutputFormat {
    type Session<W: AsyncWrite + AsyncSeek + Unpin>;

    fn name(&self) -> &'static str;
    fn extension(&self) -> &'static str;
    fn flags(&self) -> OutputFlags;
    /// Bytes of per-track state a session holds.
    fn state_size(&self) -> usize;

    async fn create<W: AsyncWrite + AsyncSeek + Unpin>(
        &self,
        writer: W,
        ctx: &TrackContext<'_>,
        carryover: &mut CarryoverCache,
    ) -> OutputResult<Self::Session<W>>;

    /// Returns the number of payload bytes committed to the output.
    async fn write<W: AsyncWrite + AsyncSeek + Unpin>(
        &self,
        session: &mut Self::Session<W>,
        frame: &[u8],
    ) -> OutputResult<u64>;

    async fn close<W: AsyncWrite + AsyncSeek + Unpin>(
        &self,
        session: Self::Session<W>,
        carryover: &mut CarryoverCache,
    ) -> OutputResult<(W, TrackSummary)>;
}

/// Writes all of `buf`, reporting a short write instead of retrying forever.
pub async fn write_exact<W: AsyncWrite + Unpin>(writer: &mut W, buf: &[u8]) -> OutputResult<()> {
    let mut written = 0;
    while written < buf.len() {
        let n = writer.write(&buf[written..]).await?;
        if n == 0 {
            return Err(OutputError::ShortWrite {
                requested: buf.len(),
                written,
            });
        }
        written += n;
    }
    Ok(())
}
