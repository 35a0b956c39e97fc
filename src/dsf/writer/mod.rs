use crate::dsf::carryover::CarryoverCache;
use crate::dsf::channel::ChannelBlocks;
use crate::dsf::models::{ChannelType, DSF_BLOCK_SIZE_PER_CHANNEL, DSF_HEADER_SIZE, DsfHeader};
use crate::id3::{Id3Renderer, TagMode, TagRenderer};
use crate::output::error::OutputResult;
use crate::output::{
    OutputFlags, OutputFormat, OutputOptions, TrackContext, TrackSummary, write_exact,
};
use crate::scarletbook::constants::MAX_CHANNEL_COUNT;
use crate::scarletbook::models::area_toc::AreaKind;
use binrw::BinWrite;
use log::debug;
use std::io::{Cursor, SeekFrom};
use std::sync::Arc;
use tokio::io::{AsyncSeek, AsyncSeekExt, AsyncWrite, AsyncWriteExt};

/// Sony DSD stream file writer.
pub struct DsfFormat {
    renderer: Arc<dyn TagRenderer + Send + Sync>,
    options: OutputOptions,
}

impl DsfFormat {
    pub fn new(options: OutputOptions) -> Self {
        Self::with_renderer(options, Arc::new(Id3Renderer))
    }

    pub fn with_renderer(
        options: OutputOptions,
        renderer: Arc<dyn TagRenderer + Send + Sync>,
    ) -> Self {
        Self { renderer, options }
    }

    pub fn options(&self) -> OutputOptions {
        self.options
    }

    /// Partial blocks stay in the cache for the next track instead of
    /// being padded.
    fn keeps_leftovers(&self, is_last: bool) -> bool {
        self.options.nopad && !is_last && !self.options.concatenate
    }

    /// Renders the footer and writes the placeholder header.
    async fn begin<W: AsyncWrite + AsyncSeek + Unpin>(
        &self,
        writer: &mut W,
        ctx: &TrackContext<'_>,
    ) -> OutputResult<(DsfHeader, Vec<u8>)> {
        let channel_count = ctx.area.channel_count();
        let channel_type = ChannelType::for_area(channel_count, ctx.area.toc.extra_settings())?;
        let header = DsfHeader::new(channel_type, channel_count);

        let footer = match self.options.tag_mode {
            TagMode::None => Vec::new(),
            mode => self.renderer.render(ctx, mode)?,
        };

        let mut header_data = Cursor::new(Vec::new());
        header.write(&mut header_data)?;
        write_exact(writer, &header_data.into_inner()).await?;
        Ok((header, footer))
    }

    /// Pads and flushes the partial blocks unless `keep_leftovers`, then
    /// appends the footer and rewrites the header with the final sizes.
    async fn finish<W: AsyncWrite + AsyncSeek + Unpin>(
        &self,
        session: &mut DsfSession<W>,
        keep_leftovers: bool,
    ) -> OutputResult<u64> {
        if !keep_leftovers {
            for channel in 0..session.blocks.channel_count() {
                let block = session.blocks.get(channel);
                if block.is_empty() {
                    continue;
                }
                let valid = block.len() as u64;
                write_exact(&mut session.writer, block.block()).await?;
                session.audio_data_size += DSF_BLOCK_SIZE_PER_CHANNEL as u64;
                session.valid_bytes += valid;
                session.blocks.get_mut(channel).clear();
            }
        }

        write_exact(&mut session.writer, &session.footer).await?;

        let footer_size = session.footer.len() as u64;
        session
            .header
            .finalize(session.audio_data_size, session.valid_bytes, footer_size);

        session.writer.seek(SeekFrom::Start(0)).await?;
        let mut header_data = Cursor::new(Vec::new());
        session.header.write(&mut header_data)?;
        write_exact(&mut session.writer, &header_data.into_inner()).await?;
        session.writer.flush().await?;
        Ok(footer_size)
    }
}

pub struct DsfSession<W> {
    writer: W,
    header: DsfHeader,
    footer: Vec<u8>,
    blocks: ChannelBlocks,
    audio_data_size: u64,
    valid_bytes: u64,
    area: AreaKind,
    track_index: usize,
    is_last: bool,
    /// A write failed, the blocks no longer match the file.
    torn: bool,
}

impl<W> DsfSession<W> {
    pub fn audio_data_size(&self) -> u64 {
        self.audio_data_size
    }

    pub fn blocks(&self) -> &ChannelBlocks {
        &self.blocks
    }
}

impl OutputFormat for DsfFormat {
    type Session<W: AsyncWrite + AsyncSeek + Unpin> = DsfSession<W>;

    fn name(&self) -> &'static str {
        "Sony DSD stream file"
    }

    fn extension(&self) -> &'static str {
        "dsf"
    }

    fn flags(&self) -> OutputFlags {
        OutputFlags::DSD | OutputFlags::CONCATENATE
    }

    fn state_size(&self) -> usize {
        MAX_CHANNEL_COUNT * DSF_BLOCK_SIZE_PER_CHANNEL + DSF_HEADER_SIZE as usize
    }

    async fn create<W: AsyncWrite + AsyncSeek + Unpin>(
        &self,
        mut writer: W,
        ctx: &TrackContext<'_>,
        carryover: &mut CarryoverCache,
    ) -> OutputResult<DsfSession<W>> {
        let (header, footer) = match self.begin(&mut writer, ctx).await {
            Ok(started) => started,
            Err(e) => {
                carryover.invalidate();
                return Err(e);
            }
        };

        let channel_count = ctx.area.channel_count();
        let mut blocks = ChannelBlocks::new(channel_count as usize);
        if self.options.nopad {
            let applied = carryover.apply(ctx.area.kind(), ctx.track_index, &mut blocks);
            if applied > 0 {
                debug!(
                    "Track {} starts with {} carried byte(s) per channel",
                    ctx.track_index + 1,
                    applied
                );
            }
        } else {
            carryover.invalidate();
        }

        Ok(DsfSession {
            writer,
            header,
            footer,
            blocks,
            audio_data_size: 0,
            valid_bytes: 0,
            area: ctx.area.kind(),
            track_index: ctx.track_index,
            is_last: ctx.is_last,
            torn: false,
        })
    }

    async fn write<W: AsyncWrite + AsyncSeek + Unpin>(
        &self,
        session: &mut DsfSession<W>,
        frame: &[u8],
    ) -> OutputResult<u64> {
        let mut committed = 0u64;
        let mut rest = frame;
        while !rest.is_empty() {
            let (consumed, full) = session.blocks.fill(rest);
            rest = &rest[consumed..];
            if let Some(channel) = full {
                let block = session.blocks.get(channel).block();
                if let Err(e) = write_exact(&mut session.writer, block).await {
                    session.torn = true;
                    return Err(e);
                }
                session.blocks.get_mut(channel).clear();
                committed += DSF_BLOCK_SIZE_PER_CHANNEL as u64;
            }
        }
        session.audio_data_size += committed;
        session.valid_bytes += committed;
        Ok(committed)
    }

    async fn close<W: AsyncWrite + AsyncSeek + Unpin>(
        &self,
        mut session: DsfSession<W>,
        carryover: &mut CarryoverCache,
    ) -> OutputResult<(W, TrackSummary)> {
        let keep_leftovers = self.keeps_leftovers(session.is_last) && !session.torn;
        let footer_size = match self.finish(&mut session, keep_leftovers).await {
            Ok(size) => size,
            Err(e) => {
                carryover.invalidate();
                return Err(e);
            }
        };

        let mut carried_over = 0;
        if keep_leftovers {
            carried_over = session.blocks.iter().map(|b| b.len()).max().unwrap_or(0);
            carryover.store(session.area, session.track_index, &mut session.blocks);
        } else {
            carryover.invalidate();
        }

        let summary = TrackSummary {
            track_index: session.track_index,
            header_size: DSF_HEADER_SIZE,
            audio_data_size: session.audio_data_size,
            footer_size,
            sample_count: session.header.fmt.sample_count,
            carried_over,
        };
        debug!("Closed {}", summary);

        Ok((session.writer, summary))
    }
}
