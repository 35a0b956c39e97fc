use crate::dsf::channel::ChannelBlocks;
use crate::scarletbook::models::area_toc::AreaKind;
use log::debug;

/// Partial blocks left over by the last closed track of a gapless run.
///
/// Owned by one ripping session. The leftovers are only handed to the track
/// that directly follows the one that produced them, in the same area.
#[derive(Debug, Default)]
pub struct CarryoverCache {
    channels: Vec<Vec<u8>>,
    next_channel: usize,
    source: Option<(AreaKind, usize)>,
}

impl CarryoverCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Area and track index the leftovers belong to.
    pub fn source(&self) -> Option<(AreaKind, usize)> {
        self.source
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_none()
    }

    /// Bytes held for `channel`.
    pub fn len(&self, channel: usize) -> usize {
        self.channels.get(channel).map_or(0, |c| c.len())
    }

    /// Moves the unwritten bytes of `blocks` into the cache, tagged with the
    /// track that produced them. Nothing is kept if every block is empty.
    pub fn store(&mut self, area: AreaKind, track_index: usize, blocks: &mut ChannelBlocks) {
        let (channels, next_channel) = blocks.take_filled();
        if channels.iter().all(|c| c.is_empty()) {
            self.invalidate();
            return;
        }
        debug!(
            "Carrying {} byte(s) per channel from track {} over",
            channels.first().map_or(0, |c| c.len()),
            track_index + 1
        );
        self.channels = channels;
        self.next_channel = next_channel;
        self.source = Some((area, track_index));
    }

    /// Loads the leftovers into `blocks` if they come from the track right
    /// before `track_index`. Anything else is discarded. The cache is empty
    /// afterwards either way. Returns the bytes per channel applied.
    pub fn apply(
        &mut self,
        area: AreaKind,
        track_index: usize,
        blocks: &mut ChannelBlocks,
    ) -> usize {
        let applied = match self.source {
            Some((prev_area, prev_track))
                if prev_area == area && track_index > 0 && prev_track + 1 == track_index =>
            {
                blocks.load(&self.channels, self.next_channel);
                self.channels.first().map_or(0, |c| c.len())
            }
            Some((_, prev_track)) => {
                debug!(
                    "Dropping leftovers of track {}, next track is {}",
                    prev_track + 1,
                    track_index + 1
                );
                0
            }
            None => 0,
        };
        self.invalidate();
        applied
    }

    pub fn invalidate(&mut self) {
        self.channels.clear();
        self.next_channel = 0;
        self.source = None;
    }
}
