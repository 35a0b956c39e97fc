use crate::dsf::bitrev::reverse;
use crate::dsf::models::DSF_BLOCK_SIZE_PER_CHANNEL;

/// Fixed size block of one channel.
///
/// `len == 0` is empty, `len == DSF_BLOCK_SIZE_PER_CHANNEL` is full and the
/// block must be taken before another byte goes in.
#[derive(Debug, Clone)]
pub struct ChannelBlock {
    buffer: Box<[u8; DSF_BLOCK_SIZE_PER_CHANNEL]>,
    len: usize,
}

impl Default for ChannelBlock {
    fn default() -> Self {
        Self {
            buffer: Box::new([0u8; DSF_BLOCK_SIZE_PER_CHANNEL]),
            len: 0,
        }
    }
}

impl ChannelBlock {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == DSF_BLOCK_SIZE_PER_CHANNEL
    }

    /// Valid bytes only.
    pub fn filled(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    /// The whole block, zero padded past `len`.
    pub fn block(&self) -> &[u8] {
        &self.buffer[..]
    }

    fn push(&mut self, byte: u8) {
        debug_assert!(!self.is_full());
        self.buffer[self.len] = byte;
        self.len += 1;
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0);
        self.len = 0;
    }

    /// Replaces the content with already transformed bytes.
    pub fn load(&mut self, bytes: &[u8]) {
        let n = bytes.len().min(DSF_BLOCK_SIZE_PER_CHANNEL);
        self.clear();
        self.buffer[..n].copy_from_slice(&bytes[..n]);
        self.len = n;
    }
}

/// Per channel blocks fed round robin, one byte per channel per turn.
///
/// The channel cursor survives between frames, so a frame whose length is
/// not a multiple of the channel count continues where the last one stopped.
#[derive(Debug, Clone)]
pub struct ChannelBlocks {
    blocks: Vec<ChannelBlock>,
    next_channel: usize,
}

impl ChannelBlocks {
    pub fn new(channel_count: usize) -> Self {
        Self {
            blocks: vec![ChannelBlock::default(); channel_count],
            next_channel: 0,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn next_channel(&self) -> usize {
        self.next_channel
    }

    pub fn get(&self, channel: usize) -> &ChannelBlock {
        &self.blocks[channel]
    }

    pub fn get_mut(&mut self, channel: usize) -> &mut ChannelBlock {
        &mut self.blocks[channel]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelBlock> {
        self.blocks.iter()
    }

    /// Bit reverses and distributes bytes until one block becomes full.
    ///
    /// Returns the number of input bytes consumed and the channel whose
    /// block filled up, if any. The caller must drain that block before
    /// calling again.
    pub fn fill(&mut self, data: &[u8]) -> (usize, Option<usize>) {
        let channels = self.blocks.len();
        for (consumed, &byte) in data.iter().enumerate() {
            let channel = self.next_channel;
            let block = &mut self.blocks[channel];
            block.push(reverse(byte));
            self.next_channel = (channel + 1) % channels;
            if block.is_full() {
                return (consumed + 1, Some(channel));
            }
        }
        (data.len(), None)
    }

    /// Moves the valid bytes of every block out, leaving all blocks empty.
    /// Also returns the channel cursor so a later `load` resumes on it.
    pub fn take_filled(&mut self) -> (Vec<Vec<u8>>, usize) {
        let next_channel = std::mem::take(&mut self.next_channel);
        let channels = self
            .blocks
            .iter_mut()
            .map(|block| {
                let bytes = block.filled().to_vec();
                block.clear();
                bytes
            })
            .collect();
        (channels, next_channel)
    }

    /// Preloads blocks with carried over bytes.
    pub fn load(&mut self, channels: &[Vec<u8>], next_channel: usize) {
        for (block, bytes) in self.blocks.iter_mut().zip(channels) {
            block.load(bytes);
        }
        self.next_channel = next_channel % self.blocks.len().max(1);
    }
}
