pub mod error;

use crate::scarletbook::constants::SACD_LSN_SIZE;
use crate::scarletbook::reader::error::{ReaderError, ReaderResult};
use log::warn;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, BufReader};

/// Anything that hands out 2048 byte sectors by logical sector number.
#[allow(async_fn_in_trait)]
pub trait SectorSource {
    fn sector_count(&self) -> u32;

    /// Positions the source so the next `read_next` returns sector `lsn`.
    async fn seek(&mut self, lsn: u32) -> ReaderResult<()>;

    async fn read_next(&mut self) -> ReaderResult<Vec<u8>>;

    async fn read_sector(&mut self, lsn: u32) -> ReaderResult<Vec<u8>> {
        self.seek(lsn).await?;
        self.read_next().await
    }

    /// Reads `count` consecutive sectors into one buffer.
    async fn read_sectors(&mut self, lsn: u32, count: u32) -> ReaderResult<Vec<u8>> {
        self.seek(lsn).await?;
        let mut buffer = Vec::with_capacity(count as usize * SACD_LSN_SIZE);
        for _ in 0..count {
            buffer.extend_from_slice(&self.read_next().await?);
        }
        Ok(buffer)
    }
}

// ISO image reader, plain 2048 byte user data sectors
#[derive(Debug)]
pub struct IsoReader {
    reader: BufReader<File>,
    sector_count: u32,
    position: u32,
}

impl IsoReader {
    pub async fn open(path: impl AsRef<Path>) -> ReaderResult<Self> {
        let file = File::open(path).await?;
        let size = file.metadata().await?.len();
        if size % SACD_LSN_SIZE as u64 != 0 {
            warn!(
                "Image size {} is not sector aligned, ignoring the trailing {} bytes",
                size,
                size % SACD_LSN_SIZE as u64
            );
        }
        let sector_count = u32::try_from(size / SACD_LSN_SIZE as u64)
            .map_err(|_| ReaderError::UnalignedImage(size))?;

        Ok(Self {
            reader: BufReader::with_capacity(4 * 1024 * 1024, file), // 4 MB buffer
            sector_count,
            position: 0,
        })
    }
}

impl SectorSource for IsoReader {
    fn sector_count(&self) -> u32 {
        self.sector_count
    }

    async fn seek(&mut self, lsn: u32) -> ReaderResult<()> {
        if lsn > self.sector_count {
            return Err(ReaderError::OutOfRange {
                lsn,
                sector_count: self.sector_count,
            });
        }
        if lsn != self.position {
            let offset = lsn as u64 * SACD_LSN_SIZE as u64;
            self.reader.seek(std::io::SeekFrom::Start(offset)).await?;
            self.position = lsn;
        }
        Ok(())
    }

    async fn read_next(&mut self) -> ReaderResult<Vec<u8>> {
        if self.position >= self.sector_count {
            return Err(ReaderError::OutOfRange {
                lsn: self.position,
                sector_count: self.sector_count,
            });
        }
        let mut buffer = vec![0u8; SACD_LSN_SIZE];
        self.reader.read_exact(&mut buffer).await?;
        self.position += 1;
        Ok(buffer)
    }
}
