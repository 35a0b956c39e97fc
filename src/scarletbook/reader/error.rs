use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Sector {lsn} is outside of the image ({sector_count} sectors)")]
    OutOfRange { lsn: u32, sector_count: u32 },

    #[error("Image size {0} is not a multiple of the sector size")]
    UnalignedImage(u64),
}

pub type ReaderResult<T> = Result<T, ReaderError>;
