use crate::scarletbook::reader::error::ReaderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TocError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    ReaderError(#[from] ReaderError),

    #[error("Invalid disc structure: {0}")]
    Format(String),

    #[error("Unsupported TOC version {major}.{minor:02}")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("No audio area found on the disc")]
    NoAudioArea,
}

impl From<binrw::Error> for TocError {
    fn from(err: binrw::Error) -> Self {
        match err {
            binrw::Error::BadMagic { pos, found } => {
                TocError::Format(format!("bad magic at offset {pos:#x}: {found:?}"))
            }
            binrw::Error::Io(err) => TocError::IoError(err),
            other => TocError::Format(other.to_string()),
        }
    }
}

pub type TocResult<T> = Result<T, TocError>;
