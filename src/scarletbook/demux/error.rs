use crate::scarletbook::constants::MAX_FRAME_SIZE;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DemuxError {
    #[error("Audio frame at sector {lsn} grew beyond {MAX_FRAME_SIZE} bytes")]
    FrameOverflow { lsn: u32 },

    #[error("Malformed audio sector: {0}")]
    MalformedSector(String),
}

pub type DemuxResult<T> = Result<T, DemuxError>;
