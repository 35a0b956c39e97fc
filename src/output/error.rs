use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    #[error("Short write: {written} of {requested} bytes reached the output")]
    ShortWrite { requested: usize, written: usize },

    #[error(transparent)]
    TagError(#[from] lofty::error::LoftyError),

    #[error("Unsupported channel count {0}")]
    UnsupportedChannelCount(u8),

    #[error("{0} cannot write several tracks into one file")]
    ConcatenationUnsupported(&'static str),
}

impl OutputError {
    /// Failures of the output file itself, as opposed to bad input.
    pub fn is_write_failure(&self) -> bool {
        matches!(
            self,
            OutputError::IoError(_) | OutputError::ShortWrite { .. }
        )
    }
}

pub type OutputResult<T> = Result<T, OutputError>;
