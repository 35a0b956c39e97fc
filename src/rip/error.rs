use crate::output::error::OutputError;
use crate::scarletbook::demux::error::DemuxError;
use crate::scarletbook::error::TocError;
use crate::scarletbook::models::area_toc::AreaKind;
use crate::scarletbook::reader::error::ReaderError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RipError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    TocError(#[from] TocError),

    #[error(transparent)]
    ReaderError(#[from] ReaderError),

    #[error(transparent)]
    DemuxError(#[from] DemuxError),

    #[error(transparent)]
    OutputError(#[from] OutputError),

    #[error(transparent)]
    TemplateError(#[from] indicatif::style::TemplateError),

    #[error("Disc has no {0} area")]
    NoSuchArea(AreaKind),

    #[error("Track {number} does not exist, the area has {track_count} track(s)")]
    NoSuchTrack { number: usize, track_count: usize },

    #[error("The {0} area is DST compressed, only plain DSD areas can be extracted")]
    UnsupportedFrameFormat(AreaKind),

    #[error("{} already exists, use --force to overwrite", .0.display())]
    OutputExists(PathBuf),
}

pub type RipResult<T> = Result<T, RipError>;
