use crate::id3::TagMode;
use crate::scarletbook::constants::MAX_TRACK_COUNT;
use crate::scarletbook::models::area_toc::AreaKind;
use clap::Parser;
use std::path::PathBuf;

/// Prints the disc, area and track information of an SACD image.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct InfoCommand {
    /// Input SACD ISO image
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
}

/// Extracts the tracks of one area into DSF files.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct ExtractCommand {
    /// Input SACD ISO image
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output directory, created if it does not exist
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Area to extract
    #[arg(long, short = 'a', value_enum, default_value_t = AreaKind::Stereo)]
    pub area: AreaKind,

    /// Tracks to extract, e.g. "1,3-5". Every track when omitted
    #[arg(long, short = 't', value_name = "TRACKS", value_parser = parse_track_list)]
    pub tracks: Option<TrackList>,

    /// Carry partial blocks into the next track instead of padding with silence
    #[arg(long, default_value_t = false)]
    pub no_pad: bool,

    /// Write the whole area into a single file
    #[arg(long, short = 'c', default_value_t = false)]
    pub concatenate: bool,

    /// Keep the pauses between tracks
    #[arg(long, default_value_t = false)]
    pub keep_pauses: bool,

    /// ID3 tag appended to every file
    #[arg(long, value_enum, default_value = "v23")]
    pub id3: TagMode,

    /// Force overwrite of output files that already exist
    #[arg(long, short = 'f', default_value_t = false)]
    pub force: bool,
}

/// One based track numbers as typed on the command line.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TrackList(pub Vec<usize>);

impl TrackList {
    /// Zero based indices.
    pub fn indices(&self) -> Vec<usize> {
        self.0.iter().map(|n| n - 1).collect()
    }
}

/// Parses `1,3-5` into `[1, 3, 4, 5]`.
pub fn parse_track_list(value: &str) -> Result<TrackList, String> {
    let parse_number = |s: &str| -> Result<usize, String> {
        let n: usize = s
            .trim()
            .parse()
            .map_err(|_| format!("\"{}\" is not a track number", s.trim()))?;
        if n == 0 {
            return Err("track numbers start at 1".to_string());
        }
        if n > MAX_TRACK_COUNT {
            return Err(format!("track {n} is past the limit of {MAX_TRACK_COUNT}"));
        }
        Ok(n)
    };

    let mut tracks = Vec::new();
    for part in value.split(',').filter(|p| !p.trim().is_empty()) {
        match part.split_once('-') {
            Some((from, to)) => {
                let (from, to) = (parse_number(from)?, parse_number(to)?);
                if from > to {
                    return Err(format!("range {from}-{to} is reversed"));
                }
                tracks.extend(from..=to);
            }
            None => tracks.push(parse_number(part)?),
        }
    }

    if tracks.is_empty() {
        return Err("no tracks given".to_string());
    }
    tracks.sort_unstable();
    tracks.dedup();
    Ok(TrackList(tracks))
}
