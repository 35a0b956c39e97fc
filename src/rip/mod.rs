pub mod error;
pub mod image;
pub mod naming;

use crate::dsf::carryover::CarryoverCache;
use crate::output::error::OutputError;
use crate::output::{OutputFlags, OutputFormat, TrackContext, TrackSummary};
use crate::rip::error::{RipError, RipResult};
use crate::scarletbook::demux::{AudioFrame, FrameDemuxer};
use crate::scarletbook::models::area_toc::AreaKind;
use crate::scarletbook::reader::SectorSource;
use crate::scarletbook::{Area, ScarletBook, Track};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, info, trace, warn};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::BufWriter;

const WRITE_BUFFER_SIZE: usize = 1024 * 1024; // 1 MB buffer

type FileWriter = BufWriter<File>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RipOptions {
    pub area: AreaKind,
    /// Zero based track indices, every track when empty.
    pub tracks: Vec<usize>,
    /// Drop frames outside each track's timecode window.
    pub trim_pauses: bool,
    pub concatenate: bool,
    pub force: bool,
    pub output_dir: PathBuf,
}

impl RipOptions {
    pub fn new(area: AreaKind, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            area,
            tracks: Vec::new(),
            trim_pauses: true,
            concatenate: false,
            force: false,
            output_dir: output_dir.into(),
        }
    }
}

#[derive(Debug)]
pub enum TrackStatus {
    Written(TrackSummary),
    Failed(OutputError),
}

#[derive(Debug)]
pub struct TrackReport {
    pub track_index: usize,
    pub path: PathBuf,
    pub status: TrackStatus,
}

/// Outcome of one area extraction.
#[derive(Debug)]
pub struct RipReport {
    pub area: AreaKind,
    pub tracks: Vec<TrackReport>,
    /// Frames outside every selected track.
    pub dropped_frames: u64,
}

impl RipReport {
    fn new(area: AreaKind) -> Self {
        Self {
            area,
            tracks: Vec::new(),
            dropped_frames: 0,
        }
    }

    pub fn written(&self) -> impl Iterator<Item = &TrackReport> {
        self.tracks
            .iter()
            .filter(|t| matches!(t.status, TrackStatus::Written(_)))
    }

    pub fn failed(&self) -> impl Iterator<Item = &TrackReport> {
        self.tracks
            .iter()
            .filter(|t| matches!(t.status, TrackStatus::Failed(_)))
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// One ripping run. Owns the carryover cache, so leftovers never leak
/// between independent runs.
pub struct RipSession {
    carryover: CarryoverCache,
    progress: MultiProgress,
}

impl RipSession {
    pub fn new(progress: MultiProgress) -> Self {
        Self {
            carryover: CarryoverCache::new(),
            progress,
        }
    }

    pub fn carryover(&self) -> &CarryoverCache {
        &self.carryover
    }

    /// Rips the selected tracks of one area, in ascending order.
    ///
    /// A failed output file is recorded in the report and the run goes on
    /// with the next track. Damaged sectors, read errors and anything wrong
    /// with the area itself abort the extraction.
    pub async fn extract_area<S: SectorSource, F: OutputFormat>(
        &mut self,
        source: &mut S,
        book: &ScarletBook,
        format: &F,
        options: &RipOptions,
    ) -> RipResult<RipReport> {
        let area = book
            .area(options.area)
            .ok_or(RipError::NoSuchArea(options.area))?;
        if area.toc.frame_format().is_dst() {
            return Err(RipError::UnsupportedFrameFormat(area.kind()));
        }
        if options.concatenate && !format.flags().contains(OutputFlags::CONCATENATE) {
            return Err(OutputError::ConcatenationUnsupported(format.name()).into());
        }

        let selected = select_tracks(area, &options.tracks)?;
        if selected.is_empty() {
            warn!("The {} area has no tracks", area.kind());
            return Ok(RipReport::new(area.kind()));
        }

        let outputs = output_paths(book, area, format.extension(), options, &selected)?;
        if !options.force {
            for (_, path) in &outputs {
                if fs::metadata(path).await.is_ok() {
                    return Err(RipError::OutputExists(path.clone()));
                }
            }
        }
        fs::create_dir_all(&options.output_dir).await?;

        let runs = contiguous_runs(&selected);
        let total_sectors: u64 = runs
            .iter()
            .map(|run| sector_span(area, run).map(|(start, end)| (end - start) as u64))
            .sum::<RipResult<u64>>()?;

        let bar = self.progress.add(ProgressBar::new(total_sectors));
        bar.set_style(
            ProgressStyle::default_bar()
                .template(concat!(
                    "{spinner:.green} [{elapsed_precise}] ",
                    "[{bar:40.cyan/blue}] {pos}/{len} sectors {msg}",
                ))?
                .progress_chars("#>-"),
        );

        info!(
            "Extracting {} track(s) from the {} area ({} channel(s))",
            selected.len(),
            area.kind(),
            area.channel_count()
        );

        // a previous extraction never hands leftovers to this one
        self.carryover.invalidate();

        let mut rip = AreaRip {
            book,
            area,
            format,
            options,
            outputs,
            carryover: &mut self.carryover,
            bar: bar.clone(),
            run: Vec::new(),
            pending: VecDeque::new(),
            current: None,
            report: RipReport::new(area.kind()),
        };
        let outcome = rip.rip_runs(source, &runs).await;
        let report = rip.report;
        bar.finish_and_clear();

        match outcome {
            Ok(()) => Ok(report),
            Err(e) => {
                self.carryover.invalidate();
                Err(e)
            }
        }
    }
}

/// Sorted, deduplicated and validated track selection.
fn select_tracks(area: &Area, requested: &[usize]) -> RipResult<Vec<usize>> {
    let track_count = area.track_count();
    if requested.is_empty() {
        return Ok((0..track_count).collect());
    }
    let mut selected = requested.to_vec();
    selected.sort_unstable();
    selected.dedup();
    if let Some(&bad) = selected.iter().find(|&&t| t >= track_count) {
        return Err(RipError::NoSuchTrack {
            number: bad + 1,
            track_count,
        });
    }
    Ok(selected)
}

/// Splits a sorted selection into runs of directly following tracks.
fn contiguous_runs(selected: &[usize]) -> Vec<Vec<usize>> {
    let mut runs: Vec<Vec<usize>> = Vec::new();
    for &track in selected {
        match runs.last_mut() {
            Some(run) if run.last().is_some_and(|&last| last + 1 == track) => run.push(track),
            _ => runs.push(vec![track]),
        }
    }
    runs
}

fn area_track(area: &Area, index: usize) -> RipResult<Track<'_>> {
    area.track(index).ok_or(RipError::NoSuchTrack {
        number: index + 1,
        track_count: area.track_count(),
    })
}

/// First and one past the last sector of a run.
fn sector_span(area: &Area, run: &[usize]) -> RipResult<(u32, u32)> {
    let (Some(&first), Some(&last)) = (run.first(), run.last()) else {
        return Ok((0, 0));
    };
    let start = area_track(area, first)?.offset().start_lsn;
    let end = area_track(area, last)?.offset().end_lsn();
    Ok((start, end.max(start)))
}

fn output_paths(
    book: &ScarletBook,
    area: &Area,
    extension: &str,
    options: &RipOptions,
    selected: &[usize],
) -> RipResult<Vec<(usize, PathBuf)>> {
    if options.concatenate {
        let path = options
            .output_dir
            .join(naming::album_file_name(book, extension));
        return Ok(vec![(selected[0], path)]);
    }
    selected
        .iter()
        .map(|&t| {
            let track = area_track(area, t)?;
            let name = naming::track_file_name(&track, extension);
            Ok((t, options.output_dir.join(name)))
        })
        .collect()
}

struct OpenOutput<S> {
    track_index: usize,
    path: PathBuf,
    /// `None` once the output failed; its frames are dropped.
    session: Option<S>,
}

/// State of one area extraction: the open output file and the tracks of
/// the current run still waiting for audio.
struct AreaRip<'a, F: OutputFormat> {
    book: &'a ScarletBook,
    area: &'a Area,
    format: &'a F,
    options: &'a RipOptions,
    outputs: Vec<(usize, PathBuf)>,
    carryover: &'a mut CarryoverCache,
    bar: ProgressBar,
    run: Vec<usize>,
    pending: VecDeque<usize>,
    current: Option<OpenOutput<F::Session<FileWriter>>>,
    report: RipReport,
}

impl<'a, F: OutputFormat> AreaRip<'a, F> {
    async fn rip_runs<S: SectorSource>(
        &mut self,
        source: &mut S,
        runs: &[Vec<usize>],
    ) -> RipResult<()> {
        if self.options.concatenate {
            let first = self.outputs[0].0;
            self.open(first).await?;
        }

        for run in runs {
            let (start, end) = sector_span(self.area, run)?;
            debug!(
                "Reading sectors {}..{} for track(s) {:?}",
                start,
                end,
                run.iter().map(|t| t + 1).collect::<Vec<_>>()
            );
            self.run = run.clone();
            if !self.options.concatenate {
                self.pending = run.iter().copied().collect();
            }

            let mut demuxer = FrameDemuxer::new(self.area.channel_count());
            source.seek(start).await?;
            for lsn in start..end {
                let sector = source.read_next().await?;
                for frame in demuxer.push_sector(lsn, &sector)? {
                    self.route(frame).await?;
                }
                self.bar.inc(1);
            }
            // the run's last frame may end in a sector of the next track
            let area_end = self.area.toc.track_end.saturating_add(1);
            let mut tail = None;
            let mut lsn = end;
            while tail.is_none() && demuxer.is_frame_open() && lsn < area_end {
                let sector = source.read_next().await?;
                tail = demuxer.push_sector(lsn, &sector)?.into_iter().next();
                lsn += 1;
            }
            if lsn > end {
                trace!("Read {} sector(s) past the run to end its last frame", lsn - end);
            }
            if let Some(frame) = tail.or_else(|| demuxer.finish()) {
                self.route(frame).await?;
            }
            if demuxer.orphaned_bytes() > 0 {
                debug!(
                    "Skipped {} byte(s) of a frame started before sector {}",
                    demuxer.orphaned_bytes(),
                    start
                );
            }

            if !self.options.concatenate {
                self.close_current().await?;
                while let Some(track) = self.pending.pop_front() {
                    warn!("Track {} has no audio frames", track + 1);
                    self.open(track).await?;
                    self.close_current().await?;
                }
            }
        }

        if self.options.concatenate {
            self.close_current().await?;
        }
        Ok(())
    }

    /// Track of the current run a frame belongs to.
    fn target(&self, frame: &AudioFrame) -> Option<usize> {
        self.run.iter().copied().find(|&t| {
            self.area.track(t).is_some_and(|track| {
                if self.options.trim_pauses {
                    track.window().contains(frame.frame_count())
                } else {
                    track.contains_sector(frame.start_lsn)
                }
            })
        })
    }

    async fn route(&mut self, frame: AudioFrame) -> RipResult<()> {
        let Some(target) = self.target(&frame) else {
            trace!("Dropping frame {}", frame.time_code);
            self.report.dropped_frames += 1;
            return Ok(());
        };

        if !self.options.concatenate {
            match self.current.as_ref().map(|c| c.track_index) {
                Some(open) if open == target => {}
                Some(open) if open > target => {
                    debug!(
                        "Frame {} belongs to track {} which is already closed",
                        frame.time_code,
                        target + 1
                    );
                    self.report.dropped_frames += 1;
                    return Ok(());
                }
                _ => self.advance_to(target).await?,
            }
        }

        self.write(&frame.data).await
    }

    /// Closes the open track and opens `target`, writing empty files for
    /// skipped tracks in between.
    async fn advance_to(&mut self, target: usize) -> RipResult<()> {
        self.close_current().await?;
        while let Some(&track) = self.pending.front() {
            if track > target {
                break;
            }
            self.pending.pop_front();
            self.open(track).await?;
            if track == target {
                break;
            }
            warn!("Track {} has no audio frames", track + 1);
            self.close_current().await?;
        }
        Ok(())
    }

    fn path_for(&self, track_index: usize) -> PathBuf {
        self.outputs
            .iter()
            .find(|(t, _)| *t == track_index)
            .or(self.outputs.first())
            .map(|(_, path)| path.clone())
            .unwrap_or_default()
    }

    fn context(&self, track_index: usize) -> TrackContext<'a> {
        let next_follows = self.run.contains(&(track_index + 1));
        TrackContext {
            book: self.book,
            area: self.area,
            track_index,
            is_last: self.options.concatenate || !next_follows,
        }
    }

    async fn open(&mut self, track_index: usize) -> RipResult<()> {
        let path = self.path_for(track_index);
        let ctx = self.context(track_index);
        if let Some(name) = path.file_name() {
            self.bar.set_message(name.to_string_lossy().to_string());
        }
        debug!("Creating {}", path.display());

        let session = match File::create(&path).await {
            Ok(file) => {
                let writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
                match self.format.create(writer, &ctx, &mut *self.carryover).await {
                    Ok(session) => Some(session),
                    Err(e) if e.is_write_failure() => {
                        self.fail(track_index, &path, e).await;
                        None
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Err(e) => {
                self.fail(track_index, &path, e.into()).await;
                None
            }
        };

        self.current = Some(OpenOutput {
            track_index,
            path,
            session,
        });
        Ok(())
    }

    async fn write(&mut self, data: &[u8]) -> RipResult<()> {
        let Some(open) = self.current.as_mut() else {
            self.report.dropped_frames += 1;
            return Ok(());
        };
        let Some(session) = open.session.as_mut() else {
            return Ok(());
        };

        match self.format.write(session, data).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_write_failure() => {
                open.session = None;
                let (track_index, path) = (open.track_index, open.path.clone());
                self.fail(track_index, &path, e).await;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn close_current(&mut self) -> RipResult<()> {
        let Some(open) = self.current.take() else {
            return Ok(());
        };
        let Some(session) = open.session else {
            return Ok(());
        };

        match self.format.close(session, &mut *self.carryover).await {
            Ok((_writer, summary)) => {
                info!("Wrote {} ({})", open.path.display(), summary);
                self.report.tracks.push(TrackReport {
                    track_index: open.track_index,
                    path: open.path,
                    status: TrackStatus::Written(summary),
                });
                Ok(())
            }
            Err(e) if e.is_write_failure() => {
                self.fail(open.track_index, &open.path, e).await;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Records a failed output. Leftovers of a torn track must not reach
    /// the next one.
    async fn fail(&mut self, track_index: usize, path: &Path, error: OutputError) {
        warn!(
            "Track {} failed, continuing with the next track: {}",
            track_index + 1,
            error
        );
        self.carryover.invalidate();
        if fs::remove_file(path).await.is_err() {
            debug!("Could not remove {}", path.display());
        }
        self.report.tracks.push(TrackReport {
            track_index,
            path: path.to_path_buf(),
            status: TrackStatus::Failed(error),
        });
    }
}
