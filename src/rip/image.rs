use crate::commands::sacd::ExtractCommand;
use crate::dsf::writer::DsfFormat;
use crate::output::OutputOptions;
use crate::rip::error::RipResult;
use crate::rip::{RipOptions, RipReport, RipSession, TrackStatus};
use crate::scarletbook::ScarletBook;
use crate::scarletbook::reader::IsoReader;
use indicatif::MultiProgress;
use log::{debug, error, info};
use std::path::Path;

/// Prints what the disc image contains.
pub async fn print_info(input: &Path) -> RipResult<()> {
    debug!("Opening image: {:?}", input);
    let mut source = IsoReader::open(input).await?;
    let book = ScarletBook::open(&mut source).await?;
    let toc = &book.master_toc;

    println!("Album:    {}", book.album_title().unwrap_or("-"));
    println!("Artist:   {}", book.master_text.artist().unwrap_or("-"));
    if let Some(catalog) = toc.album_catalog_number() {
        println!("Catalog:  {catalog}");
    }
    if let Some(date) = toc.disc_date() {
        println!("Date:     {date}");
    }
    if let Some(genre) = book.album_genre() {
        println!("Genre:    {}", genre.genre_name());
    }
    println!(
        "Disc:     {} of {}, version {}.{:02}{}",
        toc.album_sequence_number,
        toc.album_set_size,
        toc.version.major,
        toc.version.minor,
        if toc.is_hybrid() { ", hybrid" } else { "" }
    );

    for area in &book.areas {
        println!();
        println!(
            "{} area: {} channel(s), {:?}, {} track(s), {}",
            area.kind(),
            area.channel_count(),
            area.toc.frame_format(),
            area.track_count(),
            area.total_playtime()
        );
        for track in area.tracks() {
            println!(
                "  {:02}. {} [{}]{}",
                track.number(),
                track.title(true).unwrap_or("-"),
                track.time().duration,
                track
                    .performer(true)
                    .map(|p| format!(" {p}"))
                    .unwrap_or_default()
            );
        }
    }
    Ok(())
}

/// Opens the image and rips the area selected on the command line.
pub async fn extract_image(progress: MultiProgress, cmd: ExtractCommand) -> RipResult<RipReport> {
    debug!("Opening image: {:?}", cmd.input);
    let mut source = IsoReader::open(&cmd.input).await?;
    let book = ScarletBook::open(&mut source).await?;

    let format = DsfFormat::new(OutputOptions {
        nopad: cmd.no_pad,
        concatenate: cmd.concatenate,
        tag_mode: cmd.id3,
    });
    let options = RipOptions {
        area: cmd.area,
        tracks: cmd.tracks.map(|t| t.indices()).unwrap_or_default(),
        trim_pauses: !cmd.keep_pauses,
        concatenate: cmd.concatenate,
        force: cmd.force,
        output_dir: cmd.output,
    };

    let mut session = RipSession::new(progress);
    let report = session
        .extract_area(&mut source, &book, &format, &options)
        .await?;

    for track in &report.tracks {
        if let TrackStatus::Failed(e) = &track.status {
            error!(
                "Track {} ({}) failed: {}",
                track.track_index + 1,
                track.path.display(),
                e
            );
        }
    }
    info!(
        "Wrote {} file(s) to {}",
        report.written().count(),
        options.output_dir.display()
    );
    Ok(report)
}
