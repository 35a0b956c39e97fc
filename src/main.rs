use crate::commands::{Cli, Commands};
use crate::rip::image::{extract_image, print_info};
use anyhow::{Result, bail};
use clap::Parser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

mod commands;
mod dsf;
mod id3;
mod output;
mod rip;
mod scarletbook;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let logger = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .build();

    let level = logger.filter();
    let pb = MultiProgress::new();

    LogWrapper::new(pb.clone(), logger).try_init()?;
    log::set_max_level(level);

    let cli = Cli::parse();

    match cli.command {
        Commands::Info(cmd) => print_info(&cmd.input).await?,
        Commands::Extract(cmd) => {
            let report = extract_image(pb.clone(), cmd).await?;
            let failed = report.failed().count();
            if failed > 0 {
                bail!("{} of {} track(s) could not be written", failed, report.tracks.len());
            }
        }
    }

    Ok(())
}
