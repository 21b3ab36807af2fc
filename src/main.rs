use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use spreadstitch::SpreadConfig;
use spreadstitch::error::Result;
use tracing_subscriber::EnvFilter;

/// Correctly show manga spreads by stitching the pages of a cbz together.
///
/// Each archive is converted in place; the unstitched archive is kept next to it
/// as `<name>_original.cbz` unless `--del-old-cbzs` is given.
#[derive(Parser, Debug)]
#[command(name = "spreadstitch", version)]
struct Cli {
    /// The cbz files to stitch
    #[arg(value_name = "CBZ", required = true)]
    cbzs: Vec<PathBuf>,

    /// Delete the unstitched archives instead of keeping them aside
    #[arg(short = 'd', long = "del-old-cbzs")]
    del_old_cbzs: bool,

    /// Do not add the "read right to left" warning page
    #[arg(short = 'w', long)]
    skip_warning_page: bool,

    /// Only print warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Combine all given chapters into a single volume archive
    #[arg(short, long)]
    volume: bool,

    /// Font used for the warning page
    #[arg(long, value_name = "PATH")]
    font: Option<PathBuf>,

    /// Font size of the warning text, in pixels
    #[arg(long, value_name = "PX")]
    font_size: Option<f32>,

    /// Maximum number of chapters processed at once
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Runs the requested conversion; `Ok(false)` means some chapter failed.
async fn run(cli: Cli) -> Result<bool> {
    let mut builder = SpreadConfig::builder();
    builder
        .delete_originals(cli.del_old_cbzs)
        .skip_warning_page(cli.skip_warning_page);
    if let Some(font) = cli.font {
        builder.font_path(font);
    }
    if let Some(size) = cli.font_size {
        builder.font_size(size);
    }
    if let Some(jobs) = cli.jobs {
        builder.max_concurrent(jobs);
    }
    let config = builder.build()?;

    if cli.volume {
        if cli.cbzs.len() >= 2 {
            let outcome = config.assemble_volume(cli.cbzs).await?;
            log::info!(
                "Combined {} chapters into {} ({} spreads)",
                outcome.chapters,
                outcome.output.display(),
                outcome.spreads
            );
            return Ok(true);
        }
        log::warn!("A volume needs at least two chapters, converting the chapter on its own");
    }

    let report = config.convert_chapters(cli.cbzs).await?;
    if !report.is_success() {
        log::warn!(
            "{} of {} chapter(s) failed:",
            report.failed.len(),
            report.failed.len() + report.succeeded.len()
        );
        for failure in &report.failed {
            log::warn!("\t{}: {}", failure.archive.display(), failure.reason);
        }
    }
    Ok(report.is_success())
}
