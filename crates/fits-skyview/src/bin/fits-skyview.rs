use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use fits_skyview::reader::read_header_records;
use fits_skyview::sanitize::sanitize_records;
use fits_skyview::service::rendered_filename;
use fits_skyview::{RenderConfig, SkyService, Stretch, DEFAULT_LOG_CONTRAST};

#[derive(Parser)]
#[command(
    name = "fits-skyview",
    version,
    about = "Render FITS images and map pixels to sky coordinates"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the first image plane to an 8-bit grayscale PNG
    Render {
        input: PathBuf,
        /// Output path (defaults to the input name with a .png extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        render: RenderArgs,
    },
    /// Print the sky position of a display pixel as JSON
    Locate {
        input: PathBuf,
        /// 1-based column: display column index + 1
        x: f64,
        /// 0-based row index, counted from the top of the rendered image
        y: f64,
    },
    /// Print the sanitized header, one card per line
    Header { input: PathBuf },
}

#[derive(Args)]
struct RenderArgs {
    /// Intensity stretch
    #[arg(long, value_enum, default_value_t = Stretch::default())]
    stretch: Stretch,
    /// Keep the stored row order instead of flipping rows for display
    #[arg(long)]
    no_flip: bool,
    /// Contrast constant for the log stretch
    #[arg(long, default_value_t = DEFAULT_LOG_CONTRAST)]
    log_contrast: f64,
}

impl RenderArgs {
    fn to_config(&self) -> anyhow::Result<RenderConfig> {
        let config = RenderConfig::default()
            .with_stretch(self.stretch)
            .with_flip_rows(!self.no_flip)
            .with_log_contrast(self.log_contrast);
        config.validate()?;
        Ok(config)
    }
}

fn image_id(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn open(input: &Path) -> anyhow::Result<BufReader<fs::File>> {
    let file =
        fs::File::open(input).with_context(|| format!("failed to open {}", input.display()))?;
    Ok(BufReader::new(file))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Render {
            input,
            output,
            render,
        } => {
            let service = SkyService::new(render.to_config()?);
            let id = image_id(&input);
            let ingested = service
                .ingest_file(&input, &id)
                .with_context(|| format!("failed to render {}", input.display()))?;
            let output = output.unwrap_or_else(|| input.with_file_name(rendered_filename(&id)));
            fs::write(&output, &ingested.png)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!(
                "{} -> {} ({}x{}, {} stretch)",
                input.display(),
                output.display(),
                ingested.cols,
                ingested.rows,
                service.config().stretch
            );
            if let Some(e) = &ingested.wcs_error {
                eprintln!("warning: no coordinate mapping: {e}");
            }
        }
        Command::Locate { input, x, y } => {
            let service = SkyService::default();
            let id = image_id(&input);
            service
                .register_header(open(&input)?, &id)
                .with_context(|| format!("{} has no coordinate mapping", input.display()))?;
            let position = service.locate_point(&id, x, y)?;
            println!("{}", serde_json::to_string_pretty(&position)?);
        }
        Command::Header { input } => {
            let records = read_header_records(open(&input)?)
                .with_context(|| format!("failed to read header of {}", input.display()))?;
            print!("{}", sanitize_records(records.records()));
        }
    }
    Ok(())
}
