use std::path::Path;
use wbg_cli::prelude::{LayoutOpts, Parser, Verbosity};
use wbg_gallery::{model::mime_type_for_extension, parse_date, Gallery, IncomingFile};

fn main() -> Result<(), Error> {
    let opts: Opts = Opts::parse();
    opts.verbose.init_logging()?;

    let gallery = Gallery::from_layout(&opts.layout);

    match opts.command {
        Command::Reconcile => {
            let report = gallery.reconcile()?;

            for folder in &report.folders {
                println!(
                    "{}\t{}",
                    folder.name,
                    if folder.has_images { "images" } else { "empty" }
                );
            }

            log::info!("{} active folders", report.active.len());
        }
        Command::List { date } => {
            let date = parse_date(&date)?;

            for path in gallery.list_images(&date)? {
                println!("{}", path);
            }
        }
        Command::Upload { date, files } => {
            let files = files
                .iter()
                .map(|path| {
                    let name = Path::new(path)
                        .file_name()
                        .map(|value| value.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.clone());
                    let content = std::fs::read(path)?;
                    let mime_type = mime_type_for_extension(&name).map(str::to_string);

                    Ok(IncomingFile::new(name, content, mime_type))
                })
                .collect::<Result<Vec<_>, std::io::Error>>()?;

            let report = gallery.submit(&date, files)?;

            for image in &report.stored {
                println!("{}\t{}", image.name, image.path);
            }
            for skipped in &report.skipped {
                log::warn!("Skipped {}: {}", skipped.name, skipped.reason);
            }
            for failed in &report.failed {
                log::error!("Failed {}: {}", failed.name, failed.reason);
            }

            if let Some(error) = report.sync_error {
                return Err(error.into());
            }
        }
        Command::Render => {
            let catalog = gallery.render_catalog()?;
            log::info!(
                "Rendered {} dates to {}",
                catalog.len(),
                gallery.catalog().script_path().display()
            );
        }
        Command::ImportScript => {
            let catalog = gallery.import_script()?;
            log::info!(
                "Imported {} dates into {}",
                catalog.len(),
                gallery.catalog().data_path().display()
            );
        }
    }

    Ok(())
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Gallery error")]
    Gallery(#[from] wbg_gallery::Error),
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    #[error("Log initialization error")]
    LogInitialization(#[from] log::SetLoggerError),
}

#[derive(Debug, Parser)]
#[clap(name = "wbg-gallery", version, author)]
struct Opts {
    #[clap(flatten)]
    verbose: Verbosity,
    #[clap(flatten)]
    layout: LayoutOpts,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Parser)]
enum Command {
    /// Rebuild the folder index from the date folders that contain images
    Reconcile,
    /// Print the image paths stored for a date
    List { date: String },
    /// Store local image files under a date and update the index and catalog
    Upload {
        date: String,
        #[clap(required = true)]
        files: Vec<String>,
    },
    /// Re-render the catalog script from the catalog data
    Render,
    /// Replace the catalog data with the entries of the existing catalog script
    ImportScript,
}
