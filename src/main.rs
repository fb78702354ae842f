use clap::{Parser, Subcommand};
use gallery_build::imaging::RustBackend;
use gallery_build::pipeline::{self, BuildEvent, BuildOptions};
use gallery_build::view::{GalleryPage, PrefixResolver};
use gallery_build::{config, logging, output};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;

/// Folder selection shared by commands that touch images.
#[derive(clap::Args, Clone)]
struct FolderArgs {
    /// Only process this folder (repeatable). Default: all folders
    #[arg(long = "folder", value_name = "NAME")]
    folders: Vec<String>,

    /// Regenerate thumbnails even when they are up to date
    #[arg(long)]
    force: bool,
}

#[derive(Parser)]
#[command(name = "gallery-build")]
#[command(about = "Build thumbnails and metadata for a month-by-month photo gallery")]
#[command(long_about = "\
Build thumbnails and metadata for a month-by-month photo gallery

Photos live in one folder per month. Each build writes thumbnails, one JSON
manifest per folder and a year/month index for the web front end.

Layout (paths relative to gallery.toml):

  gallery_images/
  ├── 202012/
  │   └── IMG_0001.jpg
  └── 202101/
      └── IMG_0002.jpg
  gallery_thumbnails/202101/IMG_0002.jpg    # generated at 2x display height
  image_metadata/202101.json                # per-folder manifest
  image_metadata/gallery.json               # year → months index

Capture dates come from EXIF (DateTimeOriginal, DateTimeDigitized, DateTime),
falling back to the file modification time. Captions edited into a manifest
are kept across rebuilds while the photo file is unchanged.

Run 'gallery-build gen-config' to generate a documented gallery.toml.")]
#[command(version)]
struct Cli {
    /// Config file; relative paths inside resolve against its directory
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: thumbnails → manifests → index
    Build {
        #[command(flatten)]
        folders: FolderArgs,

        /// Drop manifest entries whose image file no longer exists
        #[arg(long)]
        prune: bool,
    },
    /// Generate thumbnails only
    Thumbnails(FolderArgs),
    /// Rewrite the year/month index only
    Index,
    /// Print the capture-ordered listing of one month
    Show {
        /// Month folder, e.g. 202101
        month: String,
    },
    /// Validate config and list folders without writing anything
    Check,
    /// Print a stock gallery.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Build { folders, prune } => {
            let workspace = config::load_config(&cli.config)?;
            init_thread_pool(&workspace.config.processing);
            let options = BuildOptions {
                force: folders.force,
                prune,
                only: folders.folders,
            };
            let (tx, printer) = spawn_printer();
            let store = workspace.store();
            let result = pipeline::run(&RustBackend::new(), &store, &workspace, &options, Some(&tx));
            drop(tx);
            join_printer(printer);
            output::print_build_summary(&result?);
        }
        Command::Thumbnails(folders) => {
            let workspace = config::load_config(&cli.config)?;
            init_thread_pool(&workspace.config.processing);
            let options = BuildOptions {
                force: folders.force,
                only: folders.folders,
                ..BuildOptions::default()
            };
            let (tx, printer) = spawn_printer();
            let result =
                pipeline::run_thumbnails(&RustBackend::new(), &workspace, &options, Some(&tx));
            drop(tx);
            join_printer(printer);
            output::print_thumbnail_summary(&result?);
        }
        Command::Index => {
            let workspace = config::load_config(&cli.config)?;
            let names = workspace.folder_names()?;
            let (tx, printer) = spawn_printer();
            let result = pipeline::write_index(
                &workspace.store(),
                names.iter().map(String::as_str),
                Some(&tx),
            );
            drop(tx);
            join_printer(printer);
            result?;
        }
        Command::Show { month } => {
            let workspace = config::load_config(&cli.config)?;
            let manifest = pipeline::load_manifest(&workspace.store(), &format!("{month}.json"))?;
            let page = GalleryPage::build(&month, &manifest, &PrefixResolver::default())?;
            output::print_listing(&page);
        }
        Command::Check => {
            let workspace = config::load_config(&cli.config)?;
            let mut folders = Vec::new();
            for name in workspace.folder_names()? {
                let count = pipeline::list_images(&workspace.folder(&name).images_dir)?.len();
                folders.push((name, count));
            }
            output::print_check(&workspace, &folders);
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Print build events on a separate thread while the pipeline runs.
fn spawn_printer() -> (Sender<BuildEvent>, JoinHandle<()>) {
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_build_event(&event) {
                println!("{}", line);
            }
        }
    });
    (tx, printer)
}

fn join_printer(printer: JoinHandle<()>) {
    if printer.join().is_err() {
        tracing::error!("Progress printer thread panicked");
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
