// Takeout Puzzle CLI binary

use std::path::PathBuf;
use std::sync::Arc;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use takeout_puzzle::config::{parse_time_zone, DateMethod, DateRange, ImportOptions};
use takeout_puzzle::filenames::InfoCollector;
use takeout_puzzle::filetypes::SupportedMedia;
use takeout_puzzle::source::open_sources;
use takeout_puzzle::{tools, Recorder, Takeout, TakeoutError};

#[derive(Parser)]
#[command(name = "takeout")]
#[command(about = "Takeout Puzzle - Rebuild asset groups from a photo library export", long_about = None)]
#[command(version)]
struct Cli {
    /// Log filter (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse takeout folders and archives, and print the asset groups
    Scan(ScanArgs),

    /// Show how file names are understood
    Classify {
        /// File names to classify
        names: Vec<String>,
        /// Time zone for names without one (local, UTC or +HH:MM)
        #[arg(long, default_value = "local")]
        time_zone: String,
    },

    /// Print the effective options
    Config {
        /// Options file (defaults to the user configuration)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ScanArgs {
    /// Takeout folders or .zip archives
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Options file (defaults to the user configuration)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Print one JSON document per group
    #[arg(long)]
    json: bool,

    /// Keep files without sidecar
    #[arg(long)]
    keep_json_less: bool,
    /// Keep trashed files
    #[arg(long)]
    keep_trashed: bool,
    /// Keep albums without title
    #[arg(long)]
    keep_untitled: bool,
    /// Drop archived files
    #[arg(long)]
    drop_archived: bool,
    /// Drop files shared by a partner
    #[arg(long)]
    drop_partner: bool,
    /// Do not assign assets to albums
    #[arg(long)]
    no_albums: bool,
    /// Only keep files of this album
    #[arg(long)]
    from_album: Option<String>,
    /// Put every asset in this album
    #[arg(long)]
    into_album: Option<String>,
    /// Album for assets shared by a partner
    #[arg(long)]
    partner_album: Option<String>,
    /// Capture dates to keep: YYYY, YYYY-MM, YYYY-MM-DD or start,end
    #[arg(long)]
    date_range: Option<String>,
    /// Date source for files without sidecar: none, filename, exif, exif-filename, filename-exif
    #[arg(long)]
    date_method: Option<DateMethod>,
    /// Time zone for dates without one (local, UTC or +HH:MM)
    #[arg(long)]
    time_zone: Option<String>,
    /// Read embedded metadata with exiftool
    #[arg(long)]
    exiftool: bool,
    /// Only consider these extensions
    #[arg(long, value_delimiter = ',')]
    include: Vec<String>,
    /// Ignore these extensions
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,
}

impl ScanArgs {
    /// Command line flags on top of the options file
    fn options(&self) -> Result<ImportOptions> {
        let mut options = ImportOptions::load_or_default(self.config.as_deref())?;
        options.keep_json_less |= self.keep_json_less;
        options.keep_trashed |= self.keep_trashed;
        options.keep_untitled |= self.keep_untitled;
        if self.drop_archived {
            options.keep_archived = false;
        }
        if self.drop_partner {
            options.keep_partner = false;
        }
        if self.no_albums {
            options.create_albums = false;
        }
        if self.from_album.is_some() {
            options.from_album = self.from_album.clone();
        }
        if self.into_album.is_some() {
            options.into_album = self.into_album.clone();
        }
        if self.partner_album.is_some() {
            options.partner_shared_album = self.partner_album.clone();
        }
        if let Some(range) = &self.date_range {
            options.date_range = DateRange::parse(range)?;
        }
        if let Some(method) = self.date_method {
            options.date_method = method;
        }
        if let Some(tz) = &self.time_zone {
            options.time_zone = tz.clone();
        }
        options.use_exif_tool |= self.exiftool;
        if !self.include.is_empty() {
            options.included_extensions = self.include.clone();
        }
        if !self.exclude.is_empty() {
            options.excluded_extensions = self.exclude.clone();
        }
        options.validate()?;
        Ok(options)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match &cli.log_level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "takeout_puzzle=info,takeout=info".into()),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Scan(args) => cmd_scan(args).await,
        Commands::Classify { names, time_zone } => cmd_classify(names, &time_zone),
        Commands::Config { config } => cmd_config(config),
    }
}

async fn cmd_scan(args: ScanArgs) -> Result<()> {
    let options = args.options()?;
    if options.use_exif_tool && !tools::is_exiftool_available() {
        anyhow::bail!("exiftool was requested but could not be found");
    }

    let sources = open_sources(&args.paths)?;
    let recorder = Arc::new(Recorder::new());
    let cancel = CancellationToken::new();

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, stopping");
            ctrl_c.cancel();
        }
    });

    let mut takeout = Takeout::new(sources, options, Arc::clone(&recorder))?;
    let prepare_cancel = cancel.clone();
    let takeout = tokio::task::spawn_blocking(move || {
        takeout.prepare(&prepare_cancel)?;
        Ok::<_, TakeoutError>(takeout)
    })
    .await??;

    let (mut rx, handle) = takeout.into_stream(cancel);
    let mut groups = 0usize;
    let mut assets = 0usize;
    while let Some(group) = rx.recv().await {
        groups += 1;
        assets += group.assets.len();
        if args.json {
            println!("{}", serde_json::to_string(&group)?);
        } else {
            println!("{}", group);
        }
    }
    handle.await??;

    eprintln!();
    eprint!("{}", recorder.report());
    eprintln!("{} groups, {} assets", groups, assets);
    Ok(())
}

fn cmd_classify(names: Vec<String>, time_zone: &str) -> Result<()> {
    let ic = InfoCollector::new(parse_time_zone(time_zone)?, SupportedMedia::default());

    println!("{:<48}  {:<32}  {:<6}  {:>5}  {:<5}  {}", "Name", "Radical", "Kind", "Index", "Cover", "Taken");
    println!("{}", "-".repeat(120));
    for name in &names {
        let info = ic.get_info(name);
        let taken = info
            .taken
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<48}  {:<32}  {:<6}  {:>5}  {:<5}  {}",
            name,
            info.radical,
            format!("{:?}", info.kind).to_lowercase(),
            info.index,
            if info.is_cover { "yes" } else { "" },
            taken
        );
    }
    Ok(())
}

fn cmd_config(config: Option<PathBuf>) -> Result<()> {
    let options = ImportOptions::load_or_default(config.as_deref())?;
    match ImportOptions::default_path() {
        Some(path) => eprintln!("Default options file: {}", path.display()),
        None => eprintln!("No default options file location"),
    }
    println!("{}", serde_json::to_string_pretty(&options)?);
    Ok(())
}
