use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use annexif::config::{self, FieldSelection};
use annexif::pipeline::{self, Action, ProcessResult};
use annexif::Field;

#[derive(Parser, Debug)]
#[command(
    name = "annexif",
    version,
    about = "Read and write plot id / normalization date annotations in EXIF UserComment"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Preview changes without writing to files
    #[arg(long, global = true)]
    dry_run: bool,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the library version string
    Version,

    /// Print the plot id and/or normalized date of images
    Get {
        /// Image files or directories
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        /// Which field to print (default from config, else all)
        #[arg(long, value_enum)]
        field: Option<FieldArg>,
    },

    /// Write the plot id and/or normalized date of images
    Set {
        /// Image files or directories
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        /// New plot id
        #[arg(long, value_name = "ID", required_unless_present = "date")]
        plot_id: Option<String>,

        /// New normalization date
        #[arg(long, value_name = "DATE")]
        date: Option<String>,
    },

    /// Print the raw UserComment text of images
    Show {
        /// Image files or directories
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },

    /// Write a default config.json and exit
    Init,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FieldArg {
    PlotId,
    Date,
    All,
}

impl From<FieldSelection> for FieldArg {
    fn from(sel: FieldSelection) -> Self {
        match sel {
            FieldSelection::PlotId => Self::PlotId,
            FieldSelection::Date => Self::Date,
            FieldSelection::All => Self::All,
        }
    }
}

impl FieldArg {
    fn field(self) -> Option<Field> {
        match self {
            Self::PlotId => Some(Field::PlotId),
            Self::Date => Some(Field::NormalizedDate),
            Self::All => None,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config
    let mut config = config::Config::load(cli.config.as_deref())?;
    if cli.dry_run {
        config.output.dry_run = true;
    }
    if cli.json {
        config.output.json = true;
    }

    let (paths, action) = match cli.command {
        Command::Version => {
            println!("{}", annexif::version());
            return Ok(());
        }
        Command::Init => {
            let path = cli.config.as_deref();
            config::Config::default().save(path)?;
            let save_path = match path {
                Some(p) => p.to_path_buf(),
                None => config::Config::config_path()?,
            };
            println!("Default config written to {}", save_path.display());
            return Ok(());
        }
        Command::Get { paths, field } => {
            let field = field.unwrap_or_else(|| config.defaults.field.into());
            (paths, Action::Get(field.field()))
        }
        Command::Show { paths } => (paths, Action::Show),
        Command::Set {
            paths,
            plot_id,
            date,
        } => (
            paths,
            Action::Set {
                plot_id,
                normalized_date: date,
            },
        ),
    };

    let images = pipeline::collect_images(&paths);
    if images.is_empty() {
        anyhow::bail!("No supported image files found in the specified paths.");
    }

    log::debug!("Found {} image(s) to process", images.len());
    if config.output.dry_run && matches!(action, Action::Set { .. }) {
        log::info!("DRY RUN — no files will be modified");
    }

    let total = images.len();
    let mut results = Vec::with_capacity(total);

    for image_path in &images {
        let result = pipeline::process_image(image_path, &action, &config);

        if let Some(ref err) = result.error {
            log::error!("{}: {err}", image_path.display());
        } else if !config.output.json {
            print_result(&result, &action, config.output.dry_run);
        }

        results.push(result);
    }

    // JSON output
    if config.output.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    if total > 1 {
        log::info!("Done: {} succeeded, {failed} failed out of {total} images", total - failed);
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {total} image(s) failed");
    }

    Ok(())
}

/// Print one result line in plain-text mode.
fn print_result(result: &ProcessResult, action: &Action, dry_run: bool) {
    let path = result.path.display();
    match action {
        Action::Get(Some(Field::PlotId)) => {
            println!("{path}\t{}", result.plot_id.as_deref().unwrap_or_default());
        }
        Action::Get(Some(Field::NormalizedDate)) => {
            println!("{path}\t{}", result.normalized_date.as_deref().unwrap_or_default());
        }
        Action::Get(None) => {
            println!(
                "{path}\tplotid={}\tnormalized={}",
                result.plot_id.as_deref().unwrap_or_default(),
                result.normalized_date.as_deref().unwrap_or_default()
            );
        }
        Action::Show => match result.comment {
            Some(ref comment) => println!("{path}\t{comment}"),
            None => println!("{path}\t(no UserComment)"),
        },
        Action::Set { .. } => {
            let verb = if dry_run { "Would write" } else { "Wrote" };
            println!("{path}\t{verb}: {}", result.comment.as_deref().unwrap_or_default());
            if let Some(ref backup) = result.backup_path {
                log::info!("  Backup: {}", backup.display());
            }
        }
    }
}
