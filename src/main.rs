use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use whitebear::config::{self, WhitebearConfig};
use whitebear::loader::{DirectoryLoader, Session};
use whitebear::media;
use whitebear::output;
use whitebear::schema::SchemaRegistry;

#[derive(Parser)]
#[command(name = "whitebear")]
#[command(about = "Loads and checks the pages of a White Bear web root")]
#[command(long_about = "\
Loads and checks the pages of a White Bear web root

Every .html file directly in the web root must be an index page, an
article or a menu, as described by the role schemas. Loading stops at
the first page that cannot be read, cannot be parsed or matches no role.

Web root structure:

  site/
  ├── whitebear.toml          # Configuration (optional)
  ├── index.html              # Front page, must satisfy the index schema
  ├── bears.html              # Article
  ├── menu-animals.html       # Menu
  ├── google0123abcd.html     # Verification file, skipped
  ├── 404.html                # Error page, skipped
  └── images/                 # Linked images and thumbnails

Classification order: article → menu → index. The first schema a page
satisfies decides its role.

Run 'whitebear gen-config' to generate a documented whitebear.toml.")]
#[command(version)]
struct Cli {
    /// Web root directory
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Log progress to stderr (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load the web root and list its documents
    Check,
    /// Load the web root and print the session as JSON
    Scan {
        /// Write the JSON here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run SEO checks on the images of every article
    Seo {
        /// Exit with an error if any image is flagged
        #[arg(long)]
        strict: bool,
    },
    /// Print a stock whitebear.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let (_, session) = load_web_root(&cli.source)?;
            output::print_session(&session);
            println!("==> Web root is valid");
        }
        Command::Scan { output } => {
            let (_, session) = load_web_root(&cli.source)?;
            let json = serde_json::to_string_pretty(&session)?;
            match output {
                Some(path) => std::fs::write(path, json)?,
                None => println!("{}", json),
            }
        }
        Command::Seo { strict } => {
            let (config, session) = load_web_root(&cli.source)?;
            let reports = session
                .articles()
                .values()
                .map(|doc| Ok((doc, media::article_images(doc, &config.seo)?)))
                .collect::<Result<Vec<_>, whitebear::loader::LoadError>>()?;
            output::print_seo_report(&reports);

            let flagged = reports
                .iter()
                .flat_map(|(_, images)| images)
                .filter(|image| image.indicator() == whitebear::seo::Indicator::Attention)
                .count();
            if strict && flagged > 0 {
                return Err(format!("{flagged} image(s) failed SEO checks").into());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// `--verbose` forces info level, otherwise `RUST_LOG` decides.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Config, schemas, then the classification pass.
fn load_web_root(source: &Path) -> Result<(WhitebearConfig, Session), Box<dyn std::error::Error>> {
    let config = config::load_config(source)?;
    let registry = Arc::new(SchemaRegistry::from_config(&config.schemas, source)?);
    if config.processing.parallel {
        init_thread_pool(&config.processing);
    }

    let mut loader = DirectoryLoader::new(registry, config.clone());
    let session = loader.load(source)?.clone();
    Ok((config, session))
}
