use anyhow::{Context, Result, bail};
use camino::Utf8PathBuf;
use clap::Parser;
use tripcanvas::label::combined_label;
use tripcanvas::{CanvasConfig, TripDoc};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect block relationships and snapping for a trip JSON file", long_about = None)]
struct Cli {
    /// Trip JSON file (`{"timeline": {...}, "blocks": [...]}`)
    #[arg(value_name = "TRIP_FILE")]
    trip_file: Utf8PathBuf,

    /// Canvas config JSON file; defaults are used for missing fields
    #[arg(long, value_name = "FILE")]
    config: Option<Utf8PathBuf>,

    /// Print combined label data instead of raw relationships
    #[arg(long)]
    labels: bool,

    /// Preview a snap for this block id (requires --x and --y)
    #[arg(long, value_name = "BLOCK_ID", requires_all = ["x", "y"])]
    snap: Option<String>,

    #[arg(long, allow_negative_numbers = true)]
    x: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    y: Option<f64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CanvasConfig::load(path)?,
        None => CanvasConfig::default(),
    };
    let registry = TripDoc::load(&cli.trip_file)?
        .into_registry(config)
        .with_context(|| format!("Invalid trip {}", cli.trip_file))?;

    let json = if let Some(id) = &cli.snap {
        let (Some(x), Some(y)) = (cli.x, cli.y) else {
            bail!("--snap needs both --x and --y");
        };
        serde_json::to_string_pretty(&registry.find_snap_target(id, x, y)?)?
    } else if cli.labels {
        let labels: Vec<_> = registry.relationships().iter().map(combined_label).collect();
        serde_json::to_string_pretty(&labels)?
    } else {
        serde_json::to_string_pretty(registry.relationships())?
    };
    println!("{}", json);
    Ok(())
}
