use anyhow::{Context, Result};
use chartflow::config::{ChartConfig, ChartKind};
use chartflow::csv_reader;
use chartflow::pipeline::ChartPipeline;
use chartflow::render;
use chartflow::topology::Topology;
use chartflow::viewport::ContainerBox;
use clap::{Parser, ValueEnum};
use serde_json::{json, Value};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Svg,
    Png,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "chartflow")]
#[command(about = "Render area, bar, gauge and map charts from order records", long_about = None)]
struct Args {
    #[arg(short = 'k', long = "kind", value_enum, help = "Chart kind (overrides the config file)")]
    kind: Option<ChartKind>,

    #[arg(short = 'i', long = "input", help = "Records file (defaults to stdin)")]
    input: Option<PathBuf>,

    #[arg(long = "csv", help = "Read records as CSV with dotted headers instead of a JSON array")]
    csv: bool,

    #[arg(long = "topology", help = "TopoJSON boundary file for map charts")]
    topology: Option<PathBuf>,

    #[arg(short = 'c', long = "config", help = "JSON chart config file")]
    config: Option<PathBuf>,

    #[arg(long = "width", default_value = "0", help = "Container width in pixels (0 uses the chart default)")]
    width: f64,

    #[arg(long = "height", default_value = "0", help = "Container height in pixels (0 uses the chart default)")]
    height: f64,

    #[arg(short = 'f', long = "format", value_enum, default_value = "svg", help = "Output format")]
    format: OutputFormat,

    #[arg(long = "at-ms", help = "Advance the animation clock before drawing (defaults to the end of the transition)")]
    at_ms: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ChartConfig::from_json_file(path)?,
        None => ChartConfig::default(),
    };
    if let Some(kind) = args.kind {
        config.kind = kind;
    }

    let records = read_records(&args).context("Failed to read records")?;

    let mut pipeline = ChartPipeline::new(config, ContainerBox::new(args.width, args.height));
    if let Some(path) = &args.topology {
        pipeline = pipeline.with_topology(read_topology(path)?);
    }

    pipeline
        .set_records(records)
        .context("Failed to build chart")?;

    let elapsed = match args.at_ms {
        Some(ms) => Duration::from_millis(ms),
        None => pipeline.config().transition.duration(),
    };
    pipeline.tick(elapsed);

    let geometry = pipeline.rendered();
    let viewport = *pipeline.viewport();

    let bytes = match args.format {
        OutputFormat::Svg => render::render_svg(&geometry, &viewport)
            .context("Failed to render SVG")?
            .into_bytes(),
        OutputFormat::Png => render::render_png(&geometry, &viewport)
            .context("Failed to render PNG")?,
        OutputFormat::Json => {
            let document = json!({
                "viewport": viewport,
                "geometry": geometry,
                "frame": pipeline.frame(),
                "diagnostics": pipeline.diagnostics(),
            });
            serde_json::to_vec_pretty(&document).context("Failed to serialize geometry")?
        }
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(&bytes)
        .context("Failed to write chart to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}

fn read_records(args: &Args) -> Result<Value> {
    if args.csv {
        let data = match &args.input {
            Some(path) => csv_reader::read_csv_from_path(path)?,
            None => csv_reader::read_csv_from_stdin()?,
        };
        return data.into_records();
    }

    let text = match &args.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            text
        }
    };
    serde_json::from_str(&text).context("Records are not valid JSON")
}

fn read_topology(path: &Path) -> Result<Topology> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read topology '{}'", path.display()))?;
    let value: Value = serde_json::from_str(&text).context("Topology is not valid JSON")?;
    Topology::from_topojson(&value).context("Failed to decode topology")
}
