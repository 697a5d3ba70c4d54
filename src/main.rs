use std::io::Read;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use dotview::config::{ConfigOverrides, RankDir};
use dotview::widget::{ContainerSize, DataRow, GraphDisplay, GraphWidget, HostElement};

#[derive(Parser)]
#[command(name = "dotview", about = "Lay out DOT graphs and render them as SVG")]
struct Cli {
    /// Input file (reads from stdin if not provided)
    file: Option<std::path::PathBuf>,

    /// Treat the input as a JSON array of data rows and render as the widget would
    #[arg(long)]
    rows: bool,

    /// Column holding the DOT text in widget mode
    #[arg(long, requires = "rows")]
    column: Option<String>,

    /// Available container width in widget mode
    #[arg(long, default_value_t = 800.0)]
    width: f64,

    /// Available container height in widget mode
    #[arg(long, default_value_t = 600.0)]
    height: f64,

    /// Rank direction: TB, BT, LR or RL
    #[arg(long)]
    rankdir: Option<RankDir>,

    /// Gap between nodes within a rank
    #[arg(long)]
    nodesep: Option<f64>,

    /// Gap between ranks
    #[arg(long)]
    ranksep: Option<f64>,

    /// Write the output here instead of stdout
    #[arg(long, short = 'o')]
    output: Option<std::path::PathBuf>,

    /// Log pipeline details to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let input = match &cli.file {
        Some(path) => std::fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("ERROR: failed to read {}: {e}", path.display());
            std::process::exit(1);
        }),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).unwrap_or_else(|e| {
                eprintln!("ERROR: failed to read stdin: {e}");
                std::process::exit(1);
            });
            buf
        }
    };

    let overrides = ConfigOverrides {
        rank_dir: cli.rankdir,
        node_sep: cli.nodesep,
        rank_sep: cli.ranksep,
    };

    let result = if cli.rows {
        render_rows(&input, &cli, overrides)
    } else {
        dotview::run_pipeline(&input, &overrides)
            .map(|diagram| diagram.scene.to_svg())
            .map_err(|e| e.to_string())
    };

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    };

    match &cli.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, output) {
                eprintln!("ERROR: failed to write {}: {e}", path.display());
                std::process::exit(1);
            }
        }
        None => print!("{output}"),
    }
}

fn render_rows(input: &str, cli: &Cli, overrides: ConfigOverrides) -> Result<String, String> {
    let rows: Vec<DataRow> =
        serde_json::from_str(input).map_err(|e| format!("invalid rows JSON: {e}"))?;
    let display = GraphDisplay {
        dot_column: cli.column.clone(),
    };
    let host = HostElement::new(
        "graph-container",
        ContainerSize {
            width: cli.width,
            height: cli.height,
        },
    );
    let mut widget = GraphWidget::new(display, host).with_overrides(overrides);
    widget.update(&rows);
    Ok(widget.to_html())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "dotview=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
