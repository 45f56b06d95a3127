use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use metric_plots::config::Config;
use metric_plots::data::metric::{parse_metric_list, Metric};
use metric_plots::data::shaped::Selection;
use metric_plots::data::utils::split_list;
use metric_plots::explore::Session;
use metric_plots::plot::chart::ChartType;
use metric_plots::{logging, pipeline};

/// Compare classification metrics across algorithms and export organized charts.
#[derive(Parser)]
#[command(name = "metric-plots", version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Parent directory for run outputs (overrides [output] root)
    #[arg(long, global = true)]
    out_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the full plot set and selected_metrics.csv for one CSV
    Generate {
        csv: PathBuf,

        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Show one comparison chart and the metrics table
    Explore {
        /// Metrics CSV; the built-in example table when omitted
        csv: Option<PathBuf>,

        #[arg(long, default_value = "bar")]
        chart: String,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Do not print the numeric table
        #[arg(long)]
        no_table: bool,

        /// Write the live chart as SVG
        #[arg(long)]
        svg: Option<PathBuf>,

        /// Persist the chart, the plot set and the CSV (uploads only)
        #[arg(long)]
        save: bool,

        /// Write the selected metrics as CSV
        #[arg(long)]
        download: Option<PathBuf>,
    },
}

#[derive(Args)]
struct SelectionArgs {
    /// Comma-separated algorithm names (default: all)
    #[arg(long)]
    algorithms: Option<String>,

    /// Comma-separated metrics (default: all four)
    #[arg(long)]
    metrics: Option<String>,
}

impl SelectionArgs {
    fn to_selection(&self) -> anyhow::Result<Selection> {
        let metrics: Option<Vec<Metric>> = self.metrics.as_deref().map(parse_metric_list).transpose()?;
        Ok(Selection {
            algorithms: self.algorithms.as_deref().map(split_list),
            metrics,
        })
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // --- 1. Config ---
    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(root) = cli.out_root {
        config.output.root = root;
    }
    logging::init(&config.logging);

    // --- 2. Dispatch ---
    match cli.command {
        Command::Generate { csv, selection } => {
            let selection = selection.to_selection()?;
            let run = pipeline::generate(&csv, &selection, &config)?;
            println!("Generated: {}", run.root.display());
        }
        Command::Explore {
            csv,
            chart,
            selection,
            no_table,
            svg,
            save,
            download,
        } => {
            let session = match &csv {
                Some(path) => {
                    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
                    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
                    Session::from_upload(&name, &bytes, &config)?
                }
                None => Session::example(&config)?,
            };
            let chart_type: ChartType = chart.parse()?;
            let selection = selection.to_selection()?;
            let view = session.view(&selection, chart_type);

            if !no_table {
                println!("{}", view.table());
            }
            if let Some(path) = svg {
                let document = view.chart.to_svg(config.plots.dpi)?;
                fs::write(&path, document).with_context(|| format!("writing {}", path.display()))?;
                println!("[INFO] Chart written to {}", path.display());
            }
            if let Some(name) = view.focused_algorithm() {
                println!("[INFO] Selected algorithm: {name}");
            }
            if save {
                match session.save(&view)? {
                    Some(run) => println!("Saved organized plots and CSV to: {}", run.root.display()),
                    None => println!("[INFO] Example data is not saved; pass a CSV to persist plots"),
                }
            }
            if let Some(path) = download {
                match session.download_csv(&selection)? {
                    Some(bytes) => {
                        fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
                        println!("[INFO] Selected metrics written to {}", path.display());
                    }
                    None => println!("[INFO] Nothing selected; no CSV written"),
                }
            }
        }
    }
    Ok(())
}
