//! bistro - Restaurant order and revenue reports from the terminal

mod cli;

use anyhow::{Context, Result};
use bistro_core::analytics::{
    active_orders_by_table, daily_trend, detailed_report, peak_hours_report, status_distribution,
    top_items_report, BucketUnit, DashboardData,
};
use bistro_core::models::OrderStatus;
use bistro_core::{
    assistant_system_prompt, export_report_to_csv, report_file_name, summarize, DataEvent, DataStore, FileWatcher, OrderStore, ReportConfig, Snapshot,
};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "bistro",
    version,
    about = "Restaurant order and revenue reports",
    long_about = "Reads the restaurant data file (menu items and orders) and prints the owner\n\
                  dashboard, revenue reports and the assistant summary.\n\
                  \n\
                  Only paid orders count towards revenue. Days, weeks and months follow the\n\
                  local time zone.\n\
                  \n\
                  Examples:\n\
                    bistro                               # Dashboard (default)\n\
                    bistro report --unit week            # Last 12 weeks\n\
                    bistro report --unit month --export-dir reports/\n\
                    bistro top --limit 10                # Best sellers\n\
                    bistro summary --prompt              # Assistant system prompt\n\
                    bistro set-status <order-id> paid    # Mark an order paid\n\
                    bistro watch                         # Redraw on every data change\n\
                  \n\
                  Environment Variables:\n\
                    BISTRO_DATA                          # Data file path\n\
                    BISTRO_CONFIG                        # Report settings (TOML)\n\
                    BISTRO_FORMAT                        # Force output format: json|table\n\
                    BISTRO_NO_COLOR                      # Disable ANSI colors (log-friendly)\n\
                    BISTRO_LOG                           # Log filter, e.g. bistro_core=debug"
)]
struct Cli {
    #[command(subcommand)]
    mode: Option<Mode>,

    /// Path to the data file
    #[arg(long, env = "BISTRO_DATA", default_value = "bistro-data.json")]
    data: PathBuf,

    /// Report settings file (default: <config dir>/bistro/config.toml)
    #[arg(long, env = "BISTRO_CONFIG")]
    config: Option<PathBuf>,

    /// Force output format (json|table)
    #[arg(long, env = "BISTRO_FORMAT", value_parser = ["json", "table"])]
    format: Option<String>,

    /// Disable ANSI colors (log-friendly)
    #[arg(long, env = "BISTRO_NO_COLOR")]
    no_color: bool,
}

#[derive(Subcommand)]
enum Mode {
    /// Owner dashboard: totals, today, trend, top items, status (default)
    Dashboard,
    /// Orders and paid revenue per day
    Trend {
        /// Number of days (default from config)
        #[arg(long, short = 'd', value_parser = parse_window)]
        days: Option<usize>,
    },
    /// Best selling items by units sold
    Top {
        /// Max items
        #[arg(long, short = 'n')]
        limit: Option<usize>,
    },
    /// Order count per status
    Status,
    /// Detailed period report
    Report {
        /// day, week or month
        #[arg(long, short = 'u', default_value = "day")]
        unit: BucketUnit,
        /// Number of periods (default from config)
        #[arg(long, short = 'w', value_parser = parse_window)]
        window: Option<usize>,
        /// Write the report as CSV to this file
        #[arg(long, conflicts_with = "export_dir")]
        export: Option<PathBuf>,
        /// Write the report as CSV into this directory with the default file name
        #[arg(long)]
        export_dir: Option<PathBuf>,
    },
    /// Orders by hour of day and weekday
    Peak,
    /// Snapshot summary for the assistant
    Summary {
        /// Print the full assistant system prompt
        #[arg(long)]
        prompt: bool,
    },
    /// Unpaid orders grouped by table
    Tables,
    /// Change an order's status and write the data file back
    SetStatus {
        /// Order ID
        order_id: String,
        /// pending, preparing, ready, delivered, paid or cancelled
        status: OrderStatus,
    },
    /// Remove an order that has not been paid
    DeleteOrder {
        /// Order ID
        order_id: String,
    },
    /// Print the dashboard again whenever the data file changes
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .with_env_filter(
            EnvFilter::try_from_env("BISTRO_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config = load_config(cli.config.as_deref());
    let json = cli.format.as_deref() == Some("json");
    let no_color = cli.no_color;

    let store = Arc::new(DataStore::with_defaults(Some(cli.data.clone())));
    let report = store.initial_load().await;
    if let Some(issues) = cli::format_load_issues(&report) {
        eprintln!("Problems loading {}:\n{}", cli.data.display(), issues);
    }

    let out = Output {
        config: &config,
        json,
        no_color,
    };

    match cli.mode.unwrap_or(Mode::Dashboard) {
        Mode::Dashboard => out.dashboard(&store.snapshot(), &Local::now()),
        Mode::Trend { days } => {
            let days = days.unwrap_or(config.trend_days);
            let trend = daily_trend(&store.snapshot().orders, days, &Local::now());
            out.print(&trend, || cli::format_trend(&trend, &config.currency_symbol, no_color));
        }
        Mode::Top { limit } => {
            let limit = limit.unwrap_or(config.top_items_limit);
            let items = top_items_report(&store.snapshot().orders, limit);
            out.print(&items, || {
                cli::format_top_items(&items, &config.currency_symbol, no_color)
            });
        }
        Mode::Status => {
            let distribution = status_distribution(&store.snapshot().orders);
            out.print(&distribution, || cli::format_status(&distribution, no_color));
        }
        Mode::Report {
            unit,
            window,
            export,
            export_dir,
        } => {
            run_report(&store.snapshot(), &out, unit, window, export, export_dir)?;
        }
        Mode::Peak => {
            let peak = peak_hours_report(&store.snapshot().orders, &Local);
            out.print(&peak, || {
                cli::format_peak_hours(&peak, &config.currency_symbol, no_color)
            });
        }
        Mode::Summary { prompt } => {
            let snapshot = store.snapshot();
            let summary = summarize(
                &snapshot.orders,
                &snapshot.menu_items,
                &Local,
                config.summary_top_items,
            );
            if prompt {
                println!("{}", assistant_system_prompt(&summary, &config));
            } else {
                out.print(&summary, || {
                    summary.render_context(&config.currency_symbol, config.prompt_top_items)
                });
            }
        }
        Mode::Tables => {
            let snapshot = store.snapshot();
            let groups = active_orders_by_table(&snapshot.orders);
            out.print(&groups, || {
                cli::format_tables(&groups, &config.currency_symbol, no_color)
            });
        }
        Mode::SetStatus { order_id, status } => {
            store.ensure_writable()?;
            let order = store.update_order_status(&order_id, status)?;
            store.save()?;
            out.print(&order, || format!("Order {} is now {}", order.id, order.status.label()));
        }
        Mode::DeleteOrder { order_id } => {
            store.ensure_writable()?;
            store.delete_order(&order_id)?;
            store.save()?;
            if !json {
                println!("Order {} removed", order_id);
            }
        }
        Mode::Watch => run_watch(Arc::clone(&store), &out).await?,
    }

    Ok(())
}

/// Resolve and load report settings, falling back to defaults
fn load_config(explicit: Option<&Path>) -> ReportConfig {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| dirs::config_dir().map(|dir| dir.join("bistro").join("config.toml")));

    match path {
        Some(path) => ReportConfig::load(&path),
        None => {
            debug!("No config directory on this platform, using defaults");
            ReportConfig::default()
        }
    }
}

/// Rendering choices shared by every command
struct Output<'a> {
    config: &'a ReportConfig,
    json: bool,
    no_color: bool,
}

impl Output<'_> {
    fn print<T: serde::Serialize>(&self, value: &T, table: impl FnOnce() -> String) {
        if self.json {
            println!("{}", cli::to_json(value));
        } else {
            println!("{}", table());
        }
    }

    fn dashboard(&self, snapshot: &Snapshot, reference: &DateTime<Local>) {
        let data = DashboardData::compute(snapshot, reference, self.config);
        self.print(&data, || {
            cli::format_dashboard(&data, &self.config.currency_symbol, self.no_color)
        });
    }
}

fn run_report(
    snapshot: &Snapshot,
    out: &Output<'_>,
    unit: BucketUnit,
    window: Option<usize>,
    export: Option<PathBuf>,
    export_dir: Option<PathBuf>,
) -> Result<()> {
    let reference = Local::now();
    let window = window.unwrap_or_else(|| out.config.window_for(unit));
    let report = detailed_report(&snapshot.orders, unit, window, &reference);

    let target = export.or_else(|| {
        export_dir.map(|dir| dir.join(report_file_name(unit, reference.date_naive())))
    });

    match target {
        Some(path) => {
            export_report_to_csv(&report, &out.config.currency_symbol, &path)
                .with_context(|| format!("Failed to export {} report", unit))?;
            info!(path = %path.display(), rows = report.rows.len(), "Report exported");
            if !out.json {
                println!("Report exported to {}", path.display());
            }
        }
        None => out.print(&report, || {
            cli::format_report(&report, &out.config.currency_symbol, out.no_color)
        }),
    }

    Ok(())
}

/// Period count for `--days` and `--window`
fn parse_window(value: &str) -> Result<usize, String> {
    let max = BucketUnit::Day.max_window();
    let window: usize = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if (1..=max).contains(&window) {
        Ok(window)
    } else {
        Err(format!("must be between 1 and {}", max))
    }
}

async fn run_watch(store: Arc<DataStore>, out: &Output<'_>) -> Result<()> {
    let mut events = store.subscribe();
    let watcher = FileWatcher::start(Arc::clone(&store), Default::default())
        .await
        .context("Failed to start file watcher")?;

    out.dashboard(&store.snapshot(), &Local::now());
    eprintln!("Watching for changes, Ctrl-C to stop");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) if event.invalidates_reports() => {
                    debug!(?event, "Refreshing dashboard");
                    out.dashboard(&store.snapshot(), &Local::now());
                }
                Ok(DataEvent::WatcherError(message)) => warn!(%message, "Watcher reported an error"),
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Dashboard fell behind, redrawing");
                    out.dashboard(&store.snapshot(), &Local::now());
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    watcher.stop().await;
    Ok(())
}
