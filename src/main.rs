use cfstats_lib::commands::refresh::{GridSource, RefreshOutcome};
use cfstats_lib::commands::render::{default_output_path, write_heatmap};
use cfstats_lib::commands::scheduler::RefreshScheduler;
use cfstats_lib::commands::settings::{get_settings, parse_assignments, save_settings};
use cfstats_lib::{default_data_dir, init_context, AppContext, DATA_DIR_ENV};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "cfstats")]
#[command(about = "Codeforces submission activity as a contribution heat-map")]
struct Cli {
    /// Directory holding state.db, settings.json and the rendered heat-map
    #[arg(short, long, env = DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store a handle, fetch its submissions and render the heat-map
    Login {
        handle: String,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Refresh the stored handle and render the heat-map
    Refresh {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Render the cached grid without touching the network
    Render {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Refresh periodically and re-render after every refresh until interrupted
    Watch {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Forget the stored handle and its cached grid
    Logout,
    /// Print settings, or merge `key=value` pairs into them
    Settings {
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("cfstats=info,cfstats_lib=info"))
        .init();

    if let Err(err) = run(Cli::parse()).await {
        log::error!("{err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    match cli.command {
        Command::Settings { set } => {
            let settings = if set.is_empty() {
                get_settings(data_dir).await?
            } else {
                save_settings(data_dir, parse_assignments(&set)?).await?
            };
            let pretty = serde_json::to_string_pretty(&settings)
                .map_err(|e| format!("Failed to format settings: {e}"))?;
            println!("{pretty}");
            Ok(())
        }
        Command::Logout => {
            let ctx = init_context(&data_dir)?;
            ctx.coordinator.clear_handle().await?;
            println!("Logged out");
            Ok(())
        }
        Command::Login { handle, out } => {
            let ctx = init_context(&data_dir)?;
            let outcome = ctx
                .coordinator
                .refresh(&handle)
                .await
                .ok_or("Handle must not be empty")?;
            present(&ctx, &outcome, out)
        }
        Command::Refresh { out } => {
            let ctx = init_context(&data_dir)?;
            match ctx.coordinator.refresh_stored().await {
                Some(outcome) => present(&ctx, &outcome, out),
                None => {
                    println!("No handle stored; run `cfstats login <handle>` first");
                    Ok(())
                }
            }
        }
        Command::Render { out } => {
            let ctx = init_context(&data_dir)?;
            let grid = ctx.coordinator.cached_grid().unwrap_or_default();
            let path = out.unwrap_or_else(|| default_output_path(&ctx.data_dir));
            write_heatmap(&grid, &ctx.settings.heatmap, &path)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
        Command::Watch { out } => watch(init_context(&data_dir)?, out).await,
    }
}

async fn watch(ctx: AppContext, out: Option<PathBuf>) -> Result<(), String> {
    if ctx.coordinator.handle().is_none() {
        return Err("No handle stored; run `cfstats login <handle>` first".to_string());
    }

    let (tx, mut rx) = mpsc::channel(4);
    let mut scheduler = RefreshScheduler::new(ctx.coordinator.clone());
    scheduler.start(ctx.settings.refresh_interval, tx);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted; stopping scheduled refresh");
                break;
            }
            received = rx.recv() => {
                let Some(outcome) = received else { break };
                if let Err(err) = present(&ctx, &outcome, out.clone()) {
                    log::warn!("Could not render heat-map: {err}");
                }
            }
        }
    }

    scheduler.stop();
    Ok(())
}

fn present(ctx: &AppContext, outcome: &RefreshOutcome, out: Option<PathBuf>) -> Result<(), String> {
    let path = out.unwrap_or_else(|| default_output_path(&ctx.data_dir));
    write_heatmap(&outcome.grid, &ctx.settings.heatmap, &path)?;

    let note = match outcome.source {
        GridSource::Fresh => "",
        GridSource::Cached => " (offline, showing cached data)",
        GridSource::Empty => " (offline, no cached data)",
    };
    println!(
        "{}: {} accepted submissions in the last 25 weeks{note}; wrote {}",
        outcome.handle,
        outcome.grid.total(),
        path.display()
    );
    Ok(())
}
