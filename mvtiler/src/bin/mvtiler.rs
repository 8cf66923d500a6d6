use std::env;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use mvtiler::MvtilerResult;
use mvtiler::config::args::Args;
use mvtiler::config::file::{Config, read_config};
use mvtiler::inspect::inspect_file;
use mvtiler::logging::{ensure_library_log_levels_match, init_tracing};
use mvtiler::tiler::run;
use tokio::signal::ctrl_c;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const VERSION: &str = env!("CARGO_PKG_VERSION");

async fn start(args: Args) -> MvtilerResult<()> {
    info!("mvtiler vector tile generator v{VERSION}");

    if let Some(tile_file) = &args.meta.inspect {
        return inspect(tile_file);
    }

    let save_config = args.meta.save_config.clone();
    let mut config = if let Some(ref cfg_filename) = args.meta.config {
        info!("Using {}", cfg_filename.display());
        read_config(cfg_filename)?
    } else {
        Config::default()
    };
    args.merge_into_config(&mut config);
    let job = config.finalize()?;

    if let Some(file_name) = save_config {
        config.save_to_file(file_name.as_path())?;
    } else {
        info!("Use --save-config to save or print configuration.");
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing the tiles in progress. Press Ctrl-C again to abort");
            on_interrupt.cancel();
            if ctrl_c().await.is_ok() {
                exit(130);
            }
        }
    });

    let outcome = run(job, cancel).await?;
    if outcome.is_cancelled() {
        exit(130);
    }
    Ok(())
}

fn inspect(tile_file: &Path) -> MvtilerResult<()> {
    let summary = inspect_file(tile_file)?;
    println!("{}: {summary}", tile_file.display());
    Ok(())
}

#[tokio::main]
async fn main() {
    let filter = ensure_library_log_levels_match(env::var("RUST_LOG").ok(), "mvtiler=");
    init_tracing(&filter, env::var("MVTILER_LOG_FORMAT").ok());

    let args = Args::parse();
    if let Err(e) = start(args).await {
        error!("{e}");
        exit(1);
    }
}
