//! The kiln runner binary.

use std::path::Path;
use std::process::ExitCode;

use kiln::{KilnServer, logger};

const CONFIG_PATH: &str = "config/kiln.json5";
const SNAPSHOT_PATH: &str = "world/snapshot.json";

fn main() -> ExitCode {
    if let Err(err) = logger::init() {
        eprintln!("Failed to set up logging: {err}");
        return ExitCode::FAILURE;
    }

    // One thread: the world is bound to the thread that first ticks it.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            log::error!("Failed to build the tokio runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let mut server = KilnServer::new(Path::new(CONFIG_PATH), Path::new(SNAPSHOT_PATH))?;

    let cancel_token = server.cancel_token.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            log::warn!("Failed to listen for interrupts: {err}");
            return;
        }
        log::info!("Received interrupt, shutting down");
        cancel_token.cancel();
    });

    server.run().await
}
