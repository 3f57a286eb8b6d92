use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Result};
use classify::{classifier::InputAction, module::ClassifierModule};
use fs4::tokio::AsyncFileExt;
use stats::{store::JsonStatsStore, StatsCommand, StatsHandle, StatsModule};
use tokio::{fs::File, sync::mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::{
    input_api::{GenericInputHook, InputHook},
    utils::clock::{Clock, DefaultClock},
};

pub mod args;
pub mod classify;
pub mod shutdown;
pub mod stats;

pub const STORE_FILE: &str = "keystats-data.json";
const LOCK_FILE: &str = "daemon.lock";

const ACTION_BUFFER: usize = 10;
const SUMMARY_INTERVAL: Duration = Duration::from_secs(1);

/// Represents the starting point for the daemon
pub async fn start_daemon(dir: PathBuf) -> Result<()> {
    let _lock = acquire_instance_lock(&dir).await?;
    std::env::set_current_dir("/")?;

    let (action_sender, action_receiver) = mpsc::channel::<InputAction>(ACTION_BUFFER);
    let (handle, command_receiver) = StatsHandle::channel();
    let hook = GenericInputHook::new()?;

    let shutdown_token = CancellationToken::new();

    let classifier = create_classifier(hook, action_sender, &shutdown_token);

    let stats = create_stats_module(
        dir.join(STORE_FILE),
        action_receiver,
        command_receiver,
        DefaultClock,
    )
    .await?;

    let (_, _, classify_result, stats_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        publish_summaries(handle, shutdown_token.clone(), DefaultClock),
        classifier.run(),
        stats.run(),
    );

    if let Err(classify_result) = classify_result {
        error!("Classifier module got an error {:?}", classify_result);
    }

    if let Err(stats_result) = stats_result {
        error!("Stats module got an error {:?}", stats_result);
    }

    Ok(())
}

/// Holds an exclusive advisory lock for the lifetime of the daemon. A
/// second instance pointed at the same directory fails fast here instead of
/// fighting over the stats document.
async fn acquire_instance_lock(dir: &Path) -> Result<File> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(LOCK_FILE);
    let file = tokio::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(&path)
        .await?;
    if file.try_lock_exclusive().is_err() {
        bail!("Another daemon instance is already running (lock at {path:?})");
    }
    Ok(file)
}

fn create_classifier(
    hook: impl InputHook + 'static,
    sender: mpsc::Sender<InputAction>,
    shutdown_token: &CancellationToken,
) -> ClassifierModule {
    ClassifierModule::new(Box::new(hook), sender, shutdown_token.clone())
}

async fn create_stats_module(
    store_path: PathBuf,
    actions: mpsc::Receiver<InputAction>,
    commands: mpsc::Receiver<StatsCommand>,
    clock: impl Clock,
) -> Result<StatsModule<JsonStatsStore>> {
    let store = JsonStatsStore::new(store_path)?;
    Ok(StatsModule::initialize(store, actions, commands, Box::new(clock)).await)
}

/// Periodically logs a one-line summary of the day so far. An attached UI
/// would subscribe to the same [StatsHandle] this loop queries.
async fn publish_summaries(
    handle: StatsHandle,
    shutdown_token: CancellationToken,
    clock: impl Clock,
) {
    loop {
        tokio::select! {
            _ = shutdown_token.cancelled() => break,
            _ = clock.sleep(SUMMARY_INTERVAL) => {
                match handle.snapshot().await {
                    Ok(snapshot) => debug!(
                        "Today: {} keys, {} clicks, {:.0} px moved",
                        snapshot.today_stats.key_strokes,
                        snapshot.today_stats.left_clicks + snapshot.today_stats.right_clicks,
                        snapshot.today_stats.mouse_distance,
                    ),
                    Err(_) => break,
                }
            }
        }
    }
}
