//! Stats aggregation: consumes semantic events, maintains the day-bucketed
//! counters and frequency tables, and persists them with debounced
//! write-back. [StatsModule] is the event-loop wrapper, [StatsAggregator]
//! the pure state underneath.

pub mod aggregator;
pub mod debounce;
pub mod entities;
pub mod store;

use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::{
    sync::{mpsc, oneshot},
    time::Instant,
};
use tracing::{debug, error, info};

use crate::{daemon::classify::classifier::InputAction, utils::clock::Clock};

use self::{
    aggregator::{Persist, StatsAggregator},
    debounce::SaveDebouncer,
    entities::{StatsDocument, StatsSnapshot},
    store::StatsStore,
};

/// Quiet window after the last mutation before a coalesced write happens.
pub const SAVE_DEBOUNCE_WINDOW: Duration = Duration::from_secs(1);

/// How often the calendar day is compared against the stored one.
pub const DAY_CHECK_INTERVAL: Duration = Duration::from_secs(60);

const COMMAND_BUFFER: usize = 4;

/// Control requests from consumers (tray, UI panel, tests). These are the
/// only operations exposed publicly besides the event stream itself.
pub enum StatsCommand {
    Query(oneshot::Sender<StatsSnapshot>),
    ResetToday(oneshot::Sender<()>),
}

/// Cloneable handle over the control channel. The IPC transport an external
/// UI would use is out of scope; this is the in-process seam it binds to.
#[derive(Clone)]
pub struct StatsHandle {
    commands: mpsc::Sender<StatsCommand>,
}

impl StatsHandle {
    pub fn channel() -> (Self, mpsc::Receiver<StatsCommand>) {
        let (sender, receiver) = mpsc::channel(COMMAND_BUFFER);
        (Self { commands: sender }, receiver)
    }

    pub async fn snapshot(&self) -> Result<StatsSnapshot> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(StatsCommand::Query(reply))
            .await
            .map_err(|_| anyhow!("Stats module is not running"))?;
        response
            .await
            .map_err(|_| anyhow!("Stats module dropped the query"))
    }

    pub async fn reset_today(&self) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(StatsCommand::ResetToday(reply))
            .await
            .map_err(|_| anyhow!("Stats module is not running"))?;
        response
            .await
            .map_err(|_| anyhow!("Stats module dropped the reset"))
    }
}

/// Event-loop owner of the aggregator. Everything here runs serially on the
/// daemon's single thread: actions, control commands, the day-check ticker
/// and the debounce deadline are all dispatched from one `select!`.
pub struct StatsModule<S: StatsStore> {
    actions: mpsc::Receiver<InputAction>,
    commands: mpsc::Receiver<StatsCommand>,
    commands_closed: bool,
    aggregator: StatsAggregator,
    store: S,
    debounce: SaveDebouncer,
    next_day_check: Instant,
    clock: Box<dyn Clock>,
}

impl<S: StatsStore> StatsModule<S> {
    /// Loads persisted state and prepares the module. A day boundary
    /// crossed while the process was down is handled right here, and both
    /// that and the one-time cumulative backfill persist before the loop
    /// starts. Load failures fall back to an empty document; a broken
    /// store must never prevent startup.
    pub async fn initialize(
        store: S,
        actions: mpsc::Receiver<InputAction>,
        commands: mpsc::Receiver<StatsCommand>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let document = match store.load().await {
            Ok(document) => document,
            Err(e) => {
                error!("Failed to load persisted stats, starting from defaults {e:?}");
                StatsDocument::default()
            }
        };

        let (mut aggregator, backfilled) = StatsAggregator::from_document(document);
        if backfilled {
            info!("Seeded cumulative key stats from the daily table");
        }
        let rolled = aggregator.check_day_change(clock.today()).is_some();

        let mut module = Self {
            actions,
            commands,
            commands_closed: false,
            aggregator,
            store,
            debounce: SaveDebouncer::new(SAVE_DEBOUNCE_WINDOW),
            next_day_check: clock.instant() + DAY_CHECK_INTERVAL,
            clock,
        };

        if backfilled || rolled {
            module.flush().await;
        }
        module
    }

    /// Executes the aggregation event loop. Ends when the classifier drops
    /// its sending side, flushing any pending debounced write so shutdown
    /// cannot lose the last second of activity.
    pub async fn run(mut self) -> Result<()> {
        loop {
            tokio::select! {
                action = self.actions.recv() => match action {
                    Some(action) => self.apply(action),
                    None => break,
                },
                // The arm is disabled once every handle has dropped, or a
                // closed channel would be ready on every iteration.
                command = self.commands.recv(), if !self.commands_closed => match command {
                    Some(command) => self.handle_command(command).await,
                    None => self.commands_closed = true,
                },
                _ = self.clock.sleep_until(self.next_day_check) => {
                    // Rebased from now, so time lost to a suspend is not
                    // replayed as a burst of back-to-back ticks.
                    self.next_day_check = self.clock.instant() + DAY_CHECK_INTERVAL;
                    if self.aggregator.check_day_change(self.clock.today()).is_some() {
                        info!("Day changed, archived previous day");
                        self.flush().await;
                    }
                },
                _ = self.debounce.expired(self.clock.as_ref()) => {
                    self.flush().await;
                },
            }
        }

        if self.debounce.is_armed() {
            self.flush().await;
        }
        Ok(())
    }

    fn apply(&mut self, action: InputAction) {
        debug!("Recording {:?}", action);
        match self.aggregator.record(action) {
            Some(Persist::Debounced) => self.debounce.schedule(self.clock.instant()),
            // record never requires an immediate write by itself
            Some(Persist::Immediate) | None => {}
        }
    }

    async fn handle_command(&mut self, command: StatsCommand) {
        match command {
            StatsCommand::Query(reply) => {
                let _ = reply.send(self.aggregator.snapshot());
            }
            StatsCommand::ResetToday(reply) => {
                let _ = self.aggregator.reset_today(self.clock.today());
                self.flush().await;
                let _ = reply.send(());
            }
        }
    }

    /// Synchronous write of the whole document, superseding any pending
    /// debounced save.
    async fn flush(&mut self) {
        self.debounce.cancel();
        if let Err(e) = self.store.save(&self.aggregator.document()).await {
            error!("Failed to persist stats {e:?}");
        }
    }
}
