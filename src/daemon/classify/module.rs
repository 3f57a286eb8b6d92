use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::input_api::{InputHook, RawInputEvent};

use super::classifier::{EventClassifier, InputAction};

/// Size of the raw event buffer between the hook callback and the
/// classifier. The hook drops events when this overflows.
const RAW_EVENT_BUFFER: usize = 256;

/// Owns the platform hook and the classifier state, bridging raw events to
/// semantic [InputAction]s for the stats module.
pub struct ClassifierModule {
    hook: Box<dyn InputHook>,
    next: mpsc::Sender<InputAction>,
    classifier: EventClassifier,
    shutdown: CancellationToken,
}

impl ClassifierModule {
    pub fn new(
        hook: Box<dyn InputHook>,
        next: mpsc::Sender<InputAction>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            hook,
            next,
            classifier: EventClassifier::new(),
            shutdown,
        }
    }

    /// Executes the classification event loop until shutdown. The hook is
    /// always stopped before returning so a pending save downstream isn't
    /// raced by late events.
    pub async fn run(mut self) -> Result<()> {
        let (raw_sender, mut raw_receiver) = mpsc::channel::<RawInputEvent>(RAW_EVENT_BUFFER);

        // Keep a sender clone so a failed hook start doesn't close the
        // channel and end the loop: the daemon continues running without
        // input tracking rather than crashing.
        let _keep_open = raw_sender.clone();
        if let Err(e) = self.hook.start(raw_sender) {
            error!("Failed to start the input hook, continuing without input tracking {e:?}");
        }

        loop {
            tokio::select! {
                // Cancelation means we stop the event loop. Dropping the
                // action sender in turn lets the stats module drain and
                // flush.
                _ = self.shutdown.cancelled() => break,
                event = raw_receiver.recv() => match event {
                    Some(event) => {
                        if let Some(action) = self.classifier.classify(event) {
                            debug!("Classified {:?}", action);
                            self.next
                                .send(action)
                                .await
                                .inspect_err(|e| error!("Unexpected error during sending {e:?}"))?;
                        }
                    }
                    None => break,
                },
            }
        }

        if let Err(e) = self.hook.stop() {
            error!("Failed to stop the input hook {e:?}");
        } else {
            info!("Input hook stopped");
        }
        Ok(())
    }
}
