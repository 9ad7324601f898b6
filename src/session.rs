//! Live mapping session (`start` command)
//!
//! One consumer drains the MIDI event channel in arrival order, runs each
//! message through the dispatcher and mirrors changed controller state to the
//! virtual gamepad.

use anyhow::{Context, Result};
use std::future::Future;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dispatcher::{DispatchReport, Dispatcher};
use crate::gamepad::VirtualGamepad;
use crate::input::{InputPort, PortSelector, RawEvent};

pub struct Session {
    dispatcher: Dispatcher,
    gamepad: Box<dyn VirtualGamepad>,
    processed: u64,
}

impl Session {
    pub fn new(dispatcher: Dispatcher, gamepad: Box<dyn VirtualGamepad>) -> Self {
        Self {
            dispatcher,
            gamepad,
            processed: 0,
        }
    }

    /// Process one incoming message
    ///
    /// Backend write failures are logged and do not stop the session.
    pub fn handle(&mut self, event: &RawEvent) -> DispatchReport {
        self.processed += 1;
        let Some(message) = event.message() else {
            return DispatchReport::default();
        };

        let (decoded, report) = self.dispatcher.on_raw(message);
        debug!("MIDI in: {}", decoded);

        if self.dispatcher.pad_mut().take_dirty() {
            if let Err(e) = self.gamepad.update(self.dispatcher.pad()) {
                warn!("Failed to update virtual gamepad: {}", e);
            }
        }
        report
    }

    /// Consume events until the channel closes or `shutdown` resolves
    pub async fn run(
        &mut self,
        mut events: mpsc::Receiver<RawEvent>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()> {
        self.gamepad
            .connect()
            .with_context(|| format!("Failed to connect {} gamepad", self.gamepad.name()))?;
        info!("Ready to process MIDI events!");

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        self.handle(&event);
                    }
                    None => {
                        info!("MIDI input closed");
                        break;
                    }
                },
                _ = &mut shutdown => {
                    info!("Shutdown signal received, stopping event loop");
                    break;
                }
            }
        }

        self.gamepad.disconnect();
        info!("Session ended after {} message(s)", self.processed);
        Ok(())
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }
}

/// Open the port, then map its messages onto `gamepad` until Ctrl+C
pub async fn run_live(selector: &PortSelector, gamepad: Box<dyn VirtualGamepad>) -> Result<()> {
    let (mut port, events) = InputPort::open(selector)
        .with_context(|| format!("Failed to open MIDI input {}", selector))?;

    let mut session = Session::new(Dispatcher::with_default_mapping(), gamepad);
    let result = session.run(events, shutdown_signal()).await;

    port.close();
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
