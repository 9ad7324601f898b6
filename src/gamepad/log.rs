//! Logging gamepad backend
//!
//! Accepts every update and reports it through tracing. Used when no virtual
//! controller driver is available, and as the backend in tests.

use tracing::{debug, info};

use super::{GamepadState, VirtualGamepad};
use crate::error::GamepadError;

#[derive(Debug, Default)]
pub struct LogGamepad {
    connected: bool,
    updates: usize,
    last: Option<GamepadState>,
}

impl LogGamepad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Number of states pushed since creation
    pub fn updates(&self) -> usize {
        self.updates
    }

    /// Most recently pushed state
    pub fn last(&self) -> Option<&GamepadState> {
        self.last.as_ref()
    }
}

impl VirtualGamepad for LogGamepad {
    fn name(&self) -> &str {
        "log"
    }

    fn connect(&mut self) -> Result<(), GamepadError> {
        self.connected = true;
        info!("Log gamepad connected");
        Ok(())
    }

    fn update(&mut self, state: &GamepadState) -> Result<(), GamepadError> {
        if !self.connected {
            return Err(GamepadError::NotConnected);
        }
        self.updates += 1;
        self.last = Some(state.clone());
        debug!("🎮 {}", state);
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.connected {
            info!("Log gamepad disconnected");
        }
        self.connected = false;
    }
}
