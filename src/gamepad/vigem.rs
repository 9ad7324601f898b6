//! Windows ViGEmBus backend
//!
//! Plugs a wired Xbox 360 target into the ViGEmBus driver and forwards each
//! state as an XInput-shaped report.

use tracing::{info, warn};
use vigem_client::{Client, TargetId, XButtons, XGamepad, Xbox360Wired};

use super::{stick_to_i16, trigger_to_u8, Axis, GamepadState, VirtualGamepad};
use crate::error::GamepadError;

fn driver_error(e: vigem_client::Error) -> GamepadError {
    GamepadError::Driver(e.to_string())
}

fn report(state: &GamepadState) -> XGamepad {
    XGamepad {
        buttons: XButtons { raw: state.buttons_mask() },
        left_trigger: trigger_to_u8(state.axis(Axis::LeftTrigger)),
        right_trigger: trigger_to_u8(state.axis(Axis::RightTrigger)),
        thumb_lx: stick_to_i16(state.axis(Axis::LeftX)),
        thumb_ly: stick_to_i16(state.axis(Axis::LeftY)),
        thumb_rx: stick_to_i16(state.axis(Axis::RightX)),
        thumb_ry: stick_to_i16(state.axis(Axis::RightY)),
    }
}

pub struct VigemGamepad {
    target: Option<Xbox360Wired<Client>>,
}

impl VigemGamepad {
    pub fn new() -> Self {
        Self { target: None }
    }
}

impl Default for VigemGamepad {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualGamepad for VigemGamepad {
    fn name(&self) -> &str {
        "vigem"
    }

    fn connect(&mut self) -> Result<(), GamepadError> {
        if self.target.is_some() {
            return Ok(());
        }
        let client = Client::connect().map_err(driver_error)?;
        let mut target = Xbox360Wired::new(client, TargetId::XBOX360_WIRED);
        target.plugin().map_err(driver_error)?;
        target.wait_ready().map_err(driver_error)?;
        info!("ViGEm Xbox 360 target plugged in");
        self.target = Some(target);
        Ok(())
    }

    fn update(&mut self, state: &GamepadState) -> Result<(), GamepadError> {
        let target = self.target.as_mut().ok_or(GamepadError::NotConnected)?;
        target.update(&report(state)).map_err(driver_error)
    }

    fn disconnect(&mut self) {
        if let Some(mut target) = self.target.take() {
            if let Err(e) = target.unplug() {
                warn!("Failed to unplug ViGEm target: {}", e);
            } else {
                info!("ViGEm target unplugged");
            }
        }
    }
}
