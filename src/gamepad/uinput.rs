//! Linux uinput backend
//!
//! Creates a virtual device with the same buttons and axes the `xpad` driver
//! exposes for a wired Xbox 360 pad, so games treat it as one.

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{
    AbsInfo, AbsoluteAxisType, AttributeSet, BusType, EventType, InputEvent, InputId, Key,
    UinputAbsSetup,
};
use tracing::info;

use super::{stick_to_i16, trigger_to_u8, Axis, Button, GamepadState, VirtualGamepad};
use crate::error::GamepadError;

const DEVICE_NAME: &str = "Microsoft X-Box 360 pad (midi-pad)";
const VENDOR_MICROSOFT: u16 = 0x045e;
const PRODUCT_XBOX360: u16 = 0x028e;

const STICK_MIN: i32 = -32768;
const STICK_MAX: i32 = 32767;
const STICK_FUZZ: i32 = 16;
const STICK_FLAT: i32 = 128;
const TRIGGER_MAX: i32 = 255;

/// Buttons with a dedicated key code (the d-pad is reported on the hat axes)
fn key_for(button: Button) -> Option<Key> {
    match button {
        Button::A => Some(Key::BTN_SOUTH),
        Button::B => Some(Key::BTN_EAST),
        Button::X => Some(Key::BTN_NORTH),
        Button::Y => Some(Key::BTN_WEST),
        Button::LeftShoulder => Some(Key::BTN_TL),
        Button::RightShoulder => Some(Key::BTN_TR),
        Button::Back => Some(Key::BTN_SELECT),
        Button::Start => Some(Key::BTN_START),
        Button::Guide => Some(Key::BTN_MODE),
        Button::LeftThumb => Some(Key::BTN_THUMBL),
        Button::RightThumb => Some(Key::BTN_THUMBR),
        Button::DpadUp | Button::DpadDown | Button::DpadLeft | Button::DpadRight => None,
    }
}

fn abs_code(axis: Axis) -> AbsoluteAxisType {
    match axis {
        Axis::LeftX => AbsoluteAxisType::ABS_X,
        Axis::LeftY => AbsoluteAxisType::ABS_Y,
        Axis::RightX => AbsoluteAxisType::ABS_RX,
        Axis::RightY => AbsoluteAxisType::ABS_RY,
        Axis::LeftTrigger => AbsoluteAxisType::ABS_Z,
        Axis::RightTrigger => AbsoluteAxisType::ABS_RZ,
    }
}

/// evdev value for an axis; Y axes grow downwards on Linux
fn abs_value(axis: Axis, value: f32) -> i32 {
    match axis {
        Axis::LeftTrigger | Axis::RightTrigger => trigger_to_u8(value) as i32,
        Axis::LeftY | Axis::RightY => -(stick_to_i16(value) as i32),
        Axis::LeftX | Axis::RightX => stick_to_i16(value) as i32,
    }
}

fn hat_value(negative: bool, positive: bool) -> i32 {
    match (negative, positive) {
        (true, false) => -1,
        (false, true) => 1,
        _ => 0,
    }
}

/// Translate a full controller state into one evdev frame
fn frame(state: &GamepadState) -> Vec<InputEvent> {
    let mut events = Vec::with_capacity(19);

    for button in Button::ALL {
        if let Some(key) = key_for(button) {
            events.push(InputEvent::new(
                EventType::KEY,
                key.code(),
                state.button(button) as i32,
            ));
        }
    }

    for axis in Axis::ALL {
        events.push(InputEvent::new(
            EventType::ABSOLUTE,
            abs_code(axis).0,
            abs_value(axis, state.axis(axis)),
        ));
    }

    events.push(InputEvent::new(
        EventType::ABSOLUTE,
        AbsoluteAxisType::ABS_HAT0X.0,
        hat_value(state.button(Button::DpadLeft), state.button(Button::DpadRight)),
    ));
    events.push(InputEvent::new(
        EventType::ABSOLUTE,
        AbsoluteAxisType::ABS_HAT0Y.0,
        hat_value(state.button(Button::DpadUp), state.button(Button::DpadDown)),
    ));

    events
}

pub struct UinputGamepad {
    device: Option<VirtualDevice>,
}

impl UinputGamepad {
    pub fn new() -> Self {
        Self { device: None }
    }

    fn build_device() -> std::io::Result<VirtualDevice> {
        let mut keys = AttributeSet::<Key>::new();
        for key in Button::ALL.into_iter().filter_map(key_for) {
            keys.insert(key);
        }

        let mut builder = VirtualDeviceBuilder::new()?
            .name(DEVICE_NAME)
            .input_id(InputId::new(BusType::BUS_USB, VENDOR_MICROSOFT, PRODUCT_XBOX360, 0x0110))
            .with_keys(&keys)?;

        for axis in Axis::ALL {
            let info = if axis.is_trigger() {
                AbsInfo::new(0, 0, TRIGGER_MAX, 0, 0, 0)
            } else {
                AbsInfo::new(0, STICK_MIN, STICK_MAX, STICK_FUZZ, STICK_FLAT, 0)
            };
            builder = builder.with_absolute_axis(&UinputAbsSetup::new(abs_code(axis), info))?;
        }
        for hat in [AbsoluteAxisType::ABS_HAT0X, AbsoluteAxisType::ABS_HAT0Y] {
            builder = builder.with_absolute_axis(&UinputAbsSetup::new(hat, AbsInfo::new(0, -1, 1, 0, 0, 0)))?;
        }

        builder.build()
    }
}

impl Default for UinputGamepad {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualGamepad for UinputGamepad {
    fn name(&self) -> &str {
        "uinput"
    }

    fn connect(&mut self) -> Result<(), GamepadError> {
        if self.device.is_some() {
            return Ok(());
        }
        let device = Self::build_device()?;
        info!("Created uinput device '{}'", DEVICE_NAME);
        self.device = Some(device);
        Ok(())
    }

    fn update(&mut self, state: &GamepadState) -> Result<(), GamepadError> {
        let device = self.device.as_mut().ok_or(GamepadError::NotConnected)?;
        // emit() terminates the batch with SYN_REPORT
        device.emit(&frame(state))?;
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.device.take().is_some() {
            info!("Removed uinput device");
        }
    }
}
