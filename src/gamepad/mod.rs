//! Virtual Xbox 360 controller
//!
//! [`GamepadState`] is the handle the mapping core writes into. A
//! [`VirtualGamepad`] backend pushes that state to the operating system:
//! uinput on Linux, ViGEmBus on Windows, or a logging sink anywhere.

pub mod log;
#[cfg(target_os = "linux")]
pub mod uinput;
#[cfg(windows)]
pub mod vigem;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use crate::error::GamepadError;

pub use self::log::LogGamepad;

/// XInput button bit flags
pub mod button_flags {
    pub const DPAD_UP: u16 = 0x0001;
    pub const DPAD_DOWN: u16 = 0x0002;
    pub const DPAD_LEFT: u16 = 0x0004;
    pub const DPAD_RIGHT: u16 = 0x0008;
    pub const START: u16 = 0x0010;
    pub const BACK: u16 = 0x0020;
    pub const LEFT_THUMB: u16 = 0x0040;
    pub const RIGHT_THUMB: u16 = 0x0080;
    pub const LEFT_SHOULDER: u16 = 0x0100;
    pub const RIGHT_SHOULDER: u16 = 0x0200;
    pub const GUIDE: u16 = 0x0400;
    pub const A: u16 = 0x1000;
    pub const B: u16 = 0x2000;
    pub const X: u16 = 0x4000;
    pub const Y: u16 = 0x8000;
}

/// Xbox 360 buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    A,
    B,
    X,
    Y,
    Start,
    Back,
    Guide,
    LeftShoulder,
    RightShoulder,
    LeftThumb,
    RightThumb,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
}

impl Button {
    pub const ALL: [Button; 15] = [
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::Start,
        Button::Back,
        Button::Guide,
        Button::LeftShoulder,
        Button::RightShoulder,
        Button::LeftThumb,
        Button::RightThumb,
        Button::DpadUp,
        Button::DpadDown,
        Button::DpadLeft,
        Button::DpadRight,
    ];

    /// XInput `wButtons` bit for this button
    pub fn flag(self) -> u16 {
        match self {
            Button::A => button_flags::A,
            Button::B => button_flags::B,
            Button::X => button_flags::X,
            Button::Y => button_flags::Y,
            Button::Start => button_flags::START,
            Button::Back => button_flags::BACK,
            Button::Guide => button_flags::GUIDE,
            Button::LeftShoulder => button_flags::LEFT_SHOULDER,
            Button::RightShoulder => button_flags::RIGHT_SHOULDER,
            Button::LeftThumb => button_flags::LEFT_THUMB,
            Button::RightThumb => button_flags::RIGHT_THUMB,
            Button::DpadUp => button_flags::DPAD_UP,
            Button::DpadDown => button_flags::DPAD_DOWN,
            Button::DpadLeft => button_flags::DPAD_LEFT,
            Button::DpadRight => button_flags::DPAD_RIGHT,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Button::A => "A",
            Button::B => "B",
            Button::X => "X",
            Button::Y => "Y",
            Button::Start => "START",
            Button::Back => "BACK",
            Button::Guide => "GUIDE",
            Button::LeftShoulder => "LEFT_SHOULDER",
            Button::RightShoulder => "RIGHT_SHOULDER",
            Button::LeftThumb => "LEFT_THUMB",
            Button::RightThumb => "RIGHT_THUMB",
            Button::DpadUp => "DPAD_UP",
            Button::DpadDown => "DPAD_DOWN",
            Button::DpadLeft => "DPAD_LEFT",
            Button::DpadRight => "DPAD_RIGHT",
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Analog axes: sticks span [-1, 1], triggers [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    LeftX = 0,
    LeftY = 1,
    RightX = 2,
    RightY = 3,
    LeftTrigger = 4,
    RightTrigger = 5,
}

impl Axis {
    pub const ALL: [Axis; 6] = [
        Axis::LeftX,
        Axis::LeftY,
        Axis::RightX,
        Axis::RightY,
        Axis::LeftTrigger,
        Axis::RightTrigger,
    ];

    pub fn is_trigger(self) -> bool {
        matches!(self, Axis::LeftTrigger | Axis::RightTrigger)
    }

    /// Inclusive value range
    pub fn range(self) -> (f32, f32) {
        if self.is_trigger() {
            (0.0, 1.0)
        } else {
            (-1.0, 1.0)
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::LeftX => "leftX",
            Axis::LeftY => "leftY",
            Axis::RightX => "rightX",
            Axis::RightY => "rightY",
            Axis::LeftTrigger => "leftTrigger",
            Axis::RightTrigger => "rightTrigger",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// In-memory controller state
///
/// Writes are clamped to each axis range; non-finite values are dropped.
/// `dirty` tracks whether anything changed since the last `take_dirty`.
#[derive(Debug, Clone, Default)]
pub struct GamepadState {
    buttons: u16,
    axes: [f32; 6],
    dirty: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        let before = self.buttons;
        if pressed {
            self.buttons |= button.flag();
        } else {
            self.buttons &= !button.flag();
        }
        self.dirty |= before != self.buttons;
    }

    pub fn button(&self, button: Button) -> bool {
        self.buttons & button.flag() != 0
    }

    pub fn set_axis(&mut self, axis: Axis, value: f32) {
        if !value.is_finite() {
            return;
        }
        let (min, max) = axis.range();
        let value = value.clamp(min, max);
        let slot = &mut self.axes[axis as usize];
        if *slot != value {
            *slot = value;
            self.dirty = true;
        }
    }

    pub fn axis(&self, axis: Axis) -> f32 {
        self.axes[axis as usize]
    }

    /// Pressed buttons as an XInput `wButtons` mask
    pub fn buttons_mask(&self) -> u16 {
        self.buttons
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Return and clear the changed flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

impl fmt::Display for GamepadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buttons={:#06x}", self.buttons)?;
        for axis in Axis::ALL {
            write!(f, " {}={:.3}", axis, self.axis(axis))?;
        }
        Ok(())
    }
}

/// Scale a stick value in [-1, 1] to a signed 16-bit report value
pub fn stick_to_i16(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

/// Scale a trigger value in [0, 1] to an 8-bit report value
pub fn trigger_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * u8::MAX as f32).round() as u8
}

/// Output device that mirrors a [`GamepadState`] to the OS
pub trait VirtualGamepad {
    fn name(&self) -> &str;

    /// Plug the virtual controller in
    fn connect(&mut self) -> Result<(), GamepadError>;

    /// Push the full controller state
    fn update(&mut self, state: &GamepadState) -> Result<(), GamepadError>;

    /// Unplug; safe to call when not connected
    fn disconnect(&mut self);
}

/// Selectable gamepad backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Platform default (uinput on Linux, ViGEm on Windows, log elsewhere)
    #[default]
    Auto,
    /// Log state changes only
    Log,
    /// Linux uinput device
    Uinput,
    /// Windows ViGEmBus Xbox 360 target
    Vigem,
}

/// Instantiate a backend; the caller connects it
pub fn open_backend(kind: BackendKind) -> Result<Box<dyn VirtualGamepad>, GamepadError> {
    let backend: Box<dyn VirtualGamepad> = match kind {
        BackendKind::Log => Box::new(LogGamepad::new()),
        BackendKind::Auto => platform_backend(),
        BackendKind::Uinput => uinput_backend()?,
        BackendKind::Vigem => vigem_backend()?,
    };
    info!("Using gamepad backend: {}", backend.name());
    Ok(backend)
}

#[cfg(target_os = "linux")]
fn platform_backend() -> Box<dyn VirtualGamepad> {
    Box::new(uinput::UinputGamepad::new())
}

#[cfg(windows)]
fn platform_backend() -> Box<dyn VirtualGamepad> {
    Box::new(vigem::VigemGamepad::new())
}

#[cfg(not(any(target_os = "linux", windows)))]
fn platform_backend() -> Box<dyn VirtualGamepad> {
    Box::new(LogGamepad::new())
}

#[cfg(target_os = "linux")]
fn uinput_backend() -> Result<Box<dyn VirtualGamepad>, GamepadError> {
    Ok(Box::new(uinput::UinputGamepad::new()))
}

#[cfg(not(target_os = "linux"))]
fn uinput_backend() -> Result<Box<dyn VirtualGamepad>, GamepadError> {
    Err(GamepadError::Unsupported("uinput"))
}

#[cfg(windows)]
fn vigem_backend() -> Result<Box<dyn VirtualGamepad>, GamepadError> {
    Ok(Box::new(vigem::VigemGamepad::new()))
}

#[cfg(not(windows))]
fn vigem_backend() -> Result<Box<dyn VirtualGamepad>, GamepadError> {
    Err(GamepadError::Unsupported("vigem"))
}
