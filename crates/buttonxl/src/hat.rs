//! Hat switch: four directional buttons folded into one discrete position

use crate::button::Button;
use crate::error::InputError;
use crate::source::BooleanSource;

/// Discrete hat switch position
///
/// Encoded 0-7 clockwise from up, with 8 for the idle (centered) state,
/// which is the conventional HID hat switch encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HatPosition {
    Up = 0,
    UpRight = 1,
    Right = 2,
    DownRight = 3,
    Down = 4,
    DownLeft = 5,
    Left = 6,
    UpLeft = 7,
    Idle = 8,
}

impl HatPosition {
    /// The wire encoding of this position
    pub fn index(self) -> u8 {
        self as u8
    }
}

/// Four directional buttons composed into a 9-position hat switch
///
/// The hat owns its buttons; all four share the hat's polarity. Like
/// [`Button::poll`](crate::button::Button::poll), [`poll`](Hat::poll) must be
/// called once per update cycle because it advances the edge history of every
/// child button.
///
/// ## Simultaneous directions
///
/// Diagonal pairs win over single directions. When opposing directions are
/// active at the same time (mechanically possible with four discrete
/// switches), resolution falls through the cardinal checks in a fixed
/// up, down, left, right order; up+down therefore reads as [`HatPosition::Up`].
/// This precedence is arbitrary but stable.
pub struct Hat<S> {
    up: Button<S>,
    down: Button<S>,
    left: Button<S>,
    right: Button<S>,
    active_low: bool,
    value: HatPosition,
    /// When `true`, the hat always reads as [`HatPosition::Idle`]
    pub bypass: bool,
}

impl<S: BooleanSource> Hat<S> {
    /// Create a hat from four directional sources sharing one polarity
    pub fn new(up: S, down: S, left: S, right: S, active_low: bool) -> Self {
        Self {
            up: Button::new(up, active_low),
            down: Button::new(down, active_low),
            left: Button::new(left, active_low),
            right: Button::new(right, active_low),
            active_low,
            value: HatPosition::Idle,
            bypass: false,
        }
    }

    /// Create a hat whose four buttons are all writable virtual inputs
    ///
    /// This is the form [`unpack_source_values`](Hat::unpack_source_values)
    /// expects, used when the directional states arrive from somewhere else
    /// (e.g. a radio link).
    pub fn virtual_input(active_low: bool) -> Self {
        Self {
            up: Button::virtual_input(active_low),
            down: Button::virtual_input(active_low),
            left: Button::virtual_input(active_low),
            right: Button::virtual_input(active_low),
            active_low,
            value: HatPosition::Idle,
            bypass: false,
        }
    }

    /// Read the hat position and advance all four buttons' edge history
    ///
    /// Children are polled even when bypassed so their histories keep
    /// tracking the electrical state.
    pub fn poll(&mut self) -> HatPosition {
        let up = self.up.poll();
        let down = self.down.poll();
        let left = self.left.poll();
        let right = self.right.poll();

        self.value = if self.bypass {
            HatPosition::Idle
        } else if up && right {
            HatPosition::UpRight
        } else if up && left {
            HatPosition::UpLeft
        } else if down && right {
            HatPosition::DownRight
        } else if down && left {
            HatPosition::DownLeft
        } else if up {
            HatPosition::Up
        } else if down {
            HatPosition::Down
        } else if left {
            HatPosition::Left
        } else if right {
            HatPosition::Right
        } else {
            HatPosition::Idle
        };
        self.value
    }

    /// The position computed by the last [`poll`](Hat::poll)
    pub fn value(&self) -> HatPosition {
        self.value
    }

    /// The shared polarity of the four directional buttons
    pub fn active_low(&self) -> bool {
        self.active_low
    }

    /// Raw electrical readings packed as `(R << 3) | (L << 2) | (D << 1) | U`
    ///
    /// Does not advance any edge history.
    pub fn packed_source_values(&mut self) -> u8 {
        u8::from(self.up.source_value())
            | u8::from(self.down.source_value()) << 1
            | u8::from(self.left.source_value()) << 2
            | u8::from(self.right.source_value()) << 3
    }

    /// Write all four raw values from a [`packed_source_values`](Hat::packed_source_values) byte
    ///
    /// # Errors
    ///
    /// Returns [`InputError::SourceNotVirtual`] unless all four buttons are
    /// virtual; no value is written in that case.
    pub fn unpack_source_values(&mut self, packed: u8) -> Result<(), InputError> {
        if !(self.up.is_virtual()
            && self.down.is_virtual()
            && self.left.is_virtual()
            && self.right.is_virtual())
        {
            return Err(InputError::SourceNotVirtual);
        }
        self.up.set_source_value(packed & 0x01 != 0)?;
        self.down.set_source_value(packed & 0x02 != 0)?;
        self.left.set_source_value(packed & 0x04 != 0)?;
        self.right.set_source_value(packed & 0x08 != 0)?;
        Ok(())
    }

    /// The up button
    pub fn up(&self) -> &Button<S> {
        &self.up
    }

    /// The down button
    pub fn down(&self) -> &Button<S> {
        &self.down
    }

    /// The left button
    pub fn left(&self) -> &Button<S> {
        &self.left
    }

    /// The right button
    pub fn right(&self) -> &Button<S> {
        &self.right
    }
}
