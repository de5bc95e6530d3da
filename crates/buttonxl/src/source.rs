//! Input source abstraction
//!
//! Every button input boils down to one capability: read a boolean. The
//! [`BooleanSource`] trait captures it, and two provided implementations
//! cover the common cases:
//!
//! - [`PinSource`] - a hardware input pin (any [`embedded_hal::digital::InputPin`])
//! - [`VirtualInput`] - an in-memory cell standing in for a remote input
//!
//! Anything else that can produce a boolean (an I/O expander channel, a
//! matrix scan cell, a radio packet field) implements [`BooleanSource`]
//! directly.
//!
//! A [`Button`](crate::button::Button) stores its source behind the
//! [`Source`] tag so the virtual-only write path can be guarded at runtime.

use embedded_hal::digital::InputPin;

use crate::error::InputError;

/// Capability trait for anything a button can read its state from
///
/// `read` takes `&mut self` because hardware pin reads do in most HALs;
/// implementations must not carry any press/release history of their own.
/// Polarity is applied by the owning [`Button`](crate::button::Button),
/// so `read` reports the raw electrical level.
pub trait BooleanSource {
    /// Read the current raw value of this source
    fn read(&mut self) -> bool;
}

/// A hardware input pin as a boolean source
///
/// The pin must already be configured for input with the pull matching the
/// button polarity (pull-up for active-low wiring, pull-down for active-high).
/// Pull configuration is HAL-specific and happens where the pin driver is
/// created.
pub struct PinSource<P> {
    pin: P,
}

impl<P: InputPin> PinSource<P> {
    /// Wrap a configured input pin
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: InputPin> BooleanSource for PinSource<P> {
    fn read(&mut self) -> bool {
        // The embedded-hal read is fallible in the signature only; the pin
        // drivers this targets report Infallible.
        self.pin.is_high().unwrap_or(false)
    }
}

/// An in-memory boolean cell representing a remote or not-yet-wired input
///
/// Unlike hardware sources, a `VirtualInput` can be written, which is how
/// off-board inputs (e.g. values received over a radio link) are fed into a
/// [`Button`](crate::button::Button).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualInput {
    value: bool,
}

impl VirtualInput {
    /// Create a virtual input with the given initial raw value
    ///
    /// For active-low buttons the idle value is `true`.
    pub fn new(value: bool) -> Self {
        Self { value }
    }

    /// Set the raw value
    pub fn set(&mut self, value: bool) {
        self.value = value;
    }
}

impl BooleanSource for VirtualInput {
    fn read(&mut self) -> bool {
        self.value
    }
}

/// Placeholder source type for buttons that only ever use virtual inputs
///
/// Useful to pin down the source type parameter when no hardware source
/// exists, e.g. `Button::<NoSource>::virtual_input(true)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSource;

impl BooleanSource for NoSource {
    fn read(&mut self) -> bool {
        false
    }
}

/// Tagged storage for a button's input source
///
/// The tag is what lets [`set`](Source::set) reject writes to hardware-backed
/// sources at runtime instead of silently ignoring them.
pub enum Source<S> {
    /// Hardware-backed or externally supplied source
    External(S),
    /// In-memory virtual cell
    Virtual(VirtualInput),
}

impl<S: BooleanSource> Source<S> {
    /// Read the raw value of whichever variant is stored
    pub fn read(&mut self) -> bool {
        match self {
            Source::External(source) => source.read(),
            Source::Virtual(cell) => cell.read(),
        }
    }

    /// Whether this source is a writable virtual cell
    pub fn is_virtual(&self) -> bool {
        matches!(self, Source::Virtual(_))
    }

    /// Write the raw value of a virtual source
    ///
    /// # Errors
    ///
    /// Returns [`InputError::SourceNotVirtual`] for hardware-backed sources.
    pub fn set(&mut self, value: bool) -> Result<(), InputError> {
        match self {
            Source::External(_) => Err(InputError::SourceNotVirtual),
            Source::Virtual(cell) => {
                cell.set(value);
                Ok(())
            }
        }
    }
}
