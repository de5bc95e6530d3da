//! Button input processing: polarity, edge history, bypass

use embedded_hal::digital::InputPin;

use crate::error::InputError;
use crate::source::{BooleanSource, PinSource, Source, VirtualInput};

/// Source storage and value processing for one button input
///
/// A `Button` owns its [`Source`], applies active-low inversion and tracks
/// the previous and current logical state so that press/release *events* can
/// be derived from consecutive [`poll`](Button::poll) calls.
///
/// ## Polling contract
///
/// [`poll`](Button::poll) is the only operation that advances the edge
/// history and must be called exactly once per update cycle. All other
/// accessors are side-effect free. A session created through
/// [`Session::add_input`](crate::session::Session::add_input) takes care of
/// this; code that also needs the live state inside the loop should use
/// [`is_pressed`](Button::is_pressed) or [`is_released`](Button::is_released)
/// instead of a second `poll`.
pub struct Button<S> {
    source: Source<S>,
    active_low: bool,
    state: bool,
    last_state: bool,
    /// When `true`, the processed value always reads as released
    ///
    /// The true electrical state stays visible through
    /// [`is_pressed`](Button::is_pressed) and
    /// [`source_value`](Button::source_value).
    pub bypass: bool,
}

impl<S: BooleanSource> Button<S> {
    /// Create a button from a hardware-backed or externally supplied source
    ///
    /// `active_low` must match the wiring: `true` when the pin reads low
    /// while the button is held (pull-up wiring), `false` otherwise.
    pub fn new(source: S, active_low: bool) -> Self {
        Self {
            source: Source::External(source),
            active_low,
            state: false,
            last_state: false,
            bypass: false,
        }
    }

    /// Create a button backed by a writable [`VirtualInput`]
    ///
    /// The cell starts at the idle level for the given polarity.
    pub fn virtual_input(active_low: bool) -> Self {
        Self {
            source: Source::Virtual(VirtualInput::new(active_low)),
            active_low,
            state: false,
            last_state: false,
            bypass: false,
        }
    }

    /// Read the processed value and advance the edge history
    ///
    /// Shifts the stored state pair, so
    /// [`was_pressed`](Button::was_pressed)/[`was_released`](Button::was_released)
    /// are only reliable when this is called once per update cycle.
    ///
    /// Returns `true` if pressed; bypassed buttons always return `false`.
    pub fn poll(&mut self) -> bool {
        self.last_state = self.state;
        self.state = self.source.read() != self.active_low;
        self.state && !self.bypass
    }

    /// Whether the button is electrically in the pressed state right now
    ///
    /// Does not touch the edge history; safe to call any number of times.
    pub fn is_pressed(&mut self) -> bool {
        self.source.read() != self.active_low
    }

    /// Whether the button is electrically in the released state right now
    pub fn is_released(&mut self) -> bool {
        !self.is_pressed()
    }

    /// Whether the state changed released -> pressed between the last two
    /// [`poll`](Button::poll) calls
    pub fn was_pressed(&self) -> bool {
        self.state && !self.last_state
    }

    /// Whether the state changed pressed -> released between the last two
    /// [`poll`](Button::poll) calls
    pub fn was_released(&self) -> bool {
        !self.state && self.last_state
    }

    /// Raw source value, ignoring polarity and bypass
    pub fn source_value(&mut self) -> bool {
        self.source.read()
    }

    /// Write the raw source value of a virtual-input button
    ///
    /// # Errors
    ///
    /// Returns [`InputError::SourceNotVirtual`] for hardware-backed buttons.
    pub fn set_source_value(&mut self, value: bool) -> Result<(), InputError> {
        self.source.set(value)
    }

    /// The configured polarity
    pub fn active_low(&self) -> bool {
        self.active_low
    }

    /// Whether this button is backed by a writable virtual input
    pub fn is_virtual(&self) -> bool {
        self.source.is_virtual()
    }
}

impl<P: InputPin> Button<PinSource<P>> {
    /// Create a button from a configured input pin
    ///
    /// The pin's pull must already match `active_low` (pull-up for
    /// active-low wiring, pull-down for active-high).
    pub fn from_pin(pin: P, active_low: bool) -> Self {
        Self::new(PinSource::new(pin), active_low)
    }
}
