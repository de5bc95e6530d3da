//! GPIO-button USB HID device core.
//!
//! Turns a handful of physical buttons (and optionally hat switches) into a
//! USB HID telephony/button-array device: raw boolean sources are read,
//! debounced into press/release edges, bit-packed into a report buffer that
//! matches the generated HID report descriptor, and transmitted only when
//! the packed state actually changed.
//!
//! The USB stack itself stays outside this crate, behind the
//! [`HidTransport`]/[`HidBus`] traits; hardware pins come in through
//! `embedded-hal` [`InputPin`](embedded_hal::digital::InputPin)s. That keeps
//! the whole pipeline host-testable with virtual inputs and an in-memory
//! transport.
//!
//! ## Typical flow
//!
//! 1. At boot, [`ReportDescriptor::build`] produces the descriptor, the
//!    platform registers it (see [`DeviceRegistration`]) and persists the
//!    geometry line ([`DeviceParams::boot_line`]).
//! 2. At startup, [`DeviceParams::from_boot_log`] recovers the geometry and
//!    [`Session::open`] binds the transport.
//! 3. Buttons are registered with [`Session::add_input`]; the main loop
//!    calls [`Session::update`] once per cycle.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::unreachable,
        clippy::unwrap_used
    )
)]

extern crate alloc;

pub mod button;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod hat;
pub mod session;
pub mod source;
pub mod transport;

pub use button::Button;
pub use config::{DeviceParams, BOOT_CONFIG_MARKER};
pub use descriptor::{
    ReportDescriptor, MAX_BUTTONS, MAX_REPORT_LENGTH, TELEPHONY_HEADSET_DESCRIPTOR,
    USAGE_HEADSET, USAGE_PAGE_TELEPHONY,
};
pub use error::{ConfigError, DescriptorError, Error, InputError};
pub use hat::{Hat, HatPosition};
pub use session::Session;
pub use source::{BooleanSource, NoSource, PinSource, Source, VirtualInput};
pub use transport::{DeviceRegistration, HidBus, HidTransport};
