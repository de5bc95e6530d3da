//! Error types for the library
//!
//! Input-side, descriptor and configuration errors are plain enums; runtime
//! session errors ([`Error`]) are generic over the transport so the underlying
//! send error stays matchable.
//!
//! ## Error Types
//!
//! - [`InputError`] - Misuse of an input source variant
//! - [`DescriptorError`] - Errors during report descriptor construction
//! - [`ConfigError`] - Missing or malformed persisted configuration
//! - [`Error`] - Runtime errors during session operations
//!
//! ## Example
//!
//! ```
//! use buttonxl::{DescriptorError, ReportDescriptor};
//!
//! // Button count outside 0..=128
//! let result = ReportDescriptor::build(200, 0x0b);
//! assert!(matches!(
//!     result,
//!     Err(DescriptorError::InvalidButtonCount { count: 200 })
//! ));
//! ```

use crate::transport::HidTransport;

/// Errors caused by using an input source the wrong way
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    /// The raw value of a hardware-backed source cannot be written
    ///
    /// Only [`VirtualInput`](crate::source::VirtualInput) sources accept
    /// manual writes; hardware pins reflect electrical state.
    SourceNotVirtual,
}

impl core::fmt::Display for InputError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            InputError::SourceNotVirtual => {
                write!(f, "Only virtual input source values can be set manually")
            }
        }
    }
}

impl core::error::Error for InputError {}

/// Errors that can occur when building a report descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorError {
    /// Button count outside the supported range
    ///
    /// See [`MAX_BUTTONS`](crate::descriptor::MAX_BUTTONS).
    InvalidButtonCount {
        /// Number of buttons requested
        count: u8,
    },
}

impl core::fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DescriptorError::InvalidButtonCount { count } => {
                write!(f, "Button count must be from 0-128, got {count}")
            }
        }
    }
}

impl core::error::Error for DescriptorError {}

/// Errors in the persisted device configuration
///
/// These surface when the boot-time configuration line is read back at
/// session construction. All of them are fatal; a session cannot size its
/// report buffers without valid parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No line containing the configuration marker was found
    Missing,
    /// Configuration did not carry two integers, or declares fewer report
    /// bytes than the button count needs
    Malformed,
    /// Configuration declares a zero-byte report
    ZeroReportLength,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::Missing => write!(f, "Device configuration not found"),
            ConfigError::Malformed => write!(f, "Device configuration is malformed"),
            ConfigError::ZeroReportLength => {
                write!(f, "Device configuration declares a zero-length report")
            }
        }
    }
}

impl core::error::Error for ConfigError {}

/// Errors that can occur while operating a device session
///
/// Generic over the transport type to preserve the specific send error type.
pub enum Error<T: HidTransport> {
    /// Report transmission failed
    ///
    /// Wraps the underlying error from the [`HidTransport`] implementation.
    Transport(T::Error),
    /// No transport endpoint matched the device identity, even after the
    /// single startup retry
    DeviceNotFound,
    /// Registering another button would exceed the configured button count
    CapacityExceeded {
        /// Configured button capacity
        capacity: u8,
    },
    /// A button operation was attempted with zero buttons configured
    NoButtonsConfigured,
    /// Button index outside `0..button_count`
    ButtonOutOfRange {
        /// The 0-based index that was supplied
        index: usize,
        /// Configured button count
        count: u8,
    },
}

// Manual impl: the derive would bound `T: Debug`, but only the send error
// is ever formatted and the trait already requires `T::Error: Debug`.
impl<T: HidTransport> core::fmt::Debug for Error<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Transport(err) => f.debug_tuple("Transport").field(err).finish(),
            Error::DeviceNotFound => write!(f, "DeviceNotFound"),
            Error::CapacityExceeded { capacity } => f
                .debug_struct("CapacityExceeded")
                .field("capacity", capacity)
                .finish(),
            Error::NoButtonsConfigured => write!(f, "NoButtonsConfigured"),
            Error::ButtonOutOfRange { index, count } => f
                .debug_struct("ButtonOutOfRange")
                .field("index", index)
                .field("count", count)
                .finish(),
        }
    }
}

impl<T: HidTransport> core::fmt::Display for Error<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Transport(_) => write!(f, "Transport error"),
            Error::DeviceNotFound => {
                write!(f, "Could not find a matching HID device - check boot setup")
            }
            Error::CapacityExceeded { capacity } => {
                write!(f, "Input list is full ({capacity} buttons), cannot add another")
            }
            Error::NoButtonsConfigured => write!(f, "There are no buttons configured"),
            Error::ButtonOutOfRange { index, count } => {
                write!(f, "Button {index} is out of range (0-{})", count.saturating_sub(1))
            }
        }
    }
}

impl<T: HidTransport> core::error::Error for Error<T> {}
