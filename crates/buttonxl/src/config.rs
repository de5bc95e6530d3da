//! Persisted device configuration
//!
//! The descriptor is built once at boot, before the USB stack enumerates;
//! the update loop runs later and needs the same geometry to size its report
//! buffers. The geometry crosses that gap as a human-readable marker line in
//! the boot log (a file on CircuitPython-style setups, an NVS entry on
//! ESP-IDF). [`DeviceParams::boot_line`] writes it,
//! [`DeviceParams::from_boot_log`] reads it back.

use alloc::string::String;

use crate::descriptor::ReportDescriptor;
use crate::error::ConfigError;

/// Marker token identifying the configuration line in the boot log
pub const BOOT_CONFIG_MARKER: &str = "ButtonXL";

/// Report geometry a session needs to size its buffers
///
/// Constructed explicitly and passed into
/// [`Session::open`](crate::session::Session::open); there is no process-wide
/// configuration state. The fields are private so the geometry invariant
/// (`report_length` holds at least `ceil(button_count / 8)` bytes) cannot be
/// bypassed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceParams {
    button_count: u8,
    report_length: usize,
}

impl DeviceParams {
    /// Create parameters, validating the report geometry
    ///
    /// The report must be at least one byte and large enough to hold one bit
    /// per button; extra padding bytes are allowed.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ZeroReportLength`] - `report_length` is 0; a session
    ///   cannot operate without at least one report byte
    /// - [`ConfigError::Malformed`] - `report_length` is smaller than
    ///   `ceil(button_count / 8)`, so some button bit would have no byte
    pub fn new(button_count: u8, report_length: usize) -> Result<Self, ConfigError> {
        if report_length == 0 {
            return Err(ConfigError::ZeroReportLength);
        }
        if report_length < usize::from(button_count).div_ceil(8) {
            return Err(ConfigError::Malformed);
        }
        Ok(Self {
            button_count,
            report_length,
        })
    }

    /// Number of buttons the descriptor declares
    pub fn button_count(&self) -> u8 {
        self.button_count
    }

    /// Input report length in bytes
    pub fn report_length(&self) -> usize {
        self.report_length
    }

    /// Derive parameters from a freshly built descriptor
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroReportLength`] for a zero-button
    /// descriptor.
    pub fn from_descriptor(descriptor: &ReportDescriptor) -> Result<Self, ConfigError> {
        Self::new(descriptor.button_count(), descriptor.report_length())
    }

    /// Recover parameters from boot log text
    ///
    /// Scans for the first line containing [`BOOT_CONFIG_MARKER`] and takes
    /// the first two whitespace-separated integers on it as
    /// `(button_count, report_length)`. Version strings like `0.1.0` do not
    /// parse as integers and are skipped over.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Missing`] - no line carries the marker
    /// - [`ConfigError::Malformed`] - marker line lacks two integers, the
    ///   button count is out of range, or the report length cannot hold the
    ///   declared buttons
    /// - [`ConfigError::ZeroReportLength`] - line declares a 0-byte report
    pub fn from_boot_log(text: &str) -> Result<Self, ConfigError> {
        for line in text.lines() {
            if !line.contains(BOOT_CONFIG_MARKER) {
                continue;
            }
            let mut numbers = line
                .split_whitespace()
                .filter_map(|word| word.parse::<usize>().ok());
            let button_count = numbers.next().ok_or(ConfigError::Malformed)?;
            let report_length = numbers.next().ok_or(ConfigError::Malformed)?;
            let button_count = u8::try_from(button_count)
                .ok()
                .filter(|count| *count <= crate::descriptor::MAX_BUTTONS)
                .ok_or(ConfigError::Malformed)?;
            return Self::new(button_count, report_length);
        }
        Err(ConfigError::Missing)
    }

    /// Format the boot log line [`from_boot_log`](DeviceParams::from_boot_log) parses
    pub fn boot_line(&self) -> String {
        alloc::format!(
            "+ Enabled {} {} {} buttons {} report bytes.",
            BOOT_CONFIG_MARKER,
            env!("CARGO_PKG_VERSION"),
            self.button_count,
            self.report_length
        )
    }
}
