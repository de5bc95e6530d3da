//! USB HID transport boundary
//!
//! The library never talks to a USB stack directly. The firmware registers
//! the device at boot with whatever stack it uses (a [`DeviceRegistration`]
//! carries everything the stack needs), and at runtime hands the session a
//! transport found through [`HidBus`]. This mirrors how the hardware seam is
//! drawn elsewhere in the ecosystem: a small trait the platform implements
//! once, everything above it portable and testable.

use core::fmt::Debug;

/// A located HID endpoint reports can be sent through
///
/// `send_report` is expected to return promptly: either the report was
/// queued for the host, or a definite error (transport busy, host not
/// connected) comes back. Implementations must not block indefinitely.
pub trait HidTransport {
    /// Error type for send operations
    ///
    /// Must implement [`Debug`] for error reporting.
    type Error: Debug;

    /// Send one input report, excluding the report ID prefix
    ///
    /// The buffer is exactly the report length declared by the descriptor;
    /// the transport prepends the report ID if its wire format carries one.
    ///
    /// # Errors
    ///
    /// Returns an error when the report could not be handed to the host.
    fn send_report(&mut self, report: &[u8]) -> Result<(), Self::Error>;
}

/// Directory of active HID endpoints, queried by device identity
pub trait HidBus {
    /// The transport type endpoints are handed out as
    type Transport: HidTransport;

    /// Locate the endpoint whose descriptor declares this usage page/usage
    ///
    /// Returns `None` when no match exists yet; right after boot the stack
    /// may still be enumerating, which is why
    /// [`Session::open`](crate::session::Session::open) retries once.
    fn find(&mut self, usage_page: u16, usage: u16) -> Option<Self::Transport>;
}

/// Everything the boot-time registration boundary needs to know
///
/// Handed to the platform USB stack before enumeration; the stack keeps the
/// descriptor bytes for the host's GET_DESCRIPTOR request and sizes its
/// endpoint buffers from the report lengths.
#[derive(Debug, Clone, Copy)]
pub struct DeviceRegistration<'a> {
    /// Report descriptor byte sequence
    pub report_descriptor: &'a [u8],
    /// Usage page of the top-level application collection
    pub usage_page: u16,
    /// Usage of the top-level application collection
    pub usage: u16,
    /// Report IDs the descriptor declares, in declaration order
    pub report_ids: &'a [u8],
    /// Input (device to host) report lengths in bytes, one per report ID
    pub in_report_lengths: &'a [u8],
    /// Output (host to device) report lengths in bytes, one per report ID
    pub out_report_lengths: &'a [u8],
}
