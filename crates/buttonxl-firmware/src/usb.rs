//! TinyUSB HID device glue.
//!
//! Installs the esp_tinyusb driver with a single HID interface whose report
//! descriptor comes from [`buttonxl::DeviceRegistration`], and adapts the
//! `tud_*` API to the [`HidBus`]/[`HidTransport`] traits the session runs on.

use core::fmt;
use std::sync::OnceLock;

use esp_idf_svc::sys;

use buttonxl::descriptor::{LED_MUTE, LED_OFF_HOOK, LED_RING, TELEPHONY_REPORT_ID_LED};
use buttonxl::{DeviceRegistration, HidBus, HidTransport};

// Single HID interface, so instance 0 everywhere.
const HID_INSTANCE: u8 = 0;
const HID_EP_IN: u8 = 0x81;
const HID_EP_SIZE: u16 = 16;
const HID_POLL_INTERVAL_MS: u8 = 10;

struct RegisteredDevice {
    report_descriptor: Vec<u8>,
    configuration_descriptor: Vec<u8>,
    usage_page: u16,
    usage: u16,
    report_id: u8,
}

// The TinyUSB callbacks hand out raw pointers into these buffers, so they
// must stay alive (and unmoved) for the life of the program.
static DEVICE: OnceLock<RegisteredDevice> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsbHidError {
    /// No host enumerated the device (cable out, or suspend).
    NotConnected,
    /// The interrupt IN endpoint still holds the previous report.
    Busy,
}

impl fmt::Display for UsbHidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsbHidError::NotConnected => write!(f, "USB host not connected"),
            UsbHidError::Busy => write!(f, "HID endpoint busy"),
        }
    }
}

impl std::error::Error for UsbHidError {}

/// Configuration descriptor: standard config header plus one HID interface
/// (interface + HID + interrupt IN endpoint descriptors).
fn build_configuration_descriptor(report_descriptor_len: u16) -> Vec<u8> {
    const CONFIG_DESC_LEN: u16 = 9 + 9 + 9 + 7;
    let [rd_len_lo, rd_len_hi] = report_descriptor_len.to_le_bytes();
    let [total_lo, total_hi] = CONFIG_DESC_LEN.to_le_bytes();
    let [ep_size_lo, ep_size_hi] = HID_EP_SIZE.to_le_bytes();
    vec![
        // Configuration descriptor
        9, sys::tusb_desc_type_t_TUSB_DESC_CONFIGURATION as u8,
        total_lo, total_hi,
        1,    // one interface
        1,    // configuration value
        0,    // no configuration string
        0x80, // bus powered
        50,   // 100 mA
        // Interface descriptor
        9, sys::tusb_desc_type_t_TUSB_DESC_INTERFACE as u8,
        0, // interface number
        0, // alternate setting
        1, // one endpoint
        sys::tusb_class_code_t_TUSB_CLASS_HID as u8,
        0, // no boot subclass
        0, // no boot protocol
        0, // no interface string
        // HID descriptor
        9, 0x21, // HID
        0x11, 0x01, // bcdHID 1.11
        0,    // no country code
        1,    // one class descriptor
        0x22, // report descriptor
        rd_len_lo, rd_len_hi,
        // Endpoint descriptor
        7, sys::tusb_desc_type_t_TUSB_DESC_ENDPOINT as u8,
        HID_EP_IN,
        sys::tusb_xfer_type_t_TUSB_XFER_INTERRUPT as u8,
        ep_size_lo, ep_size_hi,
        HID_POLL_INTERVAL_MS,
    ]
}

/// Install the USB device stack with the given HID registration.
///
/// Must be called once, before [`UsbHidBus`] is polled. The device and
/// string descriptors stay at the esp_tinyusb defaults; only the
/// configuration and report descriptors are ours.
pub fn register(registration: &DeviceRegistration) -> Result<(), sys::EspError> {
    let device = RegisteredDevice {
        report_descriptor: registration.report_descriptor.to_vec(),
        configuration_descriptor: build_configuration_descriptor(
            registration.report_descriptor.len() as u16,
        ),
        usage_page: registration.usage_page,
        usage: registration.usage,
        report_id: registration.report_ids.first().copied().unwrap_or(0),
    };
    if DEVICE.set(device).is_err() {
        log::warn!("USB HID device already registered; keeping the first registration");
        return Ok(());
    }
    let device = DEVICE.get().unwrap();

    let mut config: sys::tinyusb_config_t = unsafe { core::mem::zeroed() };
    config.__bindgen_anon_2.configuration_descriptor = device.configuration_descriptor.as_ptr();
    unsafe {
        sys::esp!(sys::tinyusb_driver_install(&config))?;
    }
    log::info!(
        "TinyUSB HID installed: usage {:#04x}/{:#04x}, {} descriptor bytes",
        device.usage_page,
        device.usage,
        device.report_descriptor.len()
    );
    Ok(())
}

/// HID endpoint handle for one report ID on instance 0.
pub struct UsbHidTransport {
    report_id: u8,
}

impl HidTransport for UsbHidTransport {
    type Error = UsbHidError;

    fn send_report(&mut self, report: &[u8]) -> Result<(), UsbHidError> {
        if !unsafe { sys::tud_mounted() } {
            return Err(UsbHidError::NotConnected);
        }
        if !unsafe { sys::tud_hid_n_ready(HID_INSTANCE) } {
            return Err(UsbHidError::Busy);
        }
        let sent = unsafe {
            sys::tud_hid_n_report(
                HID_INSTANCE,
                self.report_id,
                report.as_ptr().cast(),
                report.len() as u16,
            )
        };
        if sent {
            Ok(())
        } else {
            Err(UsbHidError::Busy)
        }
    }
}

/// Resolves the registered device once the host has enumerated it.
pub struct UsbHidBus;

impl HidBus for UsbHidBus {
    type Transport = UsbHidTransport;

    fn find(&mut self, usage_page: u16, usage: u16) -> Option<UsbHidTransport> {
        let device = DEVICE.get()?;
        if (device.usage_page, device.usage) != (usage_page, usage) {
            return None;
        }
        if !unsafe { sys::tud_mounted() } {
            return None;
        }
        Some(UsbHidTransport {
            report_id: device.report_id,
        })
    }
}

#[no_mangle]
extern "C" fn tud_hid_descriptor_report_cb(_instance: u8) -> *const u8 {
    match DEVICE.get() {
        Some(device) => device.report_descriptor.as_ptr(),
        None => core::ptr::null(),
    }
}

#[no_mangle]
extern "C" fn tud_hid_get_report_cb(
    _instance: u8,
    _report_id: u8,
    _report_type: sys::hid_report_type_t,
    _buffer: *mut u8,
    _reqlen: u16,
) -> u16 {
    // Input reports go out unsolicited from the session loop; nothing to
    // answer on a control-channel GET_REPORT.
    0
}

#[no_mangle]
extern "C" fn tud_hid_set_report_cb(
    _instance: u8,
    report_id: u8,
    _report_type: sys::hid_report_type_t,
    buffer: *const u8,
    bufsize: u16,
) {
    if report_id != TELEPHONY_REPORT_ID_LED || buffer.is_null() || bufsize == 0 {
        return;
    }
    let leds = unsafe { *buffer };
    log::info!(
        "Host LED state: mute={} off-hook={} ring={}",
        leds & LED_MUTE != 0,
        leds & LED_OFF_HOOK != 0,
        leds & LED_RING != 0
    );
}
