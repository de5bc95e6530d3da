//! USB HID report descriptor construction
//!
//! Two device profiles are covered:
//!
//! - [`ReportDescriptor::build`] - the configurable button-array profile,
//!   0 to 128 buttons bit-packed into `ceil(n / 8)` report bytes
//! - [`TELEPHONY_HEADSET_DESCRIPTOR`] - the fixed telephony headset profile
//!   (hook switch + phone mute in, mute/off-hook/ring LEDs out)
//!
//! Descriptors are built into fixed-size buffers; nothing here allocates.

use crate::error::DescriptorError;

/// HID usage page: Telephony Devices
pub const USAGE_PAGE_TELEPHONY: u16 = 0x0b;

/// HID usage: Headset (within the telephony page)
pub const USAGE_HEADSET: u16 = 0x05;

/// Maximum number of buttons a descriptor can declare
pub const MAX_BUTTONS: u8 = 128;

/// Largest possible report length in bytes (128 buttons, bit-packed)
pub const MAX_REPORT_LENGTH: usize = MAX_BUTTONS as usize / 8;

/// Upper bound on built descriptor size: 8-byte header, 16-byte button
/// block, 6-byte padding block, end-collection byte.
const MAX_DESCRIPTOR_LEN: usize = 32;

/// Report ID of the telephony headset input report (hook switch, mute)
pub const TELEPHONY_REPORT_ID_INPUT: u8 = 1;
/// Report ID of the telephony headset LED output report
pub const TELEPHONY_REPORT_ID_LED: u8 = 2;

/// Input report bit: hook switch
pub const INPUT_HOOK_SWITCH: u8 = 1 << 0;
/// Input report bit: phone mute
pub const INPUT_PHONE_MUTE: u8 = 1 << 1;

/// LED output report bit: mute
pub const LED_MUTE: u8 = 1 << 0;
/// LED output report bit: off-hook
pub const LED_OFF_HOOK: u8 = 1 << 1;
/// LED output report bit: ring
pub const LED_RING: u8 = 1 << 2;

/// Fixed report descriptor for the telephony headset profile
///
/// One input byte under report ID 1 (bit 0 hook switch, bit 1 phone mute,
/// bits 2-7 constant) and one output byte under report ID 2 (bits 0-2
/// mute/off-hook/ring LEDs, bits 3-7 constant).
#[rustfmt::skip]
pub const TELEPHONY_HEADSET_DESCRIPTOR: [u8; 45] = [
    0x05, 0x0b, // USAGE_PAGE (Telephony Devices)
    0x09, 0x05, // USAGE (Headset)
    0xa1, 0x01, // COLLECTION (Application)
    0x85, 0x01, //   REPORT_ID (1)
    0x25, 0x01, //   LOGICAL_MAXIMUM (1)
    0x15, 0x00, //   LOGICAL_MINIMUM (0)
    0x09, 0x20, //   USAGE (Hook Switch)
    0x09, 0x2f, //   USAGE (Phone Mute)
    0x75, 0x01, //   REPORT_SIZE (1)
    0x95, 0x02, //   REPORT_COUNT (2)
    0x81, 0x02, //   INPUT (Data,Var,Abs)
    0x95, 0x06, //   REPORT_COUNT (6)
    0x81, 0x03, //   INPUT (Cnst,Var,Abs)
    0x85, 0x02, //   REPORT_ID (2)
    0x05, 0x08, //   USAGE_PAGE (LEDs)
    0x09, 0x09, //   USAGE (Mute)
    0x09, 0x17, //   USAGE (Off-Hook)
    0x09, 0x18, //   USAGE (Ring)
    0x95, 0x03, //   REPORT_COUNT (3)
    0x91, 0x02, //   OUTPUT (Data,Var,Abs)
    0x95, 0x05, //   REPORT_COUNT (5)
    0x91, 0x03, //   OUTPUT (Cnst,Var,Abs)
    0xc0,       // END_COLLECTION
];

/// A built button-array report descriptor and its derived report geometry
///
/// Construction is deterministic and side-effect free apart from one
/// diagnostic log line with the chosen parameters.
#[derive(Debug, Clone)]
pub struct ReportDescriptor {
    bytes: [u8; MAX_DESCRIPTOR_LEN],
    len: usize,
    button_count: u8,
    report_length: usize,
    report_id: u8,
}

impl ReportDescriptor {
    /// Build a descriptor for `button_count` buttons under one report ID
    ///
    /// Buttons are declared as 1-bit variable inputs; when the count is not
    /// a multiple of eight, constant padding bits fill the final byte. The
    /// resulting input report is `ceil(button_count / 8)` bytes (zero bytes
    /// for zero buttons).
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::InvalidButtonCount`] when `button_count`
    /// exceeds [`MAX_BUTTONS`].
    pub fn build(button_count: u8, report_id: u8) -> Result<Self, DescriptorError> {
        if button_count > MAX_BUTTONS {
            return Err(DescriptorError::InvalidButtonCount { count: button_count });
        }

        let mut descriptor = Self {
            bytes: [0; MAX_DESCRIPTOR_LEN],
            len: 0,
            button_count,
            report_length: 0,
            report_id,
        };

        descriptor.extend(&[
            0x05, 0x0b,      // USAGE_PAGE (Telephony Devices)
            0x09, 0x05,      // USAGE (Headset)
            0xa1, 0x01,      // COLLECTION (Application)
            0x85, report_id, //   REPORT_ID
        ]);

        if button_count > 0 {
            descriptor.extend(&[
                0x05, 0x09,         //   USAGE_PAGE (Button)
                0x19, 0x01,         //   USAGE_MINIMUM (Button 1)
                0x29, button_count, //   USAGE_MAXIMUM (Button n)
                0x15, 0x00,         //   LOGICAL_MINIMUM (0)
                0x25, 0x01,         //   LOGICAL_MAXIMUM (1)
                0x75, 0x01,         //   REPORT_SIZE (1)
                0x95, button_count, //   REPORT_COUNT (n)
                0x81, 0x02,         //   INPUT (Data,Var,Abs)
            ]);

            let pad_bits = button_count % 8;
            if pad_bits != 0 {
                descriptor.extend(&[
                    0x75, 0x01,         //   REPORT_SIZE (1)
                    0x95, 8 - pad_bits, //   REPORT_COUNT (pad)
                    0x81, 0x03,         //   INPUT (Cnst,Var,Abs)
                ]);
            }

            descriptor.report_length =
                button_count as usize / 8 + usize::from(pad_bits != 0);
        }

        descriptor.extend(&[
            0xc0, // END_COLLECTION
        ]);

        log::info!(
            "Enabled ButtonXL: {} buttons, {} report bytes",
            button_count,
            descriptor.report_length
        );

        Ok(descriptor)
    }

    fn extend(&mut self, items: &[u8]) {
        self.bytes[self.len..self.len + items.len()].copy_from_slice(items);
        self.len += items.len();
    }

    /// The descriptor byte sequence
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Length in bytes of the input report this descriptor declares
    pub fn report_length(&self) -> usize {
        self.report_length
    }

    /// Number of buttons declared
    pub fn button_count(&self) -> u8 {
        self.button_count
    }

    /// The report ID the input report is sent under
    pub fn report_id(&self) -> u8 {
        self.report_id
    }
}
