mod usb;

use esp_idf_svc::hal::{
    delay::FreeRtos,
    gpio::{AnyIOPin, IOPin, Input, PinDriver, Pull},
    peripherals::Peripherals,
};
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs};

use buttonxl::{
    Button, DeviceParams, DeviceRegistration, PinSource, ReportDescriptor, Session, USAGE_HEADSET,
    USAGE_PAGE_TELEPHONY,
};

use usb::{UsbHidBus, UsbHidTransport};

const BUTTON_COUNT: u8 = 4;
const REPORT_ID: u8 = 0x0b;
const POLL_PERIOD_MS: u32 = 10;

const NVS_NAMESPACE: &str = "buttonxl";
const NVS_BOOT_KEY: &str = "boot_line";

fn input_pin(pin: AnyIOPin) -> PinDriver<'static, AnyIOPin, Input> {
    let mut driver = PinDriver::input(pin).unwrap();
    driver.set_pull(Pull::Up).unwrap();
    driver
}

fn main() {
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    let peripherals = Peripherals::take().unwrap();

    let descriptor = ReportDescriptor::build(BUTTON_COUNT, REPORT_ID).unwrap();
    let registration = DeviceRegistration {
        report_descriptor: descriptor.as_bytes(),
        usage_page: USAGE_PAGE_TELEPHONY,
        usage: USAGE_HEADSET,
        report_ids: &[descriptor.report_id()],
        in_report_lengths: &[descriptor.report_length() as u8],
        out_report_lengths: &[],
    };
    usb::register(&registration).unwrap();

    // Persist the geometry line and read it back, so the running session is
    // configured from the same record a host-side tool would see.
    let nvs_partition = EspDefaultNvsPartition::take().unwrap();
    let mut nvs = EspNvs::new(nvs_partition, NVS_NAMESPACE, true).unwrap();
    let boot_line = DeviceParams::from_descriptor(&descriptor).unwrap().boot_line();
    nvs.set_str(NVS_BOOT_KEY, &boot_line).unwrap();
    log::info!("{boot_line}");

    let mut stored = [0u8; 128];
    let stored = nvs.get_str(NVS_BOOT_KEY, &mut stored).unwrap().unwrap();
    let params = DeviceParams::from_boot_log(stored).unwrap();

    let buttons = [
        input_pin(peripherals.pins.gpio4.downgrade()),
        input_pin(peripherals.pins.gpio5.downgrade()),
        input_pin(peripherals.pins.gpio6.downgrade()),
        input_pin(peripherals.pins.gpio7.downgrade()),
    ]
    .map(|driver| Button::from_pin(driver, true));

    let mut session: Session<PinSource<PinDriver<'static, AnyIOPin, Input>>, UsbHidTransport> =
        loop {
            match Session::open(&mut UsbHidBus, params, &mut FreeRtos) {
                Ok(session) => break session,
                Err(err) => {
                    log::warn!("USB host not ready ({err}); retrying");
                    FreeRtos::delay_ms(1000);
                }
            }
        };
    session.add_inputs(buttons).unwrap();
    log::info!("Session open: {} buttons registered", session.num_registered());

    loop {
        if let Err(err) = session.update(false, false) {
            log::warn!("update failed: {err}");
        }
        for index in 0..session.num_registered() {
            let button = session.button(index).unwrap();
            if button.was_pressed() {
                log::info!("button {index} pressed");
            } else if button.was_released() {
                log::info!("button {index} released");
            }
        }
        FreeRtos::delay_ms(POLL_PERIOD_MS);
    }
}
