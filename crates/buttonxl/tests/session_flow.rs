//! End-to-end session scenarios against an in-memory transport.
//!
//! These walk the same path the firmware does: build a descriptor, persist
//! and recover the geometry, open a session on a mock bus, then drive
//! virtual buttons through update cycles and check what reaches the "host".

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;

use buttonxl::{
    Button, DeviceParams, DeviceRegistration, Error, Hat, HatPosition, HidBus, HidTransport,
    NoSource, ReportDescriptor, Session, USAGE_HEADSET, USAGE_PAGE_TELEPHONY,
};

#[derive(Default)]
struct HostState {
    reports: Vec<Vec<u8>>,
    fail_sends: usize,
}

/// Mock endpoint; clones share the captured report list.
#[derive(Clone, Default)]
struct MockTransport(Rc<RefCell<HostState>>);

#[derive(Debug)]
struct SendBusy;

impl HidTransport for MockTransport {
    type Error = SendBusy;

    fn send_report(&mut self, report: &[u8]) -> Result<(), SendBusy> {
        let mut state = self.0.borrow_mut();
        if state.fail_sends > 0 {
            state.fail_sends -= 1;
            return Err(SendBusy);
        }
        state.reports.push(report.to_vec());
        Ok(())
    }
}

struct MockBus {
    transport: MockTransport,
}

impl HidBus for MockBus {
    type Transport = MockTransport;

    fn find(&mut self, usage_page: u16, usage: u16) -> Option<MockTransport> {
        if (usage_page, usage) == (USAGE_PAGE_TELEPHONY, USAGE_HEADSET) {
            Some(self.transport.clone())
        } else {
            None
        }
    }
}

struct NoopDelay;

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

fn reports(transport: &MockTransport) -> Vec<Vec<u8>> {
    transport.0.borrow().reports.clone()
}

/// Boot-to-loop flow: descriptor, registration record, persisted geometry,
/// session, two buttons, then a press/release sequence.
#[test]
fn two_button_press_release_flow() {
    let descriptor = ReportDescriptor::build(2, 0x0b).unwrap();
    let registration = DeviceRegistration {
        report_descriptor: descriptor.as_bytes(),
        usage_page: USAGE_PAGE_TELEPHONY,
        usage: USAGE_HEADSET,
        report_ids: &[descriptor.report_id()],
        in_report_lengths: &[descriptor.report_length() as u8],
        out_report_lengths: &[],
    };
    assert_eq!(registration.in_report_lengths, &[1]);

    // Geometry crosses the boot gap as a text line.
    let params = DeviceParams::from_descriptor(&descriptor).unwrap();
    let boot_log = format!("boot messages\n{}\nmore output\n", params.boot_line());
    let params = DeviceParams::from_boot_log(&boot_log).unwrap();
    assert_eq!(params.button_count(), 2);
    assert_eq!(params.report_length(), 1);

    let transport = MockTransport::default();
    let mut bus = MockBus {
        transport: transport.clone(),
    };
    let mut session: Session<NoSource, _> =
        Session::open(&mut bus, params, &mut NoopDelay).unwrap();
    session
        .add_inputs([Button::virtual_input(true), Button::virtual_input(true)])
        .unwrap();

    // Both released.
    session.update(false, false).unwrap();
    // Press 0, then 1, then release 0.
    session.button_mut(0).unwrap().set_source_value(false).unwrap();
    session.update(false, false).unwrap();
    session.button_mut(1).unwrap().set_source_value(false).unwrap();
    session.update(false, false).unwrap();
    session.button_mut(0).unwrap().set_source_value(true).unwrap();
    session.update(false, false).unwrap();

    assert_eq!(
        reports(&transport),
        vec![
            vec![0b0000_0000], // initial idle from open()
            vec![0b0000_0001],
            vec![0b0000_0011],
            vec![0b0000_0010],
        ]
    );
}

#[test]
fn bypassed_button_never_reaches_the_host() {
    let transport = MockTransport::default();
    let mut bus = MockBus {
        transport: transport.clone(),
    };
    let params = DeviceParams::new(2, 1).unwrap();
    let mut session: Session<NoSource, _> =
        Session::open(&mut bus, params, &mut NoopDelay).unwrap();
    session
        .add_inputs([Button::virtual_input(true), Button::virtual_input(true)])
        .unwrap();
    session.button_mut(1).unwrap().bypass = true;

    session.button_mut(0).unwrap().set_source_value(false).unwrap();
    session.button_mut(1).unwrap().set_source_value(false).unwrap();
    session.update(false, false).unwrap();

    let sent = reports(&transport);
    assert_eq!(sent.last().unwrap(), &vec![0b0000_0001]);
    // The bypassed button still sees its own electrical state.
    assert!(session.button_mut(1).unwrap().is_pressed());
    assert!(session.button(1).unwrap().was_pressed());
}

#[test]
fn edge_events_line_up_with_update_cycles() {
    let transport = MockTransport::default();
    let mut bus = MockBus {
        transport: transport.clone(),
    };
    let params = DeviceParams::new(1, 1).unwrap();
    let mut session: Session<NoSource, _> =
        Session::open(&mut bus, params, &mut NoopDelay).unwrap();
    session.add_input(Button::virtual_input(true)).unwrap();

    session.update(false, false).unwrap();
    assert!(!session.button(0).unwrap().was_pressed());

    session.button_mut(0).unwrap().set_source_value(false).unwrap();
    session.update(false, false).unwrap();
    assert!(session.button(0).unwrap().was_pressed());

    session.update(false, false).unwrap();
    assert!(!session.button(0).unwrap().was_pressed());

    session.button_mut(0).unwrap().set_source_value(true).unwrap();
    session.update(false, false).unwrap();
    assert!(session.button(0).unwrap().was_released());
}

#[test]
fn transport_outage_is_bridged_without_losing_state() {
    let transport = MockTransport::default();
    let mut bus = MockBus {
        transport: transport.clone(),
    };
    let params = DeviceParams::new(1, 1).unwrap();
    let mut session: Session<NoSource, _> =
        Session::open(&mut bus, params, &mut NoopDelay).unwrap();
    session.add_input(Button::virtual_input(true)).unwrap();

    // Host goes away for two cycles while the button is pressed.
    session.button_mut(0).unwrap().set_source_value(false).unwrap();
    transport.0.borrow_mut().fail_sends = 2;
    session.update(false, false).unwrap();
    session.update(false, false).unwrap();
    assert_eq!(reports(&transport).len(), 1); // only the initial idle report

    // Transport recovers; the still-pending difference goes out.
    session.update(false, false).unwrap();
    assert_eq!(reports(&transport).last().unwrap(), &vec![0b0000_0001]);

    // Strict mode surfaces the failure instead.
    transport.0.borrow_mut().fail_sends = 1;
    session.button_mut(0).unwrap().set_source_value(true).unwrap();
    assert!(matches!(
        session.update(false, true),
        Err(Error::Transport(SendBusy))
    ));
}

#[test]
fn wrong_identity_is_not_found() {
    let transport = MockTransport::default();
    let mut bus = MockBus {
        transport: transport.clone(),
    };
    // A bus that only serves a different usage pair yields DeviceNotFound
    // after the single retry.
    struct WrongBus;
    impl HidBus for WrongBus {
        type Transport = MockTransport;
        fn find(&mut self, _usage_page: u16, _usage: u16) -> Option<MockTransport> {
            None
        }
    }
    let params = DeviceParams::new(1, 1).unwrap();
    let result: Result<Session<NoSource, MockTransport>, _> =
        Session::open(&mut WrongBus, params, &mut NoopDelay);
    assert!(matches!(result, Err(Error::DeviceNotFound)));

    // The well-known pair still resolves.
    assert!(bus.find(USAGE_PAGE_TELEPHONY, USAGE_HEADSET).is_some());
    assert!(bus.find(0x01, 0x04).is_none());
}

/// A remote hat: directional states arrive as a packed byte (as a radio
/// receiver would get them), feed an all-virtual hat, and the resolved
/// position is forwarded as button bits.
#[test]
fn remote_hat_positions_via_packed_bytes() {
    let mut hat: Hat<NoSource> = Hat::virtual_input(true);

    // Active-low: pressed = 0. Raw byte for "up only": all high but bit 0.
    hat.unpack_source_values(!0x01 & 0x0f).unwrap();
    assert_eq!(hat.poll(), HatPosition::Up);
    assert_eq!(hat.value().index(), 0);

    hat.unpack_source_values(!(0x01 | 0x08) & 0x0f).unwrap();
    assert_eq!(hat.poll(), HatPosition::UpRight);

    hat.unpack_source_values(0x0f).unwrap();
    assert_eq!(hat.poll(), HatPosition::Idle);
    assert_eq!(hat.value().index(), 8);

    // Round-trip the raw packing for every 4-bit combination.
    for packed in 0..16u8 {
        hat.unpack_source_values(packed).unwrap();
        assert_eq!(hat.packed_source_values(), packed);
    }
}
