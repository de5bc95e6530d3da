//! Device session: report buffers, transmit decision, transport failure policy

use alloc::vec;
use alloc::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::button::Button;
use crate::config::DeviceParams;
use crate::descriptor::{USAGE_HEADSET, USAGE_PAGE_TELEPHONY};
use crate::error::Error;
use crate::source::BooleanSource;
use crate::transport::{HidBus, HidTransport};

/// Delay before the single endpoint-discovery retry
const DISCOVERY_RETRY_DELAY_MS: u32 = 1000;
/// Delay before retrying the initial idle report once
const STARTUP_RETRY_DELAY_MS: u32 = 1000;

/// Owns the report buffers and drives the input-to-report pipeline
///
/// One session is expected to exist per device; it is constructed once after
/// the persisted configuration is read and lives for the process lifetime.
/// The caller drives it from a polling loop:
///
/// ```text
/// loop {
///     session.update(false, false).ok();
///     delay.delay_ms(10);
/// }
/// ```
///
/// Each [`update`](Session::update) polls every registered button exactly
/// once (preserving their edge-detection contract), packs the states into
/// the report buffer (bit index = registration order) and transmits only
/// when the packed bytes differ from the last report the host received.
pub struct Session<S, T> {
    params: DeviceParams,
    transport: T,
    buttons: Vec<Button<S>>,
    report: Vec<u8>,
    last_report: Vec<u8>,
}

impl<S, T> Session<S, T>
where
    S: BooleanSource,
    T: HidTransport,
{
    /// Locate the device endpoint and construct a ready session
    ///
    /// Looks up the telephony endpoint on the bus; if the stack has not
    /// finished enumerating yet, waits briefly and retries once. The
    /// session then transmits an initial all-idle report so the host state
    /// starts out known, again with a single delayed retry because the
    /// first send after enumeration commonly races the host connecting.
    ///
    /// # Errors
    ///
    /// - [`Error::DeviceNotFound`] - no matching endpoint after the retry
    /// - [`Error::Transport`] - the initial report failed twice
    pub fn open<B, D>(bus: &mut B, params: DeviceParams, delay: &mut D) -> Result<Self, Error<T>>
    where
        B: HidBus<Transport = T>,
        D: DelayNs,
    {
        let transport = match bus.find(USAGE_PAGE_TELEPHONY, USAGE_HEADSET) {
            Some(transport) => transport,
            None => {
                delay.delay_ms(DISCOVERY_RETRY_DELAY_MS);
                bus.find(USAGE_PAGE_TELEPHONY, USAGE_HEADSET)
                    .ok_or(Error::DeviceNotFound)?
            }
        };

        let mut session = Self {
            params,
            transport,
            buttons: Vec::new(),
            report: vec![0; params.report_length()],
            last_report: vec![0; params.report_length()],
        };

        if session.reset_all().is_err() {
            delay.delay_ms(STARTUP_RETRY_DELAY_MS);
            session.reset_all()?;
        }
        Ok(session)
    }

    /// Number of buttons the descriptor declares
    pub fn button_count(&self) -> u8 {
        self.params.button_count()
    }

    /// Number of buttons registered so far
    pub fn num_registered(&self) -> usize {
        self.buttons.len()
    }

    /// The packed report as it would go on the wire
    pub fn report_bytes(&self) -> &[u8] {
        &self.report
    }

    /// A registered button, by registration index
    pub fn button(&self, index: usize) -> Option<&Button<S>> {
        self.buttons.get(index)
    }

    /// A registered button, mutably
    pub fn button_mut(&mut self, index: usize) -> Option<&mut Button<S>> {
        self.buttons.get_mut(index)
    }

    /// Register a button; its bit index is its registration order
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] when the configured button count
    /// is already reached.
    pub fn add_input(&mut self, button: Button<S>) -> Result<(), Error<T>> {
        if self.buttons.len() >= usize::from(self.params.button_count()) {
            return Err(Error::CapacityExceeded {
                capacity: self.params.button_count(),
            });
        }
        self.buttons.push(button);
        Ok(())
    }

    /// Register several buttons in iteration order
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] on the first button that does not
    /// fit; buttons before it stay registered.
    pub fn add_inputs<I>(&mut self, buttons: I) -> Result<(), Error<T>>
    where
        I: IntoIterator<Item = Button<S>>,
    {
        for button in buttons {
            self.add_input(button)?;
        }
        Ok(())
    }

    /// Set or clear one button bit in the report buffer, with validation
    ///
    /// Does not transmit; the next [`update`](Session::update) carries the
    /// change. This is the manual path for states that do not come from a
    /// registered [`Button`], e.g. values computed in the application.
    ///
    /// # Errors
    ///
    /// - [`Error::NoButtonsConfigured`] - descriptor declares zero buttons
    /// - [`Error::ButtonOutOfRange`] - `index` outside `0..button_count`
    pub fn update_button(&mut self, index: usize, pressed: bool) -> Result<(), Error<T>> {
        if self.params.button_count() == 0 {
            return Err(Error::NoButtonsConfigured);
        }
        if index >= usize::from(self.params.button_count()) {
            return Err(Error::ButtonOutOfRange {
                index,
                count: self.params.button_count(),
            });
        }
        self.set_button_bit(index, pressed);
        Ok(())
    }

    /// Bit position: `index mod 8` of byte `index div 8`.
    fn set_button_bit(&mut self, index: usize, pressed: bool) {
        let bank = index / 8;
        let bit = index % 8;
        if pressed {
            self.report[bank] |= 1 << bit;
        } else {
            self.report[bank] &= !(1 << bit);
        }
    }

    /// Poll all registered buttons, repack the report, transmit if needed
    ///
    /// Every registered button is polled exactly once, in registration
    /// order. The report is sent when `always` is set or the packed bytes
    /// differ from the last report the host acknowledged; on success the
    /// sent bytes become the new comparison baseline.
    ///
    /// A failed send (transport busy, host not connected) is logged and the
    /// report dropped - the comparison baseline is left untouched, so the
    /// next cycle naturally retries. With `halt_on_error` the failure is
    /// returned instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] only when `halt_on_error` is set.
    pub fn update(&mut self, always: bool, halt_on_error: bool) -> Result<(), Error<T>> {
        for index in 0..self.buttons.len() {
            // Known-good index: registration is capacity-checked.
            let pressed = self.buttons[index].poll();
            self.set_button_bit(index, pressed);
        }

        if always || self.report != self.last_report {
            match self.transport.send_report(&self.report) {
                Ok(()) => self.last_report.copy_from_slice(&self.report),
                Err(err) => {
                    if halt_on_error {
                        return Err(Error::Transport(err));
                    }
                    log::warn!("HID report dropped: transport busy or host not connected");
                }
            }
        }
        Ok(())
    }

    /// Clear the report buffer and force-transmit the result
    ///
    /// Registered buttons are re-polled by the forced update, so this
    /// resets host state to the *current* electrical reality; with no
    /// buttons registered (as at construction) the host receives all-idle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] when the forced send fails.
    pub fn reset_all(&mut self) -> Result<(), Error<T>> {
        self.report.fill(0);
        self.update(true, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use core::cell::RefCell;

    use crate::error::ConfigError;
    use crate::source::NoSource;

    #[derive(Default)]
    struct MockState {
        sent: Vec<Vec<u8>>,
        fail_sends: usize,
    }

    /// In-memory transport capturing sent reports; can be told to fail.
    /// Clones share state so tests can inspect what the session sent.
    #[derive(Clone, Default)]
    struct MockTransport(Rc<RefCell<MockState>>);

    #[derive(Debug, PartialEq, Eq)]
    struct SendBusy;

    impl MockTransport {
        fn sent(&self) -> Vec<Vec<u8>> {
            self.0.borrow().sent.clone()
        }

        fn fail_next_sends(&self, count: usize) {
            self.0.borrow_mut().fail_sends = count;
        }
    }

    impl HidTransport for MockTransport {
        type Error = SendBusy;

        fn send_report(&mut self, report: &[u8]) -> Result<(), SendBusy> {
            let mut state = self.0.borrow_mut();
            if state.fail_sends > 0 {
                state.fail_sends -= 1;
                return Err(SendBusy);
            }
            state.sent.push(report.to_vec());
            Ok(())
        }
    }

    struct MockBus {
        transport: MockTransport,
        /// Number of find() calls answered with None before the endpoint
        /// shows up (models a still-enumerating stack).
        not_ready_polls: usize,
        finds: usize,
    }

    impl MockBus {
        fn new(transport: &MockTransport) -> Self {
            Self {
                transport: transport.clone(),
                not_ready_polls: 0,
                finds: 0,
            }
        }
    }

    impl HidBus for MockBus {
        type Transport = MockTransport;

        fn find(&mut self, usage_page: u16, usage: u16) -> Option<MockTransport> {
            assert_eq!((usage_page, usage), (0x0b, 0x05));
            self.finds += 1;
            if self.not_ready_polls > 0 {
                self.not_ready_polls -= 1;
                return None;
            }
            Some(self.transport.clone())
        }
    }

    struct NoopDelay;

    impl DelayNs for NoopDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn open_session(transport: &MockTransport, button_count: u8) -> Session<NoSource, MockTransport> {
        let params =
            DeviceParams::new(button_count, usize::from(button_count).div_ceil(8).max(1)).unwrap();
        let mut bus = MockBus::new(transport);
        Session::open(&mut bus, params, &mut NoopDelay).unwrap()
    }

    fn pressed_button() -> Button<NoSource> {
        let mut button = Button::virtual_input(true);
        button.set_source_value(false).unwrap();
        button
    }

    #[test]
    fn open_sends_initial_idle_report() {
        let transport = MockTransport::default();
        let session = open_session(&transport, 2);
        assert_eq!(session.button_count(), 2);
        assert_eq!(transport.sent(), vec![vec![0u8]]);
    }

    #[test]
    fn open_retries_discovery_once() {
        let transport = MockTransport::default();
        let params = DeviceParams::new(2, 1).unwrap();

        let mut bus = MockBus::new(&transport);
        bus.not_ready_polls = 1;
        let session: Session<NoSource, _> =
            Session::open(&mut bus, params, &mut NoopDelay).unwrap();
        assert_eq!(bus.finds, 2);
        drop(session);

        let mut bus = MockBus::new(&transport);
        bus.not_ready_polls = 2;
        let result: Result<Session<NoSource, MockTransport>, _> =
            Session::open(&mut bus, params, &mut NoopDelay);
        assert!(matches!(result, Err(Error::DeviceNotFound)));
        assert_eq!(bus.finds, 2);
    }

    #[test]
    fn open_retries_initial_report_once_then_propagates() {
        let transport = MockTransport::default();
        transport.fail_next_sends(1);
        let params = DeviceParams::new(2, 1).unwrap();
        let mut bus = MockBus::new(&transport);
        let session: Session<NoSource, _> =
            Session::open(&mut bus, params, &mut NoopDelay).unwrap();
        drop(session);
        assert_eq!(transport.sent().len(), 1);

        let transport = MockTransport::default();
        transport.fail_next_sends(2);
        let mut bus = MockBus::new(&transport);
        let result: Result<Session<NoSource, MockTransport>, _> =
            Session::open(&mut bus, params, &mut NoopDelay);
        assert!(matches!(result, Err(Error::Transport(SendBusy))));
    }

    #[test]
    fn capacity_is_enforced_on_registration() {
        let transport = MockTransport::default();
        let mut session = open_session(&transport, 2);
        session.add_input(Button::virtual_input(true)).unwrap();
        session.add_input(Button::virtual_input(true)).unwrap();
        assert!(matches!(
            session.add_input(Button::virtual_input(true)),
            Err(Error::CapacityExceeded { capacity: 2 })
        ));
        assert_eq!(session.num_registered(), 2);
    }

    #[test]
    fn update_button_validates_index() {
        let transport = MockTransport::default();
        let mut session = open_session(&transport, 2);
        session.update_button(1, true).unwrap();
        assert_eq!(session.report_bytes(), &[0b0000_0010]);
        assert!(matches!(
            session.update_button(2, true),
            Err(Error::ButtonOutOfRange { index: 2, count: 2 })
        ));
    }

    #[test]
    fn update_button_with_zero_buttons_configured() {
        let transport = MockTransport::default();
        let mut session = open_session(&transport, 0);
        assert!(matches!(
            session.update_button(0, true),
            Err(Error::NoButtonsConfigured)
        ));
    }

    #[test]
    fn packs_bits_in_registration_order() {
        let transport = MockTransport::default();
        let mut session = open_session(&transport, 2);
        session
            .add_inputs([Button::virtual_input(true), Button::virtual_input(true)])
            .unwrap();

        session.update(false, false).unwrap();
        assert_eq!(session.report_bytes(), &[0b0000_0000]);

        session.button_mut(0).unwrap().set_source_value(false).unwrap();
        session.update(false, false).unwrap();
        assert_eq!(session.report_bytes(), &[0b0000_0001]);

        session.button_mut(1).unwrap().set_source_value(false).unwrap();
        session.update(false, false).unwrap();
        assert_eq!(session.report_bytes(), &[0b0000_0011]);

        session.button_mut(0).unwrap().set_source_value(true).unwrap();
        session.update(false, false).unwrap();
        assert_eq!(session.report_bytes(), &[0b0000_0010]);
    }

    #[test]
    fn transmits_only_on_change_or_always() {
        let transport = MockTransport::default();
        let mut session = open_session(&transport, 1);
        session.add_input(pressed_button()).unwrap();

        session.update(false, false).unwrap();
        session.update(false, false).unwrap();
        session.update(false, false).unwrap();
        // Initial idle report + one change report; identical repeats elided.
        assert_eq!(transport.sent().len(), 2);
        assert_eq!(transport.sent()[1], vec![0b0000_0001]);

        session.update(true, false).unwrap();
        assert_eq!(transport.sent().len(), 3);
    }

    #[test]
    fn failed_send_is_dropped_and_retried_next_cycle() {
        let transport = MockTransport::default();
        let mut session = open_session(&transport, 1);
        session.add_input(pressed_button()).unwrap();

        transport.fail_next_sends(1);
        session.update(false, false).unwrap();
        assert_eq!(transport.sent().len(), 1);

        // Baseline untouched, so the unchanged state still differs and the
        // next cycle resends.
        session.update(false, false).unwrap();
        assert_eq!(transport.sent().len(), 2);
        assert_eq!(transport.sent()[1], vec![0b0000_0001]);
    }

    #[test]
    fn halt_on_error_propagates_send_failure() {
        let transport = MockTransport::default();
        let mut session = open_session(&transport, 1);
        session.add_input(pressed_button()).unwrap();

        transport.fail_next_sends(1);
        assert!(matches!(
            session.update(false, true),
            Err(Error::Transport(SendBusy))
        ));
    }

    #[test]
    fn reset_all_force_transmits() {
        let transport = MockTransport::default();
        let mut session = open_session(&transport, 1);
        session.update(false, false).unwrap();
        assert_eq!(transport.sent().len(), 1);

        session.reset_all().unwrap();
        assert_eq!(transport.sent().len(), 2);
        assert_eq!(transport.sent()[1], vec![0u8]);
    }

    #[test]
    fn zero_report_length_is_a_config_error() {
        assert_eq!(DeviceParams::new(2, 0), Err(ConfigError::ZeroReportLength));
    }

    #[test]
    fn errors_format_without_a_transport_debug_impl() {
        // MockTransport deliberately has no Debug impl; only the send error
        // type needs one.
        let err: Error<MockTransport> = Error::DeviceNotFound;
        assert_eq!(alloc::format!("{err:?}"), "DeviceNotFound");

        let err: Error<MockTransport> = Error::Transport(SendBusy);
        assert_eq!(alloc::format!("{err:?}"), "Transport(SendBusy)");
    }
}
