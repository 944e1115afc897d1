//! ISP programmer session
//!
//! `IspSession` owns the transport handle and the live GPIO masks and
//! sequences the reset / program-enable / chip-erase state machine on top
//! of the MPSSE frame codec. All I/O is blocking and single-threaded; the
//! session provides no internal locking, so sharing one across threads
//! requires an external mutex.

use std::thread;
use std::time::{Duration, Instant};

use crate::clock::ClockDivisor;
use crate::config::IspConfig;
use crate::error::{ConfigError, Error, Result, TransportError};
use crate::frame::{self, ShiftMode};
use crate::part::{IspOpcode, PartDescriptor};
use crate::pins::{GpioState, PinMap, PinRole};
use crate::protocol::ISP_CMD_LEN;
use crate::transport::{BitMode, FtdiTransport, Transport};

/// Bounded retry count of the program-enable handshake
pub const PROGRAM_ENABLE_ATTEMPTS: u32 = 4;

/// Reset pulse width and post-reset settle time. 20 ms covers at least
/// two target clock cycles down to the slowest expected target clock.
const RESET_SETTLE: Duration = Duration::from_millis(20);

/// Reset pulse between program-enable retries
const RETRY_PULSE: Duration = Duration::from_micros(20);

/// Poll interval while waiting for response bytes
const READ_POLL: Duration = Duration::from_micros(100);

/// Deadline on accumulating a full response
const READ_DEADLINE: Duration = Duration::from_secs(2);

/// Status LEDs exposed through the driver surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Led {
    /// Programming in progress
    Pgm,
    /// Ready
    Rdy,
    /// Error
    Err,
    /// Verifying
    Vfy,
}

impl Led {
    fn role(self) -> PinRole {
        match self {
            Led::Pgm => PinRole::LedPgm,
            Led::Rdy => PinRole::LedRdy,
            Led::Err => PinRole::LedErr,
            Led::Vfy => PinRole::LedVfy,
        }
    }
}

/// Capability surface a host framework binds into its programmer registry
pub trait Programmer {
    /// Drive the target into programming mode
    fn initialize(&mut self, part: &dyn PartDescriptor) -> Result<()>;

    /// Run the program-enable handshake
    fn program_enable(&mut self, part: &dyn PartDescriptor) -> Result<()>;

    /// Erase the whole chip and re-enter programming mode
    fn chip_erase(&mut self, part: &dyn PartDescriptor) -> Result<()>;

    /// Issue one 4-byte ISP command and return the 4-byte response
    fn cmd(&mut self, command: [u8; ISP_CMD_LEN]) -> Result<[u8; ISP_CMD_LEN]>;

    /// Switch a status LED
    fn set_led(&mut self, led: Led, on: bool) -> Result<()>;

    /// Enable the level-shift buffers, if wired
    fn enable(&mut self) -> Result<()>;

    /// Disable the level-shift buffers, if wired
    fn disable(&mut self) -> Result<()>;

    /// Shut the session down (idempotent)
    fn close(&mut self) -> Result<()>;
}

/// An ISP programming session over one MPSSE transport
pub struct IspSession<T: Transport> {
    pins: PinMap,
    gpio: GpioState,
    transport: Option<T>,
    vid: u16,
    pid: u16,
    frequency_hz: u32,
    read_deadline: Duration,
}

impl<T: Transport> IspSession<T> {
    /// Build a session from configuration, resolving and validating the
    /// pin mapping
    ///
    /// The session starts closed; attach a transport with [`open`] or
    /// [`open_usb`](IspSession::open_usb).
    ///
    /// [`open`]: IspSession::open
    pub fn new(config: &IspConfig) -> std::result::Result<Self, ConfigError> {
        let mut pins = PinMap::new();
        pins.assign_single(PinRole::Sck, config.sck)?;
        pins.assign_single(PinRole::Mosi, config.mosi)?;
        pins.assign_single(PinRole::Miso, config.miso)?;
        pins.assign_single(PinRole::Reset, config.reset)?;
        pins.assign_group(PinRole::Vcc, config.vcc)?;
        pins.assign_group(PinRole::Buff, config.buff)?;
        pins.assign_single(PinRole::LedErr, config.led_err)?;
        pins.assign_single(PinRole::LedRdy, config.led_rdy)?;
        pins.assign_single(PinRole::LedPgm, config.led_pgm)?;
        pins.assign_single(PinRole::LedVfy, config.led_vfy)?;
        pins.validate_layout()?;

        log::debug!(
            "pin direction mask: {:#06x}, inversion mask: {:#06x}",
            pins.direction(),
            pins.inversion()
        );

        let gpio = pins.gpio_state();
        Ok(IspSession {
            pins,
            gpio,
            transport: None,
            vid: config.vid,
            pid: config.pid,
            frequency_hz: config.frequency_hz,
            read_deadline: READ_DEADLINE,
        })
    }

    /// Whether a transport is attached
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Attach a transport: select MPSSE mode and program the clock divisor
    ///
    /// The transport is only stored once the whole sequence succeeded; on
    /// any failure it is dropped here and the session stays closed.
    pub fn open(&mut self, mut transport: T) -> Result<()> {
        transport.set_mode((self.pins.direction() & 0xff) as u8, BitMode::Mpsse)?;

        let clock = ClockDivisor::from_hz(self.frequency_hz);
        let frame = clock.frame();
        let wrote = transport.write(&frame)?;
        if wrote != frame.len() {
            return Err(TransportError::WriteShort {
                wrote,
                expected: frame.len(),
            }
            .into());
        }
        log::info!(
            "ISP clock {} Hz (divisor {:#06x})",
            clock.effective_hz(),
            clock.divisor
        );

        self.transport = Some(transport);
        Ok(())
    }

    /// Write a logical level to a single-pin role
    ///
    /// The inversion mask is applied here, only the role's own value bit
    /// changes, and the full GPIO frame is flushed immediately. Roles left
    /// unwired are a no-op.
    pub fn set_pin(&mut self, role: PinRole, level: bool) -> Result<()> {
        let Some(pin) = self.pins.pin(role) else {
            log::trace!("{} not wired, ignoring", role);
            return Ok(());
        };
        self.gpio.write_pin(pin, level);
        self.flush_gpio()
    }

    fn set_group(&mut self, role: PinRole, level: bool) -> Result<()> {
        let mask = self.pins.group_mask(role);
        if mask == 0 {
            return Ok(());
        }
        self.gpio.write_mask(mask, level);
        self.flush_gpio()
    }

    fn flush_gpio(&mut self) -> Result<()> {
        log::trace!(
            "direction: {:#06x}, value: {:#06x}, inversion: {:#06x}",
            self.gpio.direction,
            self.gpio.value,
            self.gpio.inversion
        );
        let frame = frame::gpio_set(&self.gpio);
        self.write_all(&frame)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(Error::NotOpen)?;
        let wrote = transport.write(data)?;
        if wrote != data.len() {
            return Err(TransportError::WriteShort {
                wrote,
                expected: data.len(),
            }
            .into());
        }
        Ok(())
    }

    /// Shift `payload` out and/or clock `response.len()` bytes back in
    fn transmit(&mut self, mode: ShiftMode, payload: &[u8], response: &mut [u8]) -> Result<()> {
        if mode.contains(ShiftMode::TX) {
            let frame = frame::shift(mode, payload);
            self.write_all(&frame)?;
        }

        if mode.contains(ShiftMode::RX) {
            let transport = self.transport.as_mut().ok_or(Error::NotOpen)?;
            let expected = response.len();
            let deadline = Instant::now() + self.read_deadline;
            let mut got = 0;
            while got < expected {
                let n = transport.read(&mut response[got..])?;
                got += n;
                if n == 0 {
                    if Instant::now() >= deadline {
                        return Err(TransportError::Timeout { got, expected }.into());
                    }
                    thread::sleep(READ_POLL);
                }
            }
        }
        Ok(())
    }

    /// The fixed 4-byte command/response exchange underlying every ISP
    /// command
    pub fn cmd(&mut self, command: [u8; ISP_CMD_LEN]) -> Result<[u8; ISP_CMD_LEN]> {
        let mut response = [0u8; ISP_CMD_LEN];
        self.transmit(ShiftMode::TRX, &command, &mut response)?;
        Ok(response)
    }

    /// Reset the target into a known state and run the program-enable
    /// handshake
    pub fn initialize(&mut self, part: &dyn PartDescriptor) -> Result<()> {
        self.set_pin(PinRole::Reset, false)?;
        self.set_pin(PinRole::Sck, false)?;
        thread::sleep(RESET_SETTLE);

        // Reset pulse of at least two target clock cycles
        self.set_pin(PinRole::Reset, true)?;
        thread::sleep(RESET_SETTLE);

        self.set_pin(PinRole::Reset, false)?;
        // Settle before the first command reaches the target
        thread::sleep(RESET_SETTLE);

        self.program_enable(part)
    }

    /// Send the program-enable command until the target acknowledges it
    ///
    /// Polls the configured response byte; on mismatch pulses reset and
    /// retries, up to [`PROGRAM_ENABLE_ATTEMPTS`] total attempts. Running
    /// out of attempts is an operation result, not a session failure -
    /// callers may retry at a lower clock frequency.
    pub fn program_enable(&mut self, part: &dyn PartDescriptor) -> Result<()> {
        let command = part
            .command(IspOpcode::ProgramEnable)
            .ok_or(Error::OperationUnsupported(IspOpcode::ProgramEnable))?;

        let poll_index = part.poll_index() as usize;
        if poll_index == 0 || poll_index > ISP_CMD_LEN {
            return Err(ConfigError::InvalidOption(format!(
                "poll index {} outside the {}-byte response",
                poll_index, ISP_CMD_LEN
            ))
            .into());
        }

        for attempt in 1..=PROGRAM_ENABLE_ATTEMPTS {
            let response = self.cmd(command)?;
            if response[poll_index - 1] == part.poll_value() {
                log::debug!("program enable acknowledged on attempt {}", attempt);
                return Ok(());
            }

            log::debug!(
                "program enable poll mismatch ({:#04x} != {:#04x}), pulsing reset",
                response[poll_index - 1],
                part.poll_value()
            );
            self.set_pin(PinRole::Reset, true)?;
            thread::sleep(RETRY_PULSE);
            self.set_pin(PinRole::Reset, false)?;
        }

        Err(Error::ProgramEnableFailed {
            attempts: PROGRAM_ENABLE_ATTEMPTS,
        })
    }

    /// Erase the whole chip
    ///
    /// A full erase clears the programming-enable state on the target, so
    /// the session re-runs [`initialize`](IspSession::initialize) after
    /// the part's erase delay.
    pub fn chip_erase(&mut self, part: &dyn PartDescriptor) -> Result<()> {
        let command = part
            .command(IspOpcode::ChipErase)
            .ok_or(Error::OperationUnsupported(IspOpcode::ChipErase))?;

        self.cmd(command)?;
        thread::sleep(Duration::from_micros(part.chip_erase_delay_us() as u64));
        self.initialize(part)
    }

    /// Switch a status LED
    ///
    /// Transport errors propagate but do not invalidate the session;
    /// unwired LEDs are a no-op.
    pub fn set_led(&mut self, led: Led, on: bool) -> Result<()> {
        self.set_pin(led.role(), on)
    }

    /// Drive the buffer-enable group active
    pub fn enable(&mut self) -> Result<()> {
        self.set_group(PinRole::Buff, true)
    }

    /// Drive the buffer-enable group inactive
    pub fn disable(&mut self) -> Result<()> {
        self.set_group(PinRole::Buff, false)
    }

    /// Park the target in reset and tear the transport down
    ///
    /// Idempotent, and safe after a failed `open`: the transport is probed
    /// first and teardown is skipped when the probe fails, so a
    /// half-initialized handle is never shut down.
    pub fn close(&mut self) -> Result<()> {
        let Some(transport) = self.transport.as_mut() else {
            return Ok(());
        };

        if transport.probe().is_err() {
            log::warn!("transport unresponsive on close, skipping teardown");
            self.transport = None;
            return Ok(());
        }

        self.set_pin(PinRole::Reset, true)?;
        if let Some(mut transport) = self.transport.take() {
            transport.close()?;
        }
        Ok(())
    }
}

impl IspSession<FtdiTransport> {
    /// Open the configured USB device and attach it
    pub fn open_usb(&mut self) -> Result<()> {
        let transport = FtdiTransport::open(self.vid, self.pid)?;
        self.open(transport)
    }
}

impl<T: Transport> Drop for IspSession<T> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("close on drop failed: {}", e);
        }
    }
}

impl<T: Transport> Programmer for IspSession<T> {
    fn initialize(&mut self, part: &dyn PartDescriptor) -> Result<()> {
        IspSession::initialize(self, part)
    }

    fn program_enable(&mut self, part: &dyn PartDescriptor) -> Result<()> {
        IspSession::program_enable(self, part)
    }

    fn chip_erase(&mut self, part: &dyn PartDescriptor) -> Result<()> {
        IspSession::chip_erase(self, part)
    }

    fn cmd(&mut self, command: [u8; ISP_CMD_LEN]) -> Result<[u8; ISP_CMD_LEN]> {
        IspSession::cmd(self, command)
    }

    fn set_led(&mut self, led: Led, on: bool) -> Result<()> {
        IspSession::set_led(self, led, on)
    }

    fn enable(&mut self) -> Result<()> {
        IspSession::enable(self)
    }

    fn disable(&mut self) -> Result<()> {
        IspSession::disable(self)
    }

    fn close(&mut self) -> Result<()> {
        IspSession::close(self)
    }
}
