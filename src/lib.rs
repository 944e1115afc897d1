//! avrftdi - AVR in-system programming over the FTDI MPSSE engine
//!
//! This crate drives an in-circuit serial programmer for AVR
//! microcontrollers built on an FTDI FT2232-class chip. The MPSSE engine
//! shifts the ISP clock/data lines while the remaining GPIO pins carry
//! reset, status LEDs and power/buffer enables.
//!
//! # Example
//!
//! ```no_run
//! use avrftdi::{IspConfig, IspSession, Part};
//!
//! let config = IspConfig {
//!     frequency_hz: 250_000,
//!     led_pgm: 5,
//!     ..IspConfig::default()
//! };
//!
//! let part = Part {
//!     name: "ATmega8",
//!     program_enable: Some([0xac, 0x53, 0x00, 0x00]),
//!     chip_erase: Some([0xac, 0x80, 0x00, 0x00]),
//!     poll_index: 3,
//!     poll_value: 0x53,
//!     chip_erase_delay_us: 10_000,
//! };
//!
//! let mut session = IspSession::new(&config)?;
//! session.open_usb()?;
//! session.initialize(&part)?;
//! session.chip_erase(&part)?;
//! session.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Wiring
//!
//! The shift engine fixes the first three pins; everything else is
//! configurable:
//!
//! | Pin  | Signal                     |
//! |------|----------------------------|
//! | 1    | SCK (fixed)                |
//! | 2    | MOSI (fixed)               |
//! | 3    | MISO (fixed)               |
//! | 4-11 | RESET, LEDs, VCC, buffers  |
//!
//! Pin specs carry the pin number in bits 0-6 and an inversion flag in
//! bit 7; the VCC and buffer-enable roles take 12-bit pin masks.
//!
//! # Options
//!
//! [`parse_options`] accepts key=value pairs for hosts that configure
//! programmers from strings:
//!
//! - `vid=<id>` / `pid=<id>` - USB IDs (default: 0403:6010)
//! - `frequency=<hz>` - ISP clock (default: 150000)
//! - `reset=<spec>` - RESET pin spec (default: 4)
//! - `led-pgm=<spec>` / `led-rdy=<spec>` / `led-err=<spec>` /
//!   `led-vfy=<spec>` - status LED pin specs (default: unused)
//! - `vcc=<mask>` / `buff=<mask>` - power and buffer-enable pin masks
//!
//! # ISP clock
//!
//! The clock is derived from the engine's 6 MHz master clock:
//!
//! ```text
//! SCK = 6 MHz / (divisor + 1)
//! ```
//!
//! | Requested | Divisor | Effective  |
//! |-----------|---------|------------|
//! | 6 MHz     | 0       | 6 MHz      |
//! | 1 MHz     | 5       | 1 MHz      |
//! | 150 kHz   | 39      | 150 kHz    |
//! | 92 Hz     | 65216   | ~92 Hz     |
//!
//! Requests outside ~91.553 Hz - 6 MHz are clamped.

mod clock;
mod config;
mod device;
mod error;
mod frame;
mod part;
mod pins;
mod protocol;
mod transport;

pub use clock::{ClockCap, ClockDivisor};
pub use config::{parse_options, IspConfig};
pub use device::{IspSession, Led, Programmer, PROGRAM_ENABLE_ATTEMPTS};
pub use error::{ConfigError, Error, Result, TransportError};
pub use frame::ShiftMode;
pub use part::{IspOpcode, Part, PartDescriptor};
pub use pins::{GpioState, PinMap, PinRole};
pub use protocol::{
    get_device_info, SupportedDevice, DEFAULT_FREQUENCY_HZ, MASTER_CLOCK_HZ, SUPPORTED_DEVICES,
};
pub use transport::{list_devices, BitMode, FtdiTransport, Transport, UsbDeviceInfo};
