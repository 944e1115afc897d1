//! Error types for the ISP driver

use thiserror::Error;

use crate::part::IspOpcode;
use crate::pins::PinRole;

/// Result type for ISP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pin-mapping and option errors, detected before any USB traffic
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A pin definition names pins outside the addressable range
    #[error("{role} pin definition out of range (valid pins 1-11): {pins:?}")]
    PinOutOfRange { role: PinRole, pins: Vec<u8> },

    /// A pin is claimed by more than one role
    #[error("{role} conflicts with an earlier assignment on pin(s) {pins:?}")]
    PinConflict { role: PinRole, pins: Vec<u8> },

    /// The fixed MPSSE wiring constraint is violated
    #[error("invalid pin layout: {0}")]
    PinLayoutInvalid(String),

    /// Unparseable or unknown configuration option
    #[error("invalid option: {0}")]
    InvalidOption(String),
}

/// USB transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to open the USB device
    #[error("failed to open device: {0}")]
    OpenFailed(String),

    /// Failed to select the engine bit mode
    #[error("failed to set bit mode: {0}")]
    ModeSetFailed(String),

    /// Write call failed outright
    #[error("USB write failed: {0}")]
    WriteFailed(String),

    /// Write accepted fewer bytes than the frame requires
    #[error("short USB write: {wrote} of {expected} bytes")]
    WriteShort { wrote: usize, expected: usize },

    /// Read call failed
    #[error("USB read failed: {0}")]
    ReadFailed(String),

    /// Receive deadline exhausted before the full response arrived
    #[error("timed out waiting for {expected} response bytes (got {got})")]
    Timeout { got: usize, expected: usize },

    /// USB enumeration error
    #[error("USB error: {0}")]
    UsbError(String),
}

/// Errors that can occur during ISP operations
#[derive(Debug, Error)]
pub enum Error {
    /// Pin mapping or option error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Transport fault
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The part descriptor does not define the required opcode
    #[error("{0} command not defined for this part")]
    OperationUnsupported(IspOpcode),

    /// The target never acknowledged programming mode
    #[error("program enable failed after {attempts} attempts")]
    ProgramEnableFailed { attempts: u32 },

    /// Operation requires an open session
    #[error("session is not open")]
    NotOpen,
}

impl From<nusb::Error> for TransportError {
    fn from(e: nusb::Error) -> Self {
        TransportError::UsbError(e.to_string())
    }
}
