//! Target part descriptor interface
//!
//! Opcode bit layouts live in external part description tables; by the
//! time a command reaches this driver it has already been rendered into a
//! 4-byte buffer by the generic bit-encoding routine. The driver only
//! needs to know whether an opcode exists for the part and how to poll
//! for program-enable acknowledgement.

use std::fmt;

/// ISP opcodes the driver issues itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IspOpcode {
    /// Enter programming mode
    ProgramEnable,
    /// Erase the whole chip
    ChipErase,
}

impl fmt::Display for IspOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IspOpcode::ProgramEnable => f.write_str("Program Enable (PGM_ENABLE)"),
            IspOpcode::ChipErase => f.write_str("Chip Erase (CHIP_ERASE)"),
        }
    }
}

/// Per-part programming parameters supplied by the host's part tables
pub trait PartDescriptor {
    /// Render the command bytes for an opcode, or None if the part does
    /// not define it
    fn command(&self, op: IspOpcode) -> Option<[u8; 4]>;

    /// 1-based index into the 4-byte response polled for program-enable
    /// acknowledgement
    fn poll_index(&self) -> u8;

    /// Expected response byte at the poll index
    fn poll_value(&self) -> u8;

    /// Settle time after chip erase, in microseconds
    fn chip_erase_delay_us(&self) -> u32;
}

/// A literal part table entry
///
/// Useful for hosts without their own descriptor machinery and for tests.
/// The classic AVR ISP values: program enable `AC 53 00 00`, polled at
/// response byte 3 for the echoed `0x53`.
#[derive(Debug, Clone)]
pub struct Part {
    /// Human-readable part name
    pub name: &'static str,
    /// PGM_ENABLE command bytes, if defined
    pub program_enable: Option<[u8; 4]>,
    /// CHIP_ERASE command bytes, if defined
    pub chip_erase: Option<[u8; 4]>,
    /// 1-based poll position in the response
    pub poll_index: u8,
    /// Expected poll byte
    pub poll_value: u8,
    /// Chip erase settle time in microseconds
    pub chip_erase_delay_us: u32,
}

impl PartDescriptor for Part {
    fn command(&self, op: IspOpcode) -> Option<[u8; 4]> {
        match op {
            IspOpcode::ProgramEnable => self.program_enable,
            IspOpcode::ChipErase => self.chip_erase,
        }
    }

    fn poll_index(&self) -> u8 {
        self.poll_index
    }

    fn poll_value(&self) -> u8 {
        self.poll_value
    }

    fn chip_erase_delay_us(&self) -> u32 {
        self.chip_erase_delay_us
    }
}
