//! USB transport abstraction
//!
//! The session talks to the serial engine through the `Transport` trait so
//! the protocol logic can be exercised against a scripted transport in
//! tests. The real implementation wraps libftdi1 via the `ftdi` crate.

use crate::error::TransportError;
use crate::protocol::get_device_info;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Engine bit modes selectable on the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitMode {
    /// Plain UART/FIFO mode
    Reset,
    /// MPSSE bit-bang/shift engine
    Mpsse,
}

/// Blocking byte transport to the serial engine
pub trait Transport {
    /// Select the engine bit mode, passing the low-byte direction mask
    fn set_mode(&mut self, direction_low: u8, mode: BitMode) -> Result<()>;

    /// Write bytes, returning how many the transport accepted
    ///
    /// A short write is reported through the return value; the caller
    /// treats it as fatal to the operation.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Read bytes into `buf`, returning how many arrived
    ///
    /// The engine is non-blocking on the wire: 0 is a valid result and the
    /// caller retries until its expected total is satisfied.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Cheap liveness query
    ///
    /// `close` probes the handle before tearing anything down so that a
    /// half-initialized transport is never asked to shut down.
    fn probe(&mut self) -> Result<()>;

    /// Shut the transport down
    fn close(&mut self) -> Result<()>;
}

/// FTDI USB transport over libftdi1
pub struct FtdiTransport {
    device: ftdi::Device,
}

impl FtdiTransport {
    /// Open the device by VID/PID on interface A (the only MPSSE-capable
    /// channel on FT2232-class parts)
    pub fn open(vid: u16, pid: u16) -> Result<Self> {
        log::debug!("looking for FTDI device VID={:04X} PID={:04X}", vid, pid);

        let mut device = ftdi::find_by_vid_pid(vid, pid)
            .interface(ftdi::Interface::A)
            .open()
            .map_err(|e| TransportError::OpenFailed(e.to_string()))?;

        log::info!("opened FTDI device VID={:04X} PID={:04X}", vid, pid);

        device
            .usb_reset()
            .map_err(|e| TransportError::OpenFailed(format!("USB reset failed: {}", e)))?;

        // 2ms latency timer for responsive short reads
        device
            .set_latency_timer(2)
            .map_err(|e| TransportError::OpenFailed(format!("set latency timer failed: {}", e)))?;

        Ok(FtdiTransport { device })
    }
}

impl Transport for FtdiTransport {
    fn set_mode(&mut self, direction_low: u8, mode: BitMode) -> Result<()> {
        let bitmode = match mode {
            BitMode::Reset => ftdi::BitMode::Reset,
            BitMode::Mpsse => ftdi::BitMode::Mpsse,
        };
        self.device
            .set_bitmode(direction_low, bitmode)
            .map_err(|e| TransportError::ModeSetFailed(e.to_string()))
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        use std::io::Write;
        let n = self
            .device
            .write(data)
            .map_err(|e| TransportError::WriteFailed(e.to_string()))?;
        log::trace!("sent {} of {} bytes", n, data.len());
        Ok(n)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        use std::io::Read;
        let n = self
            .device
            .read(buf)
            .map_err(|e| TransportError::ReadFailed(e.to_string()))?;
        if n > 0 {
            log::trace!("received {} bytes", n);
        }
        Ok(n)
    }

    fn probe(&mut self) -> Result<()> {
        // Reading the latency timer is a harmless control transfer that
        // fails when the handle never came up or already died.
        self.device
            .latency_timer()
            .map(|_| ())
            .map_err(|e| TransportError::ReadFailed(e.to_string()))
    }

    fn close(&mut self) -> Result<()> {
        // libftdi releases the USB handle when the device is dropped
        Ok(())
    }
}

/// Information about a connected candidate device
#[derive(Debug, Clone)]
pub struct UsbDeviceInfo {
    /// USB bus number
    pub bus: u8,
    /// USB device address
    pub address: u8,
    /// Vendor ID
    pub vendor_id: u16,
    /// Product ID
    pub product_id: u16,
    /// Vendor name
    pub vendor_name: &'static str,
    /// Device name
    pub device_name: &'static str,
    /// Serial number (if available)
    pub serial: Option<String>,
}

impl std::fmt::Display for UsbDeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} at bus {} address {} ({:04X}:{:04X})",
            self.vendor_name,
            self.device_name,
            self.bus,
            self.address,
            self.vendor_id,
            self.product_id
        )
    }
}

/// List connected FTDI devices usable for ISP
pub fn list_devices() -> Result<Vec<UsbDeviceInfo>> {
    let mut devices = Vec::new();

    for dev in nusb::list_devices()? {
        let vid = dev.vendor_id();
        let pid = dev.product_id();

        if let Some(info) = get_device_info(vid, pid) {
            devices.push(UsbDeviceInfo {
                bus: dev.bus_number(),
                address: dev.device_address(),
                vendor_id: vid,
                product_id: pid,
                vendor_name: info.vendor_name,
                device_name: info.device_name,
                serial: dev.serial_number().map(str::to_string),
            });
        }
    }

    Ok(devices)
}
