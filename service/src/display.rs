use std::{convert::Infallible, time::Duration};

use protocol::{Payload, USB_INTERFACE, USB_PID, USB_VID};
use rusb::{Context, DeviceHandle, Direction, TransferType, UsbContext};
use thiserror::Error as ThisError;
use tracing::instrument;

/// Destination of the encoded payloads.
pub trait PayloadSink {
    type Error;

    ///
    /// # Errors
    ///
    /// Returns an error if the payload could not be delivered. Nothing is
    /// read back from the device, so success only means the write went out.
    fn send(&mut self, payload: &Payload) -> Result<(), Self::Error>;
}

/// The USB display.
///
/// The device is opened, claimed and released again on every
/// [`PayloadSink::send`], so unplugging and replugging it needs no special
/// handling. Nothing stops another process from writing to the same device
/// at the same time.
#[derive(Clone, Copy, Debug)]
pub struct UsbDisplay {
    timeout: Duration,
}

impl UsbDisplay {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for UsbDisplay {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT)
    }
}

impl PayloadSink for UsbDisplay {
    type Error = DisplayError;

    #[instrument(skip_all)]
    fn send(&mut self, payload: &Payload) -> Result<(), Self::Error> {
        let handle = Context::new()
            .map_err(DisplayError::setup("initializing libusb"))?
            .open_device_with_vid_pid(USB_VID, USB_PID)
            .ok_or(DisplayError::NotFound)?;

        Session::open(handle)?.write(payload.as_ref(), self.timeout)
    }
}

/// A claimed display interface, released when dropped.
struct Session {
    handle: DeviceHandle<Context>,
    endpoint_address: u8,
    transfer_type: TransferType,
}

impl Session {
    fn open(handle: DeviceHandle<Context>) -> Result<Self, DisplayError> {
        let config_desc = handle
            .device()
            .config_descriptor(0)
            .map_err(DisplayError::setup("config descriptor"))?;

        let (endpoint_address, transfer_type) = config_desc
            .interfaces()
            .filter(|interface| interface.number() == USB_INTERFACE)
            .flat_map(|interface| interface.descriptors())
            .flat_map(|idesc| idesc.endpoint_descriptors())
            .find(|edesc| edesc.direction() == Direction::Out)
            .map(|edesc| (edesc.address(), edesc.transfer_type()))
            .ok_or(DisplayError::EndpointMissing)?;

        if let Ok(true) = handle.kernel_driver_active(USB_INTERFACE) {
            handle
                .detach_kernel_driver(USB_INTERFACE)
                .map_err(DisplayError::setup("detaching kernel driver"))?;
        }

        handle
            .set_active_configuration(config_desc.number())
            .map_err(DisplayError::setup("setting config number"))?;

        handle
            .claim_interface(USB_INTERFACE)
            .map_err(DisplayError::setup("claiming interface"))?;

        Ok(Self {
            handle,
            endpoint_address,
            transfer_type,
        })
    }

    fn write(&self, buf: &[u8], timeout: Duration) -> Result<(), DisplayError> {
        let written = match self.transfer_type {
            TransferType::Interrupt => {
                self.handle
                    .write_interrupt(self.endpoint_address, buf, timeout)
            }
            _ => self.handle.write_bulk(self.endpoint_address, buf, timeout),
        }
        .map_err(DisplayError::Transfer)?;

        if written != buf.len() {
            return Err(DisplayError::ShortWrite {
                written,
                expected: buf.len(),
            });
        }

        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.handle.release_interface(USB_INTERFACE).ok();
    }
}

#[derive(Debug, ThisError)]
pub enum DisplayError {
    #[error("display 2022:0522 not found")]
    NotFound,
    #[error("could not find OUT endpoint")]
    EndpointMissing,
    #[error("{step}: {source}")]
    Setup {
        step: &'static str,
        #[source]
        source: rusb::Error,
    },
    #[error("failed to send payload: {0}")]
    Transfer(#[source] rusb::Error),
    #[error("payload not written: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },
}

impl DisplayError {
    fn setup(step: &'static str) -> impl FnOnce(rusb::Error) -> Self {
        move |source| Self::Setup { step, source }
    }
}

/// Logs payloads instead of writing them, for running without the display.
#[derive(Clone, Copy, Debug, Default)]
pub struct DryRun;

impl PayloadSink for DryRun {
    type Error = Infallible;

    fn send(&mut self, payload: &Payload) -> Result<(), Self::Error> {
        tracing::info!("payload: {payload:x}");
        Ok(())
    }
}
