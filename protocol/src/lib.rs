mod payload;
mod reading;

pub use payload::{Payload, PayloadConvError, checksum, encode_temperature};
pub use reading::Reading;

pub const USB_VID: u16 = 0x2022;
pub const USB_PID: u16 = 0x0522;
pub const USB_INTERFACE: u8 = 0;

/// Fixed prefix of every command sent to the display.
pub const HEADER: [u8; 5] = [0x55, 0xAA, 0x01, 0x01, 0x06];
pub const PAYLOAD_LEN: usize = 12;
pub const CHECKSUM_BIAS: u8 = 7;
