use core::fmt;

use thiserror::Error as ThisError;

use crate::{CHECKSUM_BIAS, HEADER, PAYLOAD_LEN, Reading};

const BODY_START: usize = HEADER.len();
const GPU_START: usize = BODY_START + 3;
const CHECKSUM_IDX: usize = PAYLOAD_LEN - 1;

/// The 12 byte command that updates both temperatures on the display:
///
/// ```text
/// 55 AA 01 01 06 | cpu tens, ones, decimal | gpu tens, ones, decimal | checksum
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payload([u8; PAYLOAD_LEN]);

impl Payload {
    /// Encodes both readings. Unavailable readings are shown as `0.0`.
    #[must_use]
    pub fn new(cpu: Reading, gpu: Reading) -> Self {
        let mut bytes = [0; PAYLOAD_LEN];
        bytes[..BODY_START].copy_from_slice(&HEADER);
        bytes[BODY_START..GPU_START].copy_from_slice(&encode_temperature(cpu.celsius()));
        bytes[GPU_START..CHECKSUM_IDX].copy_from_slice(&encode_temperature(gpu.celsius()));
        bytes[CHECKSUM_IDX] = checksum(&bytes[BODY_START..CHECKSUM_IDX]);
        Self(bytes)
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; PAYLOAD_LEN] {
        &self.0
    }

    #[must_use]
    pub fn cpu_digits(&self) -> [u8; 3] {
        [self.0[BODY_START], self.0[BODY_START + 1], self.0[BODY_START + 2]]
    }

    #[must_use]
    pub fn gpu_digits(&self) -> [u8; 3] {
        [self.0[GPU_START], self.0[GPU_START + 1], self.0[GPU_START + 2]]
    }

    #[inline]
    #[must_use]
    pub fn checksum(&self) -> u8 {
        self.0[CHECKSUM_IDX]
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::LowerHex for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|byte| write!(f, "{byte:02x}"))
    }
}

impl TryFrom<&[u8]> for Payload {
    type Error = PayloadConvError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; PAYLOAD_LEN] = value
            .try_into()
            .map_err(|_| PayloadConvError::Length(value.len()))?;

        if bytes[..BODY_START] != HEADER {
            return Err(PayloadConvError::Header);
        }

        let expected = checksum(&bytes[BODY_START..CHECKSUM_IDX]);
        if bytes[CHECKSUM_IDX] != expected {
            return Err(PayloadConvError::Checksum {
                expected,
                found: bytes[CHECKSUM_IDX],
            });
        }

        Ok(Self(bytes))
    }
}

#[derive(Clone, Copy, Debug, ThisError)]
#[cfg_attr(test, derive(PartialEq))]
pub enum PayloadConvError {
    #[error("expected 12 bytes, got {0}")]
    Length(usize),
    #[error("unknown payload header")]
    Header,
    #[error("checksum mismatch: expected {expected:#04x}, found {found:#04x}")]
    Checksum { expected: u8, found: u8 },
}

/// Splits a temperature into the three digit bytes the display expects:
/// the tens and ones of the integer part, then the first decimal.
///
/// Digits are truncated, never rounded. The encoding is total: values of
/// 100 or more produce a tens byte above 9, negative values wrap the tens
/// byte around 256 and NaN encodes as zero.
#[must_use]
pub fn encode_temperature(celsius: f64) -> [u8; 3] {
    let tens = celsius.div_euclid(10.0);
    let ones = celsius.rem_euclid(10.0);
    let decimal = (celsius * 10.0).rem_euclid(10.0);

    [tens, ones, decimal].map(digit_byte)
}

/// Additive checksum over the six digit bytes.
#[must_use]
pub fn checksum(body: &[u8]) -> u8 {
    body.iter().fold(CHECKSUM_BIAS, |acc, byte| acc.wrapping_add(*byte))
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "the display protocol keeps only the low byte"
)]
fn digit_byte(value: f64) -> u8 {
    value.floor() as i64 as u8
}
