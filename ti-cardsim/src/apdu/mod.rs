//! APDU (Application Protocol Data Unit) handling
//!
//! Command and response value types for ISO 7816-4 APDUs as exchanged with
//! the simulated health cards, plus a parser for raw command bytes.
//!
//! # Example
//! ```ignore
//! use ti_cardsim::apdu::{parse_apdu, ApduResponse};
//!
//! // MSE:SET AT as sent by a terminal starting PACE
//! let raw = &[0x00, 0x22, 0xC1, 0xA4, 0x06, 0x80, 0x01, 0x01, 0x83, 0x01, 0x03];
//! let cmd = parse_apdu(raw).unwrap();
//! assert_eq!(cmd.ins, 0x22);
//!
//! let response = ApduResponse::ok();
//! assert!(response.is_success());
//! ```

mod response;
mod status;

pub use response::ApduResponse;
pub use status::SW;

use thiserror::Error;

/// Errors that can occur during APDU parsing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApduError {
    #[error("APDU too short: expected at least 4 bytes, got {0}")]
    TooShort(usize),

    #[error("Invalid APDU length")]
    InvalidLength,

    #[error("Invalid extended APDU format")]
    InvalidExtendedFormat,
}

/// A command APDU
///
/// Handlers only ever see a shared reference, so a received command cannot
/// be altered while it is dispatched.
///
/// An empty `data` vector stands for an absent data field; see
/// [`ApduCommand::data_field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduCommand {
    /// Class byte (CLA)
    pub cla: u8,
    /// Instruction byte (INS)
    pub ins: u8,
    /// Parameter 1 (P1)
    pub p1: u8,
    /// Parameter 2 (P2)
    pub p2: u8,
    /// Command data (may be empty)
    pub data: Vec<u8>,
    /// Expected response length (Le), None if not specified
    pub le: Option<u32>,
}

impl ApduCommand {
    /// Create a new command with just the header (CLA, INS, P1, P2)
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Vec::new(),
            le: None,
        }
    }

    /// Create a new command with data
    pub fn with_data(cla: u8, ins: u8, p1: u8, p2: u8, data: Vec<u8>) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data,
            le: None,
        }
    }

    /// Set the expected response length
    pub fn with_le(mut self, le: u32) -> Self {
        self.le = Some(le);
        self
    }

    /// The data field, or `None` when the command carries no data
    pub fn data_field(&self) -> Option<&[u8]> {
        if self.data.is_empty() {
            None
        } else {
            Some(&self.data)
        }
    }

    /// Get P1-P2 combined as a u16
    pub fn p1p2(&self) -> u16 {
        ((self.p1 as u16) << 8) | (self.p2 as u16)
    }
}

/// Data field and Le decoded from the bytes after the header
type Body = (Vec<u8>, Option<u32>);

/// Parse raw bytes into an [`ApduCommand`]
///
/// The body after CLA INS P1 P2 is read as one of:
/// - short: `[Lc data] [Le]`, Lc and Le one byte each
/// - extended: `00 Lc1 Lc2 data [Le1 Le2]` or `00 Le1 Le2`
///
/// A body starting with `00` that is not a valid extended body is retried as
/// a short body without that byte, which is how some T=1 readers frame
/// short commands.
pub fn parse_apdu(raw: &[u8]) -> Result<ApduCommand, ApduError> {
    let Some((header, body)) = raw.split_first_chunk::<4>() else {
        return Err(ApduError::TooShort(raw.len()));
    };
    let [cla, ins, p1, p2] = *header;

    let (data, le) = match body {
        [0x00, rest @ ..] if rest.len() >= 2 => {
            parse_extended_body(rest).or_else(|_| parse_short_body(rest))?
        }
        _ => parse_short_body(body)?,
    };

    Ok(ApduCommand {
        cla,
        ins,
        p1,
        p2,
        data,
        le,
    })
}

/// Short Le, where 0 stands for 256
fn short_le(byte: u8) -> u32 {
    match byte {
        0 => 256,
        n => n as u32,
    }
}

/// Extended Le, where 0 stands for 65536
fn extended_le(hi: u8, lo: u8) -> u32 {
    match u16::from_be_bytes([hi, lo]) {
        0 => 65536,
        n => n as u32,
    }
}

fn parse_short_body(body: &[u8]) -> Result<Body, ApduError> {
    let (lc, rest) = match body {
        [] => return Ok((Vec::new(), None)),
        [le] => return Ok((Vec::new(), Some(short_le(*le)))),
        [lc, rest @ ..] => (*lc as usize, rest),
    };

    match rest.len().checked_sub(lc) {
        Some(0) => Ok((rest.to_vec(), None)),
        Some(1) => Ok((rest[..lc].to_vec(), Some(short_le(rest[lc])))),
        _ => Err(ApduError::InvalidLength),
    }
}

/// `body` starts after the `00` extended marker
fn parse_extended_body(body: &[u8]) -> Result<Body, ApduError> {
    let (lc, rest) = match body {
        [hi, lo] => return Ok((Vec::new(), Some(extended_le(*hi, *lo)))),
        [hi, lo, rest @ ..] => (u16::from_be_bytes([*hi, *lo]) as usize, rest),
        _ => return Err(ApduError::InvalidExtendedFormat),
    };

    match (rest.len().checked_sub(lc), rest.get(lc..)) {
        (Some(0), _) => Ok((rest.to_vec(), None)),
        (Some(2), Some(&[hi, lo])) => Ok((rest[..lc].to_vec(), Some(extended_le(hi, lo)))),
        _ => Err(ApduError::InvalidExtendedFormat),
    }
}

/// Instruction bytes used by the health card protocols
pub mod ins {
    pub const MANAGE_SECURITY_ENVIRONMENT: u8 = 0x22;
    pub const PSO: u8 = 0x2A;
    pub const GENERAL_AUTHENTICATE: u8 = 0x86;
}

/// MSE:SET P1-P2 values
pub mod mse {
    /// SET for authentication template (P1=0xC1, P2=0xA4), used by PACE
    pub const SET_AT: u16 = 0xC1A4;
    /// SET for digital signature template (P1=0x41, P2=0xA6)
    pub const SET_DST: u16 = 0x41A6;
}

/// PSO (Perform Security Operation) P1-P2 values
pub mod pso {
    /// Compute Digital Signature (P1=0x9E, P2=0x9A)
    pub const CDS: u16 = 0x9E9A;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case1_no_data_no_le() {
        let cmd = parse_apdu(&[0x00, 0x86, 0x00, 0x00]).unwrap();
        assert_eq!(cmd.ins, 0x86);
        assert!(cmd.data.is_empty());
        assert!(cmd.data_field().is_none());
        assert!(cmd.le.is_none());
    }

    #[test]
    fn test_case2_le_only() {
        let cmd = parse_apdu(&[0x00, 0x2A, 0x9E, 0x9A, 0x00]).unwrap();
        assert!(cmd.data.is_empty());
        assert_eq!(cmd.le, Some(256));
    }

    #[test]
    fn test_case3_mse_set_at() {
        let raw = hex::decode("0022C1A406800101830103").unwrap();
        let cmd = parse_apdu(&raw).unwrap();
        assert_eq!(cmd.p1p2(), mse::SET_AT);
        assert_eq!(cmd.data_field(), Some(&[0x80, 0x01, 0x01, 0x83, 0x01, 0x03][..]));
        assert!(cmd.le.is_none());
    }

    #[test]
    fn test_case4_general_authenticate() {
        let raw = hex::decode("10860000077C05850301020300").unwrap();
        let cmd = parse_apdu(&raw).unwrap();
        assert_eq!(cmd.cla, 0x10);
        assert_eq!(cmd.data.len(), 7);
        assert_eq!(cmd.le, Some(256));
    }

    #[test]
    fn test_extended_lc_data_le() {
        let mut raw = vec![0x00, 0x2A, 0x9E, 0x9A, 0x00, 0x01, 0x00];
        raw.extend(vec![0xAB; 256]);
        raw.extend([0x00, 0x00]);
        let cmd = parse_apdu(&raw).unwrap();
        assert_eq!(cmd.p1p2(), pso::CDS);
        assert_eq!(cmd.data.len(), 256);
        assert_eq!(cmd.le, Some(65536));
    }

    #[test]
    fn test_extended_le_only() {
        let cmd = parse_apdu(&[0x00, 0x2A, 0x9E, 0x9A, 0x00, 0x01, 0x00]).unwrap();
        assert!(cmd.data.is_empty());
        assert_eq!(cmd.le, Some(256));

        let cmd = parse_apdu(&[0x00, 0x2A, 0x9E, 0x9A, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(cmd.le, Some(65536));
    }

    #[test]
    fn test_short_body_behind_t1_prefix() {
        // 00 03 84 01 09 is no valid extended body
        let cmd = parse_apdu(&[0x00, 0x22, 0x41, 0xA6, 0x00, 0x03, 0x84, 0x01, 0x09]).unwrap();
        assert_eq!(cmd.p1p2(), mse::SET_DST);
        assert_eq!(cmd.data, vec![0x84, 0x01, 0x09]);
        assert!(cmd.le.is_none());
    }

    #[test]
    fn test_zero_marker_with_bad_lengths() {
        // neither an extended body nor a prefixed short one
        assert_eq!(
            parse_apdu(&[0x00, 0x22, 0x41, 0xA6, 0x00, 0x05, 0x84, 0x01]),
            Err(ApduError::InvalidLength)
        );
    }

    #[test]
    fn test_inconsistent_lc() {
        assert_eq!(
            parse_apdu(&[0x00, 0x22, 0x41, 0xA6, 0x05, 0x84, 0x01]),
            Err(ApduError::InvalidLength)
        );
    }

    #[test]
    fn test_too_short() {
        assert!(matches!(
            parse_apdu(&[0x00, 0x22, 0x41]),
            Err(ApduError::TooShort(3))
        ));
    }
}
