//! APDU Response handling
//!
//! A response carries optional data plus the 16-bit status word SW1‖SW2.

use super::status::SW;

/// A response APDU
///
/// # Example
/// ```ignore
/// let response = ApduResponse::success(vec![0x01, 0x02]);
/// assert!(response.is_success());
///
/// let error = ApduResponse::error(SW::CONDITIONS_NOT_SATISFIED);
/// assert_eq!(error.to_bytes(), vec![0x69, 0x85]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduResponse {
    /// Response data (without status word)
    pub data: Vec<u8>,
    /// Status word (SW1 in the high byte, SW2 in the low byte)
    pub status_word: u16,
}

impl ApduResponse {
    /// Create a new response with data and status word
    pub fn new(data: Vec<u8>, status_word: u16) -> Self {
        Self { data, status_word }
    }

    /// Create a success response (0x9000) with data
    pub fn success(data: Vec<u8>) -> Self {
        Self::new(data, SW::SUCCESS)
    }

    /// Create an empty success response (0x9000)
    pub fn ok() -> Self {
        Self::success(Vec::new())
    }

    /// Create an error response (no data)
    pub fn error(status_word: u16) -> Self {
        Self::new(Vec::new(), status_word)
    }

    /// Status word 1
    pub fn sw1(&self) -> u8 {
        (self.status_word >> 8) as u8
    }

    /// Status word 2
    pub fn sw2(&self) -> u8 {
        self.status_word as u8
    }

    /// Check if the status word is exactly 0x9000
    pub fn is_success(&self) -> bool {
        self.status_word == SW::SUCCESS
    }

    /// Convert to raw bytes for transmission (data + SW1 + SW2)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.data.len() + 2);
        result.extend_from_slice(&self.data);
        result.push(self.sw1());
        result.push(self.sw2());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response() {
        let resp = ApduResponse::success(vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(resp.is_success());
        assert_eq!(resp.status_word, 0x9000);
        assert_eq!(resp.to_bytes(), vec![0xDE, 0xAD, 0xBE, 0xEF, 0x90, 0x00]);
    }

    #[test]
    fn test_ok_response() {
        let resp = ApduResponse::ok();
        assert!(resp.is_success());
        assert!(resp.data.is_empty());
        assert_eq!(resp.to_bytes(), vec![0x90, 0x00]);
    }

    #[test]
    fn test_error_response() {
        let resp = ApduResponse::error(SW::REFERENCED_DATA_NOT_FOUND);
        assert!(!resp.is_success());
        assert_eq!(resp.sw1(), 0x6A);
        assert_eq!(resp.sw2(), 0x88);
        assert_eq!(resp.to_bytes(), vec![0x6A, 0x88]);
    }
}
