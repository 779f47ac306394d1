//! Status Word (SW) constants for APDU responses
//!
//! ISO 7816-4 status words indicating command execution results.

/// Status Word constants
pub struct SW;

impl SW {
    // Success
    pub const SUCCESS: u16 = 0x9000;

    // Checking errors
    pub const WRONG_LENGTH: u16 = 0x6700;

    pub const CONDITIONS_NOT_SATISFIED: u16 = 0x6985;

    pub const WRONG_DATA: u16 = 0x6A80;
    pub const FUNCTION_NOT_SUPPORTED: u16 = 0x6A81;
    pub const REFERENCED_DATA_NOT_FOUND: u16 = 0x6A88;

    pub const INS_NOT_SUPPORTED: u16 = 0x6D00;

    /// Short description of a status word, for log lines
    pub fn describe(sw: u16) -> &'static str {
        match sw {
            Self::SUCCESS => "success",
            Self::WRONG_LENGTH => "wrong length",
            Self::CONDITIONS_NOT_SATISFIED => "conditions of use not satisfied",
            Self::WRONG_DATA => "incorrect parameters in data field",
            Self::FUNCTION_NOT_SUPPORTED => "function not supported",
            Self::REFERENCED_DATA_NOT_FOUND => "referenced data not found",
            Self::INS_NOT_SUPPORTED => "instruction not supported",
            _ => "unknown status",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_word_values() {
        assert_eq!(SW::WRONG_DATA, 0x6A80);
        assert_eq!(SW::CONDITIONS_NOT_SATISFIED, 0x6985);
        assert_eq!(SW::FUNCTION_NOT_SUPPORTED, 0x6A81);
        assert_eq!(SW::REFERENCED_DATA_NOT_FOUND, 0x6A88);
        assert_eq!(SW::INS_NOT_SUPPORTED, 0x6D00);
    }

    #[test]
    fn test_describe() {
        assert_eq!(SW::describe(0x9000), "success");
        assert_eq!(SW::describe(0x6A88), "referenced data not found");
        assert_eq!(SW::describe(SW::INS_NOT_SUPPORTED), "instruction not supported");
        assert_eq!(SW::describe(0x1234), "unknown status");
    }
}
