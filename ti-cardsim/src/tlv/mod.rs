//! TLV (Tag-Length-Value) decoding
//!
//! PACE and MSE:SET data fields are sequences of one-byte-tag,
//! one-byte-length elements. General Authenticate wraps its elements in a
//! single constructed "Dynamic Authentication Data" object (tag `0x7C`).
//!
//! # Example
//! ```ignore
//! use ti_cardsim::tlv::{extract_tlv_value, tags};
//!
//! let data = [0x7C, 0x05, 0x85, 0x03, 0x01, 0x02, 0x03];
//! let mapping = extract_tlv_value(Some(&data), tags::PACE_MAPPING_DATA);
//! assert_eq!(mapping, Some(vec![0x01, 0x02, 0x03]));
//! ```

mod parser;

pub use parser::{find_tag, read_list, Tlv};

/// Extract the value of the first element carrying `tag`
///
/// The top level of `data` is searched first. When the tag does not occur
/// there, the search descends one level into the first
/// [`tags::DYNAMIC_AUTHENTICATION_DATA`] wrapper.
///
/// Returns `None` when `data` is absent, shorter than two bytes, or does not
/// contain the tag.
pub fn extract_tlv_value(data: Option<&[u8]>, tag: u8) -> Option<Vec<u8>> {
    let data = data?;
    if data.len() < 2 {
        return None;
    }

    if let Some(tlv) = find_tag(data, tag) {
        return Some(tlv.value);
    }

    let wrapper = find_tag(data, tags::DYNAMIC_AUTHENTICATION_DATA)?;
    find_tag(&wrapper.value, tag).map(|tlv| tlv.value)
}

/// Lower-case hex rendering of a byte buffer
///
/// An absent buffer renders as the literal `"null"`, an empty one as `""`.
/// Log lines and key reference matching both rely on this exact mapping.
pub fn hex_encode(data: Option<&[u8]>) -> String {
    match data {
        Some(bytes) => hex::encode(bytes),
        None => "null".to_string(),
    }
}

/// Tags used by the PACE and signature protocols
pub mod tags {
    /// Cryptographic mechanism reference (MSE:SET AT)
    pub const CRYPTOGRAPHIC_MECHANISM: u8 = 0x80;
    /// Reference of a password / secret key (MSE:SET AT)
    pub const PASSWORD_REFERENCE: u8 = 0x83;
    /// Reference of a private key (MSE:SET DST)
    pub const PRIVATE_KEY_REFERENCE: u8 = 0x84;
    /// PACE mapping data (General Authenticate step 2)
    pub const PACE_MAPPING_DATA: u8 = 0x85;
    /// PACE authentication token (General Authenticate mutual authentication)
    pub const PACE_AUTHENTICATION_TOKEN: u8 = 0x8E;
    /// Dynamic Authentication Data wrapper
    pub const DYNAMIC_AUTHENTICATION_DATA: u8 = 0x7C;
}
