//! Simple-TLV reader
//!
//! Health card authentication data uses one-byte tags and one-byte lengths.
//! Long-form lengths are not supported: a length byte is always taken
//! literally.

/// A single TLV element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    /// One-byte tag
    pub tag: u8,
    /// The raw value bytes
    pub value: Vec<u8>,
}

impl Tlv {
    /// Create a new TLV
    pub fn new(tag: u8, value: Vec<u8>) -> Self {
        Self { tag, value }
    }
}

/// Walk the top level of `data` and return every complete TLV element
///
/// The walk stops at the first element whose header or value runs past the
/// end of the buffer.
pub fn read_list(data: &[u8]) -> Vec<Tlv> {
    let mut result = Vec::new();
    let mut offset = 0;

    while offset + 2 <= data.len() {
        let tag = data[offset];
        let length = data[offset + 1] as usize;
        let start = offset + 2;

        if start + length > data.len() {
            break;
        }

        result.push(Tlv::new(tag, data[start..start + length].to_vec()));
        offset = start + length;
    }

    result
}

/// Return the first top-level element carrying `tag`
pub fn find_tag(data: &[u8], tag: u8) -> Option<Tlv> {
    read_list(data).into_iter().find(|tlv| tlv.tag == tag)
}
