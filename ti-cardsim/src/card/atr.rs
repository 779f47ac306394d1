//! ATR (Answer To Reset) handling
//!
//! Builds the ATR a simulated card returns on power up.

use super::image::CardType;

/// Build a T=1 ATR with specific historical bytes
pub fn build_atr(historical_bytes: &[u8]) -> Vec<u8> {
    let mut atr = Vec::with_capacity(32);

    // TS - direct convention
    atr.push(0x3B);

    // T0 - TD1 present, K historical bytes (max 15)
    let hist_len = historical_bytes.len().min(15) as u8;
    atr.push(0x80 | hist_len);

    // TD1 - T=1, no further interface bytes
    atr.push(0x01);

    atr.extend_from_slice(&historical_bytes[..hist_len as usize]);

    // TCK - XOR of T0 up to the last historical byte, required for T=1
    let tck: u8 = atr[1..].iter().fold(0u8, |acc, &b| acc ^ b);
    atr.push(tck);

    atr
}

/// ATR for a card of the given type
///
/// The historical bytes carry the card type name so that terminals can tell
/// simulated cards apart.
pub fn atr_for_card_type(card_type: CardType) -> Vec<u8> {
    build_atr(card_type.as_str().as_bytes())
}
