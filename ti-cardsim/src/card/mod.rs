//! Card images
//!
//! The static content of simulated health cards and how it is loaded.

pub mod atr;
pub mod image;
pub mod storage;

pub use atr::{atr_for_card_type, build_atr};
pub use image::{CardImage, CardType, Key, SimulatedCard};
pub use storage::{CardImageError, CardImageStore};
