//! Simulated German health telematics smartcards
//!
//! A card engine that answers ISO 7816-4 command APDUs the way eGK, HBA,
//! SMC-B and HPC cards do for two flows:
//! - PACE channel establishment (MSE:SET AT, General Authenticate)
//! - qualified signatures (MSE:SET DST, PSO: Compute Digital Signature)
//!
//! Card content comes from JSON card images; see [`card`]. A
//! [`terminal::Terminal`] holds cards in slots, each backed by a
//! [`session::CardSession`] with its own protocol state.
//!
//! # Example
//! ```ignore
//! use ti_cardsim::card::{CardType, SimulatedCard};
//! use ti_cardsim::session::CardSession;
//!
//! let mut session = CardSession::new(SimulatedCard::new("egk", CardType::Egk));
//! session.power_on();
//! let response = session.process_apdu(&[0x00, 0x22, 0xC1, 0xA4, 0x06,
//!     0x80, 0x01, 0x01, 0x83, 0x01, 0x03])?;
//! assert_eq!(response, vec![0x90, 0x00]);
//! ```

pub mod apdu;
pub mod card;
pub mod config;
pub mod crypto;
pub mod protocol;
pub mod session;
pub mod terminal;
pub mod tlv;

pub use apdu::{parse_apdu, ApduCommand, ApduError, ApduResponse, SW};
pub use card::{CardImage, CardType, Key, SimulatedCard};
pub use config::SimulatorConfig;
pub use protocol::{CardProtocol, CardProtocolManager, PaceProtocol, ProtocolError, SignatureProtocol};
pub use session::CardSession;
pub use terminal::{Terminal, TerminalError};
