//! Card protocols
//!
//! Every APDU a card session receives is offered to a chain of protocol
//! handlers. The first handler whose [`CardProtocol::can_handle`] accepts
//! the command processes it; see [`CardProtocolManager`].
//!
//! Protocol failures (wrong data, missing preconditions, unknown key) are
//! reported as status words inside an `Ok` response. `Err` is reserved for
//! internal faults such as a card image holding an undecodable key.

pub mod manager;
pub mod pace;
pub mod security_state;
pub mod signature;

pub use manager::CardProtocolManager;
pub use pace::PaceProtocol;
pub use security_state::{PaceSession, PaceState, SignatureSession};
pub use signature::SignatureProtocol;

pub use crate::tlv::{extract_tlv_value, hex_encode};

use std::any::Any;

use thiserror::Error;

use crate::apdu::{ApduCommand, ApduResponse};
use crate::card::CardImage;
use crate::crypto::CryptoError;

/// Internal faults raised while processing a command
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Key {key} could not be used: {source}")]
    Crypto {
        key: String,
        #[source]
        source: CryptoError,
    },
}

/// A handler for a family of commands
pub trait CardProtocol: Send {
    /// Stable protocol name, e.g. `"PACE"`
    fn protocol_name(&self) -> &'static str;

    /// Whether this handler claims the command. Must not change state.
    fn can_handle(&self, command: &ApduCommand) -> bool;

    /// Process a command previously accepted by `can_handle`
    fn process_command(
        &mut self,
        card: &dyn CardImage,
        command: &ApduCommand,
    ) -> Result<ApduResponse, ProtocolError>;

    /// Return to the initial state
    fn reset(&mut self);

    /// Typed access for [`CardProtocolManager`] lookups
    fn as_any(&self) -> &dyn Any;
}

/// `9000` with no data
pub fn create_success_response() -> ApduResponse {
    ApduResponse::ok()
}

/// `sw` with no data
pub fn create_error_response(sw: u16) -> ApduResponse {
    ApduResponse::error(sw)
}
