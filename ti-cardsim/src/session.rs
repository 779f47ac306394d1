//! Card sessions
//!
//! A [`CardSession`] is one simulated card sitting in a reader: the static
//! card image plus the protocol state built up by the commands received
//! since the last power-up.

use log::{debug, error, info};

use crate::apdu::{parse_apdu, ApduCommand, ApduResponse, SW};
use crate::card::{atr_for_card_type, CardImage, SimulatedCard};
use crate::protocol::{CardProtocolManager, ProtocolError};

/// A simulated card with its per-session protocol state
pub struct CardSession {
    card: SimulatedCard,
    protocols: CardProtocolManager,
    atr: Vec<u8>,
    powered: bool,
}

impl CardSession {
    /// Create an unpowered session with the default protocol handlers
    pub fn new(card: SimulatedCard) -> Self {
        Self::with_protocols(card, CardProtocolManager::for_session())
    }

    /// Create an unpowered session with custom protocol handlers
    pub fn with_protocols(card: SimulatedCard, protocols: CardProtocolManager) -> Self {
        let atr = atr_for_card_type(card.card_type());
        Self {
            card,
            protocols,
            atr,
            powered: false,
        }
    }

    /// Power on the card, returning its ATR
    pub fn power_on(&mut self) -> Vec<u8> {
        self.powered = true;
        info!("{} card {} powered on", self.card.card_type, self.card.id);
        self.atr.clone()
    }

    /// Power off the card, dropping all protocol state
    pub fn power_off(&mut self) {
        self.powered = false;
        self.protocols.reset_all_protocols();
        info!("{} card {} powered off", self.card.card_type, self.card.id);
    }

    /// Warm reset: drop protocol state, stay powered
    pub fn reset(&mut self) -> Vec<u8> {
        self.protocols.reset_all_protocols();
        self.powered = true;
        info!("{} card {} reset", self.card.card_type, self.card.id);
        self.atr.clone()
    }

    /// Process a parsed command
    pub fn transmit(&mut self, command: &ApduCommand) -> Result<ApduResponse, ProtocolError> {
        if !self.powered {
            debug!("Command to unpowered card {}", self.card.id);
            return Ok(ApduResponse::error(SW::CONDITIONS_NOT_SATISFIED));
        }

        debug!(
            "Processing APDU: CLA={:02X} INS={:02X} P1={:02X} P2={:02X}",
            command.cla, command.ins, command.p1, command.p2
        );

        let response = match self.protocols.process_command(&self.card, command) {
            Ok(Some(response)) => response,
            Ok(None) => ApduResponse::error(SW::INS_NOT_SUPPORTED),
            Err(e) => {
                error!("Card {} failed to process INS={:02X}: {}", self.card.id, command.ins, e);
                return Err(e);
            }
        };

        debug!(
            "Response SW={:04X} ({}), {} data bytes",
            response.status_word,
            SW::describe(response.status_word),
            response.data.len()
        );
        Ok(response)
    }

    /// Process a raw command APDU, returning `data || SW1 || SW2`
    pub fn process_apdu(&mut self, apdu_bytes: &[u8]) -> Result<Vec<u8>, ProtocolError> {
        if !self.powered {
            return Ok(ApduResponse::error(SW::CONDITIONS_NOT_SATISFIED).to_bytes());
        }

        let command = match parse_apdu(apdu_bytes) {
            Ok(command) => command,
            Err(e) => {
                debug!("Failed to parse APDU {}: {}", hex::encode(apdu_bytes), e);
                return Ok(ApduResponse::error(SW::WRONG_LENGTH).to_bytes());
            }
        };

        self.transmit(&command).map(|response| response.to_bytes())
    }

    pub fn card(&self) -> &SimulatedCard {
        &self.card
    }

    pub fn atr(&self) -> &[u8] {
        &self.atr
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    /// The protocol handlers, for inspecting session state
    pub fn protocols(&self) -> &CardProtocolManager {
        &self.protocols
    }

    /// Whether PACE completed since the last power-up
    pub fn is_trusted_channel_established(&self) -> bool {
        self.protocols
            .pace_protocol()
            .map(|pace| pace.is_trusted_channel_established())
            .unwrap_or(false)
    }
}
