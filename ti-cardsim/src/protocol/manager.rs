//! Protocol dispatch
//!
//! The manager holds the protocol handlers of one card session in a fixed
//! order. Registration order decides which handler wins when more than one
//! accepts a command.

use log::debug;

use super::{CardProtocol, PaceProtocol, ProtocolError, SignatureProtocol};
use crate::apdu::{ApduCommand, ApduResponse};
use crate::card::CardImage;

/// Ordered registry of protocol handlers
#[derive(Default)]
pub struct CardProtocolManager {
    protocols: Vec<Box<dyn CardProtocol>>,
}

impl CardProtocolManager {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The handlers every card session starts with: PACE, then signature
    pub fn for_session() -> Self {
        let mut manager = Self::new();
        manager.register(Box::new(PaceProtocol::new()));
        manager.register(Box::new(SignatureProtocol::new()));
        manager
    }

    /// Append a handler after all registered ones
    pub fn register(&mut self, protocol: Box<dyn CardProtocol>) {
        debug!("Registering protocol {}", protocol.protocol_name());
        self.protocols.push(protocol);
    }

    /// Offer a command to the handlers in order
    ///
    /// Returns `Ok(None)` when no handler accepts the command.
    pub fn process_command(
        &mut self,
        card: &dyn CardImage,
        command: &ApduCommand,
    ) -> Result<Option<ApduResponse>, ProtocolError> {
        for protocol in self.protocols.iter_mut() {
            if protocol.can_handle(command) {
                debug!(
                    "{} handles CLA={:02X} INS={:02X}",
                    protocol.protocol_name(),
                    command.cla,
                    command.ins
                );
                return protocol.process_command(card, command).map(Some);
            }
        }

        debug!(
            "No protocol for CLA={:02X} INS={:02X} P1={:02X} P2={:02X}",
            command.cla, command.ins, command.p1, command.p2
        );
        Ok(None)
    }

    /// Reset every handler, in registration order
    pub fn reset_all_protocols(&mut self) {
        for protocol in self.protocols.iter_mut() {
            protocol.reset();
        }
    }

    /// Look up a handler by name, ignoring ASCII case
    pub fn protocol_by_name(&self, name: &str) -> Option<&dyn CardProtocol> {
        self.protocols
            .iter()
            .find(|protocol| protocol.protocol_name().eq_ignore_ascii_case(name))
            .map(|protocol| protocol.as_ref())
    }

    /// The first registered PACE handler
    pub fn pace_protocol(&self) -> Option<&PaceProtocol> {
        self.find_protocol::<PaceProtocol>()
    }

    /// The first registered signature handler
    pub fn signature_protocol(&self) -> Option<&SignatureProtocol> {
        self.find_protocol::<SignatureProtocol>()
    }

    fn find_protocol<P: 'static>(&self) -> Option<&P> {
        self.protocols
            .iter()
            .find_map(|protocol| protocol.as_any().downcast_ref::<P>())
    }

    pub fn protocol_names(&self) -> Vec<&'static str> {
        self.protocols.iter().map(|p| p.protocol_name()).collect()
    }

    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }
}
