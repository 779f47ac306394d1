//! Card terminal
//!
//! A terminal is a reader with a fixed number of slots. Each occupied slot
//! holds one [`CardSession`] behind a mutex, so APDUs for one card are
//! processed one at a time while different slots stay independent.

use std::sync::Arc;

use log::{debug, info};
use parking_lot::Mutex;
use thiserror::Error;

use crate::card::SimulatedCard;
use crate::protocol::ProtocolError;
use crate::session::CardSession;

/// Errors from slot handling
#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("Invalid slot {slot}, terminal has {count} slots")]
    InvalidSlot { slot: usize, count: usize },

    #[error("Slot {0} already holds a card")]
    SlotOccupied(usize),

    #[error("No card in slot {0}")]
    NoCard(usize),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// A shared handle to the session in a slot
pub type SharedSession = Arc<Mutex<CardSession>>;

/// A simulated card terminal
pub struct Terminal {
    name: String,
    slots: Vec<Option<SharedSession>>,
}

impl Terminal {
    pub fn new(name: impl Into<String>, slot_count: usize) -> Self {
        Self {
            name: name.into(),
            slots: vec![None; slot_count],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, slot: usize) -> Result<&Option<SharedSession>, TerminalError> {
        self.slots.get(slot).ok_or(TerminalError::InvalidSlot {
            slot,
            count: self.slots.len(),
        })
    }

    /// Insert a card into an empty slot; the card stays unpowered
    pub fn insert_card(&mut self, slot: usize, card: SimulatedCard) -> Result<(), TerminalError> {
        if self.slot(slot)?.is_some() {
            return Err(TerminalError::SlotOccupied(slot));
        }

        info!("{}: {} card {} inserted into slot {}", self.name, card.card_type, card.id, slot);
        self.slots[slot] = Some(Arc::new(Mutex::new(CardSession::new(card))));
        Ok(())
    }

    /// Remove the card from a slot, powering it off
    pub fn remove_card(&mut self, slot: usize) -> Result<SimulatedCard, TerminalError> {
        self.slot(slot)?;
        let session = self.slots[slot].take().ok_or(TerminalError::NoCard(slot))?;

        let mut session = session.lock();
        session.power_off();
        info!("{}: card {} removed from slot {}", self.name, session.card().id, slot);
        Ok(session.card().clone())
    }

    pub fn is_card_present(&self, slot: usize) -> bool {
        matches!(self.slots.get(slot), Some(Some(_)))
    }

    /// The session in a slot
    pub fn session(&self, slot: usize) -> Result<SharedSession, TerminalError> {
        self.slot(slot)?
            .as_ref()
            .cloned()
            .ok_or(TerminalError::NoCard(slot))
    }

    /// Power on the card in a slot, returning its ATR
    pub fn power_on(&self, slot: usize) -> Result<Vec<u8>, TerminalError> {
        let session = self.session(slot)?;
        let atr = session.lock().power_on();
        Ok(atr)
    }

    /// Power off the card in a slot
    pub fn power_off(&self, slot: usize) -> Result<(), TerminalError> {
        self.session(slot)?.lock().power_off();
        Ok(())
    }

    /// Send a raw APDU to the card in a slot
    pub fn transmit(&self, slot: usize, apdu: &[u8]) -> Result<Vec<u8>, TerminalError> {
        let session = self.session(slot)?;
        debug!("{}: slot {} <- {}", self.name, slot, hex::encode(apdu));
        let response = session.lock().process_apdu(apdu)?;
        debug!("{}: slot {} -> {}", self.name, slot, hex::encode(&response));
        Ok(response)
    }
}
