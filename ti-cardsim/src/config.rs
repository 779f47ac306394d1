//! Simulator configuration
//!
//! Read from the environment:
//! - `TI_CARDSIM_CARD_DIR`: directory holding the card image JSON files
//!   (default `~/.ti-cardsim/cards`)
//! - `TI_CARDSIM_SLOTS`: number of terminal slots (default 4)

use std::env;
use std::path::PathBuf;

use log::warn;

use crate::card::{CardImageError, CardImageStore, SimulatedCard};
use crate::terminal::Terminal;

pub const CARD_DIR_ENV: &str = "TI_CARDSIM_CARD_DIR";
pub const SLOTS_ENV: &str = "TI_CARDSIM_SLOTS";
pub const DEFAULT_SLOTS: usize = 4;

/// Simulator settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorConfig {
    pub card_dir: PathBuf,
    pub slots: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            card_dir: default_card_dir(),
            slots: DEFAULT_SLOTS,
        }
    }
}

/// `~/.ti-cardsim/cards`, or a system path when there is no home directory
fn default_card_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".ti-cardsim").join("cards"))
        .unwrap_or_else(|| PathBuf::from("/var/lib/ti-cardsim/cards"))
}

impl SimulatorConfig {
    /// Build the configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_values(env::var(CARD_DIR_ENV).ok(), env::var(SLOTS_ENV).ok())
    }

    fn from_values(card_dir: Option<String>, slots: Option<String>) -> Self {
        let card_dir = card_dir
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_card_dir);

        let slots = match slots {
            None => DEFAULT_SLOTS,
            Some(value) => match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    warn!("Ignoring {}={:?}, using {} slots", SLOTS_ENV, value, DEFAULT_SLOTS);
                    DEFAULT_SLOTS
                }
            },
        };

        Self { card_dir, slots }
    }

    /// Load every card image in the card directory
    pub fn load_card_images(&self) -> Result<Vec<SimulatedCard>, CardImageError> {
        CardImageStore::new(self.card_dir.clone()).load_all()
    }

    /// Create an empty terminal with the configured number of slots
    pub fn build_terminal(&self, name: &str) -> Terminal {
        Terminal::new(name, self.slots)
    }
}
