//! Card image storage
//!
//! Reads card images from a directory of JSON files. Images are never
//! written back: a simulated card's keys are fixed for its lifetime.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use super::image::SimulatedCard;

/// Errors while reading card images
#[derive(Debug, Error)]
pub enum CardImageError {
    #[error("Failed to read card image {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse card image {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A directory of card image files
pub struct CardImageStore {
    card_dir: PathBuf,
}

impl CardImageStore {
    const EXTENSION: &'static str = "json";

    /// Create a store reading from `card_dir`
    pub fn new(card_dir: impl Into<PathBuf>) -> Self {
        Self {
            card_dir: card_dir.into(),
        }
    }

    /// Load a single card image file
    pub fn load_file(path: &Path) -> Result<SimulatedCard, CardImageError> {
        let content = fs::read_to_string(path).map_err(|source| CardImageError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut card: SimulatedCard =
            serde_json::from_str(&content).map_err(|source| CardImageError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        // Fall back to the file stem so every card has a name in log lines
        if card.id.is_empty() {
            if let Some(stem) = path.file_stem() {
                card.id = stem.to_string_lossy().into_owned();
            }
        }

        debug!("Loaded {} card {} with {} keys", card.card_type, card.id, card.keys.len());
        Ok(card)
    }

    /// Load every `*.json` card image in file name order
    ///
    /// A missing directory yields an empty list.
    pub fn load_all(&self) -> Result<Vec<SimulatedCard>, CardImageError> {
        if !self.card_dir.exists() {
            info!("Card directory {:?} does not exist, no cards loaded", self.card_dir);
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.card_dir).map_err(|source| CardImageError::Io {
            path: self.card_dir.clone(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| CardImageError::Io {
                path: self.card_dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == Self::EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();

        let cards = paths
            .iter()
            .map(|path| Self::load_file(path))
            .collect::<Result<Vec<_>, _>>()?;

        info!("Loaded {} card images from {:?}", cards.len(), self.card_dir);
        Ok(cards)
    }
}
