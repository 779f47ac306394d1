//! Card image data structures
//!
//! A card image is the static content of a simulated health card: its type
//! and the private keys it holds. Images are read from JSON files.

use serde::{Deserialize, Serialize};

/// Health card types known to the simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardType {
    /// Elektronische Gesundheitskarte (patient card)
    Egk,
    /// Heilberufsausweis (health professional card)
    Hba,
    /// Security Module Card type B (institution card)
    Smcb,
    /// Health Professional Card
    Hpc,
    #[serde(other)]
    Unknown,
}

impl CardType {
    /// Display name as used in card image files
    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::Egk => "EGK",
            CardType::Hba => "HBA",
            CardType::Smcb => "SMCB",
            CardType::Hpc => "HPC",
            CardType::Unknown => "UNKNOWN",
        }
    }

    /// Whether the card may compute digital signatures (PSO:CDS)
    pub fn can_sign(&self) -> bool {
        matches!(self, CardType::Smcb | CardType::Hba)
    }
}

impl std::fmt::Display for CardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A private key stored on a card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    /// Key name, e.g. `PRK_HCI_OSIG_R2048`
    pub name: String,
    /// Base64 encoded PKCS#8 private key
    pub private_key: String,
}

impl Key {
    pub fn new(name: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            private_key: private_key.into(),
        }
    }
}

/// Read access to the content of a card
///
/// Protocol handlers only see a card through this trait.
pub trait CardImage {
    /// The card type
    fn card_type(&self) -> CardType;

    /// All keys in storage order
    fn all_keys(&self) -> &[Key];
}

/// A card image loaded from a JSON file or built in code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedCard {
    /// Identifier used in log lines, usually the ICCSN
    #[serde(default)]
    pub id: String,
    pub card_type: CardType,
    #[serde(default)]
    pub keys: Vec<Key>,
}

impl SimulatedCard {
    pub fn new(id: impl Into<String>, card_type: CardType) -> Self {
        Self {
            id: id.into(),
            card_type,
            keys: Vec::new(),
        }
    }

    /// Add a key, keeping insertion order
    pub fn with_key(mut self, key: Key) -> Self {
        self.keys.push(key);
        self
    }
}

impl CardImage for SimulatedCard {
    fn card_type(&self) -> CardType {
        self.card_type
    }

    fn all_keys(&self) -> &[Key] {
        &self.keys
    }
}
