//! Session security state
//!
//! Per-session context objects for the PACE and signature protocols. Each
//! card session owns exactly one of each, through its protocol handlers.

/// Progress of the PACE handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaceState {
    /// Nothing received yet, or reset
    #[default]
    Idle,
    /// MSE:SET AT accepted
    AtSet,
    /// General Authenticate with mapping data (tag 85) seen
    MappingSeen,
    /// General Authenticate with authentication token (tag 8E) seen
    MutualAuthDone,
}

/// PACE session state
///
/// The authenticated and trusted channel flags are both derived from
/// [`PaceState::MutualAuthDone`], so they always change together.
#[derive(Debug, Clone, Default)]
pub struct PaceSession {
    state: PaceState,
    key_reference: Option<Vec<u8>>,
    mechanism: Option<Vec<u8>>,
}

impl PaceSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PaceState {
        self.state
    }

    /// Password reference selected by MSE:SET AT
    pub fn key_reference(&self) -> Option<&[u8]> {
        self.key_reference.as_deref()
    }

    /// Cryptographic mechanism (protocol OID) selected by MSE:SET AT
    pub fn mechanism(&self) -> Option<&[u8]> {
        self.mechanism.as_deref()
    }

    pub fn is_pace_authenticated(&self) -> bool {
        self.state == PaceState::MutualAuthDone
    }

    pub fn is_trusted_channel_established(&self) -> bool {
        self.state == PaceState::MutualAuthDone
    }

    /// Record the parameters of an accepted MSE:SET AT
    pub fn set_authentication_template(&mut self, key_reference: Vec<u8>, mechanism: Option<Vec<u8>>) {
        self.key_reference = Some(key_reference);
        self.mechanism = mechanism;
        self.advance(PaceState::AtSet);
    }

    /// Record that mapping data was exchanged
    pub fn set_mapping_seen(&mut self) {
        self.advance(PaceState::MappingSeen);
    }

    /// Record a successful mutual authentication
    pub fn set_mutual_auth_done(&mut self) {
        self.advance(PaceState::MutualAuthDone);
    }

    /// MutualAuthDone is terminal until [`PaceSession::clear_all`]
    fn advance(&mut self, next: PaceState) {
        if self.state != PaceState::MutualAuthDone {
            self.state = next;
        }
    }

    /// Return to the initial, unauthenticated state
    pub fn clear_all(&mut self) {
        self.state = PaceState::Idle;
        self.key_reference = None;
        self.mechanism = None;
    }
}

/// Signature session state
///
/// The session is prepared once MSE:SET DST stored a key reference.
#[derive(Debug, Clone, Default)]
pub struct SignatureSession {
    key_reference: Option<Vec<u8>>,
}

impl SignatureSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_prepared(&self) -> bool {
        self.key_reference.is_some()
    }

    pub fn key_reference(&self) -> Option<&[u8]> {
        self.key_reference.as_deref()
    }

    /// Textual name of the referenced key
    ///
    /// References chosen by name are sent as their ASCII bytes; everything
    /// else is rendered as lower-case hex.
    pub fn key_name(&self) -> Option<String> {
        let reference = self.key_reference.as_deref()?;
        match std::str::from_utf8(reference) {
            Ok(name) if name.chars().all(|c| c.is_ascii_graphic()) => Some(name.to_string()),
            _ => Some(hex::encode(reference)),
        }
    }

    pub fn prepare(&mut self, key_reference: Vec<u8>) {
        self.key_reference = Some(key_reference);
    }

    pub fn clear_all(&mut self) {
        self.key_reference = None;
    }
}
