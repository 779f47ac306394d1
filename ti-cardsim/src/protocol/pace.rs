//! PACE (Password Authenticated Connection Establishment)
//!
//! Simulates the message flow of PACE as seen by a terminal: MSE:SET AT
//! selects the password, General Authenticate carries the mapping and
//! mutual authentication steps. No key agreement is performed; the
//! handshake is accepted based on which data objects arrive.

use std::any::Any;

use log::{debug, info, warn};

use super::security_state::{PaceSession, PaceState};
use super::{create_error_response, create_success_response, hex_encode, CardProtocol, ProtocolError};
use crate::apdu::{ins, mse, ApduCommand, ApduResponse, SW};
use crate::card::CardImage;
use crate::tlv::{extract_tlv_value, tags};

/// Smallest MSE:SET AT data field carrying both a mechanism and a reference
const MSE_SET_AT_MIN_LEN: usize = 6;

/// PACE protocol handler
#[derive(Debug, Default)]
pub struct PaceProtocol {
    session: PaceSession,
}

impl PaceProtocol {
    pub const NAME: &'static str = "PACE";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pace_authenticated(&self) -> bool {
        self.session.is_pace_authenticated()
    }

    pub fn is_trusted_channel_established(&self) -> bool {
        self.session.is_trusted_channel_established()
    }

    /// Password reference from the last accepted MSE:SET AT
    pub fn key_reference(&self) -> Option<&[u8]> {
        self.session.key_reference()
    }

    pub fn state(&self) -> PaceState {
        self.session.state()
    }

    /// Handle MSE:SET AT (INS 22, P1P2 C1A4)
    fn handle_mse_set_at(&mut self, cmd: &ApduCommand) -> ApduResponse {
        let data = match cmd.data_field() {
            Some(data) if data.len() >= MSE_SET_AT_MIN_LEN => data,
            _ => {
                warn!("MSE:SET AT with missing or short data: {}", hex_encode(cmd.data_field()));
                return create_error_response(SW::WRONG_DATA);
            }
        };

        let key_reference = extract_tlv_value(Some(data), tags::PASSWORD_REFERENCE)
            .filter(|reference| !reference.is_empty());
        let Some(key_reference) = key_reference else {
            warn!("MSE:SET AT without password reference: {}", hex_encode(Some(data)));
            return create_error_response(SW::WRONG_DATA);
        };
        let mechanism = extract_tlv_value(Some(data), tags::CRYPTOGRAPHIC_MECHANISM);

        debug!(
            "PACE MSE:SET AT key reference {} mechanism {}",
            hex_encode(Some(&key_reference)),
            hex_encode(mechanism.as_deref())
        );
        self.session.set_authentication_template(key_reference, mechanism);
        create_success_response()
    }

    /// Handle GENERAL AUTHENTICATE (INS 86)
    fn handle_general_authenticate(&mut self, cmd: &ApduCommand) -> ApduResponse {
        let Some(data) = cmd.data_field() else {
            // step 1, the card would send its encrypted nonce here
            debug!("PACE General Authenticate without data");
            return create_success_response();
        };

        if extract_tlv_value(Some(data), tags::PACE_MAPPING_DATA).is_some() {
            debug!("PACE mapping data received, {} bytes", data.len());
            self.session.set_mapping_seen();
            return ApduResponse::success(data.to_vec());
        }

        if extract_tlv_value(Some(data), tags::PACE_AUTHENTICATION_TOKEN).is_some() {
            self.session.set_mutual_auth_done();
            info!("PACE established, trusted channel open");
            return create_success_response();
        }

        warn!("PACE General Authenticate with unexpected data: {}", hex_encode(Some(data)));
        create_error_response(SW::WRONG_DATA)
    }
}

impl CardProtocol for PaceProtocol {
    fn protocol_name(&self) -> &'static str {
        Self::NAME
    }

    fn can_handle(&self, cmd: &ApduCommand) -> bool {
        let is_mse_set_at = cmd.cla == 0x00
            && cmd.ins == ins::MANAGE_SECURITY_ENVIRONMENT
            && cmd.p1p2() == mse::SET_AT;
        is_mse_set_at || cmd.ins == ins::GENERAL_AUTHENTICATE
    }

    fn process_command(
        &mut self,
        _card: &dyn CardImage,
        cmd: &ApduCommand,
    ) -> Result<ApduResponse, ProtocolError> {
        debug!("PACE APDU: INS={:02X} P1={:02X} P2={:02X}", cmd.ins, cmd.p1, cmd.p2);

        let response = match cmd.ins {
            ins::MANAGE_SECURITY_ENVIRONMENT => self.handle_mse_set_at(cmd),
            ins::GENERAL_AUTHENTICATE => self.handle_general_authenticate(cmd),
            _ => {
                warn!("Unknown PACE instruction: {:02X}", cmd.ins);
                create_error_response(SW::INS_NOT_SUPPORTED)
            }
        };
        Ok(response)
    }

    fn reset(&mut self) {
        self.session.clear_all();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
