//! Qualified signature protocol
//!
//! MSE:SET DST selects a private key by reference, PSO: Compute Digital
//! Signature then signs the command data with it. Only institution (SMC-B)
//! and professional (HBA) cards carry signature keys.

use std::any::Any;

use log::{debug, info, warn};

use super::security_state::SignatureSession;
use super::{create_error_response, create_success_response, hex_encode, CardProtocol, ProtocolError};
use crate::apdu::{ins, mse, pso, ApduCommand, ApduResponse, SW};
use crate::card::{CardImage, Key};
use crate::crypto::{CardPrivateKey, CryptoError};
use crate::tlv::{extract_tlv_value, tags};

/// Smallest MSE:SET DST data field holding a key reference
const MSE_SET_DST_MIN_LEN: usize = 3;

/// Signature protocol handler
#[derive(Debug, Default)]
pub struct SignatureProtocol {
    session: SignatureSession,
}

impl SignatureProtocol {
    pub const NAME: &'static str = "SIGNATURE";

    pub fn new() -> Self {
        Self::default()
    }

    /// Whether MSE:SET DST selected a key
    pub fn is_prepared(&self) -> bool {
        self.session.is_prepared()
    }

    pub fn key_reference(&self) -> Option<&[u8]> {
        self.session.key_reference()
    }

    /// Handle MSE:SET DST (INS 22, P1P2 41A6)
    fn handle_mse_set_dst(&mut self, cmd: &ApduCommand) -> ApduResponse {
        let data = match cmd.data_field() {
            Some(data) if data.len() >= MSE_SET_DST_MIN_LEN => data,
            _ => {
                warn!("MSE:SET DST with missing or short data: {}", hex_encode(cmd.data_field()));
                return create_error_response(SW::WRONG_DATA);
            }
        };

        let key_reference = extract_tlv_value(Some(data), tags::PRIVATE_KEY_REFERENCE)
            .filter(|reference| !reference.is_empty());
        let Some(key_reference) = key_reference else {
            warn!("MSE:SET DST without private key reference: {}", hex_encode(Some(data)));
            return create_error_response(SW::WRONG_DATA);
        };

        self.session.prepare(key_reference);
        info!(
            "Signature prepared with key {}",
            self.session.key_name().unwrap_or_default()
        );
        create_success_response()
    }

    /// Handle PSO: COMPUTE DIGITAL SIGNATURE (INS 2A, P1P2 9E9A)
    fn handle_compute_digital_signature(
        &mut self,
        card: &dyn CardImage,
        cmd: &ApduCommand,
    ) -> Result<ApduResponse, ProtocolError> {
        let card_type = card.card_type();
        if !card_type.can_sign() {
            warn!("PSO:CDS on a {} card, which holds no signature keys", card_type);
            return Ok(create_error_response(SW::FUNCTION_NOT_SUPPORTED));
        }

        let Some(reference) = self.session.key_reference() else {
            warn!("PSO:CDS before MSE:SET DST");
            return Ok(create_error_response(SW::CONDITIONS_NOT_SATISFIED));
        };

        let Some(key) = card.all_keys().iter().find(|key| key_matches(key, reference)) else {
            warn!("No key on card for reference {}", hex_encode(Some(reference)));
            return Ok(create_error_response(SW::REFERENCED_DATA_NOT_FOUND));
        };

        let crypto_fault = |source: CryptoError| ProtocolError::Crypto {
            key: key.name.clone(),
            source,
        };
        let private_key = CardPrivateKey::from_base64_pkcs8(&key.private_key).map_err(crypto_fault)?;
        let signature = private_key.sign(&cmd.data).map_err(crypto_fault)?;

        info!(
            "Signed {} bytes with {:?} key {}",
            cmd.data.len(),
            private_key.family(),
            key.name
        );
        Ok(ApduResponse::success(signature))
    }
}

/// A key matches when its name is the hex rendering of the reference, or
/// the reference itself read as text. Case is ignored for both.
fn key_matches(key: &Key, reference: &[u8]) -> bool {
    if key.name.eq_ignore_ascii_case(&hex_encode(Some(reference))) {
        return true;
    }
    std::str::from_utf8(reference)
        .map(|name| key.name.eq_ignore_ascii_case(name))
        .unwrap_or(false)
}

impl CardProtocol for SignatureProtocol {
    fn protocol_name(&self) -> &'static str {
        Self::NAME
    }

    fn can_handle(&self, cmd: &ApduCommand) -> bool {
        let is_mse_set_dst = cmd.cla == 0x00
            && cmd.ins == ins::MANAGE_SECURITY_ENVIRONMENT
            && cmd.p1p2() == mse::SET_DST;
        let is_pso_cds = cmd.ins == ins::PSO && cmd.p1p2() == pso::CDS;
        is_mse_set_dst || is_pso_cds
    }

    fn process_command(
        &mut self,
        card: &dyn CardImage,
        cmd: &ApduCommand,
    ) -> Result<ApduResponse, ProtocolError> {
        debug!("Signature APDU: INS={:02X} P1={:02X} P2={:02X}", cmd.ins, cmd.p1, cmd.p2);

        match cmd.ins {
            ins::MANAGE_SECURITY_ENVIRONMENT => Ok(self.handle_mse_set_dst(cmd)),
            ins::PSO => self.handle_compute_digital_signature(card, cmd),
            _ => {
                warn!("Unknown signature instruction: {:02X}", cmd.ins);
                Ok(create_error_response(SW::INS_NOT_SUPPORTED))
            }
        }
    }

    fn reset(&mut self) {
        self.session.clear_all();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{CardType, SimulatedCard};
    use crate::crypto::test_keys;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use p256::ecdsa::signature::hazmat::PrehashVerifier;
    use p256::pkcs8::DecodePrivateKey;
    use sha2::{Digest, Sha256};

    fn set_dst(reference: &[u8]) -> ApduCommand {
        let mut data = vec![0x84, reference.len() as u8];
        data.extend_from_slice(reference);
        ApduCommand::with_data(0x00, 0x22, 0x41, 0xA6, data)
    }

    fn pso_cds(data: &[u8]) -> ApduCommand {
        ApduCommand::with_data(0x00, 0x2A, 0x9E, 0x9A, data.to_vec())
    }

    fn smcb_with(name: &str, private_key: String) -> SimulatedCard {
        SimulatedCard::new("80276001011699901234", CardType::Smcb)
            .with_key(Key::new(name, private_key))
    }

    #[test]
    fn test_can_handle() {
        let protocol = SignatureProtocol::new();
        assert!(protocol.can_handle(&set_dst(&[0x09])));
        assert!(protocol.can_handle(&pso_cds(b"hash")));
        assert!(protocol.can_handle(&ApduCommand::new(0x80, 0x2A, 0x9E, 0x9A)));
        assert!(!protocol.can_handle(&ApduCommand::new(0x00, 0x22, 0xC1, 0xA4)));
        assert!(!protocol.can_handle(&ApduCommand::new(0x00, 0x2A, 0x80, 0x86)));
        assert!(!protocol.can_handle(&ApduCommand::new(0x00, 0x86, 0x00, 0x00)));
    }

    #[test]
    fn test_set_dst_prepares() {
        let card = SimulatedCard::new("hba", CardType::Hba);
        let mut protocol = SignatureProtocol::new();
        let response = protocol.process_command(&card, &set_dst(&[0x09])).unwrap();
        assert_eq!(response.status_word, SW::SUCCESS);
        assert!(protocol.is_prepared());
        assert_eq!(protocol.key_reference(), Some(&[0x09][..]));
    }

    #[test]
    fn test_set_dst_rejects_bad_data() {
        let card = SimulatedCard::new("hba", CardType::Hba);
        let mut protocol = SignatureProtocol::new();

        let short = ApduCommand::with_data(0x00, 0x22, 0x41, 0xA6, vec![0x84, 0x00]);
        let response = protocol.process_command(&card, &short).unwrap();
        assert_eq!(response.status_word, SW::WRONG_DATA);

        let wrong_tag = ApduCommand::with_data(0x00, 0x22, 0x41, 0xA6, vec![0x83, 0x01, 0x09]);
        let response = protocol.process_command(&card, &wrong_tag).unwrap();
        assert_eq!(response.status_word, SW::WRONG_DATA);
        assert!(!protocol.is_prepared());
    }

    #[test]
    fn test_pso_cds_unsupported_card_type() {
        let card = SimulatedCard::new("egk", CardType::Egk)
            .with_key(Key::new("09", test_keys::p256_base64()));
        let mut protocol = SignatureProtocol::new();
        protocol.process_command(&card, &set_dst(&[0x09])).unwrap();
        let response = protocol.process_command(&card, &pso_cds(b"data")).unwrap();
        assert_eq!(response.status_word, SW::FUNCTION_NOT_SUPPORTED);
        assert!(response.data.is_empty());
    }

    #[test]
    fn test_pso_cds_not_prepared() {
        let card = smcb_with("09", test_keys::p256_base64());
        let mut protocol = SignatureProtocol::new();
        let response = protocol.process_command(&card, &pso_cds(b"data")).unwrap();
        assert_eq!(response.status_word, SW::CONDITIONS_NOT_SATISFIED);
    }

    #[test]
    fn test_pso_cds_unknown_key() {
        let card = smcb_with("PRK_HCI_AUT", test_keys::p256_base64());
        let mut protocol = SignatureProtocol::new();
        protocol.process_command(&card, &set_dst(&[0x09])).unwrap();
        let response = protocol.process_command(&card, &pso_cds(b"data")).unwrap();
        assert_eq!(response.status_word, SW::REFERENCED_DATA_NOT_FOUND);
    }

    #[test]
    fn test_pso_cds_rsa() {
        use rsa::pkcs1v15::{Signature, VerifyingKey};
        use rsa::signature::Verifier;

        let der = test_keys::rsa_pkcs8_der();
        let card = SimulatedCard::new("hba", CardType::Hba)
            .with_key(Key::new("PRK_HP_QES", STANDARD.encode(&der)));
        let mut protocol = SignatureProtocol::new();

        protocol.process_command(&card, &set_dst(b"prk_hp_qes")).unwrap();
        let response = protocol.process_command(&card, &pso_cds(b"document")).unwrap();
        assert_eq!(response.status_word, SW::SUCCESS);

        let private_key = crate::crypto::RsaOperations::decode_pkcs8(&der).unwrap();
        let verifying_key = VerifyingKey::<Sha256>::new(private_key.to_public_key());
        let signature = Signature::try_from(response.data.as_slice()).unwrap();
        assert!(verifying_key.verify(b"document", &signature).is_ok());
    }

    #[test]
    fn test_pso_cds_p256_by_hex_reference() {
        let der = test_keys::p256_pkcs8_der();
        let card = smcb_with("0A", STANDARD.encode(&der));
        let mut protocol = SignatureProtocol::new();

        protocol.process_command(&card, &set_dst(&[0x0A])).unwrap();
        let response = protocol.process_command(&card, &pso_cds(b"document")).unwrap();
        assert_eq!(response.status_word, SW::SUCCESS);
        assert_eq!(response.data[0], 0x30);

        let signing_key = p256::ecdsa::SigningKey::from_pkcs8_der(&der).unwrap();
        let signature = p256::ecdsa::Signature::from_der(&response.data).unwrap();
        let digest = Sha256::digest(b"document");
        assert!(signing_key.verifying_key().verify_prehash(&digest, &signature).is_ok());

        // preparation survives a signature
        assert!(protocol.is_prepared());
        let again = protocol.process_command(&card, &pso_cds(b"second")).unwrap();
        assert_eq!(again.status_word, SW::SUCCESS);
    }

    #[test]
    fn test_pso_cds_p384() {
        let der = test_keys::p384_pkcs8_der();
        let card = smcb_with("PRK_HCI_OSIG_E384", STANDARD.encode(&der));
        let mut protocol = SignatureProtocol::new();

        protocol.process_command(&card, &set_dst(b"PRK_HCI_OSIG_E384")).unwrap();
        let response = protocol.process_command(&card, &pso_cds(b"document")).unwrap();
        assert_eq!(response.status_word, SW::SUCCESS);

        let signing_key = p384::ecdsa::SigningKey::from_pkcs8_der(&der).unwrap();
        let signature = p384::ecdsa::Signature::from_der(&response.data).unwrap();
        let digest = Sha256::digest(b"document");
        assert!(signing_key.verifying_key().verify_prehash(&digest, &signature).is_ok());
    }

    #[test]
    fn test_pso_cds_broken_key_is_internal_fault() {
        let card = smcb_with("09", STANDARD.encode(b"not a key"));
        let mut protocol = SignatureProtocol::new();
        protocol.process_command(&card, &set_dst(&[0x09])).unwrap();

        let result = protocol.process_command(&card, &pso_cds(b"data"));
        assert!(matches!(
            result,
            Err(ProtocolError::Crypto { ref key, source: CryptoError::InvalidKey(_) }) if key == "09"
        ));
    }

    #[test]
    fn test_reset_clears_preparation() {
        let card = smcb_with("09", test_keys::p256_base64());
        let mut protocol = SignatureProtocol::new();
        protocol.process_command(&card, &set_dst(&[0x09])).unwrap();
        protocol.reset();
        protocol.reset();
        assert!(!protocol.is_prepared());
        let response = protocol.process_command(&card, &pso_cds(b"data")).unwrap();
        assert_eq!(response.status_word, SW::CONDITIONS_NOT_SATISFIED);
    }

    #[test]
    fn test_set_dst_rejects_empty_reference() {
        let card = smcb_with("09", test_keys::p256_base64());
        let mut protocol = SignatureProtocol::new();

        let empty = ApduCommand::with_data(0x00, 0x22, 0x41, 0xA6, vec![0x84, 0x00, 0x00]);
        let response = protocol.process_command(&card, &empty).unwrap();
        assert_eq!(response.status_word, SW::WRONG_DATA);
        assert!(!protocol.is_prepared());

        let response = protocol.process_command(&card, &pso_cds(b"data")).unwrap();
        assert_eq!(response.status_word, SW::CONDITIONS_NOT_SATISFIED);
    }

    #[test]
    fn test_rejected_set_dst_keeps_preparation() {
        let card = smcb_with("09", test_keys::p256_base64());
        let mut protocol = SignatureProtocol::new();
        protocol.process_command(&card, &set_dst(&[0x09])).unwrap();

        for data in [vec![0x84, 0x00, 0x00], vec![0x83, 0x01, 0x0A], vec![0x84]] {
            let cmd = ApduCommand::with_data(0x00, 0x22, 0x41, 0xA6, data);
            let response = protocol.process_command(&card, &cmd).unwrap();
            assert_eq!(response.status_word, SW::WRONG_DATA);
            assert!(protocol.is_prepared());
            assert_eq!(protocol.key_reference(), Some(&[0x09][..]));
        }

        let response = protocol.process_command(&card, &pso_cds(b"data")).unwrap();
        assert_eq!(response.status_word, SW::SUCCESS);
    }

    #[test]
    fn test_failed_pso_cds_keeps_preparation() {
        let mut protocol = SignatureProtocol::new();

        let smcb = smcb_with("PRK_HCI_AUT", test_keys::p256_base64());
        protocol.process_command(&smcb, &set_dst(&[0x09])).unwrap();
        let response = protocol.process_command(&smcb, &pso_cds(b"data")).unwrap();
        assert_eq!(response.status_word, SW::REFERENCED_DATA_NOT_FOUND);
        assert!(protocol.is_prepared());
        assert_eq!(protocol.key_reference(), Some(&[0x09][..]));

        let egk = SimulatedCard::new("egk", CardType::Egk);
        let response = protocol.process_command(&egk, &pso_cds(b"data")).unwrap();
        assert_eq!(response.status_word, SW::FUNCTION_NOT_SUPPORTED);
        assert!(protocol.is_prepared());
        assert_eq!(protocol.key_reference(), Some(&[0x09][..]));
    }

    #[test]
    fn test_key_matching() {
        let key = Key::new("0a", String::new());
        assert!(key_matches(&key, &[0x0A]));
        let key = Key::new("PRK_HCI_OSIG", String::new());
        assert!(key_matches(&key, b"prk_hci_osig"));
        assert!(!key_matches(&key, &[0x09]));
    }
}
