//! Signed session tokens
//!
//! Tokens are stateless and self-contained:
//!
//! ```text
//! base64({"username":"<subject>","expiresAt":<epoch ms>}) "." hex(HMAC-SHA256(secret, payload))
//! ```
//!
//! Nothing is persisted. A token stays valid until its embedded expiry passes;
//! there is no revocation list, so logging out only means the client drops it.
//!
//! Verification runs a fixed sequence of checks (structure, decode, signature,
//! payload, expiry). Each step reports a tagged [`TokenRejection`] internally,
//! but callers outside this module only ever see "valid" or "invalid".

use chrono::Utc;
use data_encoding::{BASE64, HEXLOWER};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Token lifetime: 24 hours
pub const TOKEN_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Separator between the encoded payload and the signature.
/// Not part of the base64 or hex alphabets.
const DELIMITER: char = '.';

/// Claims carried inside a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Authenticated username
    #[serde(rename = "username")]
    pub subject: String,
    /// Absolute expiry in epoch milliseconds
    #[serde(rename = "expiresAt")]
    pub expires_at: i64,
}

/// A freshly minted token together with its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

/// Outcome of verifying a token as seen by callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub valid: bool,
    #[serde(rename = "username", skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl Verification {
    fn invalid() -> Self {
        Self {
            valid: false,
            subject: None,
        }
    }
}

/// Why a token was rejected. Only ever logged server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenRejection {
    #[error("token is not two non-empty dot-separated parts")]
    Malformed,
    #[error("token payload or signature is not valid base64/hex")]
    Undecodable,
    #[error("token signature does not match")]
    BadSignature,
    #[error("token payload is not a valid claims object")]
    BadPayload,
    #[error("token has expired")]
    Expired,
}

/// Error constructing a codec
#[derive(Debug, thiserror::Error)]
pub enum TokenCodecError {
    #[error("token signing secret must not be empty")]
    EmptySecret,
}

/// Issues and verifies signed session tokens.
///
/// Holds only immutable key material, so a single instance can be shared
/// behind an `Arc` by every request handler.
#[derive(Clone)]
pub struct TokenCodec {
    /// HMAC state already keyed with the secret; cloned for every signature
    keyed: HmacSha256,
    ttl_ms: i64,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("keyed", &"<redacted>")
            .field("ttl_ms", &self.ttl_ms)
            .finish()
    }
}

impl TokenCodec {
    /// Create a codec with the standard 24 hour lifetime
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, TokenCodecError> {
        Self::with_ttl(secret, TOKEN_TTL_MS)
    }

    /// Create a codec with a custom lifetime in milliseconds
    pub fn with_ttl(secret: impl AsRef<[u8]>, ttl_ms: i64) -> Result<Self, TokenCodecError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(TokenCodecError::EmptySecret);
        }
        let keyed = <HmacSha256 as Mac>::new_from_slice(secret)
            .map_err(|_| TokenCodecError::EmptySecret)?;
        Ok(Self { keyed, ttl_ms })
    }

    /// Token lifetime in milliseconds
    pub fn ttl_ms(&self) -> i64 {
        self.ttl_ms
    }

    /// Issue a token for `subject`, expiring one TTL from now
    pub fn issue(&self, subject: &str) -> IssuedToken {
        self.issue_at(subject, now_ms())
    }

    /// Issue a token as if the current time were `now_ms`
    pub fn issue_at(&self, subject: &str, now_ms: i64) -> IssuedToken {
        let claims = TokenClaims {
            subject: subject.to_string(),
            expires_at: now_ms + self.ttl_ms,
        };
        // Serializing a struct of a String and an i64 cannot fail.
        let payload = serde_json::to_vec(&claims).unwrap_or_default();
        let signature = self.mac(&payload).finalize().into_bytes();

        let token = format!(
            "{}{}{}",
            BASE64.encode(&payload),
            DELIMITER,
            HEXLOWER.encode(&signature)
        );

        IssuedToken {
            token,
            expires_at: claims.expires_at,
        }
    }

    /// Verify a token against the current time
    pub fn verify(&self, token: &str) -> Verification {
        self.verify_at(token, now_ms())
    }

    /// Verify a token as if the current time were `now_ms`.
    ///
    /// Every rejection collapses to `valid: false`.
    pub fn verify_at(&self, token: &str, now_ms: i64) -> Verification {
        match self.check(token, now_ms) {
            Ok(claims) => Verification {
                valid: true,
                subject: Some(claims.subject),
            },
            Err(rejection) => {
                tracing::debug!("Token rejected: {}", rejection);
                Verification::invalid()
            }
        }
    }

    /// Run the full validation pipeline and report the first failing step
    pub fn check(&self, token: &str, now_ms: i64) -> Result<TokenClaims, TokenRejection> {
        let (encoded_payload, encoded_signature) = split_token(token)?;

        let payload = BASE64
            .decode(encoded_payload.as_bytes())
            .map_err(|_| TokenRejection::Undecodable)?;
        let signature = HEXLOWER
            .decode(encoded_signature.as_bytes())
            .map_err(|_| TokenRejection::Undecodable)?;

        self.mac(&payload)
            .verify_slice(&signature)
            .map_err(|_| TokenRejection::BadSignature)?;

        let claims: TokenClaims =
            serde_json::from_slice(&payload).map_err(|_| TokenRejection::BadPayload)?;

        if claims.expires_at <= now_ms {
            return Err(TokenRejection::Expired);
        }

        Ok(claims)
    }

    fn mac(&self, payload: &[u8]) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(payload);
        mac
    }
}

/// Split into exactly two non-empty parts
fn split_token(token: &str) -> Result<(&str, &str), TokenRejection> {
    let mut parts = token.split(DELIMITER);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(payload), Some(signature), None) if !payload.is_empty() && !signature.is_empty() => {
            Ok((payload, signature))
        }
        _ => Err(TokenRejection::Malformed),
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-for-token-codec";
    const NOW: i64 = 1_760_000_000_000;

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET).expect("valid secret")
    }

    /// Sign an arbitrary payload the same way the codec does
    fn forge(payload: &[u8], secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload);
        format!(
            "{}.{}",
            BASE64.encode(payload),
            HEXLOWER.encode(&mac.finalize().into_bytes())
        )
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(TokenCodec::new(""), Err(TokenCodecError::EmptySecret)));
    }

    #[test]
    fn test_issue_then_verify() {
        let codec = codec();
        let issued = codec.issue_at("admin", NOW);

        assert_eq!(issued.expires_at, NOW + TOKEN_TTL_MS);
        let result = codec.verify_at(&issued.token, NOW);
        assert!(result.valid);
        assert_eq!(result.subject.as_deref(), Some("admin"));
    }

    #[test]
    fn test_wire_format() {
        let issued = codec().issue_at("admin", NOW);
        let (payload, signature) = issued.token.split_once('.').unwrap();

        let decoded = BASE64.decode(payload.as_bytes()).unwrap();
        assert_eq!(
            String::from_utf8(decoded).unwrap(),
            format!(r#"{{"username":"admin","expiresAt":{}}}"#, NOW + TOKEN_TTL_MS)
        );
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_verify_uses_real_clock() {
        let codec = codec();
        let issued = codec.issue("admin");
        assert!(codec.verify(&issued.token).valid);
    }

    #[test]
    fn test_expiry_boundary() {
        let codec = codec();
        let issued = codec.issue_at("admin", NOW);

        assert!(codec.verify_at(&issued.token, NOW + TOKEN_TTL_MS - 1).valid);
        // Expiry must be strictly in the future
        assert_eq!(
            codec.check(&issued.token, NOW + TOKEN_TTL_MS),
            Err(TokenRejection::Expired)
        );
        assert!(!codec.verify_at(&issued.token, NOW + TOKEN_TTL_MS + 1).valid);
    }

    #[test]
    fn test_custom_ttl() {
        let codec = TokenCodec::with_ttl(SECRET, 1_000).unwrap();
        let issued = codec.issue_at("admin", NOW);

        assert_eq!(codec.ttl_ms(), 1_000);
        assert!(codec.verify_at(&issued.token, NOW + 999).valid);
        assert!(!codec.verify_at(&issued.token, NOW + 1_001).valid);
    }

    #[test]
    fn test_other_secret_rejected() {
        let issued = codec().issue_at("admin", NOW);
        let other = TokenCodec::new("another-secret").unwrap();

        assert_eq!(
            other.check(&issued.token, NOW),
            Err(TokenRejection::BadSignature)
        );
    }

    #[test]
    fn test_malformed_structure() {
        let codec = codec();
        for token in ["", ".", "abc", "abc.", ".abc", "a.b.c", "a..b", "a.b.c.d"] {
            assert_eq!(
                codec.check(token, NOW),
                Err(TokenRejection::Malformed),
                "token {:?}",
                token
            );
            assert!(!codec.verify_at(token, NOW).valid);
        }
    }

    #[test]
    fn test_undecodable_parts() {
        let codec = codec();
        let issued = codec.issue_at("admin", NOW);
        let (payload, signature) = issued.token.split_once('.').unwrap();

        let bad_payload = format!("!!not-base64!!.{}", signature);
        assert_eq!(codec.check(&bad_payload, NOW), Err(TokenRejection::Undecodable));

        let bad_signature = format!("{}.zz{}", payload, &signature[2..]);
        assert_eq!(codec.check(&bad_signature, NOW), Err(TokenRejection::Undecodable));

        let upper_signature = format!("{}.{}", payload, signature.to_uppercase());
        assert!(!codec.verify_at(&upper_signature, NOW).valid);
    }

    #[test]
    fn test_signed_garbage_payload_rejected() {
        let codec = codec();

        let not_json = forge(b"not json at all", SECRET);
        assert_eq!(codec.check(&not_json, NOW), Err(TokenRejection::BadPayload));

        let wrong_shape = forge(br#"{"user":"admin","exp":1}"#, SECRET);
        assert_eq!(codec.check(&wrong_shape, NOW), Err(TokenRejection::BadPayload));
    }

    #[test]
    fn test_signature_checked_before_payload() {
        // A forged token with an unparseable payload reports a signature failure,
        // never a parse failure.
        let forged = forge(b"not json at all", "attacker-secret");
        assert_eq!(codec().check(&forged, NOW), Err(TokenRejection::BadSignature));
    }

    #[test]
    fn test_signature_checked_before_expiry() {
        let codec = codec();
        let expired = codec.issue_at("admin", NOW - 2 * TOKEN_TTL_MS);
        let (payload, signature) = expired.token.split_once('.').unwrap();
        let mut sig = signature.to_string();
        let flipped = if sig.starts_with('0') { "1" } else { "0" };
        sig.replace_range(0..1, flipped);

        assert_eq!(
            codec.check(&format!("{}.{}", payload, sig), NOW),
            Err(TokenRejection::BadSignature)
        );
        assert_eq!(codec.check(&expired.token, NOW), Err(TokenRejection::Expired));
    }

    #[test]
    fn test_verification_serializes_for_clients() {
        let codec = codec();
        let issued = codec.issue_at("admin", NOW);

        let valid = serde_json::to_value(codec.verify_at(&issued.token, NOW)).unwrap();
        assert_eq!(valid, serde_json::json!({"valid": true, "username": "admin"}));

        let invalid = serde_json::to_value(codec.verify_at("junk", NOW)).unwrap();
        assert_eq!(invalid, serde_json::json!({"valid": false}));
    }

    #[test]
    fn test_debug_hides_secret() {
        let printed = format!("{:?}", codec());
        assert!(!printed.contains(SECRET));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    const NOW: i64 = 1_760_000_000_000;

    fn codec() -> TokenCodec {
        TokenCodec::new("property-test-secret").unwrap()
    }

    /// Replace the character at `idx` with a different one from the same alphabet
    fn flip_char(s: &str, idx: usize, alphabet: &[u8]) -> String {
        let mut bytes = s.as_bytes().to_vec();
        let original = bytes[idx];
        let pos = alphabet.iter().position(|&c| c == original).unwrap_or(0);
        bytes[idx] = alphabet[(pos + 1) % alphabet.len()];
        String::from_utf8(bytes).unwrap()
    }

    const HEX: &[u8] = b"0123456789abcdef";
    const B64: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn roundtrip_any_subject(subject in "\\PC{1,64}") {
            let codec = codec();
            let issued = codec.issue_at(&subject, NOW);
            let result = codec.verify_at(&issued.token, NOW);
            prop_assert!(result.valid);
            prop_assert_eq!(result.subject, Some(subject));
        }

        #[test]
        fn flipped_signature_char_is_rejected(subject in "[a-z]{1,16}", idx in 0usize..64) {
            let codec = codec();
            let issued = codec.issue_at(&subject, NOW);
            let (payload, signature) = issued.token.split_once('.').unwrap();
            let tampered = format!("{}.{}", payload, flip_char(signature, idx, HEX));

            prop_assert!(!codec.verify_at(&tampered, NOW).valid);
        }

        #[test]
        fn flipped_payload_char_is_rejected(subject in "[a-z]{1,16}", idx_seed in any::<usize>()) {
            let codec = codec();
            let issued = codec.issue_at(&subject, NOW);
            let (payload, signature) = issued.token.split_once('.').unwrap();
            // Padding characters are not part of the alphabet; only flip data characters.
            let data_len = payload.trim_end_matches('=').len();
            let idx = idx_seed % data_len;
            let tampered = format!("{}.{}", flip_char(payload, idx, B64), signature);

            prop_assert!(!codec.verify_at(&tampered, NOW).valid);
        }

        #[test]
        fn arbitrary_input_never_panics(token in "\\PC{0,200}") {
            let codec = codec();
            let result = codec.verify_at(&token, NOW);
            prop_assert!(!result.valid || result.subject.is_some());
        }

        #[test]
        fn three_or_more_parts_rejected(parts in prop::collection::vec("[A-Za-z0-9+/=]{1,12}", 3..6)) {
            let token = parts.join(".");
            prop_assert_eq!(codec().check(&token, NOW), Err(TokenRejection::Malformed));
        }

        #[test]
        fn expiry_boundary_holds(offset in 1i64..TOKEN_TTL_MS) {
            let codec = codec();
            let issued = codec.issue_at("admin", NOW);
            prop_assert!(codec.verify_at(&issued.token, NOW + TOKEN_TTL_MS - offset).valid);
            prop_assert!(!codec.verify_at(&issued.token, NOW + TOKEN_TTL_MS + offset).valid);
        }
    }
}
