//! # Permit: signed spending authorization
//!
//! A [`Permit`] lets a token owner grant an allowance to a spender without
//! a separate approval step. The owner signs the canonical payload with the
//! ed25519 key behind their [`AccountId`]; the ledger redeems it once.
//!
//! ## Redemption rules
//!
//! - **Owner-bound**: the signature must verify under `owner`'s key
//! - **Nonce-bound**: `nonce` must equal the ledger's current nonce for
//!   `(owner, token)`, which is then incremented (no replay)
//! - **Time-bound**: `deadline` must not be earlier than the redemption time
//! - **Spender-bound**: the allowance is granted to `spender` only

use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::PERMIT_DOMAIN;
use crate::{AccountId, Amount, Result, SwapdeskError, TokenId};

/// The terms of a spending authorization, before signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permit {
    pub owner: AccountId,
    pub spender: AccountId,
    pub token: TokenId,
    /// Allowance granted on redemption. Replaces any previous allowance.
    pub value: Amount,
    pub nonce: u64,
    pub deadline: DateTime<Utc>,
}

impl Permit {
    /// Canonical signing payload.
    ///
    /// Format: `PERMIT_DOMAIN || owner || spender || len(token) || token || value || nonce
    /// || deadline_secs || deadline_nanos`. The deadline is signed at full
    /// precision, so its sub-second part cannot be moved after signing.
    #[must_use]
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(160);
        payload.extend_from_slice(PERMIT_DOMAIN);
        payload.extend_from_slice(self.owner.as_bytes());
        payload.extend_from_slice(self.spender.as_bytes());
        payload.extend_from_slice(&(self.token.as_str().len() as u64).to_le_bytes());
        payload.extend_from_slice(self.token.as_str().as_bytes());
        payload.extend_from_slice(&self.value.to_le_bytes());
        payload.extend_from_slice(&self.nonce.to_le_bytes());
        payload.extend_from_slice(&self.deadline.timestamp().to_le_bytes());
        payload.extend_from_slice(&self.deadline.timestamp_subsec_nanos().to_le_bytes());
        payload
    }

    /// SHA-256 of the signing payload. This is what gets signed.
    #[must_use]
    pub fn digest(&self) -> [u8; 32] {
        Sha256::digest(self.signing_payload()).into()
    }

    /// Sign with the owner's key.
    ///
    /// The caller is responsible for passing the key that matches `owner`;
    /// a mismatched key yields a permit that fails verification.
    #[must_use]
    pub fn sign(self, key: &SigningKey) -> SignedPermit {
        let signature = key.sign(&self.digest()).to_bytes().to_vec();
        SignedPermit {
            permit: self,
            signature,
        }
    }

    /// Returns `true` if the permit is no longer redeemable at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.deadline < now
    }
}

/// A [`Permit`] together with the owner's ed25519 signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPermit {
    #[serde(flatten)]
    pub permit: Permit,
    /// Ed25519 signature over [`Permit::digest`].
    pub signature: Vec<u8>,
}

impl SignedPermit {
    /// Check the signature against the owner's key.
    ///
    /// Does not look at nonce or deadline; those need ledger state and a
    /// clock and are checked at redemption.
    pub fn verify_signature(&self) -> Result<()> {
        let key = VerifyingKey::from_bytes(self.permit.owner.as_bytes()).map_err(|e| {
            SwapdeskError::InvalidAuthorization {
                reason: format!("owner {} is not a valid public key: {e}", self.permit.owner),
            }
        })?;
        let sig_bytes: [u8; 64] = self.signature.as_slice().try_into().map_err(|_| {
            SwapdeskError::InvalidAuthorization {
                reason: format!("signature must be 64 bytes, got {}", self.signature.len()),
            }
        })?;
        let signature = Signature::from_bytes(&sig_bytes);
        key.verify(&self.permit.digest(), &signature)
            .map_err(|_| SwapdeskError::InvalidAuthorization {
                reason: format!("bad signature from {}", self.permit.owner.short()),
            })
    }
}

impl std::ops::Deref for SignedPermit {
    type Target = Permit;

    fn deref(&self) -> &Permit {
        &self.permit
    }
}

/// Account derived from a signing key.
#[must_use]
pub fn account_of(key: &SigningKey) -> AccountId {
    AccountId::from_pubkey(key.verifying_key().to_bytes())
}

/// Fresh random keypair and its account. Test support only.
#[cfg(any(test, feature = "test-helpers"))]
#[must_use]
pub fn test_keypair() -> (SigningKey, AccountId) {
    let key = SigningKey::generate(&mut rand::rngs::OsRng);
    let account = account_of(&key);
    (key, account)
}
