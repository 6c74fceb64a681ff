//! One-time-code recovery flow.
//!
//! `none → code-issued → token-issued → none`, scoped to one identity found
//! by contact and role. Expiry is checked lazily when a code or token is
//! presented; nothing is swept in the background.
//!
//! Codes and tokens are persisted as Blake2b digests and compared in
//! constant time. The plaintext code only reaches the notifier and the
//! plaintext token only reaches the caller.

use std::sync::Arc;

use matric_crypto::{digest_hex, digest_matches, generate_code, generate_reset_token, Secret};
use matric_store::{AdmissionStore, IdentityRecord};
use matric_types::{AdmissionParams, Clock, ContactAddress, Role};
use tracing::{debug, info, warn};

use crate::effects::{Effect, EffectRunner};
use crate::{AdmissionError, CredentialIssuer};

pub struct RecoveryFlow {
    store: Arc<dyn AdmissionStore>,
    clock: Arc<dyn Clock>,
    issuer: CredentialIssuer,
    effects: EffectRunner,
    code_digits: u32,
    code_ttl_secs: u64,
    token_ttl_secs: u64,
    max_code_attempts: u32,
}

impl RecoveryFlow {
    pub fn new(
        store: Arc<dyn AdmissionStore>,
        clock: Arc<dyn Clock>,
        issuer: CredentialIssuer,
        effects: EffectRunner,
        params: &AdmissionParams,
    ) -> Self {
        Self {
            store,
            clock,
            issuer,
            effects,
            code_digits: params.code_digits,
            code_ttl_secs: params.code_ttl_secs,
            token_ttl_secs: params.reset_token_ttl_secs,
            max_code_attempts: params.max_code_attempts.max(1),
        }
    }

    fn lookup(
        &self,
        contact: &ContactAddress,
        role: Role,
    ) -> Result<Option<IdentityRecord>, AdmissionError> {
        Ok(self
            .store
            .find_identity(contact)?
            .filter(|record| record.role == role))
    }

    /// Issue a fresh code, replacing any live code or token.
    ///
    /// An unknown `(contact, role)` returns `Ok(())` with no effect, exactly
    /// like a known one, so callers cannot discover which addresses exist.
    pub fn request_code(&self, contact: &ContactAddress, role: Role) -> Result<(), AdmissionError> {
        let Some(record) = self.lookup(contact, role)? else {
            debug!(%role, "recovery requested for unknown account");
            return Ok(());
        };
        if role == Role::Member && !record.active {
            return Err(AdmissionError::AccountDisabled);
        }

        let code = generate_code(&mut rand::thread_rng(), self.code_digits);
        let expires_at = self.clock.now().plus_secs(self.code_ttl_secs);
        let mut challenge = record.recovery.clone();
        challenge.issue_code(digest_hex(code.expose()), expires_at);
        self.store.put_recovery(record.id, &challenge)?;
        info!(identity = %record.id, %expires_at, "recovery code issued");

        let report = self.effects.run(vec![Effect::NotifyRecoveryCode {
            contact: record.contact,
            role,
            code,
        }]);
        if !report.all_succeeded() {
            warn!(identity = %record.id, "recovery code could not be delivered");
        }
        Ok(())
    }

    /// Exchange a live code for a reset token.
    pub fn verify_code(
        &self,
        contact: &ContactAddress,
        role: Role,
        code: &str,
    ) -> Result<Secret, AdmissionError> {
        let mut record = self
            .lookup(contact, role)?
            .ok_or(AdmissionError::NoActiveChallenge)?;
        let challenge = &mut record.recovery;

        let (Some(digest), Some(expires_at)) =
            (challenge.code_digest.clone(), challenge.code_expires_at)
        else {
            return Err(AdmissionError::NoActiveChallenge);
        };
        let now = self.clock.now();
        if expires_at.is_passed(now) {
            return Err(AdmissionError::ChallengeExpired);
        }

        if !digest_matches(code, &digest) {
            challenge.code_attempts += 1;
            let exhausted = challenge.code_attempts >= self.max_code_attempts;
            if exhausted {
                challenge.clear();
            }
            let id = record.id;
            self.store.update_identity(&record)?;
            if exhausted {
                warn!(identity = %id, "recovery challenge discarded after repeated wrong codes");
                return Err(AdmissionError::AttemptsExhausted);
            }
            return Err(AdmissionError::InvalidCode);
        }

        let token = generate_reset_token(&mut rand::thread_rng());
        challenge.issue_token(digest_hex(token.expose()), now.plus_secs(self.token_ttl_secs));
        let record = self.store.update_identity(&record)?;
        info!(identity = %record.id, "recovery code verified, reset token issued");
        Ok(token)
    }

    /// Consume a reset token and set a new secret.
    pub fn reset_secret(
        &self,
        contact: &ContactAddress,
        role: Role,
        token: &str,
        new_secret: &str,
    ) -> Result<(), AdmissionError> {
        let mut record = self
            .lookup(contact, role)?
            .ok_or(AdmissionError::InvalidOrExpiredToken)?;

        let live = match (
            &record.recovery.token_digest,
            record.recovery.token_expires_at,
        ) {
            (Some(digest), Some(expires_at)) => {
                digest_matches(token, digest) && !expires_at.is_passed(self.clock.now())
            }
            _ => false,
        };
        if !live {
            return Err(AdmissionError::InvalidOrExpiredToken);
        }
        self.issuer.check_strength(new_secret)?;

        record.secret_hash = self.issuer.hash(new_secret)?;
        record.recovery.clear();
        let record = self.store.update_identity(&record)?;
        info!(identity = %record.id, "secret reset through recovery");
        Ok(())
    }
}
