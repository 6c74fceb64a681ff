mod common;

use std::sync::Arc;

use common::{contact, Harness};
use matric_admission::{AdmissionCore, AdmissionError};
use matric_nullables::{Delivery, NullClock, NullDocumentStore, NullNotifier, NullStore};
use matric_store::IdentityStore;
use matric_types::{AdmissionParams, ChallengeState, ContactAddress, IdentityId, Role};

const MEMBER: &str = "member@school.edu";

fn member(h: &Harness) -> IdentityId {
    h.core
        .provision(contact(MEMBER), Role::Member)
        .unwrap()
        .identity
        .id
}

fn issued_code(h: &Harness, to: &ContactAddress) -> String {
    h.notifier.last_recovery_code(to).expect("code delivered")
}

fn wrong(code: &str) -> &'static str {
    if code == "000000" {
        "000001"
    } else {
        "000000"
    }
}

fn challenge_state(h: &Harness, id: IdentityId) -> ChallengeState {
    h.store.get_identity(id).unwrap().recovery.state()
}

#[test]
fn full_recovery_round_trip() {
    let h = Harness::new();
    let id = member(&h);
    let to = contact(MEMBER);

    h.core.request_code(&to, Role::Member).unwrap();
    assert_eq!(challenge_state(&h, id), ChallengeState::CodeIssued);
    let code = issued_code(&h, &to);
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));

    let err = h.core.verify_code(&to, Role::Member, wrong(&code)).unwrap_err();
    assert!(matches!(err, AdmissionError::InvalidCode));

    let token = h.core.verify_code(&to, Role::Member, &code).unwrap();
    assert_eq!(challenge_state(&h, id), ChallengeState::TokenIssued);

    h.core
        .reset_secret(&to, Role::Member, token.expose(), "NewPass1")
        .unwrap();
    assert_eq!(challenge_state(&h, id), ChallengeState::None);
    h.core.authenticate(&to, Role::Member, "NewPass1").unwrap();

    let err = h
        .core
        .reset_secret(&to, Role::Member, token.expose(), "OtherPass2")
        .unwrap_err();
    assert!(matches!(err, AdmissionError::InvalidOrExpiredToken));
}

#[test]
fn stored_challenge_never_holds_plaintext() {
    let h = Harness::new();
    let id = member(&h);
    let to = contact(MEMBER);
    h.core.request_code(&to, Role::Member).unwrap();
    let code = issued_code(&h, &to);

    let challenge = h.store.get_identity(id).unwrap().recovery;
    let digest = challenge.code_digest.unwrap();
    assert_ne!(digest, code);
    assert!(!digest.contains(&code));
}

#[test]
fn expired_code_is_refused() {
    let h = Harness::new();
    member(&h);
    let to = contact(MEMBER);
    h.core.request_code(&to, Role::Member).unwrap();
    let code = issued_code(&h, &to);

    h.clock.advance(300);
    // exactly at the deadline the code still works
    let token = h.core.verify_code(&to, Role::Member, &code).unwrap();
    assert!(!token.is_empty());

    h.core.request_code(&to, Role::Member).unwrap();
    let code = issued_code(&h, &to);
    h.clock.advance(301);
    let err = h.core.verify_code(&to, Role::Member, &code).unwrap_err();
    assert!(matches!(err, AdmissionError::ChallengeExpired));
}

#[test]
fn code_cannot_be_reused() {
    let h = Harness::new();
    member(&h);
    let to = contact(MEMBER);
    h.core.request_code(&to, Role::Member).unwrap();
    let code = issued_code(&h, &to);

    h.core.verify_code(&to, Role::Member, &code).unwrap();
    let err = h.core.verify_code(&to, Role::Member, &code).unwrap_err();
    assert!(matches!(err, AdmissionError::NoActiveChallenge));
}

#[test]
fn verify_without_request_has_no_challenge() {
    let h = Harness::new();
    member(&h);
    let err = h
        .core
        .verify_code(&contact(MEMBER), Role::Member, "123456")
        .unwrap_err();
    assert!(matches!(err, AdmissionError::NoActiveChallenge));
}

#[test]
fn unknown_contact_gets_a_success_shaped_answer() {
    let h = Harness::new();
    member(&h);
    h.notifier.reset();

    h.core
        .request_code(&contact("stranger@mail.com"), Role::Member)
        .unwrap();
    // wrong role for a known address behaves the same
    h.core.request_code(&contact(MEMBER), Role::Admin).unwrap();
    assert!(h.notifier.sent().is_empty());
}

#[test]
fn disabled_member_cannot_recover() {
    let h = Harness::new();
    let id = member(&h);
    h.core.set_active(id, false).unwrap();

    let err = h
        .core
        .request_code(&contact(MEMBER), Role::Member)
        .unwrap_err();
    assert!(matches!(err, AdmissionError::AccountDisabled));
    assert_eq!(challenge_state(&h, id), ChallengeState::None);
}

#[test]
fn admins_recover_regardless_of_activation() {
    let h = Harness::new();
    let admin = h.admin();
    h.core.set_active(admin, false).unwrap();
    let to = contact("registrar@school.edu");

    h.core.request_code(&to, Role::Admin).unwrap();
    let code = issued_code(&h, &to);
    h.core.verify_code(&to, Role::Admin, &code).unwrap();
    assert!(h.notifier.sent().iter().any(|d| matches!(
        d,
        Delivery::RecoveryCode { role: Role::Admin, .. }
    )));
}

#[test]
fn weak_new_secret_keeps_the_token_alive() {
    let h = Harness::new();
    member(&h);
    let to = contact(MEMBER);
    h.core.request_code(&to, Role::Member).unwrap();
    let token = h
        .core
        .verify_code(&to, Role::Member, &issued_code(&h, &to))
        .unwrap();

    for weak in ["short1A", "alllowercase1", "ALLUPPERCASE1", "NoDigitsHere"] {
        let err = h
            .core
            .reset_secret(&to, Role::Member, token.expose(), weak)
            .unwrap_err();
        assert!(matches!(err, AdmissionError::WeakSecret(_)), "{weak}: {err}");
    }
    h.core
        .reset_secret(&to, Role::Member, token.expose(), "Strong123")
        .unwrap();
}

#[test]
fn wrong_token_is_refused() {
    let h = Harness::new();
    member(&h);
    let to = contact(MEMBER);
    h.core.request_code(&to, Role::Member).unwrap();
    h.core
        .verify_code(&to, Role::Member, &issued_code(&h, &to))
        .unwrap();

    let err = h
        .core
        .reset_secret(&to, Role::Member, "not-the-token", "NewPass1")
        .unwrap_err();
    assert!(matches!(err, AdmissionError::InvalidOrExpiredToken));
}

#[test]
fn reset_token_expires() {
    let h = Harness::new();
    member(&h);
    let to = contact(MEMBER);
    h.core.request_code(&to, Role::Member).unwrap();
    let token = h
        .core
        .verify_code(&to, Role::Member, &issued_code(&h, &to))
        .unwrap();

    h.clock.advance(901);
    let err = h
        .core
        .reset_secret(&to, Role::Member, token.expose(), "NewPass1")
        .unwrap_err();
    assert!(matches!(err, AdmissionError::InvalidOrExpiredToken));
}

#[test]
fn fresh_request_invalidates_a_live_token() {
    let h = Harness::new();
    member(&h);
    let to = contact(MEMBER);
    h.core.request_code(&to, Role::Member).unwrap();
    let token = h
        .core
        .verify_code(&to, Role::Member, &issued_code(&h, &to))
        .unwrap();

    h.core.request_code(&to, Role::Member).unwrap();
    let err = h
        .core
        .reset_secret(&to, Role::Member, token.expose(), "NewPass1")
        .unwrap_err();
    assert!(matches!(err, AdmissionError::InvalidOrExpiredToken));
}

#[test]
fn fresh_request_supersedes_the_previous_code() {
    let h = Harness::new();
    member(&h);
    let to = contact(MEMBER);
    h.core.request_code(&to, Role::Member).unwrap();
    let first = issued_code(&h, &to);

    // draw again until the codes differ, so the old one is really stale
    let mut second = first.clone();
    while second == first {
        h.core.request_code(&to, Role::Member).unwrap();
        second = issued_code(&h, &to);
    }

    let err = h.core.verify_code(&to, Role::Member, &first).unwrap_err();
    assert!(matches!(err, AdmissionError::InvalidCode));
    assert!(h.core.verify_code(&to, Role::Member, &second).is_ok());
}

#[test]
fn repeated_wrong_codes_discard_the_challenge() {
    let h = Harness::new();
    let id = member(&h);
    let to = contact(MEMBER);
    h.core.request_code(&to, Role::Member).unwrap();
    let code = issued_code(&h, &to);

    for _ in 0..4 {
        let err = h.core.verify_code(&to, Role::Member, wrong(&code)).unwrap_err();
        assert!(matches!(err, AdmissionError::InvalidCode));
    }
    let err = h.core.verify_code(&to, Role::Member, wrong(&code)).unwrap_err();
    assert!(matches!(err, AdmissionError::AttemptsExhausted));
    assert_eq!(challenge_state(&h, id), ChallengeState::None);

    // even the right code is useless now
    let err = h.core.verify_code(&to, Role::Member, &code).unwrap_err();
    assert!(matches!(err, AdmissionError::NoActiveChallenge));
}

#[test]
fn undelivered_code_still_opens_a_challenge() {
    let h = Harness::new();
    let id = member(&h);
    h.notifier.set_failing(true);

    h.core.request_code(&contact(MEMBER), Role::Member).unwrap();
    assert_eq!(challenge_state(&h, id), ChallengeState::CodeIssued);
}

#[test]
fn unavailable_store_is_transient() {
    let h = Harness::new();
    member(&h);
    h.store.set_unavailable(true);
    let err = h
        .core
        .request_code(&contact(MEMBER), Role::Member)
        .unwrap_err();
    assert!(err.is_retryable(), "{err}");
}

#[test]
fn code_length_beyond_the_generator_is_refused_up_front() {
    let params = AdmissionParams {
        code_digits: 10,
        ..AdmissionParams::fast_test_defaults()
    };
    let built = AdmissionCore::new(
        Arc::new(NullStore::new()),
        Arc::new(NullNotifier::new()),
        Arc::new(NullDocumentStore::new()),
        Arc::new(NullClock::new(common::START_SECS)),
        &params,
    );
    assert!(matches!(built, Err(AdmissionError::InvalidParams(_))));
}
