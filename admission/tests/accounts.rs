mod common;

use common::{contact, Harness, START_SECS};
use matric_admission::AdmissionError;
use matric_nullables::Delivery;
use matric_store::IdentityStore;
use matric_types::{Role, Timestamp};

#[test]
fn provisioned_member_gets_an_identifier_and_credentials() {
    let h = Harness::new();
    let provisioned = h
        .core
        .provision(contact("Transfer@School.edu"), Role::Member)
        .unwrap();
    let identity = provisioned.identity;

    assert_eq!(identity.contact.as_str(), "transfer@school.edu");
    assert_eq!(identity.assigned_id.as_ref().map(|a| a.as_str()), Some("STU0001"));
    assert!(identity.active);
    assert!(provisioned.effects.all_succeeded());

    let sent = h.notifier.sent();
    assert!(matches!(
        sent.last(),
        Some(Delivery::Credentials { assigned_id: Some(a), .. }) if a.as_str() == "STU0001"
    ));
}

#[test]
fn provisioned_admin_carries_no_identifier() {
    let h = Harness::new();
    let provisioned = h
        .core
        .provision(contact("head@school.edu"), Role::Admin)
        .unwrap();
    assert_eq!(provisioned.identity.assigned_id, None);
    assert_eq!(h.core.current_max_identifier().unwrap(), 0);
}

#[test]
fn duplicate_contact_is_refused() {
    let h = Harness::new();
    h.core
        .provision(contact("dup@school.edu"), Role::Member)
        .unwrap();
    let err = h
        .core
        .provision(contact("DUP@school.edu"), Role::Admin)
        .unwrap_err();
    assert!(matches!(err, AdmissionError::ContactInUse(_)), "{err}");
}

#[test]
fn authentication_checks_role_and_secret() {
    let h = Harness::new();
    let to = contact("login@school.edu");
    h.core.provision(to.clone(), Role::Member).unwrap();
    let secret = h.notifier.last_secret(&to).unwrap();

    h.clock.advance(60);
    let record = h.core.authenticate(&to, Role::Member, &secret).unwrap();
    assert_eq!(record.last_access_at, Some(Timestamp::new(START_SECS + 60)));

    for (role, attempt) in [
        (Role::Admin, secret.as_str()),
        (Role::Member, "Wrong1234"),
    ] {
        let err = h.core.authenticate(&to, role, attempt).unwrap_err();
        assert!(matches!(err, AdmissionError::InvalidCredentials));
    }
    let err = h
        .core
        .authenticate(&contact("ghost@school.edu"), Role::Member, &secret)
        .unwrap_err();
    assert!(matches!(err, AdmissionError::InvalidCredentials));
}

#[test]
fn concurrent_logins_all_succeed() {
    let h = Harness::new();
    let to = contact("busy@school.edu");
    h.core.provision(to.clone(), Role::Member).unwrap();
    let secret = h.notifier.last_secret(&to).unwrap();

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| h.core.authenticate(&to, Role::Member, &secret)))
            .collect();
        handles.into_iter().map(|j| j.join().unwrap()).collect()
    });
    for result in &results {
        assert!(result.is_ok(), "{result:?}");
    }
}

#[test]
fn login_does_not_make_a_pending_update_stale() {
    let h = Harness::new();
    let to = contact("steady@school.edu");
    let id = h.core.provision(to.clone(), Role::Member).unwrap().identity.id;
    let secret = h.notifier.last_secret(&to).unwrap();
    let before = h.store.get_identity(id).unwrap();

    h.clock.advance(30);
    h.core.authenticate(&to, Role::Member, &secret).unwrap();

    let mut update = before.clone();
    update.active = false;
    let written = h.store.update_identity(&update).unwrap();
    assert!(!written.active);
    assert_eq!(written.last_access_at, Some(Timestamp::new(START_SECS + 30)));
}

#[test]
fn disabled_member_is_told_only_after_the_right_secret() {
    let h = Harness::new();
    let to = contact("paused@school.edu");
    let id = h.core.provision(to.clone(), Role::Member).unwrap().identity.id;
    let secret = h.notifier.last_secret(&to).unwrap();
    h.core.set_active(id, false).unwrap();

    assert!(matches!(
        h.core.authenticate(&to, Role::Member, "Wrong1234").unwrap_err(),
        AdmissionError::InvalidCredentials
    ));
    assert!(matches!(
        h.core.authenticate(&to, Role::Member, &secret).unwrap_err(),
        AdmissionError::AccountDisabled
    ));

    h.core.set_active(id, true).unwrap();
    h.core.authenticate(&to, Role::Member, &secret).unwrap();
}

#[test]
fn reissue_replaces_the_secret() {
    let h = Harness::new();
    let to = contact("forgot@school.edu");
    let id = h.core.provision(to.clone(), Role::Member).unwrap().identity.id;
    let old = h.notifier.last_secret(&to).unwrap();

    let (record, report) = h.core.reissue_credentials(id).unwrap();
    assert!(report.all_succeeded());
    assert_eq!(record.assigned_id.as_ref().map(|a| a.as_str()), Some("STU0001"));
    let new = h.notifier.last_secret(&to).unwrap();
    assert_ne!(old, new);

    assert!(matches!(
        h.core.authenticate(&to, Role::Member, &old).unwrap_err(),
        AdmissionError::InvalidCredentials
    ));
    h.core.authenticate(&to, Role::Member, &new).unwrap();
}

#[test]
fn lookups_filter_by_role() {
    let h = Harness::new();
    let to = contact("lookup@school.edu");
    h.core.provision(to.clone(), Role::Member).unwrap();

    assert!(h.core.find_identity(&to, Role::Member).unwrap().is_some());
    assert!(h.core.find_identity(&to, Role::Admin).unwrap().is_none());
}

#[test]
fn store_outage_surfaces_as_transient() {
    let h = Harness::new();
    h.store.set_unavailable(true);
    let err = h
        .core
        .provision(contact("later@school.edu"), Role::Member)
        .unwrap_err();
    assert!(err.is_retryable(), "{err}");
    assert!(matches!(err, AdmissionError::TransientError(_)));
}
