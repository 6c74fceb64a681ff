//! The admission core running on the LMDB backend.

use std::collections::HashSet;
use std::sync::Arc;

use matric_admission::{AdmissionCore, AdmissionError};
use matric_nullables::{NullClock, NullDocumentStore, NullNotifier};
use matric_store::{ApplicantProfile, IdentityStore};
use matric_store_lmdb::{check_integrity, LmdbEnvironment};
use matric_types::{AdmissionParams, ApplicantStatus, AssignedId, ContactAddress, Role};

fn contact(s: &str) -> ContactAddress {
    ContactAddress::parse(s).unwrap()
}

fn profile(email: &str) -> ApplicantProfile {
    ApplicantProfile {
        full_name: "Baraka Mwangi".into(),
        contact: contact(email),
        phone: Some("+254711111111".into()),
        birth_date: "2009-01-12".into(),
        program: "Science".into(),
        previous_school: None,
    }
}

fn open_core(
    dir: &std::path::Path,
    params: &AdmissionParams,
) -> (AdmissionCore, Arc<LmdbEnvironment>, Arc<NullNotifier>) {
    let store = Arc::new(LmdbEnvironment::open(dir, 16 * 1024 * 1024).unwrap());
    let notifier = Arc::new(NullNotifier::new());
    let core = AdmissionCore::new(
        store.clone(),
        notifier.clone(),
        Arc::new(NullDocumentStore::new()),
        Arc::new(NullClock::new(1_700_000_000)),
        params,
    )
    .unwrap();
    (core, store, notifier)
}

#[test]
fn admission_cycle_persists() {
    let dir = tempfile::tempdir().unwrap();
    let (core, store, notifier) = open_core(dir.path(), &AdmissionParams::fast_test_defaults());

    let admin = core
        .provision(contact("office@school.edu"), Role::Admin)
        .unwrap()
        .identity
        .id;
    let reserved = core.allocate().unwrap();
    let applicant = core
        .submit(profile("baraka@mail.com"), Some("photos/b.jpg".into()), vec![])
        .unwrap();
    let approval = core.approve(applicant.id, admin).unwrap();
    assert_eq!(reserved.as_str(), "STU0001");
    assert_eq!(approval.assigned_id.as_str(), "STU0002");
    assert!(matches!(
        core.approve(applicant.id, admin).unwrap_err(),
        AdmissionError::AlreadyProcessed { .. }
    ));

    let to = contact("baraka@mail.com");
    core.request_code(&to, Role::Member).unwrap();
    let code = notifier.last_recovery_code(&to).unwrap();
    let token = core.verify_code(&to, Role::Member, &code).unwrap();
    core.reset_secret(&to, Role::Member, token.expose(), "Fresh2024")
        .unwrap();
    core.authenticate(&to, Role::Member, "Fresh2024").unwrap();

    assert_eq!(
        core.applicant(applicant.id).unwrap().status,
        ApplicantStatus::Approved
    );
    assert!(check_integrity(&store).unwrap().is_healthy());
}

#[test]
fn racing_approvals_of_one_applicant_commit_once() {
    let dir = tempfile::tempdir().unwrap();
    let (core, store, notifier) = open_core(dir.path(), &AdmissionParams::fast_test_defaults());
    let admin = core
        .provision(contact("office@school.edu"), Role::Admin)
        .unwrap()
        .identity
        .id;
    let applicant = core
        .submit(profile("contested@mail.com"), None, vec![])
        .unwrap();
    notifier.reset();

    let core = &core;
    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(move || core.approve(applicant.id, admin)))
            .collect();
        handles.into_iter().map(|j| j.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(err, AdmissionError::AlreadyProcessed { .. }), "{err}");
    }
    // admin plus the one approved member
    assert_eq!(store.identity_count().unwrap(), 2);
    assert_eq!(notifier.sent().len(), 1);
    assert!(check_integrity(&store).unwrap().is_healthy());
}

#[test]
fn racing_allocations_hand_out_distinct_identifiers() {
    const CALLERS: u32 = 24;
    let params = AdmissionParams {
        allocation_max_attempts: CALLERS + 1,
        ..AdmissionParams::fast_test_defaults()
    };
    let dir = tempfile::tempdir().unwrap();
    let (core, store, _) = open_core(dir.path(), &params);

    let core = &core;
    let ids: Vec<AssignedId> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..CALLERS)
            .map(|_| s.spawn(move || core.allocate().unwrap()))
            .collect();
        handles.into_iter().map(|j| j.join().unwrap()).collect()
    });

    let unique: HashSet<_> = ids.iter().map(|id| id.as_str().to_string()).collect();
    assert_eq!(unique.len(), CALLERS as usize);
    assert_eq!(core.current_max_identifier().unwrap(), u64::from(CALLERS));
    assert!(check_integrity(&store).unwrap().is_healthy());
}

#[test]
fn racing_approvals_of_different_applicants_get_distinct_identifiers() {
    const APPLICANTS: u32 = 12;
    let params = AdmissionParams {
        allocation_max_attempts: APPLICANTS + 1,
        ..AdmissionParams::fast_test_defaults()
    };
    let dir = tempfile::tempdir().unwrap();
    let (core, store, _) = open_core(dir.path(), &params);
    let admin = core
        .provision(contact("office@school.edu"), Role::Admin)
        .unwrap()
        .identity
        .id;
    let applicants: Vec<_> = (0..APPLICANTS)
        .map(|n| {
            core.submit(profile(&format!("cohort{n}@mail.com")), None, vec![])
                .unwrap()
                .id
        })
        .collect();

    let core = &core;
    let assigned: Vec<AssignedId> = std::thread::scope(|s| {
        let handles: Vec<_> = applicants
            .iter()
            .map(|&id| s.spawn(move || core.approve(id, admin).unwrap().assigned_id))
            .collect();
        handles.into_iter().map(|j| j.join().unwrap()).collect()
    });

    let unique: HashSet<_> = assigned.iter().map(|id| id.as_str().to_string()).collect();
    assert_eq!(unique.len(), APPLICANTS as usize);
    assert_eq!(core.current_max_identifier().unwrap(), u64::from(APPLICANTS));
    assert!(check_integrity(&store).unwrap().is_healthy());
}
