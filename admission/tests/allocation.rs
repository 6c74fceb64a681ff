mod common;

use std::collections::HashSet;

use common::{contact, Harness};
use matric_admission::AdmissionError;
use matric_store::{IdentifierStore, IdentityStore, NewIdentity};
use matric_types::{AdmissionParams, AssignedId, Role, Timestamp};

fn hold(h: &Harness, email: &str, raw_id: &str) {
    h.store
        .insert_identity(NewIdentity {
            contact: contact(email),
            role: Role::Member,
            secret_hash: String::new(),
            assigned_id: Some(AssignedId::from_raw(raw_id)),
            active: true,
            created_at: Timestamp::new(1),
        })
        .unwrap();
}

#[test]
fn first_identifier_is_one() {
    let h = Harness::new();
    assert_eq!(h.core.allocate().unwrap().as_str(), "STU0001");
    assert_eq!(h.core.allocate().unwrap().as_str(), "STU0002");
}

#[test]
fn follows_the_maximum_across_both_record_sets() {
    let h = Harness::new();
    let admin = h.admin();

    // applicant-side identifier
    let a = h.submit("first@x.io", None);
    h.core.approve(a.id, admin).unwrap();
    // identity-side identifier well above it
    hold(&h, "legacy@x.io", "STU0041");

    assert_eq!(h.core.allocate().unwrap().as_str(), "STU0042");
}

#[test]
fn malformed_identifiers_count_as_zero() {
    let h = Harness::new();
    hold(&h, "a@x.io", "STU-legacy");
    hold(&h, "b@x.io", "OLD0099");
    hold(&h, "c@x.io", "STU0003");

    assert_eq!(h.core.current_max_identifier().unwrap(), 3);
    assert_eq!(h.core.allocate().unwrap().as_str(), "STU0004");
}

#[test]
fn reserved_identifiers_are_never_reissued() {
    let h = Harness::new();
    let reserved = h.core.allocate().unwrap();
    let admin = h.admin();
    let a = h.submit("next@x.io", None);

    let approval = h.core.approve(a.id, admin).unwrap();
    assert_ne!(approval.assigned_id, reserved);
    assert_eq!(approval.assigned_id.as_str(), "STU0002");
}

#[test]
fn retries_after_losing_a_race() {
    let h = Harness::new();
    h.store.simulate_identifier_races(2);

    // The phantom writer takes STU0001 and STU0002 before we can.
    assert_eq!(h.core.allocate().unwrap().as_str(), "STU0003");
    assert_eq!(h.store.assigned_identifiers().unwrap().len(), 3);
}

#[test]
fn gives_up_after_bounded_attempts() {
    let h = Harness::new();
    h.store.simulate_identifier_races(5);

    let err = h.core.allocate().unwrap_err();
    assert!(matches!(err, AdmissionError::AllocationExhausted { attempts: 5 }));
}

#[test]
fn fixed_pause_between_attempts() {
    let params = AdmissionParams {
        allocation_retry_delay_ms: 20,
        ..AdmissionParams::fast_test_defaults()
    };
    let h = Harness::with_params(params);
    h.store.simulate_identifier_races(2);

    let started = std::time::Instant::now();
    h.core.allocate().unwrap();
    assert!(started.elapsed() >= std::time::Duration::from_millis(40));
}

#[test]
fn unavailable_store_is_transient() {
    let h = Harness::new();
    h.store.set_unavailable(true);
    let err = h.core.allocate().unwrap_err();
    assert!(err.is_retryable(), "{err}");
}

#[test]
fn concurrent_allocations_are_distinct_and_above_prior_max() {
    const CALLERS: u32 = 16;
    let params = AdmissionParams {
        allocation_max_attempts: CALLERS + 1,
        ..AdmissionParams::fast_test_defaults()
    };
    let h = Harness::with_params(params);
    hold(&h, "seed@x.io", "STU0010");
    let prior_max = h.core.current_max_identifier().unwrap();

    let ids: Vec<AssignedId> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..CALLERS)
            .map(|_| s.spawn(|| h.core.allocate().unwrap()))
            .collect();
        handles.into_iter().map(|j| j.join().unwrap()).collect()
    });

    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), CALLERS as usize);
    for id in &ids {
        assert!(id.number("STU").unwrap() > prior_max, "{id}");
    }
}
