#![allow(dead_code)]

use std::sync::Arc;

use matric_admission::AdmissionCore;
use matric_nullables::{NullClock, NullDocumentStore, NullNotifier, NullStore};
use matric_store::{ApplicantProfile, ApplicantRecord};
use matric_types::{AdmissionParams, ContactAddress, IdentityId, Role};

pub const START_SECS: u64 = 1_700_000_000;

pub struct Harness {
    pub core: AdmissionCore,
    pub store: Arc<NullStore>,
    pub notifier: Arc<NullNotifier>,
    pub documents: Arc<NullDocumentStore>,
    pub clock: Arc<NullClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_params(AdmissionParams::fast_test_defaults())
    }

    pub fn with_params(params: AdmissionParams) -> Self {
        let store = Arc::new(NullStore::new());
        let notifier = Arc::new(NullNotifier::new());
        let documents = Arc::new(NullDocumentStore::new());
        let clock = Arc::new(NullClock::new(START_SECS));
        let core = AdmissionCore::new(
            store.clone(),
            notifier.clone(),
            documents.clone(),
            clock.clone(),
            &params,
        )
        .expect("core builds");
        Self {
            core,
            store,
            notifier,
            documents,
            clock,
        }
    }

    pub fn submit(&self, email: &str, photo_ref: Option<&str>) -> ApplicantRecord {
        self.core
            .submit(profile(email), photo_ref.map(str::to_string), Vec::new())
            .expect("submission stored")
    }

    /// Provision an administrator and return their identity id.
    pub fn admin(&self) -> IdentityId {
        self.core
            .provision(contact("registrar@school.edu"), Role::Admin)
            .expect("admin provisioned")
            .identity
            .id
    }
}

pub fn contact(raw: &str) -> ContactAddress {
    ContactAddress::parse(raw).expect("valid contact")
}

pub fn profile(email: &str) -> ApplicantProfile {
    ApplicantProfile {
        full_name: format!("Applicant {email}"),
        contact: contact(email),
        phone: Some("+254700000000".to_string()),
        birth_date: "2008-05-17".to_string(),
        program: "Science".to_string(),
        previous_school: Some("Hillside Primary".to_string()),
    }
}
