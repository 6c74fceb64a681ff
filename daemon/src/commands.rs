//! Operator commands and their JSON output.

use std::sync::Arc;

use anyhow::{bail, Context};
use matric_admission::{AdmissionCore, EffectReport};
use matric_nullables::NullStore;
use matric_store::{AdmissionStore, ApplicantProfile, ApplicantRecord, IdentityRecord};
use matric_store_lmdb::{check_data_dir, check_integrity, LmdbEnvironment};
use matric_types::{
    ApplicantId, ApplicantStatus, AssignedId, ContactAddress, IdentityId, Role, SystemClock,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::DaemonConfig;
use crate::documents::FsDocumentStore;
use crate::outbox::OutboxNotifier;

#[derive(clap::Subcommand)]
pub enum Command {
    /// Draw the next identifier and hold it as a reservation.
    Allocate,

    /// Record a new application in the pending state.
    Submit {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        contact: ContactAddress,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        birth_date: String,
        #[arg(long)]
        program: String,
        #[arg(long)]
        previous_school: Option<String>,
        /// Photo reference, relative to the documents directory.
        #[arg(long)]
        photo: Option<String>,
        /// Supporting document reference; repeat for several.
        #[arg(long = "document")]
        documents: Vec<String>,
    },

    /// Admit a pending applicant.
    Approve {
        applicant: u64,
        /// Identity id of the acting administrator.
        #[arg(long, env = "MATRIC_ADMIN_ID")]
        admin: u64,
    },

    /// Turn down a pending applicant and delete their uploads.
    Reject {
        applicant: u64,
        #[arg(long, env = "MATRIC_ADMIN_ID")]
        admin: u64,
        #[arg(long)]
        reason: String,
    },

    /// Send a one-time recovery code.
    RequestCode {
        #[arg(long)]
        contact: ContactAddress,
        #[arg(long, default_value = "member")]
        role: Role,
    },

    /// Exchange a recovery code for a reset token.
    VerifyCode {
        #[arg(long)]
        contact: ContactAddress,
        #[arg(long, default_value = "member")]
        role: Role,
        #[arg(long)]
        code: String,
    },

    /// Set a new secret with a reset token.
    ResetSecret {
        #[arg(long)]
        contact: ContactAddress,
        #[arg(long, default_value = "member")]
        role: Role,
        #[arg(long, env = "MATRIC_RESET_TOKEN", hide_env_values = true)]
        token: String,
        #[arg(long, env = "MATRIC_NEW_SECRET", hide_env_values = true)]
        new_secret: String,
    },

    /// Create an account directly and send its credentials.
    Provision {
        #[arg(long)]
        contact: ContactAddress,
        #[arg(long)]
        role: Role,
    },

    /// Replace an account's secret with a new temporary one.
    Reissue { identity: u64 },

    /// Check a secret and record the access.
    Authenticate {
        #[arg(long)]
        contact: ContactAddress,
        #[arg(long, default_value = "member")]
        role: Role,
        #[arg(long, env = "MATRIC_SECRET", hide_env_values = true)]
        secret: String,
    },

    Enable { identity: u64 },

    Disable { identity: u64 },

    ShowApplicant { applicant: u64 },

    ShowIdentity { identity: u64 },

    FindIdentity {
        #[arg(long)]
        contact: ContactAddress,
        #[arg(long, default_value = "member")]
        role: Role,
    },

    /// List applications, optionally filtered by status.
    ListApplicants {
        #[arg(long)]
        status: Option<ApplicantStatus>,
    },

    /// List accounts, optionally filtered by role.
    ListIdentities {
        #[arg(long)]
        role: Option<Role>,
    },

    /// Cross-check the LMDB indexes against the records.
    Check,

    /// Print the effective configuration as TOML.
    Config,
}

/// The admission core and the store under it, opened for one invocation.
pub struct Runtime {
    core: AdmissionCore,
    store: Arc<dyn AdmissionStore>,
    lmdb: Option<Arc<LmdbEnvironment>>,
}

impl Runtime {
    pub fn open(config: &DaemonConfig, in_memory: bool) -> anyhow::Result<Self> {
        let lmdb = if in_memory {
            warn!("running on the in-memory store, nothing will be persisted");
            None
        } else {
            if let Err(e) = check_data_dir(&config.data_dir) {
                warn!(error = %e, "a new LMDB environment will be created");
            }
            let env = LmdbEnvironment::open(&config.data_dir, config.map_size_bytes())
                .with_context(|| format!("opening {}", config.data_dir.display()))?;
            Some(Arc::new(env))
        };
        let store: Arc<dyn AdmissionStore> = match &lmdb {
            Some(env) => env.clone(),
            None => Arc::new(NullStore::new()),
        };

        let notifier = Arc::new(
            OutboxNotifier::open(&config.outbox_path)
                .with_context(|| format!("opening outbox {}", config.outbox_path.display()))?,
        );
        let core = AdmissionCore::new(
            store.clone(),
            notifier,
            Arc::new(FsDocumentStore::new(&config.documents_dir)),
            Arc::new(SystemClock),
            &config.params,
        )?;
        Ok(Self { core, store, lmdb })
    }

    pub fn execute(&self, command: Command) -> anyhow::Result<Value> {
        let core = &self.core;
        let output = match command {
            Command::Allocate => json!({ "assigned_id": core.allocate()?.as_str() }),

            Command::Submit {
                full_name,
                contact,
                phone,
                birth_date,
                program,
                previous_school,
                photo,
                documents,
            } => {
                let profile = ApplicantProfile {
                    full_name,
                    contact,
                    phone,
                    birth_date,
                    program,
                    previous_school,
                };
                applicant_view(&core.submit(profile, photo, documents)?)
            }

            Command::Approve { applicant, admin } => {
                let approval = core.approve(ApplicantId::new(applicant), IdentityId::new(admin))?;
                json!({
                    "applicant": approval.applicant.as_u64(),
                    "assigned_id": approval.assigned_id.as_str(),
                    "identity": approval.identity.as_u64(),
                    "effects": effects_view(&approval.effects),
                })
            }

            Command::Reject {
                applicant,
                admin,
                reason,
            } => {
                let rejection =
                    core.reject(ApplicantId::new(applicant), IdentityId::new(admin), &reason)?;
                json!({
                    "applicant": rejection.applicant.as_u64(),
                    "status": rejection.status.as_str(),
                    "effects": effects_view(&rejection.effects),
                })
            }

            Command::RequestCode { contact, role } => {
                core.request_code(&contact, role)?;
                json!({ "requested": true })
            }

            Command::VerifyCode {
                contact,
                role,
                code,
            } => {
                let token = core.verify_code(&contact, role, &code)?;
                json!({ "reset_token": token.expose() })
            }

            Command::ResetSecret {
                contact,
                role,
                token,
                new_secret,
            } => {
                core.reset_secret(&contact, role, &token, &new_secret)?;
                json!({ "reset": true })
            }

            Command::Provision { contact, role } => {
                let provisioned = core.provision(contact, role)?;
                json!({
                    "identity": identity_view(&provisioned.identity),
                    "effects": effects_view(&provisioned.effects),
                })
            }

            Command::Reissue { identity } => {
                let (record, effects) = core.reissue_credentials(IdentityId::new(identity))?;
                json!({
                    "identity": identity_view(&record),
                    "effects": effects_view(&effects),
                })
            }

            Command::Authenticate {
                contact,
                role,
                secret,
            } => identity_view(&core.authenticate(&contact, role, &secret)?),

            Command::Enable { identity } => {
                identity_view(&core.set_active(IdentityId::new(identity), true)?)
            }

            Command::Disable { identity } => {
                identity_view(&core.set_active(IdentityId::new(identity), false)?)
            }

            Command::ShowApplicant { applicant } => {
                applicant_view(&core.applicant(ApplicantId::new(applicant))?)
            }

            Command::ShowIdentity { identity } => {
                identity_view(&core.identity(IdentityId::new(identity))?)
            }

            Command::FindIdentity { contact, role } => match core.find_identity(&contact, role)? {
                Some(record) => identity_view(&record),
                None => Value::Null,
            },

            Command::ListApplicants { status } => {
                let listed: Vec<Value> = self
                    .store
                    .iter_applicants()?
                    .iter()
                    .filter(|record| status.map_or(true, |s| record.status == s))
                    .map(applicant_view)
                    .collect();
                Value::Array(listed)
            }

            Command::ListIdentities { role } => {
                let listed: Vec<Value> = self
                    .store
                    .iter_identities()?
                    .iter()
                    .filter(|record| role.map_or(true, |r| record.role == r))
                    .map(identity_view)
                    .collect();
                Value::Array(listed)
            }

            Command::Check => {
                let Some(env) = &self.lmdb else {
                    bail!("the in-memory store has nothing to check");
                };
                let report = check_integrity(env)?;
                if report.is_healthy() {
                    info!(entries = report.total_entries, "integrity check passed");
                } else {
                    warn!(errors = report.errors.len(), "integrity check found problems");
                }
                json!({
                    "healthy": report.is_healthy(),
                    "databases_checked": report.databases_checked,
                    "total_entries": report.total_entries,
                    "errors": report.errors,
                })
            }

            Command::Config => bail!("config is printed before the store is opened"),
        };
        Ok(output)
    }
}

fn applicant_view(record: &ApplicantRecord) -> Value {
    json!({
        "id": record.id.as_u64(),
        "status": record.status.as_str(),
        "full_name": record.profile.full_name,
        "contact": record.profile.contact.as_str(),
        "phone": record.profile.phone,
        "birth_date": record.profile.birth_date,
        "program": record.profile.program,
        "previous_school": record.profile.previous_school,
        "photo": record.photo_ref,
        "documents": record.document_refs,
        "assigned_id": record.assigned_id.as_ref().map(AssignedId::as_str),
        "rejection_reason": record.rejection_reason,
        "submitted_at": record.submitted_at.as_secs(),
        "processed_at": record.processed_at.map(|t| t.as_secs()),
        "processed_by": record.processed_by.map(|id| id.as_u64()),
    })
}

/// Everything about an identity except its secret hash and challenge digests.
fn identity_view(record: &IdentityRecord) -> Value {
    json!({
        "id": record.id.as_u64(),
        "contact": record.contact.as_str(),
        "role": record.role.as_str(),
        "assigned_id": record.assigned_id.as_ref().map(AssignedId::as_str),
        "active": record.active,
        "created_at": record.created_at.as_secs(),
        "last_access_at": record.last_access_at.map(|t| t.as_secs()),
        "recovery": format!("{:?}", record.recovery.state()),
    })
}

fn effects_view(report: &EffectReport) -> Value {
    json!({
        "completed": report.completed,
        "failures": report
            .failures
            .iter()
            .map(|f| json!({ "effect": f.effect, "target": f.target, "error": f.error }))
            .collect::<Vec<_>>(),
    })
}
