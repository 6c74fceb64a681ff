//! Fundamental types for the matric admission core.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! assigned identifiers, record ids, contact addresses, timestamps, roles,
//! status enums and the tunable admission parameters.

pub mod address;
pub mod error;
pub mod id;
pub mod params;
pub mod state;
pub mod time;

pub use address::ContactAddress;
pub use error::TypesError;
pub use id::{ApplicantId, AssignedId, IdentityId};
pub use params::{AdmissionParams, MAX_CODE_DIGITS};
pub use state::{ApplicantStatus, ChallengeState, Role};
pub use time::{Clock, SystemClock, Timestamp};
