//! Nullable infrastructure for the matric admission core.
//!
//! Every external dependency of the core (clock, storage, notifier, document
//! store) sits behind a trait. This crate provides implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! [`NullStore`] is complete and thread-safe, so it also serves as the
//! in-memory fallback when the durable store is unavailable.

pub mod clock;
pub mod documents;
pub mod notifier;
pub mod store;

pub use clock::NullClock;
pub use documents::NullDocumentStore;
pub use notifier::{Delivery, NullNotifier};
pub use store::NullStore;
