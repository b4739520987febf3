//! Dual-mode coordination for IntelliFire fireplaces.
//!
//! An IntelliFire module can be reached over the LAN or through the vendor
//! cloud relay, and the two paths fail independently. The [`Coordinator`]
//! holds both transports and arbitrates between them with two independent
//! flags: the *read mode* picks where status polls come from, the *control
//! mode* picks where commands go. Flipping the control mode performs a
//! stop/copy/start handover so the incoming transport never serves stale
//! data.
//!
//! [`setup::connect`] is the entry point: it logs in to the cloud
//! (recovering the local signing material when it is not stored), waits for
//! the module to report a real identity, runs the first refresh, and starts
//! the scheduled refresh task.
//!
//! The [`entity`] module exposes declarative descriptor tables mapping
//! coordinator state onto display and control surfaces; `firectl` renders
//! them.

pub mod config;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod setup;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ApiMode, FireplaceConfig};
pub use coordinator::{Coordinator, DeviceInfo, MAX_LOCAL_POLL_FAILURES};
pub use error::CoreError;
pub use setup::{Connected, RecoveredCredentials, connect};
