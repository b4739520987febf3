//! Async client for IntelliFire WiFi fireplace modules.
//!
//! Two transports speak to the same fireplace:
//!
//! - **[`LocalApi`]** — direct LAN HTTP to the module's embedded server.
//!   Status via `GET /poll`; commands via a sha256 challenge–response POST.
//! - **[`CloudApi`]** — the vendor relay (`iftapi.net`). Cookie-session
//!   login, long-poll status reads, form-POST commands. Also the source of
//!   truth for the per-fireplace `api_key`/`user_id` the local transport
//!   signs with.
//!
//! Both implement [`FireplaceReadSource`] and [`FireplaceController`]
//! (combined: [`FireplaceApi`]), so consumers like the coordinator in
//! `intellifire-core` can route reads and writes to either transport
//! without caring which is which. Each transport owns its background
//! polling task and a cached [`PollData`] snapshot replaced wholesale on
//! every successful poll.

pub mod api;
mod background;
pub mod cloud;
pub mod command;
pub mod error;
pub mod local;
pub mod model;
pub mod transport;

pub use api::{FireplaceApi, FireplaceController, FireplaceReadSource};
pub use cloud::{CloudApi, CloudFireplace, DEFAULT_CLOUD_BASE};
pub use command::FireplaceCommand;
pub use error::Error;
pub use local::{DEFAULT_LOCAL_POLL_INTERVAL, LocalApi};
pub use model::{ErrorCode, PLACEHOLDER_SERIAL, PollData};
pub use transport::TransportConfig;
