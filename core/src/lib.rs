//! Authenticated HTTP client core for the logbook driver API.
//!
//! # Overview
//! The backend is a plain REST API: JSON bodies, `:id`-templated routes,
//! bearer-token auth, and a handful of public endpoints for sign-in and
//! password-reset codes. This crate is the transport layer the app screens
//! sit on — request building, dispatch, session expiry handling, multipart
//! document upload, and typed wrappers for every driver operation.
//!
//! # Design
//! - The token store is an injected dependency (`Arc<dyn TokenStore>`),
//!   never module-level state.
//! - Request parameters are tagged at the call site (`Params`): path
//!   substitutions, payload fields and header overrides are separate.
//! - Every HTTP outcome returns `Ok(Envelope { data, status, url })`;
//!   only transport-level failures are `Err`, uniformly for plain requests
//!   and uploads.
//! - Session expiry is a broadcast `ClientEvent`, not a navigation call —
//!   the UI layer subscribes and decides.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod request;
pub mod session;
pub mod token;
pub mod types;
pub mod upload;

mod driver;

pub use client::ApiClient;
pub use config::ApiConfig;
pub use error::ApiError;
pub use http::{Envelope, Method};
pub use request::Params;
pub use session::{ClientEvent, ErrorCatalog};
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use types::{
    CreateDeposit, CreateRestock, CreateTravel, DataEnvelope, Deposit, Driver,
    FinancialStatement, Freight, FreightFile, FreightQuotation, FreightStatus, Notification,
    NotificationPage, Restock, SessionToken, Travel,
};
pub use upload::FileAsset;
