//! Core library for rollshare.
//!
//! rollshare is a client for a small student-records portal: an administrator
//! logs in, mints a time-limited share token, and hands out a public link that
//! shows a read-only, filterable list of student records.
//!
//! - `api`: HTTP client with the bearer/refresh interceptor
//! - `auth`: token stores and the session controller
//! - `share`: share-link generation and the record viewer
//! - `routes`: client route table and the navigation seam
//! - `config`: on-disk configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod routes;
pub mod share;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthController, Session, SessionStores};
pub use config::Config;
pub use models::{ShareLink, StudentRecord, TokenPair};
pub use routes::{Navigator, Route};
pub use share::{filter_by_email, ShareService, ShareViewer, ViewState};
