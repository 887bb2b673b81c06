//! Data models for the portal API.
//!
//! - `StudentRecord`: one row of a shared record set
//! - `TokenPair`: access/refresh tokens returned by login and refresh
//! - `ShareLink`: public URL derived from a share token

pub mod share;
pub mod student;
pub mod tokens;

pub use share::{ShareLink, ShareTokenResponse};
pub use student::StudentRecord;
pub use tokens::{LoginRequest, RefreshRequest, TokenPair, TokenPairResponse};
