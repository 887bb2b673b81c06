//! REST API client module for the student-records portal.
//!
//! This module provides the `ApiClient` for logging in, minting share
//! tokens and fetching shared record sets.
//!
//! Authenticated calls carry the access token as a bearer credential. When
//! the server rejects it, the client refreshes the session once using the
//! durable refresh token and replays the request.

pub mod client;
pub mod error;
mod refresh;
pub mod request;

pub use client::{ApiClient, ApiResponse};
pub use error::{ApiError, Field, FieldErrors};
pub use request::{Attempt, AuthMode, Endpoint};
