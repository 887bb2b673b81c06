//! Authentication module for managing tokens and the admin session.
//!
//! This module provides:
//! - `TokenStore`: key-value storage for tokens, with in-memory, file and
//!   OS keychain implementations
//! - `SessionStores`: the volatile (access token) and durable (refresh token)
//!   stores used together
//! - `AuthController`: login, logout and the protected-route guard
//!
//! The access token lives only as long as the current session; the refresh
//! token survives restarts.

pub mod controller;
pub mod credentials;
pub mod session;
pub mod store;

pub use controller::{AuthController, LoginForm};
pub use credentials::KeyringStore;
pub use session::{Session, SessionStores, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
pub use store::{FileStore, MemoryStore, TokenStore};
