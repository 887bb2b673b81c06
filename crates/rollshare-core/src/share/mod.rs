//! Share links and the public record viewer.
//!
//! - `ShareService`: mints share links and fetches shared record sets
//! - `ShareViewer`: holds one fetched record set plus the email filter
//! - `filter_by_email`: the pure filter behind the viewer

pub mod filter;
pub mod service;
pub mod viewer;

pub use crate::models::share::parse_share_reference;
pub use filter::{filter_by_email, FilterState};
pub use service::ShareService;
pub use viewer::{ShareViewer, ViewState};
