//! Access layer for the remote portfolio endpoint.

mod action;
mod cached_client;
mod client;
mod envelope;
pub mod types;

pub use action::{Invalidation, MutateAction, QueryAction};
pub use cached_client::PortfolioClient;
pub use client::RemoteClient;
pub use envelope::unwrap_envelope;
