//! Data-access and state layer for the Chunaav election dashboard.
//!
//! [`Client`] is the facade views talk to. It wires the HTTP wrapper, the
//! session store, the query cache and the display preferences together over
//! one [`storage::KeyValueStore`].

pub mod api;
pub mod cache;
pub mod client;
pub mod error;
pub mod filter;
pub mod http;
pub mod logging;
pub mod preferences;
pub mod print;
pub mod session;
pub mod storage;

pub use client::{BannerImage, Client};
pub use error::ClientError;
