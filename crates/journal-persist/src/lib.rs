//! Persistence & Sync Adapter (spec §4.2, C2): the `PersistAdapter` trait
//! local durable backends implement, plus the relay sync client.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

mod adapter;
mod relay;

pub use adapter::{DocMeta, DocStats, PersistAdapter, StoredUpdate};
pub use relay::{ConnectionState, RelayClient};

// vim: ts=4
