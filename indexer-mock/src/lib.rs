/// Indexer Mock Server Library
///
/// In-memory stand-in for the WhatsOnChain unspent endpoint and the Bitails
/// broadcast endpoint. Usable as a standalone binary for local development
/// or spawned on an ephemeral port from integration tests.

pub mod handlers;
pub mod ledger;
pub mod server;
pub mod types;

// Re-export commonly used types
pub use ledger::MockLedger;
pub use server::{create_router, run_server, spawn_ephemeral};
pub use types::*;
