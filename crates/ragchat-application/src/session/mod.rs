//! Session lifecycle module.
//!
//! # Module Structure
//!
//! - `manager`: the active store's lifecycle (`SessionManager`, `SessionState`)
//! - `teardown`: detached best-effort store deletion and the shared `ActiveStoreSlot`
//! - `unload_guard`: teardown on process exit (`UnloadGuard`)

mod manager;
mod teardown;
mod unload_guard;

pub use manager::{SessionManager, SessionState};
pub use teardown::{ActiveStoreSlot, spawn_detached_delete};
pub use unload_guard::UnloadGuard;
