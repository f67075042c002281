// ABOUTME: Pooled, validity-tracked SMPP sessions used by the outbound gateway
// ABOUTME: The factory opens and destroys sessions, the pool leases them out one call at a time

mod factory;
mod handle;
mod pool;

pub use factory::SessionFactory;
pub use handle::SessionHandle;
pub use pool::{PooledSession, SessionPool};
