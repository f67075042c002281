use super::{SessionFactory, SessionHandle};
use crate::config::PoolSettings;
use crate::error::{ErrorKind, GatewayError};
use crate::transport::Connector;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::{debug, info, trace, warn};

struct PoolInner<C: Connector> {
    factory: SessionFactory<C>,
    settings: PoolSettings,
    /// One permit per session that may exist, idle or leased
    permits: Arc<Semaphore>,
    idle: Mutex<VecDeque<SessionHandle<C::Transport>>>,
}

impl<C: Connector> PoolInner<C> {
    /// Return a session to the idle set, or evict it when it is no longer
    /// valid or the pool has been shut down.
    fn restore(self: &Arc<Self>, handle: SessionHandle<C::Transport>) {
        if self.permits.is_closed() {
            debug!("pool shut down, closing returned session");
        } else if handle.is_valid(false) {
            self.idle.lock().push_back(handle);
            trace!("session returned to pool");
            return;
        } else {
            warn!(failure = ?handle.last_failure(), "evicting invalid session");
        }

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let inner = self.clone();
                runtime.spawn(async move { inner.factory.destroy(handle).await });
            }
            // Dropping the transport aborts its tasks
            Err(_) => drop(handle),
        }
    }
}

fn shut_down() -> GatewayError {
    GatewayError::new(ErrorKind::Communication, "session pool is shut down")
}

/// Fixed-size pool of bound sessions.
///
/// Leasing waits while every session is in use. Sessions are never evicted for
/// being idle, only when they have become invalid.
pub struct SessionPool<C: Connector> {
    inner: Arc<PoolInner<C>>,
}

impl<C: Connector> Clone for SessionPool<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C: Connector> SessionPool<C> {
    pub fn new(factory: SessionFactory<C>) -> Self {
        let settings = factory.config().pool_settings();
        Self {
            inner: Arc::new(PoolInner {
                factory,
                settings,
                permits: Arc::new(Semaphore::new(settings.maximum)),
                idle: Mutex::new(VecDeque::new()),
            }),
        }
    }

    pub fn settings(&self) -> PoolSettings {
        self.inner.settings
    }

    pub fn factory(&self) -> &SessionFactory<C> {
        &self.inner.factory
    }

    pub fn idle_count(&self) -> usize {
        self.inner.idle.lock().len()
    }

    pub fn leased_count(&self) -> usize {
        self.inner.settings.maximum - self.inner.permits.available_permits()
    }

    /// Open sessions until the pool holds its minimum size.
    ///
    /// Each session is opened under a permit, like a lease, so a concurrent
    /// lease cannot open one more than the pool allows. Filling stops early
    /// when every permit is taken, since those leases hold sessions already.
    pub async fn fill(&self) -> Result<(), GatewayError> {
        let mut opened = 0;
        loop {
            let permit = match self.inner.permits.clone().try_acquire_owned() {
                Ok(permit) => permit,
                Err(TryAcquireError::NoPermits) => break,
                Err(TryAcquireError::Closed) => return Err(shut_down()),
            };
            // Our own permit is counted as leased but holds no session
            let existing = self.idle_count() + self.leased_count() - 1;
            if existing >= self.inner.settings.minimum {
                break;
            }
            let handle = self.inner.factory.create().await?;
            self.inner.idle.lock().push_back(handle);
            drop(permit);
            opened += 1;
        }
        if opened > 0 {
            info!(opened, sessions = self.inner.settings.minimum, "session pool filled");
        }
        Ok(())
    }

    /// Lease a session, opening a new one when no valid idle session exists.
    pub async fn lease(&self) -> Result<PooledSession<C>, GatewayError> {
        let waiting = Instant::now();
        let permit = self
            .inner
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| shut_down())?;

        let reused = loop {
            let candidate = self.inner.idle.lock().pop_front();
            match candidate {
                Some(handle) if handle.is_valid(false) => break Some(handle),
                Some(handle) => self.inner.restore(handle),
                None => break None,
            }
        };

        let handle = match reused {
            Some(handle) => handle,
            None => {
                debug!("no idle session, opening a new one");
                self.inner.factory.create().await?
            }
        };

        trace!(waited_ms = waiting.elapsed().as_millis() as u64, "session leased");
        Ok(PooledSession {
            handle: Some(handle),
            pool: self.inner.clone(),
            leased_at: Instant::now(),
            _permit: permit,
        })
    }

    /// Refuse further leases and close every idle session.
    pub async fn shutdown(&self) {
        self.inner.permits.close();
        let drained: Vec<_> = self.inner.idle.lock().drain(..).collect();
        let count = drained.len();
        for handle in drained {
            self.inner.factory.destroy(handle).await;
        }
        info!(closed = count, "session pool shut down");
    }
}

/// A leased session. Dropping it returns the session to the pool; an invalid
/// session is destroyed instead.
pub struct PooledSession<C: Connector> {
    handle: Option<SessionHandle<C::Transport>>,
    pool: Arc<PoolInner<C>>,
    leased_at: Instant,
    _permit: OwnedSemaphorePermit,
}

impl<C: Connector> PooledSession<C> {
    pub fn held_for(&self) -> Duration {
        self.leased_at.elapsed()
    }
}

impl<C: Connector> Deref for PooledSession<C> {
    type Target = SessionHandle<C::Transport>;

    fn deref(&self) -> &Self::Target {
        match &self.handle {
            Some(handle) => handle,
            None => unreachable!("handle is only taken on drop"),
        }
    }
}

impl<C: Connector> Drop for PooledSession<C> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            // Runs before the permit field is released, so a waiting lease
            // finds the session idle
            self.pool.restore(handle);
        }
    }
}
