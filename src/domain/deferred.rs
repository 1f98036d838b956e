//! Manually settled deferred values
//!
//! A [`Deferred`] is the placeholder an action awaits in place of real work.
//! Its [`Settler`] is kept by whoever controls the outcome (usually the
//! timetable), so from the awaiting side an external settlement looks exactly
//! like the operation finishing on its own.

use derive_more::Display;
use futures_util::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::IntoFuture;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Value carried by a settlement, commit or log entry; `None` means "absent"
pub type Payload = Option<Value>;

/// Terminal state of a deferred value: `Ok` when fulfilled, `Err` when failed
pub type Settlement = Result<Payload, Payload>;

static NEXT_DEFERRED_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a deferred value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display)]
#[display("deferred#{_0}")]
pub struct DeferredId(u64);

impl DeferredId {
    fn generate() -> Self {
        Self(NEXT_DEFERRED_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Awaitable handle to a value that settles when its [`Settler`] says so
///
/// Clones share the same underlying state, and every clone can be awaited.
#[derive(Clone)]
pub struct Deferred {
    id: DeferredId,
    name: Option<Arc<str>>,
    state: watch::Receiver<Option<Settlement>>,
}

/// Capability to settle one [`Deferred`]; only the first settlement counts
#[derive(Clone)]
pub struct Settler {
    id: DeferredId,
    state: Arc<watch::Sender<Option<Settlement>>>,
}

impl Deferred {
    /// Create an unnamed pending value and its settlement capability
    pub fn pending() -> (Self, Settler) {
        Self::create(None)
    }

    /// Create a pending value labelled with the name it was constructed under
    pub fn named(name: impl Into<String>) -> (Self, Settler) {
        Self::create(Some(Arc::from(name.into())))
    }

    fn create(name: Option<Arc<str>>) -> (Self, Settler) {
        let id = DeferredId::generate();
        let (sender, receiver) = watch::channel(None);
        (
            Self {
                id,
                name,
                state: receiver,
            },
            Settler {
                id,
                state: Arc::new(sender),
            },
        )
    }

    pub fn id(&self) -> DeferredId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Current settlement, if any, without waiting
    pub fn try_settlement(&self) -> Option<Settlement> {
        self.state.borrow().clone()
    }

    pub fn is_settled(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Wait until the value settles
    ///
    /// A value whose every settler was dropped unsettled stays pending forever,
    /// the same as a promise whose executor never calls back.
    pub async fn settled(&self) -> Settlement {
        let mut state = self.state.clone();
        let settlement = state
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|current| current.clone());

        match settlement {
            Some(settlement) => settlement,
            None => std::future::pending().await,
        }
    }
}

impl IntoFuture for Deferred {
    type Output = Settlement;
    type IntoFuture = BoxFuture<'static, Settlement>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.settled().await })
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl Settler {
    pub fn deferred_id(&self) -> DeferredId {
        self.id
    }

    /// Fulfil the value; returns `false` if it had already settled
    pub fn fulfil(&self, payload: Payload) -> bool {
        self.settle(Ok(payload))
    }

    /// Fail the value; returns `false` if it had already settled
    pub fn fail(&self, payload: Payload) -> bool {
        self.settle(Err(payload))
    }

    pub fn settle(&self, settlement: Settlement) -> bool {
        self.state.send_if_modified(|state| {
            if state.is_some() {
                return false;
            }
            *state = Some(settlement);
            true
        })
    }
}

impl fmt::Debug for Settler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settler").field("id", &self.id).finish()
    }
}
