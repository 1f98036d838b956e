//! Action runner
//!
//! Runs an action under test with call-snapping commit and dispatch
//! callbacks, then races the action's own settlement against the resolution
//! engine to produce the final snapshot log.
//!
//! A run moves through `STARTED -> SYNC_DONE` when the action returns
//! synchronously, or `STARTED -> AWAITING -> {RESOLVED | REJECTED | EXHAUSTED
//! | FAILED}` when it returns a deferred value.

use crate::application::simulation;
use crate::config::SnapOptions;
use crate::domain::deferred::{Deferred, Payload, Settlement};
use crate::domain::resolution::Resolution;
use crate::domain::snapshot::{messages, Log, LogEntry};
use crate::error::{Error, RunFailure};
use crate::infrastructure::log_messages::action as log_messages;
use crate::infrastructure::timetable::Timetable;
use derive_more::Display;
use futures_util::future::BoxFuture;
use serde_json::{Map, Value};
use std::fmt;
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Commit or dispatch callback supplied by the test
///
/// Receives the call name, its payload and the proxies the action was given,
/// so callbacks that re-dispatch go through the snapping wrappers again.
pub type MockCallback = Arc<dyn Fn(&str, Payload, &Proxies) -> Payload + Send + Sync>;

/// Result of finishing an asynchronous run
pub type RunResult = std::result::Result<Vec<LogEntry>, RunFailure>;

fn noop_callback() -> MockCallback {
    Arc::new(|_, _, _| None)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CallKind {
    #[display("COMMIT")]
    Commit,
    #[display("DISPATCH")]
    Dispatch,
}

/// Wraps a mock callback so every call is recorded before it is forwarded
#[derive(Clone)]
pub struct CallSnapper {
    kind: CallKind,
    log: Log,
    callback: MockCallback,
}

impl CallSnapper {
    pub fn new(kind: CallKind, log: &Log, callback: MockCallback) -> Self {
        Self {
            kind,
            log: log.clone(),
            callback,
        }
    }

    pub fn call(&self, name: &str, payload: Payload, proxies: &Proxies) -> Payload {
        self.log.add(format!("{}: {name}", self.kind), payload.clone());
        (self.callback)(name, payload, proxies)
    }
}

impl fmt::Debug for CallSnapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallSnapper")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// The pair of snapping wrappers handed to the action and to every callback
#[derive(Debug, Clone)]
pub struct Proxies {
    commit: CallSnapper,
    dispatch: CallSnapper,
}

impl Proxies {
    pub fn new(log: &Log, commit: MockCallback, dispatch: MockCallback) -> Self {
        Self {
            commit: CallSnapper::new(CallKind::Commit, log, commit),
            dispatch: CallSnapper::new(CallKind::Dispatch, log, dispatch),
        }
    }

    pub fn commit(&self, name: &str, payload: Payload) -> Payload {
        self.commit.call(name, payload, self)
    }

    pub fn dispatch(&self, name: &str, payload: Payload) -> Payload {
        self.dispatch.call(name, payload, self)
    }
}

/// Fixture the action runs against
///
/// Missing commit or dispatch callbacks default to no-ops.
#[derive(Clone, Default)]
pub struct Mocks {
    pub state: Payload,
    pub getters: Payload,
    pub payload: Payload,
    pub commit: Option<MockCallback>,
    pub dispatch: Option<MockCallback>,
}

impl Mocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_getters(mut self, getters: Value) -> Self {
        self.getters = Some(getters);
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_commit<F>(mut self, commit: F) -> Self
    where
        F: Fn(&str, Payload, &Proxies) -> Payload + Send + Sync + 'static,
    {
        self.commit = Some(Arc::new(commit));
        self
    }

    pub fn with_dispatch<F>(mut self, dispatch: F) -> Self
    where
        F: Fn(&str, Payload, &Proxies) -> Payload + Send + Sync + 'static,
    {
        self.dispatch = Some(Arc::new(dispatch));
        self
    }

    /// Payload of the `DATA MOCKS` entry; absent fields are left out
    fn environment(&self) -> Value {
        let mut environment = Map::new();
        if let Some(state) = &self.state {
            environment.insert("state".to_string(), state.clone());
        }
        if let Some(getters) = &self.getters {
            environment.insert("getters".to_string(), getters.clone());
        }
        Value::Object(environment)
    }
}

impl fmt::Debug for Mocks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mocks")
            .field("state", &self.state)
            .field("getters", &self.getters)
            .field("payload", &self.payload)
            .field("commit", &self.commit.is_some())
            .field("dispatch", &self.dispatch.is_some())
            .finish()
    }
}

/// First argument of an action: its store surface plus injected primitives
#[derive(Debug, Clone)]
pub struct ActionContext {
    proxies: Proxies,
    state: Payload,
    getters: Payload,
    async_ops: Timetable,
}

impl ActionContext {
    pub fn commit(&self, name: &str, payload: Payload) -> Payload {
        self.proxies.commit(name, payload)
    }

    pub fn dispatch(&self, name: &str, payload: Payload) -> Payload {
        self.proxies.dispatch(name, payload)
    }

    pub fn state(&self) -> Option<&Value> {
        self.state.as_ref()
    }

    pub fn getters(&self) -> Option<&Value> {
        self.getters.as_ref()
    }

    pub fn proxies(&self) -> &Proxies {
        &self.proxies
    }

    /// Intercepting promise and fetch constructors, see `AsyncPrimitives`
    pub fn async_ops(&self) -> &Timetable {
        &self.async_ops
    }
}

/// What an action hands back when it is invoked
pub enum ActionReturn {
    /// Not a deferred value; the run completes immediately
    Sync(Payload),
    /// A deferred value, possibly registered in the timetable
    Deferred(Deferred),
    /// Any other pending computation
    Future(BoxFuture<'static, Settlement>),
}

impl ActionReturn {
    pub fn future<F>(future: F) -> Self
    where
        F: Future<Output = Settlement> + Send + 'static,
    {
        Self::Future(Box::pin(future))
    }

    pub fn is_async(&self) -> bool {
        !matches!(self, Self::Sync(_))
    }
}

impl From<Deferred> for ActionReturn {
    fn from(deferred: Deferred) -> Self {
        Self::Deferred(deferred)
    }
}

impl fmt::Debug for ActionReturn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(payload) => f.debug_tuple("Sync").field(payload).finish(),
            Self::Deferred(deferred) => f.debug_tuple("Deferred").field(deferred).finish(),
            Self::Future(_) => f.write_str("Future(..)"),
        }
    }
}

/// A snapshot run: already complete, or waiting on the action and simulation
pub enum ActionRun {
    Complete(Vec<LogEntry>),
    Pending(BoxFuture<'static, RunResult>),
}

impl ActionRun {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// The log of a synchronous run, without awaiting anything
    pub fn into_complete(self) -> Option<Vec<LogEntry>> {
        match self {
            Self::Complete(entries) => Some(entries),
            Self::Pending(_) => None,
        }
    }

    pub async fn finish(self) -> RunResult {
        match self {
            Self::Complete(entries) => Ok(entries),
            Self::Pending(run) => run.await,
        }
    }
}

impl fmt::Debug for ActionRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete(entries) => f.debug_tuple("Complete").field(entries).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Run `action` and snapshot everything it does
///
/// The action is invoked synchronously, so commits and dispatches it makes
/// before returning are logged before this function returns. A synchronous
/// action yields [`ActionRun::Complete`]; otherwise the returned
/// [`ActionRun::Pending`] drives `resolutions` against `timetable` when
/// awaited.
pub fn snap_action<A>(
    timetable: &Timetable,
    action: A,
    mocks: Mocks,
    resolutions: Vec<Resolution>,
    options: SnapOptions,
    log: Log,
) -> ActionRun
where
    A: FnOnce(ActionContext, Payload) -> ActionReturn,
{
    let proxies = Proxies::new(
        &log,
        mocks.commit.clone().unwrap_or_else(noop_callback),
        mocks.dispatch.clone().unwrap_or_else(noop_callback),
    );

    if options.snap_env {
        log.add(messages::DATA_MOCKS, Some(mocks.environment()));
        log.add(messages::ACTION_CALL, mocks.payload.clone());
    }

    let context = ActionContext {
        proxies,
        state: mocks.state,
        getters: mocks.getters,
        async_ops: timetable.clone(),
    };

    let action_settlement = match action(context, mocks.payload) {
        ActionReturn::Sync(_) => {
            debug!("{}", log_messages::SYNC_DONE);
            return ActionRun::Complete(log.entries());
        }
        ActionReturn::Deferred(deferred) => {
            if !options.allow_manual_action_resolution && timetable.remove(&deferred) {
                debug!(deferred = %deferred.id(), "{}", log_messages::EVICTED);
            }
            deferred.into_future()
        }
        ActionReturn::Future(future) => future,
    };

    debug!("{}", log_messages::AWAITING);
    let timetable = timetable.clone();
    ActionRun::Pending(Box::pin(async move {
        race(
            action_settlement,
            resolutions,
            log,
            timetable,
            options.simulation(),
        )
        .await
    }))
}

enum Outcome {
    Settled(Settlement),
    Exhausted,
    Failed(Error),
}

/// Race the action against the simulation
///
/// The action is always polled first, so when it settles in the same turn
/// the simulation finishes, the settlement wins. After the simulation drains
/// the action gets one more scheduling tick before it is declared unresolved.
async fn race(
    mut action: BoxFuture<'static, Settlement>,
    resolutions: Vec<Resolution>,
    log: Log,
    timetable: Timetable,
    options: simulation::SimulationOptions,
) -> RunResult {
    let simulation = simulation::simulate(&resolutions, &log, &timetable, options);
    tokio::pin!(simulation);

    let outcome = tokio::select! {
        biased;
        settlement = &mut action => Outcome::Settled(settlement),
        simulated = &mut simulation => match simulated {
            Ok(()) => Outcome::Exhausted,
            Err(error) => Outcome::Failed(error),
        },
    };

    let outcome = match outcome {
        Outcome::Exhausted => tokio::select! {
            biased;
            settlement = &mut action => Outcome::Settled(settlement),
            () = tokio::task::yield_now() => Outcome::Exhausted,
        },
        decided => decided,
    };

    conclude(outcome, &log)
}

fn conclude(outcome: Outcome, log: &Log) -> RunResult {
    let result = match outcome {
        Outcome::Settled(Ok(payload)) => {
            log.add(messages::ACTION_RESOLVED, payload);
            info!("{}", log_messages::RESOLVED);
            Ok(())
        }
        Outcome::Settled(Err(payload)) => {
            log.add(messages::ACTION_REJECTED, payload);
            info!("{}", log_messages::REJECTED);
            Ok(())
        }
        Outcome::Exhausted => {
            log.add(messages::ACTION_DID_NOT_RESOLVE, None);
            info!("{}", log_messages::DID_NOT_RESOLVE);
            Ok(())
        }
        Outcome::Failed(error) => {
            warn!(error = %error, "{}", log_messages::FAILED);
            Err(error)
        }
    };
    log.freeze();

    result
        .map(|()| log.entries())
        .map_err(|error| RunFailure {
            error,
            log: log.entries(),
        })
}
