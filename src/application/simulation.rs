//! Resolution engine
//!
//! Drives directives against the timetable one at a time. Each settlement is
//! recorded in the log before it is triggered, and the next directive only
//! runs after the previous settlement, and whatever was waiting on it, has
//! had its turn.

use crate::domain::resolution::{NormalizedResolution, Resolution};
use crate::domain::snapshot::Log;
use crate::domain::types::AutoResolveLimit;
use crate::error::Result;
use crate::infrastructure::log_messages::simulation as messages;
use crate::infrastructure::timetable::Timetable;
use futures_util::{Stream, StreamExt};
use tracing::{debug, info, instrument};

/// How a simulation picks the next entry to settle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimulationOptions {
    /// Settle the oldest pending entry instead of following the directives
    pub auto_resolve: bool,
    /// Safety ceiling for auto mode; reaching it ends the run quietly
    pub auto_resolve_limit: AutoResolveLimit,
}

/// Normalize every directive, failing on the first malformed one
pub fn normalize_all(resolutions: &[Resolution]) -> Result<Vec<NormalizedResolution>> {
    resolutions.iter().map(Resolution::normalize).collect()
}

/// Record one directive in the log, then settle it
pub async fn simulate_resolution(
    resolution: &NormalizedResolution,
    log: &Log,
    timetable: &Timetable,
) -> Result<()> {
    debug!(resolution = %resolution, "{}", messages::STEP);
    log.add(resolution.message(), resolution.payload.clone());
    timetable.settle(resolution).await
}

/// Simulate a list of directives
///
/// All directives are validated before the first one runs. In auto mode the
/// list only has to be valid; its order is ignored.
#[instrument(skip_all, fields(count = resolutions.len(), auto_resolve = options.auto_resolve))]
pub async fn simulate(
    resolutions: &[Resolution],
    log: &Log,
    timetable: &Timetable,
    options: SimulationOptions,
) -> Result<()> {
    let normalized = normalize_all(resolutions)?;
    debug!("{}", messages::STARTED);

    if options.auto_resolve {
        return auto_resolve(log, timetable, options.auto_resolve_limit).await;
    }

    for resolution in &normalized {
        simulate_resolution(resolution, log, timetable).await?;
    }
    debug!("{}", messages::DRAINED);
    Ok(())
}

/// Simulate directives as they arrive from a stream
///
/// Each directive is validated when it is pulled, so earlier directives have
/// already been settled when a later malformed one fails the simulation.
#[instrument(skip_all, fields(auto_resolve = options.auto_resolve))]
pub async fn simulate_stream<S>(
    resolutions: S,
    log: &Log,
    timetable: &Timetable,
    options: SimulationOptions,
) -> Result<()>
where
    S: Stream<Item = Resolution>,
{
    futures_util::pin_mut!(resolutions);
    debug!("{}", messages::STARTED);

    while let Some(resolution) = resolutions.next().await {
        let normalized = resolution.normalize()?;
        if !options.auto_resolve {
            simulate_resolution(&normalized, log, timetable).await?;
        }
    }

    if options.auto_resolve {
        return auto_resolve(log, timetable, options.auto_resolve_limit).await;
    }
    debug!("{}", messages::DRAINED);
    Ok(())
}

async fn auto_resolve(log: &Log, timetable: &Timetable, limit: AutoResolveLimit) -> Result<()> {
    for _ in 0..*limit.as_ref() {
        let Some(entry) = timetable.find_next_pending() else {
            debug!("{}", messages::AUTO_EXHAUSTED);
            return Ok(());
        };
        let resolution = Resolution::from(entry.name).normalize()?;
        simulate_resolution(&resolution, log, timetable).await?;
    }

    info!(limit = %limit, "{}", messages::AUTO_LIMIT_REACHED);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::deferred::Deferred;
    use crate::error::Error;
    use crate::infrastructure::intercept::AsyncPrimitives;
    use serde_json::json;

    fn messages(log: &Log) -> Vec<String> {
        log.entries().into_iter().map(|e| e.message).collect()
    }

    #[tokio::test]
    async fn test_simulates_in_given_order() {
        let timetable = Timetable::new();
        let log = Log::new();
        let a = timetable.named_promise("a");
        let b = timetable.named_promise("b");

        simulate(
            &["b".into(), Resolution::abort("a").with_payload(json!({"a": "b"}))],
            &log,
            &timetable,
            SimulationOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(
            messages(&log),
            vec!["RESOLUTION: b -> settle", "RESOLUTION: a -> abort"]
        );
        assert_eq!(log.entries()[1].payload, Some(json!({"a": "b"})));
        assert_eq!(a.try_settlement(), Some(Err(Some(json!({"a": "b"})))));
        assert_eq!(b.try_settlement(), Some(Ok(None)));
    }

    #[tokio::test]
    async fn test_validates_everything_before_first_step() {
        let timetable = Timetable::new();
        let log = Log::new();
        let a = timetable.named_promise("a");

        let malformed = Resolution::Explicit {
            name: None,
            kind: Some("strange thing".to_string()),
            payload: None,
        };
        let error = simulate(
            &["a".into(), malformed],
            &log,
            &timetable,
            SimulationOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(error, Error::InvalidResolution { .. }));
        assert!(log.is_empty());
        assert!(!a.is_settled());
    }

    #[tokio::test]
    async fn test_stops_at_first_missing_entry() {
        let timetable = Timetable::new();
        let log = Log::new();
        timetable.named_promise("a");
        let c = timetable.named_promise("c");

        let error = simulate(
            &["a".into(), "Definitely not there".into(), "c".into()],
            &log,
            &timetable,
            SimulationOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(error.to_string().contains("Definitely not there"));
        assert_eq!(
            messages(&log),
            vec![
                "RESOLUTION: a -> settle",
                "RESOLUTION: Definitely not there -> settle"
            ]
        );
        assert!(!c.is_settled());
    }

    #[tokio::test]
    async fn test_auto_mode_follows_registration_order() {
        let timetable = Timetable::new();
        let log = Log::new();
        timetable.named_promise("second");
        timetable.fetch("/api", None);
        timetable.named_promise("second");

        simulate(
            &["/api".into()],
            &log,
            &timetable,
            SimulationOptions {
                auto_resolve: true,
                ..SimulationOptions::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(
            messages(&log),
            vec![
                "RESOLUTION: second -> settle",
                "RESOLUTION: /api -> settle",
                "RESOLUTION: second[2] -> settle"
            ]
        );
        assert_eq!(timetable.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_auto_mode_stops_at_limit() {
        let timetable = Timetable::new();
        let log = Log::new();
        for _ in 0..5 {
            timetable.named_promise("loop");
        }

        simulate(
            &[],
            &log,
            &timetable,
            SimulationOptions {
                auto_resolve: true,
                auto_resolve_limit: AutoResolveLimit::try_new(3).unwrap(),
            },
        )
        .await
        .unwrap();

        assert_eq!(log.len(), 3);
        assert_eq!(timetable.pending_count(), 2);
    }

    #[tokio::test]
    async fn test_waits_for_continuations_between_steps() {
        let timetable = Timetable::new();
        let log = Log::new();
        let first = timetable.named_promise("first");

        let follower = {
            let timetable = timetable.clone();
            let log = log.clone();
            tokio::spawn(async move {
                let _ = first.await;
                log.add("continuation ran", None);
                timetable.named_promise("second").await
            })
        };
        tokio::task::yield_now().await;

        simulate(
            &["first".into(), "second".into()],
            &log,
            &timetable,
            SimulationOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(
            messages(&log),
            vec![
                "RESOLUTION: first -> settle",
                "continuation ran",
                "RESOLUTION: second -> settle"
            ]
        );
        assert_eq!(follower.await.unwrap(), Ok(None));
    }

    #[tokio::test]
    async fn test_stream_validates_lazily() {
        let timetable = Timetable::new();
        let log = Log::new();
        let a: Deferred = timetable.named_promise("a");

        let error = simulate_stream(
            futures_util::stream::iter(vec![Resolution::from("a"), Resolution::from("")]),
            &log,
            &timetable,
            SimulationOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(error, Error::InvalidResolution { .. }));
        assert!(a.is_settled());
        assert_eq!(log.len(), 1);
    }
}
