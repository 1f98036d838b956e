//! Intercepted asynchronous primitives
//!
//! Actions receive their promise and fetch constructors through
//! [`AsyncPrimitives`] instead of reaching for ambient globals. The
//! [`Timetable`] implementation registers every value it creates so a test
//! can settle it later; [`NativePrimitives`] creates plain deferred values.

use crate::domain::deferred::{Deferred, Payload, Settler};
use crate::infrastructure::log_messages::ambient::NETWORK_UNAVAILABLE;
use crate::infrastructure::timetable::{Registration, Timetable};
use serde_json::json;

/// Name used for promises constructed without one
pub const DEFAULT_PROMISE_NAME: &str = "Promise";

/// Constructors for the asynchronous values an action may create
pub trait AsyncPrimitives {
    /// Create a deferred value, handing its settler to `body` immediately
    fn promise<F>(&self, name: &str, body: F) -> Deferred
    where
        F: FnOnce(&Settler);

    /// Create a deferred value that only settles from outside
    fn named_promise(&self, name: &str) -> Deferred {
        self.promise(name, |_| {})
    }

    /// Create a deferred value standing in for the response to `url`
    fn fetch(&self, url: &str, init: Payload) -> Deferred;
}

impl AsyncPrimitives for Timetable {
    fn promise<F>(&self, name: &str, body: F) -> Deferred
    where
        F: FnOnce(&Settler),
    {
        let (deferred, settler) = Deferred::named(name);
        // The body runs before registration, as a promise executor would
        body(&settler);
        self.register(Registration {
            name: name.to_string(),
            deferred: deferred.clone(),
            settler,
            aux: None,
        });
        deferred
    }

    fn fetch(&self, url: &str, init: Payload) -> Deferred {
        let (deferred, settler) = Deferred::named(url);
        self.register(Registration {
            name: url.to_string(),
            deferred: deferred.clone(),
            settler,
            aux: init,
        });
        deferred
    }
}

/// Unintercepted primitives
///
/// Promises behave as their body dictates. There is no network layer, so
/// fetches fail immediately with an explanatory payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativePrimitives;

impl AsyncPrimitives for NativePrimitives {
    fn promise<F>(&self, name: &str, body: F) -> Deferred
    where
        F: FnOnce(&Settler),
    {
        let (deferred, settler) = Deferred::named(name);
        body(&settler);
        deferred
    }

    fn fetch(&self, url: &str, _init: Payload) -> Deferred {
        let (deferred, settler) = Deferred::named(url);
        settler.fail(Some(json!({
            "error": NETWORK_UNAVAILABLE,
            "url": url,
        })));
        deferred
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::resolution::Resolution;

    #[test]
    fn test_promise_registers_with_name() {
        let timetable = Timetable::new();
        timetable.named_promise("test1");
        timetable.promise("test2", |_| {});
        timetable.promise(DEFAULT_PROMISE_NAME, |_| {});

        let names: Vec<_> = timetable.entries().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["test1", "test2", "Promise"]);
    }

    #[tokio::test]
    async fn test_extracted_settler_is_the_real_one() {
        let timetable = Timetable::new();
        let promise = timetable.named_promise("Promise");

        timetable
            .settle(&Resolution::from("Promise").with_payload(json!(7)).normalize().unwrap())
            .await
            .unwrap();

        assert_eq!(promise.await, Ok(Some(json!(7))));
    }

    #[tokio::test]
    async fn test_body_can_settle_itself() {
        let timetable = Timetable::new();
        let promise = timetable.promise("self", |settler| {
            settler.fulfil(Some(json!("done")));
        });

        assert_eq!(promise.await, Ok(Some(json!("done"))));
        assert_eq!(timetable.len(), 1);
    }

    #[test]
    fn test_body_registrations_precede_outer_promise() {
        let timetable = Timetable::new();
        let inner = timetable.clone();
        timetable.promise("outer", move |_| {
            inner.named_promise("inner");
        });

        let names: Vec<_> = timetable.entries().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["inner", "outer"]);
    }

    #[test]
    fn test_fetch_registers_url_and_init() {
        let timetable = Timetable::new();
        let init = Some(json!({"method": "POST", "body": "{}"}));
        let response = timetable.fetch("https://example.com/api", init.clone());

        let entry = timetable.find("https://example.com/api").unwrap();
        assert_eq!(entry.aux, init);
        assert_eq!(entry.deferred, response.id());
        assert!(!entry.called);
    }

    #[tokio::test]
    async fn test_native_fetch_fails_without_network() {
        let response = NativePrimitives.fetch("https://example.com", None);
        let failure = response.await.unwrap_err().unwrap();
        assert_eq!(failure["url"], "https://example.com");
    }

    #[tokio::test]
    async fn test_native_promise_is_not_registered() {
        let promise = NativePrimitives.promise("native", |settler| {
            settler.fulfil(None);
        });
        assert_eq!(promise.await, Ok(None));
    }
}
