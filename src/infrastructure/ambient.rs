//! Ambient primitive slot for code that cannot take an injected context
//!
//! Installing a [`Timetable`] makes the free functions in this module
//! intercept; uninstalling falls back to [`NativePrimitives`]. The slot is
//! per thread, which matches the single-threaded runtime tests drive runs on.

use crate::domain::deferred::{Deferred, Payload, Settler};
use crate::infrastructure::intercept::{AsyncPrimitives, NativePrimitives};
use crate::infrastructure::log_messages::ambient as messages;
use crate::infrastructure::timetable::Timetable;
use std::cell::RefCell;
use tracing::debug;

thread_local! {
    static INSTALLED: RefCell<Option<Timetable>> = const { RefCell::new(None) };
}

/// Route ambient promises and fetches into `timetable`
pub fn install(timetable: &Timetable) {
    INSTALLED.with(|slot| *slot.borrow_mut() = Some(timetable.clone()));
    debug!("{}", messages::INSTALLED);
}

/// Restore unintercepted primitives
pub fn uninstall() {
    INSTALLED.with(|slot| *slot.borrow_mut() = None);
    debug!("{}", messages::UNINSTALLED);
}

pub fn is_installed() -> bool {
    INSTALLED.with(|slot| slot.borrow().is_some())
}

/// Install `timetable` until the returned guard is dropped
pub fn scoped(timetable: &Timetable) -> AmbientGuard {
    install(timetable);
    AmbientGuard { _private: () }
}

/// Uninstalls the ambient timetable on drop
#[derive(Debug)]
#[must_use = "the timetable is uninstalled as soon as the guard is dropped"]
pub struct AmbientGuard {
    _private: (),
}

impl Drop for AmbientGuard {
    fn drop(&mut self) {
        uninstall();
    }
}

fn installed() -> Option<Timetable> {
    INSTALLED.with(|slot| slot.borrow().clone())
}

pub fn promise<F>(name: &str, body: F) -> Deferred
where
    F: FnOnce(&Settler),
{
    match installed() {
        Some(timetable) => timetable.promise(name, body),
        None => NativePrimitives.promise(name, body),
    }
}

pub fn named_promise(name: &str) -> Deferred {
    promise(name, |_| {})
}

pub fn fetch(url: &str, init: Payload) -> Deferred {
    match installed() {
        Some(timetable) => timetable.fetch(url, init),
        None => NativePrimitives.fetch(url, init),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_routes_into_timetable() {
        let timetable = Timetable::new();
        install(&timetable);
        assert!(is_installed());

        named_promise("ambient");
        fetch("https://example.com", None);
        assert_eq!(timetable.len(), 2);

        uninstall();
        assert!(!is_installed());
        named_promise("native");
        assert_eq!(timetable.len(), 2);
    }

    #[test]
    fn test_guard_uninstalls_on_drop() {
        let timetable = Timetable::new();
        {
            let _guard = scoped(&timetable);
            assert!(is_installed());
        }
        assert!(!is_installed());
    }

    #[test]
    fn test_uninstalled_fetch_fails_immediately() {
        uninstall();
        let response = fetch("https://example.com", None);
        assert!(matches!(response.try_settlement(), Some(Err(Some(_)))));
    }
}
