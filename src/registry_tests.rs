//! Registry Tests
//!
//! Registration, lookup and dispatch against a private [`Registry`] so tests
//! never race on the process-wide one.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use crate::error::{CallError, DispatchError};
    use crate::registry::Registry;
    use crate::value::{ResultSlot, Slot, Value};

    fn greet_slot(registry: &Registry, arg: &str) -> Option<String> {
        let mut out = Slot::<String>::empty();
        let hit = registry.dispatch(
            "greet",
            vec![Value::new(arg.to_string())],
            &mut [&mut out as &mut dyn ResultSlot],
        );
        hit.then(|| out.into_inner())
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // LOOKUP
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_unregistered_name_is_a_miss() {
        let registry = Registry::new();
        assert!(registry.lookup("greet").is_none());

        let mut out = Slot::<String>::empty();
        let hit = registry.dispatch(
            "greet",
            vec![Value::new(String::from("world"))],
            &mut [&mut out as &mut dyn ResultSlot],
        );
        assert!(!hit);
        assert!(!out.is_filled());
    }

    #[test]
    fn test_registered_override_fills_results() {
        let registry = Registry::new();
        registry.register("greet", |s: String| format!("mock {s}"));
        assert_eq!(greet_slot(&registry, "world").as_deref(), Some("mock world"));
    }

    #[test]
    fn test_multiple_results_fill_in_order() {
        let registry = Registry::new();
        registry.register("pair", |a: String, b: String| {
            (format!("mock1 {a}"), format!("mock2 {b}"))
        });

        let mut first = Slot::<String>::empty();
        let mut second = Slot::<String>::empty();
        let entry = registry.lookup("pair").unwrap();
        assert_eq!(entry.params(), 2);
        assert_eq!(entry.results(), 2);
        entry.dispatch(
            vec![Value::new(String::from("x")), Value::new(String::from("y"))],
            &mut [
                &mut first as &mut dyn ResultSlot,
                &mut second as &mut dyn ResultSlot,
            ],
        );
        assert_eq!(first.into_inner(), "mock1 x");
        assert_eq!(second.into_inner(), "mock2 y");
    }

    #[test]
    fn test_tuple_alias_result_is_wrapped_once_more() {
        type Pair = (String, String);

        let registry = Registry::new();
        registry.register("pair", || -> (Pair,) {
            ((String::from("a"), String::from("b")),)
        });

        let mut out = Slot::<Pair>::empty();
        assert!(registry.dispatch("pair", vec![], &mut [&mut out as &mut dyn ResultSlot]));
        assert_eq!(out.into_inner(), (String::from("a"), String::from("b")));
    }

    #[test]
    fn test_zero_results() {
        let registry = Registry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        registry.register("touch", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(registry.dispatch("touch", vec![], &mut []));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // REGISTRATION
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_last_registration_wins() {
        let registry = Registry::new();
        assert!(registry.register("greet", |s: String| format!("first {s}")).is_none());
        let previous = registry.register("greet", |s: String| format!("second {s}"));
        assert_eq!(previous.map(|entry| entry.name().to_string()).as_deref(), Some("greet"));
        assert_eq!(registry.len(), 1);
        assert_eq!(greet_slot(&registry, "x").as_deref(), Some("second x"));
    }

    #[test]
    fn test_unregister_and_clear() {
        let registry = Registry::new();
        registry.register("greet", |s: String| s);
        registry.register("touch", || ());
        assert_eq!(registry.names(), vec!["greet", "touch"]);

        assert!(registry.unregister("greet"));
        assert!(!registry.unregister("greet"));
        assert!(!registry.contains("greet"));

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_scoped_override_restores_previous() {
        let registry = Registry::new();
        registry.register("greet", |s: String| format!("outer {s}"));
        {
            let _guard = registry.scoped("greet", |s: String| format!("inner {s}"));
            assert_eq!(greet_slot(&registry, "x").as_deref(), Some("inner x"));
        }
        assert_eq!(greet_slot(&registry, "x").as_deref(), Some("outer x"));

        {
            let _guard = registry.scoped("touch", || ());
            assert!(registry.contains("touch"));
        }
        assert!(!registry.contains("touch"));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // MISMATCHES
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_arity_mismatch_writes_nothing() {
        let registry = Registry::new();
        registry.register("greet", |s: String| (s.clone(), s));

        let mut out = Slot::<String>::empty();
        let err = registry
            .lookup("greet")
            .unwrap()
            .try_dispatch(
                vec![Value::new(String::from("x"))],
                &mut [&mut out as &mut dyn ResultSlot],
            )
            .unwrap_err();
        assert_eq!(
            err,
            DispatchError::ArityMismatch {
                name: "greet".to_string(),
                declared: 1,
                reported: 2,
            }
        );
        assert!(!out.is_filled());
    }

    #[test]
    fn test_arity_mismatch_never_runs_override() {
        let registry = Registry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        registry.register("greet", move |s: String| {
            counter.fetch_add(1, Ordering::SeqCst);
            (s.clone(), s)
        });

        let mut out = Slot::<String>::empty();
        let err = registry
            .lookup("greet")
            .unwrap()
            .try_dispatch(
                vec![Value::new(String::from("x"))],
                &mut [&mut out as &mut dyn ResultSlot],
            )
            .unwrap_err();
        assert!(matches!(err, DispatchError::ArityMismatch { reported: 2, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    #[should_panic(expected = "reported 0 result(s)")]
    fn test_arity_mismatch_panics_on_dispatch() {
        let registry = Registry::new();
        registry.register("greet", |_s: String| ());
        greet_slot(&registry, "x");
    }

    #[test]
    fn test_result_type_mismatch() {
        let registry = Registry::new();
        registry.register("count", || 3u8);

        let mut out = Slot::<u32>::empty();
        let err = registry
            .lookup("count")
            .unwrap()
            .try_dispatch(vec![], &mut [&mut out as &mut dyn ResultSlot])
            .unwrap_err();
        assert_eq!(
            err,
            DispatchError::ResultType {
                name: "count".to_string(),
                position: 0,
                expected: "u32",
                found: "u8",
            }
        );
    }

    #[test]
    fn test_argument_type_mismatch() {
        let registry = Registry::new();
        registry.register("greet", |s: String| s);

        let mut out = Slot::<String>::empty();
        let err = registry
            .lookup("greet")
            .unwrap()
            .try_dispatch(vec![Value::new(7i32)], &mut [&mut out as &mut dyn ResultSlot])
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Call {
                source: CallError::ArgumentType { position: 0, .. },
                ..
            }
        ));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // CONCURRENCY
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_concurrent_register_and_dispatch() {
        let registry = Registry::new();
        registry.register("greet", |s: String| format!("a {s}"));

        thread::scope(|scope| {
            for i in 0..4 {
                let registry = &registry;
                scope.spawn(move || {
                    for _ in 0..100 {
                        if i % 2 == 0 {
                            registry.register("greet", |s: String| format!("a {s}"));
                        } else {
                            registry.register("greet", |s: String| format!("b {s}"));
                        }
                    }
                });
            }
            for _ in 0..4 {
                let registry = &registry;
                scope.spawn(move || {
                    for _ in 0..100 {
                        let out = greet_slot(registry, "x").unwrap();
                        assert!(out == "a x" || out == "b x", "torn entry: {out}");
                    }
                });
            }
        });

        assert_eq!(registry.len(), 1);
    }
}
