use proptest::prelude::*;
use replay_snapshot::prelude::*;
use replay_snapshot::{simulate, SimulationOptions};
use std::collections::HashSet;

// Property test generators
pub mod generators {
    use super::*;
    use proptest::collection::vec;
    use proptest::string::string_regex;

    /// Generate valid entry names
    pub fn entry_name() -> impl Strategy<Value = String> {
        string_regex("[a-z][a-z0-9./_-]{0,15}").unwrap()
    }

    /// Generate lists of distinct entry names
    pub fn distinct_names() -> impl Strategy<Value = Vec<String>> {
        vec(entry_name(), 0..20).prop_map(|names| {
            let mut seen = HashSet::new();
            names
                .into_iter()
                .filter(|name| seen.insert(name.clone()))
                .collect()
        })
    }
}

proptest! {
    #[test]
    fn manual_simulation_logs_every_directive_in_order(
        names in generators::distinct_names(),
        order in any::<prop::sample::Index>(),
    ) {
        let timetable = Timetable::new();
        let log = Log::new();
        let deferreds: Vec<_> = names.iter().map(|n| timetable.named_promise(n)).collect();

        let mut shuffled = names.clone();
        if !shuffled.is_empty() {
            let pivot = order.index(shuffled.len());
            shuffled.rotate_left(pivot);
        }
        let resolutions: Vec<Resolution> = shuffled.iter().map(|n| n.as_str().into()).collect();

        tokio_test::block_on(simulate(&resolutions, &log, &timetable, SimulationOptions::default()))
            .unwrap();

        let expected: Vec<String> = shuffled
            .iter()
            .map(|n| format!("RESOLUTION: {n} -> settle"))
            .collect();
        let recorded: Vec<String> = log.entries().into_iter().map(|e| e.message).collect();
        prop_assert_eq!(recorded, expected);
        prop_assert!(deferreds.iter().all(Deferred::is_settled));
        prop_assert_eq!(timetable.pending_count(), 0);
    }

    #[test]
    fn duplicates_get_sequential_suffixes_and_settle_fifo(
        base in generators::entry_name(),
        count in 1usize..10,
    ) {
        let timetable = Timetable::new();
        let deferreds: Vec<_> = (0..count).map(|_| timetable.named_promise(&base)).collect();

        let names: Vec<String> = timetable.entries().into_iter().map(|e| e.name).collect();
        let expected: Vec<String> = (1..=count)
            .map(|i| if i == 1 { base.clone() } else { format!("{base}[{i}]") })
            .collect();
        prop_assert_eq!(names, expected);

        for (settled_so_far, deferred) in deferreds.iter().enumerate() {
            let resolution = Resolution::from(base.as_str()).normalize().unwrap();
            tokio_test::block_on(timetable.settle(&resolution)).unwrap();
            prop_assert!(deferred.is_settled());
            prop_assert_eq!(timetable.pending_count(), count - settled_so_far - 1);
        }
    }

    #[test]
    fn sync_actions_log_exactly_their_calls(
        calls in proptest::collection::vec((any::<bool>(), generators::entry_name()), 0..10),
    ) {
        let timetable = Timetable::new();
        let expected: Vec<String> = calls
            .iter()
            .map(|(is_commit, name)| {
                let kind = if *is_commit { "COMMIT" } else { "DISPATCH" };
                format!("{kind}: {name}")
            })
            .collect();

        let entries = snap_action(
            &timetable,
            move |ctx, _| {
                for (is_commit, name) in &calls {
                    if *is_commit {
                        ctx.commit(name, None);
                    } else {
                        ctx.dispatch(name, None);
                    }
                }
                ActionReturn::Sync(None)
            },
            Mocks::new(),
            vec![],
            SnapOptions::default(),
            Log::new(),
        )
        .into_complete()
        .unwrap();

        let recorded: Vec<String> = entries.into_iter().map(|e| e.message).collect();
        prop_assert_eq!(recorded, expected);
    }
}
