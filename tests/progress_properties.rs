use learnpath::path::progress::{resolve, CompletionSet, UnitProgress, UnitStatus};
use learnpath::path::{LearningPath, LearningUnit, Module, UnitKind};
use proptest::prelude::*;

fn build_path(layout: &[usize]) -> LearningPath {
    let mut next_id = 0;
    let modules = layout
        .iter()
        .enumerate()
        .map(|(m, &units)| Module {
            id: format!("m{m}"),
            title: format!("Module {m}"),
            units: (0..units)
                .map(|_| {
                    next_id += 1;
                    LearningUnit {
                        id: format!("u{next_id}"),
                        title: format!("Unit {next_id}"),
                        kind: UnitKind::Concept,
                        xp_points: 10,
                        ..Default::default()
                    }
                })
                .collect(),
        })
        .collect();
    LearningPath {
        id: "p".into(),
        slug: "p".into(),
        title: "P".into(),
        description: String::new(),
        modules,
    }
}

/// A path plus a completion set drawn from its ids and some ids it does not have.
fn path_and_completions() -> impl Strategy<Value = (LearningPath, Vec<String>)> {
    prop::collection::vec(0usize..5, 0..5).prop_flat_map(|layout| {
        let path = build_path(&layout);
        let total = path.unit_count();
        (
            Just(path),
            prop::collection::vec(prop::bool::ANY, total),
            prop::collection::vec(100usize..110, 0..3),
        )
            .prop_map(|(path, picks, ghosts)| {
                let mut ids: Vec<String> = path
                    .units()
                    .zip(picks)
                    .filter(|(_, picked)| *picked)
                    .map(|(unit, _)| unit.id.clone())
                    .collect();
                ids.extend(ghosts.into_iter().map(|g| format!("u{g}")));
                (path, ids)
            })
    })
}

fn statuses(path: &LearningPath, completed: &CompletionSet) -> Vec<UnitStatus> {
    resolve(path, completed)
        .units()
        .map(UnitProgress::status)
        .collect()
}

proptest! {
    #[test]
    fn exactly_one_next_unit_unless_all_done((path, ids) in path_and_completions()) {
        let completed: CompletionSet = ids.into_iter().collect();
        let board = resolve(&path, &completed);
        let next = board.units().filter(|u| !u.is_locked && !u.is_completed).count();
        let all_done = board.units().all(|u| u.is_completed);

        if all_done {
            prop_assert_eq!(next, 0);
        } else {
            prop_assert_eq!(next, 1);
        }
    }

    #[test]
    fn empty_set_unlocks_the_first_unit((path, _ids) in path_and_completions()) {
        let board = resolve(&path, &CompletionSet::new());
        if let Some(first) = board.units().next() {
            prop_assert_eq!(first.status(), UnitStatus::Unlocked);
        }
        prop_assert!(board.units().skip(1).all(|u| u.is_locked));
    }

    #[test]
    fn units_after_the_first_gap_are_locked_unless_completed((path, ids) in path_and_completions()) {
        let completed: CompletionSet = ids.into_iter().collect();
        let board = resolve(&path, &completed);
        let mut gap_seen = false;
        for unit in board.units() {
            if unit.is_completed {
                prop_assert!(!unit.is_locked);
            } else if gap_seen {
                prop_assert!(unit.is_locked);
            } else {
                gap_seen = true;
            }
        }
    }

    #[test]
    fn re_adding_a_known_id_changes_nothing((path, ids) in path_and_completions()) {
        prop_assume!(!ids.is_empty());
        let completed: CompletionSet = ids.iter().cloned().collect();
        let mut again = completed.clone();
        again.mark_local(ids[0].clone());
        prop_assert_eq!(resolve(&path, &completed), resolve(&path, &again));
    }

    #[test]
    fn adding_ids_never_locks_completed_units(
        (path, ids) in path_and_completions(),
        extra in 1usize..30,
    ) {
        let completed: CompletionSet = ids.iter().cloned().collect();
        let before = statuses(&path, &completed);

        let mut grown = completed.clone();
        grown.mark_local(format!("u{extra}"));
        let after = statuses(&path, &grown);

        for (b, a) in before.iter().zip(after.iter()) {
            if *b == UnitStatus::Completed {
                prop_assert_eq!(*a, UnitStatus::Completed);
            }
        }
    }

    #[test]
    fn percent_is_hundred_iff_everything_is_done((path, ids) in path_and_completions()) {
        let completed: CompletionSet = ids.into_iter().collect();
        let board = resolve(&path, &completed);
        let everything = path.units().all(|u| completed.contains(&u.id));
        let percent = board.progress_percent();

        if path.unit_count() == 0 {
            prop_assert_eq!(percent, 0);
        } else {
            prop_assert_eq!(percent == 100, everything);
        }
        prop_assert!(percent <= 100);
    }
}
