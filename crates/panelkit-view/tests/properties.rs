use panelkit_core::config::TextLimits;
use panelkit_view::{reconcile, sanitize, ViewList, TRUNCATION_MARKER};
use proptest::prelude::*;
use std::collections::HashSet;

fn keys() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..24, 0..32)
}

fn populated(initial: &[u8]) -> ViewList<u8, u8> {
    let mut list = ViewList::new();
    list.sync(initial.iter().copied(), |key| *key, |key| key);
    list
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn applying_the_same_snapshot_twice_is_idempotent(initial in keys(), snapshot in keys()) {
        let mut list = populated(&initial);
        list.sync(snapshot.iter().copied(), |key| *key, |key| key);

        let plan = reconcile(list.keys(), snapshot.iter().copied(), |key| *key);
        prop_assert!(plan.is_noop());
        let outcome = list.sync(snapshot.iter().copied(), |key| *key, |key| key);
        prop_assert!(outcome.is_empty());
    }

    #[test]
    fn creates_and_removes_never_share_keys(initial in keys(), snapshot in keys()) {
        let list = populated(&initial);
        let plan = reconcile(list.keys(), snapshot.iter().copied(), |key| *key);

        let created: HashSet<u8> = plan.to_create.iter().copied().collect();
        prop_assert_eq!(created.len(), plan.to_create.len());
        prop_assert!(plan.to_remove.iter().all(|key| !created.contains(key)));
    }

    #[test]
    fn keys_on_both_sides_produce_no_action(initial in keys(), snapshot in keys()) {
        let list = populated(&initial);
        let before: HashSet<u8> = list.keys().copied().collect();
        let plan = reconcile(list.keys(), snapshot.iter().copied(), |key| *key);

        for key in snapshot.iter().filter(|key| before.contains(key)) {
            prop_assert!(!plan.to_create.contains(key));
            prop_assert!(!plan.to_remove.contains(key));
        }
    }

    #[test]
    fn entries_match_the_last_snapshot(initial in keys(), snapshot in keys()) {
        let mut list = populated(&initial);
        list.sync(snapshot.iter().copied(), |key| *key, |key| key);

        let expected: HashSet<u8> = snapshot.iter().copied().collect();
        let actual: HashSet<u8> = list.keys().copied().collect();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(list.len(), snapshot.iter().copied().collect::<HashSet<u8>>().len());
    }

    #[test]
    fn sanitized_length_is_bounded(
        name in "[a-zA-Z ]{1,40}",
        body in "[a-zA-Z0-9 ]{1,80}",
        max_name in 1usize..20,
        max_body in 1usize..40,
    ) {
        let limits = TextLimits::new(max_name, max_body).expect("valid limits");
        let result = sanitize(&name, &body, &limits);
        prop_assume!(result.is_ok());
        let entry = result.expect("accepted");

        let trimmed_body = body.trim().chars().count();
        let expected_body = if trimmed_body > max_body {
            max_body + TRUNCATION_MARKER.len()
        } else {
            trimmed_body
        };
        prop_assert_eq!(entry.body.chars().count(), expected_body);
        prop_assert!(entry.name.chars().count() <= max_name + TRUNCATION_MARKER.len());
        prop_assert!(!entry.name.starts_with(' '));
    }
}
