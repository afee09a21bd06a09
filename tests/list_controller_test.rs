use std::sync::Arc;
use std::time::Duration;

use keepconnect_admin::entity::{MediumTab, MessageLog, Transaction, TransactionStatus};
use keepconnect_admin::list::{ListController, LoadOutcome, RefreshPolicy};
use keepconnect_admin::remote::{InMemoryRemote, InjectedFailure};
use keepconnect_admin::toast::ToastLevel;
use keepconnect_admin::{AdminError, User};
use serde_json::json;

fn users(n: u64) -> Vec<User> {
    (1..=n)
        .map(|i| {
            serde_json::from_value(json!({
                "id": i,
                "name": format!("User {i}"),
                "email": format!("user{i}@example.com"),
                "is_active": true,
            }))
            .unwrap()
        })
        .collect()
}

fn controller_with(records: Vec<User>) -> (Arc<InMemoryRemote<User>>, ListController<User, InMemoryRemote<User>>) {
    let remote = Arc::new(InMemoryRemote::new(records));
    let controller = ListController::<User, _>::new(Arc::clone(&remote));
    (remote, controller)
}

// ============================================================================
// Paging
// ============================================================================

#[tokio::test]
async fn test_twenty_three_records_make_three_pages() {
    let (_, controller) = controller_with(users(23));
    assert_eq!(controller.load().await.unwrap(), LoadOutcome::Applied(23));

    assert_eq!(controller.total_pages(), 3);
    assert_eq!(controller.page_records().len(), 10);

    controller.set_page(3);
    let last = controller.page_records();
    assert_eq!(last.len(), 3);
    assert_eq!(last[0].id, 21);

    // Out of range requests are clamped, not rejected.
    assert_eq!(controller.set_page(5), 3);
    assert_eq!(controller.set_page(0), 1);
}

#[tokio::test]
async fn test_search_resets_to_first_page() {
    let (_, controller) = controller_with(users(23));
    controller.load().await.unwrap();
    controller.set_page(2);

    controller.set_search_term("USER 2");
    assert_eq!(controller.current_page(), 1);
    // "User 2", "User 20".."User 23"
    let names: Vec<_> = controller.filtered().into_iter().map(|u| u.name).collect();
    assert_eq!(names, vec!["User 2", "User 20", "User 21", "User 22", "User 23"]);
    assert_eq!(controller.total_pages(), 1);
}

#[tokio::test]
async fn test_empty_search_result_still_has_one_page() {
    let (_, controller) = controller_with(users(5));
    controller.load().await.unwrap();
    controller.set_search_term("nobody");

    let view = controller.view();
    assert!(view.rows.is_empty());
    assert_eq!(view.total_pages, 1);
    assert_eq!(view.current_page, 1);
    assert_eq!(view.total_count, 5);
}

#[tokio::test]
async fn test_deleting_last_row_of_last_page_moves_back() {
    let (remote, controller) = controller_with(users(21));
    controller.load().await.unwrap();
    assert_eq!(controller.set_page(3), 3);

    controller.remove(&21).await.unwrap();
    assert_eq!(controller.total_pages(), 2);
    assert_eq!(controller.current_page(), 2);
    assert_eq!(remote.records().len(), 20);
}

// ============================================================================
// Loading
// ============================================================================

#[tokio::test]
async fn test_failed_load_keeps_previous_collection() {
    let (remote, controller) = controller_with(users(4));
    controller.load().await.unwrap();

    remote.fail_next(InjectedFailure::Unavailable("connection refused".into()));
    let err = controller.load().await.unwrap_err();
    assert!(matches!(err, AdminError::Fetch(_)));

    assert_eq!(controller.len(), 4);
    assert!(!controller.is_loading());
    let notice = controller.notice().unwrap();
    assert_eq!(notice.level, ToastLevel::Error);
    assert!(notice.message.contains("users"));
}

#[tokio::test]
async fn test_older_load_result_is_discarded() {
    let (_, controller) = controller_with(Vec::new());

    let first = controller.begin_load();
    let second = controller.begin_load();

    let applied = controller.complete_load(second, Ok(users(2))).unwrap();
    assert_eq!(applied, LoadOutcome::Applied(2));
    assert!(!controller.is_loading());

    let stale = controller.complete_load(first, Ok(users(9))).unwrap();
    assert_eq!(stale, LoadOutcome::Stale);
    assert_eq!(controller.len(), 2);
}

#[tokio::test]
async fn test_duplicate_ids_collapse_on_load() {
    let mut records = users(3);
    let mut renamed = records[1].clone();
    renamed.name = "Renamed".into();
    records.push(renamed);

    let (_, controller) = controller_with(records);
    controller.load().await.unwrap();
    assert_eq!(controller.len(), 3);
    assert_eq!(controller.get(&2).unwrap().name, "Renamed");
}

// ============================================================================
// Mutations
// ============================================================================

#[tokio::test]
async fn test_created_record_is_listed_and_survives_reload() {
    let (remote, controller) = controller_with(users(3));
    controller.load().await.unwrap();

    let created = controller
        .create(&json!({"name": "Ada Lovelace", "email": "ada@example.com"}))
        .await
        .unwrap();
    assert_eq!(created.id, 4);
    assert!(controller.get(&4).is_some());
    assert_eq!(controller.notice().unwrap().message, "User created");

    controller.load().await.unwrap();
    assert_eq!(controller.len(), 4);
    assert_eq!(remote.list_calls(), 2);
}

#[tokio::test]
async fn test_refetch_policy_reloads_after_mutation() {
    let remote = Arc::new(InMemoryRemote::new(users(3)));
    let controller =
        ListController::<User, _>::new(Arc::clone(&remote)).with_policy(RefreshPolicy::Refetch);
    controller.load().await.unwrap();

    controller.update(&2, &json!({"name": "Grace"})).await.unwrap();
    assert_eq!(remote.list_calls(), 2);
    assert_eq!(controller.get(&2).unwrap().name, "Grace");
}

#[tokio::test]
async fn test_toggle_is_optimistic_then_confirmed() {
    let remote = Arc::new(InMemoryRemote::new(users(6)).with_latency(Duration::from_millis(100)));
    let controller = ListController::<User, _>::new(Arc::clone(&remote));
    controller.load().await.unwrap();
    assert!(controller.get(&5).unwrap().is_active);

    let (result, during) = tokio::join!(controller.toggle_status(&5), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        (controller.get(&5).unwrap().is_active, controller.is_busy(&5))
    });

    assert_eq!(during, (false, true));
    let confirmed = result.unwrap();
    assert!(!confirmed.is_active);
    assert!(!controller.is_busy(&5));
    assert!(!remote.records()[4].is_active);
}

#[tokio::test]
async fn test_toggle_leaves_other_records_untouched() {
    let (_, controller) = controller_with(users(8));
    controller.load().await.unwrap();
    let before = controller.records();

    controller.toggle_status(&5).await.unwrap();
    let after = controller.records();

    assert_eq!(before.len(), after.len());
    for (old, new) in before.iter().zip(&after) {
        if old.id == 5 {
            assert_eq!(new.is_active, !old.is_active);
            assert_eq!(new.name, old.name);
        } else {
            assert_eq!(old, new);
        }
    }
}

#[tokio::test]
async fn test_failed_toggle_rolls_back() {
    let (remote, controller) = controller_with(users(6));
    controller.load().await.unwrap();

    remote.fail_next(InjectedFailure::Unavailable("HTTP 500".into()));
    let err = controller.toggle_status(&5).await.unwrap_err();
    assert!(matches!(err, AdminError::Mutation(_)));

    assert!(controller.get(&5).unwrap().is_active);
    let notice = controller.notice().unwrap();
    assert!(notice.is_error());
    assert!(notice.message.starts_with("Failed to toggle user"));
}

#[tokio::test]
async fn test_failed_toggle_keeps_newer_snapshot() {
    let remote = Arc::new(InMemoryRemote::new(users(6)).with_latency(Duration::from_millis(100)));
    let controller = ListController::<User, _>::new(Arc::clone(&remote));
    controller.load().await.unwrap();
    remote.fail_next(InjectedFailure::Unavailable("HTTP 500".into()));

    let mut fresh = users(6);
    fresh[4].name = "Renamed Elsewhere".into();

    let (toggle, reload) = tokio::join!(controller.toggle_status(&5), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let ticket = controller.begin_load();
        controller.complete_load(ticket, Ok(fresh))
    });

    assert_eq!(reload.unwrap(), LoadOutcome::Applied(6));
    assert!(toggle.is_err());
    let user = controller.get(&5).unwrap();
    assert_eq!(user.name, "Renamed Elsewhere");
    assert!(user.is_active);
}

#[tokio::test]
async fn test_second_mutation_on_same_row_is_busy() {
    let (remote, controller) = controller_with(users(3));
    controller.load().await.unwrap();
    remote.set_latency(Some(Duration::from_millis(50)));

    let (first, second) = tokio::join!(controller.remove(&1), controller.remove(&1));
    let outcomes = [first.is_ok(), second.is_ok()];
    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
    assert!(matches!(first.err().or(second.err()), Some(AdminError::Busy(_))));
    assert_eq!(remote.mutation_calls(), 1);
}

#[tokio::test]
async fn test_concurrent_mutations_on_different_rows_both_apply() {
    let remote = Arc::new(InMemoryRemote::new(users(3)).with_latency(Duration::from_millis(20)));
    let controller = ListController::<User, _>::new(Arc::clone(&remote));
    controller.load().await.unwrap();

    let (a, b) = tokio::join!(controller.remove(&1), controller.toggle_status(&2));
    a.unwrap();
    b.unwrap();
    assert_eq!(controller.len(), 2);
    assert!(!controller.get(&2).unwrap().is_active);
}

#[tokio::test]
async fn test_toggle_unsupported_collection() {
    let remote = Arc::new(InMemoryRemote::<MessageLog>::default());
    let controller = ListController::<MessageLog, _>::new(remote);
    let err = controller.toggle_status(&1).await.unwrap_err();
    assert!(matches!(err, AdminError::Unsupported { .. }));
}

// ============================================================================
// Facets
// ============================================================================

#[tokio::test]
async fn test_medium_tab_narrows_message_logs() {
    let logs: Vec<MessageLog> = serde_json::from_value(json!([
        {"id": 1, "from_phone": "+100", "to_phone": "+200", "message": "Hello there", "medium": "sms"},
        {"id": 2, "from_phone": "+100", "to_phone": "+300", "message": "Hello again", "medium": "whatsapp"},
        {"id": 3, "from_phone": "+100", "to_phone": "+400", "message": "Bye", "medium": "sms"},
    ]))
    .unwrap();
    let controller = ListController::<MessageLog, _>::new(Arc::new(InMemoryRemote::new(logs)));
    controller.load().await.unwrap();

    controller.set_facet(MediumTab::Sms);
    assert_eq!(controller.filtered().len(), 2);

    controller.set_search_term("hello");
    let ids: Vec<_> = controller.filtered().into_iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![1]);
}

#[tokio::test]
async fn test_transaction_toggle_flips_status() {
    let txs: Vec<Transaction> = serde_json::from_value(json!([
        {"id": 1, "name": "Top-up", "date": "2024-03-01", "amount": 20, "status": "Credited"},
    ]))
    .unwrap();
    let controller = ListController::<Transaction, _>::new(Arc::new(InMemoryRemote::new(txs)));
    controller.load().await.unwrap();

    let toggled = controller.toggle_status(&1).await.unwrap();
    assert_eq!(toggled.status, TransactionStatus::Debited);
}
