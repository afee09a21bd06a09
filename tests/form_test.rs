use std::sync::Arc;
use std::time::Duration;

use keepconnect_admin::entity::{Role, Subscription};
use keepconnect_admin::error::FieldErrors;
use keepconnect_admin::list::ListController;
use keepconnect_admin::remote::{InMemoryRemote, InjectedFailure};
use keepconnect_admin::{AdminError, FormPhase, FormState, User};
use serde_json::json;

fn seeded_users() -> Vec<User> {
    serde_json::from_value(json!([
        {"id": 1, "name": "Grace Hopper", "email": "grace@example.com", "phone": "555-0100"},
    ]))
    .unwrap()
}

#[tokio::test]
async fn test_invalid_email_keeps_form_open_without_calling_remote() {
    let remote = Arc::new(InMemoryRemote::new(seeded_users()));
    let controller = ListController::<User, _>::new(Arc::clone(&remote));

    let mut form = FormState::<User>::create();
    form.set_text("name", "Ada Lovelace").unwrap();
    form.set_text("email", "ada-at-example").unwrap();

    let err = form.submit(&controller).await.unwrap_err();
    assert!(matches!(err, AdminError::Validation(_)));
    assert_eq!(form.phase(), FormPhase::Failed);
    assert!(form.is_open());
    assert_eq!(form.field_error("email"), Some("Wrong email format"));
    assert_eq!(form.draft().text("email"), "ada-at-example");
    assert_eq!(remote.mutation_calls(), 0);
}

#[tokio::test]
async fn test_edit_with_invalid_email_marks_only_email() {
    let remote = Arc::new(InMemoryRemote::new(seeded_users()));
    let controller = ListController::<User, _>::new(Arc::clone(&remote));
    controller.load().await.unwrap();

    let record = controller.get(&1).unwrap();
    let mut form = FormState::edit(&record);
    form.set_text("email", "grace.example.com").unwrap();

    assert!(form.submit(&controller).await.is_err());
    assert!(form.is_open());
    assert_eq!(form.errors().len(), 1);
    assert_eq!(form.field_error("email"), Some("Wrong email format"));
    assert_eq!(form.draft().text("name"), "Grace Hopper");
    assert_eq!(remote.mutation_calls(), 0);
    assert_eq!(controller.get(&1).unwrap(), record);
}

#[tokio::test]
async fn test_short_name_reports_minimum() {
    let controller = ListController::<User, _>::new(Arc::new(InMemoryRemote::default()));
    let mut form = FormState::<User>::create();
    form.apply_assignments([("name", "Al"), ("email", "al@example.com")])
        .unwrap();

    assert!(form.submit(&controller).await.is_err());
    assert_eq!(form.field_error("name"), Some("Minimum 3 characters"));
    assert!(form.field_error("email").is_none());
}

#[tokio::test]
async fn test_successful_create_closes_form_and_lists_record() {
    let remote = Arc::new(InMemoryRemote::new(seeded_users()));
    let controller = ListController::<User, _>::new(Arc::clone(&remote));
    controller.load().await.unwrap();

    let mut form = FormState::<User>::create();
    form.apply_assignments([("name", "Ada Lovelace"), ("email", "ada@example.com")])
        .unwrap();
    let created = form.submit(&controller).await.unwrap();

    assert_eq!(form.phase(), FormPhase::Success);
    assert!(!form.is_open());
    assert_eq!(form.saved().map(|u| u.id), Some(2));
    assert_eq!(created.email, "ada@example.com");
    assert_eq!(controller.len(), 2);
    assert_eq!(controller.notice().unwrap().message, "User created");
}

#[tokio::test]
async fn test_server_field_errors_land_on_fields() {
    let remote = Arc::new(InMemoryRemote::new(seeded_users()));
    let controller = ListController::<User, _>::new(Arc::clone(&remote));

    let mut fields = FieldErrors::new();
    fields.insert("email", "The email has already been taken.");
    remote.fail_next(InjectedFailure::Rejected {
        message: "The given data was invalid.".into(),
        fields,
    });

    let mut form = FormState::<User>::create();
    form.apply_assignments([("name", "Grace Again"), ("email", "grace@example.com")])
        .unwrap();
    let err = form.submit(&controller).await.unwrap_err();

    assert!(matches!(err, AdminError::Mutation(_)));
    assert_eq!(form.phase(), FormPhase::Failed);
    assert_eq!(
        form.field_error("email"),
        Some("The email has already been taken.")
    );
    assert_eq!(form.draft().text("name"), "Grace Again");
    assert!(controller.notice().unwrap().is_error());

    // Editing the field clears its error and the form can be resubmitted.
    form.set_text("email", "grace2@example.com").unwrap();
    assert!(form.field_error("email").is_none());
    form.submit(&controller).await.unwrap();
    assert_eq!(form.phase(), FormPhase::Success);
}

#[tokio::test]
async fn test_edit_form_updates_existing_record() {
    let remote = Arc::new(InMemoryRemote::new(seeded_users()));
    let controller = ListController::<User, _>::new(Arc::clone(&remote));
    controller.load().await.unwrap();

    let record = controller.get(&1).unwrap();
    let mut form = FormState::edit(&record);
    assert_eq!(form.draft().text("phone"), "555-0100");

    form.set_text("phone", "555-0199").unwrap();
    let updated = form.submit(&controller).await.unwrap();

    assert_eq!(updated.id, 1);
    assert_eq!(updated.phone.as_deref(), Some("555-0199"));
    assert_eq!(remote.records()[0].phone.as_deref(), Some("555-0199"));
    assert_eq!(controller.get(&1).unwrap().phone.as_deref(), Some("555-0199"));
}

#[tokio::test]
async fn test_second_create_while_first_in_flight_is_busy() {
    let remote = Arc::new(InMemoryRemote::<User>::default().with_latency(Duration::from_millis(50)));
    let controller = ListController::<User, _>::new(Arc::clone(&remote));

    let mut first = FormState::<User>::create();
    first.apply_assignments([("name", "Ada Lovelace"), ("email", "ada@example.com")])
        .unwrap();
    let mut second = FormState::<User>::create();
    second.apply_assignments([("name", "Alan Turing"), ("email", "alan@example.com")])
        .unwrap();

    let (a, b) = tokio::join!(first.submit(&controller), second.submit(&controller));
    assert!(a.is_ok());
    assert!(matches!(b, Err(AdminError::Busy(_))));
    assert_eq!(remote.records().len(), 1);
}

#[tokio::test]
async fn test_role_permissions_are_sent_as_list() {
    let remote = Arc::new(InMemoryRemote::<Role>::default());
    let controller = ListController::<Role, _>::new(Arc::clone(&remote));

    let mut form = FormState::<Role>::create();
    form.apply_assignments([
        ("name", "Support"),
        ("permissions", "View Users, Edit Users"),
    ])
    .unwrap();
    let role = form.submit(&controller).await.unwrap();
    assert_eq!(role.permissions, vec!["View Users", "Edit Users"]);
}

#[tokio::test]
async fn test_subscription_slug_follows_name() {
    let remote = Arc::new(InMemoryRemote::<Subscription>::default());
    let controller = ListController::<Subscription, _>::new(Arc::clone(&remote));

    let mut form = FormState::<Subscription>::create();
    form.apply_assignments([
        ("name", "Gold  Family Plan"),
        ("description", "For the whole family"),
        ("amount", "49.50"),
        ("tenure", "monthly"),
    ])
    .unwrap();
    let plan = form.submit(&controller).await.unwrap();
    assert_eq!(plan.slug, "gold-family-plan");
    assert_eq!(plan.amount, 49.5);
}
