//! Service-level tests for user lifecycle operations: create, suspend,
//! activate, role change, password reset, and the guards around them.

use warden::config::SecurityConfig;
use warden::constants::SYSTEM_OWNER_USER_ID;
use warden::db::Store;
use warden::services::user_service::{
    CreateUserParams, ListUsersFilter, Role, UserAdminError, UserAdminService, UserStatus,
};
use warden::services::user_service_impl::SeaOrmUserAdminService;

async fn test_store() -> Store {
    let db_path = std::env::temp_dir().join(format!("warden-test-{}.db", uuid::Uuid::new_v4()));
    Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to create store")
}

/// Cheap hashing params so tests spend their time on logic, not Argon2
fn test_security() -> SecurityConfig {
    SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
    }
}

fn service(store: &Store) -> SeaOrmUserAdminService {
    SeaOrmUserAdminService::new(store.clone(), test_security())
}

fn params(username: &str, role: Role) -> CreateUserParams {
    CreateUserParams {
        username: username.to_string(),
        password: "correct-horse-battery".to_string(),
        email: Some(format!("{username}@example.com")),
        role,
    }
}

#[tokio::test]
async fn create_and_get_user() {
    let store = test_store().await;
    let svc = service(&store);

    let user = svc
        .create_user(SYSTEM_OWNER_USER_ID, params("alice", Role::User))
        .await
        .unwrap();

    assert!(user.id.starts_with("user_"));
    assert_eq!(user.username, "alice");
    assert_eq!(user.role, Role::User);
    assert!(user.is_active);
    assert_eq!(user.status, UserStatus::Active);

    let fetched = svc.get_user(&user.id).await.unwrap();
    assert_eq!(fetched.username, "alice");

    // Password hash never leaves the storage layer
    let row = store.get_user_by_id(&user.id).await.unwrap().unwrap();
    assert!(row.password_hash.starts_with("$argon2id$"));
    assert_ne!(row.password_hash, "correct-horse-battery");
}

#[tokio::test]
async fn create_rejects_duplicates_and_bad_input() {
    let store = test_store().await;
    let svc = service(&store);

    svc.create_user(SYSTEM_OWNER_USER_ID, params("bob", Role::User))
        .await
        .unwrap();

    let err = svc
        .create_user(SYSTEM_OWNER_USER_ID, params("bob", Role::Viewer))
        .await
        .unwrap_err();
    assert!(matches!(err, UserAdminError::Duplicate(_)));

    let mut bad_email = params("carol", Role::User);
    bad_email.email = Some("not-an-email".to_string());
    let err = svc
        .create_user(SYSTEM_OWNER_USER_ID, bad_email)
        .await
        .unwrap_err();
    assert!(matches!(err, UserAdminError::Validation(_)));

    let mut short_password = params("carol", Role::User);
    short_password.password = "short".to_string();
    let err = svc
        .create_user(SYSTEM_OWNER_USER_ID, short_password)
        .await
        .unwrap_err();
    assert!(matches!(err, UserAdminError::Validation(_)));

    let mut no_username = params("", Role::User);
    no_username.email = None;
    let err = svc
        .create_user(SYSTEM_OWNER_USER_ID, no_username)
        .await
        .unwrap_err();
    assert!(matches!(err, UserAdminError::Validation(_)));
}

#[tokio::test]
async fn length_limits_count_characters_not_bytes() {
    let store = test_store().await;
    let svc = service(&store);

    // 200 characters but 400 bytes; within the 255-character limit
    let mut multibyte = params(&"ü".repeat(200), Role::User);
    multibyte.email = None;
    let user = svc
        .create_user(SYSTEM_OWNER_USER_ID, multibyte)
        .await
        .unwrap();
    assert_eq!(user.username.chars().count(), 200);

    // 600 characters but 1200 bytes; within the 1000-character maximum
    let mut long_password = params("jurgen", Role::User);
    long_password.password = "ü".repeat(600);
    svc.create_user(SYSTEM_OWNER_USER_ID, long_password)
        .await
        .unwrap();

    // 256 characters exceeds the limit regardless of encoding
    let mut too_long = params(&"ü".repeat(256), Role::User);
    too_long.email = None;
    let err = svc
        .create_user(SYSTEM_OWNER_USER_ID, too_long)
        .await
        .unwrap_err();
    assert!(matches!(err, UserAdminError::Validation(_)));
}

#[tokio::test]
async fn suspend_and_activate_round_trip() {
    let store = test_store().await;
    let svc = service(&store);

    let user = svc
        .create_user(SYSTEM_OWNER_USER_ID, params("dave", Role::User))
        .await
        .unwrap();

    let suspended = svc
        .suspend_user(
            SYSTEM_OWNER_USER_ID,
            &user.id,
            Some("policy violation".to_string()),
        )
        .await
        .unwrap();
    assert!(!suspended.is_active);
    assert!(matches!(suspended.status, UserStatus::Suspended { .. }));

    let err = svc
        .suspend_user(SYSTEM_OWNER_USER_ID, &user.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, UserAdminError::AlreadySuspended));

    let activated = svc
        .activate_user(SYSTEM_OWNER_USER_ID, &user.id)
        .await
        .unwrap();
    assert!(activated.is_active);
    assert_eq!(activated.status, UserStatus::Active);

    let err = svc
        .activate_user(SYSTEM_OWNER_USER_ID, &user.id)
        .await
        .unwrap_err();
    assert!(matches!(err, UserAdminError::AlreadyActive));
}

#[tokio::test]
async fn role_change_and_password_reset_are_audited() {
    let store = test_store().await;
    let svc = service(&store);

    let user = svc
        .create_user(SYSTEM_OWNER_USER_ID, params("erin", Role::Viewer))
        .await
        .unwrap();

    let updated = svc
        .change_role(SYSTEM_OWNER_USER_ID, &user.id, Role::Admin)
        .await
        .unwrap();
    assert_eq!(updated.role, Role::Admin);

    let hash_before = store
        .get_user_by_id(&user.id)
        .await
        .unwrap()
        .unwrap()
        .password_hash;

    let updated = svc
        .reset_password(SYSTEM_OWNER_USER_ID, &user.id, "a-whole-new-secret", true)
        .await
        .unwrap();
    assert!(updated.force_password_change);

    let hash_after = store
        .get_user_by_id(&user.id)
        .await
        .unwrap()
        .unwrap()
        .password_hash;
    assert_ne!(hash_before, hash_after);

    let trail = store.audit_trail_for_user(&user.id).await.unwrap();
    let operations: Vec<&str> = trail.iter().map(|e| e.operation.as_str()).collect();
    assert!(operations.contains(&"create"));
    assert!(operations.contains(&"role_change"));
    assert!(operations.contains(&"password_reset"));
    for entry in &trail {
        assert_eq!(entry.performed_by, SYSTEM_OWNER_USER_ID);
    }
}

#[tokio::test]
async fn self_modification_guard_covers_delete_and_role_change_only() {
    let store = test_store().await;
    let svc = service(&store);

    let admin = svc
        .create_user(SYSTEM_OWNER_USER_ID, params("frank", Role::Admin))
        .await
        .unwrap();

    let err = svc.delete_user(&admin.id, &admin.id).await.unwrap_err();
    assert!(matches!(err, UserAdminError::SelfModification));

    let err = svc
        .change_role(&admin.id, &admin.id, Role::User)
        .await
        .unwrap_err();
    assert!(matches!(err, UserAdminError::SelfModification));

    // Suspending yourself is allowed; the guard is scoped to the operations
    // that could strand the system without an admin or silently escalate
    let suspended = svc.suspend_user(&admin.id, &admin.id, None).await.unwrap();
    assert!(!suspended.is_active);
}

#[tokio::test]
async fn last_admin_guard_blocks_delete_but_not_suspend() {
    let store = test_store().await;
    let svc = service(&store);

    // The seeded system account is the only active admin
    let other_admin = svc
        .create_user(SYSTEM_OWNER_USER_ID, params("grace", Role::Admin))
        .await
        .unwrap();

    // Two active admins: deleting one is fine
    let outcome = svc
        .delete_user(SYSTEM_OWNER_USER_ID, &other_admin.id)
        .await
        .unwrap();
    assert!(outcome.user.status.is_deleted());

    // Down to one active admin again; deleting it must fail
    let actor = svc
        .create_user(SYSTEM_OWNER_USER_ID, params("heidi", Role::User))
        .await
        .unwrap();
    let err = svc
        .delete_user(&actor.id, SYSTEM_OWNER_USER_ID)
        .await
        .unwrap_err();
    assert!(matches!(err, UserAdminError::LastAdmin));

    // Suspension of the last admin is reversible, so it is not blocked
    let suspended = svc
        .suspend_user(&actor.id, SYSTEM_OWNER_USER_ID, None)
        .await
        .unwrap();
    assert!(!suspended.is_active);
}

#[tokio::test]
async fn list_users_filters_and_paginates() {
    let store = test_store().await;
    let svc = service(&store);

    for i in 0..5 {
        let role = if i % 2 == 0 { Role::User } else { Role::Viewer };
        svc.create_user(SYSTEM_OWNER_USER_ID, params(&format!("user{i}"), role))
            .await
            .unwrap();
    }

    // 5 created plus the seeded system admin
    let page = svc.list_users(ListUsersFilter::default()).await.unwrap();
    assert_eq!(page.total, 6);

    let viewers = svc
        .list_users(ListUsersFilter {
            role: Some(Role::Viewer),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(viewers.total, 2);

    let searched = svc
        .list_users(ListUsersFilter {
            search: Some("user3".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(searched.total, 1);
    assert_eq!(searched.users[0].username, "user3");

    let small_page = svc
        .list_users(ListUsersFilter {
            page: Some(2),
            page_size: Some(4),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(small_page.total, 6);
    assert_eq!(small_page.users.len(), 2);
    assert_eq!(small_page.page, 2);

    let err = svc
        .list_users(ListUsersFilter {
            page: Some(0),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, UserAdminError::Validation(_)));
}

#[tokio::test]
async fn operations_on_missing_or_deleted_users_report_not_found() {
    let store = test_store().await;
    let svc = service(&store);

    let err = svc.get_user("user_missing").await.unwrap_err();
    assert!(matches!(err, UserAdminError::NotFound(_)));

    let user = svc
        .create_user(SYSTEM_OWNER_USER_ID, params("ivan", Role::User))
        .await
        .unwrap();
    svc.delete_user(SYSTEM_OWNER_USER_ID, &user.id)
        .await
        .unwrap();

    // Deleted is terminal: every mutation treats the row as gone
    let err = svc
        .suspend_user(SYSTEM_OWNER_USER_ID, &user.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, UserAdminError::NotFound(_)));

    let err = svc
        .change_role(SYSTEM_OWNER_USER_ID, &user.id, Role::Admin)
        .await
        .unwrap_err();
    assert!(matches!(err, UserAdminError::NotFound(_)));

    let err = svc
        .reset_password(SYSTEM_OWNER_USER_ID, &user.id, "another-password", false)
        .await
        .unwrap_err();
    assert!(matches!(err, UserAdminError::NotFound(_)));

    // The snapshot remains readable with its deletion metadata
    let snapshot = svc.get_user(&user.id).await.unwrap();
    assert!(snapshot.status.is_deleted());
}
