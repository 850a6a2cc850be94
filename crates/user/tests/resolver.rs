use std::sync::atomic::Ordering;

use lnatprep_shared::{Metadata, RawTimestamp};
use lnatprep_user::{
    ActivateSubscriptionInput, Command, GrantInput, Permission, Source, Store, UserUpdate,
    tool_set,
};
use temp_dir::TempDir;
use time::Duration;

mod helpers;

fn monthly() -> ActivateSubscriptionInput {
    ActivateSubscriptionInput {
        plan_id: "monthly".to_owned(),
        plan_name: "Monthly".to_owned(),
        days: 30,
        payment: None,
    }
}

#[tokio::test]
async fn test_admin_resolves_to_full_set() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.child("db.sqlite3");
    let state = helpers::setup_test_state(path).await?;
    let cmd = state.command();
    let admin_id = helpers::create_admin(&cmd, "admin").await?;

    helpers::set_trial_end(&cmd, &admin_id, Some(RawTimestamp::Text("Invalid Date".to_owned())))
        .await?;

    let resolution = cmd.entitlements(&admin_id).await?;
    assert_eq!(resolution.source, Source::AdminOverride);
    assert_eq!(resolution.permissions, tool_set());

    Ok(())
}

#[tokio::test]
async fn test_admin_holds_catalog_permissions() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.child("db.sqlite3");
    let state = helpers::setup_test_state(path).await?;
    let cmd = state.command();
    let admin_id = helpers::create_admin(&cmd, "admin").await?;
    let user_id = helpers::create_lapsed_user(&cmd, "john.doe").await?;

    cmd.upsert_permission(Permission {
        id: "mock-exam".to_owned(),
        name: "Mock Exam".to_owned(),
        description: None,
    })
    .await?;

    cmd.grant(
        GrantInput {
            user_id: user_id.to_owned(),
            permission_id: "mock-exam".to_owned(),
            expires_at: None,
        },
        &Metadata::by(&admin_id),
    )
    .await?;

    let user = cmd.entitlements(&user_id).await?;
    let admin = cmd.entitlements(&admin_id).await?;

    assert_eq!(admin.source, Source::AdminOverride);
    assert!(user.permissions.is_subset(&admin.permissions));
    assert!(admin.has("mock-exam"));
    assert!(tool_set().is_subset(&admin.permissions));

    Ok(())
}

#[tokio::test]
async fn test_admin_keeps_tools_when_catalog_fails() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.child("db.sqlite3");
    let state = helpers::setup_test_state(path).await?;
    let store = helpers::FlakyStore::new(state.store());
    let cmd = Command::new(store.clone()).with_clock(state.clock.clone());
    let admin_id = helpers::create_admin(&cmd, "admin").await?;

    store.fail_catalog.store(true, Ordering::SeqCst);

    let resolution = cmd.entitlements(&admin_id).await?;
    assert_eq!(resolution.source, Source::AdminOverride);
    assert_eq!(resolution.permissions, tool_set());

    Ok(())
}

#[tokio::test]
async fn test_subscription_wins_over_trial_and_sweep_clears_trial() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.child("db.sqlite3");
    let state = helpers::setup_test_state(path).await?;
    let cmd = state.command();
    let user_id = helpers::create_user(&cmd, "john.doe").await?;

    cmd.activate_subscription(&user_id, monthly()).await?;

    let resolution = cmd.entitlements(&user_id).await?;
    assert_eq!(resolution.source, Source::Subscription);
    assert!(resolution.trial_active);
    assert!(resolution.subscription_active);

    let report = cmd.sweep_all().await?;
    assert_eq!(report.failed, 0);

    let user = cmd.load(&user_id).await?.unwrap();
    assert_eq!(user.trial_ends_at, None);
    assert!(user.subscription.is_some());

    let resolution = cmd.entitlements(&user_id).await?;
    assert_eq!(resolution.source, Source::Subscription);
    assert!(!resolution.trial_active);

    Ok(())
}

#[tokio::test]
async fn test_without_trial_or_subscription_matches_list_active() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.child("db.sqlite3");
    let state = helpers::setup_test_state(path).await?;
    let cmd = state.command();
    let admin = Metadata::by("admin");
    let user_id = helpers::create_lapsed_user(&cmd, "john.doe").await?;

    let resolution = cmd.entitlements(&user_id).await?;
    assert_eq!(resolution.source, Source::None);
    assert!(resolution.permissions.is_empty());

    for permission_id in ["writing-evaluator", "question-generator"] {
        cmd.grant(
            GrantInput {
                user_id: user_id.to_owned(),
                permission_id: permission_id.to_owned(),
                expires_at: None,
            },
            &admin,
        )
        .await?;
    }

    // Legacy embedded grants never count.
    cmd.store
        .update_user(
            &user_id,
            &UserUpdate {
                permissions: Some(vec!["text-question-analysis".to_owned()]),
                ..Default::default()
            },
        )
        .await?;

    let resolution = cmd.entitlements(&user_id).await?;
    assert_eq!(resolution.source, Source::ExplicitGrant);
    assert_eq!(resolution.permissions, cmd.list_active(&user_id).await?);
    assert!(!resolution.has("text-question-analysis"));

    Ok(())
}

#[tokio::test]
async fn test_grant_lookup_failure_denies_access() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.child("db.sqlite3");
    let state = helpers::setup_test_state(path).await?;
    let store = helpers::FlakyStore::new(state.store());
    let cmd = Command::new(store.clone()).with_clock(state.clock.clone());
    let user_id = helpers::create_lapsed_user(&cmd, "john.doe").await?;

    cmd.grant(
        GrantInput {
            user_id: user_id.to_owned(),
            permission_id: "writing-evaluator".to_owned(),
            expires_at: None,
        },
        &Metadata::by("admin"),
    )
    .await?;

    store.fail_grants.store(true, Ordering::SeqCst);

    let resolution = cmd.entitlements(&user_id).await?;
    assert_eq!(resolution.source, Source::None);
    assert!(resolution.permissions.is_empty());

    assert!(matches!(
        cmd.list_active(&user_id).await,
        Err(lnatprep_shared::Error::Unavailable(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_expired_subscription_and_trial() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.child("db.sqlite3");
    let state = helpers::setup_test_state(path).await?;
    let cmd = state.command();
    let user_id = helpers::create_user(&cmd, "john.doe").await?;

    cmd.activate_subscription(&user_id, monthly()).await?;
    state.clock.advance(Duration::days(31));

    let resolution = cmd.entitlements(&user_id).await?;
    assert_eq!(resolution.source, Source::None);
    assert!(!resolution.trial_active);
    assert!(!resolution.subscription_active);

    Ok(())
}

#[tokio::test]
async fn test_unknown_user() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.child("db.sqlite3");
    let state = helpers::setup_test_state(path).await?;
    let cmd = state.command();

    assert!(matches!(
        cmd.entitlements("01JNB3Q5Z8X9Y0A1B2C3D4E5F6").await,
        Err(lnatprep_shared::Error::NotFound(_))
    ));

    Ok(())
}
