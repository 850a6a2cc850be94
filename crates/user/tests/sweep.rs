use std::sync::atomic::Ordering;

use lnatprep_shared::Metadata;
use lnatprep_user::{
    Command, GrantInput, MaintenanceStatus, Source, Store, SubscriptionStatus, UserUpdate,
};
use temp_dir::TempDir;
use time::Duration;

mod helpers;

#[tokio::test]
async fn test_sweep_revokes_grants_of_lapsed_trial() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.child("db.sqlite3");
    let state = helpers::setup_test_state(path).await?;
    let cmd = state.command();
    let admin = Metadata::by("admin");
    let user_id = helpers::create_user(&cmd, "john.doe").await?;

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

    cmd.store
        .update_user(
            &user_id,
            &UserUpdate {
                trial_ends_at: Some(Some((helpers::NOW - Duration::days(1)).into())),
                permissions: Some(vec!["writing-evaluator".to_owned()]),
                ..Default::default()
            },
        )
        .await?;

    let report = cmd.sweep_all().await?;
    assert_eq!(report.processed, 1);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 0);

    let grants = cmd.history(&user_id).await?;
    assert_eq!(grants.len(), 2);
    assert!(grants.iter().all(|grant| !grant.active));
    assert!(
        grants
            .iter()
            .all(|grant| grant.revoked_by.as_deref() == Some("system:sweep"))
    );

    let user = cmd.load(&user_id).await?.unwrap();
    assert_eq!(user.trial_ends_at, None);
    assert_eq!(user.subscription, None);
    assert!(user.permissions.is_empty());

    let snapshot = user.permission_status.unwrap();
    assert!(snapshot.permissions.is_empty());
    assert_eq!(snapshot.source, Source::None);
    assert!(!snapshot.trial_active);
    assert!(!snapshot.subscription_active);

    let history = cmd.subscriptions(&user_id).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, SubscriptionStatus::Expired);

    Ok(())
}

#[tokio::test]
async fn test_sweep_keeps_running_trial_and_skips_admins() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.child("db.sqlite3");
    let state = helpers::setup_test_state(path).await?;
    let cmd = state.command();
    let user_id = helpers::create_user(&cmd, "john.doe").await?;
    let admin_id = helpers::create_admin(&cmd, "admin").await?;
    let before = cmd.load(&user_id).await?.unwrap();

    let report = cmd.sweep_all().await?;
    assert_eq!(report.processed, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.skipped, 1);

    let user = cmd.load(&user_id).await?.unwrap();
    assert_eq!(user.trial_ends_at, before.trial_ends_at);
    assert_eq!(user.subscription, before.subscription);
    assert_eq!(user.permission_status.unwrap().source, Source::Trial);

    let admin = cmd.load(&admin_id).await?.unwrap();
    assert!(admin.trial_ends_at.is_some());

    Ok(())
}

#[tokio::test]
async fn test_sweep_counts_failed_users_without_aborting() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.child("db.sqlite3");
    let state = helpers::setup_test_state(path).await?;
    let store = helpers::FlakyStore::new(state.store());
    let cmd = Command::new(store.clone()).with_clock(state.clock.clone());

    let mut ids = vec![];
    for name in ["alice", "bob", "carol"] {
        ids.push(helpers::create_user(&cmd, name).await?);
    }

    state.clock.advance(Duration::days(8));
    store.fail_update_for(&ids[1]);

    let report = cmd.maintenance().await?;
    assert_eq!(report.status, MaintenanceStatus::PartialFailure);
    assert_eq!(report.sweep.processed, 3);
    assert_eq!(report.sweep.succeeded, 2);
    assert_eq!(report.sweep.failed, 1);
    assert_eq!(report.sweep.failed_user_ids, vec![ids[1].to_owned()]);
    assert_eq!(report.refresh.failed, 1);
    assert_eq!(report.steps.len(), 4);

    for id in [&ids[0], &ids[2]] {
        let user = cmd.load(id).await?.unwrap();
        assert_eq!(user.trial_ends_at, None);
        assert_eq!(user.permission_status.unwrap().source, Source::None);
    }

    let failed = cmd.load(&ids[1]).await?.unwrap();
    assert!(failed.trial_ends_at.is_some());

    Ok(())
}

#[tokio::test]
async fn test_maintenance_success_and_hard_failure() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.child("db.sqlite3");
    let state = helpers::setup_test_state(path).await?;
    let store = helpers::FlakyStore::new(state.store());
    let cmd = Command::new(store.clone()).with_clock(state.clock.clone());
    helpers::create_user(&cmd, "john.doe").await?;
    helpers::create_admin(&cmd, "admin").await?;

    let report = cmd.maintenance().await?;
    assert_eq!(report.status, MaintenanceStatus::Success);
    assert_eq!(report.refresh.succeeded, 2);

    store.fail_list_users.store(true, Ordering::SeqCst);
    assert!(matches!(
        cmd.maintenance().await,
        Err(lnatprep_shared::Error::Unavailable(_))
    ));

    Ok(())
}
