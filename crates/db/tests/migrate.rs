use sqlx::{Connection, SqliteConnection};
use sqlx_migrator::{Migrate, Plan};

async fn table_names(conn: &mut SqliteConnection) -> Vec<String> {
    sqlx::query_as::<_, (String,)>(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE '\\_%' ESCAPE '\\' ORDER BY name",
    )
    .fetch_all(conn)
    .await
    .unwrap()
    .into_iter()
    .map(|(name,)| name)
    .collect()
}

#[tokio::test]
async fn test_migrations_apply_and_revert() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = SqliteConnection::connect("sqlite::memory:").await?;
    let migrator = lnatprep_db::migrator()?;

    migrator.run(&mut conn, &Plan::apply_all()).await?;

    let tables = table_names(&mut conn).await;
    for table in ["permission", "permission_grant", "subscription", "user"] {
        assert!(tables.contains(&table.to_owned()), "missing table {table}");
    }

    migrator.run(&mut conn, &Plan::revert_all()).await?;

    let tables = table_names(&mut conn).await;
    assert!(!tables.contains(&"user".to_owned()));
    assert!(!tables.contains(&"permission_grant".to_owned()));

    Ok(())
}
