use sqlx_migrator::{Info, Migrate, Migrator, Plan};

mod m0001;
pub mod table;

pub fn migrator() -> Result<Migrator<sqlx::Sqlite>, sqlx_migrator::Error> {
    let mut migrator = Migrator::default();
    migrator.add_migrations(vec![Box::new(m0001::Migration)])?;

    Ok(migrator)
}

pub async fn migrate(connection: &mut sqlx::SqliteConnection) -> Result<(), sqlx_migrator::Error> {
    migrator()?.run(connection, &Plan::apply_all()).await
}
