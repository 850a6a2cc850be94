use sea_query::{ColumnDef, Table, TableCreateStatement, TableDropStatement};

use crate::table::Permission;

pub struct CreateTable;

fn create_table() -> TableCreateStatement {
    Table::create()
        .table(Permission::Table)
        .col(
            ColumnDef::new(Permission::Id)
                .string()
                .not_null()
                .string_len(50)
                .primary_key(),
        )
        .col(
            ColumnDef::new(Permission::Name)
                .string()
                .not_null()
                .string_len(100),
        )
        .col(ColumnDef::new(Permission::Description).text())
        .to_owned()
}

fn drop_table() -> TableDropStatement {
    Table::drop().table(Permission::Table).to_owned()
}

#[async_trait::async_trait]
impl sqlx_migrator::Operation<sqlx::Sqlite> for CreateTable {
    async fn up(
        &self,
        connection: &mut sqlx::SqliteConnection,
    ) -> Result<(), sqlx_migrator::Error> {
        let statement = create_table().to_string(sea_query::SqliteQueryBuilder);
        sqlx::query(&statement).execute(connection).await?;

        Ok(())
    }

    async fn down(
        &self,
        connection: &mut sqlx::SqliteConnection,
    ) -> Result<(), sqlx_migrator::Error> {
        let statement = drop_table().to_string(sea_query::SqliteQueryBuilder);
        sqlx::query(&statement).execute(connection).await?;

        Ok(())
    }
}
