use sea_query::{
    ColumnDef, Index, IndexCreateStatement, IndexDropStatement, Table, TableCreateStatement,
    TableDropStatement,
};

use crate::table::PermissionGrant;

pub struct CreateTable;

fn create_table() -> TableCreateStatement {
    Table::create()
        .table(PermissionGrant::Table)
        .col(
            ColumnDef::new(PermissionGrant::Id)
                .string()
                .not_null()
                .string_len(26)
                .primary_key(),
        )
        .col(
            ColumnDef::new(PermissionGrant::UserId)
                .string()
                .not_null()
                .string_len(26),
        )
        .col(
            ColumnDef::new(PermissionGrant::PermissionId)
                .string()
                .not_null()
                .string_len(50),
        )
        .col(
            ColumnDef::new(PermissionGrant::GrantedBy)
                .string()
                .not_null()
                .string_len(50),
        )
        .col(ColumnDef::new(PermissionGrant::GrantedAt).text().not_null())
        .col(ColumnDef::new(PermissionGrant::ExpiresAt).text())
        .col(
            ColumnDef::new(PermissionGrant::Active)
                .boolean()
                .not_null()
                .default(true),
        )
        .col(ColumnDef::new(PermissionGrant::RevokedAt).text())
        .col(
            ColumnDef::new(PermissionGrant::RevokedBy)
                .string()
                .string_len(50),
        )
        .col(ColumnDef::new(PermissionGrant::RevokeReason).text())
        .to_owned()
}

fn drop_table() -> TableDropStatement {
    Table::drop().table(PermissionGrant::Table).to_owned()
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

pub struct CreateIdx1;

fn create_idx_1() -> IndexCreateStatement {
    Index::create()
        .name("idx_permission_grant_b2Vt6k")
        .table(PermissionGrant::Table)
        .col(PermissionGrant::UserId)
        .col(PermissionGrant::PermissionId)
        .col(PermissionGrant::Active)
        .to_owned()
}

fn drop_idx_1() -> IndexDropStatement {
    Index::drop()
        .name("idx_permission_grant_b2Vt6k")
        .table(PermissionGrant::Table)
        .to_owned()
}

#[async_trait::async_trait]
impl sqlx_migrator::Operation<sqlx::Sqlite> for CreateIdx1 {
    async fn up(
        &self,
        connection: &mut sqlx::SqliteConnection,
    ) -> Result<(), sqlx_migrator::Error> {
        let statement = create_idx_1().to_string(sea_query::SqliteQueryBuilder);
        sqlx::query(&statement).execute(connection).await?;

        Ok(())
    }

    async fn down(
        &self,
        connection: &mut sqlx::SqliteConnection,
    ) -> Result<(), sqlx_migrator::Error> {
        let statement = drop_idx_1().to_string(sea_query::SqliteQueryBuilder);
        sqlx::query(&statement).execute(connection).await?;

        Ok(())
    }
}
