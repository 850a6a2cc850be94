use lnatprep_db::table::Permission as PermissionTable;
use sea_query::{Expr, ExprTrait, OnConflict, Order, Query, SqliteQueryBuilder};
use sea_query_sqlx::SqlxBinder;
use sqlx::{SqlitePool, prelude::FromRow};

use crate::{Permission, StoreError};

#[derive(FromRow)]
struct PermissionRow {
    id: String,
    name: String,
    description: Option<String>,
}

impl From<PermissionRow> for Permission {
    fn from(row: PermissionRow) -> Self {
        Permission {
            id: row.id,
            name: row.name,
            description: row.description,
        }
    }
}

pub(super) async fn list(pool: &SqlitePool) -> Result<Vec<Permission>, StoreError> {
    let statement = Query::select()
        .columns([
            PermissionTable::Id,
            PermissionTable::Name,
            PermissionTable::Description,
        ])
        .from(PermissionTable::Table)
        .order_by(PermissionTable::Id, Order::Asc)
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);

    let rows = sqlx::query_as_with::<_, PermissionRow, _>(&sql, values)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

pub(super) async fn find(pool: &SqlitePool, id: &str) -> Result<Option<Permission>, StoreError> {
    let statement = Query::select()
        .columns([
            PermissionTable::Id,
            PermissionTable::Name,
            PermissionTable::Description,
        ])
        .from(PermissionTable::Table)
        .and_where(Expr::col(PermissionTable::Id).eq(id))
        .limit(1)
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);

    let row = sqlx::query_as_with::<_, PermissionRow, _>(&sql, values)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(Into::into))
}

pub(super) async fn save(pool: &SqlitePool, permission: &Permission) -> Result<(), StoreError> {
    let statement = Query::insert()
        .into_table(PermissionTable::Table)
        .columns([
            PermissionTable::Id,
            PermissionTable::Name,
            PermissionTable::Description,
        ])
        .values_panic([
            permission.id.to_owned().into(),
            permission.name.to_owned().into(),
            permission.description.to_owned().into(),
        ])
        .on_conflict(
            OnConflict::column(PermissionTable::Id)
                .update_columns([PermissionTable::Name, PermissionTable::Description])
                .to_owned(),
        )
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(pool).await?;

    Ok(())
}
