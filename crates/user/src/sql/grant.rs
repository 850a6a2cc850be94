use lnatprep_db::table::PermissionGrant as GrantTable;
use sea_query::{Expr, ExprTrait, Order, Query, SqliteQueryBuilder};
use sea_query_sqlx::SqlxBinder;
use sqlx::{SqlitePool, prelude::FromRow};

use super::{timestamp, timestamp_opt, to_json};
use crate::{GrantFilter, PermissionGrant, Revocation, StoreError};

#[derive(FromRow)]
struct GrantRow {
    id: String,
    user_id: String,
    permission_id: String,
    granted_by: String,
    granted_at: String,
    expires_at: Option<String>,
    active: bool,
    revoked_at: Option<String>,
    revoked_by: Option<String>,
    revoke_reason: Option<String>,
}

impl From<GrantRow> for PermissionGrant {
    fn from(row: GrantRow) -> Self {
        PermissionGrant {
            id: row.id,
            user_id: row.user_id,
            permission_id: row.permission_id,
            granted_by: row.granted_by,
            granted_at: timestamp(row.granted_at),
            expires_at: timestamp_opt(row.expires_at),
            active: row.active,
            revoked_at: timestamp_opt(row.revoked_at),
            revoked_by: row.revoked_by,
            revoke_reason: row.revoke_reason,
        }
    }
}

pub(super) async fn find(
    pool: &SqlitePool,
    filter: &GrantFilter,
) -> Result<Vec<PermissionGrant>, StoreError> {
    let mut statement = Query::select()
        .columns([
            GrantTable::Id,
            GrantTable::UserId,
            GrantTable::PermissionId,
            GrantTable::GrantedBy,
            GrantTable::GrantedAt,
            GrantTable::ExpiresAt,
            GrantTable::Active,
            GrantTable::RevokedAt,
            GrantTable::RevokedBy,
            GrantTable::RevokeReason,
        ])
        .from(GrantTable::Table)
        .and_where(Expr::col(GrantTable::UserId).eq(filter.user_id.to_owned()))
        .order_by(GrantTable::Id, Order::Asc)
        .to_owned();

    if let Some(permission_id) = &filter.permission_id {
        statement.and_where(Expr::col(GrantTable::PermissionId).eq(permission_id.to_owned()));
    }

    if let Some(active) = filter.active {
        statement.and_where(Expr::col(GrantTable::Active).eq(active));
    }

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);

    let rows = sqlx::query_as_with::<_, GrantRow, _>(&sql, values)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

pub(super) async fn insert(pool: &SqlitePool, grant: &PermissionGrant) -> Result<(), StoreError> {
    let expires_at = grant.expires_at.as_ref().map(to_json).transpose()?;
    let revoked_at = grant.revoked_at.as_ref().map(to_json).transpose()?;

    let statement = Query::insert()
        .into_table(GrantTable::Table)
        .columns([
            GrantTable::Id,
            GrantTable::UserId,
            GrantTable::PermissionId,
            GrantTable::GrantedBy,
            GrantTable::GrantedAt,
            GrantTable::ExpiresAt,
            GrantTable::Active,
            GrantTable::RevokedAt,
            GrantTable::RevokedBy,
            GrantTable::RevokeReason,
        ])
        .values_panic([
            grant.id.to_owned().into(),
            grant.user_id.to_owned().into(),
            grant.permission_id.to_owned().into(),
            grant.granted_by.to_owned().into(),
            to_json(&grant.granted_at)?.into(),
            expires_at.into(),
            grant.active.into(),
            revoked_at.into(),
            grant.revoked_by.to_owned().into(),
            grant.revoke_reason.to_owned().into(),
        ])
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(pool).await?;

    Ok(())
}

pub(super) async fn revoke(
    pool: &SqlitePool,
    id: &str,
    revocation: &Revocation,
) -> Result<(), StoreError> {
    let statement = Query::update()
        .table(GrantTable::Table)
        .value(GrantTable::Active, false)
        .value(GrantTable::RevokedAt, to_json(&revocation.revoked_at)?)
        .value(GrantTable::RevokedBy, revocation.revoked_by.to_owned())
        .value(GrantTable::RevokeReason, revocation.reason.to_owned())
        .and_where(Expr::col(GrantTable::Id).eq(id))
        .and_where(Expr::col(GrantTable::Active).eq(true))
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(pool).await?;

    Ok(())
}
