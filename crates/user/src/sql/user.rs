use lnatprep_db::table::User as UserTable;
use lnatprep_shared::user::{Role, State};
use sea_query::{Expr, ExprTrait, Order, Query, SelectStatement, SqliteQueryBuilder};
use sea_query_sqlx::SqlxBinder;
use sqlx::{SqlitePool, prelude::FromRow};

use super::{from_json, timestamp_opt, to_json};
use crate::{StoreError, User, UserUpdate};

#[derive(FromRow)]
struct UserRow {
    id: String,
    email: String,
    role: sqlx::types::Text<Role>,
    state: sqlx::types::Text<State>,
    trial_ends_at: Option<String>,
    subscription: Option<String>,
    permissions: Option<String>,
    permission_status: Option<String>,
    created_at: i64,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let subscription = from_json(&row.id, "subscription", row.subscription);
        let permissions = from_json(&row.id, "permissions", row.permissions).unwrap_or_default();
        let permission_status = from_json(&row.id, "permission_status", row.permission_status);

        User {
            id: row.id,
            email: row.email,
            role: row.role.0,
            state: row.state.0,
            trial_ends_at: timestamp_opt(row.trial_ends_at),
            subscription,
            permissions,
            permission_status,
            created_at: row.created_at,
        }
    }
}

fn select() -> SelectStatement {
    Query::select()
        .columns([
            UserTable::Id,
            UserTable::Email,
            UserTable::Role,
            UserTable::State,
            UserTable::TrialEndsAt,
            UserTable::Subscription,
            UserTable::Permissions,
            UserTable::PermissionStatus,
            UserTable::CreatedAt,
        ])
        .from(UserTable::Table)
        .to_owned()
}

pub(super) enum FindType {
    Id(String),
    Email(String),
}

pub(super) async fn find(
    pool: &SqlitePool,
    arg_type: FindType,
) -> Result<Option<User>, StoreError> {
    let mut statement = select().limit(1).to_owned();

    match arg_type {
        FindType::Id(id) => statement.and_where(Expr::col(UserTable::Id).eq(id)),
        FindType::Email(email) => statement.and_where(Expr::col(UserTable::Email).eq(email)),
    };

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);

    let row = sqlx::query_as_with::<_, UserRow, _>(&sql, values)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(Into::into))
}

pub(super) async fn list(pool: &SqlitePool) -> Result<Vec<User>, StoreError> {
    let statement = select().order_by(UserTable::Id, Order::Asc).to_owned();
    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);

    let rows = sqlx::query_as_with::<_, UserRow, _>(&sql, values)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

pub(super) async fn create(pool: &SqlitePool, user: &User) -> Result<(), StoreError> {
    let trial_ends_at = user.trial_ends_at.as_ref().map(to_json).transpose()?;
    let subscription = user.subscription.as_ref().map(to_json).transpose()?;
    let permission_status = user.permission_status.as_ref().map(to_json).transpose()?;

    let statement = Query::insert()
        .into_table(UserTable::Table)
        .columns([
            UserTable::Id,
            UserTable::Email,
            UserTable::Role,
            UserTable::State,
            UserTable::TrialEndsAt,
            UserTable::Subscription,
            UserTable::Permissions,
            UserTable::PermissionStatus,
            UserTable::CreatedAt,
        ])
        .values_panic([
            user.id.to_owned().into(),
            user.email.to_owned().into(),
            user.role.to_string().into(),
            user.state.to_string().into(),
            trial_ends_at.into(),
            subscription.into(),
            to_json(&user.permissions)?.into(),
            permission_status.into(),
            user.created_at.into(),
        ])
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(pool).await?;

    Ok(())
}

pub(super) async fn update(
    pool: &SqlitePool,
    id: &str,
    input: &UserUpdate,
) -> Result<(), StoreError> {
    if input.is_empty() {
        return Ok(());
    }

    let mut statement = Query::update()
        .table(UserTable::Table)
        .and_where(Expr::col(UserTable::Id).eq(id))
        .to_owned();

    if let Some(role) = input.role {
        statement.value(UserTable::Role, role.as_ref());
    }

    if let Some(state) = input.state {
        statement.value(UserTable::State, state.as_ref());
    }

    if let Some(trial_ends_at) = &input.trial_ends_at {
        let value = trial_ends_at.as_ref().map(to_json).transpose()?;
        statement.value(UserTable::TrialEndsAt, value);
    }

    if let Some(subscription) = &input.subscription {
        let value = subscription.as_ref().map(to_json).transpose()?;
        statement.value(UserTable::Subscription, value);
    }

    if let Some(permissions) = &input.permissions {
        statement.value(UserTable::Permissions, to_json(permissions)?);
    }

    if let Some(permission_status) = &input.permission_status {
        statement.value(UserTable::PermissionStatus, to_json(permission_status)?);
    }

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(pool).await?;

    Ok(())
}
