use lnatprep_db::table::Subscription as SubscriptionTable;
use sea_query::{Expr, ExprTrait, OnConflict, Order, Query, SqliteQueryBuilder};
use sea_query_sqlx::SqlxBinder;
use sqlx::{SqlitePool, prelude::FromRow};
use time::OffsetDateTime;

use super::{from_json, to_json};
use crate::{StoreError, Subscription};

#[derive(FromRow)]
struct SubscriptionRow {
    id: String,
    data: String,
}

pub(super) async fn save(
    pool: &SqlitePool,
    subscription: &Subscription,
) -> Result<(), StoreError> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let statement = Query::insert()
        .into_table(SubscriptionTable::Table)
        .columns([
            SubscriptionTable::Id,
            SubscriptionTable::UserId,
            SubscriptionTable::Status,
            SubscriptionTable::Data,
            SubscriptionTable::UpdatedAt,
        ])
        .values_panic([
            subscription.id.to_owned().into(),
            subscription.user_id.to_owned().into(),
            subscription.status.to_string().into(),
            to_json(subscription)?.into(),
            now.into(),
        ])
        .on_conflict(
            OnConflict::column(SubscriptionTable::Id)
                .update_columns([
                    SubscriptionTable::Status,
                    SubscriptionTable::Data,
                    SubscriptionTable::UpdatedAt,
                ])
                .to_owned(),
        )
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(pool).await?;

    Ok(())
}

pub(super) async fn find_by_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<Subscription>, StoreError> {
    let statement = Query::select()
        .columns([SubscriptionTable::Id, SubscriptionTable::Data])
        .from(SubscriptionTable::Table)
        .and_where(Expr::col(SubscriptionTable::UserId).eq(user_id))
        .order_by(SubscriptionTable::Id, Order::Asc)
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);

    let rows = sqlx::query_as_with::<_, SubscriptionRow, _>(&sql, values)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| from_json(&row.id, "data", Some(row.data)))
        .collect())
}
