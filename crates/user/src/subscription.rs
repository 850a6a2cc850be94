use lnatprep_shared::normalize;
use time::{Duration, OffsetDateTime};
use ulid::Ulid;
use validator::Validate;

use crate::{PaymentRecord, Store, Subscription, SubscriptionStatus, UserUpdate};

#[derive(Validate, Clone, Debug)]
pub struct PaymentInput {
    #[validate(length(min = 1, max = 100))]
    pub reference: String,
    #[validate(range(min = 0))]
    pub amount_cents: i64,
    #[validate(length(equal = 3))]
    pub currency: String,
}

#[derive(Validate, Clone, Debug)]
pub struct ActivateSubscriptionInput {
    #[validate(length(min = 1, max = 50))]
    pub plan_id: String,
    #[validate(length(min = 1, max = 100))]
    pub plan_name: String,
    #[validate(range(min = 1, max = 3660))]
    pub days: i64,
    #[validate(nested)]
    pub payment: Option<PaymentInput>,
}

impl<S: Store> super::Command<S> {
    /// Effect of a successful payment. An active subscription is renewed by
    /// moving its end date forward; anything else starts a new subscription.
    /// A concurrent trial is left for the sweep to clear.
    pub async fn activate_subscription(
        &self,
        user_id: &str,
        input: ActivateSubscriptionInput,
    ) -> lnatprep_shared::Result<Subscription> {
        input.validate()?;

        let user = self.load_user(user_id).await?;
        let now = self.now();
        let period = Duration::days(input.days);

        let payment = input.payment.map(|payment| PaymentRecord {
            reference: payment.reference,
            amount_cents: payment.amount_cents,
            currency: payment.currency.to_uppercase(),
            paid_at: now.into(),
        });

        let subscription = match user.subscription.filter(|s| s.is_active_at(now)) {
            Some(mut current) => {
                // Open-ended subscriptions stay open-ended.
                let end = current
                    .end_date
                    .as_ref()
                    .and_then(|end| normalize(end).valid());

                if let Some(end) = end {
                    let Some(renewed) = renewed_end(end, now, period) else {
                        lnatprep_shared::user!(
                            "subscription {} cannot be extended past year 9999",
                            current.id
                        );
                    };

                    current.end_date = Some(renewed.into());
                }

                current.plan_id = input.plan_id;
                current.plan_name = input.plan_name;
                current.payments.extend(payment);

                tracing::info!(user_id, subscription_id = %current.id, "subscription renewed");

                current
            }
            None => {
                let Some(end) = now.checked_add(period) else {
                    lnatprep_shared::user!(
                        "subscription period of {} days is out of range",
                        input.days
                    );
                };

                let subscription = Subscription {
                    id: Ulid::new().to_string(),
                    user_id: user_id.to_owned(),
                    status: SubscriptionStatus::Active,
                    plan_id: input.plan_id,
                    plan_name: input.plan_name,
                    start_date: now.into(),
                    end_date: Some(end.into()),
                    trial_end: None,
                    auto_renew: true,
                    payments: payment.into_iter().collect(),
                };

                tracing::info!(
                    user_id,
                    subscription_id = %subscription.id,
                    "subscription activated"
                );

                subscription
            }
        };

        self.call("save_subscription", || {
            self.store.save_subscription(&subscription)
        })
        .await?;

        let update = UserUpdate {
            subscription: Some(Some(subscription.clone())),
            ..Default::default()
        };

        self.call("update_user", || self.store.update_user(user_id, &update))
            .await?;

        self.refresh_snapshot_quietly(user_id).await;

        Ok(subscription)
    }

    pub async fn cancel_auto_renew(&self, user_id: &str) -> lnatprep_shared::Result<()> {
        let user = self.load_user(user_id).await?;

        let Some(mut subscription) = user.subscription else {
            lnatprep_shared::not_found!("subscription for user {user_id}");
        };

        if !subscription.auto_renew {
            return Ok(());
        }

        subscription.auto_renew = false;

        self.call("save_subscription", || {
            self.store.save_subscription(&subscription)
        })
        .await?;

        let update = UserUpdate {
            subscription: Some(Some(subscription.clone())),
            ..Default::default()
        };

        self.call("update_user", || self.store.update_user(user_id, &update))
            .await?;

        tracing::info!(user_id, subscription_id = %subscription.id, "auto renew cancelled");

        Ok(())
    }

    pub async fn subscriptions(&self, user_id: &str) -> lnatprep_shared::Result<Vec<Subscription>> {
        Ok(self
            .call("find_subscriptions", || self.store.find_subscriptions(user_id))
            .await?)
    }
}

/// `None` when the new end does not fit in a date.
fn renewed_end(
    end: OffsetDateTime,
    now: OffsetDateTime,
    period: Duration,
) -> Option<OffsetDateTime> {
    end.max(now).checked_add(period)
}
