use chrono::Utc;
use entity::{reward_redemption, sea_orm_active_enums::Tier, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, DbErr, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::loyalty::{find_reward, Reward, REWARDS, TIER_THRESHOLDS};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierRule {
    pub tier: Tier,
    pub min_lifetime_points: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RewardCatalog {
    pub rewards: Vec<Reward>,
    pub tiers: Vec<TierRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Redemption {
    pub redemption: reward_redemption::Model,
    pub points_remaining: i64,
}

pub struct Query;

impl Query {
    pub fn catalog() -> RewardCatalog {
        RewardCatalog {
            rewards: REWARDS.to_vec(),
            tiers: TIER_THRESHOLDS
                .iter()
                .map(|&(tier, min_lifetime_points)| TierRule {
                    tier,
                    min_lifetime_points,
                })
                .collect(),
        }
    }

    pub async fn history(db: &DbConn, user_id: i32) -> Result<Vec<reward_redemption::Model>, DbErr> {
        reward_redemption::Entity::find()
            .filter(reward_redemption::Column::UserId.eq(user_id))
            .order_by_desc(reward_redemption::Column::CreatedAt)
            .order_by_desc(reward_redemption::Column::Id)
            .all(db)
            .await
    }
}

pub struct Mutation;

impl Mutation {
    /// Spends points on a reward. Lifetime points and tier are untouched.
    pub async fn redeem(db: &DbConn, user_id: i32, code: &str) -> AppResult<Redemption> {
        let reward = find_reward(code).ok_or_else(|| AppError::BadRequest(format!("Unknown reward {code}")))?;

        let txn = db.begin().await?;
        let user = user::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id}")))?;

        if user.points < reward.cost {
            return Err(AppError::BadRequest(format!(
                "{} needs {} points, you have {}",
                reward.name, reward.cost, user.points
            )));
        }

        let points_remaining = user.points - reward.cost;
        let mut active: user::ActiveModel = user.into();
        active.points = Set(points_remaining);
        active.update(&txn).await?;

        let redemption = reward_redemption::ActiveModel {
            user_id: Set(user_id),
            reward_code: Set(reward.code.to_owned()),
            reward_name: Set(reward.name.to_owned()),
            points_spent: Set(reward.cost),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        info!(user_id, reward = reward.code, points_remaining, "reward redeemed");
        Ok(Redemption {
            redemption,
            points_remaining,
        })
    }
}
