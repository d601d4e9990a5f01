//! Points, tiers and the reward catalog.
//!
//! Customers earn one point per whole currency unit paid. Tiers are derived
//! from lifetime points only, so spending points on rewards never demotes
//! anyone.

use entity::sea_orm_active_enums::Tier;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::Serialize;

/// Minimum lifetime points per tier, lowest first.
pub const TIER_THRESHOLDS: [(Tier, i64); 3] = [(Tier::Bronze, 0), (Tier::Silver, 200), (Tier::Gold, 500)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reward {
    pub code: &'static str,
    pub name: &'static str,
    pub cost: i64,
}

pub const REWARDS: [Reward; 3] = [
    Reward {
        code: "drip",
        name: "Drip Coffee",
        cost: 100,
    },
    Reward {
        code: "pastry",
        name: "Pastry",
        cost: 150,
    },
    Reward {
        code: "handcrafted",
        name: "Handcrafted Drink",
        cost: 250,
    },
];

pub fn find_reward(code: &str) -> Option<Reward> {
    REWARDS.into_iter().find(|reward| reward.code == code)
}

pub fn points_for_total(total: Decimal) -> i64 {
    if total.is_sign_negative() {
        return 0;
    }
    total.floor().to_i64().unwrap_or(0)
}

pub fn tier_for_points(lifetime_points: i64) -> Tier {
    TIER_THRESHOLDS
        .iter()
        .rev()
        .find(|(_, threshold)| lifetime_points >= *threshold)
        .map(|(tier, _)| *tier)
        .unwrap_or(Tier::Bronze)
}

fn threshold_of(tier: Tier) -> i64 {
    TIER_THRESHOLDS
        .iter()
        .find(|(t, _)| *t == tier)
        .map(|(_, threshold)| *threshold)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierProgress {
    pub tier: Tier,
    pub lifetime_points: i64,
    pub next_tier: Option<Tier>,
    pub points_to_next: Option<i64>,
}

impl TierProgress {
    pub fn of(lifetime_points: i64) -> Self {
        let tier = tier_for_points(lifetime_points);
        let next_tier = TIER_THRESHOLDS
            .iter()
            .map(|(t, _)| *t)
            .find(|t| *t > tier);

        Self {
            tier,
            lifetime_points,
            next_tier,
            points_to_next: next_tier.map(|next| threshold_of(next) - lifetime_points),
        }
    }
}
