use chrono::Utc;
use entity::{role, sea_orm_active_enums::Tier, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbConn, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::loyalty::{tier_for_points, TierProgress};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserWithRole {
    #[serde(flatten)]
    pub user: user::Model,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    #[serde(flatten)]
    pub user: user::Model,
    pub role: String,
    pub progress: TierProgress,
}

impl Profile {
    pub fn new(user: user::Model, role: &role::Model) -> Self {
        Self {
            progress: TierProgress::of(user.lifetime_points),
            role: role.name.clone(),
            user,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewStaffUser {
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub employee_number: Option<String>,
    #[serde(default)]
    pub store_number: Option<String>,
}

pub struct Query;

impl Query {
    pub async fn find_user_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find_by_id(id).one(db).await
    }

    pub async fn list_users(db: &DbConn) -> Result<Vec<UserWithRole>, DbErr> {
        let rows = user::Entity::find()
            .find_also_related(role::Entity)
            .order_by_asc(user::Column::Id)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(user, role)| UserWithRole {
                user,
                role: role.map(|r| r.name).unwrap_or_default(),
            })
            .collect())
    }

    pub async fn list_roles(db: &DbConn) -> Result<Vec<role::Model>, DbErr> {
        role::Entity::find().order_by_asc(role::Column::Level).all(db).await
    }

    pub async fn find_role_by_name<C: ConnectionTrait>(db: &C, name: &str) -> Result<Option<role::Model>, DbErr> {
        role::Entity::find()
            .filter(role::Column::Name.eq(name))
            .one(db)
            .await
    }
}

pub struct Mutation;

impl Mutation {
    /// Onboards an employee whose account already exists at the identity provider.
    pub async fn create_staff_user(db: &DbConn, input: NewStaffUser) -> AppResult<UserWithRole> {
        let external_id = input.external_id.trim();
        let email = input.email.trim();
        if external_id.is_empty() || email.is_empty() || input.name.trim().is_empty() {
            return Err(AppError::BadRequest(
                "external_id, email and name are required".to_owned(),
            ));
        }

        let role = Query::find_role_by_name(db, &input.role)
            .await?
            .ok_or_else(|| AppError::BadRequest(format!("Unknown role {}", input.role)))?;

        let taken = user::Entity::find()
            .filter(
                Condition::any()
                    .add(user::Column::ExternalId.eq(external_id))
                    .add(user::Column::Email.eq(email)),
            )
            .one(db)
            .await?;
        if taken.is_some() {
            return Err(AppError::Conflict("User already exists".to_owned()));
        }

        let user = user::ActiveModel {
            external_id: Set(external_id.to_owned()),
            email: Set(email.to_owned()),
            name: Set(input.name.trim().to_owned()),
            role_id: Set(role.id),
            tier: Set(Tier::Bronze),
            points: Set(0),
            lifetime_points: Set(0),
            employee_number: Set(input.employee_number),
            store_number: Set(input.store_number),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(user_id = user.id, role = %role.name, "staff user created");
        Ok(UserWithRole {
            user,
            role: role.name,
        })
    }

    pub async fn change_role(db: &DbConn, user_id: i32, role_name: &str) -> AppResult<UserWithRole> {
        let role = Query::find_role_by_name(db, role_name)
            .await?
            .ok_or_else(|| AppError::BadRequest(format!("Unknown role {role_name}")))?;
        let user = Query::find_user_by_id(db, user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id}")))?;

        let mut active: user::ActiveModel = user.into();
        active.role_id = Set(role.id);
        let user = active.update(db).await?;

        Ok(UserWithRole {
            user,
            role: role.name,
        })
    }

    /// Manual correction by a manager. Positive deltas count toward the tier.
    pub async fn adjust_points(db: &DbConn, user_id: i32, delta: i64) -> AppResult<user::Model> {
        let txn = db.begin().await?;
        let user = Query::find_user_by_id(&txn, user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id}")))?;

        let points = user
            .points
            .checked_add(delta)
            .ok_or_else(|| AppError::BadRequest(format!("Adjustment of {delta} points is out of range")))?;
        if points < 0 {
            return Err(AppError::BadRequest(format!(
                "User {user_id} has only {} points",
                user.points
            )));
        }
        let lifetime_points = user
            .lifetime_points
            .checked_add(delta.max(0))
            .ok_or_else(|| AppError::BadRequest(format!("Adjustment of {delta} points is out of range")))?;

        let mut active: user::ActiveModel = user.into();
        active.points = Set(points);
        active.lifetime_points = Set(lifetime_points);
        active.tier = Set(tier_for_points(lifetime_points));
        let user = active.update(&txn).await?;

        txn.commit().await?;
        Ok(user)
    }
}

/// Credits earned points and re-derives the tier.
pub(crate) async fn award_points<C>(db: &C, user: user::Model, earned: i64) -> Result<user::Model, DbErr>
where
    C: ConnectionTrait,
{
    let overflow = || DbErr::Custom(format!("points balance of user {} overflowed", user.id));
    let points = user.points.checked_add(earned).ok_or_else(overflow)?;
    let lifetime_points = user.lifetime_points.checked_add(earned).ok_or_else(overflow)?;
    let previous = user.tier;

    let mut active: user::ActiveModel = user.into();
    active.points = Set(points);
    active.lifetime_points = Set(lifetime_points);
    active.tier = Set(tier_for_points(lifetime_points));
    let user = active.update(db).await?;

    if user.tier != previous {
        info!(user_id = user.id, tier = ?user.tier, "tier changed");
    }
    Ok(user)
}
