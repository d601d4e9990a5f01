//! Session tokens issued by the identity provider.
//!
//! Credentials never reach this service. The provider signs a short-lived
//! HS256 token whose `sub` identifies the account; the first time we see a
//! subject we provision a customer row for it.

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use entity::{role, sea_orm_active_enums::Tier, user};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set, SqlErr};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub exp: usize,
}

/// Permission rank required by a route; matches the seeded role levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RoleLevel {
    Customer = 0,
    Staff = 10,
    Manager = 20,
    Admin = 30,
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| AppError::Unauthorized(format!("Invalid session token: {e}")))
}

fn bearer(parts: &Parts) -> Result<&str, AppError> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_owned()))
}

/// The signed-in account behind a request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: user::Model,
    pub role: role::Model,
}

impl CurrentUser {
    pub fn id(&self) -> i32 {
        self.user.id
    }

    pub fn has(&self, level: RoleLevel) -> bool {
        self.role.level >= level as i32
    }

    pub fn require(&self, level: RoleLevel) -> Result<(), AppError> {
        if self.has(level) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer(parts)?;
        let claims = decode_token(token, &state.config.auth_jwt_secret)?;
        resolve(&state.conn, &claims).await
    }
}

/// Finds the account for `claims`, creating a customer on first sign-in.
pub async fn resolve<C>(db: &C, claims: &Claims) -> Result<CurrentUser, AppError>
where
    C: ConnectionTrait,
{
    match find_current(db, &claims.sub).await? {
        Some(current) => Ok(current),
        None => provision(db, claims).await,
    }
}

async fn find_current<C>(db: &C, external_id: &str) -> Result<Option<CurrentUser>, AppError>
where
    C: ConnectionTrait,
{
    let found = user::Entity::find()
        .filter(user::Column::ExternalId.eq(external_id))
        .find_also_related(role::Entity)
        .one(db)
        .await?;

    Ok(match found {
        Some((user, Some(role))) => Some(CurrentUser { user, role }),
        _ => None,
    })
}

/// Inserts a bronze customer for `claims`. When a concurrent request for the
/// same subject got there first, returns the row it created.
pub async fn provision<C>(db: &C, claims: &Claims) -> Result<CurrentUser, AppError>
where
    C: ConnectionTrait,
{
    let role = role::Entity::find()
        .filter(role::Column::Name.eq(role::CUSTOMER))
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal("customer role is not seeded".to_owned()))?;

    let inserted = user::ActiveModel {
        external_id: Set(claims.sub.clone()),
        email: Set(claims.email.clone()),
        name: Set(claims.name.clone().unwrap_or_else(|| claims.email.clone())),
        role_id: Set(role.id),
        tier: Set(Tier::Bronze),
        points: Set(0),
        lifetime_points: Set(0),
        employee_number: Set(None),
        store_number: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await;

    match inserted {
        Ok(user) => {
            info!(user_id = user.id, "provisioned customer from identity provider");
            Ok(CurrentUser { user, role })
        }
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            debug!(sub = %claims.sub, "customer was provisioned concurrently");
            find_current(db, &claims.sub).await?.ok_or_else(|| err.into())
        }
        Err(err) => Err(err.into()),
    }
}
