use std::collections::{HashMap, HashSet};

use chrono::Utc;
use entity::{category, drink, drink_milk, drink_sauce, drink_syrup, milk, sauce, syrup};
use sea_orm::{
    prelude::Decimal, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbConn, DbErr, EntityTrait,
    LoaderTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::pricing::MenuEntry;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuCategory {
    #[serde(flatten)]
    pub category: category::Model,
    pub drinks: Vec<drink::Model>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customizations {
    pub milks: Vec<milk::Model>,
    pub syrups: Vec<syrup::Model>,
    pub sauces: Vec<sauce::Model>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomizationKind {
    #[serde(alias = "syrups")]
    Syrup,
    #[serde(alias = "sauces")]
    Sauce,
    #[serde(alias = "milks")]
    Milk,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customization {
    pub kind: CustomizationKind,
    pub id: i32,
    pub name: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DrinkInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_price: Decimal,
    pub category_id: i32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "available_by_default")]
    pub available: bool,
    #[serde(default)]
    pub milk_ids: Vec<i32>,
    #[serde(default)]
    pub syrup_ids: Vec<i32>,
    #[serde(default)]
    pub sauce_ids: Vec<i32>,
}

fn available_by_default() -> bool {
    true
}

pub struct Query;

impl Query {
    /// Categories with their available drinks, both alphabetical.
    pub async fn menu(db: &DbConn) -> Result<Vec<MenuCategory>, DbErr> {
        let categories = category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(db)
            .await?;

        let drinks = categories
            .load_many(
                drink::Entity::find()
                    .filter(drink::Column::Available.eq(true))
                    .order_by_asc(drink::Column::Name),
                db,
            )
            .await?;

        Ok(categories
            .into_iter()
            .zip(drinks)
            .map(|(category, drinks)| MenuCategory { category, drinks })
            .collect())
    }

    pub async fn drink_detail<C>(db: &C, id: i32) -> Result<Option<MenuEntry>, DbErr>
    where
        C: ConnectionTrait,
    {
        Ok(Self::menu_entries(db, &[id]).await?.remove(&id))
    }

    /// Drinks keyed by id, each with the customizations linked to it.
    pub async fn menu_entries<C>(db: &C, ids: &[i32]) -> Result<HashMap<i32, MenuEntry>, DbErr>
    where
        C: ConnectionTrait,
    {
        let drinks = drink::Entity::find()
            .filter(drink::Column::Id.is_in(ids.iter().copied()))
            .all(db)
            .await?;

        let milks = drinks
            .load_many_to_many(milk::Entity, drink_milk::Entity, db)
            .await?;
        let syrups = drinks
            .load_many_to_many(syrup::Entity, drink_syrup::Entity, db)
            .await?;
        let sauces = drinks
            .load_many_to_many(sauce::Entity, drink_sauce::Entity, db)
            .await?;

        Ok(drinks
            .into_iter()
            .zip(milks)
            .zip(syrups)
            .zip(sauces)
            .map(|(((drink, milks), syrups), sauces)| {
                (
                    drink.id,
                    MenuEntry {
                        drink,
                        milks,
                        syrups,
                        sauces,
                    },
                )
            })
            .collect())
    }

    pub async fn customizations(db: &DbConn) -> Result<Customizations, DbErr> {
        Ok(Customizations {
            milks: milk::Entity::find()
                .order_by_asc(milk::Column::Name)
                .all(db)
                .await?,
            syrups: syrup::Entity::find()
                .order_by_asc(syrup::Column::Name)
                .all(db)
                .await?,
            sauces: sauce::Entity::find()
                .order_by_asc(sauce::Column::Name)
                .all(db)
                .await?,
        })
    }
}

pub struct Mutation;

impl Mutation {
    pub async fn create_category(db: &DbConn, name: &str) -> AppResult<category::Model> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Category name is required".to_owned()));
        }

        let exists = category::Entity::find()
            .filter(category::Column::Name.eq(name))
            .one(db)
            .await?
            .is_some();
        if exists {
            return Err(AppError::Conflict(format!("Category {name} already exists")));
        }

        Ok(category::ActiveModel {
            name: Set(name.to_owned()),
            ..Default::default()
        }
        .insert(db)
        .await?)
    }

    pub async fn create_drink(db: &DbConn, input: DrinkInput) -> AppResult<MenuEntry> {
        validate_drink(&input)?;

        let txn = db.begin().await?;
        ensure_category(&txn, input.category_id).await?;

        let drink = drink::ActiveModel {
            name: Set(input.name.trim().to_owned()),
            description: Set(input.description.clone()),
            base_price: Set(input.base_price),
            category_id: Set(input.category_id),
            image_url: Set(input.image_url.clone()),
            available: Set(input.available),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        replace_links(&txn, drink.id, &input).await?;
        txn.commit().await?;

        Query::drink_detail(db, drink.id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Drink {}", drink.id)))
    }

    pub async fn update_drink(db: &DbConn, id: i32, input: DrinkInput) -> AppResult<MenuEntry> {
        validate_drink(&input)?;

        let txn = db.begin().await?;
        let existing = drink::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Drink {id}")))?;
        ensure_category(&txn, input.category_id).await?;

        let mut drink: drink::ActiveModel = existing.into();
        drink.name = Set(input.name.trim().to_owned());
        drink.description = Set(input.description.clone());
        drink.base_price = Set(input.base_price);
        drink.category_id = Set(input.category_id);
        drink.image_url = Set(input.image_url.clone());
        drink.available = Set(input.available);
        drink.update(&txn).await?;

        replace_links(&txn, id, &input).await?;
        txn.commit().await?;

        Query::drink_detail(db, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Drink {id}")))
    }

    pub async fn delete_drink(db: &DbConn, id: i32) -> AppResult<()> {
        let txn = db.begin().await?;
        // Links are removed explicitly; SQLite only cascades with foreign keys switched on.
        drink_milk::Entity::delete_many()
            .filter(drink_milk::Column::DrinkId.eq(id))
            .exec(&txn)
            .await?;
        drink_syrup::Entity::delete_many()
            .filter(drink_syrup::Column::DrinkId.eq(id))
            .exec(&txn)
            .await?;
        drink_sauce::Entity::delete_many()
            .filter(drink_sauce::Column::DrinkId.eq(id))
            .exec(&txn)
            .await?;

        let res = drink::Entity::delete_by_id(id).exec(&txn).await?;
        if res.rows_affected == 0 {
            return Err(AppError::not_found(format!("Drink {id}")));
        }
        txn.commit().await?;
        Ok(())
    }

    pub async fn create_customization(
        db: &DbConn,
        kind: CustomizationKind,
        name: &str,
        price: Decimal,
    ) -> AppResult<Customization> {
        let name = name.trim().to_owned();
        if name.is_empty() {
            return Err(AppError::BadRequest("Name is required".to_owned()));
        }
        if price.is_sign_negative() {
            return Err(AppError::BadRequest("Price cannot be negative".to_owned()));
        }

        let duplicate = || AppError::Conflict(format!("{name} already exists"));
        let id = match kind {
            CustomizationKind::Milk => {
                if milk::Entity::find()
                    .filter(milk::Column::Name.eq(name.as_str()))
                    .one(db)
                    .await?
                    .is_some()
                {
                    return Err(duplicate());
                }
                milk::ActiveModel {
                    name: Set(name.clone()),
                    price: Set(price),
                    ..Default::default()
                }
                .insert(db)
                .await?
                .id
            }
            CustomizationKind::Syrup => {
                if syrup::Entity::find()
                    .filter(syrup::Column::Name.eq(name.as_str()))
                    .one(db)
                    .await?
                    .is_some()
                {
                    return Err(duplicate());
                }
                syrup::ActiveModel {
                    name: Set(name.clone()),
                    price: Set(price),
                    ..Default::default()
                }
                .insert(db)
                .await?
                .id
            }
            CustomizationKind::Sauce => {
                if sauce::Entity::find()
                    .filter(sauce::Column::Name.eq(name.as_str()))
                    .one(db)
                    .await?
                    .is_some()
                {
                    return Err(duplicate());
                }
                sauce::ActiveModel {
                    name: Set(name.clone()),
                    price: Set(price),
                    ..Default::default()
                }
                .insert(db)
                .await?
                .id
            }
        };

        Ok(Customization {
            kind,
            id,
            name,
            price,
        })
    }
}

fn validate_drink(input: &DrinkInput) -> AppResult<()> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("Drink name is required".to_owned()));
    }
    if input.base_price.is_sign_negative() {
        return Err(AppError::BadRequest("Base price cannot be negative".to_owned()));
    }
    Ok(())
}

async fn ensure_category<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<()> {
    category::Entity::find_by_id(id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::BadRequest(format!("Category {id} does not exist")))
}

fn unique(ids: &[i32]) -> Vec<i32> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

async fn replace_links<C: ConnectionTrait>(db: &C, drink_id: i32, input: &DrinkInput) -> AppResult<()> {
    let milk_ids = unique(&input.milk_ids);
    let syrup_ids = unique(&input.syrup_ids);
    let sauce_ids = unique(&input.sauce_ids);

    let found = milk::Entity::find()
        .filter(milk::Column::Id.is_in(milk_ids.clone()))
        .count(db)
        .await?;
    if found != milk_ids.len() as u64 {
        return Err(AppError::BadRequest("Unknown milk id".to_owned()));
    }
    let found = syrup::Entity::find()
        .filter(syrup::Column::Id.is_in(syrup_ids.clone()))
        .count(db)
        .await?;
    if found != syrup_ids.len() as u64 {
        return Err(AppError::BadRequest("Unknown syrup id".to_owned()));
    }
    let found = sauce::Entity::find()
        .filter(sauce::Column::Id.is_in(sauce_ids.clone()))
        .count(db)
        .await?;
    if found != sauce_ids.len() as u64 {
        return Err(AppError::BadRequest("Unknown sauce id".to_owned()));
    }

    drink_milk::Entity::delete_many()
        .filter(drink_milk::Column::DrinkId.eq(drink_id))
        .exec(db)
        .await?;
    drink_syrup::Entity::delete_many()
        .filter(drink_syrup::Column::DrinkId.eq(drink_id))
        .exec(db)
        .await?;
    drink_sauce::Entity::delete_many()
        .filter(drink_sauce::Column::DrinkId.eq(drink_id))
        .exec(db)
        .await?;

    if !milk_ids.is_empty() {
        drink_milk::Entity::insert_many(milk_ids.into_iter().map(|milk_id| drink_milk::ActiveModel {
            drink_id: Set(drink_id),
            milk_id: Set(milk_id),
        }))
        .exec_without_returning(db)
        .await?;
    }
    if !syrup_ids.is_empty() {
        drink_syrup::Entity::insert_many(syrup_ids.into_iter().map(|syrup_id| drink_syrup::ActiveModel {
            drink_id: Set(drink_id),
            syrup_id: Set(syrup_id),
        }))
        .exec_without_returning(db)
        .await?;
    }
    if !sauce_ids.is_empty() {
        drink_sauce::Entity::insert_many(sauce_ids.into_iter().map(|sauce_id| drink_sauce::ActiveModel {
            drink_id: Set(drink_id),
            sauce_id: Set(sauce_id),
        }))
        .exec_without_returning(db)
        .await?;
    }

    Ok(())
}
