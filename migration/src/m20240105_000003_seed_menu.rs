use chrono::Utc;
use entity::{category, drink, drink_milk, drink_sauce, drink_syrup, milk, sauce, syrup};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{
    prelude::Decimal, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

const CATEGORIES: [&str; 3] = ["Espresso", "Brewed Coffee", "Tea"];

// (name, price in cents)
const MILKS: [(&str, i64); 3] = [("Whole", 0), ("Oat", 75), ("Almond", 75)];
const SYRUPS: [(&str, i64); 3] = [("Vanilla", 50), ("Caramel", 50), ("Hazelnut", 50)];
const SAUCES: [(&str, i64); 2] = [("Mocha", 75), ("White Mocha", 75)];

struct SeedDrink {
    name: &'static str,
    description: &'static str,
    category: &'static str,
    cents: i64,
    milks: &'static [&'static str],
    syrups: &'static [&'static str],
    sauces: &'static [&'static str],
}

const DRINKS: [SeedDrink; 5] = [
    SeedDrink {
        name: "Latte",
        description: "Espresso with steamed milk and a thin layer of foam.",
        category: "Espresso",
        cents: 450,
        milks: &["Whole", "Oat", "Almond"],
        syrups: &["Vanilla", "Caramel", "Hazelnut"],
        sauces: &["Mocha", "White Mocha"],
    },
    SeedDrink {
        name: "Americano",
        description: "Espresso shots topped with hot water.",
        category: "Espresso",
        cents: 325,
        milks: &[],
        syrups: &["Vanilla", "Caramel", "Hazelnut"],
        sauces: &[],
    },
    SeedDrink {
        name: "Drip Coffee",
        description: "Our house blend, brewed fresh every half hour.",
        category: "Brewed Coffee",
        cents: 250,
        milks: &["Whole", "Oat", "Almond"],
        syrups: &[],
        sauces: &[],
    },
    SeedDrink {
        name: "Cold Brew",
        description: "Steeped for twenty hours and served over ice.",
        category: "Brewed Coffee",
        cents: 400,
        milks: &["Whole", "Oat", "Almond"],
        syrups: &["Vanilla", "Caramel"],
        sauces: &[],
    },
    SeedDrink {
        name: "Chai Latte",
        description: "Spiced black tea concentrate with steamed milk.",
        category: "Tea",
        cents: 425,
        milks: &["Whole", "Oat", "Almond"],
        syrups: &[],
        sauces: &[],
    },
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        for name in CATEGORIES {
            category::ActiveModel {
                name: Set(name.to_owned()),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
        for (name, cents) in MILKS {
            milk::ActiveModel {
                name: Set(name.to_owned()),
                price: Set(Decimal::new(cents, 2)),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
        for (name, cents) in SYRUPS {
            syrup::ActiveModel {
                name: Set(name.to_owned()),
                price: Set(Decimal::new(cents, 2)),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
        for (name, cents) in SAUCES {
            sauce::ActiveModel {
                name: Set(name.to_owned()),
                price: Set(Decimal::new(cents, 2)),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }

        for seed in DRINKS {
            let category = category::Entity::find()
                .filter(category::Column::Name.eq(seed.category))
                .one(db)
                .await?
                .ok_or_else(|| DbErr::RecordNotFound(seed.category.to_owned()))?;

            let drink = drink::ActiveModel {
                name: Set(seed.name.to_owned()),
                description: Set(seed.description.to_owned()),
                base_price: Set(Decimal::new(seed.cents, 2)),
                category_id: Set(category.id),
                image_url: Set(None),
                available: Set(true),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(db)
            .await?;

            for milk in milk::Entity::find()
                .filter(milk::Column::Name.is_in(seed.milks.iter().copied()))
                .all(db)
                .await?
            {
                drink_milk::Entity::insert(drink_milk::ActiveModel {
                    drink_id: Set(drink.id),
                    milk_id: Set(milk.id),
                })
                .exec(db)
                .await?;
            }
            for syrup in syrup::Entity::find()
                .filter(syrup::Column::Name.is_in(seed.syrups.iter().copied()))
                .all(db)
                .await?
            {
                drink_syrup::Entity::insert(drink_syrup::ActiveModel {
                    drink_id: Set(drink.id),
                    syrup_id: Set(syrup.id),
                })
                .exec(db)
                .await?;
            }
            for sauce in sauce::Entity::find()
                .filter(sauce::Column::Name.is_in(seed.sauces.iter().copied()))
                .all(db)
                .await?
            {
                drink_sauce::Entity::insert(drink_sauce::ActiveModel {
                    drink_id: Set(drink.id),
                    sauce_id: Set(sauce.id),
                })
                .exec(db)
                .await?;
            }
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // Junction rows go with the drinks through ON DELETE CASCADE.
        drink::Entity::delete_many()
            .filter(drink::Column::Name.is_in(DRINKS.map(|seed| seed.name)))
            .exec(db)
            .await?;
        milk::Entity::delete_many()
            .filter(milk::Column::Name.is_in(MILKS.map(|(name, _)| name)))
            .exec(db)
            .await?;
        syrup::Entity::delete_many()
            .filter(syrup::Column::Name.is_in(SYRUPS.map(|(name, _)| name)))
            .exec(db)
            .await?;
        sauce::Entity::delete_many()
            .filter(sauce::Column::Name.is_in(SAUCES.map(|(name, _)| name)))
            .exec(db)
            .await?;
        category::Entity::delete_many()
            .filter(category::Column::Name.is_in(CATEGORIES))
            .exec(db)
            .await?;

        Ok(())
    }
}
