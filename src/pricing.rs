//! Turns a customer's cart into priced order lines.

use std::collections::{HashMap, HashSet};

use entity::{
    drink, milk,
    order::{DrinkSize, OrderItem, OrderItems},
    sauce, syrup,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_QUANTITY: i32 = 20;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PricingError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Quantity for drink {drink_id} must be between 1 and {max}, got {quantity}", max = MAX_QUANTITY)]
    Quantity { drink_id: i32, quantity: i32 },

    #[error("Drink {0} does not exist")]
    UnknownDrink(i32),

    #[error("{0} is currently unavailable")]
    Unavailable(String),

    #[error("{drink} does not offer {kind} {id}")]
    NotOffered {
        drink: String,
        kind: &'static str,
        id: i32,
    },

    #[error("{kind} {id} is listed twice for {drink}")]
    Duplicate {
        drink: String,
        kind: &'static str,
        id: i32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CartLine {
    pub drink_id: i32,
    #[serde(default)]
    pub size: DrinkSize,
    pub quantity: i32,
    #[serde(default)]
    pub milk_id: Option<i32>,
    #[serde(default)]
    pub syrup_ids: Vec<i32>,
    #[serde(default)]
    pub sauce_ids: Vec<i32>,
}

/// A drink together with the customizations it may be ordered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    #[serde(flatten)]
    pub drink: drink::Model,
    pub milks: Vec<milk::Model>,
    pub syrups: Vec<syrup::Model>,
    pub sauces: Vec<sauce::Model>,
}

pub fn size_upcharge(size: DrinkSize) -> Decimal {
    match size {
        DrinkSize::Small => Decimal::ZERO,
        DrinkSize::Medium => Decimal::new(50, 2),
        DrinkSize::Large => Decimal::new(100, 2),
    }
}

pub fn price_cart(
    lines: &[CartLine],
    menu: &HashMap<i32, MenuEntry>,
) -> Result<(OrderItems, Decimal), PricingError> {
    if lines.is_empty() {
        return Err(PricingError::EmptyCart);
    }

    let items = lines
        .iter()
        .map(|line| {
            let entry = menu
                .get(&line.drink_id)
                .ok_or(PricingError::UnknownDrink(line.drink_id))?;
            price_line(line, entry)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let total = items
        .iter()
        .map(|item| item.line_total)
        .sum::<Decimal>()
        .round_dp(2);

    Ok((OrderItems(items), total))
}

pub fn price_line(line: &CartLine, entry: &MenuEntry) -> Result<OrderItem, PricingError> {
    let drink = &entry.drink;

    if !(1..=MAX_QUANTITY).contains(&line.quantity) {
        return Err(PricingError::Quantity {
            drink_id: drink.id,
            quantity: line.quantity,
        });
    }
    if !drink.available {
        return Err(PricingError::Unavailable(drink.name.clone()));
    }

    let mut unit_price = drink.base_price + size_upcharge(line.size);

    let milk = match line.milk_id {
        Some(id) => {
            let milk = entry
                .milks
                .iter()
                .find(|m| m.id == id)
                .ok_or_else(|| not_offered(drink, "milk", id))?;
            unit_price += milk.price;
            Some(milk.name.clone())
        }
        None => None,
    };

    let syrups = pick(drink, "syrup", &line.syrup_ids, &entry.syrups, |s| (s.id, &s.name, s.price))?;
    let sauces = pick(drink, "sauce", &line.sauce_ids, &entry.sauces, |s| (s.id, &s.name, s.price))?;

    for (_, price) in syrups.iter().chain(sauces.iter()) {
        unit_price += *price;
    }

    let unit_price = unit_price.round_dp(2);

    Ok(OrderItem {
        drink_id: drink.id,
        drink_name: drink.name.clone(),
        size: line.size,
        quantity: line.quantity,
        milk,
        syrups: syrups.into_iter().map(|(name, _)| name).collect(),
        sauces: sauces.into_iter().map(|(name, _)| name).collect(),
        unit_price,
        line_total: (unit_price * Decimal::from(line.quantity)).round_dp(2),
    })
}

fn pick<'a, T, F>(
    drink: &drink::Model,
    kind: &'static str,
    ids: &[i32],
    offered: &'a [T],
    fields: F,
) -> Result<Vec<(String, Decimal)>, PricingError>
where
    F: Fn(&'a T) -> (i32, &'a String, Decimal),
{
    let mut seen = HashSet::new();
    ids.iter()
        .map(|&id| {
            if !seen.insert(id) {
                return Err(PricingError::Duplicate {
                    drink: drink.name.clone(),
                    kind,
                    id,
                });
            }
            offered
                .iter()
                .map(&fields)
                .find(|(offered_id, _, _)| *offered_id == id)
                .map(|(_, name, price)| (name.clone(), price))
                .ok_or_else(|| not_offered(drink, kind, id))
        })
        .collect()
}

fn not_offered(drink: &drink::Model, kind: &'static str, id: i32) -> PricingError {
    PricingError::NotOffered {
        drink: drink.name.clone(),
        kind,
        id,
    }
}
