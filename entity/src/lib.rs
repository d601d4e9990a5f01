//! Persisted entities of the café service.
//!
//! Every table is a plain sea-orm entity; the menu catalog links drinks to
//! their allowed customizations through the `drink_*` junction tables.

pub mod prelude;

pub mod category;
pub mod drink;
pub mod drink_milk;
pub mod drink_sauce;
pub mod drink_syrup;
pub mod inventory_log;
pub mod milk;
pub mod order;
pub mod payroll;
pub mod processed_event;
pub mod review;
pub mod reward_redemption;
pub mod role;
pub mod sauce;
pub mod sea_orm_active_enums;
pub mod shift;
pub mod syrup;
pub mod temp_checkout;
pub mod user;
