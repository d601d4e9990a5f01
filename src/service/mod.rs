//! Database operations behind the routes, grouped as `Query` and `Mutation`
//! per area.

pub mod catalog;
pub mod checkout;
pub mod dashboard;
pub mod inventory;
pub mod orders;
pub mod payroll;
pub mod reviews;
pub mod rewards;
pub mod shifts;
pub mod users;
