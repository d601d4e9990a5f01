pub use super::category::Entity as Category;
pub use super::drink::Entity as Drink;
pub use super::drink_milk::Entity as DrinkMilk;
pub use super::drink_sauce::Entity as DrinkSauce;
pub use super::drink_syrup::Entity as DrinkSyrup;
pub use super::inventory_log::Entity as InventoryLog;
pub use super::milk::Entity as Milk;
pub use super::order::Entity as Order;
pub use super::payroll::Entity as Payroll;
pub use super::processed_event::Entity as ProcessedEvent;
pub use super::review::Entity as Review;
pub use super::reward_redemption::Entity as RewardRedemption;
pub use super::role::Entity as Role;
pub use super::sauce::Entity as Sauce;
pub use super::shift::Entity as Shift;
pub use super::syrup::Entity as Syrup;
pub use super::temp_checkout::Entity as TempCheckout;
pub use super::user::Entity as User;
