//! Data models
//!
//! Rust structs representing database entities.

mod assignment;
mod meal;
mod nutrition;
mod plan;
mod shopping_list;
mod storage_item;

pub use assignment::{Assignment, AssignmentCreate, MealType};
pub use meal::{Meal, MealCreate};
pub use nutrition::NutrientRecord;
pub use plan::{Plan, PricedIngredient};
pub use shopping_list::ShoppingListEntry;
pub use storage_item::{InventoryItem, StorageItemCreate, StorageItemUpdate};
