//! Nutrition module
//!
//! Resolves pantry identifiers to per-serving nutrition through external food
//! databases, and aggregates household totals.

pub mod identifier;
pub mod normalize;
pub mod open_food_facts;
pub mod resolver;
pub mod totals;
pub mod transport;
pub mod usda;

pub use identifier::Identifier;
pub use resolver::{NotFound, NutritionSource, Resolver};
pub use totals::{
    compute_totals, summarize, PantrySummary, TotalsResult, DAILY_CALORIES_PER_PERSON,
    DEFAULT_FAMILY_SIZE,
};
pub use transport::{HttpFetch, ReqwestFetcher, SourceError};
