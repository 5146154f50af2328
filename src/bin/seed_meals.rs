//! Replace the meal library with the starter meals

use larder::config::AppConfig;
use larder::models::{Meal, MealCreate};

const STARTER_MEALS: &[(&str, &[&str])] = &[
    ("Spaghetti", &["spaghetti noodles", "tomato sauce", "ground beef"]),
    ("Tacos", &["taco shells", "ground beef", "lettuce", "cheese"]),
    ("Chicken Salad", &["chicken breast", "lettuce", "ranch dressing"]),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    let db_path = config.database_path;
    println!("Database path: {}", db_path.display());

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = larder::db::Database::new(&db_path)?;

    // Run migrations
    database.with_conn(|conn| {
        larder::db::migrations::run_migrations(conn)?;
        Ok(())
    })?;

    // Replace the library in one transaction
    database.with_transaction(|tx| {
        let removed = Meal::delete_all(tx)?;
        println!("Removed {} existing meal(s)", removed);

        for (name, ingredients) in STARTER_MEALS {
            let meal = Meal::create(
                tx,
                &MealCreate {
                    name: name.to_string(),
                    ingredients: ingredients.iter().map(|i| i.to_string()).collect(),
                },
            )?;
            println!("  {} ({}): {}", meal.name, meal.id, meal.ingredients.join(", "));
        }
        Ok(())
    })?;

    println!("Seeded {} meals", STARTER_MEALS.len());
    Ok(())
}
