use anyhow::Result;

use crate::core::AppConfig;
use crate::diet::{DietPlanClient, DietPlanOutcome, DietPlanRequest};

pub async fn run(config: &AppConfig, request: DietPlanRequest) -> Result<()> {
    let client = DietPlanClient::new(config);

    match client.generate(&request).await? {
        DietPlanOutcome::Plan(plan) => {
            println!("Daily calories: {:.0} kcal\n", plan.daily_calories);
            for meal in plan.meals.iter() {
                println!(
                    "{} ({}) - {:.0} kcal, {:.0}g protein",
                    meal.name, meal.time, meal.calories, meal.protein_g
                );
                println!("  Ingredients: {}", meal.ingredients.join(", "));
                println!("  {}\n", meal.recipe);
            }
            if !plan.shopping_list.is_empty() {
                println!("Shopping list:");
                for item in plan.shopping_list.iter() {
                    println!("  - {}", item);
                }
            }
            if let Some(notes) = plan.notes {
                println!("\nNotes: {}", notes);
            }
        }
        DietPlanOutcome::Raw(text) => println!("{}", text),
    }

    Ok(())
}
