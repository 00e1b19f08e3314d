use std::path::Path;

use anyhow::Result;

use crate::core::AppConfig;
use crate::food::{FoodScanClient, FoodScanRequest};

pub async fn run(config: &AppConfig, image: &Path) -> Result<()> {
    let request = FoodScanRequest::from_file(image)?;
    let nutrition = FoodScanClient::new(config).scan(&request).await?;

    println!("{} ({})", nutrition.food_name, nutrition.serving_size);
    println!("  Calories: {:.0} kcal", nutrition.calories);
    println!(
        "  Protein {:.1}g, carbs {:.1}g, fat {:.1}g, fiber {:.1}g",
        nutrition.protein_g, nutrition.carbs_g, nutrition.fat_g, nutrition.fiber_g
    );
    if !nutrition.confidence.is_empty() {
        println!("  Confidence: {}", nutrition.confidence);
    }
    if let Some(tips) = nutrition.tips {
        println!("\nTip: {}", tips);
    }

    Ok(())
}
