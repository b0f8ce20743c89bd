//! The ingredient analyzer from the readme: list answers drive a loop, each
//! item feeds a yes/no question, and repeated prompts hit the session cache.

use std::error::Error;

use llm_value::Ai;

async fn analyze(food: &str) -> llm_value::Result<()> {
	println!("\nAnalyzing {food}:");

	for ingredient in Ai::new("ingredients of {food}").param("food", food).list().await? {
		let vegetarian = Ai::new("is {ingredient} vegetarian")
			.param("ingredient", ingredient.as_str())
			.check()
			.await?;

		println!("{} is {}", ingredient, if vegetarian { "vegetarian" } else { "not vegetarian" });
	}
	Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
	analyze("Hamburgers").await?;

	// Same prompts, so everything past the first pass is served from the
	// session cache.
	analyze("Cheeseburgers").await?;
	analyze("Cheeseburgers").await?;
	analyze("Cheeseburgers").await?;

	Ok(())
}
