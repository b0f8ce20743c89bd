//! Ask a single question from the command line.
//!
//! ```sh
//! cargo run --example ask -- "How many lbs in a kg?" --output float
//! ```

use std::error::Error;

use clap::Parser;
use llm_value::{Ai, Model, OutputKind};
use tracing::Level;
use tracing_subscriber::fmt;

#[derive(Parser, Debug)]
struct Args {
	/// The question to ask. `{name}` placeholders are supported via --param.
	prompt: String,
	/// Output kind to request from the model.
	#[arg(long, value_enum, default_value = "text")]
	output: OutputKind,
	/// Chat model to use.
	#[arg(long, value_enum, default_value = "gpt-3.5-turbo")]
	model: Model,
	/// Sampling temperature.
	#[arg(long, default_value_t = 0.75)]
	temperature: f32,
	/// `name=value` placeholder assignments.
	#[arg(long)]
	param: Vec<String>,
	/// Log level
	#[arg(long, default_value = "info")]
	log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
	let args = Args::parse();

	let subscriber = fmt::Subscriber::builder().with_max_level(args.log_level).finish();
	tracing::subscriber::set_global_default(subscriber)?;

	let mut ai = Ai::new(&args.prompt)
		.output(args.output)
		.model(args.model)
		.temperature(args.temperature);

	for assignment in &args.param {
		let (name, value) = assignment
			.split_once('=')
			.ok_or_else(|| format!("bad --param {assignment:?}, expected name=value"))?;
		ai = ai.param(name, value);
	}

	println!("{}", ai.resolve().await?);
	Ok(())
}
