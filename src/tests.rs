use std::collections::BTreeMap;

use serde_json::json;

use super::*;
use crate::mock::MockLlm;

fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
	pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn template_renders_params() {
	let rendered = template::render(
		"Which car from {brand} has the engine {engine}?",
		&params(&[("brand", "Ferrari"), ("engine", "V8")]),
		None,
	)
	.unwrap();

	assert_eq!(rendered, "Which car from Ferrari has the engine V8?");
}

#[test]
fn template_fills_missing_with_default() {
	let rendered =
		template::render("{brand} top speed is {speed}", &params(&[("brand", "Ferrari")]), Some("unknown"))
			.unwrap();

	assert_eq!(rendered, "Ferrari top speed is unknown");
}

#[test]
fn template_missing_param_errors() {
	let err = template::render("power of {power}", &BTreeMap::new(), None).unwrap_err();

	assert!(matches!(err, AiError::MissingParam(name) if name == "power"));
}

#[test]
fn template_leaves_non_identifier_braces() {
	let rendered = template::render("respond as {\"a\": 1} with {n}", &params(&[("n", "2")]), None)
		.unwrap();

	assert_eq!(rendered, "respond as {\"a\": 1} with 2");
}

#[test]
fn arithmetic_keeps_ints_and_promotes_mixed() {
	assert_eq!(Value::Int(13) * Value::Int(3), Value::Int(39));
	assert_eq!(Value::Int(13) + Value::Float(0.5), Value::Float(13.5));
	assert_eq!(Value::Int(7) % Value::Int(4), Value::Int(3));
	assert_eq!(-Value::Int(5), Value::Int(-5));
}

#[test]
fn division_always_floats() {
	assert_eq!(Value::Int(7) / Value::Int(2), Value::Float(3.5));
}

#[test]
fn numeric_text_joins_arithmetic() {
	assert_eq!(Value::Text("13".to_string()) * Value::Int(2), Value::Int(26));
	assert_eq!(Value::Text(" 2.5 ".to_string()) + Value::Int(1), Value::Float(3.5));
}

#[test]
fn comparisons_cross_int_and_float() {
	assert!(Value::Int(3) < Value::Float(3.5));
	assert!(Value::Float(3.0) == Value::Int(3));
	assert!(Value::Text("10".to_string()) > Value::Int(9));
	assert!(Value::Text("banana".to_string()) < Value::Text("cake".to_string()));
	assert!(Value::Text("banana".to_string()).partial_cmp(&Value::Int(1)).is_none());
	assert!(Value::Text("9".to_string()) < Value::Text("10".to_string()));
}

#[test]
fn text_comparisons_are_symmetric() {
	// A numeric-looking text against a non-numeric one orders lexically
	// from both sides.
	let number = Value::Text("10".to_string());
	let word = Value::Text("banana".to_string());

	assert_eq!(number.partial_cmp(&word), Some(std::cmp::Ordering::Less));
	assert_eq!(word.partial_cmp(&number), Some(std::cmp::Ordering::Greater));
}

#[test]
fn bools_join_arithmetic_as_zero_or_one() {
	assert_eq!(Value::Bool(true) + Value::Int(1), Value::Int(2));
	assert_eq!(Value::Bool(false) * Value::Float(3.5), Value::Float(0.0));
	assert!(Value::Bool(true) == Value::Int(1));
}

#[test]
#[should_panic(expected = "non-numeric answer")]
fn non_numeric_arithmetic_panics() {
	let _ = Value::Text("a cake".to_string()) + Value::Int(1);
}

#[test]
fn display_forms() {
	assert_eq!(Value::Text("Paris".to_string()).to_string(), "Paris");
	assert_eq!(Value::Float(2.2).to_string(), "2.2");
	assert_eq!(
		Value::List(vec!["bun".to_string(), "patty".to_string()]).to_string(),
		"bun, patty"
	);
	assert_eq!(
		Value::Map(params(&[("brand", "Ferrari"), ("engine", "V8")])).to_string(),
		"brand: Ferrari\nengine: V8"
	);
}

#[test]
fn iterating_values() {
	let items: Vec<String> =
		Value::List(vec!["bun".to_string(), "patty".to_string()]).into_iter().collect();
	assert_eq!(items, vec!["bun", "patty"]);

	let entries: Vec<String> =
		Value::Map(params(&[("brand", "Ferrari")])).into_iter().collect();
	assert_eq!(entries, vec!["brand: Ferrari"]);

	let single: Vec<String> = Value::Int(42).into_iter().collect();
	assert_eq!(single, vec!["42"]);
}

#[test]
fn truthy_text_forms() {
	assert_eq!(Value::Text("Yes".to_string()).as_bool(), Some(true));
	assert_eq!(Value::Text("no.".to_string()).as_bool(), Some(false));
	assert_eq!(Value::Text("maybe".to_string()).as_bool(), None);
}

#[test]
fn structured_map_folds_key_value_pairs() {
	let raw = RawAnswer::Structured(json!([
		{ "key": "brand", "value": "Ferrari" },
		{ "key": "power", "value": "562 hp" },
	]));

	let value = Value::from_raw(raw, OutputKind::Map).unwrap();
	assert_eq!(value.as_map().unwrap().get("power").unwrap(), "562 hp");
}

#[tokio::test]
async fn untyped_resolve_returns_text() {
	let llm = MockLlm::text("Paris");
	let ai = Ai::new("What is the capital of France?")
		.llm(llm.clone())
		.cache_scope(CacheScope::Instance);

	assert_eq!(ai.resolve().await.unwrap(), Value::Text("Paris".to_string()));
	assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn repeats_are_served_from_cache() {
	let llm = MockLlm::text("Paris");
	let ai = Ai::new("What is the capital of France?")
		.llm(llm.clone())
		.cache_scope(CacheScope::Instance);

	for _ in 0..3 {
		assert_eq!(ai.text().await.unwrap(), "Paris");
	}
	assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn tags_and_metadata_reach_the_backend() {
	let llm = MockLlm::text("Paris");
	Ai::new("What is the capital of France?")
		.tag("silly-questions")
		.meta("caller", "tests")
		.llm(llm.clone())
		.cache_scope(CacheScope::Instance)
		.text()
		.await
		.unwrap();

	let requests = llm.requests();
	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].tags, vec!["ai-call", "silly-questions"]);
	assert_eq!(requests[0].metadata.get("caller").unwrap(), "tests");
}

#[tokio::test]
async fn caching_disabled_always_prompts() {
	let llm = MockLlm::text("Paris");
	let ai = Ai::new("What is the capital of France?").llm(llm.clone()).caching(false);

	ai.text().await.unwrap();
	ai.text().await.unwrap();
	assert_eq!(llm.call_count(), 2);
}

#[tokio::test]
async fn session_cache_is_shared_between_instances() {
	// Unique prompt so the process-wide session cache starts cold.
	let prompt = format!("capital of {}?", uuid::Uuid::new_v4());
	let llm = MockLlm::text("Paris");

	let first = Ai::new(&prompt).llm(llm.clone());
	let second = Ai::new(&prompt).llm(llm.clone());

	assert_eq!(first.text().await.unwrap(), "Paris");
	assert_eq!(second.text().await.unwrap(), "Paris");
	assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn typed_int_answer() {
	let llm = MockLlm::structured(json!(1_400_000_000));
	let ai = Ai::new("What is the population of India?")
		.llm(llm.clone())
		.cache_scope(CacheScope::Instance);

	assert_eq!(ai.int().await.unwrap(), 1_400_000_000);
}

#[tokio::test]
async fn sticky_kind_keeps_first_concrete_use() {
	let llm = MockLlm::structured(json!(1_400_000_000));
	let ai = Ai::new("What is the population of India?")
		.llm(llm.clone())
		.cache_scope(CacheScope::Instance);

	assert_eq!(ai.int().await.unwrap(), 1_400_000_000);

	// Untyped use now keeps the integer form, straight from cache.
	assert_eq!(ai.resolve().await.unwrap(), Value::Int(1_400_000_000));
	assert_eq!(llm.call_count(), 1);

	// A typed accessor overrides and re-asks under the new kind.
	assert_eq!(ai.text().await.unwrap(), "1400000000");
	assert_eq!(llm.call_count(), 2);
}

#[tokio::test]
async fn typed_list_answer_iterates() {
	let llm = MockLlm::structured(json!(["bun", "patty", "cheese"]));
	let ai = Ai::new("ingredients of Cheeseburgers")
		.llm(llm.clone())
		.cache_scope(CacheScope::Instance);

	let ingredients = ai.list().await.unwrap();
	assert_eq!(ingredients, vec!["bun", "patty", "cheese"]);
}

#[tokio::test]
async fn map_answer_feeds_params() {
	let llm = MockLlm::structured(json!([
		{ "key": "brand", "value": "Ferrari" },
		{ "key": "engine", "value": "V8" },
	]));
	let properties = Ai::new("Detailed exact properties of a Ferrari model 458")
		.llm(llm)
		.cache_scope(CacheScope::Instance)
		.map()
		.await
		.unwrap();

	let follow_up = MockLlm::text("the 458");
	let answer = Ai::new("Which car from {brand} has the engine {engine}?")
		.params(properties)
		.llm(follow_up.clone())
		.cache_scope(CacheScope::Instance)
		.text()
		.await
		.unwrap();

	assert_eq!(answer, "the 458");
	assert_eq!(follow_up.prompts(), vec!["Which car from Ferrari has the engine V8?"]);
}

#[tokio::test]
async fn text_that_is_not_a_number_errors() {
	let llm = MockLlm::text("quite a lot");
	let ai = Ai::new("How many lbs in a kg?").llm(llm).cache_scope(CacheScope::Instance);

	let err = ai.int().await.unwrap_err();
	assert!(matches!(err, AiError::Coerce { wanted: "int", .. }));
}

#[tokio::test]
async fn concurrent_resolution_prompts_once() {
	let llm = MockLlm::text("Paris");
	let ai = Ai::new("What is the capital of France?")
		.llm(llm.clone())
		.cache_scope(CacheScope::Instance);

	let (a, b) = futures::future::join(ai.resolve(), ai.resolve()).await;
	assert_eq!(a.unwrap(), Value::Text("Paris".to_string()));
	assert_eq!(b.unwrap(), Value::Text("Paris".to_string()));
	assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn empty_prompt_errors() {
	let ai = Ai::new("  ").llm(MockLlm::text("nothing"));
	assert!(matches!(ai.resolve().await.unwrap_err(), AiError::MissingPrompt));
}

#[tokio::test]
async fn prefer_int_numeric_default() {
	let llm = MockLlm::structured(json!(13));
	let ai = Ai::new("bakers dozen")
		.llm(llm.clone())
		.cache_scope(CacheScope::Instance)
		.prefer_int(true);

	assert_eq!(ai.num().await.unwrap(), Value::Int(13));

	let llm = MockLlm::structured(json!(13));
	let ai = Ai::new("bakers dozen").llm(llm).cache_scope(CacheScope::Instance);
	assert_eq!(ai.num().await.unwrap(), Value::Float(13.0));
}

#[tokio::test]
async fn file_cache_roundtrip() {
	let dir = tempfile::tempdir().unwrap();
	let store = FileCache::new(dir.path().join("cache.json"));

	store.put("a", &Value::Int(42)).await.unwrap();
	store.put("b", &Value::List(vec!["bun".to_string()])).await.unwrap();

	assert_eq!(store.get("a").await.unwrap(), Some(Value::Int(42)));
	assert_eq!(store.get("b").await.unwrap(), Some(Value::List(vec!["bun".to_string()])));
	assert_eq!(store.get("missing").await.unwrap(), None);
}

#[tokio::test]
async fn file_cache_is_shared_between_runs() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("cache.json");

	let llm = MockLlm::structured(json!(2));
	let first = Ai::new("How many lbs in a kg?")
		.llm(llm.clone())
		.cache_scope(CacheScope::Path(path.clone()));
	assert_eq!(first.int().await.unwrap(), 2);
	assert_eq!(llm.call_count(), 1);

	// A fresh instance with an unscripted backend must be served from disk.
	let offline = MockLlm::scripted(vec![]);
	let second = Ai::new("How many lbs in a kg?")
		.llm(offline.clone())
		.cache_scope(CacheScope::Path(path));
	assert_eq!(second.int().await.unwrap(), 2);
	assert_eq!(offline.call_count(), 0);
}

#[tokio::test]
async fn chat_renders_history_into_transcript() {
	let llm = MockLlm::scripted(vec![
		RawAnswer::Text("Hello there".to_string()),
		RawAnswer::Text("I said hello".to_string()),
	]);
	let mut chat = Chat::new().llm(llm.clone()).cache_scope(CacheScope::Instance);

	assert_eq!(chat.say("hi").await.unwrap(), "Hello there");
	assert_eq!(chat.say("what did you say?").await.unwrap(), "I said hello");
	assert_eq!(chat.exchanges().len(), 2);

	let prompts = llm.prompts();
	assert_eq!(prompts[0], "Question: hi\nAnswer: ");
	assert_eq!(
		prompts[1],
		"Question: hi\nAnswer: Hello there\nQuestion: what did you say?\nAnswer: "
	);
}

#[tokio::test]
async fn chat_custom_labels() {
	let llm = MockLlm::text("Beep boop");
	let mut chat = Chat::with_labels("Human", "Robot")
		.llm(llm.clone())
		.cache_scope(CacheScope::Instance);

	chat.say("hello robot").await.unwrap();
	assert_eq!(llm.prompts(), vec!["Human: hello robot\nRobot: "]);
}

#[test]
fn langsmith_project_sets_tracing_environment() {
	set_langsmith_project("ai-quick-builder");

	assert_eq!(std::env::var("LANGCHAIN_PROJECT").unwrap(), "ai-quick-builder");
	assert_eq!(std::env::var("LANGCHAIN_TRACING_V2").unwrap(), "true");
}
