//! The resolved form of an [`Ai`](crate::Ai) answer.
//!
//! A [`Value`] behaves like the answer it holds: numeric answers support
//! arithmetic and comparison, lists iterate, and every variant renders
//! through [`Display`] for string contexts. Coercion from the model's raw
//! output happens once, when the deferred call resolves.

use std::{
	cmp::Ordering,
	collections::BTreeMap,
	fmt::{self, Display},
	ops::{Add, Div, Mul, Neg, Rem, Sub},
};

use clap::{builder::PossibleValue, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::{
	llm::RawAnswer,
	types::{AiError, Result},
};

/// The output kind requested from the model.
///
/// [`Text`](OutputKind::Text) goes through a plain completion; every other
/// kind forces a function call whose schema pins down the shape of the
/// answer.
#[derive(PartialEq, Eq, Clone, Debug, Copy, Default)]
pub enum OutputKind {
	#[default]
	Text,
	Int,
	Float,
	Bool,
	List,
	Map,
}

/// Clap value enum implementation for argument parsing.
impl ValueEnum for OutputKind {
	fn value_variants<'a>() -> &'a [Self] {
		&[Self::Text, Self::Int, Self::Float, Self::Bool, Self::List, Self::Map]
	}

	fn to_possible_value(&self) -> Option<PossibleValue> {
		Some(PossibleValue::new(self.name()))
	}
}

impl OutputKind {
	pub fn name(&self) -> &'static str {
		match self {
			Self::Text => "text",
			Self::Int => "int",
			Self::Float => "float",
			Self::Bool => "bool",
			Self::List => "list",
			Self::Map => "map",
		}
	}
}

/// A resolved answer.
///
/// Lists hold the answer's items as strings; maps hold string properties the
/// way the structured-output schema returns them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
	Int(i64),
	Float(f64),
	Bool(bool),
	Text(String),
	List(Vec<String>),
	Map(BTreeMap<String, String>),
}

/// Internal numeric view used by the operator impls.
enum Num {
	Int(i64),
	Float(f64),
}

impl Num {
	fn to_f64(&self) -> f64 {
		match self {
			Num::Int(i) => *i as f64,
			Num::Float(f) => *f,
		}
	}
}

fn coerce(wanted: &'static str, text: impl ToString) -> AiError {
	AiError::Coerce { wanted, text: text.to_string() }
}

fn json_to_string(value: serde_json::Value) -> String {
	match value {
		serde_json::Value::String(s) => s,
		other => other.to_string(),
	}
}

/// Liberal yes/no parsing for free-text boolean answers. Anything outside
/// these forms is a coercion error rather than a guess.
fn parse_truthy(text: &str) -> Option<bool> {
	match text.trim().trim_end_matches(['.', '!']).to_ascii_lowercase().as_str() {
		"true" | "yes" | "y" | "1" => Some(true),
		"false" | "no" | "n" | "0" => Some(false),
		_ => None,
	}
}

impl Value {
	/// Coerce the provider's raw output into the requested kind.
	pub(crate) fn from_raw(raw: RawAnswer, kind: OutputKind) -> Result<Value> {
		match raw {
			RawAnswer::Text(text) => Self::from_text(text, kind),
			RawAnswer::Structured(json) => Self::from_json(json, kind),
		}
	}

	fn from_text(text: String, kind: OutputKind) -> Result<Value> {
		match kind {
			OutputKind::Text => Ok(Value::Text(text)),
			OutputKind::Int =>
				text.trim().parse::<i64>().map(Value::Int).map_err(|_| coerce("int", &text)),
			OutputKind::Float =>
				text.trim().parse::<f64>().map(Value::Float).map_err(|_| coerce("float", &text)),
			OutputKind::Bool =>
				parse_truthy(&text).map(Value::Bool).ok_or_else(|| coerce("bool", &text)),
			OutputKind::List => {
				// A JSON array answer is taken as-is, anything else is read
				// as one item per non-empty line with bullet markers dropped.
				if let Ok(serde_json::Value::Array(items)) = serde_json::from_str(&text) {
					return Ok(Value::List(items.into_iter().map(json_to_string).collect()));
				}
				Ok(Value::List(
					text.lines()
						.map(|line| line.trim().trim_start_matches(['-', '*']).trim_start())
						.filter(|line| !line.is_empty())
						.map(str::to_string)
						.collect(),
				))
			},
			OutputKind::Map => serde_json::from_str::<BTreeMap<String, String>>(&text)
				.map(Value::Map)
				.map_err(|_| coerce("map", &text)),
		}
	}

	fn from_json(json: serde_json::Value, kind: OutputKind) -> Result<Value> {
		match kind {
			OutputKind::Text => Ok(Value::Text(json_to_string(json))),
			OutputKind::Int => json
				.as_i64()
				.or_else(|| json.as_str().and_then(|s| s.trim().parse().ok()))
				.map(Value::Int)
				.ok_or_else(|| coerce("int", json)),
			OutputKind::Float => json
				.as_f64()
				.or_else(|| json.as_str().and_then(|s| s.trim().parse().ok()))
				.map(Value::Float)
				.ok_or_else(|| coerce("float", json)),
			OutputKind::Bool => json
				.as_bool()
				.or_else(|| json.as_str().and_then(parse_truthy))
				.map(Value::Bool)
				.ok_or_else(|| coerce("bool", json)),
			OutputKind::List => match json {
				serde_json::Value::Array(items) =>
					Ok(Value::List(items.into_iter().map(json_to_string).collect())),
				other => Err(coerce("list", other)),
			},
			OutputKind::Map => match json {
				serde_json::Value::Object(object) => Ok(Value::Map(
					object.into_iter().map(|(key, value)| (key, json_to_string(value))).collect(),
				)),
				// The structured-output schema encodes a map as an array of
				// `{key, value}` pairs.
				serde_json::Value::Array(items) => Ok(Value::Map(
					items
						.into_iter()
						.filter_map(|item| {
							let key = json_to_string(item.get("key")?.clone());
							let value =
								item.get("value").cloned().map(json_to_string).unwrap_or_default();
							Some((key, value))
						})
						.collect(),
				)),
				other => Err(coerce("map", other)),
			},
		}
	}

	/// The [`OutputKind`] this value was resolved as.
	pub fn kind(&self) -> OutputKind {
		match self {
			Value::Text(_) => OutputKind::Text,
			Value::Int(_) => OutputKind::Int,
			Value::Float(_) => OutputKind::Float,
			Value::Bool(_) => OutputKind::Bool,
			Value::List(_) => OutputKind::List,
			Value::Map(_) => OutputKind::Map,
		}
	}

	/// Numeric view of the value, parsing numeric-looking text. Booleans
	/// count as 0/1.
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Value::Int(i) => Some(*i as f64),
			Value::Float(f) => Some(*f),
			Value::Bool(b) => Some(*b as i64 as f64),
			Value::Text(s) => s.trim().parse().ok(),
			_ => None,
		}
	}

	/// Integer view of the value. Floats truncate.
	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Value::Int(i) => Some(*i),
			Value::Float(f) => Some(*f as i64),
			Value::Bool(b) => Some(*b as i64),
			Value::Text(s) => s.trim().parse().ok(),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Bool(b) => Some(*b),
			Value::Text(s) => parse_truthy(s),
			_ => None,
		}
	}

	pub fn as_list(&self) -> Option<&[String]> {
		match self {
			Value::List(items) => Some(items),
			_ => None,
		}
	}

	pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
		match self {
			Value::Map(map) => Some(map),
			_ => None,
		}
	}

	/// # Panics
	///
	/// The operator impls go through this; a non-numeric operand panics with
	/// the offending operator and value.
	fn expect_num(&self, op: &str) -> Num {
		match self {
			Value::Int(i) => Num::Int(*i),
			Value::Float(f) => Num::Float(*f),
			Value::Bool(b) => Num::Int(*b as i64),
			Value::Text(s) =>
				if let Ok(i) = s.trim().parse::<i64>() {
					Num::Int(i)
				} else if let Ok(f) = s.trim().parse::<f64>() {
					Num::Float(f)
				} else {
					panic!("cannot apply `{}` to non-numeric answer {:?}", op, s)
				},
			other => panic!("cannot apply `{}` to non-numeric answer {}", op, other),
		}
	}
}

macro_rules! impl_value_arith {
	($trait:ident, $method:ident, $sym:literal) => {
		impl $trait for Value {
			type Output = Value;

			fn $method(self, rhs: Value) -> Value {
				match (self.expect_num($sym), rhs.expect_num($sym)) {
					(Num::Int(a), Num::Int(b)) => Value::Int(<i64 as $trait>::$method(a, b)),
					(a, b) => Value::Float(<f64 as $trait>::$method(a.to_f64(), b.to_f64())),
				}
			}
		}
	};
}

impl_value_arith!(Add, add, "+");
impl_value_arith!(Sub, sub, "-");
impl_value_arith!(Mul, mul, "*");
impl_value_arith!(Rem, rem, "%");

/// Division always yields a float, even for two integer operands.
impl Div for Value {
	type Output = Value;

	fn div(self, rhs: Value) -> Value {
		Value::Float(self.expect_num("/").to_f64() / rhs.expect_num("/").to_f64())
	}
}

impl Neg for Value {
	type Output = Value;

	fn neg(self) -> Value {
		match self.expect_num("-") {
			Num::Int(i) => Value::Int(-i),
			Num::Float(f) => Value::Float(-f),
		}
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Value::Text(a), Value::Text(b)) => a == b,
			(Value::Bool(a), Value::Bool(b)) => a == b,
			(Value::List(a), Value::List(b)) => a == b,
			(Value::Map(a), Value::Map(b)) => a == b,
			// Numbers compare across Int/Float, and numeric text joins in.
			_ => match (self.as_f64(), other.as_f64()) {
				(Some(a), Some(b)) => a == b,
				_ => false,
			},
		}
	}
}

impl PartialOrd for Value {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		match (self, other) {
			// Two texts compare numerically only when both parse; one
			// numeric-looking side does not pull the other into the numeric
			// arm, which would make the ordering asymmetric.
			(Value::Text(a), Value::Text(b)) => {
				match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
					(Ok(a), Ok(b)) => a.partial_cmp(&b),
					_ => a.partial_cmp(b),
				}
			},
			_ => match (self.as_f64(), other.as_f64()) {
				(Some(a), Some(b)) => a.partial_cmp(&b),
				_ => None,
			},
		}
	}
}

impl Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Text(s) => f.write_str(s),
			Value::Int(i) => write!(f, "{}", i),
			Value::Float(x) => write!(f, "{}", x),
			Value::Bool(b) => write!(f, "{}", b),
			Value::List(items) => f.write_str(&items.join(", ")),
			Value::Map(map) => {
				for (i, (key, value)) in map.iter().enumerate() {
					if i > 0 {
						f.write_str("\n")?;
					}
					write!(f, "{}: {}", key, value)?;
				}
				Ok(())
			},
		}
	}
}

/// Iterating an answer walks a list's items, a map's `key: value` entries,
/// or the single display form of a scalar.
impl IntoIterator for Value {
	type Item = String;
	type IntoIter = std::vec::IntoIter<String>;

	fn into_iter(self) -> Self::IntoIter {
		match self {
			Value::List(items) => items,
			Value::Map(map) =>
				map.into_iter().map(|(key, value)| format!("{}: {}", key, value)).collect(),
			other => vec![other.to_string()],
		}
		.into_iter()
	}
}
