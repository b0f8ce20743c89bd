use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::{AiError, Result};

lazy_static! {
	/// `{name}` placeholders. Only identifier-like names are substituted so
	/// that braces carrying other content (JSON snippets, doubled braces)
	/// pass through untouched.
	static ref PLACEHOLDER: Regex =
		Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid");
}

/// Replace `{name}` placeholders in `template` with values from `params`.
///
/// A placeholder missing from `params` is filled with `default` when one is
/// given, otherwise rendering fails with [`AiError::MissingParam`].
pub fn render(
	template: &str,
	params: &BTreeMap<String, String>,
	default: Option<&str>,
) -> Result<String> {
	let mut out = String::with_capacity(template.len());
	let mut last = 0;

	for caps in PLACEHOLDER.captures_iter(template) {
		let whole = caps.get(0).expect("capture 0 always present");
		let name = &caps[1];

		out.push_str(&template[last..whole.start()]);
		match params.get(name) {
			Some(value) => out.push_str(value),
			None => match default {
				Some(default) => out.push_str(default),
				None => return Err(AiError::MissingParam(name.to_string())),
			},
		}
		last = whole.end();
	}
	out.push_str(&template[last..]);

	Ok(out)
}
