//! Parameterised SQL fragments
//!
//! Every piece of SQL produced by the compiler travels together with the values
//! bound to its placeholders. Fragments are only ever combined through [`Sql`],
//! so the order of the parameters always matches the order in which their `?`
//! tokens appear in the text.

use crate::error::SearchError;

use std::{
	fmt,
	ops::{Add, AddAssign},
};

use sea_orm::{DbBackend, Statement, Value};

/// A SQL text fragment and the values bound to its placeholders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sql {
	text: String,
	params: Vec<Value>,
}

impl Sql {
	/// A fragment without placeholders
	pub fn raw(text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			params: Vec::new(),
		}
	}

	/// A fragment together with the values for its placeholders, in order
	pub fn bind<I, V>(text: impl Into<String>, values: I) -> Self
	where
		I: IntoIterator<Item = V>,
		V: Into<Value>,
	{
		Self {
			text: text.into(),
			params: values.into_iter().map(Into::into).collect(),
		}
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn params(&self) -> &[Value] {
		&self.params
	}

	pub fn is_empty(&self) -> bool {
		self.text.trim().is_empty()
	}

	pub fn push(&mut self, other: Sql) {
		self.text.push_str(&other.text);
		self.params.extend(other.params);
	}

	pub fn push_str(&mut self, text: &str) {
		self.text.push_str(text);
	}

	/// Joins fragments with a separator, keeping their parameters in order
	pub fn join(sep: &str, parts: impl IntoIterator<Item = Sql>) -> Sql {
		let mut out = Sql::default();
		for (i, part) in parts.into_iter().enumerate() {
			if i > 0 {
				out.push_str(sep);
			}
			out.push(part);
		}
		out
	}

	/// Surrounds this fragment with literal text
	pub fn wrap(self, prefix: &str, suffix: &str) -> Sql {
		let mut out = Sql::raw(prefix);
		out.push(self);
		out.push_str(suffix);
		out
	}

	/// `expr IN (?, ?, ...)` for a non-empty list of values
	pub fn in_list<I, V>(expr: &str, values: I) -> Sql
	where
		I: IntoIterator<Item = V>,
		V: Into<Value>,
	{
		let params: Vec<Value> = values.into_iter().map(Into::into).collect();
		Sql {
			text: format!("{expr} IN ({})", placeholders(params.len())),
			params,
		}
	}

	/// `(expr LIKE ? ESCAPE '\' OR ...)` matching any of the given prefixes
	pub fn like_any_prefix<'a>(expr: &str, prefixes: impl IntoIterator<Item = &'a str>) -> Sql {
		Sql::join(
			" OR ",
			prefixes.into_iter().map(|prefix| {
				Sql::bind(
					format!("{expr} LIKE ? ESCAPE '\\'"),
					[format!("{}%", escape_like(prefix))],
				)
			}),
		)
		.wrap("(", ")")
	}

	/// Number of `?` placeholders in the text, ignoring quoted literals and identifiers
	pub fn placeholder_count(&self) -> usize {
		let mut count = 0;
		let mut quote: Option<char> = None;
		for c in self.text.chars() {
			match (quote, c) {
				(None, '\'' | '"') => quote = Some(c),
				(Some(q), c) if c == q => quote = None,
				(None, '?') => count += 1,
				_ => {}
			}
		}
		count
	}

	/// Fails compilation when the text and its parameters disagree
	pub fn arity_check(&self) -> Result<(), SearchError> {
		let placeholders = self.placeholder_count();
		if placeholders != self.params.len() {
			return Err(SearchError::Compile(format!(
				"statement has {placeholders} placeholders but {} bound parameters",
				self.params.len()
			)));
		}
		Ok(())
	}

	pub fn into_parts(self) -> (String, Vec<Value>) {
		(self.text, self.params)
	}

	pub fn into_statement(self) -> Statement {
		Statement::from_sql_and_values(DbBackend::Sqlite, self.text, self.params)
	}
}

impl Add for Sql {
	type Output = Sql;

	fn add(mut self, rhs: Sql) -> Sql {
		self.push(rhs);
		self
	}
}

impl AddAssign for Sql {
	fn add_assign(&mut self, rhs: Sql) {
		self.push(rhs);
	}
}

impl From<&str> for Sql {
	fn from(text: &str) -> Self {
		Sql::raw(text)
	}
}

impl From<String> for Sql {
	fn from(text: String) -> Self {
		Sql::raw(text)
	}
}

impl fmt::Display for Sql {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.text)
	}
}

/// `?, ?, ?` with `n` placeholders
pub fn placeholders(n: usize) -> String {
	vec!["?"; n].join(", ")
}

/// Escapes `LIKE` wildcards so a value only ever matches literally
pub fn escape_like(value: &str) -> String {
	let mut out = String::with_capacity(value.len());
	for c in value.chars() {
		if matches!(c, '%' | '_' | '\\') {
			out.push('\\');
		}
		out.push(c);
	}
	out
}

/// Encodes a query vector the way the vector-distance functions read blobs
pub fn f32_blob(vector: &[f32]) -> Vec<u8> {
	vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}
