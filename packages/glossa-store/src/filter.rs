use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
	Asc,
	Desc,
}

/// Typed filter expression over dotted document paths. Both the tenant
/// layer's "does this already constrain the org attribute" check and the
/// in-memory evaluation walk this structurally; no backend ever inspects
/// nested dynamic maps.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
	/// Matches every document.
	All,
	And(Vec<Filter>),
	Or(Vec<Filter>),
	Not(Box<Filter>),
	Eq { field: String, value: Value },
	In { field: String, values: Vec<Value> },
	/// Array field contains the given scalar.
	Contains { field: String, value: Value },
	/// Case-insensitive substring match on a string field.
	ContainsText { field: String, value: String },
	Exists { field: String },
	/// Field absent or JSON null.
	Missing { field: String },
	Gt { field: String, value: Value },
	Gte { field: String, value: Value },
	Lt { field: String, value: Value },
	Lte { field: String, value: Value },
}
impl Default for Filter {
	fn default() -> Self {
		Self::All
	}
}
impl Filter {
	pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
		Self::Eq { field: field.into(), value: value.into() }
	}

	pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
		Self::Contains { field: field.into(), value: value.into() }
	}

	pub fn contains_text(field: impl Into<String>, value: impl Into<String>) -> Self {
		Self::ContainsText { field: field.into(), value: value.into() }
	}

	pub fn missing(field: impl Into<String>) -> Self {
		Self::Missing { field: field.into() }
	}

	pub fn exists(field: impl Into<String>) -> Self {
		Self::Exists { field: field.into() }
	}

	pub fn not(filter: Filter) -> Self {
		Self::Not(Box::new(filter))
	}

	pub fn is_all(&self) -> bool {
		matches!(self, Self::All)
	}

	/// Whether any node of the expression names the given field, including
	/// fields nested under And/Or/Not arms. Dotted sub-paths of the field
	/// count as references too.
	pub fn references(&self, field: &str) -> bool {
		match self {
			Self::All => false,
			Self::And(nodes) | Self::Or(nodes) =>
				nodes.iter().any(|node| node.references(field)),
			Self::Not(node) => node.references(field),
			Self::Eq { field: f, .. }
			| Self::In { field: f, .. }
			| Self::Contains { field: f, .. }
			| Self::ContainsText { field: f, .. }
			| Self::Exists { field: f }
			| Self::Missing { field: f }
			| Self::Gt { field: f, .. }
			| Self::Gte { field: f, .. }
			| Self::Lt { field: f, .. }
			| Self::Lte { field: f, .. } =>
				f == field || f.strip_prefix(field).is_some_and(|rest| rest.starts_with('.')),
		}
	}

	/// In-memory semantics, shared by the testkit store and property tests.
	/// Mirrors the backend translation: comparisons against an absent path
	/// never match, so `Not` over them does.
	pub fn evaluate(&self, doc: &Value) -> bool {
		match self {
			Self::All => true,
			Self::And(nodes) => nodes.iter().all(|node| node.evaluate(doc)),
			Self::Or(nodes) => nodes.iter().any(|node| node.evaluate(doc)),
			Self::Not(node) => !node.evaluate(doc),
			Self::Eq { field, value } =>
				value_at_path(doc, field).is_some_and(|found| values_equal(found, value)),
			Self::In { field, values } => value_at_path(doc, field)
				.is_some_and(|found| values.iter().any(|value| values_equal(found, value))),
			Self::Contains { field, value } => value_at_path(doc, field)
				.and_then(Value::as_array)
				.is_some_and(|items| items.iter().any(|item| values_equal(item, value))),
			Self::ContainsText { field, value } => value_at_path(doc, field)
				.and_then(Value::as_str)
				.is_some_and(|text| text.to_lowercase().contains(&value.to_lowercase())),
			Self::Exists { field } =>
				value_at_path(doc, field).is_some_and(|found| !found.is_null()),
			Self::Missing { field } =>
				value_at_path(doc, field).is_none_or(Value::is_null),
			Self::Gt { field, value } => compare_at_path(doc, field, value)
				.is_some_and(|ordering| ordering == std::cmp::Ordering::Greater),
			Self::Gte { field, value } => compare_at_path(doc, field, value)
				.is_some_and(|ordering| ordering != std::cmp::Ordering::Less),
			Self::Lt { field, value } => compare_at_path(doc, field, value)
				.is_some_and(|ordering| ordering == std::cmp::Ordering::Less),
			Self::Lte { field, value } => compare_at_path(doc, field, value)
				.is_some_and(|ordering| ordering != std::cmp::Ordering::Greater),
		}
	}
}

/// Field assignments for `update_one`. `set` applies to matched documents;
/// `set_on_insert` only to a document created by an upsert.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Update {
	pub set: Vec<(String, Value)>,
	pub set_on_insert: Vec<(String, Value)>,
	pub upsert: bool,
}
impl Update {
	pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
		Self { set: vec![(field.into(), value.into())], ..Self::default() }
	}

	pub fn and_set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
		self.set.push((field.into(), value.into()));

		self
	}

	pub fn with_upsert(mut self) -> Self {
		self.upsert = true;

		self
	}

	pub fn touches(&self, field: &str) -> bool {
		self.set.iter().chain(self.set_on_insert.iter()).any(|(path, _)| path == field)
	}

	/// Applies the `set` assignments to an existing document in place.
	pub fn apply_to(&self, doc: &mut Value) {
		for (path, value) in &self.set {
			set_at_path(doc, path, value.clone());
		}
	}

	/// Builds the document an upsert inserts when nothing matched.
	pub fn build_insert_doc(&self) -> Value {
		let mut doc = Value::Object(serde_json::Map::new());

		for (path, value) in self.set.iter().chain(self.set_on_insert.iter()) {
			set_at_path(&mut doc, path, value.clone());
		}

		doc
	}
}

pub fn value_at_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
	let mut current = doc;

	for segment in path.split('.') {
		current = current.as_object()?.get(segment)?;
	}

	Some(current)
}

pub fn set_at_path(doc: &mut Value, path: &str, value: Value) {
	let mut current = doc;
	let segments: Vec<&str> = path.split('.').collect();

	for segment in &segments[..segments.len() - 1] {
		if !current.is_object() {
			*current = Value::Object(serde_json::Map::new());
		}

		let Some(map) = current.as_object_mut() else {
			return;
		};

		current = map.entry(segment.to_string()).or_insert(Value::Object(serde_json::Map::new()));
	}

	if !current.is_object() {
		*current = Value::Object(serde_json::Map::new());
	}
	if let Some(last) = segments.last()
		&& let Some(map) = current.as_object_mut()
	{
		map.insert((*last).to_string(), value);
	}
}

/// Equality with numeric coercion; 4 and 4.0 are the same rating.
pub fn values_equal(a: &Value, b: &Value) -> bool {
	match (a.as_f64(), b.as_f64()) {
		(Some(a), Some(b)) => a == b,
		_ => a == b,
	}
}

/// Orders two JSON scalars the way the backends do: numbers numerically,
/// strings lexicographically, anything else incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
	if let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) {
		return a.partial_cmp(&b);
	}
	if let (Some(a), Some(b)) = (a.as_str(), b.as_str()) {
		return Some(a.cmp(b));
	}

	None
}

fn compare_at_path(doc: &Value, path: &str, value: &Value) -> Option<std::cmp::Ordering> {
	compare_values(value_at_path(doc, path)?, value)
}

/// Multi-key document ordering for in-memory sorting; absent paths sort last
/// the way the backends order NULLS.
pub fn compare_documents(
	a: &Value,
	b: &Value,
	sort: &[(String, SortOrder)],
) -> std::cmp::Ordering {
	for (path, order) in sort {
		let ordering = match (value_at_path(a, path), value_at_path(b, path)) {
			(Some(left), Some(right)) =>
				compare_values(left, right).unwrap_or(std::cmp::Ordering::Equal),
			(Some(_), None) => std::cmp::Ordering::Greater,
			(None, Some(_)) => std::cmp::Ordering::Less,
			(None, None) => std::cmp::Ordering::Equal,
		};
		let ordering = match order {
			SortOrder::Asc => ordering,
			SortOrder::Desc => ordering.reverse(),
		};

		if ordering != std::cmp::Ordering::Equal {
			return ordering;
		}
	}

	std::cmp::Ordering::Equal
}
