use std::fmt;

use serde::Deserialize;

/// Stable identifier of a person in the chart.
///
/// Host data may carry ids as JSON strings or numbers; both normalize to the
/// same textual form so lookups do not depend on how the record was written.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(from = "RawId")]
pub struct NodeId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
	Text(String),
	Number(i64),
}

impl From<RawId> for NodeId {
	fn from(raw: RawId) -> Self {
		match raw {
			RawId::Text(s) => Self(s),
			RawId::Number(n) => Self(n.to_string()),
		}
	}
}

impl NodeId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for NodeId {
	fn from(s: &str) -> Self {
		Self(s.to_owned())
	}
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Person {
	pub name: String,
	pub title: String,
	pub department: Option<String>,
	pub link: Option<String>,
	pub avatar: Option<String>,
	pub total_reports: Option<u32>,
}

/// One record of the personnel dataset as supplied by the host page.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
	/// String or number in JSON.
	pub id: NodeId,
	/// Card contents.
	#[serde(default)]
	pub person: Person,
	/// Set when the record has reports the client has not fetched yet.
	#[serde(default)]
	pub has_child: bool,
	/// Draw this card with the accent border.
	#[serde(default)]
	pub is_highlight: bool,
	/// Reports already known to the host, if any.
	#[serde(default)]
	pub children: Option<Vec<PersonRecord>>,
}

impl PersonRecord {
	/// A childless record with just a name and a title.
	pub fn new(id: impl Into<String>, name: impl Into<String>, title: impl Into<String>) -> Self {
		Self {
			id: NodeId::new(id),
			person: Person {
				name: name.into(),
				title: title.into(),
				..Person::default()
			},
			has_child: false,
			is_highlight: false,
			children: None,
		}
	}

	/// Attaches already-known reports.
	pub fn with_children(mut self, children: Vec<PersonRecord>) -> Self {
		self.children = Some(children);
		self
	}

	/// Marks the record as having reports the client must fetch.
	pub fn unfetched(mut self) -> Self {
		self.has_child = true;
		self
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn lerp(self, to: Point, t: f64) -> Point {
		Point {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
		}
	}
}
