use serde::Deserialize;

use super::error::ChartError;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Margin {
	pub top: f64,
	pub right: f64,
	pub bottom: f64,
	pub left: f64,
}

impl Default for Margin {
	fn default() -> Self {
		Self {
			top: 20.0,
			right: 90.0,
			bottom: 20.0,
			left: 90.0,
		}
	}
}

/// Every option the chart recognizes. Missing keys fall back to defaults,
/// so a host may pass `{}` or only the handful of values it cares about.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartConfig {
	/// Card width in chart units.
	pub node_width: f64,
	/// Card height in chart units.
	pub node_height: f64,
	/// Gap between neighbouring cards on a level.
	pub node_spacing: f64,
	/// Distance between two tree levels (or two rows on mobile).
	pub line_depth_y: f64,
	/// Node/edge transition length in milliseconds.
	pub animation_duration: f64,
	/// Offsets used when recentring a card on mobile and placing the root.
	pub margin: Margin,
	/// Card fill.
	pub background_color: String,
	/// Connector stroke.
	pub border_color: String,
	/// Name and header text.
	pub name_color: String,
	/// Job title text and link icon.
	pub title_color: String,
	/// Report count label and highlight border.
	pub reports_color: String,
	/// Follow window resizes when the chart is fullscreen.
	pub should_resize: bool,
	/// Viewport widths at or below this use the single-column mobile mode.
	pub mobile_breakpoint: f64,
	pub recenter_duration: f64,
	/// Levels left expanded when a dataset is first mounted.
	pub initial_depth: usize,
}

impl Default for ChartConfig {
	fn default() -> Self {
		Self {
			node_width: 240.0,
			node_height: 180.0,
			node_spacing: 12.0,
			line_depth_y: 120.0,
			animation_duration: 350.0,
			margin: Margin::default(),
			background_color: "#fff".into(),
			border_color: "#e2e8f0".into(),
			name_color: "#1e293b".into(),
			title_color: "#64748b".into(),
			reports_color: "#3b82f6".into(),
			should_resize: true,
			mobile_breakpoint: 460.0,
			recenter_duration: 500.0,
			initial_depth: 1,
		}
	}
}

impl ChartConfig {
	/// Reads a config from camelCase JSON; absent keys keep their defaults.
	pub fn from_json(json: &str) -> Result<Self, ChartError> {
		Ok(serde_json::from_str(json)?)
	}

	/// Lateral distance between neighbouring cards in the standard layout.
	pub fn sibling_distance(&self) -> f64 {
		self.node_width + self.node_spacing
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_json_keeps_defaults() {
		let config =
			ChartConfig::from_json(r#"{ "lineDepthY": 150, "margin": { "top": 40 } }"#).unwrap();
		assert_eq!(config.line_depth_y, 150.0);
		assert_eq!(config.margin.top, 40.0);
		assert_eq!(config.margin.left, 90.0);
		assert_eq!(config.node_width, 240.0);
		assert_eq!(config.sibling_distance(), 252.0);
	}

	#[test]
	fn rejects_wrong_types() {
		assert!(matches!(
			ChartConfig::from_json(r#"{ "nodeWidth": "wide" }"#),
			Err(ChartError::Data(_))
		));
	}
}
