//! Per-container graph configuration.
//!
//! Each graph container carries its settings as JSON in a `data-cfg` attribute.
//! Every field is required: without the force parameters there is nothing to lay
//! out, so a missing or malformed value aborts the render pass.

use serde::Deserialize;

use crate::error::{GraphError, Result};

/// Settings for one graph container.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphConfig {
	/// Whether nodes can be dragged. When disabled, a click navigates.
	pub drag: bool,
	/// Whether wheel, pinch and background drag change the view.
	pub zoom: bool,
	/// Neighborhood radius in hops; negative shows the whole corpus.
	pub depth: i32,
	/// Label scale divisor: labels render at `1 / scale`.
	pub scale: f64,
	/// Multiplier for node repulsion.
	pub repel_force: f64,
	/// Strength of the pull toward the center of the surface.
	pub center_force: f64,
	/// Rest length of a link.
	pub link_distance: f64,
	/// Label font size, in units of 15px.
	pub font_size: f64,
	/// Multiplier applied to the zoom level before deriving label opacity.
	pub opacity_scale: f64,
	/// Tags never attached to graph nodes.
	pub remove_tags: Vec<String>,
	/// Whether tags are shown.
	pub show_tags: bool,
	/// Whether hovering a node dims every node it is not linked to.
	pub focus_on_hover: bool,
}

impl GraphConfig {
	/// Parses and validates the JSON found in a container's `data-cfg` attribute.
	pub fn from_json(raw: &str) -> Result<Self> {
		let config: Self =
			serde_json::from_str(raw).map_err(|e| GraphError::Config(e.to_string()))?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<()> {
		let finite = [
			("scale", self.scale),
			("repelForce", self.repel_force),
			("centerForce", self.center_force),
			("linkDistance", self.link_distance),
			("fontSize", self.font_size),
			("opacityScale", self.opacity_scale),
		];
		if let Some((name, _)) = finite.iter().find(|(_, v)| !v.is_finite()) {
			return Err(GraphError::Config(format!("{name} must be a finite number")));
		}
		if self.scale <= 0.0 {
			return Err(GraphError::Config("scale must be positive".into()));
		}
		if self.opacity_scale < 0.0 || self.font_size < 0.0 || self.link_distance < 0.0 {
			return Err(GraphError::Config(
				"opacityScale, fontSize and linkDistance must not be negative".into(),
			));
		}
		Ok(())
	}

	/// Scale applied to every label that is not hovered.
	pub fn label_scale(&self) -> f64 {
		1.0 / self.scale
	}

	/// Label font size in CSS pixels, before label scaling.
	pub fn font_px(&self) -> f64 {
		self.font_size * 15.0
	}

	/// Whether `tag` may be shown on a node.
	pub fn keeps_tag(&self, tag: &str) -> bool {
		!self.remove_tags.iter().any(|t| t == tag)
	}
}

impl Default for GraphConfig {
	/// The settings of the inline graph in a stock site.
	fn default() -> Self {
		Self {
			drag: true,
			zoom: true,
			depth: 1,
			scale: 1.1,
			repel_force: 0.5,
			center_force: 0.3,
			link_distance: 30.0,
			font_size: 0.6,
			opacity_scale: 1.0,
			remove_tags: Vec::new(),
			show_tags: true,
			focus_on_hover: false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const STOCK: &str = r#"{
		"drag": true, "zoom": true, "depth": 1, "scale": 1.1,
		"repelForce": 0.5, "centerForce": 0.3, "linkDistance": 30,
		"fontSize": 0.6, "opacityScale": 1, "removeTags": ["draft"],
		"showTags": true, "focusOnHover": false
	}"#;

	#[test]
	fn parses_camel_case_attribute() {
		let config = GraphConfig::from_json(STOCK).unwrap();
		assert_eq!(config.depth, 1);
		assert_eq!(config.link_distance, 30.0);
		assert_eq!(config.remove_tags, vec!["draft".to_string()]);
		assert!(!config.keeps_tag("draft"));
		assert!(config.keeps_tag("rust"));
	}

	#[test]
	fn missing_field_is_fatal() {
		let err = GraphConfig::from_json(r#"{"drag": true}"#).unwrap_err();
		assert!(matches!(err, GraphError::Config(_)));
	}

	#[test]
	fn rejects_non_positive_scale() {
		let raw = STOCK.replace("\"scale\": 1.1", "\"scale\": 0");
		assert!(matches!(GraphConfig::from_json(&raw), Err(GraphError::Config(_))));
	}

	#[test]
	fn derived_label_metrics() {
		let config = GraphConfig::default();
		assert!((config.label_scale() - 1.0 / 1.1).abs() < 1e-12);
		assert!((config.font_px() - 9.0).abs() < 1e-12);
	}
}
