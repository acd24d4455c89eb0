//! Visual theming for the force graph.
//!
//! The site styles itself with CSS custom properties that change with the light/dark
//! toggle. The canvas cannot resolve those at draw time, so a [`Theme`] snapshot is
//! taken once per render pass and handed down to the renderer.

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	/// Opaque color.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Color with alpha in `[0, 1]`.
	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Same color with alpha `a`.
	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Parses a CSS color string.
	/// Supports hex (`#RGB`, `#RRGGBB`) and `rgb()`/`rgba()` functional notation.
	pub fn parse(color_str: &str) -> Option<Color> {
		let s = color_str.trim();
		if let Some(hex) = s.strip_prefix('#') {
			let channel = |i: usize, len: usize| {
				let digits = hex.get(i * len..(i + 1) * len)?;
				let v = u8::from_str_radix(digits, 16).ok()?;
				Some(if len == 1 { v * 17 } else { v })
			};
			return match hex.len() {
				3 => Some(Color::rgb(channel(0, 1)?, channel(1, 1)?, channel(2, 1)?)),
				6 => Some(Color::rgb(channel(0, 2)?, channel(1, 2)?, channel(2, 2)?)),
				_ => None,
			};
		}
		if s.starts_with("rgb") {
			let nums: Vec<&str> = s
				.trim_start_matches("rgba(")
				.trim_start_matches("rgb(")
				.trim_end_matches(')')
				.split(',')
				.map(str::trim)
				.collect();
			let r = nums.first()?.parse().ok()?;
			let g = nums.get(1)?.parse().ok()?;
			let b = nums.get(2)?.parse().ok()?;
			let a = nums.get(3).and_then(|s| s.parse().ok()).unwrap_or(1.0);
			return Some(Color::rgba(r, g, b, a));
		}
		None
	}

	/// CSS notation: hex when opaque, `rgba()` otherwise.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Node fill colors.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeStyle {
	/// Fill of the document being viewed.
	pub focus: Color,
	/// Fill of every other document, visited or not.
	pub other: Color,
}

/// Edge stroke colors.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeStyle {
	/// Stroke before any hover happened (the site's `--lightgray`).
	pub initial: Color,
	/// Stroke of edges touching the hovered node.
	pub active: Color,
	/// Stroke of the remaining edges once hover state has been evaluated.
	pub idle: Color,
}

/// Label text style.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelStyle {
	/// Text color of the focus label.
	pub focus: Color,
	/// Text color of every other label.
	pub other: Color,
	/// Font family (the site's `--bodyFont`).
	pub font_family: String,
}

/// Complete visual theme of one render pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
	pub node: NodeStyle,
	pub edge: EdgeStyle,
	pub label: LabelStyle,
}

impl Theme {
	/// Builds a snapshot from the site's CSS custom properties.
	///
	/// `lookup` receives property names such as `--lightgray` and returns their
	/// computed value; blank or unparsable values keep the defaults.
	pub fn from_css_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
		let mut theme = Self::default();
		let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

		if let Some(color) = value("--lightgray").as_deref().and_then(Color::parse) {
			theme.edge.initial = color;
		}
		if let Some(font) = value("--bodyFont") {
			theme.label.font_family = font.trim().to_string();
		}
		theme
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self {
			node: NodeStyle {
				focus: Color::rgb(0x4a, 0x90, 0xe2),
				other: Color::rgb(0xa0, 0xa0, 0xa0),
			},
			edge: EdgeStyle {
				initial: Color::rgb(0xe5, 0xe5, 0xe5),
				active: Color::rgb(0xb0, 0xb0, 0xb0),
				idle: Color::rgb(0xd8, 0xd8, 0xd8),
			},
			label: LabelStyle {
				focus: Color::rgb(0x4a, 0x90, 0xe2),
				other: Color::rgb(0x88, 0x88, 0x88),
				font_family: "sans-serif".to_string(),
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_hex_and_functional_colors() {
		assert_eq!(Color::parse("#4A90E2"), Some(Color::rgb(74, 144, 226)));
		assert_eq!(Color::parse(" #fff "), Some(Color::rgb(255, 255, 255)));
		assert_eq!(Color::parse("rgba(1, 2, 3, 0.5)"), Some(Color::rgba(1, 2, 3, 0.5)));
		assert_eq!(Color::parse("rgb(57,54,57)"), Some(Color::rgb(57, 54, 57)));
		assert_eq!(Color::parse("var(--x)"), None);
		assert_eq!(Color::parse("#12345"), None);
	}

	#[test]
	fn css_output_round_trips_opaque_hex() {
		assert_eq!(Color::rgb(0xd8, 0xd8, 0xd8).to_css(), "#d8d8d8");
		assert_eq!(Color::rgb(1, 2, 3).with_alpha(0.2).to_css(), "rgba(1, 2, 3, 0.2)");
	}

	#[test]
	fn snapshot_reads_site_variables() {
		let theme = Theme::from_css_vars(|name| match name {
			"--lightgray" => Some(" #393639".to_string()),
			"--bodyFont" => Some("\"Source Sans Pro\", sans-serif".to_string()),
			_ => None,
		});
		assert_eq!(theme.edge.initial, Color::rgb(0x39, 0x36, 0x39));
		assert_eq!(theme.label.font_family, "\"Source Sans Pro\", sans-serif");
		assert_eq!(theme.node, Theme::default().node);
	}

	#[test]
	fn blank_variables_keep_defaults() {
		let theme = Theme::from_css_vars(|_| Some("  ".to_string()));
		assert_eq!(theme, Theme::default());
	}
}
