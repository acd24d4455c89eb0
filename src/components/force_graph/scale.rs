//! Zoom-dependent scaling configuration for graph visuals.
//!
//! This module centralizes every parameter that depends on the zoom level `k`, so
//! it is easy to see how labels, hit areas and strokes behave as the reader zooms.
//!
//! # Coordinate Spaces
//!
//! - **Simulation-space**: positions produced by the layout, centered on the origin.
//! - **Surface-space**: simulation-space shifted by half the surface size, so the
//!   origin lands in the middle of the canvas. Node radii and label offsets are
//!   expressed here.
//! - **Screen-space**: CSS pixels on the canvas, i.e. surface-space after the
//!   [`ViewTransform`](super::state::ViewTransform) (`screen = surface * k + t`).

/// Defines how a visual property scales with zoom level.
#[derive(Clone, Debug)]
pub enum ScaleBehavior {
	/// Constant surface-space size. Appears larger when zoomed in.
	World,
	/// Surface-space size, clamped so its on-screen size stays within bounds.
	Clamped { min_screen: f64, max_screen: f64 },
}

impl ScaleBehavior {
	/// Surface-space value for a base value at zoom level `k`.
	pub fn apply(&self, base: f64, k: f64) -> f64 {
		match self {
			ScaleBehavior::World => base,
			ScaleBehavior::Clamped {
				min_screen,
				max_screen,
			} => base.clamp(min_screen / k, max_screen / k),
		}
	}
}

/// Defines how alpha/opacity scales with zoom level.
#[derive(Clone, Debug)]
pub enum AlphaBehavior {
	/// Linear ramp: zero at `zero_alpha_k`, fully opaque at `full_alpha_k`.
	Fade {
		zero_alpha_k: f64,
		full_alpha_k: f64,
	},
}

impl AlphaBehavior {
	/// Alpha for zoom level `k`, always within `[0, 1]`.
	pub fn apply(&self, k: f64) -> f64 {
		match self {
			AlphaBehavior::Fade {
				zero_alpha_k,
				full_alpha_k,
			} => {
				if zero_alpha_k == full_alpha_k {
					return 1.0;
				}
				let t = (k - zero_alpha_k) / (full_alpha_k - zero_alpha_k);
				t.clamp(0.0, 1.0)
			}
		}
	}
}

/// Allowed range of the zoom factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomBounds {
	/// Smallest zoom factor.
	pub min: f64,
	/// Largest zoom factor.
	pub max: f64,
}

impl ZoomBounds {
	/// Clamps `k` into the range. Non-finite input falls back to `fallback`.
	pub fn clamp(&self, k: f64, fallback: f64) -> f64 {
		if k.is_finite() {
			k.clamp(self.min, self.max)
		} else {
			fallback.clamp(self.min, self.max)
		}
	}
}

impl Default for ZoomBounds {
	fn default() -> Self {
		Self { min: 0.25, max: 4.0 }
	}
}

/// Wheel-to-zoom conversion, matching the browser's delta modes.
#[derive(Clone, Debug)]
pub struct WheelConfig {
	/// Multiplier for `DOM_DELTA_PIXEL`.
	pub pixel: f64,
	/// Multiplier for `DOM_DELTA_LINE`.
	pub line: f64,
	/// Multiplier for `DOM_DELTA_PAGE`.
	pub page: f64,
	/// Extra factor when ctrl is held, which is how trackpads report pinches.
	pub pinch_boost: f64,
}

impl WheelConfig {
	/// Log2 of the zoom factor produced by one wheel event.
	pub fn delta(&self, delta_y: f64, delta_mode: u32, ctrl: bool) -> f64 {
		let unit = match delta_mode {
			1 => self.line,
			2 => self.page,
			_ => self.pixel,
		};
		let boost = if ctrl { self.pinch_boost } else { 1.0 };
		-delta_y * unit * boost
	}
}

/// Complete scale configuration for all graph elements.
#[derive(Clone, Debug)]
pub struct ScaleConfig {
	/// Zoom range.
	pub zoom: ZoomBounds,
	/// Opacity of idle labels as a function of `k * opacityScale`.
	pub label_alpha: AlphaBehavior,
	/// Gap between a node's rim and its label, in surface pixels.
	pub label_padding: f64,
	/// How the hover/drag hit radius scales with zoom.
	pub hit_behavior: ScaleBehavior,
	/// Edge stroke width.
	pub edge_width: f64,
	/// How the edge stroke scales with zoom.
	pub edge_behavior: ScaleBehavior,
	/// Gestures shorter than this (milliseconds) count as clicks.
	pub click_threshold_ms: f64,
	/// Minimum surface height in CSS pixels.
	pub min_height: f64,
	/// Wheel delta conversion.
	pub wheel: WheelConfig,
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			zoom: ZoomBounds::default(),
			label_alpha: AlphaBehavior::Fade {
				zero_alpha_k: 1.0,
				full_alpha_k: 4.75,
			},
			label_padding: 8.0,
			hit_behavior: ScaleBehavior::Clamped {
				min_screen: 6.0,
				max_screen: f64::INFINITY,
			},
			edge_width: 1.0,
			edge_behavior: ScaleBehavior::World,
			click_threshold_ms: 500.0,
			min_height: 250.0,
			wheel: WheelConfig {
				pixel: 0.002,
				line: 0.05,
				page: 1.0,
				pinch_boost: 10.0,
			},
		}
	}
}

/// Pre-computed scale values for a specific zoom level.
///
/// Create this once per frame and pass it to rendering functions.
#[derive(Clone, Debug)]
pub struct ScaledValues {
	/// Current zoom level.
	pub k: f64,
	/// Edge stroke width in surface-space.
	pub edge_width: f64,
	/// Opacity of labels that are neither hovered nor the focus.
	pub label_alpha: f64,
}

impl ScaledValues {
	/// Compute scaled values from configuration, zoom level and the label opacity multiplier.
	pub fn new(config: &ScaleConfig, k: f64, opacity_scale: f64) -> Self {
		Self {
			k,
			edge_width: config.edge_behavior.apply(config.edge_width, k),
			label_alpha: config.label_alpha.apply(k * opacity_scale),
		}
	}

	/// Hit radius in surface-space for a node of `radius`.
	pub fn hit_radius(config: &ScaleConfig, radius: f64, k: f64) -> f64 {
		config.hit_behavior.apply(radius, k)
	}
}
