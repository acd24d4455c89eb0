//! Canvas rendering for the force graph.
//!
//! A frame is drawn in two steps. [`build_scene`] turns the graph state into
//! flat lists of shapes in surface-space, and [`paint`] draws them under the view
//! transform. Layers are painted in a fixed order:
//! 1. Edges
//! 2. Nodes
//! 3. Labels

use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::scale::ScaledValues;
use super::state::{GraphState, ViewTransform};
use super::theme::Color;
use super::types::Point;

/// A straight edge between two node centers.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeShape {
	pub from: Point,
	pub to: Point,
	pub color: Color,
	pub width: f64,
}

/// A filled node circle.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeShape {
	pub center: Point,
	pub radius: f64,
	pub color: Color,
}

/// A node label, left-aligned and vertically centered on `at`.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelShape {
	pub text: String,
	pub at: Point,
	pub color: Color,
	/// CSS font shorthand at unit scale.
	pub font: String,
	pub scale: f64,
}

/// Everything drawn in one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
	pub transform: ViewTransform,
	pub edges: Vec<EdgeShape>,
	pub nodes: Vec<NodeShape>,
	pub labels: Vec<LabelShape>,
}

/// Builds the shapes of the current frame from the latest layout positions.
///
/// Nodes without a position, and edges touching one, are left out. Invisible
/// shapes are left out too.
pub fn build_scene(state: &GraphState) -> Scene {
	let positions = state.layout.positions();
	let half = state.half_size();
	let surface = |i: usize| {
		positions
			.get(i)
			.copied()
			.flatten()
			.map(|p| Point::new(p.x + half.x, p.y + half.y))
	};
	let scaled = ScaledValues::new(&state.scale, state.transform.k, state.config.opacity_scale);
	let pass = &state.pass;

	let edges = pass
		.edges()
		.iter()
		.zip(&pass.edge_states)
		.filter(|(_, s)| s.alpha > 0.0)
		.filter_map(|(edge, s)| {
			Some(EdgeShape {
				from: surface(edge.source)?,
				to: surface(edge.target)?,
				color: s.color.with_alpha(s.alpha * s.color.a),
				width: scaled.edge_width,
			})
		})
		.collect();

	let nodes = pass
		.nodes()
		.iter()
		.zip(&pass.node_states)
		.enumerate()
		.filter(|(_, (_, s))| s.alpha > 0.0)
		.filter_map(|(i, (node, s))| {
			Some(NodeShape {
				center: surface(i)?,
				radius: node.radius,
				color: s.color.with_alpha(s.alpha * s.color.a),
			})
		})
		.collect();

	let font_px = state.config.font_px();
	let family = &state.theme.label.font_family;
	let labels = pass
		.nodes()
		.iter()
		.zip(&pass.label_states)
		.enumerate()
		.filter(|(_, (_, s))| s.alpha > 0.0)
		.filter_map(|(i, (node, s))| {
			let center = surface(i)?;
			Some(LabelShape {
				text: node.text.clone(),
				at: Point::new(center.x + node.radius + state.scale.label_padding, center.y),
				color: s.color.with_alpha(s.alpha * s.color.a),
				font: format!(
					"{} {}px {}",
					if s.bold { "bold" } else { "normal" },
					font_px,
					family
				),
				scale: s.scale,
			})
		})
		.collect();

	Scene {
		transform: state.transform,
		edges,
		nodes,
		labels,
	}
}

/// Paints `scene` onto a surface of `width` × `height` CSS pixels whose backing
/// store is `dpr` times larger.
pub fn paint(scene: &Scene, ctx: &CanvasRenderingContext2d, width: f64, height: f64, dpr: f64) {
	let _ = ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
	ctx.clear_rect(0.0, 0.0, width, height);

	ctx.save();
	let t = &scene.transform;
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);

	draw_edges(ctx, &scene.edges);
	draw_nodes(ctx, &scene.nodes);
	draw_labels(ctx, &scene.labels);

	ctx.restore();
}

fn draw_edges(ctx: &CanvasRenderingContext2d, edges: &[EdgeShape]) {
	for edge in edges {
		ctx.set_stroke_style_str(&edge.color.to_css());
		ctx.set_line_width(edge.width);
		ctx.begin_path();
		ctx.move_to(edge.from.x, edge.from.y);
		ctx.line_to(edge.to.x, edge.to.y);
		ctx.stroke();
	}
}

fn draw_nodes(ctx: &CanvasRenderingContext2d, nodes: &[NodeShape]) {
	for node in nodes {
		ctx.begin_path();
		let _ = ctx.arc(node.center.x, node.center.y, node.radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&node.color.to_css());
		ctx.fill();
	}
}

fn draw_labels(ctx: &CanvasRenderingContext2d, labels: &[LabelShape]) {
	ctx.set_text_align("left");
	ctx.set_text_baseline("middle");
	for label in labels {
		ctx.save();
		let _ = ctx.translate(label.at.x, label.at.y);
		let _ = ctx.scale(label.scale, label.scale);
		ctx.set_font(&label.font);
		ctx.set_fill_style_str(&label.color.to_css());
		let _ = ctx.fill_text(&label.text, 0.0, 0.0);
		ctx.restore();
	}
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeSet;

	use super::*;
	use crate::components::force_graph::config::GraphConfig;
	use crate::components::force_graph::state::RenderPass;
	use crate::components::force_graph::theme::Theme;
	use crate::corpus::CorpusIndex;
	use crate::path::FullSlug;

	fn state() -> GraphState {
		let corpus = CorpusIndex::from_json(
			r#"{ "a": { "title": "Alpha", "links": ["b"] }, "b": { "links": ["c"] }, "c": {} }"#,
		)
		.unwrap();
		let config = GraphConfig::default();
		let hood = corpus.graph().neighborhood(&"a".into(), -1);
		let pass = RenderPass::build(&hood, &corpus, &BTreeSet::new(), &config, &Theme::default());
		GraphState::new(pass, config, Theme::default(), FullSlug::new("a"), 400.0, 300.0)
	}

	#[test]
	fn shapes_are_recentred_on_the_surface() {
		let state = state();
		let scene = build_scene(&state);
		let p = state.layout.position(0).unwrap();
		assert_eq!(scene.nodes[0].center, Point::new(p.x + 200.0, p.y + 150.0));
		assert_eq!(scene.edges.len(), 2);
		assert_eq!(scene.nodes.len(), 3);
	}

	#[test]
	fn only_the_focus_label_is_visible_initially() {
		let scene = build_scene(&state());
		assert_eq!(scene.labels.len(), 1);
		let label = &scene.labels[0];
		assert_eq!(label.text, "Alpha");
		assert_eq!(label.color, Theme::default().label.focus);
		assert!(label.font.starts_with("bold 9px"));
		let node = &scene.nodes[0];
		assert_eq!(label.at.x, node.center.x + node.radius + 8.0);
		assert_eq!(label.at.y, node.center.y);
	}

	#[test]
	fn node_colors_follow_focus_only() {
		let scene = build_scene(&state());
		let theme = Theme::default();
		assert_eq!(scene.nodes[0].color, theme.node.focus);
		assert!(scene.nodes[1..].iter().all(|n| n.color == theme.node.other));
	}

	#[test]
	fn faded_shapes_are_skipped() {
		let mut state = state();
		state.pass.edge_states[0].alpha = 0.0;
		state.pass.node_states[2].alpha = 0.0;
		let scene = build_scene(&state);
		assert_eq!(scene.edges.len(), 1);
		assert_eq!(scene.nodes.len(), 2);
	}

	#[test]
	fn edge_alpha_is_applied_to_color() {
		let mut state = state();
		state.pass.edge_states[1].alpha = 0.2;
		let scene = build_scene(&state);
		assert_eq!(scene.edges[1].color.a, 0.2);
		assert_eq!(scene.edges[1].width, 1.0);
	}
}
