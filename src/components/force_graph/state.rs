//! Graph state of one mounted view.
//!
//! A [`RenderPass`] is the immutable node and edge set chosen for a page plus the
//! mutable per-object render state the transitions write to. [`GraphState`] owns
//! a render pass together with its layout, the view transform and the gesture
//! state the interaction controller works on.

use std::collections::{BTreeSet, HashMap};

use crate::corpus::CorpusIndex;
use crate::path::{DocumentId, FullSlug};

use super::config::GraphConfig;
use super::layout::{LayoutEngine, LayoutParams};
use super::neighborhood::Neighborhood;
use super::scale::{ScaleConfig, ScaledValues};
use super::theme::{Color, Theme};
use super::transition::{Concern, Property, TransitionGroup, Transitions};
use super::types::{GraphEdge, GraphNode, Point, node_radius};

/// Fixed simulation step per animation frame, in seconds.
pub const SIM_DT: f64 = 0.016;
/// Alpha of nodes and edges not connected to the hovered node.
pub const INACTIVE_ALPHA: f64 = 0.2;
/// Extra scale of the hovered node's label.
pub const HOVER_LABEL_SCALE: f64 = 1.1;

/// Mutable appearance of a node or edge.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderState {
	pub color: Color,
	/// Opacity in `[0, 1]`.
	pub alpha: f64,
	/// Whether the object is part of the hovered node's neighborhood.
	pub active: bool,
}

/// Mutable appearance of a node's label.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelState {
	/// Opacity in `[0, 1]`.
	pub alpha: f64,
	/// Text scale relative to the configured font size.
	pub scale: f64,
	pub color: Color,
	/// Whether the label is drawn in bold, as the focus label is.
	pub bold: bool,
}

/// Nodes and edges drawn for one page, and their current appearance.
#[derive(Clone, Debug)]
pub struct RenderPass {
	nodes: Vec<GraphNode>,
	edges: Vec<GraphEdge>,
	index: HashMap<DocumentId, usize>,
	/// Per node, parallel to [`RenderPass::nodes`].
	pub node_states: Vec<RenderState>,
	/// Per node label, parallel to [`RenderPass::nodes`].
	pub label_states: Vec<LabelState>,
	/// Per edge, parallel to [`RenderPass::edges`].
	pub edge_states: Vec<RenderState>,
}

impl RenderPass {
	/// Builds the render pass for `neighborhood`, whose first node is the focus.
	pub fn build(
		neighborhood: &Neighborhood,
		corpus: &CorpusIndex,
		visited: &BTreeSet<DocumentId>,
		config: &GraphConfig,
		theme: &Theme,
	) -> Self {
		let index: HashMap<DocumentId, usize> = neighborhood
			.nodes
			.iter()
			.enumerate()
			.map(|(i, id)| (id.clone(), i))
			.collect();

		let edges: Vec<GraphEdge> = neighborhood
			.edges
			.iter()
			.filter_map(|e| {
				Some(GraphEdge {
					source: *index.get(&e.source)?,
					target: *index.get(&e.target)?,
				})
			})
			.collect();

		let mut degree = vec![0usize; neighborhood.nodes.len()];
		for edge in &edges {
			degree[edge.source] += 1;
			if edge.target != edge.source {
				degree[edge.target] += 1;
			}
		}

		let nodes: Vec<GraphNode> = neighborhood
			.nodes
			.iter()
			.enumerate()
			.map(|(i, id)| {
				let details = corpus.details(id);
				let is_focus = i == 0;
				let tags = match details {
					Some(d) if config.show_tags => d
						.tags
						.iter()
						.filter(|t| config.keeps_tag(t))
						.cloned()
						.collect(),
					_ => Vec::new(),
				};
				GraphNode {
					id: id.clone(),
					text: details
						.and_then(|d| d.title.clone())
						.unwrap_or_else(|| id.to_string()),
					tags,
					radius: node_radius(degree[i], is_focus),
					is_focus,
					visited: visited.contains(id),
				}
			})
			.collect();

		let label_scale = config.label_scale();
		let node_states = nodes
			.iter()
			.map(|n| RenderState {
				color: if n.is_focus { theme.node.focus } else { theme.node.other },
				alpha: 1.0,
				active: false,
			})
			.collect();
		let label_states = nodes
			.iter()
			.map(|n| LabelState {
				alpha: if n.is_focus { 1.0 } else { 0.0 },
				scale: label_scale,
				color: if n.is_focus { theme.label.focus } else { theme.label.other },
				bold: n.is_focus,
			})
			.collect();
		let edge_states = edges
			.iter()
			.map(|_| RenderState {
				color: theme.edge.initial,
				alpha: 1.0,
				active: false,
			})
			.collect();

		Self {
			nodes,
			edges,
			index,
			node_states,
			label_states,
			edge_states,
		}
	}

	/// Nodes in breadth-first order; the focus comes first.
	pub fn nodes(&self) -> &[GraphNode] {
		&self.nodes
	}

	/// Edges between nodes of this pass.
	pub fn edges(&self) -> &[GraphEdge] {
		&self.edges
	}

	/// Index of the node for `id`.
	pub fn index_of(&self, id: &DocumentId) -> Option<usize> {
		self.index.get(id).copied()
	}

	/// Recomputes which nodes and edges belong to the hovered node's neighborhood.
	pub fn set_active(&mut self, hovered: Option<usize>) {
		for state in &mut self.node_states {
			state.active = false;
		}
		for (edge, state) in self.edges.iter().zip(&mut self.edge_states) {
			state.active = hovered.is_some_and(|h| edge.touches(h));
			if state.active {
				self.node_states[edge.source].active = true;
				self.node_states[edge.target].active = true;
			}
		}
		if let Some(state) = hovered.and_then(|h| self.node_states.get_mut(h)) {
			state.active = true;
		}
	}
}

/// Pan and zoom of the view: `screen = surface * k + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	/// Zoom factor, kept within [`ZoomBounds`](super::scale::ZoomBounds).
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

/// An in-progress node drag.
#[derive(Clone, Debug, PartialEq)]
pub struct DragState {
	pub node: usize,
	/// Pointer position when the drag started, in screen-space.
	pub start: Point,
	/// Node position when the drag started, in simulation-space.
	pub node_start: Point,
	pub started_at_ms: f64,
}

/// An in-progress background pan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PanState {
	pub active: bool,
	pub start: Point,
	pub transform_start: Point,
	/// Whether the pointer moved since the press.
	pub moved: bool,
	/// Node under the pointer at press time, when clicks navigate.
	pub pressed_node: Option<usize>,
}

/// An in-progress two-finger pinch.
#[derive(Clone, Debug, PartialEq)]
pub struct PinchState {
	pub start_distance: f64,
	pub start_k: f64,
}

/// The hovered node and the label opacity it had before hover.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HoverState {
	pub hovered: Option<usize>,
	pub saved_label_alpha: f64,
}

/// Everything one mounted graph view needs between frames.
pub struct GraphState {
	pub pass: RenderPass,
	pub layout: LayoutEngine,
	pub transitions: Transitions,
	pub transform: ViewTransform,
	pub drag: Option<DragState>,
	pub pan: PanState,
	pub pinch: Option<PinchState>,
	pub hover: HoverState,
	/// Surface size in CSS pixels.
	pub width: f64,
	pub height: f64,
	pub theme: Theme,
	pub config: GraphConfig,
	pub scale: ScaleConfig,
	/// Page the graph is shown on; navigation targets are resolved against it.
	pub slug: FullSlug,
}

impl GraphState {
	/// Lays out `pass` on a `width` × `height` surface, unzoomed.
	pub fn new(
		pass: RenderPass,
		config: GraphConfig,
		theme: Theme,
		slug: FullSlug,
		width: f64,
		height: f64,
	) -> Self {
		let layout = LayoutEngine::new(
			pass.nodes().iter().map(|n| n.radius).collect(),
			pass.edges().iter().map(|e| (e.source, e.target)).collect(),
			LayoutParams::from(&config),
		);
		Self {
			pass,
			layout,
			transitions: Transitions::default(),
			transform: ViewTransform::default(),
			drag: None,
			pan: PanState::default(),
			pinch: None,
			hover: HoverState::default(),
			width,
			height,
			theme,
			config,
			scale: ScaleConfig::default(),
			slug,
		}
	}

	/// Advances the layout by one frame and the transitions by `dt_ms`.
	pub fn tick(&mut self, dt_ms: f64) {
		self.layout.step(SIM_DT);
		self.transitions.advance(dt_ms, &mut self.pass);
	}

	/// Offset from simulation-space to surface-space.
	pub fn half_size(&self) -> Point {
		Point::new(self.width / 2.0, self.height / 2.0)
	}

	/// Converts a screen-space point into simulation-space.
	pub fn screen_to_graph(&self, screen: Point) -> Point {
		let half = self.half_size();
		let t = &self.transform;
		Point::new(
			(screen.x - t.x) / t.k - half.x,
			(screen.y - t.y) / t.k - half.y,
		)
	}

	/// Converts a simulation-space point into screen-space.
	pub fn graph_to_screen(&self, graph: Point) -> Point {
		let half = self.half_size();
		let t = &self.transform;
		Point::new(
			(graph.x + half.x) * t.k + t.x,
			(graph.y + half.y) * t.k + t.y,
		)
	}

	/// Topmost node under a screen-space point.
	pub fn node_at_position(&self, screen: Point) -> Option<usize> {
		let at = self.screen_to_graph(screen);
		let k = self.transform.k;
		self.layout
			.positions()
			.into_iter()
			.enumerate()
			.filter_map(|(i, p)| Some((i, p?)))
			.filter(|&(i, p)| {
				let radius = ScaledValues::hit_radius(&self.scale, self.pass.nodes()[i].radius, k);
				p.distance(at) < radius
			})
			.map(|(i, _)| i)
			.last()
	}

	/// Moves hover to `node`. Returns whether the hovered node changed.
	///
	/// Leaving a node restores the label opacity it had when it was entered.
	pub fn set_hover(&mut self, node: Option<usize>) -> bool {
		if self.hover.hovered == node {
			return false;
		}
		if let Some(prev) = self.hover.hovered {
			self.pass.label_states[prev].alpha = self.hover.saved_label_alpha;
		}
		if let Some(next) = node {
			self.hover.saved_label_alpha = self.pass.label_states[next].alpha;
		}
		self.hover.hovered = node;
		self.pass.set_active(node);
		true
	}

	/// Restarts the node, edge and label transitions toward the current hover state.
	pub fn restart_transitions(&mut self) {
		let hovered = self.hover.hovered;

		let mut nodes = TransitionGroup::new(Concern::Hover);
		for (i, state) in self.pass.node_states.iter().enumerate() {
			let alpha = match hovered {
				Some(_) if self.config.focus_on_hover && !state.active => INACTIVE_ALPHA,
				_ => 1.0,
			};
			nodes = nodes.to(Property::NodeAlpha(i), alpha);
		}

		let mut links = TransitionGroup::new(Concern::Link);
		for (i, state) in self.pass.edge_states.iter_mut().enumerate() {
			let alpha = match hovered {
				Some(_) if !state.active => INACTIVE_ALPHA,
				_ => 1.0,
			};
			state.color = if state.active {
				self.theme.edge.active
			} else {
				self.theme.edge.idle
			};
			links = links.to(Property::EdgeAlpha(i), alpha);
		}

		let rest_scale = self.config.label_scale();
		let mut labels = TransitionGroup::new(Concern::Label);
		for (i, state) in self.pass.label_states.iter().enumerate() {
			let (alpha, scale) = if hovered == Some(i) {
				(1.0, rest_scale * HOVER_LABEL_SCALE)
			} else {
				(state.alpha, rest_scale)
			};
			labels = labels
				.to(Property::LabelAlpha(i), alpha)
				.to(Property::LabelScale(i), scale);
		}

		self.transitions.start(nodes, &self.pass);
		self.transitions.start(links, &self.pass);
		self.transitions.start(labels, &self.pass);
	}

	/// Applies the zoom-dependent opacity to every label outside the hovered
	/// neighborhood. The focus label stays fully visible.
	pub fn refresh_label_alpha(&mut self) {
		let alpha =
			ScaledValues::new(&self.scale, self.transform.k, self.config.opacity_scale).label_alpha;
		for ((node, state), label) in self
			.pass
			.nodes
			.iter()
			.zip(&self.pass.node_states)
			.zip(&mut self.pass.label_states)
		{
			if !state.active {
				label.alpha = if node.is_focus { 1.0 } else { alpha };
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::neighborhood::LinkEdge;

	fn corpus() -> CorpusIndex {
		CorpusIndex::from_json(
			r#"{
				"a": { "title": "Alpha", "tags": ["keep", "drop"], "links": ["b"] },
				"b": { "links": ["c"] },
				"c": {}
			}"#,
		)
		.unwrap()
	}

	fn state_for(focus: &str, config: GraphConfig) -> GraphState {
		let corpus = corpus();
		let hood = corpus.graph().neighborhood(&focus.into(), config.depth);
		let pass = RenderPass::build(
			&hood,
			&corpus,
			&BTreeSet::from([DocumentId::from("c")]),
			&config,
			&Theme::default(),
		);
		GraphState::new(pass, config, Theme::default(), FullSlug::new(focus), 400.0, 300.0)
	}

	#[test]
	fn render_pass_resolves_nodes_and_edges() {
		let config = GraphConfig {
			remove_tags: vec!["drop".into()],
			..GraphConfig::default()
		};
		let state = state_for("b", config);
		let pass = &state.pass;
		let ids: Vec<&str> = pass.nodes().iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, vec!["b", "a", "c"]);
		assert_eq!(pass.nodes()[1].text, "Alpha");
		assert_eq!(pass.nodes()[0].text, "b");
		assert_eq!(pass.nodes()[1].tags, vec!["keep".to_string()]);
		assert!(pass.nodes()[2].visited);
		assert!(pass.nodes()[0].is_focus);
		assert!((pass.nodes()[0].radius - (4.0 + 2f64.sqrt()) * 1.2).abs() < 1e-12);
		assert_eq!(pass.edges().len(), 2);
		for e in pass.edges() {
			assert!(e.source < 3 && e.target < 3);
		}
	}

	#[test]
	fn edges_never_leave_the_pass() {
		let corpus = CorpusIndex::from_json(
			r#"{
				"hub": { "links": ["x", "y", "gone"] },
				"x": { "links": ["far"] },
				"y": { "links": ["x"] },
				"far": { "links": ["farther"] },
				"farther": {}
			}"#,
		)
		.unwrap();
		for (focus, depth) in [("hub", 1), ("x", 1), ("far", 0), ("farther", 2), ("y", -1)] {
			let hood = corpus.graph().neighborhood(&focus.into(), depth);
			let pass = RenderPass::build(
				&hood,
				&corpus,
				&BTreeSet::new(),
				&GraphConfig::default(),
				&Theme::default(),
			);
			let n = pass.nodes().len();
			assert_eq!(n, hood.nodes.len());
			assert!(pass.edges().iter().all(|e| e.source < n && e.target < n));
			for e in &hood.edges {
				assert!(hood.contains(&e.source) && hood.contains(&e.target));
			}
		}
	}

	#[test]
	fn hidden_tags_are_dropped() {
		let config = GraphConfig {
			show_tags: false,
			..GraphConfig::default()
		};
		let state = state_for("a", config);
		assert!(state.pass.nodes()[0].tags.is_empty());
	}

	#[test]
	fn initial_appearance() {
		let state = state_for("b", GraphConfig::default());
		let theme = Theme::default();
		let pass = &state.pass;
		assert_eq!(pass.node_states[0].color, theme.node.focus);
		assert_eq!(pass.node_states[2].color, theme.node.other);
		assert_eq!(pass.label_states[0].alpha, 1.0);
		assert!(pass.label_states[0].bold);
		assert_eq!(pass.label_states[1].alpha, 0.0);
		assert!(pass.edge_states.iter().all(|e| e.color == theme.edge.initial));
	}

	#[test]
	fn hover_marks_neighbors_active() {
		let mut state = state_for("b", GraphConfig::default());
		assert!(state.set_hover(Some(1)));
		let active: Vec<bool> = state.pass.node_states.iter().map(|s| s.active).collect();
		assert_eq!(active, vec![true, true, false]);
		let edge_active: Vec<bool> = state.pass.edge_states.iter().map(|s| s.active).collect();
		assert_eq!(edge_active.iter().filter(|a| **a).count(), 1);
		assert!(!state.set_hover(Some(1)));
		state.set_hover(None);
		assert!(state.pass.node_states.iter().all(|s| !s.active));
	}

	fn hovered(corpus: &str, focus: &str, config: GraphConfig, hover: &str) -> GraphState {
		let corpus = CorpusIndex::from_json(corpus).unwrap();
		let hood = corpus.graph().neighborhood(&focus.into(), config.depth);
		let pass = RenderPass::build(&hood, &corpus, &BTreeSet::new(), &config, &Theme::default());
		let mut state = GraphState::new(pass, config, Theme::default(), FullSlug::new(focus), 400.0, 300.0);
		let target = state.pass.index_of(&hover.into()).unwrap();
		assert!(state.set_hover(Some(target)));
		state.restart_transitions();
		for _ in 0..20 {
			state.tick(16.0);
		}
		state
	}

	const WITH_LONE: &str = r#"{ "a": { "links": ["b"] }, "b": {}, "lone": {} }"#;

	#[test]
	fn hovered_node_without_edges_is_active() {
		let config = GraphConfig {
			depth: -1,
			focus_on_hover: true,
			..GraphConfig::default()
		};
		let state = hovered(WITH_LONE, "a", config, "lone");
		let lone = state.pass.index_of(&"lone".into()).unwrap();
		assert!(state.pass.node_states[lone].active);
		assert_eq!(state.pass.node_states[lone].alpha, 1.0);
		assert_eq!(state.pass.node_states.iter().filter(|s| s.active).count(), 1);
		assert!(state.pass.edge_states.iter().all(|s| !s.active));
	}

	#[test]
	fn focus_on_hover_dims_the_rest() {
		let config = GraphConfig {
			depth: -1,
			focus_on_hover: true,
			..GraphConfig::default()
		};
		let state = hovered(WITH_LONE, "a", config, "b");
		for (node, s) in state.pass.nodes().iter().zip(&state.pass.node_states) {
			let want = if node.id.as_str() == "lone" { INACTIVE_ALPHA } else { 1.0 };
			assert!((s.alpha - want).abs() < 1e-9, "{}: {}", node.id, s.alpha);
		}
	}

	#[test]
	fn nodes_stay_opaque_without_focus_on_hover() {
		let config = GraphConfig {
			depth: -1,
			..GraphConfig::default()
		};
		let state = hovered(WITH_LONE, "a", config, "b");
		assert!(state.pass.node_states.iter().all(|s| s.alpha == 1.0));
		let edge = &state.pass.edge_states[0];
		assert!(edge.active);
		assert_eq!(edge.alpha, 1.0);
	}

	#[test]
	fn self_link_counts_once_and_lights_up_on_hover() {
		let state = hovered(
			r#"{ "a": { "links": ["a", "b"] }, "b": {} }"#,
			"a",
			GraphConfig::default(),
			"a",
		);
		let pass = &state.pass;
		assert_eq!(pass.edges().len(), 2);
		assert!((pass.nodes()[0].radius - (4.0 + 2f64.sqrt()) * 1.2).abs() < 1e-12);
		assert!((pass.nodes()[1].radius - 5.0).abs() < 1e-12);
		assert!(pass.edge_states.iter().all(|s| s.active));
	}

	#[test]
	fn leaving_a_node_restores_its_label() {
		let mut state = state_for("b", GraphConfig::default());
		state.set_hover(Some(2));
		state.pass.label_states[2].alpha = 1.0;
		state.set_hover(None);
		assert_eq!(state.pass.label_states[2].alpha, 0.0);
	}

	#[test]
	fn coordinate_round_trip() {
		let mut state = state_for("b", GraphConfig::default());
		state.transform = ViewTransform { x: 15.0, y: -5.0, k: 2.0 };
		let p = Point::new(12.5, -7.0);
		let back = state.screen_to_graph(state.graph_to_screen(p));
		assert!(back.distance(p) < 1e-9);
		assert_eq!(
			state.screen_to_graph(Point::new(415.0, 295.0)),
			Point::new(0.0, 0.0)
		);
	}

	#[test]
	fn zoom_ramp_skips_focus_and_active_labels() {
		let mut state = state_for("b", GraphConfig::default());
		state.set_hover(Some(1));
		state.pass.label_states[1].alpha = 1.0;
		state.transform.k = 2.875;
		state.refresh_label_alpha();
		assert_eq!(state.pass.label_states[0].alpha, 1.0);
		assert_eq!(state.pass.label_states[1].alpha, 1.0);
		assert!((state.pass.label_states[2].alpha - 0.5).abs() < 1e-12);
	}

	#[test]
	fn single_document_pass() {
		let corpus = corpus();
		let hood = Neighborhood {
			nodes: vec!["ghost".into()],
			edges: vec![LinkEdge::new("ghost", "a")],
		};
		let pass = RenderPass::build(
			&hood,
			&corpus,
			&BTreeSet::new(),
			&GraphConfig::default(),
			&Theme::default(),
		);
		assert_eq!(pass.nodes().len(), 1);
		assert!(pass.edges().is_empty());
		assert_eq!(pass.index_of(&"ghost".into()), Some(0));
	}
}
