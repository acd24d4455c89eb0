//! Node and edge records of one render pass.

use crate::path::DocumentId;

/// A 2D position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	/// The simulation origin.
	pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

	/// A point at `(x, y)`.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance to `other`.
	pub fn distance(self, other: Point) -> f64 {
		(self.x - other.x).hypot(self.y - other.y)
	}
}

/// A document drawn in the graph.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	/// Identity of the node.
	pub id: DocumentId,
	/// Label text: the document title, or its id when untitled.
	pub text: String,
	/// Tags of the document that survived the configured filters.
	pub tags: Vec<String>,
	/// Circle radius in surface pixels: `4 + sqrt(degree)`, ×1.2 for the focus.
	pub radius: f64,
	/// Whether this is the document being viewed.
	pub is_focus: bool,
	/// Whether the reader has opened this document before. Not reflected in color.
	pub visited: bool,
}

/// A link between two nodes of the same render pass, by node index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GraphEdge {
	pub source: usize,
	pub target: usize,
}

impl GraphEdge {
	/// Whether `node` is one of the endpoints.
	pub fn touches(&self, node: usize) -> bool {
		self.source == node || self.target == node
	}
}

/// Radius of a node with `degree` incident edges.
pub fn node_radius(degree: usize, is_focus: bool) -> f64 {
	let base = 4.0 + (degree as f64).sqrt();
	if is_focus { base * 1.2 } else { base }
}
