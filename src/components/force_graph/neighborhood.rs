//! Link graph of the whole corpus and the neighborhood selected for rendering.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::path::DocumentId;

/// A directed link as authored in the source document.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LinkEdge {
	/// Linking document.
	pub source: DocumentId,
	/// Linked document.
	pub target: DocumentId,
}

impl LinkEdge {
	/// Builds an edge from anything convertible into document ids.
	pub fn new(source: impl Into<DocumentId>, target: impl Into<DocumentId>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
		}
	}
}

/// Every known document and every valid link between them.
#[derive(Clone, Debug, Default)]
pub struct LinkGraph {
	documents: BTreeSet<DocumentId>,
	edges: Vec<LinkEdge>,
	adjacency: HashMap<DocumentId, Vec<DocumentId>>,
}

impl LinkGraph {
	/// Builds the graph from each document's outbound links.
	///
	/// Links to unknown documents are dropped, and a source lists a given target at
	/// most once. A document linking to itself keeps that link.
	pub fn from_outbound<'a, I, L>(documents: I) -> Self
	where
		I: IntoIterator<Item = (&'a DocumentId, L)>,
		L: IntoIterator<Item = &'a DocumentId>,
	{
		let outbound: Vec<(&DocumentId, L)> = documents.into_iter().collect();
		let known: BTreeSet<DocumentId> = outbound.iter().map(|(id, _)| (*id).clone()).collect();

		let mut edges = Vec::new();
		for (source, links) in outbound {
			let mut seen = HashSet::new();
			for target in links {
				if !known.contains(target) || !seen.insert(target) {
					continue;
				}
				edges.push(LinkEdge::new(source.clone(), target.clone()));
			}
		}

		let mut adjacency: HashMap<DocumentId, Vec<DocumentId>> = HashMap::new();
		for edge in &edges {
			adjacency
				.entry(edge.source.clone())
				.or_default()
				.push(edge.target.clone());
			adjacency
				.entry(edge.target.clone())
				.or_default()
				.push(edge.source.clone());
		}

		Self {
			documents: known,
			edges,
			adjacency,
		}
	}

	/// All known documents, in identifier order.
	pub fn documents(&self) -> &BTreeSet<DocumentId> {
		&self.documents
	}

	/// All valid links.
	pub fn edges(&self) -> &[LinkEdge] {
		&self.edges
	}

	/// Documents linked to or from `id`.
	pub fn neighbors(&self, id: &DocumentId) -> &[DocumentId] {
		self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Selects the part of the graph to draw around `focus`.
	///
	/// Links are followed in both directions. Documents up to `depth` hops away are
	/// included; a negative `depth` includes every known document.
	pub fn neighborhood(&self, focus: &DocumentId, depth: i32) -> Neighborhood {
		let mut nodes = vec![focus.clone()];
		let mut members: HashSet<&DocumentId> = HashSet::from([focus]);

		if depth < 0 {
			for id in &self.documents {
				if members.insert(id) {
					nodes.push(id.clone());
				}
			}
		} else {
			let mut queue = VecDeque::from([(focus, 0)]);
			while let Some((id, layer)) = queue.pop_front() {
				if layer >= depth {
					continue;
				}
				for neighbor in self.neighbors(id) {
					if members.insert(neighbor) {
						nodes.push(neighbor.clone());
						queue.push_back((neighbor, layer + 1));
					}
				}
			}
		}

		let edges = self
			.edges
			.iter()
			.filter(|e| members.contains(&e.source) && members.contains(&e.target))
			.cloned()
			.collect();

		Neighborhood { nodes, edges }
	}
}

/// The documents and links of one render pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Neighborhood {
	/// Documents in breadth-first order; the focus comes first.
	pub nodes: Vec<DocumentId>,
	/// Links whose endpoints are both in `nodes`.
	pub edges: Vec<LinkEdge>,
}

impl Neighborhood {
	/// Whether `id` belongs to the neighborhood.
	pub fn contains(&self, id: &DocumentId) -> bool {
		self.nodes.contains(id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn graph(docs: &[(&str, &[&str])]) -> LinkGraph {
		let owned: Vec<(DocumentId, Vec<DocumentId>)> = docs
			.iter()
			.map(|(id, links)| (DocumentId::new(*id), links.iter().map(|l| DocumentId::new(*l)).collect()))
			.collect();
		LinkGraph::from_outbound(owned.iter().map(|(id, links)| (id, links.iter())))
	}

	fn ids(n: &Neighborhood) -> BTreeSet<&str> {
		n.nodes.iter().map(DocumentId::as_str).collect()
	}

	fn chain() -> LinkGraph {
		graph(&[("A", &["B"]), ("B", &["C"]), ("C", &[])])
	}

	#[test]
	fn drops_links_to_unknown_documents() {
		let g = graph(&[("A", &["B", "missing"]), ("B", &[])]);
		assert_eq!(g.edges(), &[LinkEdge::new("A", "B")]);
	}

	#[test]
	fn keeps_each_target_once_per_source() {
		let g = graph(&[("A", &["B", "B"]), ("B", &["A"])]);
		assert_eq!(g.edges(), &[LinkEdge::new("A", "B"), LinkEdge::new("B", "A")]);
	}

	#[test]
	fn keeps_self_links() {
		let g = graph(&[("A", &["A", "B"]), ("B", &[])]);
		assert_eq!(g.edges(), &[LinkEdge::new("A", "A"), LinkEdge::new("A", "B")]);
		let n = g.neighborhood(&"A".into(), 1);
		assert_eq!(n.nodes, vec![DocumentId::new("A"), DocumentId::new("B")]);
		assert_eq!(n.edges.len(), 2);
	}

	#[test]
	fn depth_one_follows_links_both_ways() {
		let n = chain().neighborhood(&"B".into(), 1);
		assert_eq!(ids(&n), BTreeSet::from(["A", "B", "C"]));
		assert_eq!(n.edges, vec![LinkEdge::new("A", "B"), LinkEdge::new("B", "C")]);
	}

	#[test]
	fn depth_zero_is_the_focus_alone() {
		let n = chain().neighborhood(&"B".into(), 0);
		assert_eq!(n.nodes, vec![DocumentId::new("B")]);
		assert!(n.edges.is_empty());
	}

	#[test]
	fn layers_stop_at_depth() {
		let g = graph(&[("A", &["B"]), ("B", &["C"]), ("C", &["D"]), ("D", &[])]);
		let n = g.neighborhood(&"A".into(), 2);
		assert_eq!(ids(&n), BTreeSet::from(["A", "B", "C"]));
		assert_eq!(n.edges, vec![LinkEdge::new("A", "B"), LinkEdge::new("B", "C")]);
	}

	#[test]
	fn negative_depth_includes_everything() {
		let g = graph(&[("A", &["B"]), ("B", &[]), ("island", &[])]);
		let n = g.neighborhood(&"A".into(), -1);
		assert_eq!(ids(&n), BTreeSet::from(["A", "B", "island"]));
		assert_eq!(n.nodes[0].as_str(), "A");
	}

	#[test]
	fn isolated_focus_is_a_singleton() {
		let g = graph(&[("A", &["B"]), ("B", &[]), ("lonely", &[])]);
		let n = g.neighborhood(&"lonely".into(), 3);
		assert_eq!(n.nodes, vec![DocumentId::new("lonely")]);
	}

	#[test]
	fn unknown_focus_is_still_drawn() {
		let n = chain().neighborhood(&"elsewhere".into(), 2);
		assert_eq!(n.nodes, vec![DocumentId::new("elsewhere")]);
	}

	#[test]
	fn matches_reference_distances() {
		// A ring plus a tail: distances from "r0" are computed by hand.
		let g = graph(&[
			("r0", &["r1"]),
			("r1", &["r2"]),
			("r2", &["r3"]),
			("r3", &["r0"]),
			("tail", &["r2"]),
		]);
		let expected: [&[&str]; 4] = [
			&["r0"],
			&["r0", "r1", "r3"],
			&["r0", "r1", "r2", "r3"],
			&["r0", "r1", "r2", "r3", "tail"],
		];
		for (depth, want) in expected.iter().enumerate() {
			let n = g.neighborhood(&"r0".into(), depth as i32);
			assert_eq!(ids(&n), want.iter().copied().collect::<BTreeSet<_>>(), "depth {depth}");
		}
	}
}
