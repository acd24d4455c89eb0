//! Force-directed layout of a render pass.
//!
//! Wraps the `force_graph` simulation, which integrates node repulsion and edge
//! springs, and adds the constraints that simulation lacks: a pull toward the
//! origin, a rest length for links and collision between node circles.
//!
//! The layout has an energy level (`alpha`) that decays toward a target every
//! step. Once it drops below [`ALPHA_MIN`] with a zero target the layout sleeps
//! until something (a drag) raises the target again.

use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::config::GraphConfig;
use super::types::Point;

/// Energy below which the layout stops moving.
pub const ALPHA_MIN: f64 = 0.001;
/// Energy lost per step: reaches [`ALPHA_MIN`] from 1 in 300 steps.
pub const ALPHA_DECAY: f64 = 0.022_763_019_750_042_33;
/// Collision passes per step.
pub const COLLIDE_ITERATIONS: usize = 3;

/// Repulsion of `force_graph` at a repel multiplier of 1.
const CHARGE_BASE: f64 = 100.0;
/// Spring constant of `force_graph` edges.
const SPRING: f32 = 0.02;
/// Radius scale of the initial spiral.
const INITIAL_RADIUS: f64 = 10.0;

/// Per-body data stored inside the simulation.
#[derive(Clone, Debug, Default)]
pub struct Body {
	/// Index of the node in the render pass.
	pub slot: usize,
}

/// Force parameters taken from the graph configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutParams {
	/// Multiplier of the n-body repulsion.
	pub repel_force: f64,
	/// Share of the centroid offset removed per step.
	pub center_force: f64,
	/// Rest length of links.
	pub link_distance: f64,
}

impl From<&GraphConfig> for LayoutParams {
	fn from(config: &GraphConfig) -> Self {
		Self {
			repel_force: config.repel_force,
			center_force: config.center_force,
			link_distance: config.link_distance,
		}
	}
}

/// Continuously advancing layout of one render pass.
pub struct LayoutEngine {
	graph: ForceGraph<Body, ()>,
	handles: Vec<DefaultNodeIdx>,
	links: Vec<(usize, usize)>,
	degree: Vec<usize>,
	radii: Vec<f64>,
	pinned: Vec<bool>,
	params: LayoutParams,
	alpha: f64,
	alpha_target: f64,
	frozen: bool,
}

impl LayoutEngine {
	/// Places `radii.len()` bodies on a spiral around the origin and links them.
	///
	/// A single body is pinned at the origin and never simulated.
	pub fn new(radii: Vec<f64>, links: Vec<(usize, usize)>, params: LayoutParams) -> Self {
		let mut graph = ForceGraph::new(SimulationParameters {
			force_charge: (CHARGE_BASE * params.repel_force) as f32,
			force_spring: SPRING,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});

		let count = radii.len();
		let frozen = count == 1;
		let golden_angle = PI * (3.0 - 5f64.sqrt());
		let mut handles = Vec::with_capacity(count);
		for slot in 0..count {
			let (x, y) = if frozen {
				(0.0, 0.0)
			} else {
				let r = INITIAL_RADIUS * (0.5 + slot as f64).sqrt();
				let angle = slot as f64 * golden_angle;
				(r * angle.cos(), r * angle.sin())
			};
			handles.push(graph.add_node(NodeData {
				x: x as f32,
				y: y as f32,
				mass: 10.0,
				is_anchor: frozen,
				user_data: Body { slot },
			}));
		}

		let mut degree = vec![0; count];
		for &(s, t) in &links {
			degree[s] += 1;
			if s == t {
				continue;
			}
			graph.add_edge(handles[s], handles[t], EdgeData::default());
			degree[t] += 1;
		}

		Self {
			graph,
			handles,
			links,
			degree,
			radii,
			pinned: vec![frozen; count],
			params,
			alpha: 1.0,
			alpha_target: 0.0,
			frozen,
		}
	}

	/// Number of bodies.
	pub fn len(&self) -> usize {
		self.handles.len()
	}

	/// Whether the layout has no bodies.
	pub fn is_empty(&self) -> bool {
		self.handles.is_empty()
	}

	/// Whether the layout is a single body pinned at the origin.
	pub fn is_frozen(&self) -> bool {
		self.frozen
	}

	/// Current energy.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Whether the layout has come to rest.
	pub fn is_settled(&self) -> bool {
		self.frozen || (self.alpha < ALPHA_MIN && self.alpha_target < ALPHA_MIN)
	}

	/// Sets the energy the layout converges to. A drag holds it at 1.
	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target.clamp(0.0, 1.0);
	}

	/// Advances the layout by `dt` seconds. Returns whether anything moved.
	pub fn step(&mut self, dt: f64) -> bool {
		if self.frozen {
			return false;
		}
		self.alpha += (self.alpha_target - self.alpha) * ALPHA_DECAY;
		if self.is_settled() {
			return false;
		}

		self.graph.update((dt * self.alpha) as f32);

		let mut pos = self.read_positions();
		apply_links(
			&mut pos,
			&self.links,
			&self.degree,
			self.params.link_distance,
			self.alpha,
			&self.pinned,
		);
		apply_center(&mut pos, self.params.center_force, &self.pinned);
		for _ in 0..COLLIDE_ITERATIONS {
			apply_collide(&mut pos, &self.radii, &self.pinned);
		}
		self.write_positions(&pos);
		true
	}

	/// Latest position of every body, by slot. Non-finite positions read as unset.
	pub fn positions(&self) -> Vec<Option<Point>> {
		self.read_positions()
			.into_iter()
			.map(|p| (p.x.is_finite() && p.y.is_finite()).then_some(p))
			.collect()
	}

	/// Latest position of one body.
	pub fn position(&self, slot: usize) -> Option<Point> {
		self.positions().get(slot).copied().flatten()
	}

	/// Fixes `slot` at `at`, removing it from the free simulation.
	pub fn pin(&mut self, slot: usize, at: Point) {
		if self.frozen || slot >= self.len() {
			return;
		}
		self.pinned[slot] = true;
		self.graph.visit_nodes_mut(|node| {
			if node.data.user_data.slot == slot {
				node.data.x = at.x as f32;
				node.data.y = at.y as f32;
				node.data.is_anchor = true;
			}
		});
	}

	/// Lets `slot` rejoin the free simulation.
	pub fn release(&mut self, slot: usize) {
		if self.frozen || slot >= self.len() {
			return;
		}
		self.pinned[slot] = false;
		self.graph.visit_nodes_mut(|node| {
			if node.data.user_data.slot == slot {
				node.data.is_anchor = false;
			}
		});
	}

	/// Whether `slot` is currently pinned.
	pub fn is_pinned(&self, slot: usize) -> bool {
		self.pinned.get(slot).copied().unwrap_or(false)
	}

	fn read_positions(&self) -> Vec<Point> {
		let mut out = vec![Point::ORIGIN; self.len()];
		self.graph.visit_nodes(|node| {
			out[node.data.user_data.slot] = Point::new(node.x() as f64, node.y() as f64);
		});
		out
	}

	fn write_positions(&mut self, pos: &[Point]) {
		self.graph.visit_nodes_mut(|node| {
			let p = pos[node.data.user_data.slot];
			if !node.data.is_anchor && p.x.is_finite() && p.y.is_finite() {
				node.data.x = p.x as f32;
				node.data.y = p.y as f32;
			}
		});
	}
}

/// Moves linked bodies toward `distance` apart, weighted like d3's link force.
///
/// Each link pulls with strength `1 / min(degree)`; the better-connected endpoint
/// moves less.
pub fn apply_links(
	pos: &mut [Point],
	links: &[(usize, usize)],
	degree: &[usize],
	distance: f64,
	alpha: f64,
	pinned: &[bool],
) {
	for &(s, t) in links {
		let (dx, dy) = (pos[t].x - pos[s].x, pos[t].y - pos[s].y);
		let len = dx.hypot(dy);
		if len < 1e-9 {
			continue;
		}
		let strength = 1.0 / degree[s].min(degree[t]).max(1) as f64;
		let k = (len - distance) / len * alpha * strength;
		let (mx, my) = (dx * k, dy * k);
		let bias = degree[s] as f64 / (degree[s] + degree[t]).max(1) as f64;

		if !pinned[t] {
			pos[t].x -= mx * bias;
			pos[t].y -= my * bias;
		}
		if !pinned[s] {
			pos[s].x += mx * (1.0 - bias);
			pos[s].y += my * (1.0 - bias);
		}
	}
}

/// Shifts free bodies so the layout's centroid moves toward the origin.
pub fn apply_center(pos: &mut [Point], strength: f64, pinned: &[bool]) {
	if pos.is_empty() {
		return;
	}
	let n = pos.len() as f64;
	let (sx, sy) = pos.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
	let (shift_x, shift_y) = (sx / n * strength, sy / n * strength);
	for (p, &fixed) in pos.iter_mut().zip(pinned) {
		if !fixed {
			p.x -= shift_x;
			p.y -= shift_y;
		}
	}
}

/// Pushes overlapping circles apart; larger circles move less.
pub fn apply_collide(pos: &mut [Point], radii: &[f64], pinned: &[bool]) {
	for i in 0..pos.len() {
		for j in (i + 1)..pos.len() {
			if pinned[i] && pinned[j] {
				continue;
			}
			let reach = radii[i] + radii[j];
			let (dx, dy) = (pos[j].x - pos[i].x, pos[j].y - pos[i].y);
			let d2 = dx * dx + dy * dy;
			if d2 >= reach * reach {
				continue;
			}
			let d = d2.sqrt();
			// Coincident centers have no direction; split them along a fixed axis.
			let (ux, uy) = if d < 1e-9 {
				let (fx, fy) = ((j - i) as f64, 1.0);
				let n = fx.hypot(fy);
				(fx / n, fy / n)
			} else {
				(dx / d, dy / d)
			};
			let overlap = reach - d;
			let (mx, my) = (ux * overlap, uy * overlap);

			let (ri2, rj2) = (radii[i] * radii[i], radii[j] * radii[j]);
			let (share_i, share_j) = match (pinned[i], pinned[j]) {
				(true, _) => (0.0, 1.0),
				(_, true) => (1.0, 0.0),
				_ => {
					let wi = rj2 / (ri2 + rj2).max(f64::EPSILON);
					(wi, 1.0 - wi)
				}
			};
			pos[i].x -= mx * share_i;
			pos[i].y -= my * share_i;
			pos[j].x += mx * share_j;
			pos[j].y += my * share_j;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn params() -> LayoutParams {
		LayoutParams::from(&GraphConfig::default())
	}

	#[test]
	fn single_body_is_pinned_at_origin() {
		let mut layout = LayoutEngine::new(vec![4.8], vec![], params());
		assert!(layout.is_frozen());
		for _ in 0..10 {
			assert!(!layout.step(0.016));
		}
		assert_eq!(layout.positions(), vec![Some(Point::ORIGIN)]);
		assert!(layout.is_pinned(0));
	}

	#[test]
	fn single_body_ignores_drag() {
		let mut layout = LayoutEngine::new(vec![4.8], vec![], params());
		layout.pin(0, Point::new(30.0, 30.0));
		layout.release(0);
		assert_eq!(layout.position(0), Some(Point::ORIGIN));
		assert!(layout.is_pinned(0));
	}

	#[test]
	fn initial_spiral_has_no_coincident_bodies() {
		let layout = LayoutEngine::new(vec![5.0; 20], vec![], params());
		let pos: Vec<Point> = layout.positions().into_iter().map(Option::unwrap).collect();
		for i in 0..pos.len() {
			for j in (i + 1)..pos.len() {
				assert!(pos[i].distance(pos[j]) > 1e-3);
			}
		}
	}

	#[test]
	fn positions_stay_finite_while_running() {
		let links = vec![(0, 1), (1, 2), (2, 0), (2, 3)];
		let mut layout = LayoutEngine::new(vec![5.0, 5.0, 5.7, 5.0], links, params());
		for _ in 0..120 {
			layout.step(0.016);
		}
		assert!(layout.positions().iter().all(Option::is_some));
	}

	#[test]
	fn energy_decays_until_the_layout_sleeps() {
		let mut layout = LayoutEngine::new(vec![5.0, 5.0], vec![(0, 1)], params());
		assert!(!layout.is_settled());
		for _ in 0..300 {
			layout.step(0.016);
		}
		assert!(layout.is_settled());
		assert!(!layout.step(0.016));
	}

	#[test]
	fn raising_the_target_wakes_a_settled_layout() {
		let mut layout = LayoutEngine::new(vec![5.0, 5.0], vec![(0, 1)], params());
		for _ in 0..400 {
			layout.step(0.016);
		}
		layout.set_alpha_target(1.0);
		assert!(layout.step(0.016));
		assert!(layout.alpha() > ALPHA_MIN);
	}

	#[test]
	fn pinned_body_holds_its_position() {
		let mut layout = LayoutEngine::new(vec![5.0; 3], vec![(0, 1), (1, 2)], params());
		layout.pin(1, Point::new(50.0, -20.0));
		layout.set_alpha_target(1.0);
		for _ in 0..30 {
			layout.step(0.016);
		}
		assert_eq!(layout.position(1), Some(Point::new(50.0, -20.0)));
		layout.release(1);
		assert!(!layout.is_pinned(1));
	}

	#[test]
	fn collide_separates_overlapping_circles() {
		let mut pos = vec![Point::new(0.0, 0.0), Point::new(2.0, 0.0)];
		apply_collide(&mut pos, &[5.0, 5.0], &[false, false]);
		assert!((pos[0].distance(pos[1]) - 10.0).abs() < 1e-9);
		assert!((pos[0].x + pos[1].x - 2.0).abs() < 1e-9);
		assert_eq!(pos[0].y + pos[1].y, 0.0);
	}

	#[test]
	fn collide_moves_only_the_free_body() {
		let mut pos = vec![Point::new(0.0, 0.0), Point::new(3.0, 4.0)];
		apply_collide(&mut pos, &[5.0, 5.0], &[true, false]);
		assert_eq!(pos[0], Point::ORIGIN);
		assert!((pos[1].distance(Point::ORIGIN) - 10.0).abs() < 1e-9);
	}

	#[test]
	fn collide_splits_coincident_bodies() {
		let mut pos = vec![Point::new(1.0, 1.0); 2];
		apply_collide(&mut pos, &[4.0, 4.0], &[false, false]);
		assert!((pos[0].distance(pos[1]) - 8.0).abs() < 1e-9);
		let mid = Point::new((pos[0].x + pos[1].x) / 2.0, (pos[0].y + pos[1].y) / 2.0);
		assert!(mid.distance(Point::new(1.0, 1.0)) < 1e-9);
	}

	#[test]
	fn self_link_counts_once_and_stays_finite() {
		let mut layout = LayoutEngine::new(vec![5.0, 5.0], vec![(0, 0), (0, 1)], params());
		assert_eq!(layout.degree, vec![2, 1]);
		for _ in 0..60 {
			layout.step(0.016);
		}
		assert!(layout.positions().iter().all(Option::is_some));
	}

	#[test]
	fn links_pull_toward_rest_length() {
		let mut pos = vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
		apply_links(&mut pos, &[(0, 1)], &[1, 1], 30.0, 1.0, &[false, false]);
		assert!((pos[0].distance(pos[1]) - 30.0).abs() < 1e-9);

		let mut pos = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
		apply_links(&mut pos, &[(0, 1)], &[1, 1], 30.0, 0.5, &[false, false]);
		assert!((pos[0].distance(pos[1]) - 20.0).abs() < 1e-9);
	}

	#[test]
	fn center_moves_centroid_toward_origin() {
		let mut pos = vec![Point::new(10.0, 10.0), Point::new(30.0, 10.0)];
		apply_center(&mut pos, 0.5, &[false, false]);
		assert_eq!(pos, vec![Point::new(0.0, 5.0), Point::new(20.0, 5.0)]);
	}
}
