//! Pointer, wheel and touch handling.
//!
//! Every handler takes positions in screen-space (CSS pixels relative to the
//! canvas) and a timestamp in milliseconds, so gestures can be replayed without a
//! browser. Handlers that end a click return the navigation it requests; the
//! caller hands it to the router once the state is no longer borrowed.

use log::debug;

use crate::path::{DocumentId, resolve_relative};

use super::state::{DragState, GraphState, PanState, PinchState};
use super::types::Point;

/// A request to open the page of a graph node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationRequest {
	pub target: DocumentId,
	/// Link to the target relative to the page the graph is shown on.
	pub href: String,
}

impl GraphState {
	/// Pointer pressed at `at`.
	///
	/// With dragging enabled a press on a node grabs it. Otherwise the press starts
	/// a background pan when zooming is enabled.
	pub fn pointer_down(&mut self, at: Point, now_ms: f64) {
		let hit = self.node_at_position(at);
		if self.config.drag {
			if let Some(node) = hit {
				self.start_drag(node, at, now_ms);
				return;
			}
		}
		self.pan = PanState {
			active: self.config.zoom,
			start: at,
			transform_start: Point::new(self.transform.x, self.transform.y),
			moved: false,
			pressed_node: if self.config.drag { None } else { hit },
		};
	}

	/// Pointer moved to `at`.
	pub fn pointer_move(&mut self, at: Point, _now_ms: f64) {
		if let Some(drag) = &self.drag {
			let k = self.transform.k;
			let pinned = Point::new(
				drag.node_start.x + (at.x - drag.start.x) / k,
				drag.node_start.y + (at.y - drag.start.y) / k,
			);
			let node = drag.node;
			self.layout.pin(node, pinned);
			return;
		}

		let hovered = self.node_at_position(at);
		if self.set_hover(hovered) {
			self.restart_transitions();
		}

		if self.pan.active {
			if at != self.pan.start {
				self.pan.moved = true;
			}
			self.transform.x = self.pan.transform_start.x + (at.x - self.pan.start.x);
			self.transform.y = self.pan.transform_start.y + (at.y - self.pan.start.y);
		}
	}

	/// Pointer released at `at`.
	///
	/// A drag shorter than the click threshold counts as a click on the dragged
	/// node. Without dragging, a release over the pressed node is a click unless the
	/// gesture panned the view.
	pub fn pointer_up(&mut self, at: Point, now_ms: f64) -> Option<NavigationRequest> {
		if let Some(drag) = self.end_drag() {
			if now_ms - drag.started_at_ms < self.scale.click_threshold_ms {
				return Some(self.navigation_to(drag.node));
			}
			return None;
		}

		let pan = std::mem::take(&mut self.pan);
		let node = pan.pressed_node?;
		if pan.moved || self.node_at_position(at) != Some(node) {
			return None;
		}
		Some(self.navigation_to(node))
	}

	/// Pointer left the surface: gestures end without a click and hover clears.
	pub fn pointer_leave(&mut self) {
		self.end_drag();
		self.pan = PanState::default();
		if self.set_hover(None) {
			self.restart_transitions();
		}
	}

	/// Wheel turned over `at`.
	pub fn wheel(&mut self, at: Point, delta_y: f64, delta_mode: u32, ctrl: bool) {
		if !self.config.zoom {
			return;
		}
		let delta = self.scale.wheel.delta(delta_y, delta_mode, ctrl);
		self.zoom_about(at, self.transform.k * delta.exp2());
	}

	/// Sets the zoom factor to `k`, keeping the point under `at` in place.
	pub fn zoom_about(&mut self, at: Point, k: f64) {
		let current = self.transform.k;
		let k = self.scale.zoom.clamp(k, current);
		let ratio = k / current;
		self.transform.x = at.x - (at.x - self.transform.x) * ratio;
		self.transform.y = at.y - (at.y - self.transform.y) * ratio;
		self.transform.k = k;
		self.refresh_label_alpha();
	}

	/// Touches began or changed in number. One finger acts as a pointer, two pinch.
	pub fn touch_start(&mut self, touches: &[Point], now_ms: f64) {
		match touches {
			[one] => self.pointer_down(*one, now_ms),
			[a, b, ..] => {
				self.end_drag();
				self.pan = PanState::default();
				if self.config.zoom {
					self.pinch = Some(PinchState {
						start_distance: a.distance(*b).max(1.0),
						start_k: self.transform.k,
					});
				}
			}
			[] => {}
		}
	}

	/// Touches moved.
	pub fn touch_move(&mut self, touches: &[Point], now_ms: f64) {
		match (touches, &self.pinch) {
			([a, b, ..], Some(pinch)) => {
				let k = pinch.start_k * a.distance(*b) / pinch.start_distance;
				let mid = Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
				self.zoom_about(mid, k);
			}
			([one], None) => self.pointer_move(*one, now_ms),
			_ => {}
		}
	}

	/// A touch ended at `at`; `remaining` are the fingers still down.
	pub fn touch_end(
		&mut self,
		remaining: &[Point],
		at: Point,
		now_ms: f64,
	) -> Option<NavigationRequest> {
		if self.pinch.is_some() {
			if remaining.len() < 2 {
				self.pinch = None;
			}
			return None;
		}
		let request = self.pointer_up(at, now_ms);
		if self.set_hover(None) {
			self.restart_transitions();
		}
		request
	}

	fn start_drag(&mut self, node: usize, at: Point, now_ms: f64) {
		let Some(node_start) = self.layout.position(node) else {
			return;
		};
		self.layout.pin(node, node_start);
		self.layout.set_alpha_target(1.0);
		self.drag = Some(DragState {
			node,
			start: at,
			node_start,
			started_at_ms: now_ms,
		});
	}

	fn end_drag(&mut self) -> Option<DragState> {
		let drag = self.drag.take()?;
		self.layout.release(drag.node);
		self.layout.set_alpha_target(0.0);
		Some(drag)
	}

	fn navigation_to(&self, node: usize) -> NavigationRequest {
		let target = self.pass.nodes()[node].id.clone();
		let href = resolve_relative(&self.slug, &target);
		debug!("quartz-graph: navigation to {} ({})", target, href);
		NavigationRequest { target, href }
	}
}
