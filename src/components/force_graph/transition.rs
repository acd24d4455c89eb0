//! Timed interpolation of render state.
//!
//! Transitions run on wall-clock time, independent of the layout's step rate.
//! They are grouped by concern; starting a group replaces the in-flight group of
//! the same concern, which keeps whatever values it had written so far.

use std::collections::BTreeMap;

use super::state::RenderPass;

/// Ease-in-out curve on `[0, 1]`.
pub fn smooth_step(t: f64) -> f64 {
	t * t * (3.0 - 2.0 * t)
}

/// What a group of tweens animates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Concern {
	/// Node opacity.
	Hover,
	/// Edge opacity.
	Link,
	/// Label opacity and scale.
	Label,
}

impl Concern {
	/// Duration of a transition of this concern.
	pub fn duration_ms(self) -> f64 {
		match self {
			Concern::Hover | Concern::Link => 200.0,
			Concern::Label => 100.0,
		}
	}
}

/// A single animatable value of a render pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Property {
	NodeAlpha(usize),
	EdgeAlpha(usize),
	LabelAlpha(usize),
	LabelScale(usize),
}

impl Property {
	fn read(self, pass: &RenderPass) -> Option<f64> {
		match self {
			Property::NodeAlpha(i) => pass.node_states.get(i).map(|s| s.alpha),
			Property::EdgeAlpha(i) => pass.edge_states.get(i).map(|s| s.alpha),
			Property::LabelAlpha(i) => pass.label_states.get(i).map(|s| s.alpha),
			Property::LabelScale(i) => pass.label_states.get(i).map(|s| s.scale),
		}
	}

	fn write(self, pass: &mut RenderPass, value: f64) {
		let alpha = value.clamp(0.0, 1.0);
		match self {
			Property::NodeAlpha(i) => {
				if let Some(s) = pass.node_states.get_mut(i) {
					s.alpha = alpha;
				}
			}
			Property::EdgeAlpha(i) => {
				if let Some(s) = pass.edge_states.get_mut(i) {
					s.alpha = alpha;
				}
			}
			Property::LabelAlpha(i) => {
				if let Some(s) = pass.label_states.get_mut(i) {
					s.alpha = alpha;
				}
			}
			Property::LabelScale(i) => {
				if let Some(s) = pass.label_states.get_mut(i) {
					s.scale = value;
				}
			}
		}
	}
}

#[derive(Clone, Debug)]
struct Tween {
	property: Property,
	from: f64,
	to: f64,
}

/// Tweens of one concern that start and finish together.
#[derive(Clone, Debug)]
pub struct TransitionGroup {
	concern: Concern,
	duration_ms: f64,
	elapsed_ms: f64,
	tweens: Vec<Tween>,
}

impl TransitionGroup {
	/// An empty group for `concern`, lasting the concern's duration.
	pub fn new(concern: Concern) -> Self {
		Self {
			concern,
			duration_ms: concern.duration_ms(),
			elapsed_ms: 0.0,
			tweens: Vec::new(),
		}
	}

	/// Adds a tween of `property` toward `target`.
	pub fn to(mut self, property: Property, target: f64) -> Self {
		self.tweens.push(Tween {
			property,
			from: 0.0,
			to: target,
		});
		self
	}

	/// What the group animates.
	pub fn concern(&self) -> Concern {
		self.concern
	}

	/// Number of tweens.
	pub fn len(&self) -> usize {
		self.tweens.len()
	}

	/// Whether the group has no tweens.
	pub fn is_empty(&self) -> bool {
		self.tweens.is_empty()
	}

	fn progress(&self) -> f64 {
		if self.duration_ms <= 0.0 {
			1.0
		} else {
			(self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
		}
	}

	fn apply(&self, pass: &mut RenderPass) {
		let eased = smooth_step(self.progress());
		for tween in &self.tweens {
			tween
				.property
				.write(pass, tween.from + (tween.to - tween.from) * eased);
		}
	}
}

/// The in-flight transition groups of one view, at most one per concern.
#[derive(Clone, Debug, Default)]
pub struct Transitions {
	groups: BTreeMap<Concern, TransitionGroup>,
}

impl Transitions {
	/// Starts `group` from the current values in `pass`, cancelling the group of
	/// the same concern.
	pub fn start(&mut self, mut group: TransitionGroup, pass: &RenderPass) {
		group.tweens.retain_mut(|tween| match tween.property.read(pass) {
			Some(current) => {
				tween.from = current;
				true
			}
			None => false,
		});
		self.groups.insert(group.concern, group);
	}

	/// Advances every group by `dt_ms`, writes the interpolated values into
	/// `pass` and drops finished groups.
	pub fn advance(&mut self, dt_ms: f64, pass: &mut RenderPass) {
		let dt_ms = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };
		self.groups.retain(|_, group| {
			group.elapsed_ms += dt_ms;
			group.apply(pass);
			group.elapsed_ms < group.duration_ms
		});
	}

	/// Cancels every group, leaving values where they are.
	pub fn stop_all(&mut self) {
		self.groups.clear();
	}

	/// Whether a group for `concern` is in flight.
	pub fn is_running(&self, concern: Concern) -> bool {
		self.groups.contains_key(&concern)
	}

	/// Whether nothing is animating.
	pub fn is_idle(&self) -> bool {
		self.groups.is_empty()
	}
}
