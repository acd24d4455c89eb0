//! Lifecycle of one mounted graph view.
//!
//! A session goes `Idle → Initializing → Running → TornDown`. Initialization is
//! asynchronous (the corpus may still be downloading), so every start hands out a
//! [`Ticket`]; a view finished under an outdated ticket is rejected and must be
//! torn down by the caller.

use crate::path::FullSlug;

/// Something holding browser resources that must be released.
pub trait Teardown {
	/// Cancels frames, removes listeners and detaches the view.
	fn teardown(&mut self);
}

/// Where a session is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
	/// Nothing shown or pending.
	Idle,
	/// Waiting for the corpus and the mount.
	Initializing,
	/// A view is attached and animating.
	Running,
	/// Released; only a new `begin` revives it.
	TornDown,
}

/// Identifies one initialization attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket(u64);

/// Owner of at most one live view.
#[derive(Debug)]
pub struct GraphSession<V> {
	phase: Phase,
	generation: u64,
	focus: Option<FullSlug>,
	view: Option<V>,
}

impl<V> Default for GraphSession<V> {
	fn default() -> Self {
		Self {
			phase: Phase::Idle,
			generation: 0,
			focus: None,
			view: None,
		}
	}
}

impl<V: Teardown> GraphSession<V> {
	/// An idle session.
	pub fn new() -> Self {
		Self::default()
	}

	/// Current phase.
	pub fn phase(&self) -> Phase {
		self.phase
	}

	/// Page of the latest initialization.
	pub fn focus(&self) -> Option<&FullSlug> {
		self.focus.as_ref()
	}

	/// Whether `ticket` belongs to the latest initialization and it is still pending.
	pub fn is_current(&self, ticket: Ticket) -> bool {
		self.phase == Phase::Initializing && ticket.0 == self.generation
	}

	/// Tears down any live view and starts initializing for `focus`.
	pub fn begin(&mut self, focus: FullSlug) -> Ticket {
		self.release_view();
		self.generation += 1;
		self.focus = Some(focus);
		self.phase = Phase::Initializing;
		Ticket(self.generation)
	}

	/// Installs the view built under `ticket`. A stale view is handed back.
	pub fn attach(&mut self, ticket: Ticket, view: V) -> Result<(), V> {
		if !self.is_current(ticket) {
			return Err(view);
		}
		self.view = Some(view);
		self.phase = Phase::Running;
		Ok(())
	}

	/// Gives up the initialization under `ticket`, if it is still current.
	pub fn abort(&mut self, ticket: Ticket) {
		if self.is_current(ticket) {
			self.phase = Phase::Idle;
		}
	}

	/// Releases the live view and invalidates pending initializations.
	pub fn teardown(&mut self) {
		self.release_view();
		self.generation += 1;
		self.phase = Phase::TornDown;
	}

	/// Starts over with the same focus, as after a theme change.
	///
	/// Only a running or initializing session is restarted.
	pub fn rerender(&mut self) -> Option<(Ticket, FullSlug)> {
		if !matches!(self.phase, Phase::Running | Phase::Initializing) {
			return None;
		}
		let focus = self.focus.clone()?;
		Some((self.begin(focus.clone()), focus))
	}

	/// The live view, when running.
	pub fn view_mut(&mut self) -> Option<&mut V> {
		self.view.as_mut()
	}

	fn release_view(&mut self) {
		if let Some(mut view) = self.view.take() {
			view.teardown();
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;
	use std::rc::Rc;

	use super::*;

	struct Recorder(Rc<Cell<u32>>);

	impl Teardown for Recorder {
		fn teardown(&mut self) {
			self.0.set(self.0.get() + 1);
		}
	}

	fn recorder() -> (Recorder, Rc<Cell<u32>>) {
		let count = Rc::new(Cell::new(0));
		(Recorder(count.clone()), count)
	}

	#[test]
	fn runs_after_attach() {
		let mut session = GraphSession::new();
		assert_eq!(session.phase(), Phase::Idle);
		let ticket = session.begin(FullSlug::new("a"));
		assert_eq!(session.phase(), Phase::Initializing);
		let (view, _) = recorder();
		assert!(session.attach(ticket, view).is_ok());
		assert_eq!(session.phase(), Phase::Running);
	}

	#[test]
	fn newer_begin_rejects_older_view() {
		let mut session = GraphSession::new();
		let old = session.begin(FullSlug::new("a"));
		let new = session.begin(FullSlug::new("b"));
		let (view, _) = recorder();
		assert!(session.attach(old, view).is_err());
		let (view, _) = recorder();
		assert!(session.attach(new, view).is_ok());
		assert_eq!(session.focus(), Some(&FullSlug::new("b")));
	}

	#[test]
	fn teardown_releases_view_and_invalidates_pending() {
		let mut session = GraphSession::new();
		let ticket = session.begin(FullSlug::new("a"));
		let (view, count) = recorder();
		session.attach(ticket, view).ok();
		session.teardown();
		assert_eq!(count.get(), 1);
		assert_eq!(session.phase(), Phase::TornDown);

		let pending = session.begin(FullSlug::new("a"));
		session.teardown();
		let (view, _) = recorder();
		assert!(session.attach(pending, view).is_err());
	}

	#[test]
	fn begin_replaces_running_view() {
		let mut session = GraphSession::new();
		let ticket = session.begin(FullSlug::new("a"));
		let (view, count) = recorder();
		session.attach(ticket, view).ok();
		session.begin(FullSlug::new("b"));
		assert_eq!(count.get(), 1);
	}

	#[test]
	fn rerender_keeps_focus() {
		let mut session: GraphSession<Recorder> = GraphSession::new();
		assert!(session.rerender().is_none());
		let ticket = session.begin(FullSlug::new("notes/x"));
		let (view, count) = recorder();
		session.attach(ticket, view).ok();
		let (_, focus) = session.rerender().unwrap();
		assert_eq!(focus, FullSlug::new("notes/x"));
		assert_eq!(count.get(), 1);
		assert_eq!(session.phase(), Phase::Initializing);
		session.teardown();
		assert!(session.rerender().is_none());
	}

	#[test]
	fn abort_returns_to_idle() {
		let mut session: GraphSession<Recorder> = GraphSession::new();
		let ticket = session.begin(FullSlug::new("a"));
		session.abort(ticket);
		assert_eq!(session.phase(), Phase::Idle);
	}
}
