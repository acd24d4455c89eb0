//! Small RAII wrappers over browser APIs.
//!
//! Listeners and animation frames are released when their guard is dropped, so a
//! view only has to drop what it owns to leave nothing behind.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::{Event, EventTarget, Window};

use crate::error::{GraphError, Result};

/// The global `window`.
pub fn window() -> Result<Window> {
	web_sys::window().ok_or_else(|| GraphError::Js("no window".into()))
}

/// The window's document.
pub fn document() -> Result<web_sys::Document> {
	window()?
		.document()
		.ok_or_else(|| GraphError::Js("no document".into()))
}

/// Milliseconds since the epoch.
pub fn now_ms() -> f64 {
	js_sys::Date::now()
}

/// Device pixel ratio, 1 when unknown.
pub fn device_pixel_ratio() -> f64 {
	web_sys::window()
		.map(|w| w.device_pixel_ratio())
		.filter(|r| r.is_finite() && *r > 0.0)
		.unwrap_or(1.0)
}

/// Computed value of a CSS custom property on the root element.
pub fn css_var(name: &str) -> Option<String> {
	let window = web_sys::window()?;
	let root = window.document()?.document_element()?;
	window
		.get_computed_style(&root)
		.ok()
		.flatten()?
		.get_property_value(name)
		.ok()
}

/// Runs `f` on a later turn of the event loop.
///
/// Used by callbacks whose work would drop the closure currently executing.
pub fn defer(f: impl FnOnce() + 'static) {
	wasm_bindgen_futures::spawn_local(async move { f() });
}

/// A DOM event listener, removed on drop.
pub struct EventListener {
	target: EventTarget,
	kind: &'static str,
	callback: Closure<dyn FnMut(Event)>,
}

impl EventListener {
	/// Registers `handler` for `kind` events on `target`.
	pub fn new(
		target: &EventTarget,
		kind: &'static str,
		handler: impl FnMut(Event) + 'static,
	) -> Result<Self> {
		let callback = Closure::<dyn FnMut(Event)>::new(handler);
		target
			.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
			.map_err(GraphError::from_js)?;
		Ok(Self {
			target: target.clone(),
			kind,
			callback,
		})
	}
}

impl Drop for EventListener {
	fn drop(&mut self) {
		let _ = self
			.target
			.remove_event_listener_with_callback(self.kind, self.callback.as_ref().unchecked_ref());
	}
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// A `requestAnimationFrame` loop, cancelled on drop.
///
/// The callback receives the milliseconds elapsed since the previous frame.
pub struct FrameLoop {
	handle: Rc<Cell<Option<i32>>>,
	callback: FrameCallback,
}

impl FrameLoop {
	/// Schedules `on_frame` for every animation frame until dropped.
	pub fn start(mut on_frame: impl FnMut(f64) + 'static) -> Result<Self> {
		let handle: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
		let callback: FrameCallback = Rc::new(RefCell::new(None));
		let (handle_inner, callback_inner) = (handle.clone(), Rc::downgrade(&callback));
		let last = Cell::new(None::<f64>);

		*callback.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
			let dt = last.replace(Some(timestamp)).map_or(0.0, |prev| timestamp - prev);
			on_frame(dt);

			// The loop was cancelled while `on_frame` ran.
			let Some(callback) = callback_inner.upgrade() else {
				return;
			};
			let next = callback.borrow().as_ref().and_then(|cb| {
				web_sys::window()?
					.request_animation_frame(cb.as_ref().unchecked_ref())
					.ok()
			});
			handle_inner.set(next);
		}));

		let window = window()?;
		if let Some(cb) = callback.borrow().as_ref() {
			let id = window
				.request_animation_frame(cb.as_ref().unchecked_ref())
				.map_err(GraphError::from_js)?;
			handle.set(Some(id));
		}
		Ok(Self { handle, callback })
	}
}

impl Drop for FrameLoop {
	fn drop(&mut self) {
		if let (Some(id), Some(window)) = (self.handle.take(), web_sys::window()) {
			let _ = window.cancel_animation_frame(id);
		}
		// Dropping the closure while it runs would be undefined; defer it.
		if let Some(closure) = self.callback.borrow_mut().take() {
			defer(move || drop(closure));
		}
	}
}
