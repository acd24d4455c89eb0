//! Leptos component wrapping the force-directed graph canvas.
//!
//! The component creates an HTML canvas element and wires up mouse, wheel and
//! touch handlers for node dragging, clicking, panning and zooming. An animation
//! loop runs via `requestAnimationFrame`, stepping the layout and transitions and
//! repainting each frame.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::error;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, MouseEvent, TouchEvent, TouchList,
	WheelEvent,
};

use crate::dom::{FrameLoop, defer, device_pixel_ratio, now_ms};
use crate::error::{GraphError, Result};

use super::interaction::NavigationRequest;
use super::render;
use super::session::Teardown;
use super::state::GraphState;
use super::types::Point;

/// Receives the navigations requested by clicks on nodes.
pub type Navigate = Rc<dyn Fn(NavigationRequest)>;

type SharedState = Rc<RefCell<GraphState>>;
type FrameSlot = Rc<RefCell<Option<FrameLoop>>>;

/// Size of the drawing surface for `container`, in CSS pixels.
pub fn surface_size(container: &HtmlElement, min_height: f64) -> (f64, f64) {
	(
		container.offset_width() as f64,
		(container.offset_height() as f64).max(min_height),
	)
}

/// Renders an interactive force-directed graph on a canvas element.
///
/// The surface size is fixed at mount time; the backing store is `dpr` times
/// larger so lines stay sharp on dense displays.
#[component]
pub fn GraphCanvas(
	state: SharedState,
	frames: FrameSlot,
	on_navigate: Navigate,
	width: f64,
	height: f64,
	#[prop(default = 1.0)] dpr: f64,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let (state_init, frames_init) = (state.clone(), frames.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		canvas.set_width((width * dpr).round() as u32);
		canvas.set_height((height * dpr).round() as u32);

		let ctx = match context_2d(&canvas) {
			Ok(ctx) => ctx,
			Err(e) => {
				error!("quartz-graph: {}", e);
				return;
			}
		};

		let state_frame = state_init.clone();
		let frame = FrameLoop::start(move |dt| {
			let Ok(mut state) = state_frame.try_borrow_mut() else {
				return;
			};
			state.tick(dt);
			let scene = render::build_scene(&state);
			drop(state);
			render::paint(&scene, &ctx, width, height, dpr);
		});
		match frame {
			Ok(frame) => *frames_init.borrow_mut() = Some(frame),
			Err(e) => error!("quartz-graph: animation loop not started: {}", e),
		}
	});

	let navigate = move |request: Option<NavigationRequest>| {
		if let Some(request) = request {
			let on_navigate = on_navigate.clone();
			defer(move || on_navigate(request));
		}
	};

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if let Some(at) = local_point(canvas_ref, ev.client_x() as f64, ev.client_y() as f64) {
			state_md.borrow_mut().pointer_down(at, now_ms());
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some(at) = local_point(canvas_ref, ev.client_x() as f64, ev.client_y() as f64) {
			state_mm.borrow_mut().pointer_move(at, now_ms());
		}
	};

	let (state_mu, navigate_mu) = (state.clone(), navigate.clone());
	let on_mouseup = move |ev: MouseEvent| {
		if let Some(at) = local_point(canvas_ref, ev.client_x() as f64, ev.client_y() as f64) {
			let request = state_mu.borrow_mut().pointer_up(at, now_ms());
			navigate_mu(request);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		state_ml.borrow_mut().pointer_leave();
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		let mut state = state_wh.borrow_mut();
		if !state.config.zoom {
			return;
		}
		ev.prevent_default();
		if let Some(at) = local_point(canvas_ref, ev.client_x() as f64, ev.client_y() as f64) {
			state.wheel(at, ev.delta_y(), ev.delta_mode(), ev.ctrl_key());
		}
	};

	let state_ts = state.clone();
	let on_touchstart = move |ev: TouchEvent| {
		let touches = touch_points(canvas_ref, &ev.touches());
		state_ts.borrow_mut().touch_start(&touches, now_ms());
	};

	let state_tm = state.clone();
	let on_touchmove = move |ev: TouchEvent| {
		ev.prevent_default();
		let touches = touch_points(canvas_ref, &ev.touches());
		state_tm.borrow_mut().touch_move(&touches, now_ms());
	};

	let (state_te, navigate_te) = (state, navigate);
	let on_touchend = move |ev: TouchEvent| {
		let remaining = touch_points(canvas_ref, &ev.touches());
		let Some(&at) = touch_points(canvas_ref, &ev.changed_touches()).first() else {
			return;
		};
		let request = state_te.borrow_mut().touch_end(&remaining, at, now_ms());
		navigate_te(request);
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			on:touchstart=on_touchstart
			on:touchmove=on_touchmove
			on:touchend=on_touchend
			style=format!(
				"display: block; width: {width}px; height: {height}px; cursor: grab; touch-action: none;"
			)
		/>
	}
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d> {
	canvas
		.get_context("2d")
		.map_err(GraphError::from_js)?
		.ok_or_else(|| GraphError::Surface("2d context unavailable".into()))?
		.dyn_into()
		.map_err(|_| GraphError::Surface("unexpected context type".into()))
}

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, client_x: f64, client_y: f64) -> Option<Point> {
	let canvas = canvas_ref.get_untracked()?;
	let rect = canvas.get_bounding_client_rect();
	Some(Point::new(client_x - rect.left(), client_y - rect.top()))
}

fn touch_points(canvas_ref: NodeRef<leptos::html::Canvas>, list: &TouchList) -> Vec<Point> {
	(0..list.length())
		.filter_map(|i| list.get(i))
		.filter_map(|t| local_point(canvas_ref, t.client_x() as f64, t.client_y() as f64))
		.collect()
}

/// A graph view attached to a container element.
pub struct MountedGraph {
	state: SharedState,
	frames: FrameSlot,
	view: Option<Box<dyn Any>>,
}

impl MountedGraph {
	/// Shared state of the view.
	pub fn state(&self) -> &SharedState {
		&self.state
	}
}

impl Teardown for MountedGraph {
	fn teardown(&mut self) {
		self.frames.borrow_mut().take();
		if let Ok(mut state) = self.state.try_borrow_mut() {
			state.transitions.stop_all();
			state.drag = None;
		}
		// Unmounting removes the canvas and its listeners.
		self.view.take();
	}
}

impl Drop for MountedGraph {
	fn drop(&mut self) {
		self.teardown();
	}
}

/// Replaces the content of `container` with a canvas showing `state`.
pub fn mount_graph(container: HtmlElement, state: GraphState, on_navigate: Navigate) -> MountedGraph {
	container.set_inner_html("");
	let (width, height) = (state.width, state.height);
	let state: SharedState = Rc::new(RefCell::new(state));
	let frames: FrameSlot = Rc::new(RefCell::new(None));
	let dpr = device_pixel_ratio();

	let (state_view, frames_view) = (state.clone(), frames.clone());
	let handle = leptos::mount::mount_to(container, move || {
		view! {
			<GraphCanvas
				state=state_view
				frames=frames_view
				on_navigate=on_navigate
				width=width
				height=height
				dpr=dpr
			/>
		}
	});

	MountedGraph {
		state,
		frames,
		view: Some(Box::new(handle)),
	}
}
