//! Page-level wiring.
//!
//! The router announces every shown page with a `nav` event and every departure
//! with `prenav`. On each page the runtime renders the inline graph, listens for
//! theme changes and the global-graph shortcut, and opens or closes the
//! full-screen overlay. Both graphs share the corpus cache and the visited set
//! but are otherwise independent sessions.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, error, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CustomEvent, Document, Event, HtmlElement, KeyboardEvent};

use crate::components::force_graph::scale::ScaleConfig;
use crate::components::force_graph::{
	GraphConfig, GraphSession, GraphState, MountedGraph, NavigationRequest, RenderPass, Teardown,
	Theme, Ticket, mount_graph, surface_size,
};
use crate::corpus::{CorpusCache, DEFAULT_CONTENT_INDEX};
use crate::dom::{EventListener, css_var, defer, document, window};
use crate::error::{GraphError, Result};
use crate::path::{FullSlug, absolute_url};
use crate::visited::{KeyValueStore, LocalStorage, MemoryStore, VisitedSet};

const OVERLAY_ID: &str = "global-graph-outer";
const ICON_ID: &str = "global-graph-icon";

/// Which of the two graph views.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphKind {
	/// Graph embedded in the page.
	Inline,
	/// Full-screen overlay.
	Global,
}

impl GraphKind {
	/// Id of the element the graph is drawn into.
	pub fn container_id(self) -> &'static str {
		match self {
			GraphKind::Inline => "graph-container",
			GraphKind::Global => "global-graph-container",
		}
	}
}

/// Whether a key press toggles the global graph: Ctrl/Cmd+G without Shift.
pub fn is_toggle_shortcut(key: &str, ctrl: bool, meta: bool, shift: bool) -> bool {
	key == "g" && (ctrl || meta) && !shift
}

/// Owns both graph sessions and every page-level listener.
pub struct GraphRuntime {
	corpus: CorpusCache,
	visited: VisitedSet<Box<dyn KeyValueStore>>,
	inline: RefCell<GraphSession<MountedGraph>>,
	global: RefCell<GraphSession<MountedGraph>>,
	overlay: RefCell<Option<Overlay>>,
	page: RefCell<Vec<EventListener>>,
	lifecycle: RefCell<Vec<EventListener>>,
}

thread_local! {
	static RUNTIME: RefCell<Option<Rc<GraphRuntime>>> = const { RefCell::new(None) };
}

/// Installs the runtime and renders the current page's graph.
pub fn start() {
	match GraphRuntime::install() {
		Ok(runtime) => {
			if let Some(slug) = current_slug() {
				runtime.on_nav(slug);
			}
			RUNTIME.with(|slot| *slot.borrow_mut() = Some(runtime));
		}
		Err(e) => error!("quartz-graph: runtime not started: {}", e),
	}
}

impl GraphRuntime {
	/// Creates the runtime and subscribes to the router's page events.
	pub fn install() -> Result<Rc<Self>> {
		let store: Box<dyn KeyValueStore> = if local_storage_available() {
			Box::new(LocalStorage)
		} else {
			warn!("quartz-graph: localStorage unavailable, visited pages are not persisted");
			Box::new(MemoryStore::default())
		};
		let runtime = Rc::new(Self {
			corpus: CorpusCache::default(),
			visited: VisitedSet::new(store),
			inline: RefCell::new(GraphSession::new()),
			global: RefCell::new(GraphSession::new()),
			overlay: RefCell::new(None),
			page: RefCell::new(Vec::new()),
			lifecycle: RefCell::new(Vec::new()),
		});

		let document = document()?;
		let weak = Rc::downgrade(&runtime);
		let on_nav = EventListener::new(&document, "nav", move |ev: Event| {
			let Some(runtime) = weak.upgrade() else {
				return;
			};
			match nav_slug(&ev).or_else(current_slug) {
				Some(slug) => runtime.on_nav(slug),
				None => debug!("quartz-graph: nav event without a slug"),
			}
		})?;

		let weak = Rc::downgrade(&runtime);
		let on_prenav = EventListener::new(&document, "prenav", move |_| {
			if let Some(runtime) = weak.upgrade() {
				runtime.teardown_page();
			}
		})?;

		runtime.lifecycle.borrow_mut().extend([on_nav, on_prenav]);
		info!("quartz-graph: runtime installed");
		Ok(runtime)
	}

	fn session(&self, kind: GraphKind) -> &RefCell<GraphSession<MountedGraph>> {
		match kind {
			GraphKind::Inline => &self.inline,
			GraphKind::Global => &self.global,
		}
	}

	/// A page was shown.
	pub fn on_nav(self: &Rc<Self>, slug: FullSlug) {
		self.teardown_page();
		if let Err(e) = self.visited.mark(&slug.simplify()) {
			warn!("quartz-graph: visited set not saved: {}", e);
		}
		self.render(GraphKind::Inline, slug);
		if let Err(e) = self.listen_page() {
			error!("quartz-graph: page listeners not installed: {}", e);
		}
	}

	/// The page is about to change: release everything the page owns.
	pub fn teardown_page(&self) {
		self.page.borrow_mut().clear();
		self.close_global();
		self.inline.borrow_mut().teardown();
	}

	fn listen_page(self: &Rc<Self>) -> Result<()> {
		let document = document()?;
		let mut listeners = Vec::new();

		let weak = Rc::downgrade(self);
		listeners.push(EventListener::new(&document, "themechange", move |_| {
			if let Some(runtime) = weak.upgrade() {
				runtime.on_theme_change();
			}
		})?);

		let weak = Rc::downgrade(self);
		listeners.push(EventListener::new(&document, "keydown", move |ev: Event| {
			let Some(key) = ev.dyn_ref::<KeyboardEvent>() else {
				return;
			};
			if !is_toggle_shortcut(&key.key(), key.ctrl_key(), key.meta_key(), key.shift_key()) {
				return;
			}
			key.prevent_default();
			if let Some(runtime) = weak.upgrade() {
				runtime.toggle_global();
			}
		})?);

		if let Some(icon) = document.get_element_by_id(ICON_ID) {
			let weak = Rc::downgrade(self);
			listeners.push(EventListener::new(&icon, "click", move |_| {
				if let Some(runtime) = weak.upgrade() {
					runtime.open_global();
				}
			})?);
		}

		*self.page.borrow_mut() = listeners;
		Ok(())
	}

	fn on_theme_change(self: &Rc<Self>) {
		for kind in [GraphKind::Inline, GraphKind::Global] {
			let restarted = self.session(kind).borrow_mut().rerender();
			if let Some((ticket, slug)) = restarted {
				debug!("quartz-graph: theme changed, redrawing {:?} graph", kind);
				self.spawn_initialize(kind, ticket, slug);
			}
		}
	}

	fn toggle_global(self: &Rc<Self>) {
		if self.overlay.borrow().is_some() {
			self.close_global();
		} else {
			self.open_global();
		}
	}

	fn open_global(self: &Rc<Self>) {
		if self.overlay.borrow().is_some() {
			return;
		}
		let Some(slug) = current_slug() else {
			debug!("quartz-graph: no current page, global graph not opened");
			return;
		};
		match Overlay::open(self) {
			Ok(Some(overlay)) => {
				*self.overlay.borrow_mut() = Some(overlay);
				self.render(GraphKind::Global, slug);
			}
			Ok(None) => debug!("quartz-graph: no #{} on this page", OVERLAY_ID),
			Err(e) => error!("quartz-graph: global graph not opened: {}", e),
		}
	}

	fn close_global(&self) {
		let overlay = self.overlay.borrow_mut().take();
		drop(overlay);
		self.global.borrow_mut().teardown();
	}

	/// Starts a render pass of `kind` centered on `slug`.
	pub fn render(self: &Rc<Self>, kind: GraphKind, slug: FullSlug) {
		let ticket = self.session(kind).borrow_mut().begin(slug.clone());
		self.spawn_initialize(kind, ticket, slug);
	}

	fn spawn_initialize(self: &Rc<Self>, kind: GraphKind, ticket: Ticket, slug: FullSlug) {
		let runtime = self.clone();
		wasm_bindgen_futures::spawn_local(async move {
			runtime.initialize(kind, ticket, slug).await;
		});
	}

	async fn initialize(&self, kind: GraphKind, ticket: Ticket, slug: FullSlug) {
		let built = self.build(kind, ticket, &slug).await;
		let mut session = self.session(kind).borrow_mut();
		match built {
			Ok(Some(view)) => match session.attach(ticket, view) {
				Ok(()) => info!("quartz-graph: {:?} graph running for {}", kind, slug),
				Err(mut stale) => {
					drop(session);
					debug!("quartz-graph: discarding stale {:?} graph", kind);
					stale.teardown();
				}
			},
			Ok(None) => session.abort(ticket),
			Err(e) => {
				session.abort(ticket);
				error!("quartz-graph: {:?} graph for {} aborted: {}", kind, slug, e);
			}
		}
	}

	async fn build(&self, kind: GraphKind, ticket: Ticket, slug: &FullSlug) -> Result<Option<MountedGraph>> {
		let document = document()?;
		let Some(container) = document.get_element_by_id(kind.container_id()) else {
			debug!("quartz-graph: no #{} on this page", kind.container_id());
			return Ok(None);
		};
		let container: HtmlElement = container
			.dyn_into()
			.map_err(|_| GraphError::Surface(format!("#{} is not an HTML element", kind.container_id())))?;

		let raw = container
			.get_attribute("data-cfg")
			.ok_or_else(|| GraphError::Config("missing data-cfg attribute".into()))?;
		let config = GraphConfig::from_json(&raw)?;
		let url = container
			.get_attribute("data-content-index")
			.unwrap_or_else(|| DEFAULT_CONTENT_INDEX.to_string());

		let corpus = self.corpus.load(&url).await?;
		if !self.session(kind).borrow().is_current(ticket) {
			return Ok(None);
		}

		let hood = corpus.graph().neighborhood(&slug.simplify(), config.depth);
		let theme = Theme::from_css_vars(css_var);
		let pass = RenderPass::build(&hood, &corpus, &self.visited.load(), &config, &theme);
		let (width, height) = surface_size(&container, ScaleConfig::default().min_height);
		debug!(
			"quartz-graph: {} nodes, {} edges on a {}x{} surface",
			pass.nodes().len(),
			pass.edges().len(),
			width,
			height
		);
		let state = GraphState::new(pass, config, theme, slug.clone(), width, height);
		Ok(Some(mount_graph(container, state, Rc::new(navigate))))
	}
}

/// Hands `request` to the router, or falls back to a full page load.
pub fn navigate(request: NavigationRequest) {
	if let Err(e) = try_navigate(&request) {
		error!("quartz-graph: navigation to {} failed: {}", request.target, e);
	}
}

fn try_navigate(request: &NavigationRequest) -> Result<()> {
	let window = window()?;
	let here = window.location().href().map_err(GraphError::from_js)?;
	let url = absolute_url(&here, &request.href).map_err(|e| GraphError::Js(e.to_string()))?;

	let spa = js_sys::Reflect::get(&window, &JsValue::from_str("spaNavigate"))
		.map_err(GraphError::from_js)?;
	match spa.dyn_ref::<js_sys::Function>() {
		Some(spa) => {
			let target = web_sys::Url::new(url.as_str()).map_err(GraphError::from_js)?;
			spa.call1(&window, &target).map_err(GraphError::from_js)?;
		}
		None => window
			.location()
			.set_href(url.as_str())
			.map_err(GraphError::from_js)?,
	}
	Ok(())
}

fn local_storage_available() -> bool {
	web_sys::window()
		.and_then(|w| w.local_storage().ok().flatten())
		.is_some()
}

/// Full slug of the page, from `<body data-slug>`.
fn current_slug() -> Option<FullSlug> {
	web_sys::window()?
		.document()?
		.body()?
		.dataset()
		.get("slug")
		.map(FullSlug::new)
}

fn nav_slug(ev: &Event) -> Option<FullSlug> {
	let detail = ev.dyn_ref::<CustomEvent>()?.detail();
	js_sys::Reflect::get(&detail, &JsValue::from_str("url"))
		.ok()?
		.as_string()
		.map(FullSlug::new)
}

/// The open full-screen overlay. Closing it is dropping it.
struct Overlay {
	outer: HtmlElement,
	sidebar: Option<HtmlElement>,
	body: Option<HtmlElement>,
	_listeners: Vec<EventListener>,
}

impl Overlay {
	fn open(runtime: &Rc<GraphRuntime>) -> Result<Option<Self>> {
		let document = document()?;
		let Some(outer) = document.get_element_by_id(OVERLAY_ID) else {
			return Ok(None);
		};
		let outer: HtmlElement = outer
			.dyn_into()
			.map_err(|_| GraphError::Surface(format!("#{OVERLAY_ID} is not an HTML element")))?;
		let sidebar = outer
			.closest(".sidebar")
			.ok()
			.flatten()
			.and_then(|e| e.dyn_into::<HtmlElement>().ok());

		let overlay = Self {
			_listeners: escape_listeners(&document, &outer, Rc::downgrade(runtime))?,
			outer,
			sidebar,
			body: document.body(),
		};

		// From here on a failure still restores the page when `overlay` drops.
		if let Some(body) = &overlay.body {
			lock_scroll(body)?;
		}
		overlay
			.outer
			.class_list()
			.add_1("active")
			.map_err(GraphError::from_js)?;
		if let Some(sidebar) = &overlay.sidebar {
			sidebar
				.style()
				.set_property("z-index", "1")
				.map_err(GraphError::from_js)?;
		}
		Ok(Some(overlay))
	}
}

impl Drop for Overlay {
	fn drop(&mut self) {
		if let Some(body) = &self.body {
			unlock_scroll(body);
		}
		let _ = self.outer.class_list().remove_1("active");
		if let Some(sidebar) = &self.sidebar {
			let _ = sidebar.style().remove_property("z-index");
		}
	}
}

/// Escape, or a click on the backdrop itself, closes the overlay.
fn escape_listeners(
	document: &Document,
	outer: &HtmlElement,
	runtime: Weak<GraphRuntime>,
) -> Result<Vec<EventListener>> {
	let close = move || {
		let runtime = runtime.clone();
		// Closing drops the listener that is running.
		defer(move || {
			if let Some(runtime) = runtime.upgrade() {
				runtime.close_global();
			}
		});
	};

	let close_click = close.clone();
	let backdrop = outer.clone();
	let on_click = EventListener::new(outer, "click", move |ev: Event| {
		let on_backdrop = ev
			.target()
			.is_some_and(|t| t.dyn_ref::<HtmlElement>() == Some(&backdrop));
		if on_backdrop {
			close_click();
		}
	})?;

	let on_key = EventListener::new(document, "keydown", move |ev: Event| {
		if ev.dyn_ref::<KeyboardEvent>().is_some_and(|k| k.key() == "Escape") {
			close();
		}
	})?;

	Ok(vec![on_click, on_key])
}

fn lock_scroll(body: &HtmlElement) -> Result<()> {
	let scroll_y = window()?.scroll_y().map_err(GraphError::from_js)?;
	let style = body.style();
	style.set_property("position", "fixed").map_err(GraphError::from_js)?;
	style
		.set_property("top", &format!("-{scroll_y}px"))
		.map_err(GraphError::from_js)?;
	style.set_property("width", "100%").map_err(GraphError::from_js)?;
	body.set_attribute("data-scroll-y", &scroll_y.to_string())
		.map_err(GraphError::from_js)
}

fn unlock_scroll(body: &HtmlElement) {
	let style = body.style();
	for property in ["position", "top", "width"] {
		let _ = style.remove_property(property);
	}
	let scroll_y = body
		.get_attribute("data-scroll-y")
		.and_then(|y| y.parse::<f64>().ok());
	let _ = body.remove_attribute("data-scroll-y");
	if let (Some(y), Some(window)) = (scroll_y, web_sys::window()) {
		window.scroll_to_with_x_and_y(0.0, y);
	}
}
