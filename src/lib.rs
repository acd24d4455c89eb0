//! quartz-graph: interactive force-directed knowledge graph for Quartz sites.
//!
//! This crate renders the link neighborhood of the current page on a canvas,
//! lays it out with a physics simulation and lets readers drag, zoom, hover and
//! click through to linked pages. A second, full-screen view of the whole corpus
//! opens with Ctrl/Cmd+G.

use log::{Level, info};

pub mod components;
pub mod corpus;
pub mod dom;
pub mod error;
pub mod path;
pub mod runtime;
pub mod visited;

pub use components::force_graph::{
	GraphCanvas, GraphConfig, GraphState, LinkGraph, NavigationRequest, Neighborhood, RenderPass,
};
pub use corpus::CorpusIndex;
pub use error::{GraphError, Result};
pub use path::{DocumentId, FullSlug};
pub use runtime::start;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("quartz-graph: logging initialized");
}
