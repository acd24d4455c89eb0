//! Force-directed knowledge graph.
//!
//! Draws the neighborhood of the current page on an HTML canvas with:
//! - Physics-based node positioning via force simulation
//! - Pan, zoom, node dragging and click-to-navigate
//! - Timed hover transitions for nodes, edges and labels
//! - Theming from the site's CSS custom properties
//!
//! Everything except [`component`] and [`render::paint`] is plain Rust and runs
//! natively, so a view can be driven end to end without a browser:
//!
//! ```ignore
//! let hood = corpus.graph().neighborhood(&focus.simplify(), config.depth);
//! let pass = RenderPass::build(&hood, &corpus, &visited, &config, &theme);
//! let mut state = GraphState::new(pass, config, theme, focus, 800.0, 250.0);
//! state.tick(16.0);
//! let scene = build_scene(&state);
//! ```

pub mod component;
pub mod config;
pub mod interaction;
pub mod layout;
pub mod neighborhood;
pub mod render;
pub mod scale;
pub mod session;
pub mod state;
pub mod theme;
pub mod transition;
pub mod types;

pub use component::{GraphCanvas, MountedGraph, Navigate, mount_graph, surface_size};
pub use config::GraphConfig;
pub use interaction::NavigationRequest;
pub use layout::LayoutEngine;
pub use neighborhood::{LinkEdge, LinkGraph, Neighborhood};
pub use render::{Scene, build_scene};
pub use session::{GraphSession, Phase, Teardown, Ticket};
pub use state::{GraphState, RenderPass, ViewTransform};
pub use theme::Theme;
pub use types::{GraphEdge, GraphNode, Point};
