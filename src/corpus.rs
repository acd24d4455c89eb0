//! Corpus metadata published by the site build.
//!
//! The build writes one JSON object mapping every page's full slug to its title,
//! tags and outbound links. It is fetched once and shared by every graph on the
//! page.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use log::info;
use serde::Deserialize;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use crate::components::force_graph::LinkGraph;
use crate::error::{GraphError, Result};
use crate::path::{DocumentId, FullSlug, simplify_slug};

/// Where the site build publishes corpus metadata.
pub const DEFAULT_CONTENT_INDEX: &str = "/static/contentIndex.json";

/// Metadata of one document. Fields the graph does not use are ignored.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ContentDetails {
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default)]
	pub tags: Vec<String>,
	/// Outbound links, as simple slugs.
	#[serde(default)]
	pub links: Vec<String>,
}

/// Every document of the site keyed by its simple slug, plus the link graph.
#[derive(Clone, Debug, Default)]
pub struct CorpusIndex {
	details: BTreeMap<DocumentId, ContentDetails>,
	graph: LinkGraph,
}

impl CorpusIndex {
	/// Decodes the JSON object written by the site build.
	pub fn from_json(raw: &str) -> Result<Self> {
		let entries: BTreeMap<String, ContentDetails> = serde_json::from_str(raw)?;
		Ok(Self::from_entries(
			entries.into_iter().map(|(slug, details)| (FullSlug::new(slug), details)),
		))
	}

	/// Builds the index from `(full slug, details)` pairs.
	pub fn from_entries(entries: impl IntoIterator<Item = (FullSlug, ContentDetails)>) -> Self {
		let details: BTreeMap<DocumentId, ContentDetails> = entries
			.into_iter()
			.map(|(slug, details)| (slug.simplify(), details))
			.collect();

		let outbound: Vec<(&DocumentId, Vec<DocumentId>)> = details
			.iter()
			.map(|(id, d)| (id, d.links.iter().map(|l| simplify_slug(l)).collect()))
			.collect();
		let graph = LinkGraph::from_outbound(outbound.iter().map(|(id, links)| (*id, links)));

		Self { details, graph }
	}

	/// Link graph between known documents.
	pub fn graph(&self) -> &LinkGraph {
		&self.graph
	}

	/// Metadata of `id`, if the site knows it.
	pub fn details(&self, id: &DocumentId) -> Option<&ContentDetails> {
		self.details.get(id)
	}

	/// Number of known documents.
	pub fn len(&self) -> usize {
		self.details.len()
	}

	/// Whether the corpus has no documents.
	pub fn is_empty(&self) -> bool {
		self.details.is_empty()
	}
}

/// Corpus indexes already fetched, keyed by URL.
///
/// Only successful fetches are remembered, so a failure is retried by the next
/// render pass rather than within the current one.
#[derive(Debug, Default)]
pub struct CorpusCache {
	entries: RefCell<HashMap<String, Rc<CorpusIndex>>>,
}

impl CorpusCache {
	/// Returns the index at `url`, fetching it the first time.
	pub async fn load(&self, url: &str) -> Result<Rc<CorpusIndex>> {
		if let Some(index) = self.entries.borrow().get(url) {
			return Ok(index.clone());
		}
		let index = Rc::new(fetch_corpus(url).await?);
		info!(
			"quartz-graph: loaded {} documents, {} links",
			index.len(),
			index.graph().edges().len()
		);
		self.entries
			.borrow_mut()
			.insert(url.to_string(), index.clone());
		Ok(index)
	}
}

/// Fetches and decodes the corpus index at `url`.
pub async fn fetch_corpus(url: &str) -> Result<CorpusIndex> {
	let fetch_err = |e| GraphError::Fetch(GraphError::from_js(e).to_string());
	let window = web_sys::window().ok_or_else(|| GraphError::Fetch("no window".into()))?;

	let response: Response = JsFuture::from(window.fetch_with_str(url))
		.await
		.map_err(fetch_err)?
		.dyn_into()
		.map_err(|_| GraphError::Fetch(format!("{url}: not a response")))?;
	if !response.ok() {
		return Err(GraphError::Fetch(format!("{url}: HTTP {}", response.status())));
	}

	let text = JsFuture::from(response.text().map_err(fetch_err)?)
		.await
		.map_err(fetch_err)?
		.as_string()
		.ok_or_else(|| GraphError::Fetch(format!("{url}: body is not text")))?;
	CorpusIndex::from_json(&text)
}
