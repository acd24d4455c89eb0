//! Slug handling and relative URL resolution.
//!
//! Pages are announced by their *full* slug (`notes/index`, `posts/rust`), while the
//! graph keys documents by their *simple* slug, which drops a trailing `index`
//! segment. Links between pages are written relative to the current page so the
//! site works under any base path.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Stable identifier of a document in the graph (its simple slug).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
	/// Wraps an already simplified slug.
	pub fn new(slug: impl Into<String>) -> Self {
		Self(slug.into())
	}

	/// The slug as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for DocumentId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for DocumentId {
	fn from(slug: &str) -> Self {
		Self::new(slug)
	}
}

/// Full slug of a page as reported by the router.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FullSlug(String);

impl FullSlug {
	/// Wraps a full slug, e.g. `notes/index`.
	pub fn new(slug: impl Into<String>) -> Self {
		Self(slug.into())
	}

	/// The slug as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Reduces the full slug to the document identifier used by the graph.
	pub fn simplify(&self) -> DocumentId {
		simplify_slug(&self.0)
	}
}

impl fmt::Display for FullSlug {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

fn ends_with_segment(s: &str, suffix: &str) -> bool {
	s == suffix || s.ends_with(&format!("/{suffix}"))
}

fn trim_segment_suffix<'a>(s: &'a str, suffix: &str) -> &'a str {
	if ends_with_segment(s, suffix) {
		&s[..s.len() - suffix.len()]
	} else {
		s
	}
}

fn strip_slashes(s: &str, only_prefix: bool) -> &str {
	let s = s.strip_prefix('/').unwrap_or(s);
	if only_prefix {
		s
	} else {
		s.strip_suffix('/').unwrap_or(s)
	}
}

/// Drops a trailing `index` segment and the leading slash; the site root becomes `/`.
pub fn simplify_slug(slug: &str) -> DocumentId {
	let res = strip_slashes(trim_segment_suffix(slug, "index"), true);
	if res.is_empty() {
		DocumentId::new("/")
	} else {
		DocumentId::new(res)
	}
}

/// Relative path from the directory of `slug` back to the site root.
pub fn path_to_root(slug: &FullSlug) -> String {
	let segments = slug.as_str().split('/').filter(|s| !s.is_empty()).count();
	if segments <= 1 {
		".".to_string()
	} else {
		vec![".."; segments - 1].join("/")
	}
}

/// Joins path segments, dropping empty ones and keeping the outer slashes.
pub fn join_segments(segments: &[&str]) -> String {
	let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
		return String::new();
	};

	let mut joined = segments
		.iter()
		.filter(|s| !s.is_empty() && **s != "/")
		.map(|s| strip_slashes(s, false))
		.collect::<Vec<_>>()
		.join("/");

	if first.starts_with('/') {
		joined.insert(0, '/');
	}
	if last.ends_with('/') {
		joined.push('/');
	}
	joined
}

/// Link from the page `current` to the document `target`, relative to `current`.
pub fn resolve_relative(current: &FullSlug, target: &DocumentId) -> String {
	join_segments(&[&path_to_root(current), target.as_str()])
}

/// Resolves a relative link against the absolute URL of the current page.
pub fn absolute_url(base: &str, relative: &str) -> Result<Url, url::ParseError> {
	Url::parse(base)?.join(relative)
}
