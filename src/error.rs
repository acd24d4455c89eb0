//! Error type shared by every fallible graph operation.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Reasons a render pass or one of its collaborators can fail.
#[derive(Debug, Error)]
pub enum GraphError {
	/// The container's `data-cfg` attribute is missing, unparsable or out of range.
	#[error("invalid graph configuration: {0}")]
	Config(String),

	/// The corpus metadata could not be decoded.
	#[error("corpus metadata is malformed: {0}")]
	Corpus(#[from] serde_json::Error),

	/// The corpus metadata request failed.
	#[error("failed to fetch corpus metadata: {0}")]
	Fetch(String),

	/// Persistent storage rejected a read or write.
	#[error("storage unavailable: {0}")]
	Storage(String),

	/// The drawing surface could not be created.
	#[error("render surface unavailable: {0}")]
	Surface(String),

	/// Any other failure surfaced by a browser API.
	#[error("browser error: {0}")]
	Js(String),
}

impl GraphError {
	/// Converts a thrown JavaScript value into a [`GraphError::Js`].
	pub fn from_js(value: JsValue) -> Self {
		let message = value
			.as_string()
			.or_else(|| {
				js_sys::Reflect::get(&value, &JsValue::from_str("message"))
					.ok()
					.and_then(|m| m.as_string())
			})
			.unwrap_or_else(|| format!("{value:?}"));
		GraphError::Js(message)
	}
}

/// Shorthand for results carrying a [`GraphError`].
pub type Result<T> = std::result::Result<T, GraphError>;
