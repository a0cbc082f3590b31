//! Regex search over a project tree.
//!
//! The work splits into three layers:
//!
//! - [`matcher`]: pure matching over in-memory content. Every match yields a
//!   1-based line span and a labelled context block.
//! - [`processor`]: reads one file and runs the matcher over it.
//! - [`engine`]: enumerates the files selected by a [`SearchConfig`] and
//!   processes them on a rayon pool sized by `thread_count`.
//!
//! Files share no mutable state, so they are processed in any order; the
//! report is keyed by path and therefore comes out the same on every run.
//!
//! ```rust,ignore
//! let config = SearchConfig::new(r"TODO\(\w+\)", ".");
//! let report = scoutedit::search(&config)?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```
//!
//! [`SearchConfig`]: crate::config::SearchConfig
pub mod engine;
pub mod matcher;
pub mod processor;

pub use engine::search;
pub(crate) use engine::{build_pool, chunk_size};
pub use matcher::{compile_search_pattern, search_content, PatternMatcher};
pub use processor::FileProcessor;
