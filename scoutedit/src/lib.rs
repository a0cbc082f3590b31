pub mod config;
pub mod errors;
pub mod filters;
pub mod ignore_spec;
pub mod lines;
pub mod replace;
pub mod results;
pub mod root;
pub mod search;
pub mod storage;
pub mod symbols;
pub mod walk;

pub use config::{EncodingMode, SearchConfig};
pub use errors::{SearchError, SearchResult};
pub use filters::PathFilter;
pub use ignore_spec::IgnoreSpec;
pub use lines::{ContextBlock, ContextLine, LineKind, MatchSpan};
pub use replace::{
    replace_content, replace_in_file, replace_in_tree, FileReplacement, ReplaceMode,
    ReplaceRequest, ReplacementConfig, ReplacementResult,
};
pub use results::{FileResult, Match, ReplaceReport, SearchReport, SearchSummary};
pub use root::ProjectRoot;
pub use search::{search, search_content};
pub use walk::{EnumerateOptions, FileEnumerator};
