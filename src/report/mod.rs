//! Comparator payloads: parsing, validation and session loading.

mod comparison;
mod graph;
mod load;
mod parse;

use thiserror::Error;

pub use comparison::{Comparison, PassData, SourceFile, Submission};
pub use graph::{MAX_SIMILARITY, SimilarityGraph, SimilarityLink, SubmissionNode};
pub use load::{Session, SessionSource, load_comparison, load_graph, load_session};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("pass `{pass}` references file `{file_id}` which neither submission contains")]
    UnknownFile { pass: String, file_id: String },
    #[error("file id `{0}` appears more than once across the compared submissions")]
    DuplicateFile(String),
}
