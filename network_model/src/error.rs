use thiserror::Error;

/// Fatal pipeline failures. Anything softer is a warning on the log and the
/// offending item is skipped.
#[derive(Debug, Error)]
pub enum NetError {
    /// An internal id lookup failed; the graph layers disagree about what
    /// exists. Always a programming error upstream, never an input problem.
    #[error("inconsistent topology: {0}")]
    InconsistentTopology(String),

    /// The input referenced an entity it never defined.
    #[error("dangling reference: {0}")]
    DanglingReference(String),
}
