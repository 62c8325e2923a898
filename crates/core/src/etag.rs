//! Revision-number cache validation tokens.
//!
//! An album's revision number doubles as its ETag: clients echo the token
//! they last saw, and a mutation-free read whose revision is unchanged can
//! be answered with "not modified" without re-serializing the album. These
//! helpers keep the token format in one place without binding the engine to
//! any HTTP framework.

/// Render a revision number as a quoted ETag token.
pub fn revision_etag(revision: i64) -> String {
    format!("\"{revision}\"")
}

/// Check a client-supplied token (quoted or bare) against the current
/// revision.
///
/// Returns `true` when the token matches, i.e. the client's copy is still
/// fresh and the response can be "not modified".
pub fn matches(token: &str, revision: i64) -> bool {
    let bare = token.trim().trim_matches('"');
    bare.parse::<i64>() == Ok(revision)
}
