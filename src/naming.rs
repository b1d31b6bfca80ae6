//! Collision-safe naming for generated design artifacts.
//!
//! A generated design file gets a file-system-safe name derived from the
//! requested report name. If the first candidate is taken, probing appends
//! a monotonically increasing `_generated(N)` suffix until a free name is
//! found. The legacy flow checked for collisions and then used the name
//! without a reservation barrier, so two concurrent generations could race
//! to the same name; here the index must reserve a candidate before the
//! resolver returns it, and a lost reservation simply resumes probing.

use thiserror::Error;

/// Probe ceiling. A well-formed index collides at most once per existing
/// artifact, so hitting the cap means the index itself is inconsistent.
const MAX_PROBES: u32 = 10_000;

/// Result type for naming operations.
pub type NamingResult<T> = Result<T, NamingError>;

/// Errors raised while resolving a unique artifact name.
#[derive(Error, Debug)]
pub enum NamingError {
    /// The probe loop never found a reservable name. Fatal: the caller
    /// must not retry automatically.
    #[error("could not resolve a unique name for '{base}' after {probes} probes")]
    Exhausted { base: String, probes: u32 },
}

/// Index of persisted artifact names, with reservation.
///
/// `reserve` must be atomic with respect to concurrent reservations of the
/// same name: exactly one caller wins, the rest see `false` and keep
/// probing.
pub trait ArtifactIndex {
    /// Whether any persisted artifact already uses `name`.
    fn is_taken(&self, name: &str) -> bool;

    /// Claim `name`. Returns false if it was taken concurrently.
    fn reserve(&self, name: &str) -> bool;
}

/// Resolve and reserve a unique artifact name for `base`.
///
/// Candidates are probed in order: `{base}_generated`,
/// `{base}_generated(1)`, `{base}_generated(2)`, … The returned name is
/// already reserved in the index.
pub fn resolve_unique_name(base: &str, index: &dyn ArtifactIndex) -> NamingResult<String> {
    let mut probes = 0u32;
    loop {
        let candidate = if probes == 0 {
            format!("{}_generated", base)
        } else {
            format!("{}_generated({})", base, probes)
        };
        probes += 1;
        if probes > MAX_PROBES {
            return Err(NamingError::Exhausted {
                base: base.to_string(),
                probes: MAX_PROBES,
            });
        }
        if index.is_taken(&candidate) {
            continue;
        }
        if index.reserve(&candidate) {
            return Ok(candidate);
        }
        // Lost the reservation race; the next probe re-checks from here.
    }
}
