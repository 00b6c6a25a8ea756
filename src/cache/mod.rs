//! Content fingerprints for staleness checks.
//!
//! Resolution results carry the fingerprint of the metadata they were computed
//! from. A caller holding a previous result passes it back in, and the
//! resolver skips the work when the fingerprints agree. No state is kept here.

mod hash;
pub use hash::{compute_hash, short_hash};
