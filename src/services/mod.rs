//! Pure services: fingerprinting, lifetime policy, normalization, and
//! output rendering. Nothing here touches storage.

pub mod fingerprint;
pub mod normalizer;
pub mod render;
pub mod ttl;

pub use fingerprint::query_fingerprint;
pub use normalizer::{normalize_record, parse_post_timestamp, NormalizedRecord};
pub use render::{render_max, render_min};
pub use ttl::TtlPolicy;
