//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! GET /healthz
//!     → probe.rs: resolve BACKEND_HOST
//!     → GET / on each replica in turn (1s timeout)
//!     → first status < 500 → Healthy
//!     → otherwise Unreachable / Unresolved
//! ```
//!
//! # Design Decisions
//! - Probed on demand; no background monitor and no cached state
//! - Looser threshold than dispatch (< 500 vs < 400)

pub mod probe;

pub use probe::{Liveness, Prober, PROBE_TIMEOUT};
