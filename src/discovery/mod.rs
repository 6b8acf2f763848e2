//! Replica discovery subsystem.
//!
//! # Data Flow
//! ```text
//! BACKEND_HOST
//!     → resolver.rs (fresh name lookup per call)
//!     → de-duplicate, pair with BACKEND_PORT
//!     → endpoint.rs (one Endpoint per replica)
//!     → dispatch / health
//! ```
//!
//! # Design Decisions
//! - The endpoint set is fixed for the duration of one dispatch
//! - Zero addresses is an error, never an empty success

pub mod endpoint;
pub mod resolver;

pub use endpoint::Endpoint;
pub use resolver::{DnsResolver, Resolve, ResolveError, StaticResolver};
