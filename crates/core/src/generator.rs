//! Generator trait implemented by every model backend.

use crate::{Generation, Request, Result};
use std::future::Future;

/// A model backend that turns a [`Request`] into a stream of fragments.
///
/// Constructors are inherent methods on each backend, never called
/// polymorphically. Uses RPITIT for async without boxing.
pub trait Generator: Send + Sync {
    /// Whether the backend's credential or resource is present.
    ///
    /// Must not perform I/O.
    fn is_available(&self) -> bool;

    /// Start generating.
    ///
    /// Setup failures are returned here; failures while producing tokens
    /// arrive as `Err` items on the returned stream.
    fn generate(&self, request: &Request) -> impl Future<Output = Result<Generation>> + Send;
}
