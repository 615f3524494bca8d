//! Readiness-gated access to externally owned windows.
//!
//! Every window interaction is request-open, poll-ready, then act.
//! [`Readiness`] makes that three-way branch explicit.

/// A window that loads its contents asynchronously.
pub trait ResourceWindow {
    /// Whether the contents have finished loading and are safe to read.
    fn is_ready(&self) -> bool;
}

/// Where a window is in its open/load lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Readiness<W> {
    /// Not open; the caller should issue the open command.
    Closed,
    /// Open but still loading; the caller should wait without re-issuing.
    Loading,
    /// Open and loaded.
    Ready(W),
}

impl<W: ResourceWindow> Readiness<W> {
    /// Classifies a window snapshot. An absent window is `Closed`.
    #[must_use]
    pub fn classify(window: Option<W>) -> Self {
        match window {
            None => Self::Closed,
            Some(window) if window.is_ready() => Self::Ready(window),
            Some(_) => Self::Loading,
        }
    }
}
