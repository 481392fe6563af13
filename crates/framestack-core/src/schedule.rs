//! Coalescing of recompute requests.
//!
//! Parameter changes arrive faster than a stitch finishes. At most one
//! recompute runs at a time; while it runs, newer requests replace each
//! other and only the latest one is run afterwards.

/// Queue holding at most one running and one pending request.
#[derive(Debug, Clone)]
pub struct RecomputeQueue<T> {
    in_flight: bool,
    pending: Option<T>,
}

impl<T> Default for RecomputeQueue<T> {
    fn default() -> Self {
        Self {
            in_flight: false,
            pending: None,
        }
    }
}

impl<T> RecomputeQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a request.
    ///
    /// Returns `Some(request)` if nothing is running: the caller must run it
    /// now and call [`complete`](Self::complete) when done. Otherwise the
    /// request is parked, replacing any older parked one, and `None` is
    /// returned.
    pub fn request(&mut self, request: T) -> Option<T> {
        if self.in_flight {
            if self.pending.replace(request).is_some() {
                log::debug!("recompute request superseded");
            }
            return None;
        }
        self.in_flight = true;
        Some(request)
    }

    /// Mark the running request as finished.
    ///
    /// Returns the parked request, which is now the running one, or `None`
    /// if the queue went idle.
    pub fn complete(&mut self) -> Option<T> {
        match self.pending.take() {
            Some(next) => Some(next),
            None => {
                self.in_flight = false;
                None
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}
