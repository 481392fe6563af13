//! Concurrent image loading with a per-item timeout.
//!
//! The loader does not know how bytes are fetched or how time passes: the
//! caller supplies a `load` function returning a future per item and a
//! `sleep` function returning a timer future. This keeps it usable from a
//! browser event loop as well as from a native runtime.

use std::fmt::Display;
use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use futures_util::future::{join_all, select, Either};
use thiserror::Error;

/// How long a single image may take to load before it is given up on.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Why one item of a batch was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadFailure {
    /// The timer fired before the load finished.
    #[error("Image {index} did not load within {}s", .timeout.as_secs_f64())]
    DecodeTimeout { index: usize, timeout: Duration },

    /// The load itself reported an error.
    #[error("Image {index} failed to load: {message}")]
    Failed { index: usize, message: String },
}

impl LoadFailure {
    /// Input position of the item that failed.
    pub fn index(&self) -> usize {
        match self {
            LoadFailure::DecodeTimeout { index, .. } | LoadFailure::Failed { index, .. } => {
                *index
            }
        }
    }
}

/// Outcome of [`load_all`].
#[derive(Debug)]
pub struct LoadReport<T> {
    /// Successful loads with their input index, in input order.
    pub loaded: Vec<(usize, T)>,
    /// Dropped items, in input order.
    pub failures: Vec<LoadFailure>,
}

impl<T> LoadReport<T> {
    /// The loaded values alone, in input order.
    pub fn into_values(self) -> Vec<T> {
        self.loaded.into_iter().map(|(_, value)| value).collect()
    }

    /// True when nothing loaded.
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}

/// Start every load at once and wait for all of them.
///
/// Each load races its own `sleep(timeout)` future. Loads that time out or
/// fail are logged and reported in [`LoadReport::failures`]; they never abort
/// the batch. Results keep their input positions no matter which load
/// finished first.
pub async fn load_all<I, T, E, L, LF, S, SF>(
    items: I,
    timeout: Duration,
    mut load: L,
    mut sleep: S,
) -> LoadReport<T>
where
    I: IntoIterator,
    E: Display,
    L: FnMut(I::Item) -> LF,
    LF: Future<Output = Result<T, E>>,
    S: FnMut(Duration) -> SF,
    SF: Future<Output = ()>,
{
    let attempts: Vec<_> = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let pending = load(item);
            let timer = sleep(timeout);
            async move {
                let pending = pin!(pending);
                let timer = pin!(timer);
                match select(pending, timer).await {
                    Either::Left((Ok(value), _)) => Ok((index, value)),
                    Either::Left((Err(e), _)) => Err(LoadFailure::Failed {
                        index,
                        message: e.to_string(),
                    }),
                    Either::Right(((), _)) => {
                        Err(LoadFailure::DecodeTimeout { index, timeout })
                    }
                }
            }
        })
        .collect();

    let mut report = LoadReport {
        loaded: Vec::with_capacity(attempts.len()),
        failures: Vec::new(),
    };

    for outcome in join_all(attempts).await {
        match outcome {
            Ok(entry) => report.loaded.push(entry),
            Err(failure) => {
                log::warn!("{}", failure);
                report.failures.push(failure);
            }
        }
    }

    log::debug!(
        "loaded {} images, dropped {}",
        report.loaded.len(),
        report.failures.len()
    );
    report
}
