//! Fragment Feeder
//!
//! Imitates an external producer pushing fragments straight into the
//! pipeline's submit function from its own thread, with optional random
//! pauses so several feeders interleave.

use sentinel_core::Fragment;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::trace;

/// Random pause inserted before each fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Jitter {
    max_micros: u64,
}

impl Jitter {
    /// No pauses
    pub fn none() -> Self {
        Self::default()
    }

    /// Pauses drawn uniformly from `0..=max`
    pub fn up_to(max: Duration) -> Self {
        Self {
            max_micros: u64::try_from(max.as_micros()).unwrap_or(u64::MAX),
        }
    }

    /// Sleep for a random duration within the bound
    pub fn pause(&self) {
        if self.max_micros > 0 {
            thread::sleep(Duration::from_micros(fastrand::u64(0..=self.max_micros)));
        }
    }
}

/// Call `submit` once per fragment, in order, on the current thread
pub fn feed_fragments<F>(mut submit: F, fragments: &[Fragment], jitter: Jitter)
where
    F: FnMut(Fragment),
{
    for fragment in fragments {
        jitter.pause();
        trace!(%fragment, "feeding fragment");
        submit(*fragment);
    }
}

/// Run [`feed_fragments`] on a new thread
pub fn spawn_feeder<F>(submit: F, fragments: Vec<Fragment>, jitter: Jitter) -> JoinHandle<()>
where
    F: FnMut(Fragment) + Send + 'static,
{
    thread::spawn(move || feed_fragments(submit, &fragments, jitter))
}
