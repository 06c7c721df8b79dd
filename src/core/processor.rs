//! Statistics over imported threads.

use serde::Serialize;

use crate::message::Direction;
use crate::thread::Thread;

/// Counts gathered from a set of threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub threads: usize,
    pub messages: usize,
    pub sent: usize,
    pub received: usize,
    pub drafts: usize,
    /// Messages carrying parts
    pub multimedia: usize,
}

impl ImportStats {
    /// Tallies `threads`.
    ///
    /// ```
    /// use threadpack::core::ImportStats;
    ///
    /// let stats = ImportStats::from_threads(&[]);
    /// assert_eq!(stats.messages, 0);
    /// ```
    pub fn from_threads(threads: &[Thread]) -> Self {
        let mut stats = Self {
            threads: threads.len(),
            ..Self::default()
        };
        for message in threads.iter().flat_map(Thread::messages) {
            stats.messages += 1;
            match message.direction() {
                Direction::Sent => stats.sent += 1,
                Direction::Received => stats.received += 1,
                Direction::Draft => stats.drafts += 1,
            }
            if message.is_multimedia() {
                stats.multimedia += 1;
            }
        }
        stats
    }

    /// Share of messages that were sent, as a percentage.
    pub fn sent_ratio(&self) -> f64 {
        if self.messages == 0 {
            return 0.0;
        }
        self.sent as f64 / self.messages as f64 * 100.0
    }
}
