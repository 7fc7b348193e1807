/*
    Reportann (clinical report annotation transcoder)

    Licensed under the GNU General Public License v3
*/

//! Batch flushing policies: when does the accumulated flat stream (plus its
//! tags and attributes) get written out to a new file pair, and under what
//! label.
//!
//! The two policies are mutually exclusive per invocation: either a batch per
//! report group, flushed whenever the group id changes, or fixed-count
//! chunking with an index-range label. Both flush once more unconditionally
//! at end of stream if any content remains buffered (the driver's job).

/// A batch flushing policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushPolicy {
    /// Flush immediately before starting a record whose group id differs from
    /// the running group id
    GroupChange,
    /// Flush every N records
    FixedCount(usize),
}

impl FlushPolicy {
    /// Decides whether the buffer must be flushed *before* accepting the
    /// record at `record_index` (1-based). `previous_group` is the group id
    /// of the batch currently being accumulated, `None` when nothing is
    /// buffered yet.
    pub fn should_flush(
        &self,
        current_group: &str,
        previous_group: Option<&str>,
        record_index: usize,
    ) -> bool {
        match self {
            FlushPolicy::GroupChange => {
                matches!(previous_group, Some(previous) if previous != current_group)
            }
            FlushPolicy::FixedCount(n) => {
                debug_assert!(*n > 0);
                record_index > 1 && (record_index - 1) % n == 0
            }
        }
    }

    /// The output key for a flushed batch: disjoint between batches. Group
    /// batches are labelled by their group id; fixed-count batches by the
    /// 1-based inclusive index range of the records they contain.
    pub fn batch_label(&self, group: &str, first_index: usize, last_index: usize) -> String {
        match self {
            FlushPolicy::GroupChange => group.to_string(),
            FlushPolicy::FixedCount(_) => format!("{}-{}", first_index, last_index),
        }
    }
}
