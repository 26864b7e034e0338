//! Overlap removal for multi-column range sets
//!
//! Flattening a tree only fuses neighbours, which is enough for a single
//! column but not for boxes: two boxes can overlap while disagreeing on
//! several columns. The merger keeps the stored set pairwise disjoint by
//! carving every stored range that overlaps an incoming one into the
//! pieces outside it before the incoming range goes in.

use crate::observability::{Event, Logger, MetricsRegistry};

use super::column_expr::MergePolicy;
use super::errors::{RangeError, RangeErrorCode, RangeResult};
use super::range::Range;
use super::tree::RangeColumnExprTree;

/// Merges a set of ranges into an equivalent set of disjoint ranges
pub struct RangeMerger<'a> {
    policy: MergePolicy,
    metrics: Option<&'a MetricsRegistry>,
}

impl<'a> RangeMerger<'a> {
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            policy,
            metrics: None,
        }
    }

    /// Record counters into `metrics`
    pub fn with_metrics(mut self, metrics: &'a MetricsRegistry) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Returns pairwise disjoint ranges covering exactly the union of
    /// `ranges`, in key order. An empty input yields an empty output.
    pub fn merge(&self, ranges: &[Range]) -> RangeResult<Vec<Range>> {
        let result = self.merge_inner(ranges);
        if let Err(err) = &result {
            if err.code() == RangeErrorCode::AeroRangeTypeMismatch {
                if let Some(metrics) = self.metrics {
                    metrics.increment_compare_failures();
                }
                Logger::warn(
                    Event::CompareFailed.as_str(),
                    &[("code", err.code().code()), ("message", err.message())],
                );
            }
        }
        result
    }

    fn merge_inner(&self, ranges: &[Range]) -> RangeResult<Vec<Range>> {
        let Some((first, rest)) = ranges.split_first() else {
            return Ok(Vec::new());
        };

        let count = ranges.len().to_string();
        Logger::info(
            Event::MergeBegin.as_str(),
            &[("policy", self.policy.as_str()), ("ranges", count.as_str())],
        );

        let mut tree = RangeColumnExprTree::new(first)?;
        let mut inserted = 1u64;
        let mut removed = 0u64;
        let mut empty = u64::from(first.is_empty()?);

        for range in rest {
            if range.is_empty()? {
                empty += 1;
            }
            let connections = tree.find_connections(range)?;
            if let Some(metrics) = self.metrics {
                metrics.increment_connection_queries();
            }

            for stored in connections {
                if stored.overlaps(range)?.is_none() {
                    continue;
                }
                let pieces = stored.remove_overlap(range)?;
                tree.remove(&stored)?;
                removed += 1;
                for piece in &pieces {
                    tree.insert(piece)?;
                }
                inserted += pieces.len() as u64;

                if let Some(metrics) = self.metrics {
                    metrics.increment_overlaps_split();
                }
                if Logger::enabled(crate::observability::Severity::Trace) {
                    let stored_text = stored.to_string();
                    let range_text = range.to_string();
                    let piece_count = pieces.len().to_string();
                    Logger::trace(Event::RangeRemoved.as_str(), &[("range", stored_text.as_str())]);
                    Logger::trace(
                        Event::OverlapSplit.as_str(),
                        &[
                            ("incoming", range_text.as_str()),
                            ("pieces", piece_count.as_str()),
                            ("stored", stored_text.as_str()),
                        ],
                    );
                }
            }

            tree.insert(range)?;
            inserted += 1;
        }

        let collection = tree.get_range_collection_with(self.policy)?;
        // an all-empty input returns one of its empty ranges
        let kept_empty = match collection.as_slice() {
            [only] => only.is_empty()?,
            _ => false,
        };

        if let Some(metrics) = self.metrics {
            metrics.add_ranges_inserted(inserted);
            metrics.add_ranges_removed(removed);
            metrics.add_empty_ranges_discarded(empty.saturating_sub(u64::from(kept_empty)));
            metrics.record_flatten(ranges.len() as u64, collection.len() as u64);
        }

        let emitted = collection.len().to_string();
        Logger::info(
            Event::MergeComplete.as_str(),
            &[("input", count.as_str()), ("output", emitted.as_str())],
        );
        Ok(collection)
    }
}

/// Merges `ranges` into pairwise disjoint ranges covering the same keys.
pub fn remove_overlapping_ranges(ranges: &[Range], policy: MergePolicy) -> RangeResult<Vec<Range>> {
    RangeMerger::new(policy).merge(ranges)
}

/// Checks that no two ranges overlap.
///
/// An overlap here means the merge logic is broken, so the error is FATAL.
pub fn validate_range_collection(ranges: &[Range]) -> RangeResult<()> {
    for (i, a) in ranges.iter().enumerate() {
        for (j, b) in ranges.iter().enumerate().skip(i + 1) {
            if a.overlaps(b)?.is_some() {
                let first = a.to_string();
                let second = b.to_string();
                Logger::fatal(
                    Event::OverlapDetected.as_str(),
                    &[("first", first.as_str()), ("second", second.as_str())],
                );
                return Err(RangeError::overlap_detected(i, j));
            }
        }
    }
    Ok(())
}
