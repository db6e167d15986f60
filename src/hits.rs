//! Hit Selection
//!
//! Reduces the aligner's records for one genome to a single hit per marker.
//! The first record seen for a marker wins, so the aligner must report hits
//! in descending quality order. When bit scores are available a violation of
//! that ordering is logged; the first hit is still kept.

use log::warn;
use rustc_hash::FxHashMap;

use crate::blast::BlastRecord;
use crate::region::{PhysicalInterval, Strand};

/// Best hit of one marker against one genome.
#[derive(Debug, Clone, PartialEq)]
pub struct RawHit {
    /// Genome sequence id the marker aligned to.
    pub query_id: String,
    /// 1-based start as reported.
    pub start: usize,
    /// 1-based end as reported.
    pub end: usize,
    pub strand: Strand,
    pub bit_score: Option<f64>,
}

impl RawHit {
    pub fn interval(&self) -> PhysicalInterval {
        PhysicalInterval::from_one_based(self.start, self.end)
    }
}

impl From<BlastRecord> for RawHit {
    fn from(record: BlastRecord) -> Self {
        Self {
            query_id: record.query_id,
            start: record.start,
            end: record.end,
            strand: record.strand,
            bit_score: record.bit_score,
        }
    }
}

/// Marker name → selected hit, built fresh for every genome.
#[derive(Debug, Clone, Default)]
pub struct HitMap {
    hits: FxHashMap<String, RawHit>,
}

impl HitMap {
    pub fn get(&self, marker: &str) -> Option<&RawHit> {
        self.hits.get(marker)
    }

    pub fn contains(&self, marker: &str) -> bool {
        self.hits.contains_key(marker)
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Builds a [`HitMap`] keeping the first record per marker.
#[derive(Debug, Default)]
pub struct HitSelector {
    map: HitMap,
    discarded: usize,
    order_violations: usize,
}

impl HitSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers one record; returns `true` if it became the marker's hit.
    pub fn offer(&mut self, record: BlastRecord) -> bool {
        if let Some(kept) = self.map.hits.get(&record.marker_id) {
            if let (Some(kept_score), Some(score)) = (kept.bit_score, record.bit_score) {
                if score > kept_score {
                    self.order_violations += 1;
                    warn!(
                        "Aligner output not ordered by score for marker {}: kept {} but later hit scores {}",
                        record.marker_id, kept_score, score
                    );
                }
            }
            self.discarded += 1;
            return false;
        }

        let marker = record.marker_id.clone();
        self.map.hits.insert(marker, RawHit::from(record));
        true
    }

    /// Number of records dropped because their marker already had a hit.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Later hits that outscored the retained one.
    pub fn order_violations(&self) -> usize {
        self.order_violations
    }

    pub fn finish(self) -> HitMap {
        self.map
    }

    /// Selects hits from a full record stream in one call.
    pub fn select<I>(records: I) -> HitMap
    where
        I: IntoIterator<Item = BlastRecord>,
    {
        let mut selector = Self::new();
        for record in records {
            selector.offer(record);
        }
        selector.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blast::parse_records;

    #[test]
    fn test_first_hit_wins() {
        let records = parse_records(
            "chr1\tNS1\t500\t520\tplus\t40\n\
             chr1\tNS1\t7000\t7020\tplus\t30\n\
             chr2\tLN7\t9820\t9800\tminus\t38\n",
        );
        let hits = HitSelector::select(records);

        assert_eq!(hits.len(), 2);
        let ns1 = hits.get("NS1").unwrap();
        assert_eq!((ns1.start, ns1.end), (500, 520));
        assert_eq!(hits.get("LN7").unwrap().query_id, "chr2");
        assert!(!hits.contains("ITS"));
    }

    #[test]
    fn test_empty_output_yields_empty_map() {
        let hits = HitSelector::select(Vec::new());
        assert!(hits.is_empty());
    }

    #[test]
    fn test_order_violation_is_counted_not_fixed() {
        let mut selector = HitSelector::new();
        let records = parse_records(
            "chr1\tNS1\t500\t520\tplus\t20\n\
             chr1\tNS1\t800\t820\tplus\t45\n\
             chr1\tNS1\t900\t920\tplus\n",
        );
        let retained: Vec<bool> = records.into_iter().map(|r| selector.offer(r)).collect();

        assert_eq!(retained, vec![true, false, false]);
        assert_eq!(selector.discarded(), 2);
        assert_eq!(selector.order_violations(), 1);
        assert_eq!(selector.finish().get("NS1").unwrap().start, 500);
    }

    #[test]
    fn test_interval_from_reverse_hit() {
        let records = parse_records("chr1\tLN7\t9820\t9800\tminus\n");
        let hits = HitSelector::select(records);
        let iv = hits.get("LN7").unwrap().interval();
        assert_eq!((iv.lo, iv.hi), (9799, 9820));
    }
}
