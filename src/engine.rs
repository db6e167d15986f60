//! Rule Resolution
//!
//! Decides, for one genome, which rule produces the extracted region.
//! Rules are tried in priority order; the first rule whose marker has a hit
//! and whose extraction succeeds wins. An extraction that fails because the
//! hit's sequence id is absent from the genome falls through to the next
//! rule. A genome with no successful rule is Missing.

use log::debug;

use crate::hits::{HitMap, RawHit};
use crate::region::{extract_region, ExtractedRegion, Strand};
use crate::rules::{Rule, RuleSet};
use crate::seqio::Genome;

/// Terminal state of a genome after rule resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Extracted {
        rule: Rule,
        strand: Strand,
        region: ExtractedRegion,
    },
    Missing,
}

impl Outcome {
    pub fn is_extracted(&self) -> bool {
        matches!(self, Outcome::Extracted { .. })
    }
}

pub struct RuleEngine<'a> {
    rules: &'a RuleSet,
}

impl<'a> RuleEngine<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self { rules }
    }

    /// Rules with a hit in `hits`, paired with that hit, in priority order.
    pub fn candidates<'h>(&self, hits: &'h HitMap) -> impl Iterator<Item = (&'a Rule, &'h RawHit)> + 'h
    where
        'a: 'h,
    {
        let rules: &'a RuleSet = self.rules;
        rules
            .iter()
            .filter_map(move |rule| hits.get(rule.marker()).map(|hit| (rule, hit)))
    }

    /// Resolves one genome to its outcome. Performs no I/O.
    pub fn resolve(&self, hits: &HitMap, genome: &Genome) -> Outcome {
        for (rule, hit) in self.candidates(hits) {
            match extract_region(hit, rule, genome) {
                Some(region) => {
                    return Outcome::Extracted {
                        rule: rule.clone(),
                        strand: hit.strand,
                        region,
                    }
                }
                None => debug!(
                    "Rule {} matched but sequence '{}' is not in the genome; trying next rule",
                    rule, hit.query_id
                ),
            }
        }
        Outcome::Missing
    }
}
