//! Vote ledger and per-option tally
//!
//! Every accepted vote writes both structures; a rejected vote writes
//! neither.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::{GovernanceError, Result};
use crate::types::{Address, OptionCode};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VoteRecord {
    /// voter -> chosen option
    ledger: HashMap<Address, OptionCode>,
    /// option -> cumulative count; buckets appear on first vote
    tally: BTreeMap<OptionCode, u64>,
}

impl VoteRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a single vote for `voter`. With `option_limit` set, only
    /// option codes below it are accepted.
    ///
    /// Callers must hold the proposal's lock across this call so the
    /// duplicate check and the insert are not interleaved with another vote.
    pub fn cast(
        &mut self,
        proposal_id: &str,
        voter: &str,
        option: OptionCode,
        option_limit: Option<usize>,
    ) -> Result<()> {
        if self.ledger.contains_key(voter) {
            return Err(GovernanceError::AlreadyVoted {
                proposal_id: proposal_id.to_string(),
                voter: voter.to_string(),
            });
        }
        if let Some(available) = option_limit {
            if option >= available as u64 {
                return Err(GovernanceError::InvalidOption { option, available });
            }
        }

        *self.tally.entry(option).or_insert(0) += 1;
        self.ledger.insert(voter.to_string(), option);
        Ok(())
    }

    /// Every tally bucket equals the number of ledger entries for its option.
    pub fn is_consistent(&self) -> bool {
        let mut expected: BTreeMap<OptionCode, u64> = BTreeMap::new();
        for option in self.ledger.values() {
            *expected.entry(*option).or_insert(0) += 1;
        }
        expected == self.tally
    }

    pub fn has_voted(&self, voter: &str) -> bool {
        self.ledger.contains_key(voter)
    }

    pub fn choice_of(&self, voter: &str) -> Option<OptionCode> {
        self.ledger.get(voter).copied()
    }

    pub fn tally_for(&self, option: OptionCode) -> u64 {
        self.tally.get(&option).copied().unwrap_or(0)
    }

    pub fn tallies(&self) -> &BTreeMap<OptionCode, u64> {
        &self.tally
    }

    /// Number of distinct voters
    pub fn voter_count(&self) -> usize {
        self.ledger.len()
    }

    /// Sum over all tally buckets; equals `voter_count` at all times
    pub fn total_votes(&self) -> u64 {
        self.tally.values().sum()
    }
}
