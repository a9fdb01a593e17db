//! Proposal types and kind-specific extensions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::asset::AssetType;
use crate::error::{GovernanceError, Result};
use crate::types::{current_timestamp, Address, DaoId, OptionCode, ProposalId};
use crate::voting::VoteRecord;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProposalKind {
    Generic,
    Poll,
    CoinTransfer,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProposalStatus {
    /// Accepting votes; the only initial state
    Active,
    Approved,
    Rejected,
}

impl ProposalStatus {
    /// Active -> Approved and Active -> Rejected are the only legal moves.
    pub fn can_transition_to(self, next: ProposalStatus) -> bool {
        matches!(
            (self, next),
            (ProposalStatus::Active, ProposalStatus::Approved)
                | (ProposalStatus::Active, ProposalStatus::Rejected)
        )
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProposalStatus::Active => "Active",
            ProposalStatus::Approved => "Approved",
            ProposalStatus::Rejected => "Rejected",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollExtension {
    options: Vec<String>,
}

impl PollExtension {
    pub fn new<S: Into<String>>(options: Vec<S>) -> Result<Self> {
        if options.is_empty() {
            return Err(GovernanceError::EmptyPollOptions);
        }
        Ok(Self {
            options: options.into_iter().map(Into::into).collect(),
        })
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoinTransferExtension {
    pub asset: AssetType,
    pub amount: u64,
    pub recipient: Address,
}

/// Kind-specific payload, stored inline on the proposal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Extension {
    None,
    Poll(PollExtension),
    CoinTransfer(CoinTransferExtension),
}

impl Extension {
    pub fn kind(&self) -> ProposalKind {
        match self {
            Extension::None => ProposalKind::Generic,
            Extension::Poll(_) => ProposalKind::Poll,
            Extension::CoinTransfer(_) => ProposalKind::CoinTransfer,
        }
    }
}

/// A governance item. Everything except `status` and the votes is fixed
/// at creation; the kind is always that of the extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    id: ProposalId,
    dao_id: DaoId,
    status: ProposalStatus,
    title: String,
    text: String,
    proposer: Address,
    /// Value of the DAO's proposal counter when this proposal was registered
    sequence: u64,
    created_at: i64,
    extension: Extension,
    votes: VoteRecord,
}

/// Everything needed to build a proposal except its sequence number
#[derive(Debug, Clone)]
pub struct ProposalDraft {
    pub dao_id: DaoId,
    pub title: String,
    pub text: String,
    pub proposer: Address,
    pub extension: Extension,
}

impl Proposal {
    pub fn new(id: ProposalId, draft: ProposalDraft, sequence: u64) -> Self {
        Self {
            id,
            dao_id: draft.dao_id,
            status: ProposalStatus::Active,
            title: draft.title,
            text: draft.text,
            proposer: draft.proposer,
            sequence,
            created_at: current_timestamp(),
            extension: draft.extension,
            votes: VoteRecord::new(),
        }
    }

    /// Apply a vote. When `strict_poll_options` is set, poll proposals only
    /// accept option codes that index one of their options.
    pub fn record_vote(
        &mut self,
        voter: &str,
        option: OptionCode,
        strict_poll_options: bool,
    ) -> Result<()> {
        if self.status != ProposalStatus::Active {
            return Err(GovernanceError::ProposalClosed(self.id.clone()));
        }

        let option_limit = match &self.extension {
            Extension::Poll(poll) if strict_poll_options => Some(poll.options().len()),
            _ => None,
        };
        self.votes.cast(&self.id, voter, option, option_limit)
    }

    pub fn set_status(&mut self, next: ProposalStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(GovernanceError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// Check a proposal read back from storage: polls carry options and
    /// every tally bucket is backed by ledger entries.
    pub fn validate(&self) -> Result<()> {
        if let Extension::Poll(poll) = &self.extension {
            if poll.options().is_empty() {
                return Err(GovernanceError::InvalidSnapshot(format!(
                    "poll proposal {} has no options",
                    self.id
                )));
            }
        }
        if !self.votes.is_consistent() {
            return Err(GovernanceError::InvalidSnapshot(format!(
                "tally of proposal {} does not match its voters",
                self.id
            )));
        }
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dao_id(&self) -> &str {
        &self.dao_id
    }

    pub fn kind(&self) -> ProposalKind {
        self.extension.kind()
    }

    pub fn status(&self) -> ProposalStatus {
        self.status
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn proposer(&self) -> &str {
        &self.proposer
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn extension(&self) -> &Extension {
        &self.extension
    }

    pub fn has_voted(&self, voter: &str) -> bool {
        self.votes.has_voted(voter)
    }

    pub fn voter_choice(&self, voter: &str) -> Option<OptionCode> {
        self.votes.choice_of(voter)
    }

    pub fn tally_for(&self, option: OptionCode) -> u64 {
        self.votes.tally_for(option)
    }

    pub fn tallies(&self) -> &BTreeMap<OptionCode, u64> {
        self.votes.tallies()
    }

    pub fn votes(&self) -> &VoteRecord {
        &self.votes
    }

    pub fn poll_options(&self) -> Option<&[String]> {
        match &self.extension {
            Extension::Poll(poll) => Some(poll.options()),
            _ => None,
        }
    }

    pub fn coin_transfer(&self) -> Option<&CoinTransferExtension> {
        match &self.extension {
            Extension::CoinTransfer(transfer) => Some(transfer),
            _ => None,
        }
    }
}
