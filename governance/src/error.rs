//! Governance error types

use thiserror::Error;

use crate::types::{Address, DaoId, MemberId, OptionCode, ProposalId};

#[derive(Error, Debug)]
pub enum GovernanceError {
    #[error("Caller {0} is not the DAO admin")]
    NotDaoAdmin(Address),

    #[error("Poll proposal requires at least one option")]
    EmptyPollOptions,

    #[error("Already voted: {voter} on {proposal_id}")]
    AlreadyVoted {
        proposal_id: ProposalId,
        voter: Address,
    },

    #[error("{address} is not a member of DAO {dao_id}")]
    NotDaoMember { dao_id: DaoId, address: Address },

    #[error("Member record {0} does not belong to the caller")]
    InvalidMemberId(MemberId),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("DAO not found: {0}")]
    DaoNotFound(DaoId),

    #[error("Proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    #[error("Duplicate proposal id: {0}")]
    DuplicateProposal(ProposalId),

    #[error("Proposal {proposal_id} does not belong to DAO {dao_id}")]
    ProposalDaoMismatch {
        proposal_id: ProposalId,
        dao_id: DaoId,
    },

    #[error("Proposal {0} is no longer accepting votes")]
    ProposalClosed(ProposalId),

    #[error("Invalid option {option}: poll has {available} options")]
    InvalidOption { option: OptionCode, available: usize },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("{address} is already a member of DAO {dao_id}")]
    AlreadyMember { dao_id: DaoId, address: Address },

    #[error("Member not found: {0}")]
    MemberNotFound(MemberId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for GovernanceError {
    fn from(err: serde_json::Error) -> Self {
        GovernanceError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GovernanceError>;
