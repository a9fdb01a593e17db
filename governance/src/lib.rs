//! DAO Governance Module
//!
//! Proposals of three kinds (generic, poll, coin transfer) raised inside a
//! DAO, with one vote per member and a running tally per option code.
//!
//! Status is never changed by voting. Deciding whether a proposal passed
//! is left to whoever holds the DAO admin key (`resolve_proposal`).

pub mod asset;
pub mod config;
pub mod dao;
pub mod error;
pub mod membership;
pub mod proposal;
pub mod service;
pub mod storage;
pub mod types;
pub mod voting;

pub use asset::{Asset, AssetType, NativeCoin};
pub use config::{GovernanceConfig, COIN_TRANSFER_PROPOSAL_TITLE, POLL_PROPOSAL_TITLE};
pub use dao::{Dao, DaoRegistry, InMemoryDaoRegistry};
pub use error::{GovernanceError, Result};
pub use membership::{InMemoryMemberDirectory, Member, MemberDirectory};
pub use proposal::{
    CoinTransferExtension, Extension, PollExtension, Proposal, ProposalDraft, ProposalKind,
    ProposalStatus,
};
pub use service::{Governance, InMemoryGovernance};
pub use storage::{InMemoryProposalStore, ProposalStore, Snapshot};
pub use types::{Address, DaoId, MemberId, OptionCode, ProposalId};
pub use voting::VoteRecord;
