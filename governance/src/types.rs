//! Identifier types shared across the crate

/// Identity of an account (proposer, voter, admin, recipient).
pub type Address = String;

pub type DaoId = String;
pub type ProposalId = String;
pub type MemberId = String;

/// Index of the option a vote is cast for.
pub type OptionCode = u64;

pub(crate) fn new_dao_id() -> DaoId {
    format!("dao-{}", uuid::Uuid::new_v4())
}

pub(crate) fn new_proposal_id() -> ProposalId {
    format!("proposal-{}", uuid::Uuid::new_v4())
}

pub(crate) fn new_member_id() -> MemberId {
    format!("member-{}", uuid::Uuid::new_v4())
}

pub(crate) fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
