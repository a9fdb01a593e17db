//! Governance service
//!
//! Entry point for proposal creation and voting. The DAO registry, member
//! directory and proposal store are pluggable; `InMemoryGovernance` wires
//! up the in-memory versions and adds DAO/member administration and
//! JSON snapshots on top.

use log::{debug, info, warn};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::asset::{Asset, AssetType};
use crate::config::GovernanceConfig;
use crate::dao::{Dao, DaoRegistry, InMemoryDaoRegistry};
use crate::error::{GovernanceError, Result};
use crate::membership::{InMemoryMemberDirectory, Member, MemberDirectory};
use crate::proposal::{
    CoinTransferExtension, Extension, PollExtension, Proposal, ProposalDraft, ProposalStatus,
};
use crate::storage::{InMemoryProposalStore, ProposalStore, Snapshot};
use crate::types::{new_proposal_id, Address, DaoId, MemberId, OptionCode, ProposalId};

pub struct Governance<D, M, S> {
    daos: D,
    members: M,
    proposals: S,
    config: GovernanceConfig,
    /// Writers hold it shared; `snapshot` takes it exclusively so the DAO
    /// counters and proposals it copies agree with each other.
    commit_gate: RwLock<()>,
}

impl<D, M, S> Governance<D, M, S>
where
    D: DaoRegistry,
    M: MemberDirectory,
    S: ProposalStore,
{
    pub fn new(daos: D, members: M, proposals: S, config: GovernanceConfig) -> Self {
        Self {
            daos,
            members,
            proposals,
            config,
            commit_gate: RwLock::new(()),
        }
    }

    pub fn create_generic_proposal(
        &self,
        dao_id: &str,
        title: String,
        text: String,
        caller: &str,
    ) -> Result<ProposalId> {
        if title.trim().is_empty() {
            return Err(GovernanceError::EmptyInput("title".to_string()));
        }

        self.create_proposal(ProposalDraft {
            dao_id: dao_id.to_string(),
            title,
            text,
            proposer: caller.to_string(),
            extension: Extension::None,
        })
    }

    pub fn create_poll_proposal<O: Into<String>>(
        &self,
        dao_id: &str,
        text: String,
        options: Vec<O>,
        caller: &str,
    ) -> Result<ProposalId> {
        let poll = PollExtension::new(options)?;

        self.create_proposal(ProposalDraft {
            dao_id: dao_id.to_string(),
            title: self.config.poll_title.clone(),
            text,
            proposer: caller.to_string(),
            extension: Extension::Poll(poll),
        })
    }

    pub fn create_coin_transfer_proposal<A: Asset>(
        &self,
        dao_id: &str,
        text: String,
        amount: u64,
        recipient: Address,
        caller: &str,
    ) -> Result<ProposalId> {
        self.create_coin_transfer_proposal_with_asset(
            AssetType::of::<A>(),
            dao_id,
            text,
            amount,
            recipient,
            caller,
        )
    }

    /// Same as `create_coin_transfer_proposal` with the asset chosen at runtime.
    pub fn create_coin_transfer_proposal_with_asset(
        &self,
        asset: AssetType,
        dao_id: &str,
        text: String,
        amount: u64,
        recipient: Address,
        caller: &str,
    ) -> Result<ProposalId> {
        if asset.is_empty() {
            return Err(GovernanceError::EmptyInput("asset type".to_string()));
        }

        self.create_proposal(ProposalDraft {
            dao_id: dao_id.to_string(),
            title: self.config.coin_transfer_title.clone(),
            text,
            proposer: caller.to_string(),
            extension: Extension::CoinTransfer(CoinTransferExtension {
                asset,
                amount,
                recipient,
            }),
        })
    }

    fn create_proposal(&self, draft: ProposalDraft) -> Result<ProposalId> {
        let dao_id = draft.dao_id.clone();
        let kind = draft.extension.kind();

        let _gate = self.commit_gate.read();
        let (proposal_id, sequence) = self.daos.register_proposal(&dao_id, |sequence| {
            let proposal = Proposal::new(new_proposal_id(), draft, sequence);
            let id = proposal.id().to_string();
            self.proposals.insert(proposal)?;
            Ok(id)
        })?;

        info!(
            "Created {:?} proposal {} in DAO {} (sequence {})",
            kind, proposal_id, dao_id, sequence
        );
        Ok(proposal_id)
    }

    /// Cast `caller`'s single vote on a proposal.
    ///
    /// Checks run in order: DAO exists, caller is a member, `member_id`
    /// belongs to the caller, then under the proposal lock: proposal exists
    /// and belongs to the DAO, is still active, caller has not voted, and
    /// (strict mode only) the option exists on a poll.
    pub fn vote_proposal(
        &self,
        dao_id: &str,
        proposal_id: &str,
        member_id: &str,
        option: OptionCode,
        caller: &str,
    ) -> Result<()> {
        let result = self.try_vote(dao_id, proposal_id, member_id, option, caller);

        match &result {
            Ok(()) => debug!(
                "{} voted option {} on proposal {}",
                caller, option, proposal_id
            ),
            Err(e) => warn!("Rejected vote by {} on {}: {}", caller, proposal_id, e),
        }
        result
    }

    fn try_vote(
        &self,
        dao_id: &str,
        proposal_id: &str,
        member_id: &str,
        option: OptionCode,
        caller: &str,
    ) -> Result<()> {
        if !self.daos.contains(dao_id) {
            return Err(GovernanceError::DaoNotFound(dao_id.to_string()));
        }
        if !self.members.is_member(dao_id, caller) {
            return Err(GovernanceError::NotDaoMember {
                dao_id: dao_id.to_string(),
                address: caller.to_string(),
            });
        }
        if !self.members.member_identity_matches(member_id, caller) {
            return Err(GovernanceError::InvalidMemberId(member_id.to_string()));
        }

        let strict = self.config.strict_poll_options;
        let _gate = self.commit_gate.read();
        self.proposals.update(proposal_id, |proposal| {
            if proposal.dao_id() != dao_id {
                return Err(GovernanceError::ProposalDaoMismatch {
                    proposal_id: proposal.id().to_string(),
                    dao_id: dao_id.to_string(),
                });
            }
            proposal.record_vote(caller, option, strict)
        })
    }

    pub fn has_voted(&self, proposal_id: &str, address: &str) -> Result<bool> {
        self.proposals.read(proposal_id, |p| p.has_voted(address))
    }

    pub fn tally_for(&self, proposal_id: &str, option: OptionCode) -> Result<u64> {
        self.proposals.read(proposal_id, |p| p.tally_for(option))
    }

    pub fn tallies(&self, proposal_id: &str) -> Result<BTreeMap<OptionCode, u64>> {
        self.proposals.read(proposal_id, |p| p.tallies().clone())
    }

    pub fn voter_choice(&self, proposal_id: &str, address: &str) -> Result<Option<OptionCode>> {
        self.proposals.read(proposal_id, |p| p.voter_choice(address))
    }

    pub fn proposal(&self, proposal_id: &str) -> Result<Proposal> {
        self.proposals
            .get(proposal_id)
            .ok_or_else(|| GovernanceError::ProposalNotFound(proposal_id.to_string()))
    }

    pub fn proposals_for(&self, dao_id: &str) -> Result<Vec<Proposal>> {
        if !self.daos.contains(dao_id) {
            return Err(GovernanceError::DaoNotFound(dao_id.to_string()));
        }
        Ok(self.proposals.list_for_dao(dao_id))
    }

    pub fn proposals_count(&self, dao_id: &str) -> Result<u64> {
        self.daos.proposals_count(dao_id)
    }

    /// Record an outcome decided outside this crate. Admin only; moves an
    /// active proposal to Approved or Rejected.
    pub fn resolve_proposal(
        &self,
        dao_id: &str,
        proposal_id: &str,
        outcome: ProposalStatus,
        caller: &str,
    ) -> Result<()> {
        self.ensure_admin(dao_id, caller)?;

        let _gate = self.commit_gate.read();
        self.proposals.update(proposal_id, |proposal| {
            if proposal.dao_id() != dao_id {
                return Err(GovernanceError::ProposalDaoMismatch {
                    proposal_id: proposal.id().to_string(),
                    dao_id: dao_id.to_string(),
                });
            }
            proposal.set_status(outcome)
        })?;

        info!("Proposal {} resolved as {}", proposal_id, outcome);
        Ok(())
    }

    fn ensure_admin(&self, dao_id: &str, caller: &str) -> Result<()> {
        if self.daos.is_admin(dao_id, caller)? {
            Ok(())
        } else {
            Err(GovernanceError::NotDaoAdmin(caller.to_string()))
        }
    }
}

pub type InMemoryGovernance =
    Governance<InMemoryDaoRegistry, InMemoryMemberDirectory, InMemoryProposalStore>;

impl InMemoryGovernance {
    pub fn in_memory(config: GovernanceConfig) -> Self {
        Self::new(
            InMemoryDaoRegistry::new(),
            InMemoryMemberDirectory::new(),
            InMemoryProposalStore::new(),
            config,
        )
    }

    pub fn create_dao(&self, name: String, admin: Address) -> Result<DaoId> {
        if name.trim().is_empty() {
            return Err(GovernanceError::EmptyInput("DAO name".to_string()));
        }
        if admin.trim().is_empty() {
            return Err(GovernanceError::EmptyInput("admin".to_string()));
        }

        let dao_id = {
            let _gate = self.commit_gate.read();
            self.daos.create_dao(name, admin.clone())
        };
        info!("Created DAO {} with admin {}", dao_id, admin);
        Ok(dao_id)
    }

    pub fn dao(&self, dao_id: &str) -> Result<Dao> {
        self.daos
            .get(dao_id)
            .ok_or_else(|| GovernanceError::DaoNotFound(dao_id.to_string()))
    }

    pub fn daos(&self) -> Vec<Dao> {
        self.daos.list()
    }

    /// Credit the DAO's informational treasury balance; returns the new balance.
    pub fn deposit(&self, dao_id: &str, amount: u64) -> Result<u64> {
        let balance = {
            let _gate = self.commit_gate.read();
            self.daos.deposit(dao_id, amount)?
        };
        info!("Deposited {} into DAO {} (balance {})", amount, dao_id, balance);
        Ok(balance)
    }

    pub fn add_member(&self, dao_id: &str, address: Address, caller: &str) -> Result<MemberId> {
        self.ensure_admin(dao_id, caller)?;
        if address.trim().is_empty() {
            return Err(GovernanceError::EmptyInput("member address".to_string()));
        }

        let member_id = {
            let _gate = self.commit_gate.read();
            self.members.add_member(dao_id, address.clone())?
        };
        info!("Added {} to DAO {} as {}", address, dao_id, member_id);
        Ok(member_id)
    }

    /// Votes already cast by the member stay on their proposals.
    pub fn remove_member(&self, dao_id: &str, member_id: &str, caller: &str) -> Result<Member> {
        self.ensure_admin(dao_id, caller)?;
        match self.members.get(member_id) {
            Some(member) if member.dao_id == dao_id => {}
            _ => return Err(GovernanceError::MemberNotFound(member_id.to_string())),
        }

        let member = {
            let _gate = self.commit_gate.read();
            self.members.remove_member(member_id)?
        };
        info!("Removed {} from DAO {}", member.address, dao_id);
        Ok(member)
    }

    pub fn members_of(&self, dao_id: &str) -> Result<Vec<Member>> {
        if !self.daos.contains(dao_id) {
            return Err(GovernanceError::DaoNotFound(dao_id.to_string()));
        }
        Ok(self.members.members_of(dao_id))
    }

    pub fn member_id_of(&self, dao_id: &str, address: &str) -> Option<MemberId> {
        self.members.member_id_of(dao_id, address)
    }

    /// Copy the full state. Blocks writers for the duration, so every
    /// proposal in the copy is counted by its DAO.
    pub fn snapshot(&self) -> Snapshot {
        let _gate = self.commit_gate.write();
        Snapshot {
            daos: self.daos.list(),
            members: self.members.all(),
            proposals: self.proposals.all(),
        }
    }

    /// Rebuild an instance from a snapshot after `Snapshot::validate` accepts it.
    pub fn from_snapshot(snapshot: Snapshot, config: GovernanceConfig) -> Result<Self> {
        snapshot.validate()?;
        Ok(Self::new(
            InMemoryDaoRegistry::from_daos(snapshot.daos),
            InMemoryMemberDirectory::from_members(snapshot.members),
            InMemoryProposalStore::from_proposals(snapshot.proposals),
            config,
        ))
    }

    /// Write the full state as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        fs::write(path.as_ref(), json)?;
        debug!("Saved governance state to {}", path.as_ref().display());
        Ok(())
    }

    /// Load state written by `save`; a missing file gives an empty instance.
    pub fn load<P: AsRef<Path>>(path: P, config: GovernanceConfig) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::in_memory(config));
        }

        let data = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&data)?;
        debug!(
            "Loaded {} DAOs and {} proposals from {}",
            snapshot.daos.len(),
            snapshot.proposals.len(),
            path.display()
        );
        Self::from_snapshot(snapshot, config)
    }
}
