//! Proposal persistence
//!
//! `ProposalStore` is the boundary between the governance logic and
//! wherever proposals actually live. The in-memory store keeps one
//! entry per proposal; `update` runs with that entry locked.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::dao::Dao;
use crate::error::{GovernanceError, Result};
use crate::membership::Member;
use crate::proposal::Proposal;

pub trait ProposalStore: Send + Sync {
    /// Register a new addressable proposal. Fails if the id is taken.
    fn insert(&self, proposal: Proposal) -> Result<()>;

    fn get(&self, id: &str) -> Option<Proposal>;

    fn contains(&self, id: &str) -> bool;

    /// Read a proposal without cloning it.
    fn read<T, F>(&self, id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&Proposal) -> T;

    /// Mutate a proposal while holding its lock. `f` must either fail
    /// before mutating or succeed.
    fn update<T, F>(&self, id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Proposal) -> Result<T>;

    /// All proposals of a DAO, ordered by sequence
    fn list_for_dao(&self, dao_id: &str) -> Vec<Proposal>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
pub struct InMemoryProposalStore {
    proposals: DashMap<String, Proposal>,
}

impl InMemoryProposalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_proposals(proposals: Vec<Proposal>) -> Self {
        let store = Self::new();
        for proposal in proposals {
            store.proposals.insert(proposal.id().to_string(), proposal);
        }
        store
    }

    pub fn all(&self) -> Vec<Proposal> {
        let mut proposals: Vec<Proposal> =
            self.proposals.iter().map(|p| p.value().clone()).collect();
        proposals.sort_by(|a, b| {
            a.dao_id()
                .cmp(b.dao_id())
                .then(a.sequence().cmp(&b.sequence()))
        });
        proposals
    }
}

impl ProposalStore for InMemoryProposalStore {
    fn insert(&self, proposal: Proposal) -> Result<()> {
        match self.proposals.entry(proposal.id().to_string()) {
            Entry::Occupied(entry) => Err(GovernanceError::DuplicateProposal(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(proposal);
                Ok(())
            }
        }
    }

    fn get(&self, id: &str) -> Option<Proposal> {
        self.proposals.get(id).map(|p| p.value().clone())
    }

    fn contains(&self, id: &str) -> bool {
        self.proposals.contains_key(id)
    }

    fn read<T, F>(&self, id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&Proposal) -> T,
    {
        self.proposals
            .get(id)
            .map(|p| f(p.value()))
            .ok_or_else(|| GovernanceError::ProposalNotFound(id.to_string()))
    }

    fn update<T, F>(&self, id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Proposal) -> Result<T>,
    {
        let mut proposal = self
            .proposals
            .get_mut(id)
            .ok_or_else(|| GovernanceError::ProposalNotFound(id.to_string()))?;
        f(proposal.value_mut())
    }

    fn list_for_dao(&self, dao_id: &str) -> Vec<Proposal> {
        let mut proposals: Vec<Proposal> = self
            .proposals
            .iter()
            .filter(|p| p.dao_id() == dao_id)
            .map(|p| p.value().clone())
            .collect();
        proposals.sort_by_key(|p| p.sequence());
        proposals
    }

    fn len(&self) -> usize {
        self.proposals.len()
    }
}

/// Serializable image of an in-memory governance instance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub daos: Vec<Dao>,
    pub members: Vec<Member>,
    pub proposals: Vec<Proposal>,
}

impl Snapshot {
    /// Reject state that the live service could never have produced.
    ///
    /// Every DAO's `proposal_ids` must list exactly its proposals in
    /// sequence order, sequences must run `0..n` and `proposals_count`
    /// must equal `n`. Members and proposals must point at known DAOs,
    /// and each proposal must pass `Proposal::validate`.
    pub fn validate(&self) -> Result<()> {
        let mut by_dao: HashMap<&str, Vec<&Proposal>> = HashMap::new();
        for dao in &self.daos {
            if by_dao.insert(dao.id.as_str(), Vec::new()).is_some() {
                return Err(invalid(format!("DAO {} appears twice", dao.id)));
            }
        }

        let mut member_ids = HashSet::new();
        let mut memberships = HashSet::new();
        for member in &self.members {
            if !by_dao.contains_key(member.dao_id.as_str()) {
                return Err(invalid(format!(
                    "member {} belongs to unknown DAO {}",
                    member.id, member.dao_id
                )));
            }
            if !member_ids.insert(member.id.as_str())
                || !memberships.insert((member.dao_id.as_str(), member.address.as_str()))
            {
                return Err(invalid(format!("member {} appears twice", member.id)));
            }
        }

        let mut proposal_ids = HashSet::new();
        for proposal in &self.proposals {
            if !proposal_ids.insert(proposal.id()) {
                return Err(invalid(format!("proposal {} appears twice", proposal.id())));
            }
            proposal.validate()?;
            by_dao
                .get_mut(proposal.dao_id())
                .ok_or_else(|| {
                    invalid(format!(
                        "proposal {} belongs to unknown DAO {}",
                        proposal.id(),
                        proposal.dao_id()
                    ))
                })?
                .push(proposal);
        }

        for dao in &self.daos {
            let proposals = by_dao.remove(dao.id.as_str()).unwrap_or_default();
            check_dao_counter(dao, proposals)?;
        }
        Ok(())
    }
}

fn check_dao_counter(dao: &Dao, mut proposals: Vec<&Proposal>) -> Result<()> {
    proposals.sort_by_key(|p| p.sequence());

    if dao.proposals_count != proposals.len() as u64 {
        return Err(invalid(format!(
            "DAO {} counts {} proposals but has {}",
            dao.id,
            dao.proposals_count,
            proposals.len()
        )));
    }
    if dao.proposal_ids.len() != proposals.len() {
        return Err(invalid(format!(
            "DAO {} lists {} proposal ids but has {} proposals",
            dao.id,
            dao.proposal_ids.len(),
            proposals.len()
        )));
    }
    for (position, (listed, proposal)) in dao.proposal_ids.iter().zip(&proposals).enumerate() {
        if proposal.sequence() != position as u64 {
            return Err(invalid(format!("DAO {} is missing sequence {}", dao.id, position)));
        }
        if listed != proposal.id() {
            return Err(invalid(format!(
                "DAO {} lists {} at sequence {} instead of {}",
                dao.id,
                listed,
                position,
                proposal.id()
            )));
        }
    }
    Ok(())
}

fn invalid(reason: String) -> GovernanceError {
    GovernanceError::InvalidSnapshot(reason)
}
