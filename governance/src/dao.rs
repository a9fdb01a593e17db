//! DAO registry
//!
//! Holds each DAO's admin, its append-only proposal id list and the
//! proposal counter that hands out sequence numbers.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::{GovernanceError, Result};
use crate::types::{current_timestamp, new_dao_id, Address, DaoId, ProposalId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dao {
    pub id: DaoId,
    pub name: String,
    pub admin: Address,
    pub proposal_ids: Vec<ProposalId>,
    pub proposals_count: u64,
    /// Informational only, proposals never move funds
    pub treasury_balance: u64,
    pub created_at: i64,
}

impl Dao {
    pub fn new(name: String, admin: Address) -> Self {
        Self {
            id: new_dao_id(),
            name,
            admin,
            proposal_ids: Vec::new(),
            proposals_count: 0,
            treasury_balance: 0,
            created_at: current_timestamp(),
        }
    }
}

/// What the proposal store needs from the DAO side.
pub trait DaoRegistry: Send + Sync {
    fn contains(&self, dao_id: &str) -> bool;

    fn proposals_count(&self, dao_id: &str) -> Result<u64>;

    fn proposal_ids(&self, dao_id: &str) -> Result<Vec<ProposalId>>;

    fn is_admin(&self, dao_id: &str, address: &str) -> Result<bool>;

    /// Hand the current `proposals_count` to `commit` as the new proposal's
    /// sequence. If `commit` succeeds its id is appended and the counter
    /// incremented; if it fails the DAO is left untouched. The whole step
    /// is serialized per DAO.
    fn register_proposal<F>(&self, dao_id: &str, commit: F) -> Result<(ProposalId, u64)>
    where
        F: FnOnce(u64) -> Result<ProposalId>;
}

#[derive(Default)]
pub struct InMemoryDaoRegistry {
    daos: DashMap<DaoId, Dao>,
}

impl InMemoryDaoRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_daos(daos: Vec<Dao>) -> Self {
        let registry = Self::new();
        for dao in daos {
            registry.daos.insert(dao.id.clone(), dao);
        }
        registry
    }

    pub fn create_dao(&self, name: String, admin: Address) -> DaoId {
        let dao = Dao::new(name, admin);
        let id = dao.id.clone();
        self.daos.insert(id.clone(), dao);
        id
    }

    pub fn get(&self, dao_id: &str) -> Option<Dao> {
        self.daos.get(dao_id).map(|dao| dao.value().clone())
    }

    pub fn list(&self) -> Vec<Dao> {
        let mut daos: Vec<Dao> = self.daos.iter().map(|dao| dao.value().clone()).collect();
        daos.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        daos
    }

    pub fn deposit(&self, dao_id: &str, amount: u64) -> Result<u64> {
        let mut dao = self
            .daos
            .get_mut(dao_id)
            .ok_or_else(|| GovernanceError::DaoNotFound(dao_id.to_string()))?;
        dao.treasury_balance = dao.treasury_balance.saturating_add(amount);
        Ok(dao.treasury_balance)
    }

    pub fn len(&self) -> usize {
        self.daos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.daos.is_empty()
    }
}

impl DaoRegistry for InMemoryDaoRegistry {
    fn contains(&self, dao_id: &str) -> bool {
        self.daos.contains_key(dao_id)
    }

    fn proposals_count(&self, dao_id: &str) -> Result<u64> {
        self.daos
            .get(dao_id)
            .map(|dao| dao.proposals_count)
            .ok_or_else(|| GovernanceError::DaoNotFound(dao_id.to_string()))
    }

    fn proposal_ids(&self, dao_id: &str) -> Result<Vec<ProposalId>> {
        self.daos
            .get(dao_id)
            .map(|dao| dao.proposal_ids.clone())
            .ok_or_else(|| GovernanceError::DaoNotFound(dao_id.to_string()))
    }

    fn is_admin(&self, dao_id: &str, address: &str) -> Result<bool> {
        self.daos
            .get(dao_id)
            .map(|dao| dao.admin == address)
            .ok_or_else(|| GovernanceError::DaoNotFound(dao_id.to_string()))
    }

    fn register_proposal<F>(&self, dao_id: &str, commit: F) -> Result<(ProposalId, u64)>
    where
        F: FnOnce(u64) -> Result<ProposalId>,
    {
        // get_mut holds the shard write lock until `dao` drops
        let mut dao = self
            .daos
            .get_mut(dao_id)
            .ok_or_else(|| GovernanceError::DaoNotFound(dao_id.to_string()))?;

        let sequence = dao.proposals_count;
        let proposal_id = commit(sequence)?;
        dao.proposal_ids.push(proposal_id.clone());
        dao.proposals_count += 1;

        Ok((proposal_id, sequence))
    }
}
