//! Member directory

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{GovernanceError, Result};
use crate::types::{current_timestamp, new_member_id, Address, DaoId, MemberId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Member {
    pub id: MemberId,
    pub dao_id: DaoId,
    pub address: Address,
    pub joined_at: i64,
}

/// Predicates the vote path checks before touching a proposal.
pub trait MemberDirectory: Send + Sync {
    fn is_member(&self, dao_id: &str, address: &str) -> bool;

    /// True when the member record `member_id` exists and belongs to `caller`.
    fn member_identity_matches(&self, member_id: &str, caller: &str) -> bool;
}

#[derive(Default)]
struct MemberIndex {
    members: HashMap<MemberId, Member>,
    by_dao: HashMap<DaoId, HashMap<Address, MemberId>>,
}

#[derive(Default)]
pub struct InMemoryMemberDirectory {
    index: RwLock<MemberIndex>,
}

impl InMemoryMemberDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_members(members: Vec<Member>) -> Self {
        let directory = Self::new();
        {
            let mut index = directory.index.write();
            for member in members {
                index
                    .by_dao
                    .entry(member.dao_id.clone())
                    .or_default()
                    .insert(member.address.clone(), member.id.clone());
                index.members.insert(member.id.clone(), member);
            }
        }
        directory
    }

    pub fn add_member(&self, dao_id: &str, address: Address) -> Result<MemberId> {
        let mut index = self.index.write();

        let dao_members = index.by_dao.entry(dao_id.to_string()).or_default();
        if dao_members.contains_key(&address) {
            return Err(GovernanceError::AlreadyMember {
                dao_id: dao_id.to_string(),
                address,
            });
        }

        let member = Member {
            id: new_member_id(),
            dao_id: dao_id.to_string(),
            address: address.clone(),
            joined_at: current_timestamp(),
        };
        let id = member.id.clone();
        dao_members.insert(address, id.clone());
        index.members.insert(id.clone(), member);

        Ok(id)
    }

    pub fn remove_member(&self, member_id: &str) -> Result<Member> {
        let mut index = self.index.write();

        let member = index
            .members
            .remove(member_id)
            .ok_or_else(|| GovernanceError::MemberNotFound(member_id.to_string()))?;
        if let Some(dao_members) = index.by_dao.get_mut(&member.dao_id) {
            dao_members.remove(&member.address);
        }

        Ok(member)
    }

    pub fn get(&self, member_id: &str) -> Option<Member> {
        self.index.read().members.get(member_id).cloned()
    }

    pub fn member_id_of(&self, dao_id: &str, address: &str) -> Option<MemberId> {
        self.index
            .read()
            .by_dao
            .get(dao_id)
            .and_then(|members| members.get(address).cloned())
    }

    pub fn members_of(&self, dao_id: &str) -> Vec<Member> {
        let index = self.index.read();
        let mut members: Vec<Member> = index
            .by_dao
            .get(dao_id)
            .map(|ids| {
                ids.values()
                    .filter_map(|id| index.members.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        members.sort_by(|a, b| a.address.cmp(&b.address));
        members
    }

    pub fn all(&self) -> Vec<Member> {
        self.index.read().members.values().cloned().collect()
    }
}

impl MemberDirectory for InMemoryMemberDirectory {
    fn is_member(&self, dao_id: &str, address: &str) -> bool {
        self.index
            .read()
            .by_dao
            .get(dao_id)
            .map(|members| members.contains_key(address))
            .unwrap_or(false)
    }

    fn member_identity_matches(&self, member_id: &str, caller: &str) -> bool {
        self.index
            .read()
            .members
            .get(member_id)
            .map(|member| member.address == caller)
            .unwrap_or(false)
    }
}
