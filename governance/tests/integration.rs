use dao_governance::*;

struct Fixture {
    gov: InMemoryGovernance,
    dao: DaoId,
}

impl Fixture {
    fn new() -> Self {
        let gov = InMemoryGovernance::in_memory(GovernanceConfig::default());
        let dao = gov
            .create_dao("Builders Guild".to_string(), "admin".to_string())
            .unwrap();
        Self { gov, dao }
    }

    fn member(&self, address: &str) -> MemberId {
        self.gov
            .add_member(&self.dao, address.to_string(), "admin")
            .unwrap()
    }

    fn generic(&self, title: &str) -> ProposalId {
        self.gov
            .create_generic_proposal(&self.dao, title.to_string(), "text".to_string(), "admin")
            .unwrap()
    }
}

#[test]
fn test_sequences_strictly_increasing() {
    let fx = Fixture::new();

    let ids: Vec<ProposalId> = (0..5).map(|i| fx.generic(&format!("P{}", i))).collect();

    for (expected, id) in ids.iter().enumerate() {
        assert_eq!(fx.gov.proposal(id).unwrap().sequence(), expected as u64);
    }
    assert_eq!(fx.gov.proposals_count(&fx.dao).unwrap(), 5);
    assert_eq!(fx.gov.dao(&fx.dao).unwrap().proposal_ids, ids);

    let unique: std::collections::HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), 5);
}

#[test]
fn test_sequences_shared_across_kinds() {
    let fx = Fixture::new();

    let generic = fx.generic("First");
    let poll = fx
        .gov
        .create_poll_proposal(&fx.dao, "Pick".to_string(), vec!["A"], "admin")
        .unwrap();
    let transfer = fx
        .gov
        .create_coin_transfer_proposal::<NativeCoin>(
            &fx.dao,
            "Pay".to_string(),
            10,
            "bob".to_string(),
            "admin",
        )
        .unwrap();

    let proposals = fx.gov.proposals_for(&fx.dao).unwrap();
    let ids: Vec<&str> = proposals.iter().map(|p| p.id()).collect();
    assert_eq!(ids, vec![generic.as_str(), poll.as_str(), transfer.as_str()]);
    assert_eq!(proposals[2].sequence(), 2);
}

#[test]
fn test_empty_poll_leaves_count_unchanged() {
    let fx = Fixture::new();
    fx.generic("Before");

    let result = fx
        .gov
        .create_poll_proposal(&fx.dao, "Nothing".to_string(), Vec::<String>::new(), "admin");

    assert!(matches!(result, Err(GovernanceError::EmptyPollOptions)));
    assert_eq!(fx.gov.proposals_count(&fx.dao).unwrap(), 1);
    assert_eq!(fx.gov.snapshot().proposals.len(), 1);
}

#[test]
fn test_vote_increments_only_chosen_option() {
    let fx = Fixture::new();
    let alice = fx.member("alice");
    let bob = fx.member("bob");
    let id = fx.generic("Tally");

    fx.gov.vote_proposal(&fx.dao, &id, &bob, 2, "bob").unwrap();
    let before = fx.gov.tallies(&id).unwrap();

    fx.gov.vote_proposal(&fx.dao, &id, &alice, 7, "alice").unwrap();

    assert!(fx.gov.has_voted(&id, "alice").unwrap());
    assert_eq!(fx.gov.tally_for(&id, 7).unwrap(), 1);
    assert_eq!(fx.gov.tally_for(&id, 2).unwrap(), before[&2]);
    assert_eq!(fx.gov.tallies(&id).unwrap().len(), 2);
}

#[test]
fn test_second_vote_rejected_for_any_option() {
    let fx = Fixture::new();
    let alice = fx.member("alice");
    let id = fx.generic("Once");

    fx.gov.vote_proposal(&fx.dao, &id, &alice, 0, "alice").unwrap();
    let after_first = fx.gov.proposal(&id).unwrap();

    for option in [0, 1, 99] {
        let result = fx.gov.vote_proposal(&fx.dao, &id, &alice, option, "alice");
        assert!(matches!(result, Err(GovernanceError::AlreadyVoted { .. })));
    }

    let after = fx.gov.proposal(&id).unwrap();
    assert_eq!(after.votes(), after_first.votes());
}

#[test]
fn test_non_member_vote_has_no_effect() {
    let fx = Fixture::new();
    let alice = fx.member("alice");
    let id = fx.generic("Members only");

    let result = fx.gov.vote_proposal(&fx.dao, &id, &alice, 0, "mallory");

    assert!(matches!(result, Err(GovernanceError::NotDaoMember { .. })));
    assert!(!fx.gov.has_voted(&id, "mallory").unwrap());
    assert!(fx.gov.tallies(&id).unwrap().is_empty());
}

#[test]
fn test_membership_checked_before_duplicate_vote() {
    let fx = Fixture::new();
    let alice = fx.member("alice");
    let id = fx.generic("Order");
    fx.gov.vote_proposal(&fx.dao, &id, &alice, 0, "alice").unwrap();

    // bob is not a member: membership error wins even with alice's member id
    let result = fx.gov.vote_proposal(&fx.dao, &id, &alice, 0, "bob");
    assert!(matches!(result, Err(GovernanceError::NotDaoMember { .. })));

    // alice is a member but passes a bogus member id
    let result = fx.gov.vote_proposal(&fx.dao, &id, "member-bogus", 0, "alice");
    assert!(matches!(result, Err(GovernanceError::InvalidMemberId(_))));
}

#[test]
fn test_poll_scenario() {
    let fx = Fixture::new();
    let m1 = fx.member("m1");
    let m2 = fx.member("m2");
    let poll = fx
        .gov
        .create_poll_proposal(&fx.dao, "Which?".to_string(), vec!["A", "B"], "m1")
        .unwrap();

    fx.gov.vote_proposal(&fx.dao, &poll, &m1, 0, "m1").unwrap();
    fx.gov.vote_proposal(&fx.dao, &poll, &m2, 0, "m2").unwrap();
    let third = fx.gov.vote_proposal(&fx.dao, &poll, &m1, 1, "m1");

    assert!(matches!(third, Err(GovernanceError::AlreadyVoted { .. })));
    assert_eq!(fx.gov.tally_for(&poll, 0).unwrap(), 2);
    assert_eq!(fx.gov.tally_for(&poll, 1).unwrap(), 0);
    assert_eq!(fx.gov.voter_choice(&poll, "m1").unwrap(), Some(0));

    let proposal = fx.gov.proposal(&poll).unwrap();
    assert_eq!(proposal.kind(), ProposalKind::Poll);
    assert_eq!(proposal.poll_options().unwrap().to_vec(), vec!["A", "B"]);
}

#[test]
fn test_coin_transfer_stays_active() {
    let fx = Fixture::new();
    let id = fx
        .gov
        .create_coin_transfer_proposal::<NativeCoin>(
            &fx.dao,
            "Fund the audit".to_string(),
            100,
            "R".to_string(),
            "admin",
        )
        .unwrap();

    let proposal = fx.gov.proposal(&id).unwrap();
    assert_eq!(proposal.kind(), ProposalKind::CoinTransfer);
    assert_eq!(proposal.status(), ProposalStatus::Active);

    let transfer = proposal.coin_transfer().unwrap();
    assert_eq!(transfer.amount, 100);
    assert_eq!(transfer.recipient, "R");
    assert_eq!(transfer.asset, AssetType::of::<NativeCoin>());
}

#[test]
fn test_votes_never_change_status() {
    let fx = Fixture::new();
    let voters: Vec<(String, MemberId)> = (0..10)
        .map(|i| {
            let address = format!("voter{}", i);
            let id = fx.member(&address);
            (address, id)
        })
        .collect();
    let id = fx.generic("Unanimous");

    for (address, member) in &voters {
        fx.gov.vote_proposal(&fx.dao, &id, member, 1, address).unwrap();
    }

    let proposal = fx.gov.proposal(&id).unwrap();
    assert_eq!(proposal.tally_for(1), 10);
    assert_eq!(proposal.status(), ProposalStatus::Active);
}

#[test]
fn test_tally_sum_matches_ledger() {
    let fx = Fixture::new();
    let members: Vec<(String, MemberId)> = (0..8)
        .map(|i| {
            let address = format!("m{}", i);
            let id = fx.member(&address);
            (address, id)
        })
        .collect();
    let first = fx.generic("One");
    let second = fx
        .gov
        .create_poll_proposal(&fx.dao, "Two".to_string(), vec!["x", "y", "z"], "admin")
        .unwrap();

    // deterministic mix of fresh votes, repeats and outsiders
    for round in 0..3u64 {
        for (i, (address, member)) in members.iter().enumerate() {
            let target = if (i as u64 + round) % 2 == 0 { &first } else { &second };
            let _ = fx
                .gov
                .vote_proposal(&fx.dao, target, member, (i as u64 * 3 + round) % 4, address);
            let _ = fx.gov.vote_proposal(&fx.dao, target, member, 0, "outsider");
        }
    }

    for id in [&first, &second] {
        let proposal = fx.gov.proposal(id).unwrap();
        let sum: u64 = proposal.tallies().values().sum();
        assert_eq!(sum as usize, proposal.votes().voter_count());

        let voted = members
            .iter()
            .filter(|(address, _)| proposal.has_voted(address))
            .count();
        assert_eq!(voted, proposal.votes().voter_count());
    }
}

#[test]
fn test_save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let fx = Fixture::new();
    let alice = fx.member("alice");
    let poll = fx
        .gov
        .create_poll_proposal(&fx.dao, "Pick".to_string(), vec!["A", "B"], "alice")
        .unwrap();
    fx.gov.vote_proposal(&fx.dao, &poll, &alice, 1, "alice").unwrap();
    fx.gov.save(&path).unwrap();

    let restored = InMemoryGovernance::load(&path, GovernanceConfig::default()).unwrap();
    assert_eq!(restored.proposals_count(&fx.dao).unwrap(), 1);
    assert_eq!(restored.tally_for(&poll, 1).unwrap(), 1);
    assert!(restored.has_voted(&poll, "alice").unwrap());

    // restored state keeps enforcing the single vote and the counter
    let again = restored.vote_proposal(&fx.dao, &poll, &alice, 0, "alice");
    assert!(matches!(again, Err(GovernanceError::AlreadyVoted { .. })));
    let next = restored
        .create_generic_proposal(&fx.dao, "Next".to_string(), "".to_string(), "alice")
        .unwrap();
    assert_eq!(restored.proposal(&next).unwrap().sequence(), 1);
}

#[test]
fn test_load_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let gov = InMemoryGovernance::load(dir.path().join("none.json"), GovernanceConfig::default())
        .unwrap();
    assert!(gov.daos().is_empty());
}

#[test]
fn test_load_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{ not json").unwrap();

    let result = InMemoryGovernance::load(&path, GovernanceConfig::default());
    assert!(matches!(result, Err(GovernanceError::Serialization(_))));
}

#[test]
fn test_unknown_proposal_lookups() {
    let fx = Fixture::new();
    assert!(matches!(
        fx.gov.has_voted("proposal-missing", "alice"),
        Err(GovernanceError::ProposalNotFound(_))
    ));
    assert!(matches!(
        fx.gov.tally_for("proposal-missing", 0),
        Err(GovernanceError::ProposalNotFound(_))
    ));
}

fn saved_state(fx: &Fixture) -> (tempfile::TempDir, std::path::PathBuf, serde_json::Value) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    fx.gov.save(&path).unwrap();
    let json = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    (dir, path, json)
}

fn write_json(path: &std::path::Path, json: &serde_json::Value) {
    std::fs::write(path, serde_json::to_string_pretty(json).unwrap()).unwrap();
}

#[test]
fn test_load_rejects_poll_without_options() {
    let fx = Fixture::new();
    fx.gov
        .create_poll_proposal(&fx.dao, "Pick".to_string(), vec!["A", "B"], "admin")
        .unwrap();
    let (_dir, path, mut json) = saved_state(&fx);

    json["proposals"][0]["extension"]["Poll"]["options"] = serde_json::json!([]);
    write_json(&path, &json);

    let result = InMemoryGovernance::load(&path, GovernanceConfig::default());
    assert!(matches!(result, Err(GovernanceError::InvalidSnapshot(_))));
}

#[test]
fn test_load_rejects_counter_behind_proposals() {
    let fx = Fixture::new();
    fx.generic("First");
    fx.generic("Second");
    let (_dir, path, mut json) = saved_state(&fx);

    // proposal saved without being counted: reloading would reuse sequence 1
    json["daos"][0]["proposals_count"] = serde_json::json!(1);
    json["daos"][0]["proposal_ids"].as_array_mut().unwrap().pop();
    write_json(&path, &json);

    let result = InMemoryGovernance::load(&path, GovernanceConfig::default());
    assert!(matches!(result, Err(GovernanceError::InvalidSnapshot(_))));
}

#[test]
fn test_load_rejects_tally_without_voters() {
    let fx = Fixture::new();
    let alice = fx.member("alice");
    let id = fx.generic("Tally");
    fx.gov.vote_proposal(&fx.dao, &id, &alice, 1, "alice").unwrap();
    let (_dir, path, mut json) = saved_state(&fx);

    json["proposals"][0]["votes"]["tally"]["1"] = serde_json::json!(5);
    write_json(&path, &json);

    let result = InMemoryGovernance::load(&path, GovernanceConfig::default());
    assert!(matches!(result, Err(GovernanceError::InvalidSnapshot(_))));
}

#[test]
fn test_kind_is_derived_from_extension() {
    let fx = Fixture::new();
    let id = fx
        .gov
        .create_poll_proposal(&fx.dao, "Pick".to_string(), vec!["A"], "admin")
        .unwrap();
    let (_dir, path, mut json) = saved_state(&fx);
    assert!(json["proposals"][0].get("kind").is_none());

    // a stale kind field from an older file cannot override the extension
    json["proposals"][0]["kind"] = serde_json::json!("CoinTransfer");
    write_json(&path, &json);

    let restored = InMemoryGovernance::load(&path, GovernanceConfig::default()).unwrap();
    assert_eq!(restored.proposal(&id).unwrap().kind(), ProposalKind::Poll);
}
