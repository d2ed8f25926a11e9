//! A proposal/vote state machine on top of two containers: create, vote,
//! list, cascade-remove, and undo the removal.

use slotdb_store::{
    indices, list, IdPolicy, IndexKind, IndexTag, IndexView, IndexedContainer, ListQuery, Object,
    Oid, StoreConfig,
};

#[derive(Clone, Debug, PartialEq)]
struct Proposal {
    id: Oid<Proposal>,
    title: String,
    proposer: String,
}

impl Object for Proposal {
    fn id(&self) -> Oid<Self> {
        self.id
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Vote {
    id: Oid<Vote>,
    proposal: Oid<Proposal>,
    voter: String,
    approve: bool,
}

impl Object for Vote {
    fn id(&self) -> Oid<Self> {
        self.id
    }
}

struct ByTitle;
impl IndexTag<Proposal> for ByTitle {
    const NAME: &'static str = "by_title";
    const KIND: IndexKind = IndexKind::OrderedUnique;
    type Key = String;
    fn key(value: &Proposal) -> String {
        value.title.clone()
    }
}

struct ByProposer;
impl IndexTag<Proposal> for ByProposer {
    const NAME: &'static str = "by_proposer";
    const KIND: IndexKind = IndexKind::HashedNonUnique;
    type Key = String;
    fn key(value: &Proposal) -> String {
        value.proposer.clone()
    }
}

struct ByBallot;
impl IndexTag<Vote> for ByBallot {
    const NAME: &'static str = "by_ballot";
    const KIND: IndexKind = IndexKind::OrderedUnique;
    type Key = (Oid<Proposal>, String);
    fn key(value: &Vote) -> Self::Key {
        (value.proposal, value.voter.clone())
    }
}

struct ByProposal;
impl IndexTag<Vote> for ByProposal {
    const NAME: &'static str = "by_proposal";
    const KIND: IndexKind = IndexKind::OrderedNonUnique;
    type Key = Oid<Proposal>;
    fn key(value: &Vote) -> Oid<Proposal> {
        value.proposal
    }
}

indices! {
    struct ProposalIndices for Proposal {
        by_title: ByTitle,
        by_proposer: ByProposer,
    }
}

indices! {
    struct VoteIndices for Vote {
        by_ballot: ByBallot,
        by_proposal: ByProposal,
    }
}

#[derive(Default)]
struct Governance {
    proposals: IndexedContainer<Proposal, ProposalIndices>,
    votes: IndexedContainer<Vote, VoteIndices>,
}

/// What `remove_proposal` took out, for undo.
struct Removed {
    proposal: Proposal,
    votes: Vec<Vote>,
}

impl Governance {
    fn with_policy(policy: IdPolicy) -> Self {
        Self {
            proposals: IndexedContainer::with_policy(policy),
            votes: IndexedContainer::with_policy(policy),
        }
    }

    fn propose(&mut self, title: &str, proposer: &str) -> Option<Oid<Proposal>> {
        let (id, inserted) = self
            .proposals
            .emplace(|id| Proposal {
                id,
                title: title.to_string(),
                proposer: proposer.to_string(),
            })
            .unwrap();
        inserted.then_some(id)
    }

    fn vote(&mut self, proposal: Oid<Proposal>, voter: &str, approve: bool) -> Option<Oid<Vote>> {
        self.proposals.find(proposal)?;
        let (id, inserted) = self
            .votes
            .emplace(|id| Vote {
                id,
                proposal,
                voter: voter.to_string(),
                approve,
            })
            .unwrap();
        inserted.then_some(id)
    }

    fn tally(&self, proposal: Oid<Proposal>) -> (usize, usize) {
        self.votes
            .get_index::<ByProposal>()
            .equal_range(&proposal)
            .fold((0, 0), |(yes, no), v| if v.approve { (yes + 1, no) } else { (yes, no + 1) })
    }

    fn remove_proposal(&mut self, proposal: Oid<Proposal>) -> Option<Removed> {
        let vote_ids: Vec<Oid<Vote>> = self
            .votes
            .get_index::<ByProposal>()
            .equal_range(&proposal)
            .map(|v| v.id)
            .collect();
        let votes = vote_ids
            .into_iter()
            .filter_map(|id| self.votes.erase(id))
            .collect();
        let proposal = self.proposals.erase(proposal)?;
        Some(Removed { proposal, votes })
    }

    fn undo_remove(&mut self, removed: Removed) {
        self.proposals
            .reinsert_with_identity(removed.proposal)
            .unwrap();
        for vote in removed.votes.into_iter().rev() {
            self.votes.reinsert_with_identity(vote).unwrap();
        }
    }
}

fn seeded() -> (Governance, [Oid<Proposal>; 3]) {
    let mut gov = Governance::default();
    let fund = gov.propose("fund the bridge", "ana").unwrap();
    let audit = gov.propose("audit treasury", "ben").unwrap();
    let burn = gov.propose("burn fees", "ana").unwrap();

    gov.vote(fund, "ben", true).unwrap();
    gov.vote(fund, "cai", false).unwrap();
    gov.vote(audit, "ana", true).unwrap();
    gov.vote(audit, "cai", true).unwrap();
    gov.vote(audit, "dee", false).unwrap();
    gov.vote(burn, "ben", true).unwrap();
    (gov, [fund, audit, burn])
}

#[test]
fn duplicate_titles_and_ballots_are_rejected() {
    let (mut gov, [fund, ..]) = seeded();

    assert!(gov.propose("fund the bridge", "eve").is_none());
    assert_eq!(gov.proposals.len(), 3);

    assert!(gov.vote(fund, "ben", false).is_none());
    assert_eq!(gov.tally(fund), (1, 1));

    // Neither rejection consumed an id.
    assert_eq!(gov.propose("new title", "eve").unwrap().get(), 4);
    assert_eq!(gov.vote(fund, "eve", true).unwrap().get(), 7);
}

#[test]
fn votes_against_unknown_proposals_are_refused() {
    let (mut gov, _) = seeded();
    assert!(gov.vote(Oid::new(99), "ana", true).is_none());
    assert_eq!(gov.votes.len(), 6);
}

#[test]
fn list_proposals_by_title_in_pages() {
    let (gov, _) = seeded();
    let by_title = gov.proposals.get_index::<ByTitle>();

    let page = list(&by_title, &ListQuery::new(2), |p| p.title.clone()).unwrap();
    assert_eq!(page, vec!["audit treasury", "burn fees"]);

    let next_start = format!("{}\0", page[1]);
    let rest = list(&by_title, &ListQuery::new(2).starting_at(next_start), |p| p.id).unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(gov.proposals.find(rest[0]).unwrap().title, "fund the bridge");

    let newest_first = list(&gov.proposals.by_id(), &ListQuery::new(10).descending(), |p| p.id.get())
        .unwrap();
    assert_eq!(newest_first, vec![3, 2, 1]);
}

#[test]
fn proposals_by_proposer() {
    let (gov, [fund, _, burn]) = seeded();
    let mut mine: Vec<Oid<Proposal>> = gov
        .proposals
        .get_index::<ByProposer>()
        .equal_range(&"ana".to_string())
        .map(|p| p.id)
        .collect();
    mine.sort();
    assert_eq!(mine, vec![fund, burn]);
}

#[test]
fn cascade_remove_then_undo_restores_everything() {
    let (mut gov, [fund, audit, burn]) = seeded();
    let proposals_before: Vec<Proposal> = gov.proposals.iter().cloned().collect();
    let votes_before: Vec<Vote> = gov.votes.iter().cloned().collect();

    let removed = gov.remove_proposal(audit).unwrap();
    assert_eq!(removed.votes.len(), 3);
    assert!(gov.proposals.find(audit).is_none());
    assert_eq!(gov.tally(audit), (0, 0));
    assert_eq!(gov.votes.len(), 3);
    assert_eq!(gov.tally(fund), (1, 1));

    gov.undo_remove(removed);

    let proposals_after: Vec<Proposal> = gov.proposals.iter().cloned().collect();
    let votes_after: Vec<Vote> = gov.votes.iter().cloned().collect();
    assert_eq!(proposals_after, proposals_before);
    assert_eq!(votes_after, votes_before);
    assert_eq!(gov.tally(audit), (2, 1));
    assert_eq!(
        gov.proposals
            .get_index::<ByTitle>()
            .find(&"audit treasury".to_string())
            .map(|p| p.id),
        Some(audit)
    );
    assert_eq!(gov.proposals.free_ids().count(), 0);
    assert_eq!(gov.votes.free_ids().count(), 0);
    assert!(gov.proposals.contains(burn));
}

#[test]
fn freed_ids_are_reused_after_removal() {
    let (mut gov, [_, audit, _]) = seeded();
    gov.remove_proposal(audit).unwrap();

    let replacement = gov.propose("audit treasury again", "ben").unwrap();
    assert_eq!(replacement, Oid::new(2));
    assert!(gov.proposals.free_ids().next().is_none());
}

#[test]
fn rename_keeps_identity_and_rejects_taken_titles() {
    let (mut gov, [fund, audit, _]) = seeded();

    assert!(gov
        .proposals
        .modify(fund, |p| p.title = "fund the tunnel".into())
        .unwrap());
    assert_eq!(gov.proposals.find(fund).unwrap().title, "fund the tunnel");

    assert!(!gov
        .proposals
        .modify(fund, |p| p.title = "audit treasury".into())
        .unwrap());
    assert_eq!(gov.proposals.find(fund).unwrap().title, "fund the tunnel");
    assert_eq!(gov.proposals.find(audit).unwrap().title, "audit treasury");
}

#[test]
fn no_reuse_checkpoint_rollback() {
    let config = StoreConfig::from_toml_str("id_policy = \"no-reuse\"").unwrap();
    assert_eq!(config.id_policy, IdPolicy::NoReuse);

    let mut gov = Governance::with_policy(config.id_policy);
    gov.propose("keep", "ana").unwrap();
    let proposals_mark = gov.proposals.save_next_id();
    let votes_mark = gov.votes.save_next_id();

    let temp = gov.propose("temporary", "ben").unwrap();
    let vote = gov.vote(temp, "cai", true).unwrap();
    assert_eq!((temp.get(), vote.get()), (2, 1));

    // Roll back: erase what was created after the checkpoint, then rewind.
    gov.remove_proposal(temp).unwrap();
    gov.proposals.restore_next_id(proposals_mark).unwrap();
    gov.votes.restore_next_id(votes_mark).unwrap();

    assert_eq!(gov.propose("again", "ben").unwrap().get(), 2);
    assert_eq!(gov.proposals.slot_len(), 3);
}
