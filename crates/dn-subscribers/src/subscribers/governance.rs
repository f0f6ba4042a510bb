//! Governance subscriber.
//!
//! Aggregates proposals and the votes cast on them, keyed by proposal id.
//! Every vote is kept in the yes/no history; the per-party maps hold only the
//! last vote of each party, so a party that changes its mind moves between
//! the two sides.

use crate::config::SubscriberConfig;
use parking_lot::RwLock;
use shared_bus::{spawn_loop, Base, EventBatch, EventPayload, EventType, Subscriber};
use shared_types::entities::{PartyId, Proposal, ProposalState, Vote, VoteValue};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A proposal with its votes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GovernanceData {
    pub proposal: Proposal,
    pub yes: Vec<Vote>,
    pub no: Vec<Vote>,
    yes_party: HashMap<PartyId, Vote>,
    no_party: HashMap<PartyId, Vote>,
}

impl GovernanceData {
    fn record_vote(&mut self, vote: Vote) {
        let party = vote.party_id.clone();
        match vote.value {
            VoteValue::Yes => {
                self.no_party.remove(&party);
                self.yes_party.insert(party, vote.clone());
                self.yes.push(vote);
            }
            VoteValue::No => {
                self.yes_party.remove(&party);
                self.no_party.insert(party, vote.clone());
                self.no.push(vote);
            }
            VoteValue::Unspecified => {}
        }
    }

    /// Copy with the vote lists reduced to the last vote of each party.
    fn with_unique_votes(&self) -> Self {
        let sorted = |votes: &HashMap<PartyId, Vote>| {
            let mut v: Vec<Vote> = votes.values().cloned().collect();
            v.sort_by(|a, b| a.party_id.cmp(&b.party_id));
            v
        };
        Self {
            proposal: self.proposal.clone(),
            yes: sorted(&self.yes_party),
            no: sorted(&self.no_party),
            yes_party: self.yes_party.clone(),
            no_party: self.no_party.clone(),
        }
    }
}

/// Predicate over aggregated proposals. All filters must pass.
pub type ProposalFilter = Box<dyn Fn(&GovernanceData) -> bool + Send + Sync>;

/// Proposals submitted by `party`.
#[must_use]
pub fn proposals_by_party(party: impl Into<String>) -> ProposalFilter {
    let party = party.into();
    Box::new(move |data| data.proposal.party_id == party)
}

/// Proposals currently in `state`.
#[must_use]
pub fn proposals_in_state(state: ProposalState) -> ProposalFilter {
    Box::new(move |data| data.proposal.state == state)
}

pub struct GovernanceDataSub {
    base: Base,
    proposals: RwLock<BTreeMap<String, GovernanceData>>,
}

impl GovernanceDataSub {
    pub fn new(ctx: &CancellationToken, config: SubscriberConfig) -> Arc<Self> {
        let sub = Arc::new(Self {
            base: Base::new(ctx, config.buffer_size, config.ack),
            proposals: RwLock::new(BTreeMap::new()),
        });
        spawn_loop(&sub);
        sub
    }

    /// Proposals passing every filter, ordered by id.
    ///
    /// With `unique_votes`, each party contributes at most its last vote.
    pub fn filter(&self, unique_votes: bool, filters: &[ProposalFilter]) -> Vec<GovernanceData> {
        self.proposals
            .read()
            .values()
            .filter(|data| filters.iter().all(|f| f(data)))
            .map(|data| {
                if unique_votes {
                    data.with_unique_votes()
                } else {
                    data.clone()
                }
            })
            .collect()
    }

    #[must_use]
    pub fn proposal_by_id(&self, id: &str, unique_votes: bool) -> Option<GovernanceData> {
        let proposals = self.proposals.read();
        let data = proposals.get(id)?;
        Some(if unique_votes {
            data.with_unique_votes()
        } else {
            data.clone()
        })
    }
}

impl Subscriber for GovernanceDataSub {
    fn base(&self) -> &Base {
        &self.base
    }

    fn types(&self) -> Vec<EventType> {
        vec![EventType::ProposalEvent, EventType::VoteEvent]
    }

    fn push(&self, events: EventBatch) {
        let mut proposals = self.proposals.write();
        for event in events {
            match event.into_payload() {
                EventPayload::Proposal(proposal) => {
                    let entry = proposals.entry(proposal.id.clone()).or_default();
                    entry.proposal = proposal;
                }
                EventPayload::Vote(vote) => {
                    let entry = proposals.entry(vote.proposal_id.clone()).or_default();
                    if entry.proposal.id.is_empty() {
                        debug!(proposal_id = %vote.proposal_id, "Vote before proposal");
                        entry.proposal.id = vote.proposal_id.clone();
                    }
                    entry.record_vote(vote);
                }
                _ => {}
            }
        }
    }

    fn name(&self) -> &'static str {
        "governance"
    }
}
