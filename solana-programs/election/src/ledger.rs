//! In-process host for the election state machine.
//!
//! [`Ledger`] owns the same [`Election`] state the program stores on-chain
//! and keeps voter records in a map instead of PDAs. The caller identity is
//! an explicit argument to every mutating call. `&mut self` on mutations
//! gives single-writer semantics; queries take `&self`.

use std::collections::HashMap;

use anchor_lang::prelude::*;

use crate::{Candidate, Election, Rank, VotedEvent, VoterRecord};

/// Receives every [`VotedEvent`] after the vote that produced it is applied.
pub trait VoteObserver {
    fn on_vote(&self, event: &VotedEvent);
}

impl<F: Fn(&VotedEvent)> VoteObserver for F {
    fn on_vote(&self, event: &VotedEvent) {
        self(event)
    }
}

pub struct Ledger {
    election: Election,
    voters: HashMap<Pubkey, VoterRecord>,
    observers: Vec<Box<dyn VoteObserver + Send + Sync>>,
}

impl Ledger {
    pub fn new(authority: Pubkey) -> Self {
        Self {
            election: Election::seeded(authority),
            voters: HashMap::new(),
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: impl VoteObserver + Send + Sync + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn add_candidate(&mut self, name: &str) -> Result<u64> {
        self.election.add_candidate(name)
    }

    pub fn cast_first_choice_vote(&mut self, candidate_id: u64, caller: Pubkey) -> Result<VotedEvent> {
        self.cast(candidate_id, caller, Rank::First)
    }

    pub fn cast_second_choice_vote(&mut self, candidate_id: u64, caller: Pubkey) -> Result<VotedEvent> {
        self.cast(candidate_id, caller, Rank::Second)
    }

    pub fn cast(&mut self, candidate_id: u64, caller: Pubkey, rank: Rank) -> Result<VotedEvent> {
        // Work on a copy so a rejection never leaves a half-made record behind.
        let mut record = self
            .voters
            .get(&caller)
            .cloned()
            .unwrap_or_else(|| VoterRecord::new(caller, 0));
        let event = self.election.cast_vote(&mut record, candidate_id, rank)?;
        self.voters.insert(caller, record);

        for observer in &self.observers {
            observer.on_vote(&event);
        }
        Ok(event)
    }

    pub fn candidate(&self, candidate_id: u64) -> Result<&Candidate> {
        self.election.candidate(candidate_id)
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.election.candidates
    }

    pub fn candidate_count(&self) -> u64 {
        self.election.candidate_count()
    }

    pub fn has_voted(&self, caller: &Pubkey) -> bool {
        self.voters.get(caller).is_some_and(|r| r.has_voted)
    }

    pub fn election(&self) -> &Election {
        &self.election
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use anchor_lang::error::Error;

    use super::*;
    use crate::ErrorCode;

    fn err(code: ErrorCode) -> Error {
        code.into()
    }

    fn scores(ledger: &Ledger) -> Vec<u64> {
        ledger.candidates().iter().map(|c| c.score).collect()
    }

    fn recorded(ledger: &mut Ledger) -> Arc<Mutex<Vec<VotedEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        ledger.subscribe(move |e: &VotedEvent| sink.lock().unwrap().push(*e));
        seen
    }

    #[test]
    fn first_choice_vote_credits_five() {
        let mut ledger = Ledger::new(Pubkey::new_unique());
        let a = Pubkey::new_unique();

        assert!(!ledger.has_voted(&a));
        let event = ledger.cast_first_choice_vote(1, a).unwrap();
        assert_eq!(event, VotedEvent { candidate_id: 1 });
        assert!(ledger.has_voted(&a));
        assert_eq!(scores(&ledger), vec![5, 0, 0]);
    }

    #[test]
    fn second_choice_vote_credits_three() {
        let mut ledger = Ledger::new(Pubkey::new_unique());
        let b = Pubkey::new_unique();

        let event = ledger.cast_second_choice_vote(2, b).unwrap();
        assert_eq!(event.candidate_id, 2);
        assert!(ledger.has_voted(&b));
        assert_eq!(scores(&ledger), vec![0, 3, 0]);
    }

    #[test]
    fn rejected_vote_leaves_no_voter_record() {
        let mut ledger = Ledger::new(Pubkey::new_unique());
        let c = Pubkey::new_unique();

        for _ in 0..3 {
            assert_eq!(ledger.cast_first_choice_vote(99, c).unwrap_err(), err(ErrorCode::InvalidCandidate));
            assert_eq!(ledger.cast_second_choice_vote(0, c).unwrap_err(), err(ErrorCode::InvalidCandidate));
        }
        assert!(!ledger.has_voted(&c));
        assert!(ledger.voters.is_empty());
        assert_eq!(ledger.candidate_count(), 3);
        assert_eq!(scores(&ledger), vec![0, 0, 0]);

        // still free to vote afterwards
        ledger.cast_first_choice_vote(3, c).unwrap();
        assert_eq!(scores(&ledger), vec![0, 0, 5]);
    }

    #[test]
    fn second_ballot_is_refused_for_either_rank() {
        let mut ledger = Ledger::new(Pubkey::new_unique());
        let a = Pubkey::new_unique();
        ledger.cast_first_choice_vote(1, a).unwrap();

        assert_eq!(ledger.cast_first_choice_vote(3, a).unwrap_err(), err(ErrorCode::AlreadyVoted));
        assert_eq!(ledger.cast_second_choice_vote(2, a).unwrap_err(), err(ErrorCode::AlreadyVoted));
        assert_eq!(scores(&ledger), vec![5, 0, 0]);
    }

    #[test]
    fn observers_see_only_successful_votes() {
        let mut ledger = Ledger::new(Pubkey::new_unique());
        let seen = recorded(&mut ledger);
        let a = Pubkey::new_unique();

        ledger.add_candidate("Bobby Brown").unwrap();
        ledger.cast_second_choice_vote(4, a).unwrap();
        ledger.cast_first_choice_vote(1, a).unwrap_err();
        ledger.cast_first_choice_vote(42, Pubkey::new_unique()).unwrap_err();

        assert_eq!(*seen.lock().unwrap(), vec![VotedEvent { candidate_id: 4 }]);
    }

    #[test]
    fn election_walkthrough() {
        let mut ledger = Ledger::new(Pubkey::new_unique());
        let seen = recorded(&mut ledger);
        let (a, b, c) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());

        assert_eq!(ledger.add_candidate("Bobby Brown").unwrap(), 4);
        let bobby = ledger.candidate(4).unwrap();
        assert_eq!((bobby.id, bobby.name.as_str(), bobby.score), (4, "Bobby Brown", 0));

        ledger.cast_first_choice_vote(1, a).unwrap();
        assert_eq!(ledger.candidate(1).unwrap().score, 5);
        assert!(ledger.has_voted(&a));

        ledger.cast_second_choice_vote(2, b).unwrap();
        assert_eq!(ledger.candidate(2).unwrap().score, 3);
        assert!(ledger.has_voted(&b));

        assert_eq!(ledger.cast_first_choice_vote(99, c).unwrap_err(), err(ErrorCode::InvalidCandidate));
        assert_eq!(scores(&ledger), vec![5, 3, 0, 0]);

        assert_eq!(ledger.cast_first_choice_vote(3, a).unwrap_err(), err(ErrorCode::AlreadyVoted));
        assert_eq!(scores(&ledger), vec![5, 3, 0, 0]);
        assert_eq!(ledger.election().total_score(), 8);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }
}
