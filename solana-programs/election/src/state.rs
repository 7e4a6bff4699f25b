use anchor_lang::prelude::*;

use crate::{ErrorCode, VotedEvent};

// Keep in sync with the `max_len` attributes below.
pub const MAX_CANDIDATES: usize = 16;
pub const MAX_NAME_LEN: usize = 32;

/// Candidates every election starts with, in id order.
pub const SEED_CANDIDATES: [&str; 3] = ["Arsenio Hall", "Johnny Carson", "Geraldo"];

/// Which preference a ballot expresses. Both ranks share one voter guard.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rank {
    First,
    Second,
}

impl Rank {
    pub const fn points(self) -> u64 {
        match self {
            Rank::First => 5,
            Rank::Second => 3,
        }
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub id: u64,
    #[max_len(32)]
    pub name: String,
    pub score: u64,
}

#[account]
#[derive(InitSpace, Debug)]
pub struct Election {
    pub authority: Pubkey, // deployer
    /// `candidates[i].id == i + 1` always holds.
    #[max_len(16)]
    pub candidates: Vec<Candidate>,
}

#[account]
#[derive(InitSpace, Debug, Default)]
pub struct VoterRecord {
    pub voter: Pubkey,
    pub has_voted: bool,
    pub bump: u8,
}

impl VoterRecord {
    pub fn new(voter: Pubkey, bump: u8) -> Self {
        Self { voter, has_voted: false, bump }
    }
}

impl Election {
    /// Fresh election holding the seed candidates with zero scores.
    pub fn seeded(authority: Pubkey) -> Self {
        let mut election = Self { authority, candidates: Vec::with_capacity(MAX_CANDIDATES) };
        for name in SEED_CANDIDATES {
            election.push_candidate(name.to_string());
        }
        election
    }

    pub fn candidate_count(&self) -> u64 {
        self.candidates.len() as u64
    }

    pub fn candidate(&self, candidate_id: u64) -> Result<&Candidate> {
        self.index_of(candidate_id)
            .map(|i| &self.candidates[i])
            .ok_or_else(|| error!(ErrorCode::CandidateNotFound))
    }

    /// Appends a candidate with score 0 and returns its id. Duplicate names
    /// are allowed.
    pub fn add_candidate(&mut self, name: &str) -> Result<u64> {
        require!(!name.trim().is_empty(), ErrorCode::EmptyName);
        require!(name.len() <= MAX_NAME_LEN, ErrorCode::NameTooLong);
        require!(self.candidates.len() < MAX_CANDIDATES, ErrorCode::TooManyCandidates);
        Ok(self.push_candidate(name.to_string()))
    }

    /// Credits `rank.points()` to `candidate_id` and marks `record` as voted.
    ///
    /// Every check runs before the first write, so a rejected ballot leaves
    /// both the election and the record exactly as they were.
    pub fn cast_vote(
        &mut self,
        record: &mut VoterRecord,
        candidate_id: u64,
        rank: Rank,
    ) -> Result<VotedEvent> {
        require!(!record.has_voted, ErrorCode::AlreadyVoted);
        let index = self
            .index_of(candidate_id)
            .ok_or_else(|| error!(ErrorCode::InvalidCandidate))?;
        let candidate = &mut self.candidates[index];
        let score = candidate
            .score
            .checked_add(rank.points())
            .ok_or_else(|| error!(ErrorCode::ScoreOverflow))?;

        candidate.score = score;
        record.has_voted = true;
        Ok(VotedEvent { candidate_id })
    }

    pub fn total_score(&self) -> u64 {
        self.candidates.iter().map(|c| c.score).sum()
    }

    fn push_candidate(&mut self, name: String) -> u64 {
        let id = self.candidate_count() + 1;
        self.candidates.push(Candidate { id, name, score: 0 });
        id
    }

    fn index_of(&self, candidate_id: u64) -> Option<usize> {
        match candidate_id {
            0 => None,
            id if id <= self.candidate_count() => Some((id - 1) as usize),
            _ => None,
        }
    }
}
