use anchor_lang::error::Error as LedgerError;
use anchor_lang::prelude::Pubkey;
use anyhow::{anyhow, Context};
use election_ledger::ledger::Ledger;
use election_ledger::{Candidate, Rank, VotedEvent};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A recorded sequence of ledger calls, replayed in order against a fresh
/// seeded election.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    AddCandidate { name: String },
    Vote { rank: BallotRank, caller: String, candidate_id: u64 },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BallotRank {
    First,
    Second,
}

impl From<BallotRank> for Rank {
    fn from(rank: BallotRank) -> Self {
        match rank {
            BallotRank::First => Rank::First,
            BallotRank::Second => Rank::Second,
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Report {
    pub candidates: Vec<CandidateTally>,
    pub events: Vec<EventRecord>,
    pub rejections: Vec<Rejection>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CandidateTally {
    pub id: u64,
    pub name: String,
    pub score: u64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct EventRecord {
    pub candidate_id: u64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Rejection {
    pub step: usize,
    pub error: String,
}

impl From<&Candidate> for CandidateTally {
    fn from(c: &Candidate) -> Self {
        Self { id: c.id, name: c.name.clone(), score: c.score }
    }
}

impl From<VotedEvent> for EventRecord {
    fn from(e: VotedEvent) -> Self {
        Self { candidate_id: e.candidate_id }
    }
}

fn error_name(err: &LedgerError) -> String {
    match err {
        LedgerError::AnchorError(e) => e.error_name.clone(),
        LedgerError::ProgramError(e) => e.program_error.to_string(),
    }
}

impl Scenario {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).context("malformed scenario")
    }

    /// Runs every step. Ledger rejections are part of the outcome and end up
    /// in the report; only unparseable callers abort the replay.
    pub fn replay(&self, authority: Pubkey) -> anyhow::Result<Report> {
        let mut ledger = Ledger::new(authority);
        let mut events = Vec::new();
        let mut rejections = Vec::new();

        for (step, call) in self.steps.iter().enumerate() {
            debug!(step, ?call, "applying");
            let outcome = match call {
                Step::AddCandidate { name } => ledger.add_candidate(name).map(|_| None),
                Step::Vote { rank, caller, candidate_id } => {
                    let caller: Pubkey = caller
                        .parse()
                        .map_err(|e| anyhow!("step {step}: bad caller {caller}: {e}"))?;
                    ledger.cast(*candidate_id, caller, (*rank).into()).map(Some)
                }
            };
            match outcome {
                Ok(Some(event)) => events.push(EventRecord::from(event)),
                Ok(None) => {}
                Err(err) => {
                    let error = error_name(&err);
                    warn!(step, %error, "call rejected");
                    rejections.push(Rejection { step, error });
                }
            }
        }

        Ok(Report {
            candidates: ledger.candidates().iter().map(CandidateTally::from).collect(),
            events,
            rejections,
        })
    }
}
