use anchor_lang::prelude::*;

#[cfg(not(target_os = "solana"))]
pub mod ledger;
pub mod state;

pub use state::*;

declare_id!("AdemcJyFzDyiCTyuCQuhkWQHQdQUkaqj15nwAPgsARmj");

pub const VOTER_SEED: &[u8] = b"voter";

#[program]
pub mod election_ledger {
    use super::*;

    /// Create the election with the three seed candidates. The signer is
    /// recorded as authority but holds no special powers afterwards.
    pub fn initialise(ctx: Context<Initialise>) -> Result<()> {
        let authority = ctx.accounts.authority.key();
        ctx.accounts.election.set_inner(Election::seeded(authority));
        msg!("election seeded with {} candidates", SEED_CANDIDATES.len());
        Ok(())
    }

    /// Open to any signer.
    pub fn add_candidate(ctx: Context<AddCandidate>, name: String) -> Result<()> {
        let id = ctx.accounts.election.add_candidate(&name)?;
        msg!("candidate {} added", id);
        Ok(())
    }

    /// Credits 5 points to `candidate_id`.
    pub fn cast_first_choice_vote(ctx: Context<CastVote>, candidate_id: u64) -> Result<()> {
        let bump = ctx.bumps.voter_record;
        ctx.accounts.cast(candidate_id, Rank::First, bump)
    }

    /// Credits 3 points to `candidate_id`. Consumes the same one ballot as a
    /// first-choice vote.
    pub fn cast_second_choice_vote(ctx: Context<CastVote>, candidate_id: u64) -> Result<()> {
        let bump = ctx.bumps.voter_record;
        ctx.accounts.cast(candidate_id, Rank::Second, bump)
    }
}

#[derive(Accounts)]
pub struct Initialise<'info> {
    #[account(init, payer = authority, space = 8 + Election::INIT_SPACE)]
    pub election: Account<'info, Election>,
    #[account(mut)]
    pub authority: Signer<'info>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct AddCandidate<'info> {
    #[account(mut)]
    pub election: Account<'info, Election>,
    pub submitter: Signer<'info>,
}

#[derive(Accounts)]
pub struct CastVote<'info> {
    #[account(mut)]
    pub election: Account<'info, Election>,
    #[account(
        init_if_needed,
        payer = voter,
        space = 8 + VoterRecord::INIT_SPACE,
        seeds = [VOTER_SEED, election.key().as_ref(), voter.key().as_ref()],
        bump,
    )]
    pub voter_record: Account<'info, VoterRecord>,
    #[account(mut)]
    pub voter: Signer<'info>,
    pub system_program: Program<'info, System>,
}

impl<'info> CastVote<'info> {
    fn cast(&mut self, candidate_id: u64, rank: Rank, bump: u8) -> Result<()> {
        let voter = self.voter.key();
        // freshly created by init_if_needed
        if self.voter_record.voter == Pubkey::default() {
            self.voter_record.set_inner(VoterRecord::new(voter, bump));
        }
        let event = self.election.cast_vote(&mut self.voter_record, candidate_id, rank)?;
        msg!("{} voted {:?} for candidate {}", voter, rank, candidate_id);
        emit!(event);
        Ok(())
    }
}

#[event]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VotedEvent {
    pub candidate_id: u64,
}

#[error_code]
pub enum ErrorCode {
    #[msg("candidate id is outside the registry")]
    InvalidCandidate,
    #[msg("voter has already cast a ballot")]
    AlreadyVoted,
    #[msg("no candidate with that id")]
    CandidateNotFound,
    #[msg("candidate name is empty")]
    EmptyName,
    #[msg("candidate name is too long")]
    NameTooLong,
    #[msg("candidate registry is full")]
    TooManyCandidates,
    #[msg("candidate score would overflow")]
    ScoreOverflow,
}
