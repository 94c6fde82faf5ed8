use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use solana_program::{
    clock::UnixTimestamp,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};
use std::convert::TryFrom;

/// Maximum entries per round. Solana accounts are fixed-size, so the entry
/// ledger is capped at the account's capacity.
pub const MAX_PLAYERS: usize = 100;

/// Phase of the lottery round
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LotteryState {
    /// Accepting entries, no draw in flight
    Open,
    /// Entries closed, randomness requested, awaiting the oracle callback
    Calculating,
}

impl TryFrom<u8> for LotteryState {
    type Error = &'static str;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(LotteryState::Open),
            1 => Ok(LotteryState::Calculating),
            _ => Err("Invalid lottery state"),
        }
    }
}

impl From<LotteryState> for u8 {
    fn from(state: LotteryState) -> Self {
        match state {
            LotteryState::Open => 0,
            LotteryState::Calculating => 1,
        }
    }
}

/// Lottery account data
#[derive(Debug, Clone, Copy)]
pub struct Lottery {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Phase of the current round
    pub state: LotteryState,
    /// Trusted oracle authority allowed to deliver randomness
    pub oracle_authority: Pubkey,
    /// Oracle gas-lane/key identifier, forwarded with each request
    pub key_hash: [u8; 32],
    /// Oracle subscription funding the requests
    pub subscription_id: u64,
    /// Confirmations the oracle waits for before responding
    pub min_confirmations: u16,
    /// Compute budget for the oracle callback
    pub callback_gas_limit: u32,
    /// Entry price in lamports, immutable across rounds
    pub entrance_fee: u64,
    /// Minimum seconds between round start and draw eligibility
    pub interval: i64,
    /// When the current round started/reset (Unix timestamp)
    pub last_timestamp: UnixTimestamp,
    /// Lamports collected for the current round
    pub pot: u64,
    /// Monotone counter deriving request identifiers
    pub request_counter: u64,
    /// In-flight draw request id, zero when none
    pub pending_request_id: u64,
    /// Number of entries in the current round
    pub num_players: u32,
    /// Ordered entry ledger, insertion order = entry order, duplicates allowed
    pub players: [Pubkey; MAX_PLAYERS],
}

impl Lottery {
    /// Upkeep predicate: a draw may be triggered iff the round is open, the
    /// interval has elapsed, at least one player entered, and the pot is
    /// non-empty. Pure and side-effect-free.
    pub fn upkeep_needed(&self, now: UnixTimestamp) -> bool {
        self.state == LotteryState::Open
            && now - self.last_timestamp >= self.interval
            && self.num_players > 0
            && self.pot > 0
    }

    /// Bounds-checked ledger access
    pub fn player(&self, index: u64) -> Option<Pubkey> {
        if index < self.num_players as u64 {
            Some(self.players[index as usize])
        } else {
            None
        }
    }

    /// Append an entry to the ledger, failing when at capacity
    pub fn push_player(&mut self, player: Pubkey) -> Result<(), crate::error::LotteryError> {
        if self.num_players as usize >= MAX_PLAYERS {
            return Err(crate::error::LotteryError::PlayerLimitReached);
        }
        self.players[self.num_players as usize] = player;
        self.num_players += 1;
        Ok(())
    }

    /// Clear the ledger and reopen the round
    pub fn reset_round(&mut self, now: UnixTimestamp) {
        self.num_players = 0;
        self.players = [Pubkey::default(); MAX_PLAYERS];
        self.pot = 0;
        self.pending_request_id = 0;
        self.last_timestamp = now;
        self.state = LotteryState::Open;
    }
}

impl Sealed for Lottery {}

impl IsInitialized for Lottery {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for Lottery {
    const LEN: usize = 1 + 1 + 32 + 32 + 8 + 2 + 4 + 8 + 8 + 8 + 8 + 8 + 8 + 4 + 32 * MAX_PLAYERS;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, solana_program::program_error::ProgramError> {
        let src = array_ref![src, 0, Lottery::LEN];
        let (
            is_initialized,
            state,
            oracle_authority,
            key_hash,
            subscription_id,
            min_confirmations,
            callback_gas_limit,
            entrance_fee,
            interval,
            last_timestamp,
            pot,
            request_counter,
            pending_request_id,
            num_players,
            players,
        ) = array_refs![src, 1, 1, 32, 32, 8, 2, 4, 8, 8, 8, 8, 8, 8, 4, 32 * MAX_PLAYERS];

        let state = match LotteryState::try_from(state[0]) {
            Ok(state) => state,
            Err(_) => return Err(solana_program::program_error::ProgramError::InvalidAccountData),
        };

        let mut player_keys = [Pubkey::default(); MAX_PLAYERS];
        for (i, chunk) in players.chunks_exact(32).enumerate() {
            player_keys[i] = Pubkey::new_from_array(array_ref![chunk, 0, 32].to_owned());
        }

        Ok(Lottery {
            is_initialized: is_initialized[0] != 0,
            state,
            oracle_authority: Pubkey::new_from_array(*oracle_authority),
            key_hash: *key_hash,
            subscription_id: u64::from_le_bytes(*subscription_id),
            min_confirmations: u16::from_le_bytes(*min_confirmations),
            callback_gas_limit: u32::from_le_bytes(*callback_gas_limit),
            entrance_fee: u64::from_le_bytes(*entrance_fee),
            interval: i64::from_le_bytes(*interval),
            last_timestamp: UnixTimestamp::from_le_bytes(*last_timestamp),
            pot: u64::from_le_bytes(*pot),
            request_counter: u64::from_le_bytes(*request_counter),
            pending_request_id: u64::from_le_bytes(*pending_request_id),
            num_players: u32::from_le_bytes(*num_players),
            players: player_keys,
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Lottery::LEN];
        let (
            is_initialized_dst,
            state_dst,
            oracle_authority_dst,
            key_hash_dst,
            subscription_id_dst,
            min_confirmations_dst,
            callback_gas_limit_dst,
            entrance_fee_dst,
            interval_dst,
            last_timestamp_dst,
            pot_dst,
            request_counter_dst,
            pending_request_id_dst,
            num_players_dst,
            players_dst,
        ) = mut_array_refs![dst, 1, 1, 32, 32, 8, 2, 4, 8, 8, 8, 8, 8, 8, 4, 32 * MAX_PLAYERS];

        is_initialized_dst[0] = self.is_initialized as u8;
        state_dst[0] = self.state.into();
        oracle_authority_dst.copy_from_slice(self.oracle_authority.as_ref());
        key_hash_dst.copy_from_slice(&self.key_hash);
        *subscription_id_dst = self.subscription_id.to_le_bytes();
        *min_confirmations_dst = self.min_confirmations.to_le_bytes();
        *callback_gas_limit_dst = self.callback_gas_limit.to_le_bytes();
        *entrance_fee_dst = self.entrance_fee.to_le_bytes();
        *interval_dst = self.interval.to_le_bytes();
        *last_timestamp_dst = self.last_timestamp.to_le_bytes();
        *pot_dst = self.pot.to_le_bytes();
        *request_counter_dst = self.request_counter.to_le_bytes();
        *pending_request_id_dst = self.pending_request_id.to_le_bytes();
        *num_players_dst = self.num_players.to_le_bytes();
        for (i, key) in self.players.iter().enumerate() {
            players_dst[i * 32..(i + 1) * 32].copy_from_slice(key.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LotteryError;

    fn open_lottery() -> Lottery {
        let mut lottery = Lottery {
            is_initialized: true,
            state: LotteryState::Open,
            oracle_authority: Pubkey::new_unique(),
            key_hash: [7u8; 32],
            subscription_id: 42,
            min_confirmations: 3,
            callback_gas_limit: 500_000,
            entrance_fee: 1_000_000_000,
            interval: 60,
            last_timestamp: 1_000,
            pot: 0,
            request_counter: 0,
            pending_request_id: 0,
            num_players: 0,
            players: [Pubkey::default(); MAX_PLAYERS],
        };
        lottery.push_player(Pubkey::new_unique()).unwrap();
        lottery.pot = lottery.entrance_fee;
        lottery
    }

    #[test]
    fn upkeep_needed_when_all_conditions_hold() {
        let lottery = open_lottery();
        assert!(lottery.upkeep_needed(1_060));
        // repeated evaluation with unchanged state gives the same answer
        assert!(lottery.upkeep_needed(1_060));
    }

    #[test]
    fn upkeep_not_needed_while_calculating() {
        let mut lottery = open_lottery();
        lottery.state = LotteryState::Calculating;
        assert!(!lottery.upkeep_needed(1_060));
    }

    #[test]
    fn upkeep_not_needed_before_interval() {
        let lottery = open_lottery();
        assert!(!lottery.upkeep_needed(1_059));
    }

    #[test]
    fn upkeep_not_needed_without_players() {
        let mut lottery = open_lottery();
        lottery.num_players = 0;
        assert!(!lottery.upkeep_needed(1_060));
    }

    #[test]
    fn upkeep_not_needed_with_empty_pot() {
        let mut lottery = open_lottery();
        lottery.pot = 0;
        assert!(!lottery.upkeep_needed(1_060));
    }

    #[test]
    fn ledger_access_is_bounds_checked() {
        let lottery = open_lottery();
        assert!(lottery.player(0).is_some());
        assert_eq!(lottery.player(1), None);
    }

    #[test]
    fn ledger_rejects_entries_past_capacity() {
        let mut lottery = open_lottery();
        for _ in 1..MAX_PLAYERS {
            lottery.push_player(Pubkey::new_unique()).unwrap();
        }
        assert_eq!(
            lottery.push_player(Pubkey::new_unique()),
            Err(LotteryError::PlayerLimitReached)
        );
        assert_eq!(lottery.num_players as usize, MAX_PLAYERS);
    }

    #[test]
    fn reset_round_clears_the_ledger_and_reopens() {
        let mut lottery = open_lottery();
        lottery.state = LotteryState::Calculating;
        lottery.pending_request_id = 5;
        lottery.reset_round(2_000);
        assert_eq!(lottery.state, LotteryState::Open);
        assert_eq!(lottery.num_players, 0);
        assert_eq!(lottery.pot, 0);
        assert_eq!(lottery.pending_request_id, 0);
        assert_eq!(lottery.last_timestamp, 2_000);
    }

    #[test]
    fn pack_round_trip_preserves_state() {
        let mut lottery = open_lottery();
        lottery.push_player(Pubkey::new_unique()).unwrap();
        lottery.state = LotteryState::Calculating;
        lottery.request_counter = 3;
        lottery.pending_request_id = 3;

        let mut buf = [0u8; Lottery::LEN];
        lottery.pack_into_slice(&mut buf);
        let unpacked = Lottery::unpack_from_slice(&buf).unwrap();

        assert_eq!(unpacked.state, LotteryState::Calculating);
        assert_eq!(unpacked.oracle_authority, lottery.oracle_authority);
        assert_eq!(unpacked.key_hash, lottery.key_hash);
        assert_eq!(unpacked.subscription_id, lottery.subscription_id);
        assert_eq!(unpacked.min_confirmations, lottery.min_confirmations);
        assert_eq!(unpacked.callback_gas_limit, lottery.callback_gas_limit);
        assert_eq!(unpacked.entrance_fee, lottery.entrance_fee);
        assert_eq!(unpacked.interval, lottery.interval);
        assert_eq!(unpacked.last_timestamp, lottery.last_timestamp);
        assert_eq!(unpacked.pot, lottery.pot);
        assert_eq!(unpacked.request_counter, lottery.request_counter);
        assert_eq!(unpacked.pending_request_id, lottery.pending_request_id);
        assert_eq!(unpacked.num_players, lottery.num_players);
        assert_eq!(unpacked.players[..2], lottery.players[..2]);
    }
}
