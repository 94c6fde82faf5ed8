use crate::error::LotteryError;
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use std::convert::TryInto;
use std::mem::size_of;

#[derive(Clone, Debug, PartialEq)]
pub enum LotteryInstruction {
    /// Initialize the lottery
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The payer funding the lottery account
    /// 1. `[writable]` The lottery account (PDA, seeds `["lottery"]`)
    /// 2. `[]` The oracle authority trusted to deliver randomness
    /// 3. `[]` The system program
    Initialize {
        /// Entry price in lamports
        entrance_fee: u64,
        /// Minimum seconds between round start and draw eligibility
        interval: i64,
        /// Oracle gas-lane/key identifier
        key_hash: [u8; 32],
        /// Oracle subscription funding the requests
        subscription_id: u64,
        /// Confirmations the oracle waits for before responding
        min_confirmations: u16,
        /// Compute budget for the oracle callback
        callback_gas_limit: u32,
    },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player entering (pays `amount`)
    /// 1. `[writable]` The lottery account
    /// 2. `[]` The system program
    Enter {
        /// Payment in lamports; must be at least the entrance fee, any
        /// excess is retained by the pot
        amount: u64,
    },

    /// Evaluate the upkeep predicate, logging the verdict
    ///
    /// Read-only, callable by anyone, never changes state.
    ///
    /// Accounts expected:
    /// 0. `[]` The lottery account
    CheckUpkeep {},

    /// Trigger a draw: close entries and issue a randomness request
    ///
    /// Re-checks the upkeep predicate internally; the caller's claim of
    /// eligibility is never trusted.
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any caller (fully decentralized)
    /// 1. `[writable]` The lottery account
    PerformUpkeep {},

    /// Oracle callback delivering the random word for an in-flight draw
    ///
    /// Accounts expected:
    /// 0. `[signer]` The oracle authority registered at initialization
    /// 1. `[writable]` The lottery account
    /// 2. `[writable]` The selected winner (player at `word mod players`)
    FulfillRandomness {
        /// Identifier of the draw request being fulfilled
        request_id: u64,
        /// The delivered 256-bit random word
        random_word: [u8; 32],
    },
}

impl LotteryInstruction {
    /// Unpacks a byte buffer into a LotteryInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(LotteryError::InvalidInstructionData)?;

        Ok(match tag {
            0 => {
                let (entrance_fee, rest) = Self::unpack_u64(rest)?;
                let (interval, rest) = Self::unpack_i64(rest)?;
                let (key_hash, rest) = Self::unpack_bytes32(rest)?;
                let (subscription_id, rest) = Self::unpack_u64(rest)?;
                let (min_confirmations, rest) = Self::unpack_u16(rest)?;
                let (callback_gas_limit, _) = Self::unpack_u32(rest)?;
                Self::Initialize {
                    entrance_fee,
                    interval,
                    key_hash,
                    subscription_id,
                    min_confirmations,
                    callback_gas_limit,
                }
            }
            1 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::Enter { amount }
            }
            2 => Self::CheckUpkeep {},
            3 => Self::PerformUpkeep {},
            4 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let (random_word, _) = Self::unpack_bytes32(rest)?;
                Self::FulfillRandomness {
                    request_id,
                    random_word,
                }
            }
            _ => return Err(LotteryError::InvalidInstructionData.into()),
        })
    }

    /// Packs a LotteryInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(size_of::<Self>());
        match *self {
            Self::Initialize {
                entrance_fee,
                interval,
                ref key_hash,
                subscription_id,
                min_confirmations,
                callback_gas_limit,
            } => {
                buf.push(0);
                buf.extend_from_slice(&entrance_fee.to_le_bytes());
                buf.extend_from_slice(&interval.to_le_bytes());
                buf.extend_from_slice(key_hash);
                buf.extend_from_slice(&subscription_id.to_le_bytes());
                buf.extend_from_slice(&min_confirmations.to_le_bytes());
                buf.extend_from_slice(&callback_gas_limit.to_le_bytes());
            }
            Self::Enter { amount } => {
                buf.push(1);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::CheckUpkeep {} => buf.push(2),
            Self::PerformUpkeep {} => buf.push(3),
            Self::FulfillRandomness {
                request_id,
                ref random_word,
            } => {
                buf.push(4);
                buf.extend_from_slice(&request_id.to_le_bytes());
                buf.extend_from_slice(random_word);
            }
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        if input.len() < 8 {
            return Err(LotteryError::InvalidInstructionData.into());
        }
        let (bytes, rest) = input.split_at(8);
        let bytes: [u8; 8] = bytes
            .try_into()
            .map_err(|_| LotteryError::InvalidInstructionData)?;
        Ok((u64::from_le_bytes(bytes), rest))
    }

    fn unpack_i64(input: &[u8]) -> Result<(i64, &[u8]), ProgramError> {
        if input.len() < 8 {
            return Err(LotteryError::InvalidInstructionData.into());
        }
        let (bytes, rest) = input.split_at(8);
        let bytes: [u8; 8] = bytes
            .try_into()
            .map_err(|_| LotteryError::InvalidInstructionData)?;
        Ok((i64::from_le_bytes(bytes), rest))
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
        if input.len() < 4 {
            return Err(LotteryError::InvalidInstructionData.into());
        }
        let (bytes, rest) = input.split_at(4);
        let bytes: [u8; 4] = bytes
            .try_into()
            .map_err(|_| LotteryError::InvalidInstructionData)?;
        Ok((u32::from_le_bytes(bytes), rest))
    }

    fn unpack_u16(input: &[u8]) -> Result<(u16, &[u8]), ProgramError> {
        if input.len() < 2 {
            return Err(LotteryError::InvalidInstructionData.into());
        }
        let (bytes, rest) = input.split_at(2);
        let bytes: [u8; 2] = bytes
            .try_into()
            .map_err(|_| LotteryError::InvalidInstructionData)?;
        Ok((u16::from_le_bytes(bytes), rest))
    }

    fn unpack_bytes32(input: &[u8]) -> Result<([u8; 32], &[u8]), ProgramError> {
        if input.len() < 32 {
            return Err(LotteryError::InvalidInstructionData.into());
        }
        let (bytes, rest) = input.split_at(32);
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| LotteryError::InvalidInstructionData)?;
        Ok((bytes, rest))
    }
}

/// Find the lottery account address
pub fn find_lottery_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[b"lottery"], program_id)
}

/// Create an initialize instruction
pub fn initialize(
    program_id: &Pubkey,
    payer: &Pubkey,
    lottery_account: &Pubkey,
    oracle_authority: &Pubkey,
    entrance_fee: u64,
    interval: i64,
    key_hash: [u8; 32],
    subscription_id: u64,
    min_confirmations: u16,
    callback_gas_limit: u32,
) -> Instruction {
    let data = LotteryInstruction::Initialize {
        entrance_fee,
        interval,
        key_hash,
        subscription_id,
        min_confirmations,
        callback_gas_limit,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new(*lottery_account, false),
        AccountMeta::new_readonly(*oracle_authority, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create an enter instruction
pub fn enter(
    program_id: &Pubkey,
    player: &Pubkey,
    lottery_account: &Pubkey,
    amount: u64,
) -> Instruction {
    let data = LotteryInstruction::Enter { amount }.pack();

    let accounts = vec![
        AccountMeta::new(*player, true),
        AccountMeta::new(*lottery_account, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create a check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey, lottery_account: &Pubkey) -> Instruction {
    let data = LotteryInstruction::CheckUpkeep {}.pack();

    let accounts = vec![AccountMeta::new_readonly(*lottery_account, false)];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create a perform_upkeep instruction
pub fn perform_upkeep(
    program_id: &Pubkey,
    caller: &Pubkey,
    lottery_account: &Pubkey,
) -> Instruction {
    let data = LotteryInstruction::PerformUpkeep {}.pack();

    let accounts = vec![
        AccountMeta::new_readonly(*caller, true),
        AccountMeta::new(*lottery_account, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create a fulfill_randomness instruction
pub fn fulfill_randomness(
    program_id: &Pubkey,
    oracle_authority: &Pubkey,
    lottery_account: &Pubkey,
    winner: &Pubkey,
    request_id: u64,
    random_word: [u8; 32],
) -> Instruction {
    let data = LotteryInstruction::FulfillRandomness {
        request_id,
        random_word,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new_readonly(*oracle_authority, true),
        AccountMeta::new(*lottery_account, false),
        AccountMeta::new(*winner, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_codec_round_trips() {
        let cases = [
            LotteryInstruction::Initialize {
                entrance_fee: 1_000_000_000,
                interval: 60,
                key_hash: [9u8; 32],
                subscription_id: 7,
                min_confirmations: 3,
                callback_gas_limit: 500_000,
            },
            LotteryInstruction::Enter { amount: 1_500_000_000 },
            LotteryInstruction::CheckUpkeep {},
            LotteryInstruction::PerformUpkeep {},
            LotteryInstruction::FulfillRandomness {
                request_id: 1,
                random_word: crate::randomness::word_from_u64(7),
            },
        ];
        for case in cases {
            assert_eq!(LotteryInstruction::unpack(&case.pack()).unwrap(), case);
        }
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let mut data = LotteryInstruction::Enter { amount: 1 }.pack();
        data.truncate(5);
        assert!(LotteryInstruction::unpack(&data).is_err());
        assert!(LotteryInstruction::unpack(&[]).is_err());
        assert!(LotteryInstruction::unpack(&[99]).is_err());
    }
}
