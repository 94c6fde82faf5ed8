// Solottery - a fully automated lottery on Solana
//
// Entries accumulate in a program-owned pot. Once the configured interval
// has elapsed, anyone may trigger upkeep, which closes the round and issues
// a randomness request. The external oracle later delivers a random word
// through the fulfillment instruction, which pays the winner and reopens
// the round.

pub mod error;
pub mod instruction;
pub mod processor;
pub mod randomness;
pub mod state;

#[cfg(not(feature = "no-entrypoint"))]
pub mod entrypoint;

use solana_program::{
    account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey,
};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process(program_id, accounts, instruction_data)
}
