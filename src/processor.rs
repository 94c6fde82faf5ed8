use crate::error::LotteryError;
use crate::instruction::LotteryInstruction;
use crate::randomness::{winner_index, NUM_WORDS};
use crate::state::{Lottery, LotteryState, MAX_PLAYERS};

use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::{clock::Clock, Sysvar},
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = LotteryInstruction::unpack(instruction_data)?;

        match instruction {
            LotteryInstruction::Initialize {
                entrance_fee,
                interval,
                key_hash,
                subscription_id,
                min_confirmations,
                callback_gas_limit,
            } => {
                msg!("Instruction: Initialize");
                Self::process_initialize(
                    accounts,
                    entrance_fee,
                    interval,
                    key_hash,
                    subscription_id,
                    min_confirmations,
                    callback_gas_limit,
                    program_id,
                )
            }
            LotteryInstruction::Enter { amount } => {
                msg!("Instruction: Enter");
                Self::process_enter(accounts, amount, program_id)
            }
            LotteryInstruction::CheckUpkeep {} => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, program_id)
            }
            LotteryInstruction::PerformUpkeep {} => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, program_id)
            }
            LotteryInstruction::FulfillRandomness {
                request_id,
                random_word,
            } => {
                msg!("Instruction: Fulfill Randomness");
                Self::process_fulfill_randomness(accounts, request_id, random_word, program_id)
            }
        }
    }

    /// Create and initialize the singleton lottery account. All oracle
    /// parameters are fixed here and never renegotiated by the program.
    fn process_initialize(
        accounts: &[AccountInfo],
        entrance_fee: u64,
        interval: i64,
        key_hash: [u8; 32],
        subscription_id: u64,
        min_confirmations: u16,
        callback_gas_limit: u32,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let payer_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let oracle_authority_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !payer_info.is_signer {
            msg!("Payer must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let (expected_lottery_pubkey, bump_seed) =
            Pubkey::find_program_address(&[b"lottery"], program_id);
        if *lottery_info.key != expected_lottery_pubkey {
            msg!("Invalid lottery account address");
            return Err(ProgramError::InvalidArgument);
        }

        if entrance_fee == 0 {
            msg!("Entrance fee must be greater than zero");
            return Err(ProgramError::InvalidArgument);
        }
        if interval <= 0 {
            msg!("Interval must be greater than zero");
            return Err(ProgramError::InvalidArgument);
        }

        if lottery_info.owner != program_id {
            msg!("Creating lottery account");
            let rent = Rent::get()?;
            let rent_lamports = rent.minimum_balance(Lottery::LEN);

            invoke_signed(
                &system_instruction::create_account(
                    payer_info.key,
                    lottery_info.key,
                    rent_lamports,
                    Lottery::LEN as u64,
                    program_id,
                ),
                &[
                    payer_info.clone(),
                    lottery_info.clone(),
                    system_program_info.clone(),
                ],
                &[&[b"lottery", &[bump_seed]]],
            )?;
        }

        let lottery = Lottery::unpack_unchecked(&lottery_info.data.borrow())?;
        if lottery.is_initialized {
            msg!("Lottery account is already initialized");
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        let clock = Clock::get()?;

        let lottery_data = Lottery {
            is_initialized: true,
            state: LotteryState::Open,
            oracle_authority: *oracle_authority_info.key,
            key_hash,
            subscription_id,
            min_confirmations,
            callback_gas_limit,
            entrance_fee,
            interval,
            last_timestamp: clock.unix_timestamp,
            pot: 0,
            request_counter: 0,
            pending_request_id: 0,
            num_players: 0,
            players: [Pubkey::default(); MAX_PLAYERS],
        };

        Lottery::pack(lottery_data, &mut lottery_info.data.borrow_mut())?;

        msg!(
            "Lottery initialized: Oracle={}, EntranceFee={}, Interval={}s",
            oracle_authority_info.key,
            entrance_fee,
            interval
        );
        Ok(())
    }

    /// Admit a paid entry into the current round. The full payment is
    /// retained; overpayment above the entrance fee is not refunded.
    fn process_enter(accounts: &[AccountInfo], amount: u64, program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if lottery_info.owner != program_id {
            msg!("Lottery account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut lottery_data = Lottery::unpack(&lottery_info.data.borrow())?;

        if amount < lottery_data.entrance_fee {
            msg!(
                "Payment of {} lamports is below the entrance fee of {}",
                amount,
                lottery_data.entrance_fee
            );
            return Err(LotteryError::InsufficientEntranceFee.into());
        }

        if lottery_data.state != LotteryState::Open {
            msg!("Lottery is not open, a draw is in flight");
            return Err(LotteryError::LotteryNotOpen.into());
        }

        lottery_data.push_player(*player_info.key)?;
        lottery_data.pot = lottery_data
            .pot
            .checked_add(amount)
            .ok_or(ProgramError::InvalidArgument)?;

        invoke(
            &system_instruction::transfer(player_info.key, lottery_info.key, amount),
            &[
                player_info.clone(),
                lottery_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        Lottery::pack(lottery_data, &mut lottery_info.data.borrow_mut())?;

        msg!(
            "EntryRecorded: player {} paid {} lamports, pot is now {}",
            player_info.key,
            amount,
            lottery_data.pot
        );
        Ok(())
    }

    /// Evaluate the upkeep predicate and log the verdict. Read-only: safely
    /// callable by anyone, repeated calls with unchanged state agree.
    fn process_check_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let lottery_info = next_account_info(account_info_iter)?;

        if lottery_info.owner != program_id {
            msg!("Lottery account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let lottery_data = Lottery::unpack(&lottery_info.data.borrow())?;
        let clock = Clock::get()?;
        let needed = lottery_data.upkeep_needed(clock.unix_timestamp);

        msg!(
            "Upkeep needed: {} (state={:?}, elapsed={}s of {}s, players={}, pot={})",
            needed,
            lottery_data.state,
            clock.unix_timestamp - lottery_data.last_timestamp,
            lottery_data.interval,
            lottery_data.num_players,
            lottery_data.pot
        );
        Ok(())
    }

    /// Close the round and issue a randomness request. The upkeep predicate
    /// is re-evaluated here; the caller's claim of eligibility is never
    /// trusted.
    fn process_perform_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;

        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if lottery_info.owner != program_id {
            msg!("Lottery account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut lottery_data = Lottery::unpack(&lottery_info.data.borrow())?;
        let clock = Clock::get()?;

        if !lottery_data.upkeep_needed(clock.unix_timestamp) {
            msg!(
                "Upkeep not needed: pot={}, players={}, state={:?}",
                lottery_data.pot,
                lottery_data.num_players,
                lottery_data.state
            );
            return Err(LotteryError::UpkeepNotNeeded.into());
        }

        lottery_data.state = LotteryState::Calculating;
        lottery_data.request_counter = lottery_data
            .request_counter
            .checked_add(1)
            .ok_or(ProgramError::InvalidArgument)?;
        lottery_data.pending_request_id = lottery_data.request_counter;

        Lottery::pack(lottery_data, &mut lottery_info.data.borrow_mut())?;

        // Outbound oracle request, picked up off-chain by the oracle service
        msg!(
            "Requesting {} random word(s): key_hash={:?}, subscription={}, min_confirmations={}, callback_gas_limit={}",
            NUM_WORDS,
            lottery_data.key_hash,
            lottery_data.subscription_id,
            lottery_data.min_confirmations,
            lottery_data.callback_gas_limit
        );
        msg!("DrawRequested: request id {}", lottery_data.pending_request_id);
        Ok(())
    }

    /// Oracle callback: select the winner from the delivered word, pay out
    /// the entire pot, and reopen the round. Any failure reverts the whole
    /// instruction and the round stays in the calculating phase.
    fn process_fulfill_randomness(
        accounts: &[AccountInfo],
        request_id: u64,
        random_word: [u8; 32],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let oracle_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        if lottery_info.owner != program_id {
            msg!("Lottery account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut lottery_data = Lottery::unpack(&lottery_info.data.borrow())?;

        // Trust boundary: only the oracle's delivery path may finalize a round
        if !oracle_info.is_signer || *oracle_info.key != lottery_data.oracle_authority {
            msg!(
                "Security: rejected fulfillment from {}, oracle authority is {}",
                oracle_info.key,
                lottery_data.oracle_authority
            );
            return Err(LotteryError::CallerNotOracle.into());
        }

        if lottery_data.pending_request_id == 0 || request_id != lottery_data.pending_request_id {
            msg!(
                "Request id {} does not match the in-flight request {}",
                request_id,
                lottery_data.pending_request_id
            );
            return Err(LotteryError::UnknownRequestId.into());
        }

        let index = winner_index(&random_word, lottery_data.num_players as u64);
        // Out-of-range here would be a contract violation, never wraparound
        let winner = lottery_data
            .player(index)
            .ok_or(ProgramError::InvalidAccountData)?;
        msg!("Random winner index: {} of {}", index, lottery_data.num_players);

        if *winner_info.key != winner {
            msg!(
                "Winner account {} does not match selected player {}",
                winner_info.key,
                winner
            );
            return Err(LotteryError::WinnerMismatch.into());
        }

        // Transfer the entire pot; the rent-exempt reserve stays behind
        let prize_amount = lottery_data.pot;
        let lottery_lamports = lottery_info
            .lamports()
            .checked_sub(prize_amount)
            .ok_or(LotteryError::TransferFailed)?;
        let winner_lamports = winner_info
            .lamports()
            .checked_add(prize_amount)
            .ok_or(LotteryError::TransferFailed)?;
        **lottery_info.try_borrow_mut_lamports()? = lottery_lamports;
        **winner_info.try_borrow_mut_lamports()? = winner_lamports;

        let clock = Clock::get()?;
        lottery_data.reset_round(clock.unix_timestamp);
        Lottery::pack(lottery_data, &mut lottery_info.data.borrow_mut())?;

        msg!(
            "WinnerPicked: {} wins {} lamports, round reopened",
            winner_info.key,
            prize_amount
        );
        Ok(())
    }
}
