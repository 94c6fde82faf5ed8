use solana_program::{
    decode_error::DecodeError, msg, program_error::PrintProgramError,
    program_error::ProgramError,
};
use thiserror::Error;

/// Errors that may be returned by the Lottery program
#[derive(Error, Debug, Copy, Clone, PartialEq)]
pub enum LotteryError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    /// Entry payment is below the entrance fee
    #[error("Payment is below the entrance fee")]
    InsufficientEntranceFee,

    /// Lottery is not open for entries
    #[error("Lottery is not open")]
    LotteryNotOpen,

    /// Upkeep conditions are not met, no draw may be triggered
    #[error("Upkeep is not needed")]
    UpkeepNotNeeded,

    /// Randomness fulfillment attempted by an account other than the oracle
    #[error("Caller is not the randomness oracle")]
    CallerNotOracle,

    /// Fulfillment request id does not match the in-flight draw request
    #[error("No in-flight draw request with this id")]
    UnknownRequestId,

    /// The winner account passed does not match the selected player
    #[error("Winner account does not match the selected player")]
    WinnerMismatch,

    /// The entry ledger is at capacity
    #[error("Player limit reached for this round")]
    PlayerLimitReached,

    /// Payout to the selected winner could not complete
    #[error("Pot transfer to the winner failed")]
    TransferFailed,
}

impl From<LotteryError> for ProgramError {
    fn from(e: LotteryError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for LotteryError {
    fn type_of() -> &'static str {
        "Lottery Error"
    }
}

impl PrintProgramError for LotteryError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
