//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — test harnesses rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3-9     | recon            | Reconciliation outcome codes             |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use sensorgrid_recon::model::ReconFailure;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Recon (3-9)
// =============================================================================

/// Feeds were compared but the agreeing share is below `min_match_pct`.
pub const EXIT_RECON_MISMATCH: u8 = 3;

/// One feed produced no readings (fetch failed, command failed, empty listing).
pub const EXIT_RECON_NO_DATA: u8 = 4;

/// Both feeds have readings but no pair shares a vocabulary keyword.
pub const EXIT_RECON_NO_COMMON: u8 = 5;

/// Thermal limit check failed (critical temperature, missing reading, no CPU sensors).
pub const EXIT_RECON_LIMITS: u8 = 6;

/// Config file failed to parse or validate.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 7;

/// Runtime error (cannot read config/input, cannot write output).
pub const EXIT_RECON_RUNTIME: u8 = 8;

/// Map a terminal reconciliation failure to its exit code.
pub fn failure_exit_code(failure: ReconFailure) -> u8 {
    if failure.is_no_data() {
        EXIT_RECON_NO_DATA
    } else {
        EXIT_RECON_NO_COMMON
    }
}
