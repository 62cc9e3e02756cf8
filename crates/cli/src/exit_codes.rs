//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Scripts that wrap `invmatch` rely on them.
//!
//! | Code | Meaning                                         |
//! |------|-------------------------------------------------|
//! | 0    | Success                                         |
//! | 1    | General error (unspecified)                     |
//! | 2    | CLI usage error (bad args, missing file flags)  |
//! | 3    | Config file unreadable, malformed or invalid    |
//! | 4    | A source export could not be loaded             |
//! | 5    | The report workbook or JSON could not be written|
//!
//! Categories with rows (repeats, unmatched numbers) are findings, not
//! failures: a completed run always exits 0.

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Config could not be read, parsed or validated.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Alma, FileMaker or extraction export failed to load.
pub const EXIT_INPUT_LOAD: u8 = 4;

/// Report workbook or JSON result could not be written.
pub const EXIT_OUTPUT_WRITE: u8 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_INVALID_CONFIG,
            EXIT_INPUT_LOAD,
            EXIT_OUTPUT_WRITE,
        ];
        let unique: std::collections::BTreeSet<u8> = codes.iter().copied().collect();
        assert_eq!(unique.len(), codes.len());
    }
}
