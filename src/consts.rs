//! Project-wide constants.

use std::time::Duration;

/// Default location of the server configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/wbot/server.conf";

/// Environment variable through which the solver finds its data index.
pub const INDEX_ENV_VAR: &str = "WORDSMITH_INDEX";

/// Maximum solver stdout in bytes. Anything beyond this is never read.
pub const MAX_OUTPUT_BYTES: u64 = 1024 * 1024;

/// Maximum solver stderr kept for error reports.
pub const MAX_STDERR_BYTES: u64 = 4 * 1024;

/// Budget for the word list call. Intended to run once at startup.
pub const WORD_LIST_TIMEOUT: Duration = Duration::from_millis(1000);

/// Length of every valid word.
pub const WORD_LEN: usize = 5;
