//! Terminal and environment detection.

use std::io::IsTerminal;

#[must_use]
pub fn stdout_is_tty() -> bool {
    std::io::stdout().is_terminal()
}

#[must_use]
pub fn stderr_is_tty() -> bool {
    std::io::stderr().is_terminal()
}

/// Whether report output on stdout may use ANSI colors.
///
/// Off when `--no-color` is given, `NO_COLOR` is set, `TERM=dumb`, or stdout
/// is not a terminal.
#[must_use]
pub fn should_use_color(no_color_flag: bool) -> bool {
    let disabled_by_env = std::env::var_os("NO_COLOR").is_some()
        || std::env::var("TERM").is_ok_and(|term| term == "dumb");
    !no_color_flag && !disabled_by_env && stdout_is_tty()
}
