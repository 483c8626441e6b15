/// Account handle and its balance state.
/// State is modified using events, which are created by handling commands
pub mod account;

/// Validated balance commands that are later executed by [`account`].
pub mod command;

/// Balance sources consulted when an account is synchronized.
pub mod oracle;

/// Script driver used by the binary. Ideally it would live in its own crate,
/// but the integration tests use it, so it is kept here.
pub mod bin_utils;
