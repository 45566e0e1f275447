// Command handlers for the bitcoin-htlc CLI. Each prints its result to
// stdout; logs go to stderr.

pub mod create;
pub mod keypair;
pub mod show;
pub mod spend;
