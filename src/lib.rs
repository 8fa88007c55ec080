pub mod backfill;
pub mod cache;
pub mod clock;
pub mod config;
pub mod directory;
pub mod humanize;
pub mod intake;
pub mod lanes;
pub mod ledger;
pub mod observability;
pub mod server;
pub mod store;
pub mod worker;
