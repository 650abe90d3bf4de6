//! Chainvault Client - backend access for balances, fees, prices and broadcast.
//!
//! The wallet never talks to chain nodes directly. Reads and broadcasts go
//! through backend functions that accept action-tagged JSON
//! ([`actions::Action`]) and are invoked by [`BackendClient`].

pub mod actions;
pub mod client;
pub mod error;
pub mod poller;
pub mod portfolio;

pub use actions::{decode_response, Action, HistoryEntry, PricesResponse, TokenBalance, TxStatus};
pub use client::BackendClient;
pub use error::ClientError;
pub use poller::{spawn_poller, PollHandle, Snapshot};
pub use portfolio::{value_portfolio, Holding, PortfolioValue, ValuedHolding};
