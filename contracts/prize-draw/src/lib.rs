pub mod beacon;
pub mod contract;
pub mod directory;
pub mod engine;
pub mod error;
pub mod execute;
pub mod inventory;
pub mod ledger;
pub mod msg;
pub mod query;
pub mod state;
pub mod store;

pub use crate::engine::{DrawEngine, DrawReceipt};
pub use crate::error::ContractError;
pub use crate::store::{DrawStore, SharedStore, TxStorage};
