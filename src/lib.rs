//! Field Inventory
//!
//! 現地調査の記録（地点・名称・数量・写真）を蓄積し、PDF報告書として出力する。

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod inventory;
pub mod photos;
pub mod storage;

pub use error::{InventoryError, Result};
pub use inventory::Inventory;
