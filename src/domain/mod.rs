//! Core domain: the ledger model, the command language, and the dispatcher
//! that ties them together.

pub mod action;
pub mod catalog;
pub mod command_parser;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod fx;
pub mod holding;
pub mod ledger;
pub mod order;
pub mod param;
pub mod portfolio;
pub mod sector;
pub mod sref;
pub mod stock;
