//! Core types for zero-allocation ingestion
//!
//! This module contains the fundamental types used throughout the system:
//! - Symbol: bounded inline symbol key
//! - TradeRecord / Side: decoded trade message
//! - SymbolArena / SymbolTable: lock-free per-symbol statistics
//! - GlobalCounters: message totals

pub mod arena;
pub mod counters;
pub mod record;
pub mod symbol;
pub mod symbol_table;

pub use arena::{ArenaSpan, SymbolArena};
pub use counters::{CounterSnapshot, GlobalCounters, MalformedBreakdown};
pub use record::{Side, TradeRecord};
pub use symbol::{Symbol, SymbolError, MAX_SYMBOL_LEN};
pub use symbol_table::{SlotHandle, SymbolStats, SymbolTable, TableError};
