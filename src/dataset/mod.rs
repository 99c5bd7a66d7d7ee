//! Labeled feature datasets
//!
//! Building a table from records, persisting it as CSV, and inspecting its
//! class balance.

pub mod balance;
pub mod builder;
pub mod table;

pub use balance::{analyze as analyze_balance, BalanceReport, ImbalanceSeverity};
pub use builder::{BuildReport, BuildStats, DatasetBuilder, FailedRecord, OutcomeCounts, RecordOutcome};
pub use table::{Dataset, DatasetRow};
