//! Shared-expense ledger engine.
//!
//! The engine records expenses together with their splits and derives who
//! owes whom at three scopes: personal (one user against everybody), group
//! and thread. Nothing computed is ever persisted; every balance is
//! aggregated from the split rows on read.

pub use balances::{Balance, DashboardBalances, LedgerEntry, member_balances, personal_balances};
pub use error::EngineError;
pub use expenses::{ExpenseDetail, NewExpense, Participant, Scope};
pub use groups::{Group, GroupMembers, GroupSummary, Member};
pub use ops::{Engine, EngineBuilder, GroupRole, SETTLEMENT_TITLE};
pub use shares::{SPLIT_TOLERANCE, Share, SplitRequest};
pub use threads::{Thread, ThreadSummary};
pub use users::User;

mod balances;
mod error;
mod expenses;
mod group_memberships;
mod groups;
mod ops;
mod shares;
mod splits;
mod threads;
mod users;

type ResultEngine<T> = Result<T, EngineError>;
