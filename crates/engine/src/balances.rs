//! Balance aggregation.
//!
//! Every scope is computed the same way from a flat list of [`LedgerEntry`]
//! rows (one per split, with the payer of its expense):
//!
//! 1. the *owed-by* set: what each key owes, summed per key;
//! 2. the *owed-to* set: what is owed to each key, summed per key;
//! 3. a full outer join of both sets, the missing side counting as zero.
//!
//! A split whose user is also the payer of the expense is a self-pair and is
//! dropped before aggregation: nobody owes money to themselves.
//!
//! Sign convention: `net_balance = amount_due - amount_owed`. From the
//! caller's side a positive net means the counterparty owes the caller.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use sea_orm::FromQueryResult;
use serde::Serialize;

/// A split joined with the payer of its expense.
#[derive(Clone, Copy, Debug, PartialEq, FromQueryResult)]
pub struct LedgerEntry {
    pub expense_id: i32,
    pub payer_id: i32,
    pub debtor_id: i32,
    pub amount_owed: f64,
}

impl LedgerEntry {
    fn is_self_pair(&self) -> bool {
        self.payer_id == self.debtor_id
    }
}

/// Netted position of one user.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Balance {
    pub user_id: i32,
    pub username: String,
    pub amount_owed: f64,
    pub amount_due: f64,
    pub net_balance: f64,
}

/// All personal relationships of one user, with totals.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DashboardBalances {
    pub total_owed: f64,
    pub total_due: f64,
    pub net_balance: f64,
    pub counterparties: Vec<Balance>,
}

impl DashboardBalances {
    pub fn from_counterparties(counterparties: Vec<Balance>) -> Self {
        let total_owed: f64 = counterparties.iter().map(|b| b.amount_owed).sum();
        let total_due: f64 = counterparties.iter().map(|b| b.amount_due).sum();
        Self {
            total_owed,
            total_due,
            net_balance: total_due - total_owed,
            counterparties,
        }
    }
}

fn sum_by<'a>(
    entries: impl Iterator<Item = &'a LedgerEntry>,
    key: impl Fn(&LedgerEntry) -> i32,
) -> BTreeMap<i32, f64> {
    let mut sums = BTreeMap::new();
    for entry in entries {
        *sums.entry(key(entry)).or_insert(0.0) += entry.amount_owed;
    }
    sums
}

fn full_outer(owed: BTreeMap<i32, f64>, due: BTreeMap<i32, f64>) -> Vec<Balance> {
    let keys: BTreeSet<i32> = owed.keys().chain(due.keys()).copied().collect();
    keys.into_iter()
        .map(|user_id| {
            let amount_owed = owed.get(&user_id).copied().unwrap_or(0.0);
            let amount_due = due.get(&user_id).copied().unwrap_or(0.0);
            Balance {
                user_id,
                username: String::new(),
                amount_owed,
                amount_due,
                net_balance: amount_due - amount_owed,
            }
        })
        .collect()
}

/// Per-counterparty balances of `user_id`, ordered by counterparty id.
///
/// `amount_owed` is what `user_id` owes the counterparty, `amount_due` what
/// the counterparty owes `user_id`.
pub fn personal_balances(user_id: i32, entries: &[LedgerEntry]) -> Vec<Balance> {
    let relevant = || entries.iter().filter(|e| !e.is_self_pair());
    let owed = sum_by(relevant().filter(|e| e.debtor_id == user_id), |e| e.payer_id);
    let due = sum_by(relevant().filter(|e| e.payer_id == user_id), |e| e.debtor_id);
    full_outer(owed, due)
}

/// Per-member balances over a whole scope (group or thread), ordered by
/// member id. The nets of a scope always add up to zero.
pub fn member_balances(entries: &[LedgerEntry]) -> Vec<Balance> {
    let relevant = || entries.iter().filter(|e| !e.is_self_pair());
    let owed = sum_by(relevant(), |e| e.debtor_id);
    let due = sum_by(relevant(), |e| e.payer_id);
    full_outer(owed, due)
}

/// Fills `username` from `names`; unknown ids keep an empty name.
pub(crate) fn with_usernames(mut rows: Vec<Balance>, names: &HashMap<i32, String>) -> Vec<Balance> {
    for row in &mut rows {
        if let Some(name) = names.get(&row.user_id) {
            row.username = name.clone();
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: i32 = 1;
    const BOB: i32 = 2;
    const CAROL: i32 = 3;

    fn entry(expense_id: i32, payer_id: i32, debtor_id: i32, amount_owed: f64) -> LedgerEntry {
        LedgerEntry {
            expense_id,
            payer_id,
            debtor_id,
            amount_owed,
        }
    }

    fn find(rows: &[Balance], user_id: i32) -> &Balance {
        rows.iter().find(|b| b.user_id == user_id).unwrap()
    }

    #[test]
    fn dinner_split_in_group() {
        let entries = [entry(1, ALICE, ALICE, 50.0), entry(1, ALICE, BOB, 50.0)];
        let rows = member_balances(&entries);

        assert_eq!(rows.len(), 2);
        let alice = find(&rows, ALICE);
        assert_eq!(
            (alice.amount_owed, alice.amount_due, alice.net_balance),
            (0.0, 50.0, 50.0)
        );
        let bob = find(&rows, BOB);
        assert_eq!(
            (bob.amount_owed, bob.amount_due, bob.net_balance),
            (50.0, 0.0, -50.0)
        );
    }

    #[test]
    fn opposite_expenses_are_netted() {
        let entries = [entry(1, ALICE, BOB, 100.0), entry(2, BOB, ALICE, 40.0)];
        let rows = member_balances(&entries);

        assert_eq!(find(&rows, ALICE).net_balance, 60.0);
        assert_eq!(find(&rows, BOB).net_balance, -60.0);
    }

    #[test]
    fn member_nets_sum_to_zero() {
        let entries = [
            entry(1, ALICE, ALICE, 30.0),
            entry(1, ALICE, BOB, 30.0),
            entry(1, ALICE, CAROL, 30.0),
            entry(2, CAROL, BOB, 12.5),
        ];
        let total: f64 = member_balances(&entries)
            .iter()
            .map(|b| b.net_balance)
            .sum();
        assert!(total.abs() < 1e-9);
    }

    #[test]
    fn personal_view_is_symmetric() {
        let entries = [
            entry(1, ALICE, BOB, 70.0),
            entry(2, BOB, ALICE, 20.0),
            entry(3, CAROL, ALICE, 5.0),
        ];
        let alice = personal_balances(ALICE, &entries);
        let bob = personal_balances(BOB, &entries);

        assert_eq!(find(&alice, BOB).net_balance, 50.0);
        assert_eq!(find(&bob, ALICE).net_balance, -50.0);
        assert_eq!(find(&alice, CAROL).amount_owed, 5.0);
        assert_eq!(find(&alice, CAROL).amount_due, 0.0);
    }

    #[test]
    fn one_sided_counterparty_still_listed() {
        let entries = [entry(1, BOB, ALICE, 10.0)];
        let rows = personal_balances(ALICE, &entries);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, BOB);
        assert_eq!(rows[0].amount_due, 0.0);
        assert_eq!(rows[0].net_balance, -10.0);
    }

    #[test]
    fn self_pairs_never_become_counterparties() {
        let entries = [entry(1, ALICE, ALICE, 40.0)];
        assert!(personal_balances(ALICE, &entries).is_empty());
        assert!(member_balances(&entries).is_empty());
    }

    #[test]
    fn empty_ledger_gives_empty_dashboard() {
        let dashboard = DashboardBalances::from_counterparties(personal_balances(ALICE, &[]));
        assert_eq!(dashboard, DashboardBalances::default());
        assert!(dashboard.counterparties.is_empty());
    }

    #[test]
    fn dashboard_totals() {
        let entries = [
            entry(1, ALICE, BOB, 30.0),
            entry(2, CAROL, ALICE, 45.0),
            entry(3, ALICE, CAROL, 5.0),
        ];
        let dashboard = DashboardBalances::from_counterparties(personal_balances(ALICE, &entries));
        assert_eq!(dashboard.total_owed, 45.0);
        assert_eq!(dashboard.total_due, 35.0);
        assert_eq!(dashboard.net_balance, -10.0);
    }

    #[test]
    fn usernames_are_attached() {
        let names = HashMap::from([(BOB, "bob".to_string())]);
        let rows = with_usernames(personal_balances(ALICE, &[entry(1, ALICE, BOB, 1.0)]), &names);
        assert_eq!(rows[0].username, "bob");
    }
}
