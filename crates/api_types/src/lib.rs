use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Id of a freshly created resource.
#[derive(Debug, Serialize, Deserialize)]
pub struct Created {
    pub id: i32,
}

pub mod user {
    use super::*;

    /// Request body of `POST /register`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Register {
        pub username: String,
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: i32,
        pub username: String,
        pub email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserList {
        pub users: Vec<UserView>,
    }
}

pub mod group {
    use super::*;

    /// Role of a user inside a group.
    ///
    /// - `admin`: manages members and can delete the group.
    /// - `member`: reads the group and records expenses in it.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum GroupRole {
        Admin,
        Member,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupNew {
        pub name: String,
        #[serde(default)]
        pub member_ids: Vec<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupView {
        pub id: i32,
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupList {
        pub groups: Vec<GroupView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembersAdd {
        pub user_ids: Vec<i32>,
    }

    /// How many of the requested users were not members yet.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembersAdded {
        pub added: usize,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub user_id: i32,
        pub username: String,
        pub role: GroupRole,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembersResponse {
        pub group_id: i32,
        pub group_name: String,
        pub members: Vec<MemberView>,
    }

    /// A group of the caller with the caller's net balance in it.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupSummaryView {
        pub group_id: i32,
        pub group_name: String,
        pub total_balance: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupSummaries {
        pub groups: Vec<GroupSummaryView>,
    }
}

pub mod thread {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ThreadNew {
        pub name: String,
        pub group_id: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ThreadView {
        pub id: i32,
        pub name: String,
        pub group_id: Option<i32>,
        pub created_by: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ThreadList {
        pub threads: Vec<ThreadView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ThreadSummaryView {
        pub thread_id: i32,
        pub thread_name: String,
        pub total_balance: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ThreadSummaries {
        pub threads: Vec<ThreadSummaryView>,
    }
}

pub mod expense {
    use super::*;

    /// Request body of `POST /expenses`.
    ///
    /// Exactly one of `split_with` (equal shares) and `amounts` (explicit
    /// shares, keyed by user id) must be set. `paid_by` defaults to the
    /// caller.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub title: String,
        pub amount: f64,
        pub paid_by: Option<i32>,
        pub group_id: Option<i32>,
        pub thread_id: Option<i32>,
        pub split_with: Option<Vec<i32>>,
        pub amounts: Option<BTreeMap<i32, f64>>,
    }

    /// Request body of `POST /settle`: `from_user` pays `to_user`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettleNew {
        pub from_user: i32,
        pub to_user: i32,
        pub amount: f64,
        pub group_id: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ParticipantView {
        pub user_id: i32,
        pub username: String,
        pub amount_owed: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: i32,
        pub title: String,
        pub amount: f64,
        pub paid_by: i32,
        pub group_id: Option<i32>,
        pub thread_id: Option<i32>,
        pub thread_name: Option<String>,
        pub participants: Vec<ParticipantView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseList {
        pub expenses: Vec<ExpenseView>,
    }
}

pub mod balance {
    use super::*;

    /// `net_balance = amount_due - amount_owed`, seen from the caller.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub user_id: i32,
        pub username: String,
        pub amount_owed: f64,
        pub amount_due: f64,
        pub net_balance: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceList {
        pub balances: Vec<BalanceView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DashboardResponse {
        pub total_owed: f64,
        pub total_due: f64,
        pub net_balance: f64,
        pub counterparties: Vec<BalanceView>,
    }
}

#[cfg(test)]
mod tests {
    use super::expense::ExpenseNew;

    #[test]
    fn explicit_amounts_are_keyed_by_user_id() {
        let payload: ExpenseNew = serde_json::from_str(
            r#"{"title":"Rent","amount":90.0,"amounts":{"1":60.0,"2":30.0}}"#,
        )
        .unwrap();
        let amounts = payload.amounts.unwrap();
        assert_eq!(amounts.get(&1), Some(&60.0));
        assert_eq!(amounts.get(&2), Some(&30.0));
        assert!(payload.split_with.is_none());
        assert!(payload.paid_by.is_none());
    }
}
