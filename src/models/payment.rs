use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::normalize::{Fields, Keys, Normalize};

mod keys {
    use super::Keys;

    pub const ID: Keys = &["id", "Id", "transactionId", "TransactionId"];
    pub const HOST_ID: Keys = &["hostId", "HostId"];
    pub const BALANCE: Keys = &["balance", "Balance", "availableBalance", "AvailableBalance"];
    pub const PENDING_AMOUNT: Keys = &["pendingAmount", "PendingAmount"];
    pub const TOTAL_EARNED: Keys = &["totalEarned", "TotalEarned", "totalEarnings", "TotalEarnings"];
    pub const CURRENCY: Keys = &["currency", "Currency"];
    pub const TRANSACTIONS: Keys = &["transactions", "Transactions", "payments", "Payments"];

    pub const AMOUNT: Keys = &["amount", "Amount"];
    pub const STATUS: Keys = &["status", "Status"];
    pub const CREATED_AT: Keys = &["createdAt", "CreatedAt", "paymentDate", "PaymentDate"];
    pub const DESCRIPTION: Keys = &["description", "Description", "note", "Note"];

    pub const REQUEST_ID: Keys = &["id", "Id", "requestId", "RequestId", "upgradeRequestId", "UpgradeRequestId"];
    pub const USER_ID: Keys = &["userId", "UserId"];
    pub const TARGET_ROLE: Keys = &["targetRole", "TargetRole", "requestedRole", "RequestedRole", "roleId", "RoleId"];
    pub const PAYMENT_URL: Keys = &["paymentUrl", "PaymentUrl", "checkoutUrl", "CheckoutUrl"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostPayment {
    pub host_id: String,
    pub balance: Decimal,
    pub pending_amount: Decimal,
    pub total_earned: Decimal,
    pub currency: String,
    pub transactions: Vec<PaymentTransaction>,
}

impl Normalize for HostPayment {
    fn normalize(value: &Value) -> Self {
        let f = Fields::new(value);
        Self {
            host_id: f.string(keys::HOST_ID),
            balance: f.decimal(keys::BALANCE),
            pending_amount: f.decimal(keys::PENDING_AMOUNT),
            total_earned: f.decimal(keys::TOTAL_EARNED),
            currency: f.string(keys::CURRENCY),
            transactions: f.list(keys::TRANSACTIONS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTransaction {
    pub id: String,
    pub amount: Decimal,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub description: String,
}

impl Normalize for PaymentTransaction {
    fn normalize(value: &Value) -> Self {
        let f = Fields::new(value);
        Self {
            id: f.string(keys::ID),
            amount: f.decimal(keys::AMOUNT),
            status: f.string(keys::STATUS),
            created_at: f.datetime(keys::CREATED_AT),
            description: f.string(keys::DESCRIPTION),
        }
    }
}

/// A request to move the current user to a more privileged role,
/// optionally paid for through `payment_url`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequest {
    pub id: String,
    pub user_id: String,
    pub target_role: String,
    pub status: String,
    pub amount: Decimal,
    pub payment_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl UpgradeRequest {
    pub fn is_approved(&self) -> bool {
        matches!(
            self.status.to_ascii_lowercase().as_str(),
            "approved" | "completed" | "paid"
        )
    }
}

impl Normalize for UpgradeRequest {
    fn normalize(value: &Value) -> Self {
        let f = Fields::new(value);
        Self {
            id: f.string(keys::REQUEST_ID),
            user_id: f.string(keys::USER_ID),
            target_role: f.string(keys::TARGET_ROLE),
            status: f.string(keys::STATUS),
            amount: f.decimal(keys::AMOUNT),
            payment_url: f.opt_string(keys::PAYMENT_URL).filter(|s| !s.is_empty()),
            created_at: f.datetime(keys::CREATED_AT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_host_payment_with_transactions() {
        let p = HostPayment::normalize(&json!({
            "HostId": 4,
            "Balance": 1500000,
            "pendingAmount": "250000.5",
            "Currency": "VND",
            "Transactions": [
                {"Id": 1, "Amount": 500000, "Status": "Completed", "PaymentDate": "2024-04-02T09:30:00"},
                {"id": 2, "amount": 1000000, "status": "Pending"}
            ]
        }));
        assert_eq!(p.host_id, "4");
        assert_eq!(p.balance, Decimal::from(1_500_000));
        assert_eq!(p.pending_amount.to_string(), "250000.5");
        assert_eq!(p.total_earned, Decimal::ZERO);
        assert_eq!(p.transactions.len(), 2);
        assert!(p.transactions[0].created_at.is_some());
        assert!(p.transactions[1].created_at.is_none());
    }

    #[test]
    fn test_upgrade_request_status() {
        let r = UpgradeRequest::normalize(&json!({"RequestId": "r-1", "Status": "Approved", "PaymentUrl": ""}));
        assert!(r.is_approved());
        assert!(r.payment_url.is_none());

        let r = UpgradeRequest::normalize(&json!({"id": "r-2", "status": "pending"}));
        assert!(!r.is_approved());
    }
}
