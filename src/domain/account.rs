use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A banking rail the aggregator can issue a dedicated account against.
///
/// The variants serialize to the aggregator's partner codes verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BankPartner {
    #[serde(rename = "PALMPAY")]
    Palmpay,
    #[serde(rename = "9PSB")]
    NinePsb,
    #[serde(rename = "BANKLY")]
    Bankly,
    #[serde(rename = "PROVIDUS")]
    Providus,
    #[serde(rename = "SAFEHAVEN")]
    Safehaven,
}

impl BankPartner {
    /// Fixed fallback order tried by the provisioner. Order matters: the
    /// first partner to answer with a logical success wins.
    pub const PRIORITY: [BankPartner; 5] = [
        BankPartner::Palmpay,
        BankPartner::NinePsb,
        BankPartner::Bankly,
        BankPartner::Providus,
        BankPartner::Safehaven,
    ];

    /// The partner whose accounts block re-provisioning.
    pub const PRIMARY: BankPartner = BankPartner::Palmpay;

    pub fn code(&self) -> &'static str {
        match self {
            BankPartner::Palmpay => "PALMPAY",
            BankPartner::NinePsb => "9PSB",
            BankPartner::Bankly => "BANKLY",
            BankPartner::Providus => "PROVIDUS",
            BankPartner::Safehaven => "SAFEHAVEN",
        }
    }
}

impl std::fmt::Display for BankPartner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A partner-issued virtual account bound to exactly one user.
///
/// Created once by the provisioner on first success and immutable afterwards.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct DedicatedAccount {
    pub user_id: Uuid,
    pub account_number: String,
    pub account_name: String,
    pub bank_name: String,
    pub bank_code: String,
    /// Partner-assigned reference returned by the aggregator.
    pub provider_ref: String,
    pub has_dedicated_account: bool,
    pub order_ref: String,
    pub created_at: DateTime<Utc>,
}

impl DedicatedAccount {
    pub fn is_primary_partner(&self) -> bool {
        self.bank_code == BankPartner::PRIMARY.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partner_codes_round_trip() {
        for partner in BankPartner::PRIORITY {
            let json = serde_json::to_string(&partner).unwrap();
            assert_eq!(json, format!("\"{}\"", partner.code()));
            let back: BankPartner = serde_json::from_str(&json).unwrap();
            assert_eq!(back, partner);
        }
    }

    #[test]
    fn test_priority_order_is_fixed() {
        let codes: Vec<&str> = BankPartner::PRIORITY.iter().map(|p| p.code()).collect();
        assert_eq!(
            codes,
            vec!["PALMPAY", "9PSB", "BANKLY", "PROVIDUS", "SAFEHAVEN"]
        );
    }

    #[test]
    fn test_primary_partner_detection() {
        let account = DedicatedAccount {
            user_id: Uuid::new_v4(),
            account_number: "1234567890".to_string(),
            account_name: "ADA OBI".to_string(),
            bank_name: "PALMPAY".to_string(),
            bank_code: "PALMPAY".to_string(),
            provider_ref: "ref-1".to_string(),
            has_dedicated_account: true,
            order_ref: "order-1".to_string(),
            created_at: Utc::now(),
        };
        assert!(account.is_primary_partner());

        let other = DedicatedAccount {
            bank_code: "9PSB".to_string(),
            ..account
        };
        assert!(!other.is_primary_partner());
    }
}
