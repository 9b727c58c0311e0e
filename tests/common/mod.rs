#![allow(dead_code)]

use chrono::Utc;
use kinta_core::domain::account::{BankPartner, DedicatedAccount};
use kinta_core::domain::ports::{IssuedBankAccount, ProviderAccountData, ProviderResponse};
use kinta_core::domain::transaction::{
    Amount, PaymentMethod, Transaction, TransactionKind, TransactionStatus,
};
use kinta_core::domain::user::{Balance, User, UserRole, UserStatus};
use kinta_core::infrastructure::scripted::ScriptedResponse;
use rust_decimal::Decimal;
use uuid::Uuid;

pub fn user(full_name: &str, email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        full_name: full_name.to_string(),
        email: email.to_string(),
        phone_number: format!("+234801{:07}", email.len()),
        country: "nigeria".to_string(),
        balance: Balance::ZERO,
        role: UserRole::User,
        is_email_verified: true,
        is_phone_verified: true,
        can_transact: true,
        status: UserStatus::Active,
        ref_code: None,
        created_at: Utc::now(),
    }
}

pub fn funding_tx(tx_ref: &str, amount: Decimal, user_id: Uuid) -> Transaction {
    Transaction {
        tx_ref: tx_ref.to_string(),
        amount: Amount::new(amount).expect("test amount must be positive"),
        note: None,
        status: TransactionStatus::Pending,
        payment_method: PaymentMethod::DedicatedAccount,
        kind: TransactionKind::Funding,
        user_id,
        account_id: "acct-1".to_string(),
        meta: serde_json::Map::new(),
        created_at: Utc::now(),
    }
}

pub fn dedicated_account(user_id: Uuid, partner: BankPartner) -> DedicatedAccount {
    DedicatedAccount {
        user_id,
        account_number: "0123456789".to_string(),
        account_name: "ADA OBI".to_string(),
        bank_name: partner.code().to_string(),
        bank_code: partner.code().to_string(),
        provider_ref: format!("prov-{}", partner.code()),
        has_dedicated_account: true,
        order_ref: user_id.to_string(),
        created_at: Utc::now(),
    }
}

pub fn partner_success(partner: BankPartner) -> ScriptedResponse {
    ScriptedResponse::Reply(ProviderResponse {
        status: true,
        message: "Virtual account generated".to_string(),
        data: Some(ProviderAccountData {
            reference: format!("prov-{}", partner.code()),
            account: vec![IssuedBankAccount {
                account_number: "0123456789".to_string(),
                account_name: "ADA OBI".to_string(),
                bank_id: partner.code().to_string(),
                bank_name: partner.code().to_string(),
            }],
        }),
    })
}

pub fn partner_decline(message: &str) -> ScriptedResponse {
    ScriptedResponse::Reply(ProviderResponse {
        status: false,
        message: message.to_string(),
        data: None,
    })
}
