use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub, SubAssign};
use uuid::Uuid;

use crate::domain::transaction::Amount;

/// A user's wallet balance.
///
/// This is a wrapper around `rust_decimal::Decimal` to keep monetary
/// arithmetic out of raw floating point. The balance is signed; in-scope
/// flows only ever credit it.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Balance(pub Decimal);

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Balance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.value())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

/// A wallet user. Email, phone number and referral code are globally unique;
/// the backing store enforces that, not this type.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub country: String,
    pub balance: Balance,
    pub role: UserRole,
    pub is_email_verified: bool,
    pub is_phone_verified: bool,
    pub can_transact: bool,
    pub status: UserStatus,
    pub ref_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Credits the balance by a transaction amount.
    pub fn credit(&mut self, amount: Amount) {
        self.balance += amount.into();
    }

    /// Whether this user qualifies for dedicated-account provisioning.
    pub fn is_provisionable(&self) -> bool {
        self.status == UserStatus::Active && self.is_email_verified
    }

    /// First/last name pair used in provisioning requests.
    ///
    /// The full name is split on whitespace; only the first two tokens are
    /// kept, and a user without a last name has the first name duplicated
    /// into the last-name field. Both quirks are kept for provider
    /// compatibility.
    pub fn split_name(&self) -> (&str, &str) {
        let mut parts = self.full_name.split_whitespace();
        let first = parts.next().unwrap_or("");
        let last = parts.next().unwrap_or(first);
        (first, last)
    }
}
