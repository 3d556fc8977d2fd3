use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public view of an identity. The password hash never leaves the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub nick: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub author_nick: String,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub cep: String,
    pub number: String,
    pub street: String,
    pub district: String,
    pub city: String,
    pub uf: String,
    pub country: String,
    #[serde(default)]
    pub complement: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Establishment {
    pub id: i64,
    pub cnpj: String,
    /// State registration number.
    pub ie: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// 1 bar, 2 restaurant, 3 snack bar, 4 other.
    pub sector: i64,
    pub opening_hours: String,
    /// 1 Sunday through 7 Saturday.
    pub opening_days: i64,
    pub address: Address,
    pub created_at: DateTime<Utc>,
}
