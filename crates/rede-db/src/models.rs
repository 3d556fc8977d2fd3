//! Database row types. These map directly to SQLite rows and are kept
//! distinct from the rede-types API models so the store stays independent.

use chrono::{DateTime, Utc};
use rede_types::models::{Address, Config, Establishment, Post, User};

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigRow {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    /// 0 until the store assigns one.
    pub id: i64,
    pub name: String,
    pub nick: String,
    pub email: String,
    /// Password hash in PHC string format.
    pub password: String,
    pub inactive: bool,
    pub created_at: DateTime<Utc>,
}

/// Relationship record: who follows `user_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowersRow {
    pub user_id: i64,
    pub follower_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub author_nick: String,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EstablishmentRow {
    pub id: i64,
    pub cnpj: String,
    pub ie: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub sector: i64,
    pub opening_hours: String,
    pub opening_days: i64,
    pub cep: String,
    pub number: String,
    pub street: String,
    pub district: String,
    pub city: String,
    pub uf: String,
    pub country: String,
    pub complement: String,
    pub created_at: DateTime<Utc>,
}

// -- Filters (equality only, unset fields are ignored) --

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub nick: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub id: Option<i64>,
    pub author_id: Option<i64>,
    pub author_nick: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EstablishmentFilter {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub cnpj: Option<String>,
    pub ie: Option<String>,
}

// -- Row -> API model --

impl From<ConfigRow> for Config {
    fn from(row: ConfigRow) -> Self {
        Self {
            name: row.name,
            value: row.value,
        }
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            nick: row.nick,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            author_id: row.author_id,
            author_nick: row.author_nick,
            likes: row.likes,
            created_at: row.created_at,
        }
    }
}

impl From<EstablishmentRow> for Establishment {
    fn from(row: EstablishmentRow) -> Self {
        Self {
            id: row.id,
            cnpj: row.cnpj,
            ie: row.ie,
            name: row.name,
            email: row.email,
            phone: row.phone,
            sector: row.sector,
            opening_hours: row.opening_hours,
            opening_days: row.opening_days,
            address: Address {
                cep: row.cep,
                number: row.number,
                street: row.street,
                district: row.district,
                city: row.city,
                uf: row.uf,
                country: row.country,
                complement: row.complement,
            },
            created_at: row.created_at,
        }
    }
}
