use serde::{Deserialize, Serialize};

use crate::models::Address;

// -- Auth --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub id: i64,
    /// The full credential, `Bearer` prefix included.
    pub token: String,
}

// -- Users --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub nick: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub nick: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangePasswordRequest {
    pub current: String,
    pub new: String,
}

/// Equality filters accepted by `GET /usuario`.
#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    #[serde(rename = "ID")]
    pub id: Option<i64>,
    #[serde(rename = "Nome")]
    pub name: Option<String>,
    #[serde(rename = "Nick")]
    pub nick: Option<String>,
    #[serde(rename = "Email")]
    pub email: Option<String>,
}

// -- Posts --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostRequest {
    pub title: String,
    pub content: String,
}

// -- Config --

#[derive(Debug, Deserialize)]
pub struct ConfigForm {
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub valor: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfigQuery {
    pub nome: Option<String>,
}

// -- Establishments --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterEstablishmentRequest {
    pub cnpj: String,
    pub ie: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub sector: i64,
    #[serde(default)]
    pub opening_hours: String,
    #[serde(default)]
    pub opening_days: i64,
    pub address: Address,
}

#[derive(Debug, Default, Deserialize)]
pub struct EstablishmentQuery {
    #[serde(rename = "ID")]
    pub id: Option<i64>,
    #[serde(rename = "Nome")]
    pub name: Option<String>,
    #[serde(rename = "CNPJ")]
    pub cnpj: Option<String>,
    #[serde(rename = "IE")]
    pub ie: Option<String>,
}

// -- Generic --

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
