use serde::{Deserialize, Serialize};

/// Business error codes. The integer values are a compatibility surface for
/// existing clients and must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", from = "u16")]
pub enum ErrorCode {
    Generic,
    InvalidUser,
    InvalidEmail,
    InvalidCnpj,
    InvalidPhone,
    InvalidPassword,
    InsertUser,
    FetchUser,
    NotFound,
    WrongPassword,
    EmailTaken,
    PasswordReset,
    SigningKeyUnavailable,
    SignFailure,
    CnpjTaken,
    NickTaken,
    Unknown,
}

impl ErrorCode {
    pub const fn as_u16(self) -> u16 {
        match self {
            Self::Generic => 0,
            Self::InvalidUser => 401,
            Self::InvalidEmail => 402,
            Self::InvalidCnpj => 404,
            Self::InvalidPhone => 405,
            Self::InvalidPassword => 406,
            Self::InsertUser => 407,
            Self::FetchUser => 408,
            Self::NotFound => 409,
            Self::WrongPassword => 410,
            Self::EmailTaken => 411,
            Self::PasswordReset => 415,
            Self::SigningKeyUnavailable => 416,
            Self::SignFailure => 417,
            Self::CnpjTaken => 419,
            Self::NickTaken => 420,
            Self::Unknown => 999,
        }
    }

    /// Default human-readable message for the code.
    pub const fn message(self) -> &'static str {
        match self {
            Self::Generic => "request failed",
            Self::InvalidUser => "invalid user",
            Self::InvalidEmail => "invalid email",
            Self::InvalidCnpj => "invalid CNPJ",
            Self::InvalidPhone => "invalid phone number",
            Self::InvalidPassword => "invalid password",
            Self::InsertUser => "failed to save user",
            Self::FetchUser => "failed to fetch user",
            Self::NotFound => "not found",
            Self::WrongPassword => "wrong password",
            Self::EmailTaken => "email already registered",
            Self::PasswordReset => "failed to reset password",
            Self::SigningKeyUnavailable => "failed to load the session signing key",
            Self::SignFailure => "failed to sign the session token",
            Self::CnpjTaken => "CNPJ already registered",
            Self::NickTaken => "nick already registered",
            Self::Unknown => "unknown",
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.as_u16()
    }
}

impl From<u16> for ErrorCode {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Generic,
            401 => Self::InvalidUser,
            402 => Self::InvalidEmail,
            404 => Self::InvalidCnpj,
            405 => Self::InvalidPhone,
            406 => Self::InvalidPassword,
            407 => Self::InsertUser,
            408 => Self::FetchUser,
            409 => Self::NotFound,
            410 => Self::WrongPassword,
            411 => Self::EmailTaken,
            415 => Self::PasswordReset,
            416 => Self::SigningKeyUnavailable,
            417 => Self::SignFailure,
            419 => Self::CnpjTaken,
            420 => Self::NickTaken,
            _ => Self::Unknown,
        }
    }
}

/// JSON error envelope: `{"error": "...", "code": 0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: ErrorCode,
}
