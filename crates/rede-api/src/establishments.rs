use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use tracing::info;

use rede_db::Database;
use rede_db::models::{EstablishmentFilter, EstablishmentRow};
use rede_types::api::{EstablishmentQuery, RegisterEstablishmentRequest};
use rede_types::errors::ErrorCode;
use rede_types::models::Establishment;

use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::{is_valid_cnpj, is_valid_email, is_valid_phone, normalize_cnpj, normalize_phone};

fn required(field: &str, value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::bad_request_msg(
            ErrorCode::Generic,
            format!("{} is required", field),
        ));
    }
    Ok(value.to_string())
}

/// Validates and stores a new establishment. The CNPJ is stored as digits
/// and must be unique.
pub fn register_establishment(
    db: &Database,
    req: RegisterEstablishmentRequest,
    now: DateTime<Utc>,
) -> Result<EstablishmentRow, ApiError> {
    let cnpj = normalize_cnpj(&req.cnpj);
    if !is_valid_cnpj(&cnpj) {
        return Err(ApiError::bad_request(ErrorCode::InvalidCnpj));
    }
    let email = req.email.trim().to_string();
    if !is_valid_email(&email) {
        return Err(ApiError::bad_request(ErrorCode::InvalidEmail));
    }
    let phone = normalize_phone(&req.phone);
    if !is_valid_phone(&phone) {
        return Err(ApiError::bad_request(ErrorCode::InvalidPhone));
    }

    let address = req.address;
    let mut row = EstablishmentRow {
        id: 0,
        name: required("name", &req.name)?,
        ie: required("ie", &req.ie)?,
        cep: required("cep", &address.cep)?,
        number: required("number", &address.number)?,
        street: required("street", &address.street)?,
        district: required("district", &address.district)?,
        city: required("city", &address.city)?,
        uf: required("uf", &address.uf)?,
        country: required("country", &address.country)?,
        complement: address.complement.trim().to_string(),
        cnpj,
        email,
        phone,
        sector: req.sector,
        opening_hours: req.opening_hours.trim().to_string(),
        opening_days: req.opening_days,
        created_at: now,
    };

    let existing = db.filter_establishments(&EstablishmentFilter {
        cnpj: Some(row.cnpj.clone()),
        ..Default::default()
    })?;
    if !existing.is_empty() {
        return Err(ApiError::bad_request(ErrorCode::CnpjTaken));
    }

    db.put_establishment(&mut row)?;
    Ok(row)
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterEstablishmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = register_establishment(&state.db, req, state.sessions.now())?;
    info!(establishment_id = row.id, "Establishment registered");
    Ok((StatusCode::CREATED, Json(Establishment::from(row))))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<EstablishmentQuery>,
) -> Result<Json<Vec<Establishment>>, ApiError> {
    let ids = state.db.filter_establishments(&EstablishmentFilter {
        id: query.id,
        name: query.name,
        cnpj: query.cnpj.map(|c| normalize_cnpj(&c)),
        ie: query.ie,
    })?;
    let rows = state.db.get_establishments(&ids)?;
    Ok(Json(rows.into_iter().map(Establishment::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::seeded_db;
    use rede_types::models::Address;

    fn request() -> RegisterEstablishmentRequest {
        RegisterEstablishmentRequest {
            cnpj: "11.222.333/0001-81".into(),
            ie: "123456".into(),
            name: "Bar do Zé".into(),
            email: "contato@bardoze.com.br".into(),
            phone: "(11) 3265-4321".into(),
            sector: 1,
            opening_hours: "18h-02h".into(),
            opening_days: 6,
            address: Address {
                cep: "01310-100".into(),
                number: "1000".into(),
                street: "Av. Paulista".into(),
                district: "Bela Vista".into(),
                city: "São Paulo".into(),
                uf: "SP".into(),
                country: "Brasil".into(),
                complement: String::new(),
            },
        }
    }

    #[test]
    fn registers_with_normalized_fields() {
        let db = seeded_db();
        let row = register_establishment(&db, request(), Utc::now()).unwrap();
        assert_eq!(row.cnpj, "11222333000181");
        assert_eq!(row.phone, "1132654321");
        assert_eq!(db.get_establishment(row.id).unwrap().unwrap().name, "Bar do Zé");
    }

    #[test]
    fn cnpj_must_be_valid_and_unique() {
        let db = seeded_db();
        let mut bad = request();
        bad.cnpj = "11.222.333/0001-82".into();
        let err = register_establishment(&db, bad, Utc::now()).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { code: ErrorCode::InvalidCnpj, .. }));

        register_establishment(&db, request(), Utc::now()).unwrap();
        let err = register_establishment(&db, request(), Utc::now()).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { code: ErrorCode::CnpjTaken, .. }));
    }

    #[test]
    fn phone_and_address_are_checked() {
        let db = seeded_db();
        let mut bad = request();
        bad.phone = "3265-4321".into();
        let err = register_establishment(&db, bad, Utc::now()).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { code: ErrorCode::InvalidPhone, .. }));

        let mut bad = request();
        bad.address.city = " ".into();
        let err = register_establishment(&db, bad, Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "city is required");
    }
}
