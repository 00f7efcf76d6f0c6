//! Domain DTOs for the driver API.
//!
//! # Design
//! These types mirror the backend's wire shapes: snake_case fields with
//! camelCase `createdAt`/`updatedAt` timestamps, integer money values in
//! cents, and a `{ "data": ... }` wrapper around most payloads. They are
//! defined independently from the mock-server crate; the integration tests
//! catch any schema drift between the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The `{ "data": ... }` wrapper most driver endpoints respond with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// Payload of a successful sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: String,
}

/// The authenticated driver's profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Driver {
    pub id: i64,
    pub name: String,
    pub cpf: String,
    pub credit: i64,
    pub daily: i64,
    pub number_cnh: Option<String>,
    pub valid_cnh: Option<bool>,
    pub percentage: Option<f64>,
    pub value_fix: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// One page of the notification feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPage {
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
    #[serde(rename = "currentPage")]
    pub current_page: i64,
    pub data: Vec<Notification>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FreightStatus {
    Draft,
    Pending,
    Approved,
    Denied,
    StartingTrip,
    Finished,
}

/// A document already attached to a freight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreightFile {
    pub uuid: String,
    pub name: String,
    pub mimetype: String,
    pub category: String,
}

/// One freight (trip) with its nested movements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Freight {
    pub id: i64,
    pub financial_statements_id: i64,
    pub start_freight_city: String,
    pub final_freight_city: String,
    pub location_of_the_truck: String,
    pub contractor: String,
    pub truck_current_km: f64,
    pub liter_of_fuel_per_km: f64,
    pub preview_tonne: f64,
    pub preview_value_diesel: i64,
    pub value_tonne: i64,
    pub status: FreightStatus,
    #[serde(default)]
    pub tons_loaded: Option<f64>,
    #[serde(default)]
    pub toll_value: Option<i64>,
    #[serde(default)]
    pub truck_km_completed_trip: Option<f64>,
    #[serde(default)]
    pub discharge: Option<String>,
    #[serde(default)]
    pub img_proof_cte: Option<FreightFile>,
    #[serde(default)]
    pub img_proof_ticket: Option<FreightFile>,
    #[serde(default)]
    pub img_proof_freight_letter: Option<FreightFile>,
    #[serde(default)]
    pub restock: Vec<Restock>,
    #[serde(rename = "travelExpense", default)]
    pub travel_expense: Vec<Travel>,
    #[serde(rename = "depositMoney", default)]
    pub deposit_money: Vec<Deposit>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Partial freight payload for quotation create/update. The same shape is
/// submitted on both paths; the final submission step flips `status` to
/// `Pending`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FreightQuotation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_freight_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_freight_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_of_the_truck: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contractor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truck_current_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liter_of_fuel_per_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_tonne: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_value_diesel: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_tonne: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FreightStatus>,
}

/// The driver's current open financial statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialStatement {
    pub id: i64,
    pub creator_user_id: i64,
    pub driver_id: i64,
    pub truck_id: i64,
    pub cart_id: i64,
    pub status: bool,
    #[serde(default)]
    pub start_km: Option<i64>,
    #[serde(default)]
    pub final_km: Option<i64>,
    pub start_date: String,
    #[serde(default)]
    pub final_date: Option<String>,
    pub driver_name: String,
    pub truck_models: String,
    pub truck_board: String,
    pub truck_avatar: String,
    pub cart_models: String,
    pub cart_board: String,
    #[serde(default)]
    pub invoicing_all: Option<bool>,
    #[serde(default)]
    pub medium_fuel_all: Option<bool>,
    pub total_value: i64,
    pub freight: Vec<Freight>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// A cash deposit recorded against a freight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deposit {
    pub id: i64,
    pub financial_statements_id: i64,
    pub freight_id: i64,
    pub type_transaction: String,
    pub local: String,
    pub type_bank: String,
    pub value: i64,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDeposit {
    pub freight_id: i64,
    pub financial_statements_id: i64,
    pub type_transaction: String,
    pub local: String,
    pub type_bank: String,
    pub value: i64,
}

/// A travel expense entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Travel {
    pub id: i64,
    pub financial_statements_id: i64,
    pub freight_id: i64,
    pub type_establishment: String,
    pub name_establishment: String,
    pub expense_description: String,
    pub value: i64,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTravel {
    pub freight_id: i64,
    pub financial_statements_id: i64,
    pub type_establishment: String,
    pub name_establishment: String,
    pub expense_description: String,
    pub value: i64,
}

/// A fuel restock entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restock {
    pub id: i64,
    pub financial_statements_id: i64,
    pub freight_id: i64,
    pub name_establishment: String,
    pub city: String,
    pub date: String,
    pub value_fuel: i64,
    pub liters_fuel: f64,
    pub total_nota_value: i64,
    pub total_value_fuel: i64,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRestock {
    pub freight_id: i64,
    pub financial_statements_id: i64,
    pub name_establishment: String,
    pub city: String,
    pub date: String,
    pub value_fuel: i64,
    pub liters_fuel: f64,
    pub total_nota_value: i64,
    pub total_value_fuel: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_deserializes_with_null_optionals() {
        let driver: Driver = serde_json::from_str(
            r#"{
                "id": 1,
                "name": "João",
                "cpf": "00000000000",
                "credit": 1000,
                "daily": 5000,
                "number_cnh": null,
                "valid_cnh": null,
                "percentage": null,
                "value_fix": 0
            }"#,
        )
        .unwrap();
        assert_eq!(driver.name, "João");
        assert!(driver.number_cnh.is_none());
    }

    #[test]
    fn freight_status_uses_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&FreightStatus::StartingTrip).unwrap(),
            r#""STARTING_TRIP""#
        );
        let status: FreightStatus = serde_json::from_str(r#""FINISHED""#).unwrap();
        assert_eq!(status, FreightStatus::Finished);
    }

    #[test]
    fn freight_defaults_missing_collections() {
        let freight: Freight = serde_json::from_value(serde_json::json!({
            "id": 1,
            "financial_statements_id": 2,
            "start_freight_city": "Cuiabá MT",
            "final_freight_city": "Rondonópolis MT",
            "location_of_the_truck": "Cuiabá MT",
            "contractor": "Agro Ltda",
            "truck_current_km": 120000.0,
            "liter_of_fuel_per_km": 2.1,
            "preview_tonne": 37.0,
            "preview_value_diesel": 590,
            "value_tonne": 14500,
            "status": "DRAFT",
            "createdAt": "2024-03-01T12:00:00Z",
            "updatedAt": "2024-03-01T12:00:00Z"
        }))
        .unwrap();
        assert!(freight.restock.is_empty());
        assert!(freight.img_proof_cte.is_none());
        assert_eq!(freight.status, FreightStatus::Draft);
    }

    #[test]
    fn quotation_skips_unset_fields() {
        let quotation = FreightQuotation {
            contractor: Some("Agro Ltda".to_string()),
            status: Some(FreightStatus::Pending),
            ..FreightQuotation::default()
        };
        let json = serde_json::to_value(&quotation).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "contractor": "Agro Ltda", "status": "PENDING" })
        );
    }

    #[test]
    fn timestamps_roundtrip_through_camel_case() {
        let deposit = serde_json::json!({
            "id": 9,
            "financial_statements_id": 1,
            "freight_id": 2,
            "type_transaction": "PIX",
            "local": "Cuiabá",
            "type_bank": "Sicredi",
            "value": 120000,
            "createdAt": "2024-03-02T09:30:00Z",
            "updatedAt": "2024-03-02T09:30:00Z"
        });
        let parsed: Deposit = serde_json::from_value(deposit.clone()).unwrap();
        assert_eq!(serde_json::to_value(&parsed).unwrap(), deposit);
    }
}
