//! Typed operations over the driver API.
//!
//! Thin wrappers around the dispatcher: each builds the route and
//! parameters, checks the status the backend promises, and decodes the
//! `{ "data": ... }` wrapper into a concrete type. Route paths reproduce
//! the backend exactly, including its mixed `/v1` prefixes.

use serde_json::Value;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::{Envelope, Method};
use crate::request::Params;
use crate::types::{
    CreateDeposit, CreateRestock, CreateTravel, DataEnvelope, Deposit, Driver,
    FinancialStatement, Freight, FreightQuotation, NotificationPage, Restock, SessionToken,
    Travel,
};
use crate::upload::FileAsset;

impl ApiClient {
    /// Exchange credentials for a session token. The token is persisted in
    /// the token store and returned.
    pub async fn sign_in(&self, cpf: &str, password: &str) -> Result<String, ApiError> {
        let params = Params::new().field("cpf", cpf).field("password", password);
        let envelope = self.post("/v1/driver/signin", params).await?;
        expect_status(&envelope, &[200])?;

        let body: DataEnvelope<SessionToken> = envelope.decode()?;
        self.tokens.save(&body.data.token)?;
        tracing::debug!("sign-in succeeded, token stored");
        Ok(body.data.token)
    }

    /// Drop the stored session token. Purely local; the backend keeps no
    /// revocable session state.
    pub fn sign_out(&self) -> Result<(), ApiError> {
        self.tokens.clear()?;
        tracing::debug!("signed out, token cleared");
        Ok(())
    }

    pub async fn profile(&self) -> Result<Driver, ApiError> {
        let envelope = self.get("/v1/driver/profile", Params::new()).await?;
        expect_status(&envelope, &[200])?;
        Ok(envelope.decode::<DataEnvelope<Driver>>()?.data)
    }

    /// Ask for a password-reset code to be sent to the given phone number.
    pub async fn request_password_code(&self, phone: &str) -> Result<(), ApiError> {
        let params = Params::new().field("phone", phone);
        let envelope = self.post("/driver/code-request", params).await?;
        expect_status(&envelope, &[200])
    }

    pub async fn validate_password_code(&self, code: &str) -> Result<(), ApiError> {
        let params = Params::new().field("code", code);
        let envelope = self.post("/driver/code-validation", params).await?;
        expect_status(&envelope, &[200])
    }

    pub async fn notifications(&self, page: u32) -> Result<NotificationPage, ApiError> {
        let params = Params::new().field("page", page);
        let envelope = self.get("/v1/driver/notifications", params).await?;
        expect_status(&envelope, &[200])?;
        envelope.decode()
    }

    pub async fn mark_all_notifications_read(&self) -> Result<(), ApiError> {
        let envelope = self
            .post("/v1/driver/notifications/allread", Params::new())
            .await?;
        expect_status(&envelope, &[200])
    }

    pub async fn mark_notification_read(&self, id: i64) -> Result<(), ApiError> {
        let params = Params::new().path("id", id);
        let envelope = self.put("/v1/driver/notifications/:id", params).await?;
        expect_status(&envelope, &[200])
    }

    /// Register the push-notification player id for this installation.
    pub async fn register_push_player(&self, player_id: &str) -> Result<(), ApiError> {
        let params = Params::new().field("player_id", player_id);
        let envelope = self
            .post("/v1/driver/activate/push-receive-notifications", params)
            .await?;
        expect_status(&envelope, &[200])
    }

    /// The driver's open financial statement, with its freights nested.
    pub async fn current_statement(&self) -> Result<FinancialStatement, ApiError> {
        let envelope = self
            .get("/v1/driver/financial/current", Params::new())
            .await?;
        expect_status(&envelope, &[200])?;
        Ok(envelope.decode::<DataEnvelope<FinancialStatement>>()?.data)
    }

    pub async fn freight(&self, id: i64) -> Result<Freight, ApiError> {
        let params = Params::new().path("id", id);
        let envelope = self.get("/driver/freight/:id", params).await?;
        expect_status(&envelope, &[200])?;
        Ok(envelope.decode::<DataEnvelope<Freight>>()?.data)
    }

    /// Create a freight quotation. A 422 with a field-error map becomes
    /// [`ApiError::Validation`].
    pub async fn create_freight(&self, quotation: &FreightQuotation) -> Result<Freight, ApiError> {
        let envelope = self
            .post("/v1/driver/freight", Params::body(quotation)?)
            .await?;
        freight_result(envelope)
    }

    pub async fn update_freight(
        &self,
        id: i64,
        quotation: &FreightQuotation,
    ) -> Result<Freight, ApiError> {
        let mut params = Params::body(quotation)?;
        params.path.insert("id".to_string(), id.to_string());
        let envelope = self.patch("/v1/driver/freight/:id", params).await?;
        freight_result(envelope)
    }

    /// Close a trip, recording the truck's final odometer reading.
    pub async fn finish_trip(&self, id: i64, truck_km_completed_trip: f64) -> Result<(), ApiError> {
        let params = Params::new()
            .path("id", id)
            .field("truck_km_completed_trip", truck_km_completed_trip);
        let envelope = self
            .put("/v1/driver/freight/finished-trip/:id", params)
            .await?;
        expect_status(&envelope, &[200])
    }

    pub async fn deposits(&self, financial_statement_id: i64) -> Result<Vec<Deposit>, ApiError> {
        let params = Params::new().field("financialStatementId", financial_statement_id);
        let envelope = self.get("/driver/deposits", params).await?;
        expect_status(&envelope, &[200])?;
        Ok(envelope.decode::<DataEnvelope<Vec<Deposit>>>()?.data)
    }

    pub async fn create_deposit(&self, deposit: &CreateDeposit) -> Result<Deposit, ApiError> {
        let envelope = self.post("/driver/deposit", Params::body(deposit)?).await?;
        expect_status(&envelope, &[200, 201])?;
        Ok(envelope.decode::<DataEnvelope<Deposit>>()?.data)
    }

    pub async fn travels(&self, freight_id: i64) -> Result<Vec<Travel>, ApiError> {
        let params = Params::new().field("freight_id", freight_id);
        let envelope = self.get("/driver/travels", params).await?;
        expect_status(&envelope, &[200])?;
        Ok(envelope.decode::<DataEnvelope<Vec<Travel>>>()?.data)
    }

    pub async fn create_travel(&self, travel: &CreateTravel) -> Result<Travel, ApiError> {
        let envelope = self.post("/driver/travel", Params::body(travel)?).await?;
        expect_status(&envelope, &[200, 201])?;
        Ok(envelope.decode::<DataEnvelope<Travel>>()?.data)
    }

    pub async fn restocks(&self, freight_id: i64) -> Result<Vec<Restock>, ApiError> {
        let params = Params::new().field("freight_id", freight_id);
        let envelope = self.get("/driver/restocks", params).await?;
        expect_status(&envelope, &[200])?;
        Ok(envelope.decode::<DataEnvelope<Vec<Restock>>>()?.data)
    }

    pub async fn create_restock(&self, restock: &CreateRestock) -> Result<Restock, ApiError> {
        let envelope = self.post("/driver/restock", Params::body(restock)?).await?;
        expect_status(&envelope, &[200, 201])?;
        Ok(envelope.decode::<DataEnvelope<Restock>>()?.data)
    }

    /// Attach a proof document to a freight.
    pub async fn upload_freight_documents(
        &self,
        freight_id: i64,
        file: &FileAsset,
        type_img: Option<&str>,
    ) -> Result<Value, ApiError> {
        let path = format!("/driver/freight/upload-documents/{freight_id}");
        self.upload_documents(&path, file, type_img).await
    }

    pub async fn upload_travel_documents(
        &self,
        file: &FileAsset,
        type_img: Option<&str>,
    ) -> Result<Value, ApiError> {
        self.upload_documents("/v1/driver/travel/upload-documents", file, type_img)
            .await
    }

    pub async fn upload_deposit_documents(
        &self,
        file: &FileAsset,
        type_img: Option<&str>,
    ) -> Result<Value, ApiError> {
        self.upload_documents("/v1/driver/deposit/upload-documents", file, type_img)
            .await
    }

    async fn upload_documents(
        &self,
        path: &str,
        file: &FileAsset,
        type_img: Option<&str>,
    ) -> Result<Value, ApiError> {
        let mut extra = std::collections::BTreeMap::new();
        extra.insert("category".to_string(), "documents".to_string());
        if let Some(type_img) = type_img {
            extra.insert("typeImg".to_string(), type_img.to_string());
        }

        let envelope = self
            .upload(path, std::slice::from_ref(file), "file", Method::Patch, &extra)
            .await?;
        expect_status(&envelope, &[200])?;
        Ok(envelope.data)
    }
}

/// Map a status the operation does not accept to `UnexpectedStatus`.
fn expect_status(envelope: &Envelope, accepted: &[u16]) -> Result<(), ApiError> {
    if accepted.contains(&envelope.status) {
        return Ok(());
    }
    Err(ApiError::UnexpectedStatus {
        status: envelope.status,
        url: envelope.url.clone(),
        body: envelope.data.to_string(),
    })
}

/// Shared tail for quotation create/update: surface 422 field errors,
/// otherwise decode the freight.
fn freight_result(envelope: Envelope) -> Result<Freight, ApiError> {
    if envelope.status == 422 {
        if let Some(errors) = envelope.data.get("errors").and_then(Value::as_object) {
            let errors = errors
                .iter()
                .filter_map(|(field, message)| {
                    message.as_str().map(|m| (field.clone(), m.to_string()))
                })
                .collect();
            return Err(ApiError::Validation { errors });
        }
    }
    expect_status(&envelope, &[200, 201])?;
    Ok(envelope.decode::<DataEnvelope<Freight>>()?.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(status: u16, data: Value) -> Envelope {
        Envelope {
            data,
            status,
            url: "https://api.example.com/x".to_string(),
        }
    }

    #[test]
    fn expect_status_accepts_listed_codes() {
        assert!(expect_status(&envelope(201, Value::Null), &[200, 201]).is_ok());
        let err = expect_status(&envelope(500, Value::Null), &[200]).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedStatus { status: 500, .. }));
    }

    #[test]
    fn freight_422_surfaces_field_errors() {
        let data = serde_json::json!({
            "errors": { "start_freight_city": "obrigatório" }
        });
        let err = freight_result(envelope(422, data)).unwrap_err();
        match err {
            ApiError::Validation { errors } => {
                assert_eq!(errors.get("start_freight_city").unwrap(), "obrigatório");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn freight_422_without_error_map_is_unexpected_status() {
        let err = freight_result(envelope(422, Value::Null)).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedStatus { status: 422, .. }));
    }
}
