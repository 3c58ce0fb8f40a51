// SPDX-License-Identifier: MIT

//! Webhook route for Kiwify purchase events.
//!
//! A purchase either enrolls the buyer directly (profile exists) or lands
//! in `pending_enrollments` to be granted when they sign up. Payloads are
//! parsed leniently because the provider has shipped more than one shape.

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::HeaderMap,
    routing::post,
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::enrollment::{NewEnrollment, NewPendingEnrollment, PaymentStatus};
use crate::AppState;

/// Webhook routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/webhooks/kiwify", post(handle_purchase))
}

#[derive(Debug, Deserialize)]
struct MappingRow {
    course_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct ProfileId {
    id: Uuid,
}

/// Buyer email, wherever this payload variant put it.
fn buyer_email(payload: &serde_json::Value) -> Option<String> {
    payload
        .pointer("/buyer/email")
        .or_else(|| payload.pointer("/customer/email"))
        .or_else(|| payload.get("email"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

/// Product id as a string; some payloads carry it as a bare number.
fn product_id(payload: &serde_json::Value) -> Option<String> {
    let raw = payload
        .pointer("/product/id")
        .or_else(|| payload.get("product_id"))?;
    match raw {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Handle a purchase notification (POST).
async fn handle_purchase(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>> {
    // Secret check only applies when one is configured.
    if let Some(expected) = state.config.webhook_secret.as_deref() {
        let presented = headers
            .get("x-webhook-secret")
            .and_then(|v| v.to_str().ok());
        if presented != Some(expected) {
            tracing::warn!("Webhook rejected: bad or missing secret");
            return Err(AppError::Auth("Invalid webhook secret".to_string()));
        }
    }

    let (email, product) = match (buyer_email(&payload), product_id(&payload)) {
        (Some(email), Some(product)) => (email, product),
        _ => {
            tracing::warn!(payload = %payload, "Webhook payload missing buyer or product");
            return Err(AppError::BadRequest(
                "Missing email or product_id".to_string(),
            ));
        }
    };
    // The auth service stores emails lowercased; providers do not.
    let email = email.trim().to_lowercase();

    let mapping: Option<MappingRow> = state
        .db
        .from("product_mappings")
        .select("course_id")
        .eq("provider", "kiwify")
        .eq("product_id", &product)
        .fetch_optional()
        .await?;
    let Some(mapping) = mapping else {
        tracing::warn!(product_id = %product, "Purchase for unmapped product");
        return Err(AppError::NotFound("No mapping for product".to_string()));
    };

    let profile: Option<ProfileId> = state
        .db
        .from("profiles")
        .select("id")
        .eq("email", &email)
        .fetch_optional()
        .await?;

    let outcome = match profile {
        Some(profile) => {
            state
                .db
                .from("enrollments")
                .insert_only(&NewEnrollment::active(
                    profile.id,
                    mapping.course_id,
                    PaymentStatus::Paid,
                ))
                .await?;
            tracing::info!(
                user_id = %profile.id,
                course_id = %mapping.course_id,
                product_id = %product,
                "Purchase enrolled"
            );
            "enrolled"
        }
        None => {
            state
                .db
                .from("pending_enrollments")
                .insert_only(&NewPendingEnrollment {
                    email: email.clone(),
                    course_id: mapping.course_id,
                })
                .await?;
            tracing::info!(
                course_id = %mapping.course_id,
                product_id = %product,
                "Purchase pending until signup"
            );
            "pending"
        }
    };

    Ok(Json(serde_json::json!({ "ok": true, "outcome": outcome })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_extraction_tries_each_payload_shape() {
        let buyer = serde_json::json!({ "buyer": { "email": "a@b.com" } });
        let customer = serde_json::json!({ "customer": { "email": "c@d.com" } });
        let flat = serde_json::json!({ "email": "e@f.com" });
        let none = serde_json::json!({ "buyer": { "name": "no email" } });

        assert_eq!(buyer_email(&buyer).as_deref(), Some("a@b.com"));
        assert_eq!(buyer_email(&customer).as_deref(), Some("c@d.com"));
        assert_eq!(buyer_email(&flat).as_deref(), Some("e@f.com"));
        assert_eq!(buyer_email(&none), None);
    }

    #[test]
    fn buyer_email_wins_over_flat_email() {
        let both = serde_json::json!({
            "buyer": { "email": "buyer@x.com" },
            "email": "flat@x.com"
        });
        assert_eq!(buyer_email(&both).as_deref(), Some("buyer@x.com"));
    }

    #[test]
    fn product_id_accepts_strings_and_numbers() {
        let nested = serde_json::json!({ "product": { "id": "prod_123" } });
        let numeric = serde_json::json!({ "product": { "id": 98765 } });
        let flat = serde_json::json!({ "product_id": 4242 });
        let missing = serde_json::json!({ "product": { "name": "no id" } });

        assert_eq!(product_id(&nested).as_deref(), Some("prod_123"));
        assert_eq!(product_id(&numeric).as_deref(), Some("98765"));
        assert_eq!(product_id(&flat).as_deref(), Some("4242"));
        assert_eq!(product_id(&missing), None);
    }

    #[test]
    fn product_id_rejects_structured_values() {
        let object = serde_json::json!({ "product": { "id": { "nested": true } } });
        assert_eq!(product_id(&object), None);
    }
}
