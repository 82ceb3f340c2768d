use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};

use stockroom_transactions::{TransactionHeader, TransactionKind, TransactionLine};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

/// Create/update body: header fields of the kind at top level, plus `lines`.
#[derive(Debug, Deserialize)]
pub struct TransactionPayload {
    #[serde(default, alias = "items")]
    pub lines: Vec<TransactionLine>,
    #[serde(flatten)]
    pub header: Map<String, Value>,
}

impl TransactionPayload {
    /// Split into a header of `kind` (taken from the path) and the line set.
    pub fn into_parts(
        self,
        kind: TransactionKind,
    ) -> Result<(TransactionHeader, Vec<TransactionLine>), axum::response::Response> {
        let mut fields = self.header;
        fields.insert("kind".to_string(), Value::String(kind.as_str().to_string()));

        let header = serde_json::from_value(Value::Object(fields)).map_err(|e| {
            errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
        })?;
        Ok((header, self.lines))
    }
}

/// A missing `rejectedItemIds` means "reject nothing"; a present one must be an
/// array of ids.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    #[serde(default, alias = "items")]
    pub rejected_item_ids: Vec<String>,
    #[serde(default, alias = "signatureImage")]
    pub signature: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementQuery {
    pub item_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}
