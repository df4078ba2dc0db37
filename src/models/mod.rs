pub mod banner;
pub mod booking;
pub mod payment;
pub mod user;

pub use banner::*;
pub use booking::*;
pub use payment::*;
pub use user::*;

use mongodb::bson::{oid::ObjectId, Bson, Document};
use mongodb::results::{DeleteResult, InsertOneResult, UpdateResult};
use serde::Serialize;
use serde_json::Value;

use crate::utils::AppError;

/// Parses a path identifier into an ObjectId
pub fn parse_object_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw.trim())
        .map_err(|_| AppError::InvalidRequest(format!("'{}' is not a valid id", raw)))
}

/// Converts a JSON request body into a BSON document. Only objects are accepted.
pub fn json_to_document(value: Value) -> Result<Document, AppError> {
    match value {
        Value::Object(_) => Ok(mongodb::bson::to_document(&value)?),
        other => Err(AppError::InvalidRequest(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Renders a stored document for API clients.
///
/// ObjectIds become hex strings and dates become RFC 3339 strings, so the
/// frontend sees `"_id": "65f..."` instead of `{"$oid": ...}`. Everything else
/// follows relaxed extended JSON.
pub fn document_to_json(doc: Document) -> Value {
    bson_to_json(Bson::Document(doc))
}

pub fn documents_to_json(docs: Vec<Document>) -> Value {
    Value::Array(docs.into_iter().map(document_to_json).collect())
}

fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(id) => Value::String(id.to_hex()),
        Bson::DateTime(dt) => match dt.try_to_rfc3339_string() {
            Ok(s) => Value::String(s),
            Err(_) => Bson::DateTime(dt).into_relaxed_extjson(),
        },
        Bson::Document(doc) => Value::Object(
            doc.into_iter()
                .map(|(key, value)| (key, bson_to_json(value)))
                .collect(),
        ),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

/// Acknowledgement of a single insert
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertAck {
    pub acknowledged: bool,
    pub inserted_id: Value,
}

impl From<InsertOneResult> for InsertAck {
    fn from(result: InsertOneResult) -> Self {
        InsertAck {
            acknowledged: true,
            inserted_id: bson_to_json(result.inserted_id),
        }
    }
}

/// Acknowledgement of a single update (or upsert)
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAck {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<Value>,
}

impl From<UpdateResult> for UpdateAck {
    fn from(result: UpdateResult) -> Self {
        let upserted_id = result.upserted_id.map(bson_to_json);
        UpdateAck {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_count: u64::from(upserted_id.is_some()),
            upserted_id,
        }
    }
}

/// Acknowledgement of a single delete
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAck {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl From<DeleteResult> for DeleteAck {
    fn from(result: DeleteResult) -> Self {
        DeleteAck {
            acknowledged: true,
            deleted_count: result.deleted_count,
        }
    }
}
