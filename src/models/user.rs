use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Identity taken from a verified token. User records themselves are owned
/// by the auth service, not by this backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(serialize_with = "mongodb::bson::serde_helpers::serialize_object_id_as_hex_string")]
    pub id: ObjectId,
}
