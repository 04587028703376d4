use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A traceable product record, owned by exactly one account.
///
/// `id` is immutable after creation and keys the externally stored
/// side-files (QR code image, media directory). `scan_count` is
/// accumulated by the public scan endpoint and is read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub scan_count: u64,
}
