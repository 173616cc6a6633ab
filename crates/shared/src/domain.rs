use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Opaque identifier assigned by the bill store on first create.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BillId(pub String);

impl std::fmt::Display for BillId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserKind {
    Employee,
    Admin,
}

/// The `user` entry persisted in local storage once somebody signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(rename = "type")]
    pub kind: UserKind,
    #[serde(default)]
    pub email: String,
}

/// Approval status of a bill. Values the store sends that are not one of the
/// three known states are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BillStatus {
    Pending,
    Accepted,
    Refused,
    Other(String),
}

impl BillStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Refused => "refused",
            Self::Other(raw) => raw,
        }
    }
}

impl Default for BillStatus {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for BillStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => Self::Pending,
            "accepted" => Self::Accepted,
            "refused" => Self::Refused,
            _ => Self::Other(value),
        }
    }
}

impl From<BillStatus> for String {
    fn from(value: BillStatus) -> Self {
        match value {
            BillStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// A bill as returned by the store.
///
/// Every field decodes leniently: records written by older clients may carry
/// a string amount, a number where a date belongs, or no status at all, and
/// one such record must not make the whole list undecodable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillRecord {
    #[serde(
        default,
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<BillId>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_text")]
    pub expense_type: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub vat: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub pct: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub commentary: String,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: BillStatus,
    #[serde(default, deserialize_with = "lenient_optional_text")]
    pub file_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_text")]
    pub file_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub comment_admin: Option<String>,
}

/// Record body sent when a staged bill is finalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillDraft {
    pub email: String,
    #[serde(rename = "type")]
    pub expense_type: String,
    pub name: String,
    pub amount: f64,
    pub date: String,
    pub vat: String,
    pub pct: i32,
    pub commentary: String,
    pub file_url: String,
    pub file_name: String,
    pub status: BillStatus,
}

impl BillDraft {
    pub fn into_record(self, id: BillId) -> BillRecord {
        BillRecord {
            id: Some(id),
            email: self.email,
            expense_type: self.expense_type,
            name: self.name,
            amount: Some(self.amount),
            date: self.date,
            vat: self.vat,
            pct: Some(f64::from(self.pct)),
            commentary: self.commentary,
            status: self.status,
            file_url: Some(self.file_url),
            file_name: Some(self.file_name),
            comment_admin: None,
        }
    }
}

/// Reference to a receipt staged in the store before its bill exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadHandle {
    pub file_url: String,
    pub file_name: String,
    /// Store-side reference linking the later finalize call to this draft.
    pub key: String,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text,
        Some(other) => other.to_string(),
    })
}

fn lenient_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = lenient_text(deserializer)?;
    Ok((!text.is_empty()).then_some(text))
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<BillId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_optional_text(deserializer)?.map(BillId))
}

fn lenient_status<'de, D>(deserializer: D) -> Result<BillStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(BillStatus::from(lenient_text(deserializer)?))
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|value| value.is_finite()))
}
