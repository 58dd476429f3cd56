use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Key of any record in the store, `<type>:<local id>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct PageId(pub String);

impl PageId {
    pub const PREFIX: &'static str = "page:";

    /// Page id for a page named by a local key, e.g. `page:3.0`.
    pub fn from_key(key: &str) -> Self {
        Self(format!("{}{}", Self::PREFIX, key))
    }

    pub fn key(&self) -> &str {
        self.0.strip_prefix(Self::PREFIX).unwrap_or(&self.0)
    }

    pub fn record_id(&self) -> RecordId {
        RecordId(self.0.clone())
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::from_key("page")
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct ShapeId(pub String);

impl ShapeId {
    pub fn new() -> Self {
        Self(format!("shape:{}", Uuid::new_v4()))
    }

    pub fn record_id(&self) -> RecordId {
        RecordId(self.0.clone())
    }
}

impl Default for ShapeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new() -> Self {
        Self(format!("asset:{}", Uuid::new_v4()))
    }

    pub fn record_id(&self) -> RecordId {
        RecordId(self.0.clone())
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub id: PageId,
    pub name: String,
    #[serde(default)]
    pub meta: Value,
}

impl PageRecord {
    pub fn new(id: PageId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            meta: Value::Null,
        }
    }
}

/// A drawable record. Only the fields identity and diffing need are typed;
/// everything tool-specific lives in `props`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShapeRecord {
    pub id: ShapeId,
    pub parent_id: PageId,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub props: Value,
}

impl ShapeRecord {
    pub fn new(parent_id: PageId, kind: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: ShapeId::new(),
            parent_id,
            kind: kind.into(),
            x,
            y,
            rotation: 0.0,
            props: Value::Null,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub id: AssetId,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub props: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Page,
    Shape,
    Asset,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "typeName", rename_all = "snake_case")]
pub enum Record {
    Page(PageRecord),
    Shape(ShapeRecord),
    Asset(AssetRecord),
}

impl Record {
    pub fn id(&self) -> RecordId {
        match self {
            Record::Page(page) => page.id.record_id(),
            Record::Shape(shape) => shape.id.record_id(),
            Record::Asset(asset) => asset.id.record_id(),
        }
    }

    pub fn record_type(&self) -> RecordType {
        match self {
            Record::Page(_) => RecordType::Page,
            Record::Shape(_) => RecordType::Shape,
            Record::Asset(_) => RecordType::Asset,
        }
    }

    pub fn as_page(&self) -> Option<&PageRecord> {
        match self {
            Record::Page(page) => Some(page),
            _ => None,
        }
    }

    pub fn as_shape(&self) -> Option<&ShapeRecord> {
        match self {
            Record::Shape(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn as_asset(&self) -> Option<&AssetRecord> {
        match self {
            Record::Asset(asset) => Some(asset),
            _ => None,
        }
    }
}

impl From<PageRecord> for Record {
    fn from(page: PageRecord) -> Self {
        Record::Page(page)
    }
}

impl From<ShapeRecord> for Record {
    fn from(shape: ShapeRecord) -> Self {
        Record::Shape(shape)
    }
}

impl From<AssetRecord> for Record {
    fn from(asset: AssetRecord) -> Self {
        Record::Asset(asset)
    }
}
