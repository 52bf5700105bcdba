use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// An item record as returned by an item source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "collectionId")]
    pub collection_id: String,
    #[serde(default)]
    pub metadata: Option<RawMetadata>,
    #[serde(default)]
    pub metadata_rarity: Option<Value>,
}

// Some indexers emit numeric ids
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(de::Error::custom(format!("expected string or number id, got {}", other))),
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub properties: Option<Value>,
}

/// Collection record from the collection endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CollectionInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectibleItem {
    pub id: String,
    pub name: Option<String>,
    pub image: Option<String>,
    #[serde(rename = "external_url")]
    pub external_url: String,
    pub rarity: Option<Value>,
    pub collection_id: String,
    pub properties: Option<Value>,
}

impl From<RawItem> for CollectibleItem {
    fn from(raw: RawItem) -> Self {
        let metadata = raw.metadata.unwrap_or_default();
        Self {
            id: raw.id,
            name: metadata.name,
            image: metadata.image,
            external_url: String::new(),
            rarity: raw.metadata_rarity,
            collection_id: raw.collection_id,
            properties: metadata.properties,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionAggregate {
    pub collection_id: String,
    pub collection_name: Option<String>,
    pub nft_items: Vec<CollectibleItem>,
}

/// Everything an address owns across all item sources.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    pub total: usize,
    #[serde(rename = "nftList")]
    pub collections: Vec<CollectionAggregate>,
    /// Sources dropped under `FailurePolicy::Isolate`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_sources: Vec<String>,
}
