use serde::{Deserialize, Deserializer, Serialize};

/// The slice of a `mobileApp` record this crate reads. Unknown fields are
/// ignored on read and never written back.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MobileApp {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "@odata.type", default, skip_serializing_if = "Option::is_none")]
    pub odata_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub role_scope_tag_ids: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// PATCH body: the record's type discriminator passed through untouched plus
/// the replacement tag list.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScopeTagPatch<'a> {
    #[serde(rename = "@odata.type", skip_serializing_if = "Option::is_none")]
    pub odata_type: Option<&'a str>,
    pub role_scope_tag_ids: &'a [String],
}

impl<'a> ScopeTagPatch<'a> {
    pub fn new(app: &'a MobileApp, role_scope_tag_ids: &'a [String]) -> Self {
        Self {
            odata_type: app.odata_type.as_deref(),
            role_scope_tag_ids,
        }
    }
}
