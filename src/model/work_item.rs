use serde::{Deserialize, Serialize};

pub const TITLE_PATH: &str = "/fields/System.Title";
pub const DESCRIPTION_PATH: &str = "/fields/System.Description";
pub const RELATIONS_PATH: &str = "/relations/-";

/// One JSON-patch instruction against a VSTS work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: String,
    pub path: String,
    pub value: PatchValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatchValue {
    Text(String),
    Relation(Relation),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub rel: String,
    pub url: String,
}

impl PatchOperation {
    pub fn add(path: &str, value: PatchValue) -> Self {
        Self {
            op: "add".into(),
            path: path.into(),
            value,
        }
    }
}

/// Patch document for a new work item: title, description and a hyperlink
/// back to where the item came from.
pub fn create_payload(title: &str, description: &str, link: &str) -> Vec<PatchOperation> {
    vec![
        PatchOperation::add(TITLE_PATH, PatchValue::Text(title.into())),
        PatchOperation::add(DESCRIPTION_PATH, PatchValue::Text(description.into())),
        PatchOperation::add(
            RELATIONS_PATH,
            PatchValue::Relation(Relation {
                rel: "Hyperlink".into(),
                url: link.into(),
            }),
        ),
    ]
}
