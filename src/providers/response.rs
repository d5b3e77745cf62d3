use std::fmt;

use serde_json::Value;

use crate::util::text::truncate_chars;
use crate::util::xml::XmlDocument;

/// A response body from the VSTS REST API, parsed as far as it will go.
///
/// JSON is tried first. Only when that fails and the body opens with an XML
/// declaration is a loose XML parse kept in `xml`. Neither parse failing is
/// not an error: callers treat a missing `json` as "nothing to read".
#[derive(Clone, PartialEq)]
pub struct VstsResponse {
    pub text: String,
    pub json: Option<Value>,
    pub xml: Option<XmlDocument>,
    pub status_code: u16,
}

impl VstsResponse {
    pub fn new(text: impl Into<String>, status_code: u16) -> Self {
        let text = text.into();
        let (json, xml) = parse_body(&text);
        Self {
            text,
            json,
            xml,
            status_code,
        }
    }

    pub async fn from_response(resp: reqwest::Response) -> reqwest::Result<Self> {
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        Ok(Self::new(text, status))
    }

    /// The `id` field of the JSON object, rendered as a string.
    pub fn work_item_id(&self) -> Option<String> {
        match self.json.as_ref()?.get("id")? {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

impl fmt::Debug for VstsResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<VstsResponse<{}> {}>",
            self.status_code,
            truncate_chars(&self.text, 120)
        )
    }
}

fn parse_body(text: &str) -> (Option<Value>, Option<XmlDocument>) {
    if text.is_empty() {
        return (None, None);
    }
    match serde_json::from_str::<Value>(text) {
        Ok(value) => (Some(value), None),
        Err(_) if text.starts_with("<?xml") => (None, Some(XmlDocument::parse(text))),
        Err(_) => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_body_yields_id() {
        let body = r#"{"id": 42, "fields": {"System.Title": "Crash in checkout"}}"#;
        let resp = VstsResponse::new(body, 200);
        assert_eq!(resp.status_code, 200);
        assert!(resp.xml.is_none());
        let json = resp.json.as_ref().unwrap();
        assert_eq!(json["id"], 42);
        assert_eq!(resp.work_item_id(), Some("42".to_string()));
    }

    #[test]
    fn json_object_keeps_key_order() {
        let resp = VstsResponse::new(r#"{"rev": 1, "id": 7, "fields": {}, "_links": {}}"#, 200);
        let keys: Vec<&str> = resp
            .json
            .as_ref()
            .and_then(|v| v.as_object())
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["rev", "id", "fields", "_links"]);
    }

    #[test]
    fn string_id_is_accepted() {
        let resp = VstsResponse::new(r#"{"id": "1337"}"#, 201);
        assert_eq!(resp.work_item_id(), Some("1337".to_string()));
    }

    #[test]
    fn empty_body_has_no_structure() {
        let resp = VstsResponse::new("", 204);
        assert!(resp.json.is_none());
        assert!(resp.xml.is_none());
        assert_eq!(resp.status_code, 204);
        assert_eq!(resp.work_item_id(), None);
    }

    #[test]
    fn xml_body_falls_back_to_document() {
        let body = "<?xml version=\"1.0\"?><fault><message>TF400813</message></fault>";
        let resp = VstsResponse::new(body, 500);
        assert!(resp.json.is_none());
        let xml = resp.xml.as_ref().unwrap();
        assert_eq!(xml.find("message").unwrap().text(), "TF400813");
    }

    #[test]
    fn garbage_body_has_no_structure() {
        let resp = VstsResponse::new("oops", 200);
        assert!(resp.json.is_none());
        assert!(resp.xml.is_none());
        assert_eq!(resp.work_item_id(), None);
    }

    #[test]
    fn xml_without_declaration_is_not_parsed() {
        let resp = VstsResponse::new("<html><body>Bad Gateway</body></html>", 502);
        assert!(resp.json.is_none());
        assert!(resp.xml.is_none());
    }

    #[test]
    fn json_without_id_yields_none() {
        let resp = VstsResponse::new(r#"{"count": 0, "value": []}"#, 200);
        assert!(resp.json.is_some());
        assert_eq!(resp.work_item_id(), None);
    }

    #[test]
    fn debug_output_is_truncated() {
        let resp = VstsResponse::new("e".repeat(500), 500);
        let rendered = format!("{resp:?}");
        assert!(rendered.starts_with("<VstsResponse<500> "));
        assert_eq!(rendered.len(), "<VstsResponse<500> ".len() + 120 + 1);
    }
}
