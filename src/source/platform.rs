use crate::model::JobPlatform;
use crate::source::EnumerateError;
use serde_json::Value;

/// Pulls listing identifiers out of one listing API page
///
/// Items live under the platform's JSON pointer; each one exposes an `id`
/// that may be a number or a string.
pub fn extract_item_ids(platform: JobPlatform, page: &Value) -> Result<Vec<String>, EnumerateError> {
    let pointer = platform.items_pointer();
    let items = page
        .pointer(pointer)
        .and_then(Value::as_array)
        .ok_or_else(|| EnumerateError::MalformedPage(format!("no item array at '{}'", pointer)))?;

    items
        .iter()
        .map(|item| match item.get("id") {
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            _ => Err(EnumerateError::MalformedPage(
                "item without an identifier".to_string(),
            )),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wanted_ids() {
        let page = json!({ "data": [{ "id": 101 }, { "id": 102, "position": "Backend" }] });
        let ids = extract_item_ids(JobPlatform::Wanted, &page).unwrap();
        assert_eq!(ids, vec!["101", "102"]);
    }

    #[test]
    fn test_saramin_nested_ids() {
        let page = json!({ "jobs": { "count": 1, "job": [{ "id": "48213" }] } });
        let ids = extract_item_ids(JobPlatform::Saramin, &page).unwrap();
        assert_eq!(ids, vec!["48213"]);
    }

    #[test]
    fn test_empty_page() {
        let page = json!({ "data": [] });
        assert!(extract_item_ids(JobPlatform::JobKorea, &page).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_pages() {
        assert!(extract_item_ids(JobPlatform::Wanted, &json!({ "items": [] })).is_err());
        assert!(extract_item_ids(JobPlatform::Wanted, &json!({ "data": [{ "name": "x" }] })).is_err());
        assert!(extract_item_ids(JobPlatform::Wanted, &json!({ "data": [{ "id": " " }] })).is_err());
    }
}
