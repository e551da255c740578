use crate::database::Database;
use crate::models::{Listing, LISTINGS_COLLECTION};
use anyhow::{bail, Result};
use serde_json::Value;
use uuid::Uuid;

/// Seeds the local store from a JSON export.
///
/// Accepts either an array of listing documents (an optional `id` field
/// names the document, otherwise a v4 UUID is assigned) or an object
/// mapping document ids to listings. Invalid listings are skipped.
pub fn import_listings(db: &Database, export: Value) -> Result<Vec<String>> {
    let entries: Vec<(Option<String>, Value)> = match export {
        Value::Array(items) => items
            .into_iter()
            .map(|mut item| {
                let id = item
                    .as_object_mut()
                    .and_then(|obj| obj.remove("id"))
                    .and_then(|id| id.as_str().map(str::to_string));
                (id, item)
            })
            .collect(),
        Value::Object(map) => map.into_iter().map(|(id, item)| (Some(id), item)).collect(),
        other => bail!("Expected an array or object of listings, got {}", other),
    };

    let mut imported = Vec::new();
    for (id, document) in entries {
        let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());

        if let Err(e) = Listing::from_document(document.clone()) {
            tracing::warn!("Skipping listing {}: {}", id, e);
            continue;
        }

        if db.document_exists(LISTINGS_COLLECTION, &id)? {
            tracing::info!("Replacing existing listing {}", id);
        }
        db.put_document(LISTINGS_COLLECTION, &id, &document)?;
        tracing::debug!("Imported listing {}", id);
        imported.push(id);
    }

    tracing::info!("Imported {} listings", imported.len());
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::sample_document;
    use serde_json::json;

    #[test]
    fn test_import_array_assigns_missing_ids() {
        let db = Database::in_memory().unwrap();
        let mut named = sample_document();
        named["id"] = json!("condo-1");

        let ids = import_listings(&db, json!([named, sample_document()])).unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], "condo-1");
        assert!(Uuid::parse_str(&ids[1]).is_ok());
        assert_eq!(db.count_documents(LISTINGS_COLLECTION).unwrap(), 2);

        // The id field is not stored inside the document
        let record = db.get_document(LISTINGS_COLLECTION, "condo-1").unwrap().unwrap();
        assert!(record.data.get("id").is_none());
    }

    #[test]
    fn test_import_object_uses_keys() {
        let db = Database::in_memory().unwrap();
        let ids = import_listings(&db, json!({ "abc": sample_document() })).unwrap();

        assert_eq!(ids, vec!["abc".to_string()]);
        assert!(db.document_exists(LISTINGS_COLLECTION, "abc").unwrap());
    }

    #[test]
    fn test_import_replaces_existing_listing() {
        let db = Database::in_memory().unwrap();
        import_listings(&db, json!({ "abc": sample_document() })).unwrap();

        let mut renamed = sample_document();
        renamed["name"] = json!("Renamed Condo");
        import_listings(&db, json!({ "abc": renamed })).unwrap();

        let record = db.get_document(LISTINGS_COLLECTION, "abc").unwrap().unwrap();
        assert_eq!(record.data["name"], "Renamed Condo");
        assert_eq!(db.count_documents(LISTINGS_COLLECTION).unwrap(), 1);
    }

    #[test]
    fn test_import_skips_invalid_listings() {
        let db = Database::in_memory().unwrap();
        let mut broken = sample_document();
        broken["imgUrls"] = json!([]);

        let ids = import_listings(&db, json!({ "ok": sample_document(), "broken": broken })).unwrap();

        assert_eq!(ids, vec!["ok".to_string()]);
        assert_eq!(db.count_documents(LISTINGS_COLLECTION).unwrap(), 1);
    }

    #[test]
    fn test_import_rejects_scalar() {
        let db = Database::in_memory().unwrap();
        assert!(import_listings(&db, json!(42)).is_err());
    }
}
