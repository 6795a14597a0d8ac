//! External document representation of a roster.
//!
//! The domain types serialise under the canonical `snake_case` field names;
//! this module applies the configured [`FieldNames`] on the way out and
//! inverts them on the way in, so the naming transform only ever touches
//! the external representation. It also carries the declarative schema
//! bundle that stores consume when registering the embedded field.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{Config, FieldNames, Roster};

/// Declarative schema requirements for the embedded roster field.
///
/// Produced once per configuration by `Manager::schema_spec`; a store
/// translates this into its own field registration, index creation and
/// uniqueness enforcement. Pure data, no I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSpec {
    indexes: Vec<IndexSpec>,
    unique_address: Option<UniqueSpec>,
    require_at_least_one: bool,
    entry_ids: bool,
}

impl SchemaSpec {
    pub(crate) fn declare(config: &Config, fields: &FieldNames) -> Self {
        let indexes = if config.indexing() {
            vec![
                IndexSpec::ascending(fields.address_path()),
                IndexSpec::ascending(fields.code_path()),
            ]
        } else {
            Vec::new()
        };

        let unique_address = config.unique_addresses().then(|| UniqueSpec {
            field: fields.address_path(),
            sparse: config.sparse_uniqueness(),
        });

        Self {
            indexes,
            unique_address,
            require_at_least_one: config.require_at_least_one(),
            entry_ids: config.entry_ids(),
        }
    }

    /// The lookup indexes requested of the store.
    #[must_use]
    pub fn indexes(&self) -> &[IndexSpec] {
        &self.indexes
    }

    /// The uniqueness constraint on the address field, if configured.
    #[must_use]
    pub const fn unique_address(&self) -> Option<&UniqueSpec> {
        self.unique_address.as_ref()
    }

    /// Whether persistence requires a non-empty roster.
    #[must_use]
    pub const fn require_at_least_one(&self) -> bool {
        self.require_at_least_one
    }

    /// Whether entries carry per-entry identifiers.
    #[must_use]
    pub const fn entry_ids(&self) -> bool {
        self.entry_ids
    }
}

/// A single `{field: direction}` index request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    field: String,
    direction: IndexDirection,
}

impl IndexSpec {
    fn ascending(field: String) -> Self {
        Self {
            field,
            direction: IndexDirection::Ascending,
        }
    }

    /// The dotted field path to index.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The requested direction.
    #[must_use]
    pub const fn direction(&self) -> IndexDirection {
        self.direction
    }
}

/// Index direction. Only ascending indexes are ever requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexDirection {
    /// Ascending key order.
    Ascending,
}

/// A uniqueness constraint on a field, enforced by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueSpec {
    field: String,
    sparse: bool,
}

impl UniqueSpec {
    /// The dotted field path the constraint applies to.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Whether documents lacking the field are exempt.
    #[must_use]
    pub const fn sparse(&self) -> bool {
        self.sparse
    }
}

/// A malformed external document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The embedded collection field is present but not an array.
    #[error("field {0} is not an array")]
    NotAnArray(String),

    /// An element of the embedded array is not a valid entry.
    #[error("malformed email entry: {0}")]
    Entry(#[from] serde_json::Error),
}

/// Renders a roster as `{collection_field: [entries...]}` under the
/// resolved field names.
pub(crate) fn to_document(roster: &Roster, fields: &FieldNames, entry_ids: bool) -> Value {
    let mut entries = serde_json::to_value(roster).expect("roster serialisation cannot fail");

    if let Value::Array(items) = &mut entries {
        for item in items {
            if let Value::Object(entry) = item {
                if !entry_ids {
                    entry.remove("_id");
                }
                rename_entry_keys(entry, fields, Direction::Outbound);
            }
        }
    }

    let mut document = Map::new();
    document.insert(fields.collection().to_owned(), entries);
    Value::Object(document)
}

/// Parses a roster out of an owning record's document.
///
/// A record without the collection field has an empty roster.
pub(crate) fn from_document(record: &Value, fields: &FieldNames) -> Result<Roster, DocumentError> {
    let Some(embedded) = record.get(fields.collection()) else {
        return Ok(Roster::new());
    };
    let Value::Array(items) = embedded else {
        return Err(DocumentError::NotAnArray(fields.collection().to_owned()));
    };

    let canonical: Vec<Value> = items
        .iter()
        .map(|item| {
            let mut item = item.clone();
            if let Value::Object(entry) = &mut item {
                rename_entry_keys(entry, fields, Direction::Inbound);
            }
            item
        })
        .collect();

    Ok(serde_json::from_value(Value::Array(canonical))?)
}

#[derive(Clone, Copy)]
enum Direction {
    /// canonical names -> external names
    Outbound,
    /// external names -> canonical names
    Inbound,
}

fn rename_entry_keys(entry: &mut Map<String, Value>, fields: &FieldNames, direction: Direction) {
    let verification_key = match direction {
        Direction::Outbound => {
            rename(entry, "email_address", fields.address());
            rename(entry, "primary", fields.primary());
            rename(entry, "verification", fields.verification());
            fields.verification().to_owned()
        }
        Direction::Inbound => {
            rename(entry, fields.address(), "email_address");
            rename(entry, fields.primary(), "primary");
            rename(entry, fields.verification(), "verification");
            "verification".to_owned()
        }
    };

    if let Some(Value::Object(verification)) = entry.get_mut(&verification_key) {
        match direction {
            Direction::Outbound => {
                rename(verification, "date", fields.date());
                rename(verification, "code", fields.code());
                rename(verification, "code_expiration", fields.code_expiration());
            }
            Direction::Inbound => {
                rename(verification, fields.date(), "date");
                rename(verification, fields.code(), "code");
                rename(verification, fields.code_expiration(), "code_expiration");
            }
        }
    }
}

fn rename(map: &mut Map<String, Value>, from: &str, to: &str) {
    if from == to {
        return;
    }
    if let Some(value) = map.remove(from) {
        map.insert(to.to_owned(), value);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::FieldNaming;

    fn camel(key: &str) -> String {
        let mut out = String::new();
        let mut upper_next = false;
        for c in key.chars() {
            if c == '_' {
                upper_next = true;
            } else if upper_next {
                out.extend(c.to_uppercase());
                upper_next = false;
            } else {
                out.push(c);
            }
        }
        out
    }

    fn identity_fields() -> FieldNames {
        Config::default().field_names()
    }

    fn camel_fields() -> FieldNames {
        Config::default()
            .with_field_naming(FieldNaming::Custom(camel))
            .field_names()
    }

    fn sample_roster() -> Roster {
        use crate::domain::entry::{EmailEntry, Verification};

        let mut roster = Roster::new();
        roster.push(EmailEntry::new("a@x.com".to_owned(), None));
        roster.push(EmailEntry::new("b@x.com".to_owned(), None));
        roster.set_primary("a@x.com").unwrap();
        roster.get_at_mut(1).verification = Some(Verification {
            code: "emvc-1".to_owned(),
            expires: None,
            confirmed: None,
        });
        roster
    }

    #[test]
    fn document_uses_canonical_names_under_identity_naming() {
        let document = to_document(&sample_roster(), &identity_fields(), false);
        let entries = document["email_addresses"].as_array().unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["email_address"], "a@x.com");
        assert!(entries[0].get("primary").is_some());
        assert_eq!(entries[1]["verification"]["code"], "emvc-1");
    }

    #[test]
    fn custom_naming_renames_every_level() {
        let document = to_document(&sample_roster(), &camel_fields(), false);
        let entries = document["emailAddresses"].as_array().unwrap();

        assert_eq!(entries[0]["emailAddress"], "a@x.com");
        assert!(entries[0].get("email_address").is_none());
        assert_eq!(entries[1]["verification"]["code"], "emvc-1");
        assert!(entries[0].get("primary").is_some());
    }

    #[test]
    fn entry_ids_are_stripped_when_disabled() {
        use crate::domain::entry::EmailEntry;

        let mut roster = Roster::new();
        roster.push(EmailEntry::new(
            "a@x.com".to_owned(),
            Some(uuid::Uuid::new_v4()),
        ));

        let without = to_document(&roster, &identity_fields(), false);
        assert!(without["email_addresses"][0].get("_id").is_none());

        let with = to_document(&roster, &identity_fields(), true);
        assert!(with["email_addresses"][0].get("_id").is_some());
    }

    #[test]
    fn round_trip_preserves_the_roster() {
        let roster = sample_roster();
        for fields in [identity_fields(), camel_fields()] {
            let document = to_document(&roster, &fields, true);
            let parsed = from_document(&document, &fields).unwrap();
            assert_eq!(parsed, roster);
        }
    }

    #[test]
    fn missing_collection_field_is_an_empty_roster() {
        let parsed = from_document(&json!({"name": "someone"}), &identity_fields()).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn non_array_collection_field_is_rejected() {
        let error = from_document(&json!({"email_addresses": 7}), &identity_fields()).unwrap_err();
        assert!(matches!(error, DocumentError::NotAnArray(_)));
    }

    #[test]
    fn malformed_entry_is_rejected() {
        let record = json!({"email_addresses": [{"primary": "not-a-date"}]});
        let error = from_document(&record, &identity_fields()).unwrap_err();
        assert!(matches!(error, DocumentError::Entry(_)));
    }

    #[test]
    fn schema_spec_declares_both_lookup_indexes() {
        let config = Config::default();
        let spec = SchemaSpec::declare(&config, &config.field_names());

        let fields: Vec<&str> = spec.indexes().iter().map(IndexSpec::field).collect();
        assert_eq!(
            fields,
            vec![
                "email_addresses.email_address",
                "email_addresses.verification.code"
            ]
        );
        assert!(
            spec.indexes()
                .iter()
                .all(|index| index.direction() == IndexDirection::Ascending)
        );

        let unique = spec.unique_address().unwrap();
        assert_eq!(unique.field(), "email_addresses.email_address");
        assert!(unique.sparse());
        assert!(!spec.require_at_least_one());
        assert!(spec.entry_ids());
    }

    #[test]
    fn indexing_off_declares_no_indexes() {
        let config = Config::default()
            .with_indexing(false)
            .with_unique_addresses(false);
        let spec = SchemaSpec::declare(&config, &config.field_names());

        assert!(spec.indexes().is_empty());
        assert!(spec.unique_address().is_none());
    }
}
