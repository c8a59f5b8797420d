// Wire models shared by both APIs
//
// Entity payloads are kept as opaque JSON objects: this crate only needs a
// handful of fields (ids, foreign references) to drive the fetch, and the
// serializer writes everything else through untouched, in source order.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ── Entity ───────────────────────────────────────────────────────────

/// One record of any collection, as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(Map<String, Value>);

impl Entity {
    /// The entity's `id`, if it has a string one.
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether `field` holds a non-null foreign reference, e.g. a plugin's
    /// `consumer`.
    pub fn references(&self, field: &str) -> bool {
        self.0.get(field).is_some_and(|v| !v.is_null())
    }

    /// Drop the `id` field, returning the entity.
    pub fn without_id(mut self) -> Self {
        self.0.retain(|key, _| key != "id");
        self
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Entity {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

// ── List envelope ────────────────────────────────────────────────────

/// `{ "data": [...] }` list envelope used by both APIs.
///
/// The gateway encodes an empty list as `{}` on some versions, so an empty
/// object is accepted in place of an empty array. A missing `data` key is
/// also treated as empty.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new", deserialize_with = "list_or_empty_object")]
    pub data: Vec<T>,
}

fn list_or_empty_object<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrObject<T> {
        List(Vec<T>),
        Object(Map<String, Value>),
    }

    match ListOrObject::<T>::deserialize(deserializer)? {
        ListOrObject::List(items) => Ok(items),
        ListOrObject::Object(map) if map.is_empty() => Ok(Vec::new()),
        ListOrObject::Object(_) => Err(serde::de::Error::custom(
            "expected a list or an empty object for `data`",
        )),
    }
}

// ── Managed API ──────────────────────────────────────────────────────

/// A control plane as listed by the managed API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlPlane {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<ControlPlaneType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlPlaneType {
    #[serde(default)]
    pub name: Option<String>,
}

impl ControlPlane {
    /// The control plane's type name, e.g. `kong-ee`.
    pub fn type_name(&self) -> Option<&str> {
        self.kind.as_ref().and_then(|t| t.name.as_deref())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn list_accepts_array() {
        let page: ListResponse<Entity> =
            serde_json::from_value(json!({"data": [{"id": "a"}, {"id": "b"}], "next": null}))
                .unwrap();
        let ids: Vec<_> = page.data.iter().filter_map(Entity::id).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn list_decodes_typed_items() {
        let page: ListResponse<ControlPlane> = serde_json::from_str(
            r#"{"data": [{"id": "cp-1", "name": "prod", "type": {"name": "kong-ee"}}]}"#,
        )
        .unwrap();
        assert_eq!(page.data[0].id, "cp-1");
        assert_eq!(page.data[0].type_name(), Some("kong-ee"));
    }

    #[test]
    fn list_accepts_empty_object_and_missing_data() {
        let page: ListResponse<Entity> = serde_json::from_value(json!({"data": {}})).unwrap();
        assert!(page.data.is_empty());
        let page: ListResponse<Entity> = serde_json::from_value(json!({})).unwrap();
        assert!(page.data.is_empty());
    }

    #[test]
    fn list_rejects_non_empty_object() {
        let res: Result<ListResponse<Entity>, _> =
            serde_json::from_value(json!({"data": {"id": "x"}}));
        assert!(res.is_err());
    }

    #[test]
    fn entity_references_ignore_null() {
        let plugin: Entity =
            serde_json::from_value(json!({"id": "p", "consumer": null, "service": {"id": "s"}}))
                .unwrap();
        assert!(!plugin.references("consumer"));
        assert!(plugin.references("service"));
        assert!(!plugin.references("route"));
    }

    #[test]
    fn without_id_preserves_other_fields() {
        let e: Entity = serde_json::from_value(json!({"id": "x", "name": "svc"})).unwrap();
        let stripped = e.without_id();
        assert!(stripped.id().is_none());
        assert_eq!(stripped.get("name"), Some(&json!("svc")));
    }

    #[test]
    fn control_plane_type_name() {
        let cp: ControlPlane =
            serde_json::from_value(json!({"id": "1", "name": "prod", "type": {"name": "kong-ee"}}))
                .unwrap();
        assert_eq!(cp.type_name(), Some("kong-ee"));
    }
}
