//! Snapshot encoding: JSON or YAML, to a file or stdout.
//!
//! The document starts with `_format_version` and lists every non-empty
//! collection under its declarative-file name. The whole document is
//! encoded before anything is written. Files are written to a temporary
//! sibling and renamed over the target, so a failed write leaves the
//! previous file untouched.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use gatedeck_api::Entity;
use gatedeck_core::{BoxError, DumpState, Format, StateWriter, WriteConfig};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::info;

/// Version tag written at the top of every output document.
pub const FORMAT_VERSION: &str = "1.1";

/// Output target meaning standard output.
pub const STDOUT: &str = "-";

/// Writes snapshots to disk or stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileWriter;

impl StateWriter for FileWriter {
    fn write(&self, state: &DumpState, config: &WriteConfig) -> Result<(), BoxError> {
        let document = build_document(state, config.with_id)?;
        let text = encode(&document, config.format)?;

        if config.output == STDOUT {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
            return Ok(());
        }

        let path = output_path(&config.output, config.format);
        replace_file(&path, |file| file.write_all(text.as_bytes()))?;
        info!(path = %path.display(), "wrote state file");
        Ok(())
    }
}

/// Append the format's extension when `name` has none (`kong` → `kong.yaml`).
pub fn output_path(name: &str, format: Format) -> PathBuf {
    let path = Path::new(name);
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        PathBuf::from(format!("{name}.{}", format.extension()))
    }
}

/// Replace `path` with whatever `write` puts into a temporary file in the
/// same directory. On any error the temporary file is removed and `path`
/// keeps its old contents.
fn replace_file(
    path: &Path,
    write: impl FnOnce(&mut File) -> io::Result<()>,
) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    write(tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn strip_id(mut value: Value, with_id: bool) -> Value {
    if !with_id {
        if let Value::Object(ref mut fields) = value {
            fields.retain(|key, _| key != "id");
        }
    }
    value
}

fn entities(items: &[Entity], with_id: bool) -> Value {
    Value::Array(
        items
            .iter()
            .map(|e| strip_id(Value::Object(e.fields().clone()), with_id))
            .collect(),
    )
}

/// Assemble the output document, skipping empty collections.
pub fn build_document(state: &DumpState, with_id: bool) -> Result<Map<String, Value>, BoxError> {
    let mut doc = Map::new();
    doc.insert("_format_version".into(), Value::from(FORMAT_VERSION));

    for (name, items) in state.gateway.collections() {
        if !items.is_empty() {
            doc.insert(name.into(), entities(items, with_id));
        }
    }

    if !state.gateway.custom_entities.is_empty() {
        let custom = state
            .gateway
            .custom_entities
            .iter()
            .map(|c| {
                let mut value = serde_json::to_value(c)?;
                if let Some(fields) = value.get_mut("fields") {
                    *fields = strip_id(fields.take(), with_id);
                }
                Ok(value)
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()?;
        doc.insert("custom_entities".into(), Value::Array(custom));
    }

    let managed = &state.managed;
    if !managed.service_packages.is_empty() {
        doc.insert(
            "service_packages".into(),
            entities(&managed.service_packages, with_id),
        );
    }
    if !managed.documents.is_empty() {
        let documents = managed
            .documents
            .iter()
            .map(|d| serde_json::to_value(d).map(|v| strip_id(v, with_id)))
            .collect::<Result<Vec<_>, _>>()?;
        doc.insert("documents".into(), Value::Array(documents));
    }

    Ok(doc)
}

fn encode(document: &Map<String, Value>, format: Format) -> Result<String, BoxError> {
    Ok(match format {
        Format::Json => {
            let mut text = serde_json::to_string_pretty(document)?;
            text.push('\n');
            text
        }
        Format::Yaml => serde_yaml::to_string(document)?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gatedeck_core::{
        CustomEntity, Document, DocumentOwner, GatewayRawState, ManagedRawState,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn entity(value: Value) -> Entity {
        serde_json::from_value(value).unwrap()
    }

    fn sample_state() -> DumpState {
        DumpState {
            control_plane_id: "cp-1".into(),
            gateway: GatewayRawState {
                services: vec![
                    entity(json!({"id": "s2", "name": "zeta", "host": "z.internal"})),
                    entity(json!({"id": "s1", "name": "alpha", "host": "a.internal"})),
                ],
                custom_entities: vec![CustomEntity {
                    entity_type: "degraphql_routes".into(),
                    entity: entity(json!({"id": "d1", "uri": "/q"})),
                }],
                ..GatewayRawState::default()
            },
            managed: ManagedRawState {
                service_packages: vec![entity(json!({"id": "pkg", "name": "billing"}))],
                documents: vec![Document {
                    owner: DocumentOwner::ServicePackage("pkg".into()),
                    entity: entity(json!({"id": "doc", "path": "/readme"})),
                }],
            },
        }
    }

    #[test]
    fn document_strips_ids_and_skips_empty_collections() {
        let doc = build_document(&sample_state(), false).unwrap();
        assert_eq!(
            Value::Object(doc),
            json!({
                "_format_version": "1.1",
                "services": [
                    {"name": "zeta", "host": "z.internal"},
                    {"name": "alpha", "host": "a.internal"}
                ],
                "custom_entities": [
                    {"type": "degraphql_routes", "fields": {"uri": "/q"}}
                ],
                "service_packages": [{"name": "billing"}],
                "documents": [{"service_package": "pkg", "path": "/readme"}]
            })
        );
    }

    #[test]
    fn document_keeps_ids_and_order_when_asked() {
        let doc = build_document(&sample_state(), true).unwrap();
        let keys: Vec<&str> = doc.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            [
                "_format_version",
                "services",
                "custom_entities",
                "service_packages",
                "documents"
            ]
        );
        assert_eq!(doc["services"][0]["id"], "s2");
        assert_eq!(doc["services"][1]["id"], "s1");
    }

    #[test]
    fn output_path_appends_extension() {
        assert_eq!(output_path("kong", Format::Yaml), PathBuf::from("kong.yaml"));
        assert_eq!(output_path("kong", Format::Json), PathBuf::from("kong.json"));
        assert_eq!(output_path("state.yml", Format::Yaml), PathBuf::from("state.yml"));
    }

    #[test]
    fn writes_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("kong");
        let config = WriteConfig {
            output: target.display().to_string(),
            format: Format::Yaml,
            with_id: false,
        };

        FileWriter.write(&sample_state(), &config).unwrap();

        let text = std::fs::read_to_string(dir.path().join("kong.yaml")).unwrap();
        assert!(text.starts_with("_format_version:"), "{text}");
        assert!(text.lines().next().unwrap().contains("1.1"));
        assert!(text.contains("name: zeta"));
        assert!(!text.contains("id: s2"));
    }

    #[test]
    fn write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("kong.json");
        std::fs::write(&target, "stale").unwrap();
        let config = WriteConfig {
            output: target.display().to_string(),
            format: Format::Json,
            with_id: true,
        };

        FileWriter.write(&sample_state(), &config).unwrap();

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(written["services"][0]["id"], "s2");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn interrupted_write_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("kong.yaml");
        std::fs::write(&target, "_format_version: '1.1'\nservices: []\n").unwrap();

        let err = replace_file(&target, |file| {
            file.write_all(b"_format_version: '1.1'\nserv")?;
            Err(io::Error::other("no space left on device"))
        })
        .unwrap_err();

        assert_eq!(err.to_string(), "no space left on device");
        assert_eq!(
            std::fs::read_to_string(&target).unwrap(),
            "_format_version: '1.1'\nservices: []\n"
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = WriteConfig {
            output: dir
                .path()
                .join("missing-dir/kong.json")
                .display()
                .to_string(),
            format: Format::Json,
            with_id: true,
        };

        assert!(FileWriter.write(&sample_state(), &config).is_err());
        assert!(!dir.path().join("missing-dir").exists());
    }
}
