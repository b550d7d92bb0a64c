//! Reconciliation of the `docs.json` navigation tree across locales.
//!
//! The English "Documentation" dropdown is the reference. Each target locale's
//! section receives a copy with page paths moved into the locale's directory
//! and group labels run through the locale glossary.

use crate::config::SyncProfile;
use crate::locale::Locale;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reconciles the structural manifest, returning a human-readable change log.
#[allow(async_fn_in_trait)]
pub trait StructureSynchronizer {
    async fn reconcile(&self) -> Result<Vec<String>>;
}

const DROPDOWN_ICON: &str = "book-open";

pub struct DocsJsonSynchronizer {
    manifest_path: PathBuf,
    source_prefix: String,
    source: Locale,
    targets: Vec<Locale>,
}

impl DocsJsonSynchronizer {
    pub fn new(docs_root: &Path, profile: &SyncProfile) -> Self {
        Self {
            manifest_path: docs_root.join(&profile.structure_file),
            source_prefix: profile.source_prefix.clone(),
            source: Locale::source(),
            targets: profile.navigation_targets.clone(),
        }
    }

    /// Apply the English documentation tree to every target section in place.
    pub fn sync_navigation(&self, docs: &mut Value) -> Result<Vec<String>> {
        let mut log = Vec::new();

        let languages = docs
            .get_mut("navigation")
            .context("Invalid docs.json structure: missing navigation")?
            .get_mut("languages")
            .and_then(Value::as_array_mut)
            .context("No languages found in navigation")?;

        let source_code = self.source.config().navigation_code;
        let source_section = languages
            .iter()
            .find(|section| section_language(section) == Some(source_code))
            .with_context(|| format!("Source section '{}' not found", source_code))?;

        let source_label = self.source.config().documentation_label;
        let Some(source_dropdown) = dropdowns(source_section)
            .iter()
            .find(|d| dropdown_name(d) == Some(source_label))
            .cloned()
        else {
            log.push(format!("No {} dropdown found in the source section", source_label));
            return Ok(log);
        };

        for locale in &self.targets {
            let config = locale.config();
            let Some(section) = languages
                .iter_mut()
                .find(|section| section_language(section) == Some(config.navigation_code))
            else {
                log.push(format!("WARNING: {} section not found", config.navigation_code));
                continue;
            };

            let Some(section) = section.as_object_mut() else {
                continue;
            };
            let section_dropdowns = section
                .entry("dropdowns")
                .or_insert_with(|| Value::Array(Vec::new()));
            if !section_dropdowns.is_array() {
                *section_dropdowns = Value::Array(Vec::new());
            }
            let Some(section_dropdowns) = section_dropdowns.as_array_mut() else {
                continue;
            };

            let existing = section_dropdowns.iter().position(|d| {
                dropdown_name(d).is_some_and(|name| {
                    name == config.documentation_label
                        || config.legacy_documentation_labels.contains(&name)
                })
            });

            let target = match existing {
                Some(index) => {
                    log.push(format!("Updated existing Documentation dropdown for {}", locale));
                    &mut section_dropdowns[index]
                }
                None => {
                    section_dropdowns.push(json!({ "pages": [] }));
                    log.push(format!("Created new Documentation dropdown for {}", locale));
                    let last = section_dropdowns.len() - 1;
                    &mut section_dropdowns[last]
                }
            };

            if let Some(target) = target.as_object_mut() {
                target.insert("dropdown".to_string(), json!(config.documentation_label));
                target.insert("icon".to_string(), json!(DROPDOWN_ICON));
                target.remove("groups");

                if let Some(pages) = source_dropdown.get("pages") {
                    target.insert("pages".to_string(), self.convert_pages(pages, *locale));
                    log.push(format!("Synced documentation structure for {}", locale));
                }
            }
        }

        Ok(log)
    }

    /// Recursively rewrite page paths and group labels for `locale`.
    fn convert_pages(&self, pages: &Value, locale: Locale) -> Value {
        match pages {
            Value::String(path) => match path.strip_prefix(&self.source_prefix) {
                Some(rest) => Value::String(format!("{}/{}", locale.code(), rest)),
                None => pages.clone(),
            },
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| self.convert_pages(item, locale)).collect())
            }
            Value::Object(fields) => {
                let converted: Map<String, Value> = fields
                    .iter()
                    .map(|(key, value)| {
                        let value = match (key.as_str(), value) {
                            ("pages", Value::Array(_)) => self.convert_pages(value, locale),
                            ("group", Value::String(label)) => json!(locale.group_label(label)),
                            _ => value.clone(),
                        };
                        (key.clone(), value)
                    })
                    .collect();
                Value::Object(converted)
            }
            _ => pages.clone(),
        }
    }
}

impl StructureSynchronizer for DocsJsonSynchronizer {
    async fn reconcile(&self) -> Result<Vec<String>> {
        let content = tokio::fs::read_to_string(&self.manifest_path)
            .await
            .with_context(|| format!("Failed to read {}", self.manifest_path.display()))?;
        let mut docs: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.manifest_path.display()))?;
        if !docs.is_object() {
            bail!("Invalid docs.json structure: top level is not an object");
        }

        let before = docs.clone();
        let mut log = self.sync_navigation(&mut docs)?;

        if docs == before {
            debug!("{} already in sync", self.manifest_path.display());
            return Ok(log);
        }

        tokio::fs::write(&self.manifest_path, to_pretty_json(&docs)?)
            .await
            .with_context(|| format!("Failed to write {}", self.manifest_path.display()))?;
        log.push(format!("Updated {} with synced structure", self.manifest_path.display()));
        Ok(log)
    }
}

fn section_language(section: &Value) -> Option<&str> {
    section.get("language").and_then(Value::as_str)
}

fn dropdown_name(dropdown: &Value) -> Option<&str> {
    dropdown.get("dropdown").and_then(Value::as_str)
}

fn dropdowns(section: &Value) -> &[Value] {
    section
        .get("dropdowns")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Four-space indented JSON, non-ASCII kept as is.
fn to_pretty_json(value: &Value) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(String::from_utf8(buf)?)
}
