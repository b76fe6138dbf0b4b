// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Energy dashboard discovery and selection.
//!
//! The host's configuration document has no fixed schema. Dashboards are
//! found by a recursive walk that looks for objects shaped like energy
//! preferences, remembering the nearest identifier and name seen on the way
//! down.

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::errors::{ReportError, ReportResult};
use crate::traits::EnergyConfigProvider;

const ID_KEYS: [&str; 4] = ["dashboard_id", "id", "slug", "key"];
const NAME_KEYS: [&str; 3] = ["name", "title", "label"];
const NESTING_KEYS: [&str; 3] = ["preferences", "dashboards", "dashboard"];
const PREFERENCE_KEYS: [&str; 2] = ["energy_sources", "device_consumption"];
const DEFAULT_MARKER_KEYS: [&str; 3] = ["selected_dashboard", "default_dashboard", "active_dashboard"];

/// One resolved energy dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSelection {
    pub identifier: Option<String>,
    pub name: Option<String>,
    pub preferences: Value,
}

impl DashboardSelection {
    /// `name (identifier)`, or whichever part is present
    pub fn label(&self) -> Option<String> {
        match (self.name.as_deref(), self.identifier.as_deref()) {
            (Some(name), Some(identifier)) => {
                if normalize_key(name) == normalize_key(identifier) {
                    Some(name.to_owned())
                } else {
                    Some(format!("{name} ({identifier})"))
                }
            }
            (Some(name), None) => Some(name.to_owned()),
            (None, Some(identifier)) => Some(identifier.to_owned()),
            (None, None) => None,
        }
    }

    fn matches(&self, requested: &str) -> bool {
        [self.identifier.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .filter_map(normalize_key)
            .any(|candidate| candidate == requested)
    }
}

/// Both preference collections present
pub fn is_energy_preferences(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|object| PREFERENCE_KEYS.iter().all(|key| object.contains_key(*key)))
}

/// Trim and casefold; blank keys normalize to nothing
pub fn normalize_key(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Nearest enclosing identifier and name
#[derive(Debug, Clone, Default)]
struct WalkContext {
    identifier: Option<String>,
    name: Option<String>,
}

impl WalkContext {
    fn refine(&self, object: &Map<String, Value>) -> Self {
        let identifier = ID_KEYS
            .iter()
            .find_map(|key| object.get(*key).and_then(scalar_to_string))
            .or_else(|| self.identifier.clone());

        let name = NAME_KEYS
            .iter()
            .find_map(|key| {
                object
                    .get(*key)
                    .and_then(Value::as_str)
                    .filter(|name| !name.trim().is_empty())
                    .map(str::to_owned)
            })
            .or_else(|| self.name.clone());

        Self { identifier, name }
    }

    fn with_identifier(&self, identifier: &str) -> Self {
        Self {
            identifier: Some(identifier.to_owned()),
            name: self.name.clone(),
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn walk(value: &Value, context: &WalkContext, found: &mut Vec<DashboardSelection>) {
    if is_energy_preferences(value) {
        found.push(DashboardSelection {
            identifier: context.identifier.clone(),
            name: context.name.clone(),
            preferences: value.clone(),
        });
        return;
    }

    match value {
        Value::Object(object) => {
            let current = context.refine(object);

            for key in NESTING_KEYS {
                if let Some(nested) = object.get(key) {
                    walk(nested, &current, found);
                }
            }

            for (key, child) in object {
                if NESTING_KEYS.contains(&key.as_str()) || PREFERENCE_KEYS.contains(&key.as_str())
                {
                    continue;
                }
                if !(child.is_object() || child.is_array()) {
                    continue;
                }
                // Map keys often are the dashboard identifiers themselves
                let child_context = if NAME_KEYS.contains(&key.as_str()) {
                    current.clone()
                } else {
                    current.with_identifier(key)
                };
                walk(child, &child_context, found);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, context, found);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }
}

fn discover(value: &Value, context: &WalkContext) -> Vec<DashboardSelection> {
    let mut found = Vec::new();
    walk(value, context, &mut found);

    let mut deduped: Vec<DashboardSelection> = Vec::with_capacity(found.len());
    for selection in found {
        let duplicate = deduped
            .iter()
            .any(|seen| seen.identifier == selection.identifier && seen.name == selection.name);
        if !duplicate {
            deduped.push(selection);
        }
    }
    deduped
}

/// Every valid dashboard in the document, first occurrence wins
pub fn discover_dashboards(document: &Value) -> Vec<DashboardSelection> {
    discover(document, &WalkContext::default())
}

fn pick_default(document: &Value, dashboards: &[DashboardSelection]) -> Option<DashboardSelection> {
    let markers = document.as_object()?;
    DEFAULT_MARKER_KEYS.iter().find_map(|key| {
        let requested = markers.get(*key).and_then(scalar_to_string)?;
        let requested = normalize_key(&requested)?;
        dashboards
            .iter()
            .find(|dashboard| dashboard.matches(&requested))
            .cloned()
    })
}

/// Interpret the host-side lookup answer for `requested`
fn from_fetched(fetched: &Value, requested: &str) -> Option<DashboardSelection> {
    let context = WalkContext {
        identifier: Some(requested.to_owned()),
        name: None,
    };
    let candidates = discover(fetched, &context);
    let normalized = normalize_key(requested);

    let chosen = normalized
        .as_deref()
        .and_then(|wanted| candidates.iter().find(|c| c.matches(wanted)))
        .or_else(|| candidates.first())
        .cloned();

    chosen.map(|mut selection| {
        if selection.identifier.is_none() {
            selection.identifier = Some(requested.to_owned());
        }
        selection
    })
}

/// Resolve exactly one dashboard for a report.
///
/// A requested identifier or name is matched after normalization against the
/// discovered dashboards, then against the host-side lookup. Without a
/// request the host's default marker is honoured, else the first dashboard.
pub async fn select_dashboard(
    provider: &dyn EnergyConfigProvider,
    requested: Option<&str>,
) -> ReportResult<DashboardSelection> {
    let document = provider.energy_document().await?;
    let dashboards = discover_dashboards(&document);
    debug!(
        "Discovered {} energy dashboard(s) via {}",
        dashboards.len(),
        provider.name()
    );

    if let Some(requested) = requested.filter(|r| !r.trim().is_empty()) {
        if let Some(normalized) = normalize_key(requested)
            && let Some(selection) = dashboards.iter().find(|d| d.matches(&normalized))
        {
            return Ok(selection.clone());
        }

        match provider.fetch_dashboard(requested.trim()).await {
            Ok(Some(fetched)) => {
                if let Some(selection) = from_fetched(&fetched, requested.trim()) {
                    info!("Dashboard '{requested}' resolved through host lookup");
                    return Ok(selection);
                }
            }
            Ok(None) => {}
            Err(e) => debug!("Host lookup for dashboard '{requested}' failed: {e}"),
        }

        return Err(ReportError::DashboardNotFound(requested.to_owned()));
    }

    if let Some(selection) = pick_default(&document, &dashboards) {
        return Ok(selection);
    }

    dashboards
        .into_iter()
        .next()
        .ok_or(ReportError::NoDashboardConfigured)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreError;
    use async_trait::async_trait;
    use serde_json::json;

    fn prefs(tag: &str) -> Value {
        json!({
            "energy_sources": [{"type": "solar", "stat_energy_from": format!("sensor.{tag}")}],
            "device_consumption": []
        })
    }

    struct StaticProvider {
        document: Value,
        fetched: Option<Value>,
    }

    #[async_trait]
    impl EnergyConfigProvider for StaticProvider {
        async fn energy_document(&self) -> Result<Value, StoreError> {
            Ok(self.document.clone())
        }

        async fn fetch_dashboard(&self, _requested: &str) -> Result<Option<Value>, StoreError> {
            Ok(self.fetched.clone())
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    #[test]
    fn test_shape_predicate_requires_both_keys() {
        assert!(is_energy_preferences(&prefs("pv")));
        assert!(!is_energy_preferences(&json!({"energy_sources": []})));
        assert!(!is_energy_preferences(&json!({"device_consumption": []})));
        assert!(discover_dashboards(&json!({"energy_sources": []})).is_empty());
    }

    #[test]
    fn test_discovers_nested_dashboards_with_context() {
        let document = json!({
            "dashboards": [
                {"id": "home", "name": "Maison", "preferences": prefs("home")},
                {"slug": "office", "title": "Bureau", "data": {"preferences": prefs("office")}}
            ],
            "by_key": {
                "garage": prefs("garage")
            }
        });

        let found = discover_dashboards(&document);
        let labels: Vec<_> = found
            .iter()
            .map(|d| (d.identifier.as_deref(), d.name.as_deref()))
            .collect();

        assert_eq!(
            labels,
            vec![
                (Some("home"), Some("Maison")),
                (Some("data"), Some("Bureau")),
                (Some("garage"), None),
            ]
        );
    }

    #[test]
    fn test_duplicates_keep_first() {
        let document = json!({
            "dashboards": [
                {"id": "home", "preferences": prefs("first")},
                {"id": "home", "preferences": prefs("second")}
            ]
        });

        let found = discover_dashboards(&document);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].preferences, prefs("first"));
    }

    #[test]
    fn test_label_formats() {
        let mut selection = DashboardSelection {
            identifier: Some("home".to_owned()),
            name: Some("Maison".to_owned()),
            preferences: prefs("x"),
        };
        assert_eq!(selection.label().unwrap(), "Maison (home)");

        selection.name = Some(" HOME ".to_owned());
        assert_eq!(selection.label().unwrap(), " HOME ");

        selection.name = None;
        assert_eq!(selection.label().unwrap(), "home");
    }

    #[tokio::test]
    async fn test_requested_dashboard_matches_name_casefolded() {
        let provider = StaticProvider {
            document: json!({"dashboards": [
                {"id": "home", "name": "Maison", "preferences": prefs("home")},
                {"id": "office", "name": "Bureau", "preferences": prefs("office")}
            ]}),
            fetched: None,
        };

        let selection = select_dashboard(&provider, Some("  bureau ")).await.unwrap();
        assert_eq!(selection.identifier.as_deref(), Some("office"));
    }

    #[tokio::test]
    async fn test_unknown_dashboard_is_not_found() {
        let provider = StaticProvider {
            document: json!({"dashboards": [{"id": "home", "preferences": prefs("home")}]}),
            fetched: None,
        };

        let err = select_dashboard(&provider, Some("cellar")).await.unwrap_err();
        assert!(matches!(err, ReportError::DashboardNotFound(name) if name == "cellar"));
    }

    #[tokio::test]
    async fn test_host_lookup_fallback() {
        let provider = StaticProvider {
            document: json!({"dashboards": []}),
            fetched: Some(prefs("cellar")),
        };

        let selection = select_dashboard(&provider, Some("cellar")).await.unwrap();
        assert_eq!(selection.identifier.as_deref(), Some("cellar"));
        assert_eq!(selection.preferences, prefs("cellar"));
    }

    #[tokio::test]
    async fn test_default_marker_then_first() {
        let document = json!({
            "default_dashboard": "office",
            "dashboards": [
                {"id": "home", "preferences": prefs("home")},
                {"id": "office", "preferences": prefs("office")}
            ]
        });
        let provider = StaticProvider {
            document,
            fetched: None,
        };
        let selection = select_dashboard(&provider, None).await.unwrap();
        assert_eq!(selection.identifier.as_deref(), Some("office"));

        let provider = StaticProvider {
            document: json!({"dashboards": [
                {"id": "home", "preferences": prefs("home")},
                {"id": "office", "preferences": prefs("office")}
            ]}),
            fetched: None,
        };
        let selection = select_dashboard(&provider, None).await.unwrap();
        assert_eq!(selection.identifier.as_deref(), Some("home"));
    }

    #[tokio::test]
    async fn test_nothing_configured() {
        let provider = StaticProvider {
            document: json!({"energy_sources": [], "other": {}}),
            fetched: None,
        };
        let err = select_dashboard(&provider, None).await.unwrap_err();
        assert!(matches!(err, ReportError::NoDashboardConfigured));
    }

    #[tokio::test]
    async fn test_top_level_preferences_blob() {
        let provider = StaticProvider {
            document: prefs("single"),
            fetched: None,
        };
        let selection = select_dashboard(&provider, None).await.unwrap();
        assert_eq!(selection.identifier, None);
        assert_eq!(selection.label(), None);
    }
}
