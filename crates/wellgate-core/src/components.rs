// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Component copy capability interface and per-kind handlers.
//!
//! Some object kinds have children worth copying piecemeal: log curves,
//! trajectory stations. Each kind implements [`ComponentHandler`] and is
//! selected from the [`ComponentRegistry`] by its component-type tag, so
//! adding a kind never touches a central dispatch site.
//!
//! Handlers work on the opaque source document: selected component elements
//! are sliced out of the original text by byte range and re-wrapped in a
//! fresh update document addressed at the target object. The component
//! schema itself stays unmodeled.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use wellgate_witsml::soap::escape_xml;
use wellgate_witsml::{StoreDocument, WitsmlType};

use crate::error::{JobError, Result};
use crate::job::ObjectLocation;
use crate::workers::queries::{SCHEMA_VERSION, WITSML_NS};

/// Kinds of components that can be copied piecemeal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComponentType {
    /// A log curve, identified by its mnemonic.
    LogCurve,
    /// A trajectory station, identified by its uid.
    TrajectoryStation,
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LogCurve => f.write_str("log curve"),
            Self::TrajectoryStation => f.write_str("trajectory station"),
        }
    }
}

/// Capability interface for object kinds with copyable components.
pub trait ComponentHandler: Send + Sync {
    /// The component kind this handler serves.
    fn component_type(&self) -> ComponentType;

    /// The object kind hosting this component kind.
    fn host_type(&self) -> WitsmlType;

    /// Identifiers of the components present in a source document.
    fn component_ids(&self, doc: &StoreDocument) -> Vec<String>;

    /// Build an update document holding only the selected components,
    /// re-parented at `target`.
    fn set_components(
        &self,
        doc: &StoreDocument,
        ids: &[String],
        target: &ObjectLocation,
    ) -> Result<String>;
}

fn wrap_update(
    host: WitsmlType,
    target: &ObjectLocation,
    component_slices: &[&str],
) -> String {
    format!(
        concat!(
            r#"<{container} xmlns="{ns}" version="{version}">"#,
            r#"<{object} uidWell="{well}" uidWellbore="{wellbore}" uid="{uid}">"#,
            "{components}",
            "</{object}>",
            "</{container}>"
        ),
        container = host.container_name(),
        ns = WITSML_NS,
        version = SCHEMA_VERSION,
        object = host.as_str(),
        well = escape_xml(&target.well_uid),
        wellbore = escape_xml(&target.wellbore_uid),
        uid = escape_xml(&target.uid),
        components = component_slices.concat(),
    )
}

/// Slice the source text of every `element` child whose identity (resolved
/// by `identify`) is in `ids`, preserving document order.
fn select_slices<'doc>(
    xml: &'doc str,
    element: &str,
    ids: &[String],
    identify: impl Fn(&roxmltree::Node<'_, '_>) -> Option<String>,
) -> Result<Vec<&'doc str>> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| JobError::NotFound(format!("source document unreadable: {e}")))?;

    let mut found: HashMap<String, &str> = HashMap::new();
    for node in doc.descendants().filter(|n| n.is_element()) {
        if node.tag_name().name() == element
            && let Some(id) = identify(&node)
        {
            found.insert(id, &xml[node.range()]);
        }
    }

    let mut slices = Vec::with_capacity(ids.len());
    for id in ids {
        match found.get(id) {
            Some(slice) => slices.push(*slice),
            None => {
                return Err(JobError::NotFound(format!("component '{id}'")));
            }
        }
    }
    Ok(slices)
}

/// Log curves, identified by mnemonic.
pub struct LogCurveHandler;

impl ComponentHandler for LogCurveHandler {
    fn component_type(&self) -> ComponentType {
        ComponentType::LogCurve
    }

    fn host_type(&self) -> WitsmlType {
        WitsmlType::Log
    }

    fn component_ids(&self, doc: &StoreDocument) -> Vec<String> {
        let Ok(parsed) = roxmltree::Document::parse(&doc.xml) else {
            return Vec::new();
        };
        parsed
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "logCurveInfo")
            .filter_map(|n| {
                n.children()
                    .find(|c| c.is_element() && c.tag_name().name() == "mnemonic")
                    .and_then(|c| c.text())
                    .map(|t| t.trim().to_string())
            })
            .collect()
    }

    fn set_components(
        &self,
        doc: &StoreDocument,
        ids: &[String],
        target: &ObjectLocation,
    ) -> Result<String> {
        let slices = select_slices(&doc.xml, "logCurveInfo", ids, |node| {
            node.children()
                .find(|c| c.is_element() && c.tag_name().name() == "mnemonic")
                .and_then(|c| c.text())
                .map(|t| t.trim().to_string())
        })?;
        Ok(wrap_update(WitsmlType::Log, target, &slices))
    }
}

/// Trajectory stations, identified by uid.
pub struct TrajectoryStationHandler;

impl ComponentHandler for TrajectoryStationHandler {
    fn component_type(&self) -> ComponentType {
        ComponentType::TrajectoryStation
    }

    fn host_type(&self) -> WitsmlType {
        WitsmlType::Trajectory
    }

    fn component_ids(&self, doc: &StoreDocument) -> Vec<String> {
        let Ok(parsed) = roxmltree::Document::parse(&doc.xml) else {
            return Vec::new();
        };
        parsed
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "trajectoryStation")
            .filter_map(|n| n.attribute("uid").map(str::to_string))
            .collect()
    }

    fn set_components(
        &self,
        doc: &StoreDocument,
        ids: &[String],
        target: &ObjectLocation,
    ) -> Result<String> {
        let slices = select_slices(&doc.xml, "trajectoryStation", ids, |node| {
            node.attribute("uid").map(str::to_string)
        })?;
        Ok(wrap_update(WitsmlType::Trajectory, target, &slices))
    }
}

/// Handlers keyed by component-type tag.
pub struct ComponentRegistry {
    handlers: HashMap<ComponentType, Arc<dyn ComponentHandler>>,
}

impl ComponentRegistry {
    /// Registry with the built-in handlers.
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
        };
        registry.register(Arc::new(LogCurveHandler));
        registry.register(Arc::new(TrajectoryStationHandler));
        registry
    }

    /// Register a handler, replacing any previous one for its type.
    pub fn register(&mut self, handler: Arc<dyn ComponentHandler>) {
        self.handlers.insert(handler.component_type(), handler);
    }

    /// Handler for a component type.
    pub fn get(&self, component_type: ComponentType) -> Option<Arc<dyn ComponentHandler>> {
        self.handlers.get(&component_type).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> ObjectLocation {
        ObjectLocation {
            server: "rig-2".to_string(),
            well_uid: "W-9".to_string(),
            wellbore_uid: "WB-9".to_string(),
            uid: "L-9".to_string(),
        }
    }

    fn log_doc() -> StoreDocument {
        StoreDocument {
            object_type: WitsmlType::Log,
            xml: concat!(
                r#"<logs version="1.4.1.1">"#,
                r#"<log uidWell="W-1" uidWellbore="WB-1" uid="L-1">"#,
                r#"<logCurveInfo uid="c1"><mnemonic>DEPTH</mnemonic><unit>m</unit></logCurveInfo>"#,
                r#"<logCurveInfo uid="c2"><mnemonic>ROP</mnemonic><unit>m/h</unit></logCurveInfo>"#,
                r#"<logCurveInfo uid="c3"><mnemonic>WOB</mnemonic><unit>kkgf</unit></logCurveInfo>"#,
                "</log></logs>"
            )
            .to_string(),
            partial: false,
        }
    }

    #[test]
    fn test_log_curve_ids_are_mnemonics() {
        let ids = LogCurveHandler.component_ids(&log_doc());
        assert_eq!(ids, vec!["DEPTH", "ROP", "WOB"]);
    }

    #[test]
    fn test_set_components_selects_and_reparents() {
        let update = LogCurveHandler
            .set_components(&log_doc(), &["ROP".to_string()], &target())
            .unwrap();
        assert!(update.contains(r#"uidWell="W-9""#));
        assert!(update.contains(r#"uid="L-9""#));
        assert!(update.contains("<mnemonic>ROP</mnemonic>"));
        assert!(!update.contains("<mnemonic>WOB</mnemonic>"));
        // Still well-formed.
        assert!(roxmltree::Document::parse(&update).is_ok());
    }

    #[test]
    fn test_missing_component_is_not_found() {
        let err = LogCurveHandler
            .set_components(&log_doc(), &["GR".to_string()], &target())
            .unwrap_err();
        assert!(matches!(err, JobError::NotFound(_)));
        assert!(err.to_string().contains("GR"));
    }

    #[test]
    fn test_trajectory_station_ids_are_uids() {
        let doc = StoreDocument {
            object_type: WitsmlType::Trajectory,
            xml: concat!(
                r#"<trajectorys><trajectory uid="T-1">"#,
                r#"<trajectoryStation uid="s1"><md uom="m">100</md></trajectoryStation>"#,
                r#"<trajectoryStation uid="s2"><md uom="m">130</md></trajectoryStation>"#,
                "</trajectory></trajectorys>"
            )
            .to_string(),
            partial: false,
        };
        assert_eq!(
            TrajectoryStationHandler.component_ids(&doc),
            vec!["s1", "s2"]
        );
    }

    #[test]
    fn test_registry_dispatch() {
        let registry = ComponentRegistry::with_defaults();
        assert!(registry.get(ComponentType::LogCurve).is_some());
        assert_eq!(
            registry
                .get(ComponentType::TrajectoryStation)
                .unwrap()
                .host_type(),
            WitsmlType::Trajectory
        );
    }
}
