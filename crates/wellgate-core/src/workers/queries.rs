// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Minimal query shells the framework builds for its own orchestration.
//!
//! Rich per-entity query shapes are the submitting layer's business; the
//! framework only ever needs identity shells (visibility polling, parent
//! resolution, deletes by uid) and index-range bounds for log-data jobs.

use wellgate_witsml::soap::escape_xml;
use wellgate_witsml::{Index, StoreDocument, StoreQuery, WitsmlType};

use crate::job::ObjectLocation;

/// Namespace of WITSML 1.x object documents.
pub const WITSML_NS: &str = "http://www.witsml.org/schemas/1series";

/// Schema version stamped on framework-built documents.
pub const SCHEMA_VERSION: &str = "1.4.1.1";

fn container_open(object_type: WitsmlType) -> String {
    format!(
        r#"<{name} xmlns="{WITSML_NS}" version="{SCHEMA_VERSION}">"#,
        name = object_type.container_name()
    )
}

fn object_element(
    object_type: WitsmlType,
    well_uid: Option<&str>,
    wellbore_uid: Option<&str>,
    uid: &str,
    body: &str,
) -> String {
    let mut attrs = String::new();
    if let Some(well) = well_uid {
        attrs.push_str(&format!(r#" uidWell="{}""#, escape_xml(well)));
    }
    if let Some(wellbore) = wellbore_uid {
        attrs.push_str(&format!(r#" uidWellbore="{}""#, escape_xml(wellbore)));
    }
    attrs.push_str(&format!(r#" uid="{}""#, escape_xml(uid)));

    let name = object_type.as_str();
    if body.is_empty() {
        format!("<{name}{attrs} />")
    } else {
        format!("<{name}{attrs}>{body}</{name}>")
    }
}

/// Identity shell addressing one object. Parent uids are included only for
/// the kinds that carry them (wells have none, wellbores a well, everything
/// else both).
pub fn id_query(
    object_type: WitsmlType,
    well_uid: Option<&str>,
    wellbore_uid: Option<&str>,
    uid: &str,
) -> StoreQuery {
    ids_query(object_type, well_uid, wellbore_uid, std::slice::from_ref(&uid))
}

/// Identity shell addressing several sibling objects in one document.
pub fn ids_query<S: AsRef<str>>(
    object_type: WitsmlType,
    well_uid: Option<&str>,
    wellbore_uid: Option<&str>,
    uids: &[S],
) -> StoreQuery {
    let mut xml = container_open(object_type);
    for uid in uids {
        xml.push_str(&object_element(
            object_type,
            well_uid,
            wellbore_uid,
            uid.as_ref(),
            "",
        ));
    }
    xml.push_str(&format!("</{}>", object_type.container_name()));
    StoreQuery::new(object_type, xml)
}

/// True when `doc` holds an object of its own kind with the given uid.
pub fn document_contains_object(doc: &StoreDocument, uid: &str) -> bool {
    let Ok(parsed) = roxmltree::Document::parse(&doc.xml) else {
        return false;
    };
    parsed.descendants().any(|n| {
        n.is_element()
            && n.tag_name().name() == doc.object_type.as_str()
            && n.attribute("uid") == Some(uid)
    })
}

/// Replace every ` attr="..."` occurrence's value in `xml`.
fn replace_attr_values(xml: &str, attr: &str, value: &str) -> String {
    let needle = format!(" {attr}=\"");
    let escaped = escape_xml(value);
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;
    while let Some(pos) = rest.find(&needle) {
        let after = pos + needle.len();
        out.push_str(&rest[..after]);
        out.push_str(&escaped);
        match rest[after..].find('"') {
            Some(end) => rest = &rest[after + end..],
            None => {
                // Unterminated attribute; bail out with the tail untouched.
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Substitute the source parent identifiers with the target's before writing
/// a copied document to the destination server.
pub fn substitute_parent_uids(xml: &str, well_uid: &str, wellbore_uid: Option<&str>) -> String {
    let mut out = replace_attr_values(xml, "uidWell", well_uid);
    if let Some(wellbore) = wellbore_uid {
        out = replace_attr_values(&out, "uidWellbore", wellbore);
    }
    out
}

fn index_bounds(start: &Index, end: &Index) -> String {
    match (start, end) {
        (Index::Depth { uom, .. }, Index::Depth { .. }) => format!(
            r#"<startIndex uom="{uom}">{start}</startIndex><endIndex uom="{uom}">{end}</endIndex>"#,
            uom = escape_xml(uom),
            start = start.to_query_value(),
            end = end.to_query_value(),
        ),
        _ => format!(
            "<startDateTimeIndex>{}</startDateTimeIndex><endDateTimeIndex>{}</endDateTimeIndex>",
            start.to_query_value(),
            end.to_query_value(),
        ),
    }
}

/// Data-range query for a log: the identity shell plus start/end bounds
/// formatted per the index kind.
pub fn log_data_range_query(log: &ObjectLocation, start: &Index, end: &Index) -> StoreQuery {
    let body = index_bounds(start, end);
    let xml = format!(
        "{open}{object}{close}",
        open = container_open(WitsmlType::Log),
        object = object_element(
            WitsmlType::Log,
            Some(&log.well_uid),
            Some(&log.wellbore_uid),
            &log.uid,
            &body,
        ),
        close = format!("</{}>", WitsmlType::Log.container_name()),
    );
    StoreQuery::new(WitsmlType::Log, xml)
}

/// Delete queries trimming a log to `[keep_start, keep_end]`: one removing
/// everything before the kept range, one removing everything after it.
pub fn log_trim_queries(
    log: &ObjectLocation,
    keep_start: &Index,
    keep_end: &Index,
) -> (StoreQuery, StoreQuery) {
    let before = match keep_start {
        Index::Depth { uom, .. } => format!(
            r#"<endIndex uom="{}">{}</endIndex>"#,
            escape_xml(uom),
            keep_start.to_query_value()
        ),
        Index::DateTime { .. } => format!(
            "<endDateTimeIndex>{}</endDateTimeIndex>",
            keep_start.to_query_value()
        ),
    };
    let after = match keep_end {
        Index::Depth { uom, .. } => format!(
            r#"<startIndex uom="{}">{}</startIndex>"#,
            escape_xml(uom),
            keep_end.to_query_value()
        ),
        Index::DateTime { .. } => format!(
            "<startDateTimeIndex>{}</startDateTimeIndex>",
            keep_end.to_query_value()
        ),
    };

    let build = |body: &str| {
        let xml = format!(
            "{open}{object}</logs>",
            open = container_open(WitsmlType::Log),
            object = object_element(
                WitsmlType::Log,
                Some(&log.well_uid),
                Some(&log.wellbore_uid),
                &log.uid,
                body,
            ),
        );
        StoreQuery::new(WitsmlType::Log, xml)
    };
    (build(&before), build(&after))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> ObjectLocation {
        ObjectLocation {
            server: "rig-1".to_string(),
            well_uid: "W-1".to_string(),
            wellbore_uid: "WB-1".to_string(),
            uid: "L-1".to_string(),
        }
    }

    #[test]
    fn test_well_id_query_has_no_parent_uids() {
        let query = id_query(WitsmlType::Well, None, None, "W-1");
        assert_eq!(
            query.xml(),
            format!(
                r#"<wells xmlns="{WITSML_NS}" version="{SCHEMA_VERSION}"><well uid="W-1" /></wells>"#
            )
        );
    }

    #[test]
    fn test_object_id_query_carries_both_parents() {
        let query = id_query(WitsmlType::Log, Some("W-1"), Some("WB-1"), "L-1");
        assert!(
            query
                .xml()
                .contains(r#"<log uidWell="W-1" uidWellbore="WB-1" uid="L-1" />"#)
        );
    }

    #[test]
    fn test_ids_query_lists_siblings() {
        let query = ids_query(
            WitsmlType::Rig,
            Some("W-1"),
            Some("WB-1"),
            &["R-1", "R-2"],
        );
        assert!(query.xml().contains(r#"uid="R-1""#));
        assert!(query.xml().contains(r#"uid="R-2""#));
        assert!(roxmltree::Document::parse(query.xml()).is_ok());
    }

    #[test]
    fn test_uid_values_are_escaped() {
        let query = id_query(WitsmlType::Well, None, None, r#"W"1<>"#);
        assert!(query.xml().contains("uid=\"W&quot;1&lt;&gt;\""));
        assert!(roxmltree::Document::parse(query.xml()).is_ok());
    }

    #[test]
    fn test_document_contains_object() {
        let doc = StoreDocument {
            object_type: WitsmlType::Well,
            xml: r#"<wells><well uid="W-1"/><well uid="W-2"/></wells>"#.to_string(),
            partial: false,
        };
        assert!(document_contains_object(&doc, "W-1"));
        assert!(document_contains_object(&doc, "W-2"));
        assert!(!document_contains_object(&doc, "W-3"));
        assert!(!document_contains_object(
            &StoreDocument::empty(WitsmlType::Well),
            "W-1"
        ));
    }

    #[test]
    fn test_substitute_parent_uids() {
        let xml = concat!(
            r#"<logs><log uidWell="W-1" uidWellbore="WB-1" uid="L-1">"#,
            r#"<logCurveInfo uid="c1"/></log></logs>"#
        );
        let out = substitute_parent_uids(xml, "W-9", Some("WB-9"));
        assert!(out.contains(r#"uidWell="W-9""#));
        assert!(out.contains(r#"uidWellbore="WB-9""#));
        // Object and component uids stay untouched.
        assert!(out.contains(r#"uid="L-1""#));
        assert!(out.contains(r#"uid="c1""#));
    }

    #[test]
    fn test_substitute_leaves_uidwellbore_alone_when_not_requested() {
        let xml = r#"<wellbores><wellbore uidWell="W-1" uid="WB-1"/></wellbores>"#;
        let out = substitute_parent_uids(xml, "W-9", None);
        assert!(out.contains(r#"uidWell="W-9""#));
        assert!(out.contains(r#"uid="WB-1""#));
    }

    #[test]
    fn test_depth_range_query_bounds() {
        let query = log_data_range_query(
            &location(),
            &Index::depth(1500.0, "m"),
            &Index::depth(1600.5, "m"),
        );
        assert!(query.xml().contains(r#"<startIndex uom="m">1500</startIndex>"#));
        assert!(query.xml().contains(r#"<endIndex uom="m">1600.5</endIndex>"#));
    }

    #[test]
    fn test_datetime_range_query_bounds() {
        let start = Index::parse_date_time("2024-03-15T12:00:00.000Z").unwrap();
        let end = Index::parse_date_time("2024-03-15T18:00:00.000Z").unwrap();
        let query = log_data_range_query(&location(), &start, &end);
        assert!(
            query
                .xml()
                .contains("<startDateTimeIndex>2024-03-15T12:00:00.000Z</startDateTimeIndex>")
        );
        assert!(
            query
                .xml()
                .contains("<endDateTimeIndex>2024-03-15T18:00:00.000Z</endDateTimeIndex>")
        );
    }

    #[test]
    fn test_trim_queries_bracket_the_kept_range() {
        let (before, after) = log_trim_queries(
            &location(),
            &Index::depth(1000.0, "m"),
            &Index::depth(2000.0, "m"),
        );
        assert!(before.xml().contains(r#"<endIndex uom="m">1000</endIndex>"#));
        assert!(!before.xml().contains("<startIndex"));
        assert!(after.xml().contains(r#"<startIndex uom="m">2000</startIndex>"#));
        assert!(!after.xml().contains("<endIndex"));
    }
}
