// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! SOAP envelope construction and response parsing for the WMLS operations.
//!
//! The store speaks six operations over a single POST endpoint, each wrapped
//! in a SOAP 1.1 envelope. Only the handful of scalar fields around the
//! payload are modeled; query documents pass through opaque and escaped.

use crate::error::{Result, WitsmlError};

/// SOAP action URI prefix for the store service.
const ACTION_PREFIX: &str = "http://www.witsml.org/action/120/Store";

/// XML namespace of the store service operations.
const STORE_NS: &str = "http://www.witsml.org/wsdl/120";

/// The six WMLS store operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    /// `WMLS_AddToStore`
    AddToStore,
    /// `WMLS_GetFromStore`
    GetFromStore,
    /// `WMLS_UpdateInStore`
    UpdateInStore,
    /// `WMLS_DeleteFromStore`
    DeleteFromStore,
    /// `WMLS_GetCap`
    GetCap,
    /// `WMLS_GetBaseMsg`
    GetBaseMsg,
}

impl StoreOperation {
    /// Wire name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddToStore => "WMLS_AddToStore",
            Self::GetFromStore => "WMLS_GetFromStore",
            Self::UpdateInStore => "WMLS_UpdateInStore",
            Self::DeleteFromStore => "WMLS_DeleteFromStore",
            Self::GetCap => "WMLS_GetCap",
            Self::GetBaseMsg => "WMLS_GetBaseMsg",
        }
    }

    /// Value for the `SOAPAction` header.
    pub fn soap_action(&self) -> String {
        format!("{ACTION_PREFIX}.{}", self.name())
    }

    /// Element carrying the opaque payload document. Add/Update send the
    /// object itself (`XMLin`); Get/Delete send a query (`QueryIn`).
    fn payload_field(&self) -> &'static str {
        match self {
            Self::AddToStore | Self::UpdateInStore => "XMLin",
            Self::GetFromStore | Self::DeleteFromStore => "QueryIn",
            Self::GetCap | Self::GetBaseMsg => unreachable!("no payload field"),
        }
    }

    /// Element carrying the response document, if the operation has one.
    fn out_field(&self) -> Option<&'static str> {
        match self {
            Self::GetFromStore => Some("XMLout"),
            Self::GetCap => Some("CapabilitiesOut"),
            _ => None,
        }
    }
}

/// Outcome decoded from a WMLS response envelope.
#[derive(Debug, Clone)]
pub struct ProtocolOutcome {
    /// Signed result code; positive is success.
    pub result_code: i16,
    /// Response document (`XMLout` / `CapabilitiesOut`), when present.
    pub xml_out: Option<String>,
    /// Server-supplied supplementary message.
    pub supp_msg_out: String,
}

/// Escape a string for embedding in an XML text node or attribute value.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn envelope(body: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">"#,
            "<soap:Body>{}</soap:Body>",
            "</soap:Envelope>"
        ),
        body
    )
}

/// Build the request envelope for one of the four store verbs.
pub(crate) fn build_store_request(
    operation: StoreOperation,
    wml_type: &str,
    payload: &str,
    options: &str,
    capabilities: &str,
) -> String {
    let name = operation.name();
    envelope(&format!(
        concat!(
            r#"<{name} xmlns="{ns}">"#,
            "<WMLtypeIn>{wml_type}</WMLtypeIn>",
            "<{payload_field}>{payload}</{payload_field}>",
            "<OptionsIn>{options}</OptionsIn>",
            "<CapabilitiesIn>{capabilities}</CapabilitiesIn>",
            "</{name}>"
        ),
        name = name,
        ns = STORE_NS,
        wml_type = escape_xml(wml_type),
        payload_field = operation.payload_field(),
        payload = escape_xml(payload),
        options = escape_xml(options),
        capabilities = escape_xml(capabilities),
    ))
}

/// Build the request envelope for the capability probe.
pub(crate) fn build_get_cap(options: &str) -> String {
    envelope(&format!(
        concat!(
            r#"<WMLS_GetCap xmlns="{ns}">"#,
            "<OptionsIn>{options}</OptionsIn>",
            "</WMLS_GetCap>"
        ),
        ns = STORE_NS,
        options = escape_xml(options),
    ))
}

/// Build the request envelope for base-message resolution.
pub(crate) fn build_get_base_msg(code: i16) -> String {
    envelope(&format!(
        concat!(
            r#"<WMLS_GetBaseMsg xmlns="{ns}">"#,
            "<ReturnValueIn>{code}</ReturnValueIn>",
            "</WMLS_GetBaseMsg>"
        ),
        ns = STORE_NS,
        code = code,
    ))
}

fn find_element<'a>(
    doc: &'a roxmltree::Document<'a>,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'a>> {
    doc.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == local_name)
}

fn check_fault(doc: &roxmltree::Document<'_>) -> Result<()> {
    if let Some(fault) = find_element(doc, "Fault") {
        let reason = fault
            .descendants()
            .find(|n| n.is_element() && n.tag_name().name() == "faultstring")
            .and_then(|n| n.text())
            .unwrap_or("unspecified fault")
            .trim()
            .to_string();
        return Err(WitsmlError::Envelope(format!("SOAP fault: {reason}")));
    }
    Ok(())
}

/// Decode a WMLS response envelope into a [`ProtocolOutcome`].
pub(crate) fn parse_outcome(operation: StoreOperation, body: &str) -> Result<ProtocolOutcome> {
    let doc = roxmltree::Document::parse(body)
        .map_err(|e| WitsmlError::Envelope(format!("unparsable response: {e}")))?;
    check_fault(&doc)?;

    let response_name = format!("{}Response", operation.name());
    let response = find_element(&doc, &response_name).ok_or_else(|| {
        WitsmlError::Envelope(format!("missing {response_name} element"))
    })?;

    let result_name = format!("{}Result", operation.name());
    let result_code = response
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == result_name)
        .and_then(|n| n.text())
        .map(str::trim)
        .ok_or_else(|| WitsmlError::Envelope(format!("missing {result_name} element")))?
        .parse::<i16>()
        .map_err(|e| WitsmlError::Envelope(format!("non-numeric result code: {e}")))?;

    let xml_out = operation.out_field().and_then(|field| {
        response
            .children()
            .find(|n| n.is_element() && n.tag_name().name() == field)
            .and_then(|n| n.text())
            .map(str::to_string)
    });

    let supp_msg_out = response
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == "SuppMsgOut")
        .and_then(|n| n.text())
        .map(str::trim)
        .unwrap_or("")
        .to_string();

    Ok(ProtocolOutcome {
        result_code,
        xml_out,
        supp_msg_out,
    })
}

/// Decode a `WMLS_GetBaseMsg` response into its message string.
pub(crate) fn parse_base_msg(body: &str) -> Result<String> {
    let doc = roxmltree::Document::parse(body)
        .map_err(|e| WitsmlError::Envelope(format!("unparsable response: {e}")))?;
    check_fault(&doc)?;

    find_element(&doc, "WMLS_GetBaseMsgResult")
        .and_then(|n| n.text())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| WitsmlError::Envelope("missing WMLS_GetBaseMsgResult element".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_envelope(body: &str) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="utf-8"?>"#,
                r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">"#,
                "<soap:Body>{}</soap:Body>",
                "</soap:Envelope>"
            ),
            body
        )
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(
            escape_xml(r#"<well uid="a&b">'deep'</well>"#),
            "&lt;well uid=&quot;a&amp;b&quot;&gt;&apos;deep&apos;&lt;/well&gt;"
        );
        assert_eq!(escape_xml("plain"), "plain");
    }

    #[test]
    fn test_soap_action_values() {
        assert_eq!(
            StoreOperation::GetFromStore.soap_action(),
            "http://www.witsml.org/action/120/Store.WMLS_GetFromStore"
        );
        assert_eq!(
            StoreOperation::AddToStore.soap_action(),
            "http://www.witsml.org/action/120/Store.WMLS_AddToStore"
        );
    }

    #[test]
    fn test_build_store_request_fields() {
        let body = build_store_request(
            StoreOperation::GetFromStore,
            "well",
            r#"<wells><well uid="W-1"/></wells>"#,
            "returnElements=id-only",
            "<capClients/>",
        );
        assert!(body.contains("<WMLS_GetFromStore"));
        assert!(body.contains("<WMLtypeIn>well</WMLtypeIn>"));
        // The payload travels escaped inside QueryIn.
        assert!(body.contains("<QueryIn>&lt;wells&gt;"));
        assert!(body.contains("<OptionsIn>returnElements=id-only</OptionsIn>"));
        assert!(body.contains("<CapabilitiesIn>&lt;capClients/&gt;</CapabilitiesIn>"));
    }

    #[test]
    fn test_add_uses_xmlin_field() {
        let body = build_store_request(
            StoreOperation::AddToStore,
            "well",
            "<wells/>",
            "returnElements=requested",
            "",
        );
        assert!(body.contains("<XMLin>"));
        assert!(!body.contains("<QueryIn>"));
    }

    #[test]
    fn test_parse_get_outcome() {
        let body = response_envelope(concat!(
            r#"<WMLS_GetFromStoreResponse xmlns="http://www.witsml.org/wsdl/120">"#,
            "<WMLS_GetFromStoreResult>1</WMLS_GetFromStoreResult>",
            "<XMLout>&lt;wells/&gt;</XMLout>",
            "<SuppMsgOut></SuppMsgOut>",
            "</WMLS_GetFromStoreResponse>"
        ));
        let outcome = parse_outcome(StoreOperation::GetFromStore, &body).unwrap();
        assert_eq!(outcome.result_code, 1);
        assert_eq!(outcome.xml_out.as_deref(), Some("<wells/>"));
        assert_eq!(outcome.supp_msg_out, "");
    }

    #[test]
    fn test_parse_failure_outcome() {
        let body = response_envelope(concat!(
            "<WMLS_AddToStoreResponse>",
            "<WMLS_AddToStoreResult>-415</WMLS_AddToStoreResult>",
            "<SuppMsgOut>uid missing on well</SuppMsgOut>",
            "</WMLS_AddToStoreResponse>"
        ));
        let outcome = parse_outcome(StoreOperation::AddToStore, &body).unwrap();
        assert_eq!(outcome.result_code, -415);
        assert_eq!(outcome.xml_out, None);
        assert_eq!(outcome.supp_msg_out, "uid missing on well");
    }

    #[test]
    fn test_parse_get_cap_outcome() {
        let body = response_envelope(concat!(
            "<WMLS_GetCapResponse>",
            "<WMLS_GetCapResult>1</WMLS_GetCapResult>",
            "<CapabilitiesOut>&lt;capServers/&gt;</CapabilitiesOut>",
            "<SuppMsgOut/>",
            "</WMLS_GetCapResponse>"
        ));
        let outcome = parse_outcome(StoreOperation::GetCap, &body).unwrap();
        assert_eq!(outcome.result_code, 1);
        assert_eq!(outcome.xml_out.as_deref(), Some("<capServers/>"));
    }

    #[test]
    fn test_parse_base_msg() {
        let body = response_envelope(concat!(
            "<WMLS_GetBaseMsgResponse>",
            "<WMLS_GetBaseMsgResult> Input XML document is not valid </WMLS_GetBaseMsgResult>",
            "</WMLS_GetBaseMsgResponse>"
        ));
        assert_eq!(
            parse_base_msg(&body).unwrap(),
            "Input XML document is not valid"
        );
    }

    #[test]
    fn test_parse_soap_fault() {
        let body = response_envelope(concat!(
            "<soap:Fault>",
            "<faultcode>soap:Server</faultcode>",
            "<faultstring>internal error</faultstring>",
            "</soap:Fault>"
        ));
        let err = parse_outcome(StoreOperation::GetFromStore, &body).unwrap_err();
        assert!(matches!(err, WitsmlError::Envelope(_)));
        assert!(err.to_string().contains("internal error"));
    }

    #[test]
    fn test_parse_missing_response_element() {
        let body = response_envelope("<SomethingElse/>");
        assert!(matches!(
            parse_outcome(StoreOperation::GetFromStore, &body),
            Err(WitsmlError::Envelope(_))
        ));
    }

    #[test]
    fn test_parse_unparsable_body() {
        assert!(matches!(
            parse_outcome(StoreOperation::GetFromStore, "this is not xml <"),
            Err(WitsmlError::Envelope(_))
        ));
    }

    #[test]
    fn test_get_base_msg_request_carries_code() {
        let body = build_get_base_msg(-415);
        assert!(body.contains("<ReturnValueIn>-415</ReturnValueIn>"));
    }
}
