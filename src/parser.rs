//! SOAP XML parsing utilities.
//!
//! Uses quick-xml which is safe against XXE by default (doesn't expand
//! entities). Nothing in the inbound document is trusted: the parser only
//! extracts the envelope shape and the WS-Security subtree, and every
//! failure surfaces as a [`ParseError`] that callers normalize before it
//! reaches the wire.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// SOAP namespace URIs.
pub const SOAP_11_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const SOAP_12_NS: &str = "http://www.w3.org/2003/05/soap-envelope";
pub const WSSE_NS: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";

/// SOAP versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapVersion {
    /// SOAP 1.1 (namespace: http://schemas.xmlsoap.org/soap/envelope/)
    Soap11,
    /// SOAP 1.2 (namespace: http://www.w3.org/2003/05/soap-envelope)
    Soap12,
}

/// Parsed SOAP envelope.
#[derive(Debug, Clone)]
pub struct SoapEnvelope {
    /// Detected SOAP version
    pub version: SoapVersion,
    /// SOAP Header (if present)
    pub header: Option<SoapHeader>,
    /// First operation element name in the Body
    pub operation: Option<String>,
}

/// Parsed SOAP Header.
#[derive(Debug, Clone, Default)]
pub struct SoapHeader {
    /// WS-Security `Security` element (if present)
    pub security: Option<SecurityElement>,
}

/// The WS-Security subtree of an inbound envelope. Transient: exists only
/// for the duration of the accept/reject decision.
#[derive(Debug, Clone, Default)]
pub struct SecurityElement {
    /// UsernameToken child (if present)
    pub username_token: Option<UsernameToken>,
}

/// WS-Security UsernameToken with plain-text credentials.
///
/// Absent `Username`/`Password` children are represented as empty strings.
#[derive(Debug, Clone, Default)]
pub struct UsernameToken {
    pub username: String,
    pub password: String,
}

/// Internal parsing failure. Never exposed past the interceptor, which
/// normalizes it into a `SecurityValidationFailed` violation.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("{0}")]
    ForbiddenConstruct(String),

    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("no SOAP Envelope with a recognized namespace")]
    NotSoap,
}

/// Which UsernameToken child is currently accumulating text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenField {
    Username,
    Password,
}

/// In-scope namespace declarations, tracked per element depth so prefixed
/// elements resolve correctly wherever the declaration sits.
#[derive(Default)]
struct NamespaceScope {
    // (depth, prefix, uri); prefix None is the default namespace
    decls: Vec<(u32, Option<String>, String)>,
}

impl NamespaceScope {
    /// Record the xmlns declarations of an element starting at `depth`.
    fn push_decls(&mut self, e: &BytesStart, depth: u32) -> Result<(), ParseError> {
        for attr in e.attributes() {
            let attr = attr.map_err(|e| ParseError::Xml(e.to_string()))?;
            let key = std::str::from_utf8(attr.key.as_ref())?;
            let uri = std::str::from_utf8(&attr.value)?.to_string();
            if key == "xmlns" {
                self.decls.push((depth, None, uri));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                self.decls.push((depth, Some(prefix.to_string()), uri));
            }
        }
        Ok(())
    }

    /// Drop declarations made by the element that ended at `depth`.
    fn pop_depth(&mut self, depth: u32) {
        self.decls.retain(|(d, _, _)| *d < depth);
    }

    /// Resolve an element's namespace URI from its prefix.
    fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        self.decls
            .iter()
            .rev()
            .find(|(_, p, _)| p.as_deref() == prefix)
            .map(|(_, _, uri)| uri.as_str())
    }
}

/// Split an element name into (prefix, local name).
fn split_name(e: &BytesStart) -> Result<(Option<String>, String), ParseError> {
    let qname = e.name();
    let local = std::str::from_utf8(qname.local_name().as_ref())?.to_string();
    let prefix = match qname.prefix() {
        Some(p) => Some(std::str::from_utf8(p.as_ref())?.to_string()),
        None => None,
    };
    Ok((prefix, local))
}

/// Parse raw bytes as a SOAP envelope.
pub fn parse_envelope(data: &[u8]) -> Result<SoapEnvelope, ParseError> {
    let xml_str = std::str::from_utf8(data)?;

    // Pre-scan for XXE patterns (belt-and-suspenders with quick-xml's safety)
    check_xxe_patterns(xml_str)?;

    let mut reader = Reader::from_str(xml_str);
    reader.config_mut().trim_text(true);

    let mut scope = NamespaceScope::default();
    let mut depth = 0u32;

    let mut version: Option<SoapVersion> = None;
    let mut header: Option<SoapHeader> = None;
    let mut operation: Option<String> = None;

    let mut in_header = false;
    let mut in_body = false;
    let mut in_security = false;
    let mut in_username_token = false;
    let mut text_target: Option<TokenField> = None;

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                scope.push_decls(e, depth)?;
                let (prefix, local) = split_name(e)?;
                let ns = scope.resolve(prefix.as_deref());

                if depth == 1 {
                    version = match ns {
                        Some(SOAP_11_NS) if local == "Envelope" => Some(SoapVersion::Soap11),
                        Some(SOAP_12_NS) if local == "Envelope" => Some(SoapVersion::Soap12),
                        _ => return Err(ParseError::NotSoap),
                    };
                } else if depth == 2 && local == "Header" {
                    in_header = true;
                    header = Some(SoapHeader::default());
                } else if depth == 2 && local == "Body" {
                    in_body = true;
                } else if in_header && local == "Security" && ns == Some(WSSE_NS) {
                    in_security = true;
                    if let Some(h) = header.as_mut() {
                        h.security = Some(SecurityElement::default());
                    }
                } else if in_security && local == "UsernameToken" && ns == Some(WSSE_NS) {
                    in_username_token = true;
                    if let Some(sec) = header.as_mut().and_then(|h| h.security.as_mut()) {
                        sec.username_token = Some(UsernameToken::default());
                    }
                } else if in_username_token && ns == Some(WSSE_NS) {
                    text_target = match local.as_str() {
                        "Username" => Some(TokenField::Username),
                        "Password" => Some(TokenField::Password),
                        _ => None,
                    };
                } else if in_body && depth == 3 && operation.is_none() {
                    operation = Some(local);
                }
            }

            Ok(Event::Empty(ref e)) => {
                // Self-closing elements declare namespaces for themselves only
                let probe_depth = depth + 1;
                scope.push_decls(e, probe_depth)?;
                let (prefix, local) = split_name(e)?;
                let ns = scope.resolve(prefix.as_deref());

                if in_security && local == "UsernameToken" && ns == Some(WSSE_NS) {
                    if let Some(sec) = header.as_mut().and_then(|h| h.security.as_mut()) {
                        sec.username_token = Some(UsernameToken::default());
                    }
                } else if in_header && local == "Security" && ns == Some(WSSE_NS) {
                    if let Some(h) = header.as_mut() {
                        h.security = Some(SecurityElement::default());
                    }
                } else if in_body && depth == 2 && operation.is_none() {
                    operation = Some(local);
                }

                scope.pop_depth(probe_depth);
            }

            Ok(Event::Text(ref e)) => {
                if let Some(target) = text_target {
                    let text = e
                        .unescape()
                        .map_err(|e| ParseError::Xml(e.to_string()))?;
                    if let Some(token) = header
                        .as_mut()
                        .and_then(|h| h.security.as_mut())
                        .and_then(|s| s.username_token.as_mut())
                    {
                        match target {
                            TokenField::Username => token.username.push_str(&text),
                            TokenField::Password => token.password.push_str(&text),
                        }
                    }
                }
            }

            Ok(Event::End(ref e)) => {
                let local = std::str::from_utf8(e.local_name().as_ref())?.to_string();
                match local.as_str() {
                    "Username" | "Password" => text_target = None,
                    "UsernameToken" if in_username_token => in_username_token = false,
                    "Security" if in_security => in_security = false,
                    "Header" if depth == 2 => in_header = false,
                    "Body" if depth == 2 => in_body = false,
                    _ => {}
                }
                scope.pop_depth(depth);
                depth = depth.saturating_sub(1);
            }

            Ok(Event::Eof) => break,

            Err(e) => return Err(ParseError::Xml(e.to_string())),

            _ => {}
        }

        buf.clear();
    }

    let version = version.ok_or(ParseError::NotSoap)?;

    Ok(SoapEnvelope {
        version,
        header,
        operation,
    })
}

/// Check for XXE attack patterns before handing bytes to the reader.
fn check_xxe_patterns(xml: &str) -> Result<(), ParseError> {
    if xml.contains("<!DOCTYPE") || xml.contains("<!doctype") {
        return Err(ParseError::ForbiddenConstruct(
            "DOCTYPE declarations are not allowed".to_string(),
        ));
    }

    if xml.contains("<!ENTITY") || xml.contains("<!entity") {
        return Err(ParseError::ForbiddenConstruct(
            "Entity declarations are not allowed".to_string(),
        ));
    }

    Ok(())
}
