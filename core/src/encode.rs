//! Query-string encoding of nested parameter maps.
//!
//! # Design
//! Simple values are collected per effective key and written last, sorted by
//! key. Nested maps are encoded recursively with a bracketed key template
//! (`parent[%s]`) and their fragments are emitted first as raw text, each
//! followed by `&`. Consumers of the existing wire format depend on that
//! layout, including the trailing separator, so it is kept as is.

use std::collections::BTreeMap;

use percent_encoding::{percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::params::{ParamMap, ParamValue};

/// Placeholder substituted with the raw key in a key template.
pub const PLACEHOLDER: &str = "%s";

/// Bytes left unescaped in a query component: alphanumerics and `-_.~`.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Encode `params` as a URL query string.
///
/// `key_format` is a template with one `%s` placeholder applied to every key
/// at this level; `None` or `""` uses keys unchanged.
pub fn encode_query(params: &ParamMap, key_format: Option<&str>) -> String {
    let mut values: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    let mut out = String::new();

    for (key, value) in params {
        let key = effective_key(key, key_format);
        match value {
            ParamValue::Str(s) => {
                values.insert(key, s.as_bytes().to_vec());
            }
            ParamValue::Bytes(bytes) => {
                values.insert(key, bytes.clone());
            }
            ParamValue::Map(child) => {
                let child_format = format!("{key}[{PLACEHOLDER}]");
                out.push_str(&encode_query(child, Some(&child_format)));
                out.push('&');
            }
            ParamValue::Int(n) => {
                values.insert(key, n.to_string().into_bytes());
            }
            ParamValue::Uint(n) => {
                values.insert(key, n.to_string().into_bytes());
            }
            ParamValue::Float(_) | ParamValue::Bool(_) | ParamValue::List(_) | ParamValue::Null => {}
        }
    }

    let mut first = true;
    for (key, value) in &values {
        if !first {
            out.push('&');
        }
        first = false;
        out.push_str(&escape(key.as_bytes()));
        out.push('=');
        out.push_str(&escape(value));
    }
    out
}

/// Substitute `key` into the template. The last placeholder is used so that
/// keys which themselves contain `%s` survive nesting; a template without a
/// placeholder is treated as a prefix.
fn effective_key(key: &str, key_format: Option<&str>) -> String {
    match key_format.filter(|f| !f.is_empty()) {
        Some(format) => match format.rsplit_once(PLACEHOLDER) {
            Some((prefix, suffix)) => format!("{prefix}{key}{suffix}"),
            None => format!("{format}{key}"),
        },
        None => key.to_string(),
    }
}

/// Percent-escape one query component, writing spaces as `+`.
fn escape(bytes: &[u8]) -> String {
    bytes
        .split(|b| *b == b' ')
        .map(|chunk| percent_encode(chunk, QUERY_COMPONENT).to_string())
        .collect::<Vec<_>>()
        .join("+")
}
