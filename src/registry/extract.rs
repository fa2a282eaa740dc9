//! Text mining of the explorer bundle.
//!
//! The bundle registers each rollup with a minified constructor call:
//!
//! ```text
//! new k(<namespace>,"<name>",new URL("<website>"),new URL("<scan>"))
//! ```
//!
//! Nothing outside this module knows that shape.

use std::borrow::Cow;

use crate::constants::registry::{
    CTOR_OPEN, HOISTED_BINDING, INLINED_BINDING, SENTINEL_NAMESPACE, URL_OPEN,
};
use crate::types::RollupEntry;

/// Captured groups of one constructor call, verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawCall<'a> {
    pub namespace_expr: &'a str,
    pub name: &'a str,
    pub website: &'a str,
    pub scan: &'a str,
}

/// Inline the namespace constant the minifier hoists into a variable, so the
/// general call pattern matches it too.
pub fn normalize_bundle(text: &str) -> Cow<'_, str> {
    if text.contains(HOISTED_BINDING) {
        Cow::Owned(text.replace(HOISTED_BINDING, INLINED_BINDING))
    } else {
        Cow::Borrowed(text)
    }
}

/// Non-empty run of chars up to (not including) `delim`.
fn take_until(s: &str, delim: char) -> Option<(&str, &str)> {
    let end = s.find(delim)?;
    if end == 0 {
        return None;
    }
    Some((&s[..end], &s[end..]))
}

/// Match the call body right after `new k(`. Returns the groups and the
/// number of bytes consumed.
fn match_call(s: &str) -> Option<(RawCall<'_>, usize)> {
    let (namespace_expr, rest) = take_until(s, ',')?;
    let rest = rest.strip_prefix(",\"")?;
    let (name, rest) = take_until(rest, '"')?;
    let rest = rest.strip_prefix('"')?.strip_prefix(',')?.strip_prefix(URL_OPEN)?;
    let (website, rest) = take_until(rest, '"')?;
    let rest = rest.strip_prefix("\"),")?.strip_prefix(URL_OPEN)?;
    let (scan, rest) = take_until(rest, '"')?;
    let rest = rest.strip_prefix("\"))")?;

    Some((
        RawCall {
            namespace_expr,
            name,
            website,
            scan,
        },
        s.len() - rest.len(),
    ))
}

/// Every constructor call in source order, non-overlapping.
pub fn scan_calls(text: &str) -> Vec<RawCall<'_>> {
    let mut calls = Vec::new();
    let mut pos = 0;
    while let Some(rel) = text[pos..].find(CTOR_OPEN) {
        let body = pos + rel + CTOR_OPEN.len();
        match match_call(&text[body..]) {
            Some((call, consumed)) => {
                calls.push(call);
                pos = body + consumed;
            }
            None => pos = body,
        }
    }
    calls
}

/// Namespace expressions are either the sentinel literal or plain digits;
/// anything else (e.g. a variable the minifier left behind) is skipped.
pub fn parse_namespace(expr: &str) -> Option<u64> {
    if expr == "1397311310" {
        return Some(SENTINEL_NAMESPACE);
    }
    if !expr.is_empty() && expr.bytes().all(|b| b.is_ascii_digit()) {
        return expr.parse().ok();
    }
    None
}

/// Normalize the bundle and extract all rollup entries in source order.
pub fn extract_rollups(bundle: &str) -> Vec<RollupEntry> {
    let text = normalize_bundle(bundle);
    scan_calls(&text)
        .into_iter()
        .filter_map(|call| {
            let Some(namespace) = parse_namespace(call.namespace_expr) else {
                log::debug!(
                    "[registry] skipping non-literal namespace '{}' for {}",
                    call.namespace_expr,
                    call.name
                );
                return None;
            };
            Some(RollupEntry {
                namespace,
                name: call.name.to_string(),
                website: call.website.to_string(),
                scan: call.scan.to_string(),
            })
        })
        .collect()
}
