//! Typed annotation resolution.
//!
//! Controllers tune per-resource behavior through annotations on the
//! resource's metadata. This module resolves a single typed value (string,
//! boolean, or integer) from that map, checking a primary key first and then
//! an ordered list of deprecated alternate keys, falling back to a
//! caller-supplied default when none is present.
//!
//! Reads never mutate the resource: an absent annotation map is treated as
//! empty. Writers that need the map materialized use [`Annotated::annotations_mut`],
//! which lazily creates it.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::error::AnnotationError;

/// The Microscaler domain used in all well-known annotations
pub const DCOPS_DOMAIN: &str = "dcops.microscaler.io/";

/// Annotation used to pause reconciliation of a resource
pub const ANNO_DCOPS_PAUSE_RECONCILIATION: &str = "dcops.microscaler.io/pause-reconciliation";

/// Annotation used to force a resync of a resource even when its spec did not change
pub const ANNO_DCOPS_FORCE_RESYNC: &str = "dcops.microscaler.io/force-resync";

/// Annotation used to track the hash of the rendered configuration a resource
/// was last reconciled against
pub const ANNO_DCOPS_CONFIG_HASH: &str = "dcops.microscaler.io/config-hash";

/// Capability trait for anything that carries an annotation map.
///
/// Implemented for the metadata shapes controllers actually deal with:
/// standalone resource metadata ([`ObjectMeta`], reached via
/// `kube::Resource::meta()`) and pod-template-embedded metadata
/// ([`PodTemplateSpec`]).
pub trait Annotated {
    /// Returns the annotation map, if one is present.
    fn annotations(&self) -> Option<&BTreeMap<String, String>>;

    /// Returns the annotation map for writing, creating it if absent.
    ///
    /// This is the only mutating operation in this module; plain reads treat
    /// an absent map as empty instead of writing one back.
    fn annotations_mut(&mut self) -> &mut BTreeMap<String, String>;
}

impl Annotated for ObjectMeta {
    fn annotations(&self) -> Option<&BTreeMap<String, String>> {
        self.annotations.as_ref()
    }

    fn annotations_mut(&mut self) -> &mut BTreeMap<String, String> {
        self.annotations.get_or_insert_with(BTreeMap::new)
    }
}

impl Annotated for PodTemplateSpec {
    fn annotations(&self) -> Option<&BTreeMap<String, String>> {
        self.metadata.as_ref().and_then(|meta| meta.annotations.as_ref())
    }

    fn annotations_mut(&mut self) -> &mut BTreeMap<String, String> {
        self.metadata
            .get_or_insert_with(ObjectMeta::default)
            .annotations_mut()
    }
}

/// Selects the raw value for `key`, falling back to the first present
/// deprecated key in caller-supplied order. Returns the matched key alongside
/// the value so coercion errors can name their source.
fn select<'a>(
    source: &'a impl Annotated,
    key: &'a str,
    deprecated: &[&'a str],
) -> Option<(&'a str, &'a str)> {
    let annotations = source.annotations()?;
    if let Some(value) = annotations.get(key) {
        return Some((key, value.as_str()));
    }
    deprecated
        .iter()
        .find_map(|fallback| annotations.get(*fallback).map(|value| (*fallback, value.as_str())))
}

/// Resolves a string annotation, returning the value verbatim or `default`
/// when neither the primary key nor any deprecated key is present.
pub fn string_annotation(
    source: &impl Annotated,
    key: &str,
    default: &str,
    deprecated: &[&str],
) -> String {
    select(source, key, deprecated)
        .map_or_else(|| default.to_string(), |(_, value)| value.to_string())
}

/// Resolves a boolean annotation.
///
/// Coercion is total and never fails: exactly the literal `"true"` yields
/// true, any other value (`"TRUE"`, `"1"`, `"yes"`, garbage) yields false.
/// `default` applies only when no key is present at all.
pub fn bool_annotation(
    source: &impl Annotated,
    key: &str,
    default: bool,
    deprecated: &[&str],
) -> bool {
    select(source, key, deprecated).map_or(default, |(_, value)| value == "true")
}

/// Resolves an integer annotation with a strict base-10 parse.
///
/// A malformed value is a caller-visible [`AnnotationError::MalformedValue`]
/// naming the offending key and raw value; it is never silently defaulted.
/// `default` applies only when no key is present.
pub fn int_annotation(
    source: &impl Annotated,
    key: &str,
    default: i64,
    deprecated: &[&str],
) -> Result<i64, AnnotationError> {
    match select(source, key, deprecated) {
        Some((matched, value)) => value.parse().map_err(|_| AnnotationError::MalformedValue {
            key: matched.to_string(),
            value: value.to_string(),
        }),
        None => Ok(default),
    }
}

/// Checks whether `key` is present, regardless of its value.
///
/// Exact match only; deprecated-key fallback does not apply here.
pub fn has_annotation(source: &impl Annotated, key: &str) -> bool {
    source
        .annotations()
        .is_some_and(|annotations| annotations.contains_key(key))
}

/// Checks whether the resource carries the pause-reconciliation annotation
/// set to `"true"`.
///
/// Reconcilers use this to short-circuit processing of a resource.
pub fn is_reconciliation_paused(source: &impl Annotated) -> bool {
    bool_annotation(source, ANNO_DCOPS_PAUSE_RECONCILIATION, false, &[])
}
