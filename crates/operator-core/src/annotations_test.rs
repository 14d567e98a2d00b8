//! Unit tests for the annotations module

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::api::core::v1::PodTemplateSpec;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    use crate::annotations::*;
    use crate::error::AnnotationError;

    fn meta_with(entries: &[(&str, &str)]) -> ObjectMeta {
        ObjectMeta {
            annotations: Some(
                entries
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    #[test]
    fn test_absent_map_resolves_to_default() {
        // A resource with no annotation map at all must default, not fail
        let meta = ObjectMeta::default();

        assert_eq!(string_annotation(&meta, "dcops.microscaler.io/mode", "auto", &[]), "auto");
        assert!(bool_annotation(&meta, "dcops.microscaler.io/enabled", true, &[]));
        assert_eq!(int_annotation(&meta, "dcops.microscaler.io/replicas", 3, &[]), Ok(3));
        assert!(!has_annotation(&meta, "dcops.microscaler.io/mode"));
    }

    #[test]
    fn test_reads_do_not_materialize_the_map() {
        let meta = ObjectMeta::default();
        let _ = string_annotation(&meta, "dcops.microscaler.io/mode", "auto", &[]);
        assert!(meta.annotations.is_none(), "read must not attach an empty map");
    }

    #[test]
    fn test_annotations_mut_lazily_creates_the_map() {
        let mut meta = ObjectMeta::default();
        meta.annotations_mut()
            .insert("dcops.microscaler.io/mode".to_string(), "manual".to_string());

        assert_eq!(string_annotation(&meta, "dcops.microscaler.io/mode", "auto", &[]), "manual");
    }

    #[test]
    fn test_primary_key_wins_over_deprecated() {
        let meta = meta_with(&[
            ("dcops.microscaler.io/mode", "primary"),
            ("dcops.microscaler.io/sync-mode", "old-a"),
            ("dcops.microscaler.io/mode-legacy", "old-b"),
        ]);

        let value = string_annotation(
            &meta,
            "dcops.microscaler.io/mode",
            "default",
            &["dcops.microscaler.io/sync-mode", "dcops.microscaler.io/mode-legacy"],
        );
        assert_eq!(value, "primary");
    }

    #[test]
    fn test_first_deprecated_key_wins_in_order() {
        let meta = meta_with(&[
            ("dcops.microscaler.io/sync-mode", "old-a"),
            ("dcops.microscaler.io/mode-legacy", "old-b"),
        ]);

        let value = string_annotation(
            &meta,
            "dcops.microscaler.io/mode",
            "default",
            &["dcops.microscaler.io/sync-mode", "dcops.microscaler.io/mode-legacy"],
        );
        assert_eq!(value, "old-a");

        // Reversing the caller-supplied order flips the winner
        let value = string_annotation(
            &meta,
            "dcops.microscaler.io/mode",
            "default",
            &["dcops.microscaler.io/mode-legacy", "dcops.microscaler.io/sync-mode"],
        );
        assert_eq!(value, "old-b");
    }

    #[test]
    fn test_default_wins_when_no_key_present() {
        let meta = meta_with(&[("unrelated/key", "value")]);

        let value = string_annotation(
            &meta,
            "dcops.microscaler.io/mode",
            "default",
            &["dcops.microscaler.io/sync-mode"],
        );
        assert_eq!(value, "default");
    }

    #[test]
    fn test_bool_coercion_is_total() {
        for (raw, expected) in [
            ("true", true),
            ("TRUE", false),
            ("True", false),
            ("1", false),
            ("yes", false),
            ("", false),
            ("garbage", false),
        ] {
            let meta = meta_with(&[("dcops.microscaler.io/enabled", raw)]);
            assert_eq!(
                bool_annotation(&meta, "dcops.microscaler.io/enabled", true, &[]),
                expected,
                "value {raw:?} should coerce to {expected}",
            );
        }
    }

    #[test]
    fn test_int_coercion_strict() {
        let meta = meta_with(&[("dcops.microscaler.io/replicas", "42")]);
        assert_eq!(int_annotation(&meta, "dcops.microscaler.io/replicas", 0, &[]), Ok(42));

        let meta = meta_with(&[("dcops.microscaler.io/replicas", "4x")]);
        let err = int_annotation(&meta, "dcops.microscaler.io/replicas", 0, &[]);
        assert_eq!(
            err,
            Err(AnnotationError::MalformedValue {
                key: "dcops.microscaler.io/replicas".to_string(),
                value: "4x".to_string(),
            })
        );
    }

    #[test]
    fn test_int_error_names_the_deprecated_key_that_matched() {
        let meta = meta_with(&[("dcops.microscaler.io/replica-count", "many")]);
        let err = int_annotation(
            &meta,
            "dcops.microscaler.io/replicas",
            0,
            &["dcops.microscaler.io/replica-count"],
        );
        assert_eq!(
            err,
            Err(AnnotationError::MalformedValue {
                key: "dcops.microscaler.io/replica-count".to_string(),
                value: "many".to_string(),
            })
        );
    }

    #[test]
    fn test_has_annotation_is_value_independent() {
        let meta = meta_with(&[("dcops.microscaler.io/config-hash", "")]);

        // Present with an empty value still counts
        assert!(has_annotation(&meta, "dcops.microscaler.io/config-hash"));
        assert!(!has_annotation(&meta, "dcops.microscaler.io/force-resync"));
    }

    #[test]
    fn test_has_annotation_does_not_fall_back() {
        let meta = meta_with(&[("dcops.microscaler.io/sync-mode", "x")]);
        assert!(!has_annotation(&meta, "dcops.microscaler.io/mode"));
    }

    #[test]
    fn test_is_reconciliation_paused() {
        let meta = meta_with(&[(ANNO_DCOPS_PAUSE_RECONCILIATION, "true")]);
        assert!(is_reconciliation_paused(&meta));

        let meta = meta_with(&[(ANNO_DCOPS_PAUSE_RECONCILIATION, "false")]);
        assert!(!is_reconciliation_paused(&meta));

        assert!(!is_reconciliation_paused(&ObjectMeta::default()));
    }

    #[test]
    fn test_pod_template_adapter() {
        let mut template = PodTemplateSpec::default();
        assert!(template.annotations().is_none());

        template.annotations_mut().insert(
            "dcops.microscaler.io/config-hash".to_string(),
            "abc123".to_string(),
        );

        assert!(has_annotation(&template, "dcops.microscaler.io/config-hash"));
        assert_eq!(
            string_annotation(&template, "dcops.microscaler.io/config-hash", "", &[]),
            "abc123"
        );
    }

    #[test]
    fn test_pod_template_with_metadata_but_no_annotations() {
        let template = PodTemplateSpec {
            metadata: Some(Default::default()),
            ..Default::default()
        };
        let annotations: Option<&BTreeMap<String, String>> = template.annotations();
        assert!(annotations.is_none());
        assert!(bool_annotation(&template, "dcops.microscaler.io/enabled", true, &[]));
    }
}
