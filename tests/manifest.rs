// ABOUTME: Property tests for pipeline manifest validation.
// ABOUTME: The name length limit must hold for arbitrary names.

use caravel::manifest::{ManifestError, PipelineManifest, Source, SourceProperties};
use proptest::prelude::*;

fn manifest_named(name: &str) -> PipelineManifest {
    PipelineManifest {
        name: name.to_string(),
        version: 1,
        source: Source {
            provider: "GitHub".to_string(),
            properties: SourceProperties {
                repository: Some("badgoose/widgets".to_string()),
                branch: None,
                access_token_secret: None,
            },
        },
        build: None,
        stages: Vec::new(),
    }
}

proptest! {
    /// Test: Any name of 100 characters or more is rejected.
    #[test]
    fn long_names_are_always_rejected(name in "[a-z][a-z0-9-]{99,150}") {
        let err = manifest_named(&name).validate().unwrap_err();
        prop_assert!(matches!(err, ManifestError::NameTooLong(_)));
        prop_assert!(err.to_string().contains("must be shorter than 100 characters"));
    }

    /// Test: Any name under 100 characters is accepted.
    #[test]
    fn short_names_are_always_accepted(name in "[a-z][a-z0-9-]{0,98}") {
        prop_assert!(manifest_named(&name).validate().is_ok());
    }

    /// Test: The length limit counts characters, not bytes.
    #[test]
    fn multibyte_names_are_measured_in_characters(len in 1usize..99) {
        let name = "é".repeat(len);
        prop_assert!(manifest_named(&name).validate().is_ok());
    }
}
