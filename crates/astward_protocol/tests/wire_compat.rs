//! Wire Compatibility Tests
//!
//! These tests pin the JSON shapes each server generation sends and expects.
//! Field names and enum spellings MUST remain stable for wire compatibility.

use anyhow::Result;
use astward_protocol::wire::{v36, v40, v41};
use astward_protocol::*;
use serde_json::json;

/// Verify product version strings map to the generation that speaks them
#[test]
fn test_server_version_mapping() {
    let cases = [
        ("3.6.4.2843", Some(ProtocolVersion::V36)),
        ("4.0.0.11220", Some(ProtocolVersion::V40)),
        ("4.1.2.34567", Some(ProtocolVersion::V41)),
        ("v4.1", Some(ProtocolVersion::V41)),
        ("4.2.0.1", None),
        ("3.5", None),
        ("garbage", None),
        ("", None),
    ];

    for (version, expected) in cases {
        assert_eq!(
            ProtocolVersion::from_server_version(version),
            expected,
            "Server version {:?} should map to {:?}",
            version,
            expected
        );
    }
}

#[test]
fn test_protocol_version_parse_display() -> Result<()> {
    for version in ProtocolVersion::ALL {
        let parsed: ProtocolVersion = version.as_str().parse()?;
        assert_eq!(parsed, version);
    }
    assert!("v5.0".parse::<ProtocolVersion>().is_err());
    Ok(())
}

/// 3.6 uses PascalCase enum values and a signed pattern mask
#[test]
fn test_v36_scan_result_shape() -> Result<()> {
    let body = json!({
        "id": "6f1c3e9a-0d43-4a51-9b1f-1a2b3c4d5e6f",
        "projectId": "0b7e2d54-3c1f-4c3b-8a0e-aabbccddeeff",
        "scanDate": "2021-03-04T10:15:30Z",
        "progress": { "stage": "Done" },
        "policyState": "Rejected"
    });
    let result: v36::ScanResult = serde_json::from_value(body)?;
    assert_eq!(result.progress.map(|p| p.stage), Some(v36::Stage::Done));
    assert_eq!(result.policy_state, Some(v36::PolicyState::Rejected));

    let pattern: v36::PmPattern =
        serde_json::from_value(json!({ "key": "sqli", "programmingLanguages": -1 }))?;
    assert_eq!(pattern.programming_languages, Some(-1));

    let missing: v36::PmPattern = serde_json::from_value(json!({ "key": "xss" }))?;
    assert_eq!(missing.programming_languages, None);
    Ok(())
}

#[test]
fn test_v36_settings_omit_absent_id() -> Result<()> {
    let settings = v36::V36ScanSettings {
        id: None,
        programming_language: "Java".to_string(),
        enabled_patterns: vec!["a".to_string()],
        disabled_patterns: vec![],
        use_incremental_scan: true,
    };
    let value = serde_json::to_value(&settings)?;
    assert!(value.get("id").is_none());
    assert_eq!(value["programmingLanguage"], "Java");
    assert_eq!(value["useIncrementalScan"], true);
    Ok(())
}

/// 4.0 nests the stage under `status` and spells it in snake_case
#[test]
fn test_v40_scan_result_shape() -> Result<()> {
    let body = json!({
        "id": "6f1c3e9a-0d43-4a51-9b1f-1a2b3c4d5e6f",
        "projectId": "0b7e2d54-3c1f-4c3b-8a0e-aabbccddeeff",
        "createdAt": "2022-01-01T00:00:00Z",
        "status": { "stage": "vfs_setup" }
    });
    let result: v40::ScanResultModel = serde_json::from_value(body)?;
    assert_eq!(result.status.map(|s| s.stage), Some(v40::Stage::VfsSetup));
    assert_eq!(result.policy_state, None);
    Ok(())
}

/// 4.1 reports the stage at top level in SCREAMING_SNAKE_CASE
#[test]
fn test_v41_scan_result_shape() -> Result<()> {
    let body = json!({
        "id": "6f1c3e9a-0d43-4a51-9b1f-1a2b3c4d5e6f",
        "projectId": "0b7e2d54-3c1f-4c3b-8a0e-aabbccddeeff",
        "scanDate": "2023-05-06T07:08:09Z",
        "stage": "DONE",
        "policyState": "CONFIRMED"
    });
    let result: v41::ScanResultModel = serde_json::from_value(body)?;
    assert_eq!(result.stage, v41::Stage::Done);
    assert_eq!(result.policy_state, Some(v41::PolicyState::Confirmed));
    Ok(())
}

/// Stages introduced by newer servers must not break decoding
#[test]
fn test_unknown_stage_is_tolerated() -> Result<()> {
    let stage: v41::Stage = serde_json::from_value(json!("AUTOCHECK"))?;
    assert_eq!(stage, v41::Stage::Unknown);
    let stage: v36::Stage = serde_json::from_value(json!("Autocheck"))?;
    assert_eq!(stage, v36::Stage::Unknown);
    Ok(())
}

#[test]
fn test_generation_paths_differ() {
    let id = astward_ids::ProjectId::new();
    assert_eq!(
        v36::scan_results(&id).to_string(),
        format!("GET /api/Projects/{}/ScanResults?authScope=AccessToken", id)
    );
    assert_eq!(
        v40::scan_results(&id).to_string(),
        format!("GET /api/projects/{}/scanResults", id)
    );
    assert_eq!(
        v41::scan_results(&id).to_string(),
        format!("GET /api/v2/projects/{}/scanResults", id)
    );
    assert_eq!(
        v41::current_version(Component::AiViewer).to_string(),
        "GET /api/versions/product/current?component=AiViewer"
    );
}
