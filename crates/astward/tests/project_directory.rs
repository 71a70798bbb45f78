//! Project directory tests against the in-memory server.
//!
//! Every scenario runs once per server generation so the three wire schemas
//! are held to the same contract.

mod common;

use std::cell::RefCell;

use anyhow::Result;
use astward::client::{v40, v41};
use astward::{
    CancellationToken, ErrorKind, Language, ProjectDirectory, ScanSettings, ScanSettingsDocument,
};
use astward_protocol::{Method, ProtocolVersion};
use astward_test_utils::{Failure, FakeServer};

fn wire_language(generation: ProtocolVersion, language: Language) -> String {
    match generation {
        ProtocolVersion::V36 => language.as_str().to_string(),
        ProtocolVersion::V40 => v40::language_name(language).to_string(),
        ProtocolVersion::V41 => v41::language_name(language).to_string(),
    }
}

fn settings(language: Language, enabled: &[&str], policy: Option<&str>) -> ScanSettings {
    let mut settings = ScanSettings::new(language);
    settings.enabled_patterns = enabled.iter().map(|s| s.to_string()).collect();
    settings.disabled_patterns = vec!["never".to_string()];
    settings.policy = policy.map(str::to_string);
    settings
}

/// Setting up the same name twice converges on one project holding the
/// latest settings.
#[test]
fn test_create_or_update_is_idempotent() -> Result<()> {
    for generation in common::GENERATIONS {
        let server = FakeServer::new(generation);
        let client = common::client(&server);
        let directory = ProjectDirectory::new(&client);

        let first = directory.create_or_update(
            "billing",
            &settings(Language::Java, &["sqli"], Some(r#"[{"Scopes":[]}]"#)),
        )?;
        assert_eq!(
            server.project_named("billing").unwrap().policy.as_deref(),
            Some(r#"[{"Scopes":[]}]"#)
        );

        let mut latest = settings(Language::Go, &["xss", "ssrf"], None);
        latest.incremental = true;
        let second = directory.create_or_update("billing", &latest)?;

        assert_eq!(first.id, second.id, "{}", generation);
        let projects = server.projects();
        assert_eq!(projects.len(), 1, "{}", generation);
        let stored = &projects[0];
        assert_eq!(stored.settings.languages, vec![wire_language(generation, Language::Go)]);
        assert_eq!(stored.settings.enabled, vec!["xss", "ssrf"]);
        assert_eq!(stored.settings.disabled, vec!["never"]);
        assert!(stored.settings.incremental);
        assert_eq!(stored.policy, None, "{}", generation);
    }
    Ok(())
}

/// 3.6 only accepts a settings update that names the project's settings id.
#[test]
fn test_v36_update_reattaches_settings_identity() -> Result<()> {
    let server = FakeServer::new(ProtocolVersion::V36);
    server.insert_project("legacy");
    let client = common::client(&server);
    let directory = ProjectDirectory::new(&client);

    let project = directory.find_by_name("legacy")?.expect("project exists");
    assert_eq!(
        project.settings_id,
        Some(server.project_named("legacy").unwrap().settings_id)
    );

    directory.create_or_update("legacy", &settings(Language::Php, &["a"], None))?;
    assert_eq!(server.project_named("legacy").unwrap().settings.enabled, vec!["a"]);
    Ok(())
}

/// A created project shows up in the listing under its id, whatever the
/// credential kind.
#[test]
fn test_listing_round_trip() -> Result<()> {
    for generation in common::GENERATIONS {
        for connection in [common::token_connection(), common::password_connection()] {
            let server = FakeServer::new(generation);
            server.insert_project("first");
            let client = common::client_with(&server, connection.clone(), CancellationToken::new());
            let directory = ProjectDirectory::new(&client);

            let created = directory.create_or_update("X", &settings(Language::Python, &[], None))?;
            let listing = directory.list()?;

            assert_eq!(listing.len(), 2);
            assert_eq!(listing[0].1, "first");
            assert!(listing.contains(&(created.id, "X".to_string())));

            let light = connection.credentials.is_token();
            let expected = format!("withoutDetails={}", light);
            assert_eq!(server.request_count(&expected), 1, "{} {:?}", generation, connection);
        }
    }
    Ok(())
}

/// Missing names and ids are a normal empty answer.
#[test]
fn test_lookup_of_missing_project_is_none() -> Result<()> {
    for generation in common::GENERATIONS {
        let server = FakeServer::new(generation);
        let client = common::client(&server);
        let directory = ProjectDirectory::new(&client);

        assert!(directory.find_by_name("nope")?.is_none(), "{}", generation);
        assert!(directory.find_by_id(&astward::ProjectId::new())?.is_none());
    }
    Ok(())
}

/// Lookup by id returns what lookup by name found.
#[test]
fn test_find_by_id_matches_find_by_name() -> Result<()> {
    for generation in common::GENERATIONS {
        let server = FakeServer::new(generation);
        let id = server.insert_project("twin");
        let client = common::client(&server);
        let directory = ProjectDirectory::new(&client);

        let by_name = directory.find_by_name("twin")?.expect("by name");
        let by_id = directory.find_by_id(&id)?.expect("by id");
        assert_eq!(by_name.id, by_id.id);
        assert_eq!(by_id.name, "twin");
    }
    Ok(())
}

/// The second delete of the same project is a remote error.
#[test]
fn test_double_delete_fails() -> Result<()> {
    for generation in common::GENERATIONS {
        let server = FakeServer::new(generation);
        let id = server.insert_project("doomed");
        let client = common::client(&server);
        let directory = ProjectDirectory::new(&client);

        directory.delete(&id)?;
        assert!(server.projects().is_empty());

        let err = directory.delete(&id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.message(), "Project delete failed");
        assert_eq!(
            err.detailed_message(),
            "Project delete failed: Unexpected HTTP status 404"
        );
    }
    Ok(())
}

/// Remote failures keep the call-site message and chain the cause.
#[test]
fn test_remote_failure_is_transport_kind() {
    let server = FakeServer::new(ProtocolVersion::V40);
    server.fail(Method::Get, "/api/projects/name", Failure::Disconnect);
    let client = common::client(&server);
    let directory = ProjectDirectory::new(&client);

    let err = directory.find_by_name("any").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.message(), "Project search failed");
    assert!(err.detailed_message().ends_with("connection reset by peer"));

    server.clear_failures();
    server.fail(Method::Post, "/api/projects", Failure::Status(500));
    let err = directory
        .create_or_update("any", &settings(Language::Java, &[], None))
        .unwrap_err();
    assert_eq!(err.message(), "Project create failed");
    assert_eq!(server.request_count("POST /api/projects"), 1);
}

/// No call is retried.
#[test]
fn test_failed_call_is_attempted_once() {
    let server = FakeServer::new(ProtocolVersion::V41);
    server.fail(Method::Get, "/api/configs/patterns", Failure::Status(503));
    let client = common::client(&server);

    let document = ScanSettingsDocument::parse(r#"{"ProjectName":"p","ProgrammingLanguage":"Java"}"#)
        .unwrap();
    let err = ProjectDirectory::new(&client)
        .setup_from_settings(&document, None, |_| Ok(()))
        .unwrap_err();
    assert_eq!(err.message(), "Patterns load failed");
    assert_eq!(server.request_count("/api/configs/patterns"), 1);
    assert!(server.projects().is_empty());
}

/// Settings-driven setup negotiates patterns, uploads before the policy is
/// assigned and leaves the policy in place.
#[test]
fn test_setup_from_settings_orders_upload_before_policy() -> Result<()> {
    for generation in common::GENERATIONS {
        let server = FakeServer::new(generation);
        server.set_catalog(vec![
            ("java-sqli", Some(0x4)),
            ("php-xss", Some(0x2)),
            ("unknown", None),
        ]);
        let client = common::client(&server);
        let directory = ProjectDirectory::new(&client);
        let document = ScanSettingsDocument::parse(
            r#"{"ProjectName":"shop","ProgrammingLanguage":"Java","UseIncrementalScan":true}"#,
        )?;

        let uploads = RefCell::new(Vec::new());
        let project = directory.setup_from_settings(&document, Some("[]"), |project| {
            let stored = server.project_named("shop").expect("exists before upload");
            assert_eq!(stored.policy, None);
            uploads.borrow_mut().push(project.id);
            Ok(())
        })?;

        assert_eq!(uploads.into_inner(), vec![project.id]);
        let stored = server.project_named("shop").unwrap();
        assert_eq!(stored.settings.enabled, vec!["java-sqli"]);
        assert_eq!(stored.settings.disabled, vec!["php-xss"]);
        assert!(stored.settings.incremental);
        assert_eq!(stored.policy.as_deref(), Some("[]"), "{}", generation);
    }
    Ok(())
}

/// A failing upload stops setup before the policy is assigned.
#[test]
fn test_upload_failure_skips_policy() {
    let server = FakeServer::new(ProtocolVersion::V36);
    let client = common::client(&server);
    let document =
        ScanSettingsDocument::parse(r#"{"ProjectName":"shop","ProgrammingLanguage":"Php"}"#)
            .unwrap();

    let err = ProjectDirectory::new(&client)
        .setup_from_settings(&document, Some("[]"), |_| {
            Err(astward::JobError::unknown("Sources upload failed"))
        })
        .unwrap_err();
    assert_eq!(err.message(), "Sources upload failed");
    assert_eq!(server.request_count("PoliciesRules"), 0);
    assert!(server.project_named("shop").is_some());
}

/// Traced request and response bodies honour the advanced-settings caps and
/// are skipped entirely when trace events are filtered out.
#[test]
fn test_traced_bodies_respect_caps() -> Result<()> {
    use astward::settings::AdvancedSettings;
    use astward::{connect, ProtocolClient, VersionSelection};
    use astward_test_utils::LogCapture;
    use std::sync::Arc;
    use tracing::Level;
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Layer;

    let server = FakeServer::new(ProtocolVersion::V41);
    let settings = AdvancedSettings::default().with_overrides(
        "logging.http.request.max.body.size=8\nlogging.http.response.max.body.size=5",
    );
    let client = connect(
        &common::FakeConnector::new(&server),
        &common::token_connection(),
        Arc::new(settings),
        VersionSelection::Pinned(ProtocolVersion::V41),
        CancellationToken::new(),
    )?;

    let capture = LogCapture::new();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    tracing::subscriber::with_default(subscriber, || {
        client.create_project("traced", &ScanSettings::new(Language::Java))
    })?;

    let traced = capture.messages(Level::TRACE);
    let request_bodies: Vec<&str> = traced
        .iter()
        .filter(|m| m.starts_with("Request POST"))
        .filter_map(|m| m.split(" body: ").nth(1))
        .collect();
    assert_eq!(request_bodies.len(), 1);
    assert_eq!(request_bodies[0].len(), 8);
    let response_bodies: Vec<&str> = traced
        .iter()
        .filter(|m| m.starts_with("Response POST"))
        .filter_map(|m| m.split(" body: ").nth(1))
        .collect();
    assert_eq!(response_bodies.len(), 1);
    assert_eq!(response_bodies[0].len(), 5);

    let quiet = LogCapture::new();
    let subscriber =
        tracing_subscriber::registry().with(quiet.clone().with_filter(LevelFilter::INFO));
    tracing::subscriber::with_default(subscriber, || {
        client.create_project("quiet", &ScanSettings::new(Language::Java))
    })?;
    assert_eq!(quiet.count(Level::TRACE), 0);
    assert!(server.project_named("quiet").is_some());
    Ok(())
}
