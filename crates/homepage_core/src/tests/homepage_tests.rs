use super::*;
use crate::memory::MemoryHost;
use serde_json::json;
use settings::{MemorySettingsStore, DEFAULT_PROFILE, MOBILE_PROFILE};
use shared::domain::{HostFeature, Kind};

fn homepage_with(memory: &Arc<MemoryHost>, data: HomepageData) -> Homepage {
    let mut settings = HomepageSettings::default();
    settings.homepages.insert(DEFAULT_PROFILE.to_string(), data);
    let homepage = Homepage::with_settings(
        memory.host(),
        Arc::new(MemorySettingsStore::new()),
        settings,
        DEFAULT_PROFILE,
    );
    homepage.mark_loaded();
    homepage
}

#[test]
fn request_mode_follows_trigger() {
    let data = HomepageData {
        open_mode: OpenMode::ReplaceAll,
        manual_open_mode: OpenMode::ReplaceLast,
        ..HomepageData::default()
    };

    assert_eq!(OpenRequest::new(Trigger::Startup).mode(&data), OpenMode::ReplaceAll);
    assert_eq!(OpenRequest::new(Trigger::Idle).mode(&data), OpenMode::ReplaceAll);
    assert_eq!(OpenRequest::manual(false).mode(&data), OpenMode::ReplaceLast);
    assert_eq!(OpenRequest::manual(true).mode(&data), OpenMode::Retain);
    assert_eq!(OpenRequest::new(Trigger::EmptyPane).mode(&data), OpenMode::Retain);
}

#[tokio::test]
async fn only_the_startup_open_runs_before_load() {
    let memory = MemoryHost::new();
    memory.add_file("Home.md", "");
    let homepage = Homepage::with_settings(
        memory.host(),
        Arc::new(MemorySettingsStore::new()),
        HomepageSettings::default(),
        DEFAULT_PROFILE,
    );

    let outcome = homepage.open(OpenRequest::manual(false)).await;
    assert!(matches!(outcome, LaunchOutcome::Skipped(SkipReason::NotLoaded)));

    let outcome = homepage.open(OpenRequest::new(Trigger::Startup)).await;
    assert!(outcome.pane().is_some());
}

#[tokio::test]
async fn concurrent_launch_is_skipped() {
    let memory = MemoryHost::new();
    let homepage = homepage_with(&memory, HomepageData::default());

    let _held = homepage.gate.try_begin().expect("launch slot");
    assert!(homepage.in_flight());
    let outcome = homepage.open(OpenRequest::manual(false)).await;

    assert!(matches!(outcome, LaunchOutcome::Skipped(SkipReason::InFlight)));
    assert!(memory.notices().is_empty());
}

#[tokio::test]
async fn unavailable_feature_aborts_with_notice() {
    let memory = MemoryHost::new();
    memory.disable_feature(HostFeature::Graph);
    let data = HomepageData {
        kind: Kind::Graph,
        commands: vec!["editor:focus".to_string()],
        ..HomepageData::default()
    };
    let homepage = homepage_with(&memory, data);

    let outcome = homepage.open(OpenRequest::manual(false)).await;

    assert!(matches!(
        outcome,
        LaunchOutcome::Aborted(HomepageError::Unavailable { kind: Kind::Graph })
    ));
    assert_eq!(
        memory.notices(),
        vec!["Homepage cannot be opened due to plugin unavailability.".to_string()]
    );
    assert!(memory.executed_commands().is_empty());
    assert!(!homepage.in_flight());
}

#[tokio::test]
async fn commands_run_in_order_and_failures_are_skipped() {
    let memory = MemoryHost::new();
    memory.add_file("Home.md", "");
    memory.fail_command("broken:command");
    let data = HomepageData {
        commands: vec![
            "broken:command".to_string(),
            "editor:focus".to_string(),
        ],
        ..HomepageData::default()
    };
    let homepage = homepage_with(&memory, data);

    let outcome = homepage.open(OpenRequest::manual(false)).await;

    assert!(outcome.pane().is_some());
    assert_eq!(
        memory.executed_commands(),
        vec!["broken:command".to_string(), "editor:focus".to_string()]
    );
}

#[tokio::test]
async fn nothing_kind_only_runs_commands() {
    let memory = MemoryHost::new();
    let data = HomepageData {
        kind: Kind::None,
        commands: vec!["workspace:new-tab".to_string()],
        ..HomepageData::default()
    };
    let homepage = homepage_with(&memory, data);
    let before = memory.panes();

    let outcome = homepage.open(OpenRequest::manual(false)).await;

    assert!(matches!(outcome, LaunchOutcome::Nothing));
    assert_eq!(memory.panes(), before);
    assert_eq!(memory.executed_commands(), vec!["workspace:new-tab".to_string()]);
}

#[tokio::test]
async fn release_notes_are_hidden_before_launch() {
    let memory = MemoryHost::new();
    memory.add_file("Home.md", "");
    let notes = memory.open_release_notes();
    let data = HomepageData {
        hide_release_notes: true,
        ..HomepageData::default()
    };
    let homepage = homepage_with(&memory, data);

    homepage.open(OpenRequest::manual(false)).await;

    assert!(memory.pane(notes).is_none());
}

#[tokio::test]
async fn updates_are_persisted_immediately() {
    let memory = MemoryHost::new();
    let store = Arc::new(MemorySettingsStore::new());
    let homepage = Homepage::load(memory.host(), store.clone(), Platform::Desktop)
        .await
        .expect("load");
    assert_eq!(store.save_count().await, 0);

    homepage
        .update(|data| data.set_value("Journal/Index"))
        .await
        .expect("update");
    homepage
        .update_settings(|settings| settings.interval_time = Some(10))
        .await
        .expect("update settings");

    assert_eq!(store.save_count().await, 2);
    assert_eq!(homepage.data().await.value, "Journal/Index");
    let document = store.document().await.expect("saved document");
    assert_eq!(
        document["homepages"][DEFAULT_PROFILE]["value"],
        json!("Journal/Index")
    );
    assert_eq!(document["intervalTime"], json!(10));
    assert_eq!(
        homepage.idle_threshold().await,
        Some(std::time::Duration::from_secs(600))
    );
}

#[tokio::test]
async fn mobile_profile_is_seeded_and_saved() {
    let memory = MemoryHost::new();
    let store = Arc::new(MemorySettingsStore::with_document(json!({
        "version": 3,
        "separateMobile": true,
        "homepages": {
            "Main Homepage": { "value": "Desk", "kind": "File" }
        }
    })));

    let homepage = Homepage::load(memory.host(), store.clone(), Platform::Mobile)
        .await
        .expect("load");

    assert_eq!(homepage.name(), MOBILE_PROFILE);
    assert_eq!(homepage.data().await.value, "Desk");
    assert_eq!(store.save_count().await, 1);
    assert!(homepage.settings().await.homepages.contains_key(MOBILE_PROFILE));
}

#[tokio::test]
async fn startup_warning_reflects_periodic_autorun() {
    let memory = MemoryHost::new();
    let homepage = homepage_with(&memory, HomepageData::default());
    assert_eq!(homepage.startup_warning().await, None);

    memory.set_periodic_autorun(true);
    assert_eq!(
        homepage.startup_warning().await,
        Some(STARTUP_CONFLICT_WARNING)
    );
}

#[tokio::test]
async fn opened_panes_report_the_homepage() {
    let memory = MemoryHost::new();
    memory.add_file("Home.md", "");
    let homepage = homepage_with(&memory, HomepageData::default());
    assert!(homepage.opened_panes().await.expect("panes").is_empty());

    let pane = memory.open_pane("Home.md");
    assert_eq!(homepage.opened_panes().await.expect("panes"), vec![pane]);
    assert_eq!(homepage.compute_value().await.expect("value"), "Home");
    assert!(homepage.has_required_feature().await);
}
