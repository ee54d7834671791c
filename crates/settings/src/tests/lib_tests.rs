use super::*;
use serde_json::json;
use shared::domain::{Kind, OpenMode, ViewPreference};

#[test]
fn missing_document_yields_defaults() {
    let settings = from_json(None).expect("defaults");
    assert_eq!(settings.version, SCHEMA_VERSION);
    let main = settings.profile(DEFAULT_PROFILE).expect("main profile");
    assert_eq!(main.value, "Home");
    assert_eq!(main.kind, Kind::File);
    assert_eq!(main.open_mode, OpenMode::ReplaceAll);
    assert_eq!(main.manual_open_mode, OpenMode::Retain);
    assert!(main.revert_view);
    assert!(main.auto_create);
    assert!(main.commands.is_empty());
    assert_eq!(settings.idle_threshold(), None);
}

#[test]
fn v3_document_fills_missing_profile_fields() {
    let raw = json!({
        "version": 3,
        "homepages": {
            "Main Homepage": {
                "value": "Dashboard",
                "kind": "Random file",
                "view": "Reading view",
                "hasRibbonIcon": false
            }
        },
        "intervalTime": 2
    });

    let settings = from_json(Some(raw)).expect("settings");
    let main = settings.profile(DEFAULT_PROFILE).expect("main profile");
    assert_eq!(main.kind, Kind::Random);
    assert_eq!(main.view, ViewPreference::Reading);
    assert!(main.commands.is_empty());
    assert!(main.open_on_startup);
    assert_eq!(
        settings.idle_threshold(),
        Some(std::time::Duration::from_secs(120))
    );
}

#[test]
fn migrates_v2_workspace_toggle_to_kind() {
    let raw = json!({
        "version": 2,
        "workspaceEnabled": true,
        "workspace": "Writing",
        "useMoment": true,
        "momentFormat": "YYYY-MM-DD",
        "defaultNote": "Home",
        "openOnStartup": false,
        "openMode": "Replace last note",
        "view": "Editing view (Source)"
    });

    let settings = from_json(Some(raw)).expect("migrated");
    assert_eq!(settings.version, SCHEMA_VERSION);
    assert_eq!(settings.interval_time, Some(5));
    assert!(!settings.separate_mobile);

    let main = settings.profile(DEFAULT_PROFILE).expect("main profile");
    assert_eq!(main.kind, Kind::Workspace);
    assert_eq!(main.value, "Writing");
    assert!(!main.open_on_startup);
    assert_eq!(main.open_mode, OpenMode::ReplaceLast);
    assert_eq!(main.view, ViewPreference::Source);
}

#[test]
fn migrates_v2_moment_and_plain_note() {
    let moment = from_json(Some(json!({
        "version": 2,
        "useMoment": true,
        "momentFormat": "[Journal/]YYYY-MM-DD",
        "defaultNote": "Home"
    })))
    .expect("moment");
    let main = moment.profile(DEFAULT_PROFILE).expect("main");
    assert_eq!(main.kind, Kind::MomentDate);
    assert_eq!(main.value, "[Journal/]YYYY-MM-DD");

    let plain = from_json(Some(json!({
        "version": 2,
        "defaultNote": "Start Here"
    })))
    .expect("plain");
    let main = plain.profile(DEFAULT_PROFILE).expect("main");
    assert_eq!(main.kind, Kind::File);
    assert_eq!(main.value, "Start Here");
    assert!(main.commands.is_empty());
}

#[test]
fn mobile_profile_is_seeded_from_main() {
    let mut settings = HomepageSettings::default();
    settings.profile_mut(DEFAULT_PROFILE).expect("main").value = "Desk".into();

    assert_eq!(settings.ensure_profile(Platform::Mobile), DEFAULT_PROFILE);

    settings.separate_mobile = true;
    assert_eq!(settings.ensure_profile(Platform::Mobile), MOBILE_PROFILE);
    assert_eq!(settings.profile(MOBILE_PROFILE).expect("mobile").value, "Desk");

    settings.profile_mut(MOBILE_PROFILE).expect("mobile").value = "Phone".into();
    settings.ensure_profile(Platform::Mobile);
    assert_eq!(settings.profile(MOBILE_PROFILE).expect("mobile").value, "Phone");
    assert_eq!(settings.ensure_profile(Platform::Desktop), DEFAULT_PROFILE);
}

#[test]
fn sanitizes_note_paths() {
    assert_eq!(sanitize_note("   "), None);
    assert_eq!(sanitize_note("/Notes//Home/").as_deref(), Some("Notes/Home"));
    assert_eq!(sanitize_note("Notes\\Home").as_deref(), Some("Notes/Home"));

    let mut data = HomepageData::default();
    data.set_value("");
    assert_eq!(data.value, DEFAULT_VALUE);
    data.set_value("Daily//Today");
    assert_eq!(data.value, "Daily/Today");
}

#[test]
fn zero_interval_disables_idle_timer() {
    let settings = HomepageSettings {
        interval_time: Some(0),
        ..HomepageSettings::default()
    };
    assert_eq!(settings.idle_threshold(), None);
}

#[tokio::test]
async fn json_file_store_round_trips_settings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonFileStore::new(dir.path().join("nested").join("data.json"));

    let loaded = load(&store).await.expect("load missing");
    assert_eq!(loaded, HomepageSettings::default());

    let mut settings = loaded;
    settings.profile_mut(DEFAULT_PROFILE).expect("main").pin = true;
    store.save(&settings).await.expect("save");

    assert!(store.path().exists());
    let reloaded = load(&store).await.expect("reload");
    assert!(reloaded.profile(DEFAULT_PROFILE).expect("main").pin);
}

#[tokio::test]
async fn memory_store_counts_saves() {
    let store = MemorySettingsStore::with_document(json!({ "version": 2, "defaultNote": "Inbox" }));
    let settings = load(&store).await.expect("load");
    assert_eq!(settings.profile(DEFAULT_PROFILE).expect("main").value, "Inbox");

    store.save(&settings).await.expect("save");
    assert_eq!(store.save_count().await, 1);
    let document = store.document().await.expect("document");
    assert_eq!(document["version"], json!(3));
    assert_eq!(document["homepages"]["Main Homepage"]["kind"], json!("File"));
}

#[test]
fn unknown_profile_is_an_error() {
    let settings = HomepageSettings::default();
    assert!(matches!(
        settings.profile("Tablet"),
        Err(SettingsError::UnknownProfile(name)) if name == "Tablet"
    ));
}
