use super::*;
use crate::{gate::LaunchGate, memory::MemoryHost};

fn home() -> Target {
    Target::File("Home".to_string())
}

fn vault_with_home() -> std::sync::Arc<MemoryHost> {
    let memory = MemoryHost::new();
    memory.add_file("Home.md", "# Home\n");
    memory.add_file("Other.md", "");
    memory
}

async fn place_with(
    memory: &std::sync::Arc<MemoryHost>,
    data: &HomepageData,
    target: &Target,
    mode: OpenMode,
) -> Result<Option<PaneId>, HomepageError> {
    let gate = LaunchGate::new();
    let token = gate.try_begin().expect("launch slot");
    place(&memory.host(), data, target, mode, &token).await
}

#[tokio::test]
async fn replace_all_leaves_only_the_homepage() {
    let memory = vault_with_home();
    memory.open_pane("Other.md");
    memory.open_pane("Other.md");

    let pane = place_with(&memory, &HomepageData::default(), &home(), OpenMode::ReplaceAll)
        .await
        .expect("place")
        .expect("pane");

    let panes = memory.panes();
    assert_eq!(panes.len(), 1);
    assert_eq!(panes[0].pane_id, pane);
    assert_eq!(panes[0].file.as_deref(), Some("Home.md"));
    assert_eq!(memory.active(), Some(pane));
}

#[tokio::test]
async fn retain_reuses_a_pane_already_showing_the_homepage() {
    let memory = vault_with_home();
    let existing = memory.open_pane("Home.md");
    memory.open_pane("Other.md");
    let before = memory.panes().len();

    let pane = place_with(&memory, &HomepageData::default(), &home(), OpenMode::Retain)
        .await
        .expect("place");

    assert_eq!(pane, Some(existing));
    assert_eq!(memory.panes().len(), before);
    assert_eq!(memory.active(), Some(existing));
}

#[tokio::test]
async fn retain_opens_a_new_tab_next_to_other_notes() {
    let memory = vault_with_home();
    let other = memory.open_pane("Other.md");
    let before = memory.panes().len();

    let pane = place_with(&memory, &HomepageData::default(), &home(), OpenMode::Retain)
        .await
        .expect("place")
        .expect("pane");

    assert_ne!(pane, other);
    assert_eq!(memory.panes().len(), before + 1);
    assert_eq!(
        memory.pane(other).and_then(|state| state.file).as_deref(),
        Some("Other.md")
    );
}

#[tokio::test]
async fn retain_fills_an_empty_active_pane() {
    let memory = vault_with_home();
    let empty = memory.active().expect("initial pane");

    let pane = place_with(&memory, &HomepageData::default(), &home(), OpenMode::Retain)
        .await
        .expect("place");

    assert_eq!(pane, Some(empty));
    assert_eq!(memory.panes().len(), 1);
}

#[tokio::test]
async fn replace_last_unpins_and_replaces_the_active_pane() {
    let memory = vault_with_home();
    let other = memory.open_pane("Other.md");
    memory
        .host()
        .workspace
        .set_pinned(other, true)
        .await
        .expect("pin");

    let pane = place_with(&memory, &HomepageData::default(), &home(), OpenMode::ReplaceLast)
        .await
        .expect("place");

    assert_eq!(pane, Some(other));
    let state = memory.pane(other).expect("pane");
    assert_eq!(state.file.as_deref(), Some("Home.md"));
    assert!(!state.pinned);
}

#[tokio::test]
async fn missing_file_without_auto_create_touches_nothing() {
    let memory = MemoryHost::new();
    memory.add_file("Other.md", "");
    let other = memory.open_pane("Other.md");
    let before = memory.panes();

    let data = HomepageData {
        auto_create: false,
        ..HomepageData::default()
    };
    let err = place_with(&memory, &data, &home(), OpenMode::ReplaceAll)
        .await
        .expect_err("missing file");

    assert!(matches!(err, HomepageError::MissingFile { ref target } if target == "Home"));
    assert_eq!(memory.panes(), before);
    assert_eq!(memory.active(), Some(other));
}

#[tokio::test]
async fn missing_file_is_created_with_markdown_extension() {
    let memory = MemoryHost::new();
    let target = Target::File("Notes/Start".to_string());

    let pane = place_with(&memory, &HomepageData::default(), &target, OpenMode::ReplaceAll)
        .await
        .expect("place")
        .expect("pane");

    assert!(memory.files().contains(&"Notes/Start.md".to_string()));
    assert_eq!(
        memory.pane(pane).and_then(|state| state.file).as_deref(),
        Some("Notes/Start.md")
    );
}

#[tokio::test]
async fn graph_in_retain_mode_gets_its_own_pane_and_is_reused() {
    let memory = vault_with_home();
    let other = memory.open_pane("Other.md");

    let graph = place_with(&memory, &HomepageData::default(), &Target::Graph, OpenMode::Retain)
        .await
        .expect("place")
        .expect("graph pane");

    assert_ne!(graph, other);
    assert_eq!(memory.pane(graph).expect("pane").view_type, GRAPH_VIEW);
    assert_eq!(memory.executed_commands(), vec![GRAPH_OPEN_COMMAND.to_string()]);
    assert_eq!(
        memory.pane(other).and_then(|state| state.file).as_deref(),
        Some("Other.md")
    );

    let count = memory.panes().len();
    let again = place_with(&memory, &HomepageData::default(), &Target::Graph, OpenMode::Retain)
        .await
        .expect("place");
    assert_eq!(again, Some(graph));
    assert_eq!(memory.panes().len(), count);
}

#[tokio::test]
async fn opened_panes_ignore_the_markdown_extension() {
    let memory = vault_with_home();
    let pane = memory.open_pane("Home.md");
    memory.open_pane("Other.md");

    let host = memory.host();
    assert_eq!(opened_panes(&host, &home()).await, vec![pane]);
    assert_eq!(
        opened_panes(&host, &Target::File("Home.md".to_string())).await,
        vec![pane]
    );
    assert!(opened_panes(&host, &Target::Nothing).await.is_empty());
}

#[tokio::test]
async fn saved_layouts_must_exist() {
    let memory = vault_with_home();
    memory.add_layout("Writing", &["Home.md", "Other.md"]);
    let host = memory.host();

    let err = place_layout(&host, "Reading")
        .await
        .expect_err("unknown layout");
    assert!(matches!(err, HomepageError::MissingLayout { ref name } if name == "Reading"));
    assert_eq!(memory.loaded_layout(), None);

    place_layout(&host, "Writing").await.expect("load layout");
    assert_eq!(memory.loaded_layout().as_deref(), Some("Writing"));
    assert_eq!(memory.panes().len(), 2);
}
