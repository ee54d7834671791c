use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(PaneId);
id_newtype!(ViewId);
id_newtype!(SplitId);

pub const MARKDOWN_VIEW: &str = "markdown";
pub const CANVAS_VIEW: &str = "canvas";
pub const KANBAN_VIEW: &str = "kanban";
pub const GRAPH_VIEW: &str = "graph";
pub const EMPTY_VIEW: &str = "empty";
pub const RELEASE_NOTES_VIEW: &str = "release-notes";

/// Pane types that a homepage can occupy and that `ReplaceAll` clears.
pub const LEAF_TYPES: [&str; 3] = [MARKDOWN_VIEW, CANVAS_VIEW, KANBAN_VIEW];

pub const GRAPH_OPEN_COMMAND: &str = "graph:open";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    File,
    /// A saved workspace layout.
    Workspace,
    #[serde(rename = "Random file")]
    Random,
    #[serde(rename = "Graph view")]
    Graph,
    #[serde(rename = "Nothing")]
    None,
    #[serde(rename = "Daily Note")]
    DailyNote,
    #[serde(rename = "Weekly Note")]
    WeeklyNote,
    #[serde(rename = "Monthly Note")]
    MonthlyNote,
    #[serde(rename = "Yearly Note")]
    YearlyNote,
    /// Legacy date-template file name.
    #[serde(rename = "Date-dependent file")]
    MomentDate,
}

/// What a kind needs from the host before a launch may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Feature(HostFeature),
    Periodicity(Periodicity),
}

impl Kind {
    pub const ALL: [Kind; 10] = [
        Kind::File,
        Kind::Workspace,
        Kind::Random,
        Kind::Graph,
        Kind::None,
        Kind::DailyNote,
        Kind::WeeklyNote,
        Kind::MonthlyNote,
        Kind::YearlyNote,
        Kind::MomentDate,
    ];

    pub fn periodicity(self) -> Option<Periodicity> {
        match self {
            Kind::DailyNote => Some(Periodicity::Daily),
            Kind::WeeklyNote => Some(Periodicity::Weekly),
            Kind::MonthlyNote => Some(Periodicity::Monthly),
            Kind::YearlyNote => Some(Periodicity::Yearly),
            _ => None,
        }
    }

    pub fn required_feature(self) -> Option<Requirement> {
        match self {
            Kind::Workspace => Some(Requirement::Feature(HostFeature::SavedLayouts)),
            Kind::Graph => Some(Requirement::Feature(HostFeature::Graph)),
            other => other.periodicity().map(Requirement::Periodicity),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Kind::File => "File",
            Kind::Workspace => "Workspace",
            Kind::Random => "Random file",
            Kind::Graph => "Graph view",
            Kind::None => "Nothing",
            Kind::DailyNote => "Daily Note",
            Kind::WeeklyNote => "Weekly Note",
            Kind::MonthlyNote => "Monthly Note",
            Kind::YearlyNote => "Yearly Note",
            Kind::MomentDate => "Date-dependent file",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpenMode {
    #[serde(rename = "Replace all open notes")]
    ReplaceAll,
    #[serde(rename = "Replace last note")]
    ReplaceLast,
    #[serde(rename = "Keep open notes")]
    Retain,
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OpenMode::ReplaceAll => "Replace all open notes",
            OpenMode::ReplaceLast => "Replace last note",
            OpenMode::Retain => "Keep open notes",
        })
    }
}

/// Presentation the homepage asks for once opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewPreference {
    #[serde(rename = "Default view")]
    Default,
    #[serde(rename = "Reading view")]
    Reading,
    #[serde(rename = "Editing view (Source)")]
    Source,
    #[serde(rename = "Editing view (Live Preview)")]
    LivePreview,
}

impl ViewPreference {
    /// Applies this preference on top of `current`. `Default` leaves it untouched.
    pub fn apply_to(self, current: DocumentState) -> DocumentState {
        match self {
            ViewPreference::Default => current,
            ViewPreference::Reading => DocumentState {
                mode: DocumentMode::Preview,
                ..current
            },
            ViewPreference::Source => DocumentState {
                mode: DocumentMode::Source,
                source: true,
            },
            ViewPreference::LivePreview => DocumentState {
                mode: DocumentMode::Source,
                source: false,
            },
        }
    }
}

impl fmt::Display for ViewPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViewPreference::Default => "Default view",
            ViewPreference::Reading => "Reading view",
            ViewPreference::Source => "Editing view (Source)",
            ViewPreference::LivePreview => "Editing view (Live Preview)",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentMode {
    Source,
    Preview,
}

/// Editor-level view state of a markdown pane. `source` distinguishes raw
/// source editing from live preview while `mode` is `Source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentState {
    pub mode: DocumentMode,
    pub source: bool,
}

impl Default for DocumentState {
    fn default() -> Self {
        Self {
            mode: DocumentMode::Source,
            source: false,
        }
    }
}

/// Snapshot of a single pane as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaneState {
    pub pane_id: PaneId,
    pub view_id: ViewId,
    pub view_type: String,
    pub file: Option<String>,
    pub document: DocumentState,
    pub pinned: bool,
}

impl PaneState {
    pub fn is_markdown(&self) -> bool {
        self.view_type == MARKDOWN_VIEW
    }

    pub fn is_empty(&self) -> bool {
        self.view_type == EMPTY_VIEW
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Periodicity {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl fmt::Display for Periodicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Periodicity::Daily => "daily",
            Periodicity::Weekly => "weekly",
            Periodicity::Monthly => "monthly",
            Periodicity::Yearly => "yearly",
        })
    }
}

/// Optional host subsystems the engine can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostFeature {
    SavedLayouts,
    Graph,
    ContentIndex,
}

/// Strips the markdown extension, leaving other extensions (e.g. `.canvas`) intact.
pub fn trim_file(path: &str) -> &str {
    path.strip_suffix(".md").unwrap_or(path)
}

/// Inverse of [`trim_file`]: appends `.md` unless the name already carries a
/// note or canvas extension.
pub fn untrim_name(name: &str) -> String {
    if name.ends_with(".md") || name.ends_with(".canvas") {
        name.to_string()
    } else {
        format!("{name}.md")
    }
}

pub fn same_target(path: &str, value: &str) -> bool {
    trim_file(path) == trim_file(value)
}

pub fn same_target_caseless(path: &str, value: &str) -> bool {
    trim_file(path).to_lowercase() == trim_file(value).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_with_legacy_labels() {
        for kind in Kind::ALL {
            let raw = serde_json::to_string(&kind).expect("serialize");
            assert_eq!(raw, format!("\"{}\"", kind.label()));
        }
    }

    #[test]
    fn open_mode_round_trips_legacy_label() {
        let mode: OpenMode = serde_json::from_str("\"Keep open notes\"").expect("mode");
        assert_eq!(mode, OpenMode::Retain);
        assert_eq!(mode.to_string(), "Keep open notes");
    }

    #[test]
    fn required_features_follow_kind() {
        assert_eq!(
            Kind::Workspace.required_feature(),
            Some(Requirement::Feature(HostFeature::SavedLayouts))
        );
        assert_eq!(
            Kind::WeeklyNote.required_feature(),
            Some(Requirement::Periodicity(Periodicity::Weekly))
        );
        assert_eq!(Kind::File.required_feature(), None);
        assert_eq!(Kind::Random.required_feature(), None);
    }

    #[test]
    fn view_preference_sets_mode_and_source_flag() {
        let current = DocumentState {
            mode: DocumentMode::Source,
            source: true,
        };
        assert_eq!(
            ViewPreference::Reading.apply_to(current),
            DocumentState {
                mode: DocumentMode::Preview,
                source: true
            }
        );
        assert!(!ViewPreference::LivePreview.apply_to(current).source);
        assert_eq!(ViewPreference::Default.apply_to(current), current);
    }

    #[test]
    fn trims_only_markdown_extension() {
        assert_eq!(trim_file("Notes/Home.md"), "Notes/Home");
        assert_eq!(trim_file("Board.canvas"), "Board.canvas");
        assert_eq!(untrim_name("Home"), "Home.md");
        assert_eq!(untrim_name("Board.canvas"), "Board.canvas");
        assert!(same_target("Home.md", "Home"));
        assert!(!same_target("home.md", "Home"));
        assert!(same_target_caseless("home.md", "Home"));
    }
}
