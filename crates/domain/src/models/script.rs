//! Script-murder models: the per-room live state and the script metadata
//! it is validated against.
//!
//! Script content (chapter text, art) is out of scope; the engine only
//! consumes the structural metadata carried by [`ScriptDefinition`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use uuid::Uuid;

/// Coarse stage of a script room.
///
/// Transitions are one-way: Lobby -> Play -> Ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptPhase {
    #[default]
    Lobby,
    Play,
    Ended,
}

/// Soft readiness flag a participant sets on themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    #[default]
    Waiting,
    Ready,
}

/// Aggregate counters finalized when the script ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScriptStats {
    pub chapters_completed: u32,
    pub vote_rounds: u32,
    pub punishment_count: u32,
}

/// Live state of one script-murder session, stored as the payload of the
/// `script_murder` game-state document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScriptRoomState {
    pub phase: ScriptPhase,
    pub chapter_index: u32,
    pub total_chapters: u32,
    pub script_id: Option<String>,
    /// Snapshot of the room host at start; authoritative for who may
    /// advance phases for the rest of the session.
    pub host_id: Option<Uuid>,
    /// participant -> role name; a bijection onto a subset of the script's
    /// role list once assigned.
    pub assignments: BTreeMap<Uuid, String>,
    /// participant -> chosen option for the current round. Cleared on
    /// chapter advance.
    pub votes: BTreeMap<Uuid, String>,
    pub vote_timer_end: Option<DateTime<Utc>>,
    /// Whether the current chapter's punishment has been resolved.
    pub punishment_done: bool,
    pub player_statuses: BTreeMap<Uuid, PlayerStatus>,
    pub stats: ScriptStats,
    /// Chapter indices unlocked for re-reading.
    pub bookmarked_chapters: BTreeSet<u32>,
}

/// One chapter's structural nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChapterSpec {
    /// Options of this chapter's vote node, empty when the chapter has no
    /// vote.
    #[serde(default)]
    pub vote_options: Vec<String>,
    #[serde(default)]
    pub has_punishment: bool,
}

impl ChapterSpec {
    pub fn has_vote(&self) -> bool {
        !self.vote_options.is_empty()
    }
}

/// Structural metadata of a script, consumed from the content catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScriptDefinition {
    pub id: String,
    pub title: String,
    pub min_players: i32,
    pub max_players: i32,
    pub roles: Vec<String>,
    pub chapters: Vec<ChapterSpec>,
}

impl ScriptDefinition {
    pub fn total_chapters(&self) -> u32 {
        self.chapters.len() as u32
    }

    pub fn chapter(&self, index: u32) -> Option<&ChapterSpec> {
        self.chapters.get(index as usize)
    }

    /// Minimal script for tests: `roles` sized to `max_players`, every
    /// chapter carrying a two-option vote, the last also a punishment.
    pub fn sample(min_players: i32, max_players: i32, chapters: usize) -> Self {
        Self {
            id: "sample".into(),
            title: "Sample script".into(),
            min_players,
            max_players,
            roles: (1..=max_players).map(|i| format!("role_{}", i)).collect(),
            chapters: (0..chapters)
                .map(|i| ChapterSpec {
                    vote_options: vec!["A".into(), "B".into()],
                    has_punishment: i + 1 == chapters,
                })
                .collect(),
        }
    }
}

/// Catalog of scripts known to this deployment. Content delivery is an
/// external concern; this only holds the structural metadata the engine
/// validates against.
#[derive(Debug, Clone, Default)]
pub struct ScriptCatalog {
    scripts: HashMap<String, ScriptDefinition>,
}

impl ScriptCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog shipped with the backend.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.insert(ScriptDefinition {
            id: "manor_of_masks".into(),
            title: "Manor of Masks".into(),
            min_players: 4,
            max_players: 8,
            roles: vec![
                "The Heir".into(),
                "The Butler".into(),
                "The Doctor".into(),
                "The Widow".into(),
                "The Gardener".into(),
                "The Detective".into(),
                "The Chef".into(),
                "The Stranger".into(),
            ],
            chapters: vec![
                ChapterSpec {
                    vote_options: vec![],
                    has_punishment: false,
                },
                ChapterSpec {
                    vote_options: vec!["search_study".into(), "search_cellar".into()],
                    has_punishment: true,
                },
                ChapterSpec {
                    vote_options: vec![
                        "accuse_butler".into(),
                        "accuse_widow".into(),
                        "accuse_stranger".into(),
                    ],
                    has_punishment: false,
                },
            ],
        });
        catalog.insert(ScriptDefinition {
            id: "midnight_express".into(),
            title: "Midnight Express".into(),
            min_players: 3,
            max_players: 6,
            roles: vec![
                "Conductor".into(),
                "Smuggler".into(),
                "Heiress".into(),
                "Porter".into(),
                "Inspector".into(),
                "Drifter".into(),
            ],
            chapters: vec![
                ChapterSpec {
                    vote_options: vec!["pull_brake".into(), "stay_quiet".into()],
                    has_punishment: true,
                },
                ChapterSpec {
                    vote_options: vec!["open_crate".into(), "wake_inspector".into()],
                    has_punishment: true,
                },
            ],
        });
        catalog
    }

    pub fn insert(&mut self, script: ScriptDefinition) {
        self.scripts.insert(script.id.clone(), script);
    }

    pub fn get(&self, id: &str) -> Option<&ScriptDefinition> {
        self.scripts.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.scripts.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_default_is_lobby() {
        assert_eq!(ScriptPhase::default(), ScriptPhase::Lobby);
    }

    #[test]
    fn test_default_state_is_empty_lobby() {
        let state = ScriptRoomState::default();
        assert_eq!(state.phase, ScriptPhase::Lobby);
        assert_eq!(state.chapter_index, 0);
        assert!(state.assignments.is_empty());
        assert!(state.votes.is_empty());
        assert!(state.vote_timer_end.is_none());
        assert!(!state.punishment_done);
    }

    #[test]
    fn test_chapter_spec_vote_detection() {
        let plain = ChapterSpec::default();
        assert!(!plain.has_vote());

        let voting = ChapterSpec {
            vote_options: vec!["a".into()],
            has_punishment: false,
        };
        assert!(voting.has_vote());
    }

    #[test]
    fn test_builtin_catalog_is_coherent() {
        let catalog = ScriptCatalog::builtin();
        for id in ["manor_of_masks", "midnight_express"] {
            let script = catalog.get(id).unwrap();
            assert!(script.min_players <= script.max_players, "{}", id);
            assert!(
                script.roles.len() as i32 >= script.max_players,
                "{} must have a role for every seat",
                id
            );
            assert!(!script.chapters.is_empty(), "{}", id);
        }
        assert!(!catalog.contains("unknown_script"));
    }

    #[test]
    fn test_sample_script_shape() {
        let script = ScriptDefinition::sample(4, 6, 3);
        assert_eq!(script.total_chapters(), 3);
        assert_eq!(script.roles.len(), 6);
        assert!(script.chapter(2).unwrap().has_punishment);
        assert!(!script.chapter(0).unwrap().has_punishment);
        assert!(script.chapter(3).is_none());
    }

    #[test]
    fn test_state_serde_roundtrip() {
        let mut state = ScriptRoomState::default();
        state.phase = ScriptPhase::Play;
        state.chapter_index = 1;
        state.assignments.insert(Uuid::new_v4(), "The Heir".into());
        state.bookmarked_chapters.insert(0);
        state.bookmarked_chapters.insert(1);

        let json = serde_json::to_value(&state).unwrap();
        let back: ScriptRoomState = serde_json::from_value(json).unwrap();
        assert_eq!(state, back);
    }
}
