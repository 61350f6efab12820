//! Identity and leaderboard collaborator.
//!
//! The game only calls [`ScoreBoard::submit_score`] at round end; sign-in
//! state and rankings are for the HUD and the CLI.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_TOP: usize = 10;
const USERNAME_MAX: usize = 24;

#[derive(Debug, Error)]
pub enum ScoreBoardError {
    #[error("invalid username {0:?}: use 1-24 letters, digits, '-' or '_'")]
    InvalidUsername(String),
    #[error("username {0:?} is already taken")]
    UsernameTaken(String),
    #[error("unknown user {0:?}")]
    UnknownUser(String),
    #[error("not signed in")]
    NotSignedIn,
    #[error("failed to access scoreboard {path}: {source}")]
    Io {
        path:   String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scoreboard: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username:   String,
    pub high_score: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ranking {
    /// 1-based.
    pub rank:       usize,
    pub username:   String,
    pub high_score: u32,
}

pub trait ScoreBoard {
    fn sign_up(&mut self, username: &str) -> Result<(), ScoreBoardError>;
    fn sign_in(&mut self, username: &str) -> Result<(), ScoreBoardError>;
    fn sign_out(&mut self);
    fn current_user(&self) -> Option<&Profile>;

    /// Store `score` for the signed-in user if it beats their best.
    /// Returns whether it was stored.
    fn submit_score(&mut self, score: u32) -> Result<bool, ScoreBoardError>;

    /// Best scores, highest first; ties by username.
    fn top(&self, n: usize) -> Vec<Ranking>;
}

// ════════════════════════════════════════════════════════════════════════════
// LocalScoreBoard
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Serialize, Deserialize)]
struct Stored {
    profiles: Vec<Profile>,
}

/// Profiles kept in memory, optionally mirrored to a JSON file.
#[derive(Debug, Default)]
pub struct LocalScoreBoard {
    profiles: BTreeMap<String, Profile>,
    current:  Option<String>,
    path:     Option<PathBuf>,
}

impl LocalScoreBoard {
    pub fn in_memory() -> Self { Self::default() }

    /// Load from `path`. A missing file starts an empty board there.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScoreBoardError> {
        let path = path.as_ref();
        let mut board = LocalScoreBoard { path: Some(path.to_path_buf()), ..Self::default() };

        let text = match fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no scoreboard yet");
                return Ok(board);
            }
            Err(source) => {
                return Err(ScoreBoardError::Io { path: path.display().to_string(), source });
            }
        };
        let stored: Stored = serde_json::from_str(&text)?;
        board.profiles = stored.profiles.into_iter()
            .map(|p| (p.username.clone(), p))
            .collect();
        Ok(board)
    }

    /// Write the board back to its file, if it has one.
    pub fn save(&self) -> Result<(), ScoreBoardError> {
        let Some(path) = &self.path else { return Ok(()) };
        let stored = Stored { profiles: self.profiles.values().cloned().collect() };
        let text = serde_json::to_string_pretty(&stored)?;
        fs::write(path, text).map_err(|source| ScoreBoardError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    fn check_username(username: &str) -> Result<(), ScoreBoardError> {
        let ok = !username.is_empty()
            && username.len() <= USERNAME_MAX
            && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if ok { Ok(()) } else { Err(ScoreBoardError::InvalidUsername(username.to_string())) }
    }
}

impl ScoreBoard for LocalScoreBoard {
    fn sign_up(&mut self, username: &str) -> Result<(), ScoreBoardError> {
        Self::check_username(username)?;
        if self.profiles.contains_key(username) {
            return Err(ScoreBoardError::UsernameTaken(username.to_string()));
        }
        self.profiles.insert(username.to_string(), Profile {
            username:   username.to_string(),
            high_score: 0,
        });
        if let Err(e) = self.save() {
            self.profiles.remove(username);
            return Err(e);
        }
        self.current = Some(username.to_string());
        info!(user = username, "signed up");
        Ok(())
    }

    fn sign_in(&mut self, username: &str) -> Result<(), ScoreBoardError> {
        if !self.profiles.contains_key(username) {
            return Err(ScoreBoardError::UnknownUser(username.to_string()));
        }
        self.current = Some(username.to_string());
        info!(user = username, "signed in");
        Ok(())
    }

    fn sign_out(&mut self) {
        if let Some(user) = self.current.take() {
            info!(user = %user, "signed out");
        }
    }

    fn current_user(&self) -> Option<&Profile> {
        self.current.as_ref().and_then(|u| self.profiles.get(u))
    }

    fn submit_score(&mut self, score: u32) -> Result<bool, ScoreBoardError> {
        let user = self.current.as_ref().ok_or(ScoreBoardError::NotSignedIn)?;
        let profile = self.profiles.get_mut(user)
            .ok_or_else(|| ScoreBoardError::UnknownUser(user.clone()))?;
        if score <= profile.high_score {
            return Ok(false);
        }
        profile.high_score = score;
        info!(user = %profile.username, score, "new high score");
        self.save()?;
        Ok(true)
    }

    fn top(&self, n: usize) -> Vec<Ranking> {
        let mut all: Vec<&Profile> = self.profiles.values().collect();
        all.sort_by(|a, b| b.high_score.cmp(&a.high_score).then_with(|| a.username.cmp(&b.username)));
        all.into_iter()
            .take(n)
            .enumerate()
            .map(|(i, p)| Ranking { rank: i + 1, username: p.username.clone(), high_score: p.high_score })
            .collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(users: &[(&str, u32)]) -> LocalScoreBoard {
        let mut b = LocalScoreBoard::in_memory();
        for &(name, score) in users {
            b.sign_up(name).unwrap();
            b.submit_score(score).unwrap();
        }
        b.sign_out();
        b
    }

    #[test]
    fn sign_up_signs_in() {
        let mut b = LocalScoreBoard::in_memory();
        b.sign_up("piper").unwrap();
        assert_eq!(b.current_user().map(|p| p.username.as_str()), Some("piper"));
        assert_eq!(b.current_user().map(|p| p.high_score), Some(0));
    }

    #[test]
    fn rejects_bad_and_duplicate_names() {
        let mut b = LocalScoreBoard::in_memory();
        assert!(matches!(b.sign_up(""), Err(ScoreBoardError::InvalidUsername(_))));
        assert!(matches!(b.sign_up("has space"), Err(ScoreBoardError::InvalidUsername(_))));
        b.sign_up("peter").unwrap();
        assert!(matches!(b.sign_up("peter"), Err(ScoreBoardError::UsernameTaken(_))));
        assert!(matches!(b.sign_in("nobody"), Err(ScoreBoardError::UnknownUser(_))));
    }

    #[test]
    fn submit_keeps_only_improvements() {
        let mut b = LocalScoreBoard::in_memory();
        b.sign_up("peter").unwrap();
        assert!(b.submit_score(271).unwrap());
        assert!(!b.submit_score(100).unwrap());
        assert!(!b.submit_score(271).unwrap());
        assert!(b.submit_score(300).unwrap());
        assert_eq!(b.current_user().map(|p| p.high_score), Some(300));
    }

    #[test]
    fn submit_requires_sign_in() {
        let mut b = board_with(&[("piper", 10)]);
        assert!(matches!(b.submit_score(50), Err(ScoreBoardError::NotSignedIn)));
    }

    #[test]
    fn top_ranks_descending() {
        let b = board_with(&[("piper", 173), ("nichochar", 1487), ("peter", 271), ("ann", 173)]);
        let top = b.top(3);
        let names: Vec<&str> = top.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(names, vec!["nichochar", "peter", "ann"]);
        assert_eq!(top[2].rank, 3);
        assert_eq!(b.top(DEFAULT_TOP).len(), 4);
    }

    #[test]
    fn file_board_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");

        let mut b = LocalScoreBoard::open(&path).unwrap();
        b.sign_up("piper").unwrap();
        b.submit_score(420).unwrap();

        let mut again = LocalScoreBoard::open(&path).unwrap();
        assert!(again.current_user().is_none());
        again.sign_in("piper").unwrap();
        assert_eq!(again.current_user().map(|p| p.high_score), Some(420));
    }

    #[test]
    fn failed_sign_up_leaves_board_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("scores.json");

        let mut b = LocalScoreBoard::open(&path).unwrap();
        assert!(matches!(b.sign_up("piper"), Err(ScoreBoardError::Io { .. })));
        assert!(b.current_user().is_none());
        assert!(b.top(DEFAULT_TOP).is_empty());
        assert!(matches!(b.sign_in("piper"), Err(ScoreBoardError::UnknownUser(_))));
    }

    #[test]
    fn corrupt_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(LocalScoreBoard::open(&path), Err(ScoreBoardError::Parse(_))));
    }
}
