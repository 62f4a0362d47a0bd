//! Client-local collections persisted as JSON values in the key/value table.

use crate::db::{self, now_ms};
use crate::lock;
use crate::models::{FavoriteEntry, GenerationRecord, Hadith, SearchHistoryEntry, VideoSource};
use crate::paths::AppPaths;
use crate::Result;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

pub const KEY_FAVORITES: &str = "hadithFavorites";
pub const KEY_SEARCH_HISTORY: &str = "searchHistory";
pub const KEY_GENERATION_HISTORY: &str = "generationHistory";
pub const KEY_NIGHT_MODE: &str = "nightMode";

pub const MAX_SEARCH_HISTORY: usize = 20;

#[derive(Debug, Clone, Default)]
struct Collections {
    favorites: Vec<FavoriteEntry>,
    search_history: Vec<SearchHistoryEntry>,
    generation_history: Vec<GenerationRecord>,
    night_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSnapshot {
    pub favorites: Vec<FavoriteEntry>,
    pub search_history: Vec<SearchHistoryEntry>,
    pub generation_history: Vec<GenerationRecord>,
    pub export_date_ms: i64,
}

/// Favorites, search history, generation history and the night-mode flag.
///
/// Everything is loaded once in [`ClientStore::open`]; each mutation rewrites
/// the affected collection in full.
#[derive(Debug)]
pub struct ClientStore {
    paths: AppPaths,
    state: Mutex<Collections>,
}

impl ClientStore {
    pub fn open(paths: AppPaths) -> Result<Self> {
        let conn = db::open(&paths)?;
        db::migrate(&conn)?;

        let collections = Collections {
            favorites: load_or_default(&conn, KEY_FAVORITES)?,
            search_history: load_or_default(&conn, KEY_SEARCH_HISTORY)?,
            generation_history: load_or_default(&conn, KEY_GENERATION_HISTORY)?,
            night_mode: load_or_default(&conn, KEY_NIGHT_MODE)?,
        };
        info!(
            "client store loaded: {} favorites, {} searches, {} generations",
            collections.favorites.len(),
            collections.search_history.len(),
            collections.generation_history.len()
        );

        Ok(Self {
            paths,
            state: Mutex::new(collections),
        })
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn favorites(&self) -> Vec<FavoriteEntry> {
        lock(&self.state).favorites.clone()
    }

    pub fn is_favorite(&self, hadith: &Hadith) -> bool {
        lock(&self.state)
            .favorites
            .iter()
            .any(|f| f.hadith.text == hadith.text)
    }

    /// Adds the hadith, or removes it when one with the same text is already saved.
    /// Returns whether it is a favorite afterwards.
    pub fn toggle_favorite(&self, hadith: &Hadith) -> Result<bool> {
        let mut state = lock(&self.state);
        let mut next = state.favorites.clone();
        let now_favorite = match next.iter().position(|f| f.hadith.text == hadith.text) {
            Some(index) => {
                next.remove(index);
                false
            }
            None => {
                next.push(FavoriteEntry {
                    hadith: hadith.clone(),
                    saved_at_ms: now_ms(),
                });
                true
            }
        };
        self.persist(KEY_FAVORITES, &next)?;
        state.favorites = next;
        Ok(now_favorite)
    }

    pub fn remove_favorite(&self, index: usize) -> Result<Option<FavoriteEntry>> {
        let mut state = lock(&self.state);
        if index >= state.favorites.len() {
            return Ok(None);
        }
        let mut next = state.favorites.clone();
        let removed = next.remove(index);
        self.persist(KEY_FAVORITES, &next)?;
        state.favorites = next;
        Ok(Some(removed))
    }

    pub fn favorite_at(&self, index: usize) -> Option<FavoriteEntry> {
        lock(&self.state).favorites.get(index).cloned()
    }

    pub fn search_history(&self) -> Vec<SearchHistoryEntry> {
        lock(&self.state).search_history.clone()
    }

    /// Moves `keyword` to the front, dropping older duplicates and anything past the cap.
    pub fn record_search(&self, keyword: &str) -> Result<()> {
        let mut state = lock(&self.state);
        let mut next: Vec<SearchHistoryEntry> = Vec::with_capacity(MAX_SEARCH_HISTORY);
        next.push(SearchHistoryEntry {
            keyword: keyword.to_string(),
            timestamp_ms: now_ms(),
        });
        next.extend(
            state
                .search_history
                .iter()
                .filter(|e| e.keyword != keyword)
                .cloned(),
        );
        next.truncate(MAX_SEARCH_HISTORY);
        self.persist(KEY_SEARCH_HISTORY, &next)?;
        state.search_history = next;
        Ok(())
    }

    pub fn clear_search_history(&self) -> Result<()> {
        let mut state = lock(&self.state);
        let conn = db::open(&self.paths)?;
        db::migrate(&conn)?;
        db::delete_value(&conn, KEY_SEARCH_HISTORY)?;
        state.search_history.clear();
        Ok(())
    }

    pub fn generation_history(&self) -> Vec<GenerationRecord> {
        lock(&self.state).generation_history.clone()
    }

    pub fn append_generation(&self, hadith: &Hadith, video: &VideoSource) -> Result<GenerationRecord> {
        let mut state = lock(&self.state);
        let record = GenerationRecord {
            id: Uuid::new_v4().to_string(),
            hadith: hadith.clone(),
            video: video.clone(),
            created_at_ms: now_ms(),
        };
        let mut next = state.generation_history.clone();
        next.push(record.clone());
        self.persist(KEY_GENERATION_HISTORY, &next)?;
        state.generation_history = next;
        Ok(record)
    }

    pub fn night_mode(&self) -> bool {
        lock(&self.state).night_mode
    }

    pub fn set_night_mode(&self, enabled: bool) -> Result<()> {
        let mut state = lock(&self.state);
        self.persist(KEY_NIGHT_MODE, &enabled)?;
        state.night_mode = enabled;
        Ok(())
    }

    pub fn toggle_night_mode(&self) -> Result<bool> {
        let next = !self.night_mode();
        self.set_night_mode(next)?;
        Ok(next)
    }

    pub fn export_snapshot(&self) -> ExportSnapshot {
        let state = lock(&self.state);
        ExportSnapshot {
            favorites: state.favorites.clone(),
            search_history: state.search_history.clone(),
            generation_history: state.generation_history.clone(),
            export_date_ms: now_ms(),
        }
    }

    /// Writes the snapshot as pretty JSON. A directory target gets a dated file name.
    pub fn export_to(&self, target: Option<PathBuf>) -> Result<PathBuf> {
        let snapshot = self.export_snapshot();
        let path = match target {
            Some(p) if p.is_dir() => p.join(export_file_name(snapshot.export_date_ms)),
            Some(p) => p,
            None => self
                .paths
                .exports_dir()
                .join(export_file_name(snapshot.export_date_ms)),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(&path, format!("{json}\n"))?;
        Ok(path)
    }

    fn persist<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        let conn = db::open(&self.paths)?;
        db::migrate(&conn)?;
        db::put_value(&conn, key, &json)
    }
}

fn export_file_name(export_date_ms: i64) -> String {
    format!("hadith-data-{export_date_ms}.json")
}

fn load_or_default<T: DeserializeOwned + Default>(
    conn: &rusqlite::Connection,
    key: &str,
) -> Result<T> {
    let raw = match db::get_value(conn, key)? {
        Some(v) => v,
        None => return Ok(T::default()),
    };
    match serde_json::from_str::<T>(&raw) {
        Ok(v) => Ok(v),
        Err(e) => {
            warn!("stored value for {key} is unreadable, starting empty: {e}");
            Ok(T::default())
        }
    }
}
