//! The in-memory gist → files mapping.
//!
//! Gists and files live in two tables keyed by their identifiers, with a
//! separate gist → file-id index that keeps file order. Nothing is keyed by a
//! mutable value, so renames and publishes never orphan an entry.

use std::collections::HashMap;

use gisting_core::types::{FileId, Gist, GistFile, GistId};

use crate::error::{Result, SyncError};

/// Name shown for a gist with neither a description nor files.
pub const UNTITLED: &str = "untitled";

/// One gist with its files, as handed to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GistEntry {
    pub gist: Gist,
    pub files: Vec<GistFile>,
}

impl GistEntry {
    /// The description, or the first file name when it is empty.
    pub fn display_name(&self) -> &str {
        display_name(&self.gist, self.files.first())
    }
}

fn display_name<'a>(gist: &'a Gist, first_file: Option<&'a GistFile>) -> &'a str {
    if !gist.name.trim().is_empty() {
        &gist.name
    } else {
        first_file.map(|f| f.title.as_str()).unwrap_or(UNTITLED)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GistCatalog {
    gists: HashMap<GistId, Gist>,
    files: HashMap<FileId, GistFile>,
    index: HashMap<GistId, Vec<FileId>>,
}

impl GistCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.gists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gists.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Insert or replace a gist, keeping its files.
    pub fn insert_gist(&mut self, gist: Gist) {
        self.index.entry(gist.id.clone()).or_default();
        self.gists.insert(gist.id.clone(), gist);
    }

    pub fn gist(&self, id: &str) -> Option<&Gist> {
        self.gists.get(id)
    }

    pub fn gist_mut(&mut self, id: &str) -> Option<&mut Gist> {
        self.gists.get_mut(id)
    }

    pub fn file(&self, id: &str) -> Option<&GistFile> {
        self.files.get(id)
    }

    pub fn file_mut(&mut self, id: &str) -> Option<&mut GistFile> {
        self.files.get_mut(id)
    }

    /// Files of a gist, in insertion order.
    pub fn files_of(&self, gist_id: &str) -> Vec<&GistFile> {
        self.index
            .get(gist_id)
            .map(|ids| ids.iter().filter_map(|id| self.files.get(id)).collect())
            .unwrap_or_default()
    }

    /// Append a file to its gist's list.
    pub fn add_file(&mut self, file: GistFile) -> Result<()> {
        let Some(ids) = self.index.get_mut(&file.gist_id) else {
            return Err(SyncError::consistency(format!(
                "file {} belongs to unknown gist {}",
                file.id, file.gist_id
            )));
        };
        if !ids.contains(&file.id) {
            ids.push(file.id.clone());
        }
        self.files.insert(file.id.clone(), file);
        Ok(())
    }

    pub fn remove_file(&mut self, id: &str) -> Option<GistFile> {
        let file = self.files.remove(id)?;
        if let Some(ids) = self.index.get_mut(&file.gist_id) {
            ids.retain(|f| f != id);
        }
        Some(file)
    }

    /// Remove a gist together with its files.
    pub fn remove_gist(&mut self, id: &str) -> Option<GistEntry> {
        let gist = self.gists.remove(id)?;
        let files = self
            .index
            .remove(id)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|file_id| self.files.remove(&file_id))
            .collect();
        Some(GistEntry { gist, files })
    }

    /// Move a gist to a new identifier in one step.
    ///
    /// The old key disappears, the file index moves along and every file's
    /// `gist_id` is rewritten. File identifiers are untouched.
    pub fn rekey_gist(&mut self, old_id: &str, new_id: &str) -> Result<()> {
        if old_id == new_id {
            return Ok(());
        }
        if self.gists.contains_key(new_id) {
            return Err(SyncError::consistency(format!(
                "cannot move gist {old_id}: {new_id} already exists"
            )));
        }
        let Some(mut gist) = self.gists.remove(old_id) else {
            return Err(SyncError::consistency(format!("unknown gist {old_id}")));
        };

        let ids = self.index.remove(old_id).unwrap_or_default();
        for file_id in &ids {
            if let Some(file) = self.files.get_mut(file_id) {
                file.gist_id = new_id.to_string();
            }
        }
        gist.id = new_id.to_string();
        self.index.insert(new_id.to_string(), ids);
        self.gists.insert(new_id.to_string(), gist);
        Ok(())
    }

    /// Whether `gist_id` already has a file called `title`.
    pub fn contains_title(&self, gist_id: &str, title: &str) -> bool {
        self.files_of(gist_id).iter().any(|f| f.title == title)
    }

    /// Display name of a gist (see [`GistEntry::display_name`]).
    pub fn display_name(&self, gist_id: &str) -> Option<&str> {
        let gist = self.gists.get(gist_id)?;
        let first = self
            .index
            .get(gist_id)
            .and_then(|ids| ids.first())
            .and_then(|id| self.files.get(id));
        Some(display_name(gist, first))
    }

    /// Gists sorted by display name, ties broken by identifier.
    pub fn sorted_gists(&self) -> Vec<&Gist> {
        let mut gists: Vec<(&str, &Gist)> = self
            .gists
            .values()
            .map(|g| (self.display_name(&g.id).unwrap_or(UNTITLED), g))
            .collect();
        gists.sort_by(|(a_name, a), (b_name, b)| a_name.cmp(b_name).then_with(|| a.id.cmp(&b.id)));
        gists.into_iter().map(|(_, g)| g).collect()
    }

    /// Owned, sorted projection for the UI.
    pub fn snapshot(&self) -> Vec<GistEntry> {
        self.sorted_gists()
            .into_iter()
            .map(|gist| GistEntry {
                gist: gist.clone(),
                files: self.files_of(&gist.id).into_iter().cloned().collect(),
            })
            .collect()
    }
}
