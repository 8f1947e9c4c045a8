//! Draft lifecycle: creating, editing, publishing, renaming and deleting.
//!
//! A drafted gist exists only in the store. Publishing uploads it, deletes
//! the drafted record and moves the catalog entry to the remote ID. Files
//! keep their local ID forever; only `gist_id`, `raw_url` and `updated_at`
//! move.

use std::collections::BTreeMap;

use gisting_core::types::{Gist, GistFile, GistStatus, Visibility, timestamp_now};
use gisting_remote::{GistEdit, NewGist, RemoteGist};
use gisting_store::{ContentRecord, DraftedGistRecord, FieldUpdates, Filter, StoreError, fields};
use tracing::{debug, info, instrument, warn};

use crate::engine::SyncEngine;
use crate::error::{Result, SyncError};

/// Content of a file created without any. The API rejects empty files.
pub const PLACEHOLDER_CONTENT: &str = "New File";

/// What a publish did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Identifier before the publish (the draft UUID for first uploads)
    pub previous_id: String,
    /// The gist as it is now
    pub gist: Gist,
    /// Files sent to the remote
    pub uploaded: usize,
}

impl PublishOutcome {
    /// True when the gist moved to a new identifier.
    pub fn rekeyed(&self) -> bool {
        self.previous_id != self.gist.id
    }
}

fn required(value: &str, what: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SyncError::validation(format!("{what} cannot be empty")));
    }
    Ok(value.to_string())
}

fn file_name(value: &str) -> Result<String> {
    let name = required(value, "file name")?;
    if name.contains('/') {
        return Err(SyncError::validation("file name cannot contain '/'"));
    }
    Ok(name)
}

/// Raw URL of `title` in a remote answer.
fn raw_url_of(response: &RemoteGist, title: &str) -> Result<String> {
    response
        .file(title)
        .map(|f| f.raw_url.clone())
        .ok_or_else(|| {
            SyncError::consistency(format!(
                "gist {} has no file {title} after the edit",
                response.id
            ))
        })
}

impl SyncEngine {
    /// Create a drafted gist. No network call.
    #[instrument(skip(self))]
    pub async fn create_gist(&mut self, name: &str, visibility: Visibility) -> Result<Gist> {
        let name = required(name, "gist name")?;
        let gist = Gist::draft(Self::new_id(), name, visibility);

        self.ctx.store.insert(&DraftedGistRecord::from(&gist))?;
        self.catalog.insert_gist(gist.clone());
        info!(gist_id = %gist.id, "created drafted gist");
        Ok(gist)
    }

    /// Add a file to a gist.
    ///
    /// Under a published gist the file is created remotely right away; under
    /// a drafted gist it stays a local draft. Duplicate names are rejected
    /// before any I/O.
    #[instrument(skip(self, content))]
    pub async fn create_file(&mut self, gist_id: &str, title: &str, content: &str) -> Result<GistFile> {
        let title = file_name(title)?;
        let gist = self.require_gist(gist_id)?;
        if self.catalog.contains_title(gist_id, &title) {
            return Err(SyncError::validation(format!(
                "a file named {title} already exists in this gist"
            )));
        }
        let content = if content.is_empty() {
            PLACEHOLDER_CONTENT
        } else {
            content
        };

        let mut file = GistFile::draft(Self::new_id(), &gist, title.as_str(), content);
        let mut gist_updated_at = None;
        if gist.status.is_published() {
            let edit = GistEdit::new().put_file(title.as_str(), content);
            let response = self.ctx.remote.edit_gist(gist_id, &edit).await?;
            file.raw_url = raw_url_of(&response, &title)?;
            file.updated_at = response.updated_at_string();
            file.draft = false;
            gist_updated_at = Some(file.updated_at.clone());
        }

        self.ctx.store.insert(&ContentRecord::from(&file))?;
        if let (Some(updated_at), Some(gist)) = (gist_updated_at, self.catalog.gist_mut(gist_id)) {
            gist.updated_at = updated_at;
        }
        self.catalog.add_file(file.clone())?;
        info!(gist_id, file_id = %file.id, draft = file.draft, "created file");
        Ok(file)
    }

    /// Commit edited content.
    ///
    /// Published files are pushed to the remote and pick up the new raw URL
    /// and timestamp. Unchanged content is a no-op.
    #[instrument(skip(self, content))]
    pub async fn save_file(&mut self, file_id: &str, content: &str) -> Result<GistFile> {
        let mut file = self.require_file(file_id)?;
        if file.content.as_deref() == Some(content) {
            debug!(file_id, "content unchanged; nothing to save");
            return Ok(file);
        }
        if content.is_empty() {
            return Err(SyncError::validation(
                "file content cannot be empty; delete the file instead",
            ));
        }

        let mut updates = FieldUpdates::new().set(fields::CONTENT, content);
        if file.draft {
            file.updated_at = timestamp_now();
        } else {
            let edit = GistEdit::new().put_file(file.title.as_str(), content);
            let response = self.ctx.remote.edit_gist(&file.gist_id, &edit).await?;
            file.raw_url = raw_url_of(&response, &file.title)?;
            file.updated_at = response.updated_at_string();
            updates = updates.set(fields::RAW_URL, file.raw_url.as_str());
            if let Some(gist) = self.catalog.gist_mut(&file.gist_id) {
                gist.updated_at = file.updated_at.clone();
            }
        }
        file.content = Some(content.to_string());
        file.stale = false;
        updates = updates.set(fields::UPDATED_AT, file.updated_at.as_str());

        let persisted = self.persist_file(&file, &updates);
        if let Some(current) = self.catalog.file_mut(file_id) {
            *current = file.clone();
        }
        persisted?;
        info!(file_id, draft = file.draft, "saved file");
        Ok(file)
    }

    /// Upload a gist with its files.
    ///
    /// A drafted gist is created remotely and moves to the remote ID; a
    /// published gist is edited. Draft files and every file whose content is
    /// loaded are sent. Nothing local changes unless the remote call succeeds.
    #[instrument(skip(self))]
    pub async fn publish(&mut self, gist_id: &str) -> Result<PublishOutcome> {
        let gist = self.require_gist(gist_id)?;
        let files: Vec<GistFile> = self
            .catalog
            .files_of(gist_id)
            .into_iter()
            .cloned()
            .collect();
        if files.is_empty() {
            return Err(SyncError::validation("cannot publish a gist without files"));
        }

        let outgoing: Vec<(GistFile, String)> = files
            .into_iter()
            .filter_map(|f| {
                let content = f.content.clone()?;
                (f.draft || !content.is_empty()).then_some((f, content))
            })
            .collect();
        if let Some((file, _)) = outgoing.iter().find(|(_, content)| content.is_empty()) {
            return Err(SyncError::validation(format!(
                "{} is empty; add content before publishing",
                file.title
            )));
        }
        if outgoing.is_empty() {
            debug!(gist_id, "nothing to upload");
            return Ok(PublishOutcome {
                previous_id: gist.id.clone(),
                gist,
                uploaded: 0,
            });
        }

        let contents: BTreeMap<&str, &str> = outgoing
            .iter()
            .map(|(f, content)| (f.title.as_str(), content.as_str()))
            .collect();
        let response = match gist.status {
            GistStatus::Drafted => {
                let body = contents
                    .iter()
                    .fold(NewGist::new(gist.name.as_str(), gist.visibility), |body, (title, content)| {
                        body.file(*title, *content)
                    });
                self.ctx.remote.create_gist(&body).await?
            }
            GistStatus::Published => {
                let edit = contents
                    .iter()
                    .fold(GistEdit::new(), |edit, (title, content)| edit.put_file(*title, *content));
                self.ctx.remote.edit_gist(gist_id, &edit).await?
            }
        };

        // The remote call succeeded; rewrite local state.
        let new_id = response.id.clone();
        let updated_at = response.updated_at_string();
        let mut first_error: Option<StoreError> = None;

        if gist.status == GistStatus::Drafted {
            if let Err(e) = self
                .ctx
                .store
                .delete::<DraftedGistRecord>(&Filter::new().eq(fields::ID, gist_id))
            {
                warn!(gist_id, error = %e, "could not delete drafted gist record");
                first_error.get_or_insert(e);
            }
        }

        for (file, content) in &outgoing {
            let Some(remote_file) = response.file(&file.title) else {
                // Keep it as a draft of the gist it now belongs to
                warn!(gist_id, title = %file.title, "uploaded file missing from response");
                if let Err(e) = self.retarget_draft(file, &new_id) {
                    warn!(file_id = %file.id, error = %e, "could not move draft file to published gist");
                    first_error.get_or_insert(e);
                }
                continue;
            };
            let mut published = file.clone();
            published.gist_id = new_id.clone();
            published.raw_url = remote_file.raw_url.clone();
            published.updated_at = updated_at.clone();
            // Response content may be truncated
            published.content = Some(content.clone());
            published.draft = false;
            published.stale = false;

            let updates = FieldUpdates::new()
                .set(fields::GIST_ID, new_id.as_str())
                .set(fields::RAW_URL, published.raw_url.as_str())
                .set(fields::UPDATED_AT, updated_at.as_str())
                .set(fields::CONTENT, published.content.clone())
                .set(fields::DRAFT, false);
            if let Err(e) = self.persist_file(&published, &updates) {
                warn!(file_id = %file.id, error = %e, "could not update cache record after publish");
                first_error.get_or_insert(e);
            }
            if let Some(current) = self.catalog.file_mut(&file.id) {
                *current = published;
            }
        }

        self.catalog.rekey_gist(gist_id, &new_id)?;
        let Some(current) = self.catalog.gist_mut(&new_id) else {
            return Err(SyncError::consistency(format!("gist {new_id} vanished during publish")));
        };
        current.status = GistStatus::Published;
        current.updated_at = updated_at;
        let gist = current.clone();

        if let Some(e) = first_error {
            return Err(e.into());
        }
        info!(previous_id = gist_id, gist_id = %gist.id, uploaded = outgoing.len(), "published gist");
        Ok(PublishOutcome {
            previous_id: gist_id.to_string(),
            gist,
            uploaded: outgoing.len(),
        })
    }

    /// Rename a gist (its description).
    #[instrument(skip(self))]
    pub async fn rename_gist(&mut self, gist_id: &str, name: &str) -> Result<Gist> {
        let name = required(name, "gist name")?;
        let mut gist = self.require_gist(gist_id)?;
        if gist.name == name {
            return Ok(gist);
        }

        let store = self.ctx.store.clone();
        if gist.status.is_published() {
            let response = self
                .ctx
                .remote
                .edit_gist(gist_id, &GistEdit::new().description(name.as_str()))
                .await?;
            gist.updated_at = response.updated_at_string();
        } else {
            store.update::<DraftedGistRecord>(
                &Filter::new().eq(fields::ID, gist_id),
                &FieldUpdates::new().set(fields::DESCRIPTION, name.as_str()),
            )?;
        }
        gist.name = name;

        if let Some(current) = self.catalog.gist_mut(gist_id) {
            *current = gist.clone();
        }
        let file_ids: Vec<String> = self.catalog.files_of(gist_id).iter().map(|f| f.id.clone()).collect();
        for file_id in file_ids {
            if let Some(file) = self.catalog.file_mut(&file_id) {
                file.description = gist.name.clone();
            }
        }
        store.update::<ContentRecord>(
            &Filter::new().eq(fields::GIST_ID, gist_id),
            &FieldUpdates::new().set(fields::DESCRIPTION, gist.name.as_str()),
        )?;
        info!(gist_id, "renamed gist");
        Ok(gist)
    }

    /// Rename a file. Under a published gist the raw URL changes too.
    #[instrument(skip(self))]
    pub async fn rename_file(&mut self, file_id: &str, title: &str) -> Result<GistFile> {
        let title = file_name(title)?;
        let mut file = self.require_file(file_id)?;
        if file.title == title {
            return Ok(file);
        }
        if self.catalog.contains_title(&file.gist_id, &title) {
            return Err(SyncError::validation(format!(
                "a file named {title} already exists in this gist"
            )));
        }

        let mut updates = FieldUpdates::new().set(fields::TITLE, title.as_str());
        if !file.draft {
            let edit = GistEdit::new().rename_file(file.title.as_str(), title.as_str(), None);
            let response = self.ctx.remote.edit_gist(&file.gist_id, &edit).await?;
            file.raw_url = raw_url_of(&response, &title)?;
            file.updated_at = response.updated_at_string();
            updates = updates
                .set(fields::RAW_URL, file.raw_url.as_str())
                .set(fields::UPDATED_AT, file.updated_at.as_str());
            if let Some(gist) = self.catalog.gist_mut(&file.gist_id) {
                gist.updated_at = file.updated_at.clone();
            }
        }
        file.title = title;

        let persisted = self.persist_file(&file, &updates);
        if let Some(current) = self.catalog.file_mut(file_id) {
            *current = file.clone();
        }
        persisted?;
        info!(file_id, "renamed file");
        Ok(file)
    }

    /// Delete a file, remotely first when it is published.
    #[instrument(skip(self))]
    pub async fn delete_file(&mut self, file_id: &str) -> Result<GistFile> {
        let file = self.require_file(file_id)?;
        if !file.draft {
            let edit = GistEdit::new().delete_file(file.title.as_str());
            let response = self.ctx.remote.edit_gist(&file.gist_id, &edit).await?;
            if let Some(gist) = self.catalog.gist_mut(&file.gist_id) {
                gist.updated_at = response.updated_at_string();
            }
        }

        self.catalog.remove_file(file_id);
        self.ctx
            .store
            .delete::<ContentRecord>(&Filter::new().eq(fields::ID, file_id))?;
        info!(file_id, gist_id = %file.gist_id, "deleted file");
        Ok(file)
    }

    /// Delete a gist with all of its files.
    #[instrument(skip(self))]
    pub async fn delete_gist(&mut self, gist_id: &str) -> Result<Gist> {
        let gist = self.require_gist(gist_id)?;
        let store = self.ctx.store.clone();
        if gist.status.is_published() {
            self.ctx.remote.delete_gist(gist_id).await?;
        } else {
            store.delete::<DraftedGistRecord>(&Filter::new().eq(fields::ID, gist_id))?;
        }

        self.catalog.remove_gist(gist_id);
        store.delete::<ContentRecord>(&Filter::new().eq(fields::GIST_ID, gist_id))?;
        info!(gist_id, "deleted gist");
        Ok(gist)
    }

    /// Apply `updates` to the file's cache record, inserting it when missing.
    fn retarget_draft(&mut self, file: &GistFile, gist_id: &str) -> std::result::Result<(), StoreError> {
        let mut draft = file.clone();
        draft.gist_id = gist_id.to_string();
        draft.draft = true;
        self.persist_file(&draft, &FieldUpdates::new().set(fields::GIST_ID, gist_id))?;
        if let Some(current) = self.catalog.file_mut(&file.id) {
            *current = draft;
        }
        Ok(())
    }

    fn persist_file(&self, file: &GistFile, updates: &FieldUpdates) -> std::result::Result<(), StoreError> {
        let store = &self.ctx.store;
        let touched = store.update::<ContentRecord>(&Filter::new().eq(fields::ID, file.id.as_str()), updates)?;
        if touched == 0 {
            debug!(file_id = %file.id, "cache record missing; inserting");
            store.insert(&ContentRecord::from(file))?;
        }
        Ok(())
    }
}
