//! Assessment state: the comment map and the ordered source list.
//!
//! Every mutation is applied in memory first, then subscribers are notified, then
//! the state is written through the [`Storage`] backend. A failed write is
//! returned to the caller but never rolls back the in-memory change.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::exchange::{export_json, import_json};
use crate::matrix::MatrixDefinition;
use crate::model::{
    Comment, CommentMap, ImageAttachment, MAX_RATING, ReportContext, Source, parse_source_cell,
    source_id, source_ordinal,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredState {
    pub comments: CommentMap,
    pub sources: Vec<Source>,
}

pub trait Storage {
    /// Previously saved state, or `None` when nothing was saved yet.
    fn load(&self) -> Result<Option<StoredState>, Error>;
    fn save(&mut self, state: &StoredState) -> Result<(), Error>;
}

/// State kept in a JSON file using the export format.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Storage for FileStorage {
    fn load(&self) -> Result<Option<StoredState>, Error> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&self.path)?;
        let imported = import_json(&text)?;
        Ok(Some(StoredState {
            comments: imported.comments,
            sources: imported.sources,
        }))
    }

    fn save(&mut self, state: &StoredState) -> Result<(), Error> {
        let text = export_json(&state.comments, &state.sources, Utc::now())?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

/// In-memory storage with an optional byte quota on the serialized state.
#[derive(Default)]
pub struct MemoryStorage {
    data: Option<String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(limit: usize) -> Self {
        Self {
            data: None,
            quota: Some(limit),
        }
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<Option<StoredState>, Error> {
        match &self.data {
            Some(text) => Ok(Some(serde_json::from_str(text)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, state: &StoredState) -> Result<(), Error> {
        let text = serde_json::to_string(state)?;
        if let Some(limit) = self.quota
            && text.len() > limit
        {
            return Err(Error::StorageQuota {
                needed: text.len(),
                limit,
            });
        }
        self.data = Some(text);
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn Fn(&StoredState)>;

pub struct AssessmentStore<S: Storage> {
    storage: S,
    matrix: MatrixDefinition,
    state: StoredState,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl<S: Storage> AssessmentStore<S> {
    /// Open the store over `storage`, starting from whatever it holds.
    pub fn open(storage: S, matrix: MatrixDefinition) -> Result<Self, Error> {
        let state = storage.load()?.unwrap_or_default();
        log::debug!(
            "Store opened with {} comments, {} sources",
            state.comments.len(),
            state.sources.len()
        );
        Ok(Self {
            storage,
            matrix,
            state,
            subscribers: Vec::new(),
            next_subscription: 0,
        })
    }

    pub fn state(&self) -> &StoredState {
        &self.state
    }

    pub fn comments(&self) -> &CommentMap {
        &self.state.comments
    }

    pub fn sources(&self) -> &[Source] {
        &self.state.sources
    }

    pub fn comment(&self, cell: &str) -> Option<&Comment> {
        self.state.comments.get(cell)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Snapshot for one report generation.
    pub fn report_context(&self) -> ReportContext {
        ReportContext::new(self.state.comments.clone(), self.state.sources.clone())
    }

    pub fn subscribe(&mut self, callback: impl Fn(&StoredState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    fn commit(&mut self) -> Result<(), Error> {
        for (_, callback) in &self.subscribers {
            callback(&self.state);
        }
        self.storage.save(&self.state).inspect_err(|e| {
            log::warn!("Assessment state not persisted: {e}");
        })
    }

    fn check_cell(&self, cell: &str) -> Result<(), Error> {
        let known = match parse_source_cell(cell) {
            Some((ordinal, _)) => ordinal <= self.state.sources.len(),
            None => self.matrix.has_cell(cell),
        };
        if known {
            Ok(())
        } else {
            Err(Error::UnknownCell(cell.to_string()))
        }
    }

    /// Apply `edit` to the cell's comment, creating it if needed and dropping it
    /// when it ends up empty.
    fn edit_comment(&mut self, cell: &str, edit: impl FnOnce(&mut Comment)) -> Result<(), Error> {
        self.check_cell(cell)?;
        let comment = self.state.comments.entry(cell.to_string()).or_default();
        edit(comment);
        if !comment.has_content() {
            self.state.comments.remove(cell);
        }
        self.commit()
    }

    /// Set title and content; rating and images are kept.
    pub fn set_text(&mut self, cell: &str, title: &str, content: &str) -> Result<(), Error> {
        self.edit_comment(cell, |c| {
            c.title = title.to_string();
            c.content = content.to_string();
        })
    }

    /// Clear title and content; rating and images are kept.
    pub fn clear_text(&mut self, cell: &str) -> Result<(), Error> {
        self.edit_comment(cell, |c| {
            c.title.clear();
            c.content.clear();
        })
    }

    /// Set or clear the rating; text and images are kept.
    pub fn set_rating(&mut self, cell: &str, rating: Option<u8>) -> Result<(), Error> {
        if let Some(r) = rating
            && r > MAX_RATING
        {
            return Err(Error::InvalidRating(r));
        }
        self.edit_comment(cell, |c| c.rating = rating)
    }

    pub fn add_image(&mut self, cell: &str, image: ImageAttachment) -> Result<(), Error> {
        self.edit_comment(cell, |c| c.images.push(image))
    }

    /// Remove the image at `index`. Out-of-range indices change nothing.
    pub fn remove_image(&mut self, cell: &str, index: usize) -> Result<Option<ImageAttachment>, Error> {
        let has_image = self
            .state
            .comments
            .get(cell)
            .is_some_and(|c| index < c.images.len());
        if !has_image {
            return Ok(None);
        }
        let mut removed = None;
        self.edit_comment(cell, |c| removed = Some(c.images.remove(index)))?;
        Ok(removed)
    }

    pub fn delete_comment(&mut self, cell: &str) -> Result<Option<Comment>, Error> {
        let Some(removed) = self.state.comments.remove(cell) else {
            return Ok(None);
        };
        self.commit()?;
        Ok(Some(removed))
    }

    /// Append a source and return its id (`004.{len+1}`).
    pub fn add_source(&mut self, title: &str, created_at: DateTime<Utc>) -> Result<String, Error> {
        let id = source_id(self.state.sources.len() + 1);
        self.state.sources.push(Source {
            id: id.clone(),
            title: title.to_string(),
            created_at,
        });
        self.commit()?;
        Ok(id)
    }

    pub fn rename_source(&mut self, id: &str, title: &str) -> Result<(), Error> {
        let source = self
            .state
            .sources
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::UnknownSource(id.to_string()))?;
        source.title = title.to_string();
        self.commit()
    }

    /// Remove source `004.k` and renumber the later ones densely. Comment keys are
    /// not moved: every `004.j.*` comment with `j >= k` is deleted, so no
    /// surviving source shows another source's comments.
    pub fn delete_source(&mut self, id: &str) -> Result<Source, Error> {
        let deleted = source_ordinal(id).ok_or_else(|| Error::UnknownSource(id.to_string()))?;
        let position = self
            .state
            .sources
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| Error::UnknownSource(id.to_string()))?;
        let removed = self.state.sources.remove(position);

        for (i, source) in self.state.sources.iter_mut().enumerate() {
            source.id = source_id(i + 1);
        }

        let remaining = self.state.sources.len();
        let before = self.state.comments.len();
        self.state.comments.retain(|key, _| match parse_source_cell(key) {
            Some((ordinal, _)) => ordinal < deleted,
            None => true,
        });
        log::debug!(
            "Deleted source {id}; dropped {} comments, {remaining} sources left",
            before - self.state.comments.len()
        );

        self.commit()?;
        Ok(removed)
    }

    /// Replace the whole state with an import. Nothing changes when parsing fails.
    pub fn import(&mut self, text: &str) -> Result<(), Error> {
        let imported = import_json(text)?;
        log::info!(
            "Imported {} comments, {} sources{}",
            imported.comments.len(),
            imported.sources.len(),
            if imported.legacy { " (legacy format)" } else { "" }
        );
        self.state = StoredState {
            comments: imported.comments,
            sources: imported.sources,
        };
        self.commit()
    }

    pub fn export(&self, export_date: DateTime<Utc>) -> Result<String, Error> {
        export_json(&self.state.comments, &self.state.sources, export_date)
    }
}
