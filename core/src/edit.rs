//! Per-item edit mode: `Viewing` until the user asks to edit, then
//! `Editing` with a draft title until commit, blur or cancel.
//!
//! Nothing here talks to the store. A commit hands the draft back to the
//! caller, which passes it to `TodoList::begin_rename`.

use crate::types::Todo;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Viewing,
    Editing {
        draft: String,
    },
}

#[derive(Debug, Clone)]
pub struct ItemEditor {
    state: EditState,
    title: String,
}

impl ItemEditor {
    pub fn new(todo: &Todo) -> Self {
        Self {
            state: EditState::Viewing,
            title: todo.title.clone(),
        }
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, EditState::Editing { .. })
    }

    pub fn draft(&self) -> Option<&str> {
        match &self.state {
            EditState::Editing { draft } => Some(draft.as_str()),
            EditState::Viewing => None,
        }
    }

    /// Enter edit mode with the draft set to the record's current title.
    pub fn begin_edit(&mut self) {
        self.state = EditState::Editing {
            draft: self.title.clone(),
        };
    }

    /// Replace the draft text. Ignored unless editing.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        if let EditState::Editing { draft } = &mut self.state {
            *draft = text.into();
        }
    }

    /// Track the record's title. A changed title resets the draft.
    pub fn sync_title(&mut self, title: &str) {
        if self.title == title {
            return;
        }
        self.title = title.to_string();
        if let EditState::Editing { draft } = &mut self.state {
            *draft = self.title.clone();
        }
    }

    /// Leave edit mode and return the draft to rename with, even when it is
    /// unchanged. A blank draft returns `None`.
    pub fn commit(&mut self) -> Option<String> {
        match std::mem::take(&mut self.state) {
            EditState::Editing { draft } if !draft.trim().is_empty() => Some(draft),
            _ => None,
        }
    }

    /// Losing focus commits.
    pub fn blur(&mut self) -> Option<String> {
        self.commit()
    }

    /// Leave edit mode, discarding the draft.
    pub fn cancel(&mut self) {
        self.state = EditState::Viewing;
    }
}
