//! Client view state.
//!
//! [`TaskBoard`] mirrors the server's item list locally. Each user action
//! issues exactly one request and, on success, patches local state instead
//! of refetching: adds and edits take the server's response, toggles and
//! deletes are applied locally. A failure sets a single error message and
//! leaves everything else as it was; the next success clears it.

use std::fmt;

use crate::api::dto::{CreateItemRequest, ItemResponse, UpdateItemRequest};
use crate::domain::ItemId;

use super::http::{ClientError, ItemsApi};

pub const LOAD_FAILED: &str =
    "Could not reach the task service or load tasks. Make sure the API is running.";
pub const EMPTY_NAME: &str = "Task name cannot be empty.";
pub const CREATE_FAILED: &str = "Could not create the task.";
pub const UPDATE_FAILED: &str = "Could not update the task.";
pub const TOGGLE_FAILED: &str = "Could not update the task status.";
pub const DELETE_FAILED: &str = "Could not delete the task.";

/// Editable text fields of a task.
///
/// Used both for the new-task form and for the per-task edit buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub name: String,
    pub description: String,
    /// `YYYY-MM-DD` or empty.
    pub due_date: String,
}

impl From<&ItemResponse> for TaskDraft {
    fn from(item: &ItemResponse) -> Self {
        Self {
            name: item.name.clone(),
            description: item.description.clone(),
            due_date: item.due_date.clone(),
        }
    }
}

/// The single task currently being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub id: ItemId,
    pub completed: bool,
    pub draft: TaskDraft,
}

/// Builds the full-record update the server expects.
fn full_update(draft: &TaskDraft, completed: bool) -> UpdateItemRequest {
    UpdateItemRequest {
        name: Some(draft.name.clone()),
        description: Some(draft.description.clone()),
        completed: Some(completed),
        due_date: Some(draft.due_date.clone()),
    }
}

// =============================================================================
// Task Board
// =============================================================================

/// Local view of the task list.
#[derive(Debug)]
pub struct TaskBoard<A> {
    api: A,
    tasks: Vec<ItemResponse>,
    error: Option<String>,
    new_task: TaskDraft,
    editing: Option<EditSession>,
}

impl<A: ItemsApi> TaskBoard<A> {
    /// Creates an empty board. Call [`TaskBoard::load`] to populate it.
    pub const fn new(api: A) -> Self {
        Self {
            api,
            tasks: Vec::new(),
            error: None,
            new_task: TaskDraft {
                name: String::new(),
                description: String::new(),
                due_date: String::new(),
            },
            editing: None,
        }
    }

    pub fn tasks(&self) -> &[ItemResponse] {
        &self.tasks
    }

    /// The current error message, if the last action failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The new-task form.
    pub const fn new_task(&self) -> &TaskDraft {
        &self.new_task
    }

    pub const fn new_task_mut(&mut self) -> &mut TaskDraft {
        &mut self.new_task
    }

    pub const fn editing(&self) -> Option<&EditSession> {
        self.editing.as_ref()
    }

    /// The edit buffer, if a task is being edited.
    pub fn draft_mut(&mut self) -> Option<&mut TaskDraft> {
        self.editing.as_mut().map(|session| &mut session.draft)
    }

    /// Returns the API handle.
    pub const fn api(&self) -> &A {
        &self.api
    }

    fn fail(&mut self, message: &str, error: &ClientError) {
        tracing::warn!(%error, "{message}");
        self.error = Some(message.to_string());
    }

    /// Replaces the local list with the server's.
    pub async fn load(&mut self) {
        match self.api.list().await {
            Ok(tasks) => {
                self.tasks = tasks;
                self.error = None;
            }
            Err(error) => self.fail(LOAD_FAILED, &error),
        }
    }

    /// Submits the new-task form.
    ///
    /// A blank name is rejected locally without a request.
    pub async fn add_task(&mut self) {
        if self.new_task.name.trim().is_empty() {
            self.error = Some(EMPTY_NAME.to_string());
            return;
        }

        let request = CreateItemRequest {
            name: Some(self.new_task.name.clone()),
            description: Some(self.new_task.description.clone()),
            due_date: Some(self.new_task.due_date.clone()),
        };
        match self.api.create(request).await {
            Ok(created) => {
                // The server lists newest first.
                self.tasks.insert(0, created);
                self.new_task = TaskDraft::default();
                self.error = None;
            }
            Err(error) => self.fail(CREATE_FAILED, &error),
        }
    }

    /// Enters edit mode for `id`, replacing any edit in progress.
    ///
    /// Returns `false` if no such task is on the board.
    pub fn start_edit(&mut self, id: ItemId) -> bool {
        let Some(task) = self.tasks.iter().find(|task| task.id == id) else {
            return false;
        };
        self.editing = Some(EditSession {
            id,
            completed: task.completed,
            draft: TaskDraft::from(task),
        });
        true
    }

    /// Leaves edit mode, discarding the draft. No request is made.
    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Sends the edit buffer as a full-record update.
    ///
    /// On failure the draft is kept so the user can retry.
    pub async fn save_edit(&mut self) {
        let Some(session) = self.editing.clone() else {
            return;
        };

        let request = full_update(&session.draft, session.completed);
        match self.api.update(session.id, request).await {
            Ok(updated) => {
                self.replace_task(updated);
                self.editing = None;
                self.error = None;
            }
            Err(error) => self.fail(UPDATE_FAILED, &error),
        }
    }

    /// Flips the completion flag of `id`.
    pub async fn toggle(&mut self, id: ItemId) {
        let Some(task) = self.tasks.iter().find(|task| task.id == id) else {
            return;
        };

        let completed = !task.completed;
        let request = full_update(&TaskDraft::from(task), completed);
        match self.api.update(id, request).await {
            Ok(_) => {
                if let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) {
                    task.completed = completed;
                }
                self.error = None;
            }
            Err(error) => self.fail(TOGGLE_FAILED, &error),
        }
    }

    /// Deletes `id` on the server, then locally.
    pub async fn delete(&mut self, id: ItemId) {
        match self.api.delete(id).await {
            Ok(()) => {
                self.tasks.retain(|task| task.id != id);
                if self.editing.as_ref().is_some_and(|session| session.id == id) {
                    self.editing = None;
                }
                self.error = None;
            }
            Err(error) => self.fail(DELETE_FAILED, &error),
        }
    }

    fn replace_task(&mut self, updated: ItemResponse) {
        if let Some(task) = self.tasks.iter_mut().find(|task| task.id == updated.id) {
            *task = updated;
        }
    }
}

impl<A> fmt::Display for TaskBoard<A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(error) = &self.error {
            writeln!(formatter, "! {error}")?;
        }
        if self.tasks.is_empty() {
            return writeln!(formatter, "(no tasks)");
        }
        for task in &self.tasks {
            let mark = if task.completed { 'x' } else { ' ' };
            write!(formatter, "[{mark}] #{} {}", task.id, task.name)?;
            if !task.description.is_empty() {
                write!(formatter, ": {}", task.description)?;
            }
            if !task.due_date.is_empty() {
                write!(formatter, " (due {})", task.due_date)?;
            }
            if self
                .editing
                .as_ref()
                .is_some_and(|session| session.id == task.id)
            {
                write!(formatter, " [editing]")?;
            }
            writeln!(formatter)?;
        }
        Ok(())
    }
}
