//! Shared todo list
//!
//! A small list kept in memory and optionally mirrored to a JSON file.
//! The in-memory list is authoritative; a failed write is reported but
//! never rolls back the change.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::types::TodoId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
}

impl Todo {
    pub fn new(id: impl Into<TodoId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// On-disk layout: `{ "todos": [...] }`
#[derive(Debug, Serialize, Deserialize)]
struct TodoFile {
    todos: Vec<Todo>,
}

#[derive(Debug)]
pub struct TodoList {
    todos: Vec<Todo>,
    path: Option<PathBuf>,
}

impl Default for TodoList {
    fn default() -> Self {
        Self {
            todos: default_todos(),
            path: None,
        }
    }
}

fn default_todos() -> Vec<Todo> {
    vec![
        Todo::new("1", "Eat"),
        Todo::new("2", "Sleep"),
        Todo::new("3", "Repeat"),
    ]
}

impl TodoList {
    /// In-memory list seeded with the default entries
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`, seeding defaults if the file does not exist yet
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let list = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            let file: TodoFile = serde_json::from_str(&contents)?;
            info!("Loaded {} todos from {}", file.todos.len(), path.display());
            Self {
                todos: file.todos,
                path: Some(path),
            }
        } else {
            let list = Self {
                todos: default_todos(),
                path: Some(path),
            };
            list.persist()?;
            list
        };

        Ok(list)
    }

    pub fn all(&self) -> &[Todo] {
        &self.todos
    }

    /// Append a todo with a fresh id
    ///
    /// The todo is added even if persisting fails.
    pub fn add(&mut self, title: String) -> Result<TodoId, StoreError> {
        let id = loop {
            let id = TodoId::generate();
            if !self.todos.iter().any(|t| t.id == id) {
                break id;
            }
        };

        debug!("Adding todo {} '{}'", id, title);
        self.todos.push(Todo {
            id: id.clone(),
            title,
        });
        self.persist()?;

        Ok(id)
    }

    /// Remove a todo by id
    ///
    /// Returns whether anything was removed. Unknown ids are not an error.
    pub fn remove(&mut self, id: &TodoId) -> Result<bool, StoreError> {
        let before = self.todos.len();
        self.todos.retain(|t| &t.id != id);

        if self.todos.len() == before {
            return Ok(false);
        }

        debug!("Removed todo {}", id);
        self.persist()?;
        Ok(true)
    }

    fn persist(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(&TodoFile {
            todos: self.todos.clone(),
        })?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("room_chat_{}_{}.json", name, uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_seeded_defaults() {
        let list = TodoList::new();
        let titles: Vec<_> = list.all().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["Eat", "Sleep", "Repeat"]);
    }

    #[test]
    fn test_add_and_remove() {
        let mut list = TodoList::new();

        let id = list.add("Code".to_string()).unwrap();
        assert_eq!(list.all().len(), 4);
        assert_eq!(list.all().last().unwrap().title, "Code");

        assert!(list.remove(&id).unwrap());
        assert_eq!(list.all().len(), 3);
    }

    #[test]
    fn test_remove_unknown_id() {
        let mut list = TodoList::new();
        assert!(!list.remove(&TodoId::from("zzzz")).unwrap());
        assert_eq!(list.all(), default_todos().as_slice());
    }

    #[test]
    fn test_file_round_trip() {
        let path = temp_path("round_trip");

        {
            let mut list = TodoList::open(&path).unwrap();
            assert!(path.exists());
            list.add("Code".to_string()).unwrap();
            list.remove(&TodoId::from("2")).unwrap();
        }

        let reopened = TodoList::open(&path).unwrap();
        let titles: Vec<_> = reopened.all().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["Eat", "Repeat", "Code"]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_open_rejects_malformed_file() {
        let path = temp_path("malformed");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(TodoList::open(&path), Err(StoreError::Json(_))));

        let _ = std::fs::remove_file(&path);
    }
}
