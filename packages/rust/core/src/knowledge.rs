//! In-memory knowledge base: an insertion-ordered, newest-first list of notes.

use std::path::Path;

use chrono::Utc;
use tracing::{debug, warn};

use prepagent_shared::{KnowledgeSnippet, PrepAgentError, Result, SnippetId};

/// Build a new snippet with a fresh id and timestamp.
///
/// Title and content must be non-blank; they are stored as given.
pub fn new_snippet(title: impl Into<String>, content: impl Into<String>) -> Result<KnowledgeSnippet> {
    let title = title.into();
    let content = content.into();

    if title.trim().is_empty() || content.trim().is_empty() {
        return Err(PrepAgentError::validation(
            "A note needs both a title and some content.",
        ));
    }

    Ok(KnowledgeSnippet {
        id: SnippetId::new(),
        title,
        content,
        date_added: Utc::now(),
    })
}

/// Build a snippet from a UTF-8 text file, titled after the file stem.
pub fn snippet_from_file(path: &Path) -> Result<KnowledgeSnippet> {
    let content = std::fs::read_to_string(path).map_err(|e| PrepAgentError::io(path, e))?;
    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    new_snippet(title, content)
}

/// The user's notes. Single writer, synchronous mutation.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeStore {
    /// Newest first.
    snippets: Vec<KnowledgeSnippet>,
}

impl KnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a snippet. A snippet whose id is already present is ignored.
    pub fn add(&mut self, snippet: KnowledgeSnippet) -> bool {
        if self.get(&snippet.id).is_some() {
            warn!(id = %snippet.id, "snippet id already present, ignoring");
            return false;
        }
        debug!(id = %snippet.id, title = %snippet.title, "adding snippet");
        self.snippets.insert(0, snippet);
        true
    }

    /// Remove the snippet with `id`. Absent ids are a no-op.
    pub fn remove(&mut self, id: &SnippetId) -> Option<KnowledgeSnippet> {
        let pos = self.snippets.iter().position(|s| &s.id == id)?;
        Some(self.snippets.remove(pos))
    }

    /// All snippets, newest first.
    pub fn list(&self) -> &[KnowledgeSnippet] {
        &self.snippets
    }

    pub fn get(&self, id: &SnippetId) -> Option<&KnowledgeSnippet> {
        self.snippets.iter().find(|s| &s.id == id)
    }

    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn titles(store: &KnowledgeStore) -> Vec<&str> {
        store.list().iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn add_prepends() {
        let mut store = KnowledgeStore::new();
        store.add(new_snippet("first", "a").unwrap());
        store.add(new_snippet("second", "b").unwrap());
        store.add(new_snippet("third", "c").unwrap());

        assert_eq!(titles(&store), vec!["third", "second", "first"]);
    }

    #[test]
    fn remove_missing_id_is_noop() {
        let mut store = KnowledgeStore::new();
        store.add(new_snippet("only", "x").unwrap());

        assert!(store.remove(&SnippetId::new()).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut store = KnowledgeStore::new();
        let snippet = new_snippet("dup", "x").unwrap();
        assert!(store.add(snippet.clone()));
        assert!(!store.add(snippet));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn mixed_adds_and_removes_keep_order_and_unique_ids() {
        let mut store = KnowledgeStore::new();
        let mut ids = Vec::new();
        for i in 0..8 {
            let snippet = new_snippet(format!("note-{i}"), "body").unwrap();
            ids.push(snippet.id);
            store.add(snippet);
        }
        // Remove every third note, plus one that was never added.
        for id in ids.iter().step_by(3) {
            assert!(store.remove(id).is_some());
        }
        store.remove(&SnippetId::new());

        assert_eq!(
            titles(&store),
            vec!["note-7", "note-5", "note-4", "note-2", "note-1"]
        );
        let unique: HashSet<_> = store.list().iter().map(|s| s.id).collect();
        assert_eq!(unique.len(), store.len());
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert!(new_snippet("  ", "content").unwrap_err().is_validation());
        assert!(new_snippet("title", "\n\t").unwrap_err().is_validation());
    }

    #[test]
    fn snippet_from_file_uses_stem_as_title() {
        let path = std::env::temp_dir().join(format!("system-design-{}.md", SnippetId::new()));
        std::fs::write(&path, "CAP theorem notes").unwrap();

        let snippet = snippet_from_file(&path).unwrap();
        assert!(snippet.title.starts_with("system-design-"));
        assert!(!snippet.title.ends_with(".md"));
        assert_eq!(snippet.content, "CAP theorem notes");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn snippet_from_missing_file_is_io_error() {
        let err = snippet_from_file(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, PrepAgentError::Io { .. }));
    }
}
