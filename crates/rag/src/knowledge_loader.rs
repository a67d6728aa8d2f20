//! Knowledge base loader
//!
//! Layout on disk:
//!
//! ```text
//! knowledge/
//!   info/      → collection "info", one document per *.txt file
//!   links/     → collection "links"
//! ```
//!
//! Files directly under the root and nested directories are ignored.

use std::path::{Path, PathBuf};

use postal_assistant_core::{content_uuid, Document};

use crate::RagError;

/// Documents of one collection, sorted by source
#[derive(Debug, Clone)]
pub struct KnowledgeCollection {
    pub name: String,
    pub documents: Vec<Document>,
}

impl KnowledgeCollection {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Reads collections from a directory tree
pub struct KnowledgeLoader {
    root: PathBuf,
    extension: String,
}

impl KnowledgeLoader {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    /// Stable document id shared by the lexical and semantic indexes
    pub fn document_id(collection: &str, source: &str) -> String {
        content_uuid(&format!("{}/{}", collection, source)).to_string()
    }

    /// Load every collection, in sorted name order
    ///
    /// A missing root yields no collections.
    pub fn load(&self) -> Result<Vec<KnowledgeCollection>, RagError> {
        if !self.root.exists() {
            tracing::warn!(path = %self.root.display(), "Knowledge directory does not exist");
            return Ok(Vec::new());
        }

        let mut dirs: Vec<PathBuf> = read_dir(&self.root)?
            .into_iter()
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();

        let mut collections = Vec::with_capacity(dirs.len());
        for dir in dirs {
            let Some(name) = dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                tracing::warn!(path = %dir.display(), "Skipping collection with non UTF-8 name");
                continue;
            };
            let collection = self.load_collection(&name, &dir)?;
            tracing::info!(
                collection = %collection.name,
                documents = collection.len(),
                "Loaded knowledge collection"
            );
            collections.push(collection);
        }

        Ok(collections)
    }

    fn load_collection(&self, name: &str, dir: &Path) -> Result<KnowledgeCollection, RagError> {
        let mut files: Vec<PathBuf> = read_dir(dir)?
            .into_iter()
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|e| e.to_str()) == Some(self.extension.as_str())
            })
            .collect();
        files.sort();

        let mut documents = Vec::with_capacity(files.len());
        for file in files {
            let source = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            let content = std::fs::read_to_string(&file).map_err(|e| {
                RagError::Knowledge(format!("Failed to read {}: {}", file.display(), e))
            })?;

            if content.trim().is_empty() {
                tracing::debug!(file = %file.display(), "Skipping empty knowledge file");
                continue;
            }

            documents.push(Document::new(
                Self::document_id(name, &source),
                content,
                name,
                source,
            ));
        }

        Ok(KnowledgeCollection {
            name: name.to_string(),
            documents,
        })
    }
}

fn read_dir(dir: &Path) -> Result<Vec<PathBuf>, RagError> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        RagError::Knowledge(format!("Failed to read directory {}: {}", dir.display(), e))
    })?;

    entries
        .map(|entry| {
            entry
                .map(|e| e.path())
                .map_err(|e| RagError::Knowledge(format!("Failed to read entry: {}", e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_collections_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("links")).unwrap();
        fs::create_dir(dir.path().join("info")).unwrap();
        fs::write(dir.path().join("info/b.txt"), "Друге").unwrap();
        fs::write(dir.path().join("info/a.txt"), "Перше").unwrap();
        fs::write(dir.path().join("info/notes.md"), "ignored").unwrap();
        fs::write(dir.path().join("links/site.txt"), "https://novaposhta.ua").unwrap();
        fs::write(dir.path().join("stray.txt"), "ignored").unwrap();

        let collections = KnowledgeLoader::new(dir.path(), "txt").load().unwrap();

        assert_eq!(collections.len(), 2);
        assert_eq!(collections[0].name, "info");
        assert_eq!(collections[1].name, "links");
        assert_eq!(collections[0].documents.len(), 2);
        assert_eq!(collections[0].documents[0].source, "a.txt");
        assert_eq!(collections[0].documents[0].content, "Перше");
        assert_eq!(collections[0].documents[0].collection, "info");
    }

    #[test]
    fn test_document_ids_are_stable() {
        let a = KnowledgeLoader::document_id("info", "a.txt");
        assert_eq!(a, KnowledgeLoader::document_id("info", "a.txt"));
        assert_ne!(a, KnowledgeLoader::document_id("links", "a.txt"));
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let collections = KnowledgeLoader::new(dir.path().join("absent"), "txt")
            .load()
            .unwrap();
        assert!(collections.is_empty());
    }

    #[test]
    fn test_empty_files_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("info")).unwrap();
        fs::write(dir.path().join("info/empty.txt"), "  \n").unwrap();

        let collections = KnowledgeLoader::new(dir.path(), "txt").load().unwrap();
        assert!(collections[0].is_empty());
    }
}
