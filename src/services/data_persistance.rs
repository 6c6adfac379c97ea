use std::{
    collections::{BTreeSet, HashSet},
    io,
    path::{Path, PathBuf},
};

use tokio::{fs, io::AsyncWriteExt};

use crate::domain::search_query::SearchQuery;

const COMBINED_FILE_NAME: &str = "final_combined_emails.txt";

#[derive(Debug, thiserror::Error)]
#[error("failed to save emails to {}: {source}", .path.display())]
pub struct PersistenceError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Append only email files, one address per line.
#[derive(Debug, Clone)]
pub struct EmailStore {
    output_dir: PathBuf,
}

impl EmailStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        EmailStore {
            output_dir: output_dir.into(),
        }
    }

    pub fn combination_path(&self, query: &SearchQuery) -> PathBuf {
        self.output_dir.join(format!(
            "emails_{}_{}_{}.txt",
            file_component(&query.identity),
            file_component(&query.target_domain),
            file_component(&query.category)
        ))
    }

    pub fn combined_path(&self) -> PathBuf {
        self.output_dir.join(COMBINED_FILE_NAME)
    }

    /// Appends the values not yet present at `destination`, sorted, and returns
    /// how many lines were added. Existing lines are left untouched.
    pub async fn persist(
        &self,
        values: &BTreeSet<String>,
        destination: &Path,
    ) -> Result<usize, PersistenceError> {
        let wrap = |source: io::Error| PersistenceError {
            path: destination.to_path_buf(),
            source,
        };

        let existing = match fs::read_to_string(destination).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(wrap(e)),
        };
        let seen: HashSet<&str> = existing.lines().collect();

        let mut buffer = String::new();
        if !existing.is_empty() && !existing.ends_with('\n') {
            buffer.push('\n');
        }
        // BTreeSet iteration is already sorted
        let new_values: Vec<&String> = values
            .iter()
            .filter(|value| !seen.contains(value.as_str()))
            .collect();
        for value in new_values.iter() {
            buffer.push_str(value);
            buffer.push('\n');
        }

        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(wrap)?;
            }
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(destination)
            .await
            .map_err(wrap)?;
        file.write_all(buffer.as_bytes()).await.map_err(wrap)?;
        file.flush().await.map_err(wrap)?;

        log::info!(
            "Saved {} new emails to {}",
            new_values.len(),
            destination.display()
        );
        Ok(new_values.len())
    }
}

/// Spaces become `_`. Other whitespace, a literal `_`, `%` and path separators
/// are percent-escaped, so distinct terms never share a file.
fn file_component(term: &str) -> String {
    let mut component = String::with_capacity(term.len());
    for c in term.trim().chars() {
        match c {
            ' ' => component.push('_'),
            c if c.is_whitespace() => component.push_str(&format!("%{:02X}", c as u32)),
            '_' => component.push_str("%5F"),
            '%' => component.push_str("%25"),
            '/' => component.push_str("%2F"),
            '\\' => component.push_str("%5C"),
            c => component.push(c),
        }
    }
    component
}
