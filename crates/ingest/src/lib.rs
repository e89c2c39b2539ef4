pub mod annotators;
pub mod grouping;
pub mod label_studio;
pub mod reader;

pub use annotators::AnnotatorTable;
pub use grouping::{flatten, group_by_annotator, resolve_name};
pub use label_studio::{AnnotationRecord, LoaderConfig, MultiAnnotatorCorpus, parse_export};
pub use reader::FileReader;

use anyhow::{Context, Result};
use std::path::Path;

/// Load an export file, or every export under a directory
pub async fn load_corpus(path: &Path, config: &LoaderConfig) -> Result<MultiAnnotatorCorpus> {
    if path.is_dir() {
        let mut corpus = MultiAnnotatorCorpus::default();

        for (file, content) in FileReader::read_exports(path).await? {
            let part = parse_export(&content, config)
                .with_context(|| format!("Failed to load export {:?}", file))?;
            tracing::info!(path = ?file, records = part.len(), "Loaded export");
            corpus.extend(part);
        }

        if corpus.is_empty() {
            tracing::warn!(path = ?path, "No annotation records found");
        }
        return Ok(corpus);
    }

    let content = FileReader::read_export(path).await?;
    let corpus = parse_export(&content, config)
        .with_context(|| format!("Failed to load export {:?}", path))?;
    tracing::info!(path = ?path, records = corpus.len(), "Loaded export");

    Ok(corpus)
}

/// Load the annotator id lookup table
pub async fn load_annotator_table(path: &Path) -> Result<AnnotatorTable> {
    let content = FileReader::read_file(path).await?;
    let table = AnnotatorTable::parse(&content)
        .with_context(|| format!("Failed to parse annotator table {:?}", path))?;
    tracing::info!(path = ?path, ids = table.len(), "Loaded annotator table");

    Ok(table)
}
