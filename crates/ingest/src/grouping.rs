use annotations::SingleAnnotatorCorpus;
use std::collections::{BTreeMap, BTreeSet};

use crate::annotators::AnnotatorTable;
use crate::label_studio::MultiAnnotatorCorpus;

/// Canonical name of a raw annotator id. Ids missing from the table (or
/// every id when there is no table) are named by their decimal form.
pub fn resolve_name(id: u64, table: Option<&AnnotatorTable>) -> String {
    table
        .and_then(|t| t.name_for(id))
        .map(str::to_string)
        .unwrap_or_else(|| id.to_string())
}

/// Split a multi-annotator corpus into one corpus per canonical annotator.
///
/// Records from aliased ids that cover the same document are merged.
pub fn group_by_annotator(
    corpus: &MultiAnnotatorCorpus,
    table: Option<&AnnotatorTable>,
) -> BTreeMap<String, SingleAnnotatorCorpus> {
    let mut groups: BTreeMap<String, SingleAnnotatorCorpus> = BTreeMap::new();
    let mut unknown: BTreeSet<u64> = BTreeSet::new();

    for record in &corpus.records {
        if let Some(t) = table {
            if t.name_for(record.annotator_id).is_none() {
                unknown.insert(record.annotator_id);
            }
        }

        let name = resolve_name(record.annotator_id, table);
        groups
            .entry(name.clone())
            .or_insert_with(|| SingleAnnotatorCorpus::new(name))
            .insert(record.file.clone());
    }

    if !unknown.is_empty() {
        tracing::warn!(
            ids = ?unknown,
            "Annotator ids missing from the annotator table, using raw ids as names"
        );
    }

    for (name, group) in &groups {
        tracing::debug!(annotator = %name, documents = group.len(), "Grouped annotations");
    }

    groups
}

/// Merge every record into a single corpus, ignoring who annotated what
pub fn flatten(corpus: &MultiAnnotatorCorpus, name: &str) -> SingleAnnotatorCorpus {
    SingleAnnotatorCorpus::from_files(name, corpus.records.iter().map(|r| r.file.clone()))
}
