//! Conversion of Label Studio JSON exports into annotation sets.
//!
//! Each task in an export is one document. Each (non-cancelled) annotation
//! on a task becomes one [`AnnotationRecord`]: the document as seen by the
//! annotator who completed it.
//!
//! Entity regions are `labels` results. Their concept codes and document
//! time relation are per-region `textarea` / `choices` results sharing the
//! region's `id`. Relations are `relation` results pointing at region ids.

use anyhow::{Context, Result};
use annotations::{AnnotatedFile, CuiNormalizer, Entity, Relation, Span, normalize_label};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};

/// Names of the Label Studio controls the loader reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// `from_name` of the per-region textarea holding CUIs
    pub cui_field: String,
    /// `from_name` of the per-region choices holding the DTR
    pub dtr_field: String,
    /// Key in task `data` identifying the document
    pub file_id_key: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cui_field: "cui".to_string(),
            dtr_field: "dtr".to_string(),
            file_id_key: "file_id".to_string(),
        }
    }
}

/// One annotator's view of one document.
#[derive(Debug, Clone)]
pub struct AnnotationRecord {
    pub annotator_id: u64,
    pub file: AnnotatedFile,
}

/// Every annotation record from an export, across all annotators.
#[derive(Debug, Clone, Default)]
pub struct MultiAnnotatorCorpus {
    pub records: Vec<AnnotationRecord>,
}

impl MultiAnnotatorCorpus {
    pub fn new(records: Vec<AnnotationRecord>) -> Self {
        Self { records }
    }

    pub fn annotator_ids(&self) -> BTreeSet<u64> {
        self.records.iter().map(|r| r.annotator_id).collect()
    }

    pub fn extend(&mut self, other: MultiAnnotatorCorpus) {
        self.records.extend(other.records);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Deserialize)]
struct ExportedTask {
    id: u64,
    #[serde(default)]
    data: Map<String, Value>,
    #[serde(default)]
    annotations: Vec<ExportedAnnotation>,
}

#[derive(Deserialize)]
struct ExportedAnnotation {
    completed_by: CompletedBy,
    #[serde(default)]
    was_cancelled: bool,
    #[serde(default)]
    result: Vec<ResultItem>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CompletedBy {
    Id(u64),
    User { id: u64 },
}

impl CompletedBy {
    fn id(&self) -> u64 {
        match self {
            CompletedBy::Id(id) | CompletedBy::User { id } => *id,
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ResultItem {
    #[serde(alias = "hypertextlabels")]
    Labels { id: String, value: RegionValue },
    Textarea {
        id: String,
        from_name: String,
        value: TextareaValue,
    },
    Choices {
        id: String,
        from_name: String,
        value: ChoicesValue,
    },
    Relation {
        from_id: String,
        to_id: String,
        #[serde(default)]
        direction: Direction,
        #[serde(default)]
        labels: Vec<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct RegionValue {
    start: usize,
    end: usize,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct TextareaValue {
    #[serde(default)]
    text: Vec<String>,
}

#[derive(Deserialize)]
struct ChoicesValue {
    #[serde(default)]
    choices: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Direction {
    #[default]
    Right,
    Left,
    Bi,
}

/// Parse the contents of one export file
pub fn parse_export(json: &str, config: &LoaderConfig) -> Result<MultiAnnotatorCorpus> {
    let tasks: Vec<ExportedTask> =
        serde_json::from_str(json).context("Failed to parse Label Studio export")?;

    let mut normalizer = CuiNormalizer::new();
    let mut records = Vec::new();

    for task in tasks {
        let file_id = task_file_id(&task, &config.file_id_key);

        for annotation in task.annotations {
            if annotation.was_cancelled {
                tracing::debug!(file_id = %file_id, "Skipping cancelled annotation");
                continue;
            }
            let annotator_id = annotation.completed_by.id();
            let file = convert_annotation(&file_id, annotation.result, config, &mut normalizer);
            records.push(AnnotationRecord { annotator_id, file });
        }
    }

    if !normalizer.get_rejected().is_empty() {
        tracing::warn!(
            count = normalizer.get_rejected().len(),
            "Export contained malformed CUIs"
        );
    }

    Ok(MultiAnnotatorCorpus::new(records))
}

fn task_file_id(task: &ExportedTask, key: &str) -> String {
    match task.data.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => task.id.to_string(),
    }
}

fn convert_annotation(
    file_id: &str,
    result: Vec<ResultItem>,
    config: &LoaderConfig,
    normalizer: &mut CuiNormalizer,
) -> AnnotatedFile {
    let mut regions: Vec<(String, RegionValue)> = Vec::new();
    let mut cui_fields: HashMap<String, Vec<String>> = HashMap::new();
    let mut dtrs: HashMap<String, String> = HashMap::new();
    let mut links = Vec::new();

    for item in result {
        match item {
            ResultItem::Labels { id, value } => regions.push((id, value)),
            ResultItem::Textarea {
                id,
                from_name,
                value,
            } if from_name == config.cui_field => {
                cui_fields.entry(id).or_default().extend(value.text);
            }
            ResultItem::Choices {
                id,
                from_name,
                value,
            } if from_name == config.dtr_field => {
                if let Some(choice) = value.choices.into_iter().next() {
                    dtrs.insert(id, normalize_label(&choice));
                }
            }
            ResultItem::Relation {
                from_id,
                to_id,
                direction,
                labels,
            } => links.push((from_id, to_id, direction, labels)),
            _ => {}
        }
    }

    let mut entities: HashMap<String, Entity> = HashMap::new();
    for (id, region) in regions {
        let cuis = normalizer.normalize_all(
            cui_fields
                .get(&id)
                .into_iter()
                .flatten()
                .map(String::as_str),
        );
        let dtr = dtrs.get(&id).cloned().unwrap_or_default();
        let entity = Entity::new(
            file_id,
            Span::new(region.start, region.end),
            region.text,
            dtr,
            cuis,
        );
        entities.insert(id, entity);
    }

    let mut relations = Vec::new();
    for (from_id, to_id, direction, labels) in links {
        let (Some(from), Some(to)) = (entities.get(&from_id), entities.get(&to_id)) else {
            tracing::warn!(
                file_id,
                from_id = %from_id,
                to_id = %to_id,
                "Relation references an unknown region, dropping it"
            );
            continue;
        };

        let label = labels
            .first()
            .map(|l| normalize_label(l))
            .unwrap_or_default();
        let relation = match direction {
            Direction::Right => Relation::new(from.clone(), to.clone(), label, true),
            Direction::Left => Relation::new(to.clone(), from.clone(), label, true),
            Direction::Bi => Relation::new(from.clone(), to.clone(), label, false),
        };
        relations.push(relation);
    }

    AnnotatedFile::new(file_id, entities.into_values(), relations)
}
