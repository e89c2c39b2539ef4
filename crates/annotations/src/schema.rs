use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Half-open character interval `[start, end)` into a document's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when the two spans share at least one character
    pub fn overlaps(&self, other: &Span) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end && other.start < self.end
    }
}

/// An annotated mention. Two entities are the same entity iff every
/// attribute is equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    file_id: String,
    span: Span,
    text: String,
    dtr: String,
    cuis: BTreeSet<String>,
}

impl Entity {
    pub fn new(
        file_id: impl Into<String>,
        span: Span,
        text: impl Into<String>,
        dtr: impl Into<String>,
        cuis: BTreeSet<String>,
    ) -> Self {
        Self {
            file_id: file_id.into(),
            span,
            text: text.into(),
            dtr: dtr.into(),
            cuis,
        }
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Document time relation
    pub fn dtr(&self) -> &str {
        &self.dtr
    }

    pub fn cuis(&self) -> &BTreeSet<String> {
        &self.cuis
    }
}

/// A labeled link between two entities of the same document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    file_id: String,
    arg1: Entity,
    arg2: Entity,
    label: String,
    directed: bool,
}

impl Relation {
    pub fn new(arg1: Entity, arg2: Entity, label: impl Into<String>, directed: bool) -> Self {
        Self {
            file_id: arg1.file_id.clone(),
            arg1,
            arg2,
            label: label.into(),
            directed,
        }
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn arg1(&self) -> &Entity {
        &self.arg1
    }

    pub fn arg2(&self) -> &Entity {
        &self.arg2
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn directed(&self) -> bool {
        self.directed
    }
}

/// Every entity and relation one annotator produced for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedFile {
    pub file_id: String,
    pub entities: HashSet<Entity>,
    pub relations: HashSet<Relation>,
}

impl AnnotatedFile {
    /// A document with no annotations at all
    pub fn empty(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            entities: HashSet::new(),
            relations: HashSet::new(),
        }
    }

    pub fn new(
        file_id: impl Into<String>,
        entities: impl IntoIterator<Item = Entity>,
        relations: impl IntoIterator<Item = Relation>,
    ) -> Self {
        Self {
            file_id: file_id.into(),
            entities: entities.into_iter().collect(),
            relations: relations.into_iter().collect(),
        }
    }

    /// Union another annotation set for the same document into this one
    pub fn merge(&mut self, other: AnnotatedFile) {
        debug_assert_eq!(self.file_id, other.file_id);
        self.entities.extend(other.entities);
        self.relations.extend(other.relations);
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relations.is_empty()
    }
}

/// The documents attributed to a single annotator, in first-seen order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SingleAnnotatorCorpus {
    pub annotator: String,
    files: Vec<AnnotatedFile>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl SingleAnnotatorCorpus {
    pub fn new(annotator: impl Into<String>) -> Self {
        Self {
            annotator: annotator.into(),
            files: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub fn from_files(
        annotator: impl Into<String>,
        files: impl IntoIterator<Item = AnnotatedFile>,
    ) -> Self {
        let mut corpus = Self::new(annotator);
        for file in files {
            corpus.insert(file);
        }
        corpus
    }

    /// Add a document, merging it into an existing one with the same id
    pub fn insert(&mut self, file: AnnotatedFile) {
        match self.positions.get(&file.file_id) {
            Some(&idx) => self.files[idx].merge(file),
            None => {
                self.positions.insert(file.file_id.clone(), self.files.len());
                self.files.push(file);
            }
        }
    }

    pub fn get(&self, file_id: &str) -> Option<&AnnotatedFile> {
        self.positions.get(file_id).map(|&idx| &self.files[idx])
    }

    pub fn files(&self) -> &[AnnotatedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(file_id: &str, start: usize, end: usize) -> Entity {
        Entity::new(file_id, Span::new(start, end), "x", "OVERLAP", BTreeSet::new())
    }

    #[test]
    fn test_span_overlap_is_half_open() {
        let a = Span::new(0, 10);
        assert!(a.overlaps(&Span::new(9, 12)));
        assert!(!a.overlaps(&Span::new(10, 12)));
        assert!(Span::new(3, 4).overlaps(&a));
        assert!(!Span::new(5, 5).overlaps(&a));
        assert!(!a.overlaps(&Span::new(5, 5)));
        assert!(!Span::new(5, 5).overlaps(&Span::new(5, 5)));
        assert!(Span::new(5, 5).is_empty());
        assert_eq!(a.len(), 10);
    }

    #[test]
    fn test_entity_value_identity() {
        let a = entity("d1", 0, 4);
        let b = entity("d1", 0, 4);
        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&entity("d2", 0, 4)));
    }

    #[test]
    fn test_relation_takes_file_id_from_first_argument() {
        let rel = Relation::new(entity("d9", 0, 1), entity("d9", 2, 3), "Possible", false);
        assert_eq!(rel.file_id(), "d9");
        assert!(!rel.directed());
    }

    #[test]
    fn test_corpus_insert_merges_same_document() {
        let mut corpus = SingleAnnotatorCorpus::new("alice");
        corpus.insert(AnnotatedFile::new("d1", [entity("d1", 0, 1)], []));
        corpus.insert(AnnotatedFile::new("d2", [entity("d2", 0, 1)], []));
        corpus.insert(AnnotatedFile::new("d1", [entity("d1", 5, 6), entity("d1", 0, 1)], []));

        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.files()[0].file_id, "d1");
        assert_eq!(corpus.get("d1").map(|f| f.entities.len()), Some(2));
        assert!(corpus.get("d3").is_none());
    }
}
