//! Radiation treatment / adverse event typed annotations.
//!
//! An entity is a radiation treatment (RT) iff its concept codes are exactly
//! `{RT_CUI}`. Every entity whose codes do not contain `RT_CUI` is an
//! adverse event, including entities with no codes at all. Entities that
//! carry `RT_CUI` alongside other codes are neither.
//!
//! A causal relation links one RT entity and one adverse event and is
//! graded on the Naranjo-style scale.

use annotations::{Entity, Relation, Span};
use score::{RelationAnnotation, SpanAnnotation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{EvalError, Result};

/// UMLS concept for therapeutic radiology procedures
pub const RT_CUI: &str = "C1522449";

/// Causality grades, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NaranjoScale {
    Doubtful,
    Possible,
    Probable,
    Certain,
}

impl NaranjoScale {
    pub const ALL: [NaranjoScale; 4] = [
        NaranjoScale::Doubtful,
        NaranjoScale::Possible,
        NaranjoScale::Probable,
        NaranjoScale::Certain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NaranjoScale::Doubtful => "Doubtful",
            NaranjoScale::Possible => "Possible",
            NaranjoScale::Probable => "Probable",
            NaranjoScale::Certain => "Certain",
        }
    }
}

impl fmt::Display for NaranjoScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NaranjoScale {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        NaranjoScale::ALL
            .into_iter()
            .find(|grade| grade.as_str() == s)
            .ok_or_else(|| {
                EvalError::InvalidDomainObject(format!("invalid causality label {:?}", s))
            })
    }
}

pub fn is_rt_entity(cuis: &BTreeSet<String>) -> bool {
    cuis.len() == 1 && cuis.contains(RT_CUI)
}

pub fn is_adverse_event_entity(cuis: &BTreeSet<String>) -> bool {
    !cuis.contains(RT_CUI)
}

pub fn validate_causal_label(label: &str) -> bool {
    label.parse::<NaranjoScale>().is_ok()
}

/// An entity whose concept codes are exactly `{RT_CUI}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RtEntity(Entity);

impl RtEntity {
    pub fn entity(&self) -> &Entity {
        &self.0
    }
}

impl TryFrom<Entity> for RtEntity {
    type Error = EvalError;

    fn try_from(entity: Entity) -> Result<Self> {
        if !is_rt_entity(entity.cuis()) {
            return Err(EvalError::InvalidDomainObject(format!(
                "{:?} in {} is not a radiation treatment entity (cuis {:?})",
                entity.text(),
                entity.file_id(),
                entity.cuis()
            )));
        }
        Ok(Self(entity))
    }
}

/// An entity whose concept codes do not include `RT_CUI`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AdverseEventEntity(Entity);

impl AdverseEventEntity {
    pub fn entity(&self) -> &Entity {
        &self.0
    }
}

impl TryFrom<Entity> for AdverseEventEntity {
    type Error = EvalError;

    fn try_from(entity: Entity) -> Result<Self> {
        if !is_adverse_event_entity(entity.cuis()) {
            return Err(EvalError::InvalidDomainObject(format!(
                "{:?} in {} is not an adverse event entity (cuis {:?})",
                entity.text(),
                entity.file_id(),
                entity.cuis()
            )));
        }
        Ok(Self(entity))
    }
}

impl SpanAnnotation for RtEntity {
    fn file_id(&self) -> &str {
        self.0.file_id()
    }

    fn span(&self) -> Span {
        self.0.span()
    }
}

impl SpanAnnotation for AdverseEventEntity {
    fn file_id(&self) -> &str {
        self.0.file_id()
    }

    fn span(&self) -> Span {
        self.0.span()
    }
}

/// A graded causal link from a radiation treatment to an adverse event.
///
/// Arguments are stored treatment first whatever order they were annotated
/// in. For directed relations the annotated order is kept in
/// `adverse_event_first`; for undirected ones it is always false.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CausalRelation {
    file_id: String,
    treatment: RtEntity,
    adverse_event: AdverseEventEntity,
    label: NaranjoScale,
    directed: bool,
    adverse_event_first: bool,
}

impl CausalRelation {
    pub fn new(
        treatment: RtEntity,
        adverse_event: AdverseEventEntity,
        label: NaranjoScale,
        directed: bool,
    ) -> Result<Self> {
        Self::build(treatment, adverse_event, label, directed, false)
    }

    /// Type a generic relation. Fails unless exactly one argument is a
    /// radiation treatment, the other an adverse event, and the label is a
    /// causality grade.
    pub fn try_from_relation(relation: &Relation, directed: bool) -> Result<Self> {
        let label: NaranjoScale = relation.label().parse()?;
        let (arg1, arg2) = (relation.arg1(), relation.arg2());

        if is_rt_entity(arg1.cuis()) && is_adverse_event_entity(arg2.cuis()) {
            let treatment = RtEntity::try_from(arg1.clone())?;
            let adverse_event = AdverseEventEntity::try_from(arg2.clone())?;
            Self::build(treatment, adverse_event, label, directed, false)
        } else if is_adverse_event_entity(arg1.cuis()) && is_rt_entity(arg2.cuis()) {
            let treatment = RtEntity::try_from(arg2.clone())?;
            let adverse_event = AdverseEventEntity::try_from(arg1.clone())?;
            Self::build(treatment, adverse_event, label, directed, true)
        } else {
            Err(EvalError::InvalidDomainObject(format!(
                "relation {:?} -> {:?} in {} does not link a treatment to an adverse event",
                arg1.text(),
                arg2.text(),
                relation.file_id()
            )))
        }
    }

    fn build(
        treatment: RtEntity,
        adverse_event: AdverseEventEntity,
        label: NaranjoScale,
        directed: bool,
        adverse_event_first: bool,
    ) -> Result<Self> {
        if treatment.file_id() != adverse_event.file_id() {
            return Err(EvalError::InvalidDomainObject(format!(
                "causal relation arguments come from different documents ({} and {})",
                treatment.file_id(),
                adverse_event.file_id()
            )));
        }

        Ok(Self {
            file_id: treatment.0.file_id().to_string(),
            treatment,
            adverse_event,
            label,
            directed,
            adverse_event_first: directed && adverse_event_first,
        })
    }

    pub fn treatment(&self) -> &RtEntity {
        &self.treatment
    }

    pub fn adverse_event(&self) -> &AdverseEventEntity {
        &self.adverse_event
    }

    pub fn label(&self) -> NaranjoScale {
        self.label
    }
}

impl RelationAnnotation for CausalRelation {
    type Argument = Entity;
    type Label = NaranjoScale;

    fn file_id(&self) -> &str {
        &self.file_id
    }

    fn arguments(&self) -> (&Entity, &Entity) {
        if self.adverse_event_first {
            (self.adverse_event.entity(), self.treatment.entity())
        } else {
            (self.treatment.entity(), self.adverse_event.entity())
        }
    }

    fn label(&self) -> &NaranjoScale {
        &self.label
    }

    fn directed(&self) -> bool {
        self.directed
    }
}
