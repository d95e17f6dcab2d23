pub mod catalog;
pub mod progress;

use crate::quiz::QuizQuestion;

pub type UnitId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    #[default]
    Video,
    Quiz,
    Article,
    Concept,
}

impl UnitKind {
    pub fn label(&self) -> &'static str {
        match self {
            UnitKind::Video => "video",
            UnitKind::Quiz => "quiz",
            UnitKind::Article => "article",
            UnitKind::Concept => "concept",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct ConceptCard {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningUnit {
    pub id: UnitId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: UnitKind,
    #[serde(default)]
    pub content_url: Option<String>,
    #[serde(default)]
    pub duration: String,
    pub xp_points: u32,
    #[serde(default)]
    pub concept_info: Option<ConceptCard>,
    #[serde(default)]
    pub quiz_questions: Vec<QuizQuestion>,
}

impl LearningUnit {
    pub fn has_evaluation(&self) -> bool {
        !self.quiz_questions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Module {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub units: Vec<LearningUnit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct LearningPath {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub modules: Vec<Module>,
}

impl LearningPath {
    /// Every unit in progression order: module by module, unit by unit.
    pub fn units(&self) -> impl Iterator<Item = &LearningUnit> {
        self.modules.iter().flat_map(|m| m.units.iter())
    }

    pub fn unit(&self, unit_id: &str) -> Option<&LearningUnit> {
        self.units().find(|u| u.id == unit_id)
    }

    pub fn unit_count(&self) -> usize {
        self.modules.iter().map(|m| m.units.len()).sum()
    }
}
