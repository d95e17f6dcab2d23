use std::collections::HashSet;
use std::io::Read;

use log::info;

use crate::path::LearningPath;
use crate::quiz::InvalidQuestion;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unable to parse the path catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("path slug {0} is used more than once")]
    DuplicateSlug(String),

    #[error("path {path}: unit id {unit_id} is used more than once")]
    DuplicateUnit { path: String, unit_id: String },

    #[error("path {path}: unit {unit_id} must award at least 1 XP")]
    NoXp { path: String, unit_id: String },

    #[error("path {path}, unit {unit_id}: {source}")]
    InvalidQuestion {
        path: String,
        unit_id: String,
        source: InvalidQuestion,
    },
}

/// All learning paths the bot offers, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    paths: Vec<LearningPath>,
}

impl Catalog {
    pub fn load(reader: impl Read) -> Result<Self, CatalogError> {
        let paths: Vec<LearningPath> = serde_json::from_reader(reader)?;
        let catalog = Self::new(paths)?;
        info!(
            "Loaded {} learning path(s) with {} unit(s)",
            catalog.paths.len(),
            catalog.paths.iter().map(|p| p.unit_count()).sum::<usize>()
        );
        Ok(catalog)
    }

    pub fn new(paths: Vec<LearningPath>) -> Result<Self, CatalogError> {
        let mut slugs = HashSet::new();
        for path in &paths {
            if !slugs.insert(path.slug.as_str()) {
                return Err(CatalogError::DuplicateSlug(path.slug.clone()));
            }
            validate_path(path)?;
        }
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &[LearningPath] {
        &self.paths
    }

    pub fn get_by_slug(&self, slug: &str) -> Option<&LearningPath> {
        self.paths.iter().find(|p| p.slug == slug)
    }

    pub fn get_by_title(&self, title: &str) -> Option<&LearningPath> {
        self.paths.iter().find(|p| p.title == title)
    }
}

fn validate_path(path: &LearningPath) -> Result<(), CatalogError> {
    let mut unit_ids = HashSet::new();
    for unit in path.units() {
        if !unit_ids.insert(unit.id.as_str()) {
            return Err(CatalogError::DuplicateUnit {
                path: path.slug.clone(),
                unit_id: unit.id.clone(),
            });
        }
        if unit.xp_points == 0 {
            return Err(CatalogError::NoXp {
                path: path.slug.clone(),
                unit_id: unit.id.clone(),
            });
        }
        for question in &unit.quiz_questions {
            question
                .validate()
                .map_err(|source| CatalogError::InvalidQuestion {
                    path: path.slug.clone(),
                    unit_id: unit.id.clone(),
                    source,
                })?;
        }
    }
    Ok(())
}
