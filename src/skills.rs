//! Installed skills, one per subdirectory of the skills root.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::StoreError;
use crate::models::{Skill, SkillStatus};

const METADATA_FILE: &str = "SKILL.md";
const FALLBACK_DESCRIPTION: &str = "No description";

#[derive(Debug, Clone)]
pub struct SkillRegistry {
    root: PathBuf,
    description: Regex,
}

impl SkillRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            description: Regex::new(r"description:\s*([^\r\n]+)")
                .expect("description pattern is valid"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every subdirectory of the root, sorted by name.
    pub async fn list(&self) -> Result<Vec<Skill>, StoreError> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| StoreError::io(&self.root, e))?;

        let mut skills = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.root, e))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if !is_dir {
                continue;
            }

            let path = entry.path();
            skills.push(Skill {
                name: entry.file_name().to_string_lossy().into_owned(),
                description: self.describe(&path).await,
                status: SkillStatus::Ready,
                path: path.to_string_lossy().into_owned(),
            });
        }

        skills.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(skills)
    }

    pub async fn list_or_empty(&self) -> Vec<Skill> {
        self.list().await.unwrap_or_else(|e| {
            tracing::warn!("Skill listing failed: {}", e);
            Vec::new()
        })
    }

    async fn describe(&self, skill_dir: &Path) -> String {
        tokio::fs::read_to_string(skill_dir.join(METADATA_FILE))
            .await
            .ok()
            .and_then(|content| self.extract_description(&content))
            .unwrap_or_else(|| FALLBACK_DESCRIPTION.to_string())
    }

    /// Text after the first `description:`. Blank space after the colon may
    /// span lines, so a value on the following line is still picked up.
    pub fn extract_description(&self, content: &str) -> Option<String> {
        self.description
            .captures(content)
            .map(|caps| caps[1].trim_end().to_string())
    }
}
