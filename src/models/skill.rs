use serde::{Deserialize, Serialize};

/// An installed skill, derived from a subdirectory of the skills root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Skill {
    pub name: String,
    pub description: String,
    pub status: SkillStatus,
    pub path: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SkillStatus {
    Ready,
}
