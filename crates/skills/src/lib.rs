//! Markdown skill loader.
//!
//! A skill is a directory containing a `SKILL.md` file: YAML-ish
//! frontmatter (`name`, `description`, optional `version`/`author`/`tags`)
//! followed by a markdown body. Skill descriptions are folded into the
//! agent's system prompt; the full body is loaded on demand.
//!
//! Frontmatter parsing is a simple `key: value` line scanner — skills are
//! trusted local files, so a full YAML parser isn't warranted.

use chrono::{DateTime, Utc};
use loopsmith_core::error::SkillError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Metadata parsed from a skill's frontmatter.
#[derive(Debug, Clone)]
pub struct SkillMetadata {
    pub name: String,
    pub description: String,
    pub version: String,
    pub author: String,
    pub tags: Vec<String>,
}

/// A loaded skill definition.
#[derive(Debug, Clone)]
pub struct Skill {
    pub name: String,
    pub description: String,
    /// Path to the SKILL.md file
    pub path: PathBuf,
    /// The skill directory (may contain scripts/, references/, assets/)
    pub dir: PathBuf,
    pub metadata: SkillMetadata,
    /// The markdown body below the frontmatter
    pub body: String,
    pub loaded_at: DateTime<Utc>,
}

/// Scans a skills directory and serves skill content.
pub struct SkillLoader {
    skills_dir: PathBuf,
    skills: BTreeMap<String, Skill>,
}

impl SkillLoader {
    pub fn new(skills_dir: impl Into<PathBuf>) -> Self {
        Self {
            skills_dir: skills_dir.into(),
            skills: BTreeMap::new(),
        }
    }

    /// Scan the skills directory for `<dir>/SKILL.md` files.
    ///
    /// Returns the names of skills loaded in this scan. A missing skills
    /// directory is not an error — the agent just runs without skills.
    pub fn scan(&mut self) -> Vec<String> {
        if !self.skills_dir.exists() {
            debug!(dir = %self.skills_dir.display(), "No skills directory");
            return Vec::new();
        }

        let entries = match std::fs::read_dir(&self.skills_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.skills_dir.display(), error = %e, "Failed to read skills directory");
                return Vec::new();
            }
        };

        let mut loaded = Vec::new();
        for entry in entries.flatten() {
            let dir = entry.path();
            if !dir.is_dir() {
                continue;
            }
            let skill_md = dir.join("SKILL.md");
            if !skill_md.exists() {
                continue;
            }
            match parse_skill_file(&skill_md) {
                Ok(skill) => {
                    loaded.push(skill.name.clone());
                    self.skills.insert(skill.name.clone(), skill);
                }
                Err(e) => {
                    warn!(path = %skill_md.display(), error = %e, "Skipping invalid skill");
                }
            }
        }
        loaded
    }

    /// Get a loaded skill by name.
    pub fn get(&self, name: &str) -> Option<&Skill> {
        self.skills.get(name)
    }

    /// Render a skill's full content for injection into the conversation.
    pub fn get_skill_content(&self, name: &str) -> Option<String> {
        self.skills
            .get(name)
            .map(|s| format!("# Skill: {}\n\n{}", s.name, s.body))
    }

    /// A one-line-per-skill description block for the system prompt.
    pub fn descriptions(&self) -> String {
        if self.skills.is_empty() {
            return String::new();
        }
        self.skills
            .values()
            .map(|s| format!("- {}: {}", s.name, s.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// List loaded skill names.
    pub fn list(&self) -> Vec<&str> {
        self.skills.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Drop all loaded skills and rescan the directory.
    pub fn reload(&mut self) -> Vec<String> {
        self.skills.clear();
        self.scan()
    }
}

/// Parse a SKILL.md file: frontmatter between `---` fences, then body.
fn parse_skill_file(path: &Path) -> Result<Skill, SkillError> {
    let content = std::fs::read_to_string(path).map_err(|e| SkillError::Io(e.to_string()))?;

    let (frontmatter, body) = split_frontmatter(&content).ok_or_else(|| SkillError::InvalidFile {
        path: path.display().to_string(),
        reason: "missing frontmatter fences".into(),
    })?;

    let fields = parse_frontmatter(frontmatter);
    let name = fields.get("name").cloned().ok_or_else(|| SkillError::InvalidFile {
        path: path.display().to_string(),
        reason: "frontmatter missing 'name'".into(),
    })?;
    let description = fields
        .get("description")
        .cloned()
        .ok_or_else(|| SkillError::InvalidFile {
            path: path.display().to_string(),
            reason: "frontmatter missing 'description'".into(),
        })?;

    let dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
    Ok(Skill {
        name: name.clone(),
        description: description.clone(),
        path: path.to_path_buf(),
        dir,
        metadata: SkillMetadata {
            name,
            description,
            version: fields.get("version").cloned().unwrap_or_else(|| "1.0.0".into()),
            author: fields.get("author").cloned().unwrap_or_default(),
            tags: fields
                .get("tags")
                .map(|v| parse_list(v))
                .unwrap_or_default(),
        },
        body: body.trim().to_string(),
        loaded_at: Utc::now(),
    })
}

/// Split `---\n<frontmatter>\n---\n<body>` into its two halves.
fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let rest = content.strip_prefix("---")?;
    let rest = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n"))?;
    let end = rest.find("\n---")?;
    let frontmatter = &rest[..end];
    let body = rest[end + 4..].trim_start_matches(['-', '\r']).trim_start_matches('\n');
    Some((frontmatter, body))
}

/// Parse frontmatter lines into a key → value map.
fn parse_frontmatter(content: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_string();
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'').to_string();
        if !value.is_empty() {
            fields.insert(key, value);
        }
    }
    fields
}

/// Parse `[a, b, c]` style lists.
fn parse_list(value: &str) -> Vec<String> {
    let inner = value.trim().trim_start_matches('[').trim_end_matches(']');
    inner
        .split(',')
        .map(|v| v.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
