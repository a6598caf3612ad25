//! Prompt library for the AI backends
//!
//! Prompts are markdown files with YAML front matter and `# System` /
//! `# User` sections. An override in
//! `<data_local_dir>/finiq/prompts/overrides/<id>.md` wins over the copy
//! compiled into the binary.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

mod defaults {
    pub const CLASSIFY_BUCKET: &str = include_str!("../../../prompts/classify_bucket.md");
    pub const COACHING_MESSAGES: &str = include_str!("../../../prompts/coaching_messages.md");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    ClassifyBucket,
    CoachingMessages,
}

impl PromptId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClassifyBucket => "classify_bucket",
            Self::CoachingMessages => "coaching_messages",
        }
    }

    pub fn all() -> &'static [PromptId] {
        &[Self::ClassifyBucket, Self::CoachingMessages]
    }

    fn default_content(&self) -> &'static str {
        match self {
            Self::ClassifyBucket => defaults::CLASSIFY_BUCKET,
            Self::CoachingMessages => defaults::COACHING_MESSAGES,
        }
    }
}

/// Front matter of a prompt file
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    pub version: u32,
    /// Routing key, see `model_router::TaskType`
    pub task_type: String,
}

#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    pub content: String,
    pub is_override: bool,
    pub override_path: Option<PathBuf>,
}

impl Prompt {
    pub fn system_section(&self) -> Option<&str> {
        extract_section(&self.content, "# System")
    }

    pub fn user_section(&self) -> Option<&str> {
        extract_section(&self.content, "# User")
    }

    /// Render the whole body with `{{var}}` substitution
    pub fn render(&self, vars: &HashMap<&str, &str>) -> String {
        render_template(&self.content, vars)
    }

    /// Render the `# User` section, or the whole body if it has none
    pub fn render_user(&self, vars: &HashMap<&str, &str>) -> String {
        match self.user_section() {
            Some(user) => render_template(user, vars),
            None => self.render(vars),
        }
    }
}

pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    pub fn new() -> Self {
        Self {
            override_dir: default_prompts_dir(),
            cache: HashMap::new(),
        }
    }

    pub fn with_override_dir(path: PathBuf) -> Self {
        Self {
            override_dir: Some(path),
            cache: HashMap::new(),
        }
    }

    /// Library that ignores override files
    pub fn embedded_only() -> Self {
        Self {
            override_dir: None,
            cache: HashMap::new(),
        }
    }

    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        let prompt = match self.cache.entry(id) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                let loaded = load(self.override_dir.as_ref(), id)?;
                e.insert(loaded)
            }
        };
        Ok(prompt)
    }

    pub fn list(&mut self) -> Vec<PromptInfo> {
        PromptId::all()
            .iter()
            .map(|&id| {
                let override_path = self.override_path(id).filter(|p| p.exists());
                let prompt = self.get(id).ok();
                PromptInfo {
                    id: id.as_str().to_string(),
                    version: prompt.map(|p| p.metadata.version).unwrap_or(0),
                    task_type: prompt
                        .map(|p| p.metadata.task_type.clone())
                        .unwrap_or_default(),
                    has_override: override_path.is_some(),
                    override_path,
                }
            })
            .collect()
    }

    pub fn has_override(&self, id: PromptId) -> bool {
        self.override_path(id).is_some_and(|p| p.exists())
    }

    fn override_path(&self, id: PromptId) -> Option<PathBuf> {
        self.override_dir
            .as_ref()
            .map(|d| d.join(format!("{}.md", id.as_str())))
    }

    pub fn override_dir(&self) -> Option<&PathBuf> {
        self.override_dir.as_ref()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct PromptInfo {
    pub id: String,
    pub version: u32,
    pub task_type: String,
    pub has_override: bool,
    pub override_path: Option<PathBuf>,
}

pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("finiq").join("prompts").join("overrides"))
}

fn load(override_dir: Option<&PathBuf>, id: PromptId) -> Result<Prompt> {
    if let Some(dir) = override_dir {
        let path = dir.join(format!("{}.md", id.as_str()));
        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| {
                Error::Config(format!("Failed to read prompt override {}: {}", path.display(), e))
            })?;
            let (metadata, body) = parse_prompt(&content)?;
            debug!("Using prompt override {}", path.display());
            return Ok(Prompt {
                metadata,
                content: body,
                is_override: true,
                override_path: Some(path),
            });
        }
    }

    let (metadata, body) = parse_prompt(id.default_content())?;
    Ok(Prompt {
        metadata,
        content: body,
        is_override: false,
        override_path: None,
    })
}

fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();

    let rest = content.strip_prefix("---").ok_or_else(|| {
        Error::Config("Prompt must start with YAML front matter (---)".into())
    })?;
    let end = rest
        .find("---")
        .ok_or_else(|| Error::Config("Prompt front matter not closed".into()))?;

    let frontmatter = rest[..end].trim();
    let body = rest[end + 3..].trim();

    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter)
        .map_err(|e| Error::Config(format!("Invalid prompt front matter: {}", e)))?;

    Ok((metadata, body.to_string()))
}

fn extract_section<'a>(content: &'a str, header: &str) -> Option<&'a str> {
    let start = content.find(header)?;
    let after_header = &content[start + header.len()..];
    let end = after_header.find("\n# ").unwrap_or(after_header.len());
    Some(after_header[..end].trim())
}

fn render_template(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    remove_unmatched_conditionals(&result, vars)
}

/// Resolve `{{#if var}}...{{/if}}` blocks: keep the body when `var` is set
/// and non-empty, drop the whole block otherwise
fn remove_unmatched_conditionals(content: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = content.to_string();

    while let Some(if_start) = result.find("{{#if ") {
        let var_start = if_start + 6;
        let Some(var_len) = result[var_start..].find("}}") else {
            break;
        };
        let var_name = &result[var_start..var_start + var_len];
        let block_start = var_start + var_len + 2;
        let Some(endif_offset) = result[block_start..].find("{{/if}}") else {
            break;
        };
        let block_end = block_start + endif_offset;
        let full_end = block_end + 7;

        let keep = vars.get(var_name).is_some_and(|v| !v.is_empty());
        result = if keep {
            format!(
                "{}{}{}",
                &result[..if_start],
                &result[block_start..block_end],
                &result[full_end..]
            )
        } else {
            format!("{}{}", &result[..if_start], &result[full_end..])
        };
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prompt() {
        let content = r#"---
id: test_prompt
version: 2
task_type: narrative
---

# System
Be brief.

# User
Hello {{name}}.
"#;

        let (metadata, body) = parse_prompt(content).unwrap();
        assert_eq!(metadata.id, "test_prompt");
        assert_eq!(metadata.version, 2);
        assert_eq!(metadata.task_type, "narrative");
        assert!(body.starts_with("# System"));
    }

    #[test]
    fn test_missing_front_matter() {
        assert!(matches!(parse_prompt("# User\nhi"), Err(Error::Config(_))));
    }

    #[test]
    fn test_extract_section() {
        let content = "# System\nSystem text.\n\n# User\nUser text.";
        assert_eq!(extract_section(content, "# System"), Some("System text."));
        assert_eq!(extract_section(content, "# User"), Some("User text."));
        assert_eq!(extract_section(content, "# Assistant"), None);
    }

    #[test]
    fn test_conditional_blocks() {
        let content = "Category: x{{#if description}}\nDescription: {{description}}{{/if}}\nEnd";

        let mut vars = HashMap::new();
        vars.insert("description", "Swiggy");
        let rendered = render_template(content, &vars);
        assert!(rendered.contains("Description: Swiggy"));
        assert!(!rendered.contains("{{"));

        vars.insert("description", "");
        let rendered = render_template(content, &vars);
        assert!(!rendered.contains("Description"));
        assert!(rendered.ends_with("End"));
    }

    #[test]
    fn test_embedded_prompts_load() {
        let mut lib = PromptLibrary::embedded_only();
        for id in PromptId::all() {
            let prompt = lib.get(*id).unwrap();
            assert_eq!(prompt.metadata.id, id.as_str());
            assert!(!prompt.is_override);
            assert!(prompt.system_section().is_some());
            assert!(prompt.user_section().is_some());
        }
    }

    #[test]
    fn test_prompt_task_types_are_routable() {
        let mut lib = PromptLibrary::embedded_only();
        for id in PromptId::all() {
            let task = &lib.get(*id).unwrap().metadata.task_type;
            assert!(task.parse::<crate::model_router::TaskType>().is_ok());
        }
    }

    #[test]
    fn test_classify_prompt_renders_category() {
        let mut lib = PromptLibrary::embedded_only();
        let prompt = lib.get(PromptId::ClassifyBucket).unwrap();
        let mut vars = HashMap::new();
        vars.insert("category", "pet_supplies");
        let rendered = prompt.render_user(&vars);
        assert!(rendered.contains("Category: pet_supplies"));
        assert!(!rendered.contains("Description:"));
    }

    #[test]
    fn test_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("classify_bucket.md"),
            "---\nid: classify_bucket\nversion: 9\ntask_type: fast_classification\n---\n\n# User\nBucket for {{category}}?",
        )
        .unwrap();

        let mut lib = PromptLibrary::with_override_dir(dir.path().to_path_buf());
        assert!(lib.has_override(PromptId::ClassifyBucket));
        assert!(!lib.has_override(PromptId::CoachingMessages));

        let prompt = lib.get(PromptId::ClassifyBucket).unwrap();
        assert!(prompt.is_override);
        assert_eq!(prompt.metadata.version, 9);

        let listed = lib.list();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().any(|p| p.id == "classify_bucket" && p.has_override));
    }
}
