use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::StageConfig;
use crate::error::FormatError;
use crate::model::{FormatStyle, FormattedRecipe, Recipe};
use crate::prompts::{formatting_prompt, FORMATTING_SYSTEM};
use crate::providers::{CompletionClient, CompletionRequest};

const MAX_SLUG_CHARS: usize = 50;

/// Renders a recipe to markdown and writes it to the output directory.
///
/// A failed or empty completion falls back to a local template, so the only
/// error left is a failed write.
pub struct RecipeFormatter {
    client: Arc<dyn CompletionClient>,
    stage: StageConfig,
    output_dir: PathBuf,
}

impl RecipeFormatter {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        stage: StageConfig,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            stage,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub async fn format(
        &self,
        recipe: &Recipe,
        style: FormatStyle,
        filename: Option<&str>,
    ) -> Result<FormattedRecipe, FormatError> {
        info!("Formatting '{}' as {}", recipe.title, style);
        let filename = output_filename(filename, &recipe.title)?;

        let request = CompletionRequest::new(
            FORMATTING_SYSTEM,
            formatting_prompt(recipe, style),
            self.stage,
        );
        let generated = match self.client.complete(&request).await {
            Ok(response) => {
                debug!("Formatting response: {} characters", response.len());
                Some(strip_code_fence(&response)).filter(|content| !content.is_empty())
            }
            Err(e) => {
                warn!("Formatting model call failed, using the local template: {}", e);
                None
            }
        };
        let used_fallback = generated.is_none();
        let content = generated.unwrap_or_else(|| fallback_markdown(recipe));

        let path = self.output_dir.join(filename);
        write_file(&path, &content).await?;
        info!("Saved formatted recipe to {}", path.display());

        Ok(FormattedRecipe {
            recipe: recipe.clone(),
            file_path: path.display().to_string(),
            content,
            style,
            used_fallback,
        })
    }
}

/// The file name inside the output directory: the caller's name with `.md`
/// appended when missing, or the slugged title. Names that would leave the
/// output directory are refused.
fn output_filename(filename: Option<&str>, title: &str) -> Result<String, FormatError> {
    let Some(name) = filename else {
        return Ok(format!("{}.md", slugify(title)));
    };
    let name = name.trim();
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(FormatError::InvalidFilename(name.to_string()));
    }
    Ok(if name.ends_with(".md") {
        name.to_string()
    } else {
        format!("{}.md", name)
    })
}

async fn write_file(path: &Path, content: &str) -> Result<(), FormatError> {
    let io_error = |source| FormatError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
    }
    tokio::fs::write(path, content).await.map_err(io_error)
}

/// Remove a surrounding ```` ```markdown ```` fence from model output
pub fn strip_code_fence(response: &str) -> String {
    let mut content = response.trim();
    if let Some(rest) = content.strip_prefix("```markdown") {
        content = rest;
    } else if let Some(rest) = content.strip_prefix("```") {
        content = rest;
    }
    if let Some(rest) = content.strip_suffix("```") {
        content = rest;
    }
    content.trim().to_string()
}

/// File-name stem for a recipe title
///
/// `"Vegan Chocolate-Chip Cookies!!"` becomes `vegan_chocolate_chip_cookies`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::new();
    let mut pending_separator = false;
    for c in title.to_lowercase().chars() {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(c);
        } else if c == '-' || c == '_' || c.is_whitespace() {
            pending_separator = true;
        }
    }

    let slug: String = slug.chars().take(MAX_SLUG_CHARS).collect();
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "recipe".to_string()
    } else {
        slug.to_string()
    }
}

/// Markdown rendering that needs no model
pub fn fallback_markdown(recipe: &Recipe) -> String {
    let or_unknown = |value: &str| {
        if value.is_empty() {
            "Unknown".to_string()
        } else {
            value.to_string()
        }
    };

    let mut lines = Vec::new();
    let title = if recipe.title.is_empty() {
        "Unknown Recipe"
    } else {
        &recipe.title
    };
    lines.push(format!("# {}", title));
    lines.push(String::new());

    if !recipe.description.is_empty() {
        lines.push(format!("*{}*", recipe.description));
        lines.push(String::new());
    }

    lines.push("## Recipe Information".to_string());
    lines.push(format!("- **Servings:** {}", or_unknown(&recipe.servings)));
    lines.push(format!("- **Prep Time:** {}", or_unknown(&recipe.prep_time)));
    lines.push(format!("- **Cook Time:** {}", or_unknown(&recipe.cook_time)));
    lines.push(format!("- **Total Time:** {}", or_unknown(&recipe.total_time)));
    lines.push(format!("- **Difficulty:** {}", or_unknown(&recipe.difficulty)));
    if !recipe.dietary_tags.is_empty() {
        lines.push(format!("- **Dietary Tags:** {}", recipe.tags_joined()));
    }
    lines.push(String::new());

    lines.push("## Ingredients".to_string());
    for ingredient in &recipe.ingredients {
        lines.push(format!("- {}", ingredient.display_text()));
    }
    lines.push(String::new());

    lines.push("## Instructions".to_string());
    for step in &recipe.instructions {
        lines.push(format!("{}. {}", step.step, step.instruction));
    }

    if !recipe.url.is_empty() {
        lines.push(String::new());
        lines.push("## Source".to_string());
        lines.push(format!("[Original Recipe URL]({})", recipe.url));
    }

    lines.join("\n")
}
