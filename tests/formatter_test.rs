mod common;

use std::collections::BTreeSet;

use common::ScriptedClient;
use recipe_assistant::config::StageConfig;
use recipe_assistant::prompts::FORMATTING_SYSTEM;
use recipe_assistant::{
    FormatError, FormatStyle, Ingredient, InstructionStep, ProviderError, Recipe,
    RecipeFormatter,
};

fn stage() -> StageConfig {
    StageConfig {
        max_tokens: 4000,
        temperature: 0.3,
    }
}

fn cookies() -> Recipe {
    Recipe {
        title: "Vegan Chocolate-Chip Cookies!!".to_string(),
        description: "Chewy and rich".to_string(),
        url: "https://example.com/cookies".to_string(),
        servings: "24".to_string(),
        ingredients: vec![
            Ingredient {
                raw_text: "2 cups flour".to_string(),
                amount: "2".to_string(),
                unit: "cups".to_string(),
                ingredient: "flour".to_string(),
            },
            Ingredient {
                raw_text: "1 cup vegan chocolate chips".to_string(),
                ..Default::default()
            },
        ],
        instructions: vec![
            InstructionStep {
                step: 1,
                instruction: "Mix the dough.".to_string(),
            },
            InstructionStep {
                step: 2,
                instruction: "Bake for 10 minutes.".to_string(),
            },
        ],
        dietary_tags: BTreeSet::from(["vegan".to_string()]),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_writes_slugged_file() {
    let dir = tempfile::tempdir().unwrap();
    let client = ScriptedClient::new(|_| Ok("```markdown\n# Vegan Cookies\n```".to_string()));
    let formatter = RecipeFormatter::new(client.clone(), stage(), dir.path().join("recipes"));

    let formatted = formatter
        .format(&cookies(), FormatStyle::Cookbook, None)
        .await
        .unwrap();

    let expected = dir.path().join("recipes").join("vegan_chocolate_chip_cookies.md");
    assert_eq!(formatted.file_path, expected.display().to_string());
    assert_eq!(formatted.content, "# Vegan Cookies");
    assert_eq!(formatted.style, FormatStyle::Cookbook);
    assert!(!formatted.used_fallback);
    assert_eq!(std::fs::read_to_string(expected).unwrap(), "# Vegan Cookies");

    let prompt = &client.prompts_for(FORMATTING_SYSTEM)[0];
    assert!(prompt.contains("FORMATTING STYLE: cookbook"));
    assert!(prompt.contains("[Original Recipe URL](https://example.com/cookies)"));
}

#[tokio::test]
async fn test_formatting_twice_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let client = ScriptedClient::new(|request| {
        // Deterministic stand-in for the model: echo the recipe title line
        let title = request
            .prompt
            .lines()
            .find(|line| line.starts_with("Title: "))
            .unwrap_or("Title: ?")
            .trim_start_matches("Title: ")
            .to_string();
        Ok(format!("# {}\n\nEnjoy.", title))
    });
    let formatter = RecipeFormatter::new(client, stage(), dir.path());

    let first = formatter
        .format(&cookies(), FormatStyle::Simple, None)
        .await
        .unwrap();
    let first_bytes = std::fs::read(&first.file_path).unwrap();
    let second = formatter
        .format(&cookies(), FormatStyle::Simple, None)
        .await
        .unwrap();
    let second_bytes = std::fs::read(&second.file_path).unwrap();

    assert_eq!(first.file_path, second.file_path);
    assert_eq!(first_bytes, second_bytes);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_formatting_twice_with_explicit_filename() {
    let dir = tempfile::tempdir().unwrap();
    let client = ScriptedClient::new(|_| Ok("# Vegan Cookies\n\nBake them.".to_string()));
    let formatter = RecipeFormatter::new(client, stage(), dir.path());

    let first = formatter
        .format(&cookies(), FormatStyle::Detailed, Some("cookies"))
        .await
        .unwrap();
    let first_bytes = std::fs::read(&first.file_path).unwrap();
    let second = formatter
        .format(&cookies(), FormatStyle::Detailed, Some("cookies"))
        .await
        .unwrap();
    let second_bytes = std::fs::read(&second.file_path).unwrap();

    assert_eq!(first.file_path, dir.path().join("cookies.md").display().to_string());
    assert_eq!(first.file_path, second.file_path);
    assert_eq!(first_bytes, second_bytes);
    assert_eq!(first_bytes, b"# Vegan Cookies\n\nBake them.");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_filename_outside_output_directory_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("recipes");
    let client = ScriptedClient::new(|_| Ok("# Cookies".to_string()));
    let formatter = RecipeFormatter::new(client.clone(), stage(), &output);

    for name in ["../cookies", "/tmp/cookies.md"] {
        let result = formatter
            .format(&cookies(), FormatStyle::Simple, Some(name))
            .await;
        assert!(matches!(result, Err(FormatError::InvalidFilename(_))));
    }
    assert!(!dir.path().join("cookies.md").exists());
    assert!(!output.exists());
    assert!(client.prompts_for(FORMATTING_SYSTEM).is_empty());
}

#[tokio::test]
async fn test_fallback_when_model_fails() {
    let dir = tempfile::tempdir().unwrap();
    let client = ScriptedClient::new(|_| {
        Err(ProviderError::Api {
            status: 503,
            body: "overloaded".to_string(),
        })
    });
    let formatter = RecipeFormatter::new(client, stage(), dir.path());

    let formatted = formatter
        .format(&cookies(), FormatStyle::Detailed, Some("cookies"))
        .await
        .unwrap();

    assert!(formatted.used_fallback);
    assert!(formatted.file_path.ends_with("cookies.md"));
    assert!(formatted
        .content
        .starts_with("# Vegan Chocolate-Chip Cookies!!\n\n*Chewy and rich*"));
    assert!(formatted.content.contains("- **Dietary Tags:** vegan"));
    assert!(formatted.content.contains("1. Mix the dough.\n2. Bake for 10 minutes."));
    assert!(formatted
        .content
        .ends_with("## Source\n[Original Recipe URL](https://example.com/cookies)"));
}

#[tokio::test]
async fn test_fallback_when_model_returns_blank() {
    let dir = tempfile::tempdir().unwrap();
    let client = ScriptedClient::new(|_| Ok("```markdown\n```".to_string()));
    let formatter = RecipeFormatter::new(client, stage(), dir.path());

    let formatted = formatter
        .format(&cookies(), FormatStyle::Simple, Some("blank.md"))
        .await
        .unwrap();

    assert!(formatted.used_fallback);
    assert!(formatted.file_path.ends_with("blank.md"));
    assert!(formatted.content.contains("## Ingredients\n- 2 cups flour"));
}

#[tokio::test]
async fn test_write_failure() {
    let blocker = tempfile::NamedTempFile::new().unwrap();
    let client = ScriptedClient::new(|_| Ok("# Cookies".to_string()));
    let formatter = RecipeFormatter::new(client, stage(), blocker.path());

    let result = formatter.format(&cookies(), FormatStyle::Simple, None).await;
    match result {
        Err(FormatError::Io { path, .. }) => assert!(path.ends_with("vegan_chocolate_chip_cookies.md")),
        other => panic!("expected an I/O error, got {:?}", other),
    }
}
