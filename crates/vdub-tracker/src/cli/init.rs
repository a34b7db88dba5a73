/*
[INPUT]:  Interactive user input via CLI
[OUTPUT]: Generated YAML configuration file
[POS]:    CLI initialization layer
[UPDATE]: When TrackerConfig schema changes
*/

use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};
use vdub_adapter::SubtitleMode;
use vdub_adapter::presentation::SUPPORTED_LANGUAGES;

use crate::config::{ApiConfig, DetailConfig, ListConfig, SubmitDefaults, TrackerConfig};

const SUBTITLE_MODES: [SubtitleMode; 3] = [SubtitleMode::External, SubtitleMode::Burn, SubtitleMode::None];

pub fn run_init(output: &Path) -> Result<()> {
    println!("{}", style("Welcome to vdub tracker init").bold().cyan());
    println!(
        "{}",
        style("This will guide you through creating a tracker configuration.").dim()
    );

    let theme = ColorfulTheme::default();

    if output.exists()
        && !Confirm::with_theme(&theme)
            .with_prompt(format!("{} exists. Overwrite?", output.display()))
            .default(false)
            .interact()?
    {
        println!("{}", style("Aborted, nothing written.").yellow());
        return Ok(());
    }

    println!("\n{}", style("--- Backend ---").bold());
    let defaults = TrackerConfig::default();
    let base_url: String = Input::with_theme(&theme)
        .with_prompt("API base URL")
        .default(defaults.api.base_url.clone())
        .interact_text()?;

    let page_size: u32 = Input::with_theme(&theme)
        .with_prompt("Tasks per page")
        .default(defaults.list.page_size)
        .validate_with(|value: &u32| if *value > 0 { Ok(()) } else { Err("must be at least 1") })
        .interact_text()?;

    println!("\n{}", style("--- Submit defaults ---").bold());
    let language_items: Vec<String> = SUPPORTED_LANGUAGES
        .iter()
        .map(|(code, name)| format!("{name} ({code})"))
        .collect();
    let source = pick_language(&theme, "Source language", &language_items, "en")?;
    let target = pick_language(&theme, "Target language", &language_items, "zh")?;

    let mode_items: Vec<String> = SUBTITLE_MODES.iter().map(ToString::to_string).collect();
    let mode_selection = Select::with_theme(&theme)
        .with_prompt("Subtitle mode")
        .items(&mode_items)
        .default(0)
        .interact()?;

    let config = TrackerConfig {
        api: ApiConfig {
            base_url,
            ..ApiConfig::default()
        },
        list: ListConfig {
            page_size,
            ..ListConfig::default()
        },
        detail: DetailConfig::default(),
        defaults: SubmitDefaults {
            source_language: source,
            target_language: target,
            subtitle_mode: SUBTITLE_MODES[mode_selection],
        },
    };
    config.validate().context("generated configuration is invalid")?;

    write_config(&config, output)?;

    println!("\n{}", style("SUCCESS!").bold().green());
    println!("Configuration written to: {}", style(output.display()).cyan());

    Ok(())
}

fn pick_language(theme: &ColorfulTheme, prompt: &str, items: &[String], default_code: &str) -> Result<String> {
    let default = SUPPORTED_LANGUAGES
        .iter()
        .position(|(code, _)| *code == default_code)
        .unwrap_or(0);
    let selection = Select::with_theme(theme)
        .with_prompt(prompt)
        .items(items)
        .default(default)
        .interact()?;
    Ok(SUPPORTED_LANGUAGES[selection].0.to_string())
}

pub fn write_config(config: &TrackerConfig, output: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("failed to serialize config to YAML")?;
    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(output, yaml)
        .with_context(|| format!("failed to write config to {}", output.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_written_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("tracker.yaml");
        let mut config = TrackerConfig::default();
        config.defaults.subtitle_mode = SubtitleMode::Burn;
        config.list.page_size = 15;

        write_config(&config, &output).unwrap();
        assert_eq!(TrackerConfig::from_file(&output).unwrap(), config);
    }
}
