//! Registry settings, model selection and informational output.

use std::fs;

use anyhow::{Context, Result};
use hey_application::ConversationManager;
use hey_core::message::ImageDetail;
use hey_core::pick::pick_value;
use hey_core::registry::RegistryField;
use hey_interaction::OpenAIApiAgent;

use crate::Cli;
use crate::output::print_names;

/// Applies every settings flag present. Returns whether any was given.
pub async fn apply(
    cli: &Cli,
    manager: &mut ConversationManager,
    agent: &OpenAIApiAgent,
) -> Result<bool> {
    let mut changed = false;

    if let Some(temp) = cli.temp {
        manager.update_registry(RegistryField::Temp(temp))?;
        println!("temp: {}", manager.registry().temperature());
        changed = true;
    }
    if let Some(max_tokens) = cli.max_tokens {
        manager.update_registry(RegistryField::MaxTokens(max_tokens))?;
        println!("max tokens: {max_tokens}");
        changed = true;
    }
    if let Some(detail) = &cli.detail {
        let detail: ImageDetail = detail.parse()?;
        manager.update_registry(RegistryField::Detail(detail))?;
        println!("detail: {detail}");
        changed = true;
    }
    if let Some(codify) = cli.codify {
        manager.update_registry(RegistryField::Codify(codify.enabled()))?;
        println!("codify: {}", codify.enabled());
        changed = true;
    }
    if let Some(editor) = &cli.editor {
        manager.update_registry(RegistryField::Editor(editor.clone()))?;
        println!("editor: {editor}");
        changed = true;
    }
    if let Some(system) = &cli.system {
        manager.set_system_prompt(system.as_str())?;
        changed = true;
    }
    if let Some(token) = &cli.set_model {
        let models = agent.list_models().await?;
        let model = pick_value(&models, token)?.clone();
        manager.update_registry(RegistryField::Model(model.clone()))?;
        println!("model: {model}");
        changed = true;
    }

    Ok(changed)
}

/// Runs the first informational flag present. Returns whether one ran.
pub async fn query(
    cli: &Cli,
    manager: &ConversationManager,
    agent: &OpenAIApiAgent,
) -> Result<bool> {
    if cli.info {
        println!("{}", manager.info());
    } else if cli.get_model {
        println!("{}", manager.registry().model());
    } else if cli.models {
        let models = agent.list_models().await?;
        print_names(&models, manager.registry().model());
    } else if cli.recent {
        match manager.most_recent_transcript()? {
            Some(path) => {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                println!("{content}");
            }
            None => println!("no transcripts yet"),
        }
    } else if cli.raw {
        println!("{}", manager.raw_json()?);
    } else {
        return Ok(false);
    }
    Ok(true)
}

/// Writes default settings and an empty `main` conversation.
pub fn init(manager: &mut ConversationManager) -> Result<()> {
    manager.reset()?;
    println!("{}", manager.info());
    Ok(())
}

pub fn reset(manager: &mut ConversationManager) -> Result<()> {
    manager.reset()?;
    println!("settings restored to defaults");
    Ok(())
}
