//! Sending prompts: conversational turns, retries and one-off questions.

use std::io::{self, Read};

use anyhow::{Context, Result};
use hey_application::conversation::TITLE_MODEL;
use hey_application::{ConversationManager, PromptRequest};
use hey_core::completion::DeltaSink;
use hey_infrastructure::image_loader::load_image;

use crate::Cli;
use crate::editor;
use crate::output::{Output, print_delta};

/// The prompt from the command line, stdin (`--no-editor`) or the editor.
fn read_prompt(cli: &Cli, manager: &ConversationManager) -> Result<Option<String>> {
    if let Some(sentence) = cli.sentence() {
        return Ok(Some(sentence));
    }
    if cli.no_editor {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .context("Failed to read prompt from stdin")?;
        let input = input.trim();
        return Ok((!input.is_empty()).then(|| input.to_string()));
    }
    editor::edit(manager.registry().editor(), "")
}

/// One conversational turn.
pub async fn ask(cli: &Cli, manager: &mut ConversationManager) -> Result<()> {
    match read_prompt(cli, manager)? {
        Some(prompt) => send(cli, manager, prompt).await,
        None => {
            println!("nothing to send");
            Ok(())
        }
    }
}

/// Removes the last turn and sends its prompt again, edited unless
/// `--no-editor` is given.
pub async fn retry(cli: &Cli, manager: &mut ConversationManager) -> Result<()> {
    let Some(previous) = manager.pop_user_prompt()? else {
        println!("nothing to retry");
        return Ok(());
    };
    let prompt = if cli.no_editor {
        Some(previous)
    } else {
        editor::edit(manager.registry().editor(), &previous)?
    };
    match prompt {
        Some(prompt) => send(cli, manager, prompt).await,
        None => {
            println!("nothing to send");
            Ok(())
        }
    }
}

async fn send(cli: &Cli, manager: &mut ConversationManager, prompt: String) -> Result<()> {
    let images = cli
        .images
        .iter()
        .map(|spec| load_image(spec))
        .collect::<hey_core::Result<Vec<_>>>()?;
    let request = PromptRequest::new(prompt)
        .with_trim(cli.trim)
        .with_images(images);

    let output = Output::from_env();
    let streamed = cli.stream && output.streams_to_terminal();
    let reply = if streamed {
        let mut sink = print_delta;
        manager
            .ask(&request, Some(&mut sink as &mut dyn DeltaSink))
            .await?
    } else {
        manager.ask(&request, None).await?
    };
    output.reply(&reply.text(), streamed)
}

/// A single question with no stored history. `--qk` uses the title model.
pub async fn one_shot(cli: &Cli, manager: &ConversationManager) -> Result<()> {
    let Some(prompt) = read_prompt(cli, manager)? else {
        println!("nothing to send");
        return Ok(());
    };
    let model = cli.qk.then_some(TITLE_MODEL);

    let output = Output::from_env();
    let streamed = cli.stream && output.streams_to_terminal();
    let text = if streamed {
        let mut sink = print_delta;
        manager
            .one_shot(&prompt, model, Some(&mut sink as &mut dyn DeltaSink))
            .await?
    } else {
        manager.one_shot(&prompt, model, None).await?
    };
    output.reply(&text, streamed)
}
