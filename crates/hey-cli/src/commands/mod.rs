//! Dispatch of parsed arguments onto the conversation manager.
//!
//! Settings flags are applied first and combine with anything else. The
//! first listing or lifecycle flag found then runs on its own. Otherwise the
//! invocation is a prompt.

use anyhow::Result;
use hey_application::ConversationManager;
use hey_interaction::OpenAIApiAgent;

use crate::Cli;

pub mod convos;
pub mod prompt;
pub mod settings;

pub async fn run(
    cli: &Cli,
    manager: &mut ConversationManager,
    agent: &OpenAIApiAgent,
) -> Result<()> {
    if cli.init {
        return settings::init(manager);
    }
    if cli.reset {
        return settings::reset(manager);
    }

    let configured = settings::apply(cli, manager, agent).await?;

    if let Some(id) = &cli.new {
        convos::start_new(manager, id.as_deref())?;
    }

    if settings::query(cli, manager, agent).await? || convos::manage(cli, manager)? {
        return Ok(());
    }

    if cli.retry {
        return prompt::retry(cli, manager).await;
    }
    if cli.qk || cli.one_shot {
        return prompt::one_shot(cli, manager).await;
    }
    if (configured || cli.new.is_some()) && cli.sentence().is_none() {
        return Ok(());
    }
    prompt::ask(cli, manager).await
}
