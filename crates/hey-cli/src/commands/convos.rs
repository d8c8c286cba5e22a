//! Conversation listing, switching and lifecycle commands.

use anyhow::Result;
use hey_application::ConversationManager;

use crate::Cli;
use crate::output::{confirm, print_entries};

/// Starts an empty conversation named `id`, refusing a name already in use,
/// or without a name starts a new one if the active conversation has
/// completed a turn.
pub fn start_new(manager: &mut ConversationManager, id: Option<&str>) -> Result<()> {
    match id {
        Some(id) => {
            manager.new_context(Some(id))?;
            println!("convo: {id}");
        }
        None => match manager.make_new()? {
            Some(id) => println!("new convo: {id}"),
            None => println!(
                "current convo is still empty: {}",
                manager.info().context_file.display()
            ),
        },
    }
    Ok(())
}

/// Runs the first conversation-management flag present. Returns whether one
/// ran.
pub fn manage(cli: &Cli, manager: &mut ConversationManager) -> Result<bool> {
    if cli.convos {
        print_entries(&manager.convo_entries()?, cli.files);
    } else if cli.pins {
        let entries = manager.pin_entries();
        if entries.is_empty() {
            println!("no pins");
        } else {
            print_entries(&entries, false);
        }
    } else if let Some(token) = &cli.set_convo {
        let entry = manager.set_convo(token)?;
        println!("convo: {} ({})", entry.display_title(), entry.id);
    } else if let Some(token) = &cli.show {
        let (_, content) = manager.show(token)?;
        println!("{content}");
    } else if let Some(token) = &cli.delete_convo {
        let deleted = manager.delete_picked(token, |entry| {
            confirm(&format!(
                "delete '{}' ({})?",
                entry.display_title(),
                entry.id
            ))
        })?;
        match deleted {
            Some(entry) => println!("deleted {}", entry.id),
            None => println!("nothing deleted"),
        }
    } else if cli.pin {
        manager.pin(None)?;
        println!("pinned {}", manager.convo());
    } else if let Some(token) = &cli.set_pin {
        let entry = manager.set_pin(token)?;
        println!("convo: {} ({})", entry.display_title(), entry.id);
    } else if let Some(token) = &cli.unpin {
        let entry = manager.unpin_picked(token)?;
        println!("unpinned {}", entry.display_title());
    } else if cli.archive {
        let report = manager.archive()?;
        println!(
            "archived {}, kept {} pinned",
            report.archived.len(),
            report.skipped.len()
        );
    } else if cli.tidy {
        let removed = manager.tidy_contexts()?;
        for id in &removed {
            println!("removed {id}");
        }
        println!("tidied {} conversation(s)", removed.len());
    } else {
        return Ok(false);
    }
    Ok(true)
}
