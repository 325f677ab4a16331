//! wolfies-whatsapp - one-shot CLI over a store snapshot
//!
//! Loads a snapshot, runs a single gateway operation, prints the result.
//! State changes (unread flags, read markers, sends) last only for the run;
//! use the daemon to keep them.
//!
//! CHANGELOG:
//! - 10/16/2026 - Initial CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;

use wolfies_whatsapp::config::StoreSettings;
use wolfies_whatsapp::output::{self, OutputControls};
use wolfies_whatsapp::Gateway;

/// Query/command gateway over a WhatsApp-style client store.
#[derive(Parser, Debug)]
#[command(name = "wolfies-whatsapp")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Store snapshot (default: $WOLFIES_WHATSAPP_SNAPSHOT or ~/.wolfies-whatsapp/store.json)
    #[arg(long, global = true)]
    snapshot: Option<String>,

    /// Simulated metadata refresh latency in milliseconds
    #[arg(long, global = true, default_value_t = 0)]
    refresh_latency_ms: u64,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Compact JSON output (no whitespace)
    #[arg(long, global = true)]
    compact: bool,

    /// Minimal JSON preset (compact + truncation)
    #[arg(long, global = true)]
    minimal: bool,

    /// Comma-separated field allowlist
    #[arg(long, global = true)]
    fields: Option<String>,

    /// Truncate text fields to this length
    #[arg(long, global = true)]
    max_text_chars: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    // =========================================================================
    // CONTACTS AND CHATS
    // =========================================================================
    /// List all contacts
    Contacts,

    /// Show one contact
    Contact { id: String },

    /// Show the logged-in user
    Me,

    /// List all chats
    Chats,

    /// Show one chat
    Chat { id: String },

    // =========================================================================
    // GROUPS
    // =========================================================================
    /// List cached group metadata (no refresh)
    Groups,

    /// Show group metadata, refreshing it if stale
    Group { id: String },

    /// List participant ids of a group
    Participants { id: String },

    /// List admin ids of a group
    Admins { id: String },

    /// Show the owner id of a group
    Owner { id: String },

    // =========================================================================
    // MESSAGES
    // =========================================================================
    /// All messages in a chat, oldest first
    Messages {
        /// Chat id
        id: String,

        /// Include messages sent by me
        #[arg(long)]
        include_me: bool,
    },

    /// Extract unread messages (marks them read)
    Unread {
        /// Only this chat
        #[arg(long)]
        chat: Option<String>,
    },

    /// Send a message to a chat
    Send {
        /// Chat id
        id: String,

        /// Message to send
        message: Vec<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let output_controls = OutputControls {
        json: cli.json,
        compact: cli.compact,
        minimal: cli.minimal,
        fields: cli.fields.clone(),
        max_text_chars: cli.max_text_chars,
    };

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(anyhow::Error::from)
        .and_then(|rt| rt.block_on(run(cli, &output_controls)));

    match result {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            if output_controls.json {
                println!("{}", output::format_error(&e.to_string()));
            } else {
                eprintln!("Error: {}", e);
            }
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli, output: &OutputControls) -> Result<()> {
    let settings = StoreSettings::new(cli.snapshot.as_deref(), cli.refresh_latency_ms);
    let gw = Gateway::new(Arc::new(settings.open_store()?));

    match cli.command {
        Command::Contacts => output.print(&gw.get_all_contacts()),
        Command::Contact { id } => output.print(&gw.get_contact(&id)?),
        Command::Me => output.print(&gw.get_me()?),
        Command::Chats => {
            let chats = gw.get_all_chats();
            if output.json {
                output.print(&chats);
            } else {
                println!("Chats ({}):", chats.len());
                println!("{:-<60}", "");
                for chat in &chats {
                    let name = chat["name"].as_str().unwrap_or("(unnamed)");
                    let kind = if chat["isGroup"].as_bool().unwrap_or(false) { "group" } else { "direct" };
                    println!("{} [{}]", name, kind);
                    println!("  ID: {}", chat["id"].as_str().unwrap_or(""));
                }
            }
        }
        Command::Chat { id } => output.print(&gw.get_chat(&id)?),
        Command::Groups => output.print(&gw.get_all_group_metadata()),
        Command::Group { id } => output.print(&gw.get_group_metadata(&id).await?),
        Command::Participants { id } => output.print(&gw.get_group_participant_ids(&id).await?),
        Command::Admins { id } => output.print(&gw.get_group_admins(&id).await?),
        Command::Owner { id } => output.print(&gw.get_group_owner_id(&id).await?),
        Command::Messages { id, include_me } => {
            output.print(&gw.get_all_messages_in_chat(&id, include_me)?)
        }
        Command::Unread { chat } => {
            let unread = match chat {
                Some(id) => gw.get_unread_messages_in_chat(&id)?.into_iter().collect(),
                None => gw.get_unread_messages(),
            };

            if output.json {
                output.print(&unread);
            } else if unread.is_empty() {
                println!("No unread messages.");
            } else {
                for chat in &unread {
                    let name = chat.chat["name"].as_str().unwrap_or("(unnamed)");
                    println!("{} ({} unread)", name, chat.messages.len());
                    for msg in &chat.messages {
                        println!("  {}", msg["body"].as_str().unwrap_or("[no text]"));
                    }
                }
            }
        }
        Command::Send { id, message } => {
            let message = message.join(" ");
            let sent = gw.send_message(&id, &message).await;
            if output.json {
                output.print(&serde_json::json!({
                    "success": sent,
                    "chat_id": id,
                    "message": message
                }));
            } else if sent {
                println!("Message sent to {}", id);
            } else {
                anyhow::bail!("No chat with id '{}'", id);
            }
        }
    }

    Ok(())
}
