use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::access::SnippetRef;
use crate::collection::DeleteOutcome;
use crate::config::Config;
use crate::issuance::{IssuedCode, QrRenderer};
use crate::lifecycle::{SnippetMachine, SnippetState};
use crate::routes::Route;
use crate::service::{HttpSnippetService, LocalSnippetService, SnippetService};
use crate::session::Session;
use crate::snippet::{Draft, SnippetId};

#[derive(Parser, Debug)]
#[command(
    name = "securesnip",
    version,
    about = "Password-protected snippets shared by scannable code",
    arg_required_else_help = true
)]
pub struct Cli {
    /// TOML config file (also SECURE_SNIP_CONFIG).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Snippet service base URL, overrides config.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Create a snippet and save its code image.
    Create {
        #[arg(long)]
        title: String,
        /// Read from stdin when omitted, after the password line.
        #[arg(long)]
        message: Option<String>,
        /// Prompted for when omitted, as the first stdin line.
        #[arg(long)]
        password: Option<String>,
        /// Comma separated.
        #[arg(long, default_value = "")]
        tags: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List stored snippets.
    List {
        /// Case-insensitive title filter.
        #[arg(long)]
        filter: Option<String>,
    },
    /// Open a snippet by id or shared link and decrypt it.
    View {
        reference: String,
        #[arg(long)]
        password: Option<String>,
        /// Delete after viewing.
        #[arg(long)]
        delete: bool,
        /// Skip the delete confirmation.
        #[arg(long)]
        yes: bool,
    },
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
    /// Save the code image for an existing snippet.
    Qr {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Walk through the whole lifecycle against an in-process service.
    Demo,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(api_url) = cli.api_url {
        config.service.api_url = api_url;
        config.validate()?;
    }
    crate::logging::init(&config.logging.level);

    let service: Arc<dyn SnippetService> = match cli.cmd {
        Cmd::Demo => Arc::new(LocalSnippetService::new()),
        _ => Arc::new(HttpSnippetService::from_config(&config.service)?),
    };

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();
    execute(cli.cmd, &config, service, &mut input, &mut output).await
}

/// Run one subcommand. Prompts read from `input`, everything user-facing goes to `output`.
pub async fn execute(
    cmd: Cmd,
    config: &Config,
    service: Arc<dyn SnippetService>,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<()> {
    let mut session = Session::new(service, config.origin()?);

    match cmd {
        Cmd::Create {
            title,
            message,
            password,
            tags,
            out,
        } => {
            // Password line first: a piped message runs to end of input.
            let password = match password {
                Some(p) => p,
                None => prompt(input, output, "Password: ")?,
            };
            let message = match message {
                Some(m) => m,
                None => read_all(input)?,
            };
            let issued = create(&mut session, Draft::new(title, message, password, tags), output).await?;
            let dir = out.unwrap_or_else(|| config.app.export_dir.clone());
            save_code(&issued, config, &dir, output)?;
        }
        Cmd::List { filter } => {
            session.navigate(Route::Collection).await?;
            let collection = session.collection();
            if let Some(error) = collection.error().await {
                bail!("{}", error);
            }
            if let Some(filter) = filter {
                collection.set_filter(filter).await;
            }
            let visible = collection.visible().await;
            if visible.is_empty() {
                writeln!(output, "No snippets found.")?;
            }
            for item in visible {
                let when = item
                    .created_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                writeln!(output, "{}  {:<16}  {}", item.id, when, item.title)?;
            }
        }
        Cmd::View {
            reference,
            password,
            delete,
            yes,
        } => {
            let reference = parse_reference(&reference)?;
            session.navigate(Route::View(reference)).await?;
            let view = current_view(&session)?;
            if let SnippetState::LocateFailed { error, .. } = view.state().await {
                bail!("{}", error);
            }
            if let Some(located) = view.state().await.located() {
                writeln!(output, "{}", located.display_title())?;
            }

            let password = match password {
                Some(p) => p,
                None => prompt(input, output, "Password: ")?,
            };
            view.edit_password(password).await;
            view.decrypt().await;
            match view.state().await {
                SnippetState::Decrypted { plaintext, .. } => {
                    writeln!(output, "{}", plaintext.expose())?
                }
                _ => {
                    let notice = view.notice().await.map(|n| n.message());
                    bail!(notice.unwrap_or_else(|| "Decryption failed.".to_string()));
                }
            }

            if delete {
                view.request_delete().await;
                if !yes && !confirm(input, output)? {
                    view.cancel_delete().await;
                    writeln!(output, "Kept.")?;
                    return Ok(());
                }
                session.confirm_delete().await;
                match session.take_notice() {
                    Some(notice) if session.route() == &Route::Collection => {
                        writeln!(output, "{}", notice)?
                    }
                    _ => {
                        let notice = view.notice().await.map(|n| n.message());
                        bail!(notice.unwrap_or_else(|| "Failed to delete snippet.".to_string()));
                    }
                }
            }
        }
        Cmd::Delete { id, yes } => {
            if !yes && !confirm(input, output)? {
                writeln!(output, "Kept.")?;
                return Ok(());
            }
            match session.collection().delete(&SnippetId::new(id)).await {
                DeleteOutcome::Deleted => writeln!(output, "Snippet deleted successfully")?,
                DeleteOutcome::Suppressed => writeln!(output, "Delete already in progress.")?,
                DeleteOutcome::Failed(error) => bail!("{}", error),
            }
        }
        Cmd::Qr { id, title, out } => {
            session
                .navigate(Route::CodeIssuance {
                    id: SnippetId::new(id),
                    title,
                })
                .await?;
            let issued = session
                .issued()
                .cloned()
                .ok_or_else(|| anyhow!("No code issued"))?;
            writeln!(output, "{}", issued.url)?;
            let dir = out.unwrap_or_else(|| config.app.export_dir.clone());
            save_code(&issued, config, &dir, output)?;
        }
        Cmd::Demo => demo(&mut session, config, output).await?,
    }
    Ok(())
}

async fn create(
    session: &mut Session<dyn SnippetService>,
    draft: Draft,
    output: &mut dyn Write,
) -> Result<IssuedCode> {
    session.navigate(Route::Create).await?;
    let view = current_view(session)?;
    view.edit_draft(draft).await;
    view.submit().await;

    match view.state().await {
        SnippetState::Created {
            snippet, password, ..
        } => {
            writeln!(output, "Created {}", snippet.id)?;
            if let Some(password) = password {
                writeln!(output, "Password: {} (store it now, it is not kept)", password.expose())?;
            }
        }
        _ => {
            let notice = view.notice().await.map(|n| n.message());
            bail!(notice.unwrap_or_else(|| "Failed to create snippet.".to_string()));
        }
    }

    let issued = session
        .confirm_created()
        .await?
        .ok_or_else(|| anyhow!("Snippet was not created"))?;
    writeln!(output, "{}", issued.url)?;
    Ok(issued)
}

fn save_code(issued: &IssuedCode, config: &Config, dir: &Path, output: &mut dyn Write) -> Result<()> {
    let renderer = QrRenderer::new(config.app.qr_size);
    let image = issued.render(&renderer)?;
    let notice = issued.save_to(dir, &image);
    writeln!(output, "{}", notice.message())?;
    if !notice.is_success() {
        bail!(notice.message());
    }
    Ok(())
}

/// End-to-end walk through every stage against an in-process service.
async fn demo(
    session: &mut Session<dyn SnippetService>,
    config: &Config,
    output: &mut dyn Write,
) -> Result<()> {
    let issued = create(
        session,
        Draft::new("Demo", "The eagle lands at dawn.", "P12345", "demo, example"),
        output,
    )
    .await?;
    let renderer = QrRenderer::new(config.app.qr_size);
    let image = issued.render(&renderer)?;
    writeln!(output, "Code: {}x{} px", image.width(), image.height())?;

    session.navigate(Route::Collection).await?;
    writeln!(output, "Listed: {}", session.collection().items().await.len())?;

    let reference = SnippetRef::from_share_url(&issued.url)?;
    session.navigate(Route::View(reference)).await?;
    let view = current_view(session)?;

    view.edit_password("wrong-password").await;
    view.decrypt().await;
    if let Some(notice) = view.notice().await {
        writeln!(output, "Wrong password: {}", notice.message())?;
    }
    view.acknowledge().await;

    view.edit_password("P12345").await;
    view.decrypt().await;
    if let Some(plaintext) = view.state().await.plaintext() {
        writeln!(output, "Decrypted: {}", plaintext)?;
    }

    view.request_delete().await;
    session.confirm_delete().await;
    if let Some(notice) = session.take_notice() {
        writeln!(output, "{}", notice)?;
    }
    writeln!(output, "Remaining: {}", session.collection().items().await.len())?;
    Ok(())
}

fn current_view(session: &Session<dyn SnippetService>) -> Result<SnippetMachine<dyn SnippetService>> {
    session.view().cloned().ok_or_else(|| anyhow!("No open view"))
}

/// Bare id, shared link, or app path.
fn parse_reference(input: &str) -> Result<SnippetRef> {
    let input = input.trim();
    if input.contains("://") || input.starts_with('/') {
        return match Route::parse_str(input)? {
            Route::View(reference) => Ok(reference),
            other => Err(anyhow!("{} is not a snippet link", other.path())),
        };
    }
    Ok(SnippetRef::parse(input)?)
}

fn prompt(input: &mut dyn BufRead, output: &mut dyn Write, label: &str) -> Result<String> {
    write!(output, "{}", label)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn read_all(input: &mut dyn BufRead) -> Result<String> {
    let mut message = String::new();
    input.read_to_string(&mut message)?;
    Ok(message.trim_end().to_string())
}

/// Anything but y/yes cancels.
fn confirm(input: &mut dyn BufRead, output: &mut dyn Write) -> Result<bool> {
    let answer = prompt(
        input,
        output,
        "Are you sure you want to delete this snippet? [y/N] ",
    )?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
