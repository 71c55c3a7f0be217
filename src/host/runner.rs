//! Userbot runtime: login, command registration and the update loop.

use super::help::HelpCommand;
use super::CommandRegistry;
use crate::client::ChatClient;
use crate::config::Settings;
use crate::lookup::{IdCommand, IdOptions};
use crate::telegram::{invocation_from_message, GrammersClient};
use anyhow::{Context, Result};
use grammers_client::types::Message;
use grammers_client::{Client, Config, InitParams, SignInError, Update};
use grammers_session::Session;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Registers every command the userbot offers.
#[must_use]
pub fn build_registry(settings: &Settings, client: Arc<dyn ChatClient>) -> CommandRegistry {
    let mut registry = CommandRegistry::new(settings.command_prefix.clone());
    registry.register(Arc::new(IdCommand::new(
        client.clone(),
        IdOptions::from(settings),
    )));
    let help = HelpCommand::new(
        client,
        settings.locale,
        settings.command_prefix.clone(),
        registry.infos(),
    );
    registry.register(Arc::new(help));
    registry
}

fn prompt(message: &str) -> Result<String> {
    let mut stdout = io::stdout();
    stdout.write_all(message.as_bytes())?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

async fn connect(settings: &Settings) -> Result<Client> {
    info!("Connecting to Telegram...");
    let session = Session::load_file_or_create(&settings.session_file)
        .with_context(|| format!("Failed to open session file {}", settings.session_file))?;
    let client = Client::connect(Config {
        session,
        api_id: settings.api_id,
        api_hash: settings.api_hash.clone(),
        params: InitParams::default(),
    })
    .await
    .context("Failed to connect to Telegram")?;
    info!("Connected.");
    Ok(client)
}

async fn ensure_authorized(client: &Client, settings: &Settings) -> Result<()> {
    if client.is_authorized().await? {
        return Ok(());
    }

    info!("Session is not authorized, signing in...");
    let phone = match &settings.phone {
        Some(phone) => phone.clone(),
        None => prompt("Enter your phone number (international format): ")?,
    };
    let token = client.request_login_code(&phone).await?;
    let code = prompt("Enter the code you received: ")?;

    match client.sign_in(&token, &code).await {
        Ok(_) => {}
        Err(SignInError::PasswordRequired(password_token)) => {
            let hint = password_token.hint().unwrap_or("none").to_string();
            let password = prompt(&format!("Enter the password (hint {hint}): "))?;
            client
                .check_password(password_token, password.trim())
                .await
                .context("Two-step verification failed")?;
        }
        Err(e) => return Err(e).context("Sign in failed"),
    }

    save_session(client, settings)?;
    info!("Signed in.");
    Ok(())
}

fn save_session(client: &Client, settings: &Settings) -> Result<()> {
    client
        .session()
        .save_to_file(&settings.session_file)
        .with_context(|| format!("Failed to save session to {}", settings.session_file))
}

fn dispatch(message: Message, settings: &Settings, registry: &Arc<CommandRegistry>) {
    if settings.outgoing_only && !message.outgoing() {
        return;
    }
    let Some((command, parsed)) = registry.lookup(message.text()) else {
        return;
    };

    debug!(command = %parsed.name, message_id = message.id(), "Dispatching command");
    tokio::spawn(async move {
        let invocation = invocation_from_message(&message, parsed.args).await;
        command.execute(invocation).await;
    });
}

/// Connects, signs in if needed and serves commands until Ctrl-C.
///
/// # Errors
///
/// Returns an error if connecting, signing in or receiving updates fails.
pub async fn run(settings: Arc<Settings>) -> Result<()> {
    let client = connect(&settings).await?;
    ensure_authorized(&client, &settings).await?;

    let chat_client: Arc<dyn ChatClient> = Arc::new(GrammersClient::new(client.clone()));
    let registry = Arc::new(build_registry(&settings, chat_client));
    info!(
        prefix = registry.prefix(),
        commands = registry.infos().len(),
        "Userbot is running..."
    );

    let result = loop {
        let update = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C, shutting down.");
                break Ok(());
            }
            update = client.next_update() => update,
        };

        match update {
            Ok(Update::NewMessage(message)) => dispatch(message, &settings, &registry),
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "Failed to receive updates");
                break Err(anyhow::Error::new(e).context("Update loop stopped"));
            }
        }
    };

    save_session(&client, &settings)?;
    result
}
