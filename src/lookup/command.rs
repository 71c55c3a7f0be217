//! The `.id` command: status placeholder, resolution, formatting, final edit.

use super::extractor::Extractor;
use super::presenter::Presenter;
use super::resolver::Resolver;
use crate::client::{ChatClient, ClientError, MessageRef, ParseMode};
use crate::config::Settings;
use crate::host::{answer, Command, Invocation};
use crate::i18n::Locale;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

/// Where a command run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Started,
    Resolving,
    Formatting,
    Done,
    ErrorTerminal,
}

/// How a command run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The result was shown for this account
    Reported { account_id: i64 },
    /// No account matched; the "not found" notice was shown
    NotFound,
    /// A failure was caught and reported in the status message
    Failed { stage: Stage, reason: String },
    /// The status placeholder could not even be sent
    Unacknowledged { reason: String },
}

#[derive(Debug, Error)]
#[error("{source}")]
struct StageError {
    stage: Stage,
    #[source]
    source: ClientError,
}

impl StageError {
    fn at(stage: Stage) -> impl FnOnce(ClientError) -> Self {
        move |source| Self { stage, source }
    }
}

/// Options of the `.id` command.
#[derive(Debug, Clone)]
pub struct IdOptions {
    pub prefix: String,
    pub locale: Locale,
    pub custom_emoji: bool,
    pub photo_limit: usize,
}

impl From<&Settings> for IdOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            prefix: settings.command_prefix.clone(),
            locale: settings.locale,
            custom_emoji: settings.custom_emoji,
            photo_limit: settings.photo_limit,
        }
    }
}

/// Reports name, username, id and approximate creation date of an account.
pub struct IdCommand {
    client: Arc<dyn ChatClient>,
    resolver: Resolver,
    extractor: Extractor,
    presenter: Presenter,
    prefix: String,
}

impl IdCommand {
    #[must_use]
    pub fn new(client: Arc<dyn ChatClient>, options: IdOptions) -> Self {
        Self {
            resolver: Resolver::new(client.clone()),
            extractor: Extractor::new(client.clone(), options.photo_limit, options.locale),
            presenter: Presenter::new(options.locale, options.custom_emoji),
            prefix: options.prefix,
            client,
        }
    }

    /// Runs the command once. Every failure is absorbed and reported to the user.
    pub async fn run(&self, invocation: &Invocation) -> Outcome {
        debug!(stage = ?Stage::Started, message_id = invocation.message.id, "Running .id");
        let status = match answer(self.client.as_ref(), invocation, &self.presenter.getting_info())
            .await
        {
            Ok(status) => status,
            Err(e) => {
                error!(error = %e, "Failed to send status message");
                return Outcome::Unacknowledged {
                    reason: e.to_string(),
                };
            }
        };

        match self.pipeline(invocation, &status).await {
            Ok(outcome) => {
                debug!(stage = ?Stage::Done, ?outcome, "Finished .id");
                outcome
            }
            Err(e) => {
                error!(stage = ?e.stage, error = %e, "Error in .id command");
                let text = self.presenter.error(&e.to_string());
                if let Err(report) = self.client.edit(&status, &text, ParseMode::Html).await {
                    error!(error = %report, "Failed to report .id error");
                }
                debug!(stage = ?Stage::ErrorTerminal, "Finished .id");
                Outcome::Failed {
                    stage: e.stage,
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn pipeline(
        &self,
        invocation: &Invocation,
        status: &MessageRef,
    ) -> Result<Outcome, StageError> {
        debug!(stage = ?Stage::Resolving, "Resolving target");
        let Some(account) = self.resolver.resolve(invocation).await else {
            self.client
                .edit(status, &self.presenter.not_found(), ParseMode::Html)
                .await
                .map_err(StageError::at(Stage::Resolving))?;
            return Ok(Outcome::NotFound);
        };

        debug!(stage = ?Stage::Formatting, account_id = account.id, "Formatting result");
        let profile = self.extractor.extract(&account).await;
        let text = self.presenter.result(&profile);
        self.client
            .edit(status, &text, ParseMode::Html)
            .await
            .map_err(StageError::at(Stage::Formatting))?;

        info!(account_id = account.id, "Reported account information");
        Ok(Outcome::Reported {
            account_id: account.id,
        })
    }
}

#[async_trait]
impl Command for IdCommand {
    fn name(&self) -> &'static str {
        "id"
    }

    fn usage(&self) -> String {
        self.presenter.usage(&self.prefix)
    }

    fn description(&self) -> &'static str {
        self.presenter.strings().id_description
    }

    async fn execute(&self, invocation: Invocation) {
        self.run(&invocation).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Account, ChatKind, ChatRef, MockChatClient, Resolved};
    use mockall::Sequence;

    fn options() -> IdOptions {
        IdOptions {
            prefix: ".".into(),
            locale: Locale::En,
            custom_emoji: false,
            photo_limit: 200,
        }
    }

    fn invocation() -> Invocation {
        Invocation {
            message: MessageRef {
                chat: ChatRef {
                    kind: ChatKind::User,
                    id: 1,
                    access_hash: Some(2),
                },
                id: 3,
            },
            outgoing: true,
            args: None,
            sender: Some(Resolved::Full(Account {
                first_name: Some("Alice".into()),
                ..Account::bare(1)
            })),
            reply: None,
        }
    }

    #[tokio::test]
    async fn test_failed_result_edit_reports_error() {
        let mut seq = Sequence::new();
        let mut mock = MockChatClient::new();
        mock.expect_edit()
            .withf(|_, text, _| text.contains("Getting information"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        mock.expect_get_profile_photos()
            .returning(|_, _| Ok(Vec::new()));
        mock.expect_edit()
            .withf(|_, text, _| text.contains("Alice"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| {
                Err(ClientError::Rpc {
                    code: 400,
                    name: "ENTITY_BOUNDS_INVALID".into(),
                })
            });
        mock.expect_edit()
            .withf(|_, text, _| {
                text.contains("An error occurred") && text.contains("ENTITY_BOUNDS_INVALID")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));

        let command = IdCommand::new(Arc::new(mock), options());
        let outcome = command.run(&invocation()).await;
        assert!(matches!(
            outcome,
            Outcome::Failed {
                stage: Stage::Formatting,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_status_failure_is_unacknowledged() {
        let mut mock = MockChatClient::new();
        mock.expect_edit()
            .times(1)
            .returning(|_, _, _| Err(ClientError::Transport("disconnected".into())));
        mock.expect_resolve().never();

        let command = IdCommand::new(Arc::new(mock), options());
        let outcome = command.run(&invocation()).await;
        assert!(matches!(outcome, Outcome::Unacknowledged { .. }));
    }

    #[tokio::test]
    async fn test_failed_not_found_edit_is_resolving_error() {
        let mut seq = Sequence::new();
        let mut mock = MockChatClient::new();
        mock.expect_edit()
            .withf(|_, text, _| text.contains("Getting information"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        mock.expect_edit()
            .withf(|_, text, _| text.contains("User not found"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Err(ClientError::Transport("gone".into())));
        mock.expect_edit()
            .withf(|_, text, _| text.contains("gone"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));

        let mut inv = invocation();
        inv.sender = None;
        let command = IdCommand::new(Arc::new(mock), options());
        let outcome = command.run(&inv).await;
        assert_eq!(
            outcome,
            Outcome::Failed {
                stage: Stage::Resolving,
                reason: "Transport error: gone".into(),
            }
        );
    }
}
