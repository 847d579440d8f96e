//! Telegram bot.
//!
//! The chat front end of the ledger: a single allow-listed user drives it
//! with commands and sends import files as documents. The bot owns the
//! shared [`Ledger`] and serializes every command on it.

use std::sync::Arc;

use engine::{DbStore, FileFormat, Ledger};
use teloxide::{prelude::*, utils::command::BotCommands};
use tokio::sync::Mutex;

mod commands;
mod handlers;
mod messages;
mod parsing;

pub use commands::Command;

/// Default limit for import files, 5 MiB.
pub const DEFAULT_MAX_IMPORT_BYTES: u32 = 5 * 1024 * 1024;

pub type SharedLedger = Arc<Mutex<Ledger<DbStore>>>;

#[derive(Clone)]
pub struct ConfigParameters {
    allowed_user: UserId,
    ledger: SharedLedger,
    max_import_bytes: u32,
    report_format: FileFormat,
}

impl ConfigParameters {
    fn is_allowed(&self, msg: &Message) -> bool {
        msg.from.as_ref().is_some_and(|user| user.id == self.allowed_user)
    }
}

pub struct Bot {
    token: String,
    parameters: ConfigParameters,
}

impl Bot {
    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    pub async fn run(&self) {
        tracing::info!("Starting telegram bot...");

        let bot = teloxide::Bot::new(&self.token);
        if let Err(err) = bot.set_my_commands(Command::bot_commands()).await {
            tracing::warn!("failed to register the command list: {err}");
        }

        let handler = Update::filter_message()
            .branch(
                dptree::filter(|msg: Message, cfg: ConfigParameters| !cfg.is_allowed(&msg))
                    .endpoint(handlers::reject_unauthorized),
            )
            .branch(
                dptree::entry()
                    .filter_command::<Command>()
                    .endpoint(handlers::handle_command),
            )
            .branch(
                dptree::filter(|msg: Message| msg.document().is_some())
                    .endpoint(handlers::handle_document),
            );

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![self.parameters.clone()])
            .default_handler(|upd| async move {
                tracing::debug!("Unhandled update: {:?}", upd.id);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

#[derive(Default)]
pub struct BotBuilder {
    token: String,
    allowed_user: Option<UserId>,
    ledger: Option<SharedLedger>,
    max_import_bytes: Option<u32>,
    report_format: FileFormat,
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.token = token.to_string();
        self
    }

    /// The only Telegram user the bot answers to.
    pub fn allowed_user(mut self, user_id: u64) -> BotBuilder {
        self.allowed_user = Some(UserId(user_id));
        self
    }

    pub fn ledger(mut self, ledger: Ledger<DbStore>) -> BotBuilder {
        self.ledger = Some(Arc::new(Mutex::new(ledger)));
        self
    }

    pub fn max_import_bytes(mut self, bytes: u32) -> BotBuilder {
        self.max_import_bytes = Some(bytes);
        self
    }

    /// Format of the `/report` export, xlsx unless set.
    pub fn report_format(mut self, format: FileFormat) -> BotBuilder {
        self.report_format = format;
        self
    }

    pub fn build(self) -> Result<Bot, String> {
        tracing::info!("Initializing telegram bot...");
        if self.token.trim().is_empty() {
            return Err("telegram token is empty".to_string());
        }
        let allowed_user = self
            .allowed_user
            .ok_or_else(|| "allowed user id is not set".to_string())?;
        let ledger = self
            .ledger
            .ok_or_else(|| "ledger is not set".to_string())?;

        Ok(Bot {
            token: self.token,
            parameters: ConfigParameters {
                allowed_user,
                ledger,
                max_import_bytes: self.max_import_bytes.unwrap_or(DEFAULT_MAX_IMPORT_BYTES),
                report_format: self.report_format,
            },
        })
    }
}
