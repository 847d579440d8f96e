//! Update handlers. Every engine error is turned into a reply here; only
//! Telegram request errors leave a handler.

use engine::{EngineError, FileFormat, validate_entry};
use teloxide::{
    net::Download,
    prelude::*,
    types::{Document, InputFile, ParseMode},
};

use crate::{
    ConfigParameters,
    commands::Command,
    messages,
    parsing::{ArgsError, parse_balance_args, parse_period_args, split_add_args},
};

pub(crate) async fn reject_unauthorized(bot: Bot, msg: Message) -> ResponseResult<()> {
    tracing::warn!(
        user = ?msg.from.as_ref().map(|u| u.id),
        chat = %msg.chat.id,
        "rejected message from unauthorized user"
    );
    bot.send_message(msg.chat.id, messages::UNAUTHORIZED).await?;
    Ok(())
}

pub(crate) async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    tracing::debug!(?cmd, "command received");

    match cmd {
        Command::Start => start(&bot, chat_id, &cfg).await,
        Command::Help => {
            bot.send_message(chat_id, messages::help(cfg.report_format)).await?;
            Ok(())
        }
        Command::SetBalance { args } => set_balance(&bot, chat_id, &cfg, &args).await,
        Command::Add { args } => add(&bot, chat_id, &cfg, &args).await,
        Command::Balance => balance(&bot, chat_id, &cfg).await,
        Command::Report => report(&bot, chat_id, &cfg).await,
        Command::Monthly { args } => monthly(&bot, chat_id, &cfg, &args).await,
        Command::Import => {
            bot.send_message(
                chat_id,
                messages::import_instructions(cfg.max_import_bytes, cfg.report_format),
            )
            .await?;
            Ok(())
        }
    }
}

pub(crate) async fn handle_document(
    bot: Bot,
    msg: Message,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    let Some(document) = msg.document() else {
        return Ok(());
    };
    let chat_id = msg.chat.id;

    let Some(format) = document
        .file_name
        .as_deref()
        .and_then(FileFormat::from_file_name)
    else {
        bot.send_message(chat_id, messages::WRONG_FILE_TYPE).await?;
        return Ok(());
    };
    if document.file.size > cfg.max_import_bytes {
        tracing::warn!(size = document.file.size, "import file too large");
        bot.send_message(chat_id, messages::file_too_large(cfg.max_import_bytes))
            .await?;
        return Ok(());
    }

    let status = bot.send_message(chat_id, messages::PROCESSING).await?;

    let text = match download(&bot, document).await {
        Ok(data) => {
            let mut ledger = cfg.ledger.lock().await;
            match ledger.import_file(format, &data).await {
                Ok(outcome) => messages::import_done(&outcome),
                Err(EngineError::ValidationFailed(errors)) => {
                    tracing::warn!(errors = errors.len(), "import rejected");
                    messages::import_failed(&errors)
                }
                Err(err) => user_message_for_engine_error(&err),
            }
        }
        Err(err) => {
            tracing::error!("failed to download import file: {err}");
            messages::DOWNLOAD_FAILED.to_string()
        }
    };

    bot.edit_message_text(chat_id, status.id, text).await?;
    Ok(())
}

async fn download(bot: &Bot, document: &Document) -> Result<Vec<u8>, String> {
    let file = bot
        .get_file(document.file.id.clone())
        .await
        .map_err(|err| err.to_string())?;

    let mut data = Vec::with_capacity(file.size as usize);
    bot.download_file(&file.path, &mut data)
        .await
        .map_err(|err| err.to_string())?;
    Ok(data)
}

async fn start(bot: &Bot, chat_id: ChatId, cfg: &ConfigParameters) -> ResponseResult<()> {
    let current = cfg.ledger.lock().await.current_balance();
    match current {
        Ok(balance) => {
            bot.send_message(chat_id, messages::welcome_md(balance))
                .parse_mode(ParseMode::MarkdownV2)
                .await?;
        }
        Err(_) => {
            bot.send_message(chat_id, messages::welcome_no_balance())
                .await?;
        }
    }
    Ok(())
}

async fn set_balance(
    bot: &Bot,
    chat_id: ChatId,
    cfg: &ConfigParameters,
    args: &str,
) -> ResponseResult<()> {
    let mut ledger = cfg.ledger.lock().await;
    if ledger.is_configured() {
        bot.send_message(chat_id, messages::ALREADY_SET).await?;
        return Ok(());
    }

    let amount = match parse_balance_args(args) {
        Ok(amount) => amount,
        Err(err) => {
            tracing::warn!("invalid /setbalance arguments: {err}");
            bot.send_message(chat_id, messages::SETBALANCE_USAGE).await?;
            return Ok(());
        }
    };

    let text = match ledger.set_starting_balance(amount).await {
        Ok(current) => messages::balance_set(amount, current),
        Err(err) => user_message_for_engine_error(&err),
    };
    bot.send_message(chat_id, text).await?;
    Ok(())
}

async fn add(bot: &Bot, chat_id: ChatId, cfg: &ConfigParameters, args: &str) -> ResponseResult<()> {
    let mut ledger = cfg.ledger.lock().await;
    if !ledger.is_configured() {
        bot.send_message(chat_id, messages::NOT_CONFIGURED).await?;
        return Ok(());
    }

    let parsed = split_add_args(args).and_then(|(amount, category, description)| {
        validate_entry(amount, category, description).map_err(ArgsError::from)
    });
    let entry = match parsed {
        Ok(entry) => entry,
        Err(err) => {
            tracing::warn!("invalid /add arguments: {err}");
            let text = match err {
                ArgsError::Engine(EngineError::InvalidCategory(_)) => messages::invalid_category(),
                ArgsError::Engine(EngineError::InvalidAmount(reason)) => {
                    messages::invalid_amount(&reason)
                }
                _ => messages::add_usage(),
            };
            bot.send_message(chat_id, text).await?;
            return Ok(());
        }
    };

    match ledger.add_transaction(entry).await {
        Ok(tx) => {
            bot.send_message(chat_id, messages::transaction_added_md(&tx))
                .parse_mode(ParseMode::MarkdownV2)
                .await?;
        }
        Err(err) => {
            bot.send_message(chat_id, user_message_for_engine_error(&err))
                .await?;
        }
    }
    Ok(())
}

async fn balance(bot: &Bot, chat_id: ChatId, cfg: &ConfigParameters) -> ResponseResult<()> {
    let current = cfg.ledger.lock().await.current_balance();
    match current {
        Ok(balance) => {
            bot.send_message(chat_id, messages::balance_md(balance))
                .parse_mode(ParseMode::MarkdownV2)
                .await?;
        }
        Err(err) => {
            bot.send_message(chat_id, user_message_for_engine_error(&err))
                .await?;
        }
    }
    Ok(())
}

async fn report(bot: &Bot, chat_id: ChatId, cfg: &ConfigParameters) -> ResponseResult<()> {
    let export = cfg.ledger.lock().await.export(cfg.report_format).await;
    match export {
        Ok(Some(data)) => {
            bot.send_document(
                chat_id,
                InputFile::memory(data).file_name(messages::report_file_name(cfg.report_format)),
            )
            .caption(messages::REPORT_CAPTION)
            .await?;
        }
        Ok(None) => {
            bot.send_message(chat_id, messages::NO_TRANSACTIONS).await?;
        }
        Err(err) => {
            bot.send_message(chat_id, user_message_for_engine_error(&err))
                .await?;
        }
    }
    Ok(())
}

async fn monthly(
    bot: &Bot,
    chat_id: ChatId,
    cfg: &ConfigParameters,
    args: &str,
) -> ResponseResult<()> {
    let ledger = cfg.ledger.lock().await;
    let timezone = ledger.timezone();

    let period = match parse_period_args(args, timezone) {
        Ok(period) => period,
        Err(err) => {
            tracing::warn!("invalid /monthly arguments: {err}");
            bot.send_message(chat_id, messages::INVALID_PERIOD).await?;
            return Ok(());
        }
    };

    match ledger.monthly_report(period).await {
        Ok(Some(report)) => {
            bot.send_message(chat_id, messages::monthly_report_md(&report, timezone))
                .parse_mode(ParseMode::MarkdownV2)
                .await?;
        }
        Ok(None) => {
            bot.send_message(chat_id, messages::no_expenses(period))
                .await?;
        }
        Err(err) => {
            bot.send_message(chat_id, user_message_for_engine_error(&err))
                .await?;
        }
    }
    Ok(())
}

fn user_message_for_engine_error(err: &EngineError) -> String {
    match err {
        EngineError::AlreadyConfigured => messages::ALREADY_SET.to_string(),
        EngineError::NotConfigured => messages::NOT_CONFIGURED.to_string(),
        EngineError::InvalidCategory(_) => messages::invalid_category(),
        EngineError::InvalidPeriod(_) => messages::INVALID_PERIOD.to_string(),
        EngineError::InvalidAmount(_) | EngineError::InvalidTimestamp(_) => format!("❌ {err}"),
        EngineError::ValidationFailed(errors) => messages::import_failed(errors),
        EngineError::Export(_) | EngineError::Database(_) => {
            tracing::error!("ledger operation failed: {err}");
            messages::STORE_FAILURE.to_string()
        }
    }
}
