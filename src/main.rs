use async_trait::async_trait;
use chrono::Utc;
use clap::Parser;
use sales_desk::domain::ports::ChatTransport;
use sales_desk::utils::error::{BotError, ErrorSeverity};
use sales_desk::utils::{logger, validation::Validate};
use sales_desk::{build_engine, build_services, BotConfig, CliArgs, Command};

/// Prints replies instead of sending them, for `ask`.
struct StdoutChat;

#[async_trait]
impl ChatTransport for StdoutChat {
    async fn send_message(&self, _chat_id: i64, text: &str) -> sales_desk::Result<()> {
        println!("{}\n", text);
        Ok(())
    }
}

fn exit_with(e: &BotError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(code);
}

fn display_config_summary(config: &BotConfig) {
    println!("📋 Configuration summary");
    println!("  Shopify store:    {}", config.shopify.store);
    println!("  Flour Cloud:      {}", config.flour_base_url());
    println!(
        "  Intent parser:    {}",
        if config.llm.is_some() { config.llm_model() } else { "keywords" }
    );
    println!(
        "  Restaurant sheet: {}",
        config.restaurant.as_ref().map_or("-", |r| r.sheet_id.as_str())
    );
    println!(
        "  Supplier sheet:   {}",
        config.suppliers.as_ref().map_or("-", |s| s.sheet_id.as_str())
    );
    println!("  Gmail inboxes:    {}", config.gmail_inboxes().len());
    println!(
        "  Allowed users:    {}",
        if config.telegram.allowed_user_ids.is_empty() {
            "everyone".to_string()
        } else {
            format!("{:?}", config.telegram.allowed_user_ids)
        }
    );
    match (
        config.daily_report_enabled(),
        config.telegram.report_chat_id,
        config.daily_report_at(),
        config.timezone(),
    ) {
        (true, Some(chat_id), Ok(at), Ok(tz)) => println!(
            "  Daily report:     {} {} -> chat {}",
            at.format("%H:%M"),
            tz,
            chat_id
        ),
        _ => println!("  Daily report:     disabled"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting sales-desk");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = match BotConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(&e);
    }
    tracing::info!("✅ Configuration loaded and validated successfully");

    let services = build_services(&config).unwrap_or_else(|e| exit_with(&e));

    match args.command() {
        Command::Check => {
            display_config_summary(&config);
            if let Err(e) = build_engine(&config, &services) {
                exit_with(&e);
            }
            println!("✅ Configuration OK");
        }
        Command::Ask { text } => {
            let question = text.join(" ");
            if question.trim().is_empty() {
                eprintln!("❌ Nothing to ask. Example: sales-desk ask \"retail sales yesterday\"");
                std::process::exit(1);
            }
            services
                .assistant
                .reply_to(&StdoutChat, 0, &question, Utc::now())
                .await
                .unwrap_or_else(|e| exit_with(&e));
        }
        Command::Report => {
            let briefing = services.report.compile(Utc::now()).await;
            println!("{}", briefing.render());
        }
        Command::Run => {
            let engine = build_engine(&config, &services).unwrap_or_else(|e| exit_with(&e));
            if let Err(e) = engine.run().await {
                exit_with(&e);
            }
            tracing::info!("✅ Bot stopped");
        }
    }

    Ok(())
}
