use chrono::Utc;
use clap::Parser;
use sales_desk::domain::period::Period;
use sales_desk::utils::logger;
use sales_desk::utils::money::format_eur;
use sales_desk::{build_services, BotConfig};

#[derive(Parser)]
#[command(name = "probe-sources")]
#[command(about = "Hit every configured data source once and report what comes back")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "sales-desk.toml")]
    config: String,

    /// Period to query the sales channels for
    #[arg(short, long, default_value = "yesterday")]
    period: Period,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn report<T, E: std::fmt::Display>(name: &str, result: Result<T, E>, show: impl Fn(&T) -> String) -> bool {
    match result {
        Ok(value) => {
            println!("✅ {:<22} {}", name, show(&value));
            true
        }
        Err(e) => {
            println!("❌ {:<22} {}", name, e);
            false
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    println!("🚀 Probing data sources ({})", args.period.label());

    let config = BotConfig::from_file(&args.config)?;
    config.validate_config()?;
    let services = build_services(&config)?;
    let now = Utc::now();
    let mut healthy = true;

    for source in [services.aggregator.online(), services.aggregator.retail()] {
        healthy &= report(
            source.label(),
            source.period_sales(args.period, now).await,
            |f| format!("{} / {} {}", format_eur(f.revenue), f.count, f.channel.count_noun()),
        );
    }

    match &services.restaurant {
        Some(ledger) => {
            healthy &= report("Restaurant ledger", ledger.sales(now).await, |s| {
                format!("yesterday {} / MTD {}", format_eur(s.yesterday), format_eur(s.mtd))
            });
        }
        None => println!("➖ {:<22} not configured", "Restaurant ledger"),
    }

    match (&config.suppliers, &services.sheets) {
        (Some(section), Some(sheets)) => {
            healthy &= report(
                "Supplier ledger",
                sheets.tab_titles(&section.sheet_id).await,
                |tabs| format!("{} supplier tabs", tabs.len()),
            );
        }
        _ => println!("➖ {:<22} not configured", "Supplier ledger"),
    }

    if healthy {
        println!("\n✅ All configured sources answered");
        Ok(())
    } else {
        println!("\n❌ Some sources failed; run with --verbose for details");
        std::process::exit(2);
    }
}
