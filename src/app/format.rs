//! Chat replies. Plain text, no markup, amounts in euros.

use crate::app::aggregator::{LabeledFigures, SalesAnswer};
use crate::domain::model::{
    CompanyProfile, MailSearchResults, SalesChannel, SupplierLookup, SupplierStatement,
};
use crate::utils::money::format_eur;

pub const HELP_TEXT: &str = "I can answer questions like:\n\
• What were my sales today?\n\
• Retail sales yesterday?\n\
• Compare online and retail last week\n\
• Total sales this month?\n\
• How much basmati rice did I sell this week?\n\
• Mishti sales yesterday online and retail?\n\
• Find invoice from TRS\n\
• Any email about the Ashoka delivery?";

pub const CHECKING_TEXT: &str = "Checking...";

pub const NOT_UNDERSTOOD_PREFIX: &str = "Sorry, I had trouble understanding that.";

fn short_name(channel: SalesChannel) -> &'static str {
    match channel {
        SalesChannel::Online => "Online",
        SalesChannel::Retail => "Retail",
    }
}

pub fn format_sales_answer(answer: &SalesAnswer) -> String {
    match answer {
        SalesAnswer::Single(single) if single.figures.product.is_some() => format_product(single),
        SalesAnswer::Single(single) => format_period(single),
        SalesAnswer::Total { online, retail } => format_total(online, retail),
        SalesAnswer::Comparison { online, retail } => format_comparison(online, retail),
        SalesAnswer::ProductAcrossChannels { online, retail } => {
            format_product_across_channels(online, retail)
        }
    }
}

fn format_period(single: &LabeledFigures) -> String {
    let f = &single.figures;
    format!(
        "{} — {}\nRevenue: {}\n{}: {}",
        single.label,
        f.period.label(),
        format_eur(f.revenue),
        f.channel.count_noun(),
        f.count
    )
}

/// 線上是預設通路，不加通路名稱；零售才標明
fn format_product(single: &LabeledFigures) -> String {
    let f = &single.figures;
    let product = f.product.as_deref().unwrap_or_default();
    let label = match f.channel {
        SalesChannel::Online => None,
        SalesChannel::Retail => Some(single.label.as_str()),
    };
    if f.count == 0 {
        let note = label.map(|l| format!(" on {}", l)).unwrap_or_default();
        return format!(
            "No sales found for \"{}\" {}{}.",
            product,
            f.period.label(),
            note
        );
    }
    let prefix = label.map(|l| format!("{} — ", l)).unwrap_or_default();
    format!(
        "{}\"{}\" — {}\nRevenue: {}\nUnits sold: {}",
        prefix,
        product,
        f.period.label(),
        format_eur(f.revenue),
        f.count
    )
}

fn format_product_across_channels(online: &LabeledFigures, retail: &LabeledFigures) -> String {
    let product = online.figures.product.as_deref().unwrap_or_default();
    let period = online.figures.period.label();
    let combined_revenue = online.figures.revenue + retail.figures.revenue;
    let combined_units = online.figures.count + retail.figures.count;

    if combined_units == 0 && combined_revenue == 0.0 {
        return format!(
            "No sales found for \"{}\" {} on either channel.",
            product, period
        );
    }

    let line = |side: &LabeledFigures| {
        format!(
            "{:<22}{}  |  Units: {}",
            format!("{}:", side.label),
            format_eur(side.figures.revenue),
            side.figures.count
        )
    };

    format!(
        "\"{}\" — {}\n\n{}\n{}\n\nCombined: {}  |  Units: {}",
        product,
        period,
        line(online),
        line(retail),
        format_eur(combined_revenue),
        combined_units
    )
}

fn format_comparison(online: &LabeledFigures, retail: &LabeledFigures) -> String {
    let block = |side: &LabeledFigures| {
        format!(
            "{}\n  Revenue: {}  |  {}: {}",
            side.label,
            format_eur(side.figures.revenue),
            side.figures.channel.count_noun(),
            side.figures.count
        )
    };

    format!(
        "Sales comparison — {}\n\n{}\n\n{}\n\nCombined total: {}",
        online.figures.period.label(),
        block(online),
        block(retail),
        format_eur(online.figures.revenue + retail.figures.revenue)
    )
}

fn format_total(online: &LabeledFigures, retail: &LabeledFigures) -> String {
    let row = |side: &LabeledFigures| {
        format!(
            "  {}: {} ({} {})",
            short_name(side.figures.channel),
            format_eur(side.figures.revenue),
            side.figures.count,
            side.figures.channel.count_noun().to_lowercase()
        )
    };

    format!(
        "Total sales — {}\nCombined: {}\n{}\n{}",
        online.figures.period.label(),
        format_eur(online.figures.revenue + retail.figures.revenue),
        row(online),
        row(retail)
    )
}

pub fn format_supplier_lookup(lookup: &SupplierLookup) -> String {
    match lookup {
        SupplierLookup::Found(statement) => format_supplier_statement(statement),
        SupplierLookup::NotFound { query } => {
            format!("No supplier tab found matching '{}'", query)
        }
    }
}

fn format_supplier_statement(statement: &SupplierStatement) -> String {
    let mut lines = vec![
        format!("{} — Outstanding", statement.supplier),
        String::new(),
        format!("Total balance:  {}", format_eur(statement.total_balance)),
        format!("Overdue:        {}", format_eur(statement.total_due)),
    ];

    let unpaid: Vec<_> = statement.unpaid().collect();
    if !unpaid.is_empty() {
        lines.push(String::new());
        lines.push("Unpaid invoices:".to_string());
        for inv in unpaid {
            lines.push(format!(
                "  {:<14}  {}  Due {}  Balance: {}",
                inv.invoice,
                inv.date,
                inv.due,
                format_eur(inv.balance)
            ));
        }
    }

    let credits: Vec<_> = statement.credit_notes().collect();
    if !credits.is_empty() {
        lines.push(String::new());
        lines.push("Unapplied credit notes:".to_string());
        for inv in credits {
            lines.push(format!(
                "  {:<14}  {}  {}",
                inv.invoice,
                inv.date,
                format_eur(inv.balance)
            ));
        }
    }

    lines.join("\n")
}

pub fn format_mail_results(results: &MailSearchResults) -> String {
    if results.is_empty() {
        return format!(
            "No emails found matching \"{}\" across all inboxes.",
            results.query
        );
    }

    let mut lines = vec![format!("Gmail search: \"{}\"", results.query), String::new()];
    for (inbox, hits) in results.inboxes.iter().filter(|(_, hits)| !hits.is_empty()) {
        lines.push(inbox.clone());
        for hit in hits {
            lines.push(format!("  {}  {}", hit.date, hit.from));
            lines.push(format!("  {}", hit.subject));
            lines.push(format!("  {}", hit.link));
            lines.push(String::new());
        }
    }
    lines.join("\n").trim().to_string()
}

pub fn format_company_profile(profile: &CompanyProfile) -> String {
    fn labeled(label: &str, value: &Option<String>) -> Option<String> {
        value.as_ref().map(|v| format!("{}: {}", label, v))
    }

    let directors = if profile.managing_directors.is_empty() {
        None
    } else {
        Some(profile.managing_directors.join(", "))
    };

    let groups: Vec<Vec<Option<String>>> = vec![
        vec![
            Some(profile.legal_name.clone()).filter(|n| !n.is_empty()),
            profile.address.clone(),
            profile.website.clone(),
        ],
        vec![
            labeled("Email", &profile.email),
            labeled("Invoices", &profile.invoices_email),
            labeled("Phone", &profile.phone),
            labeled("PayPal", &profile.paypal),
        ],
        vec![
            labeled("Tax Nr", &profile.tax_number),
            labeled("VAT", &profile.vat_id),
            labeled("Handelsregister", &profile.trade_register),
            labeled("EORI", &profile.eori),
        ],
        vec![labeled("Managing Directors", &directors)],
        vec![labeled("IBAN", &profile.iban), labeled("BIC", &profile.bic)],
    ];

    let blocks: Vec<String> = groups
        .into_iter()
        .map(|group| group.into_iter().flatten().collect::<Vec<_>>().join("\n"))
        .filter(|block| !block.is_empty())
        .collect();

    if blocks.is_empty() {
        return "No company details are configured.".to_string();
    }
    blocks.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{EmailHit, SalesFigures, SupplierInvoice};
    use crate::domain::period::Period;

    fn labeled(channel: SalesChannel, revenue: f64, count: u64, product: Option<&str>) -> LabeledFigures {
        let label = match channel {
            SalesChannel::Online => "Online (Shopify)",
            SalesChannel::Retail => "Retail (Flour Cloud)",
        };
        LabeledFigures {
            label: label.to_string(),
            figures: SalesFigures {
                channel,
                period: Period::LastWeek,
                product: product.map(str::to_string),
                revenue,
                count,
            },
        }
    }

    #[test]
    fn test_single_period_reply() {
        let reply = format_sales_answer(&SalesAnswer::Single(labeled(
            SalesChannel::Retail,
            1234.5,
            57,
            None,
        )));
        assert_eq!(
            reply,
            "Retail (Flour Cloud) — last week\nRevenue: €1,234.50\nTransactions: 57"
        );
    }

    #[test]
    fn test_product_reply_and_empty_product() {
        let reply = format_sales_answer(&SalesAnswer::Single(labeled(
            SalesChannel::Online,
            25.0,
            2,
            Some("basmati"),
        )));
        assert_eq!(reply, "\"basmati\" — last week\nRevenue: €25.00\nUnits sold: 2");

        let none = format_sales_answer(&SalesAnswer::Single(labeled(
            SalesChannel::Online,
            0.0,
            0,
            Some("saffron"),
        )));
        assert_eq!(none, "No sales found for \"saffron\" last week.");

        let retail = format_sales_answer(&SalesAnswer::Single(labeled(
            SalesChannel::Retail,
            12.0,
            3,
            Some("mishti"),
        )));
        assert_eq!(
            retail,
            "Retail (Flour Cloud) — \"mishti\" — last week\nRevenue: €12.00\nUnits sold: 3"
        );

        let retail_none = format_sales_answer(&SalesAnswer::Single(labeled(
            SalesChannel::Retail,
            0.0,
            0,
            Some("saffron"),
        )));
        assert_eq!(
            retail_none,
            "No sales found for \"saffron\" last week on Retail (Flour Cloud)."
        );
    }

    #[test]
    fn test_help_text_examples() {
        assert_eq!(HELP_TEXT.matches('•').count(), 8);
        assert!(!HELP_TEXT.contains("owe"));
    }

    #[test]
    fn test_total_and_comparison_replies() {
        let online = labeled(SalesChannel::Online, 100.0, 3, None);
        let retail = labeled(SalesChannel::Retail, 2000.0, 80, None);

        let total = format_sales_answer(&SalesAnswer::Total {
            online: online.clone(),
            retail: retail.clone(),
        });
        assert_eq!(
            total,
            "Total sales — last week\nCombined: €2,100.00\n  Online: €100.00 (3 orders)\n  Retail: €2,000.00 (80 transactions)"
        );

        let compare = format_sales_answer(&SalesAnswer::Comparison { online, retail });
        assert!(compare.starts_with("Sales comparison — last week\n\nOnline (Shopify)\n  Revenue: €100.00  |  Orders: 3"));
        assert!(compare.contains("Retail (Flour Cloud)\n  Revenue: €2,000.00  |  Transactions: 80"));
        assert!(compare.ends_with("Combined total: €2,100.00"));
    }

    #[test]
    fn test_product_across_channels_alignment() {
        let reply = format_sales_answer(&SalesAnswer::ProductAcrossChannels {
            online: labeled(SalesChannel::Online, 10.0, 1, Some("mishti")),
            retail: labeled(SalesChannel::Retail, 30.0, 6, Some("mishti")),
        });
        assert!(reply.contains("Online (Shopify):     €10.00  |  Units: 1"));
        assert!(reply.contains("Retail (Flour Cloud): €30.00  |  Units: 6"));
        assert!(reply.ends_with("Combined: €40.00  |  Units: 7"));

        let empty = format_sales_answer(&SalesAnswer::ProductAcrossChannels {
            online: labeled(SalesChannel::Online, 0.0, 0, Some("mishti")),
            retail: labeled(SalesChannel::Retail, 0.0, 0, Some("mishti")),
        });
        assert_eq!(empty, "No sales found for \"mishti\" last week on either channel.");
    }

    #[test]
    fn test_supplier_statement_sections() {
        let statement = SupplierStatement {
            supplier: "Transfood".to_string(),
            total_balance: 1500.0,
            total_due: 700.0,
            invoices: vec![
                SupplierInvoice {
                    date: "01/09/2026".to_string(),
                    invoice: "TF-1001".to_string(),
                    amount: 800.0,
                    due: "01/10/2026".to_string(),
                    balance: 800.0,
                },
                SupplierInvoice {
                    date: "05/09/2026".to_string(),
                    invoice: "CN-77".to_string(),
                    amount: -100.0,
                    due: String::new(),
                    balance: -100.0,
                },
            ],
        };

        let reply = format_supplier_lookup(&SupplierLookup::Found(statement));
        assert!(reply.starts_with("Transfood — Outstanding\n\nTotal balance:  €1,500.00\nOverdue:        €700.00"));
        assert!(reply.contains("Unpaid invoices:\n  TF-1001         01/09/2026  Due 01/10/2026  Balance: €800.00"));
        assert!(reply.contains("Unapplied credit notes:\n  CN-77           05/09/2026  €-100.00"));

        let missing = format_supplier_lookup(&SupplierLookup::NotFound {
            query: "Acme".to_string(),
        });
        assert_eq!(missing, "No supplier tab found matching 'Acme'");
    }

    #[test]
    fn test_mail_results() {
        let empty = MailSearchResults {
            query: "TRS".to_string(),
            inboxes: vec![("info@example.eu".to_string(), vec![])],
        };
        assert_eq!(
            format_mail_results(&empty),
            "No emails found matching \"TRS\" across all inboxes."
        );

        let found = MailSearchResults {
            query: "TRS".to_string(),
            inboxes: vec![
                ("info@example.eu".to_string(), vec![]),
                (
                    "invoices@example.eu".to_string(),
                    vec![EmailHit {
                        subject: "Invoice 42".to_string(),
                        from: "TRS <billing@trs.example>".to_string(),
                        date: "17 Oct 2026 09:15".to_string(),
                        link: "https://mail.google.com/mail/u/0/#all/abc".to_string(),
                    }],
                ),
            ],
        };
        assert_eq!(
            format_mail_results(&found),
            "Gmail search: \"TRS\"\n\ninvoices@example.eu\n  17 Oct 2026 09:15  TRS <billing@trs.example>\n  Invoice 42\n  https://mail.google.com/mail/u/0/#all/abc"
        );
    }

    #[test]
    fn test_company_profile_skips_missing_fields() {
        let profile = CompanyProfile {
            legal_name: "Example Foods GmbH".to_string(),
            address: Some("Hauptstr. 1, 10115 Berlin".to_string()),
            vat_id: Some("DE000000000".to_string()),
            managing_directors: vec!["A. One".to_string(), "B. Two".to_string()],
            iban: Some("DE00 1234".to_string()),
            ..Default::default()
        };
        assert_eq!(
            format_company_profile(&profile),
            "Example Foods GmbH\nHauptstr. 1, 10115 Berlin\n\nVAT: DE000000000\n\nManaging Directors: A. One, B. Two\n\nIBAN: DE00 1234"
        );
        assert_eq!(
            format_company_profile(&CompanyProfile::default()),
            "No company details are configured."
        );
    }
}
