//! Intent parsing: the prompt handed to the language model, and an offline
//! keyword parser used when no model is configured.

use crate::domain::intent::ParsedIntent;
use crate::domain::model::CompanyProfile;
use crate::domain::ports::IntentParser;
use crate::utils::error::{BotError, Result};
use async_trait::async_trait;
use regex::Regex;

const SCHEMA: &str = r#"{
  "intent": "sales_by_period" | "sales_by_product" | "gmail_search" | "company_info" | "supplier_outstanding" | "unknown",
  "period": "today" | "yesterday" | "last_7_days" | "this_week" | "last_week" | "this_month" | "last_month" | null,
  "channel": "online" | "retail" | "total" | "compare" | null,
  "product": "<product name>" | null,
  "search_query": "<gmail search terms or supplier name>" | null
}"#;

const RULES: &str = "Channel rules:
- \"online\", \"shopify\", \"website\", \"web orders\" -> online
- \"retail\", \"in store\", \"in-store\", \"shop\", \"flour cloud\", \"pos\", \"walk-in\" -> retail
- \"total\", \"overall\", \"combined\", \"all channels\", \"all\" -> total
- \"compare\", \"vs\", \"versus\", \"online and retail\", \"retail and online\" -> compare
- If no channel mentioned -> null (defaults to online)
- Channel rules apply equally when a product is named

Period rules:
- \"last week\" -> last_week, \"this week\" -> this_week, \"past 7 days\" -> last_7_days
- \"this month\" -> this_month, \"last month\" -> last_month
- If no period mentioned -> today

Gmail rules:
- intent = gmail_search when: \"find invoice\", \"find email\", \"search email\", \"any email\", \"invoice from\", \"email about\", \"did we get an email\"
- search_query = the supplier name, topic, or keyword to search for (clean Gmail search string)
- period/channel/product = null for gmail_search

Supplier outstanding rules:
- intent = supplier_outstanding when asked about: outstanding balance, what we owe, unpaid invoices, payment due, how much do we owe [supplier]
- search_query = the supplier name exactly as mentioned
- period/channel/product = null for supplier_outstanding

Company info rules:
- intent = company_info when asked for: address, IBAN, VAT, tax number, EORI, bank details, phone, managing directors, Handelsregister, PayPal, website, company name, legal details
- For company_info, return the relevant detail(s) in search_query as a short label e.g. \"IBAN\", \"address\", \"VAT\", \"all\"

Other rules:
- If a product name is mentioned (not an email search), intent = sales_by_product
- If none of the above match, intent = unknown";

fn company_lines(profile: &CompanyProfile) -> Vec<String> {
    let fields = [
        ("Legal name", Some(profile.legal_name.as_str()).filter(|s| !s.is_empty())),
        ("Trading as", profile.trading_as.as_deref()),
        ("Address", profile.address.as_deref()),
        ("Website", profile.website.as_deref()),
        ("Email", profile.email.as_deref()),
        ("Invoices", profile.invoices_email.as_deref()),
        ("Phone", profile.phone.as_deref()),
        ("Tax Number", profile.tax_number.as_deref()),
        ("VAT", profile.vat_id.as_deref()),
        ("Handelsregister", profile.trade_register.as_deref()),
        ("EORI", profile.eori.as_deref()),
        ("IBAN", profile.iban.as_deref()),
        ("BIC", profile.bic.as_deref()),
        ("PayPal", profile.paypal.as_deref()),
    ];
    let mut lines: Vec<String> = fields
        .iter()
        .filter_map(|(name, value)| value.map(|v| format!("- {}: {}", name, v)))
        .collect();
    if !profile.managing_directors.is_empty() {
        lines.push(format!(
            "- Managing Directors: {}",
            profile.managing_directors.join(", ")
        ));
    }
    lines
}

/// System prompt for the model: business context, the JSON schema and the mapping rules.
pub fn build_system_prompt(
    profile: &CompanyProfile,
    supplier_names: &[String],
    inboxes: &[String],
) -> String {
    let business = match (&profile.trading_as, profile.legal_name.is_empty()) {
        (Some(trading), false) => format!("{}, trading as {}", profile.legal_name, trading),
        (Some(trading), true) => trading.clone(),
        (None, false) => profile.legal_name.clone(),
        (None, true) => "the business".to_string(),
    };

    let mut prompt = format!("You parse messages for {}", business);
    if let Some(description) = &profile.description {
        prompt.push_str(&format!(" ({})", description));
    }
    prompt.push_str(".\n");
    prompt.push_str(
        "It has two sales channels: Shopify (online orders) and Flour Cloud (retail/in-store POS).\n",
    );
    if !inboxes.is_empty() {
        prompt.push_str(&format!(
            "It has {} Gmail inboxes: {}.\n",
            inboxes.len(),
            inboxes.join(", ")
        ));
    }
    if !supplier_names.is_empty() {
        prompt.push_str(&format!(
            "It tracks supplier invoices and outstanding payments in a Google Sheet (suppliers include: {}).\n",
            supplier_names.join(", ")
        ));
    }

    let company = company_lines(profile);
    if !company.is_empty() {
        prompt.push_str("\nCompany details (use when asked):\n");
        prompt.push_str(&company.join("\n"));
        prompt.push('\n');
    }

    prompt.push_str("\nReturn ONLY valid JSON, no explanation, no markdown fences.\n\nSchema:\n");
    prompt.push_str(SCHEMA);
    prompt.push_str("\n\n");
    prompt.push_str(RULES);
    prompt.push('\n');
    prompt
}

const SALES_WORDS: &[&str] = &["sales", "sell", "sold", "revenue", "orders", "takings", "transactions"];

const COMPANY_TOPICS: &[&str] = &[
    "bank details",
    "managing director",
    "tax number",
    "tax nr",
    "company name",
    "legal details",
    "handelsregister",
    "address",
    "iban",
    "bic",
    "vat",
    "eori",
    "phone",
    "paypal",
    "website",
];

const SUPPLIER_PHRASES: &[&str] = &[
    "owe",
    "owed",
    "owing",
    "outstanding",
    "unpaid",
    "payment due",
    "balance",
];

/// Longest first so "invoice from" wins over "find invoice".
const MAIL_PHRASES: &[&str] = &[
    "did we get an email about",
    "did we get an email from",
    "did we get an email",
    "search emails for",
    "search email for",
    "invoice from",
    "emails about",
    "email about",
    "emails from",
    "email from",
    "find invoice",
    "find email",
    "search email",
    "any email",
];

const COMPARE_PHRASES: &[&str] = &[
    "compare",
    "vs",
    "versus",
    "online and retail",
    "retail and online",
    "both channels",
];
const TOTAL_PHRASES: &[&str] = &["total", "overall", "combined", "all channels"];
const RETAIL_PHRASES: &[&str] = &["retail", "in store", "in-store", "shop", "flour cloud", "pos", "walk-in"];
const ONLINE_PHRASES: &[&str] = &["online", "shopify", "website", "web orders"];

const PERIOD_PHRASES: &[(&str, &str)] = &[
    ("yesterday", "yesterday"),
    ("last 7 days", "last_7_days"),
    ("past 7 days", "last_7_days"),
    ("past seven days", "last_7_days"),
    ("last week", "last_week"),
    ("this week", "this_week"),
    ("last month", "last_month"),
    ("this month", "this_month"),
    ("month to date", "this_month"),
    ("today", "today"),
];

/// Words never part of a product name.
const FILLER_WORDS: &[&str] = &[
    "what", "were", "was", "are", "is", "my", "our", "the", "how", "much", "many", "did", "we",
    "i", "and", "vs", "of", "for", "in", "on", "at", "all", "total", "overall", "combined",
    "online", "retail", "shopify", "store", "in-store", "pos", "shop", "website", "web", "today",
    "yesterday", "this", "last", "past", "week", "month", "days", "7", "compare", "show", "me",
    "tell", "give", "daily", "channels", "both", "flour", "cloud", "walk-in", "so", "far",
];

/// Lower-cased words, padded so phrases match on word boundaries.
fn normalize(message: &str) -> String {
    let words: Vec<String> = message
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    format!(" {} ", words.join(" "))
}

fn has_phrase(normalized: &str, phrase: &str) -> bool {
    normalized.contains(&format!(" {} ", phrase))
}

fn first_phrase<'a>(normalized: &str, phrases: &[&'a str]) -> Option<&'a str> {
    phrases.iter().copied().find(|p| has_phrase(normalized, p))
}

fn strip_fillers(candidate: &str) -> Option<String> {
    let kept: Vec<&str> = candidate
        .split_whitespace()
        .filter(|w| !FILLER_WORDS.contains(w))
        .collect();
    if kept.is_empty() {
        None
    } else {
        Some(kept.join(" "))
    }
}

/// Rule-based parser producing the same JSON shape as the model.
pub struct KeywordIntentParser {
    supplier_names: Vec<String>,
    product_patterns: Vec<Regex>,
    supplier_pattern: Regex,
}

impl KeywordIntentParser {
    pub fn new(supplier_names: Vec<String>) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| BotError::ConfigError {
                message: format!("keyword pattern {}: {}", pattern, e),
            })
        };

        let mut supplier_names = supplier_names;
        supplier_names.sort_by_key(|name| std::cmp::Reverse(name.len()));

        Ok(Self {
            supplier_names,
            product_patterns: vec![
                compile(r"how (?:much|many)(?: of)? (.+?) (?:did|have|has|do) (?:i|we|you) (?:sell|sold)")?,
                compile(r"(?:sales|sold|revenue) (?:of|for) (.+?)(?: (?:today|yesterday|this|last|past|online|retail|in store|on|in|at)\b|$)")?,
                compile(r"^(.+?) (?:sales|sold|revenue)\b")?,
            ],
            supplier_pattern: compile(
                r"\b(?:owe|owed to|owing|outstanding (?:to|for|with)|unpaid invoices? (?:for|from|to)|balance (?:for|with)|due (?:to|for))\s+(.+)",
            )?,
        })
    }

    fn known_supplier(&self, normalized: &str) -> Option<String> {
        self.supplier_names
            .iter()
            .find(|name| has_phrase(normalized, &normalize(name).trim().to_string()))
            .cloned()
    }

    fn supplier_query(&self, normalized: &str) -> Option<String> {
        self.known_supplier(normalized).or_else(|| {
            self.supplier_pattern
                .captures(normalized.trim())
                .and_then(|caps| caps.get(1))
                .and_then(|m| strip_fillers(m.as_str()))
        })
    }

    fn mail_query(&self, normalized: &str, trigger: &str) -> Option<String> {
        let marker = format!(" {} ", trigger);
        let start = normalized.find(&marker)? + marker.len();
        let mut rest = normalized[start..].trim();
        for prefix in ["from ", "about ", "for ", "the "] {
            rest = rest.strip_prefix(prefix).unwrap_or(rest);
        }
        let rest = rest.trim();

        let query = if rest.is_empty() {
            self.known_supplier(normalized)?
        } else {
            rest.to_string()
        };
        Some(if trigger.contains("invoice") {
            format!("invoice {}", query)
        } else {
            query
        })
    }

    fn product(&self, normalized: &str) -> Option<String> {
        let text = normalized.trim();
        self.product_patterns
            .iter()
            .filter_map(|re| re.captures(text).and_then(|caps| caps.get(1)))
            .find_map(|m| strip_fillers(m.as_str()))
    }

    fn channel(normalized: &str) -> Option<&'static str> {
        if first_phrase(normalized, COMPARE_PHRASES).is_some() {
            Some("compare")
        } else if first_phrase(normalized, TOTAL_PHRASES).is_some() {
            Some("total")
        } else if first_phrase(normalized, RETAIL_PHRASES).is_some() {
            Some("retail")
        } else if first_phrase(normalized, ONLINE_PHRASES).is_some() {
            Some("online")
        } else {
            None
        }
    }

    fn period(normalized: &str) -> Option<&'static str> {
        PERIOD_PHRASES
            .iter()
            .find(|(phrase, _)| has_phrase(normalized, phrase))
            .map(|(_, key)| *key)
    }

    pub fn classify(&self, message: &str) -> ParsedIntent {
        let text = normalize(message);
        let mentions_sales = first_phrase(&text, SALES_WORDS).is_some();
        let mentions_email = has_phrase(&text, "email") || has_phrase(&text, "emails");

        let mail_trigger = first_phrase(&text, MAIL_PHRASES);
        let supplier_trigger = first_phrase(&text, SUPPLIER_PHRASES);

        if let Some(trigger) = mail_trigger.filter(|_| mentions_email || supplier_trigger.is_none()) {
            return ParsedIntent {
                intent: Some("gmail_search".to_string()),
                search_query: self.mail_query(&text, trigger),
                ..ParsedIntent::default()
            };
        }

        if supplier_trigger.is_some() {
            return ParsedIntent {
                intent: Some("supplier_outstanding".to_string()),
                search_query: self.supplier_query(&text),
                ..ParsedIntent::default()
            };
        }

        if !mentions_sales {
            if let Some(topic) = first_phrase(&text, COMPANY_TOPICS) {
                return ParsedIntent {
                    intent: Some("company_info".to_string()),
                    search_query: Some(topic.to_string()),
                    ..ParsedIntent::default()
                };
            }
        }

        let period = Self::period(&text);
        let channel = Self::channel(&text);
        if !mentions_sales && period.is_none() && channel.is_none() {
            return ParsedIntent {
                intent: Some("unknown".to_string()),
                ..ParsedIntent::default()
            };
        }

        let product = if mentions_sales { self.product(&text) } else { None };
        ParsedIntent {
            intent: Some(
                if product.is_some() {
                    "sales_by_product"
                } else {
                    "sales_by_period"
                }
                .to_string(),
            ),
            period: period.map(str::to_string),
            channel: channel.map(str::to_string),
            product,
            search_query: None,
        }
    }
}

#[async_trait]
impl IntentParser for KeywordIntentParser {
    async fn parse(&self, message: &str) -> Result<ParsedIntent> {
        Ok(self.classify(message))
    }

    fn name(&self) -> &'static str {
        "keywords"
    }
}
