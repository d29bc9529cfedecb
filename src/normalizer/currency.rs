// src/normalizer/currency.rs
//! Rewrites rupee and dollar amounts in free text into "₹X Crore" form.
//!
//! The rewrite is a fixed, ordered list of passes. Each pass is a pattern plus
//! the unit its number is expressed in; every match is checked against the
//! text around it so that a phrase the normalizer produced earlier (in this
//! run or a previous one) is never converted again.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const CRORE: f64 = 1e7;
const MILLION: f64 = 1e6;
const BILLION: f64 = 1e9;

// Optional currency marker in front of a rupee amount, absorbed so it is not doubled.
const RUPEE_PREFIX: &str = r"(?:(?:₹|\bRs\.?|\bINR)\s*)?";
const NUMBER: &str = r"(\d[\d,]*(?:\.\d+)?)";

// "(₹0 Crore $0M)" parentheticals left behind by upstream feeds. Text must follow
// "Crore" inside the parentheses; a bare "(₹0 Crore)" is our own output.
static STRAY_ZERO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\((?:₹|Rs|INR)\s*0\s*Crore\s+[^()\s][^()]*\)")
        .expect("Failed to compile STRAY_ZERO_RE")
});

static CANONICAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*₹\d+(?:\.\d+)?\s*Crore\s*\(\$\d+(?:\.\d+)?\s*(?:Million|M)\)\s*$")
        .expect("Failed to compile CANONICAL_RE")
});

// Text ending inside the parenthetical of an already converted amount.
static OPEN_CANONICAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)₹\s*\d[\d,]*(?:\.\d+)?\s*Crore\s*\(\s*$")
        .expect("Failed to compile OPEN_CANONICAL_RE")
});

static SCALED_RUPEE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Million|Billion)\s*Rupees?").expect("Failed to compile SCALED_RUPEE_RE")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    BillionRupees,
    MillionRupees,
    Rupees,
    MillionDollars,
}

impl Unit {
    fn to_rupees(self, value: f64, usd_inr_rate: f64) -> f64 {
        match self {
            Unit::BillionRupees => value * BILLION,
            Unit::MillionRupees => value * MILLION,
            Unit::Rupees => value,
            Unit::MillionDollars => value * MILLION * usd_inr_rate,
        }
    }
}

/// One amount found during a pass. Lives only while that pass runs.
#[derive(Debug, Clone, PartialEq)]
pub struct MonetaryMention<'t> {
    pub original_span: &'t str,
    /// The number as written, e.g. "1,250.5".
    pub number_text: &'t str,
    pub numeric_value: f64,
    pub unit: Unit,
    pub crore_value: f64,
    /// USD equivalent in millions, for rupee-denominated amounts.
    pub usd_equivalent: Option<f64>,
}

impl<'t> MonetaryMention<'t> {
    pub fn parse(original_span: &'t str, number_text: &'t str, unit: Unit, usd_inr_rate: f64) -> Option<Self> {
        let numeric_value: f64 = number_text.replace(',', "").parse().ok()?;
        let rupees = unit.to_rupees(numeric_value, usd_inr_rate);
        let usd_equivalent = match unit {
            Unit::MillionDollars => None,
            _ => Some(rupees / usd_inr_rate / MILLION),
        };
        Some(Self {
            original_span,
            number_text,
            numeric_value,
            unit,
            crore_value: rupees / CRORE,
            usd_equivalent,
        })
    }

    pub fn render(&self) -> String {
        if self.crore_value == 0.0 {
            return "₹0 Crore".to_string();
        }
        let crores = format_crore(self.crore_value);
        match (self.unit, self.usd_equivalent) {
            (Unit::MillionDollars, _) => format!("₹{} Crore (${} Million)", crores, self.number_text),
            (_, Some(usd)) if usd >= 1.0 => format!("₹{} Crore (${:.2}M)", crores, usd),
            _ => format!("₹{} Crore", crores),
        }
    }
}

/// Integer when exact, otherwise two decimals with trailing zeros and point trimmed.
pub fn format_crore(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

/// The text on either side of a match, taken from the pass's input.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'t> {
    pub before: &'t str,
    pub after: &'t str,
}

/// True when the match sits inside an already converted phrase or is directly
/// followed by a unit word (e.g. "5 Million Rupees Crore").
pub fn is_already_normalized(ctx: &MatchContext<'_>) -> bool {
    if OPEN_CANONICAL_RE.is_match(ctx.before) {
        return true;
    }
    let next = ctx.after.trim_start().to_lowercase();
    next.starts_with("crore") || next.starts_with("million")
}

fn always(_: &str) -> bool {
    true
}

fn no_scaled_rupees(text: &str) -> bool {
    !SCALED_RUPEE_RE.is_match(text)
}

struct RewritePass {
    name: &'static str,
    pattern: Regex,
    unit: Unit,
    /// Checked against the whole input before the pass runs.
    applies_to: fn(&str) -> bool,
}

impl RewritePass {
    fn new(name: &'static str, pattern: &str, unit: Unit, applies_to: fn(&str) -> bool) -> Self {
        let pattern = Regex::new(&format!("(?i){}", pattern))
            .unwrap_or_else(|e| panic!("Failed to compile rewrite pass {}: {}", name, e));
        Self {
            name,
            pattern,
            unit,
            applies_to,
        }
    }
}

// Order matters: scaled rupee amounts go before plain ones, dollars after rupees.
static PASSES: Lazy<Vec<RewritePass>> = Lazy::new(|| {
    vec![
        RewritePass::new(
            "billion-rupees",
            &format!(r"{}{}\s*Billion\s+Rupees?\b", RUPEE_PREFIX, NUMBER),
            Unit::BillionRupees,
            always,
        ),
        RewritePass::new(
            "million-rupees",
            &format!(r"{}{}\s*Million\s+Rupees?\b", RUPEE_PREFIX, NUMBER),
            Unit::MillionRupees,
            always,
        ),
        RewritePass::new(
            "plain-rupees",
            &format!(r"{}{}\s*Rupees?\b", RUPEE_PREFIX, NUMBER),
            Unit::Rupees,
            no_scaled_rupees,
        ),
        RewritePass::new(
            "dollar-millions",
            &format!(r"\$\s*{}\s*(?:Million|M)\b", NUMBER),
            Unit::MillionDollars,
            always,
        ),
        RewritePass::new(
            "million-dollars",
            &format!(r"{}\s*Million\s+Dollars?\b", NUMBER),
            Unit::MillionDollars,
            always,
        ),
        RewritePass::new(
            "bln-rupees",
            &format!(r"{}{}\s*(?:Bln|B)\s+Rupees?\b", RUPEE_PREFIX, NUMBER),
            Unit::BillionRupees,
            always,
        ),
        RewritePass::new(
            "mln-rupees",
            &format!(r"{}{}\s*(?:Mln|M)\s+Rupees?\b", RUPEE_PREFIX, NUMBER),
            Unit::MillionRupees,
            always,
        ),
    ]
});

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrencyNormalizer {
    usd_inr_rate: f64,
}

impl CurrencyNormalizer {
    pub fn new(usd_inr_rate: f64) -> Self {
        Self { usd_inr_rate }
    }

    pub fn usd_inr_rate(&self) -> f64 {
        self.usd_inr_rate
    }

    pub fn normalize(&self, text: &str) -> String {
        let cleaned = STRAY_ZERO_RE.replace_all(text, "").into_owned();
        if CANONICAL_RE.is_match(&cleaned) {
            return cleaned;
        }
        PASSES
            .iter()
            .fold(cleaned, |current, pass| self.apply_pass(&current, pass))
    }

    fn apply_pass(&self, text: &str, pass: &RewritePass) -> String {
        if !(pass.applies_to)(text) {
            return text.to_string();
        }
        pass.pattern
            .replace_all(text, |caps: &Captures<'_>| {
                let Some(whole) = caps.get(0) else {
                    return String::new();
                };
                let ctx = MatchContext {
                    before: &text[..whole.start()],
                    after: &text[whole.end()..],
                };
                if is_already_normalized(&ctx) {
                    return whole.as_str().to_string();
                }
                let Some(number) = caps.get(1) else {
                    return whole.as_str().to_string();
                };
                match MonetaryMention::parse(whole.as_str(), number.as_str(), pass.unit, self.usd_inr_rate) {
                    Some(mention) => {
                        let rendered = mention.render();
                        tracing::trace!(
                            "{}: '{}' ({} {:?}) -> '{}'",
                            pass.name,
                            mention.original_span,
                            mention.numeric_value,
                            mention.unit,
                            rendered
                        );
                        rendered
                    }
                    None => whole.as_str().to_string(),
                }
            })
            .into_owned()
    }
}
