//! Quotation rendering: a `tera` template producing Typst markup, serialized
//! to UTF-8 bytes. The renderer does no I/O; writing the file and compiling
//! it to PDF is the caller's job.

use chrono::{DateTime, FixedOffset, Utc};
use slug::slugify;
use tera::{Context, Tera};
use tracing::debug;

use crate::calc;
use crate::error::{QuoteError, Result};
use crate::model::{ItemRow, QuotationContext, QuotationDocument, QuotationRequest};

// Embed the default template at compile time to ensure availability
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/quotation.tera");

const TEMPLATE_NAME: &str = "quotation.tera";
const PRODUCT_PREFIX: &str = "Solar_Proposal";

/// UTC+9, the civil zone quotations are stamped in regardless of host zone.
pub fn kst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).expect("UTC+9 is a valid offset")
}

pub fn kst_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&kst())
}

pub struct QuotationRenderer {
    tera: Tera,
}

impl QuotationRenderer {
    /// Build a renderer from template source (the user-editable copy under
    /// the data root, usually).
    pub fn from_template(src: &str) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, src)?;
        Ok(Self { tera })
    }

    /// Renderer over the built-in template.
    pub fn embedded() -> Self {
        Self::from_template(DEFAULT_TEMPLATE).expect("embedded template parses")
    }

    /// Produce the quotation document. `logo` is the image path to reference
    /// from the document, if the caller found one; absence only degrades the
    /// layout, it is never an error.
    pub fn render(
        &self,
        request: &QuotationRequest,
        logo: Option<&str>,
    ) -> Result<QuotationDocument> {
        let recipient = request.recipient_name.trim();
        if recipient.is_empty() {
            return Err(QuoteError::MissingRecipient);
        }
        if logo.is_none() {
            debug!("no company mark available, rendering without one");
        }

        let totals = calc::aggregate(&request.line_items);

        let items: Vec<ItemRow> = request
            .line_items
            .iter()
            .map(|item| ItemRow {
                category: item.category.clone(),
                scale: format!("{} {}", format_quantity(item.input_quantity), item.unit_label),
                capacity: format_capacity(item.capacity_kw),
                annual_rent: format!("{} 원", format_krw(item.annual_rent)),
            })
            .collect();

        let context_data = QuotationContext {
            recipient: recipient.to_string(),
            sender: request.sender.clone(),
            generated_at: request.generated_at.format("%Y-%m-%d %H:%M").to_string(),
            items,
            total_capacity: format_capacity(totals.total_capacity_kw),
            total_annual_rent: format!("{} 원", format_krw(totals.total_annual_rent)),
            monthly_average_rent: format!("{} 원", format_krw(totals.monthly_average_rent)),
            logo: logo.map(str::to_string),
        };

        let context = Context::from_serialize(&context_data)?;
        let rendered = self.tera.render(TEMPLATE_NAME, &context)?;

        Ok(QuotationDocument {
            bytes: rendered.into_bytes(),
            file_stem: format!("{}_{}", PRODUCT_PREFIX, sanitize_recipient(recipient)),
        })
    }
}

/// Currency display: standard rounding to whole KRW, thousands-grouped.
pub fn format_krw(amount: f64) -> String {
    group_thousands(amount.round() as i64)
}

/// Capacity display: one decimal place.
pub fn format_capacity(kw: f64) -> String {
    format!("{kw:.1} kW")
}

/// Quantities are usually whole counts; drop the trailing `.0` when so.
pub fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{}", quantity as i64)
    } else {
        format!("{quantity}")
    }
}

fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 { format!("-{out}") } else { out }
}

/// Recipient names go straight into the suggested file name, so strip
/// anything a filesystem could choke on.
pub fn sanitize_recipient(name: &str) -> String {
    let slug = slugify(name);
    if slug.is_empty() { "customer".to_string() } else { slug }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn krw_is_rounded_then_grouped() {
        assert_eq!(format_krw(1_750_000.0), "1,750,000");
        assert_eq!(format_krw(2_190_000.0), "2,190,000");
        assert_eq!(format_krw(182_500.0), "182,500");
        assert_eq!(format_krw(1_234.4), "1,234");
        assert_eq!(format_krw(1_234.5), "1,235");
        assert_eq!(format_krw(0.0), "0");
        assert_eq!(format_krw(999.0), "999");
    }

    #[test]
    fn capacity_keeps_one_decimal() {
        assert_eq!(format_capacity(70.0), "70.0 kW");
        assert_eq!(format_capacity(90.25), "90.2 kW");
    }

    #[test]
    fn whole_quantities_drop_the_decimal() {
        assert_eq!(format_quantity(20.0), "20");
        assert_eq!(format_quantity(12.5), "12.5");
    }

    #[test]
    fn recipient_slug_is_filesystem_safe() {
        let slug = sanitize_recipient("(주)대한산업 / 본사");
        assert!(!slug.is_empty());
        assert!(slug.is_ascii());
        assert!(!slug.contains('/'));
        assert!(!slug.contains(' '));
    }

    #[test]
    fn unsanitizable_recipient_falls_back() {
        assert_eq!(sanitize_recipient("///"), "customer");
    }

    #[test]
    fn quotation_timezone_is_utc_plus_nine() {
        assert_eq!(kst().local_minus_utc(), 9 * 3600);
        assert_eq!(kst_now().offset().local_minus_utc(), 9 * 3600);
    }
}
