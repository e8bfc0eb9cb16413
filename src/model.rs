use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Per-category business terms. Fixed at startup, never mutated.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CategoryConfig {
    pub unit_label: String,     // 산정 단위, e.g. 면수(대) / 면적(평)
    pub capacity_per_unit: f64, // kW per input unit
    pub rent_per_kw: f64,       // KRW per kW per year
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CategoryEntry {
    pub name: String,
    #[serde(flatten)]
    pub config: CategoryConfig,
}

/// Ordered tariff table; display order is file order.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TariffTable {
    #[serde(rename = "category")]
    pub categories: Vec<CategoryEntry>,
}

/// One selected category with its derived figures.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LineItem {
    pub category: String,
    pub unit_label: String,
    pub input_quantity: f64,
    pub capacity_kw: f64,
    pub annual_rent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Totals {
    pub total_capacity_kw: f64,
    pub total_annual_rent: f64,
    pub monthly_average_rent: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SenderConfig {
    pub name: String,
    pub contact: String,
    pub email: String,
}

/// Everything the renderer needs for one quotation.
#[derive(Debug, Clone)]
pub struct QuotationRequest {
    pub recipient_name: String,
    pub sender: SenderConfig,
    pub generated_at: DateTime<FixedOffset>,
    pub line_items: Vec<LineItem>,
}

/// Rendered quotation: document bytes plus the suggested file stem
/// (extension is up to the caller). Consumed once by the download step.
#[derive(Debug, Clone)]
pub struct QuotationDocument {
    pub bytes: Vec<u8>,
    pub file_stem: String,
}

#[derive(Serialize)]
pub struct ItemRow {
    pub category: String,
    pub scale: String,
    pub capacity: String,
    pub annual_rent: String,
}

#[derive(Serialize)]
pub struct QuotationContext {
    pub recipient: String,
    pub sender: SenderConfig,
    pub generated_at: String,
    pub items: Vec<ItemRow>,
    pub total_capacity: String,
    pub total_annual_rent: String,
    pub monthly_average_rent: String,
    pub logo: Option<String>,
}
