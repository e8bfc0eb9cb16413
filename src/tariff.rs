use crate::error::{QuoteError, Result};
use crate::model::{CategoryConfig, TariffTable};

// Embed the default table so a fresh install works before any config exists
pub const DEFAULT_TARIFF: &str = include_str!("../tariff.toml");

impl TariffTable {
    /// Parse and validate a tariff table from TOML source.
    pub fn from_toml(src: &str) -> Result<Self> {
        let table: TariffTable =
            toml::from_str(src).map_err(|e| QuoteError::Config(format!("tariff table: {e}")))?;
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(QuoteError::Config("tariff table has no categories".into()));
        }
        for entry in &self.categories {
            // `!(x > 0.0)` also rejects NaN
            if !(entry.config.capacity_per_unit > 0.0) || !(entry.config.rent_per_kw > 0.0) {
                return Err(QuoteError::Config(format!(
                    "category '{}' must have strictly positive coefficients",
                    entry.name
                )));
            }
        }
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&CategoryConfig> {
        self.categories
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.config)
            .ok_or_else(|| QuoteError::CategoryNotFound(name.to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        self.categories.iter().map(|entry| entry.name.clone()).collect()
    }
}

pub fn default_table() -> TariffTable {
    TariffTable::from_toml(DEFAULT_TARIFF).expect("built-in tariff table is valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuoteError;

    #[test]
    fn default_table_parses_and_keeps_file_order() {
        let table = default_table();
        let names = table.names();
        assert_eq!(
            names,
            vec!["주차장 태양광", "축사/창고 태양광", "건물 옥상 태양광"]
        );
    }

    #[test]
    fn lookup_finds_configured_category() {
        let table = default_table();
        let config = table.lookup("주차장 태양광").unwrap();
        assert_eq!(config.unit_label, "면수(대)");
        assert_eq!(config.capacity_per_unit, 3.5);
        assert_eq!(config.rent_per_kw, 25000.0);
    }

    #[test]
    fn lookup_rejects_unknown_category() {
        let table = default_table();
        let err = table.lookup("풍력 발전").unwrap_err();
        assert!(matches!(err, QuoteError::CategoryNotFound(name) if name == "풍력 발전"));
    }

    #[test]
    fn zero_coefficient_is_rejected_on_load() {
        let src = r#"
            [[category]]
            name = "주차장 태양광"
            unit_label = "면수(대)"
            capacity_per_unit = 0.0
            rent_per_kw = 25000.0
        "#;
        let err = TariffTable::from_toml(src).unwrap_err();
        assert!(matches!(err, QuoteError::Config(_)));
    }

    #[test]
    fn empty_table_is_rejected() {
        let err = TariffTable::from_toml("category = []").unwrap_err();
        assert!(matches!(err, QuoteError::Config(_)));
    }
}
