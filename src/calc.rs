//! Revenue calculation: pure functions over the tariff table.
//!
//! No rounding happens here; figures stay exact until the renderer
//! formats them for display.

use crate::error::{QuoteError, Result};
use crate::model::{LineItem, TariffTable, Totals};

/// Derive capacity and annual rent for one category input.
/// Quantity 0 is a valid line item; negative or non-finite input is not.
pub fn compute_line_item(
    table: &TariffTable,
    category: &str,
    input_quantity: f64,
) -> Result<LineItem> {
    let config = table.lookup(category)?;

    if !input_quantity.is_finite() || input_quantity < 0.0 {
        return Err(QuoteError::InvalidInput {
            category: category.to_string(),
            quantity: input_quantity,
        });
    }

    let capacity_kw = input_quantity * config.capacity_per_unit;
    let annual_rent = capacity_kw * config.rent_per_kw;

    Ok(LineItem {
        category: category.to_string(),
        unit_label: config.unit_label.clone(),
        input_quantity,
        capacity_kw,
        annual_rent,
    })
}

/// Sum a set of line items. Monthly average is real division by 12,
/// not a pre-rounded figure.
pub fn aggregate(items: &[LineItem]) -> Totals {
    let total_capacity_kw: f64 = items.iter().map(|item| item.capacity_kw).sum();
    let total_annual_rent: f64 = items.iter().map(|item| item.annual_rent).sum();

    Totals {
        total_capacity_kw,
        total_annual_rent,
        monthly_average_rent: total_annual_rent / 12.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuoteError;
    use crate::tariff::default_table;

    #[test]
    fn parking_scenario_is_exact() {
        let table = default_table();
        let item = compute_line_item(&table, "주차장 태양광", 20.0).unwrap();
        assert_eq!(item.capacity_kw, 70.0);
        assert_eq!(item.annual_rent, 1_750_000.0);
    }

    #[test]
    fn rooftop_scenario_is_exact() {
        let table = default_table();
        let item = compute_line_item(&table, "건물 옥상 태양광", 50.0).unwrap();
        assert_eq!(item.capacity_kw, 20.0);
        assert_eq!(item.annual_rent, 440_000.0);
    }

    #[test]
    fn totals_match_reference_scenario() {
        let table = default_table();
        let items = vec![
            compute_line_item(&table, "주차장 태양광", 20.0).unwrap(),
            compute_line_item(&table, "건물 옥상 태양광", 50.0).unwrap(),
        ];
        let totals = aggregate(&items);
        assert_eq!(totals.total_capacity_kw, 90.0);
        assert_eq!(totals.total_annual_rent, 2_190_000.0);
        assert_eq!(totals.monthly_average_rent, 182_500.0);
    }

    #[test]
    fn aggregation_is_order_independent() {
        let table = default_table();
        let a = compute_line_item(&table, "주차장 태양광", 20.0).unwrap();
        let b = compute_line_item(&table, "축사/창고 태양광", 120.0).unwrap();
        let c = compute_line_item(&table, "건물 옥상 태양광", 50.0).unwrap();

        let forward = aggregate(&[a.clone(), b.clone(), c.clone()]);
        let reversed = aggregate(&[c, b, a]);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn zero_quantity_is_a_valid_line_item() {
        let table = default_table();
        let item = compute_line_item(&table, "축사/창고 태양광", 0.0).unwrap();
        assert_eq!(item.capacity_kw, 0.0);
        assert_eq!(item.annual_rent, 0.0);
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let table = default_table();
        let err = compute_line_item(&table, "주차장 태양광", -1.0).unwrap_err();
        assert!(matches!(err, QuoteError::InvalidInput { .. }));
    }

    #[test]
    fn non_finite_quantity_is_rejected() {
        let table = default_table();
        assert!(compute_line_item(&table, "주차장 태양광", f64::NAN).is_err());
        assert!(compute_line_item(&table, "주차장 태양광", f64::INFINITY).is_err());
    }

    #[test]
    fn unknown_category_is_rejected() {
        let table = default_table();
        let err = compute_line_item(&table, "지열 발전", 10.0).unwrap_err();
        assert!(matches!(err, QuoteError::CategoryNotFound(_)));
    }

    #[test]
    fn empty_aggregate_is_zero() {
        let totals = aggregate(&[]);
        assert_eq!(totals.total_capacity_kw, 0.0);
        assert_eq!(totals.total_annual_rent, 0.0);
        assert_eq!(totals.monthly_average_rent, 0.0);
    }
}
