//! Grouping of sales records into totals and average unit prices.
//!
//! Aggregation runs in memory over the rows matched by a compiled filter.
//! Records with a zero quantity never participate: they are filtered out
//! before any arithmetic, so a division by a zero quantity is never
//! attempted.

use std::collections::HashMap;

use rust_decimal::Decimal;
use time::Date;

use crate::sales_record::SalesRecord;

/// The label under which sales of deleted products are grouped.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// The dimension used to bucket sales records for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateBy {
    /// Group by the calendar month of the sale (UTC).
    Month,
    /// Group by the live product category, with [UNKNOWN_LABEL] standing
    /// in for sales whose product has been deleted.
    Category,
}

impl AggregateBy {
    /// Parse the wire value of the grouping selector.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "month" => Some(Self::Month),
            "category" => Some(Self::Category),
            _ => None,
        }
    }
}

/// The key identifying one aggregation group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    /// The first day of the month the group covers.
    Month(Date),
    /// The category label the group covers. May be empty: an empty
    /// category is its own group, distinct from [UNKNOWN_LABEL].
    Category(String),
}

impl GroupKey {
    /// The wire rendering of the key: `YYYY-MM` for months, the raw label
    /// for categories.
    pub fn label(&self) -> String {
        match self {
            GroupKey::Month(month) => {
                format!("{:04}-{:02}", month.year(), u8::from(month.month()))
            }
            GroupKey::Category(label) => label.clone(),
        }
    }
}

/// The derived totals for one group of sales records.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationGroup {
    /// The grouping key.
    pub group: GroupKey,
    /// The sum of the member amounts.
    pub total_sales: Decimal,
    /// The mean of the per-member unit prices (amount divided by
    /// quantity), not total divided by total quantity.
    pub average_price: Decimal,
}

/// Group `records` by `aggregate_by` and compute each group's total sales
/// amount and average unit price.
///
/// Records with `quantity_sold` of zero (or below) are excluded. Groups
/// are returned ordered by key ascending: chronologically for months,
/// lexicographically for category labels.
pub fn aggregate(records: &[SalesRecord], aggregate_by: AggregateBy) -> Vec<AggregationGroup> {
    struct Accumulator {
        total: Decimal,
        unit_price_sum: Decimal,
        members: i64,
    }

    let mut accumulators: HashMap<GroupKey, Accumulator> = HashMap::new();

    for record in records.iter().filter(|record| record.quantity_sold > 0) {
        let unit_price = record.total_sales_amount / Decimal::from(record.quantity_sold);
        let accumulator = accumulators
            .entry(group_key(record, aggregate_by))
            .or_insert(Accumulator {
                total: Decimal::ZERO,
                unit_price_sum: Decimal::ZERO,
                members: 0,
            });

        accumulator.total += record.total_sales_amount;
        accumulator.unit_price_sum += unit_price;
        accumulator.members += 1;
    }

    let mut groups: Vec<AggregationGroup> = accumulators
        .into_iter()
        .map(|(group, accumulator)| AggregationGroup {
            group,
            total_sales: accumulator.total,
            average_price: accumulator.unit_price_sum / Decimal::from(accumulator.members),
        })
        .collect();

    groups.sort_by(|a, b| a.group.cmp(&b.group));

    groups
}

fn group_key(record: &SalesRecord, aggregate_by: AggregateBy) -> GroupKey {
    match aggregate_by {
        AggregateBy::Month => GroupKey::Month(record.date_of_sale.date().replace_day(1).unwrap()),
        AggregateBy::Category => GroupKey::Category(
            record
                .product
                .as_ref()
                .map(|product| product.category.clone())
                .unwrap_or_else(|| UNKNOWN_LABEL.to_owned()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use time::{OffsetDateTime, macros::datetime};
    use uuid::Uuid;

    use super::{AggregateBy, GroupKey, UNKNOWN_LABEL, aggregate};
    use crate::{product::Product, sales_record::SalesRecord};

    fn decimal(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn test_product(category: &str) -> Product {
        Product {
            id: 1,
            uuid: Uuid::new_v4(),
            name: "Test Product".to_owned(),
            category: category.to_owned(),
            price: decimal("100.00"),
        }
    }

    fn test_record(
        product: Option<Product>,
        quantity_sold: i64,
        amount: &str,
        date_of_sale: OffsetDateTime,
    ) -> SalesRecord {
        SalesRecord {
            id: 0,
            uuid: Uuid::new_v4(),
            product,
            snapshot: None,
            quantity_sold,
            total_sales_amount: decimal(amount),
            date_of_sale,
        }
    }

    #[test]
    fn category_group_averages_unit_prices() {
        let records = vec![
            test_record(
                Some(test_product("Electronics")),
                5,
                "250.00",
                datetime!(2024 - 09 - 01 12:00:00 UTC),
            ),
            test_record(
                Some(test_product("Electronics")),
                15,
                "750.00",
                datetime!(2024 - 09 - 02 12:00:00 UTC),
            ),
        ];

        let got = aggregate(&records, AggregateBy::Category);

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].group, GroupKey::Category("Electronics".to_owned()));
        assert_eq!(got[0].total_sales, decimal("1000.00"));
        assert_eq!(got[0].average_price, decimal("50.00"));
    }

    #[test]
    fn month_groups_are_chronological() {
        let records = vec![
            test_record(None, 1, "30.00", datetime!(2024 - 03 - 15 00:00:00 UTC)),
            test_record(None, 1, "10.00", datetime!(2024 - 01 - 20 00:00:00 UTC)),
            test_record(None, 1, "20.00", datetime!(2024 - 02 - 10 00:00:00 UTC)),
            test_record(None, 1, "5.00", datetime!(2024 - 01 - 31 23:59:59 UTC)),
        ];

        let got = aggregate(&records, AggregateBy::Month);

        let labels: Vec<String> = got.iter().map(|group| group.group.label()).collect();
        assert_eq!(labels, vec!["2024-01", "2024-02", "2024-03"]);
        assert_eq!(got[0].total_sales, decimal("15.00"));
    }

    #[test]
    fn category_groups_are_lexicographic() {
        let now = datetime!(2024 - 09 - 01 00:00:00 UTC);
        let records = vec![
            test_record(Some(test_product("Zebra")), 1, "1.00", now),
            test_record(Some(test_product("Alpha")), 1, "1.00", now),
            test_record(None, 1, "1.00", now),
        ];

        let got = aggregate(&records, AggregateBy::Category);

        let labels: Vec<String> = got.iter().map(|group| group.group.label()).collect();
        assert_eq!(labels, vec!["Alpha", UNKNOWN_LABEL, "Zebra"]);
    }

    #[test]
    fn zero_quantity_records_are_excluded() {
        let now = datetime!(2024 - 09 - 01 00:00:00 UTC);
        let records = vec![
            test_record(Some(test_product("Electronics")), 0, "999.00", now),
            test_record(Some(test_product("Electronics")), 5, "250.00", now),
        ];

        let got = aggregate(&records, AggregateBy::Category);

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].total_sales, decimal("250.00"));
        assert_eq!(got[0].average_price, decimal("50.00"));
    }

    #[test]
    fn only_zero_quantity_records_yields_no_groups() {
        let now = datetime!(2024 - 09 - 01 00:00:00 UTC);
        let records = vec![test_record(None, 0, "100.00", now)];

        let got = aggregate(&records, AggregateBy::Month);

        assert!(got.is_empty());
    }

    #[test]
    fn missing_product_groups_under_unknown_and_empty_category_stays_distinct() {
        let now = datetime!(2024 - 09 - 01 00:00:00 UTC);
        let records = vec![
            test_record(None, 2, "20.00", now),
            test_record(Some(test_product("")), 4, "40.00", now),
        ];

        let got = aggregate(&records, AggregateBy::Category);

        assert_eq!(got.len(), 2);
        assert_eq!(got[0].group, GroupKey::Category("".to_owned()));
        assert_eq!(got[1].group, GroupKey::Category(UNKNOWN_LABEL.to_owned()));
    }

    #[test]
    fn group_totals_sum_to_the_eligible_total() {
        let now = datetime!(2024 - 09 - 01 00:00:00 UTC);
        let records = vec![
            test_record(Some(test_product("A")), 1, "10.50", now),
            test_record(Some(test_product("B")), 3, "99.00", now),
            test_record(None, 7, "70.00", now),
            test_record(Some(test_product("A")), 0, "123.00", now),
        ];

        let eligible_total: Decimal = records
            .iter()
            .filter(|record| record.quantity_sold > 0)
            .map(|record| record.total_sales_amount)
            .sum();

        let got = aggregate(&records, AggregateBy::Category);
        let grouped_total: Decimal = got.iter().map(|group| group.total_sales).sum();

        assert_eq!(grouped_total, eligible_total);
        assert_eq!(grouped_total, decimal("179.50"));
    }
}
