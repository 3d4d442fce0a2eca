//! Per-entity aggregation of the sales table.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{Dimension, SalesRecord, Statistic};

/// Rows grouped under one entity key.
struct Group<'a> {
    rows: Vec<&'a SalesRecord>,
}

impl Group<'_> {
    fn units(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(|r| r.units)
    }

    fn mean_units(&self) -> f64 {
        mean(self.units())
    }

    fn positive_units(&self) -> f64 {
        self.units().filter(|u| *u > 0.0).count() as f64
    }

    fn distinct_products(&self) -> f64 {
        self.rows.iter().map(|r| r.product.as_str()).collect::<BTreeSet<_>>().len() as f64
    }

    fn distinct_customers(&self) -> f64 {
        self.rows.iter().map(|r| r.customer_id.as_str()).collect::<BTreeSet<_>>().len() as f64
    }

    fn statistic(&self, stat: Statistic) -> f64 {
        match stat {
            Statistic::AvgSales | Statistic::AvgPurchase => self.mean_units(),
            Statistic::SalesStdDev => sample_std(&self.units().collect::<Vec<_>>()),
            Statistic::Frequency | Statistic::PurchaseFrequency => self.positive_units(),
            Statistic::AvgMargin => mean(self.rows.iter().map(|r| r.margin())),
            Statistic::ProductDiversity | Statistic::ProductCount => self.distinct_products(),
            Statistic::TotalSales => self.units().sum(),
            Statistic::CustomerCount => self.distinct_customers(),
        }
    }
}

/// Entity keys (sorted) and one row of statistic values per key.
///
/// Undefined aggregates (the sample deviation of a single row) become 0.
pub fn aggregate(records: &[SalesRecord], dimension: Dimension, stats: &[Statistic]) -> Vec<(String, Vec<f64>)> {
    let mut groups: BTreeMap<&str, Group<'_>> = BTreeMap::new();
    for record in records {
        groups
            .entry(entity_key(record, dimension))
            .or_insert_with(|| Group { rows: Vec::new() })
            .rows
            .push(record);
    }

    groups
        .into_iter()
        .map(|(key, group)| {
            let values = stats
                .iter()
                .map(|&s| group.statistic(s))
                .map(|v| if v.is_finite() { v } else { 0.0 })
                .collect();
            (key.to_string(), values)
        })
        .collect()
}

pub fn entity_key(record: &SalesRecord, dimension: Dimension) -> &str {
    match dimension {
        Dimension::Product => &record.product,
        Dimension::Customer => &record.customer_id,
        Dimension::Store => &record.store,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

/// Sample standard deviation (`n - 1` denominator); NaN below two values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = values.iter().sum::<f64>() / n as f64;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (n - 1) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(product: &str, customer: &str, store: &str, units: f64) -> SalesRecord {
        SalesRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            day_of_year: Some(61),
            customer_id: customer.to_string(),
            product_id: product.to_string(),
            category: "A".to_string(),
            description: String::new(),
            product: product.to_string(),
            store: store.to_string(),
            units,
            purchase_price: 4.0,
            sale_price: 6.5,
        }
    }

    #[test]
    fn product_statistics() {
        let records = vec![
            row("p1", "c1", "s1", 2.0),
            row("p1", "c2", "s1", 4.0),
            row("p1", "c2", "s2", 0.0),
            row("p2", "c1", "s1", 5.0),
        ];
        let stats = Dimension::Product.catalog();
        let out = aggregate(&records, Dimension::Product, stats);

        assert_eq!(out.len(), 2);
        let (key, p1) = &out[0];
        assert_eq!(key, "p1");
        assert!((p1[0] - 2.0).abs() < 1e-12);
        assert!((p1[1] - 2.0).abs() < 1e-12);
        assert_eq!(p1[2], 2.0);
        assert!((p1[3] - 2.5).abs() < 1e-12);

        // single row: deviation is undefined and reported as 0
        assert_eq!(out[1].1[1], 0.0);
    }

    #[test]
    fn store_statistics_count_distinct() {
        let records = vec![
            row("p1", "c1", "s1", 2.0),
            row("p2", "c1", "s1", 3.0),
            row("p2", "c2", "s1", 1.0),
        ];
        let stats = [Statistic::TotalSales, Statistic::ProductCount, Statistic::CustomerCount];
        let out = aggregate(&records, Dimension::Store, &stats);
        assert_eq!(out, vec![("s1".to_string(), vec![6.0, 2.0, 2.0])]);
    }
}
