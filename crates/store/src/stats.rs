//! Admin statistics queries.

use common::Money;
use sqlx::{PgConnection, Row};

use crate::Result;

/// Grouping period for revenue statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsPeriod {
    Day,
    Week,
    Month,
    Year,
}

impl StatsPeriod {
    /// Parses a period from its query-string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "day" => Some(StatsPeriod::Day),
            "week" => Some(StatsPeriod::Week),
            "month" => Some(StatsPeriod::Month),
            "year" => Some(StatsPeriod::Year),
            _ => None,
        }
    }

    /// Returns the `to_char` pattern bucketing order dates for this period.
    fn date_pattern(&self) -> &'static str {
        match self {
            StatsPeriod::Day => "YYYY-MM-DD",
            StatsPeriod::Week => "IYYY-IW",
            StatsPeriod::Month => "YYYY-MM",
            StatsPeriod::Year => "YYYY",
        }
    }
}

/// One revenue bucket.
#[derive(Debug, Clone)]
pub struct RevenueBucket {
    pub time_period: String,
    pub revenue: Money,
    pub order_count: i64,
}

/// Revenue and order counts grouped by period, most recent 30 buckets,
/// cancelled orders excluded.
pub async fn revenue_by_period(
    conn: &mut PgConnection,
    period: StatsPeriod,
) -> Result<Vec<RevenueBucket>> {
    let rows = sqlx::query(
        r#"
        SELECT to_char(order_date, $1) AS time_period,
               COALESCE(SUM(total_amount_cents), 0)::BIGINT AS revenue_cents,
               COUNT(id) AS order_count
        FROM orders
        WHERE status != 'cancelled'
        GROUP BY time_period
        ORDER BY time_period DESC
        LIMIT 30
        "#,
    )
    .bind(period.date_pattern())
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(RevenueBucket {
                time_period: row.try_get("time_period")?,
                revenue: Money::from_cents(row.try_get("revenue_cents")?),
                order_count: row.try_get("order_count")?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_parse() {
        assert_eq!(StatsPeriod::parse("day"), Some(StatsPeriod::Day));
        assert_eq!(StatsPeriod::parse("week"), Some(StatsPeriod::Week));
        assert_eq!(StatsPeriod::parse("month"), Some(StatsPeriod::Month));
        assert_eq!(StatsPeriod::parse("year"), Some(StatsPeriod::Year));
        assert_eq!(StatsPeriod::parse("quarter"), None);
    }
}
