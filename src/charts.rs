// =============================================================================
// Chart data — series handed to the presentation layer
// =============================================================================
//
// The dashboard renders three preview charts for a loaded dataset: a line
// chart of one price field, a candlestick chart and a volume bar chart. This
// module only selects and aligns the data; styling is the renderer's job.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::table::{PriceTable, RowKey};
use crate::types::PriceField;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Candlestick,
    Volume,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    #[error("{0} column not found in data")]
    MissingColumn(String),
}

/// Data for one chart, aligned with `index`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub title: String,
    pub kind: ChartKind,
    pub index: Vec<RowKey>,
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl ChartSeries {
    fn from_prices(name: &str, values: &[f64]) -> Self {
        Self {
            name: name.to_string(),
            values: values.iter().copied().map(Some).collect(),
        }
    }
}

pub fn line_chart(table: &PriceTable, label: &str, field: PriceField) -> ChartData {
    ChartData {
        title: format!("{label} - {field} Price Over Time"),
        kind: ChartKind::Line,
        index: table.index.clone(),
        series: vec![ChartSeries::from_prices(field.as_str(), table.field(field))],
    }
}

pub fn candlestick_chart(table: &PriceTable, label: &str) -> ChartData {
    let series = [
        PriceField::Open,
        PriceField::High,
        PriceField::Low,
        PriceField::Close,
    ]
    .iter()
    .map(|&f| ChartSeries::from_prices(f.as_str(), table.field(f)))
    .collect();

    ChartData {
        title: format!("{label} - Candlestick Chart"),
        kind: ChartKind::Candlestick,
        index: table.index.clone(),
        series,
    }
}

pub fn volume_chart(table: &PriceTable, label: &str) -> Result<ChartData, ChartError> {
    let volume = table
        .extra_column("Volume")
        .ok_or_else(|| ChartError::MissingColumn("Volume".to_string()))?;

    Ok(ChartData {
        title: format!("{label} - Trading Volume"),
        kind: ChartKind::Volume,
        index: table.index.clone(),
        series: vec![ChartSeries {
            name: "Volume".to_string(),
            values: volume.values.clone(),
        }],
    })
}

/// Dispatch on `kind`. `field` only applies to line charts.
pub fn build_chart(
    table: &PriceTable,
    label: &str,
    kind: ChartKind,
    field: PriceField,
) -> Result<ChartData, ChartError> {
    match kind {
        ChartKind::Line => Ok(line_chart(table, label, field)),
        ChartKind::Candlestick => Ok(candlestick_chart(table, label)),
        ChartKind::Volume => volume_chart(table, label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{positional_index, NumericColumn};

    fn table(with_volume: bool) -> PriceTable {
        PriceTable {
            index: positional_index(2),
            open: vec![1.0, 2.0],
            high: vec![2.0, 3.0],
            low: vec![0.5, 1.5],
            close: vec![1.5, 2.5],
            extra: if with_volume {
                vec![NumericColumn::new("Volume", vec![Some(10.0), None])]
            } else {
                Vec::new()
            },
        }
    }

    #[test]
    fn line_chart_selects_field() {
        let chart = line_chart(&table(false), "AAPL", PriceField::High);
        assert_eq!(chart.title, "AAPL - High Price Over Time");
        assert_eq!(chart.series[0].values, vec![Some(2.0), Some(3.0)]);
    }

    #[test]
    fn candlestick_has_four_series() {
        let chart = candlestick_chart(&table(false), "AAPL");
        let names: Vec<&str> = chart.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Open", "High", "Low", "Close"]);
    }

    #[test]
    fn volume_requires_column() {
        assert_eq!(
            volume_chart(&table(false), "AAPL"),
            Err(ChartError::MissingColumn("Volume".into()))
        );
        let chart = volume_chart(&table(true), "AAPL").unwrap();
        assert_eq!(chart.series[0].values, vec![Some(10.0), None]);
    }
}
