use core_types::{Column, CoreError, VolumeTable};
use serde::{Deserialize, Serialize};

/// One or several y-axis column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum YColumns {
    One(String),
    Many(Vec<String>),
}

impl YColumns {
    pub fn names(&self) -> Vec<&str> {
        match self {
            YColumns::One(name) => vec![name.as_str()],
            YColumns::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for YColumns {
    fn from(name: &str) -> Self {
        YColumns::One(name.to_string())
    }
}

impl From<&[&str]> for YColumns {
    fn from(names: &[&str]) -> Self {
        YColumns::Many(names.iter().map(|n| n.to_string()).collect())
    }
}

impl From<Vec<&str>> for YColumns {
    fn from(names: Vec<&str>) -> Self {
        names.as_slice().into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
}

/// A Plotly-compatible figure: `data` traces plus a `layout`.
#[derive(Debug, Clone, Serialize)]
pub struct Chart {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub trace_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
    pub name: String,
    pub x: Column,
    pub y: Column,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub title: Title,
    pub xaxis: Axis,
    pub yaxis: Axis,
}

#[derive(Debug, Clone, Serialize)]
pub struct Title {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    pub title: Title,
}

/// Bar chart of each `y_cols` column against `x_col`.
pub fn chart_bars(
    table: &VolumeTable,
    x_col: &str,
    y_cols: impl Into<YColumns>,
    title: &str,
) -> Result<Chart, CoreError> {
    build(ChartKind::Bar, table, x_col, &y_cols.into(), title)
}

/// Line chart of each `y_cols` column against `x_col`.
pub fn chart_lines(
    table: &VolumeTable,
    x_col: &str,
    y_cols: impl Into<YColumns>,
    title: &str,
) -> Result<Chart, CoreError> {
    build(ChartKind::Line, table, x_col, &y_cols.into(), title)
}

pub fn build(
    kind: ChartKind,
    table: &VolumeTable,
    x_col: &str,
    y_cols: &YColumns,
    title: &str,
) -> Result<Chart, CoreError> {
    let x = table.column(x_col)?;
    let names = y_cols.names();
    let data = names
        .iter()
        .map(|name| -> Result<Trace, CoreError> {
            Ok(Trace {
                trace_type: match kind {
                    ChartKind::Bar => "bar",
                    ChartKind::Line => "scatter",
                },
                mode: match kind {
                    ChartKind::Bar => None,
                    ChartKind::Line => Some("lines"),
                },
                name: name.to_string(),
                x: x.clone(),
                y: table.column(name)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Chart {
        data,
        layout: Layout {
            title: Title {
                text: title.to_string(),
            },
            xaxis: Axis {
                title: Title {
                    text: x_col.to_string(),
                },
            },
            yaxis: Axis {
                title: Title {
                    text: names.join(", "),
                },
            },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use core_types::VolumeRecord;

    fn table() -> VolumeTable {
        VolumeTable::new(vec![
            VolumeRecord {
                ts: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
                volume: 1.5,
                cumulative_volume: 1.5,
            },
            VolumeRecord {
                ts: Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap(),
                volume: 2.0,
                cumulative_volume: 3.5,
            },
        ])
    }

    #[test]
    fn test_bar_chart_single_column() {
        let chart = chart_bars(&table(), "ts", "volume", "Daily Perps Volume").unwrap();
        assert_eq!(chart.data.len(), 1);
        assert_eq!(chart.data[0].trace_type, "bar");
        assert_eq!(chart.data[0].y, Column::Numbers(vec![1.5, 2.0]));

        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["layout"]["title"]["text"], "Daily Perps Volume");
        assert_eq!(json["data"][0]["type"], "bar");
        assert!(json["data"][0].get("mode").is_none());
        assert_eq!(json["data"][0]["x"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_line_chart_multiple_columns() {
        let chart = chart_lines(
            &table(),
            "ts",
            vec!["volume", "cumulative_volume"],
            "Volume",
        )
        .unwrap();
        assert_eq!(chart.data.len(), 2);
        assert_eq!(chart.data[1].name, "cumulative_volume");
        assert_eq!(chart.data[1].mode, Some("lines"));
        assert_eq!(chart.layout.yaxis.title.text, "volume, cumulative_volume");
    }

    #[test]
    fn test_unknown_column() {
        let err = chart_bars(&table(), "ts", "fees", "Fees").unwrap_err();
        assert_eq!(err, CoreError::UnknownColumn("fees".to_string()));
    }

    #[test]
    fn test_y_columns_deserialize_from_string_or_list() {
        let one: YColumns = serde_json::from_str("\"volume\"").unwrap();
        assert_eq!(one.names(), vec!["volume"]);
        let many: YColumns = serde_json::from_str("[\"volume\", \"cumulative_volume\"]").unwrap();
        assert_eq!(many.names(), vec!["volume", "cumulative_volume"]);
    }
}
