use crate::charts::{self, Chart, ChartKind, YColumns};
use chrono::{DateTime, NaiveDate, Utc};
use core_types::{Chain, CoreError, Resolution, VolumeTable};
use serde::Serialize;

const HOME_MARKDOWN: &str = "# Perps Dashboards\n\n\
Trading volume for the perps markets on each supported chain. \
Pick a chain from the navigation to see its daily volume.";

/// A page of the dashboard, addressed by `slug` and listed under `section`.
#[derive(Debug, Clone)]
pub struct Page {
    pub slug: &'static str,
    pub title: &'static str,
    pub section: &'static str,
    pub content: PageContent,
}

#[derive(Debug, Clone)]
pub enum PageContent {
    Markdown(&'static str),
    Volume(VolumePanel),
}

/// A fixed volume query, rendered as a table and an optional chart.
#[derive(Debug, Clone)]
pub struct VolumePanel {
    pub chain: Chain,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub resolution: Resolution,
    pub chart: Option<ChartSpec>,
}

impl VolumePanel {
    /// The query window as UTC midnights.
    pub fn window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (midnight(self.start), midnight(self.end))
    }
}

#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub x_col: &'static str,
    pub y_cols: &'static [&'static str],
    pub title: &'static str,
}

impl ChartSpec {
    pub fn render(&self, table: &VolumeTable) -> Result<Chart, CoreError> {
        let y_cols: YColumns = match self.y_cols {
            [single] => (*single).into(),
            many => many.into(),
        };
        charts::build(self.kind, table, self.x_col, &y_cols, self.title)
    }
}

pub fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// The dashboard's pages: Home, then one page per chain under "Chains".
pub fn default_pages() -> Vec<Page> {
    let june_start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or_default();
    let july_start = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap_or_default();

    vec![
        Page {
            slug: "home",
            title: "Home",
            section: "",
            content: PageContent::Markdown(HOME_MARKDOWN),
        },
        Page {
            slug: "arbitrum",
            title: "Arbitrum",
            section: "Chains",
            content: PageContent::Volume(VolumePanel {
                chain: Chain::ArbitrumMainnet,
                start: june_start,
                end: july_start,
                resolution: Resolution::Daily,
                chart: Some(ChartSpec {
                    kind: ChartKind::Bar,
                    x_col: "ts",
                    y_cols: &["volume"],
                    title: "Daily Perps Volume",
                }),
            }),
        },
        Page {
            slug: "base",
            title: "Base",
            section: "Chains",
            content: PageContent::Volume(VolumePanel {
                chain: Chain::BaseMainnet,
                start: june_start,
                end: july_start,
                resolution: Resolution::Daily,
                chart: None,
            }),
        },
    ]
}

#[derive(Debug, Clone, Serialize)]
pub struct NavSection {
    pub name: &'static str,
    pub pages: Vec<NavEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavEntry {
    pub slug: &'static str,
    pub title: &'static str,
}

/// Groups pages by section, keeping first-appearance order.
pub fn navigation(pages: &[Page]) -> Vec<NavSection> {
    let mut sections: Vec<NavSection> = Vec::new();
    for page in pages {
        let entry = NavEntry {
            slug: page.slug,
            title: page.title,
        };
        match sections.iter_mut().find(|s| s.name == page.section) {
            Some(section) => section.pages.push(entry),
            None => sections.push(NavSection {
                name: page.section,
                pages: vec![entry],
            }),
        }
    }
    sections
}

/// What the shell sends to the browser for one page.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub title: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<VolumeTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<Chart>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_navigation_sections() {
        let nav = navigation(&default_pages());
        assert_eq!(nav.len(), 2);
        assert_eq!(nav[0].name, "");
        assert_eq!(nav[0].pages[0].slug, "home");
        assert_eq!(nav[1].name, "Chains");
        let titles: Vec<_> = nav[1].pages.iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["Arbitrum", "Base"]);
    }

    #[test]
    fn test_chain_pages_query_june_window() {
        let pages = default_pages();
        let PageContent::Volume(panel) = &pages[2].content else {
            panic!("base page should be a volume panel");
        };
        assert_eq!(panel.chain, Chain::BaseMainnet);
        assert_eq!(panel.resolution, Resolution::Daily);
        assert_eq!(
            panel.window(),
            (
                Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()
            )
        );
    }

    #[test]
    fn test_chart_spec_renders_bar_chart() {
        let pages = default_pages();
        let PageContent::Volume(panel) = &pages[1].content else {
            panic!("arbitrum page should be a volume panel");
        };
        let chart = panel
            .chart
            .as_ref()
            .unwrap()
            .render(&VolumeTable::default())
            .unwrap();
        assert_eq!(chart.layout.title.text, "Daily Perps Volume");
        assert_eq!(chart.data[0].trace_type, "bar");
        assert!(chart.data[0].y.is_empty());
    }
}
