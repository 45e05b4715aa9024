//! Markup handling for monthly diary pages: telling data tables apart from the
//! "no observations" marker, shrinking them for the cache, and splitting tables
//! into owned row cells.

use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

/// CSS class of the element the diary shows when a station published nothing for a month.
pub const NO_DATA_CLASS: &str = "empty_phrase";

/// Rows at the top of every monthly table that only hold column titles.
pub const HEADER_ROWS: usize = 2;

/// A station's month as published by the diary.
#[derive(Debug, Clone, PartialEq)]
pub enum MonthlyTable {
    /// The diary explicitly reports no observations for this month.
    NoData,
    /// Minified `<table>` markup.
    Table(String),
}

/// Text and icon sources of one `<td>`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub text: String,
    pub icons: Vec<String>,
}

pub type RowCells = Vec<Cell>;

/// A page reduced to the fragment worth caching.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MonthlyPage {
    NoData(String),
    Table(String),
}

impl MonthlyPage {
    pub(crate) fn fragment(&self) -> &str {
        match self {
            MonthlyPage::NoData(fragment) | MonthlyPage::Table(fragment) => fragment,
        }
    }

    pub(crate) fn into_table(self) -> MonthlyTable {
        match self {
            MonthlyPage::NoData(_) => MonthlyTable::NoData,
            MonthlyPage::Table(markup) => MonthlyTable::Table(markup),
        }
    }
}

fn selector(slot: &'static OnceLock<Selector>, css: &'static str) -> &'static Selector {
    slot.get_or_init(|| Selector::parse(css).expect("CSS selector should be valid"))
}

fn no_data_selector() -> &'static Selector {
    static SLOT: OnceLock<Selector> = OnceLock::new();
    selector(&SLOT, ".empty_phrase")
}

fn table_selector() -> &'static Selector {
    static SLOT: OnceLock<Selector> = OnceLock::new();
    selector(&SLOT, "table")
}

fn row_selector() -> &'static Selector {
    static SLOT: OnceLock<Selector> = OnceLock::new();
    selector(&SLOT, "tr")
}

fn cell_selector() -> &'static Selector {
    static SLOT: OnceLock<Selector> = OnceLock::new();
    selector(&SLOT, "td")
}

fn icon_selector() -> &'static Selector {
    static SLOT: OnceLock<Selector> = OnceLock::new();
    selector(&SLOT, "img")
}

/// Finds the "no data" marker or the first table on a page.
///
/// Returns `None` when the page holds neither.
pub(crate) fn classify_page(html: &str) -> Option<MonthlyPage> {
    let document = Html::parse_document(html);
    if let Some(marker) = document.select(no_data_selector()).next() {
        return Some(MonthlyPage::NoData(minify_markup(&marker.html())));
    }
    document
        .select(table_selector())
        .next()
        .map(|table| MonthlyPage::Table(minify_markup(&table.html())))
}

/// Drops whitespace between tags and collapses any other whitespace run to one space.
pub fn minify_markup(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut pending_space = false;
    for ch in html.chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            let between_tags = out.ends_with('>') && ch == '<';
            if !out.is_empty() && !between_tags {
                out.push(' ');
            }
            pending_space = false;
        }
        out.push(ch);
    }
    out
}

fn cell_from_element(td: ElementRef<'_>) -> Cell {
    Cell {
        text: td.text().collect::<String>().trim().to_string(),
        icons: td
            .select(icon_selector())
            .filter_map(|img| img.value().attr("src"))
            .map(str::to_string)
            .collect(),
    }
}

impl MonthlyTable {
    pub fn is_no_data(&self) -> bool {
        matches!(self, MonthlyTable::NoData)
    }

    /// Cells of every data row, header rows excluded. Empty for [`MonthlyTable::NoData`].
    pub fn data_rows(&self) -> Vec<RowCells> {
        let MonthlyTable::Table(markup) = self else {
            return Vec::new();
        };
        let document = Html::parse_document(markup);
        let Some(table) = document.select(table_selector()).next() else {
            return Vec::new();
        };
        table
            .select(row_selector())
            .skip(HEADER_ROWS)
            .map(|row| row.select(cell_selector()).map(cell_from_element).collect())
            .collect()
    }
}
