//! Viewer page extraction.
//!
//! Parses the rendered leaderboard ("raid meter") markup of a viewer page
//! into raw rows. Each meter bar looks like:
//!
//! ```html
//! <div class="bar_container">
//!   <div class="bar">
//!     <div class="bar_bg_color hero_class_bg_8"></div>
//!     <div class="bar_label_left"><span>3.</span><span>Kyra</span>
//!       <div class="spec-icon" style="background-image:
//!            url('/assets/wow_hero_classes/c8-3.png')"></div>
//!     </div>
//!     <div class="bar_label_right">1 234,5</div>
//!   </div>
//! </div>
//! ```
//!
//! Malformed bars are skipped row-by-row; a document with no meter at all is
//! a structural error so callers can distinguish "empty leaderboard" from
//! "not a viewer page".

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

use crate::calculate::parse_locale_number;
use crate::models::{DeathRow, MeterMetric, RawRow, SpecIcon};

/// Errors from viewer page extraction.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Not a viewer page: {0}")]
    InvalidPage(String),
}

fn sel(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

/// Digits-only rank parse (`"3."` → 3).
fn parse_rank(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// First two label spans of a bar: rank text and player name.
fn bar_labels(bar: ElementRef<'_>) -> (Option<u32>, String, String) {
    let left_sel = sel(".bar_label_left");
    let right_sel = sel(".bar_label_right");
    let span_sel = sel("span");

    let (rank, name) = match bar.select(&left_sel).next() {
        Some(left) => {
            let mut spans = left.select(&span_sel);
            let rank_text = spans
                .next()
                .map(|s| s.text().collect::<String>())
                .unwrap_or_default();
            let name_text = spans
                .next()
                .map(|s| s.text().collect::<String>())
                .unwrap_or_default();
            (parse_rank(&rank_text), name_text.trim().to_string())
        }
        None => (None, String::new()),
    };

    let value_text = bar
        .select(&right_sel)
        .next()
        .map(|r| r.text().collect::<String>())
        .map(|t| t.trim().to_string())
        .unwrap_or_default();

    (rank, name, value_text)
}

/// Spec icons on a bar, from the `c<class>-<spec>.png` signatures in the
/// inline background-image style.
fn bar_spec_icons(bar: ElementRef<'_>, page_url: &Url) -> Vec<SpecIcon> {
    let icon_sel = sel(".spec-icon");
    let re_sig = Regex::new(r"(?i)c(\d+)-(\d+)\.png").unwrap();
    let re_path = Regex::new(r"(?i)(/assets/wow_hero_classes/c\d+-\d+\.png)").unwrap();

    bar.select(&icon_sel)
        .filter_map(|icon| {
            let style = icon.value().attr("style").unwrap_or("");
            let caps = re_sig.captures(style)?;
            let class_id: u32 = caps[1].parse().ok()?;
            let spec_id: u32 = caps[2].parse().ok()?;

            let icon_url = re_path
                .captures(style)
                .and_then(|m| page_url.join(&m[1]).ok())
                .map(|u| u.to_string());

            Some(SpecIcon {
                class_id,
                spec_id,
                icon_url,
            })
        })
        .collect()
}

/// Extract raw leaderboard rows from a rendered viewer page.
///
/// Bars without a finite value are skipped. Rows keep their spec icons
/// unresolved; the normalizer decides what to drop. Output is ordered by
/// source rank with unranked rows last.
pub fn extract_meter_rows(html: &str, page_url: &Url) -> Result<Vec<RawRow>, ScrapeError> {
    let doc = Html::parse_document(html);
    let container_sel = sel(".bar_container");
    let bar_sel = sel(".bar_container > .bar");

    if doc.select(&container_sel).next().is_none() {
        return Err(ScrapeError::InvalidPage(
            "no meter bar container found".to_string(),
        ));
    }

    let mut rows: Vec<RawRow> = Vec::new();
    for bar in doc.select(&bar_sel) {
        let (rank, name, value_text) = bar_labels(bar);
        let value = match parse_locale_number(&value_text) {
            Some(v) => v,
            None => continue,
        };

        rows.push(RawRow {
            rank,
            name,
            value,
            icons: bar_spec_icons(bar, page_url),
        });
    }

    rows.sort_by_key(|r| r.rank.unwrap_or(u32::MAX));
    Ok(rows)
}

/// Extract death rows from the left meter of a viewer page.
///
/// Class id comes from the bar background (`hero_class_bg_<id>`), falling
/// back to the spec icon signature. Rows are re-ranked by descending deaths
/// then ascending name, matching the meter's own ordering.
pub fn extract_death_rows(html: &str, page_url: &Url) -> Result<Vec<DeathRow>, ScrapeError> {
    let doc = Html::parse_document(html);
    let meter_sel = sel("raidmeter#left_meter");
    let bar_sel = sel("raidmeter#left_meter .bar_container > .bar");
    let bg_sel = sel(".bar_bg_color");
    let re_bg = Regex::new(r"(?i)hero_class_bg_(\d+)").unwrap();

    if doc.select(&meter_sel).next().is_none() {
        return Err(ScrapeError::InvalidPage(
            "no left meter found".to_string(),
        ));
    }

    let mut rows: Vec<DeathRow> = Vec::new();
    for bar in doc.select(&bar_sel) {
        let (_, name, value_text) = bar_labels(bar);
        if name.is_empty() {
            continue;
        }
        let deaths = match parse_locale_number(&value_text) {
            Some(v) => v,
            None => continue,
        };

        let class_id = bar
            .select(&bg_sel)
            .next()
            .and_then(|bg| {
                let classes = bg.value().attr("class").unwrap_or("");
                re_bg
                    .captures(classes)
                    .and_then(|m| m[1].parse::<u32>().ok())
            })
            .or_else(|| bar_spec_icons(bar, page_url).first().map(|i| i.class_id));

        rows.push(DeathRow {
            name,
            deaths,
            class_id,
        });
    }

    rows.sort_by(|a, b| {
        b.deaths
            .total_cmp(&a.deaths)
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(rows)
}

/// The metric selected in the left meter's title bar, when present in the
/// markup.
pub fn extract_selected_metric(html: &str) -> Option<MeterMetric> {
    let doc = Html::parse_document(html);
    let option_sel = sel("raidmeter#left_meter .title_bar select option[selected]");

    doc.select(&option_sel).next().map(|opt| MeterMetric {
        id: opt.value().attr("value").and_then(|v| v.parse().ok()),
        name: Some(opt.text().collect::<String>().trim().to_string()),
    })
}
