use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use super::models::{Article, ArticleId, FeedSnapshot};
use crate::{Error, Result};

/// Timestamp layouts seen in the `datetime` field
const DATETIME_FORMATS: &[&str] = &[
    "%Y.%m.%d %H:%M",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

#[derive(Debug, Deserialize)]
struct NewsListResponse {
    list: Vec<RawNews>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNews {
    oid: String,
    aid: String,
    #[serde(default)]
    office_name: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    sub_content: String,
    datetime: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    total_count: Option<u64>,
}

/// Parse a team news list response into a snapshot for `date`.
///
/// A body without a `list` array, or any entry without an identity or a
/// readable timestamp, fails the whole response.
pub fn parse_news_list(content: &[u8], date: NaiveDate) -> Result<FeedSnapshot> {
    let response: NewsListResponse = serde_json::from_slice(content)
        .map_err(|e| Error::FeedParse(format!("Malformed news list: {}", e)))?;

    let articles = response
        .list
        .into_iter()
        .map(into_article)
        .collect::<Result<Vec<_>>>()?;

    Ok(FeedSnapshot::from_feed_order(date, articles))
}

fn into_article(raw: RawNews) -> Result<Article> {
    if raw.oid.trim().is_empty() || raw.aid.trim().is_empty() {
        return Err(Error::FeedParse(format!(
            "News entry without identity (oid={:?}, aid={:?})",
            raw.oid, raw.aid
        )));
    }

    let published_at = parse_datetime(&raw.datetime)?;

    Ok(Article {
        id: ArticleId::new(raw.oid.trim(), raw.aid.trim()),
        office_name: clean_text(&raw.office_name),
        title: clean_text(&raw.title),
        sub_content: clean_text(&raw.sub_content),
        published_at,
        view_count: raw.total_count.unwrap_or(0),
        canonical_url: raw.url.filter(|u| !u.trim().is_empty()),
    })
}

pub(crate) fn parse_datetime(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| Error::FeedParse(format!("Unrecognized datetime: {:?}", value)))
}

/// Decode entities and strip markup from display text
fn clean_text(value: &str) -> String {
    if !value.contains('&') && !value.contains('<') {
        return value.trim().to_string();
    }
    html2text::from_read(value.as_bytes(), 10_000)
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_else(|_| value.trim().to_string())
}
