use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};

use nw_core::types::{ArticleRecord, SearchQuery};

pub const GOOGLE: &str = "https://www.google.com";

pub const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:106.0) Gecko/20100101 Firefox/106.0";

/// Date format the provider accepts in the query string. Stored dates use
/// ISO `YYYY-MM-DD`.
const QUERY_DATE_FORMAT: &str = "%m/%d/%Y";

/// Builds the provider search URL: news results only, a one-day date
/// window (min == max), sorted by relevance, filtered to the query
/// language.
pub fn create_search_url(query: &SearchQuery) -> String {
    let mut url = format!("{GOOGLE}/search?q={}", urlencoding::encode(&query.text));

    // news result type
    url.push_str("&tbm=nws");

    // custom date range pinned to the single target day
    let day = query.date.format(QUERY_DATE_FORMAT).to_string();
    url.push_str(&format!("&tbs=cdr:1,cd_min:{day},cd_max:{day}"));

    // sort by relevance
    url.push_str(",sbd:0");

    // language filter
    url.push_str(&format!("&lr={}", query.language.query_value()));

    url
}

/// Extracts candidate records from a search results page, in page order.
/// A missing field becomes `None`; partial records are still emitted. The
/// truncation flag is computed here, from the extracted headline, before
/// anything downstream touches it.
pub fn extract_search_results(html: &str, date: NaiveDate) -> Vec<ArticleRecord> {
    let document = Html::parse_document(html);
    let result_selector = Selector::parse("div.SoaBEf").unwrap();

    document
        .select(&result_selector)
        .map(|fragment| {
            let publication = find_publication(&fragment);
            let headline = find_result_headline(&fragment);
            let link = find_link(&fragment);
            let truncated = headline.as_deref().map_or(false, is_headline_truncated);

            ArticleRecord {
                id: None,
                date,
                publication,
                headline,
                link,
                truncated,
            }
        })
        .collect()
}

/// The publication name sits in a span under the parent of the source
/// icon element.
fn find_publication(fragment: &ElementRef) -> Option<String> {
    let icon_selector = Selector::parse("g-img").unwrap();
    let span_selector = Selector::parse("span").unwrap();

    let icon = fragment.select(&icon_selector).next()?;
    let parent = ElementRef::wrap(icon.parent()?)?;
    let span = parent.select(&span_selector).next()?;
    Some(span.text().collect::<String>())
}

fn find_result_headline(fragment: &ElementRef) -> Option<String> {
    let heading_selector = Selector::parse("div[role=\"heading\"]").unwrap();
    let heading = fragment.select(&heading_selector).next()?;
    let text = heading.text().collect::<String>();
    Some(text.trim().replace('\n', ""))
}

fn find_link(fragment: &ElementRef) -> Option<String> {
    let anchor_selector = Selector::parse("a").unwrap();
    fragment
        .select(&anchor_selector)
        .next()?
        .value()
        .attr("href")
        .map(str::to_string)
}

/// A headline the provider cut off ends in an ellipsis marker.
pub fn is_headline_truncated(headline: &str) -> bool {
    headline.ends_with("...")
}
