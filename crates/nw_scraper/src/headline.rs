use scraper::{Html, Selector};
use tracing::debug;

use nw_core::{HeadlinePicker, Result};

/// Collects the text of every `<h1>` in the page. Exactly one heading
/// level: subheadings are never headline candidates.
pub fn headline_candidates(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let h1_selector = Selector::parse("h1").unwrap();

    document
        .select(&h1_selector)
        .map(|heading| heading.text().collect::<String>())
        .collect()
}

/// Resolves the headline of an article page. A single `<h1>` is
/// unambiguous and returned as-is, without consulting the picker. Several
/// candidates defer to the picker, whose answer gets its wrapping quotes
/// stripped. No candidates, or no picker to break a tie, yields `None` —
/// a defined "no answer", not an error.
pub async fn resolve_headline(
    html: &str,
    picker: Option<&dyn HeadlinePicker>,
) -> Result<Option<String>> {
    let candidates = headline_candidates(html);

    if candidates.is_empty() {
        return Ok(None);
    }

    if candidates.len() == 1 {
        return Ok(candidates.into_iter().next());
    }

    let Some(picker) = picker else {
        debug!(
            candidates = candidates.len(),
            "ambiguous headline and no picker configured"
        );
        return Ok(None);
    };

    let answer = picker.pick(&candidates, None).await?;
    Ok(Some(strip_quotes(&answer).to_string()))
}

/// Strips matching single- or double-quote pairs wrapping the entire
/// string, repeating until none remain, so stripping is idempotent.
pub fn strip_quotes(s: &str) -> &str {
    let mut s = s;
    loop {
        let stripped = s
            .strip_prefix('\'')
            .and_then(|rest| rest.strip_suffix('\''))
            .or_else(|| s.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')));
        match stripped {
            Some(inner) => s = inner,
            None => return s,
        }
    }
}
