//! Fixture builders for result lists and search result markup.

use crate::core::RawResult;

/// A small result page: two distinct organic results and a repeat of the
/// first URL.
pub const NIKE_SERP_HTML: &str = r#"
<html>
  <body>
    <div id="search">
      <div class="g">
        <div class="yuRUbf"><a href="https://www.nike.com/"><h3>Nike. Just Do It. Nike.com</h3></a></div>
        <div class="IsZvec"><span class="aCOpRe">Discover the latest shoes, apparel and accessories.</span></div>
      </div>
      <div class="g">
        <div class="yuRUbf"><a href="https://en.wikipedia.org/wiki/Nike,_Inc."><h3>Nike - Wikipedia</h3></a></div>
        <div class="VwiC3b">Nike, Inc. is an American...</div>
      </div>
      <div class="g">
        <div class="yuRUbf"><a href="https://www.nike.com/"><h3>Nike. Just Do It. Nike.com</h3></a></div>
        <div class="IsZvec">Shop now.</div>
      </div>
    </div>
  </body>
</html>
"#;

/// Generates `count` distinct results whose fields are derived from
/// `prefix` and a 1-based index.
#[must_use]
pub fn raw_results(prefix: &str, count: usize) -> Vec<RawResult> {
    (1..=count)
        .map(|i| {
            RawResult::new(
                format!("{prefix} result {i}"),
                format!("https://example.com/{prefix}/{i}"),
                format!("Snippet for {prefix} result {i}"),
            )
        })
        .collect()
}

/// Renders results as a search result page in the layout the default
/// extractor selectors expect.
#[must_use]
pub fn serp_html(results: &[RawResult]) -> String {
    let mut html = String::from("<html><body><div id=\"search\">");
    for r in results {
        html.push_str(&format!(
            "<div class=\"g\"><div class=\"yuRUbf\"><a href=\"{}\"><h3>{}</h3></a></div>\
             <div class=\"VwiC3b\">{}</div></div>",
            escape(&r.url),
            escape(&r.title),
            escape(&r.description),
        ));
    }
    html.push_str("</div></body></html>");
    html
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_results_are_distinct() {
        let results = raw_results("q", 3);
        assert_eq!(results.len(), 3);
        assert_eq!(results[2].url, "https://example.com/q/3");
        assert_ne!(results[0].url, results[1].url);
    }

    #[test]
    fn test_serp_html_escapes() {
        let html = serp_html(&[RawResult::new("A & B", "https://x.example/?a=1&b=2", "<b>")]);
        assert!(html.contains("A &amp; B"));
        assert!(html.contains("&lt;b&gt;"));
        assert!(html.starts_with("<html><body><div id=\"search\">"));
    }
}
