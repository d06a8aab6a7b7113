//! Scrape the two values the picker page embeds for the rest of the flow.
//!
//! The picker page is HTML meant for a browser. It carries a CSRF token in an
//! inline script (`token='...'`) and the server's validated copy of our link
//! payload as the HTML-escaped `value` of an input with the id
//! `validatedTalkLink`. Neither is documented, so when Kakao changes the page
//! this is the module that breaks.

use super::session::CsrfToken;
use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use std::fmt;

static CSRF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"token='([^']+)'").unwrap());

static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"value="([^"]+)" id="validatedTalkLink""#).unwrap());

/// Numeric references may omit their closing `;`, as browsers allow. Named
/// references are matched loosely here and checked against the full HTML5
/// table when decoded.
static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#(?P<dec>[0-9]+);?|#[xX](?P<hex>[0-9a-fA-F]+);?|[a-zA-Z][a-zA-Z0-9]*;)")
        .unwrap()
});

/// The server's echo of a link payload. It's never inspected, only handed
/// back verbatim in the send call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidatedLink(pub serde_json::Value);

/// Everything a successful picker call yields.
#[derive(Debug, PartialEq)]
pub struct Picked {
    pub csrf: CsrfToken,
    pub link: ValidatedLink,
}

#[derive(Debug)]
pub enum ExtractionError {
    MissingCsrfToken,
    MissingValidatedLink,
    InvalidValidatedLink(serde_json::Error),
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let x = match self {
            ExtractionError::MissingCsrfToken => "no CSRF token found".into(),
            ExtractionError::MissingValidatedLink => "no validated link found".into(),
            ExtractionError::InvalidValidatedLink(e) => format!("validated link is not JSON: {}", e),
        };

        write!(f, "{}", x)
    }
}

/// Pull the CSRF token and validated link out of a picker page.
pub fn extract(html: &str) -> Result<Picked, ExtractionError> {
    let csrf = first_capture(&CSRF_RE, html).ok_or(ExtractionError::MissingCsrfToken)?;
    let raw_link = first_capture(&LINK_RE, html).ok_or(ExtractionError::MissingValidatedLink)?;

    let link = serde_json::from_str(&unescape_html(raw_link))
        .map_err(ExtractionError::InvalidValidatedLink)?;

    Ok(Picked {
        csrf: CsrfToken(csrf.to_owned()),
        link: ValidatedLink(link),
    })
}

fn first_capture<'a>(re: &Regex, haystack: &'a str) -> Option<&'a str> {
    re.captures(haystack)
        .and_then(|cs| cs.get(1))
        .map(|m| m.as_str())
}

/// Decode HTML character references in a single pass, so `&amp;quot;`
/// becomes `&quot;` rather than `"`. Unknown named references are left as
/// they are, and numeric ones outside Unicode become U+FFFD.
fn unescape_html(s: &str) -> String {
    ENTITY_RE
        .replace_all(s, |cs: &Captures| {
            let code = if let Some(n) = cs.name("dec") {
                n.as_str().parse::<u32>().ok()
            } else if let Some(n) = cs.name("hex") {
                u32::from_str_radix(n.as_str(), 16).ok()
            } else {
                return decode_html_entities(&cs[0]).into_owned();
            };

            code.filter(|&c| c != 0)
                .and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER)
                .to_string()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;
    use serde_json::json;

    /// Trimmed down from a real picker page.
    const PICKER_PAGE: &str = r#"<!DOCTYPE html>
<html lang="ko">
<head>
<script type="text/javascript">
  window.app = { token='dGhpcyBpcyBhIHRva2Vu', locale='ko' };
</script>
</head>
<body>
<form id="shareForm">
  <input type="hidden" value="{&quot;link_ver&quot;:&quot;4.0&quot;,&quot;template_object&quot;:{&quot;title&quot;:&quot;Tom &amp; Jerry&quot;,&quot;ids&quot;:[1,2]}}" id="validatedTalkLink">
</form>
</body>
</html>"#;

    #[test]
    fn test_extract() {
        let picked = extract(PICKER_PAGE).unwrap();

        assert_eq!(picked.csrf, CsrfToken("dGhpcyBpcyBhIHRva2Vu".into()));
        assert_eq!(
            picked.link,
            ValidatedLink(json!({
                "link_ver": "4.0",
                "template_object": { "title": "Tom & Jerry", "ids": [1, 2] }
            }))
        );
    }

    #[test]
    fn test_extract_minimal() {
        let html = r#"token='abc' <input value="{&quot;x&quot;:1}" id="validatedTalkLink">"#;

        assert_eq!(
            extract(html).unwrap(),
            Picked {
                csrf: CsrfToken("abc".into()),
                link: ValidatedLink(json!({ "x": 1 })),
            }
        );
    }

    #[test]
    fn test_missing_csrf() {
        let html = PICKER_PAGE.replace("token=", "tokens:");

        assert!(matches!(
            extract(&html),
            Err(ExtractionError::MissingCsrfToken)
        ));
    }

    #[test]
    fn test_missing_validated_link() {
        let html = PICKER_PAGE.replace("validatedTalkLink", "somethingElse");

        assert!(matches!(
            extract(&html),
            Err(ExtractionError::MissingValidatedLink)
        ));
    }

    #[test]
    fn test_invalid_validated_link() {
        let html = r#"token='abc' <input value="{not json" id="validatedTalkLink">"#;

        assert!(matches!(
            extract(html),
            Err(ExtractionError::InvalidValidatedLink(_))
        ));
    }

    #[test]
    fn test_login_page_is_rejected() {
        // What an expired session gets redirected to.
        let html = r#"<html><body><form action="/login"></form></body></html>"#;

        assert!(matches!(
            extract(html),
            Err(ExtractionError::MissingCsrfToken)
        ));
    }

    #[test]
    fn test_unescape_html() {
        assert_eq!(unescape_html("&quot;a&quot; &lt;b&gt;"), r#""a" <b>"#);
        assert_eq!(unescape_html("&#34;&#x27;&#X41;"), "\"'A");
        assert_eq!(unescape_html("&amp;quot;"), "&quot;");
        assert_eq!(unescape_html("&unknown; &#xZZ; &"), "&unknown; &#xZZ; &");
        assert_eq!(unescape_html("&#1114112;"), "\u{fffd}");
        assert_eq!(unescape_html("&#0;"), "\u{fffd}");
    }

    #[test]
    fn test_unescape_html_full_table() {
        assert_eq!(unescape_html("Tom&hellip; &copy; &#39x"), "Tom\u{2026} \u{a9} 'x");
        assert_eq!(unescape_html("&rarr;&nbsp;&eacute;"), "\u{2192}\u{a0}\u{e9}");
    }

    #[test]
    fn test_extract_keeps_rich_entities() {
        let html = r#"token='abc' <input value="{&quot;t&quot;:&quot;Tom&hellip; &copy; &#39x&quot;}" id="validatedTalkLink">"#;

        assert_eq!(
            extract(html).unwrap().link,
            ValidatedLink(json!({ "t": "Tom\u{2026} \u{a9} 'x" }))
        );
    }

    quickcheck! {
        fn test_extract_never_panics(html: String) -> bool {
            let _ = extract(&html);
            true
        }

        fn test_unescape_plain_text_is_unchanged(s: String) -> bool {
            let plain = s.replace('&', "");
            unescape_html(&plain) == plain
        }
    }
}
