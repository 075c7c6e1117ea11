//! crates/topic_core/src/links.rs
//!
//! Builds the deep links shown as search results. Pure functions of the keyword.

use crate::domain::{Keyword, Platform, ResultLink};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left unescaped, matching a browser's `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const INSTAGRAM_SEARCH: &str = "https://www.instagram.com/explore/search/keyword/?q=";
const TELEGRAM_SEARCH: &str = "https://t.me/s/";

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

pub fn search_url(platform: Platform, keyword: &Keyword) -> String {
    let encoded = encode_component(keyword.as_str());
    match platform {
        Platform::Instagram => format!("{}{}", INSTAGRAM_SEARCH, encoded),
        Platform::Telegram => format!("{}{}", TELEGRAM_SEARCH, encoded),
    }
}

/// One link per supported platform, in `Platform::ALL` order.
pub fn build_result_links(keyword: &Keyword) -> Vec<ResultLink> {
    Platform::ALL
        .into_iter()
        .map(|platform| ResultLink {
            title: format!("{} results", platform.display_name()),
            subtitle: format!("for “{}”", keyword),
            url: search_url(platform, keyword),
            source: platform,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_use_the_trimmed_keyword() {
        let keyword = Keyword::parse("cats  ").unwrap();
        let links = build_result_links(&keyword);

        assert_eq!(links.len(), 2);
        assert_eq!(
            links[0].url,
            "https://www.instagram.com/explore/search/keyword/?q=cats"
        );
        assert_eq!(links[0].source, Platform::Instagram);
        assert_eq!(links[1].url, "https://t.me/s/cats");
        assert_eq!(links[1].source, Platform::Telegram);
        assert_eq!(links[1].title, "Telegram results");
        assert_eq!(links[1].subtitle, "for “cats”");
    }

    #[test]
    fn encodes_like_encode_uri_component() {
        assert_eq!(encode_component("new york"), "new%20york");
        assert_eq!(encode_component("a&b=c/d?"), "a%26b%3Dc%2Fd%3F");
        assert_eq!(encode_component("it's-(ok)_!~*."), "it's-(ok)_!~*.");
        assert_eq!(encode_component("Тошкент"), "%D0%A2%D0%BE%D1%88%D0%BA%D0%B5%D0%BD%D1%82");
    }

    #[test]
    fn links_are_deterministic() {
        let keyword = Keyword::parse("Samarqand bozori").unwrap();
        assert_eq!(build_result_links(&keyword), build_result_links(&keyword));
    }
}
