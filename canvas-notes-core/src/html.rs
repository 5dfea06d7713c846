//! A small regex-driven HTML to markdown converter.
//!
//! Canvas descriptions come out of a rich-text editor and stick to a narrow
//! tag set, so a full HTML parser is not needed. Anything not handled below is
//! stripped to its text content.

use std::sync::OnceLock;

use regex::Regex;

use crate::contract::HtmlConverter;

#[derive(Debug, Clone, Copy, Default)]
pub struct RegexHtmlConverter;

struct Rules {
    heading: Regex,
    bold: Regex,
    italic: Regex,
    code: Regex,
    link: Regex,
    list_item: Regex,
    line_break: Regex,
    block_end: Regex,
    any_tag: Regex,
    blank_lines: Regex,
}

fn rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("html rule is a valid regex");
        Rules {
            heading: re(r"(?is)<h([1-6])[^>]*>(.*?)</h[1-6]>"),
            bold: re(r"(?is)<(?:b|strong)(?:\s[^>]*)?>(.*?)</(?:b|strong)>"),
            italic: re(r"(?is)<(?:i|em)(?:\s[^>]*)?>(.*?)</(?:i|em)>"),
            code: re(r"(?is)<code[^>]*>(.*?)</code>"),
            link: re(r#"(?is)<a\s[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#),
            list_item: re(r"(?is)<li[^>]*>(.*?)</li>"),
            line_break: re(r"(?i)<br\s*/?>"),
            block_end: re(r"(?i)</(?:p|div|ul|ol|table|tr)>"),
            any_tag: re(r"(?s)<[^>]+>"),
            blank_lines: re(r"\n{3,}"),
        }
    })
}

impl HtmlConverter for RegexHtmlConverter {
    fn to_markdown(&self, html: &str) -> String {
        let r = rules();
        let mut text = html.replace("\r\n", "\n");

        text = r
            .heading
            .replace_all(&text, |caps: &regex::Captures| {
                let level = caps[1].parse::<usize>().unwrap_or(2);
                format!("\n{} {}\n", "#".repeat(level), caps[2].trim())
            })
            .into_owned();
        text = r.bold.replace_all(&text, "**$1**").into_owned();
        text = r.italic.replace_all(&text, "*$1*").into_owned();
        text = r.code.replace_all(&text, "`$1`").into_owned();
        text = r.link.replace_all(&text, "[$2]($1)").into_owned();
        text = r.list_item.replace_all(&text, "\n- $1").into_owned();
        text = r.line_break.replace_all(&text, "\n").into_owned();
        text = r.block_end.replace_all(&text, "\n\n").into_owned();
        text = r.any_tag.replace_all(&text, "").into_owned();

        text = text
            .replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&");

        r.blank_lines
            .replace_all(text.trim(), "\n\n")
            .into_owned()
    }
}
