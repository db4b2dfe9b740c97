//! Markup scanning: visible text plus element `id` / `name` attributes.
//!
//! A forgiving single-pass scanner. Text nodes are trimmed and joined with a
//! single space; `script`, `style` and `template` contents are not visible.
//! Unterminated tags and comments consume the rest of the input.

/// Result of scanning a markup document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkupScan {
    /// Visible text, one space between text nodes
    pub text: String,

    /// Non-empty `id` attribute values in document order
    pub ids: Vec<String>,

    /// Non-empty `name` attribute values in document order
    pub names: Vec<String>,
}

const HIDDEN_ELEMENTS: [&str; 3] = ["script", "style", "template"];

/// Scan `html` for visible text and element identifiers.
pub fn scan_markup(html: &str) -> MarkupScan {
    let mut scan = MarkupScan::default();
    let mut nodes: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut hidden: Option<String> = None;
    let mut rest = html;

    while let Some(lt) = rest.find('<') {
        if hidden.is_none() {
            current.push_str(&rest[..lt]);
        }
        rest = &rest[lt..];

        if rest.starts_with("<!--") {
            let end = rest.find("-->").map(|i| i + 3).unwrap_or(rest.len());
            rest = &rest[end..];
            continue;
        }

        let opens_tag = rest[1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'));
        if !opens_tag {
            if hidden.is_none() {
                current.push('<');
            }
            rest = &rest[1..];
            continue;
        }

        let end = tag_end(rest);
        let tag = &rest[1..end];
        rest = if end < rest.len() { &rest[end + 1..] } else { "" };

        if let Some(closing) = tag.strip_prefix('/') {
            let name = tag_name(closing);
            if hidden.as_deref() == Some(name.as_str()) {
                hidden = None;
            }
            flush(&mut current, &mut nodes);
            continue;
        }

        if tag.starts_with('!') || tag.starts_with('?') || hidden.is_some() {
            continue;
        }

        flush(&mut current, &mut nodes);

        let name = tag_name(tag);
        for (attr, value) in attributes(tag) {
            if value.is_empty() {
                continue;
            }
            match attr.as_str() {
                "id" => scan.ids.push(value),
                "name" => scan.names.push(value),
                _ => {}
            }
        }

        if HIDDEN_ELEMENTS.contains(&name.as_str()) && !tag.trim_end().ends_with('/') {
            hidden = Some(name);
        }
    }

    if hidden.is_none() {
        current.push_str(rest);
    }
    flush(&mut current, &mut nodes);

    scan.text = nodes.join(" ");
    scan
}

/// Visible text of `html`.
pub fn visible_text(html: &str) -> String {
    scan_markup(html).text
}

fn flush(current: &mut String, nodes: &mut Vec<String>) {
    let decoded = decode_entities(current.trim());
    let trimmed = decoded.trim();
    if !trimmed.is_empty() {
        nodes.push(trimmed.to_string());
    }
    current.clear();
}

/// Byte index of the `>` closing the tag that starts `s`, or `s.len()`.
fn tag_end(s: &str) -> usize {
    let mut quote: Option<u8> = None;
    for (i, b) in s.bytes().enumerate().skip(1) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return i,
            None => {}
        }
    }
    s.len()
}

fn tag_name(tag: &str) -> String {
    tag.trim_start()
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != '/' && *c != '>')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Parse `name[=value]` pairs following the tag name.
fn attributes(tag: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let body = tag.trim_start();
    let mut chars = body
        .char_indices()
        .skip_while(|(_, c)| !c.is_whitespace())
        .peekable();

    loop {
        while chars.next_if(|(_, c)| c.is_whitespace() || *c == '/').is_some() {}

        let mut name = String::new();
        while let Some((_, c)) = chars.next_if(|(_, c)| !c.is_whitespace() && !matches!(c, '=' | '/')) {
            name.push(c);
        }
        if name.is_empty() {
            break;
        }

        while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}

        let mut value = String::new();
        if chars.next_if(|(_, c)| *c == '=').is_some() {
            while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
            match chars.peek().map(|(_, c)| *c) {
                Some(q @ ('"' | '\'')) => {
                    chars.next();
                    for (_, c) in chars.by_ref() {
                        if c == q {
                            break;
                        }
                        value.push(c);
                    }
                }
                _ => {
                    while let Some((_, c)) = chars.next_if(|(_, c)| !c.is_whitespace()) {
                        value.push(c);
                    }
                }
            }
        }

        attrs.push((name.to_ascii_lowercase(), decode_entities(value.trim())));
    }

    attrs
}

/// Decode the handful of character references common in hand-written pages.
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest[1..].find(';').filter(|i| *i <= 10).and_then(|semi| {
            let entity = &rest[1..=semi];
            decode_entity(entity).map(|c| (c, semi + 2))
        });

        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKOUT: &str = r#"<!DOCTYPE html>
<html>
<head><title>Checkout</title>
<style>body { color: red; }</style>
<script>var x = "<b>not text</b>";</script>
</head>
<body>
  <h1>Checkout</h1>
  <!-- promo section -->
  <label for="discount_code">Discount code</label>
  <input id="discount_code" name="discount" type="text">
  <button id='apply_coupon' class="btn">Apply</button>
  <input id=email name=email>
  <div id="">empty id</div>
  <p>Fish &amp; chips &lt;3</p>
</body>
</html>"#;

    #[test]
    fn test_visible_text_strips_markup() {
        let text = visible_text("<html><body><p>Hello <b>world</b></p></body></html>");
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn test_scan_checkout_page() {
        let scan = scan_markup(CHECKOUT);
        assert_eq!(scan.ids, vec!["discount_code", "apply_coupon", "email"]);
        assert_eq!(scan.names, vec!["discount", "email"]);
        assert_eq!(
            scan.text,
            "Checkout Checkout Discount code Apply empty id Fish & chips <3"
        );
    }

    #[test]
    fn test_hidden_elements_excluded() {
        let text = visible_text("<p>a</p><script>if (a < b) {}</script><p>b</p>");
        assert_eq!(text, "a b");
    }

    #[test]
    fn test_stray_angle_bracket_is_text() {
        assert_eq!(visible_text("<p>1 < 2</p>"), "1 < 2");
    }

    #[test]
    fn test_quoted_gt_inside_attribute() {
        let scan = scan_markup(r#"<input id="a>b" value="x"><span>ok</span>"#);
        assert_eq!(scan.ids, vec!["a>b"]);
        assert_eq!(scan.text, "ok");
    }

    #[test]
    fn test_unterminated_input_does_not_panic() {
        let scan = scan_markup("<div id=\"open\" <p>text <!-- never closed");
        assert!(scan.text.is_empty() || scan.text.contains("text"));
        assert_eq!(visible_text(""), "");
        assert_eq!(visible_text("plain text only"), "plain text only");
    }

    #[test]
    fn test_numeric_entities() {
        assert_eq!(decode_entities("&#65;&#x42;&unknown; &"), "AB&unknown; &");
    }
}
