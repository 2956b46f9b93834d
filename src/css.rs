//! Stylesheet model and a tolerant CSS text parser.
//!
//! The minifier only needs an in-memory rule list it can mutate in
//! place: ordered selector strings per rule, declarations, and at-rule
//! pass-through. Anything it cannot make sense of is skipped, never an
//! error; a stylesheet with nothing parseable at all is `None` and the
//! caller drops the `<style>` element.

/// A single `property: value` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// A style rule: mutable ordered selector list plus declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct CssRule {
    pub selectors: Vec<String>,
    pub declarations: Vec<Declaration>,
}

/// Body of an at-rule.
#[derive(Debug, Clone, PartialEq)]
pub enum AtBlock {
    /// `@import`/`@charset` — no block at all.
    None,
    /// `@media`/`@supports` — nested rules the rewriters must see.
    Rules(Vec<CssItem>),
    /// `@keyframes`/`@font-face`/unknown — kept verbatim.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CssItem {
    Rule(CssRule),
    AtRule {
        name: String,
        prelude: String,
        block: AtBlock,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stylesheet {
    pub items: Vec<CssItem>,
}

impl Stylesheet {
    /// Visit every style rule, including rules nested in at-rules.
    pub fn for_each_rule_mut(&mut self, mut f: impl FnMut(&mut CssRule)) {
        fn walk(items: &mut Vec<CssItem>, f: &mut impl FnMut(&mut CssRule)) {
            for item in items {
                match item {
                    CssItem::Rule(rule) => f(rule),
                    CssItem::AtRule {
                        block: AtBlock::Rules(sub),
                        ..
                    } => walk(sub, f),
                    _ => {}
                }
            }
        }
        walk(&mut self.items, &mut f);
    }

    /// Keep only the rules the predicate approves of, recursing into
    /// nested at-rule blocks. Used to delete rules whose selector list
    /// has been emptied by the identifier rewriter.
    pub fn retain_rules(&mut self, mut f: impl FnMut(&mut CssRule) -> bool) {
        fn walk(items: &mut Vec<CssItem>, f: &mut impl FnMut(&mut CssRule) -> bool) {
            items.retain_mut(|item| match item {
                CssItem::Rule(rule) => f(rule),
                CssItem::AtRule {
                    block: AtBlock::Rules(sub),
                    ..
                } => {
                    walk(sub, f);
                    true
                }
                _ => true,
            });
        }
        walk(&mut self.items, &mut f);
    }

    /// Flattened view of all style rules in source order.
    pub fn rules(&self) -> Vec<&CssRule> {
        fn walk<'a>(items: &'a [CssItem], out: &mut Vec<&'a CssRule>) {
            for item in items {
                match item {
                    CssItem::Rule(rule) => out.push(rule),
                    CssItem::AtRule {
                        block: AtBlock::Rules(sub),
                        ..
                    } => walk(sub, out),
                    _ => {}
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.items, &mut out);
        out
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Serialize back to minified CSS text.
    pub fn to_css(&self) -> String {
        fn write_items(items: &[CssItem], out: &mut String) {
            for item in items {
                match item {
                    CssItem::Rule(rule) => {
                        out.push_str(&rule.selectors.join(","));
                        out.push('{');
                        out.push_str(&declarations_to_css(&rule.declarations));
                        out.push('}');
                    }
                    CssItem::AtRule {
                        name,
                        prelude,
                        block,
                    } => {
                        out.push('@');
                        out.push_str(name);
                        if !prelude.is_empty() {
                            out.push(' ');
                            out.push_str(prelude);
                        }
                        match block {
                            AtBlock::None => out.push(';'),
                            AtBlock::Rules(sub) => {
                                out.push('{');
                                write_items(sub, out);
                                out.push('}');
                            }
                            AtBlock::Raw(raw) => {
                                out.push('{');
                                out.push_str(raw);
                                out.push('}');
                            }
                        }
                    }
                }
            }
        }
        let mut out = String::new();
        write_items(&self.items, &mut out);
        out
    }
}

/// Serialize a declaration list to `p:v;p:v!important` form.
pub fn declarations_to_css(decls: &[Declaration]) -> String {
    let mut out = String::new();
    for decl in decls {
        if !out.is_empty() {
            out.push(';');
        }
        out.push_str(&decl.property);
        out.push(':');
        out.push_str(&decl.value);
        if decl.important {
            out.push_str("!important");
        }
    }
    out
}

/// Parse the declarations of a `style` attribute or rule body.
/// Empty properties/values and dangling fragments are dropped.
pub fn parse_declarations(text: &str) -> Vec<Declaration> {
    let mut decls = Vec::new();
    for part in text.split(';') {
        let Some((property, value)) = part.split_once(':') else {
            continue;
        };
        let property = property.trim();
        let mut value = value.trim();
        let mut important = false;
        if let Some(stripped) = strip_important(value) {
            important = true;
            value = stripped;
        }
        if property.is_empty() || value.is_empty() {
            continue;
        }
        decls.push(Declaration {
            property: property.to_string(),
            value: value.to_string(),
            important,
        });
    }
    decls
}

fn strip_important(value: &str) -> Option<&str> {
    let bang = value.rfind('!')?;
    let tail = value[bang + 1..].trim();
    if tail.eq_ignore_ascii_case("important") {
        Some(value[..bang].trim_end())
    } else {
        None
    }
}

/// Parse a `<style>` block. Returns `None` when nothing usable was
/// found, which callers treat as "no stylesheet".
pub fn parse_stylesheet(text: &str) -> Option<Stylesheet> {
    let text = strip_comments(text);
    let mut parser = CssParser {
        input: &text,
        pos: 0,
    };
    let items = parser.parse_items(false);
    if items.is_empty() {
        None
    } else {
        Some(Stylesheet { items })
    }
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

struct CssParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> CssParser<'a> {
    fn parse_items(&mut self, nested: bool) -> Vec<CssItem> {
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some('}') if nested => {
                    self.bump();
                    break;
                }
                Some('@') => {
                    self.bump();
                    if let Some(item) = self.parse_at_rule() {
                        items.push(item);
                    }
                }
                _ => {
                    let Some(rule) = self.parse_rule() else {
                        // No `{` ahead: the remainder is not CSS we
                        // understand, stop here and keep what we have.
                        break;
                    };
                    if let Some(rule) = rule {
                        items.push(CssItem::Rule(rule));
                    }
                }
            }
        }
        items
    }

    fn parse_at_rule(&mut self) -> Option<CssItem> {
        let name = self.take_while(|c| c.is_ascii_alphanumeric() || c == '-');
        let prelude = self.take_while(|c| c != '{' && c != ';').trim().to_string();
        match self.peek() {
            Some(';') => {
                self.bump();
                Some(CssItem::AtRule {
                    name,
                    prelude,
                    block: AtBlock::None,
                })
            }
            Some('{') => {
                self.bump();
                let block = if name == "media" || name == "supports" {
                    AtBlock::Rules(self.parse_items(true))
                } else {
                    AtBlock::Raw(self.take_balanced_block())
                };
                Some(CssItem::AtRule {
                    name,
                    prelude,
                    block,
                })
            }
            // the prelude scan only stops at `;`, `{`, or EOF
            _ => None,
        }
    }

    /// `Ok(None)` would read better but this returns:
    /// outer `None` = no block found (abort), inner `None` = skip.
    fn parse_rule(&mut self) -> Option<Option<CssRule>> {
        let selector_text = self.take_while(|c| c != '{');
        if self.peek() != Some('{') {
            return None;
        }
        self.bump();
        let body = self.take_while(|c| c != '}');
        if self.peek() == Some('}') {
            self.bump();
        }

        let selectors: Vec<String> = selector_text
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
        if selectors.is_empty() {
            return Some(None);
        }
        Some(Some(CssRule {
            selectors,
            declarations: parse_declarations(&body),
        }))
    }

    /// Consume up to and including the `}` matching the already-consumed
    /// `{`, returning the trimmed interior text.
    fn take_balanced_block(&mut self) -> String {
        let start = self.pos;
        let mut depth = 1usize;
        while let Some(c) = self.peek() {
            if c == '{' {
                depth += 1;
            } else if c == '}' {
                depth -= 1;
                if depth == 0 {
                    let inner = self.input[start..self.pos].trim().to_string();
                    self.bump();
                    return inner;
                }
            }
            self.bump();
        }
        self.input[start..].trim().to_string()
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
        self.input[start..self.pos].to_string()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.bump();
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_rule() {
        let sheet = parse_stylesheet(".a { fill: red; stroke: blue }").unwrap();
        assert_eq!(sheet.rules().len(), 1);
        let rule = sheet.rules()[0].clone();
        assert_eq!(rule.selectors, vec![".a"]);
        assert_eq!(rule.declarations.len(), 2);
        assert_eq!(rule.declarations[0].property, "fill");
        assert_eq!(rule.declarations[0].value, "red");
    }

    #[test]
    fn test_parse_selector_list_and_important() {
        let sheet = parse_stylesheet(".a, .b { fill: red !important }").unwrap();
        let rule = sheet.rules()[0].clone();
        assert_eq!(rule.selectors, vec![".a", ".b"]);
        assert!(rule.declarations[0].important);
        assert_eq!(rule.declarations[0].value, "red");
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert!(parse_stylesheet("test").is_none());
        assert!(parse_stylesheet("   ").is_none());
        assert!(parse_stylesheet("/* only a comment */").is_none());
    }

    #[test]
    fn test_garbage_after_rules_is_ignored() {
        let sheet = parse_stylesheet(".a{fill:red} test").unwrap();
        assert_eq!(sheet.rules().len(), 1);
    }

    #[test]
    fn test_at_rules() {
        let css = "@charset 'utf-8';@media screen{.a{fill:red}}@keyframes k{0%{opacity:0}}";
        let sheet = parse_stylesheet(css).unwrap();
        assert_eq!(sheet.items.len(), 3);
        // nested rule is visible to the walkers
        assert_eq!(sheet.rules().len(), 1);
        assert_eq!(
            sheet.to_css(),
            "@charset 'utf-8';@media screen{.a{fill:red}}@keyframes k{0%{opacity:0}}"
        );
    }

    #[test]
    fn test_to_css_minifies() {
        let sheet = parse_stylesheet(".a { fill : red ; }\n.b{stroke:blue!important}").unwrap();
        assert_eq!(sheet.to_css(), ".a{fill:red}.b{stroke:blue!important}");
    }

    #[test]
    fn test_retain_rules_drops_empty() {
        let mut sheet = parse_stylesheet(".a{fill:red}.b{stroke:blue}").unwrap();
        sheet.retain_rules(|rule| rule.selectors != vec![".b"]);
        assert_eq!(sheet.to_css(), ".a{fill:red}");
    }

    #[test]
    fn test_parse_declarations_drops_empty_values() {
        let decls = parse_declarations("display:;fill:red;;broken");
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].property, "fill");
    }
}
