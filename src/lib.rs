//! # Newsletter mail formatter (nlfmt)
//!
//! Core text transformations behind the `nlfmt` command-line tool: a
//! plain-text line wrapper for Japanese mail, a small catalog of
//! text-correction rules, and the template assembly that produces the
//! newsletter body.
//!
//! ## Key Components
//!
//! - **Width Classifier**: decides whether a character takes one or two
//!   columns in a fixed-width mail client.
//! - **Line Wrapper**: reflows text to a column budget, keeping ASCII words
//!   whole and applying kinsoku rules (characters that may not start or end
//!   a line, and punctuation that may hang past the margin).
//! - **Text Rules**: a table of regex-driven corrections (full-width
//!   alphanumerics, blank lines between paragraphs, paragraph indentation,
//!   punctuation style, URL shape, parentheses width).
//! - **Rule Engine**: counts the issues a set of rules finds in a text and
//!   applies a rule's fix, returning a new string.
//! - **Template Substitution**: fills the newsletter template from
//!   [`NewsletterData`] and optionally wraps the result.
//!
//! ## Data Flow
//!
//! ```text
//! NewsletterData ─→ generate_newsletter ─→ text ─→ scan / apply_fix ─→ wrap ─→ mail body
//! ```
//!
//! Everything here is a pure function of its inputs. Nothing is cached and
//! nothing does I/O.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

// ─────────────────────────────────────────────────────────────────────────────
// Width Classifier
// ─────────────────────────────────────────────────────────────────────────────

/// Codepoint ranges rendered at double width by Japanese mail fonts.
const WIDE_RANGES: &[(char, char)] = &[
    ('\u{2500}', '\u{257F}'),   // Box drawing
    ('\u{3000}', '\u{9FFF}'),   // CJK symbols, kana, unified ideographs
    ('\u{F900}', '\u{FAFF}'),   // CJK compatibility ideographs
    ('\u{FF00}', '\u{FFEF}'),   // Halfwidth and fullwidth forms
    ('\u{20000}', '\u{2A6DF}'), // Extension B
    ('\u{2A700}', '\u{2B73F}'), // Extension C
    ('\u{2B740}', '\u{2B81F}'), // Extension D
    ('\u{2B820}', '\u{2CEAF}'), // Extension E
    ('\u{2CEB0}', '\u{2EBEF}'), // Extension F
];

/// Latin-1 and Latin Extended symbols that the same fonts draw full-width.
const WIDE_SYMBOLS: &[char] = &[
    '¡', '¤', '§', '¨', 'ª', '\u{AD}', '®', '°', '±', '´', '¶', '·', '¸', 'º', '¼', '½', '¾', '¿',
    'Æ', 'Ð', '×', 'Ø', 'Þ', 'ß', 'æ', 'ç', 'ð', '÷', 'ø', 'þ', 'Ĳ', 'œ',
];

/// Returns `true` when `c` occupies two columns in a fixed-width mail client.
///
/// The classification follows what common Japanese mail fonts do rather
/// than Unicode East Asian Width: box drawing and a handful of Latin-1
/// symbols count as wide, and the whole `U+FF00..=U+FFEF` block is wide.
///
/// # Examples
///
/// ```
/// assert!(nlfmt::is_wide('あ'));
/// assert!(nlfmt::is_wide('Ａ'));
/// assert!(!nlfmt::is_wide('A'));
/// ```
pub fn is_wide(c: char) -> bool {
    if c.is_ascii() {
        return false;
    }
    WIDE_RANGES
        .iter()
        .any(|&(lo, hi)| (lo..=hi).contains(&c))
        || WIDE_SYMBOLS.contains(&c)
}

/// Column width of a single character: 2 for wide characters, 1 otherwise.
pub fn char_width(c: char) -> usize {
    if is_wide(c) { 2 } else { 1 }
}

/// Column width of a string.
///
/// ```text
/// display_width("Hello")     == 5
/// display_width("見本")      == 4
/// display_width("ABC１２３") == 9
/// ```
pub fn display_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

// ─────────────────────────────────────────────────────────────────────────────
// Format Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Default column budget per line (counted in half-width columns).
pub const DEFAULT_MAX_CHARS_PER_LINE: usize = 75;

/// Default hanging punctuation.
pub const DEFAULT_DROP_CHARS: &str = ";・.､｡、。，．｣」』）〕］｝〉】";

/// Default characters that may not begin a line.
pub const DEFAULT_LINE_START_FORBID_CHARS: &str =
    "]}):;?!ﾞﾟ”･~：；？！゛゜‐'\"）〕］｝〉」』】";

/// Default characters that may not end a line.
pub const DEFAULT_LINE_END_FORBID_CHARS: &str = "[{('\"“（〔［｛〈「『【「";

/// Settings for [`wrap`].
///
/// The three character fields are sets: every character in the string is a
/// member, order and duplicates do not matter. Leaving them empty turns the
/// wrapper into plain greedy breaking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatSettings {
    /// Column budget per line, in half-width columns.
    pub max_chars_per_line: usize,
    /// Characters allowed to hang past the right margin.
    pub drop_chars: String,
    /// Characters that must never begin a line.
    pub line_start_forbid_chars: String,
    /// Characters that must never end a line.
    pub line_end_forbid_chars: String,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            max_chars_per_line: DEFAULT_MAX_CHARS_PER_LINE,
            drop_chars: DEFAULT_DROP_CHARS.to_string(),
            line_start_forbid_chars: DEFAULT_LINE_START_FORBID_CHARS.to_string(),
            line_end_forbid_chars: DEFAULT_LINE_END_FORBID_CHARS.to_string(),
        }
    }
}

impl FormatSettings {
    /// Settings with the given budget and no kinsoku characters at all.
    pub fn plain(max_chars_per_line: usize) -> Self {
        Self {
            max_chars_per_line,
            drop_chars: String::new(),
            line_start_forbid_chars: String::new(),
            line_end_forbid_chars: String::new(),
        }
    }

    /// Whether `c` may hang past the margin.
    pub fn is_drop_char(&self, c: char) -> bool {
        self.drop_chars.contains(c)
    }

    /// Whether `c` may not begin a line.
    pub fn forbids_line_start(&self, c: char) -> bool {
        self.line_start_forbid_chars.contains(c)
    }

    /// Whether `c` may not end a line.
    pub fn forbids_line_end(&self, c: char) -> bool {
        self.line_end_forbid_chars.contains(c)
    }

    /// Column budget actually used by the wrapper. A zero budget is clamped
    /// to one so every line still receives at least one character.
    fn budget(&self) -> usize {
        self.max_chars_per_line.max(1)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Line Wrapper
// ─────────────────────────────────────────────────────────────────────────────

/// Characters that make up an atomic word: ASCII letters, digits, hyphen,
/// apostrophe and period. Runs of these are never split across lines.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '\'' | '.')
}

/// Accumulates output lines for one input line.
struct LineBuilder<'a> {
    lines: &'a mut Vec<String>,
    current: String,
    width: usize,
}

impl<'a> LineBuilder<'a> {
    fn new(lines: &'a mut Vec<String>) -> Self {
        Self {
            lines,
            current: String::new(),
            width: 0,
        }
    }

    fn push(&mut self, c: char) {
        self.current.push(c);
        self.width += char_width(c);
    }

    fn push_word(&mut self, word: &[char], word_width: usize) {
        self.current.extend(word);
        self.width += word_width;
    }

    /// Ends the current line. A break with nothing accumulated emits no line.
    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(std::mem::take(&mut self.current));
        }
        self.width = 0;
    }

    /// Ends the current line but carries its last character over when that
    /// character may not end a line.
    fn flush_keeping_open_bracket(&mut self, settings: &FormatSettings) {
        match self.current.pop() {
            Some(last) if settings.forbids_line_end(last) => {
                self.flush();
                self.push(last);
            }
            Some(last) => {
                self.current.push(last);
                self.flush();
            }
            None => self.flush(),
        }
    }
}

/// Wrap a single non-empty line, appending the produced lines to `out`.
fn wrap_line(line: &str, settings: &FormatSettings, out: &mut Vec<String>) {
    let max = settings.budget();
    let chars: Vec<char> = line.chars().collect();
    let mut builder = LineBuilder::new(out);
    let mut i = 0;

    while i < chars.len() {
        let word_len = chars[i..].iter().take_while(|&&c| is_word_char(c)).count();
        if word_len > 0 {
            let word = &chars[i..i + word_len];
            let word_width: usize = word.iter().copied().map(char_width).sum();
            if builder.width + word_width > max && builder.width > 0 {
                builder.flush_keeping_open_bracket(settings);
            }
            builder.push_word(word, word_width);
            i += word_len;
            continue;
        }

        let c = chars[i];
        let width = char_width(c);

        // Hanging punctuation stays on this line even past the margin.
        if settings.is_drop_char(c) && builder.width + width > max {
            builder.push(c);
            builder.flush();
            i += 1;
            continue;
        }

        if let Some(&next) = chars.get(i + 1) {
            if settings.forbids_line_start(next) && builder.width + width + char_width(next) > max {
                builder.flush();
                builder.push(c);
                builder.push(next);
                i += 2;
                continue;
            }
        }

        if settings.forbids_line_end(c) && builder.width + width >= max {
            builder.flush();
            builder.push(c);
            i += 1;
            continue;
        }

        if builder.width + width > max {
            builder.flush();
        }
        builder.push(c);
        i += 1;
    }

    builder.flush();
}

/// Reflow `text` for a plain-text mail body.
///
/// Each input line (split on `\n`) is wrapped independently; empty lines are
/// kept as they are. Every character of the input appears in the output
/// exactly once and in the same order. Only line breaks are added.
///
/// Lines never exceed `settings.max_chars_per_line` columns, except when
/// they end in a hanging drop character, or when a single atomic word or
/// character is wider than the whole budget and sits alone on its line.
///
/// Re-wrapping already wrapped text is not idempotent in general: the breaks
/// inserted the first time become hard line boundaries the second time.
///
/// # Examples
///
/// ```
/// use nlfmt::{FormatSettings, wrap};
///
/// let settings = FormatSettings {
///     drop_chars: "。".to_string(),
///     ..FormatSettings::plain(10)
/// };
/// assert_eq!(
///     wrap("あいうえおかきくけこ。", &settings),
///     "あいうえお\nかきくけこ。"
/// );
/// ```
pub fn wrap(text: &str, settings: &FormatSettings) -> String {
    let mut lines = Vec::new();
    for line in text.split('\n') {
        if line.is_empty() {
            lines.push(String::new());
        } else {
            wrap_line(line, settings, &mut lines);
        }
    }
    lines.join("\n")
}

// ─────────────────────────────────────────────────────────────────────────────
// Text Rules
// ─────────────────────────────────────────────────────────────────────────────

/// Per-match fix. `None` leaves that particular match untouched.
pub type FixFn = fn(&Captures<'_>) -> Option<String>;

/// Custom issue counter over the matched strings of a rule.
pub type IssueCounter = fn(&[&str]) -> usize;

/// How a rule rewrites its matches.
#[derive(Debug, Clone, Copy)]
pub enum Replacement {
    /// Replacement template; `$1`, `${name}` refer to capture groups.
    Literal(&'static str),
    /// Computed replacement, called once per match.
    Function(FixFn),
}

/// A text-correction rule: a pattern plus an optional fix.
#[derive(Debug, Clone)]
pub struct TextRule {
    /// Stable identifier, e.g. `paragraph-spacing`.
    pub id: &'static str,
    /// Short display name.
    pub name: &'static str,
    /// One-line explanation of what the rule changes.
    pub description: &'static str,
    /// Pattern matched globally against the text.
    pub pattern: Regex,
    /// Fix applied by [`apply_fix`]; `None` makes the rule report-only.
    pub replace: Option<Replacement>,
    /// Overrides the default issue count.
    pub detect_issues: Option<IssueCounter>,
}

impl TextRule {
    /// Whether [`apply_fix`] can change anything for this rule.
    pub fn is_fixable(&self) -> bool {
        self.replace.is_some()
    }
}

/// Offset between full-width ASCII variants (U+FF01..) and ASCII.
const FULL_WIDTH_OFFSET: u32 = 0xFEE0;

static FILE_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/[^/]+\.[^/]+$").expect("file segment pattern must compile"));

fn to_half_width(caps: &Captures<'_>) -> Option<String> {
    caps[0]
        .chars()
        .map(|c| char::from_u32(c as u32 - FULL_WIDTH_OFFSET))
        .collect()
}

fn indent_paragraph(caps: &Captures<'_>) -> Option<String> {
    Some(format!("{}\u{3000}{}{}", &caps[1], &caps[2], &caps[3]))
}

fn house_punctuation(caps: &Captures<'_>) -> Option<String> {
    let fixed = match &caps[0] {
        "、" => "，",
        "。" => "．",
        other => other,
    };
    Some(fixed.to_string())
}

fn fix_url(caps: &Captures<'_>) -> Option<String> {
    canonical_url(&caps[0])
}

fn full_width_parens(caps: &Captures<'_>) -> Option<String> {
    let mut inner = caps[0].chars();
    inner.next();
    inner.next_back();
    Some(format!("（{}）", inner.as_str()))
}

/// Canonical form of a URL, or `None` when it is already canonical.
///
/// A trailing `/index.html` is dropped. A trailing slash is then added
/// unless the URL already ends with one, carries a query string, or its last
/// path segment looks like a file name (`name.ext`). Note that a bare host
/// such as `http://example.com` counts as `name.ext` and gets no slash.
///
/// ```
/// use nlfmt::canonical_url;
///
/// assert_eq!(canonical_url("http://example.com/page").as_deref(), Some("http://example.com/page/"));
/// assert_eq!(canonical_url("http://example.com/index.html").as_deref(), Some("http://example.com"));
/// assert_eq!(canonical_url("http://example.com/page?x=1"), None);
/// ```
pub fn canonical_url(url: &str) -> Option<String> {
    let base = url.strip_suffix("/index.html").unwrap_or(url);
    let needs_slash = !base.ends_with('/') && !base.contains('?') && !FILE_SEGMENT.is_match(base);
    let canonical = if needs_slash {
        format!("{base}/")
    } else {
        base.to_string()
    };
    (canonical != url).then_some(canonical)
}

fn rule(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    pattern: &str,
    replace: Replacement,
) -> TextRule {
    TextRule {
        id,
        name,
        description,
        pattern: Regex::new(pattern).expect("rule pattern must compile"),
        replace: Some(replace),
        detect_issues: None,
    }
}

static CATALOG: LazyLock<Vec<TextRule>> = LazyLock::new(|| {
    vec![
        rule(
            "full-width-alphanumeric",
            "Full-width alphanumerics",
            "Convert full-width letters and digits to half-width",
            r"[Ａ-Ｚａ-ｚ０-９]",
            Replacement::Function(to_half_width),
        ),
        rule(
            "paragraph-spacing",
            "Blank lines between paragraphs",
            "Remove blank lines between paragraphs",
            r"\n\s*\n",
            Replacement::Literal("\n"),
        ),
        rule(
            "paragraph-indent",
            "Paragraph indent",
            "Indent lines that contain a sentence with one full-width space",
            r"(^|\n)[ \t]*([^\x{3000}\s])([^\n]*?[。．.！!？?]+[^\n]*)",
            Replacement::Function(indent_paragraph),
        ),
        rule(
            "punctuation",
            "Punctuation",
            "Use ， and ． instead of 、 and 。",
            r"[、。]",
            Replacement::Function(house_punctuation),
        ),
        rule(
            "url-format",
            "URL format",
            "Drop /index.html and add a trailing slash to directory URLs",
            r#"https?://[^\s"'<>()\[\]{}]+"#,
            Replacement::Function(fix_url),
        ),
        rule(
            "parentheses-pair",
            "Mismatched parentheses",
            "Make parentheses that mix half-width and full-width both full-width",
            r"\([^)）]*）|（[^)）]*\)",
            Replacement::Function(full_width_parens),
        ),
        rule(
            "japanese-parentheses",
            "Parentheses around Japanese",
            "Use full-width parentheses around Japanese text",
            r"\([^)]*[\x{3040}-\x{309F}\x{30A0}-\x{30FF}\x{4E00}-\x{9FAF}][^)]*\)",
            Replacement::Function(full_width_parens),
        ),
    ]
});

/// All built-in rules, in their declared order.
pub fn catalog() -> &'static [TextRule] {
    &CATALOG
}

/// Look up a built-in rule by id.
pub fn find_rule(id: &str) -> Option<&'static TextRule> {
    catalog().iter().find(|rule| rule.id == id)
}

/// A rule id that is not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRuleError(pub String);

impl fmt::Display for UnknownRuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown text rule '{}'", self.0)
    }
}

impl std::error::Error for UnknownRuleError {}

/// Resolve rule ids to catalog entries, keeping the caller's order and
/// skipping repeated ids.
pub fn select_rules<I, S>(ids: I) -> Result<Vec<&'static TextRule>, UnknownRuleError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut selected: Vec<&'static TextRule> = Vec::new();
    for id in ids {
        let id = id.as_ref().trim();
        let rule = find_rule(id).ok_or_else(|| UnknownRuleError(id.to_string()))?;
        if !selected.iter().any(|r| r.id == rule.id) {
            selected.push(rule);
        }
    }
    Ok(selected)
}

// ─────────────────────────────────────────────────────────────────────────────
// Rule Engine
// ─────────────────────────────────────────────────────────────────────────────

/// Issues one rule found in one text.
#[derive(Debug, Clone, Copy)]
pub struct Issue<'r> {
    /// The rule that reported the issues.
    pub rule: &'r TextRule,
    /// Number of issues, always at least one.
    pub count: usize,
}

/// Number of issues `rule` finds in `text`.
///
/// A rule's `detect_issues` wins when present. Otherwise rules with a
/// computed fix count the matches the fix would actually change (so a URL
/// that is already canonical is not an issue), and every other rule counts
/// one issue per match.
pub fn count_issues(text: &str, rule: &TextRule) -> usize {
    if let Some(detect) = rule.detect_issues {
        let matches: Vec<&str> = rule.pattern.find_iter(text).map(|m| m.as_str()).collect();
        return detect(&matches);
    }

    match rule.replace {
        Some(Replacement::Function(fix)) => rule
            .pattern
            .captures_iter(text)
            .filter(|caps| fix(caps).is_some())
            .count(),
        _ => rule.pattern.find_iter(text).count(),
    }
}

/// Scan `text` with each rule, returning the rules that found something.
///
/// The result keeps the order of `rules`.
pub fn scan<'r, I>(text: &str, rules: I) -> Vec<Issue<'r>>
where
    I: IntoIterator<Item = &'r TextRule>,
{
    rules
        .into_iter()
        .map(|rule| Issue {
            rule,
            count: count_issues(text, rule),
        })
        .filter(|issue| issue.count > 0)
        .collect()
}

/// Apply one rule's fix to every match in `text`.
///
/// Matches for which a computed fix returns `None` are kept verbatim. A rule
/// without a fix returns the text unchanged.
pub fn apply_fix(text: &str, rule: &TextRule) -> String {
    match rule.replace {
        None => text.to_string(),
        Some(Replacement::Literal(template)) => {
            rule.pattern.replace_all(text, template).into_owned()
        }
        Some(Replacement::Function(fix)) => rule
            .pattern
            .replace_all(text, |caps: &Captures<'_>| {
                fix(caps).unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned(),
    }
}

/// Apply several fixes in order.
///
/// Returns the fixed text and, per rule that changed something, the number
/// of issues it addressed. Each rule sees the output of the previous one.
pub fn apply_fixes<'r, I>(text: &str, rules: I) -> (String, Vec<Issue<'r>>)
where
    I: IntoIterator<Item = &'r TextRule>,
{
    let mut fixed = text.to_string();
    let mut applied = Vec::new();
    for rule in rules.into_iter().filter(|rule| rule.is_fixable()) {
        let count = count_issues(&fixed, rule);
        if count > 0 {
            fixed = apply_fix(&fixed, rule);
            applied.push(Issue { rule, count });
        }
    }
    (fixed, applied)
}

// ─────────────────────────────────────────────────────────────────────────────
// Template Substitution
// ─────────────────────────────────────────────────────────────────────────────

/// `${vol}` is the publication year minus this.
const VOL_BASE_YEAR: i64 = 1995;

/// Frame line around each report heading.
const REPORT_FRAME: &str =
    "＋----------------------------------------------------------------------＋";

/// One participation report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportEntry {
    /// Report title.
    pub title: String,
    /// Affiliation and name of the author.
    pub author: String,
    /// Body text.
    pub content: String,
}

/// The form fields of one newsletter issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsletterData {
    /// Publication year, e.g. `"2024"`.
    pub publication_year: String,
    /// Issue month.
    pub no_month: String,
    /// Day of publication.
    pub publication_date: String,
    /// Editor in charge.
    pub editor_name: String,
    /// Participation reports, in order.
    pub reports: Vec<ReportEntry>,
    /// Hosted and co-hosted events.
    pub shusai_kyosai_events: String,
    /// Supported events.
    pub kyosan_events: String,
    /// Award announcements; blank removes the award section.
    pub awards: String,
    /// Journal calls for papers.
    pub journal_cfps: String,
    /// International calls for papers.
    pub international_cfps: String,
    /// International conferences.
    pub international_conferences: String,
}

/// Template texts.
#[derive(Debug, Clone, Default)]
pub struct Templates {
    /// The newsletter body with `${...}` placeholders.
    pub newsletter: String,
    /// Table-of-contents entry for the award section.
    pub award_toc: String,
    /// Award section; `${content}` receives the awards text.
    pub award: String,
}

/// Organization-wide values substituted into every issue.
#[derive(Debug, Clone, Default)]
pub struct TemplateVariables {
    /// Chair's greeting block.
    pub chair: String,
    /// Committee roster block.
    pub committee: String,
}

/// Errors from [`generate_newsletter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The newsletter template is empty.
    MissingTemplate,
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTemplate => write!(f, "newsletter template is empty"),
        }
    }
}

impl std::error::Error for TemplateError {}

fn placeholder(key: &str) -> String {
    format!("${{{key}}}")
}

fn starts_with_non_whitespace(line: &str) -> bool {
    line.chars().next().is_some_and(|c| !c.is_whitespace())
}

/// Remove award placeholders from a template when there are no awards.
///
/// Every line mentioning `${award_toc}` is deleted. A line mentioning
/// `${award}` is deleted together with the blank or indented lines after it,
/// up to the next line that starts with a non-whitespace character. When no
/// such line follows, the `${award}` line stays and is later substituted
/// with nothing.
fn remove_empty_award_lines(template: &str) -> String {
    let toc = placeholder("award_toc");
    let award = placeholder("award");

    let lines: Vec<&str> = template
        .split_inclusive('\n')
        .filter(|line| !line.contains(&toc))
        .collect();

    let mut result = String::with_capacity(template.len());
    let mut i = 0;
    while i < lines.len() {
        if lines[i].contains(&award) {
            let resume = (i + 1..lines.len()).find(|&j| starts_with_non_whitespace(lines[j]));
            if let Some(j) = resume {
                i = j;
                continue;
            }
        }
        result.push_str(lines[i]);
        i += 1;
    }
    result
}

fn report_title_list(reports: &[ReportEntry]) -> String {
    reports
        .iter()
        .map(|report| format!("　◆ {}\n　　{}", report.title, report.author))
        .collect::<Vec<_>>()
        .join("\n")
}

fn report_contents(reports: &[ReportEntry]) -> String {
    reports
        .iter()
        .map(|report| {
            format!(
                "{REPORT_FRAME}\n｜◆ {}\n{REPORT_FRAME}\n{}\n{}",
                report.title, report.author, report.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Leading integer of a year field (`"2024年"` reads as 2024).
fn leading_year(field: &str) -> Option<i64> {
    let field = field.trim();
    let digits = field
        .char_indices()
        .take_while(|&(i, c)| c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+')))
        .count();
    field[..digits].parse().ok()
}

/// Assemble the newsletter text.
///
/// Placeholders of the form `${field}` are replaced by the trimmed field
/// values, `${vol}` by the volume number (publication year minus 1995) and
/// `${chair}` / `${committee}` by the template variables. The result is
/// trimmed and, when `settings` is given, wrapped for mail.
pub fn generate_newsletter(
    data: &NewsletterData,
    templates: &Templates,
    vars: &TemplateVariables,
    settings: Option<&FormatSettings>,
) -> Result<String, TemplateError> {
    if templates.newsletter.is_empty() {
        return Err(TemplateError::MissingTemplate);
    }

    let has_awards = !data.awards.trim().is_empty();
    let mut result = if has_awards {
        templates.newsletter.clone()
    } else {
        remove_empty_award_lines(&templates.newsletter)
    };

    let (award_toc, award) = if has_awards {
        (
            templates.award_toc.clone(),
            templates.award.replacen(&placeholder("content"), &data.awards, 1),
        )
    } else {
        (String::new(), String::new())
    };

    let title_list = report_title_list(&data.reports);
    let contents = report_contents(&data.reports);

    // Values are trimmed, which also strips a leading U+3000 indent.
    let replacements: [(&str, &str); 13] = [
        ("publication_year", data.publication_year.as_str()),
        ("no_month", data.no_month.as_str()),
        ("publication_date", data.publication_date.as_str()),
        ("editor_name", data.editor_name.as_str()),
        ("shusai_kyosai_events", data.shusai_kyosai_events.as_str()),
        ("kyosan_events", data.kyosan_events.as_str()),
        ("journal_cfps", data.journal_cfps.as_str()),
        ("international_cfps", data.international_cfps.as_str()),
        ("international_conferences", data.international_conferences.as_str()),
        ("report_title_list", title_list.as_str()),
        ("report_contents", contents.as_str()),
        ("award_toc", award_toc.as_str()),
        ("award", award.as_str()),
    ];
    for (key, value) in replacements {
        result = result.replace(&placeholder(key), value.trim());
    }

    if let Some(vol) = leading_year(&data.publication_year)
        .and_then(|year| year.checked_sub(VOL_BASE_YEAR))
    {
        result = result.replace(&placeholder("vol"), &vol.to_string());
    }

    for (key, value) in [("chair", &vars.chair), ("committee", &vars.committee)] {
        result = result.replace(&placeholder(key), value.trim());
    }

    let result = result.trim();
    Ok(match settings {
        Some(settings) => wrap(result, settings),
        None => result.to_string(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_by_id(id: &str) -> &'static TextRule {
        find_rule(id).unwrap_or_else(|| panic!("missing rule {id}"))
    }

    fn without_newlines(s: &str) -> String {
        s.chars().filter(|&c| c != '\n').collect()
    }

    // =========================================================================
    // Width classifier
    // =========================================================================

    #[test]
    fn test_ascii_is_narrow() {
        for c in ['a', 'Z', '0', ' ', '~', '\t'] {
            assert!(!is_wide(c), "{c:?} should be narrow");
        }
    }

    #[test]
    fn test_japanese_is_wide() {
        for c in ['あ', 'ア', '漢', '　', '。', '「', 'Ａ', '１', '！'] {
            assert!(is_wide(c), "{c:?} should be wide");
        }
    }

    #[test]
    fn test_latin1_symbols() {
        assert!(is_wide('§'));
        assert!(is_wide('×'));
        assert!(is_wide('ß'));
        assert!(!is_wide('é'));
        assert!(!is_wide('ü'));
    }

    #[test]
    fn test_box_drawing_is_wide() {
        assert!(is_wide('─'));
        assert!(is_wide('│'));
    }

    #[test]
    fn test_supplementary_ideographs_are_wide() {
        // U+20B9F, extension B
        assert!(is_wide('𠮟'));
        assert_eq!(char_width('𠮟'), 2);
        assert!(is_wide('\u{2CEB0}'));
        assert!(!is_wide('\u{1F600}'));
    }

    #[test]
    fn test_display_width() {
        assert_eq!(display_width(""), 0);
        assert_eq!(display_width("Hello"), 5);
        assert_eq!(display_width("見本"), 4);
        assert_eq!(display_width("ABC１２３"), 9);
    }

    // =========================================================================
    // Line wrapper
    // =========================================================================

    #[test]
    fn test_wrap_hangs_drop_char() {
        let settings = FormatSettings {
            drop_chars: "。".to_string(),
            ..FormatSettings::plain(10)
        };
        assert_eq!(
            wrap("あいうえおかきくけこ。", &settings),
            "あいうえお\nかきくけこ。"
        );
    }

    #[test]
    fn test_wrap_short_line_unchanged() {
        let settings = FormatSettings::default();
        assert_eq!(wrap("短い行です。", &settings), "短い行です。");
    }

    #[test]
    fn test_wrap_keeps_empty_lines() {
        let settings = FormatSettings::plain(4);
        assert_eq!(wrap("ab\n\ncd", &settings), "ab\n\ncd");
        assert_eq!(wrap("", &settings), "");
        assert_eq!(wrap("\n", &settings), "\n");
    }

    #[test]
    fn test_wrap_whitespace_only_line_is_kept() {
        let settings = FormatSettings::plain(10);
        assert_eq!(wrap("a\n   \nb", &settings), "a\n   \nb");
    }

    #[test]
    fn test_wrap_greedy_wide() {
        let settings = FormatSettings::plain(6);
        assert_eq!(wrap("あいうえおか", &settings), "あいう\nえおか");
    }

    #[test]
    fn test_wrap_keeps_words_whole() {
        let settings = FormatSettings::plain(10);
        assert_eq!(wrap("abc hello world", &settings), "abc hello \nworld");
    }

    #[test]
    fn test_wrap_number_is_atomic() {
        let settings = FormatSettings::plain(9);
        assert_eq!(wrap("価格は3.14159円", &settings), "価格は\n3.14159円");
    }

    #[test]
    fn test_wrap_long_word_alone() {
        let settings = FormatSettings::plain(5);
        assert_eq!(wrap("ab verylongword", &settings), "ab \nverylongword");
        assert_eq!(wrap("verylongword", &settings), "verylongword");
    }

    #[test]
    fn test_wrap_carries_open_bracket_with_word() {
        let settings = FormatSettings {
            line_end_forbid_chars: "(".to_string(),
            ..FormatSettings::plain(10)
        };
        assert_eq!(wrap("abcdef (xyzw)", &settings), "abcdef \n(xyzw)");
    }

    #[test]
    fn test_wrap_line_start_forbid_glues_pair() {
        let settings = FormatSettings {
            line_start_forbid_chars: "」".to_string(),
            ..FormatSettings::plain(10)
        };
        assert_eq!(wrap("あいうえ「お」", &settings), "あいうえ「\nお」");
    }

    #[test]
    fn test_wrap_line_end_forbid_moves_bracket() {
        let settings = FormatSettings {
            line_end_forbid_chars: "「".to_string(),
            ..FormatSettings::plain(10)
        };
        assert_eq!(wrap("あいうえ「お", &settings), "あいうえ\n「お");
    }

    #[test]
    fn test_wrap_budget_smaller_than_wide_char() {
        let settings = FormatSettings::plain(1);
        assert_eq!(wrap("ああ", &settings), "あ\nあ");
    }

    #[test]
    fn test_wrap_zero_budget_is_clamped() {
        let settings = FormatSettings::plain(0);
        assert_eq!(wrap("あい", &settings), "あ\nい");
        assert_eq!(wrap("ab", &settings), "ab");
    }

    #[test]
    fn test_wrap_never_emits_blank_break_lines() {
        let settings = FormatSettings {
            line_end_forbid_chars: "「".to_string(),
            line_start_forbid_chars: "」".to_string(),
            ..FormatSettings::plain(2)
        };
        let wrapped = wrap("「あ」", &settings);
        assert!(wrapped.split('\n').all(|line| !line.is_empty()));
        assert_eq!(without_newlines(&wrapped), "「あ」");
    }

    #[test]
    fn test_wrap_conserves_characters() {
        let samples = [
            "今日は晴れです。明日は雨が降るでしょう（たぶん）。",
            "The quick brown fox jumps over the lazy dog's back.",
            "「引用」と(half)と[brackets]、そして https://example.com/page?x=1 の混在。",
            "𠮟られた𠮟られた𠮟られた",
            "   先頭に空白\n\n\tタブ\n",
            "ａｂｃ１２３ＡＢＣ　全角スペース",
        ];
        for max in [1, 2, 3, 7, 10, 20, 75] {
            let settings = FormatSettings {
                max_chars_per_line: max,
                ..FormatSettings::default()
            };
            for sample in samples {
                let wrapped = wrap(sample, &settings);
                assert_eq!(
                    without_newlines(&wrapped),
                    without_newlines(sample),
                    "max={max} sample={sample:?}"
                );
            }
        }
    }

    #[test]
    fn test_wrap_respects_width_bound() {
        let settings = FormatSettings {
            max_chars_per_line: 20,
            ..FormatSettings::default()
        };
        let text = "ニューズレターの本文です。会議の報告、参加者の感想（抜粋）などを掲載します。";
        for line in wrap(text, &settings).split('\n') {
            let width = display_width(line);
            let hung = line.chars().last().is_some_and(|c| settings.is_drop_char(c));
            if hung {
                assert!(width <= 22, "{line:?} is {width} columns");
            } else {
                assert!(width <= 20, "{line:?} is {width} columns");
            }
        }
    }

    #[test]
    fn test_wrap_default_settings_kinsoku() {
        let settings = FormatSettings {
            max_chars_per_line: 10,
            ..FormatSettings::default()
        };
        for line in wrap("あいう「えお」かきく、けこさ。", &settings).split('\n') {
            let first = line.chars().next().unwrap_or(' ');
            let last = line.chars().last().unwrap_or(' ');
            assert!(!settings.forbids_line_start(first), "line starts with {first}");
            assert!(!settings.forbids_line_end(last), "line ends with {last}");
        }
    }

    // =========================================================================
    // Text rules
    // =========================================================================

    #[test]
    fn test_catalog_order_and_ids() {
        let ids: Vec<&str> = catalog().iter().map(|rule| rule.id).collect();
        assert_eq!(
            ids,
            [
                "full-width-alphanumeric",
                "paragraph-spacing",
                "paragraph-indent",
                "punctuation",
                "url-format",
                "parentheses-pair",
                "japanese-parentheses",
            ]
        );
        assert!(catalog().iter().all(TextRule::is_fixable));
    }

    #[test]
    fn test_full_width_alphanumeric() {
        let rule = rule_by_id("full-width-alphanumeric");
        assert_eq!(apply_fix("ＡＢＣ１２３", rule), "ABC123");
        assert_eq!(apply_fix("ｚ０と全角", rule), "z0と全角");
        assert_eq!(count_issues("ＡＢＣ１２３", rule), 6);
    }

    #[test]
    fn test_paragraph_spacing() {
        let rule = rule_by_id("paragraph-spacing");
        assert_eq!(
            apply_fix("これは文です\n\nこれも文です", rule),
            "これは文です\nこれも文です"
        );
        assert_eq!(apply_fix("a\n \u{3000}\n\nb", rule), "a\nb");
        assert_eq!(count_issues("a\nb", rule), 0);
    }

    #[test]
    fn test_paragraph_indent() {
        let rule = rule_by_id("paragraph-indent");
        let text = "これはペンです。\nタイトル\n　既に字下げ。";
        assert_eq!(count_issues(text, rule), 1);
        assert_eq!(
            apply_fix(text, rule),
            "　これはペンです。\nタイトル\n　既に字下げ。"
        );
    }

    #[test]
    fn test_paragraph_indent_replaces_leading_spaces() {
        let rule = rule_by_id("paragraph-indent");
        assert_eq!(apply_fix("  文です。", rule), "　文です。");
        assert_eq!(apply_fix("  　文です。", rule), "  　文です。");
        assert_eq!(apply_fix("Done!\nNext?", rule), "　Done!\n　Next?");
    }

    #[test]
    fn test_punctuation() {
        let rule = rule_by_id("punctuation");
        assert_eq!(apply_fix("今日は、晴れ。", rule), "今日は，晴れ．");
        assert_eq!(count_issues("今日は、晴れ。", rule), 2);
    }

    #[test]
    fn test_url_format() {
        let rule = rule_by_id("url-format");
        assert_eq!(
            apply_fix("http://example.com/index.html", rule),
            "http://example.com"
        );
        assert_eq!(
            apply_fix("http://example.com/page", rule),
            "http://example.com/page/"
        );
        assert_eq!(
            apply_fix("http://example.com/page?x=1", rule),
            "http://example.com/page?x=1"
        );
        assert_eq!(
            apply_fix("詳細は https://example.org/doc.pdf を参照", rule),
            "詳細は https://example.org/doc.pdf を参照"
        );
    }

    #[test]
    fn test_url_issue_count_matches_fix() {
        let rule = rule_by_id("url-format");
        let text = "see http://a.com/page and http://a.com/ok/ and http://a.com/x?y \
                    and http://a.com/dir/index.html";
        assert_eq!(count_issues(text, rule), 2);
        let fixed = apply_fix(text, rule);
        assert!(fixed.contains("http://a.com/page/ "));
        assert!(fixed.contains("http://a.com/dir/"));
        assert_eq!(count_issues(&fixed, rule), 0);
    }

    #[test]
    fn test_parentheses_pair() {
        let rule = rule_by_id("parentheses-pair");
        assert_eq!(apply_fix("テスト(内容）", rule), "テスト（内容）");
        assert_eq!(apply_fix("テスト（内容)", rule), "テスト（内容）");
        assert_eq!(count_issues("(ok) （ok）", rule), 0);
    }

    #[test]
    fn test_japanese_parentheses() {
        let rule = rule_by_id("japanese-parentheses");
        assert_eq!(apply_fix("見本(サンプル)", rule), "見本（サンプル）");
        assert_eq!(apply_fix("see (sample)", rule), "see (sample)");
        assert_eq!(count_issues("(ひらがな)と(漢字)", rule), 2);
    }

    #[test]
    fn test_fixing_clears_issues() {
        let text = "ＡＢＣは、良い。\n\n詳細(ページ) http://example.com/page\n  次の段落です。";
        for rule in catalog() {
            let fixed = apply_fix(text, rule);
            assert_eq!(count_issues(&fixed, rule), 0, "rule {}", rule.id);
            if count_issues(text, rule) == 0 {
                assert_eq!(fixed, text, "rule {}", rule.id);
            }
        }
    }

    #[test]
    fn test_select_rules_keeps_order_and_dedups() {
        let rules = select_rules(["punctuation", "url-format", "punctuation"]).unwrap();
        let ids: Vec<&str> = rules.iter().map(|rule| rule.id).collect();
        assert_eq!(ids, ["punctuation", "url-format"]);
    }

    #[test]
    fn test_select_rules_unknown() {
        let err = select_rules(["punctuation", "no-such-rule"]).unwrap_err();
        assert_eq!(err, UnknownRuleError("no-such-rule".to_string()));
        assert_eq!(err.to_string(), "unknown text rule 'no-such-rule'");
    }

    // =========================================================================
    // Rule engine
    // =========================================================================

    #[test]
    fn test_scan_reports_in_rule_order() {
        let issues = scan("ＡＢＣ、http://x.com/page", catalog());
        let found: Vec<(&str, usize)> = issues.iter().map(|i| (i.rule.id, i.count)).collect();
        assert_eq!(
            found,
            [
                ("full-width-alphanumeric", 3),
                ("paragraph-indent", 1),
                ("punctuation", 1),
                ("url-format", 1)
            ]
        );
    }

    #[test]
    fn test_scan_clean_text() {
        assert!(scan("", catalog()).is_empty());
        assert!(scan("clean text", catalog()).is_empty());
    }

    #[test]
    fn test_scan_with_selection() {
        let rules = select_rules(["url-format", "full-width-alphanumeric"]).unwrap();
        let issues = scan("ＡＢＣ、http://x.com/page", rules.iter().copied());
        let ids: Vec<&str> = issues.iter().map(|i| i.rule.id).collect();
        assert_eq!(ids, ["url-format", "full-width-alphanumeric"]);
    }

    fn double_count(matches: &[&str]) -> usize {
        matches.len() * 2
    }

    fn delete_match(_: &Captures<'_>) -> Option<String> {
        Some(String::new())
    }

    #[test]
    fn test_custom_issue_counter() {
        let rule = TextRule {
            id: "double",
            name: "Double",
            description: "Counts every x twice",
            pattern: Regex::new("x").unwrap(),
            replace: None,
            detect_issues: Some(double_count),
        };
        assert_eq!(count_issues("x y x", &rule), 4);
        assert_eq!(scan("nothing", [&rule]).len(), 0);
    }

    #[test]
    fn test_report_only_rule_is_noop() {
        let rule = TextRule {
            id: "todo",
            name: "TODO",
            description: "Flags TODO markers",
            pattern: Regex::new("TODO").unwrap(),
            replace: None,
            detect_issues: None,
        };
        assert!(!rule.is_fixable());
        assert_eq!(count_issues("TODO TODO", &rule), 2);
        assert_eq!(apply_fix("TODO TODO", &rule), "TODO TODO");
    }

    #[test]
    fn test_literal_replacement_expands_groups() {
        let rule = TextRule {
            id: "swap",
            name: "Swap",
            description: "Swaps two words",
            pattern: Regex::new(r"(\w+)=(\w+)").unwrap(),
            replace: Some(Replacement::Literal("${2}=${1}")),
            detect_issues: None,
        };
        assert_eq!(apply_fix("a=b c=d", &rule), "b=a d=c");
    }

    #[test]
    fn test_empty_replacement_deletes_match() {
        let rule = TextRule {
            id: "strip-x",
            name: "Strip",
            description: "Deletes x",
            pattern: Regex::new("x").unwrap(),
            replace: Some(Replacement::Function(delete_match)),
            detect_issues: None,
        };
        assert_eq!(count_issues("axbx", &rule), 2);
        assert_eq!(apply_fix("axbx", &rule), "ab");
    }

    #[test]
    fn test_apply_fixes_counts() {
        let rules = select_rules(["full-width-alphanumeric", "punctuation"]).unwrap();
        let (fixed, applied) = apply_fixes("ＡＢ、。", rules.iter().copied());
        assert_eq!(fixed, "AB，．");
        let counts: Vec<(&str, usize)> = applied.iter().map(|i| (i.rule.id, i.count)).collect();
        assert_eq!(counts, vec![("full-width-alphanumeric", 2), ("punctuation", 2)]);
    }

    #[test]
    fn test_apply_fixes_skips_report_only_and_clean_rules() {
        let report_only = TextRule {
            id: "report-x",
            name: "Report x",
            description: "Reports x",
            pattern: Regex::new("x").unwrap(),
            replace: None,
            detect_issues: None,
        };
        let url = rule_by_id("url-format");
        let (fixed, applied) = apply_fixes("x http://example.com/", [&report_only, url]);
        assert_eq!(fixed, "x http://example.com/");
        assert!(applied.is_empty());
    }

    // =========================================================================
    // Template substitution
    // =========================================================================

    fn sample_data() -> NewsletterData {
        NewsletterData {
            publication_year: "2024".to_string(),
            no_month: "6".to_string(),
            editor_name: "  山田  ".to_string(),
            reports: vec![
                ReportEntry {
                    title: "国際会議参加報告".to_string(),
                    author: "A大学 佐藤".to_string(),
                    content: "本文1".to_string(),
                },
                ReportEntry {
                    title: "研究会報告".to_string(),
                    author: "B大学 鈴木".to_string(),
                    content: "本文2".to_string(),
                },
            ],
            ..NewsletterData::default()
        }
    }

    fn sample_templates() -> Templates {
        Templates {
            newsletter: "Vol.${vol} No.${no_month} (${publication_year})\n\
                         目次\n${report_title_list}\n${award_toc}\n\
                         ${report_contents}\n\
                         ${award}\n  受賞者一覧\n\n\
                         編集: ${editor_name}\n${chair}\n"
                .to_string(),
            award_toc: "　◆ 賞のご案内".to_string(),
            award: "【賞】\n${content}".to_string(),
        }
    }

    #[test]
    fn test_generate_substitutes_fields() {
        let vars = TemplateVariables {
            chair: " 委員長 ".to_string(),
            committee: String::new(),
        };
        let text = generate_newsletter(&sample_data(), &sample_templates(), &vars, None).unwrap();
        assert!(text.starts_with("Vol.29 No.6 (2024)\n目次\n◆ 国際会議参加報告\n　　A大学 佐藤\n"));
        assert!(text.contains("｜◆ 研究会報告\n"));
        assert!(text.contains(&format!("本文1\n\n{REPORT_FRAME}")));
        assert!(text.contains("編集: 山田\n委員長"));
        assert!(!text.contains("賞"));
        assert!(!text.contains("受賞者一覧"));
    }

    #[test]
    fn test_generate_with_awards() {
        let data = NewsletterData {
            awards: "最優秀論文賞: 田中".to_string(),
            ..sample_data()
        };
        let text = generate_newsletter(
            &data,
            &sample_templates(),
            &TemplateVariables::default(),
            None,
        )
        .unwrap();
        assert!(text.contains("目次\n◆ 国際会議参加報告"));
        assert!(text.contains("\n◆ 賞のご案内\n"));
        assert!(text.contains("【賞】\n最優秀論文賞: 田中\n  受賞者一覧"));
    }

    #[test]
    fn test_generate_keeps_vol_for_bad_year() {
        let data = NewsletterData {
            publication_year: "未定".to_string(),
            ..NewsletterData::default()
        };
        let templates = Templates {
            newsletter: "Vol.${vol}".to_string(),
            ..Templates::default()
        };
        let text =
            generate_newsletter(&data, &templates, &TemplateVariables::default(), None).unwrap();
        assert_eq!(text, "Vol.${vol}");
    }

    #[test]
    fn test_generate_keeps_vol_for_out_of_range_year() {
        let data = NewsletterData {
            publication_year: "-9223372036854775808".to_string(),
            ..NewsletterData::default()
        };
        let templates = Templates {
            newsletter: "Vol.${vol}".to_string(),
            ..Templates::default()
        };
        let text =
            generate_newsletter(&data, &templates, &TemplateVariables::default(), None).unwrap();
        assert_eq!(text, "Vol.${vol}");
    }

    #[test]
    fn test_generate_wraps_when_asked() {
        let data = NewsletterData {
            editor_name: "あいうえおかきくけこ".to_string(),
            ..NewsletterData::default()
        };
        let templates = Templates {
            newsletter: "\n${editor_name}\n".to_string(),
            ..Templates::default()
        };
        let settings = FormatSettings::plain(10);
        let text = generate_newsletter(
            &data,
            &templates,
            &TemplateVariables::default(),
            Some(&settings),
        )
        .unwrap();
        assert_eq!(text, "あいうえお\nかきくけこ");
    }

    #[test]
    fn test_generate_requires_template() {
        let err = generate_newsletter(
            &NewsletterData::default(),
            &Templates::default(),
            &TemplateVariables::default(),
            None,
        )
        .unwrap_err();
        assert_eq!(err, TemplateError::MissingTemplate);
    }

    #[test]
    fn test_remove_award_lines_without_following_text() {
        let template = "head\n${award_toc}\nbody\n${award}\n";
        assert_eq!(remove_empty_award_lines(template), "head\nbody\n${award}\n");
    }

    #[test]
    fn test_leading_year() {
        assert_eq!(leading_year("2024"), Some(2024));
        assert_eq!(leading_year(" 2024年"), Some(2024));
        assert_eq!(leading_year("令和6年"), None);
        assert_eq!(leading_year(""), None);
    }

    #[test]
    fn test_newsletter_data_from_partial_json() {
        let data: NewsletterData =
            serde_json::from_str(r#"{"publication_year": "2025", "reports": [{"title": "T"}]}"#)
                .unwrap();
        assert_eq!(data.publication_year, "2025");
        assert_eq!(data.reports[0].title, "T");
        assert!(data.reports[0].author.is_empty());
        assert!(data.awards.is_empty());
    }
}
