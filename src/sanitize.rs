/*
    Reportann (clinical report annotation transcoder)

    Licensed under the GNU General Public License v3
*/

//! String-level corrections applied to raw markup before strict parsing.
//!
//! Source spreadsheets contain markup that is malformed or ambiguous in
//! data-specific ways: unescaped ampersands, doubled angle brackets,
//! full-width brackets colliding with tag delimiters, stray line breaks
//! before closing tags. A [`Sanitizer`] is an ordered list of literal
//! substring replacements that routes around these before the parser sees
//! the text. Order matters: later rules assume earlier ones already ran.
//!
//! The rule tables are data and will grow as new malformed inputs surface;
//! add rules via [`Sanitizer::with_rule`] rather than special-casing the
//! parser.

/// A single literal replacement rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub from: String,
    pub to: String,
}

impl Rule {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl<F, T> From<(F, T)> for Rule
where
    F: Into<String>,
    T: Into<String>,
{
    fn from((from, to): (F, T)) -> Self {
        Self::new(from, to)
    }
}

/// An ordered list of replacement rules, applied first to last.
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    rules: Vec<Rule>,
}

/// Rules applied to raw finding text, before it is wrapped in the line
/// envelope. Handles stray line breaks before closing tags and full-width
/// angle brackets that would otherwise collide with tag delimiters.
const FINDING_RULES: &[(&str, &str)] = &[
    ("\r</", "</"),
    ("\n</", "</"),
    ("＜", "&lt;"),
    ("＞", "&gt;"),
];

/// Rules applied to the assembled markup just before parsing. The section
/// headings quoted with `《..》` are verbatim strings from the source corpora
/// that annotators wrote in single angle brackets; they are headings, not
/// tags. The generic fixes at the end must come after those: collapsing
/// doubled brackets first would corrupt the quoted forms.
const MARKUP_RULES: &[(&str, &str)] = &[
    ("<代理診察>", "《代理診察》"),
    ("<胸部CT>", "《胸部CT》"),
    ("<胸部単純CT>", "《胸部単純CT》"),
    ("<ABD US>", "《ABD US》"),
    ("<CHEST>", "《CHEST》"),
    ("<CHEST；CT>", "《CHEST；CT》"),
    ("<CHEST;CT>", "《CHEST；CT》"),
    ("<CHEST: CT>", "《CHEST: CT》"),
    ("<Liver>", "《Liver》"),
    ("<経過>", "《経過》"),
    ("<カンファレンスのpoint>", "《カンファレンスのpoint》"),
    (", correction=", " correction="),
    ("<長期経過>", "《長期経過》"),
    ("<予習>", "《予習》"),
    ("<L/D>", "《L/D》"),
    ("&", "&amp;"),
    ("<<", "<"),
    (">>", ">"),
    ("=\"suspicious>", "=\"suspicious\">"),
];

impl Sanitizer {
    /// Returns a sanitizer with no rules; replacements can be added with
    /// [`Self::with_rule`]
    pub fn new() -> Self {
        Self::default()
    }

    /// The default rule table for raw finding text (pre-envelope)
    pub fn finding_defaults() -> Self {
        Self::from_rules(FINDING_RULES.iter().map(|&(f, t)| Rule::new(f, t)))
    }

    /// The default rule table for assembled markup (post-envelope, pre-parse)
    pub fn markup_defaults() -> Self {
        Self::from_rules(MARKUP_RULES.iter().map(|&(f, t)| Rule::new(f, t)))
    }

    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    /// Builder pattern to append a rule. Rules run in insertion order.
    pub fn with_rule(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.rules.push(Rule::new(from, to));
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Applies all rules, in order, to the input.
    pub fn sanitize(&self, raw: &str) -> String {
        let mut out = raw.to_string();
        for rule in &self.rules {
            if out.contains(rule.from.as_str()) {
                out = out.replace(rule.from.as_str(), rule.to.as_str());
            }
        }
        out
    }
}
