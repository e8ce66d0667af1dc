//! QuickBook output helpers
//!
//! The `qbk` filter turns content into QuickBook markup and the `anchor`
//! filter computes link targets for entities.

use crate::config::Config;
use crate::content::{
    paragraphs_text, Block, Cell, CodeBlock, Inline, List, ParameterList, ParameterListKind,
    Phrase, Section, SectionKind, Table,
};
use crate::corpus::Corpus;
use crate::entity::{EntityId, EntityKind};

use super::objects::{ContentNode, Style};

/// Escape QuickBook's markup characters.
pub fn escape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '[' | ']') {
            result.push('\\');
        }
        result.push(c);
    }
    result
}

/// Options that affect written markup.
#[derive(Debug, Clone, Default)]
pub struct Markup {
    /// Prepended to every link target
    pub link_prefix: String,

    /// Namespace left out of qualified names in titles
    pub default_namespace: Option<String>,

    /// Brief that marks an entity as documented elsewhere
    pub external_marker: Option<String>,

    /// Replacements applied to text before escaping
    pub replace_strings: Vec<(String, String)>,
}

impl Markup {
    /// Markup options from the merged configuration.
    pub fn from_config(config: &Config) -> Self {
        let string = |key: &str| config.get_str(key).map(str::to_string);
        Self {
            link_prefix: string("link_prefix").unwrap_or_default(),
            default_namespace: string("default_namespace"),
            external_marker: string("external_marker"),
            replace_strings: config.replace_strings(),
        }
    }

    /// Apply the replacements, then escape.
    pub fn text(&self, text: &str) -> String {
        let mut text = text.to_string();
        for (from, to) in &self.replace_strings {
            if !from.is_empty() {
                text = text.replace(from.as_str(), to);
            }
        }
        escape(&text)
    }

    /// Escaped qualified name of an entity, without the default namespace.
    pub fn abridged_fqn(&self, corpus: &Corpus, id: EntityId) -> String {
        let name = corpus.fully_qualified_name(id);
        let abridged = self
            .default_namespace
            .as_deref()
            .and_then(|ns| name.strip_prefix(ns)?.strip_prefix("::"))
            .unwrap_or(&name);
        escape(abridged)
    }

    /// Where an external entity is documented.
    ///
    /// An entity is external when its brief is the configured marker; the
    /// first "see also" section of its description holds the URL.
    pub fn external_url(&self, corpus: &Corpus, id: EntityId) -> Option<String> {
        let marker = self.external_marker.as_deref()?;
        let entity = corpus.entity(id);
        if paragraphs_text(entity.brief(), corpus).trim() != marker {
            return None;
        }
        entity
            .description()
            .iter()
            .find_map(|block| match block {
                Block::Section(section) if matches!(section.kind, Some(SectionKind::See)) => {
                    Some(paragraphs_text(&section.blocks, corpus).trim().to_string())
                }
                _ => None,
            })
            .filter(|url| !url.is_empty())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Anchors
// ═══════════════════════════════════════════════════════════════════════

const OPERATOR_SPECIAL: &[(&str, &str)] = &[("<=>", "_spshp_"), ("->", "__arrow_")];

/// Symbols that take an extra `_` when an operator starts with them.
const OPERATOR_LEADING: &[char] = &['*', '!', '>', '['];

fn operator_char(c: char) -> Option<&'static str> {
    Some(match c {
        '=' => "_eq_",
        '+' => "_plus_",
        '-' => "_minus_",
        '*' => "_star_",
        '/' => "_slash_",
        '%' => "_mod_",
        '&' => "_and_",
        '|' => "_or_",
        '^' => "_xor_",
        '~' => "_bnot_",
        '!' => "_not_",
        '<' => "_lt_",
        '>' => "_gt_",
        '[' => "_lb_",
        ']' => "_rb_",
        '(' => "_lp_",
        ')' => "_rp_",
        ',' => "_comma_",
        _ => return None,
    })
}

fn name_char(c: char) -> Option<&'static str> {
    Some(match c {
        '<' => "_lt_",
        '>' => "_gt_",
        ',' => "_comma_",
        ' ' => "_",
        '*' => "_star_",
        '&' => "_and_",
        '=' => "_eq_",
        '(' => "_lp_",
        ')' => "_rp_",
        '[' => "_lb_",
        ']' => "_rb_",
        '~' => "_dtor_",
        '.' => "_dot_",
        _ => return None,
    })
}

fn mangle_operator(symbol: &str) -> String {
    if let Some((_, mangled)) = OPERATOR_SPECIAL.iter().find(|(op, _)| *op == symbol) {
        return (*mangled).to_string();
    }
    let mut result = String::new();
    if symbol.starts_with(OPERATOR_LEADING) {
        result.push('_');
    }
    for c in symbol.chars() {
        match operator_char(c) {
            Some(mangled) => result.push_str(mangled),
            None => result.push(c),
        }
    }
    result
}

/// Mangle one name component into characters QuickBook accepts in ids.
///
/// Operator symbols get dedicated spellings; other characters outside
/// identifiers are spelled out or replaced with `_`.
pub fn mangle(name: &str) -> String {
    if let Some(rest) = name.strip_prefix("operator") {
        let symbol = rest.trim_start();
        if symbol.starts_with(|c: char| !c.is_alphanumeric() && c != '_') {
            return format!("operator{}", mangle_operator(symbol));
        }
    }

    let mut result = String::with_capacity(name.len());
    let mut rest = name;
    while let Some(c) = rest.chars().next() {
        if let Some(tail) = rest.strip_prefix("::") {
            result.push_str("__");
            rest = tail;
            continue;
        }
        if c.is_alphanumeric() || c == '_' {
            result.push(c);
        } else {
            result.push_str(name_char(c).unwrap_or("_"));
        }
        rest = &rest[c.len_utf8()..];
    }
    result
}

/// Link target of an entity.
///
/// Members of classes are addressed below their class, enumerators use
/// their enum's anchor, and everything else uses its mangled qualified
/// name. Overloaded functions get an `.overloadN` suffix unless
/// `prefer_overload` asks for the anchor of the whole set.
pub fn anchor(corpus: &Corpus, id: EntityId, prefer_overload: bool) -> String {
    let entity = corpus.entity(id);
    if let EntityKind::Enumerator(data) = &entity.kind {
        return anchor(corpus, data.owner, prefer_overload);
    }

    let mut result = match entity.scope {
        Some(scope) if corpus.entity(scope).is_class() => {
            format!("{}.{}", anchor(corpus, scope, false), mangle(&entity.name))
        }
        _ => corpus
            .path(id)
            .into_iter()
            .map(|id| mangle(&corpus.entity(id).name))
            .collect::<Vec<_>>()
            .join("__"),
    };

    if let Some(function) = entity.as_function() {
        if function.is_friend {
            result.push_str("_fr");
        }
        if !prefer_overload {
            if let Some(index) = corpus.overload_index(id) {
                result.push_str(&format!(".overload{}", index + 1));
            }
        }
    }
    result
}

/// Id of an entity's section relative to the section it is nested in.
///
/// Class members are nested in their class, and overloads in the section
/// of their overload set. Joining the ids of the enclosing sections with
/// `.` gives back [`anchor`].
pub fn local_anchor(corpus: &Corpus, id: EntityId, prefer_overload: bool) -> String {
    let entity = corpus.entity(id);
    if let EntityKind::Enumerator(data) = &entity.kind {
        return local_anchor(corpus, data.owner, prefer_overload);
    }
    if !prefer_overload {
        if let Some(index) = corpus.overload_index(id) {
            return format!("overload{}", index + 1);
        }
    }
    match entity.scope {
        Some(scope) if corpus.entity(scope).is_class() => {
            let mut result = mangle(&entity.name);
            if entity.as_function().is_some_and(|f| f.is_friend) {
                result.push_str("_fr");
            }
            result
        }
        _ => anchor(corpus, id, prefer_overload),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Content
// ═══════════════════════════════════════════════════════════════════════

/// Writes QuickBook markup for content.
pub(crate) struct Writer<'a> {
    corpus: &'a Corpus,
    markup: &'a Markup,
    out: String,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(corpus: &'a Corpus, markup: &'a Markup) -> Self {
        Self {
            corpus,
            markup,
            out: String::new(),
        }
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }

    pub(crate) fn node(&mut self, node: &ContentNode) {
        match node {
            ContentNode::Phrase(style, phrase) => self.styled(style, phrase),
            ContentNode::Linebreak => self.out.push_str("\n\n"),
            ContentNode::Block(block) => self.block(block, ""),
            ContentNode::ListItem(blocks) => self.blocks(blocks, ""),
            ContentNode::Cell(cell) => self.blocks(&cell.blocks, ""),
            ContentNode::ParameterDescription(description) => {
                self.blocks(&description.description, "")
            }
            ContentNode::ParameterItem(item) => self.phrase(&item.name),
        }
    }

    fn styled(&mut self, style: &Style, phrase: &Phrase) {
        match style {
            Style::Plain => self.phrase(phrase),
            Style::Strong => self.wrapped("[*", phrase, "]"),
            Style::Emphasised => self.wrapped("['", phrase, "]"),
            Style::Monospaced => self.monospaced(phrase),
            Style::EntityRef(id) => self.link(*id, phrase),
            Style::UrlLink(url) => {
                self.out.push_str("[@");
                self.out.push_str(url);
                if !phrase.is_empty() {
                    self.out.push(' ');
                    self.phrase(phrase);
                }
                self.out.push(']');
            }
        }
    }

    pub(crate) fn phrase(&mut self, phrase: &Phrase) {
        for part in phrase {
            self.inline(part);
        }
    }

    fn inline(&mut self, inline: &Inline) {
        match inline {
            Inline::Text(text) => self.out.push_str(&self.markup.text(text)),
            Inline::Linebreak => self.out.push_str("\n\n"),
            Inline::Strong(phrase) => self.styled(&Style::Strong, phrase),
            Inline::Emphasised(phrase) => self.styled(&Style::Emphasised, phrase),
            Inline::Monospaced(phrase) => self.styled(&Style::Monospaced, phrase),
            Inline::Phrase(phrase) => self.phrase(phrase),
            Inline::EntityRef(link) => self.link(link.entity, &link.content),
            Inline::UrlLink(link) => self.styled(&Style::UrlLink(link.url.clone()), &link.content),
        }
    }

    fn wrapped(&mut self, open: &str, phrase: &Phrase, close: &str) {
        self.out.push_str(open);
        self.phrase(phrase);
        self.out.push_str(close);
    }

    fn monospaced(&mut self, phrase: &Phrase) {
        self.out.push('`');
        self.out.push_str(&phrase.text(self.corpus));
        self.out.push('`');
    }

    fn link(&mut self, id: EntityId, phrase: &Phrase) {
        let text = phrase.text(self.corpus);
        let text = if text.is_empty() {
            self.corpus.fully_qualified_name(id)
        } else {
            text
        };
        if let Some(url) = self.markup.external_url(self.corpus, id) {
            self.out.push_str(&format!("[@{url} `{text}`]"));
            return;
        }
        self.out.push_str("[link ");
        self.out.push_str(&self.markup.link_prefix);
        self.out.push_str(&anchor(self.corpus, id, false));
        self.out.push_str(" `");
        self.out.push_str(&text);
        self.out.push_str("`]");
    }

    pub(crate) fn blocks(&mut self, blocks: &[Block], indent: &str) {
        for block in blocks {
            self.block(block, indent);
        }
    }

    fn block(&mut self, block: &Block, indent: &str) {
        match block {
            Block::Paragraph(phrase) => {
                self.out.push_str(indent);
                self.phrase(phrase);
                self.out.push_str("\n\n");
            }
            Block::List(list) => self.list(list, indent),
            Block::Section(section) => self.section(section, indent),
            Block::CodeBlock(code) => self.code(code, indent),
            Block::Table(table) => self.table(table),
            Block::ParameterList(list) => self.parameter_list(list),
        }
    }

    fn list(&mut self, list: &List, indent: &str) {
        let marker = if list.is_ordered() { "# " } else { "* " };
        let nested = format!("{indent}  ");
        for item in &list.items {
            self.out.push_str(indent);
            self.out.push_str(marker);
            let mut blocks = item.iter();
            if let Some(Block::Paragraph(phrase)) = item.first() {
                blocks.next();
                self.phrase(phrase);
            }
            self.out.push('\n');
            for block in blocks {
                match block {
                    Block::Paragraph(phrase) => {
                        self.out.push_str(&nested);
                        self.phrase(phrase);
                        self.out.push('\n');
                    }
                    other => self.block(other, &nested),
                }
            }
        }
        if indent.is_empty() {
            self.out.push('\n');
        }
    }

    fn section(&mut self, section: &Section, indent: &str) {
        self.out.push_str("[heading ");
        if section.title.is_empty() {
            self.out.push_str(section_title(section.kind.as_ref()));
        } else {
            self.phrase(&section.title);
        }
        self.out.push_str("]\n");
        self.blocks(&section.blocks, indent);
    }

    fn code(&mut self, code: &CodeBlock, indent: &str) {
        self.out.push_str(indent);
        self.out.push_str("```\n");
        for line in &code.lines {
            self.out.push_str(line);
            self.out.push('\n');
        }
        self.out.push_str(indent);
        self.out.push_str("```\n");
    }

    fn table(&mut self, table: &Table) {
        self.out.push_str("[table ");
        if let Some(caption) = &table.caption {
            self.phrase(caption);
        }
        self.out.push('\n');
        for row in &table.rows {
            self.out.push_str("  [\n");
            for cell in row {
                self.cell(cell);
            }
            self.out.push_str("  ]\n");
        }
        self.out.push_str("]\n\n");
    }

    fn cell(&mut self, cell: &Cell) {
        self.out.push_str("    [\n");
        let start = self.out.len();
        self.blocks(&cell.blocks, "      ");
        let trimmed = self.out[start..].trim_end().len();
        self.out.truncate(start + trimmed);
        self.out.push_str("\n    ]\n");
    }

    fn parameter_list(&mut self, list: &ParameterList) {
        self.out.push_str("[heading ");
        self.out
            .push_str(parameter_list_title(list.kind.as_ref()));
        self.out.push_str("]\n[table [[Name][Description]]\n");
        for item in &list.items {
            self.out.push_str("  [\n    [");
            for (n, param) in item.params.iter().enumerate() {
                if n > 0 {
                    self.out.push_str(", ");
                }
                self.out.push('`');
                self.out.push_str(&param.name.text(self.corpus));
                self.out.push('`');
            }
            self.out.push_str("]\n    [\n");
            let start = self.out.len();
            self.blocks(&item.description, "      ");
            let trimmed = self.out[start..].trim_end().len();
            self.out.truncate(start + trimmed);
            self.out.push_str("\n    ]\n  ]\n");
        }
        self.out.push_str("]\n\n");
    }
}

fn section_title(kind: Option<&SectionKind>) -> &'static str {
    match kind {
        Some(SectionKind::See) => "See Also",
        Some(SectionKind::Returns) => "Return Value",
        Some(SectionKind::Author) => "Author",
        Some(SectionKind::Authors) => "Authors",
        Some(SectionKind::Version) => "Version",
        Some(SectionKind::Since) => "Since",
        Some(SectionKind::Date) => "Date",
        Some(SectionKind::Note) => "Remarks",
        Some(SectionKind::Warning) => "Warning",
        Some(SectionKind::Preconditions) => "Preconditions",
        Some(SectionKind::Postconditions) => "Postconditions",
        Some(SectionKind::Copyright) => "Copyright",
        Some(SectionKind::Invariants) => "Invariants",
        Some(SectionKind::Remarks) => "Remarks",
        Some(SectionKind::Attention) => "Attention",
        Some(SectionKind::Rcs) => "RCS",
        Some(SectionKind::Custom | SectionKind::Other(_)) | None => "",
    }
}

fn parameter_list_title(kind: Option<&ParameterListKind>) -> &'static str {
    match kind {
        Some(ParameterListKind::ReturnValues) => "Return Value",
        Some(ParameterListKind::Exceptions) => "Exceptions",
        Some(ParameterListKind::TemplateParameters) => "Template Parameters",
        Some(ParameterListKind::Parameters | ParameterListKind::Other(_)) | None => "Parameters",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape() {
        assert_eq!(escape("[[foobar]]"), r"\[\[foobar\]\]");
        assert_eq!(escape(r"a\b"), r"a\\b");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_markup_text_replaces_before_escaping() {
        let markup = Markup {
            replace_strings: vec![
                ("[".to_string(), "(".to_string()),
                ("foobar".to_string(), "FooBar".to_string()),
            ],
            ..Markup::default()
        };
        assert_eq!(markup.text("[[foobar]]"), r"((FooBar\]\]");
        assert_eq!(Markup::default().text("[[foobar]]"), r"\[\[foobar\]\]");
    }

    #[test]
    fn test_mangle_names() {
        assert_eq!(mangle("klass"), "klass");
        assert_eq!(
            mangle("tmpl< int, std::string >"),
            "tmpl_lt__int_comma__std__string__gt_"
        );
        assert_eq!(mangle("tmpl<int, std::string>"), "tmpl_lt_int_comma__std__string_gt_");
        assert_eq!(mangle("~klass"), "_dtor_klass");
    }

    #[test]
    fn test_mangle_operators() {
        let cases = [
            ("operator=", "operator_eq_"),
            ("operator*=", "operator__star__eq_"),
            ("operator>>=", "operator__gt__gt__eq_"),
            ("operator<<=", "operator_lt__lt__eq_"),
            ("operator>>", "operator__gt__gt_"),
            ("operator>=", "operator__gt__eq_"),
            ("operator<=", "operator_lt__eq_"),
            ("operator&&", "operator_and__and_"),
            ("operator*", "operator__star_"),
            ("operator<<", "operator_lt__lt_"),
            ("operator!", "operator__not_"),
            ("operator!=", "operator__not__eq_"),
            ("operator[]", "operator__lb__rb_"),
            ("operator->", "operator__arrow_"),
            ("operator()", "operator_lp__rp_"),
            ("operator<=>", "operator_spshp_"),
            ("operator,", "operator_comma_"),
            ("operator~", "operator_bnot_"),
        ];
        for (name, expected) in cases {
            assert_eq!(mangle(name), expected, "{name}");
        }
    }

    #[test]
    fn test_conversion_operator_is_a_plain_name() {
        assert_eq!(mangle("operator bool"), "operator_bool");
        assert_eq!(mangle("operators"), "operators");
    }
}
