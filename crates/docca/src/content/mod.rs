//! Documentation content: phrases and blocks
//!
//! Descriptions are converted once, during reference resolution, from raw
//! markup into a tree of [`Block`]s holding [`Phrase`]s. The tree is never
//! mutated afterwards.

pub mod build;

use crate::corpus::Corpus;
use crate::entity::EntityId;

pub use build::{
    make_blocks, make_entity_reference, phrase_content, resolve_return_type, resolve_type,
    text_with_refs,
};

// ═══════════════════════════════════════════════════════════════════════
// Phrases
// ═══════════════════════════════════════════════════════════════════════

/// A piece of inline content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// Plain text
    Text(String),

    /// Forced line break
    Linebreak,

    /// Bold text
    Strong(Phrase),

    /// Italic text
    Emphasised(Phrase),

    /// Code font
    Monospaced(Phrase),

    /// Link to another documented entity
    EntityRef(EntityRef),

    /// Link to an external resource
    UrlLink(UrlLink),

    /// Unstyled group, left behind by an unresolved reference
    Phrase(Phrase),
}

impl Inline {
    /// Flattened text of this piece.
    pub fn text(&self, corpus: &Corpus) -> String {
        match self {
            Inline::Text(text) => text.clone(),
            Inline::Linebreak => String::new(),
            Inline::Strong(phrase)
            | Inline::Emphasised(phrase)
            | Inline::Monospaced(phrase)
            | Inline::Phrase(phrase) => phrase.text(corpus),
            Inline::EntityRef(link) => link.text(corpus),
            Inline::UrlLink(link) => link.text(corpus),
        }
    }

    /// The text, if this piece is plain text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Inline::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for Inline {
    fn from(text: &str) -> Self {
        Inline::Text(text.to_string())
    }
}

/// A sequence of inline content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Phrase {
    /// Pieces in document order
    pub parts: Vec<Inline>,
}

impl Phrase {
    /// Create a phrase from its pieces.
    pub fn new(parts: Vec<Inline>) -> Self {
        Self { parts }
    }

    /// Number of pieces.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the phrase has no pieces.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Iterate over the pieces.
    pub fn iter(&self) -> std::slice::Iter<'_, Inline> {
        self.parts.iter()
    }

    /// Concatenate all leaf text in document order.
    pub fn text(&self, corpus: &Corpus) -> String {
        self.parts.iter().map(|part| part.text(corpus)).collect()
    }

    /// Last piece, if it is plain text.
    pub(crate) fn last_text_mut(&mut self) -> Option<&mut String> {
        match self.parts.last_mut() {
            Some(Inline::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// First piece, if it is plain text.
    pub(crate) fn first_text_mut(&mut self) -> Option<&mut String> {
        match self.parts.first_mut() {
            Some(Inline::Text(text)) => Some(text),
            _ => None,
        }
    }
}

impl<'a> IntoIterator for &'a Phrase {
    type Item = &'a Inline;
    type IntoIter = std::slice::Iter<'a, Inline>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.iter()
    }
}

/// Link to a documented entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    /// Target entity
    pub entity: EntityId,

    /// Link text; may be empty
    pub content: Phrase,
}

impl EntityRef {
    /// Link text, or the target's fully qualified name when there is none.
    pub fn text(&self, corpus: &Corpus) -> String {
        let text = self.content.text(corpus);
        if text.is_empty() {
            corpus.fully_qualified_name(self.entity)
        } else {
            text
        }
    }
}

/// Link to a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlLink {
    /// Target address, never empty
    pub url: String,

    /// Link text; may be empty
    pub content: Phrase,
}

impl UrlLink {
    /// Link text, or the URL when there is none.
    pub fn text(&self, corpus: &Corpus) -> String {
        let text = self.content.text(corpus);
        if text.is_empty() {
            self.url.clone()
        } else {
            text
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Blocks
// ═══════════════════════════════════════════════════════════════════════

/// A block-level node of documentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Run of inline content
    Paragraph(Phrase),

    /// Bulleted or numbered list
    List(List),

    /// Titled section such as "Returns" or "See also"
    Section(Section),

    /// Verbatim code listing
    CodeBlock(CodeBlock),

    /// Table
    Table(Table),

    /// Documentation of parameters, return values or exceptions
    ParameterList(ParameterList),
}

impl Block {
    /// Type name used by templates.
    pub fn node_name(&self) -> &'static str {
        match self {
            Block::Paragraph(_) => "Paragraph",
            Block::List(_) => "List",
            Block::Section(_) => "Section",
            Block::CodeBlock(_) => "CodeBlock",
            Block::Table(_) => "Table",
            Block::ParameterList(_) => "ParameterList",
        }
    }

    /// The paragraph's phrase, if this is a paragraph.
    pub fn as_paragraph(&self) -> Option<&Phrase> {
        match self {
            Block::Paragraph(phrase) => Some(phrase),
            _ => None,
        }
    }
}

/// Concatenated text of all paragraphs in a block sequence.
///
/// Non-paragraph blocks contribute nothing.
pub fn paragraphs_text(blocks: &[Block], corpus: &Corpus) -> String {
    blocks
        .iter()
        .filter_map(Block::as_paragraph)
        .map(|phrase| phrase.text(corpus))
        .collect()
}

/// Numbering style of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// 1, 2, 3
    Arabic,
    /// a, b, c
    LowerLatin,
    /// A, B, C
    UpperLatin,
    /// i, ii, iii
    LowerRoman,
    /// I, II, III
    UpperRoman,
}

impl ListKind {
    /// Parse the Doxygen `type` attribute.
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "1" => Some(ListKind::Arabic),
            "a" => Some(ListKind::LowerLatin),
            "A" => Some(ListKind::UpperLatin),
            "i" => Some(ListKind::LowerRoman),
            "I" => Some(ListKind::UpperRoman),
            _ => None,
        }
    }

    /// The attribute spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            ListKind::Arabic => "1",
            ListKind::LowerLatin => "a",
            ListKind::UpperLatin => "A",
            ListKind::LowerRoman => "i",
            ListKind::UpperRoman => "I",
        }
    }
}

/// A list; each item is a sequence of blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List {
    /// Numbering, `None` for bulleted lists
    pub kind: Option<ListKind>,

    /// Items in order
    pub items: Vec<Vec<Block>>,
}

impl List {
    /// Whether the list is numbered.
    pub fn is_ordered(&self) -> bool {
        self.kind.is_some()
    }
}

/// Kind of a [`Section`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionKind {
    /// See also
    See,
    /// Return value
    Returns,
    /// Author
    Author,
    /// Authors
    Authors,
    /// Version
    Version,
    /// Since
    Since,
    /// Date
    Date,
    /// Note
    Note,
    /// Warning
    Warning,
    /// Preconditions
    Preconditions,
    /// Postconditions
    Postconditions,
    /// Copyright
    Copyright,
    /// Invariants
    Invariants,
    /// Remarks
    Remarks,
    /// Attention
    Attention,
    /// Paragraph with a custom title
    Custom,
    /// RCS keyword
    Rcs,
    /// Anything Doxygen adds later
    Other(String),
}

/// `(attribute spelling, kind)` pairs for the well-known section kinds.
pub const SECTION_KINDS: &[(&str, SectionKind)] = &[
    ("see", SectionKind::See),
    ("return", SectionKind::Returns),
    ("author", SectionKind::Author),
    ("authors", SectionKind::Authors),
    ("version", SectionKind::Version),
    ("since", SectionKind::Since),
    ("date", SectionKind::Date),
    ("note", SectionKind::Note),
    ("warning", SectionKind::Warning),
    ("pre", SectionKind::Preconditions),
    ("post", SectionKind::Postconditions),
    ("copyright", SectionKind::Copyright),
    ("invariant", SectionKind::Invariants),
    ("remark", SectionKind::Remarks),
    ("attention", SectionKind::Attention),
    ("par", SectionKind::Custom),
    ("rcs", SectionKind::Rcs),
];

impl SectionKind {
    /// Parse the `kind` attribute of a `simplesect`.
    pub fn from_attr(value: &str) -> Self {
        SECTION_KINDS
            .iter()
            .find(|(name, _)| *name == value)
            .map(|(_, kind)| kind.clone())
            .unwrap_or_else(|| SectionKind::Other(value.to_string()))
    }

    /// The attribute spelling.
    pub fn as_str(&self) -> &str {
        match self {
            SectionKind::Other(value) => value,
            known => SECTION_KINDS
                .iter()
                .find(|(_, kind)| kind == known)
                .map(|(name, _)| *name)
                .unwrap_or_default(),
        }
    }
}

/// A titled group of blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Section kind, if given
    pub kind: Option<SectionKind>,

    /// Title; empty when the section has none
    pub title: Phrase,

    /// Body
    pub blocks: Vec<Block>,
}

/// A code listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBlock {
    /// One string per source line
    pub lines: Vec<String>,
}

/// A table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Declared column count
    pub cols: Option<usize>,

    /// Optional caption
    pub caption: Option<Phrase>,

    /// Rows of cells
    pub rows: Vec<Vec<Cell>>,
}

/// A table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Cell content
    pub blocks: Vec<Block>,
    /// Columns spanned, at least 1
    pub col_span: usize,
    /// Rows spanned, at least 1
    pub row_span: usize,
    /// Whether this is a header cell
    pub is_header: bool,
    /// Horizontal alignment
    pub horizontal_align: Option<String>,
    /// Vertical alignment
    pub vertical_align: Option<String>,
    /// Width hint
    pub width: Option<String>,
    /// Style class
    pub role: Option<String>,
}

/// Kind of a [`ParameterList`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterListKind {
    /// Function parameters
    Parameters,
    /// Return values
    ReturnValues,
    /// Exceptions
    Exceptions,
    /// Template parameters
    TemplateParameters,
    /// Anything Doxygen adds later
    Other(String),
}

/// `(attribute spelling, kind)` pairs for the well-known parameter list kinds.
pub const PARAMETER_LIST_KINDS: &[(&str, ParameterListKind)] = &[
    ("param", ParameterListKind::Parameters),
    ("retval", ParameterListKind::ReturnValues),
    ("exception", ParameterListKind::Exceptions),
    ("templateparam", ParameterListKind::TemplateParameters),
];

impl ParameterListKind {
    /// Parse the `kind` attribute of a `parameterlist`.
    pub fn from_attr(value: &str) -> Self {
        PARAMETER_LIST_KINDS
            .iter()
            .find(|(name, _)| *name == value)
            .map(|(_, kind)| kind.clone())
            .unwrap_or_else(|| ParameterListKind::Other(value.to_string()))
    }

    /// The attribute spelling.
    pub fn as_str(&self) -> &str {
        match self {
            ParameterListKind::Other(value) => value,
            known => PARAMETER_LIST_KINDS
                .iter()
                .find(|(_, kind)| kind == known)
                .map(|(name, _)| *name)
                .unwrap_or_default(),
        }
    }
}

/// A list of documented parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterList {
    /// List kind, if given
    pub kind: Option<ParameterListKind>,

    /// Entries in order
    pub items: Vec<ParameterDescription>,
}

/// One or more parameters sharing a description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescription {
    /// Shared description
    pub description: Vec<Block>,

    /// The described parameters
    pub params: Vec<ParameterItem>,
}

/// A documented parameter name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterItem {
    /// Declared type, often empty
    pub type_: Phrase,

    /// Parameter name
    pub name: Phrase,

    /// Data direction (`in`, `out`, `inout`)
    pub direction: Option<String>,
}

impl ParameterItem {
    /// Whether data flows into the function.
    pub fn is_in(&self) -> bool {
        matches!(self.direction.as_deref(), Some("in" | "inout"))
    }

    /// Whether data flows out of the function.
    pub fn is_out(&self) -> bool {
        matches!(self.direction.as_deref(), Some("out" | "inout"))
    }
}
