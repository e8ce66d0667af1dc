//! Conversion of raw description markup into content trees

use tracing::debug;

use super::{
    Block, Cell, CodeBlock, EntityRef, Inline, List, ListKind, ParameterDescription,
    ParameterItem, ParameterList, ParameterListKind, Phrase, Section, SectionKind, Table,
    UrlLink,
};
use crate::corpus::Corpus;
use crate::error::{DoccaError, Result};
use crate::xml::{Element, Node};

// ═══════════════════════════════════════════════════════════════════════
// Blocks
// ═══════════════════════════════════════════════════════════════════════

/// Build the block sequence of a description element.
///
/// Text and inline elements accumulate into a pending paragraph. Block
/// elements flush the pending paragraph first and then append themselves;
/// `para` flushes and splices its own blocks. A missing element yields no
/// blocks.
///
/// # Errors
///
/// Fails on structurally invalid markup and on references to entities that
/// are not in the corpus.
pub fn make_blocks(element: Option<&Element>, corpus: &Corpus) -> Result<Vec<Block>> {
    let Some(element) = element else {
        return Ok(Vec::new());
    };

    let mut result = Vec::new();
    let mut paragraph = Vec::new();

    for node in &element.children {
        let child = match node {
            Node::Text(text) => {
                paragraph.push(Inline::Text(remove_endlines(text)));
                continue;
            }
            Node::Element(child) => child,
        };

        let block = match child.tag.as_str() {
            "itemizedlist" | "orderedlist" => make_list(child, corpus)?,
            "simplesect" => make_section(child, corpus)?,
            "programlisting" => make_codeblock(child)?,
            "parameterlist" => make_parameters(child, corpus)?,
            "table" => make_table(child, corpus)?,
            "para" => {
                finish_paragraph(&mut paragraph, &mut result);
                result.extend(make_blocks(Some(child), corpus)?);
                continue;
            }
            _ => {
                paragraph.push(make_phrase(child, corpus, false)?);
                continue;
            }
        };
        finish_paragraph(&mut paragraph, &mut result);
        result.push(block);
    }

    finish_paragraph(&mut paragraph, &mut result);
    Ok(result)
}

/// Turn the pending inline content into a paragraph, if anything is left
/// after trimming.
fn finish_paragraph(parts: &mut Vec<Inline>, out: &mut Vec<Block>) {
    let drop_first = match parts.first_mut() {
        Some(Inline::Text(first)) => {
            *first = first.trim_start().to_string();
            first.is_empty()
        }
        _ => false,
    };
    if drop_first {
        parts.remove(0);
    }

    let drop_last = match parts.last_mut() {
        Some(Inline::Text(last)) => {
            *last = last.trim_end().to_string();
            last.is_empty()
        }
        _ => false,
    };
    if drop_last {
        parts.pop();
    }

    // spaces after linebreaks usually cause issues
    for n in 1..parts.len() {
        if matches!(parts[n - 1], Inline::Linebreak) {
            if let Inline::Text(text) = &mut parts[n] {
                *text = text.trim_start().to_string();
            }
        }
    }

    if !parts.is_empty() {
        out.push(Block::Paragraph(Phrase::new(std::mem::take(parts))));
    }
}

fn make_list(element: &Element, corpus: &Corpus) -> Result<Block> {
    let mut items = Vec::new();
    for child in element.elements() {
        if child.tag != "listitem" {
            return Err(DoccaError::malformed(format!(
                "<{}> inside <{}>",
                child.tag, element.tag
            )));
        }
        items.push(make_blocks(Some(child), corpus)?);
    }

    let kind = match element.attr("type") {
        Some(value) => ListKind::from_attr(value),
        None if element.tag == "orderedlist" => Some(ListKind::Arabic),
        None => None,
    };
    Ok(Block::List(List { kind, items }))
}

fn make_parameters(element: &Element, corpus: &Corpus) -> Result<Block> {
    let mut items = Vec::new();
    for entry in element.elements() {
        if entry.tag != "parameteritem" {
            return Err(DoccaError::malformed(format!(
                "<{}> inside <parameterlist>",
                entry.tag
            )));
        }

        let mut description = None;
        let mut params = Vec::new();
        for item in entry.elements() {
            match item.tag.as_str() {
                "parameterdescription" => {
                    if description.is_some() {
                        return Err(DoccaError::malformed(
                            "parameter item with several descriptions",
                        ));
                    }
                    description = Some(item);
                }
                "parameternamelist" => {
                    let name = item.find("parametername");
                    params.push(ParameterItem {
                        type_: text_with_refs(item.find("parametertype"), corpus)?,
                        name: text_with_refs(name, corpus)?,
                        direction: name.and_then(|n| n.attr("direction")).map(str::to_string),
                    });
                }
                other => {
                    return Err(DoccaError::malformed(format!(
                        "<{other}> inside <parameteritem>"
                    )));
                }
            }
        }

        let description = description
            .ok_or_else(|| DoccaError::malformed("parameter item without description"))?;
        items.push(ParameterDescription {
            description: make_blocks(Some(description), corpus)?,
            params,
        });
    }

    Ok(Block::ParameterList(ParameterList {
        kind: element.attr("kind").map(ParameterListKind::from_attr),
        items,
    }))
}

fn make_section(element: &Element, corpus: &Corpus) -> Result<Block> {
    let title = match element.elements().next() {
        Some(first) if first.tag == "title" => Phrase::new(phrase_content(Some(first), corpus, false)?),
        _ => Phrase::default(),
    };

    let mut blocks = Vec::new();
    for child in element.find_all("para") {
        blocks.extend(make_blocks(Some(child), corpus)?);
    }

    Ok(Block::Section(Section {
        kind: element.attr("kind").map(SectionKind::from_attr),
        title,
        blocks,
    }))
}

fn make_codeblock(element: &Element) -> Result<Block> {
    let mut lines = Vec::new();
    for line in element.elements() {
        if line.tag != "codeline" {
            return Err(DoccaError::malformed(format!(
                "<{}> inside <programlisting>",
                line.tag
            )));
        }

        let mut text = String::new();
        let mut after_highlight = false;
        for node in &line.children {
            match node {
                // text before the first highlight is indentation noise
                Node::Text(tail) if after_highlight => text.push_str(tail),
                Node::Text(_) => {}
                Node::Element(highlight) if highlight.tag == "highlight" => {
                    after_highlight = true;
                    push_highlight(highlight, &mut text);
                }
                Node::Element(other) => {
                    return Err(DoccaError::malformed(format!(
                        "<{}> inside <codeline>",
                        other.tag
                    )));
                }
            }
        }
        lines.push(text);
    }

    Ok(Block::CodeBlock(CodeBlock { lines }))
}

fn push_highlight(highlight: &Element, out: &mut String) {
    for node in &highlight.children {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(part) if part.tag == "sp" => out.push(' '),
            Node::Element(part) if part.tag == "ref" => {
                out.push_str(part.leading_text().unwrap_or_default());
            }
            Node::Element(_) => {}
        }
    }
}

fn make_table(element: &Element, corpus: &Corpus) -> Result<Block> {
    let cols = element.attr("cols").and_then(|value| value.parse().ok());

    let mut children = element.elements().peekable();
    let caption = match children.peek() {
        Some(first) if first.tag == "caption" => {
            let caption = Phrase::new(phrase_content(Some(first), corpus, false)?);
            children.next();
            Some(caption)
        }
        _ => None,
    };

    let mut rows = Vec::new();
    for row in children {
        if row.tag != "row" {
            return Err(DoccaError::malformed(format!("<{}> inside <table>", row.tag)));
        }

        let mut cells = Vec::new();
        for cell in row.elements() {
            cells.push(Cell {
                blocks: make_blocks(Some(cell), corpus)?,
                col_span: span(cell.attr("colspan")),
                row_span: span(cell.attr("rowspan")),
                is_header: cell.attr("thead") == Some("yes"),
                horizontal_align: cell.attr("align").map(str::to_string),
                vertical_align: cell.attr("valign").map(str::to_string),
                width: cell.attr("width").map(str::to_string),
                role: cell.attr("class").map(str::to_string),
            });
        }
        rows.push(cells);
    }

    Ok(Block::Table(Table { cols, caption, rows }))
}

fn span(value: Option<&str>) -> usize {
    value
        .and_then(|value| value.parse().ok())
        .filter(|&span| span > 0)
        .unwrap_or(1)
}

// ═══════════════════════════════════════════════════════════════════════
// Phrases
// ═══════════════════════════════════════════════════════════════════════

/// Build the inline content of an element.
///
/// With `allow_missing_refs`, references to unknown entities become plain
/// phrases instead of errors.
///
/// # Errors
///
/// Fails on malformed inline markup, and on unknown references unless they
/// are allowed.
pub fn phrase_content(
    element: Option<&Element>,
    corpus: &Corpus,
    allow_missing_refs: bool,
) -> Result<Vec<Inline>> {
    let Some(element) = element else {
        return Ok(Vec::new());
    };

    element
        .children
        .iter()
        .map(|node| match node {
            Node::Text(text) => Ok(Inline::Text(remove_endlines(text))),
            Node::Element(child) => make_phrase(child, corpus, allow_missing_refs),
        })
        .collect()
}

fn make_phrase(element: &Element, corpus: &Corpus, allow_missing_refs: bool) -> Result<Inline> {
    let content = |element| -> Result<Phrase> {
        Ok(Phrase::new(phrase_content(Some(element), corpus, allow_missing_refs)?))
    };

    Ok(match element.tag.as_str() {
        "bold" => Inline::Strong(content(element)?),
        "computeroutput" | "verbatim" => Inline::Monospaced(content(element)?),
        "emphasis" => Inline::Emphasised(content(element)?),
        "linebreak" => Inline::Linebreak,
        "ulink" => {
            let url = element
                .non_empty_attr("url")
                .ok_or_else(|| DoccaError::malformed("<ulink> without url"))?;
            Inline::UrlLink(UrlLink {
                url: url.to_string(),
                content: content(element)?,
            })
        }
        "ref" => make_entity_reference(element, None, corpus, allow_missing_refs)?,
        other => {
            debug!(tag = other, "Treating unknown inline element as plain phrase");
            Inline::Phrase(content(element)?)
        }
    })
}

/// Resolve a cross-reference element.
///
/// `refid` overrides the element's own `refid` attribute. A known target
/// produces an [`Inline::EntityRef`]; an unknown one produces a plain
/// phrase of the element's text when `allow_missing_refs` is set.
///
/// # Errors
///
/// Returns [`DoccaError::MalformedInput`] when no identifier is available
/// and [`DoccaError::UnresolvedReference`] for an unknown target that is
/// not allowed to be missing.
pub fn make_entity_reference(
    element: &Element,
    refid: Option<&str>,
    corpus: &Corpus,
    allow_missing_refs: bool,
) -> Result<Inline> {
    let refid = refid
        .or_else(|| element.non_empty_attr("refid"))
        .ok_or_else(|| DoccaError::malformed(format!("<{}> without refid", element.tag)))?;

    if let Some(entity) = corpus.find(refid) {
        return Ok(Inline::EntityRef(EntityRef {
            entity,
            content: Phrase::new(phrase_content(Some(element), corpus, allow_missing_refs)?),
        }));
    }

    if allow_missing_refs {
        return Ok(Inline::Phrase(Phrase::new(phrase_content(
            Some(element),
            corpus,
            true,
        )?)));
    }

    Err(DoccaError::UnresolvedReference {
        refid: refid.to_string(),
    })
}

/// Inline content where unknown references degrade to text.
///
/// # Errors
///
/// Fails only on malformed inline markup.
pub fn text_with_refs(element: Option<&Element>, corpus: &Corpus) -> Result<Phrase> {
    Ok(Phrase::new(phrase_content(element, corpus, true)?))
}

/// Like [`text_with_refs`], with a leading `constexpr` removed.
///
/// # Errors
///
/// Fails only on malformed inline markup.
pub fn resolve_type(element: Option<&Element>, corpus: &Corpus) -> Result<Phrase> {
    let mut result = text_with_refs(element, corpus)?;
    strip_leading_keywords(&mut result, &["constexpr"]);
    Ok(result)
}

/// Return type of a function: [`resolve_type`], also dropping the `friend`
/// that Doxygen puts in front of the type of friend functions.
///
/// # Errors
///
/// Fails only on malformed inline markup.
pub fn resolve_return_type(element: Option<&Element>, corpus: &Corpus) -> Result<Phrase> {
    let mut result = text_with_refs(element, corpus)?;
    strip_leading_keywords(&mut result, &["constexpr", "friend"]);
    Ok(result)
}

fn strip_leading_keywords(phrase: &mut Phrase, keywords: &[&str]) {
    let Some(first) = phrase.first_text_mut() else {
        return;
    };
    let mut rest = first.as_str();
    while let Some(tail) = keywords.iter().find_map(|keyword| {
        rest.strip_prefix(keyword)
            .filter(|tail| tail.is_empty() || tail.starts_with(char::is_whitespace))
    }) {
        rest = tail.trim_start();
    }
    *first = rest.to_string();
}

fn remove_endlines(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '\r' | '\n')).collect()
}
