//! Description content tests

use docca::content::*;
use docca::xml::Element;
use docca::*;
use pretty_assertions::assert_eq;

fn blocks_in(markup: &str, corpus: &Corpus) -> Vec<Block> {
    make_blocks(Some(&Element::parse(markup).unwrap()), corpus).unwrap()
}

fn blocks(markup: &str) -> Vec<Block> {
    blocks_in(markup, &Corpus::new())
}

fn text(value: &str) -> Inline {
    Inline::Text(value.to_string())
}

fn paragraph(parts: Vec<Inline>) -> Block {
    Block::Paragraph(Phrase::new(parts))
}

fn namespace_corpus() -> Corpus {
    let mut corpus = Corpus::new();
    corpus
        .add_document(
            r#"<doxygen><compounddef id="namespacens1" kind="namespace">
                <compoundname>ns1</compoundname>
            </compounddef></doxygen>"#,
        )
        .unwrap();
    corpus.resolve_all().unwrap();
    corpus
}

// ═══════════════════════════════════════════════════════════════════════
// Paragraphs
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_paragraphs_are_split_at_para() {
    let result = blocks("<d><para>first</para>\n<para>second <bold>b</bold></para></d>");
    assert_eq!(
        result,
        vec![
            paragraph(vec![text("first")]),
            paragraph(vec![
                text("second "),
                Inline::Strong(Phrase::new(vec![text("b")])),
            ]),
        ]
    );
}

#[test]
fn test_nested_styles_flatten_to_leaf_text() {
    let corpus = Corpus::new();
    let result = blocks("<d><para>a <bold>b <emphasis>c</emphasis></bold> d</para></d>");
    assert_eq!(result.len(), 1);
    let phrase = result[0].as_paragraph().unwrap();
    assert_eq!(phrase.text(&corpus), "a b c d");
    assert_eq!(paragraphs_text(&result, &corpus), "a b c d");
}

#[test]
fn test_block_inside_para_splits_the_paragraph() {
    let result = blocks(
        "<d><para>before<itemizedlist>\
            <listitem><para>one</para></listitem>\
            <listitem><para>two</para></listitem>\
         </itemizedlist>after</para></d>",
    );
    assert_eq!(
        result,
        vec![
            paragraph(vec![text("before")]),
            Block::List(List {
                kind: None,
                items: vec![
                    vec![paragraph(vec![text("one")])],
                    vec![paragraph(vec![text("two")])],
                ],
            }),
            paragraph(vec![text("after")]),
        ]
    );
}

#[test]
fn test_paragraphs_text_skips_other_blocks() {
    let corpus = Corpus::new();
    let result = blocks_in(
        "<d><para>a<programlisting><codeline/></programlisting>b</para></d>",
        &corpus,
    );
    assert_eq!(result.len(), 3);
    assert_eq!(paragraphs_text(&result, &corpus), "ab");
}

// ═══════════════════════════════════════════════════════════════════════
// Lists and Sections
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_ordered_list_kinds() {
    let result = blocks(
        r#"<d><para><orderedlist type="a"><listitem><para>x</para></listitem></orderedlist>
           <orderedlist><listitem><para>y</para></listitem></orderedlist></para></d>"#,
    );
    let kinds: Vec<Option<ListKind>> = result
        .iter()
        .filter_map(|block| match block {
            Block::List(list) => Some(list.kind),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec![Some(ListKind::LowerLatin), Some(ListKind::Arabic)]);
}

#[test]
fn test_list_with_foreign_child_is_malformed() {
    let markup = Element::parse("<d><itemizedlist><para/></itemizedlist></d>").unwrap();
    assert!(matches!(
        make_blocks(Some(&markup), &Corpus::new()),
        Err(DoccaError::MalformedInput(_))
    ));
}

#[test]
fn test_simple_sections() {
    let result = blocks(
        r#"<d><para><simplesect kind="return"><para>The value</para></simplesect>
           <simplesect kind="par"><title>Custom</title><para>Body</para></simplesect></para></d>"#,
    );
    assert_eq!(
        result,
        vec![
            Block::Section(Section {
                kind: Some(SectionKind::Returns),
                title: Phrase::default(),
                blocks: vec![paragraph(vec![text("The value")])],
            }),
            Block::Section(Section {
                kind: Some(SectionKind::Custom),
                title: Phrase::new(vec![text("Custom")]),
                blocks: vec![paragraph(vec![text("Body")])],
            }),
        ]
    );
}

#[test]
fn test_unknown_section_kind_is_kept() {
    let result = blocks(r#"<d><simplesect kind="todo"><para>x</para></simplesect></d>"#);
    let Block::Section(section) = &result[0] else {
        panic!("expected a section, got {result:?}");
    };
    assert_eq!(section.kind, Some(SectionKind::Other("todo".to_string())));
    assert_eq!(section.kind.as_ref().unwrap().as_str(), "todo");
}

// ═══════════════════════════════════════════════════════════════════════
// Code, Parameters and Tables
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_code_block_lines() {
    let result = blocks(
        r#"<d><programlisting>
            <codeline><highlight class="normal">int<sp/>x<sp/>=<sp/><ref refid="a">f</ref>();</highlight></codeline>
            <codeline><highlight class="normal"></highlight></codeline>
        </programlisting></d>"#,
    );
    assert_eq!(
        result,
        vec![Block::CodeBlock(CodeBlock {
            lines: vec!["int x = f();".to_string(), String::new()],
        })]
    );
}

#[test]
fn test_parameter_list() {
    let result = blocks(
        r#"<d><parameterlist kind="param"><parameteritem>
            <parameternamelist><parametername direction="in">a</parametername></parameternamelist>
            <parameternamelist><parametername>b</parametername></parameternamelist>
            <parameterdescription><para>Inputs</para></parameterdescription>
        </parameteritem></parameterlist></d>"#,
    );
    let Block::ParameterList(list) = &result[0] else {
        panic!("expected a parameter list, got {result:?}");
    };
    assert_eq!(list.kind, Some(ParameterListKind::Parameters));
    assert_eq!(list.items.len(), 1);

    let item = &list.items[0];
    assert_eq!(item.description, vec![paragraph(vec![text("Inputs")])]);
    assert_eq!(item.params.len(), 2);
    assert_eq!(item.params[0].name, Phrase::new(vec![text("a")]));
    assert!(item.params[0].is_in());
    assert!(!item.params[0].is_out());
    assert_eq!(item.params[1].direction, None);
    assert!(item.params[1].type_.is_empty());
}

#[test]
fn test_parameter_item_needs_description() {
    let markup = Element::parse(
        "<d><parameterlist><parameteritem><parameternamelist/></parameteritem></parameterlist></d>",
    )
    .unwrap();
    assert!(make_blocks(Some(&markup), &Corpus::new()).is_err());
}

#[test]
fn test_table() {
    let result = blocks(
        r#"<d><table rows="1" cols="2"><caption>Cap</caption><row>
            <entry thead="yes"><para>H</para></entry>
            <entry thead="no" colspan="2" align="center" class="x"><para>v</para></entry>
        </row></table></d>"#,
    );
    let Block::Table(table) = &result[0] else {
        panic!("expected a table, got {result:?}");
    };
    assert_eq!(table.cols, Some(2));
    assert_eq!(table.caption, Some(Phrase::new(vec![text("Cap")])));
    assert_eq!(table.rows.len(), 1);

    let row = &table.rows[0];
    assert!(row[0].is_header);
    assert!(!row[1].is_header);
    assert_eq!(row[1].col_span, 2);
    assert_eq!(row[1].row_span, 1);
    assert_eq!(row[1].horizontal_align.as_deref(), Some("center"));
    assert_eq!(row[1].role.as_deref(), Some("x"));
    assert_eq!(row[1].blocks, vec![paragraph(vec![text("v")])]);
}

// ═══════════════════════════════════════════════════════════════════════
// Phrases
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_styles() {
    let result = blocks(
        r#"<d><para><emphasis>e</emphasis><computeroutput>c</computeroutput><linebreak/> <ulink url="https://x.org">site</ulink></para></d>"#,
    );
    assert_eq!(
        result,
        vec![paragraph(vec![
            Inline::Emphasised(Phrase::new(vec![text("e")])),
            Inline::Monospaced(Phrase::new(vec![text("c")])),
            Inline::Linebreak,
            text(""),
            Inline::UrlLink(UrlLink {
                url: "https://x.org".to_string(),
                content: Phrase::new(vec![text("site")]),
            }),
        ])]
    );
}

#[test]
fn test_unknown_inline_becomes_plain_phrase() {
    let result = blocks("<d><para><anchor-like>x</anchor-like></para></d>");
    assert_eq!(
        result,
        vec![paragraph(vec![Inline::Phrase(Phrase::new(vec![text("x")]))])]
    );
}

#[test]
fn test_reference_to_known_entity() {
    let corpus = namespace_corpus();
    let result = blocks_in(
        r#"<d><para>See <ref refid="namespacens1" kindref="compound">ns1</ref></para></d>"#,
        &corpus,
    );
    let ns1 = corpus.find("namespacens1").unwrap();
    assert_eq!(
        result,
        vec![paragraph(vec![
            text("See "),
            Inline::EntityRef(EntityRef {
                entity: ns1,
                content: Phrase::new(vec![text("ns1")]),
            }),
        ])]
    );
    assert_eq!(paragraphs_text(&result, &corpus), "See ns1");
}

#[test]
fn test_reference_to_unknown_entity() {
    let corpus = namespace_corpus();
    let markup = Element::parse(r#"<d><para><ref refid="missing">m</ref></para></d>"#).unwrap();
    assert!(matches!(
        make_blocks(Some(&markup), &corpus),
        Err(DoccaError::UnresolvedReference { refid }) if refid == "missing"
    ));

    let markup = Element::parse(r#"<type>const <ref refid="missing">m</ref> &amp;</type>"#).unwrap();
    let phrase = text_with_refs(Some(&markup), &corpus).unwrap();
    assert_eq!(
        phrase,
        Phrase::new(vec![
            text("const "),
            Inline::Phrase(Phrase::new(vec![text("m")])),
            text(" &"),
        ])
    );
    assert_eq!(phrase.text(&corpus), "const m &");
}

#[test]
fn test_empty_link_text_falls_back() {
    let corpus = namespace_corpus();
    let link = EntityRef {
        entity: corpus.find("namespacens1").unwrap(),
        content: Phrase::default(),
    };
    assert_eq!(link.text(&corpus), "ns1");

    let url = UrlLink {
        url: "https://x.org".to_string(),
        content: Phrase::default(),
    };
    assert_eq!(url.text(&corpus), "https://x.org");
}
