//! Rendering tests

mod common;

use std::sync::Arc;

use common::{corpus, namespace, sample};
use docca::*;
use pretty_assertions::assert_eq;

fn render_corpus(config: &Config, corpus: Corpus, source: &str) -> Result<String> {
    let mut env = environment(config, TemplateLoader::default());
    env.add_template_owned("test", source.to_string()).unwrap();
    render(&env, "test", Arc::new(corpus))
}

fn render_sample(source: &str) -> String {
    render_corpus(&Config::default(), sample(), source).unwrap()
}

fn render_builtin(options: &str, corpus: Corpus) -> String {
    let config = Config::from_json([options]).unwrap();
    let env = environment(&config, TemplateLoader::default());
    render(&env, DEFAULT_TEMPLATE, Arc::new(corpus)).unwrap()
}

/// Id and nesting depth of every section, in output order.
fn section_depths(output: &str) -> Vec<(String, usize)> {
    let mut depth = 0;
    let mut sections = Vec::new();
    for line in output.lines() {
        if let Some(rest) = line.strip_prefix("[section:") {
            let id = rest.split(' ').next().unwrap_or_default();
            sections.push((id.to_string(), depth));
            depth += 1;
        } else if line.starts_with("[endsect]") {
            depth -= 1;
        }
    }
    assert_eq!(depth, 0, "unbalanced sections in:\n{output}");
    sections
}

/// A namespace `std` with an `ostream` documented elsewhere, and a
/// namespace `ns` whose brief refers to it.
fn external_corpus() -> Corpus {
    let std = namespace(
        "namespacestd",
        "std",
        r#"<sectiondef kind="typedef">
          <memberdef kind="typedef" id="std_ostream" prot="public">
            <type>void</type><name>ostream</name>
            <briefdescription><para>!!!</para></briefdescription>
            <detaileddescription><para><simplesect kind="see"><para>  http://ostream.org  </para></simplesect></para></detaileddescription>
          </memberdef>
        </sectiondef>"#,
    );
    let ns = namespace(
        "namespacens",
        "ns",
        r#"<briefdescription><para>Writes to <ref refid="std_ostream" kindref="member">output stream</ref>.</para></briefdescription>"#,
    );
    corpus(&[&std, &ns])
}

fn described_namespace(brief: &str, detail: &str) -> Corpus {
    let sections = format!(
        "<briefdescription>{brief}</briefdescription><detaileddescription>{detail}</detaileddescription>"
    );
    corpus(&[&namespace("namespacens", "ns", &sections)])
}

// ═══════════════════════════════════════════════════════════════════════
// Entities
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_entity_lookup_by_id() {
    assert_eq!(
        render_sample("{{ entities['classns1_1_1klass'].fully_qualified_name }}"),
        "ns1::klass"
    );
    assert_eq!(render_sample("{{ entities|length }}"), "20");
}

#[test]
fn test_type_tests() {
    let source = "{% set k = entities['classns1_1_1klass'] %}\
        {{ k is Entity }} {{ k is Class }} {{ k is Type }} {{ k is Scope }} \
        {{ k is Struct }} {{ k is Function }}";
    assert_eq!(render_sample(source), "True True True True False False");

    let source = "{% set r = entities['ns1_color_red'] %}\
        {{ r is Enumerator }} {{ r is Variable }} {{ r is Value }} {{ r is Type }}";
    assert_eq!(render_sample(source), "True True True False");

    let source = "{{ entities['structns1_1_1base'] is Struct }} \
        {{ entities['group__utilities'] is Group }} {{ 'text' is Entity }}";
    assert_eq!(render_sample(source), "True True False");
}

#[test]
fn test_members_and_overload_sets() {
    let source = "{% for m in entities['classns1_1_1klass'].members %}\
        {{ m.name }}{% if m is OverloadSet %}({{ m|length }}){% endif %} \
        {% endfor %}";
    assert_eq!(
        render_sample(source),
        "klass(1) ~klass(1) g(2) make(1) swap(1) data_ "
    );

    let source = "{% set s = entities['klass_g1'].overload_set %}\
        {{ s.name }} {{ s.access }} {{ s.brief|length }} {{ s[1].id }}";
    assert_eq!(render_sample(source), "g public 2 klass_g2");
}

#[test]
fn test_function_attributes() {
    let source = "{% set g = entities['klass_g1'] %}\
        {{ g.kind }} {{ g.is_noexcept }} {{ g.noexcept_condition }} \
        {{ g.overload_index }} {{ g.is_sole_overload }} \
        {{ g.virtual_kind == VirtualKind.nonvirtual }} {{ g.return_type.text }}";
    assert_eq!(
        render_sample(source),
        "nonstatic True sizeof(T) > 1 0 False True int"
    );

    let source = "{% set f = entities['klass_swap'] %}\
        {{ f.kind == FunctionKind.friend }} \
        {% for p in f.parameters %}{{ p.type.text }}{{ p.name }};{% endfor %}";
    assert_eq!(render_sample(source), "True klass &a;klass &b;");

    assert_eq!(
        render_sample("{{ entities['klass_make'].overload_index is none }}"),
        "True"
    );
}

#[test]
fn test_class_attributes() {
    let source = "{% set k = entities['classns1_1_1klass'] %}\
        {% for b in k.bases %}{{ b.access }}:{{ b.is_virtual }}:{{ b.base.text }};{% endfor %} \
        {% for p in k.template_parameters %}{{ p.type.text }} {{ p.name }}\
        {% if p.default_value %}={{ p.default_value.text }}{% endif %},{% endfor %} \
        {{ k.declarator }} {{ k.location.file }}:{{ k.location.line }} \
        {{ k.groups[0].name }} {{ k.scope.name }}";
    assert_eq!(
        render_sample(source),
        "public:False:ns1::base;protected:True:std::exception; \
         class T,int N=0, class ns1/klass.hpp:10 Utilities ns1"
    );
}

#[test]
fn test_enum_attributes() {
    let source = "{% set c = entities['ns1_color'] %}{{ c.is_scoped }} \
        {% for v in c.objects %}{{ v.name }}{{ v.value.text }} {{ v.enum.name }};{% endfor %}";
    assert_eq!(render_sample(source), "False red= 1 color;green color;");

    let source = "{% set m = entities['ns1_mode'] %}\
        {{ m.is_scoped }} {{ m.underlying_type.text }} {{ m.declarator }}";
    assert_eq!(render_sample(source), "True unsigned char enum class");
}

#[test]
fn test_lookup_method() {
    let source = "{% set k = entities['classns1_1_1klass'] %}\
        {{ k.lookup('ns1::base').name }} {{ k.lookup('g')|length }} {{ k.lookup('missing') is none }}";
    assert_eq!(render_sample(source), "base 2 True");
}

#[test]
fn test_missing_attribute_is_an_error() {
    let result = render_corpus(
        &Config::default(),
        sample(),
        "{{ entities['namespacens1'].bases }}",
    );
    assert!(matches!(result, Err(DoccaError::Template(_))));
}

// ═══════════════════════════════════════════════════════════════════════
// Anchors
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_anchors() {
    let source = "{{ entities['classns1_1_1klass']|anchor }} \
        {{ entities['klass_g2']|anchor }} \
        {{ entities['klass_g2']|anchor(prefer_overload=true) }} \
        {{ entities['klass_swap']|anchor }} \
        {{ entities['ns1_color_red']|anchor }} \
        {{ entities['klass_make']|anchor }} \
        {{ entities['klass_g1'].overload_set|anchor }}";
    assert_eq!(
        render_sample(source),
        "ns1__klass ns1__klass.g.overload2 ns1__klass.g ns1__klass.swap_fr \
         ns1__color ns1__klass.make ns1__klass.g"
    );
}

#[test]
fn test_link_uses_prefix() {
    let config = Config::from_json([r#"{"link_prefix": "ref."}"#]).unwrap();
    let output = render_corpus(
        &config,
        sample(),
        "{{ entities['ns1_f2']|link }} {{ entities['classns1_1_1klass'].description|qbk }}",
    )
    .unwrap();
    assert_eq!(
        output,
        "ref.ns1__f.overload2 Derives from [link ref.ns1__base `base`].\n\n"
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Content
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_content_navigation() {
    let source = "{% for b in entities['classns1_1_1klass'].description %}\
        {{ b is Paragraph }} {{ b is Block }}\
        {% for p in b %}|{{ p is EntityRef }}{% endfor %} \
        {{ b[1].entity.name }} {{ b[1].text }} {{ b.text }}{% endfor %}";
    assert_eq!(
        render_sample(source),
        "True True|False|True|False base base Derives from base."
    );
}

#[test]
fn test_qbk_phrases() {
    let corpus = described_namespace(
        r#"<para>Use <computeroutput>x[0]</computeroutput> or <bold>[b]</bold>, <emphasis>see</emphasis> <ulink url="https://u">u</ulink>.</para>"#,
        "",
    );
    let output = render_corpus(
        &Config::default(),
        corpus,
        "{{ entities['namespacens'].brief|qbk }}",
    )
    .unwrap();
    assert_eq!(output, "Use `x[0]` or [*\\[b\\]], ['see] [@https://u u].\n\n");
}

#[test]
fn test_qbk_blocks() {
    let corpus = described_namespace(
        "",
        r#"<para><parameterlist kind="param"><parameteritem>
            <parameternamelist><parametername>x</parametername></parameternamelist>
            <parameterdescription><para>The x.</para></parameterdescription>
        </parameteritem></parameterlist>
        <simplesect kind="return"><para>Nothing.</para></simplesect>
        <itemizedlist><listitem><para>one</para></listitem><listitem><para>two</para></listitem></itemizedlist></para>"#,
    );
    let output = render_corpus(
        &Config::default(),
        corpus,
        "{{ entities['namespacens'].description|qbk }}",
    )
    .unwrap();
    assert_eq!(
        output,
        "[heading Parameters]\n\
         [table [[Name][Description]]\n  [\n    [`x`]\n    [\n      The x.\n    ]\n  ]\n]\n\n\
         [heading Return Value]\nNothing.\n\n\
         * one\n* two\n\n"
    );
}

#[test]
fn test_parameter_list_navigation() {
    let corpus = described_namespace(
        "",
        r#"<para><parameterlist kind="templateparam"><parameteritem>
            <parameternamelist><parametername direction="inout">T</parametername></parameternamelist>
            <parameternamelist><parametername>U</parametername></parameternamelist>
            <parameterdescription><para>Types.</para></parameterdescription>
        </parameteritem></parameterlist></para>"#,
    );
    let source = "{% for b in entities['namespacens'].description %}\
        {{ b.kind == ParameterList.TemplateParameters }} \
        {% for item in b %}{% for p in item %}{{ p.name.text }}:{{ p.is_in }}:{{ p.is_out }} {% endfor %}\
        {{ item.description|qbk|trim }}{% endfor %}{% endfor %}";
    let output = render_corpus(&Config::default(), corpus, source).unwrap();
    assert_eq!(output, "True T:True:True U:False:False Types.");
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Template
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_builtin_template() {
    let env = environment(&Config::default(), TemplateLoader::default());
    let output = render(&env, DEFAULT_TEMPLATE, Arc::new(sample())).unwrap();

    for expected in [
        "[section:ns1__klass ns1::klass]",
        "template<class T, int N = 0>",
        "class klass : public ns1::base, protected virtual std::exception;",
        "[section:ns1__klass.g ns1::klass::g]",
        "[section:ns1__klass.g.overload1 ns1::klass::g (overload 1 of 2)]",
        "int g() const noexcept(sizeof(T) > 1);",
        "int g(int) = delete;",
        "friend void swap(klass & a, klass & b);",
        "[section:ns1__color ns1::color]",
        "enum class mode : unsigned char;",
        "using ints = std::vector< int >;",
        "int answer = 42;",
        "[section:ns1__f ns1::f]",
        "Declared in [^ns1/klass.hpp]",
    ] {
        assert!(output.contains(expected), "missing {expected:?} in:\n{output}");
    }
    assert!(!output.contains("data_"));
    assert!(!output.contains("Convenience header"));
    assert!(section_depths(&output).iter().all(|(_, depth)| *depth == 0));
}

#[test]
fn test_builtin_template_with_private_members() {
    let config = Config::from_json([r#"{"include_private": true}"#]).unwrap();
    let env = environment(&config, TemplateLoader::default());
    let output = render(&env, DEFAULT_TEMPLATE, Arc::new(sample())).unwrap();
    assert!(output.contains("[section:ns1__klass.data_ ns1::klass::data_]"));
    assert!(output.contains("int data_[4];"));
}

// ═══════════════════════════════════════════════════════════════════════
// Options
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_nested_layout() {
    let output = render_builtin(r#"{"legacy_behavior": false}"#, sample());
    let sections = section_depths(&output);
    for (id, depth) in [
        ("ns1__klass", 0),
        ("g", 1),
        ("overload2", 2),
        ("swap_fr", 1),
        ("make", 1),
        ("ns1__f", 0),
        ("overload1", 1),
        ("ns1__color", 0),
    ] {
        assert!(
            sections.contains(&(id.to_string(), depth)),
            "missing {id} at depth {depth} in {sections:?}"
        );
    }

    for expected in [
        "[section:ns1__klass ns1::klass]\n[indexterm1 klass]",
        "[section:g ns1::klass::g]\n[indexterm2 g..klass]",
        "[section:overload2 ns1::klass::g (overload 2 of 2)]",
        "[link ns1__klass.g.overload2 more...]",
        "[section:ns1__f ns1::f]\n[indexterm1 f]",
    ] {
        assert!(output.contains(expected), "missing {expected:?} in:\n{output}");
    }
}

#[test]
fn test_local_anchors() {
    let source = "{{ entities['classns1_1_1klass']|anchor(local=true) }} \
        {{ entities['klass_g2']|anchor(local=true) }} \
        {{ entities['klass_g1'].overload_set|anchor(local=true) }} \
        {{ entities['klass_swap']|anchor(local=true) }} \
        {{ entities['ns1_f1']|anchor(local=true) }} \
        {{ entities['ns1_color_red']|anchor(local=true) }}";
    assert_eq!(
        render_sample(source),
        "ns1__klass overload2 g swap_fr overload1 ns1__color"
    );
}

#[test]
fn test_default_namespace_abridges_names() {
    let source = "{{ entities['namespacens1']|abridged_fqn }} \
        {{ entities['classns1_1_1klass']|abridged_fqn }} \
        {{ entities['klass_g1'].overload_set|abridged_fqn }}";
    assert_eq!(render_sample(source), "ns1 ns1::klass ns1::klass::g");

    let config = Config::from_json([r#"{"default_namespace": "ns1"}"#]).unwrap();
    assert_eq!(
        render_corpus(&config, sample(), source).unwrap(),
        "ns1 klass klass::g"
    );

    let config = Config::from_json([r#"{"default_namespace": "ns"}"#]).unwrap();
    assert_eq!(
        render_corpus(&config, sample(), source).unwrap(),
        "ns1 ns1::klass ns1::klass::g"
    );

    let output = render_builtin(r#"{"default_namespace": "ns1"}"#, sample());
    assert!(output.contains("[section:ns1__klass klass]"));
    assert!(output.contains("[section:ns1__f f]"));
}

#[test]
fn test_replace_strings() {
    let config = Config::from_json([r#"{"replace_strings": {"class": "CLASS"}}"#]).unwrap();
    let output = render_corpus(
        &config,
        sample(),
        "{{ entities['classns1_1_1klass'].brief|qbk }}{{ '[class]'|qbk }}",
    )
    .unwrap();
    assert_eq!(output, "A CLASS template.\n\n\\[CLASS\\]");
}

#[test]
fn test_external_marker() {
    let source = "{{ entities['namespacens'].brief|qbk }}";
    assert_eq!(
        render_corpus(&Config::default(), external_corpus(), source).unwrap(),
        "Writes to [link std__ostream `output stream`].\n\n"
    );

    let config = Config::from_json([r#"{"external_marker": "!!!"}"#]).unwrap();
    assert_eq!(
        render_corpus(&config, external_corpus(), source).unwrap(),
        "Writes to [@http://ostream.org `output stream`].\n\n"
    );
    assert_eq!(
        render_corpus(&config, external_corpus(), "{{ entities['std_ostream']|external_url }}")
            .unwrap(),
        "http://ostream.org"
    );

    let output = render_builtin(r#"{}"#, external_corpus());
    assert!(output.contains("[section:std__ostream std::ostream]"));
    let output = render_builtin(r#"{"external_marker": "!!!"}"#, external_corpus());
    assert!(!output.contains("[section:std__ostream"));
}

#[test]
fn test_convenience_header() {
    let output = render_builtin(r#"{"convenience_header": "ns1.hpp"}"#, sample());
    assert!(output.contains("Convenience header [include_file ns1.hpp]"));
}
