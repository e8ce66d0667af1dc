//! Doxygen fixtures shared by the integration tests

#![allow(dead_code)]

use docca::Corpus;

pub const NS1: &str = r#"<doxygen><compounddef id="namespacens1" kind="namespace">
  <compoundname>ns1</compoundname>
  <innerclass refid="classns1_1_1klass" prot="public">ns1::klass</innerclass>
  <innerclass refid="structns1_1_1base" prot="public">ns1::base</innerclass>
  <sectiondef kind="func">
    <memberdef kind="function" id="ns1_f1" prot="public" static="no">
      <type>void</type><name>f</name><argsstring>(int x)</argsstring>
      <param><type>int</type><declname>x</declname></param>
      <briefdescription><para>Does f.</para></briefdescription>
    </memberdef>
    <memberdef kind="function" id="ns1_f2" prot="public" static="no">
      <type>void</type><name>f</name><argsstring>(double x)</argsstring>
      <param><type>double</type><declname>x</declname><defval>1.0</defval></param>
      <briefdescription><para>Does f differently.</para></briefdescription>
    </memberdef>
  </sectiondef>
  <sectiondef kind="enum">
    <memberdef kind="enum" id="ns1_color" prot="public" strong="no">
      <type></type><name>color</name>
      <enumvalue id="ns1_color_red" prot="public"><name>red</name><initializer>= 1</initializer></enumvalue>
      <enumvalue id="ns1_color_green" prot="public"><name>green</name></enumvalue>
      <briefdescription><para>Colors.</para></briefdescription>
    </memberdef>
    <memberdef kind="enum" id="ns1_mode" prot="public" strong="yes">
      <type>unsigned char</type><name>mode</name>
      <enumvalue id="ns1_mode_on" prot="public"><name>on</name></enumvalue>
    </memberdef>
  </sectiondef>
  <sectiondef kind="typedef">
    <memberdef kind="typedef" id="ns1_ints" prot="public">
      <type>std::vector&lt; int &gt;</type><name>ints</name>
    </memberdef>
  </sectiondef>
  <sectiondef kind="var">
    <memberdef kind="variable" id="ns1_answer" prot="public" static="no" constexpr="yes">
      <type>constexpr int</type><name>answer</name><initializer>= 42</initializer>
    </memberdef>
  </sectiondef>
  <briefdescription><para>The first namespace.</para></briefdescription>
</compounddef></doxygen>"#;

pub const KLASS: &str = r#"<doxygen><compounddef id="classns1_1_1klass" kind="class" prot="public">
  <compoundname>ns1::klass</compoundname>
  <basecompoundref refid="structns1_1_1base" prot="public" virt="non-virtual">ns1::base</basecompoundref>
  <basecompoundref prot="protected" virt="virtual">std::exception</basecompoundref>
  <templateparamlist>
    <param><type>class</type><declname>T</declname></param>
    <param><type>int</type><declname>N</declname><defval>0</defval></param>
  </templateparamlist>
  <sectiondef kind="public-func">
    <memberdef kind="function" id="klass_ctor" prot="public" static="no" explicit="yes">
      <type></type><name>klass</name><argsstring>()</argsstring>
    </memberdef>
    <memberdef kind="function" id="klass_dtor" prot="public" static="no" virt="virtual">
      <name>~klass</name><argsstring>()</argsstring>
    </memberdef>
    <memberdef kind="function" id="klass_g1" prot="public" static="no" const="yes" noexcept="yes">
      <type>int</type><name>g</name><argsstring>() const noexcept(sizeof(T) &gt; 1)</argsstring>
      <briefdescription><para>First g.</para></briefdescription>
    </memberdef>
    <memberdef kind="function" id="klass_g2" prot="public" static="no">
      <type>int</type><name>g</name><argsstring>(int) =delete</argsstring>
      <param><type>int</type></param>
      <briefdescription><para>Second g.</para></briefdescription>
    </memberdef>
  </sectiondef>
  <sectiondef kind="public-static-func">
    <memberdef kind="function" id="klass_make" prot="public" static="yes">
      <type><ref refid="classns1_1_1klass" kindref="compound">klass</ref></type>
      <name>make</name><argsstring>()</argsstring>
    </memberdef>
  </sectiondef>
  <sectiondef kind="friend">
    <memberdef kind="friend" id="klass_friend_class" prot="public">
      <type>class</type><name>other</name>
    </memberdef>
    <memberdef kind="friend" id="klass_swap" prot="public" static="no">
      <type>friend void</type><name>swap</name><argsstring>(klass &amp;a, klass &amp;b)</argsstring>
      <param><type><ref refid="classns1_1_1klass" kindref="compound">klass</ref> &amp;</type><declname>a</declname></param>
      <param><type><ref refid="classns1_1_1klass" kindref="compound">klass</ref> &amp;</type><declname>b</declname></param>
    </memberdef>
  </sectiondef>
  <sectiondef kind="private-attrib">
    <memberdef kind="variable" id="klass_data" prot="private" static="no">
      <type>int</type><name>data_</name><argsstring>[4]</argsstring>
    </memberdef>
  </sectiondef>
  <briefdescription><para>A class template.</para></briefdescription>
  <detaileddescription><para>Derives from <ref refid="structns1_1_1base" kindref="compound">base</ref>.</para></detaileddescription>
  <location file="ns1/klass.hpp" line="10" column="1"/>
</compounddef></doxygen>"#;

pub const BASE: &str = r#"<doxygen><compounddef id="structns1_1_1base" kind="struct" prot="public">
  <compoundname>ns1::base</compoundname>
  <location file="ns1/base.hpp" line="3" column="1"/>
</compounddef></doxygen>"#;

pub const GROUP: &str = r#"<doxygen><compounddef id="group__utilities" kind="group">
  <compoundname>utilities</compoundname>
  <title>Utilities</title>
  <innerclass refid="classns1_1_1klass" prot="public">ns1::klass</innerclass>
</compounddef></doxygen>"#;

pub const INDEX: &str = r#"<doxygenindex>
  <compound refid="namespacens1" kind="namespace"><name>ns1</name></compound>
  <compound refid="classns1_1_1klass" kind="class"><name>ns1::klass</name></compound>
  <compound refid="structns1_1_1base" kind="struct"><name>ns1::base</name></compound>
  <compound refid="group__utilities" kind="group"><name>utilities</name></compound>
  <compound refid="klass_8hpp" kind="file"><name>klass.hpp</name></compound>
</doxygenindex>"#;

/// Compound identifiers and documents of the sample, in index order.
pub const SAMPLE: &[(&str, &str)] = &[
    ("namespacens1", NS1),
    ("classns1_1_1klass", KLASS),
    ("structns1_1_1base", BASE),
    ("group__utilities", GROUP),
];

/// Build and resolve a corpus from whole documents.
pub fn corpus(documents: &[&str]) -> Corpus {
    let mut corpus = Corpus::new();
    for document in documents {
        corpus.add_document(document).unwrap();
    }
    corpus.resolve_all().unwrap();
    corpus
}

/// The resolved sample corpus.
pub fn sample() -> Corpus {
    corpus(&[NS1, KLASS, BASE, GROUP])
}

/// A namespace document holding the given `sectiondef` markup.
pub fn namespace(id: &str, name: &str, sections: &str) -> String {
    format!(
        r#"<doxygen><compounddef id="{id}" kind="namespace"><compoundname>{name}</compoundname>{sections}</compounddef></doxygen>"#
    )
}
