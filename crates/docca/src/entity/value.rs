//! Variables, enumerators and parameters

use super::{Deferred, EntityId, Templatable};
use crate::content::{make_blocks, text_with_refs, Block, Inline, Phrase};
use crate::corpus::Corpus;
use crate::error::{DoccaError, Result};
use crate::xml::Element;

/// Declaration specifiers shared by variables and functions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueFlags {
    /// `static`
    pub is_static: bool,
    /// `constexpr`
    pub is_constexpr: bool,
    /// `volatile`
    pub is_volatile: bool,
    /// `const`, or not `mutable`
    pub is_const: bool,
    /// `inline`
    pub is_inline: bool,
}

impl ValueFlags {
    /// Read the flags from a `memberdef`.
    pub fn from_element(element: &Element) -> Self {
        let yes = |name: &str| element.attr(name) == Some("yes");
        Self {
            is_static: yes("static"),
            is_constexpr: yes("constexpr"),
            is_volatile: yes("volatile"),
            is_const: yes("const") || element.attr("mutable") == Some("no"),
            is_inline: yes("inline"),
        }
    }
}

/// A variable or data member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableData {
    /// Declaration specifiers
    pub flags: ValueFlags,
    /// Template information
    pub template: Templatable,
    /// Initializer, including the `=` or braces
    pub value: Deferred<Phrase>,
    /// Declared type
    pub type_: Deferred<Phrase>,
    /// Declarator suffix such as array bounds
    pub args: Deferred<Phrase>,
}

impl VariableData {
    pub(crate) fn from_element(element: &Element, template: Templatable) -> Self {
        Self {
            flags: ValueFlags::from_element(element),
            template,
            value: Deferred::pending(element.find("initializer")),
            type_: Deferred::pending(element.find("type")),
            args: Deferred::pending(element.find("argsstring")),
        }
    }

    /// Declared type; empty before resolution.
    pub fn type_(&self) -> Option<&Phrase> {
        self.type_.resolved()
    }
}

/// An enumerator: a constant of its enum's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumeratorData {
    /// Value data; always static, constexpr and const
    pub variable: VariableData,
    /// The enum declaring this enumerator
    pub owner: EntityId,
}

/// A function or template parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameter {
    /// Declared type
    pub type_: Phrase,
    /// Default argument
    pub default_value: Phrase,
    /// Parameter name, if declared
    pub name: Option<String>,
    /// Brief description
    pub description: Vec<Block>,
    /// Array bounds, for array reference parameters
    pub array: Phrase,
    /// Parameter list, for function pointer parameters
    pub args: Phrase,
}

impl Parameter {
    /// Convert a `param` element.
    ///
    /// Doxygen splits array references and function pointers between the
    /// type and the suffix; the redundant punctuation is removed from the
    /// type so that `type name suffix` reads correctly.
    ///
    /// # Errors
    ///
    /// Returns [`DoccaError::MalformedInput`] when a suffix is present but
    /// the type does not have the matching shape.
    pub fn from_element(element: &Element, corpus: &Corpus) -> Result<Self> {
        let mut type_ = text_with_refs(element.find("type"), corpus)?;
        let mut args = text_with_refs(element.find("argsstring"), corpus)?;
        let array = text_with_refs(element.find("array"), corpus)?;

        if !array.is_empty() {
            let last = type_
                .last_text_mut()
                .filter(|text| text.ends_with("(&)"))
                .ok_or_else(|| {
                    DoccaError::malformed("array parameter type does not end with '(&)'")
                })?;
            last.truncate(last.len() - 3);
        }

        if !args.is_empty() {
            let last = type_
                .last_text_mut()
                .filter(|text| text.ends_with("(*"))
                .ok_or_else(|| {
                    DoccaError::malformed("function pointer parameter type does not end with '(*'")
                })?;
            last.truncate(last.len() - 2);

            let first = args
                .first_text_mut()
                .filter(|text| text.starts_with(")("))
                .ok_or_else(|| {
                    DoccaError::malformed("function pointer parameter args do not start with ')('")
                })?;
            first.remove(0);
        }

        Ok(Self {
            type_,
            default_value: text_with_refs(element.find("defval"), corpus)?,
            name: element
                .find("declname")
                .and_then(Element::leading_text)
                .map(str::to_string),
            description: make_blocks(element.find("briefdescription"), corpus)?,
            array,
            args,
        })
    }
}

/// Undo Doxygen's split of a pointer-to-function declarator between type
/// and args. Shapes that do not match are left alone.
pub(crate) fn repair_function_pointer(type_: &mut Phrase, args: &mut Phrase) {
    let split = matches!(type_.parts.last(), Some(Inline::Text(text)) if text.ends_with("(*"))
        && matches!(args.parts.first(), Some(Inline::Text(text)) if text.starts_with(")("));
    if !split {
        return;
    }
    if let Some(last) = type_.last_text_mut() {
        last.truncate(last.len() - 2);
    }
    if let Some(first) = args.first_text_mut() {
        first.remove(0);
    }
}
