//! Functions

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use super::{Deferred, OverloadSetId, Parameter, Templatable, ValueFlags};
use crate::content::Phrase;
use crate::error::{DoccaError, Result};
use crate::xml::Element;

/// How a function relates to its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// Static member function
    Static,
    /// Non-static member function
    Nonstatic,
    /// Friend function
    Friend,
    /// Free function
    Free,
}

impl FunctionKind {
    /// All kinds.
    pub const ALL: [FunctionKind; 4] = [
        FunctionKind::Static,
        FunctionKind::Nonstatic,
        FunctionKind::Friend,
        FunctionKind::Free,
    ];

    /// Name used by templates.
    pub fn as_str(self) -> &'static str {
        match self {
            FunctionKind::Static => "static",
            FunctionKind::Nonstatic => "nonstatic",
            FunctionKind::Friend => "friend",
            FunctionKind::Free => "free",
        }
    }
}

/// Virtuality of a member function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum VirtualKind {
    /// Not virtual
    #[default]
    NonVirtual,
    /// `virtual`
    Virtual,
    /// `virtual ... = 0`
    PureVirtual,
}

impl VirtualKind {
    /// All kinds.
    pub const ALL: [VirtualKind; 3] = [
        VirtualKind::NonVirtual,
        VirtualKind::Virtual,
        VirtualKind::PureVirtual,
    ];

    /// Parse a `virt` attribute.
    ///
    /// # Errors
    ///
    /// Returns [`DoccaError::MalformedInput`] for an unknown value.
    pub fn from_attr(value: &str) -> Result<Self> {
        match value {
            "non-virtual" => Ok(VirtualKind::NonVirtual),
            "virtual" => Ok(VirtualKind::Virtual),
            "pure-virtual" => Ok(VirtualKind::PureVirtual),
            other => Err(DoccaError::malformed(format!("unknown virtuality '{other}'"))),
        }
    }

    /// The attribute spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            VirtualKind::NonVirtual => "non-virtual",
            VirtualKind::Virtual => "virtual",
            VirtualKind::PureVirtual => "pure-virtual",
        }
    }
}

/// A function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionData {
    /// Declaration specifiers
    pub flags: ValueFlags,
    /// Template information
    pub template: Templatable,
    /// `explicit`
    pub is_explicit: bool,
    /// Reference qualifier (`lvalue` or `rvalue`)
    pub refqual: Option<String>,
    /// Virtuality
    pub virtual_kind: VirtualKind,
    /// Declared in a friend section
    pub is_friend: bool,
    /// Not a member of a class
    pub is_free: bool,
    /// Named after its class
    pub is_constructor: bool,
    /// Named after its class with a leading `~`
    pub is_destructor: bool,
    /// `noexcept`, explicit or implied
    pub is_noexcept: bool,
    /// Condition of a conditional `noexcept`
    pub noexcept_condition: Option<String>,
    /// `= delete`
    pub is_deleted: bool,
    /// `= default`
    pub is_defaulted: bool,
    /// The overload set this function belongs to
    pub overload_set: Option<OverloadSetId>,
    /// Return type; empty for constructors and destructors
    pub return_type: Deferred<Phrase>,
    /// Function parameters
    pub parameters: Deferred<Vec<Parameter>>,
    /// Raw brief text, used to order overloads
    pub(crate) brief_key: String,
}

impl FunctionData {
    /// Read a function `memberdef`.
    ///
    /// `section_kind` is the `kind` of the enclosing `sectiondef`, `name`
    /// the function's name and `scope_name` the unqualified name of its
    /// scope.
    pub(crate) fn from_element(
        element: &Element,
        section_kind: Option<&str>,
        name: &str,
        scope_name: &str,
        template: Templatable,
    ) -> Result<Self> {
        let is_constructor = name == scope_name;
        let is_destructor = name.strip_prefix('~') == Some(scope_name);

        let is_noexcept = match element.non_empty_attr("noexcept") {
            Some(value) => value == "yes",
            None => is_destructor,
        };

        let args = element
            .find("argsstring")
            .map(Element::text)
            .unwrap_or_default();

        let noexcept_condition = if is_noexcept {
            element
                .non_empty_attr("noexceptexpression")
                .map(str::to_string)
                .or_else(|| parse_noexcept_condition(&args))
        } else {
            None
        };

        let return_type = element.find("type");
        if return_type.is_none() && !is_constructor && !is_destructor {
            return Err(DoccaError::malformed(format!(
                "function '{name}' has no return type"
            )));
        }

        Ok(Self {
            flags: ValueFlags::from_element(element),
            template,
            is_explicit: element.attr("explicit") == Some("yes"),
            refqual: element.non_empty_attr("refqual").map(str::to_string),
            virtual_kind: element
                .non_empty_attr("virt")
                .map_or(Ok(VirtualKind::NonVirtual), VirtualKind::from_attr)?,
            is_friend: section_kind == Some("friend"),
            is_free: section_kind == Some("related"),
            is_constructor,
            is_destructor,
            is_noexcept,
            noexcept_condition,
            is_deleted: args.ends_with("=delete"),
            is_defaulted: args.ends_with("=default"),
            overload_set: None,
            return_type: Deferred::pending(return_type),
            parameters: Deferred::Pending(element.find_all("param").cloned().collect()),
            brief_key: element
                .find("briefdescription")
                .map(Element::text)
                .unwrap_or_default(),
        })
    }

    /// Relation to the scope: friend, then free, then static.
    pub fn kind(&self) -> FunctionKind {
        if self.is_friend {
            FunctionKind::Friend
        } else if self.is_free {
            FunctionKind::Free
        } else if self.flags.is_static {
            FunctionKind::Static
        } else {
            FunctionKind::Nonstatic
        }
    }

    /// Return type; `None` before resolution.
    pub fn return_type(&self) -> Option<&Phrase> {
        self.return_type.resolved()
    }

    /// Parameters; empty before resolution.
    pub fn parameters(&self) -> &[Parameter] {
        self.parameters.resolved().map_or(&[], Vec::as_slice)
    }
}

static RE_NOEXCEPT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bnoexcept\(").unwrap());

/// Extract the condition of `noexcept(...)` from a declarator suffix.
///
/// Returns `None` when there is no conditional `noexcept` or its
/// parentheses do not balance.
pub fn parse_noexcept_condition(args: &str) -> Option<String> {
    let start = RE_NOEXCEPT.find(args)?.end();

    let mut depth = 1usize;
    for (offset, c) in args[start..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(args[start..start + offset].to_string());
                }
            }
            _ => {}
        }
    }

    warn!(args, "Unbalanced parentheses in noexcept specification");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_noexcept_condition() {
        assert_eq!(
            parse_noexcept_condition("() noexcept(is_nothrow<T>::value)"),
            Some("is_nothrow<T>::value".to_string())
        );
        assert_eq!(
            parse_noexcept_condition("(int x) const noexcept(noexcept(f(x))) override"),
            Some("noexcept(f(x))".to_string())
        );
    }

    #[test]
    fn test_parse_noexcept_condition_absent() {
        assert_eq!(parse_noexcept_condition("() noexcept"), None);
        assert_eq!(parse_noexcept_condition("() const"), None);
    }

    #[test]
    fn test_parse_noexcept_condition_unbalanced() {
        assert_eq!(parse_noexcept_condition("() noexcept(f("), None);
    }

    #[test]
    fn test_function_kind_priority() {
        let element = Element::new("memberdef")
            .with_attr("static", "yes")
            .with_child(Element::new("type").with_text("void"));
        let template = Templatable::default();

        let data =
            FunctionData::from_element(&element, Some("related"), "f", "c", template.clone())
                .unwrap();
        assert_eq!(data.kind(), FunctionKind::Free);

        let data =
            FunctionData::from_element(&element, Some("friend"), "f", "c", template.clone())
                .unwrap();
        assert_eq!(data.kind(), FunctionKind::Friend);

        let data = FunctionData::from_element(&element, None, "f", "c", template).unwrap();
        assert_eq!(data.kind(), FunctionKind::Static);
    }

    #[test]
    fn test_missing_return_type() {
        let element = Element::new("memberdef");
        let template = Templatable::default();
        assert!(FunctionData::from_element(&element, None, "f", "c", template.clone()).is_err());
        assert!(FunctionData::from_element(&element, None, "c", "c", template.clone()).is_ok());
        assert!(FunctionData::from_element(&element, None, "~c", "c", template).is_ok());
    }
}
