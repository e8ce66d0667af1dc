//! Documented C++ entities
//!
//! Entities live in the [`Corpus`](crate::Corpus) arena and refer to each
//! other by [`EntityId`]. Every entity carries the common fields (identifier,
//! name, scope, access, description) plus a kind-specific payload in
//! [`EntityKind`]. Capabilities shared by several kinds (being a scope, a
//! compound, a template) are exposed through accessor methods on [`Entity`].
//!
//! Fields that need the whole corpus to be built are kept as raw markup in a
//! [`Deferred`] until the reference resolution pass converts them.

mod construct;
mod function;
mod overload;
mod resolve;
mod value;

pub use function::{parse_noexcept_condition, FunctionData, FunctionKind, VirtualKind};
pub use overload::{OverloadSet, OverloadSetId};
pub use value::{EnumeratorData, Parameter, ValueFlags, VariableData};

pub use construct::{strip_qualification, CompoundKind, MemberKind};

use indexmap::IndexMap;

use crate::content::{Block, Phrase};
use crate::error::{DoccaError, Result};
use crate::xml::Element;

/// Position of an entity in the corpus arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) usize);

impl EntityId {
    /// Arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Attribute enums
// ═══════════════════════════════════════════════════════════════════════

/// Member access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Access {
    /// `public`
    #[default]
    Public,
    /// `protected`
    Protected,
    /// `private`
    Private,
}

impl Access {
    /// All access levels in declaration order.
    pub const ALL: [Access; 3] = [Access::Public, Access::Protected, Access::Private];

    /// Parse a `prot` attribute.
    ///
    /// # Errors
    ///
    /// Returns [`DoccaError::MalformedInput`] for an unknown value.
    pub fn from_attr(value: &str) -> Result<Self> {
        match value {
            "public" => Ok(Access::Public),
            "protected" => Ok(Access::Protected),
            "private" => Ok(Access::Private),
            other => Err(DoccaError::malformed(format!("unknown access '{other}'"))),
        }
    }

    /// Parse an optional `prot` attribute, defaulting to public.
    pub(crate) fn from_optional(value: Option<&str>) -> Result<Self> {
        value
            .filter(|value| !value.is_empty())
            .map_or(Ok(Access::Public), Access::from_attr)
    }

    /// The attribute spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Access::Public => "public",
            Access::Protected => "protected",
            Access::Private => "private",
        }
    }
}

/// Which keyword introduced a class type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKey {
    /// `class`
    Class,
    /// `struct`
    Struct,
    /// `union`
    Union,
}

impl ClassKey {
    /// The keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            ClassKey::Class => "class",
            ClassKey::Struct => "struct",
            ClassKey::Union => "union",
        }
    }
}

/// Source position of a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// Header path as Doxygen reports it
    pub file: Option<String>,
    /// 1-based line
    pub line: Option<u32>,
    /// 1-based column
    pub column: Option<u32>,
}

impl Location {
    /// Read a `location` element.
    ///
    /// # Errors
    ///
    /// Returns [`DoccaError::MalformedInput`] if `line` or `column` is not
    /// a number.
    pub fn from_element(element: &Element) -> Result<Self> {
        let number = |name: &str| -> Result<Option<u32>> {
            element
                .non_empty_attr(name)
                .map(|value| {
                    value.parse().map_err(|_| {
                        DoccaError::malformed(format!("location {name} '{value}' is not a number"))
                    })
                })
                .transpose()
        };

        Ok(Self {
            file: element.attr("file").map(str::to_string),
            line: number("line")?,
            column: number("column")?,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Two-phase fields
// ═══════════════════════════════════════════════════════════════════════

/// A field that is parsed in two steps.
///
/// Construction keeps the raw markup; reference resolution replaces it with
/// the converted value. Reading a field before resolution yields nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deferred<T> {
    /// Raw markup, possibly none
    Pending(Vec<Element>),
    /// Converted value
    Resolved(T),
}

impl<T> Default for Deferred<T> {
    fn default() -> Self {
        Deferred::Pending(Vec::new())
    }
}

impl<T> Deferred<T> {
    /// Keep an optional element for later conversion.
    pub fn pending(element: Option<&Element>) -> Self {
        Deferred::Pending(element.cloned().into_iter().collect())
    }

    /// Raw markup; empty once resolved.
    pub fn raw(&self) -> &[Element] {
        match self {
            Deferred::Pending(raw) => raw,
            Deferred::Resolved(_) => &[],
        }
    }

    /// First raw element, if any.
    pub fn first_raw(&self) -> Option<&Element> {
        self.raw().first()
    }

    /// Converted value, once resolved.
    pub fn resolved(&self) -> Option<&T> {
        match self {
            Deferred::Pending(_) => None,
            Deferred::Resolved(value) => Some(value),
        }
    }

    /// Mutable access to the converted value.
    pub fn resolved_mut(&mut self) -> Option<&mut T> {
        match self {
            Deferred::Pending(_) => None,
            Deferred::Resolved(value) => Some(value),
        }
    }

    /// Whether the value has been converted.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Deferred::Resolved(_))
    }

    /// Replace the raw markup with the converted value.
    pub fn resolve(&mut self, value: T) {
        *self = Deferred::Resolved(value);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Capabilities
// ═══════════════════════════════════════════════════════════════════════

/// Key of a scope member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberKey {
    /// Any member other than functions
    Named(String),

    /// Functions sharing name, access and kind
    Overloads {
        /// Function name
        name: String,
        /// Shared access
        access: Access,
        /// Shared kind
        kind: FunctionKind,
    },
}

/// A scope member: an entity or a set of overloaded functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Member {
    /// Single entity
    Entity(EntityId),
    /// Overload set
    Overloads(OverloadSetId),
}

/// Ordered members of a scope.
pub type Members = IndexMap<MemberKey, Member>;

/// Members of a namespace, class, struct, union or enum.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeData {
    /// Members in insertion order
    pub members: Members,
}

/// Reference to a nested compound, waiting for adoption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedRef {
    /// Declared access
    pub access: Access,
    /// Identifier of the nested entity
    pub refid: String,
}

/// Staging state of a compound's nested entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nesting {
    /// References not adopted yet
    Pending(Vec<NestedRef>),
    /// Adoption done
    Adopted,
}

/// Data shared by namespaces, class types and groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundData {
    /// Nested entities
    pub nested: Nesting,
}

/// Template information.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Templatable {
    /// Whether the declared name carries template arguments
    pub is_specialization: bool,

    /// Template parameters, empty for non-templates
    pub parameters: Deferred<Vec<Parameter>>,
}

impl Templatable {
    /// Template parameters; empty before resolution.
    pub fn parameters(&self) -> &[Parameter] {
        self.parameters.resolved().map_or(&[], Vec::as_slice)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Kind payloads
// ═══════════════════════════════════════════════════════════════════════

/// A namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceData {
    /// Members
    pub scope: ScopeData,
    /// Nested namespaces and classes
    pub compound: CompoundData,
}

/// A class, struct or union.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassData {
    /// Introducing keyword
    pub key: ClassKey,
    /// Members
    pub scope: ScopeData,
    /// Nested classes
    pub compound: CompoundData,
    /// Template information
    pub template: Templatable,
    /// Base classes
    pub bases: Deferred<Vec<Generalization>>,
}

impl ClassData {
    /// Base classes; empty before resolution.
    pub fn bases(&self) -> &[Generalization] {
        self.bases.resolved().map_or(&[], Vec::as_slice)
    }
}

/// A base class entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generalization {
    /// Inheritance access
    pub access: Access,
    /// Virtual inheritance
    pub is_virtual: bool,
    /// The base type, linked when it is documented
    pub base: Phrase,
}

/// A documentation group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupData {
    /// Grouped compounds
    pub compound: CompoundData,
    /// Entities listed in the group, in declaration order
    pub members: Vec<EntityId>,
}

/// An enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumData {
    /// `enum class`
    pub is_scoped: bool,
    /// Members; holds the enumerators of scoped enums
    pub scope: ScopeData,
    /// Template information
    pub template: Templatable,
    /// Declared underlying type, possibly empty
    pub underlying_type: Deferred<Phrase>,
    /// Enumerators in declaration order
    pub enumerators: Vec<EntityId>,
}

/// A type alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAliasData {
    /// Template information
    pub template: Templatable,
    /// The aliased type
    pub aliased: Deferred<Phrase>,
}

/// Kind-specific data of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    /// `namespace`
    Namespace(NamespaceData),
    /// `class`, `struct` or `union`
    Class(ClassData),
    /// Doxygen group
    Group(GroupData),
    /// `enum` or `enum class`
    Enum(EnumData),
    /// `using` alias or `typedef`
    TypeAlias(TypeAliasData),
    /// Variable or data member
    Variable(VariableData),
    /// Enumerator
    Enumerator(EnumeratorData),
    /// Function
    Function(FunctionData),
}

// ═══════════════════════════════════════════════════════════════════════
// Entity
// ═══════════════════════════════════════════════════════════════════════

/// A documented entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Doxygen identifier
    pub id: String,

    /// Unqualified name; scopes drop any leading qualification
    pub name: String,

    /// Enclosing scope
    pub scope: Option<EntityId>,

    /// Access within the enclosing scope
    pub access: Access,

    /// Groups listing this entity
    pub groups: Vec<EntityId>,

    /// Own declaration position; see [`Corpus::location`](crate::Corpus::location)
    pub location: Option<Location>,

    /// Brief description
    pub brief: Deferred<Vec<Block>>,

    /// Detailed description
    pub description: Deferred<Vec<Block>>,

    /// Kind-specific data
    pub kind: EntityKind,
}

impl Entity {
    /// Brief description; empty before resolution.
    pub fn brief(&self) -> &[Block] {
        self.brief.resolved().map_or(&[], Vec::as_slice)
    }

    /// Detailed description; empty before resolution.
    pub fn description(&self) -> &[Block] {
        self.description.resolved().map_or(&[], Vec::as_slice)
    }

    /// Whether reference resolution has run for this entity.
    pub fn is_resolved(&self) -> bool {
        self.brief.is_resolved()
    }

    /// Most specific type name of the entity.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            EntityKind::Namespace(_) => "Namespace",
            EntityKind::Class(class) => match class.key {
                ClassKey::Class => "Class",
                ClassKey::Struct => "Struct",
                ClassKey::Union => "Union",
            },
            EntityKind::Group(_) => "Group",
            EntityKind::Enum(_) => "Enum",
            EntityKind::TypeAlias(_) => "TypeAlias",
            EntityKind::Variable(_) => "Variable",
            EntityKind::Enumerator(_) => "Enumerator",
            EntityKind::Function(_) => "Function",
        }
    }

    /// Keyword used to declare the entity, for kinds that have one.
    pub fn declarator(&self) -> Option<&'static str> {
        match &self.kind {
            EntityKind::Namespace(_) => Some("namespace"),
            EntityKind::Class(class) => Some(class.key.as_str()),
            EntityKind::Enum(data) if data.is_scoped => Some("enum class"),
            EntityKind::Enum(_) => Some("enum"),
            EntityKind::TypeAlias(_) => Some("using"),
            _ => None,
        }
    }

    /// Whether the entity declares a type.
    pub fn is_type(&self) -> bool {
        matches!(
            self.kind,
            EntityKind::Class(_) | EntityKind::Enum(_) | EntityKind::TypeAlias(_)
        )
    }

    /// Whether the entity is a class, struct or union.
    pub fn is_class(&self) -> bool {
        matches!(self.kind, EntityKind::Class(_))
    }

    /// Scope capability.
    pub fn as_scope(&self) -> Option<&ScopeData> {
        match &self.kind {
            EntityKind::Namespace(data) => Some(&data.scope),
            EntityKind::Class(data) => Some(&data.scope),
            EntityKind::Enum(data) => Some(&data.scope),
            _ => None,
        }
    }

    pub(crate) fn as_scope_mut(&mut self) -> Option<&mut ScopeData> {
        match &mut self.kind {
            EntityKind::Namespace(data) => Some(&mut data.scope),
            EntityKind::Class(data) => Some(&mut data.scope),
            EntityKind::Enum(data) => Some(&mut data.scope),
            _ => None,
        }
    }

    /// Compound capability.
    pub fn as_compound(&self) -> Option<&CompoundData> {
        match &self.kind {
            EntityKind::Namespace(data) => Some(&data.compound),
            EntityKind::Class(data) => Some(&data.compound),
            EntityKind::Group(data) => Some(&data.compound),
            _ => None,
        }
    }

    pub(crate) fn as_compound_mut(&mut self) -> Option<&mut CompoundData> {
        match &mut self.kind {
            EntityKind::Namespace(data) => Some(&mut data.compound),
            EntityKind::Class(data) => Some(&mut data.compound),
            EntityKind::Group(data) => Some(&mut data.compound),
            _ => None,
        }
    }

    /// Template capability.
    pub fn as_template(&self) -> Option<&Templatable> {
        match &self.kind {
            EntityKind::Class(data) => Some(&data.template),
            EntityKind::Enum(data) => Some(&data.template),
            EntityKind::TypeAlias(data) => Some(&data.template),
            EntityKind::Variable(data) => Some(&data.template),
            EntityKind::Enumerator(data) => Some(&data.variable.template),
            EntityKind::Function(data) => Some(&data.template),
            EntityKind::Namespace(_) | EntityKind::Group(_) => None,
        }
    }

    pub(crate) fn as_template_mut(&mut self) -> Option<&mut Templatable> {
        match &mut self.kind {
            EntityKind::Class(data) => Some(&mut data.template),
            EntityKind::Enum(data) => Some(&mut data.template),
            EntityKind::TypeAlias(data) => Some(&mut data.template),
            EntityKind::Variable(data) => Some(&mut data.template),
            EntityKind::Enumerator(data) => Some(&mut data.variable.template),
            EntityKind::Function(data) => Some(&mut data.template),
            EntityKind::Namespace(_) | EntityKind::Group(_) => None,
        }
    }

    /// Value flags of variables, enumerators and functions.
    pub fn value_flags(&self) -> Option<&ValueFlags> {
        match &self.kind {
            EntityKind::Variable(data) => Some(&data.flags),
            EntityKind::Enumerator(data) => Some(&data.variable.flags),
            EntityKind::Function(data) => Some(&data.flags),
            _ => None,
        }
    }

    /// Variable data; enumerators included.
    pub fn as_variable(&self) -> Option<&VariableData> {
        match &self.kind {
            EntityKind::Variable(data) => Some(data),
            EntityKind::Enumerator(data) => Some(&data.variable),
            _ => None,
        }
    }

    /// Function data.
    pub fn as_function(&self) -> Option<&FunctionData> {
        match &self.kind {
            EntityKind::Function(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn as_function_mut(&mut self) -> Option<&mut FunctionData> {
        match &mut self.kind {
            EntityKind::Function(data) => Some(data),
            _ => None,
        }
    }

    /// Class data.
    pub fn as_class(&self) -> Option<&ClassData> {
        match &self.kind {
            EntityKind::Class(data) => Some(data),
            _ => None,
        }
    }

    /// Enum data.
    pub fn as_enum(&self) -> Option<&EnumData> {
        match &self.kind {
            EntityKind::Enum(data) => Some(data),
            _ => None,
        }
    }

    /// Group data.
    pub fn as_group(&self) -> Option<&GroupData> {
        match &self.kind {
            EntityKind::Group(data) => Some(data),
            _ => None,
        }
    }

    /// Type alias data.
    pub fn as_type_alias(&self) -> Option<&TypeAliasData> {
        match &self.kind {
            EntityKind::TypeAlias(data) => Some(data),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_parsing() {
        assert_eq!(Access::from_attr("protected").unwrap(), Access::Protected);
        assert_eq!(Access::from_optional(None).unwrap(), Access::Public);
        assert_eq!(Access::from_optional(Some("")).unwrap(), Access::Public);
        assert!(Access::from_attr("package").is_err());
    }

    #[test]
    fn test_location_numbers() {
        let element = Element::new("location")
            .with_attr("file", "a.hpp")
            .with_attr("line", "12");
        let location = Location::from_element(&element).unwrap();
        assert_eq!(location.file.as_deref(), Some("a.hpp"));
        assert_eq!(location.line, Some(12));
        assert_eq!(location.column, None);

        let bad = Element::new("location").with_attr("line", "x");
        assert!(Location::from_element(&bad).is_err());
    }

    #[test]
    fn test_deferred_states() {
        let mut field: Deferred<u32> = Deferred::pending(Some(&Element::new("type")));
        assert_eq!(field.first_raw().map(|e| e.tag.as_str()), Some("type"));
        assert!(field.resolved().is_none());

        field.resolve(3);
        assert!(field.is_resolved());
        assert!(field.raw().is_empty());
        assert_eq!(field.resolved(), Some(&3));
    }
}
