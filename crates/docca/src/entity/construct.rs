//! Building entities from Doxygen XML
//!
//! Every factory registers its entity in the corpus before constructing any
//! children, so that children can see their parents by identifier. All
//! fields that refer to other entities stay raw until resolution.

use tracing::debug;

use super::{
    Access, ClassData, ClassKey, CompoundData, Deferred, Entity, EntityId, EntityKind, EnumData,
    EnumeratorData, FunctionData, GroupData, Location, Member, MemberKey, Members, NamespaceData,
    NestedRef, Nesting, OverloadSet, OverloadSetId, ScopeData, Templatable, TypeAliasData,
    VariableData,
};
use crate::corpus::Corpus;
use crate::error::{DoccaError, Result};
use crate::xml::Element;

/// Compound kinds docca builds entities for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundKind {
    /// `namespace`
    Namespace,
    /// `class`, `struct` or `union`
    Class(ClassKey),
    /// `group`
    Group,
}

impl CompoundKind {
    /// Parse the `kind` of a `compounddef`; other kinds are not documented.
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "namespace" => Some(CompoundKind::Namespace),
            "class" => Some(CompoundKind::Class(ClassKey::Class)),
            "struct" => Some(CompoundKind::Class(ClassKey::Struct)),
            "union" => Some(CompoundKind::Class(ClassKey::Union)),
            "group" => Some(CompoundKind::Group),
            _ => None,
        }
    }
}

/// Member kinds a scope can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// `function` or `friend`
    Function,
    /// `variable`
    Variable,
    /// `typedef`
    TypeAlias,
    /// `enum`
    Enum,
}

impl MemberKind {
    /// Parse the `kind` of a `memberdef`.
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "function" | "friend" => Some(MemberKind::Function),
            "variable" => Some(MemberKind::Variable),
            "typedef" => Some(MemberKind::TypeAlias),
            "enum" => Some(MemberKind::Enum),
            _ => None,
        }
    }
}

/// Drop the leading qualification of a declared name.
///
/// `::` inside template arguments does not count.
pub fn strip_qualification(name: &str) -> String {
    let mut result = String::new();
    let mut nesting = 0usize;
    let mut colon = false;

    for c in name.chars() {
        if colon {
            colon = false;
            if c == ':' {
                result.clear();
                continue;
            }
            result.push(':');
        }

        if nesting > 0 {
            match c {
                '<' => nesting += 1,
                '>' => nesting -= 1,
                _ => {}
            }
            result.push(c);
        } else if c == ':' {
            colon = true;
        } else {
            if c == '<' {
                nesting += 1;
            }
            result.push(c);
        }
    }

    if colon {
        result.push(':');
    }
    result
}

fn element_id(element: &Element) -> Result<&str> {
    element
        .non_empty_attr("id")
        .ok_or_else(|| DoccaError::malformed(format!("<{}> without id", element.tag)))
}

fn element_name(element: &Element, tag: &str) -> Result<String> {
    element.find(tag).map(Element::text).ok_or_else(|| {
        DoccaError::malformed(format!(
            "<{}> '{}' without <{tag}>",
            element.tag,
            element.attr("id").unwrap_or_default()
        ))
    })
}

fn is_specialization(name: &str) -> bool {
    name.find('<').is_some_and(|n| n > 0) && name.find('>').is_some_and(|n| n > 0)
}

fn templatable(element: &Element, declared_name: &str) -> Templatable {
    let parameters = element
        .find("templateparamlist")
        .map(|list| list.find_all("param").cloned().collect())
        .unwrap_or_default();
    Templatable {
        is_specialization: is_specialization(declared_name),
        parameters: Deferred::Pending(parameters),
    }
}

fn nested_refs(element: &Element) -> Result<Vec<NestedRef>> {
    element
        .elements()
        .filter(|child| matches!(child.tag.as_str(), "innerclass" | "innernamespace" | "innergroup"))
        .map(|child| {
            let refid = child
                .non_empty_attr("refid")
                .ok_or_else(|| DoccaError::malformed(format!("<{}> without refid", child.tag)))?;
            Ok(NestedRef {
                access: Access::from_optional(child.attr("prot"))?,
                refid: refid.to_string(),
            })
        })
        .collect()
}

fn compound(element: &Element) -> Result<CompoundData> {
    Ok(CompoundData {
        nested: Nesting::Pending(nested_refs(element)?),
    })
}

fn new_entity(
    element: &Element,
    name: String,
    scope: Option<EntityId>,
    access: Access,
    kind: EntityKind,
) -> Result<Entity> {
    Ok(Entity {
        id: element_id(element)?.to_string(),
        name,
        scope,
        access,
        groups: Vec::new(),
        location: element
            .find("location")
            .map(Location::from_element)
            .transpose()?,
        brief: Deferred::pending(element.find("briefdescription")),
        description: Deferred::pending(element.find("detaileddescription")),
        kind,
    })
}

impl Corpus {
    /// Build the entity for a `compounddef`.
    ///
    /// Returns `None` for compound kinds that are not documented (files,
    /// directories, pages).
    ///
    /// # Errors
    ///
    /// Fails on malformed markup and on duplicate or unsupported members.
    pub fn add_compound(&mut self, element: &Element) -> Result<Option<EntityId>> {
        let kind = element.attr("kind").unwrap_or_default();
        let id = match CompoundKind::from_attr(kind) {
            Some(CompoundKind::Namespace) => self.add_namespace(element)?,
            Some(CompoundKind::Class(key)) => self.add_class(element, key)?,
            Some(CompoundKind::Group) => self.add_group(element)?,
            None => {
                debug!(kind, id = element.attr("id"), "Skipping compound");
                return Ok(None);
            }
        };
        Ok(Some(id))
    }

    /// Build a namespace and its members.
    ///
    /// # Errors
    ///
    /// Fails on malformed markup and on duplicate or unsupported members.
    pub fn add_namespace(&mut self, element: &Element) -> Result<EntityId> {
        let declared = element_name(element, "compoundname")?;
        let kind = EntityKind::Namespace(NamespaceData {
            scope: ScopeData::default(),
            compound: compound(element)?,
        });
        let entity = new_entity(
            element,
            strip_qualification(&declared),
            None,
            Access::Public,
            kind,
        )?;

        let id = self.register(entity);
        self.populate_scope(id, element)?;
        Ok(id)
    }

    /// Build a class, struct or union and its members.
    ///
    /// # Errors
    ///
    /// Fails on malformed markup and on duplicate or unsupported members.
    pub fn add_class(&mut self, element: &Element, key: ClassKey) -> Result<EntityId> {
        let declared = element_name(element, "compoundname")?;
        let kind = EntityKind::Class(ClassData {
            key,
            scope: ScopeData::default(),
            compound: compound(element)?,
            template: templatable(element, &declared),
            bases: Deferred::Pending(element.find_all("basecompoundref").cloned().collect()),
        });
        let entity = new_entity(
            element,
            strip_qualification(&declared),
            None,
            Access::Public,
            kind,
        )?;

        let id = self.register(entity);
        self.populate_scope(id, element)?;
        Ok(id)
    }

    /// Build a group.
    ///
    /// # Errors
    ///
    /// Fails on malformed markup.
    pub fn add_group(&mut self, element: &Element) -> Result<EntityId> {
        let kind = EntityKind::Group(GroupData {
            compound: compound(element)?,
            members: Vec::new(),
        });
        let entity = new_entity(element, element_name(element, "title")?, None, Access::Public, kind)?;
        Ok(self.register(entity))
    }

    /// Build the members listed in the `sectiondef`s of a scope.
    fn populate_scope(&mut self, scope: EntityId, element: &Element) -> Result<()> {
        for section in element.find_all("sectiondef") {
            let section_kind = section.attr("kind");
            for member in section.elements() {
                if member.tag != "memberdef" {
                    return Err(DoccaError::malformed(format!(
                        "<{}> inside <sectiondef>",
                        member.tag
                    )));
                }
                self.add_member(member, section_kind, scope)?;
            }
        }
        Ok(())
    }

    /// Build one `memberdef` of a scope.
    ///
    /// Friend class declarations are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DoccaError::UnsupportedMemberKind`] for member kinds docca
    /// does not document, and fails on malformed markup.
    pub fn add_member(
        &mut self,
        element: &Element,
        section_kind: Option<&str>,
        scope: EntityId,
    ) -> Result<()> {
        let kind = element.attr("kind").unwrap_or_default();
        if kind == "friend"
            && element.find("type").and_then(Element::leading_text) == Some("class")
        {
            return Ok(());
        }

        match MemberKind::from_attr(kind) {
            Some(MemberKind::Function) => {
                self.add_function(element, section_kind, scope)?;
            }
            Some(MemberKind::Variable) => {
                self.add_variable(element, scope)?;
            }
            Some(MemberKind::TypeAlias) => {
                self.add_type_alias(element, scope)?;
            }
            Some(MemberKind::Enum) => {
                self.add_enum(element, Some(scope))?;
            }
            None => {
                return Err(DoccaError::UnsupportedMemberKind {
                    kind: kind.to_string(),
                    id: element.attr("id").unwrap_or_default().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Build a function and add it to the matching overload set of `scope`.
    ///
    /// A function already present in the corpus is skipped, unless it is
    /// listed as related to a class; that copy then takes over the
    /// identifier and the earlier one is pruned during resolution.
    ///
    /// # Errors
    ///
    /// Fails on malformed markup.
    pub fn add_function(
        &mut self,
        element: &Element,
        section_kind: Option<&str>,
        scope: EntityId,
    ) -> Result<Option<OverloadSetId>> {
        let id = element_id(element)?;
        if self.find(id).is_some()
            && (section_kind != Some("related") || !self.entity(scope).is_class())
        {
            debug!(id, "Skipping already registered function");
            return Ok(None);
        }

        let name = element_name(element, "name")?;
        let data = FunctionData::from_element(
            element,
            section_kind,
            &name,
            &self.entity(scope).name,
            templatable(element, &name),
        )?;
        let access = Access::from_optional(element.attr("prot"))?;
        let key = MemberKey::Overloads {
            name: name.clone(),
            access,
            kind: data.kind(),
        };
        let entity = new_entity(element, name, Some(scope), access, EntityKind::Function(data))?;
        let function = self.register(entity);

        let existing = match self.scope_members(scope)?.get(&key) {
            Some(&Member::Overloads(set)) => Some(set),
            _ => None,
        };
        let set = match existing {
            Some(set) => {
                let Corpus {
                    entities, overloads, ..
                } = self;
                overloads[set.0].push(function, |f| brief_key(&entities[f.0]));
                set
            }
            None => {
                let set = OverloadSetId(self.overloads.len());
                self.overloads.push(OverloadSet::new(scope, function));
                self.insert_member(scope, key, Member::Overloads(set))?;
                set
            }
        };

        if let Some(data) = self.entities[function.0].as_function_mut() {
            data.overload_set = Some(set);
        }
        Ok(Some(set))
    }

    /// Build a variable member of `scope`.
    ///
    /// # Errors
    ///
    /// Fails on malformed markup and on a name clash in `scope`.
    pub fn add_variable(&mut self, element: &Element, scope: EntityId) -> Result<EntityId> {
        let name = element_name(element, "name")?;
        let kind = EntityKind::Variable(VariableData::from_element(
            element,
            templatable(element, &name),
        ));
        let entity = new_entity(
            element,
            name.clone(),
            Some(scope),
            Access::from_optional(element.attr("prot"))?,
            kind,
        )?;

        let id = self.register(entity);
        self.insert_member(scope, MemberKey::Named(name), Member::Entity(id))?;
        Ok(id)
    }

    /// Build a type alias member of `scope`.
    ///
    /// # Errors
    ///
    /// Fails when the aliased type is missing and on a name clash in
    /// `scope`.
    pub fn add_type_alias(&mut self, element: &Element, scope: EntityId) -> Result<EntityId> {
        let name = element_name(element, "name")?;
        let aliased = element.find("type").ok_or_else(|| {
            DoccaError::malformed(format!("type alias '{name}' without aliased type"))
        })?;
        let kind = EntityKind::TypeAlias(TypeAliasData {
            template: templatable(element, &name),
            aliased: Deferred::pending(Some(aliased)),
        });
        let entity = new_entity(
            element,
            name.clone(),
            Some(scope),
            Access::from_optional(element.attr("prot"))?,
            kind,
        )?;

        let id = self.register(entity);
        self.insert_member(scope, MemberKey::Named(name), Member::Entity(id))?;
        Ok(id)
    }

    /// Build an enum and its enumerators.
    ///
    /// Enumerators of a scoped enum become its members; those of an
    /// unscoped enum become members of `scope`, ahead of the enum itself.
    ///
    /// # Errors
    ///
    /// Fails on malformed markup, on name clashes, and when an unscoped enum
    /// with enumerators has no enclosing scope.
    pub fn add_enum(&mut self, element: &Element, scope: Option<EntityId>) -> Result<EntityId> {
        let declared = element_name(element, "name")?;
        let is_scoped = element.attr("strong") == Some("yes");
        let kind = EntityKind::Enum(EnumData {
            is_scoped,
            scope: ScopeData::default(),
            template: templatable(element, &declared),
            underlying_type: Deferred::pending(element.find("type")),
            enumerators: Vec::new(),
        });
        let name = strip_qualification(&declared);
        let entity = new_entity(
            element,
            name.clone(),
            scope,
            Access::from_optional(element.attr("prot"))?,
            kind,
        )?;

        let id = self.register(entity);
        self.populate_scope(id, element)?;

        for value in element.find_all("enumvalue") {
            let target = if is_scoped {
                id
            } else {
                scope.ok_or_else(|| {
                    DoccaError::malformed(format!("unscoped enum '{name}' outside of any scope"))
                })?
            };
            let enumerator = self.add_enumerator(value, id, target)?;
            if let EntityKind::Enum(data) = &mut self.entities[id.0].kind {
                data.enumerators.push(enumerator);
            }
        }

        if let Some(scope) = scope {
            self.insert_member(scope, MemberKey::Named(name), Member::Entity(id))?;
        }
        Ok(id)
    }

    fn add_enumerator(
        &mut self,
        element: &Element,
        owner: EntityId,
        scope: EntityId,
    ) -> Result<EntityId> {
        let name = element_name(element, "name")?;
        let mut variable = VariableData::from_element(element, templatable(element, &name));
        variable.flags.is_static = true;
        variable.flags.is_constexpr = true;
        variable.flags.is_const = true;

        let entity = new_entity(
            element,
            name.clone(),
            Some(scope),
            Access::from_optional(element.attr("prot"))?,
            EntityKind::Enumerator(EnumeratorData { variable, owner }),
        )?;

        let id = self.register(entity);
        self.insert_member(scope, MemberKey::Named(name), Member::Entity(id))?;
        Ok(id)
    }

    fn scope_members(&self, scope: EntityId) -> Result<&Members> {
        let entity = self.entity(scope);
        entity
            .as_scope()
            .map(|data| &data.members)
            .ok_or_else(|| DoccaError::malformed(format!("'{}' is not a scope", entity.name)))
    }

    /// Add a member to a scope, rejecting clashing names.
    pub(crate) fn insert_member(
        &mut self,
        scope: EntityId,
        key: MemberKey,
        member: Member,
    ) -> Result<()> {
        let entity = &mut self.entities[scope.0];
        let scope_name = entity.name.clone();
        let data = entity
            .as_scope_mut()
            .ok_or_else(|| DoccaError::malformed(format!("'{scope_name}' is not a scope")))?;

        if let MemberKey::Named(name) = &key {
            if data.members.contains_key(&key) {
                return Err(DoccaError::DuplicateMember {
                    scope: scope_name,
                    name: name.clone(),
                });
            }
        }
        data.members.insert(key, member);
        Ok(())
    }
}

fn brief_key(entity: &Entity) -> &str {
    entity
        .as_function()
        .map_or("", |data| data.brief_key.as_str())
}
