//! Scope adoption and reference resolution
//!
//! Both passes read the corpus to compute new values and only then write
//! them back, so conversion code can freely look up other entities.

use super::value::repair_function_pointer;
use super::{
    Access, EntityId, EntityKind, Generalization, Member, MemberKey, NestedRef, Nesting, Parameter,
};
use crate::content::{
    make_blocks, make_entity_reference, resolve_return_type, resolve_type, text_with_refs,
    EntityRef, Inline, Phrase,
};
use crate::corpus::Corpus;
use crate::error::{DoccaError, Result};
use crate::xml::Element;

/// Converted kind-specific fields of one entity.
enum Details {
    None,
    Enum {
        underlying_type: Phrase,
    },
    TypeAlias {
        aliased: Phrase,
    },
    Variable {
        value: Phrase,
        type_: Phrase,
        args: Phrase,
    },
    Function {
        return_type: Phrase,
        parameters: Vec<Parameter>,
    },
}

impl Corpus {
    /// Adopt the nested entities a compound lists.
    ///
    /// Namespaces and classes become the scope of their nested entities,
    /// which join their members under their names. Groups only record the
    /// membership. Adoption happens once; later calls do nothing.
    ///
    /// # Errors
    ///
    /// Returns [`DoccaError::UnresolvedReference`] for a nested entity that
    /// is not in the corpus and [`DoccaError::DuplicateMember`] on a name
    /// clash.
    pub fn update_scopes(&mut self, id: EntityId) -> Result<()> {
        let Some(compound) = self.entities[id.0].as_compound_mut() else {
            return Ok(());
        };
        let nested = match std::mem::replace(&mut compound.nested, Nesting::Adopted) {
            Nesting::Pending(nested) => nested,
            Nesting::Adopted => return Ok(()),
        };
        let is_group = matches!(self.entities[id.0].kind, EntityKind::Group(_));

        for NestedRef { access, refid } in nested {
            let child = self
                .find(&refid)
                .ok_or(DoccaError::UnresolvedReference { refid })?;

            if is_group {
                self.entities[child.0].groups.push(id);
                if let EntityKind::Group(group) = &mut self.entities[id.0].kind {
                    group.members.push(child);
                }
                continue;
            }

            let entity = &mut self.entities[child.0];
            entity.scope = Some(id);
            entity.access = access;
            let name = entity.name.clone();
            self.insert_member(id, MemberKey::Named(name), Member::Entity(child))?;
        }
        Ok(())
    }

    /// Convert every deferred field of an entity.
    ///
    /// Pending nested entities are adopted first. Scopes then drop members
    /// that were superseded by a later registration of the same identifier,
    /// namespaces mark their functions free, and classes resolve their
    /// bases. Resolving an entity twice does nothing.
    ///
    /// # Errors
    ///
    /// Fails on malformed markup and on description references to unknown
    /// entities.
    pub fn resolve_references(&mut self, id: EntityId) -> Result<()> {
        if matches!(
            self.entities[id.0].as_compound().map(|c| &c.nested),
            Some(Nesting::Pending(_))
        ) {
            self.update_scopes(id)?;
        }

        let entity = &self.entities[id.0];
        if entity.is_resolved() {
            return Ok(());
        }

        let brief = make_blocks(entity.brief.first_raw(), self)?;
        let description = make_blocks(entity.description.first_raw(), self)?;
        let template_parameters = match entity.as_template() {
            Some(template) => Some(self.parameters(template.parameters.raw())?),
            None => None,
        };
        let details = self.details(id)?;

        let entity = &mut self.entities[id.0];
        entity.brief.resolve(brief);
        entity.description.resolve(description);
        if let (Some(template), Some(parameters)) = (entity.as_template_mut(), template_parameters)
        {
            template.parameters.resolve(parameters);
        }
        apply_details(&mut entity.kind, details);

        self.prune_members(id);
        self.mark_free_functions(id);
        self.resolve_bases(id)?;
        Ok(())
    }

    fn parameters(&self, raw: &[Element]) -> Result<Vec<Parameter>> {
        raw.iter()
            .map(|element| Parameter::from_element(element, self))
            .collect()
    }

    fn details(&self, id: EntityId) -> Result<Details> {
        Ok(match &self.entities[id.0].kind {
            EntityKind::Enum(data) => Details::Enum {
                underlying_type: text_with_refs(data.underlying_type.first_raw(), self)?,
            },
            EntityKind::TypeAlias(data) => Details::TypeAlias {
                aliased: text_with_refs(data.aliased.first_raw(), self)?,
            },
            EntityKind::Variable(data) => {
                let mut type_ = resolve_type(data.type_.first_raw(), self)?;
                let mut args = text_with_refs(data.args.first_raw(), self)?;
                repair_function_pointer(&mut type_, &mut args);
                Details::Variable {
                    value: text_with_refs(data.value.first_raw(), self)?,
                    type_,
                    args,
                }
            }
            EntityKind::Enumerator(data) => {
                let owner = data.owner;
                Details::Variable {
                    value: text_with_refs(data.variable.value.first_raw(), self)?,
                    type_: Phrase::new(vec![Inline::EntityRef(EntityRef {
                        entity: owner,
                        content: Phrase::new(vec![Inline::Text(
                            self.entities[owner.0].name.clone(),
                        )]),
                    })]),
                    args: text_with_refs(data.variable.args.first_raw(), self)?,
                }
            }
            EntityKind::Function(data) => Details::Function {
                return_type: resolve_return_type(data.return_type.first_raw(), self)?,
                parameters: self.parameters(data.parameters.raw())?,
            },
            EntityKind::Namespace(_) | EntityKind::Class(_) | EntityKind::Group(_) => {
                Details::None
            }
        })
    }

    /// Drop scope members whose identifier now belongs to another entity.
    fn prune_members(&mut self, id: EntityId) {
        let Some(scope) = self.entities[id.0].as_scope() else {
            return;
        };

        let mut stale = Vec::new();
        let mut kept_overloads = Vec::new();
        for (key, member) in &scope.members {
            match *member {
                Member::Overloads(set) => {
                    let current: Vec<EntityId> = self.overloads[set.0]
                        .functions()
                        .iter()
                        .copied()
                        .filter(|&f| self.is_current(f))
                        .collect();
                    if current.is_empty() {
                        stale.push(key.clone());
                    } else {
                        kept_overloads.push((set, current));
                    }
                }
                Member::Entity(entity) => {
                    if !self.is_current(entity) {
                        stale.push(key.clone());
                    }
                }
            }
        }

        for (set, current) in kept_overloads {
            self.overloads[set.0].retain(|f| current.contains(f));
        }
        if let Some(scope) = self.entities[id.0].as_scope_mut() {
            for key in &stale {
                scope.members.shift_remove(key);
            }
        }
    }

    /// Whether the lookup entry for the entity's identifier is the entity.
    fn is_current(&self, id: EntityId) -> bool {
        self.find(&self.entities[id.0].id) == Some(id)
    }

    fn mark_free_functions(&mut self, id: EntityId) {
        let EntityKind::Namespace(namespace) = &self.entities[id.0].kind else {
            return;
        };

        let functions: Vec<EntityId> = namespace
            .scope
            .members
            .values()
            .filter_map(|member| match member {
                Member::Overloads(set) => Some(self.overloads[set.0].functions()),
                Member::Entity(_) => None,
            })
            .flatten()
            .copied()
            .collect();

        for function in functions {
            if let Some(data) = self.entities[function.0].as_function_mut() {
                data.is_free = true;
            }
        }
    }

    fn resolve_bases(&mut self, id: EntityId) -> Result<()> {
        let Some(class) = self.entities[id.0].as_class() else {
            return Ok(());
        };

        let bases = class
            .bases
            .raw()
            .iter()
            .map(|element| self.generalization(element, id))
            .collect::<Result<Vec<_>>>()?;

        if let EntityKind::Class(class) = &mut self.entities[id.0].kind {
            class.bases.resolve(bases);
        }
        Ok(())
    }

    fn generalization(&self, element: &Element, derived: EntityId) -> Result<Generalization> {
        let access = element
            .non_empty_attr("prot")
            .ok_or_else(|| DoccaError::malformed("base class without access"))
            .and_then(Access::from_attr)?;

        let refid = match element.non_empty_attr("refid") {
            Some(refid) => Some(refid.to_string()),
            None => self
                .lookup(derived, element.text().trim())
                .map(|member| self.entity(self.representative(member)).id.clone()),
        };

        let base = match refid {
            Some(refid) => Phrase::new(vec![make_entity_reference(
                element,
                Some(&refid),
                self,
                true,
            )?]),
            None => text_with_refs(Some(element), self)?,
        };

        Ok(Generalization {
            access,
            is_virtual: element.attr("virt") == Some("virtual"),
            base,
        })
    }
}

fn apply_details(kind: &mut EntityKind, details: Details) {
    match (kind, details) {
        (EntityKind::Enum(data), Details::Enum { underlying_type }) => {
            data.underlying_type.resolve(underlying_type);
        }
        (EntityKind::TypeAlias(data), Details::TypeAlias { aliased }) => {
            data.aliased.resolve(aliased);
        }
        (EntityKind::Variable(data), Details::Variable { value, type_, args }) => {
            data.value.resolve(value);
            data.type_.resolve(type_);
            data.args.resolve(args);
        }
        (EntityKind::Enumerator(data), Details::Variable { value, type_, args }) => {
            data.variable.value.resolve(value);
            data.variable.type_.resolve(type_);
            data.variable.args.resolve(args);
        }
        (
            EntityKind::Function(data),
            Details::Function {
                return_type,
                parameters,
            },
        ) => {
            data.return_type.resolve(return_type);
            data.parameters.resolve(parameters);
        }
        _ => {}
    }
}
