//! The entity arena and its identifier lookup
//!
//! A [`Corpus`] owns every entity built from a Doxygen dump. Entities are
//! addressed by [`EntityId`] and found by their Doxygen identifier through
//! an insertion-ordered index. Loading happens in three phases: construct
//! every compound, adopt nested scopes, then resolve references.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::entity::{Entity, EntityId, Location, Member, Members, OverloadSet, OverloadSetId};
use crate::error::{DoccaError, Result};
use crate::xml::Element;

/// All entities of one documentation run.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub(crate) entities: Vec<Entity>,
    pub(crate) index: IndexMap<String, EntityId>,
    pub(crate) overloads: Vec<OverloadSet>,
}

impl Corpus {
    /// Create an empty corpus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the compounds named by `refs` from `dir` and resolve them.
    ///
    /// Each compound is read from `<dir>/<refid>.xml`.
    ///
    /// # Errors
    ///
    /// Fails when a file cannot be read or parsed, and on any construction
    /// or resolution error.
    pub fn load(dir: &Path, refs: &[String]) -> Result<Self> {
        let mut corpus = Self::new();
        for refid in refs {
            let path = dir.join(format!("{refid}.xml"));
            debug!(path = %path.display(), "Loading compound");
            let text = fs::read_to_string(&path).map_err(|source| DoccaError::Io {
                path: path.clone(),
                source,
            })?;
            corpus.add_document(&text)?;
        }
        info!(entities = corpus.len(), "Constructed entities");

        corpus.resolve_all()?;
        Ok(corpus)
    }

    /// Build the compound of one per-compound XML document.
    ///
    /// # Errors
    ///
    /// Returns [`DoccaError::MalformedInput`] unless the document root holds
    /// exactly one `compounddef`.
    pub fn add_document(&mut self, text: &str) -> Result<Option<EntityId>> {
        let root = Element::parse(text)?;
        let mut children = root.elements();
        let compound = match (children.next(), children.next()) {
            (Some(compound), None) if compound.tag == "compounddef" => compound,
            _ => {
                return Err(DoccaError::malformed(
                    "document root must hold exactly one <compounddef>",
                ))
            }
        };
        self.add_compound(compound)
    }

    /// Adopt nested scopes, then resolve references, for every entity in
    /// lookup order.
    ///
    /// # Errors
    ///
    /// Stops at the first failing entity.
    pub fn resolve_all(&mut self) -> Result<()> {
        let ids: Vec<EntityId> = self.index.values().copied().collect();
        for &id in &ids {
            self.update_scopes(id)?;
        }
        info!("Adopted nested scopes");

        for &id in &ids {
            self.resolve_references(id)?;
        }
        info!(entities = ids.len(), "Resolved references");
        Ok(())
    }

    /// Add an entity to the arena and point its identifier at it.
    ///
    /// An identifier registered before keeps its lookup position but now
    /// refers to the new entity.
    pub(crate) fn register(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.entities.len());
        self.index.insert(entity.id.clone(), id);
        self.entities.push(entity);
        id
    }

    // ═══════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════

    /// Entity currently registered under a Doxygen identifier.
    pub fn find(&self, refid: &str) -> Option<EntityId> {
        self.index.get(refid).copied()
    }

    /// Like [`find`](Self::find), returning the entity.
    pub fn get(&self, refid: &str) -> Option<&Entity> {
        self.find(refid).map(|id| self.entity(id))
    }

    /// Entity by arena position.
    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.0]
    }

    /// Number of registered identifiers.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Registered entities in lookup order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, EntityId)> + '_ {
        self.index.iter().map(|(refid, &id)| (refid.as_str(), id))
    }

    /// Overload set by position.
    pub fn overload_set(&self, id: OverloadSetId) -> &OverloadSet {
        &self.overloads[id.0]
    }

    /// Members of a scope; `None` for entities that are not scopes.
    pub fn members(&self, id: EntityId) -> Option<&Members> {
        self.entity(id).as_scope().map(|scope| &scope.members)
    }

    /// Entity standing for a member: the entity itself, or the first
    /// function of an overload set.
    pub fn representative(&self, member: Member) -> EntityId {
        match member {
            Member::Entity(id) => id,
            Member::Overloads(set) => self.overload_set(set).first(),
        }
    }

    /// Name of a member.
    pub fn member_name(&self, member: Member) -> &str {
        &self.entity(self.representative(member)).name
    }

    /// Position of a function in its overload set; `None` when the function
    /// is not overloaded.
    pub fn overload_index(&self, function: EntityId) -> Option<usize> {
        let set = self.entity(function).as_function()?.overload_set?;
        let set = self.overload_set(set);
        if set.len() == 1 {
            return None;
        }
        set.position(function)
    }

    /// Whether a function is the only one in its overload set.
    pub fn is_sole_overload(&self, function: EntityId) -> bool {
        self.entity(function)
            .as_function()
            .and_then(|data| data.overload_set)
            .map_or(true, |set| self.overload_set(set).len() == 1)
    }

    /// Scope chain from the outermost scope down to the entity itself.
    pub fn path(&self, id: EntityId) -> Vec<EntityId> {
        let mut result = vec![id];
        let mut current = self.entity(id).scope;
        while let Some(scope) = current {
            result.push(scope);
            current = self.entity(scope).scope;
        }
        result.reverse();
        result
    }

    /// Names along the scope path joined with `::`.
    pub fn fully_qualified_name(&self, id: EntityId) -> String {
        self.path(id)
            .into_iter()
            .map(|id| self.entity(id).name.as_str())
            .collect::<Vec<_>>()
            .join("::")
    }

    /// Declaration position, inherited from the enclosing scopes when the
    /// entity has none.
    pub fn location(&self, id: EntityId) -> Option<&Location> {
        let mut current = Some(id);
        while let Some(id) = current {
            let entity = self.entity(id);
            if entity.location.is_some() {
                return entity.location.as_ref();
            }
            current = entity.scope;
        }
        None
    }

    /// Resolve a possibly qualified name as seen from an entity.
    ///
    /// The first name component is searched outward through the enclosing
    /// scopes: a scope matches when it has that name or holds a member with
    /// it. The remaining components then descend through members.
    pub fn lookup(&self, from: EntityId, qualified_name: &str) -> Option<Member> {
        let parts: Vec<&str> = qualified_name.split("::").collect();
        let first = parts[0];

        let mut scope = Some(from);
        while let Some(id) = scope {
            if self.entity(id).name == first || self.member_named(Member::Entity(id), first).is_some()
            {
                break;
            }
            scope = self.entity(id).scope;
        }

        let mut current = Member::Entity(scope?);
        for part in parts {
            if self.member_name(current) != part {
                current = self.member_named(current, part)?;
            }
        }
        Some(current)
    }

    fn member_named(&self, member: Member, name: &str) -> Option<Member> {
        let Member::Entity(id) = member else {
            return None;
        };
        self.members(id)?
            .values()
            .copied()
            .find(|&candidate| self.member_name(candidate) == name)
    }
}

/// Identifiers of the compounds listed in a Doxygen `index.xml`.
///
/// Files and directories are skipped.
///
/// # Errors
///
/// Returns [`DoccaError::MalformedInput`] for a `compound` without `kind`
/// or `refid`, and [`DoccaError::Xml`] when the index is not well-formed.
pub fn collect_compound_refs(index_xml: &str) -> Result<Vec<String>> {
    let root = Element::parse(index_xml)?;
    let mut result = Vec::new();
    for compound in root.find_all("compound") {
        let kind = compound
            .non_empty_attr("kind")
            .ok_or_else(|| DoccaError::malformed("<compound> without kind"))?;
        if matches!(kind, "file" | "dir") {
            continue;
        }

        let refid = compound
            .non_empty_attr("refid")
            .ok_or_else(|| DoccaError::malformed("<compound> without refid"))?;
        result.push(refid.to_string());
    }
    debug!(compounds = result.len(), "Collected compound references");
    Ok(result)
}
