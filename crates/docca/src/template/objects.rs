//! Template views of the corpus
//!
//! Entities reference each other in cycles (scopes list members, members
//! point back at their scope), so they are exposed lazily: every object
//! holds the shared corpus and an identifier, and builds attribute values
//! on access. Content nodes are small and immutable and are copied into
//! their objects.

use std::fmt;
use std::sync::Arc;

use minijinja::value::{Enumerator, Object, ObjectRepr, Value};
use minijinja::{context, Error, ErrorKind, State};

use crate::content::{
    Block, Cell, Inline, ParameterDescription, ParameterItem, Phrase,
};
use crate::corpus::Corpus;
use crate::entity::{
    ClassKey, Entity, EntityId, EntityKind, Member, OverloadSetId, Parameter,
};

fn none() -> Value {
    Value::from(())
}

pub(crate) fn optional<T: Into<Value>>(value: Option<T>) -> Value {
    value.map_or_else(none, Into::into)
}

fn index(key: &Value) -> Option<usize> {
    key.as_usize()
}

/// Value for an entity.
pub fn entity_value(corpus: &Arc<Corpus>, id: EntityId) -> Value {
    Value::from_object(EntityObject {
        corpus: Arc::clone(corpus),
        id,
    })
}

/// Value for a scope member.
pub fn member_value(corpus: &Arc<Corpus>, member: Member) -> Value {
    match member {
        Member::Entity(id) => entity_value(corpus, id),
        Member::Overloads(id) => Value::from_object(OverloadSetObject {
            corpus: Arc::clone(corpus),
            id,
        }),
    }
}

/// Value for a phrase.
pub fn phrase_value(corpus: &Arc<Corpus>, phrase: &Phrase) -> Value {
    content(corpus, ContentNode::Phrase(Style::Plain, phrase.clone()))
}

/// Value for a block sequence: a list of block objects.
pub fn blocks_value(corpus: &Arc<Corpus>, blocks: &[Block]) -> Value {
    blocks
        .iter()
        .map(|block| content(corpus, ContentNode::Block(block.clone())))
        .collect::<Vec<_>>()
        .into()
}

fn inline_value(corpus: &Arc<Corpus>, inline: &Inline) -> Value {
    let node = match inline {
        Inline::Text(text) => return Value::from(text.as_str()),
        Inline::Linebreak => ContentNode::Linebreak,
        Inline::Strong(phrase) => ContentNode::Phrase(Style::Strong, phrase.clone()),
        Inline::Emphasised(phrase) => ContentNode::Phrase(Style::Emphasised, phrase.clone()),
        Inline::Monospaced(phrase) => ContentNode::Phrase(Style::Monospaced, phrase.clone()),
        Inline::Phrase(phrase) => ContentNode::Phrase(Style::Plain, phrase.clone()),
        Inline::EntityRef(link) => {
            ContentNode::Phrase(Style::EntityRef(link.entity), link.content.clone())
        }
        Inline::UrlLink(link) => {
            ContentNode::Phrase(Style::UrlLink(link.url.clone()), link.content.clone())
        }
    };
    content(corpus, node)
}

fn content(corpus: &Arc<Corpus>, node: ContentNode) -> Value {
    Value::from_object(ContentObject {
        corpus: Arc::clone(corpus),
        node,
    })
}

fn parameters_value(corpus: &Arc<Corpus>, parameters: &[Parameter]) -> Value {
    parameters
        .iter()
        .map(|parameter| {
            Value::from_object(ParameterObject {
                corpus: Arc::clone(corpus),
                parameter: parameter.clone(),
            })
        })
        .collect::<Vec<_>>()
        .into()
}

fn entities_value(corpus: &Arc<Corpus>, ids: &[EntityId]) -> Value {
    ids.iter()
        .map(|&id| entity_value(corpus, id))
        .collect::<Vec<_>>()
        .into()
}

/// Names of the entity and content types a value is an instance of.
///
/// Template tests such as `is Class` check membership in this list.
pub fn type_names(value: &Value) -> Vec<&'static str> {
    if let Some(entity) = value.downcast_object_ref::<EntityObject>() {
        entity.type_names()
    } else if value.downcast_object_ref::<OverloadSetObject>().is_some() {
        vec!["OverloadSet"]
    } else if value.downcast_object_ref::<ParameterObject>().is_some() {
        vec!["Parameter"]
    } else if let Some(content) = value.downcast_object_ref::<ContentObject>() {
        content.node.type_names()
    } else {
        Vec::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Entities
// ═══════════════════════════════════════════════════════════════════════

/// The `entities` mapping: identifier to entity, in lookup order.
#[derive(Debug)]
pub struct EntityMap {
    corpus: Arc<Corpus>,
}

impl EntityMap {
    /// Expose every registered entity.
    pub fn new(corpus: Arc<Corpus>) -> Self {
        Self { corpus }
    }
}

impl Object for EntityMap {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Map
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let id = self.corpus.find(key.as_str()?)?;
        Some(entity_value(&self.corpus, id))
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Values(
            self.corpus
                .iter()
                .map(|(refid, _)| Value::from(refid))
                .collect(),
        )
    }
}

/// A documented entity.
#[derive(Debug)]
pub struct EntityObject {
    corpus: Arc<Corpus>,
    id: EntityId,
}

impl EntityObject {
    /// The entity's arena position.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The corpus the entity belongs to.
    pub fn corpus(&self) -> &Arc<Corpus> {
        &self.corpus
    }

    fn entity(&self) -> &Entity {
        self.corpus.entity(self.id)
    }

    fn type_names(&self) -> Vec<&'static str> {
        let mut names = vec!["Entity"];
        match &self.entity().kind {
            EntityKind::Namespace(_) => names.extend(["Scope", "Namespace"]),
            EntityKind::Class(class) => {
                names.extend(["Templatable", "Type", "Scope", "Class"]);
                match class.key {
                    ClassKey::Class => {}
                    ClassKey::Struct => names.push("Struct"),
                    ClassKey::Union => names.push("Union"),
                }
            }
            EntityKind::Group(_) => names.push("Group"),
            EntityKind::Enum(_) => names.extend(["Templatable", "Type", "Scope", "Enum"]),
            EntityKind::TypeAlias(_) => names.extend(["Templatable", "Type", "TypeAlias"]),
            EntityKind::Variable(_) => names.extend(["Templatable", "Value", "Variable"]),
            EntityKind::Enumerator(_) => {
                names.extend(["Templatable", "Value", "Variable", "Enumerator"])
            }
            EntityKind::Function(_) => names.extend(["Templatable", "Value", "Function"]),
        }
        names
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        let corpus = &self.corpus;
        let entity = self.entity();

        let common = match name {
            "id" => Some(Value::from(entity.id.as_str())),
            "name" => Some(Value::from(entity.name.as_str())),
            "scope" => Some(optional(entity.scope.map(|id| entity_value(corpus, id)))),
            "access" => Some(Value::from(entity.access.as_str())),
            "groups" => Some(entities_value(corpus, &entity.groups)),
            "brief" => Some(blocks_value(corpus, entity.brief())),
            "description" => Some(blocks_value(corpus, entity.description())),
            "fully_qualified_name" => Some(Value::from(corpus.fully_qualified_name(self.id))),
            "path" => Some(entities_value(corpus, &corpus.path(self.id))),
            "location" => Some(optional(corpus.location(self.id).map(|location| {
                context! {
                    file => location.file,
                    line => location.line,
                    column => location.column,
                }
            }))),
            _ => None,
        };
        if common.is_some() {
            return common;
        }

        if let Some(template) = entity.as_template() {
            match name {
                "is_specialization" => return Some(Value::from(template.is_specialization)),
                "template_parameters" => {
                    return Some(parameters_value(corpus, template.parameters()))
                }
                _ => {}
            }
        }

        if let Some(scope) = entity.as_scope() {
            if name == "members" {
                return Some(
                    scope
                        .members
                        .values()
                        .map(|&member| member_value(corpus, member))
                        .collect::<Vec<_>>()
                        .into(),
                );
            }
        }

        if entity.is_type() || matches!(entity.kind, EntityKind::Namespace(_)) {
            if name == "declarator" {
                return Some(optional(entity.declarator()));
            }
        }

        if entity.is_type() && name == "objects" {
            let objects = entity
                .as_enum()
                .map(|data| data.enumerators.as_slice())
                .unwrap_or_default();
            return Some(entities_value(corpus, objects));
        }

        if let Some(flags) = entity.value_flags() {
            match name {
                "is_static" => return Some(Value::from(flags.is_static)),
                "is_constexpr" => return Some(Value::from(flags.is_constexpr)),
                "is_volatile" => return Some(Value::from(flags.is_volatile)),
                "is_const" => return Some(Value::from(flags.is_const)),
                "is_inline" => return Some(Value::from(flags.is_inline)),
                _ => {}
            }
        }

        match &entity.kind {
            EntityKind::Class(class) if name == "bases" => Some(
                class
                    .bases()
                    .iter()
                    .map(|base| {
                        context! {
                            access => base.access.as_str(),
                            is_virtual => base.is_virtual,
                            base => phrase_value(corpus, &base.base),
                        }
                    })
                    .collect::<Vec<_>>()
                    .into(),
            ),
            EntityKind::Group(group) if name == "members" => {
                Some(entities_value(corpus, &group.members))
            }
            EntityKind::Enum(data) => match name {
                "is_scoped" => Some(Value::from(data.is_scoped)),
                "underlying_type" => data
                    .underlying_type
                    .resolved()
                    .map(|phrase| phrase_value(corpus, phrase)),
                _ => None,
            },
            EntityKind::TypeAlias(data) if name == "aliased" => data
                .aliased
                .resolved()
                .map(|phrase| phrase_value(corpus, phrase)),
            EntityKind::Enumerator(data) if name == "enum" => {
                Some(entity_value(corpus, data.owner))
            }
            EntityKind::Variable(_) | EntityKind::Enumerator(_) => {
                let variable = entity.as_variable()?;
                let field = match name {
                    "value" => &variable.value,
                    "type" => &variable.type_,
                    "args" => &variable.args,
                    _ => return None,
                };
                field.resolved().map(|phrase| phrase_value(corpus, phrase))
            }
            EntityKind::Function(data) => match name {
                "kind" => Some(Value::from(data.kind().as_str())),
                "is_explicit" => Some(Value::from(data.is_explicit)),
                "refqual" => Some(optional(data.refqual.as_deref())),
                "virtual_kind" => Some(Value::from(data.virtual_kind.as_str())),
                "is_friend" => Some(Value::from(data.is_friend)),
                "is_free" => Some(Value::from(data.is_free)),
                "is_constructor" => Some(Value::from(data.is_constructor)),
                "is_destructor" => Some(Value::from(data.is_destructor)),
                "is_noexcept" => Some(Value::from(data.is_noexcept)),
                "noexcept_condition" => Some(optional(data.noexcept_condition.as_deref())),
                "is_deleted" => Some(Value::from(data.is_deleted)),
                "is_defaulted" => Some(Value::from(data.is_defaulted)),
                "overload_set" => Some(optional(
                    data.overload_set
                        .map(|set| member_value(corpus, Member::Overloads(set))),
                )),
                "is_sole_overload" => Some(Value::from(corpus.is_sole_overload(self.id))),
                "overload_index" => Some(optional(corpus.overload_index(self.id))),
                "return_type" => data
                    .return_type()
                    .map(|phrase| phrase_value(corpus, phrase)),
                "parameters" => Some(parameters_value(corpus, data.parameters())),
                _ => None,
            },
            _ => None,
        }
    }
}

impl Object for EntityObject {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        self.attribute(key.as_str()?)
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match (method, args) {
            ("lookup", [name]) => {
                let name = name.as_str().ok_or_else(|| {
                    Error::new(ErrorKind::InvalidOperation, "lookup expects a string")
                })?;
                Ok(optional(
                    self.corpus
                        .lookup(self.id, name)
                        .map(|member| member_value(&self.corpus, member)),
                ))
            }
            _ => Err(Error::from(ErrorKind::UnknownMethod)),
        }
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.corpus.fully_qualified_name(self.id))
    }
}

/// A set of overloaded functions.
///
/// Indexing yields the functions; other attributes are those of the first
/// function, except `brief`, which lists every function's brief.
#[derive(Debug)]
pub struct OverloadSetObject {
    corpus: Arc<Corpus>,
    id: OverloadSetId,
}

impl OverloadSetObject {
    /// The set's position in the corpus.
    pub fn id(&self) -> OverloadSetId {
        self.id
    }

    /// The corpus the set belongs to.
    pub fn corpus(&self) -> &Arc<Corpus> {
        &self.corpus
    }
}

impl Object for OverloadSetObject {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Seq
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let set = self.corpus.overload_set(self.id);
        if let Some(n) = index(key) {
            return set
                .functions()
                .get(n)
                .map(|&id| entity_value(&self.corpus, id));
        }

        match key.as_str()? {
            "brief" => Some(
                set.functions()
                    .iter()
                    .map(|&id| blocks_value(&self.corpus, self.corpus.entity(id).brief()))
                    .collect::<Vec<_>>()
                    .into(),
            ),
            "funcs" => Some(entities_value(&self.corpus, set.functions())),
            name => EntityObject {
                corpus: Arc::clone(&self.corpus),
                id: set.first(),
            }
            .attribute(name),
        }
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Seq(self.corpus.overload_set(self.id).len())
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = self.corpus.overload_set(self.id).first();
        f.write_str(&self.corpus.fully_qualified_name(first))
    }
}

/// A function or template parameter.
#[derive(Debug)]
pub struct ParameterObject {
    corpus: Arc<Corpus>,
    parameter: Parameter,
}

impl Object for ParameterObject {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let corpus = &self.corpus;
        let parameter = &self.parameter;
        Some(match key.as_str()? {
            "type" => phrase_value(corpus, &parameter.type_),
            "default_value" => phrase_value(corpus, &parameter.default_value),
            "name" => optional(parameter.name.as_deref()),
            "description" => blocks_value(corpus, &parameter.description),
            "array" => phrase_value(corpus, &parameter.array),
            "args" => phrase_value(corpus, &parameter.args),
            _ => return None,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Content
// ═══════════════════════════════════════════════════════════════════════

/// Presentation of a phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Style {
    Plain,
    Strong,
    Emphasised,
    Monospaced,
    EntityRef(EntityId),
    UrlLink(String),
}

/// A content node as seen by templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ContentNode {
    Phrase(Style, Phrase),
    Linebreak,
    Block(Block),
    ListItem(Vec<Block>),
    Cell(Cell),
    ParameterDescription(ParameterDescription),
    ParameterItem(ParameterItem),
}

impl ContentNode {
    fn type_names(&self) -> Vec<&'static str> {
        match self {
            ContentNode::Phrase(style, _) => {
                let mut names = vec!["Phrase"];
                match style {
                    Style::Plain => {}
                    Style::Strong => names.push("Strong"),
                    Style::Emphasised => names.push("Emphasised"),
                    Style::Monospaced => names.push("Monospaced"),
                    Style::EntityRef(_) => names.push("EntityRef"),
                    Style::UrlLink(_) => names.push("UrlLink"),
                }
                names
            }
            ContentNode::Linebreak => vec!["Linebreak"],
            ContentNode::Block(block) => vec!["Block", block.node_name()],
            ContentNode::ListItem(_) => vec!["Block", "ListItem"],
            ContentNode::Cell(_) => vec!["Block", "Cell"],
            ContentNode::ParameterDescription(_) => vec!["Block", "ParameterDescription"],
            ContentNode::ParameterItem(_) => vec!["Block", "ParameterItem"],
        }
    }
}

/// Phrase, block or block part.
///
/// Nodes with children index like lists; the remaining properties are
/// attributes.
#[derive(Debug)]
pub struct ContentObject {
    corpus: Arc<Corpus>,
    node: ContentNode,
}

impl ContentObject {
    pub(crate) fn node(&self) -> &ContentNode {
        &self.node
    }

    /// The corpus entity references point into.
    pub fn corpus(&self) -> &Arc<Corpus> {
        &self.corpus
    }

    fn len(&self) -> usize {
        match &self.node {
            ContentNode::Phrase(_, phrase) => phrase.len(),
            ContentNode::Linebreak | ContentNode::ParameterItem(_) => 0,
            ContentNode::Block(block) => match block {
                Block::Paragraph(phrase) => phrase.len(),
                Block::List(list) => list.items.len(),
                Block::Section(section) => section.blocks.len(),
                Block::CodeBlock(code) => code.lines.len(),
                Block::Table(table) => table.rows.len(),
                Block::ParameterList(list) => list.items.len(),
            },
            ContentNode::ListItem(blocks) => blocks.len(),
            ContentNode::Cell(cell) => cell.blocks.len(),
            ContentNode::ParameterDescription(description) => description.params.len(),
        }
    }

    fn item(&self, n: usize) -> Option<Value> {
        let corpus = &self.corpus;
        let block = |block: &Block| content(corpus, ContentNode::Block(block.clone()));
        match &self.node {
            ContentNode::Phrase(_, phrase) | ContentNode::Block(Block::Paragraph(phrase)) => {
                phrase.parts.get(n).map(|part| inline_value(corpus, part))
            }
            ContentNode::Block(Block::List(list)) => list
                .items
                .get(n)
                .map(|item| content(corpus, ContentNode::ListItem(item.clone()))),
            ContentNode::Block(Block::Section(section)) => section.blocks.get(n).map(block),
            ContentNode::Block(Block::CodeBlock(code)) => {
                code.lines.get(n).map(|line| Value::from(line.as_str()))
            }
            ContentNode::Block(Block::Table(table)) => table.rows.get(n).map(|row| {
                row.iter()
                    .map(|cell| content(corpus, ContentNode::Cell(cell.clone())))
                    .collect::<Vec<_>>()
                    .into()
            }),
            ContentNode::Block(Block::ParameterList(list)) => list.items.get(n).map(|item| {
                content(corpus, ContentNode::ParameterDescription(item.clone()))
            }),
            ContentNode::ListItem(blocks) => blocks.get(n).map(block),
            ContentNode::Cell(cell) => cell.blocks.get(n).map(block),
            ContentNode::ParameterDescription(description) => description
                .params
                .get(n)
                .map(|param| content(corpus, ContentNode::ParameterItem(param.clone()))),
            ContentNode::Linebreak | ContentNode::ParameterItem(_) => None,
        }
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        let corpus = &self.corpus;
        match &self.node {
            ContentNode::Phrase(style, phrase) => match (name, style) {
                ("text", _) => Some(Value::from(self.text())),
                ("entity", Style::EntityRef(id)) => Some(entity_value(corpus, *id)),
                ("url", Style::UrlLink(url)) => Some(Value::from(url.as_str())),
                _ => None,
            }
            .or_else(|| (name == "parts").then(|| phrase_parts(corpus, phrase))),
            ContentNode::Block(Block::Paragraph(_)) if name == "text" => {
                Some(Value::from(self.text()))
            }
            ContentNode::Block(Block::List(list)) => match name {
                "kind" => Some(optional(list.kind.map(|kind| kind.as_str()))),
                "is_ordered" => Some(Value::from(list.is_ordered())),
                _ => None,
            },
            ContentNode::Block(Block::Section(section)) => match name {
                "kind" => Some(optional(section.kind.as_ref().map(|kind| kind.as_str()))),
                "title" => Some(phrase_value(corpus, &section.title)),
                _ => None,
            },
            ContentNode::Block(Block::Table(table)) => match name {
                "cols" => Some(optional(table.cols)),
                "caption" => Some(optional(
                    table.caption.as_ref().map(|caption| phrase_value(corpus, caption)),
                )),
                "width" => Some(none()),
                _ => None,
            },
            ContentNode::Block(Block::ParameterList(list)) if name == "kind" => {
                Some(optional(list.kind.as_ref().map(|kind| kind.as_str())))
            }
            ContentNode::Cell(cell) => Some(match name {
                "col_span" => Value::from(cell.col_span),
                "row_span" => Value::from(cell.row_span),
                "is_header" => Value::from(cell.is_header),
                "horizontal_align" => optional(cell.horizontal_align.as_deref()),
                "vertical_align" => optional(cell.vertical_align.as_deref()),
                "width" => optional(cell.width.as_deref()),
                "role" => optional(cell.role.as_deref()),
                _ => return None,
            }),
            ContentNode::ParameterDescription(description) if name == "description" => {
                Some(blocks_value(corpus, &description.description))
            }
            ContentNode::ParameterItem(item) => Some(match name {
                "type" => phrase_value(corpus, &item.type_),
                "name" => phrase_value(corpus, &item.name),
                "direction" => optional(item.direction.as_deref()),
                "is_in" => Value::from(item.is_in()),
                "is_out" => Value::from(item.is_out()),
                _ => return None,
            }),
            _ => None,
        }
    }

    /// Plain text of phrases and paragraphs; code blocks give their lines.
    fn text(&self) -> String {
        let corpus = &self.corpus;
        match &self.node {
            ContentNode::Phrase(Style::EntityRef(id), phrase) => {
                let text = phrase.text(corpus);
                if text.is_empty() {
                    corpus.fully_qualified_name(*id)
                } else {
                    text
                }
            }
            ContentNode::Phrase(Style::UrlLink(url), phrase) => {
                let text = phrase.text(corpus);
                if text.is_empty() {
                    url.clone()
                } else {
                    text
                }
            }
            ContentNode::Phrase(_, phrase) | ContentNode::Block(Block::Paragraph(phrase)) => {
                phrase.text(corpus)
            }
            ContentNode::Block(Block::CodeBlock(code)) => code.lines.join("\n"),
            _ => String::new(),
        }
    }
}

fn phrase_parts(corpus: &Arc<Corpus>, phrase: &Phrase) -> Value {
    phrase
        .iter()
        .map(|part| inline_value(corpus, part))
        .collect::<Vec<_>>()
        .into()
}

impl Object for ContentObject {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        match self.node {
            ContentNode::Linebreak | ContentNode::ParameterItem(_) => ObjectRepr::Plain,
            _ => ObjectRepr::Seq,
        }
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        match index(key) {
            Some(n) => self.item(n),
            None => self.attribute(key.as_str()?),
        }
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        match self.node {
            ContentNode::Linebreak | ContentNode::ParameterItem(_) => Enumerator::NonEnumerable,
            _ => Enumerator::Seq(self.len()),
        }
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}
