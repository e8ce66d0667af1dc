//! Template rendering
//!
//! The corpus is rendered with a Jinja template. Templates see:
//!
//! - `entities`: every entity by Doxygen identifier, in lookup order
//! - `Config`: the merged options
//! - `Access`, `FunctionKind`, `VirtualKind`, `Section`, `ParameterList`
//!   and `List`: the spellings of the corresponding attribute values
//!
//! plus one test per entity and content type (`x is Class`), the `qbk`,
//! `anchor`, `link`, `abridged_fqn` and `external_url` filters, and the
//! `re_sub` and `re_search` functions.
//!
//! Undefined values are errors, and output is never escaped.

pub mod objects;
pub mod quickbook;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use minijinja::value::{Kwargs, Value};
use minijinja::{context, AutoEscape, Environment, Error, ErrorKind, UndefinedBehavior};
use regex::Regex;
use tracing::debug;

use crate::config::Config;
use crate::content::{ListKind, PARAMETER_LIST_KINDS, SECTION_KINDS};
use crate::corpus::Corpus;
use crate::entity::{Access, EntityId, FunctionKind, VirtualKind};
use crate::error::Result;

use objects::{optional, type_names, ContentObject, EntityMap, EntityObject, OverloadSetObject};
use quickbook::{anchor, local_anchor, Markup, Writer};

/// Name of the built-in QuickBook reference template.
pub const DEFAULT_TEMPLATE: &str = "docca/quickbook.jinja2";

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[(
    DEFAULT_TEMPLATE,
    include_str!("../../templates/docca/quickbook.jinja2"),
)];

/// Names usable in `is` tests.
pub const TYPE_TESTS: &[&str] = &[
    "Entity",
    "Scope",
    "Namespace",
    "Templatable",
    "Type",
    "Class",
    "Struct",
    "Union",
    "Group",
    "Enum",
    "TypeAlias",
    "Value",
    "Variable",
    "Enumerator",
    "Function",
    "OverloadSet",
    "Parameter",
    "Phrase",
    "Strong",
    "Emphasised",
    "Monospaced",
    "EntityRef",
    "UrlLink",
    "Linebreak",
    "Block",
    "Paragraph",
    "List",
    "ListItem",
    "Section",
    "CodeBlock",
    "Table",
    "Cell",
    "ParameterList",
    "ParameterDescription",
    "ParameterItem",
];

/// Where templates are looked up.
///
/// Names are searched in the template's own directory first, then among
/// the built-in templates, then in the include directories in order.
#[derive(Debug, Clone, Default)]
pub struct TemplateLoader {
    template_dir: Option<PathBuf>,
    include_dirs: Vec<PathBuf>,
}

impl TemplateLoader {
    /// Create a loader.
    pub fn new(template_dir: Option<PathBuf>, include_dirs: Vec<PathBuf>) -> Self {
        Self {
            template_dir,
            include_dirs,
        }
    }

    /// Source of the named template, or `None` when no location has it.
    ///
    /// # Errors
    ///
    /// Fails when a matching file exists but cannot be read.
    pub fn load(&self, name: &str) -> std::result::Result<Option<String>, Error> {
        let relative = Path::new(name);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Ok(None);
        }

        if let Some(source) = self.read_from(self.template_dir.iter(), relative)? {
            return Ok(Some(source));
        }
        if let Some((_, source)) = BUILTIN_TEMPLATES.iter().find(|(n, _)| *n == name) {
            return Ok(Some((*source).to_string()));
        }
        self.read_from(self.include_dirs.iter(), relative)
    }

    fn read_from<'a>(
        &self,
        dirs: impl Iterator<Item = &'a PathBuf>,
        relative: &Path,
    ) -> std::result::Result<Option<String>, Error> {
        for dir in dirs {
            let path = dir.join(relative);
            if !path.is_file() {
                continue;
            }
            debug!(path = %path.display(), "Loading template");
            return fs::read_to_string(&path).map(Some).map_err(|e| {
                Error::new(
                    ErrorKind::InvalidOperation,
                    format!("cannot read template {}", path.display()),
                )
                .with_source(e)
            });
        }
        Ok(None)
    }
}

fn constants<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Value {
    Value::from_serialize(pairs.into_iter().collect::<BTreeMap<_, _>>())
}

fn globals() -> Vec<(&'static str, Value)> {
    let access = constants(Access::ALL.iter().map(|a| (a.as_str(), a.as_str())));
    let function_kind = constants(FunctionKind::ALL.iter().map(|k| (k.as_str(), k.as_str())));
    let virtual_kind = constants(VirtualKind::ALL.iter().map(|k| {
        let name = match k {
            VirtualKind::NonVirtual => "nonvirtual",
            VirtualKind::PureVirtual => "purevirtual",
            VirtualKind::Virtual => "virtual",
        };
        (name, k.as_str())
    }));

    let section = constants(SECTION_KINDS.iter().map(|(spelling, kind)| {
        let name = match spelling {
            &"see" => "See",
            &"return" => "Returns",
            &"author" => "Author",
            &"authors" => "Authors",
            &"version" => "Version",
            &"since" => "Since",
            &"date" => "Date",
            &"note" => "Note",
            &"warning" => "Warning",
            &"pre" => "Preconditions",
            &"post" => "Postconditions",
            &"copyright" => "Copyright",
            &"invariant" => "Invariants",
            &"remark" => "Remarks",
            &"attention" => "Attention",
            &"par" => "Custom",
            _ => "RCS",
        };
        (name, kind.as_str())
    }));
    let parameter_list = constants(PARAMETER_LIST_KINDS.iter().map(|(spelling, _)| {
        let name = match spelling {
            &"param" => "Parameters",
            &"retval" => "ReturnValues",
            &"exception" => "Exceptions",
            _ => "TemplateParameters",
        };
        (name, *spelling)
    }));
    let list = constants(
        [
            ("Arabic", ListKind::Arabic),
            ("LowerLatin", ListKind::LowerLatin),
            ("UpperLatin", ListKind::UpperLatin),
            ("LowerRoman", ListKind::LowerRoman),
            ("UpperRoman", ListKind::UpperRoman),
        ]
        .map(|(name, kind)| (name, kind.as_str())),
    );

    vec![
        ("Access", access),
        ("FunctionKind", function_kind),
        ("VirtualKind", virtual_kind),
        ("Section", section),
        ("ParameterList", parameter_list),
        ("List", list),
    ]
}

fn regex(pattern: &str) -> std::result::Result<Regex, Error> {
    Regex::new(pattern).map_err(|e| {
        Error::new(ErrorKind::InvalidOperation, format!("invalid pattern {pattern:?}")).with_source(e)
    })
}

fn re_sub(pattern: &str, replacement: &str, text: &str) -> std::result::Result<String, Error> {
    Ok(regex(pattern)?.replace_all(text, replacement).into_owned())
}

fn re_search(pattern: &str, text: &str) -> std::result::Result<Value, Error> {
    Ok(regex(pattern)?
        .find(text)
        .map_or_else(|| Value::from(()), |m| Value::from(m.as_str())))
}

fn qbk(value: &Value, markup: &Markup) -> std::result::Result<String, Error> {
    if let Some(text) = value.as_str() {
        return Ok(markup.text(text));
    }
    if let Some(content) = value.downcast_object_ref::<ContentObject>() {
        let mut writer = Writer::new(content.corpus(), markup);
        writer.node(content.node());
        return Ok(writer.finish());
    }
    if value.is_none() || value.is_undefined() {
        return Ok(String::new());
    }
    if value.downcast_object_ref::<EntityObject>().is_none()
        && value.downcast_object_ref::<OverloadSetObject>().is_none()
    {
        if let Ok(items) = value.try_iter() {
            let mut result = String::new();
            for item in items {
                result.push_str(&qbk(&item, markup)?);
            }
            return Ok(result);
        }
    }
    Ok(markup.text(&value.to_string()))
}

/// Corpus and entity behind an entity or an overload set.
///
/// Overload sets stand for their first function; the flag tells them apart.
fn target(value: &Value) -> std::result::Result<(Arc<Corpus>, EntityId, bool), Error> {
    if let Some(entity) = value.downcast_object_ref::<EntityObject>() {
        return Ok((Arc::clone(entity.corpus()), entity.id(), false));
    }
    if let Some(set) = value.downcast_object_ref::<OverloadSetObject>() {
        let first = set.corpus().overload_set(set.id()).first();
        return Ok((Arc::clone(set.corpus()), first, true));
    }
    Err(Error::new(
        ErrorKind::InvalidOperation,
        format!("expected an entity or an overload set, got {value}"),
    ))
}

fn anchor_of(
    value: &Value,
    prefer_overload: bool,
    local: bool,
) -> std::result::Result<String, Error> {
    let (corpus, id, is_set) = target(value)?;
    let prefer_overload = prefer_overload || is_set;
    Ok(if local {
        local_anchor(&corpus, id, prefer_overload)
    } else {
        anchor(&corpus, id, prefer_overload)
    })
}

/// Build the rendering environment.
pub fn environment(config: &Config, loader: TemplateLoader) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_loader(move |name| loader.load(name));

    for (name, value) in globals() {
        env.add_global(name, value);
    }
    env.add_global("Config", Value::from_serialize(config));

    for &name in TYPE_TESTS {
        env.add_test(name, move |value: &Value| type_names(value).contains(&name));
    }

    let markup = Arc::new(Markup::from_config(config));
    {
        let markup = Arc::clone(&markup);
        env.add_filter("qbk", move |value: &Value| qbk(value, &markup));
    }
    env.add_filter("anchor", |value: &Value, kwargs: Kwargs| {
        let prefer_overload = kwargs.get::<Option<bool>>("prefer_overload")?;
        let local = kwargs.get::<Option<bool>>("local")?;
        kwargs.assert_all_used()?;
        anchor_of(
            value,
            prefer_overload.unwrap_or(false),
            local.unwrap_or(false),
        )
    });
    {
        let markup = Arc::clone(&markup);
        env.add_filter("link", move |value: &Value| {
            let target = anchor_of(value, false, false)?;
            Ok::<_, Error>(format!("{}{target}", markup.link_prefix))
        });
    }
    {
        let markup = Arc::clone(&markup);
        env.add_filter("abridged_fqn", move |value: &Value| {
            let (corpus, id, _) = target(value)?;
            Ok::<_, Error>(markup.abridged_fqn(&corpus, id))
        });
    }
    env.add_filter("external_url", move |value: &Value| {
        let (corpus, id, _) = target(value)?;
        Ok::<_, Error>(optional(markup.external_url(&corpus, id)))
    });
    env.add_function("re_sub", re_sub);
    env.add_function("re_search", re_search);
    env
}

/// Render a template over the corpus.
///
/// # Errors
///
/// Returns [`DoccaError::Template`](crate::DoccaError::Template) when the
/// template cannot be found, fails to parse, or fails while rendering.
pub fn render(env: &Environment<'_>, template: &str, corpus: Arc<Corpus>) -> Result<String> {
    let template = env.get_template(template)?;
    let output = template.render(context! {
        entities => Value::from_object(EntityMap::new(corpus)),
    })?;
    Ok(output)
}
