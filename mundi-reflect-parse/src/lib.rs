// mundi-reflect-parse: reads engine headers, recovers reflected classes,
// structs, properties, functions and enums, and classifies property types.
//
// Used by mundi-reflect-codegen. Pure text in, entities out; no I/O.

pub mod classifier;
pub mod error;
pub mod graph;
pub mod macro_registry;
pub mod metadata;
pub mod model;
pub mod scanner;
pub mod text;

use mundi_reflect_markers::{ACTOR_ROOT, COMPONENT_ROOT, OBJECT_NAME_PROPERTY, OBJECT_NAME_TYPE};

pub use crate::classifier::{classify, PropertyMacro};
pub use crate::error::{ParseError, ParseResult};
pub use crate::graph::{ClassGraph, ClassRole};
pub use crate::macro_registry::{MacroEntry, MacroRegistry};
pub use crate::model::{ClassEntity, ClassKind, EnumEntity, Function, Parameter, Property};

/// Parse one header into its classified entity.
///
/// `file_stem` names the marker entity of an enum-only header. Returns
/// `Ok(None)` for headers that are not reflected.
pub fn parse_header(
    header_text: &str,
    file_stem: &str,
    registry: &MacroRegistry,
) -> ParseResult<Option<ClassEntity>> {
    let Some(scanned) = scanner::scan(header_text)? else {
        return Ok(None);
    };

    let Some(header) = scanned.class_header else {
        return Ok(Some(ClassEntity::enum_only(file_stem, scanned.enums)));
    };

    let declared = metadata::parse_metadata(&header.metadata_string);
    let mut entity = ClassEntity::new(&header.name, &header.parent_name, header.kind, declared);

    for raw in &scanned.properties {
        let mut prop = Property::from_raw(raw)?;
        classify(&mut prop, registry);
        entity.properties.push(prop);
    }
    entity.functions = scanned.functions.iter().map(Function::from_raw).collect();
    entity.enums = scanned.enums;

    if let Some(prop) = object_name_property(&entity, registry) {
        entity.properties.insert(0, prop);
    }
    Ok(Some(entity))
}

/// Synthetic name property for the two roots and their direct subclasses.
///
/// Direct subclasses are included on purpose: `class AFoo : public AActor`
/// must come out with `ObjectName` prepended to its own properties (see
/// `actor_subclass_end_to_end`). Deeper descendants get it through the
/// parent's registration.
fn object_name_property(entity: &ClassEntity, registry: &MacroRegistry) -> Option<Property> {
    let root = [entity.name.as_str(), entity.parent_name.as_str()]
        .into_iter()
        .find(|name| *name == ACTOR_ROOT || *name == COMPONENT_ROOT)?;
    let (category, owner) = if root == ACTOR_ROOT {
        ("[Actor]", "actor")
    } else {
        ("[Component]", "component")
    };
    let mut prop = Property::new(OBJECT_NAME_PROPERTY, OBJECT_NAME_TYPE);
    prop.category = category.to_string();
    prop.is_editable = true;
    prop.tooltip = format!("Name of this {owner}");
    classify(&mut prop, registry);
    Some(prop)
}
