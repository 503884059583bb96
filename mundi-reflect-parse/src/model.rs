// Parsed entities: the per-header ClassEntity and everything it owns.

use std::collections::BTreeMap;

use mundi_reflect_markers::{
    DEFAULT_SCRIPT_EXTENSION, META_ABSTRACT, META_CATEGORY, META_DESCRIPTION, META_DISPLAY_NAME,
    META_EDIT_ANYWHERE, META_LUA_BIND, META_LUA_READ_WRITE, META_NOT_SPAWNABLE, META_RANGE,
    META_SCRIPT_FILE, META_TOOLTIP, FLAG_VALUE,
};
use serde::Serialize;

use crate::classifier::PropertyMacro;
use crate::error::{ParseError, ParseResult};
use crate::metadata::{has_flag, parse_metadata, Metadata};
use crate::scanner::{RawDeclaration, RawFunction};
use crate::text::split_top_level;

// ---------------------------------------------------------------------------
// Property
// ---------------------------------------------------------------------------

/// A reflected data member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub name: String,
    /// Type text as written in the header, whitespace-normalised.
    pub declared_type: String,
    pub category: String,
    pub is_editable: bool,
    pub tooltip: String,
    pub numeric_range: Option<(f32, f32)>,
    /// Declared extras (`LuaReadWrite`, `ScriptFile`) plus the tags the
    /// classifier resolves (`inner_type`, `key_type`, ...).
    pub extra_metadata: BTreeMap<String, String>,
    /// Registration macro chosen by the classifier.
    pub kind: PropertyMacro,
}

impl Property {
    /// An unclassified property with no declared metadata.
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            category: String::new(),
            is_editable: false,
            tooltip: String::new(),
            numeric_range: None,
            extra_metadata: BTreeMap::new(),
            kind: PropertyMacro::Scalar,
        }
    }

    /// Build from a `UPROPERTY(...) Type Name;` site.
    pub fn from_raw(raw: &RawDeclaration) -> ParseResult<Self> {
        let meta = parse_metadata(&raw.metadata_string);
        let mut prop = Property::new(&raw.identifier, &raw.type_string);

        prop.category = meta.get(META_CATEGORY).cloned().unwrap_or_default();
        prop.is_editable = has_flag(&meta, META_EDIT_ANYWHERE);
        prop.tooltip = meta.get(META_TOOLTIP).cloned().unwrap_or_default();

        if let Some(range) = meta.get(META_RANGE) {
            prop.numeric_range = Some(parse_range(&prop.name, range)?);
        }
        if has_flag(&meta, META_LUA_READ_WRITE) {
            prop.extra_metadata
                .insert(META_LUA_READ_WRITE.to_string(), FLAG_VALUE.to_string());
        }
        if let Some(script) = meta.get(META_SCRIPT_FILE) {
            prop.extra_metadata
                .insert(META_SCRIPT_FILE.to_string(), script.clone());
        }
        Ok(prop)
    }

    /// Script file extension, if this is a script property.
    pub fn script_extension(&self) -> &str {
        self.extra_metadata
            .get(META_SCRIPT_FILE)
            .map_or(DEFAULT_SCRIPT_EXTENSION, String::as_str)
    }
}

/// `"0.0, 100.0"` → `(0.0, 100.0)`. A trailing `f` suffix is accepted;
/// `inf`/`nan` bounds are rejected since they have no C++ float literal.
fn parse_range(property: &str, value: &str) -> ParseResult<(f32, f32)> {
    let invalid = || ParseError::InvalidRange {
        property: property.to_string(),
        value: value.to_string(),
    };
    let parse_half = |half: &str| -> Option<f32> {
        let half = half.trim();
        let half = half.strip_suffix(['f', 'F']).unwrap_or(half);
        half.parse::<f32>().ok().filter(|v| v.is_finite())
    };
    let halves: Vec<&str> = value.split(',').collect();
    let [min, max] = halves.as_slice() else {
        return Err(invalid());
    };
    match (parse_half(*min), parse_half(*max)) {
        (Some(min), Some(max)) => Ok((min, max)),
        _ => Err(invalid()),
    }
}

// ---------------------------------------------------------------------------
// Function
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    /// Empty for unnamed parameters.
    pub name: String,
    pub ty: String,
}

/// A reflected member function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Function {
    pub name: String,
    pub display_name: String,
    pub return_type: String,
    pub parameters: Vec<Parameter>,
    pub is_const: bool,
    pub is_script_bindable: bool,
}

impl Function {
    pub fn from_raw(raw: &RawFunction) -> Self {
        let meta = parse_metadata(&raw.metadata_string);
        Self {
            name: raw.name.clone(),
            display_name: meta
                .get(META_DISPLAY_NAME)
                .cloned()
                .unwrap_or_else(|| raw.name.clone()),
            return_type: raw.return_type.clone(),
            parameters: parse_parameters(&raw.parameters_string),
            is_const: raw.is_const,
            is_script_bindable: has_flag(&meta, META_LUA_BIND),
        }
    }

    pub fn returns_void(&self) -> bool {
        self.return_type == "void"
    }
}

/// Split a parameter list into (name, type) pairs.
///
/// Default values are dropped and a bare `void` list is empty.
pub fn parse_parameters(params: &str) -> Vec<Parameter> {
    let params = params.trim();
    if params.is_empty() || params == "void" {
        return Vec::new();
    }
    split_top_level(params)
        .into_iter()
        .filter_map(|piece| {
            let decl = match find_top_level_eq(piece) {
                Some(eq) => piece[..eq].trim(),
                None => piece.trim(),
            };
            if decl.is_empty() {
                return None;
            }
            Some(split_parameter(decl))
        })
        .collect()
}

fn find_top_level_eq(piece: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, ch) in piece.char_indices() {
        match ch {
            '<' | '(' | '[' | '{' => depth += 1,
            '>' | ')' | ']' | '}' => depth -= 1,
            '=' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// `const FString& Name` → (`Name`, `const FString&`).
fn split_parameter(decl: &str) -> Parameter {
    let ident_start = decl
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphanumeric() || *c == '_')
        .last()
        .map_or(decl.len(), |(i, _)| i);
    let ty = decl[..ident_start].trim();
    if ident_start == decl.len() || ty.is_empty() || ty == "const" || ty.ends_with("::") {
        return Parameter { name: String::new(), ty: normalize_type(decl) };
    }
    Parameter {
        name: decl[ident_start..].to_string(),
        ty: normalize_type(ty),
    }
}

/// Collapse whitespace runs and pull `*` / `&` onto the type they modify.
pub fn normalize_type(ty: &str) -> String {
    let collapsed = ty.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.replace(" *", "*").replace(" &", "&")
}

// ---------------------------------------------------------------------------
// Enum
// ---------------------------------------------------------------------------

/// A reflected `enum class`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumEntity {
    pub name: String,
    pub underlying_type: String,
    /// Items in declaration order with their resolved values.
    pub values: Vec<(String, i64)>,
    pub display_name: String,
    pub description: String,
}

impl EnumEntity {
    pub fn value_of(&self, item: &str) -> Option<i64> {
        self.values.iter().find(|(name, _)| name == item).map(|(_, v)| *v)
    }
}

// ---------------------------------------------------------------------------
// ClassEntity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    Class,
    Struct,
    /// A header with reflected enums but no reflected class.
    EnumOnly,
}

/// Everything one header contributes to the reflection model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassEntity {
    pub name: String,
    /// Empty for structs and enum-only headers.
    pub parent_name: String,
    pub kind: ClassKind,
    pub properties: Vec<Property>,
    pub functions: Vec<Function>,
    pub enums: Vec<EnumEntity>,
    pub is_abstract: bool,
    pub is_not_spawnable: bool,
    pub display_name: String,
    pub description: String,
    pub declared_metadata: Metadata,
}

impl ClassEntity {
    /// A class or struct whose flags come from its `UCLASS`/`USTRUCT` arguments.
    pub fn new(name: &str, parent_name: &str, kind: ClassKind, declared_metadata: Metadata) -> Self {
        Self {
            name: name.to_string(),
            parent_name: parent_name.to_string(),
            kind,
            properties: Vec::new(),
            functions: Vec::new(),
            enums: Vec::new(),
            is_abstract: has_flag(&declared_metadata, META_ABSTRACT),
            is_not_spawnable: has_flag(&declared_metadata, META_NOT_SPAWNABLE),
            display_name: declared_metadata.get(META_DISPLAY_NAME).cloned().unwrap_or_default(),
            description: declared_metadata.get(META_DESCRIPTION).cloned().unwrap_or_default(),
            declared_metadata,
        }
    }

    /// Marker entity for a header that only declares enums.
    pub fn enum_only(file_stem: &str, enums: Vec<EnumEntity>) -> Self {
        let mut entity = Self::new(file_stem, "", ClassKind::EnumOnly, Metadata::new());
        entity.enums = enums;
        entity
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Functions registered with the scripting layer.
    pub fn script_functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter().filter(|f| f.is_script_bindable)
    }
}
