// Type classifier: reduces a property's declared C++ type to the registration
// macro that reflects it, recording nested template information on the way.
//
// Rules are tried in a fixed order and the first match wins:
//   1. TSubclassOf<T>      → ADD_PROPERTY, records BaseClass
//   2. TMap<K, V, ...>     → ADD_PROPERTY_MAP, records key/value kinds
//   3. TArray<T>           → ADD_PROPERTY_ARRAY or ADD_PROPERTY_STRUCT_ARRAY
//   4. curve types         → ADD_PROPERTY_CURVE
//   5. shader views        → ADD_PROPERTY_SRV
//   6. pointers            → resource macro, registry macro, or object pointer
//   7. script files        → ADD_PROPERTY_SCRIPT
//   8. declared Range      → ADD_PROPERTY_RANGE
//   9. everything else     → ADD_PROPERTY

use mundi_reflect_markers::{
    ADD_PROPERTY_PREFIX, DEFAULT_SCRIPT_EXTENSION, EXTRA_BASE_CLASS, EXTRA_INNER_TYPE,
    EXTRA_KEY_TYPE, EXTRA_STRUCT_TYPE, EXTRA_VALUE_TYPE, META_SCRIPT_FILE,
    PROPERTY_TYPE_NAMESPACE,
};
use serde::{Serialize, Serializer};

use crate::macro_registry::MacroRegistry;
use crate::model::Property;
use crate::text::{extract_template_args, template_head};

/// Registration macro a property is emitted through.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyMacro {
    Scalar,
    Ranged,
    Array,
    StructArray,
    Map,
    Curve,
    Srv,
    Script,
    Texture,
    StaticMesh,
    SkeletalMesh,
    Material,
    Audio,
    ParticleSystem,
    /// Pointer to an object with no dedicated macro.
    ObjectPtr,
    /// A macro learned from the macro-definition header with no built-in variant.
    Registered(String),
}

/// Built-in variants and their macro names. `Scalar` owns the bare prefix.
const BUILTIN_MACROS: &[(PropertyMacro, &str)] = &[
    (PropertyMacro::Scalar, "ADD_PROPERTY"),
    (PropertyMacro::Ranged, "ADD_PROPERTY_RANGE"),
    (PropertyMacro::Array, "ADD_PROPERTY_ARRAY"),
    (PropertyMacro::StructArray, "ADD_PROPERTY_STRUCT_ARRAY"),
    (PropertyMacro::Map, "ADD_PROPERTY_MAP"),
    (PropertyMacro::Curve, "ADD_PROPERTY_CURVE"),
    (PropertyMacro::Srv, "ADD_PROPERTY_SRV"),
    (PropertyMacro::Script, "ADD_PROPERTY_SCRIPT"),
    (PropertyMacro::Texture, "ADD_PROPERTY_TEXTURE"),
    (PropertyMacro::StaticMesh, "ADD_PROPERTY_STATICMESH"),
    (PropertyMacro::SkeletalMesh, "ADD_PROPERTY_SKELETALMESH"),
    (PropertyMacro::Material, "ADD_PROPERTY_MATERIAL"),
    (PropertyMacro::Audio, "ADD_PROPERTY_AUDIO"),
    (PropertyMacro::ParticleSystem, "ADD_PROPERTY_PARTICLESYSTEM"),
];

impl PropertyMacro {
    pub fn macro_name(&self) -> &str {
        match self {
            PropertyMacro::ObjectPtr => ADD_PROPERTY_PREFIX,
            PropertyMacro::Registered(name) => name.as_str(),
            builtin => BUILTIN_MACROS
                .iter()
                .find(|(variant, _)| variant == builtin)
                .map_or(ADD_PROPERTY_PREFIX, |(_, name)| *name),
        }
    }

    /// Inverse of [`macro_name`](Self::macro_name); unknown names become `Registered`.
    pub fn from_macro_name(name: &str) -> Self {
        BUILTIN_MACROS
            .iter()
            .find(|(_, macro_name)| *macro_name == name)
            .map_or_else(|| PropertyMacro::Registered(name.to_string()), |(variant, _)| variant.clone())
    }
}

impl Serialize for PropertyMacro {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.macro_name())
    }
}

// ---------------------------------------------------------------------------
// Built-in type tables
// ---------------------------------------------------------------------------

/// Value types that are never treated as user structs.
const BUILTIN_VALUE_TYPES: &[&str] = &["FString", "FName", "FVector", "FVector2D", "FLinearColor"];

/// Resource pointer base names (lower-case, exact) → macro and value kind.
const RESOURCE_POINTERS: &[(&[&str], PropertyMacro, &str)] = &[
    (&["utexture", "utexture2d"], PropertyMacro::Texture, "Texture"),
    (&["ustaticmesh"], PropertyMacro::StaticMesh, "StaticMesh"),
    (&["uskeletalmesh"], PropertyMacro::SkeletalMesh, "SkeletalMesh"),
    (&["umaterial"], PropertyMacro::Material, "Material"),
    (&["usound", "usoundbase"], PropertyMacro::Audio, "Sound"),
    (&["uparticlesystem"], PropertyMacro::ParticleSystem, "ParticleSystem"),
];

/// Scalar/value kinds by lower-case type name.
const VALUE_KINDS: &[(&[&str], &str)] = &[
    (&["bool"], "Bool"),
    (&["int32", "int", "uint32", "unsigned int"], "Int32"),
    (&["float", "double"], "Float"),
    (&["fstring"], "FString"),
    (&["fname"], "FName"),
    (&["fvector"], "FVector"),
    (&["fvector2d"], "FVector2D"),
    (&["flinearcolor"], "FLinearColor"),
];

const OBJECT_PTR_KIND: &str = "ObjectPtr";
const STRUCT_KIND: &str = "Struct";

const CURVE_NEEDLES: &[&str] = &["ucurve", "fcurve"];
const SRV_NEEDLES: &[&str] = &["srv", "shaderresourceview"];
const SCRIPT_NAME_NEEDLES: &[&str] = &["script", "lua"];

fn kind_tag(kind: &str) -> String {
    format!("{PROPERTY_TYPE_NAMESPACE}::{kind}")
}

/// `class UTexture *` → `utexture`.
fn pointer_base_name(type_str: &str) -> String {
    let lowered = type_str.to_ascii_lowercase().replace('*', "");
    let trimmed = lowered.trim();
    trimmed.strip_prefix("class ").unwrap_or(trimmed).trim().to_string()
}

fn resource_pointer(type_str: &str) -> Option<(&'static PropertyMacro, &'static str)> {
    let base = pointer_base_name(type_str);
    RESOURCE_POINTERS
        .iter()
        .find(|(names, _, _)| names.contains(&base.as_str()))
        .map(|(_, macro_kind, tag)| (macro_kind, *tag))
}

/// Struct-like: an `F`-prefixed non-pointer name outside the built-in value types.
fn is_user_struct(type_str: &str) -> bool {
    let name = type_str.trim();
    !name.contains('*')
        && !name.contains('<')
        && name.starts_with('F')
        && name.chars().nth(1).is_some_and(|c| c.is_ascii_uppercase())
        && !BUILTIN_VALUE_TYPES.contains(&name)
}

/// `EPropertyType::<Kind>` tag of a container element, map key or map value.
pub fn value_kind(type_str: &str, registry: &MacroRegistry) -> String {
    let trimmed = type_str.trim();
    let lowered = trimmed.to_ascii_lowercase();

    if let Some((_, kind)) = VALUE_KINDS.iter().find(|(names, _)| names.contains(&lowered.as_str())) {
        return kind_tag(kind);
    }
    if trimmed.contains('*') {
        if let Some((_, kind)) = resource_pointer(trimmed) {
            return kind_tag(kind);
        }
        if let Some(entry) = registry.macro_for_type(trimmed) {
            return kind_tag(&entry.property_kind);
        }
        return kind_tag(OBJECT_PTR_KIND);
    }
    if is_user_struct(trimmed) {
        return kind_tag(STRUCT_KIND);
    }
    kind_tag(OBJECT_PTR_KIND)
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Pick the registration macro for `property`, store it in `property.kind`
/// and record nested type information in `extra_metadata`.
///
/// Running it again on the same property gives the same result.
pub fn classify(property: &mut Property, registry: &MacroRegistry) -> PropertyMacro {
    let kind = resolve(property, registry);
    property.kind = kind.clone();
    kind
}

fn resolve(property: &mut Property, registry: &MacroRegistry) -> PropertyMacro {
    let declared = property.declared_type.clone();
    let lowered = declared.to_ascii_lowercase();
    let head = template_head(&declared).map(str::to_ascii_lowercase);
    let extra = &mut property.extra_metadata;

    match head.as_deref() {
        Some("tsubclassof") => {
            if let Some(base) = extract_template_args(&declared).into_iter().next() {
                extra.insert(EXTRA_BASE_CLASS.to_string(), base);
            }
            return PropertyMacro::Scalar;
        }
        Some("tmap") => {
            let args = extract_template_args(&declared);
            if let [key, value, ..] = args.as_slice() {
                extra.insert(EXTRA_KEY_TYPE.to_string(), value_kind(key, registry));
                extra.insert(EXTRA_VALUE_TYPE.to_string(), value_kind(value, registry));
            }
            return PropertyMacro::Map;
        }
        Some("tarray") => {
            let Some(inner) = extract_template_args(&declared).into_iter().next() else {
                return PropertyMacro::Array;
            };
            extra.insert(EXTRA_INNER_TYPE.to_string(), value_kind(&inner, registry));
            if is_user_struct(&inner) {
                extra.insert(EXTRA_STRUCT_TYPE.to_string(), inner);
                return PropertyMacro::StructArray;
            }
            return PropertyMacro::Array;
        }
        _ => {}
    }

    if CURVE_NEEDLES.iter().any(|n| lowered.contains(n)) {
        return PropertyMacro::Curve;
    }
    if SRV_NEEDLES.iter().any(|n| lowered.contains(n)) {
        return PropertyMacro::Srv;
    }

    if declared.contains('*') {
        if let Some((macro_kind, _)) = resource_pointer(&declared) {
            return macro_kind.clone();
        }
        if let Some(entry) = registry.macro_for_type(&declared) {
            return PropertyMacro::from_macro_name(&entry.macro_name);
        }
        return PropertyMacro::ObjectPtr;
    }

    if extra.contains_key(META_SCRIPT_FILE) {
        return PropertyMacro::Script;
    }
    if declared.trim() == "FString" {
        let name = property.name.to_ascii_lowercase();
        if SCRIPT_NAME_NEEDLES.iter().any(|n| name.contains(n)) {
            extra
                .entry(META_SCRIPT_FILE.to_string())
                .or_insert_with(|| DEFAULT_SCRIPT_EXTENSION.to_string());
            return PropertyMacro::Script;
        }
    }

    if property.numeric_range.is_some() {
        return PropertyMacro::Ranged;
    }
    PropertyMacro::Scalar
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = include_str!("../fixtures/ObjectMacros.h");

    fn registry() -> MacroRegistry {
        MacroRegistry::parse(FIXTURE)
    }

    fn classified(name: &str, ty: &str) -> Property {
        let mut prop = Property::new(name, ty);
        classify(&mut prop, &registry());
        prop
    }

    fn extra<'p>(prop: &'p Property, key: &str) -> Option<&'p str> {
        prop.extra_metadata.get(key).map(String::as_str)
    }

    #[test]
    fn subclass_of_records_base_and_is_scalar() {
        let prop = classified("AnimClass", "TSubclassOf<UAnimInstance>");
        assert_eq!(prop.kind, PropertyMacro::Scalar);
        assert_eq!(extra(&prop, "BaseClass"), Some("UAnimInstance"));
    }

    #[test]
    fn map_records_key_and_value_kinds() {
        let prop = classified("Lookup", "TMap<FString, UMaterial*>");
        assert_eq!(prop.kind, PropertyMacro::Map);
        assert_eq!(extra(&prop, "key_type"), Some("EPropertyType::FString"));
        assert_eq!(extra(&prop, "value_type"), Some("EPropertyType::Material"));

        let nested = classified("Nested", "TMap<int32, TArray<float>, FDefaultSetAllocator>");
        assert_eq!(nested.kind, PropertyMacro::Map);
        assert_eq!(extra(&nested, "key_type"), Some("EPropertyType::Int32"));
        assert_eq!(extra(&nested, "value_type"), Some("EPropertyType::ObjectPtr"));
    }

    #[test]
    fn array_of_value_types_is_never_struct_array() {
        for inner in ["int32", "float", "bool", "FString", "FName", "FVector", "FVector2D", "FLinearColor"] {
            let prop = classified("Items", &format!("TArray<{inner}>"));
            assert_eq!(prop.kind, PropertyMacro::Array, "element {inner}");
            assert!(!prop.extra_metadata.contains_key("struct_type"));
        }
        let prop = classified("Materials", "TArray<UMaterial*>");
        assert_eq!(prop.kind, PropertyMacro::Array);
        assert_eq!(extra(&prop, "inner_type"), Some("EPropertyType::Material"));
    }

    #[test]
    fn array_of_user_struct_is_struct_array() {
        let prop = classified("Sockets", "TArray<FBoneSocket>");
        assert_eq!(prop.kind, PropertyMacro::StructArray);
        assert_eq!(extra(&prop, "struct_type"), Some("FBoneSocket"));
        assert_eq!(extra(&prop, "inner_type"), Some("EPropertyType::Struct"));

        let pointer = classified("Sockets", "TArray<FBoneSocket*>");
        assert_eq!(pointer.kind, PropertyMacro::Array);
    }

    #[test]
    fn outer_template_decides_container_kind() {
        let prop = classified("Groups", "TArray<TMap<FName, int32>>");
        assert_eq!(prop.kind, PropertyMacro::Array);
        let prop = classified("Classes", "TArray<TSubclassOf<AActor>>");
        assert_eq!(prop.kind, PropertyMacro::Array);
    }

    #[test]
    fn curve_and_srv_come_before_pointer_rules() {
        assert_eq!(classified("Fade", "UCurveFloat*").kind, PropertyMacro::Curve);
        assert_eq!(classified("Fade", "FCurve").kind, PropertyMacro::Curve);
        assert_eq!(classified("View", "ID3D11ShaderResourceView*").kind, PropertyMacro::Srv);
    }

    #[test]
    fn pointer_resources_match_exact_base_names() {
        assert_eq!(classified("T", "UTexture*").kind, PropertyMacro::Texture);
        assert_eq!(classified("T", "class UTexture2D *").kind, PropertyMacro::Texture);
        assert_eq!(classified("M", "UStaticMesh*").kind, PropertyMacro::StaticMesh);
        assert_eq!(classified("M", "USkeletalMesh*").kind, PropertyMacro::SkeletalMesh);
        assert_eq!(classified("M", "UMaterial*").kind, PropertyMacro::Material);
        assert_eq!(classified("S", "USoundBase*").kind, PropertyMacro::Audio);
        assert_eq!(classified("P", "UParticleSystem*").kind, PropertyMacro::ParticleSystem);
    }

    #[test]
    fn derived_pointer_types_fall_to_registry_then_object_ptr() {
        // Not an exact resource name; the registry's MATERIAL patterns still match.
        assert_eq!(classified("M", "UMaterialInstance*").kind, PropertyMacro::Material);
        // Matches nothing at all.
        let prop = classified("Target", "AActor*");
        assert_eq!(prop.kind, PropertyMacro::ObjectPtr);
        assert_eq!(prop.kind.macro_name(), "ADD_PROPERTY");
    }

    #[test]
    fn registry_macros_without_builtin_variant_are_kept_by_name() {
        let registry = MacroRegistry::parse(
            "#define ADD_PROPERTY_WIDGET(VarType, VarName) { Prop.Type = EPropertyType::Widget; }\n",
        );
        let mut prop = Property::new("Hud", "UWidgetBase*");
        assert_eq!(
            classify(&mut prop, &registry),
            PropertyMacro::Registered("ADD_PROPERTY_WIDGET".into())
        );
        assert_eq!(value_kind("UWidget*", &registry), "EPropertyType::Widget");
    }

    #[test]
    fn script_by_metadata_or_name() {
        let mut explicit = Property::new("Behaviour", "FString");
        explicit.extra_metadata.insert("ScriptFile".into(), ".py".into());
        classify(&mut explicit, &registry());
        assert_eq!(explicit.kind, PropertyMacro::Script);
        assert_eq!(extra(&explicit, "ScriptFile"), Some(".py"));

        let by_name = classified("LuaScriptPath", "FString");
        assert_eq!(by_name.kind, PropertyMacro::Script);
        assert_eq!(extra(&by_name, "ScriptFile"), Some(".lua"));

        let plain = classified("DisplayText", "FString");
        assert_eq!(plain.kind, PropertyMacro::Scalar);
        assert!(plain.extra_metadata.is_empty());
    }

    #[test]
    fn range_then_scalar() {
        let mut ranged = Property::new("Intensity", "float");
        ranged.numeric_range = Some((0.0, 10.0));
        assert_eq!(classify(&mut ranged, &registry()), PropertyMacro::Ranged);
        assert_eq!(classified("bVisible", "bool").kind, PropertyMacro::Scalar);
    }

    #[test]
    fn classification_is_idempotent() {
        let registry = registry();
        for (name, ty) in [
            ("ScriptPath", "FString"),
            ("Lookup", "TMap<FName, UTexture*>"),
            ("Sockets", "TArray<FBoneSocket>"),
            ("AnimClass", "TSubclassOf<UAnimInstance>"),
            ("Mesh", "UStaticMesh*"),
        ] {
            let mut prop = Property::new(name, ty);
            let first = classify(&mut prop, &registry);
            let first_meta = prop.extra_metadata.clone();
            let second = classify(&mut prop, &registry);
            assert_eq!(first, second, "{ty}");
            assert_eq!(first_meta, prop.extra_metadata, "{ty}");
        }
    }

    #[test]
    fn macro_names_round_trip() {
        for (variant, name) in BUILTIN_MACROS {
            assert_eq!(variant.macro_name(), *name);
            assert_eq!(&PropertyMacro::from_macro_name(name), variant);
        }
        assert_eq!(
            PropertyMacro::from_macro_name("ADD_PROPERTY_COUNT"),
            PropertyMacro::Registered("ADD_PROPERTY_COUNT".into())
        );
    }
}
