// `<Name>.generated.cpp`: property registration, Lua bindings and enum tables.

use mundi_reflect_markers::{
    EXTRA_INNER_TYPE, EXTRA_KEY_TYPE, EXTRA_STRUCT_TYPE, EXTRA_VALUE_TYPE, META_LUA_READ_WRITE,
};
use mundi_reflect_parse::metadata::has_flag;
use mundi_reflect_parse::{ClassEntity, ClassKind, ClassRole, EnumEntity, Function, Property, PropertyMacro};

use super::escape_cpp;

pub fn generate_source(entity: &ClassEntity, role: ClassRole, source_header: &str) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(&format!("// Generated by mundi-reflect from {source_header}. Do not edit.\n\n"));
    out.push_str("#include \"pch.h\"\n");
    out.push_str(&format!("#include \"{source_header}\"\n"));

    let lua_block = match entity.kind {
        ClassKind::Class => generate_lua_block(entity),
        _ => None,
    };
    if lua_block.is_some() {
        out.push_str("#include \"LuaBindHelpers.h\"\n");
    }

    if entity.kind != ClassKind::EnumOnly {
        out.push('\n');
        out.push_str(&generate_property_block(entity, role));
    }
    if let Some(block) = lua_block {
        out.push('\n');
        out.push_str(&block);
    }
    for e in &entity.enums {
        out.push('\n');
        out.push_str(&generate_enum_block(e));
    }
    out
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// `BEGIN_PROPERTIES` … `END_PROPERTIES()` for a class, or the struct variant.
pub fn generate_property_block(entity: &ClassEntity, role: ClassRole) -> String {
    let name = &entity.name;
    let mut out = String::new();

    if entity.kind == ClassKind::Struct {
        out.push_str(&format!("BEGIN_STRUCT_PROPERTIES({name})\n"));
    } else {
        out.push_str(&format!("BEGIN_PROPERTIES({name})\n"));
        if let Some(mark) = role.mark_macro() {
            let display = if entity.display_name.is_empty() {
                name.as_str()
            } else {
                entity.display_name.as_str()
            };
            let description = if entity.description.is_empty() {
                format!("Auto-generated {name}")
            } else {
                entity.description.clone()
            };
            out.push_str(&format!(
                "    {mark}(\"{}\", \"{}\")\n",
                escape_cpp(display),
                escape_cpp(&description)
            ));
        }
    }

    for prop in &entity.properties {
        out.push_str("    ");
        out.push_str(&property_line(prop));
        out.push('\n');
    }
    out.push_str("END_PROPERTIES()\n");
    out
}

/// One registration call, shaped by the property's macro.
pub fn property_line(prop: &Property) -> String {
    let extra = |key: &str, fallback: &str| -> String {
        prop.extra_metadata.get(key).cloned().unwrap_or_else(|| fallback.to_string())
    };
    let category = escape_cpp(&prop.category);
    let editable = if prop.is_editable { "true" } else { "false" };
    let tooltip = if prop.tooltip.is_empty() {
        String::new()
    } else {
        format!(", \"{}\"", escape_cpp(&prop.tooltip))
    };
    let name = &prop.name;
    let ty = &prop.declared_type;
    let macro_name = prop.kind.macro_name();

    match &prop.kind {
        PropertyMacro::Ranged => {
            let (min, max) = prop.numeric_range.unwrap_or((0.0, 0.0));
            format!(
                "{macro_name}({ty}, {name}, \"{category}\", {}f, {}f, {editable}{tooltip})",
                float_literal(min),
                float_literal(max)
            )
        }
        PropertyMacro::StructArray => format!(
            "{macro_name}({}, {name}, \"{category}\", {editable}{tooltip})",
            extra(EXTRA_STRUCT_TYPE, "Unknown")
        ),
        PropertyMacro::Array => format!(
            "{macro_name}({}, {name}, \"{category}\", {editable}{tooltip})",
            extra(EXTRA_INNER_TYPE, "EPropertyType::ObjectPtr")
        ),
        PropertyMacro::Map => format!(
            "{macro_name}({}, {}, {name}, \"{category}\", {editable}{tooltip})",
            extra(EXTRA_KEY_TYPE, "EPropertyType::FString"),
            extra(EXTRA_VALUE_TYPE, "EPropertyType::Int32")
        ),
        PropertyMacro::Script => format!(
            "{macro_name}({ty}, {name}, \"{category}\", \"{}\", {editable}{tooltip})",
            escape_cpp(prop.script_extension())
        ),
        _ => format!("{macro_name}({ty}, {name}, \"{category}\", {editable}{tooltip})"),
    }
}

/// `1.0`, `0.5`, `-20.0`: always carries a decimal point so the `f` suffix is valid.
fn float_literal(value: f32) -> String {
    format!("{value:?}")
}

// ---------------------------------------------------------------------------
// Lua bindings
// ---------------------------------------------------------------------------

/// `LUA_BIND_BEGIN` block, or `None` when nothing is exposed to scripts.
pub fn generate_lua_block(entity: &ClassEntity) -> Option<String> {
    let name = &entity.name;
    let mut lines: Vec<String> = entity
        .script_functions()
        .map(|f| method_binding(name, f))
        .collect();
    lines.extend(
        entity
            .properties
            .iter()
            .filter(|p| has_flag(&p.extra_metadata, META_LUA_READ_WRITE))
            .map(|p| {
                format!(
                    "AddProperty<{name}, {}>(T, \"{}\", &{name}::{});",
                    p.declared_type, p.name, p.name
                )
            }),
    );
    if lines.is_empty() {
        return None;
    }

    let mut out = format!("LUA_BIND_BEGIN({name})\n{{\n");
    for line in lines {
        out.push_str(&format!("    {line}\n"));
    }
    out.push_str("}\nLUA_BIND_END()\n");
    Some(out)
}

/// Void non-const methods go through `AddMethod`; everything else needs
/// the return type spelled out for `AddMethodR`.
fn method_binding(class: &str, f: &Function) -> String {
    let mut template_args = Vec::with_capacity(f.parameters.len() + 2);
    let helper = if f.returns_void() && !f.is_const {
        "AddMethod"
    } else {
        template_args.push(f.return_type.as_str());
        "AddMethodR"
    };
    template_args.push(class);
    template_args.extend(f.parameters.iter().map(|p| p.ty.as_str()));
    format!(
        "{helper}<{}>(T, \"{}\", &{class}::{});",
        template_args.join(", "),
        escape_cpp(&f.display_name),
        f.name
    )
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

pub fn generate_enum_block(e: &EnumEntity) -> String {
    let mut out = format!("BEGIN_ENUM({}, {})\n", e.name, e.underlying_type);
    for (item, value) in &e.values {
        out.push_str(&format!("    ADD_ENUM_VALUE({item}, {value})\n"));
    }
    out.push_str("END_ENUM()\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mundi_reflect_parse::{parse_header, MacroRegistry};

    const LAMP: &str = r#"
UCLASS(DisplayName="Lamp", Description="A point of light")
class ALamp : public AActor
{
    GENERATED_REFLECTION_BODY()

    UPROPERTY(EditAnywhere, Category="Light", Range="0, 100", Tooltip="Brightness")
    float Intensity = 1.0f;

    UPROPERTY(EditAnywhere, Category="Light")
    TArray<float> Falloff;

    UPROPERTY(EditAnywhere, Category="Light")
    TArray<FLightProfile> Profiles;

    UPROPERTY(Category="Light")
    TMap<FString, int32> Channels;

    UPROPERTY(EditAnywhere, Category="Script", ScriptFile=".luau")
    FString ScriptPath;

    UPROPERTY(EditAnywhere, Category="Rendering", LuaReadWrite)
    bool bVisible = true;

    UFUNCTION(LuaBind, DisplayName="Toggle")
    void ToggleLight();

    UFUNCTION(LuaBind)
    float GetIntensity() const;

    UFUNCTION(LuaBind)
    void SetColor(const FVector& Color, float Alpha = 1.0f);

    UFUNCTION()
    void Hidden();
};
"#;

    fn lamp() -> ClassEntity {
        parse_header(LAMP, "Lamp", &MacroRegistry::default()).unwrap().unwrap()
    }

    #[test]
    fn property_block_shapes() {
        let block = generate_property_block(&lamp(), ClassRole::Spawnable);
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(
            lines,
            vec![
                "BEGIN_PROPERTIES(ALamp)",
                "    MARK_AS_SPAWNABLE(\"Lamp\", \"A point of light\")",
                "    ADD_PROPERTY(FName, ObjectName, \"[Actor]\", true, \"Name of this actor\")",
                "    ADD_PROPERTY_RANGE(float, Intensity, \"Light\", 0.0f, 100.0f, true, \"Brightness\")",
                "    ADD_PROPERTY_ARRAY(EPropertyType::Float, Falloff, \"Light\", true)",
                "    ADD_PROPERTY_STRUCT_ARRAY(FLightProfile, Profiles, \"Light\", true)",
                "    ADD_PROPERTY_MAP(EPropertyType::FString, EPropertyType::Int32, Channels, \"Light\", false)",
                "    ADD_PROPERTY_SCRIPT(FString, ScriptPath, \"Script\", \".luau\", true)",
                "    ADD_PROPERTY(bool, bVisible, \"Rendering\", true)",
                "END_PROPERTIES()",
            ]
        );
    }

    #[test]
    fn default_mark_line_uses_class_name() {
        let entity = ClassEntity::new("UGlowComponent", "USceneComponent", ClassKind::Class, Default::default());
        let block = generate_property_block(&entity, ClassRole::Component);
        assert!(block.contains("    MARK_AS_COMPONENT(\"UGlowComponent\", \"Auto-generated UGlowComponent\")\n"));

        let block = generate_property_block(&entity, ClassRole::None);
        assert_eq!(block, "BEGIN_PROPERTIES(UGlowComponent)\nEND_PROPERTIES()\n");
    }

    #[test]
    fn structs_use_struct_block_without_mark() {
        let entity = ClassEntity::new("FKBoxElem", "FKShapeElem", ClassKind::Struct, Default::default());
        let block = generate_property_block(&entity, ClassRole::Spawnable);
        assert_eq!(block, "BEGIN_STRUCT_PROPERTIES(FKBoxElem)\nEND_PROPERTIES()\n");
    }

    #[test]
    fn lua_block_binds_functions_and_read_write_properties() {
        let block = generate_lua_block(&lamp()).unwrap();
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(
            lines,
            vec![
                "LUA_BIND_BEGIN(ALamp)",
                "{",
                "    AddMethod<ALamp>(T, \"Toggle\", &ALamp::ToggleLight);",
                "    AddMethodR<float, ALamp>(T, \"GetIntensity\", &ALamp::GetIntensity);",
                "    AddMethod<ALamp, const FVector&, float>(T, \"SetColor\", &ALamp::SetColor);",
                "    AddProperty<ALamp, bool>(T, \"bVisible\", &ALamp::bVisible);",
                "}",
                "LUA_BIND_END()",
            ]
        );
    }

    #[test]
    fn no_lua_block_without_bindings() {
        let entity = ClassEntity::new("AQuiet", "AActor", ClassKind::Class, Default::default());
        assert!(generate_lua_block(&entity).is_none());
        let source = generate_source(&entity, ClassRole::Spawnable, "Quiet.h");
        assert!(!source.contains("LuaBindHelpers.h"));
        assert!(source.contains("#include \"Quiet.h\"\n"));
    }

    #[test]
    fn full_source_orders_sections() {
        let source = generate_source(&lamp(), ClassRole::Spawnable, "Lamp.h");
        let props = source.find("BEGIN_PROPERTIES(ALamp)").unwrap();
        let lua = source.find("LUA_BIND_BEGIN(ALamp)").unwrap();
        assert!(source.contains("#include \"LuaBindHelpers.h\"\n"));
        assert!(props < lua);
    }

    #[test]
    fn enum_block_lists_values() {
        let e = EnumEntity {
            name: "EBlendMode".to_string(),
            underlying_type: "uint8".to_string(),
            values: vec![("Opaque".to_string(), 0), ("Masked".to_string(), 4), ("Translucent".to_string(), 5)],
            display_name: String::new(),
            description: String::new(),
        };
        assert_eq!(
            generate_enum_block(&e),
            "BEGIN_ENUM(EBlendMode, uint8)\n    ADD_ENUM_VALUE(Opaque, 0)\n    ADD_ENUM_VALUE(Masked, 4)\n    ADD_ENUM_VALUE(Translucent, 5)\nEND_ENUM()\n"
        );
    }
}
