// `<Name>.generated.h`: the body `GENERATED_REFLECTION_BODY()` expands to.

use mundi_reflect_parse::{ClassEntity, ClassKind};

/// Header for a class or struct. Every body line ends in a continuation
/// backslash except the last.
pub fn generate_header(entity: &ClassEntity) -> String {
    let name = &entity.name;
    let mut body: Vec<String> = vec!["public:".to_string()];

    if entity.kind == ClassKind::Struct {
        body.push("    static UStruct* StaticStruct()".to_string());
        body.push("    {".to_string());
        body.push(format!("        static UStruct Struct{{ \"{name}\", sizeof({name}) }};"));
        body.push("        static bool bRegistered = []() {".to_string());
        body.push("            UStruct::SignUpStruct(&Struct);".to_string());
        body.push("            return true;".to_string());
        body.push("        }();".to_string());
        body.push("        return &Struct;".to_string());
        body.push("    }".to_string());
    } else {
        body.push(format!("    DECLARE_CLASS({name}, {})", entity.parent_name));
        body.push(format!("    DECLARE_DUPLICATE({name})"));
    }
    body.push("    static void StaticRegisterProperties();".to_string());

    let mut out = String::with_capacity(1024);
    out.push_str(&format!("// Generated by mundi-reflect from {name}. Do not edit.\n"));
    out.push_str("#pragma once\n\n");
    out.push_str("#ifdef CURRENT_CLASS_GENERATED_BODY\n#undef CURRENT_CLASS_GENERATED_BODY\n#endif\n\n");
    out.push_str("#define CURRENT_CLASS_GENERATED_BODY \\\n");
    out.push_str(&body.join(" \\\n"));
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_body_declares_class_and_duplicate() {
        let entity = ClassEntity::new("ALamp", "AActor", ClassKind::Class, Default::default());
        let text = generate_header(&entity);
        assert!(text.contains("#pragma once"));
        assert!(text.contains("#define CURRENT_CLASS_GENERATED_BODY \\\npublic: \\\n"));
        assert!(text.contains("    DECLARE_CLASS(ALamp, AActor) \\\n"));
        assert!(text.contains("    DECLARE_DUPLICATE(ALamp) \\\n"));
        assert!(text.ends_with("    static void StaticRegisterProperties();\n"));
    }

    #[test]
    fn struct_body_registers_struct() {
        let entity = ClassEntity::new("FKBoxElem", "FKShapeElem", ClassKind::Struct, Default::default());
        let text = generate_header(&entity);
        assert!(!text.contains("DECLARE_CLASS"));
        assert!(text.contains("static UStruct Struct{ \"FKBoxElem\", sizeof(FKBoxElem) }; \\\n"));
        assert!(text.contains("UStruct::SignUpStruct(&Struct);"));
    }
}
