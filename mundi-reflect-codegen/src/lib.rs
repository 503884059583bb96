// mundi-reflect-codegen: scans Mundi headers, emits reflection sources and
// registers them with the Visual Studio project.

pub mod cache;
pub mod config;
pub mod cpp_gen;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod project_files;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use mundi_reflect_parse::{ClassEntity, ClassGraph, ClassRole, MacroRegistry};

use crate::cache::BuildCache;
use crate::config::ReflectConfig;
pub use crate::error::{CodegenError, CodegenResult};

/// What a generate run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateSummary {
    /// Headers discovered under the source root.
    pub headers: usize,
    /// Reflected classes, structs and enum-only headers.
    pub entities: usize,
    /// Headers that failed to parse plus artifacts that failed to write.
    pub failures: usize,
    pub written: usize,
    /// Artifacts left alone, either cached or already up to date.
    pub skipped: usize,
}

/// Load the property-macro registry. A missing or unreadable header gives an
/// empty registry; classification then falls back to the built-in rules.
pub fn load_registry(macro_header: &Path) -> MacroRegistry {
    match fs::read_to_string(macro_header) {
        Ok(text) => MacroRegistry::parse(&text),
        Err(e) => {
            eprintln!(
                "mundi-reflect: warning: macro header {} unavailable ({e}), using built-in rules only",
                macro_header.display()
            );
            MacroRegistry::default()
        }
    }
}

/// Run the generate command. Main entry point for codegen.
///
/// Every header is parsed each run because classification needs the whole
/// class graph; the cache only decides which artifacts are re-rendered.
pub fn run_generate(config_path: &Path, force: bool) -> CodegenResult<GenerateSummary> {
    let config = ReflectConfig::load(config_path)?;
    let config_dir = config::config_dir(config_path);
    let paths = config.resolve(&config_dir);
    let codegen = &config.codegen;

    eprintln!("mundi-reflect: loading macro registry...");
    let registry = load_registry(&paths.macro_header);
    eprintln!("  {} property macros", registry.len());

    let headers = discovery::discover_headers(&paths.source_root, &paths.generated_out, &codegen.exclude_dirs);
    eprintln!("mundi-reflect: parsing {} headers...", headers.len());
    let outcome = dispatch::parse_headers(&headers, &registry, &codegen.parallel);
    for failure in &outcome.failures {
        eprintln!("  error: {failure}");
    }

    let mut graph = ClassGraph::new();
    for parsed in &outcome.parsed {
        if let Some(entity) = &parsed.entity {
            if graph.insert(entity.clone()).is_some() {
                eprintln!(
                    "  warning: {} declared again in {}, keeping the later one",
                    entity.name,
                    parsed.path.display()
                );
            }
        }
    }
    let roles = graph.resolve_roles();
    eprintln!("  {} reflected types", graph.len());

    fs::create_dir_all(&paths.generated_out).map_err(|e| CodegenError::write(&paths.generated_out, e))?;

    eprintln!("mundi-reflect: generating C++ code...");
    let mut cache = BuildCache::load(&paths.cache_file);
    let mut summary = GenerateSummary {
        headers: headers.len(),
        failures: outcome.failures.len(),
        ..GenerateSummary::default()
    };
    let mut generated_files: Vec<PathBuf> = Vec::new();

    let mut unreflected: BTreeSet<&Path> = BTreeSet::new();

    for parsed in &outcome.parsed {
        let Some(entity) = &parsed.entity else {
            unreflected.insert(&parsed.path);
            continue;
        };
        summary.entities += 1;

        let artifact_paths = cpp_gen::artifact_paths(entity, &paths.generated_out);
        generated_files.extend(artifact_paths.iter().cloned());
        if !force && cache.is_unchanged(&parsed.path, parsed.modified) {
            summary.skipped += artifact_paths.len();
            continue;
        }

        let role = roles.get(&entity.name).copied().unwrap_or(ClassRole::None);
        let source_header = parsed
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut complete = true;
        for artifact in cpp_gen::render(entity, role, &source_header, &paths.generated_out) {
            match cpp_gen::write_if_changed(&artifact) {
                Ok(true) => {
                    summary.written += 1;
                    eprintln!("  updated: {}", display_name(&artifact.path));
                }
                Ok(false) => summary.skipped += 1,
                Err(e) => {
                    eprintln!("  error: {e}");
                    summary.failures += 1;
                    complete = false;
                }
            }
        }
        if complete {
            cache.record(&parsed.path, &parsed.content_hash, parsed.modified, artifact_paths);
        }
    }

    // Headers that were deleted or are no longer reflected lose their cache
    // entry and artifacts. Headers that failed to parse keep both.
    let live = headers.iter().filter(|path| !unreflected.contains(path.as_path()));
    let stale = cache.prune(live.map(PathBuf::as_path));
    if !stale.is_empty() {
        eprintln!("  dropped {} stale cache entries", stale.len());
    }
    for artifact in stale.iter().flat_map(|entry| &entry.artifacts) {
        if generated_files.contains(artifact) {
            continue;
        }
        match fs::remove_file(artifact) {
            Ok(()) => eprintln!("  removed: {}", display_name(artifact)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => eprintln!("  warning: could not remove {}: {e}", artifact.display()),
        }
    }
    if let Err(e) = cache.save(&paths.cache_file) {
        eprintln!("mundi-reflect: warning: {e}");
    }

    update_project(&paths, &generated_files);

    eprintln!(
        "mundi-reflect: done! ({} written, {} unchanged, {} failed)",
        summary.written, summary.skipped, summary.failures
    );
    Ok(summary)
}

/// Register generated files with the project. Failures only warn.
fn update_project(paths: &config::ResolvedPaths, generated_files: &[PathBuf]) {
    let Some(vcxproj) = &paths.vcxproj else {
        return;
    };
    eprintln!("mundi-reflect: updating {}...", display_name(vcxproj));
    match project_files::patch_vcxproj(vcxproj, generated_files) {
        Ok(true) => eprintln!("  updated: {}", display_name(vcxproj)),
        Ok(false) => {}
        Err(e) => eprintln!("  warning: {e}"),
    }

    if let Some(filters) = &paths.filters {
        let project_dir = vcxproj.parent().unwrap_or(Path::new("."));
        match project_files::patch_filters(filters, project_dir, generated_files) {
            Ok(true) => eprintln!("  updated: {}", display_name(filters)),
            Ok(false) => {}
            Err(e) => eprintln!("  warning: {e}"),
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Parse a single header outside of a project run.
pub fn run_parse(header: &Path, macro_header: Option<&Path>) -> CodegenResult<Option<ClassEntity>> {
    let registry = macro_header.map(load_registry).unwrap_or_default();
    Ok(dispatch::parse_one(header, &registry)?.entity)
}

/// Delete the build cache so the next run regenerates everything.
/// Returns whether a cache file existed.
pub fn run_clean(config_path: &Path) -> CodegenResult<bool> {
    let config = ReflectConfig::load(config_path)?;
    let paths = config.resolve(&config::config_dir(config_path));
    match fs::remove_file(&paths.cache_file) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CodegenError::write(&paths.cache_file, e)),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::fs;
    use std::path::PathBuf;

    /// Fresh, empty directory under the system temp dir, unique per test name.
    pub fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mundi-reflect-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::scratch_dir;
    use std::time::Duration;

    const CONFIG: &str = r#"
[codegen]
source_root = "Source"
macro_header = "Source/Core/ObjectMacros.h"
generated_out = "Generated"

[project]
vcxproj = "Mundi.vcxproj"
"#;

    const MACROS: &str = "#define ADD_PROPERTY_TEXTURE(VarName, Category, bEdit, ...) { FProperty Prop; Prop.Type = EPropertyType::Texture; }\n";

    const LAMP: &str = r#"
#pragma once
#include "ALamp.generated.h"

UCLASS(DisplayName="Lamp")
class ALamp : public AActor
{
public:
    GENERATED_REFLECTION_BODY()

    UPROPERTY(EditAnywhere, Category="Rendering")
    UTexture* Icon = nullptr;

    UFUNCTION(LuaBind)
    void Toggle();
};
"#;

    const BLEND: &str = "UENUM()\nenum class EBlendMode : uint8 { Opaque, Masked };\n";

    const PROJECT: &str = "<Project>\n  <ItemGroup>\n    <ClCompile Include=\"Source\\Main.cpp\" />\n  </ItemGroup>\n</Project>\n";

    fn project(name: &str) -> PathBuf {
        let root = scratch_dir(name);
        fs::create_dir_all(root.join("Source/Core")).unwrap();
        fs::create_dir_all(root.join("Source/Engine")).unwrap();
        fs::write(root.join("mundi-reflect.toml"), CONFIG).unwrap();
        fs::write(root.join("Source/Core/ObjectMacros.h"), MACROS).unwrap();
        fs::write(root.join("Source/Engine/Lamp.h"), LAMP).unwrap();
        fs::write(root.join("Source/Engine/BlendTypes.h"), BLEND).unwrap();
        fs::write(root.join("Source/Engine/Math.h"), "struct FVector { float X; };\n").unwrap();
        fs::write(root.join("Mundi.vcxproj"), PROJECT).unwrap();
        root
    }

    fn touch(path: &Path, offset: Duration) {
        let modified = fs::metadata(path).unwrap().modified().unwrap() + offset;
        fs::File::options().write(true).open(path).unwrap().set_modified(modified).unwrap();
    }

    #[test]
    fn generate_is_incremental() {
        let root = project("generate-incremental");
        let config = root.join("mundi-reflect.toml");

        let first = run_generate(&config, false).unwrap();
        assert_eq!(
            first,
            GenerateSummary { headers: 4, entities: 2, failures: 0, written: 3, skipped: 0 }
        );

        let generated = root.join("Generated");
        let source = fs::read_to_string(generated.join("ALamp.generated.cpp")).unwrap();
        assert!(source.contains("#include \"Lamp.h\""));
        assert!(source.contains("MARK_AS_SPAWNABLE(\"Lamp\", \"Auto-generated ALamp\")"));
        assert!(source.contains("ADD_PROPERTY_TEXTURE("));
        assert!(source.contains("AddMethod<ALamp>(T, \"Toggle\", &ALamp::Toggle);"));
        assert!(generated.join("ALamp.generated.h").exists());
        assert!(generated.join("BlendTypes.generated.cpp").exists());
        assert!(!generated.join("BlendTypes.generated.h").exists());
        assert!(generated.join(".reflect_cache.json").exists());

        let vcxproj = fs::read_to_string(root.join("Mundi.vcxproj")).unwrap();
        assert!(vcxproj.contains("<ClCompile Include=\"Generated\\ALamp.generated.cpp\" />"));
        assert!(vcxproj.contains("<ClInclude Include=\"Generated\\ALamp.generated.h\" />"));

        let second = run_generate(&config, false).unwrap();
        assert_eq!(second.written, 0);
        assert_eq!(second.skipped, 3);
        assert_eq!(fs::read_to_string(root.join("Mundi.vcxproj")).unwrap(), vcxproj);

        let lamp = root.join("Source/Engine/Lamp.h");
        fs::write(&lamp, LAMP.replace("Category=\"Rendering\"", "Category=\"Light\"")).unwrap();
        touch(&lamp, Duration::from_secs(10));
        let third = run_generate(&config, false).unwrap();
        assert_eq!(third.written, 1);
        assert_eq!(third.skipped, 2);

        let forced = run_generate(&config, true).unwrap();
        assert_eq!(forced.written, 0);
        assert_eq!(forced.skipped, 3);

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn deleted_artifact_is_regenerated() {
        let root = project("generate-deleted");
        let config = root.join("mundi-reflect.toml");
        run_generate(&config, false).unwrap();

        fs::remove_file(root.join("Generated/BlendTypes.generated.cpp")).unwrap();
        let again = run_generate(&config, false).unwrap();
        assert_eq!(again.written, 1);
        assert!(root.join("Generated/BlendTypes.generated.cpp").exists());
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn unreflected_header_loses_its_artifacts() {
        let root = project("generate-unreflected");
        let config = root.join("mundi-reflect.toml");
        run_generate(&config, false).unwrap();
        let blend_cpp = root.join("Generated/BlendTypes.generated.cpp");
        assert!(blend_cpp.exists());

        let blend = root.join("Source/Engine/BlendTypes.h");
        fs::write(&blend, "enum class EBlendMode : uint8 { Opaque, Masked };\n").unwrap();
        touch(&blend, Duration::from_secs(10));
        let summary = run_generate(&config, false).unwrap();
        assert_eq!(summary.entities, 1);
        assert!(!blend_cpp.exists());
        assert!(root.join("Generated/ALamp.generated.cpp").exists());

        let cache = BuildCache::load(&root.join("Generated/.reflect_cache.json"));
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&blend).is_none());
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn parse_failure_is_counted_not_fatal() {
        let root = project("generate-failure");
        fs::write(
            root.join("Source/Engine/Broken.h"),
            "UCLASS()\nclass ABroken : public AActor\n{\n    GENERATED_REFLECTION_BODY()\n    UPROPERTY(Category=\"X\"\n};\n",
        )
        .unwrap();
        let summary = run_generate(&root.join("mundi-reflect.toml"), false).unwrap();
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.entities, 2);
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn clean_removes_cache() {
        let root = project("generate-clean");
        let config = root.join("mundi-reflect.toml");
        run_generate(&config, false).unwrap();
        assert!(run_clean(&config).unwrap());
        assert!(!run_clean(&config).unwrap());
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn missing_config_is_fatal() {
        let root = scratch_dir("generate-no-config");
        let err = run_generate(&root.join("absent.toml"), false).unwrap_err();
        assert!(matches!(err, CodegenError::Read { .. }));
    }

    #[test]
    fn parse_single_header() {
        let root = project("generate-parse");
        let entity = run_parse(&root.join("Source/Engine/Lamp.h"), None).unwrap().unwrap();
        assert_eq!(entity.name, "ALamp");
        assert!(run_parse(&root.join("Source/Engine/Math.h"), None).unwrap().is_none());
        fs::remove_dir_all(&root).unwrap();
    }
}
