// Reflection marker tokens and metadata keys.
//
// Mirrors the marker macros declared by the engine's object macro header:
//   - Source/Runtime/Core/Object/ObjectMacros.h

// ---------------------------------------------------------------------------
// Header markers
// ---------------------------------------------------------------------------

/// In-class token that opts a type into the reflection system.
pub const REFLECTION_BODY_MARKER: &str = "GENERATED_REFLECTION_BODY";
/// Class metadata marker: `UCLASS(DisplayName="...", Abstract)`.
pub const CLASS_MARKER: &str = "UCLASS";
/// Struct metadata marker: `USTRUCT(...)`.
pub const STRUCT_MARKER: &str = "USTRUCT";
/// Property marker: `UPROPERTY(EditAnywhere, Category="...")`.
pub const PROPERTY_MARKER: &str = "UPROPERTY";
/// Function marker: `UFUNCTION(LuaBind, DisplayName="...")`.
pub const FUNCTION_MARKER: &str = "UFUNCTION";
/// Enum marker: `UENUM() enum class EFoo : uint8 { ... }`.
pub const ENUM_MARKER: &str = "UENUM";

/// Macro name prefix of the property registration macros.
pub const ADD_PROPERTY_PREFIX: &str = "ADD_PROPERTY";
/// Enum namespace used by property kind tags (`EPropertyType::Texture`).
pub const PROPERTY_TYPE_NAMESPACE: &str = "EPropertyType";

// ---------------------------------------------------------------------------
// Root classes
// ---------------------------------------------------------------------------

/// Root of every placeable world entity.
pub const ACTOR_ROOT: &str = "AActor";
/// Root of every attachable component.
pub const COMPONENT_ROOT: &str = "UActorComponent";

/// Synthetic property injected into both roots.
pub const OBJECT_NAME_PROPERTY: &str = "ObjectName";
/// Declared type of the synthetic name property.
pub const OBJECT_NAME_TYPE: &str = "FName";

// ---------------------------------------------------------------------------
// Declared metadata keys (inside marker argument lists)
// ---------------------------------------------------------------------------

pub const META_CATEGORY: &str = "Category";
pub const META_EDIT_ANYWHERE: &str = "EditAnywhere";
pub const META_TOOLTIP: &str = "Tooltip";
pub const META_RANGE: &str = "Range";
pub const META_SCRIPT_FILE: &str = "ScriptFile";
pub const META_LUA_READ_WRITE: &str = "LuaReadWrite";
pub const META_LUA_BIND: &str = "LuaBind";
pub const META_DISPLAY_NAME: &str = "DisplayName";
pub const META_DESCRIPTION: &str = "Description";
pub const META_ABSTRACT: &str = "Abstract";
pub const META_NOT_SPAWNABLE: &str = "NotSpawnable";

/// Value recorded for bare flags such as `EditAnywhere`.
pub const FLAG_VALUE: &str = "true";

// ---------------------------------------------------------------------------
// Resolved metadata keys (written by the type classifier)
// ---------------------------------------------------------------------------

/// Referenced base class of a `TSubclassOf<T>` property.
pub const EXTRA_BASE_CLASS: &str = "BaseClass";
/// Kind tag of a `TMap` key.
pub const EXTRA_KEY_TYPE: &str = "key_type";
/// Kind tag of a `TMap` value.
pub const EXTRA_VALUE_TYPE: &str = "value_type";
/// Kind tag of a `TArray` element.
pub const EXTRA_INNER_TYPE: &str = "inner_type";
/// Struct name of a struct-array element.
pub const EXTRA_STRUCT_TYPE: &str = "struct_type";

/// File extension assumed for script properties detected by name.
pub const DEFAULT_SCRIPT_EXTENSION: &str = ".lua";

// ---------------------------------------------------------------------------
// Generated artifact naming
// ---------------------------------------------------------------------------

/// Suffix of generated headers (`UFoo.generated.h`).
pub const GENERATED_HEADER_SUFFIX: &str = ".generated.h";
/// Suffix of generated sources (`UFoo.generated.cpp`).
pub const GENERATED_SOURCE_SUFFIX: &str = ".generated.cpp";
