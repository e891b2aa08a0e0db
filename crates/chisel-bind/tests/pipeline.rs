//! End-to-end pipeline tests: sample audio header in, C# source out.

use std::fs;

use chisel_bind::names::{capitalize, snake_to_camel, strip_prefix, strip_suffix, strip_through_separator, NameReplacementTable};
use chisel_bind::test::sample_compilation;
use chisel_bind::{
    infer_ref_directions, BindingDef, BindingKind, BindingTree, CsType, Generator,
    GeneratorOptions, HeaderKind, HeaderTree, MacroRule, Rule, UnmanagedKind,
};
use tempfile::tempdir;

/// The rule set a consumer would register for an `ipl`-prefixed audio
/// library header.
fn audio_generator() -> Generator {
    let options = GeneratorOptions::new("SteamAudio", "IPL");
    let output_file = options.output_file.clone();

    let replacements = NameReplacementTable::new()
        .with("SIMD", "Simd")
        .with("Outofmemory", "OutOfMemory");
    let source_replacements = replacements.clone();

    Generator::new(options)
        // The boolean-flag enum is replaced by a native bool below.
        .source_rule(
            Rule::for_kind(HeaderKind::Enum, |tree: &mut HeaderTree, id| {
                tree.discard(id);
            })
            .named("IPLbool"),
        )
        // Normalize type names before mapping so generated type references
        // pick up the new names.
        .source_rule(Rule::for_kinds(
            vec![HeaderKind::Struct, HeaderKind::Enum, HeaderKind::Typedef],
            move |tree: &mut HeaderTree, id| {
                let name = tree.node(id).name.clone();
                let name = strip_prefix(&name, "_IPL");
                let name = strip_prefix(name, "IPL");
                let name = strip_suffix(name, "_t");
                tree.rename(id, source_replacements.apply(&capitalize(name)));
            },
        ))
        // Methods lose the `ipl` prefix; the mapper already pinned the
        // exported symbol as the entry point.
        .binding_rule(Rule::for_kind(
            BindingKind::Method,
            |tree: &mut BindingTree, id| {
                let name = tree.node(id).name.clone();
                let stripped = strip_prefix(&name, "ipl");
                if stripped != name {
                    tree.rename(id, capitalize(stripped));
                }
            },
        ))
        // Enum members drop the library prefix, then their enum tag.
        .binding_rule(Rule::for_kind(
            BindingKind::EnumMember,
            |tree: &mut BindingTree, id| {
                let name = tree.node(id).name.clone();
                tree.rename(id, strip_prefix(&name, "IPL_"));
            },
        ))
        .binding_rule(Rule::for_kind(
            BindingKind::EnumMember,
            |tree: &mut BindingTree, id| {
                let name = tree.node(id).name.clone();
                tree.rename(id, snake_to_camel(strip_through_separator(&name, '_'), '_'));
            },
        ))
        // Public struct fields follow C# casing.
        .binding_rule(Rule::for_kind(
            BindingKind::Field,
            |tree: &mut BindingTree, id| {
                if tree.node(id).visibility.is_public() {
                    let name = tree.node(id).name.clone();
                    tree.rename(id, capitalize(&name));
                }
            },
        ))
        // Redirect dangling references to the discarded bool enum to a
        // native bool with an explicit 4-byte wire size.
        .binding_rule(Rule::for_kinds(
            vec![BindingKind::Field, BindingKind::Parameter],
            |tree: &mut BindingTree, id| {
                let ty = match &tree.node(id).def {
                    BindingDef::Field { ty } => ty,
                    BindingDef::Parameter { ty, .. } => ty,
                    _ => return,
                };
                let CsType::Free { text } = ty else {
                    return;
                };
                if !text.contains("IPLbool") {
                    return;
                }
                let replacement = CsType::marshalled(CsType::bool(), UnmanagedKind::U4);
                tree.set_field_type(id, replacement.clone());
                tree.set_parameter_type(id, replacement);
            },
        ))
        .binding_rule(infer_ref_directions())
        // Final cleanup over every display name.
        .binding_rule(Rule::for_all(move |tree: &mut BindingTree, id| {
            let name = tree.node(id).name.clone();
            let replaced = replacements.apply(&name);
            if replaced != name {
                tree.rename(id, replaced);
            }
        }))
        // NEON reports as SSE2 on the managed side.
        .binding_rule(
            Rule::for_kind(BindingKind::EnumMember, |tree: &mut BindingTree, id| {
                tree.set_enum_value(id, chisel_bind::EnumValue::expr("Sse2"));
            })
            .named("SimdLevel::Neon"),
        )
        .macro_rule(
            MacroRule::new("STEAMAUDIO_VERSION", CsType::uint(), &output_file, "IPL")
                .unwrap()
                .name_transform(|n| snake_to_camel(strip_through_separator(n, '_'), '_'))
                .value_transform(|v| v.replace("uint32_t", "uint")),
        )
        .macro_rule(
            MacroRule::new("STEAMAUDIO_(VERSION_.+)", CsType::uint(), &output_file, "IPL")
                .unwrap()
                .name_transform(|n| snake_to_camel(strip_through_separator(n, '_'), '_')),
        )
}

fn generate_sample() -> String {
    let dir = tempdir().unwrap();
    let output = audio_generator()
        .generate(sample_compilation(), dir.path())
        .unwrap();

    assert_eq!(output.files.len(), 1);
    assert!(output.files[0].ends_with("IPL.Generated.cs"));
    fs::read_to_string(&output.files[0]).unwrap()
}

#[test]
fn generates_renamed_extern_stubs_with_entry_points() {
    let content = generate_sample();

    assert!(content.contains("namespace SteamAudio"));
    assert!(content.contains("public static partial class IPL"));
    assert!(content.contains(
        "[DllImport(Library, EntryPoint = \"iplContextCreate\", CallingConvention = CallingConvention.Cdecl)]"
    ));
    assert!(content.contains(
        "public static extern Error ContextCreate(in ContextSettings settings, out IntPtr context);"
    ));
    assert!(content.contains("public static extern IntPtr ContextRetain(IntPtr context);"));
}

#[test]
fn promotes_version_macros_in_scan_order() {
    let content = generate_sample();

    assert!(content.contains("public const uint VersionMajor = 4;"));
    assert!(content.contains("public const uint VersionMinor = 6;"));
    assert!(content.contains("public const uint VersionPatch = 1;"));
    assert!(content.contains(
        "public const uint Version = (VersionMajor << 16) | (VersionMinor << 8) | VersionPatch;"
    ));

    // Declaration order mirrors macro scan order, and the header guard
    // macro (blank value) is never promoted.
    let major = content.find("VersionMajor = 4").unwrap();
    let version = content.find("uint Version =").unwrap();
    assert!(major < version);
    assert!(!content.contains("PhononH"));

    // Constants lead the container.
    let constant = content.find("public const").unwrap();
    let method = content.find("public static extern").unwrap();
    assert!(constant < method);
}

#[test]
fn replaces_bool_enum_with_marshalled_bool() {
    let content = generate_sample();

    assert!(!content.contains("IPLbool"));
    assert!(!content.contains("enum Bool"));
    assert!(content.contains("[MarshalAs(UnmanagedType.U4)]"));
    assert!(content.contains("public bool EnableValidation;"));
}

#[test]
fn flattens_matrix_field_and_renames_types() {
    let content = generate_sample();

    assert!(content.contains("public unsafe partial struct Matrix4x4"));
    assert!(content.contains("public fixed float Elements[16];"));
    assert!(content.contains("public partial struct Vector3"));
    assert!(content.contains("public float X;"));
}

#[test]
fn renames_enum_members_and_applies_overrides() {
    let content = generate_sample();

    assert!(content.contains("public enum Error"));
    assert!(content.contains("Success = 0,"));
    assert!(content.contains("OutOfMemory = 2,"));

    assert!(content.contains("public enum SimdLevel"));
    assert!(content.contains("Sse2 = 0,"));
    assert!(content.contains("Neon = Sse2,"));
}
