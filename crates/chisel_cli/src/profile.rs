//! Binding profile for the phonon audio library header.
//!
//! This is the generator configuration: which prefixes to strip, which
//! macros become constants, which declarations get special-cased. The
//! engine itself lives in chisel-bind; everything here is data about one
//! particular library's conventions.

use chisel_bind::names::{
    capitalize, snake_to_camel, strip_prefix, strip_suffix, strip_through_separator,
    NameReplacementTable,
};
use chisel_bind::{
    infer_ref_directions, BindingDef, BindingKind, BindingTree, CsType, EnumValue, Generator,
    GeneratorOptions, HeaderKind, HeaderTree, MacroRule, Rule, UnmanagedKind,
};

/// Casing fixes the mechanical transforms cannot know about.
///
/// The first group fixes C# naming-convention violations, the second fixes
/// case-conversion artifacts where the source words are not separated, and
/// the last entries are outright renames for the sake of explicit names.
fn name_replacements() -> NameReplacementTable {
    NameReplacementTable::new()
        .with("HRTF", "Hrtf")
        .with("SIMD", "Simd")
        .with("Outofmemory", "OutOfMemory")
        .with("Tailremaining", "TailRemaining")
        .with("Tailcomplete", "TailComplete")
        .with("Staticsource", "StaticSource")
        .with("Staticlistener", "StaticListener")
        .with("Inversedistance", "InverseDistance")
        .with("Radeonrays", "RadeonRays")
        .with("Uniformfloor", "UniformFloor")
        .with("N3d", "N3D")
        .with("Sn3D", "SN3D")
        .with("Applydistanceattenuation", "ApplyDistanceAttenuation")
        .with("Applyairabsorption", "ApplyAirAbsorption")
        .with("Applydirectivity", "ApplyDirectivity")
        .with("Applyocclusion", "ApplyOcclusion")
        .with("Applytransmission", "ApplyTransmission")
        .with("Bakeconvolution", "BakeConvolution")
        .with("Bakeparametric", "BakeParametric")
        .with("Distanceattenuation", "DistanceAttenuation")
        .with("Airabsorption", "AirAbsorption")
        .with("Freqindependent", "FrequencyIndependent")
        .with("Freqdependent", "FrequencyDependent")
}

/// The configured generator for `phonon.h`.
pub fn phonon() -> Generator {
    let options = GeneratorOptions::new("SteamAudio", "IPL").output_file("IPL.Generated.cs");
    let output_file = options.output_file.clone();

    let replacements = name_replacements();
    let source_replacements = replacements.clone();

    Generator::new(options)
        // The IPLbool enum is replaced with an actual bool below.
        .source_rule(
            Rule::for_kind(HeaderKind::Enum, |tree: &mut HeaderTree, id| {
                tree.discard(id);
            })
            .named("IPLbool"),
        )
        // Remove prefixes from type names before mapping so generated type
        // references pick up the new names.
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
        // Remove the `ipl` prefix from methods. The mapper pinned the
        // exported symbol as the entry point, so the rename cannot break
        // linkage.
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
        // Rename enum members from SCREAMING_SNAKECASE: drop the library
        // prefix, drop the enum tag, camel-case the rest. Conversion
        // mistakes are fixed by the replacement table below.
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
        // Capitalize public struct fields.
        .binding_rule(Rule::for_kind(
            BindingKind::Field,
            |tree: &mut BindingTree, id| {
                if tree.node(id).visibility.is_public() {
                    let name = tree.node(id).name.clone();
                    tree.rename(id, capitalize(&name));
                }
            },
        ))
        // Fields and parameters typed with the discarded bool enum become
        // native bools with the same 4-byte wire size.
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
        // Turn some `ref` parameters into `out` or `in` based on \param
        // documentation.
        .binding_rule(infer_ref_directions())
        // Execute the replacement table over every display name.
        .binding_rule(Rule::for_all(move |tree: &mut BindingTree, id| {
            let name = tree.node(id).name.clone();
            let replaced = replacements.apply(&name);
            if replaced != name {
                tree.rename(id, replaced);
            }
        }))
        // Lazy fixes for conversion mistakes.
        .binding_rule(
            Rule::for_kind(BindingKind::Field, |tree: &mut BindingTree, id| {
                tree.set_field_type(id, CsType::fixed_buffer(CsType::float(), 16));
            })
            .named("Matrix4x4::Elements"),
        )
        .binding_rule(
            Rule::for_kind(BindingKind::EnumMember, |tree: &mut BindingTree, id| {
                tree.set_enum_value(id, EnumValue::expr("Sse2"));
            })
            .named("SimdLevel::Neon"),
        )
        .macro_rule(
            MacroRule::new("STEAMAUDIO_VERSION", CsType::uint(), &output_file, "IPL")
                .expect("valid version macro pattern")
                .name_transform(|n| snake_to_camel(strip_through_separator(n, '_'), '_'))
                .value_transform(|v| v.replace("uint32_t", "uint")),
        )
        .macro_rule(
            MacroRule::new("STEAMAUDIO_(VERSION_.+)", CsType::uint(), &output_file, "IPL")
                .expect("valid version macro pattern")
                .name_transform(|n| snake_to_camel(strip_through_separator(n, '_'), '_')),
        )
}
