use glbind_registry::{
    Diagnostic, FeatureResolver, PointerDepth, Registry, ResolveError, SymbolKind,
    TypeDescriptor, Version,
};

const REGISTRY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<registry>
    <types>
        <type name="khrplatform">#include &lt;KHR/khrplatform.h&gt;</type>
        <type>typedef unsigned int <name>GLenum</name>;</type>
        <type>typedef float <name>GLfloat</name>;</type>
        <type api="gles2">typedef khronos_int32_t <name>GLfixed</name>;</type>
    </types>
    <enums namespace="GL">
        <enum value="0x0001" name="GL_A"/>
        <enum value="0x0002" name="GL_B"/>
        <enum value="0x806F" name="GL_3D"/>
        <enum value="0x0B00" name="GL_CURRENT_COLOR"/>
    </enums>
    <commands namespace="GL">
        <command>
            <proto>void <name>glVertex2fv</name></proto>
            <param len="2">const <ptype>GLfloat</ptype> *<name>v</name></param>
        </command>
        <command>
            <proto>void <name>glBroken</name></proto>
            <param>foo bar <name>x</name></param>
        </command>
        <command>
            <proto>void <name>glEnable</name></proto>
            <param group="EnableCap"><ptype>GLenum</ptype> <name>cap</name></param>
        </command>
    </commands>
    <feature api="gl" name="GL_VERSION_2_0" number="2.0">
        <require>
            <enum name="GL_B"/>
            <command name="glEnable"/>
        </require>
        <remove>
            <enum name="GL_A"/>
        </remove>
    </feature>
    <feature api="gl" name="GL_VERSION_1_0" number="1.0">
        <require>
            <enum name="GL_A"/>
            <enum name="GL_3D"/>
            <command name="glVertex2fv"/>
            <command name="glBroken"/>
        </require>
    </feature>
    <feature api="gles2" name="GL_ES_VERSION_2_0" number="2.0">
        <require>
            <enum name="GL_CURRENT_COLOR"/>
            <enum name="GL_MISSING"/>
            <command name="glEnable"/>
        </require>
        <remove>
            <command name="glVertex2fv"/>
        </remove>
    </feature>
</registry>
"#;

fn registry() -> Registry {
    Registry::parse(REGISTRY).unwrap().value
}

fn enum_names(registry: &Registry, family: &str, version: Version) -> Vec<String> {
    FeatureResolver::new(registry)
        .resolve(family, version, None)
        .unwrap()
        .value
        .enums
        .into_keys()
        .collect()
}

#[test]
fn later_revisions_add_and_remove() {
    let registry = registry();
    assert_eq!(
        enum_names(&registry, "gl", Version::new(1, 0)),
        ["A", "GL_3D"]
    );
    assert_eq!(
        enum_names(&registry, "gl", Version::new(2, 0)),
        ["B", "GL_3D"]
    );
}

#[test]
fn digit_leading_constants_keep_their_prefix() {
    let registry = registry();
    let package = FeatureResolver::new(&registry)
        .resolve("gl", Version::new(1, 0), None)
        .unwrap()
        .value;
    let constant = &package.enums["GL_3D"];
    assert_eq!(constant.name, "GL_3D");
    assert_eq!(constant.value, "0x806F");
}

#[test]
fn broken_command_is_dropped_while_siblings_resolve() {
    let outcome = Registry::parse(REGISTRY).unwrap();
    assert!(outcome.diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::UnparseableParameter { command, .. } if command == "Broken"
    )));

    let registry = outcome.value;
    let resolved = FeatureResolver::new(&registry)
        .resolve("gl", Version::new(1, 0), None)
        .unwrap();
    let package = &resolved.value;
    assert!(!package.commands.contains_key("Broken"));
    let vertex = &package.commands["Vertex2fv"];
    assert_eq!(vertex.entry_point, "glVertex2fv");
    assert_eq!(
        vertex.parameters[0].type_,
        TypeDescriptor::new("GLfloat", true, PointerDepth::One)
    );
    assert!(resolved.diagnostics.contains(&Diagnostic::SymbolNotFound {
        family: "gl".into(),
        version: Version::new(1, 0),
        kind: SymbolKind::Command,
        name: "glBroken".into(),
    }));
}

#[test]
fn dangling_references_are_diagnosed_and_skipped() {
    let registry = registry();
    let outcome = FeatureResolver::new(&registry)
        .resolve("gles2", Version::new(2, 0), None)
        .unwrap();

    assert_eq!(
        outcome.value.enums.keys().collect::<Vec<_>>(),
        ["CURRENT_COLOR"]
    );
    assert_eq!(
        outcome.value.commands.keys().collect::<Vec<_>>(),
        ["Enable"]
    );
    assert_eq!(
        outcome.diagnostics,
        [
            Diagnostic::SymbolNotFound {
                family: "gles2".into(),
                version: Version::new(2, 0),
                kind: SymbolKind::Enum,
                name: "GL_MISSING".into(),
            },
            Diagnostic::RemovedSymbolAbsent {
                family: "gles2".into(),
                version: Version::new(2, 0),
                kind: SymbolKind::Command,
                name: "glVertex2fv".into(),
            },
        ]
    );
}

#[test]
fn type_definitions_follow_family_restrictions() {
    let registry = registry();
    let resolver = FeatureResolver::new(&registry);
    let names = |family: &str| -> Vec<String> {
        resolver
            .resolve(family, Version::new(2, 0), None)
            .unwrap()
            .value
            .type_definitions
            .into_iter()
            .map(|t| t.name)
            .collect()
    };
    assert_eq!(names("gl"), ["GLenum", "GLfloat"]);
    assert_eq!(names("gles2"), ["GLenum", "GLfloat", "GLfixed"]);
}

#[test]
fn every_declared_pair_resolves_independently() {
    let registry = registry();
    let resolver = FeatureResolver::new(&registry);
    let packages = resolver.resolve_all(None);
    assert_eq!(packages.len(), 3);
    assert!(packages.iter().all(Result::is_ok));

    assert_eq!(
        resolver.resolve("gl", Version::new(3, 0), None),
        Err(ResolveError::UnknownVersion {
            family: "gl".into(),
            version: Version::new(3, 0),
        })
    );
}

#[test]
fn resolution_is_deterministic() {
    let first = registry();
    let second = registry();
    let a = FeatureResolver::new(&first).resolve("gl", Version::new(2, 0), None);
    let b = FeatureResolver::new(&second).resolve("gl", Version::new(2, 0), None);
    assert_eq!(a, b);
}
