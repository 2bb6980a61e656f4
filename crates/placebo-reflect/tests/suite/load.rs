use placebo_reflect::{ConfigurationError, ReflectionFacts, ReflectiveCallKind};
use tempfile::tempdir;

#[test]
fn loads_facts_file_once_into_disjoint_sets() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("refl.log");
    std::fs::write(
        &path,
        "Array.newInstance;java.lang.String[];java.util.Arrays.copyOf;3259;;\n\
         Constructor.newInstance;<java.util.ArrayList: void <init>(int)>;a.B.c;1;;\n\
         \n\
         Constructor.newInstance;<java.util.ArrayList: void <init>(int)>;a.B.d;7;;\n",
    )
    .unwrap();

    let facts = ReflectionFacts::load(&path).unwrap();
    assert!(!facts.is_empty());
    assert_eq!(
        facts
            .targets(ReflectiveCallKind::ArrayNewInstance)
            .iter()
            .collect::<Vec<_>>(),
        vec!["java.lang.String[]"]
    );
    assert_eq!(
        facts
            .targets(ReflectiveCallKind::ConstructorNewInstance)
            .iter()
            .collect::<Vec<_>>(),
        vec!["<java.util.ArrayList: void <init>(int)>"]
    );
    for kind in [
        ReflectiveCallKind::ClassForName,
        ReflectiveCallKind::ClassNewInstance,
        ReflectiveCallKind::MethodInvoke,
    ] {
        assert!(facts.targets(kind).is_empty(), "{kind} should be empty");
    }
}

#[test]
fn missing_facts_file_is_a_configuration_error() {
    let dir = tempdir().unwrap();
    let err = ReflectionFacts::load(dir.path().join("absent.log")).unwrap_err();
    assert!(matches!(err, ConfigurationError::Io { .. }));
    assert!(err.to_string().contains("absent.log"));
}
