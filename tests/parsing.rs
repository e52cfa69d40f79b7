//! Import tests against the registry files in `test_data`.

use wine_registry::parser::{parse_file, parse_str};
use wine_registry::*;
use std::path::PathBuf;

fn test_data_path(filename: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_data")
        .join(filename)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The tree stored in `test_data/user.reg`, built by hand.
fn expected_user_hive() -> Hive {
    let mut hive = Hive::new("HKEY_CURRENT_USER");
    let root = hive.root();
    hive.node_mut(root).set_modified(Filetime(0x1dc74e5dfeefd32));
    hive.set_value(root, "", ValueData::String(String::new()));
    hive.set_value(root, "Value A", ValueData::String(r#""C:\Foo" -help"#.to_string()));

    let foo = hive.add(root, "Foo");
    hive.node_mut(foo).set_modified(Filetime(0x1dc7347dc3ec40a));
    hive.set_value(foo, "Value B", ValueData::Binary(vec![0xde, 0xad, 0xbe, 0xef, 0x00, 0x00]));
    hive.set_value(foo, "Value C", ValueData::Dword(0xdeadbeef));
    hive.set_value(foo, "Value D", ValueData::MultiString(strings(&[r"C:\Foo", r"C:\Bar"])));
    hive.set_value(foo, "Value E", ValueData::ExpandString(r"%APPDATA%\Foo".to_string()));

    let bar = hive.add(foo, "Bar");
    hive.node_mut(bar).set_modified(Filetime(0x1dc3e01c855469c));
    hive.set_value(bar, "Value F", ValueData::Qword(0xdeadbeef));
    hive.set_value(bar, "Value G", ValueData::MultiString(strings(&[r"C:\Foo", r"C:\Bar"])));
    hive.set_value(bar, "Value H", ValueData::ExpandString(r"%APPDATA%\Foo".to_string()));
    hive.set_value(bar, "Value I", ValueData::BinaryString(vec![0x48, 0x00, 0x69, 0x00, 0x00, 0x00]));

    let baz = hive.add(bar, "Baz");
    hive.node_mut(baz).set_modified(Filetime(0x1dc74e26c24986a));
    hive.set_value(baz, "Value J", ValueData::DwordLittleEndian(0x12345678));
    hive.set_value(baz, "Value K", ValueData::DwordBigEndian(0x12345678));
    hive.set_value(baz, "Value L", ValueData::Binary(vec![]));
    hive.set_value(baz, "Value M", ValueData::Internal { id: 0xff, data: vec![0xde] });

    let quz = hive.add(foo, "Quz");
    hive.node_mut(quz).set_modified(Filetime(0x1dc74efdcaf516c));

    let link = hive.add(foo, "Baz");
    hive.node_mut(link).set_modified(Filetime(0x1dc74efdcc0807c));
    hive.node_mut(link).set_link(true);
    hive.set_value(link, "SymbolicLinkValue", ValueData::Link(r"Foo\Bar\Baz".to_string()));

    hive
}

#[test]
fn test_parse_user_file() {
    let path = test_data_path("user.reg");
    let result = parse_file(&path);

    assert!(result.is_ok(), "Failed to parse user.reg: {:?}", result.err());

    let hive = result.unwrap();
    assert_eq!(hive, expected_user_hive(), "parsed tree: {:#?}", hive.root_key());
}

#[test]
fn test_parse_user_file_structure() {
    let hive = parse_file(test_data_path("user.reg")).unwrap();
    let root = hive.root_key();

    assert_eq!(root.name(), "HKEY_CURRENT_USER");
    assert_eq!(hive.len(), 6);

    let foo = root.query("Foo").unwrap();
    let names: Vec<_> = foo.subkeys().map(|k| k.name()).collect();
    assert_eq!(names, ["Bar", "Quz", "Baz"]);

    let link = foo.query("Baz").unwrap();
    assert!(link.is_link());
    assert_eq!(link.path(), r"HKEY_CURRENT_USER\Foo\Baz");
    assert_eq!(
        link.value("SymbolicLinkValue"),
        Some(&ValueData::Link(r"Foo\Bar\Baz".to_string()))
    );

    let baz = root.query(r"Foo\Bar\Baz").unwrap();
    assert!(!baz.is_link());
    assert_eq!(hive.wine_path(baz.id()), r"Foo\\Bar\\Baz");
    assert_eq!(baz.modified().unix(), 1766586874);
}

#[test]
fn test_parse_regedit_file() {
    let hive = parse_file(test_data_path("user_regedit.reg")).unwrap();
    let root = hive.root_key();

    assert_eq!(root.name(), "HKEY_CURRENT_USER");
    assert!(root.modified().is_zero());

    // Keys without values and link keys are not part of a regedit export
    let foo = root.query("Foo").unwrap();
    assert!(foo.query("Quz").is_none());
    assert!(foo.query("Baz").is_none());

    let bar = foo.query("Bar").unwrap();
    assert_eq!(
        bar.value("Value G"),
        Some(&ValueData::MultiString(strings(&[r"C:\Foo", r"C:\Bar"])))
    );
    assert_eq!(
        bar.value("Value H"),
        Some(&ValueData::ExpandString(r"%APPDATA%\Foo".to_string()))
    );
}

#[test]
fn test_dump_and_regedit_values_agree() {
    let dump = parse_file(test_data_path("user.reg")).unwrap();
    let regedit = parse_file(test_data_path("user_regedit.reg")).unwrap();

    for path in ["", "Foo", r"Foo\Bar", r"Foo\Bar\Baz"] {
        let a = dump.root_key().query(path).unwrap();
        let b = regedit.root_key().query(path).unwrap();
        assert_eq!(a.values(), b.values(), "values of {:?} differ", path);
    }
}

#[test]
fn test_missing_file() {
    let result = parse_file(test_data_path("does_not_exist.reg"));
    assert!(matches!(result, Err(RegistryError::Io(_))));
}

#[test]
fn test_parse_error_line_numbers() {
    let text = "WINE REGISTRY Version 2\n\
                ;; All keys relative to REGISTRY\\\\Machine\n\
                \n\
                #arch=win64\n\
                \n\
                [Software] 1760553029\n\
                #time=1dc3e01c855469c\n\
                \"Bad\"=hex(4):01,02\n";

    let err = parse_str(text).unwrap_err();
    assert!(err.to_string().starts_with("line 8: "), "{}", err);
    assert!(matches!(
        err.kind(),
        RegistryError::TruncatedData { expected: 4, actual: 2 }
    ));
}

#[test]
fn test_value_type_names() {
    let hive = parse_file(test_data_path("user.reg")).unwrap();
    let bar = hive.root_key().query(r"Foo\Bar").unwrap();

    let types: Vec<_> = bar.values().iter().map(|v| v.data.value_type().name()).collect();
    assert_eq!(types, ["REG_QWORD", "REG_MULTI_SZ", "REG_EXPAND_SZ", "REG_SZ"]);
}

#[test]
fn test_parse_utf16_escapes() {
    let hive = parse_file(test_data_path("unicode.reg")).unwrap();
    let foo = hive.root_key().query(r"Software\Foo").unwrap();

    assert_eq!(foo.value("A"), Some(&ValueData::String("\u{4e2d}\u{6587}".to_string())));
    assert_eq!(foo.value("\u{540d}"), Some(&ValueData::String("\u{1F600}".to_string())));
    assert_eq!(
        foo.value("C"),
        Some(&ValueData::ExpandString("%APPDATA%\\\u{e9}".to_string()))
    );
    assert_eq!(
        foo.value("D"),
        Some(&ValueData::MultiString(strings(&["\u{4e2d}", "\u{6587}"])))
    );
    assert_eq!(foo.value("E"), Some(&ValueData::String("\u{1}A1".to_string())));
}

#[test]
fn test_unpaired_surrogate_escape_is_rejected() {
    let text = "WINE REGISTRY Version 2\n\
                ;; All keys relative to REGISTRY\\\\Machine\n\
                \n\
                [Software] 1760553029\n\
                \"A\"=\"\\xd83d\"\n";

    let err = parse_str(text).unwrap_err();
    assert!(err.to_string().starts_with("line 5: "), "{}", err);
    assert!(matches!(err.kind(), RegistryError::InvalidUtf16));
}
