//! Property-based tests for the value and timestamp codecs.

use proptest::collection::vec;
use proptest::prelude::*;
use wine_registry::export::{to_regedit_string, to_wine_string, write_value};
use wine_registry::parser::parse_str;
use wine_registry::value::{decode, encode, Payload};
use wine_registry::{Filetime, Format, Hive, RegistryValue, ValueData};

/// Renders the data half of a value line.
fn wire(data: &ValueData, format: Format) -> String {
    let encoded = encode(data, format);
    let payload = match &encoded.payload {
        Payload::Quoted(text) => text.clone(),
        Payload::Dword(d) => format!("{:08x}", d),
        Payload::Hex(bytes) => bytes.iter().map(|b| format!("{:02x}", b)).collect::<Vec<_>>().join(","),
    };
    format!("{}{}", encoded.prefix(), payload)
}

fn text() -> impl Strategy<Value = String> {
    // Any scalar value except NUL, including controls and astral characters
    any::<String>().prop_map(|s| s.replace('\0', ""))
}

fn value_data() -> impl Strategy<Value = ValueData> {
    prop_oneof![
        text().prop_map(ValueData::String),
        text().prop_map(ValueData::ExpandString),
        vec(text(), 0..5).prop_map(ValueData::MultiString),
        vec(any::<u8>(), 0..64).prop_map(ValueData::Binary),
        vec(any::<u8>(), 0..64).prop_map(ValueData::BinaryString),
        any::<u32>().prop_map(ValueData::Dword),
        any::<u32>().prop_map(ValueData::DwordLittleEndian),
        any::<u32>().prop_map(ValueData::DwordBigEndian),
        any::<u64>().prop_map(ValueData::Qword),
        text().prop_map(ValueData::Link),
        (12u32.., vec(any::<u8>(), 0..16)).prop_map(|(id, data)| ValueData::Internal { id, data }),
    ]
}

proptest! {
    #[test]
    fn prop_value_round_trip_wine(data in value_data()) {
        prop_assert_eq!(decode(&wire(&data, Format::Wine)).unwrap(), data);
    }

    #[test]
    fn prop_value_round_trip_regedit(data in value_data()) {
        prop_assert_eq!(decode(&wire(&data, Format::Regedit)).unwrap(), data);
    }

    #[test]
    fn prop_wire_is_canonical(data in value_data(), regedit in any::<bool>()) {
        let format = if regedit { Format::Regedit } else { Format::Wine };
        let raw = wire(&data, format);
        prop_assert_eq!(wire(&decode(&raw).unwrap(), format), raw);
    }

    #[test]
    fn prop_filetime_bytes(ticks in any::<i64>()) {
        let time = Filetime(ticks);
        prop_assert_eq!(Filetime::from_bytes(&time.to_bytes()).unwrap(), time);
    }

    #[test]
    fn prop_filetime_hex(ticks in 0i64..) {
        let time = Filetime(ticks);
        prop_assert_eq!(Filetime::from_hex(&format!("{:x}", time)).unwrap(), time);
    }

    #[test]
    fn prop_filetime_datetime(seconds in -11_644_473_600i64..253_402_300_799, ticks in 0i64..10_000_000) {
        let time = Filetime((seconds + 11_644_473_600) * 10_000_000 + ticks);
        let datetime = time.to_datetime().unwrap();
        prop_assert_eq!(Filetime::from_datetime(datetime), time);
        // Seconds truncate toward zero, which only matches chrono's floor after 1970
        if seconds >= 0 {
            prop_assert_eq!(time.unix(), datetime.timestamp());
        }
    }

    #[test]
    fn prop_wrapped_lines_parse_like_one_line(
        name in "[A-Za-z0-9 ]{1,20}",
        bytes in vec(any::<u8>(), 0..200),
    ) {
        let data = ValueData::Binary(bytes);
        let value = RegistryValue::new(name.clone(), data.clone());
        let mut line = Vec::new();
        write_value(&mut line, &value, Format::Regedit).unwrap();
        let line = String::from_utf8(line).unwrap();

        let text = format!("Windows Registry Editor Version 5.00\n\n[HKEY_CURRENT_USER\\Foo]\n{}\n", line);
        let hive = parse_str(&text).unwrap();
        let foo = hive.root_key().query("Foo").unwrap();
        prop_assert_eq!(foo.value(&name), Some(&data));
        prop_assert!(line.lines().all(|l| l.len() <= 80));
    }

    #[test]
    fn prop_hive_round_trip(
        keys in vec(("[A-Za-w]{1,6}(\\\\[A-Za-w]{1,6}){0,2}", "[a-z ]{0,8}", value_data()), 1..12),
    ) {
        let mut hive = Hive::new("HKEY_LOCAL_MACHINE");
        let root = hive.root();
        for (path, name, data) in keys {
            let key = hive.add(root, &path);
            hive.node_mut(key).set_modified(Filetime(0x1dc3e01c855469c));
            hive.set_value(key, &name, data);
        }

        let wine = to_wine_string(&hive).unwrap();
        let reparsed = parse_str(&wine).unwrap();
        prop_assert!(reparsed == hive, "dump round trip differs:\n{}", wine);
        prop_assert_eq!(to_wine_string(&reparsed).unwrap(), wine);

        let regedit = to_regedit_string(&hive).unwrap();
        prop_assert_eq!(to_regedit_string(&parse_str(&regedit).unwrap()).unwrap(), regedit);
    }
}

#[test]
fn test_integer_extremes() {
    for data in [
        ValueData::Dword(0),
        ValueData::Dword(u32::MAX),
        ValueData::DwordBigEndian(u32::MAX),
        ValueData::Qword(0),
        ValueData::Qword(u64::MAX),
    ] {
        for format in [Format::Wine, Format::Regedit] {
            assert_eq!(decode(&wire(&data, format)).unwrap(), data);
        }
    }
}

#[test]
fn test_multi_string_edge_cases() {
    let cases = [
        vec![],
        vec![String::new()],
        vec![String::new(), String::new()],
        vec!["a".to_string(), String::new(), "b".to_string()],
    ];
    for strings in cases {
        let data = ValueData::MultiString(strings);
        for format in [Format::Wine, Format::Regedit] {
            assert_eq!(decode(&wire(&data, format)).unwrap(), data, "{:?}", format);
        }
    }
}
