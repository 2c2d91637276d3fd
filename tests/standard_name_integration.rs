//! End-to-end tests of standard-name tables: persistence round-trips,
//! transformation lookup, file checking, and translation.

use std::collections::BTreeMap;

use h5conv::convention::Convention;
use h5conv::core::paths::UserDirs;
use h5conv::core::types::Version;
use h5conv::standard_name::{registry, xml, LookupError, StandardName, StandardNameTable};
use h5conv::store::{AttrInit, AttrValue, DataFile, Dtype};

fn fan_table() -> StandardNameTable {
    let mut table = StandardNameTable::new("fan", Version::new("v1").unwrap())
        .with_institution("ITS")
        .with_devices(vec!["fan".to_string(), "orifice".to_string()])
        .with_locations(vec!["inlet".to_string(), "outlet".to_string()]);
    table
        .set("x_velocity", "m/s", "x component of velocity")
        .unwrap();
    table.set("static_pressure", "Pa", "static pressure").unwrap();
    table.set("time", "s", "time").unwrap();
    table
}

#[test]
fn direct_check_scenarios() {
    let mut table = StandardNameTable::new("demo", Version::new("v1").unwrap());
    table.set("x_velocity", "m/s", "d").unwrap();

    assert!(table.check("x_velocity", Some("m/s")));
    assert!(!table.check("x_velocity", Some("kg")));
    assert!(!table.check("not_there", Some("m/s")));
}

#[test]
fn syntax_scenarios() {
    assert!(StandardName::check_syntax(" x").is_err());
    assert!(StandardName::check_syntax("9x").is_err());
    assert!(StandardName::check_syntax("x_velocity").is_ok());
}

#[test]
fn transformation_lookup_and_units_algebra() {
    let table = fan_table();

    // ratio: units divide
    let ratio = table.resolve("ratio_of_x_velocity_and_time").unwrap();
    assert!(ratio.equal_unit("m s^-2").unwrap());

    // derivative: units divide
    let derivative = table
        .resolve("derivative_of_static_pressure_wrt_time")
        .unwrap();
    assert!(derivative.equal_unit("Pa/s").unwrap());

    // device-scoped difference keeps the operand unit
    let diff = table
        .resolve("difference_of_static_pressure_across_orifice")
        .unwrap();
    assert!(diff.equal_unit("Pa").unwrap());

    // unknown device is a strict key error, not "not found"
    assert!(matches!(
        table.resolve("difference_of_static_pressure_across_pump"),
        Err(LookupError::UnknownAffix { .. })
    ));
}

#[test]
fn yaml_round_trip_is_content_equal() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("fan.yaml");

    let mut table = fan_table();
    table.to_yaml(&path).unwrap();
    let loaded = StandardNameTable::from_yaml(&path).unwrap();

    assert!(table.content_eq(&loaded));
    assert_eq!(loaded.versionname(), "fan-v1");
    // the transformation engine survives the round trip
    assert!(loaded.check("square_of_x_velocity", Some("m^2/s^2")));
}

#[test]
fn xml_round_trip_is_content_equal() {
    let table = fan_table();
    let xml_text = xml::to_xml_string(&table);
    let loaded = xml::from_xml_str(&xml_text).unwrap();
    assert!(table.content_eq(&loaded));
}

#[test]
fn registry_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let dirs = UserDirs::at(tmp.path().to_path_buf());

    let mut table = fan_table();
    registry::register(&mut table, &dirs, false).unwrap();

    let loaded = registry::load_registered(&dirs, "fan-v1").unwrap();
    assert!(table.content_eq(&loaded));
}

#[test]
fn file_checking_reports_but_does_not_abort() {
    let cv = Convention::baseline();
    let mut file = DataFile::create(&cv, AttrInit::new()).unwrap();
    file.create_dataset(
        &cv,
        "/",
        "u",
        vec![8],
        Dtype::F64,
        AttrInit::from([
            ("units".to_string(), AttrValue::from("m/s")),
            ("standard_name".to_string(), AttrValue::from("x_velocity")),
        ]),
    )
    .unwrap();
    let grp = file.create_group(&cv, "/", "grp", AttrInit::new()).unwrap();
    file.create_dataset(
        &cv,
        grp.as_str(),
        "bogus",
        vec![8],
        Dtype::F64,
        AttrInit::from([
            ("units".to_string(), AttrValue::from("kg")),
            ("standard_name".to_string(), AttrValue::from("x_velocity")),
        ]),
    )
    .unwrap();
    // datasets without a standard_name are simply skipped
    file.create_dataset(&cv, "/", "untagged", vec![8], Dtype::F64, AttrInit::new())
        .unwrap();

    let table = fan_table();
    let issues = table.check_file(&file, true);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].path.as_str(), "/grp/bogus");
    assert_eq!(issues[0].standard_name, "x_velocity");

    // non-recursive checking only sees root-level datasets
    assert!(table.check_file(&file, false).is_empty());
}

#[test]
fn translation_assigns_standard_names() {
    let cv = Convention::baseline();
    let mut file = DataFile::create(&cv, AttrInit::new()).unwrap();
    file.create_dataset(&cv, "/", "u", vec![8], Dtype::F64, AttrInit::new())
        .unwrap();
    let grp = file.create_group(&cv, "/", "run1", AttrInit::new()).unwrap();
    file.create_dataset(&cv, grp.as_str(), "u", vec![8], Dtype::F64, AttrInit::new())
        .unwrap();
    file.create_dataset(&cv, "/", "p", vec![8], Dtype::F64, AttrInit::new())
        .unwrap();

    let table = fan_table();
    let translation = BTreeMap::from([
        ("u".to_string(), "x_velocity".to_string()),
        ("p".to_string(), "static_pressure".to_string()),
    ]);
    let updated = table.apply_translation(&mut file, &translation, true);
    assert_eq!(updated, 3);
    assert_eq!(
        file.attr_at("/run1/u", "standard_name"),
        Some(&AttrValue::from("x_velocity"))
    );
    assert_eq!(
        file.attr_at("/p", "standard_name"),
        Some(&AttrValue::from("static_pressure"))
    );
}

#[test]
fn suggestions_offered_for_near_misses() {
    let table = fan_table();
    match table.resolve("x_velocty") {
        Err(LookupError::NotFound { suggestions, .. }) => {
            assert_eq!(suggestions, vec!["x_velocity".to_string()]);
        }
        other => panic!("expected a suggestion, got {other:?}"),
    }
}
