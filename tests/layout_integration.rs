//! End-to-end tests of the layout engine against real files.

use h5conv::convention::Convention;
use h5conv::layout::{registry, Layout, ValueMatcher};
use h5conv::store::{AttrInit, AttrValue, DataFile, Dtype};

fn attrs(pairs: &[(&str, &str)]) -> AttrInit {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), AttrValue::from(*v)))
        .collect()
}

/// The file from the classic devices example: two device groups, one
/// of which misses the manufacturer attribute.
fn devices_file() -> DataFile {
    let cv = Convention::baseline();
    let mut file = DataFile::create(&cv, AttrInit::new()).unwrap();
    let grp = file.create_group(&cv, "/", "grp", AttrInit::new()).unwrap();
    file.create_dataset(&cv, grp.as_str(), "ds", vec![3, 4], Dtype::F64, AttrInit::new())
        .unwrap();
    file.create_group(&cv, "/", "devices", AttrInit::new()).unwrap();
    file.create_group(&cv, "/devices", "dev1", attrs(&[("manufacturer", "acme")]))
        .unwrap();
    file.create_group(&cv, "/devices", "dev2", attrs(&[("long_name", "second device")]))
        .unwrap();
    file
}

#[test]
fn device_groups_must_declare_a_manufacturer() {
    let mut layout = Layout::new();
    layout
        .group("devices/*")
        .require_attr("manufacturer", ValueMatcher::Any);

    let report = layout.validate(&devices_file());
    // dev2 (and the devices group itself, matched by the wildcard)
    // carry no manufacturer; dev1 satisfies the rule
    assert!(!report.is_ok());
    assert!(report
        .get_failed()
        .iter()
        .all(|r| r.description().contains("manufacturer")));
}

#[test]
fn wildcard_matches_if_any_candidate_satisfies() {
    // the wildcard node itself succeeds as long as at least one group
    // exists, even when some candidates fail their attribute checks
    let mut layout = Layout::new();
    layout.group("*").optional_attr("manufacturer", ValueMatcher::Any);

    let report = layout.validate(&devices_file());
    assert!(report.is_ok());
}

#[test]
fn title_required_long_name_optional() {
    let mut layout = Layout::new();
    layout.root().require_attr("title", ValueMatcher::Any);
    layout.group("*").optional_attr("long_name", ValueMatcher::Any);

    let report = layout.validate(&devices_file());
    // exactly one required failure: the missing title
    assert_eq!(report.fails(), 1);
    assert!(report.get_failed()[0].description().contains("title"));
}

#[test]
fn attribute_value_matching() {
    let mut layout = Layout::new();
    layout
        .group("devices/dev1")
        .require_attr("manufacturer", ValueMatcher::Equal(AttrValue::from("acme")));
    assert!(layout.validate(&devices_file()).is_ok());

    let mut wrong = Layout::new();
    wrong
        .group("devices/dev1")
        .require_attr("manufacturer", ValueMatcher::Equal(AttrValue::from("other")));
    assert_eq!(wrong.validate(&devices_file()).fails(), 1);
}

#[test]
fn dataset_dimensionality_sweep() {
    let cv = Convention::baseline();
    let mut file = DataFile::create(&cv, AttrInit::new()).unwrap();
    file.create_dataset(&cv, "/", "ds", vec![3, 4], Dtype::F64, AttrInit::new())
        .unwrap();
    file.create_group(&cv, "/", "a", AttrInit::new()).unwrap();
    file.create_dataset(&cv, "/a", "data", vec![3, 4, 4], Dtype::F64, AttrInit::new())
        .unwrap();
    file.create_dataset(
        &cv,
        "/a",
        "data2",
        vec![3, 4, 4, 2],
        Dtype::F64,
        attrs(&[("long_name", "4d field")]),
    )
    .unwrap();

    let mut layout = Layout::new();
    let rule = layout.group("*").dataset("*");
    rule.ndim(3);
    rule.require_attr("long_name", ValueMatcher::Any);

    let report = layout.validate(&file);
    // /ds: wrong ndim + no long_name, /a/data: no long_name,
    // /a/data2: wrong ndim
    assert_eq!(report.fails(), 4);
}

#[test]
fn registered_layouts_reproduce_behavior() {
    let tmp = tempfile::tempdir().unwrap();
    let dirs = h5conv::core::paths::UserDirs::at(tmp.path().to_path_buf());

    let mut layout = Layout::new();
    layout
        .group("devices/*")
        .require_attr("manufacturer", ValueMatcher::Any);
    registry::register(&layout, "devices", &dirs, false).unwrap();

    let loaded = registry::load_registered(&dirs, "devices").unwrap();
    let file = devices_file();
    assert_eq!(
        loaded.validate(&file).fails(),
        layout.validate(&file).fails()
    );
}
