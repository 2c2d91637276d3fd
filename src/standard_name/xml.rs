//! standard_name::xml
//!
//! XML import/export of standard-name tables.
//!
//! # Format
//!
//! The root element is named after the table; entries are `<entry>`
//! children keyed by `id`:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <fluid version="v1" institution="ITS" contact="someone@example.org">
//!   <entry id="x_velocity" units="m/s" description="x component of velocity"/>
//!   <alias id="u" standard_name="x_velocity"/>
//!   <device id="fan"/>
//!   <location id="inlet"/>
//! </fluid>
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use chrono::Utc;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use super::table::{StandardNameTable, TableDoc, TableEntry, TableError};

/// Parse a table from an XML document string.
///
/// # Errors
///
/// Returns `TableError::Xml` on malformed documents and the usual
/// validation errors on invalid content.
pub fn from_xml_str(xml: &str) -> Result<StandardNameTable, TableError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut doc: Option<TableDoc> = None;

    loop {
        match reader
            .read_event()
            .map_err(|e| TableError::Xml(e.to_string()))?
        {
            Event::Start(e) | Event::Empty(e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let attrs = read_attributes(&e)?;
                match doc {
                    None => {
                        // root element: its tag is the table name
                        doc = Some(TableDoc {
                            name: tag,
                            version: attrs.get("version").cloned().unwrap_or_default(),
                            institution: attrs.get("institution").cloned(),
                            contact: attrs.get("contact").cloned(),
                            last_modified: attrs
                                .get("last_modified")
                                .and_then(|s| s.parse().ok()),
                            valid_characters: attrs.get("valid_characters").cloned(),
                            pattern: attrs.get("pattern").cloned(),
                            devices: Vec::new(),
                            locations: Vec::new(),
                            table: BTreeMap::new(),
                            alias: BTreeMap::new(),
                            translation: BTreeMap::new(),
                        });
                    }
                    Some(ref mut doc) => match tag.as_str() {
                        "entry" => {
                            let id = require_attr(&attrs, "entry", "id")?;
                            doc.table.insert(
                                id,
                                TableEntry {
                                    units: attrs.get("units").cloned().unwrap_or_default(),
                                    description: attrs
                                        .get("description")
                                        .cloned()
                                        .unwrap_or_default(),
                                    alias: attrs.get("alias").cloned(),
                                },
                            );
                        }
                        "alias" => {
                            let id = require_attr(&attrs, "alias", "id")?;
                            let target = require_attr(&attrs, "alias", "standard_name")?;
                            doc.alias.insert(id, target);
                        }
                        "device" => {
                            doc.devices.push(require_attr(&attrs, "device", "id")?);
                        }
                        "location" => {
                            doc.locations.push(require_attr(&attrs, "location", "id")?);
                        }
                        other => {
                            return Err(TableError::Xml(format!("unexpected element <{other}>")));
                        }
                    },
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let doc = doc.ok_or_else(|| TableError::Xml("document has no root element".to_string()))?;
    StandardNameTable::try_from(doc)
}

/// Parse a table from an XML file.
pub fn from_xml(path: &Path) -> Result<StandardNameTable, TableError> {
    let raw = std::fs::read_to_string(path)?;
    from_xml_str(&raw)
}

/// Render a table as an XML document string.
pub fn to_xml_string(table: &StandardNameTable) -> String {
    let doc = TableDoc::from(table.clone());
    let mut xml = String::new();
    let _ = writeln!(xml, r#"<?xml version="1.0" encoding="UTF-8"?>"#);

    let _ = write!(xml, "<{}", doc.name);
    let _ = write!(xml, r#" version="{}""#, escape(&doc.version));
    if let Some(institution) = &doc.institution {
        let _ = write!(xml, r#" institution="{}""#, escape(institution));
    }
    if let Some(contact) = &doc.contact {
        let _ = write!(xml, r#" contact="{}""#, escape(contact));
    }
    if let Some(last_modified) = &doc.last_modified {
        let _ = write!(xml, r#" last_modified="{}""#, last_modified.to_rfc3339());
    }
    if let Some(vc) = &doc.valid_characters {
        let _ = write!(xml, r#" valid_characters="{}""#, escape(vc));
    }
    if let Some(pattern) = &doc.pattern {
        let _ = write!(xml, r#" pattern="{}""#, escape(pattern));
    }
    let _ = writeln!(xml, ">");

    for (name, entry) in &doc.table {
        let _ = write!(
            xml,
            r#"  <entry id="{}" units="{}" description="{}""#,
            escape(name),
            escape(&entry.units),
            escape(&entry.description)
        );
        if let Some(alias) = &entry.alias {
            let _ = write!(xml, r#" alias="{}""#, escape(alias));
        }
        let _ = writeln!(xml, "/>");
    }
    for (alias, target) in &doc.alias {
        let _ = writeln!(
            xml,
            r#"  <alias id="{}" standard_name="{}"/>"#,
            escape(alias),
            escape(target)
        );
    }
    for device in &doc.devices {
        let _ = writeln!(xml, r#"  <device id="{}"/>"#, escape(device));
    }
    for location in &doc.locations {
        let _ = writeln!(xml, r#"  <location id="{}"/>"#, escape(location));
    }
    let _ = writeln!(xml, "</{}>", doc.name);
    xml
}

/// Write a table to an XML file, stamping `last_modified`.
pub fn to_xml(table: &mut StandardNameTable, path: &Path) -> Result<(), TableError> {
    table.touch(Utc::now());
    std::fs::write(path, to_xml_string(table))?;
    Ok(())
}

fn read_attributes(
    e: &quick_xml::events::BytesStart<'_>,
) -> Result<BTreeMap<String, String>, TableError> {
    let mut out = BTreeMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| TableError::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| TableError::Xml(e.to_string()))?
            .to_string();
        out.insert(key, value);
    }
    Ok(out)
}

fn require_attr(
    attrs: &BTreeMap<String, String>,
    element: &str,
    key: &str,
) -> Result<String, TableError> {
    attrs
        .get(key)
        .cloned()
        .ok_or_else(|| TableError::Xml(format!("<{element}> element is missing '{key}'")))
}
