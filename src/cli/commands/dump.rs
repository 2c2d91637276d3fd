//! cli::commands::dump
//!
//! Print the structure of a data file: objects, shapes, attributes.

use std::path::Path;

use anyhow::Result;

use crate::store::{DataFile, Node};

pub fn run(path: &Path) -> Result<()> {
    let file = DataFile::open(path)?;

    println!("/");
    for (name, value) in &file.root().attributes {
        println!("  @{name} = {}", value.encode());
    }
    for (path, node) in file.objects() {
        let depth = path.components().count();
        let pad = "  ".repeat(depth);
        match node {
            Node::Group(_) => println!("{pad}{}/", path.basename()),
            Node::Dataset(d) => {
                println!("{pad}{} {:?} {}", path.basename(), d.shape, d.dtype)
            }
        }
        for (name, value) in node.attributes() {
            println!("{pad}  @{name} = {}", value.encode());
        }
    }
    Ok(())
}
