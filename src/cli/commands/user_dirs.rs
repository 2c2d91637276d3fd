//! cli::commands::user_dirs
//!
//! Show the user configuration paths.

use anyhow::Result;

use crate::core::paths::UserDirs;

pub fn run(dirs: &UserDirs) -> Result<()> {
    println!("root:                 {}", dirs.root().display());
    println!("config:               {}", dirs.config_path().display());
    println!("conventions:          {}", dirs.conventions_dir().display());
    println!(
        "standard name tables: {}",
        dirs.standard_name_tables_dir().display()
    );
    println!("layouts:              {}", dirs.layouts_dir().display());
    Ok(())
}
