//! Package command - create a distributable chart archive

use charter_chart::package_chart;
use console::style;
use std::path::Path;

use crate::error::Result;
use crate::util::format_size;

pub fn run(path: &Path, output: &Path) -> Result<()> {
    println!("{} {}", style("Packaging").cyan().bold(), path.display());

    let archive = package_chart(path, output)?;
    let size = std::fs::metadata(&archive)?.len();

    println!("  {} {}", style("Created").green().bold(), archive.display());
    println!("  {} {}", style("Size").dim(), format_size(size));
    Ok(())
}
