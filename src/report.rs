use crate::printable::{PoiListener, PrintableMap};
use std::io::{self, Write};

/// Plain-text rendition of the printable sheet: legend, numbered points, view
pub fn write_report<W: Write, L: PoiListener>(
    out: &mut W,
    map: &PrintableMap<L>,
    fragment: &str,
) -> io::Result<()> {
    writeln!(out, "Legend")?;
    for legend in map.legends() {
        writeln!(out, "  ■ {} ({})", legend.name, legend.color)?;
    }

    writeln!(out)?;
    writeln!(out, "Points")?;
    for (index, poi) in map.visible().enumerate() {
        write!(
            out,
            "{:>4}. {} [{}]",
            index + 1,
            poi.name().unwrap_or_default(),
            poi.category.name
        )?;
        match poi.description() {
            Some(desc) if !desc.is_empty() => writeln!(out, " - {}", desc.replace('\n', " "))?,
            _ => writeln!(out)?,
        }
    }

    writeln!(out)?;
    writeln!(out, "View: #{fragment}")?;
    if let Some(updated) = map.updated() {
        writeln!(out, "Updated: {updated}")?;
    }
    Ok(())
}
