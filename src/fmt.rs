//! Human-friendly CLI output formatters.
//!
//! Each `fmt_*` function formats one tool's output for terminal display.
//! When `color` is true, ANSI escape codes are emitted via `owo_colors`.

use crate::services::{FunctionDoc, SectionView, SqlSyntaxDoc};
use crate::tools::{
    FuzzySearchOutput, ListFunctionsOutput, ListSectionsOutput, RefreshOutput, SearchOutput,
};
use crate::types::DocInfo;
use owo_colors::OwoColorize;
use std::io::{self, Write};

/// Writes a bold label, or a plain one without color.
fn label(w: &mut impl Write, text: &str, color: bool) -> io::Result<()> {
    if color {
        write!(w, "{:<16}", text.bold())
    } else {
        write!(w, "{text:<16}")
    }
}

fn more_hint(w: &mut impl Write, color: bool) -> io::Result<()> {
    if color {
        writeln!(w, "{}", "... more results available".dimmed())
    } else {
        writeln!(w, "... more results available")
    }
}

// ── search ──────────────────────────────────────────────────────────────────

pub fn fmt_search(w: &mut impl Write, out: &SearchOutput, color: bool) -> io::Result<()> {
    if out.results.is_empty() {
        writeln!(w, "No sections match '{}'", out.query)?;
        return Ok(());
    }

    for item in &out.results {
        let fields = item
            .matches
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("+");
        if color {
            writeln!(
                w,
                "{}  ({} · {})",
                item.title.bold(),
                item.score,
                fields.dimmed()
            )?;
            writeln!(w, "  {}", item.id.cyan())?;
        } else {
            writeln!(w, "{}  ({} · {})", item.title, item.score, fields)?;
            writeln!(w, "  {}", item.id)?;
        }

        if !item.snippet.is_empty() {
            let snippet = item.snippet.replace('\n', " ");
            writeln!(w, "  {snippet}")?;
        }
    }

    if out.has_more {
        more_hint(w, color)?;
    }

    Ok(())
}

// ── fuzzy ───────────────────────────────────────────────────────────────────

pub fn fmt_fuzzy(w: &mut impl Write, out: &FuzzySearchOutput, color: bool) -> io::Result<()> {
    if out.results.is_empty() {
        writeln!(w, "No sections resemble '{}'", out.query)?;
        return Ok(());
    }

    for item in &out.results {
        if color {
            writeln!(
                w,
                "{:>7.1}  {}  {} {}",
                item.score,
                item.title.bold(),
                item.id.cyan(),
                format_args!("[{}]", item.matched_in).dimmed()
            )?;
        } else {
            writeln!(
                w,
                "{:>7.1}  {}  {} [{}]",
                item.score, item.title, item.id, item.matched_in
            )?;
        }
    }

    Ok(())
}

// ── sections ────────────────────────────────────────────────────────────────

pub fn fmt_sections(w: &mut impl Write, out: &ListSectionsOutput, color: bool) -> io::Result<()> {
    for row in &out.sections {
        let indent = "  ".repeat(usize::from(row.level.saturating_sub(1)));
        let lines = format!(":{}-{}", row.start_line, row.end_line);

        if color {
            let marker = "#".repeat(usize::from(row.level));
            writeln!(
                w,
                "{indent}{} {}  {} {}",
                marker.yellow(),
                row.title.bold(),
                row.id.cyan(),
                lines.dimmed()
            )?;
        } else {
            writeln!(
                w,
                "{indent}{} {}  {} {}",
                "#".repeat(usize::from(row.level)),
                row.title,
                row.id,
                lines
            )?;
        }
    }

    if out.has_more {
        more_hint(w, color)?;
    }
    writeln!(
        w,
        "{} of {} sections",
        out.total_returned, out.total_matched
    )?;

    Ok(())
}

// ── section ─────────────────────────────────────────────────────────────────

pub fn fmt_section(w: &mut impl Write, view: &SectionView, color: bool) -> io::Result<()> {
    let section = &view.section;
    let heading = format!("{} {}", "#".repeat(usize::from(section.level)), section.title);

    if color {
        writeln!(w, "{}", heading.bold())?;
        writeln!(
            w,
            "{}",
            format_args!(
                "id: {}  lines: {}-{}",
                section.id, section.start_line, section.end_line
            )
            .dimmed()
        )?;
    } else {
        writeln!(w, "{heading}")?;
        writeln!(
            w,
            "id: {}  lines: {}-{}",
            section.id, section.start_line, section.end_line
        )?;
    }

    if !section.content.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", section.content)?;
    }

    if let Some(children) = &view.children {
        writeln!(w)?;
        if color {
            writeln!(w, "{}", "Subsections:".bold())?;
        } else {
            writeln!(w, "Subsections:")?;
        }
        for child in children {
            if color {
                writeln!(w, "  {}  {}", child.title, child.id.cyan())?;
            } else {
                writeln!(w, "  {}  {}", child.title, child.id)?;
            }
        }
    }

    Ok(())
}

// ── function ────────────────────────────────────────────────────────────────

pub fn fmt_function(w: &mut impl Write, doc: &FunctionDoc, color: bool) -> io::Result<()> {
    if color {
        writeln!(w, "{}", doc.name.bold().green())?;
    } else {
        writeln!(w, "{}", doc.name)?;
    }

    if let Some(signature) = &doc.signature {
        label(w, "Signature:", color)?;
        writeln!(w, " {signature}")?;
    }
    if let Some(return_type) = &doc.return_type {
        label(w, "Returns:", color)?;
        writeln!(w, " {return_type}")?;
    }
    if !doc.parameters.is_empty() {
        label(w, "Parameters:", color)?;
        writeln!(w, " {}", doc.parameters.join(", "))?;
    }
    label(w, "Section:", color)?;
    writeln!(w, " {}", doc.section_id)?;

    if !doc.description.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", doc.description)?;
    }

    Ok(())
}

pub fn fmt_functions(w: &mut impl Write, out: &ListFunctionsOutput) -> io::Result<()> {
    for name in &out.functions {
        writeln!(w, "{name}")?;
    }
    writeln!(w, "{} functions", out.total)?;
    Ok(())
}

// ── syntax ──────────────────────────────────────────────────────────────────

pub fn fmt_syntax(w: &mut impl Write, doc: &SqlSyntaxDoc, color: bool) -> io::Result<()> {
    if color {
        writeln!(
            w,
            "{}  {}",
            doc.statement.bold().yellow(),
            doc.section_id.cyan()
        )?;
    } else {
        writeln!(w, "{}  {}", doc.statement, doc.section_id)?;
    }

    writeln!(w)?;
    for line in doc.syntax.lines() {
        writeln!(w, "    {line}")?;
    }

    if !doc.description.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", doc.description)?;
    }

    Ok(())
}

// ── info ────────────────────────────────────────────────────────────────────

pub fn fmt_info(w: &mut impl Write, info: &DocInfo, color: bool) -> io::Result<()> {
    let updated = info
        .last_updated
        .map_or_else(|| "never".to_string(), |t| t.to_rfc3339());

    label(w, "Source:", color)?;
    writeln!(w, " {}", info.source)?;
    label(w, "Cache:", color)?;
    writeln!(w, " {}", info.cache_location)?;
    label(w, "Loaded:", color)?;
    writeln!(w, " {}", info.is_loaded)?;
    label(w, "Last updated:", color)?;
    writeln!(w, " {updated}")?;
    label(w, "Sections:", color)?;
    writeln!(w, " {}", info.section_count)?;
    label(w, "Content size:", color)?;
    writeln!(w, " {} bytes", info.content_size)?;

    Ok(())
}

// ── refresh ─────────────────────────────────────────────────────────────────

pub fn fmt_refresh(w: &mut impl Write, out: &RefreshOutput) -> io::Result<()> {
    writeln!(w, "{}", out.message)?;
    Ok(())
}
