//! Format build reports, subtrees and aggregates as text.

use crate::tree::{BuildReport, Tree};
use crate::types::Metrics;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn format_build_report(report: &BuildReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n\n",
        format_section_heading(&format!("Built query {}", report.query))
    ));
    out.push_str(&format!("  Nodes: {}\n", report.nodes.len()));
    out.push_str(&format!("  Files: {}\n", report.leaf_count));
    out.push_str(&format!("  Directories: {}\n", report.directory_count));
    out.push_str(&format!("  Duration: {} ms\n", report.duration_ms));
    out
}

/// Render a subtree as an indented table, children below their parent.
pub fn format_subtree_text(tree: &Tree, root_path: &str, metric_names: &[String]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n\n",
        format_section_heading(&format!("Subtree {}", root_path))
    ));
    out.push_str(&node_table(tree, &[root_path.to_string()], metric_names));
    out.push_str(&format!("{} nodes\n", tree.len()));
    out
}

/// Render every tree of a scope, one block per root.
pub fn format_tree_text(tree: &Tree, metric_names: &[String]) -> String {
    let roots: Vec<String> = tree
        .iter()
        .filter(|(_, record)| {
            record
                .parent_path()
                .map_or(true, |parent| !tree.contains_key(&parent))
        })
        .map(|(path, _)| path.clone())
        .collect();

    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Tree")));
    out.push_str(&node_table(tree, &roots, metric_names));
    out.push_str(&format!("{} nodes\n", tree.len()));
    out
}

fn node_table(tree: &Tree, roots: &[String], metric_names: &[String]) -> String {
    let mut header = vec!["Path".to_string(), "Size".to_string()];
    header.extend(metric_names.iter().cloned());
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(header);

    let mut stack: Vec<(String, usize)> = roots.iter().rev().map(|r| (r.clone(), 0)).collect();
    while let Some((path, level)) = stack.pop() {
        let Some(record) = tree.get(&path) else {
            continue;
        };
        let mut row = vec![format!("{}{}", "  ".repeat(level), path), record.size.to_string()];
        row.extend(
            metric_names
                .iter()
                .map(|name| format_metric(record.metrics.get(name).copied())),
        );
        table.add_row(row);

        let mut children: Vec<String> = record.child_paths().collect();
        children.sort();
        for child in children.into_iter().rev() {
            stack.push((child, level + 1));
        }
    }

    format!("{}\n", table)
}

pub fn format_aggregate_text(
    root_path: &str,
    file_count: u64,
    sums: &Metrics,
    averages: &Metrics,
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n\n",
        format_section_heading(&format!("Aggregate {}", root_path))
    ));
    out.push_str(&format!("  Files: {}\n\n", file_count));

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Metric", "Sum", "Average"]);
    for (name, sum) in sums {
        table.add_row(vec![
            name.clone(),
            format_metric(Some(*sum)),
            format_metric(averages.get(name).copied()),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

fn format_metric(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 => format!("{}", v as i64),
        Some(v) => format!("{:.3}", v),
        None => "-".to_string(),
    }
}
