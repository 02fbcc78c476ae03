//! Plain-text rendering of a matrix.

use crate::matrix::{Leaf, Matrix};

fn leaf_text(leaf: &Leaf) -> String {
    match leaf {
        Leaf::Title { text } | Leaf::Aggregate { text } => text.clone(),
        Leaf::Job { name } => name.clone(),
        Leaf::Summary {
            project_id,
            provider,
        } => format!("{project_id}@{provider}"),
    }
}

/// Tab-separated rendering, one line per grid row. Each cell spans as many
/// fields as its column's colspan; missing leaves are empty fields, so every
/// line has the same number of fields.
pub fn render_plain(matrix: &Matrix) -> String {
    let spans = matrix.colspans();
    let mut out = String::new();
    for row in matrix.grid() {
        let fields: Vec<String> = row
            .iter()
            .zip(&spans)
            .flat_map(|(cell, &span)| {
                cell.iter()
                    .map(leaf_text)
                    .chain(std::iter::repeat(String::new()))
                    .take(span)
            })
            .collect();
        out.push_str(&fields.join("\t"));
        out.push('\n');
    }
    out
}
