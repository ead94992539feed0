//! GitHub-flavoured markdown tables with inline HTML cells.

/// Wraps `body` in `<name attr="value" ...>`.
pub fn tag(body: &str, name: &str, attrs: &[(&str, &str)]) -> String {
    let attrs: String = attrs
        .iter()
        .map(|(k, v)| format!(" {k}=\"{v}\""))
        .collect();
    format!("<{name}{attrs}>{body}</{name}>")
}

pub fn center(body: &str) -> String {
    tag(body, "center", &[])
}

pub fn bold(body: &str) -> String {
    tag(body, "b", &[])
}

/// Renders a table with columns padded to their widest cell.
pub fn render(headers: &[String], rows: &[Vec<String>]) -> String {
    let columns = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().take(columns).enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(line(&widths, headers.iter().map(String::as_str)));
    out.push(format!(
        "|{}|",
        widths
            .iter()
            .map(|&w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("|")
    ));
    for row in rows {
        out.push(line(&widths, row.iter().map(String::as_str)));
    }
    out.join("\n")
}

fn line<'a>(widths: &[usize], mut cells: impl Iterator<Item = &'a str>) -> String {
    let padded: Vec<String> = widths
        .iter()
        .map(|&w| {
            let cell = cells.next().unwrap_or("");
            let pad = w.saturating_sub(cell.chars().count());
            format!(" {cell}{} ", " ".repeat(pad))
        })
        .collect();
    format!("|{}|", padded.join("|"))
}
