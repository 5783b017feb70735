//! Terminal notes and the boot-plan table.

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";

pub fn supports_color() -> bool {
    std::env::var_os("NO_COLOR").is_none()
        && std::env::var("TERM").map(|t| t != "dumb").unwrap_or(false)
}

pub fn note_success(msg: &str) {
    if supports_color() {
        eprintln!("{GREEN}{BOLD}✓{RESET} {msg}");
    } else {
        eprintln!("OK: {msg}");
    }
}

pub fn note_warn(msg: &str) {
    if supports_color() {
        eprintln!("{YELLOW}{BOLD}⚠{RESET} {msg}");
    } else {
        eprintln!("WARN: {msg}");
    }
}

pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}✗{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

/// Numbered `step  kind  name` rows, columns padded to the widest cell.
pub fn render_plan(plan: &[(&str, String)]) -> String {
    let kind_width = plan.iter().map(|(k, _)| k.len()).max().unwrap_or(0).max(4);
    let step_width = plan.len().to_string().len().max(4);

    let mut out = format!("{:<step_width$}  {:<kind_width$}  NAME\n", "STEP", "KIND");
    for (i, (kind, name)) in plan.iter().enumerate() {
        out.push_str(&format!("{:<step_width$}  {kind:<kind_width$}  {name}\n", i + 1));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_table_is_aligned() {
        let table = render_plan(&[
            ("editor-extension", "upload-attachment".to_string()),
            ("plugin", "router".to_string()),
        ]);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("STEP  KIND"));
        assert_eq!(lines[1].find("upload-attachment"), lines[2].find("router"));
    }

    #[test]
    fn empty_plan_has_header_only() {
        assert_eq!(render_plan(&[]).lines().count(), 1);
    }
}
