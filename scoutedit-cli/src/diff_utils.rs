use colored::Colorize;

/// Prints a unified diff, colouring headers, hunk markers and changed lines
pub fn print_colored_diff(diff: &str) {
    for line in diff.lines() {
        println!("{}", colorize_line(line));
    }
}

fn colorize_line(line: &str) -> String {
    if line.starts_with("+++") || line.starts_with("---") {
        line.bold().to_string()
    } else if line.starts_with("@@") {
        line.cyan().to_string()
    } else if line.starts_with('+') {
        line.green().to_string()
    } else if line.starts_with('-') {
        line.red().to_string()
    } else {
        line.to_string()
    }
}
