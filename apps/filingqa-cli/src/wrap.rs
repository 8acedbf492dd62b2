/// Greedy word wrap. Runs of whitespace (newlines included) collapse to one
/// space and words longer than `width` are split across lines.
pub fn fill(text: &str, width: usize) -> String {
    let width = width.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while !chars.is_empty() {
            let needed = if line_len == 0 { chars.len() } else { line_len + 1 + chars.len() };
            if needed <= width {
                if line_len > 0 {
                    line.push(' ');
                    line_len += 1;
                }
                line.extend(chars.iter());
                line_len += chars.len();
                chars.clear();
            } else if line_len > 0 {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            } else {
                let rest = chars.split_off(width);
                lines.push(chars.iter().collect());
                chars = rest;
            }
        }
    }
    if line_len > 0 {
        lines.push(line);
    }
    lines.join("\n")
}
