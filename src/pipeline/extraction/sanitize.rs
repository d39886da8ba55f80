/// Separators OCR tends to duplicate ("2024--01..15", "::").
const SEPARATORS: &[char] = &['-', '.', '/', ':', '~', ','];

/// Strip OCR noise before pattern work begins.
///
/// Folds full-width forms ("２０２４－０１") to ASCII, removes control
/// characters, collapses duplicated separators and runs of horizontal
/// whitespace, trims each line and drops blank lines. Korean text and medical
/// punctuation pass through untouched.
pub fn normalize_text(raw: &str) -> String {
    let without_controls: String = raw
        .chars()
        .map(|c| match c {
            '\t' | '\u{00A0}' | '\u{3000}' => ' ',
            '\r' => '\n',
            c => fold_full_width(c),
        })
        .filter(|c| *c == '\n' || !c.is_control())
        .filter(|c| !matches!(c, '\u{200B}' | '\u{FEFF}'))
        .collect();

    collapse_separators(&without_controls)
        .lines()
        .map(collapse_spaces)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// U+FF01..U+FF5E mirror printable ASCII at a fixed offset.
fn fold_full_width(c: char) -> char {
    match c {
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
        c => c,
    }
}

/// Drop a separator (and the blanks before it) when it repeats the previous one.
fn collapse_separators(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        if !SEPARATORS.contains(&c) {
            continue;
        }
        loop {
            let mut j = i;
            while j < chars.len() && chars[j] == ' ' {
                j += 1;
            }
            if j < chars.len() && chars[j] == c {
                i = j + 1;
            } else {
                break;
            }
        }
    }
    out
}

fn collapse_spaces(line: &str) -> String {
    line.split(' ')
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
