//! Attribute name ⇄ property name mapping.

/// `current-page` → `currentPage`. The name is lowercased first.
pub fn attr_to_prop(attr: &str) -> String {
    let lower = attr.to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut chars = lower.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '-' {
            if let Some(&next) = chars.peek() {
                if next.is_alphanumeric() || next == '_' {
                    out.extend(next.to_uppercase());
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// `currentPage` → `current-page`. A run of capitals is split before its last
/// letter, so `fooBAR` maps to `foo-ba-r`.
pub fn prop_to_attr(prop: &str) -> String {
    let chars: Vec<char> = prop.chars().collect();
    let mut out = String::with_capacity(prop.len() + 4);
    let mut index = 0;
    while index < chars.len() {
        if !chars[index].is_ascii_uppercase() {
            out.push(chars[index]);
            index += 1;
            continue;
        }
        let start = index;
        while index < chars.len() && chars[index].is_ascii_uppercase() {
            index += 1;
        }
        let run: String = chars[start..index].iter().collect::<String>().to_ascii_lowercase();
        if start > 0 {
            out.push('-');
        }
        if run.len() > 1 {
            out.push_str(&run[..run.len() - 1]);
            out.push('-');
            out.push_str(&run[run.len() - 1..]);
        } else {
            out.push_str(&run);
        }
    }
    out
}
