//! Tag and entity stripping

/// Strip tags from `content` and decode `&lt;` / `&gt;`
///
/// Other entities are kept as written. An entity left open at the end of
/// the input is dropped.
pub fn render(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut in_tag = false;
    let mut entity: Option<String> = None;

    for c in content.chars() {
        if let Some(name) = entity.as_mut() {
            if c == ';' {
                match name.as_str() {
                    "lt" => result.push('<'),
                    "gt" => result.push('>'),
                    other => {
                        result.push('&');
                        result.push_str(other);
                        result.push(';');
                    }
                }
                entity = None;
            } else {
                name.push(c);
            }
        } else if c == '&' {
            entity = Some(String::new());
        } else if c == '<' {
            in_tag = true;
        } else if c == '>' {
            in_tag = false;
        } else if !in_tag {
            result.push(c);
        }
    }

    result
}
