use crate::models::LogicalType;

/// A column type as rendered by `DESCRIBE`, parsed down to its nested members,
/// e.g. `STRUCT(a HUGEINT, b MAP(VARCHAR, UUID[]))`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNode {
    pub logical_type: LogicalType,
    /// Element type for lists and arrays, members in declaration order for
    /// structs and unions, key then value for maps.
    pub children: Vec<TypeNode>,
}

impl TypeNode {
    #[must_use]
    pub const fn leaf(logical_type: LogicalType) -> Self {
        Self {
            logical_type,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn parse(type_name: &str) -> Self {
        let name = type_name.trim();
        if let Some((element, size)) = split_trailing_brackets(name) {
            let logical_type = if size.trim().is_empty() {
                LogicalType::List
            } else {
                LogicalType::Array
            };
            return Self {
                logical_type,
                children: vec![Self::parse(element)],
            };
        }

        let logical_type = LogicalType::from_type_name(name);
        let Some(args) = arguments(name) else {
            return Self::leaf(logical_type);
        };
        let children = match logical_type {
            LogicalType::Struct | LogicalType::Union => split_top_level(args)
                .into_iter()
                .map(|member| Self::parse(member_type(member)))
                .collect(),
            LogicalType::Map | LogicalType::List => {
                split_top_level(args).into_iter().map(Self::parse).collect()
            }
            _ => Vec::new(),
        };
        Self {
            logical_type,
            children,
        }
    }

    #[must_use]
    pub fn child(&self, idx: usize) -> Option<&Self> {
        self.children.get(idx)
    }
}

// `INTEGER[3]` -> ("INTEGER", "3"), ignoring brackets inside parentheses.
fn split_trailing_brackets(name: &str) -> Option<(&str, &str)> {
    let body = name.strip_suffix(']')?;
    let mut depth = 0_i32;
    for (idx, ch) in body.char_indices().rev() {
        match ch {
            ']' | ')' => depth += 1,
            '(' => depth -= 1,
            '[' if depth == 0 => return Some((&body[..idx], &body[idx + 1..])),
            '[' => depth -= 1,
            _ => {}
        }
    }
    None
}

// Text between the first `(` and the closing `)` at the end.
fn arguments(name: &str) -> Option<&str> {
    let open = name.find('(')?;
    name.strip_suffix(')').map(|body| &body[open + 1..])
}

fn split_top_level(args: &str) -> Vec<&str> {
    let bytes = args.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0_i32;
    let mut start = 0;
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            quote @ (b'"' | b'\'') => {
                idx += 1;
                while idx < bytes.len() && bytes[idx] != quote {
                    idx += 1;
                }
            }
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth -= 1,
            b',' if depth == 0 => {
                parts.push(args[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
        idx += 1;
    }
    let last = args[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

// `"my field" INTEGER` -> `INTEGER`
fn member_type(member: &str) -> &str {
    let member = member.trim_start();
    if let Some(rest) = member.strip_prefix('"') {
        let bytes = rest.as_bytes();
        let mut idx = 0;
        while idx < bytes.len() {
            if bytes[idx] == b'"' {
                if bytes.get(idx + 1) == Some(&b'"') {
                    idx += 2;
                    continue;
                }
                return rest[idx + 1..].trim();
            }
            idx += 1;
        }
        return "";
    }
    member
        .split_once(char::is_whitespace)
        .map_or("", |(_, type_name)| type_name.trim())
}
