//! Rule-based structural extractor: the guaranteed documentation tier.
//!
//! No parser and no model — line-oriented keyword heuristics that detect
//! function, class and import constructs across common language families
//! (keyword + following identifier), then compose a short templated
//! sentence. Produces non-empty output for any input.

/// Description used when there is nothing to describe.
pub const EMPTY_PLACEHOLDER: &str =
    "This is an empty code snippet. There is nothing to describe.";

/// Hard cap on the composed description, in characters.
const MAX_CHARS: usize = 600;

/// How many detected names to spell out per category.
const MAX_NAMES: usize = 3;

const FUNCTION_KEYWORDS: &[&str] = &["def", "fn", "func", "function"];
const CLASS_KEYWORDS: &[&str] = &["class", "struct", "interface", "trait", "enum"];
const IMPORT_KEYWORDS: &[&str] = &["import", "use", "from", "#include", "require"];

/// Modifiers that may precede a declaration keyword.
const PREFIXES: &[&str] = &[
    "pub", "export", "async", "public", "private", "protected", "static",
    "abstract", "final", "unsafe", "const", "default",
];

#[derive(Debug, Default, PartialEq)]
pub struct CodeFacts {
    pub functions: Vec<String>,
    pub classes: Vec<String>,
    pub imports: usize,
}

/// Extract structural facts from raw source text, one line at a time.
pub fn extract(code: &str) -> CodeFacts {
    let mut facts = CodeFacts::default();

    for line in code.lines() {
        let line = line.trim_start();
        let mut tokens = line.split_whitespace();

        let Some(mut keyword) = tokens.next() else {
            continue;
        };
        while PREFIXES.contains(&keyword) {
            match tokens.next() {
                Some(next) => keyword = next,
                None => break,
            }
        }

        if IMPORT_KEYWORDS.contains(&keyword) {
            facts.imports += 1;
        } else if FUNCTION_KEYWORDS.contains(&keyword) {
            if let Some(name) = tokens.next().and_then(identifier) {
                facts.functions.push(name);
            }
        } else if CLASS_KEYWORDS.contains(&keyword) {
            if let Some(name) = tokens.next().and_then(identifier) {
                facts.classes.push(name);
            }
        }
    }

    facts
}

/// Compose a spoken-style description of the code. Never returns an empty
/// string: empty input gets the fixed placeholder, input with no detected
/// constructs gets a generic line-count sentence.
pub fn describe(code: &str) -> String {
    if code.trim().is_empty() {
        return EMPTY_PLACEHOLDER.to_string();
    }

    let facts = extract(code);
    let mut sentence = String::from("This code ");

    if facts.functions.is_empty() && facts.classes.is_empty() {
        let lines = code.lines().filter(|l| !l.trim().is_empty()).count();
        sentence.push_str(&format!(
            "contains {lines} line{} of source with no functions or classes detected",
            plural(lines)
        ));
    } else {
        sentence.push_str("defines ");
        if !facts.functions.is_empty() {
            sentence.push_str(&counted("function", &facts.functions));
            if !facts.classes.is_empty() {
                sentence.push_str(" and ");
            }
        }
        if !facts.classes.is_empty() {
            sentence.push_str(&counted("class", &facts.classes));
        }
    }

    if facts.imports > 0 {
        sentence.push_str(&format!(
            ", importing {} module{}",
            facts.imports,
            plural(facts.imports)
        ));
    }
    sentence.push('.');

    truncate_chars(&sentence, MAX_CHARS)
}

/// "2 functions (add, multiply)" — count, category, and up to a few names.
fn counted(category: &str, names: &[String]) -> String {
    let n = names.len();
    let suffix = if category == "class" && n != 1 {
        "es"
    } else {
        plural(n)
    };
    let listed: Vec<&str> = names.iter().take(MAX_NAMES).map(String::as_str).collect();
    format!("{n} {category}{suffix} ({})", listed.join(", "))
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Take the leading identifier out of a token: strip anything from the
/// first non-identifier character on. "add(a," → "add".
fn identifier(token: &str) -> Option<String> {
    let end = token
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    let name = &token[..end];

    if name.is_empty() || name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        None
    } else {
        Some(name.to_string())
    }
}

/// Char-boundary-safe truncation.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_a_python_function() {
        let description = describe("def add(a, b):\n    return a + b");
        assert!(description.contains("1 function"), "{description}");
        assert!(description.contains("add"), "{description}");
    }

    #[test]
    fn detects_rust_constructs() {
        let code = "use std::fmt;\n\npub struct Point {\n    x: f32,\n}\n\npub fn origin() -> Point {\n    Point { x: 0.0 }\n}\n";
        let facts = extract(code);
        assert_eq!(facts.functions, vec!["origin"]);
        assert_eq!(facts.classes, vec!["Point"]);
        assert_eq!(facts.imports, 1);
    }

    #[test]
    fn counts_classes_and_imports_in_description() {
        let code = "import os\nimport sys\n\nclass Foo:\n    pass\n\nclass Bar:\n    pass\n";
        let description = describe(code);
        assert!(description.contains("2 classes"), "{description}");
        assert!(description.contains("2 modules"), "{description}");
    }

    #[test]
    fn empty_input_gets_placeholder() {
        assert_eq!(describe(""), EMPTY_PLACEHOLDER);
        assert_eq!(describe("   \n\t  "), EMPTY_PLACEHOLDER);
    }

    #[test]
    fn plain_code_gets_generic_sentence() {
        let description = describe("x = 1\ny = x + 2\nprint(y)\n");
        assert!(description.contains("3 lines"), "{description}");
        assert!(!description.is_empty());
    }

    #[test]
    fn anonymous_function_keyword_is_not_a_name() {
        // `function(x)` in JS callback position has no identifier to report.
        let facts = extract("setTimeout(x)\nfunction (x) { return x; }\n");
        assert!(facts.functions.is_empty());
    }

    #[test]
    fn long_input_stays_bounded() {
        let mut code = String::new();
        for i in 0..500 {
            code.push_str(&format!("def function_number_{i}():\n    pass\n"));
        }
        let description = describe(&code);
        assert!(description.chars().count() <= 600);
        assert!(description.contains("500 functions"));
    }
}
