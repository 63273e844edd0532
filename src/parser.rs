use regex::Regex;

/// Result of a quick-add line such as `Gala dinner @2025-12-01 $1500`.
#[derive(Debug, PartialEq)]
pub struct QuickAdd {
    pub title: String,
    pub date: Option<String>,
    pub budget: Option<f64>,
}

pub fn parse_quick_add(input: &str) -> QuickAdd {
    let date_re = Regex::new(r"@(\d{4}-\d{2}-\d{2}(?:T\d{2}:\d{2}(?::\d{2})?)?)\s*").unwrap();
    let budget_re = Regex::new(r"\$(\d+(?:\.\d+)?)\s*").unwrap();

    // Date: the first one wins
    let date = date_re
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    // Budget
    let budget = budget_re
        .captures(input)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok());

    let title = date_re.replace_all(input, "");
    let title = budget_re.replace_all(&title, "");

    let title = Regex::new(r"\s+")
        .unwrap()
        .replace_all(&title, " ")
        .trim()
        .to_string();

    QuickAdd {
        title,
        date,
        budget,
    }
}
