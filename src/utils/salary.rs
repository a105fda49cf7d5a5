use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SalaryRange {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
    pub currency: Option<String>,
}

const KNOWN_CODES: &[&str] = &[
    "USD", "EUR", "GBP", "CAD", "AUD", "CHF", "SEK", "NOK", "DKK", "PLN", "INR", "JPY",
];

/// Parses free-form compensation text such as `$90,000 - $120,000`,
/// `USD 90k–120k` or `€55.000`. Returns `None` when no amount is present or
/// an amount does not fit in a `Decimal`.
pub fn parse_salary_range(text: &str) -> Option<SalaryRange> {
    let amounts = extract_amounts(text)?;
    let (min, max) = match amounts.as_slice() {
        [] => return None,
        [single] => (*single, *single),
        [first, second, ..] => {
            if first <= second {
                (*first, *second)
            } else {
                (*second, *first)
            }
        }
    };

    Some(SalaryRange {
        min: Some(min),
        max: Some(max),
        currency: detect_currency(text),
    })
}

fn detect_currency(text: &str) -> Option<String> {
    let symbol = text.chars().find_map(|c| match c {
        '$' => Some("USD"),
        '€' => Some("EUR"),
        '£' => Some("GBP"),
        '¥' => Some("JPY"),
        _ => None,
    });

    text.split(|c: char| !c.is_ascii_alphabetic())
        .map(|word| word.to_ascii_uppercase())
        .find(|word| KNOWN_CODES.contains(&word.as_str()))
        .or_else(|| symbol.map(str::to_string))
}

struct Amount {
    value: Decimal,
    thousands_suffix: bool,
}

fn extract_amounts(text: &str) -> Option<Vec<Decimal>> {
    let chars: Vec<char> = text.chars().collect();
    let mut found: Vec<Amount> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len()
            && (chars[i].is_ascii_digit()
                || (matches!(chars[i], ',' | '.')
                    && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())))
        {
            i += 1;
        }
        let token: String = chars[start..i].iter().collect();

        let thousands_suffix = chars.get(i).is_some_and(|c| matches!(c, 'k' | 'K'));
        if thousands_suffix {
            i += 1;
        }

        if let Some(value) = normalize_number(&token) {
            found.push(Amount {
                value,
                thousands_suffix,
            });
        }
    }

    // "90-120k" carries the suffix only on the upper bound.
    let any_suffix = found.iter().any(|a| a.thousands_suffix);
    found
        .into_iter()
        .map(|a| {
            if a.thousands_suffix || (any_suffix && a.value < Decimal::from(1000)) {
                a.value.checked_mul(Decimal::from(1000))
            } else {
                Some(a.value)
            }
        })
        .collect()
}

fn normalize_number(token: &str) -> Option<Decimal> {
    let is_sep = |c: char| c == ',' || c == '.';
    let Some(last_pos) = token.rfind(is_sep) else {
        return Decimal::from_str(token).ok();
    };

    let decimal_sep = token[last_pos..].chars().next()?;
    let normalized = if token.contains(',') && token.contains('.') {
        token
            .chars()
            .filter(|c| *c == decimal_sep || c.is_ascii_digit())
            .map(|c| if c == decimal_sep { '.' } else { c })
            .collect::<String>()
    } else {
        let groups: Vec<&str> = token.split(decimal_sep).collect();
        if groups.len() > 1 && groups[1..].iter().all(|g| g.len() == 3) {
            groups.concat()
        } else if groups.len() == 2 {
            format!("{}.{}", groups[0], groups[1])
        } else {
            return None;
        }
    };

    Decimal::from_str(&normalized).ok()
}
