// 💲 Display Formatting
//
// Revenue as "$500M" (card headers) or "$1,234,567" (field hints), and
// enum wire values as labels ("series-a" → "Series A").

const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

/// Compact USD amount with at most one fractional digit.
///
/// `500_000_000` → `$500M`, `1_500_000` → `$1.5M`, `50_000` → `$50K`, `0` → `$0`
pub fn format_revenue(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();

    // Rounding can carry into the next unit: 999_960 is $1M, not $1000K
    for (i, (scale, suffix)) in UNITS.iter().enumerate() {
        if abs >= *scale {
            let scaled = round_one_decimal(abs / scale);
            if scaled >= 1000.0 && i > 0 {
                let (bigger_scale, bigger_suffix) = UNITS[i - 1];
                let bigger = round_one_decimal(abs / bigger_scale);
                return format!("{}${}{}", sign, trim_decimal(bigger), bigger_suffix);
            }
            return format!("{}${}{}", sign, trim_decimal(scaled), suffix);
        }
    }

    let rounded = round_one_decimal(abs);
    if rounded >= 1000.0 {
        return format!("{}$1K", sign);
    }
    if rounded == 0.0 {
        return "$0".to_string();
    }
    format!("{}${}", sign, trim_decimal(rounded))
}

/// Whole-dollar USD amount with thousands separators: `$1,234,567`
pub fn format_revenue_full(value: f64) -> String {
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{}${}", sign, grouped)
}

/// Hyphens become spaces, every word is capitalized
pub fn format_label(value: &str) -> String {
    value
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn round_one_decimal(n: f64) -> f64 {
    (n * 10.0).round() / 10.0
}

fn trim_decimal(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{:.0}", n)
    } else {
        format!("{:.1}", n)
    }
}
