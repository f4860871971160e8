//! Dollar amounts as they appear in notes, emails and documents.

/// Whether to print the cents column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cents {
    Always,
    /// Only when the amount is not whole dollars.
    WhenPresent,
}

/// `$1,234.50` with thousands grouping. Rounds to the nearest cent.
pub fn format_usd(amount: f64, cents: Cents) -> String {
    let total = (amount.abs() * 100.0).round() as u64;
    let whole = (total / 100).to_string();
    let rem = total % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    match (cents, rem) {
        (Cents::WhenPresent, 0) => format!("{sign}${grouped}"),
        _ => format!("{sign}${grouped}.{rem:02}"),
    }
}
