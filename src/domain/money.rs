/// Amounts are reported by the API as decimal rupees and accumulated as-is.
pub type Rupees = f64;

/// Format rupees the way an en-IN currency formatter does: lakh/crore
/// digit grouping and two decimals.
/// Example: 100000.0 -> "₹1,00,000.00", -1234.5 -> "-₹1,234.50"
pub fn format_inr(amount: Rupees) -> String {
    if !amount.is_finite() {
        return "₹0.00".to_string();
    }

    let paise = (amount * 100.0).round() as i64;
    let sign = if paise < 0 { "-" } else { "" };
    let abs_paise = paise.unsigned_abs();
    let units = abs_paise / 100;
    let remainder = abs_paise % 100;
    format!("{}₹{}.{:02}", sign, group_indian(units), remainder)
}

/// Indian grouping: the last three digits, then pairs.
/// Example: 12345678 -> "1,23,45,678"
fn group_indian(units: u64) -> String {
    let digits = units.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}
