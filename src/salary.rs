use regex::Regex;
use std::sync::OnceLock;

/// Parsed salary range. All fields are `None` when nothing usable was found.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Salary {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: Option<&'static str>,
}

fn salary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(\$|USD\s*)?\s*(\d{2,3}[,.]?\d{0,3})(?:\s*(?:-|–|to)\s*(?:\$|USD\s*)?(\d{2,3}[,.]?\d{0,3}))?\s*(?:(?:per|/)\s*(?:year|yr|hour|hr|annum))?",
        )
        .expect("salary regex")
    })
}

/// First salary-looking number or range in `text`. Only an explicit `$` or
/// `USD` sets the currency. A number that fails to parse voids the result.
pub fn extract_salary(text: &str) -> Salary {
    if text.is_empty() {
        return Salary::default();
    }
    let Some(caps) = salary_re().captures(text) else {
        return Salary::default();
    };
    let currency = caps.get(1).map(|_| "USD");

    let Some(min) = caps.get(2).and_then(|m| parse_amount(m.as_str())) else {
        return Salary::default();
    };
    let max = match caps.get(3) {
        Some(m) => match parse_amount(m.as_str()) {
            Some(v) => Some(v),
            None => return Salary::default(),
        },
        None => None,
    };

    Salary {
        min: Some(min),
        max,
        currency,
    }
}

fn parse_amount(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dollar_range_per_year() {
        let s = extract_salary("$65,000-$80,000 per year");
        assert_eq!(s.min, Some(65000.0));
        assert_eq!(s.max, Some(80000.0));
        assert_eq!(s.currency, Some("USD"));
    }

    #[test]
    fn embedded_range() {
        let s = extract_salary("Project management role. Salary: $65,000-$80,000 per year.");
        assert_eq!((s.min, s.max), (Some(65000.0), Some(80000.0)));
    }

    #[test]
    fn single_value() {
        let s = extract_salary("Starting at $50,000");
        assert_eq!(s.min, Some(50000.0));
        assert_eq!(s.max, None);
        assert_eq!(s.currency, Some("USD"));
    }

    #[test]
    fn to_separator_and_usd_marker() {
        let s = extract_salary("USD 55,000 to 62,500 annum");
        assert_eq!((s.min, s.max, s.currency), (Some(55000.0), Some(62500.0), Some("USD")));
    }

    #[test]
    fn en_dash_hourly_without_currency() {
        let s = extract_salary("Pay 22 – 28 per hour");
        assert_eq!((s.min, s.max), (Some(22.0), Some(28.0)));
        assert_eq!(s.currency, None);
    }

    #[test]
    fn slash_unit_does_not_change_amounts() {
        let s = extract_salary("Crew pay $22/hr, per diem included");
        assert_eq!((s.min, s.max, s.currency), (Some(22.0), None, Some("USD")));
        let r = extract_salary("$55,000 - $60,000/yr");
        assert_eq!((r.min, r.max), (Some(55000.0), Some(60000.0)));
    }

    #[test]
    fn no_numbers() {
        assert_eq!(extract_salary("no numbers here"), Salary::default());
        assert_eq!(
            extract_salary("Great benefits and growth opportunities"),
            Salary::default()
        );
    }

    #[test]
    fn empty_input() {
        assert_eq!(extract_salary(""), Salary::default());
    }

    #[test]
    fn single_digit_is_ignored() {
        assert_eq!(extract_salary("5 days a week"), Salary::default());
    }
}
