//! Value Cleaning Module
//! Year normalization, fuel label cleanup and filename year extraction.

/// Fuel labels that appear under different names across yearly files.
pub const FUEL_CANONICAL: [(&str, &str); 5] = [
    ("Diesel And Diesel Hybrid", "Diesel Hybrid"),
    ("Hybrid Gasoline", "Gasoline Hybrid"),
    ("Plug In Hybrid", "Plug-in Hybrid"),
    ("Battery Electric", "Electric"),
    ("Flex Fuel", "Flex-Fuel"),
];

/// A raw `year` cell as it comes out of the CSV reader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawYear<'a> {
    Text(&'a str),
    Int(i64),
    Float(f64),
}

/// Normalize a raw year cell.
///
/// Text has every non-digit stripped ("1998s" -> 1998); numbers pass through.
/// Returns `None` for missing, empty or unparseable values.
pub fn clean_year(raw: Option<RawYear<'_>>) -> Option<i32> {
    match raw? {
        RawYear::Text(text) => {
            let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
            if digits.is_empty() {
                None
            } else {
                digits.parse().ok()
            }
        }
        RawYear::Int(value) => i32::try_from(value).ok(),
        RawYear::Float(value) => {
            if value.is_finite() && value.abs() < i32::MAX as f64 {
                Some(value.trunc() as i32)
            } else {
                None
            }
        }
    }
}

/// Trim, turn hyphens into spaces and title-case every word.
///
/// Title casing upper-cases a letter that follows a non-letter and
/// lower-cases every other letter, so "plug-in HYBRID" becomes "Plug In Hybrid".
pub fn normalize_fuel_label(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_is_letter = false;

    for c in raw.trim().replace('-', " ").chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }

    out
}

/// Map a normalized label onto its canonical name, leaving other labels untouched.
pub fn canonical_fuel_label(label: &str) -> &str {
    FUEL_CANONICAL
        .iter()
        .find(|(raw, _)| *raw == label)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(label)
}

/// Whether a fuel label counts towards the electric vehicle total.
pub fn is_electric(label: &str) -> bool {
    label.to_lowercase().contains("electric")
}

/// Fallback year of a vehicle file: the four characters after the
/// `vehicle` prefix ("vehicle2020.csv" -> 2020).
pub fn vehicle_file_year(file_name: &str) -> Option<i32> {
    let slice: String = file_name.chars().skip(7).take(4).collect();
    slice.trim().parse().ok()
}

/// Year encoded in a PM2.5 file name between the first `-` and the next `.`
/// ("pm2.5-2020.csv" -> 2020).
pub fn pm25_file_year(file_name: &str) -> Option<i32> {
    let after_dash = file_name.split('-').nth(1)?;
    let year = after_dash.split('.').next()?;
    year.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_year_variants() {
        assert_eq!(clean_year(Some(RawYear::Text("1998s"))), Some(1998));
        assert_eq!(clean_year(Some(RawYear::Text("s2001"))), Some(2001));
        assert_eq!(clean_year(Some(RawYear::Text("abc"))), None);
        assert_eq!(clean_year(Some(RawYear::Text(""))), None);
        assert_eq!(clean_year(Some(RawYear::Int(2004))), Some(2004));
        assert_eq!(clean_year(Some(RawYear::Float(2004.0))), Some(2004));
        assert_eq!(clean_year(Some(RawYear::Float(f64::NAN))), None);
        assert_eq!(clean_year(None), None);
    }

    #[test]
    fn test_normalize_fuel_label() {
        assert_eq!(normalize_fuel_label("  battery-electric "), "Battery Electric");
        assert_eq!(normalize_fuel_label("Plug-in Hybrid"), "Plug In Hybrid");
        assert_eq!(normalize_fuel_label("GASOLINE"), "Gasoline");
        assert_eq!(
            normalize_fuel_label("diesel and diesel hybrid"),
            "Diesel And Diesel Hybrid"
        );
    }

    #[test]
    fn test_canonical_label_is_stable() {
        for (raw, canonical) in FUEL_CANONICAL {
            assert_eq!(canonical_fuel_label(raw), canonical);
            assert_eq!(canonical_fuel_label(canonical), canonical);
        }
        assert_eq!(canonical_fuel_label("Gasoline"), "Gasoline");
    }

    #[test]
    fn test_is_electric() {
        assert!(is_electric("Electric"));
        assert!(is_electric("Battery Electric"));
        assert!(is_electric("fuel cell ELECTRIC"));
        assert!(!is_electric("Gasoline Hybrid"));
    }

    #[test]
    fn test_file_years() {
        assert_eq!(vehicle_file_year("vehicle2020.csv"), Some(2020));
        assert_eq!(vehicle_file_year("vehicle2019_fuel.csv"), Some(2019));
        assert_eq!(vehicle_file_year("vehicles.csv"), None);
        assert_eq!(pm25_file_year("pm2.5-2020.csv"), Some(2020));
        assert_eq!(pm25_file_year("pm2.5-latest.csv"), None);
    }
}
