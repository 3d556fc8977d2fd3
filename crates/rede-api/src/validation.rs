use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$")
        .ok()
});

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_RE.as_ref().is_some_and(|re| re.is_match(email))
}

fn digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Strips punctuation (`11.222.333/0001-81` -> `11222333000181`).
pub fn normalize_cnpj(cnpj: &str) -> String {
    digits(cnpj)
}

/// Checks length and both check digits of a normalized CNPJ.
pub fn is_valid_cnpj(cnpj: &str) -> bool {
    let nums: Vec<u32> = cnpj.chars().filter_map(|c| c.to_digit(10)).collect();
    if nums.len() != 14 || cnpj.len() != 14 {
        return false;
    }
    if nums.iter().all(|d| *d == nums[0]) {
        return false;
    }

    const FIRST: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    const SECOND: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

    let check = |weights: &[u32]| {
        let sum: u32 = weights.iter().zip(&nums).map(|(w, d)| w * d).sum();
        match sum % 11 {
            0 | 1 => 0,
            r => 11 - r,
        }
    };

    check(&FIRST) == nums[12] && check(&SECOND) == nums[13]
}

/// Phone numbers are stored as digits only (area code + number).
pub fn normalize_phone(phone: &str) -> String {
    digits(phone)
}

pub fn is_valid_phone(phone: &str) -> bool {
    (10..=11).contains(&phone.len()) && phone.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("a.b+c@mail.example.com.br"));
        assert!(!is_valid_email("ana@"));
        assert!(!is_valid_email("ana example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn cnpj_check_digits() {
        assert!(is_valid_cnpj(&normalize_cnpj("11.222.333/0001-81")));
        assert!(!is_valid_cnpj("11222333000182"));
        assert!(!is_valid_cnpj("11111111111111"));
        assert!(!is_valid_cnpj("1122233300018"));
        assert!(!is_valid_cnpj("11.222.333/0001-81"));
    }

    #[test]
    fn phones() {
        assert_eq!(normalize_phone("(11) 98765-4321"), "11987654321");
        assert!(is_valid_phone("1132654321"));
        assert!(is_valid_phone("11987654321"));
        assert!(!is_valid_phone("987654321"));
        assert!(!is_valid_phone("119876543210"));
    }
}
