//! Checksum algorithms used by pattern validators

/// Apply `(from, to)` replacements in order
pub fn sanitize_value(text: &str, replacement_pairs: &[(&str, &str)]) -> String {
    replacement_pairs
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

fn digits_of(number: &str) -> Option<Vec<u32>> {
    if number.is_empty() {
        return None;
    }
    number.chars().map(|c| c.to_digit(10)).collect()
}

/// Luhn mod-10 check; `number` must be all digits
pub fn luhn(number: &str) -> bool {
    let Some(digits) = digits_of(number) else {
        return false;
    };

    let checksum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();

    checksum.is_multiple_of(10)
}

const VERHOEFF_D: [[usize; 10]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 2, 3, 4, 0, 6, 7, 8, 9, 5],
    [2, 3, 4, 0, 1, 7, 8, 9, 5, 6],
    [3, 4, 0, 1, 2, 8, 9, 5, 6, 7],
    [4, 0, 1, 2, 3, 9, 5, 6, 7, 8],
    [5, 9, 8, 7, 6, 0, 4, 3, 2, 1],
    [6, 5, 9, 8, 7, 1, 0, 4, 3, 2],
    [7, 6, 5, 9, 8, 2, 1, 0, 4, 3],
    [8, 7, 6, 5, 9, 3, 2, 1, 0, 4],
    [9, 8, 7, 6, 5, 4, 3, 2, 1, 0],
];

const VERHOEFF_P: [[usize; 10]; 8] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 5, 7, 6, 2, 8, 3, 0, 9, 4],
    [5, 8, 0, 3, 7, 9, 6, 1, 4, 2],
    [8, 9, 1, 6, 0, 4, 3, 5, 2, 7],
    [9, 4, 5, 3, 1, 2, 6, 8, 7, 0],
    [4, 2, 8, 6, 5, 7, 3, 9, 0, 1],
    [2, 7, 9, 3, 8, 0, 6, 4, 1, 5],
    [7, 0, 4, 6, 9, 1, 3, 2, 5, 8],
];

/// Verhoeff dihedral-group check; the last digit is the check digit
pub fn verhoeff(number: &str) -> bool {
    let Some(digits) = digits_of(number) else {
        return false;
    };

    let c = digits
        .iter()
        .rev()
        .enumerate()
        .fold(0usize, |c, (i, &d)| VERHOEFF_D[c][VERHOEFF_P[i % 8][d as usize]]);

    c == 0
}

/// ISO 7064 MOD 11,10 (hybrid system); the last digit is the check digit
pub fn iso7064_mod_11_10(number: &str) -> bool {
    let Some(digits) = digits_of(number) else {
        return false;
    };
    let Some((&check, body)) = digits.split_last() else {
        return false;
    };

    let mut product = 10;
    for &digit in body {
        let mut sum = (digit + product) % 10;
        if sum == 0 {
            sum = 10;
        }
        product = (2 * sum) % 11;
    }

    (11 - product) % 10 == check
}

/// ISO 7064 MOD 97-10 as used by IBAN
///
/// The first four characters are moved to the end and letters are expanded to
/// `A=10 .. Z=35`; the number is valid when the remainder is 1.
pub fn iban_mod_97(iban: &str) -> bool {
    if iban.len() < 5 || !iban.is_ascii() {
        return false;
    }

    let rearranged = format!("{}{}", &iban[4..], &iban[..4]);
    let mut remainder: u32 = 0;
    for c in rearranged.chars() {
        let value = match c.to_digit(36) {
            Some(v) => v,
            None => return false,
        };
        remainder = if value < 10 {
            (remainder * 10 + value) % 97
        } else {
            (remainder * 100 + value) % 97
        };
    }

    remainder == 1
}

/// Weighted modulus check: `sum(digit * weight) % modulus == expected`
pub fn weighted_checksum(digits: &[u32], weights: &[u32], modulus: u32) -> u32 {
    digits
        .iter()
        .zip(weights)
        .map(|(d, w)| d * w)
        .sum::<u32>()
        % modulus
}

/// True when every character is the same
pub fn all_same_char(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => chars.all(|c| c == first),
        None => true,
    }
}

pub fn is_palindrome(text: &str) -> bool {
    text.chars().eq(text.chars().rev())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_value() {
        assert_eq!(
            sanitize_value("4012-8888 8888-1881", &[("-", ""), (" ", "")]),
            "4012888888881881"
        );
    }

    #[test]
    fn test_luhn() {
        assert!(luhn("4012888888881881"));
        assert!(luhn("4111111111111111"));
        assert!(!luhn("4012888888881882"));
        assert!(!luhn("4012-8888"));
        assert!(!luhn(""));
    }

    #[test]
    fn test_verhoeff() {
        assert!(verhoeff("2363"));
        assert!(!verhoeff("2364"));
        assert!(verhoeff("312345678909"));
        assert!(!verhoeff("312345678908"));
    }

    #[test]
    fn test_iso7064_mod_11_10() {
        assert!(iso7064_mod_11_10("86095742719"));
        assert!(!iso7064_mod_11_10("86095742710"));
        assert!(!iso7064_mod_11_10("8"));
    }

    #[test]
    fn test_iban_mod_97() {
        assert!(iban_mod_97("GB82WEST12345698765432"));
        assert!(iban_mod_97("DE89370400440532013000"));
        assert!(!iban_mod_97("GB82WEST12345698765433"));
        assert!(!iban_mod_97("GB8"));
    }

    #[test]
    fn test_weighted_checksum() {
        assert_eq!(weighted_checksum(&[1, 2, 3], &[3, 2, 1], 11), 10);
    }

    #[test]
    fn test_char_helpers() {
        assert!(all_same_char("1111"));
        assert!(!all_same_char("1112"));
        assert!(is_palindrome("123321"));
        assert!(!is_palindrome("123421"));
    }
}
