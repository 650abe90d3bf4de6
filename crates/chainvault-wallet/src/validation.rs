//! Checks that gate user actions before any key material is touched.

use crate::error::WalletError;
use chainvault_crypto::mnemonic::{word_count, VALID_WORD_COUNTS};
use chainvault_types::{Address, Amount, Chain};

pub const DEFAULT_PIN_LENGTH: usize = 6;

/// Word count must be a BIP39 length. Returns the count.
pub fn validate_word_count(phrase: &str) -> Result<usize, WalletError> {
    let count = word_count(phrase);
    if !VALID_WORD_COUNTS.contains(&count) {
        return Err(WalletError::InvalidWordCount(count));
    }
    Ok(count)
}

/// Exactly `length` ASCII digits.
pub fn validate_pin(pin: &str, length: usize) -> Result<(), WalletError> {
    if pin.len() != length || !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(WalletError::InvalidPinFormat { expected: length });
    }
    Ok(())
}

pub fn validate_pin_confirmation(pin: &str, confirmation: &str) -> Result<(), WalletError> {
    if pin != confirmation {
        return Err(WalletError::PinMismatch);
    }
    Ok(())
}

/// Parse a recipient for `chain`, refusing the sender's own address.
pub fn validate_recipient(chain: Chain, input: &str, own: Option<&Address>) -> Result<Address, WalletError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(WalletError::InvalidAddress("recipient is empty".to_string()));
    }
    let address = Address::parse_for(chain, trimmed)?;
    if own == Some(&address) {
        return Err(WalletError::SelfTransfer);
    }
    Ok(address)
}

/// Parse a positive amount with `decimals` fractional digits.
pub fn validate_amount(input: &str, decimals: u8) -> Result<Amount, WalletError> {
    let amount = Amount::parse(input, decimals)?;
    if amount.is_zero() {
        return Err(WalletError::InvalidAmount("amount must be greater than zero".to_string()));
    }
    Ok(amount)
}

/// `needed` (amount plus fees) must not exceed `available`.
pub fn check_balance(asset: &str, needed: u128, available: u128) -> Result<(), WalletError> {
    if needed > available {
        return Err(WalletError::InsufficientBalance {
            asset: asset.to_string(),
            needed,
            available,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_word_count() {
        let twelve = "abandon ".repeat(11) + "about";
        assert_eq!(validate_word_count(&twelve).unwrap(), 12);
        assert_eq!(validate_word_count(&"zoo ".repeat(24)).unwrap(), 24);
        assert_eq!(validate_word_count("one two three"), Err(WalletError::InvalidWordCount(3)));
        assert_eq!(validate_word_count(""), Err(WalletError::InvalidWordCount(0)));
        assert_eq!(validate_word_count(&"a ".repeat(13)), Err(WalletError::InvalidWordCount(13)));
    }

    #[test]
    fn test_pin_format() {
        assert!(validate_pin("123456", 6).is_ok());
        assert!(validate_pin("1234", 4).is_ok());
        assert_eq!(validate_pin("12345", 6), Err(WalletError::InvalidPinFormat { expected: 6 }));
        assert!(validate_pin("12345a", 6).is_err());
        assert!(validate_pin("１２３４５６", 6).is_err());
    }

    #[test]
    fn test_pin_confirmation() {
        assert!(validate_pin_confirmation("123456", "123456").is_ok());
        assert_eq!(validate_pin_confirmation("123456", "123457"), Err(WalletError::PinMismatch));
    }

    #[test]
    fn test_recipient() {
        let addr = validate_recipient(Chain::Evm, " 0x000000000000000000000000000000000000dEaD ", None).unwrap();
        assert_eq!(addr.chain(), Chain::Evm);
        assert!(validate_recipient(Chain::Evm, "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t", None).is_err());
        assert!(validate_recipient(Chain::Tron, "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t", None).is_ok());
        assert!(matches!(
            validate_recipient(Chain::Solana, "", None),
            Err(WalletError::InvalidAddress(_))
        ));
        assert_eq!(
            validate_recipient(Chain::Evm, "0x000000000000000000000000000000000000dEaD", Some(&addr)),
            Err(WalletError::SelfTransfer)
        );
    }

    #[test]
    fn test_amount() {
        assert_eq!(validate_amount("1.5", 6).unwrap().base_units(), 1_500_000);
        assert!(matches!(validate_amount("0", 6), Err(WalletError::InvalidAmount(_))));
        assert!(matches!(validate_amount("0.0000001", 6), Err(WalletError::InvalidAmount(_))));
        assert!(matches!(validate_amount("abc", 6), Err(WalletError::InvalidAmount(_))));
    }

    #[test]
    fn test_check_balance() {
        assert!(check_balance("SOL", 10, 10).is_ok());
        assert_eq!(
            check_balance("SOL", 11, 10),
            Err(WalletError::InsufficientBalance {
                asset: "SOL".to_string(),
                needed: 11,
                available: 10
            })
        );
    }

    proptest! {
        #[test]
        fn prop_digit_pins_of_right_length_pass(pin in "[0-9]{6}") {
            prop_assert!(validate_pin(&pin, 6).is_ok());
        }

        #[test]
        fn prop_wrong_length_pins_fail(pin in "[0-9]{1,5}|[0-9]{7,10}") {
            prop_assert!(validate_pin(&pin, 6).is_err());
        }
    }
}
