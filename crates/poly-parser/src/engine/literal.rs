//! Number literal interpretation.
//!
//! The lexer hands over raw number text; this module turns it into a
//! [`NumberValue`]. Integers of any width go through `BigInt`; anything with
//! a fraction or exponent becomes an `f64`. A token the lexer accepted but
//! this module cannot interpret surfaces as a positioned `InvalidNumber`
//! error (the "lexical echo" class).

use crate::engine::error::{ParseError, ParseResult};
use num_bigint::BigInt;
use num_traits::Num;
use poly_ast::NumberValue;
use poly_position::Position;

/// Parse the text of a number token.
pub fn parse_number_token(text: &str, at: Position) -> ParseResult<NumberValue> {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();

    let invalid = || ParseError::InvalidNumber {
        literal: text.to_string(),
        line: at.line,
        column: at.column,
    };

    if let Some(hex) = cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
        if hex.is_empty() {
            return Err(invalid());
        }
        return BigInt::from_str_radix(hex, 16)
            .map(NumberValue::Int)
            .map_err(|_| invalid());
    }
    if let Some(bin) = cleaned.strip_prefix("0b").or_else(|| cleaned.strip_prefix("0B")) {
        if bin.is_empty() {
            return Err(invalid());
        }
        return BigInt::from_str_radix(bin, 2)
            .map(NumberValue::Int)
            .map_err(|_| invalid());
    }

    if cleaned.contains(['.', 'e', 'E']) {
        return cleaned
            .parse::<f64>()
            .map(NumberValue::Float)
            .map_err(|_| invalid());
    }

    cleaned.parse::<BigInt>().map(NumberValue::Int).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;
    use pretty_assertions::assert_eq;

    fn at() -> Position {
        Position::new(1, 1, 0)
    }

    #[test]
    fn decimal_integers() {
        assert_eq!(parse_number_token("42", at()), Ok(NumberValue::Int(BigInt::from(42))));
        assert_eq!(parse_number_token("0", at()), Ok(NumberValue::Int(BigInt::from(0))));
    }

    #[test]
    fn arbitrary_precision_survives() {
        let huge = "123456789012345678901234567890123456789";
        let parsed = parse_number_token(huge, at());
        assert!(matches!(parsed, Ok(NumberValue::Int(ref i)) if i.to_string() == huge));
    }

    #[test]
    fn hex_and_binary() {
        assert_eq!(parse_number_token("0xFF", at()), Ok(NumberValue::Int(BigInt::from(255))));
        assert_eq!(parse_number_token("0b1010", at()), Ok(NumberValue::Int(BigInt::from(10))));
    }

    #[test]
    fn floats_and_scientific() {
        assert_eq!(parse_number_token("3.14", at()), Ok(NumberValue::Float(3.14)));
        assert_eq!(parse_number_token("1e9", at()), Ok(NumberValue::Float(1e9)));
        assert_eq!(parse_number_token("2.5e-3", at()), Ok(NumberValue::Float(2.5e-3)));
    }

    #[test]
    fn underscores_are_separators() {
        assert_eq!(
            parse_number_token("1_000_000", at()),
            Ok(NumberValue::Int(BigInt::from(1_000_000)))
        );
    }

    #[test]
    fn malformed_literals_echo_back() {
        for bad in ["12abc", "0x", "0xZZ", "0b", "0b12", "1e"] {
            let err = parse_number_token(bad, Position::new(2, 3, 10));
            assert_eq!(
                err,
                Err(ParseError::InvalidNumber { literal: bad.to_string(), line: 2, column: 3 }),
                "{bad}"
            );
        }
    }
}
