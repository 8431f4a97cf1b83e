use std::str::FromStr;
use thiserror::Error;

const REGION_KEY_PREFIX: &str = "tissue.regions.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    MissingSeparator(String),

    #[error("Key cannot be empty in '{0}'.")]
    EmptyKey(String),

    #[error(
        "Invalid region key '{0}'. Expected 'tissue.regions.<index>.<field>' (e.g., 'tissue.regions.1.mua')."
    )]
    InvalidRegionKey(String),

    #[error("Invalid {expected} value for {key}: '{value}'")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// Splits `KEY=VALUE` at the first `=`, trimming whitespace around both halves.
pub fn parse_key_value(pair: &str) -> Result<(&str, &str), ParseError> {
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| ParseError::MissingSeparator(pair.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ParseError::EmptyKey(pair.to_string()));
    }
    Ok((key, value.trim()))
}

/// Recognizes `tissue.regions.<index>.<field>`. Returns `None` for keys outside the
/// region namespace.
pub fn parse_region_key(key: &str) -> Result<Option<(usize, &str)>, ParseError> {
    let Some(rest) = key.strip_prefix(REGION_KEY_PREFIX) else {
        return Ok(None);
    };
    let invalid = || ParseError::InvalidRegionKey(key.to_string());
    let (index, field) = rest.split_once('.').ok_or_else(invalid)?;
    let index = index.parse::<usize>().map_err(|_| invalid())?;
    if field.is_empty() || field.contains('.') {
        return Err(invalid());
    }
    Ok(Some((index, field)))
}

pub fn parse_value<T: FromStr>(
    key: &str,
    value: &str,
    expected: &'static str,
) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_value_splits_at_first_separator() {
        assert_eq!(
            parse_key_value("simulation.output-name = a=b"),
            Ok(("simulation.output-name", "a=b"))
        );
        assert_eq!(
            parse_key_value("options.seed"),
            Err(ParseError::MissingSeparator("options.seed".to_string()))
        );
        assert_eq!(
            parse_key_value(" =3"),
            Err(ParseError::EmptyKey(" =3".to_string()))
        );
    }

    #[test]
    fn region_keys_carry_index_and_field() {
        assert_eq!(
            parse_region_key("tissue.regions.2.musp"),
            Ok(Some((2, "musp")))
        );
        assert_eq!(parse_region_key("options.seed"), Ok(None));
        assert!(parse_region_key("tissue.regions.x.mua").is_err());
        assert!(parse_region_key("tissue.regions.1").is_err());
        assert!(parse_region_key("tissue.regions.1.mua.extra").is_err());
    }

    #[test]
    fn values_report_expected_type() {
        assert_eq!(parse_value::<u64>("options.seed", "12", "integer"), Ok(12));
        let err = parse_value::<f64>("tissue.regions.1.g", "high", "float").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid float value for tissue.regions.1.g: 'high'"
        );
    }
}
