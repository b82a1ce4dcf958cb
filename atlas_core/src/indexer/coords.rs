use crate::{Error, Result};

/// Parse a textual grid locator ("x,y") into integer coordinates.
///
/// Requires at least two comma-separated components; the first two must be
/// base-10 integers. Trailing components are ignored.
pub fn parse_locator(locator: &str) -> Result<(i32, i32)> {
    let mut parts = locator.split(',');
    let (Some(x), Some(y)) = (parts.next(), parts.next()) else {
        return Err(Error::InvalidLocator(locator.to_string()));
    };
    let x: i32 = x
        .parse()
        .map_err(|_| Error::InvalidLocator(locator.to_string()))?;
    let y: i32 = y
        .parse()
        .map_err(|_| Error::InvalidLocator(locator.to_string()))?;
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signed_coordinates() {
        assert_eq!(parse_locator("10,-5").unwrap(), (10, -5));
        assert_eq!(parse_locator("0,0").unwrap(), (0, 0));
        assert_eq!(parse_locator("-150,150").unwrap(), (-150, 150));
    }

    #[test]
    fn ignores_components_past_the_first_two() {
        assert_eq!(parse_locator("1,2,3").unwrap(), (1, 2));
    }

    #[test]
    fn rejects_malformed_locators() {
        for bad in ["abc,1", "1,abc", "5", "", ",", "1,", "1.5,2"] {
            assert!(
                matches!(parse_locator(bad), Err(Error::InvalidLocator(_))),
                "expected {bad:?} to be rejected"
            );
        }
    }
}
