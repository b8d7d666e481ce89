//! Build version names and LÖVE runtime versions

use crate::error::VersionError;

/// Increment the trailing number of a version name
///
/// Only the final run of ASCII digits changes: `v3` becomes `v4` and `1.2.9`
/// becomes `1.2.10`. Leading zeros of that run are not preserved.
pub fn bump_version(version: &str) -> Result<String, VersionError> {
    let not_bumpable = || VersionError::NotBumpable {
        version: version.to_string(),
    };

    let digits = version
        .bytes()
        .rev()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return Err(not_bumpable());
    }

    let (prefix, number) = version.split_at(version.len() - digits);
    let next = number
        .parse::<u128>()
        .ok()
        .and_then(|n| n.checked_add(1))
        .ok_or_else(not_bumpable)?;
    Ok(format!("{prefix}{next}"))
}

/// A LÖVE release as `(major, minor)`
///
/// Releases before 11.0 carry a leading zero (`0.10.2`), which is dropped so
/// every version compares as a pair.
pub fn parse_love_version(version: &str) -> Result<(u32, u32), VersionError> {
    let invalid = || VersionError::InvalidLoveVersion {
        version: version.to_string(),
    };

    let mut parts = version
        .split(['.', '_'])
        .map(|p| p.parse::<u32>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>, _>>()?;
    if parts.len() == 3 && parts[0] == 0 {
        parts.remove(0);
    }
    match parts.as_slice() {
        [major, minor] => Ok((*major, *minor)),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::generators::version_name;
    use proptest::prelude::*;

    #[test]
    fn test_bump_simple() {
        assert_eq!(bump_version("v3").unwrap(), "v4");
        assert_eq!(bump_version("1.2.9").unwrap(), "1.2.10");
        assert_eq!(bump_version("7").unwrap(), "8");
        assert_eq!(bump_version("build-099").unwrap(), "build-100");
    }

    #[test]
    fn test_bump_without_trailing_number_fails() {
        assert_eq!(
            bump_version("release"),
            Err(VersionError::NotBumpable {
                version: "release".to_string()
            })
        );
        assert!(bump_version("v1-beta").is_err());
        assert!(bump_version("").is_err());
    }

    #[test]
    fn test_bump_error_message() {
        let err = bump_version("release").unwrap_err();
        assert!(err.to_string().contains("cannot bump a non-numeric version"));
    }

    #[test]
    fn test_parse_love_version() {
        assert_eq!(parse_love_version("11.5").unwrap(), (11, 5));
        assert_eq!(parse_love_version("0.10.2").unwrap(), (10, 2));
        assert_eq!(parse_love_version("11_4").unwrap(), (11, 4));
        assert!(parse_love_version("11").is_err());
        assert!(parse_love_version("eleven.five").is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_bump_increments_trailing_number(
            (prefix, number) in version_name(),
        ) {
            let bumped = bump_version(&format!("{prefix}{number}")).unwrap();
            prop_assert_eq!(bumped, format!("{prefix}{}", number + 1));
        }

        #[test]
        fn prop_bump_keeps_prefix(
            (prefix, number) in version_name(),
        ) {
            let bumped = bump_version(&format!("{prefix}{number}")).unwrap();
            prop_assert!(bumped.starts_with(&prefix));
        }
    }
}
