use super::ApiError;

/// Parse a recipe id taken from the URL path. Anything that is not a positive
/// integer cannot name a recipe.
pub fn validate_recipe_id(raw: &str) -> Result<i32, ApiError> {
    match raw.parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::not_found("Recipe", raw)),
    }
}

/// Parse a comma separated id list such as `1,2,3`.
pub fn parse_id_list(param: &str, raw: &str) -> Result<Vec<i32>, ApiError> {
    raw.split(',')
        .map(|part| {
            let part = part.trim();
            part.parse::<i32>().map_err(|_| {
                ApiError::validation(format!(
                    "Invalid value for '{param}': '{part}' is not an integer id"
                ))
            })
        })
        .collect()
}

/// Parse an integer flag; zero disables it, any other integer enables it.
pub fn parse_flag(param: &str, raw: &str) -> Result<bool, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map(|value| value != 0)
        .map_err(|_| {
            ApiError::validation(format!(
                "Invalid value for '{param}': expected an integer, got '{raw}'"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_recipe_id() {
        assert_eq!(validate_recipe_id("1").unwrap(), 1);
        assert_eq!(validate_recipe_id("12345").unwrap(), 12345);
        assert!(matches!(
            validate_recipe_id("0"),
            Err(ApiError::NotFound(_))
        ));
        assert!(validate_recipe_id("-1").is_err());
        assert!(validate_recipe_id("abc").is_err());
    }

    #[test]
    fn test_parse_id_list() {
        assert_eq!(parse_id_list("tags", "1").unwrap(), vec![1]);
        assert_eq!(parse_id_list("tags", "3,1,2").unwrap(), vec![3, 1, 2]);
        assert_eq!(parse_id_list("tags", " 4 , 5 ").unwrap(), vec![4, 5]);
    }

    #[test]
    fn test_parse_id_list_rejects_malformed() {
        assert!(matches!(
            parse_id_list("tags", "1,x"),
            Err(ApiError::ValidationError(_))
        ));
        assert!(parse_id_list("tags", "").is_err());
        assert!(parse_id_list("tags", "1,,2").is_err());
        assert!(parse_id_list("ingredients", "1.5").is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(!parse_flag("assigned_only", "0").unwrap());
        assert!(parse_flag("assigned_only", "1").unwrap());
        assert!(parse_flag("assigned_only", "2").unwrap());
        assert!(parse_flag("assigned_only", "true").is_err());
        assert!(parse_flag("assigned_only", "").is_err());
    }
}
