//! Dice notation parsing
//!
//! The runner accepts the usual shorthand: whitespace- or comma-separated
//! tokens of the form `[N]d<sides>`, e.g. `2d6 d4 3d6`. A trailing `!`
//! keeps the individual values instead of summing the group.

use std::fmt;

use dicebox_core::{DiceGroup, DieType, ResultProcessing, Tint};

/// Error type for notation parsing
#[derive(Debug, PartialEq, Eq)]
pub enum NotationError {
    /// Token did not match `[N]d<sides>[!]`
    BadToken(String),
    /// Die count was zero or unreadable
    BadCount(String),
    /// Only four- and six-sided dice are supported
    UnsupportedSides(String),
}

impl fmt::Display for NotationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotationError::BadToken(token) => write!(f, "unreadable dice token '{token}'"),
            NotationError::BadCount(token) => write!(f, "bad die count in '{token}'"),
            NotationError::UnsupportedSides(token) => {
                write!(f, "unsupported die size in '{token}' (use d4 or d6)")
            }
        }
    }
}

impl std::error::Error for NotationError {}

const GROUP_TINTS: [Tint; 4] = [Tint::IVORY, Tint::RED, Tint::BLUE, Tint::GREEN];

/// Parse a request string into dice groups
///
/// Each token becomes one group; group ids are the token suffixed with its
/// position so repeated tokens stay unique.
pub fn parse_request(input: &str) -> Result<Vec<DiceGroup>, NotationError> {
    let mut groups = Vec::new();
    for (index, token) in input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .enumerate()
    {
        groups.push(parse_token(token, index)?);
    }
    Ok(groups)
}

fn parse_token(token: &str, index: usize) -> Result<DiceGroup, NotationError> {
    let body = token.strip_suffix('!').unwrap_or(token);
    let processing = if body.len() < token.len() {
        ResultProcessing::IndividualValues
    } else {
        ResultProcessing::Sum
    };

    let (count_part, sides_part) = body
        .split_once(['d', 'D'])
        .ok_or_else(|| NotationError::BadToken(token.to_string()))?;

    let dice: u32 = if count_part.is_empty() {
        1
    } else {
        count_part
            .parse()
            .map_err(|_| NotationError::BadCount(token.to_string()))?
    };
    if dice == 0 {
        return Err(NotationError::BadCount(token.to_string()));
    }

    let die_type = match sides_part {
        "4" => DieType::D4,
        "6" => DieType::D6,
        _ => return Err(NotationError::UnsupportedSides(token.to_string())),
    };

    Ok(
        DiceGroup::new(format!("{token}#{index}"), dice, die_type)
            .with_tint(GROUP_TINTS[index % GROUP_TINTS.len()])
            .with_processing(processing),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_group() {
        let groups = parse_request("2d6").unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].dice, 2);
        assert_eq!(groups[0].die_type, DieType::D6);
        assert_eq!(groups[0].processing, ResultProcessing::Sum);
        assert_eq!(groups[0].group_id, "2d6#0");
    }

    #[test]
    fn test_implicit_count() {
        let groups = parse_request("d4").unwrap();
        assert_eq!(groups[0].dice, 1);
        assert_eq!(groups[0].die_type, DieType::D4);
    }

    #[test]
    fn test_individual_suffix() {
        let groups = parse_request("3d6!").unwrap();
        assert_eq!(groups[0].processing, ResultProcessing::IndividualValues);
        assert_eq!(groups[0].dice, 3);
    }

    #[test]
    fn test_multiple_groups_with_separators() {
        let groups = parse_request("2d6, d4 3d6!").unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[1].die_type, DieType::D4);
        assert_eq!(groups[2].processing, ResultProcessing::IndividualValues);
    }

    #[test]
    fn test_repeated_tokens_stay_unique() {
        let groups = parse_request("2d6 2d6").unwrap();
        assert_ne!(groups[0].group_id, groups[1].group_id);
    }

    #[test]
    fn test_uppercase_d_accepted() {
        let groups = parse_request("2D6").unwrap();
        assert_eq!(groups[0].die_type, DieType::D6);
    }

    #[test]
    fn test_bad_tokens_rejected() {
        assert!(matches!(
            parse_request("banana"),
            Err(NotationError::BadToken(_))
        ));
        assert!(matches!(
            parse_request("0d6"),
            Err(NotationError::BadCount(_))
        ));
        assert!(matches!(
            parse_request("xd6"),
            Err(NotationError::BadCount(_))
        ));
        assert!(matches!(
            parse_request("2d20"),
            Err(NotationError::UnsupportedSides(_))
        ));
    }

    #[test]
    fn test_empty_input_yields_no_groups() {
        assert_eq!(parse_request("").unwrap().len(), 0);
        assert_eq!(parse_request("  , ").unwrap().len(), 0);
    }
}
