//! Stack-name slugification and CloudFormation output-key derivation.
//!
//! Output keys in the deployment are prefixed with a slugified form of the
//! stack name. The slug rules must match the TypeScript `slugify` used when
//! the stack is synthesised, otherwise lookups silently miss.

/// Output-key suffix for the capacity-manager task definition ARN.
pub const TASK_DEFINITION_OUTPUT_SUFFIX: &str = "capacityManagerTaskDfn";

/// Output-key suffix for the EFS connection info JSON.
pub const CONNECTION_INFO_OUTPUT_SUFFIX: &str = "efnConnectionInfo";

/// Slugifies a stack name for use in a CloudFormation output key.
///
/// Lowercases the input and drops every character outside `[a-z0-9]`. A slug
/// starting with a digit is prefixed with `n`; an empty slug becomes
/// `empty`.
#[must_use]
pub fn slugify(stack_name: &str) -> String {
    let mut slug: String = stack_name
        .chars()
        .flat_map(char::to_lowercase)
        .filter(char::is_ascii_alphanumeric)
        .collect();

    if slug.chars().next().is_some_and(|ch| ch.is_ascii_digit()) {
        slug.insert(0, 'n');
    }

    if slug.is_empty() {
        slug.push_str("empty");
    }

    slug
}

/// Builds the output key holding the task definition ARN for `stack_name`.
#[must_use]
pub fn task_definition_output_key(stack_name: &str) -> String {
    format!("{}{TASK_DEFINITION_OUTPUT_SUFFIX}", slugify(stack_name))
}

/// Builds the output key holding the connection info JSON for `stack_name`.
#[must_use]
pub fn connection_info_output_key(stack_name: &str) -> String {
    format!("{}{CONNECTION_INFO_OUTPUT_SUFFIX}", slugify(stack_name))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("MyStack-Test", "mystacktest")]
    #[case("prod", "prod")]
    #[case("Stack_01.two", "stack01two")]
    #[case("7zone", "n7zone")]
    #[case("---", "empty")]
    #[case("", "empty")]
    fn slugify_matches_deployment_rules(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(slugify(input), expected);
    }

    #[test]
    fn output_keys_append_fixed_suffixes() {
        assert_eq!(
            task_definition_output_key("My-Stack"),
            "mystackcapacityManagerTaskDfn"
        );
        assert_eq!(
            connection_info_output_key("My-Stack"),
            "mystackefnConnectionInfo"
        );
    }
}
