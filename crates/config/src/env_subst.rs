/// Expand `${NAME}` placeholders from the process environment.
///
/// Unknown variables and unterminated placeholders are kept verbatim.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// [`substitute_env`] with an explicit lookup, so tests never touch the
/// process environment.
pub fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match lookup(name).filter(|_| !name.is_empty()) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn lookup(name: &str) -> Option<String> {
        match name {
            "SLACK_TOKEN" => Some("xoxb-1".into()),
            "DB" => Some("/var/lib/teams.db".into()),
            _ => None,
        }
    }

    #[rstest]
    #[case("bot_token = \"${SLACK_TOKEN}\"", "bot_token = \"xoxb-1\"")]
    #[case("${DB}:${DB}", "/var/lib/teams.db:/var/lib/teams.db")]
    #[case("keep ${MISSING} as is", "keep ${MISSING} as is")]
    #[case("empty ${} stays", "empty ${} stays")]
    #[case("dangling ${SLACK_TOKEN", "dangling ${SLACK_TOKEN")]
    #[case("costs $5 {not a var}", "costs $5 {not a var}")]
    #[case("", "")]
    fn substitutes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(substitute_env_with(input, lookup), expected);
    }
}
