use ladder_view::RosterHandle;
use once_cell::sync::Lazy;
use regex::Regex;

static LADDER_ROUTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/ladder/(\d+)(?:/.*)?$").unwrap());

pub const LEAVE_PROMPT: &str = "Are you sure you want to withdraw from the ladder? If you decide to rejoin the ladder in the future you will have to start from the bottom.";

/// Extract the ladder id from a `/ladder/<id>` path.
pub fn parse_ladder_route(path: &str) -> Option<RosterHandle> {
    let caps = LADDER_ROUTE.captures(path.trim())?;
    caps.get(1)?.as_str().parse().ok().map(RosterHandle)
}

pub fn challenge_prompt(username: &str) -> String {
    format!("Are you ready to start your game with {}?", username)
}

/// Blocking browser confirm dialog. Treats a dialog error as "cancel".
pub fn confirm(message: &str) -> bool {
    gloo_utils::window()
        .confirm_with_message(message)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_ladder_routes() {
        assert_eq!(parse_ladder_route("/ladder/42"), Some(RosterHandle(42)));
        assert_eq!(parse_ladder_route("/ladder/7/"), Some(RosterHandle(7)));
        assert_eq!(parse_ladder_route("/ladder/"), None);
        assert_eq!(parse_ladder_route("/ladders/42"), None);
        assert_eq!(parse_ladder_route("/ladder/abc"), None);
        assert_eq!(parse_ladder_route("/ladder/99999999999999999999999"), None);
    }

    #[test]
    fn challenge_prompt_names_opponent() {
        assert_eq!(challenge_prompt("kaya"), "Are you ready to start your game with kaya?");
    }
}
