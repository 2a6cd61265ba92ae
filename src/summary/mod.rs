pub mod gemini;

use crate::data::page_view::PageView;

/// Most recent views included in a prompt.
const PROMPT_VIEWS: usize = 20;

/// Prompt asking for a single-sentence description of what the user has been
/// looking at. `views` is expected newest first.
pub fn build_prompt(user_id: &str, views: &[PageView]) -> String {
    let mut prompt = format!(
        "User {} recently viewed these pages, newest first:\n",
        user_id
    );
    for view in views.iter().take(PROMPT_VIEWS) {
        prompt.push_str(&format!("- {} at {}\n", view.page_url, view.event_time.to_rfc3339()));
    }
    prompt.push_str(
        "In one short sentence, describe what this user appears to be interested in. \
         Reply with the sentence only.",
    );
    prompt
}

/// First non-empty line of a model reply, trimmed.
pub fn one_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_owned)
}
