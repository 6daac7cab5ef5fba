/// Strips a surrounding Markdown code fence (e.g. ```` ```json ... ``` ````) from model output.
///
/// Unfenced input is only trimmed.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let fence_len = trimmed.chars().take_while(|ch| *ch == '`').count();
    if fence_len < 3 {
        return trimmed;
    }
    let fence = &trimmed[..fence_len];
    let after_open = &trimmed[fence_len..];
    let body = match after_open.find('\n') {
        Some(pos) => &after_open[pos + 1..],
        None => after_open,
    };
    body.trim_end()
        .strip_suffix(fence)
        .unwrap_or(body)
        .trim()
}
