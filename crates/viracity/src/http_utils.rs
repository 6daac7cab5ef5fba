pub(crate) fn join_base_path(base: &str, path: &str) -> anyhow::Result<String> {
    if base.trim().is_empty() {
        anyhow::bail!("base_url is empty");
    }
    let normalized_base = base.trim().trim_end_matches('/');
    let normalized_path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    Ok(format!("{normalized_base}{normalized_path}"))
}

pub(crate) fn with_api_version(url: String, api_version: Option<&str>) -> String {
    match api_version.map(str::trim).filter(|version| !version.is_empty()) {
        Some(version) => {
            let separator = if url.contains('?') { '&' } else { '?' };
            format!("{url}{separator}api-version={version}")
        }
        None => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_with_single_slash() {
        assert_eq!(
            join_base_path("https://host/", "chat/completions").unwrap(),
            "https://host/chat/completions"
        );
        assert_eq!(
            join_base_path("https://host", "/chat/completions").unwrap(),
            "https://host/chat/completions"
        );
    }

    #[test]
    fn rejects_empty_base() {
        assert!(join_base_path("  ", "/x").is_err());
    }

    #[test]
    fn appends_api_version() {
        assert_eq!(
            with_api_version("https://host/x".to_string(), Some("2024-05-01-preview")),
            "https://host/x?api-version=2024-05-01-preview"
        );
        assert_eq!(
            with_api_version("https://host/x?a=1".to_string(), Some("v")),
            "https://host/x?a=1&api-version=v"
        );
        assert_eq!(
            with_api_version("https://host/x".to_string(), Some(" ")),
            "https://host/x"
        );
        assert_eq!(with_api_version("https://host/x".to_string(), None), "https://host/x");
    }
}
