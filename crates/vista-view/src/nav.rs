//! Navigation helpers for layouts

use crate::request::RequestInfo;

const CURRENT: &str = "class=\"current\"";

/// Escape HTML special characters in text and attribute values
pub fn escape_html(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#x27;"),
            _ => output.push(c),
        }
    }
    output
}

/// Breadcrumb from the request path.
///
/// Every segment but the last links to the path up to it; `_` reads as a
/// space.
pub fn breadcrumb(request: &RequestInfo, separator: &str) -> String {
    breadcrumb_path(&request.uri, separator)
}

/// Breadcrumb from a bare request path
pub fn breadcrumb_path(path: &str, separator: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let pairs: Vec<(&str, &str)> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| (s, s))
        .collect();
    breadcrumb_from(&pairs, separator)
}

/// Breadcrumb from explicit `(title, segment)` pairs
pub fn breadcrumb_from(pairs: &[(&str, &str)], separator: &str) -> String {
    let separator = escape_html(separator);
    let mut out = format!("<a href=\"/\">home</a> {}", separator);
    let mut url = String::new();

    for (i, (title, segment)) in pairs.iter().enumerate() {
        url.push('/');
        url.push_str(segment);
        let title = title.replace('_', " ");

        if i + 1 == pairs.len() {
            out.push_str(&escape_html(&title));
        } else {
            out.push_str(&format!(
                "<a href=\"{}\">{}</a>{}",
                escape_html(&url),
                escape_html(&title.to_lowercase()),
                separator
            ));
        }
    }
    out
}

/// `class="current"` when `item` names the active controller
pub fn check_menu(request: &RequestInfo, item: &str) -> &'static str {
    current_class(item, &request.controller)
}

/// `class="current"` when `item` names the active method
pub fn check_sub_menu(request: &RequestInfo, item: &str) -> &'static str {
    current_class(item, &request.method)
}

/// `class="current"` when `item` equals `active`, ignoring ASCII case
pub fn current_class(item: &str, active: &str) -> &'static str {
    if active.eq_ignore_ascii_case(item) {
        CURRENT
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breadcrumb_from_uri() {
        let req = RequestInfo::new("blog", "show").uri("/Blog/my_first_post");
        assert_eq!(
            breadcrumb(&req, ":"),
            "<a href=\"/\">home</a> :<a href=\"/Blog\">blog</a>:my first post"
        );
    }

    #[test]
    fn test_breadcrumb_root() {
        let req = RequestInfo::new("home", "index").uri("/");
        assert_eq!(breadcrumb(&req, " : "), "<a href=\"/\">home</a>  : ");
    }

    #[test]
    fn test_breadcrumb_from_pairs() {
        let crumbs = breadcrumb_from(&[("Users", "users"), ("Edit_profile", "edit")], " > ");
        assert_eq!(
            crumbs,
            "<a href=\"/\">home</a>  &gt; <a href=\"/users\">users</a> &gt; Edit profile"
        );
    }

    #[test]
    fn test_breadcrumb_escapes() {
        let crumbs = breadcrumb_from(&[("<b>", "x")], "/");
        assert!(crumbs.ends_with("&lt;b&gt;"));
    }

    #[test]
    fn test_check_menu() {
        let req = RequestInfo::new("Blog", "Show");
        assert_eq!(check_menu(&req, "blog"), "class=\"current\"");
        assert_eq!(check_menu(&req, "users"), "");
        assert_eq!(check_sub_menu(&req, "show"), "class=\"current\"");
        assert_eq!(check_sub_menu(&req, "edit"), "");
    }

    #[test]
    fn test_breadcrumb_path_ignores_query() {
        assert_eq!(
            breadcrumb_path("/docs/getting_started?page=2#intro", " / "),
            "<a href=\"/\">home</a>  / <a href=\"/docs\">docs</a> / getting started"
        );
        assert_eq!(current_class("EDIT", "edit"), CURRENT);
        assert_eq!(current_class("edit", ""), "");
    }
}
