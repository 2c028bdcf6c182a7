use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

/// A view tree plus a JSON config pointing at it
fn site() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let views = dir.path().join("views");
    write(&views, "default/layouts/application.html", "<main>{yield}</main>");
    write(&views, "default/layouts/ajax.html", "{yield}");
    write(&views, "default/blog/show.html", "<h1>{{ title }}</h1>");
    write(&views, "iphone/blog/show.html", "<h1>small {{ title }}</h1>");

    let config = serde_json::json!({
        "theme_paths": [views],
        "cache_path": dir.path().join("cache"),
        "use_agent_themes": true,
        "auto_reload": false,
    });
    let config_path = dir.path().join("vista.json");
    fs::write(&config_path, config.to_string()).unwrap();
    (dir, config_path)
}

fn vista() -> Command {
    Command::cargo_bin("vista").unwrap()
}

#[test]
fn test_render_prints_page() {
    let (_dir, config) = site();
    let output = vista()
        .args(["render", "--controller", "blog", "--method", "show"])
        .args(["--uri", "/blog/42", "--var", "title=Hello"])
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.trim_end(), "<main><h1>Hello</h1></main>");
}

#[test]
fn test_render_ajax_prints_headers() {
    let (_dir, config) = site();
    let output = vista()
        .args(["render", "--controller", "blog", "--method", "show", "--ajax", "--headers"])
        .args(["--var", "title=Hi"])
        .arg("--config")
        .arg(&config)
        .env("NO_COLOR", "1")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("pragma: no-cache"));
    assert!(stdout.trim_end().ends_with("<h1>Hi</h1>"));
}

#[test]
fn test_render_missing_view_fails() {
    let (_dir, config) = site();
    let output = vista()
        .args(["render", "--controller", "users", "--method", "edit"])
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("users/edit"));
}

#[test]
fn test_theme_for_iphone() {
    let (_dir, config) = site();
    let output = vista()
        .args(["theme", "--user-agent", "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X)"])
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap().trim(), "iphone");
}

#[test]
fn test_locate_falls_back_to_default_theme() {
    let (dir, config) = site();
    let output = vista()
        .args(["locate", "--theme", "iphone", "layouts/application"])
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    assert!(output.status.success());
    let expected = dir.path().join("views/default/layouts/application.html");
    assert_eq!(
        String::from_utf8(output.stdout).unwrap().trim(),
        expected.display().to_string()
    );
}
