use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Helper to get the path to the wheelwright binary
#[allow(dead_code)]
pub fn wheelwright_bin() -> PathBuf {
    // In tests, the binary should be at target/debug/wheelwright
    let mut path = env::current_exe()
        .expect("Failed to get current executable path")
        .parent()
        .expect("No parent")
        .parent()
        .expect("No parent")
        .to_path_buf();

    // If we're in deps/, go up one more level
    if path.ends_with("deps") {
        path = path.parent().expect("No parent").to_path_buf();
    }

    path.join("wheelwright")
}

#[allow(dead_code)]
pub fn write_file(root: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("No parent")).expect("Failed to create parent");
    fs::write(&path, contents).expect("Failed to write fixture file");
    path
}

/// Builds the demo wheel used across the e2e suites: two modules, one
/// dependency and one console script.
#[allow(dead_code)]
pub fn build_demo_wheel(dir: &Path) -> PathBuf {
    let init = write_file(dir, "src/demo/__init__.py", "VERSION = \"1.0.0\"\n");
    let cli = write_file(dir, "src/demo/cli.py", "def main():\n    return 0\n");
    let entry_points = write_file(
        dir,
        "src/entry_points.txt",
        "[console_scripts]\ndemo = demo.cli:main\n",
    );

    let output = Command::new(wheelwright_bin())
        .arg("-q")
        .arg("build")
        .arg("--name")
        .arg("demo")
        .arg("--version")
        .arg("1.0.0")
        .arg("--out-dir")
        .arg(dir)
        .arg("--input-file")
        .arg(format!("demo/__init__.py;{}", init.display()))
        .arg("--input-file")
        .arg(format!("demo/cli.py;{}", cli.display()))
        .arg("--requires")
        .arg("requests>=2.0")
        .arg("--entry-points-file")
        .arg(&entry_points)
        .output()
        .expect("Failed to execute wheelwright");
    assert!(
        output.status.success(),
        "build failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let wheel = dir.join("demo-1.0.0-py3-none-any.whl");
    assert!(wheel.is_file(), "wheel not written at {}", wheel.display());
    wheel
}
