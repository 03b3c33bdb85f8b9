use std::process::Command;

fn main() {
    // Capture the rustc version for the status response.
    let output = Command::new("rustc")
        .arg("--version")
        .output()
        .expect("Failed to execute rustc");

    let version = String::from_utf8_lossy(&output.stdout);
    // Extract "1.90.0" from "rustc 1.90.0 (...)"
    let version = version
        .split_whitespace()
        .nth(1)
        .unwrap_or("unknown")
        .to_string();

    println!("cargo:rustc-env=RUSTC_VERSION={}", version);
    println!("cargo:rerun-if-changed=build.rs");
}
