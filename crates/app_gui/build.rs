use std::env;

fn main() {
    let version = env::var("IMAGE_REVIEW_VERSION")
        .unwrap_or_else(|_| env::var("CARGO_PKG_VERSION").unwrap());
    println!("cargo:rustc-env=IMAGE_REVIEW_VERSION={version}");
    println!("cargo:rerun-if-env-changed=IMAGE_REVIEW_VERSION");
}
